// SolLotto Lottery Program - State
use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};
use std::convert::TryFrom;

/// Maximum number of entries a round can hold. The round account is
/// allocated once at initialization, so the players list has a fixed
/// capacity; an entry past this cap fails with `RoundFull`.
pub const MAX_PLAYERS: usize = 200;

/// Number of past winners retained on-chain. The oldest entry is evicted
/// once the list is full; `draws_completed` keeps the unbounded count.
pub const MAX_WINNER_HISTORY: usize = 64;

/// Phase of the draw state machine
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq)]
pub enum LotteryPhase {
    /// Round is open for entries
    Open,
    /// Randomness requested, entries blocked until the oracle responds
    Drawing,
}

impl TryFrom<u8> for LotteryPhase {
    type Error = &'static str;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(LotteryPhase::Open),
            1 => Ok(LotteryPhase::Drawing),
            _ => Err("Invalid lottery phase"),
        }
    }
}

impl From<LotteryPhase> for u8 {
    fn from(phase: LotteryPhase) -> Self {
        match phase {
            LotteryPhase::Open => 0,
            LotteryPhase::Drawing => 1,
        }
    }
}

/// Program configuration account, held on the `[b"config"]` PDA.
/// Mutated only through owner-gated instructions.
#[derive(Debug, Clone, Copy)]
pub struct LotteryConfig {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Administrative authority over the configuration
    pub owner: Pubkey,
    /// The only identity allowed to submit randomness fulfillments
    pub oracle_authority: Pubkey,
    /// Minimum stake per entry in lamports
    pub entry_fee: u64,
    /// Minimum elapsed time between draws, in seconds
    pub interval: i64,
    /// Minimum number of entries required before a draw may be triggered
    pub min_participants: u32,
    /// Oracle subscription funding the randomness requests
    pub subscription_id: u64,
    /// Oracle key/gas-lane selector forwarded with every request
    pub key_hash: [u8; 32],
    /// Gas budget the oracle may spend on the fulfillment callback
    pub callback_gas_limit: u32,
}

/// Round state account, held on the `[b"round"]` PDA. Created once at
/// initialization and mutated for the program's whole life; rounds are
/// phases of this single record, and the account itself holds the pooled
/// lamports on top of its rent-exempt floor.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct LotteryRound {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Current phase of the draw state machine
    pub phase: LotteryPhase,
    /// Entries of the current round, in order. Duplicates allowed: each
    /// entry is one more weighted chance. Cleared atomically at payout.
    pub players: Vec<Pubkey>,
    /// Pooled stake of the current round in lamports
    pub pool_lamports: u64,
    /// Timestamp of the last completed draw (initialization time for the
    /// first round)
    pub last_draw_time: UnixTimestamp,
    /// In-flight randomness request token; `Some` exactly while
    /// `phase == Drawing`
    pub pending_request: Option<u64>,
    /// Monotonic source of request tokens
    pub request_nonce: u64,
    /// Winner of the most recent draw, zero before the first payout
    pub recent_winner: Pubkey,
    /// Past winners, oldest first, bounded by `MAX_WINNER_HISTORY`
    pub winner_history: Vec<Pubkey>,
    /// Total number of completed draws
    pub draws_completed: u64,
}

impl Sealed for LotteryConfig {}

impl IsInitialized for LotteryConfig {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl IsInitialized for LotteryRound {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for LotteryConfig {
    const LEN: usize = 1 + 32 + 32 + 8 + 8 + 4 + 8 + 32 + 4;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, solana_program::program_error::ProgramError> {
        let src = array_ref![src, 0, LotteryConfig::LEN];
        let (
            is_initialized,
            owner,
            oracle_authority,
            entry_fee,
            interval,
            min_participants,
            subscription_id,
            key_hash,
            callback_gas_limit,
        ) = array_refs![src, 1, 32, 32, 8, 8, 4, 8, 32, 4];

        Ok(LotteryConfig {
            is_initialized: is_initialized[0] != 0,
            owner: Pubkey::new_from_array(*owner),
            oracle_authority: Pubkey::new_from_array(*oracle_authority),
            entry_fee: u64::from_le_bytes(*entry_fee),
            interval: i64::from_le_bytes(*interval),
            min_participants: u32::from_le_bytes(*min_participants),
            subscription_id: u64::from_le_bytes(*subscription_id),
            key_hash: *key_hash,
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, LotteryConfig::LEN];
        let (
            is_initialized_dst,
            owner_dst,
            oracle_authority_dst,
            entry_fee_dst,
            interval_dst,
            min_participants_dst,
            subscription_id_dst,
            key_hash_dst,
            callback_gas_limit_dst,
        ) = mut_array_refs![dst, 1, 32, 32, 8, 8, 4, 8, 32, 4];

        is_initialized_dst[0] = self.is_initialized as u8;
        owner_dst.copy_from_slice(self.owner.as_ref());
        oracle_authority_dst.copy_from_slice(self.oracle_authority.as_ref());
        *entry_fee_dst = self.entry_fee.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        *min_participants_dst = self.min_participants.to_le_bytes();
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        key_hash_dst.copy_from_slice(&self.key_hash);
        *callback_gas_limit_dst = self.callback_gas_limit.to_le_bytes();
    }
}

impl LotteryRound {
    /// Borsh upper bound with both vectors at capacity; the round account
    /// is allocated with this size.
    pub const MAX_LEN: usize = 1
        + 1
        + (4 + 32 * MAX_PLAYERS)
        + 8
        + 8
        + (1 + 8)
        + 8
        + 32
        + (4 + 32 * MAX_WINNER_HISTORY)
        + 8;

    pub fn new(now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            phase: LotteryPhase::Open,
            players: Vec::new(),
            pool_lamports: 0,
            last_draw_time: now,
            pending_request: None,
            request_nonce: 0,
            recent_winner: Pubkey::default(),
            winner_history: Vec::new(),
            draws_completed: 0,
        }
    }

    pub fn player_count(&self) -> u64 {
        self.players.len() as u64
    }

    /// Readiness predicate for the keeper. Pure read: true iff the round
    /// is open, the configured interval has elapsed since the last draw,
    /// the participant threshold is met, and the pool is non-empty.
    pub fn is_draw_ready(&self, config: &LotteryConfig, now: UnixTimestamp) -> bool {
        let is_open = self.phase == LotteryPhase::Open;
        let interval_elapsed = now - self.last_draw_time >= config.interval;
        let enough_players = self.players.len() as u32 >= config.min_participants;
        let has_pool = self.pool_lamports > 0;
        is_open && interval_elapsed && enough_players && has_pool
    }

    /// Keeper-facing readiness check. The returned payload is forwarded
    /// unchanged into `TriggerDraw` by automation callers and is not
    /// interpreted by the program.
    pub fn check_upkeep(&self, config: &LotteryConfig, now: UnixTimestamp) -> (bool, Vec<u8>) {
        (self.is_draw_ready(config, now), Vec::new())
    }

    /// Record a completed draw. History is bounded: past the cap the
    /// oldest winner is evicted while `draws_completed` keeps counting.
    pub fn record_winner(&mut self, winner: Pubkey) {
        if self.winner_history.len() == MAX_WINNER_HISTORY {
            self.winner_history.remove(0);
        }
        self.winner_history.push(winner);
        self.recent_winner = winner;
        self.draws_completed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> LotteryConfig {
        LotteryConfig {
            is_initialized: true,
            owner: Pubkey::new_unique(),
            oracle_authority: Pubkey::new_unique(),
            entry_fee: 10_000_000, // 0.01 SOL
            interval: 30,
            min_participants: 2,
            subscription_id: 1,
            key_hash: [0x47; 32],
            callback_gas_limit: 100_000,
        }
    }

    fn ready_round(config: &LotteryConfig, now: UnixTimestamp) -> LotteryRound {
        let mut round = LotteryRound::new(now - config.interval);
        for _ in 0..config.min_participants {
            round.players.push(Pubkey::new_unique());
            round.pool_lamports += config.entry_fee;
        }
        round
    }

    #[test]
    fn draw_ready_when_all_conditions_hold() {
        let config = test_config();
        let now = 1_700_000_000;
        let round = ready_round(&config, now);
        assert!(round.is_draw_ready(&config, now));
        let (ready, payload) = round.check_upkeep(&config, now);
        assert!(ready);
        assert!(payload.is_empty());
    }

    #[test]
    fn draw_not_ready_while_drawing() {
        let config = test_config();
        let now = 1_700_000_000;
        let mut round = ready_round(&config, now);
        round.phase = LotteryPhase::Drawing;
        assert!(!round.is_draw_ready(&config, now));
    }

    #[test]
    fn draw_not_ready_before_interval_elapses() {
        let config = test_config();
        let now = 1_700_000_000;
        let mut round = ready_round(&config, now);
        round.last_draw_time = now - config.interval + 1;
        assert!(!round.is_draw_ready(&config, now));
        // Exactly at the boundary the interval counts as elapsed.
        round.last_draw_time = now - config.interval;
        assert!(round.is_draw_ready(&config, now));
    }

    #[test]
    fn draw_not_ready_below_participant_threshold() {
        let config = test_config();
        let now = 1_700_000_000;
        let mut round = ready_round(&config, now);
        round.players.truncate(config.min_participants as usize - 1);
        assert!(!round.is_draw_ready(&config, now));
    }

    #[test]
    fn draw_not_ready_with_empty_pool() {
        let config = test_config();
        let now = 1_700_000_000;
        let mut round = ready_round(&config, now);
        round.pool_lamports = 0;
        assert!(!round.is_draw_ready(&config, now));
    }

    #[test]
    fn single_entry_below_threshold_is_not_ready() {
        // entry_fee 0.01 SOL, interval 30s, min_participants 2: one entry
        // leaves the round not ready even after the interval elapsed.
        let config = test_config();
        let now = 1_700_000_000;
        let mut round = LotteryRound::new(now - 60);
        round.players.push(Pubkey::new_unique());
        round.pool_lamports = config.entry_fee;
        assert_eq!(round.player_count(), 1);
        assert!(!round.is_draw_ready(&config, now));
    }

    #[test]
    fn second_entry_becomes_ready_after_interval() {
        let config = test_config();
        let start = 1_700_000_000;
        let mut round = LotteryRound::new(start);
        for _ in 0..2 {
            round.players.push(Pubkey::new_unique());
            round.pool_lamports += config.entry_fee;
        }
        assert!(!round.is_draw_ready(&config, start + config.interval - 1));
        assert!(round.is_draw_ready(&config, start + config.interval));
    }

    #[test]
    fn phase_code_conversions() {
        assert_eq!(u8::from(LotteryPhase::Open), 0);
        assert_eq!(u8::from(LotteryPhase::Drawing), 1);
        assert_eq!(LotteryPhase::try_from(0).unwrap(), LotteryPhase::Open);
        assert_eq!(LotteryPhase::try_from(1).unwrap(), LotteryPhase::Drawing);
        assert!(LotteryPhase::try_from(2).is_err());
    }

    #[test]
    fn config_pack_round_trip() {
        let config = test_config();
        let mut buf = [0u8; LotteryConfig::LEN];
        LotteryConfig::pack(config, &mut buf).unwrap();
        let unpacked = LotteryConfig::unpack(&buf).unwrap();
        assert_eq!(unpacked.owner, config.owner);
        assert_eq!(unpacked.oracle_authority, config.oracle_authority);
        assert_eq!(unpacked.entry_fee, config.entry_fee);
        assert_eq!(unpacked.interval, config.interval);
        assert_eq!(unpacked.min_participants, config.min_participants);
        assert_eq!(unpacked.subscription_id, config.subscription_id);
        assert_eq!(unpacked.key_hash, config.key_hash);
        assert_eq!(unpacked.callback_gas_limit, config.callback_gas_limit);
    }

    #[test]
    fn round_serialized_size_stays_within_allocation() {
        use borsh::BorshSerialize;

        let mut round = LotteryRound::new(0);
        for _ in 0..MAX_PLAYERS {
            round.players.push(Pubkey::new_unique());
        }
        for _ in 0..MAX_WINNER_HISTORY {
            round.winner_history.push(Pubkey::new_unique());
        }
        round.pending_request = Some(u64::MAX);
        let bytes = round.try_to_vec().unwrap();
        assert_eq!(bytes.len(), LotteryRound::MAX_LEN);
    }

    #[test]
    fn winner_history_is_bounded_and_append_only() {
        let mut round = LotteryRound::new(0);
        let winners: Vec<Pubkey> = (0..MAX_WINNER_HISTORY + 6)
            .map(|_| Pubkey::new_unique())
            .collect();
        for winner in &winners {
            round.record_winner(*winner);
        }
        assert_eq!(round.winner_history.len(), MAX_WINNER_HISTORY);
        assert_eq!(round.draws_completed, (MAX_WINNER_HISTORY + 6) as u64);
        // The retained window holds the most recent winners in order.
        assert_eq!(round.winner_history[0], winners[6]);
        assert_eq!(*round.winner_history.last().unwrap(), *winners.last().unwrap());
        assert_eq!(round.recent_winner, *winners.last().unwrap());
    }
}
