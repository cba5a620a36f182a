// SolLotto Lottery Program - Instruction Processor
use crate::{
    error::LotteryError,
    instruction::LotteryInstruction,
    randomness,
    state::{LotteryConfig, LotteryPhase, LotteryRound, MAX_PLAYERS},
    utils,
};

use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    borsh::try_from_slice_unchecked,
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack},
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = LotteryInstruction::unpack(instruction_data)?;

        match instruction {
            LotteryInstruction::Initialize {
                entry_fee,
                interval,
                min_participants,
                subscription_id,
                key_hash,
                callback_gas_limit,
            } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(
                    accounts,
                    entry_fee,
                    interval,
                    min_participants,
                    subscription_id,
                    key_hash,
                    callback_gas_limit,
                    program_id,
                )
            }
            LotteryInstruction::Enter { amount } => {
                msg!("Instruction: Enter");
                Self::process_enter(accounts, amount, program_id)
            }
            LotteryInstruction::TriggerDraw { upkeep_data: _ } => {
                msg!("Instruction: Trigger Draw");
                Self::process_trigger_draw(accounts, program_id)
            }
            LotteryInstruction::FulfillRandomness {
                request_id,
                randomness,
            } => {
                msg!("Instruction: Fulfill Randomness");
                Self::process_fulfill_randomness(accounts, request_id, randomness, program_id)
            }
            LotteryInstruction::ChangeOwner {} => {
                msg!("Instruction: Change Owner");
                Self::process_change_owner(accounts, program_id)
            }
            LotteryInstruction::SetInterval { interval } => {
                msg!("Instruction: Set Interval");
                Self::process_set_interval(accounts, interval, program_id)
            }
            LotteryInstruction::SetEntryFee { entry_fee } => {
                msg!("Instruction: Set Entry Fee");
                Self::process_set_entry_fee(accounts, entry_fee, program_id)
            }
            LotteryInstruction::SetMinParticipants { min_participants } => {
                msg!("Instruction: Set Min Participants");
                Self::process_set_min_participants(accounts, min_participants, program_id)
            }
            LotteryInstruction::EmergencyWithdraw {} => {
                msg!("Instruction: Emergency Withdraw");
                Self::process_emergency_withdraw(accounts, program_id)
            }
        }
    }

    /// Guard for owner-gated operations: the caller must sign and match
    /// the configured owner.
    fn expect_owner(config: &LotteryConfig, caller_info: &AccountInfo) -> ProgramResult {
        if !caller_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        if config.owner != *caller_info.key {
            return Err(LotteryError::Unauthorized.into());
        }
        Ok(())
    }

    /// Guard for the randomness callback: only the configured oracle
    /// authority may deliver a word.
    fn expect_oracle(config: &LotteryConfig, caller_info: &AccountInfo) -> ProgramResult {
        if !caller_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        if config.oracle_authority != *caller_info.key {
            return Err(LotteryError::Unauthorized.into());
        }
        Ok(())
    }

    fn load_config(
        config_info: &AccountInfo,
        program_id: &Pubkey,
    ) -> Result<LotteryConfig, ProgramError> {
        if config_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }
        LotteryConfig::unpack(&config_info.data.borrow())
    }

    fn load_round(
        round_info: &AccountInfo,
        program_id: &Pubkey,
    ) -> Result<LotteryRound, ProgramError> {
        if round_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }
        let round: LotteryRound = try_from_slice_unchecked(&round_info.data.borrow())?;
        if !round.is_initialized() {
            return Err(LotteryError::NotInitialized.into());
        }
        Ok(round)
    }

    fn store_round(round: &LotteryRound, round_info: &AccountInfo) -> ProgramResult {
        let mut data = round_info.data.borrow_mut();
        round.serialize(&mut &mut data[..])?;
        Ok(())
    }

    /// Process the Initialize instruction
    ///
    /// Creates the config and round PDAs and opens the first round. Called
    /// once when the program is deployed; the caller becomes the owner.
    #[allow(clippy::too_many_arguments)]
    fn process_initialize(
        accounts: &[AccountInfo],
        entry_fee: u64,
        interval: i64,
        min_participants: u32,
        subscription_id: u64,
        key_hash: [u8; 32],
        callback_gas_limit: u32,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let oracle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !owner_info.is_signer {
            msg!("Owner must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if interval < 0 {
            msg!("Interval cannot be negative");
            return Err(LotteryError::InvalidParameter.into());
        }
        if min_participants == 0 {
            msg!("Participant threshold must be at least 1");
            return Err(LotteryError::InvalidParameter.into());
        }
        if *oracle_info.key == Pubkey::default() {
            msg!("Oracle authority cannot be the zero identity");
            return Err(LotteryError::InvalidIdentity.into());
        }

        let (expected_config_pubkey, config_bump) = utils::find_config_address(program_id);
        if *config_info.key != expected_config_pubkey {
            msg!("Invalid config account address");
            return Err(ProgramError::InvalidArgument);
        }

        let (expected_round_pubkey, round_bump) = utils::find_round_address(program_id);
        if *round_info.key != expected_round_pubkey {
            msg!("Invalid round account address");
            return Err(ProgramError::InvalidArgument);
        }

        let rent = Rent::get()?;

        if config_info.owner != program_id {
            invoke_signed(
                &system_instruction::create_account(
                    owner_info.key,
                    config_info.key,
                    rent.minimum_balance(LotteryConfig::LEN),
                    LotteryConfig::LEN as u64,
                    program_id,
                ),
                &[
                    owner_info.clone(),
                    config_info.clone(),
                    system_program_info.clone(),
                ],
                &[&[utils::CONFIG_SEED, &[config_bump]]],
            )?;
        }

        if round_info.owner != program_id {
            invoke_signed(
                &system_instruction::create_account(
                    owner_info.key,
                    round_info.key,
                    rent.minimum_balance(LotteryRound::MAX_LEN),
                    LotteryRound::MAX_LEN as u64,
                    program_id,
                ),
                &[
                    owner_info.clone(),
                    round_info.clone(),
                    system_program_info.clone(),
                ],
                &[&[utils::ROUND_SEED, &[round_bump]]],
            )?;
        }

        if let Ok(config) = LotteryConfig::unpack(&config_info.data.borrow()) {
            if config.is_initialized {
                msg!("Config account is already initialized");
                return Err(LotteryError::AlreadyInitialized.into());
            }
        }

        let clock = Clock::get()?;

        let config_data = LotteryConfig {
            is_initialized: true,
            owner: *owner_info.key,
            oracle_authority: *oracle_info.key,
            entry_fee,
            interval,
            min_participants,
            subscription_id,
            key_hash,
            callback_gas_limit,
        };
        LotteryConfig::pack(config_data, &mut config_info.data.borrow_mut())?;

        let round = LotteryRound::new(clock.unix_timestamp);
        Self::store_round(&round, round_info)?;

        msg!(
            "Lottery initialized: owner={} oracle={} entry_fee={} interval={}s min_participants={}",
            owner_info.key,
            oracle_info.key,
            entry_fee,
            interval,
            min_participants,
        );
        Ok(())
    }

    /// Process the Enter instruction
    ///
    /// Validates the stake against the entry fee and the open phase, moves
    /// the stake into the round account and appends the player. Repeat
    /// entries are allowed; each one is another slot in the draw.
    fn process_enter(accounts: &[AccountInfo], amount: u64, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = Self::load_config(config_info, program_id)?;
        let mut round = Self::load_round(round_info, program_id)?;

        if round.phase != LotteryPhase::Open {
            msg!("Round is not open, a draw is in flight");
            return Err(LotteryError::RoundNotOpen.into());
        }

        if amount < config.entry_fee {
            msg!(
                "Stake of {} lamports is below the entry fee of {}",
                amount,
                config.entry_fee
            );
            return Err(LotteryError::InsufficientStake.into());
        }

        if round.players.len() >= MAX_PLAYERS {
            msg!("Round already holds {} entries", MAX_PLAYERS);
            return Err(LotteryError::RoundFull.into());
        }

        if player_info.lamports() < amount {
            msg!(
                "Insufficient funds: needed {} lamports, had {}",
                amount,
                player_info.lamports()
            );
            return Err(ProgramError::InsufficientFunds);
        }

        invoke(
            &system_instruction::transfer(player_info.key, round_info.key, amount),
            &[
                player_info.clone(),
                round_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        round.players.push(*player_info.key);
        round.pool_lamports = round
            .pool_lamports
            .checked_add(amount)
            .ok_or(LotteryError::AmountOverflow)?;
        Self::store_round(&round, round_info)?;

        msg!(
            "LotteryEntered: player={} amount={} pool={} ({} SOL)",
            player_info.key,
            amount,
            round.pool_lamports,
            utils::lamports_to_sol(round.pool_lamports),
        );
        Ok(())
    }

    /// Process the TriggerDraw instruction
    ///
    /// Re-evaluates readiness on-chain (a keeper's earlier read is never
    /// trusted), closes the round and emits the randomness request. The
    /// phase transition itself guarantees at most one outstanding request:
    /// a second trigger while drawing fails the readiness check.
    fn process_trigger_draw(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;

        // Anyone may trigger a draw; the caller still has to sign so the
        // transaction is attributable.
        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = Self::load_config(config_info, program_id)?;
        let mut round = Self::load_round(round_info, program_id)?;

        let clock = Clock::get()?;
        if !round.is_draw_ready(&config, clock.unix_timestamp) {
            msg!(
                "Draw not ready: phase={:?} players={} pool={} elapsed={}s interval={}s",
                round.phase,
                round.player_count(),
                round.pool_lamports,
                clock.unix_timestamp - round.last_draw_time,
                config.interval,
            );
            return Err(LotteryError::DrawNotReady.into());
        }

        round.request_nonce = round
            .request_nonce
            .checked_add(1)
            .ok_or(LotteryError::AmountOverflow)?;
        let request_id = round.request_nonce;
        round.pending_request = Some(request_id);
        round.phase = LotteryPhase::Drawing;
        Self::store_round(&round, round_info)?;

        randomness::emit_request(&config, request_id);
        Ok(())
    }

    /// Process the FulfillRandomness instruction
    ///
    /// Consumes the oracle's response exactly once: the word must answer
    /// the outstanding request token, the winner account must match the
    /// entry the word selects, and all bookkeeping is committed before the
    /// pool leaves the round account. A failed transfer aborts the whole
    /// instruction and leaves the round in the drawing phase.
    fn process_fulfill_randomness(
        accounts: &[AccountInfo],
        request_id: u64,
        random_word: [u8; 32],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let config = Self::load_config(config_info, program_id)?;
        Self::expect_oracle(&config, oracle_info)?;

        let mut round = Self::load_round(round_info, program_id)?;

        // Stale, replayed or never-issued tokens are all rejected here;
        // pending_request is Some exactly while the phase is Drawing.
        if round.phase != LotteryPhase::Drawing || round.pending_request != Some(request_id) {
            msg!("No outstanding request matches id {}", request_id);
            return Err(LotteryError::UnknownRequest.into());
        }

        if round.players.is_empty() {
            msg!("Round has no participants");
            return Err(LotteryError::NoParticipants.into());
        }

        let index = randomness::winner_index(&random_word, round.player_count());
        let winner = round.players[index as usize];
        if *winner_info.key != winner {
            msg!("Winner account {} does not match drawn entry {}", winner_info.key, winner);
            return Err(LotteryError::WinnerMismatch.into());
        }

        let prize = round.pool_lamports;
        let clock = Clock::get()?;

        round.record_winner(winner);
        round.players.clear();
        round.pool_lamports = 0;
        round.last_draw_time = clock.unix_timestamp;
        round.pending_request = None;
        round.phase = LotteryPhase::Open;
        Self::store_round(&round, round_info)?;

        utils::withdraw_from_round(round_info, winner_info, prize)?;

        msg!(
            "PickedWinner: winner={} amount={} ({} SOL) draw={}",
            winner,
            prize,
            utils::lamports_to_sol(prize),
            round.draws_completed,
        );
        Ok(())
    }

    /// Process the ChangeOwner instruction
    fn process_change_owner(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let current_owner_info = next_account_info(account_info_iter)?;
        let new_owner_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;

        let mut config = Self::load_config(config_info, program_id)?;
        Self::expect_owner(&config, current_owner_info)?;

        if *new_owner_info.key == Pubkey::default() {
            msg!("New owner cannot be the zero identity");
            return Err(LotteryError::InvalidIdentity.into());
        }

        config.owner = *new_owner_info.key;
        LotteryConfig::pack(config, &mut config_info.data.borrow_mut())?;

        msg!("Owner changed to {}", new_owner_info.key);
        Ok(())
    }

    /// Process the SetInterval instruction
    fn process_set_interval(
        accounts: &[AccountInfo],
        interval: i64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        if interval < 0 {
            msg!("Interval cannot be negative");
            return Err(LotteryError::InvalidParameter.into());
        }

        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;

        let mut config = Self::load_config(config_info, program_id)?;
        Self::expect_owner(&config, owner_info)?;

        config.interval = interval;
        LotteryConfig::pack(config, &mut config_info.data.borrow_mut())?;

        msg!("Interval set to {}s", interval);
        Ok(())
    }

    /// Process the SetEntryFee instruction
    fn process_set_entry_fee(
        accounts: &[AccountInfo],
        entry_fee: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;

        let mut config = Self::load_config(config_info, program_id)?;
        Self::expect_owner(&config, owner_info)?;

        config.entry_fee = entry_fee;
        LotteryConfig::pack(config, &mut config_info.data.borrow_mut())?;

        msg!("Entry fee set to {} lamports", entry_fee);
        Ok(())
    }

    /// Process the SetMinParticipants instruction
    fn process_set_min_participants(
        accounts: &[AccountInfo],
        min_participants: u32,
        program_id: &Pubkey,
    ) -> ProgramResult {
        if min_participants == 0 {
            msg!("Participant threshold must be at least 1");
            return Err(LotteryError::InvalidParameter.into());
        }

        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;

        let mut config = Self::load_config(config_info, program_id)?;
        Self::expect_owner(&config, owner_info)?;

        config.min_participants = min_participants;
        LotteryConfig::pack(config, &mut config_info.data.borrow_mut())?;

        msg!("Participant threshold set to {}", min_participants);
        Ok(())
    }

    /// Process the EmergencyWithdraw instruction
    ///
    /// Drains the pool to the owner in any phase and resets the round to
    /// open, clearing the pending request so a late oracle response fails
    /// the token check instead of paying from an emptied pool. This is
    /// also the escape hatch for a round stuck in the drawing phase.
    fn process_emergency_withdraw(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;

        let config = Self::load_config(config_info, program_id)?;
        Self::expect_owner(&config, owner_info)?;

        let mut round = Self::load_round(round_info, program_id)?;

        let amount = round.pool_lamports;
        round.players.clear();
        round.pool_lamports = 0;
        round.pending_request = None;
        round.phase = LotteryPhase::Open;
        Self::store_round(&round, round_info)?;

        utils::withdraw_from_round(round_info, owner_info, amount)?;

        msg!(
            "EmergencyWithdraw: owner={} amount={} ({} SOL)",
            owner_info.key,
            amount,
            utils::lamports_to_sol(amount),
        );
        Ok(())
    }
}
