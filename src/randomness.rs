// SolLotto Lottery Program - Oracle randomness interface
//
// The draw trigger emits a structured request line; the off-chain oracle
// service watches program logs, waits its confirmation depth, derives the
// verifiable random word and answers with a FulfillRandomness instruction
// signed by the configured oracle authority.
use crate::state::LotteryConfig;
use solana_program::msg;

/// Number of random words requested per draw
pub const NUM_WORDS: u32 = 1;

/// Confirmation depth the oracle waits before responding
pub const REQUEST_CONFIRMATIONS: u8 = 3;

/// Emit the randomness request for the given token. The oracle reads the
/// key-hash selector from the config account; everything else it needs is
/// on this line.
pub fn emit_request(config: &LotteryConfig, request_id: u64) {
    msg!(
        "RequestedLotteryWinner: request_id={} subscription_id={} callback_gas_limit={} num_words={} min_confirmations={}",
        request_id,
        config.subscription_id,
        config.callback_gas_limit,
        NUM_WORDS,
        REQUEST_CONFIRMATIONS,
    );
}

/// Reduce the oracle's 32-byte word to a winner index: the first 8 bytes
/// little-endian, modulo the number of entries.
pub fn winner_index(random_word: &[u8; 32], total_entries: u64) -> u64 {
    if total_entries == 0 {
        return 0;
    }

    let mut value = 0u64;
    for (i, byte) in random_word[..8].iter().enumerate() {
        value |= (*byte as u64) << (8 * i);
    }

    value % total_entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_deterministic() {
        let word = [99u8; 32];
        assert_eq!(winner_index(&word, 7), winner_index(&word, 7));
    }

    #[test]
    fn index_matches_le_reduction() {
        let mut word = [0u8; 32];
        word[..8].copy_from_slice(&12_345u64.to_le_bytes());
        assert_eq!(winner_index(&word, 10), 12_345 % 10);
        assert_eq!(winner_index(&word, 100_000), 12_345);
    }

    #[test]
    fn index_ignores_trailing_bytes() {
        let mut a = [0u8; 32];
        let mut b = [0xFF; 32];
        a[..8].copy_from_slice(&42u64.to_le_bytes());
        b[..8].copy_from_slice(&42u64.to_le_bytes());
        assert_eq!(winner_index(&a, 5), winner_index(&b, 5));
    }

    #[test]
    fn index_boundary_words_stay_in_range() {
        for total in [1u64, 2, 3, 200] {
            assert!(winner_index(&[0u8; 32], total) < total);
            assert!(winner_index(&[0xFF; 32], total) < total);
        }
    }

    #[test]
    fn zero_entries_yields_zero() {
        assert_eq!(winner_index(&[0xAB; 32], 0), 0);
    }
}
