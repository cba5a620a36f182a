// SolLotto Lottery Program - Utility Functions
use crate::error::LotteryError;
use solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey, rent::Rent,
    sysvar::Sysvar,
};

/// Seed of the config PDA
pub const CONFIG_SEED: &[u8] = b"config";

/// Seed of the round PDA
pub const ROUND_SEED: &[u8] = b"round";

/// Find the program derived address of the config account
pub fn find_config_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CONFIG_SEED], program_id)
}

/// Find the program derived address of the round account
pub fn find_round_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ROUND_SEED], program_id)
}

/// Move `amount` lamports out of the program-owned round account into
/// `recipient`. Bookkeeping must already be committed by the caller; the
/// move is all-or-nothing and fails with `PayoutFailed` if the round
/// account cannot cover the amount on top of its rent-exempt floor.
pub fn withdraw_from_round(
    round_info: &AccountInfo,
    recipient_info: &AccountInfo,
    amount: u64,
) -> ProgramResult {
    if amount == 0 {
        return Ok(());
    }

    let remaining = round_info
        .lamports()
        .checked_sub(amount)
        .ok_or(LotteryError::PayoutFailed)?;

    // The round account lives forever; it must stay rent-exempt.
    let rent = Rent::get()?;
    if remaining < rent.minimum_balance(round_info.data_len()) {
        return Err(LotteryError::PayoutFailed.into());
    }

    let credited = recipient_info
        .lamports()
        .checked_add(amount)
        .ok_or(LotteryError::PayoutFailed)?;

    **round_info.try_borrow_mut_lamports()? = remaining;
    **recipient_info.try_borrow_mut_lamports()? = credited;

    Ok(())
}

/// Convert lamports to SOL (for log output)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 1_000_000_000.0
}
