// SolLotto Lottery Program - Errors
use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

/// Errors that may be returned by the lottery program
#[derive(Error, Debug, Copy, Clone)]
pub enum LotteryError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstruction,

    /// Account is already initialized
    #[error("Account is already initialized")]
    AlreadyInitialized,

    /// Account is not initialized
    #[error("Account is not initialized")]
    NotInitialized,

    /// Entry value is below the configured entry fee
    #[error("Entry value is below the entry fee")]
    InsufficientStake,

    /// Entries are only accepted while the round is open
    #[error("Round is not open for entries")]
    RoundNotOpen,

    /// The round account cannot hold any more entries
    #[error("Round has reached the maximum number of entries")]
    RoundFull,

    /// One of the draw conditions does not hold
    #[error("Draw conditions are not met")]
    DrawNotReady,

    /// Caller is not the required authority
    #[error("Caller is not authorized")]
    Unauthorized,

    /// Randomness response carries a stale or unknown request token
    #[error("Randomness response does not match the outstanding request")]
    UnknownRequest,

    /// A draw cannot complete without participants
    #[error("No participants in the round")]
    NoParticipants,

    /// The submitted winner account is not the drawn participant
    #[error("Winner account does not match the drawn participant")]
    WinnerMismatch,

    /// Zero identity where a real one is required
    #[error("Invalid identity")]
    InvalidIdentity,

    /// Parameter outside its sane range
    #[error("Invalid parameter")]
    InvalidParameter,

    /// Moving the pool out of the round account failed
    #[error("Payout transfer failed")]
    PayoutFailed,

    /// Checked arithmetic overflowed
    #[error("Arithmetic overflow")]
    AmountOverflow,
}

impl From<LotteryError> for ProgramError {
    fn from(e: LotteryError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for LotteryError {
    fn type_of() -> &'static str {
        "Lottery Error"
    }
}

impl PrintProgramError for LotteryError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
