// SolLotto - recurring pooled-stake lottery on Solana
//
// Players stake SOL into a shared pool; a keeper triggers the draw once
// the round is ready, an external oracle delivers verifiable randomness,
// and the whole pool pays out to one winner before the round reopens.

pub mod error;
pub mod instruction;
pub mod processor;
pub mod randomness;
pub mod state;
pub mod utils;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
