// SolLotto Lottery Program - Instructions
use crate::error::LotteryError;
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::mem::size_of;

#[derive(Clone, Debug, PartialEq)]
pub enum LotteryInstruction {
    /// Initialize the lottery: create the config and round accounts and
    /// open the first round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The owner, pays for the state accounts
    /// 1. `[writable]` The config account (PDA, seed `"config"`)
    /// 2. `[writable]` The round account (PDA, seed `"round"`)
    /// 3. `[]` The oracle authority allowed to fulfill randomness
    /// 4. `[]` The system program
    Initialize {
        /// Minimum stake per entry in lamports
        entry_fee: u64,
        /// Minimum elapsed time between draws, in seconds
        interval: i64,
        /// Minimum number of entries required to permit a draw
        min_participants: u32,
        /// Oracle subscription funding the randomness requests
        subscription_id: u64,
        /// Oracle key/gas-lane selector
        key_hash: [u8; 32],
        /// Gas budget for the fulfillment callback
        callback_gas_limit: u32,
    },

    /// Stake into the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player staking into the pool
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account (receives the stake)
    /// 3. `[]` The system program
    Enter {
        /// Stake in lamports; must be at least the entry fee
        amount: u64,
    },

    /// Close the round and request randomness (callable by anyone,
    /// typically the keeper; readiness is re-checked on-chain)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The caller triggering the draw
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account
    TriggerDraw {
        /// Opaque payload forwarded from the keeper's readiness check;
        /// not interpreted by the program
        upkeep_data: Vec<u8>,
    },

    /// Deliver the random word for an outstanding request, pay the winner
    /// and reopen the round (callable only by the oracle authority)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The oracle authority
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account
    /// 3. `[writable]` The winner account (must match the drawn entry)
    FulfillRandomness {
        /// Token of the request being answered
        request_id: u64,
        /// The single random word
        randomness: [u8; 32],
    },

    /// Transfer ownership (owner only)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The current owner
    /// 1. `[]` The new owner
    /// 2. `[writable]` The config account
    ChangeOwner {},

    /// Update the draw interval (owner only)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The owner
    /// 1. `[writable]` The config account
    SetInterval {
        /// New minimum elapsed time between draws, in seconds
        interval: i64,
    },

    /// Update the entry fee (owner only)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The owner
    /// 1. `[writable]` The config account
    SetEntryFee {
        /// New minimum stake per entry in lamports
        entry_fee: u64,
    },

    /// Update the participant threshold (owner only)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The owner
    /// 1. `[writable]` The config account
    SetMinParticipants {
        /// New minimum number of entries required to permit a draw
        min_participants: u32,
    },

    /// Drain the pool to the owner and reset the round, regardless of
    /// phase (owner only). Doubles as the administrative escape from a
    /// round stuck in the drawing phase.
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The owner (receives the pool)
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account
    EmergencyWithdraw {},
}

impl LotteryInstruction {
    /// Unpacks a byte buffer into a LotteryInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(LotteryError::InvalidInstruction)?;

        Ok(match tag {
            0 => {
                let (entry_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_i64(rest)?;
                let (min_participants, rest) = Self::unpack_u32(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (key_hash, rest) = Self::unpack_bytes32(rest)?;
                let (callback_gas_limit, _) = Self::unpack_u32(rest)?;
                Self::Initialize {
                    entry_fee,
                    interval,
                    min_participants,
                    subscription_id,
                    key_hash,
                    callback_gas_limit,
                }
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::Enter { amount }
            }
            2 => {
                let (upkeep_data, _) = Self::unpack_bytes(rest)?;
                Self::TriggerDraw { upkeep_data }
            }
            3 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (randomness, _) = Self::unpack_bytes32(rest)?;
                Self::FulfillRandomness {
                    request_id,
                    randomness,
                }
            }
            4 => Self::ChangeOwner {},
            5 => {
                let (interval, _) = Self::unpack_i64(rest)?;
                Self::SetInterval { interval }
            }
            6 => {
                let (entry_fee, _) = Self::unpack_u64(rest)?;
                Self::SetEntryFee { entry_fee }
            }
            7 => {
                let (min_participants, _) = Self::unpack_u32(rest)?;
                Self::SetMinParticipants { min_participants }
            }
            8 => Self::EmergencyWithdraw {},
            _ => return Err(LotteryError::InvalidInstruction.into()),
        })
    }

    /// Packs a LotteryInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match *self {
            Self::Initialize {
                entry_fee,
                interval,
                min_participants,
                subscription_id,
                ref key_hash,
                callback_gas_limit,
            } => {
                buf.push(0);
                buf.extend_from_slice(&entry_fee.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
                buf.extend_from_slice(&min_participants.to_le_bytes());
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(key_hash);
                buf.extend_from_slice(&callback_gas_limit.to_le_bytes());
            }
            Self::Enter { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::TriggerDraw { ref upkeep_data } => {
                buf.push(2);
                buf.extend_from_slice(&(upkeep_data.len() as u32).to_le_bytes());
                buf.extend_from_slice(upkeep_data);
            }
            Self::FulfillRandomness {
                request_id,
                ref randomness,
            } => {
                buf.push(3);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(randomness);
            }
            Self::ChangeOwner {} => buf.push(4),
            Self::SetInterval { interval } => {
                buf.push(5);
                buf.extend_from_slice(&interval.to_le_bytes());
            }
            Self::SetEntryFee { entry_fee } => {
                buf.push(6);
                buf.extend_from_slice(&entry_fee.to_le_bytes());
            }
            Self::SetMinParticipants { min_participants } => {
                buf.push(7);
                buf.extend_from_slice(&min_participants.to_le_bytes());
            }
            Self::EmergencyWithdraw {} => buf.push(8),
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let value = input
            .get(..8)
            .and_then(|slice| slice.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(LotteryError::InvalidInstruction)?;
        Ok((value, &input[8..]))
    }

    fn unpack_i64(input: &[u8]) -> Result<(i64, &[u8]), ProgramError> {
        let value = input
            .get(..8)
            .and_then(|slice| slice.try_into().ok())
            .map(i64::from_le_bytes)
            .ok_or(LotteryError::InvalidInstruction)?;
        Ok((value, &input[8..]))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let value = input
            .get(..4)
            .and_then(|slice| slice.try_into().ok())
            .map(u32::from_le_bytes)
            .ok_or(LotteryError::InvalidInstruction)?;
        Ok((value, &input[4..]))
    }

    fn unpack_bytes32(input: &[u8]) -> Result<([u8; 32], &[u8]), ProgramError> {
        let bytes = input
            .get(..32)
            .and_then(|slice| <[u8; 32]>::try_from(slice).ok())
            .ok_or(LotteryError::InvalidInstruction)?;
        Ok((bytes, &input[32..]))
    }

    fn unpack_bytes(input: &[u8]) -> Result<(Vec<u8>, &[u8]), ProgramError> {
        let (len, rest) = Self::unpack_u32(input)?;
        let len = len as usize;
        let bytes = rest
            .get(..len)
            .ok_or(LotteryError::InvalidInstruction)?
            .to_vec();
        Ok((bytes, &rest[len..]))
    }
}

/// Create an initialize instruction
#[allow(clippy::too_many_arguments)]
pub fn initialize(
    program_id: &Pubkey,
    owner: &Pubkey,
    config_account: &Pubkey,
    round_account: &Pubkey,
    oracle_authority: &Pubkey,
    entry_fee: u64,
    interval: i64,
    min_participants: u32,
    subscription_id: u64,
    key_hash: [u8; 32],
    callback_gas_limit: u32,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::Initialize {
        entry_fee,
        interval,
        min_participants,
        subscription_id,
        key_hash,
        callback_gas_limit,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new(*owner, true),
        AccountMeta::new(*config_account, false),
        AccountMeta::new(*round_account, false),
        AccountMeta::new_readonly(*oracle_authority, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create an enter instruction
pub fn enter(
    program_id: &Pubkey,
    player: &Pubkey,
    config_account: &Pubkey,
    round_account: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::Enter { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new_readonly(*config_account, false),
        AccountMeta::new(*round_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create a trigger_draw instruction
pub fn trigger_draw(
    program_id: &Pubkey,
    caller: &Pubkey,
    config_account: &Pubkey,
    round_account: &Pubkey,
    upkeep_data: Vec<u8>,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::TriggerDraw { upkeep_data }.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new_readonly(*config_account, false),
        AccountMeta::new(*round_account, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create a fulfill_randomness instruction
pub fn fulfill_randomness(
    program_id: &Pubkey,
    oracle_authority: &Pubkey,
    config_account: &Pubkey,
    round_account: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    randomness: [u8; 32],
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::FulfillRandomness {
        request_id,
        randomness,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*oracle_authority, true),
        AccountMeta::new_readonly(*config_account, false),
        AccountMeta::new(*round_account, false),
        AccountMeta::new(*winner, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create a change_owner instruction
pub fn change_owner(
    program_id: &Pubkey,
    current_owner: &Pubkey,
    new_owner: &Pubkey,
    config_account: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::ChangeOwner {}.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*current_owner, true),
        AccountMeta::new_readonly(*new_owner, false),
        AccountMeta::new(*config_account, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create a set_interval instruction
pub fn set_interval(
    program_id: &Pubkey,
    owner: &Pubkey,
    config_account: &Pubkey,
    interval: i64,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::SetInterval { interval }.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*owner, true),
        AccountMeta::new(*config_account, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create a set_entry_fee instruction
pub fn set_entry_fee(
    program_id: &Pubkey,
    owner: &Pubkey,
    config_account: &Pubkey,
    entry_fee: u64,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::SetEntryFee { entry_fee }.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*owner, true),
        AccountMeta::new(*config_account, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create a set_min_participants instruction
pub fn set_min_participants(
    program_id: &Pubkey,
    owner: &Pubkey,
    config_account: &Pubkey,
    min_participants: u32,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::SetMinParticipants { min_participants }.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*owner, true),
        AccountMeta::new(*config_account, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create an emergency_withdraw instruction
pub fn emergency_withdraw(
    program_id: &Pubkey,
    owner: &Pubkey,
    config_account: &Pubkey,
    round_account: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::EmergencyWithdraw {}.pack();

    let accounts = vec![
        AccountMeta::new(*owner, true),
        AccountMeta::new_readonly(*config_account, false),
        AccountMeta::new(*round_account, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_round_trips() {
        let ix = LotteryInstruction::Initialize {
            entry_fee: 10_000_000,
            interval: 30,
            min_participants: 2,
            subscription_id: 7,
            key_hash: [0x47; 32],
            callback_gas_limit: 100_000,
        };
        assert_eq!(LotteryInstruction::unpack(&ix.pack()).unwrap(), ix);
    }

    #[test]
    fn enter_round_trips() {
        let ix = LotteryInstruction::Enter { amount: 10_000_000 };
        assert_eq!(LotteryInstruction::unpack(&ix.pack()).unwrap(), ix);
    }

    #[test]
    fn trigger_draw_round_trips_with_payload() {
        let ix = LotteryInstruction::TriggerDraw {
            upkeep_data: vec![1, 2, 3],
        };
        assert_eq!(LotteryInstruction::unpack(&ix.pack()).unwrap(), ix);

        let empty = LotteryInstruction::TriggerDraw {
            upkeep_data: Vec::new(),
        };
        assert_eq!(LotteryInstruction::unpack(&empty.pack()).unwrap(), empty);
    }

    #[test]
    fn fulfill_randomness_round_trips() {
        let ix = LotteryInstruction::FulfillRandomness {
            request_id: 42,
            randomness: [0xAB; 32],
        };
        assert_eq!(LotteryInstruction::unpack(&ix.pack()).unwrap(), ix);
    }

    #[test]
    fn admin_instructions_round_trip() {
        for ix in [
            LotteryInstruction::ChangeOwner {},
            LotteryInstruction::SetInterval { interval: 600 },
            LotteryInstruction::SetEntryFee { entry_fee: 1 },
            LotteryInstruction::SetMinParticipants { min_participants: 3 },
            LotteryInstruction::EmergencyWithdraw {},
        ] {
            assert_eq!(LotteryInstruction::unpack(&ix.pack()).unwrap(), ix);
        }
    }

    #[test]
    fn unpack_rejects_truncated_data() {
        assert!(LotteryInstruction::unpack(&[]).is_err());
        assert!(LotteryInstruction::unpack(&[1, 0, 0]).is_err());
        assert!(LotteryInstruction::unpack(&[3, 1, 0, 0, 0, 0, 0, 0, 0]).is_err());
        assert!(LotteryInstruction::unpack(&[99]).is_err());
    }
}
