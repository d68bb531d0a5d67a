use arrayref::array_ref;
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::{
    coordinator::{Coordinator, MAX_NUM_WORDS},
    error::RaffleError,
    state::OracleConfig,
};

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create the mock VRF coordinator
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The coordinator authority, pays for the account
    /// 1. `[writable]` The coordinator account (PDA)
    /// 2. `[]` The system program
    InitializeCoordinator {
        /// Flat premium per fulfillment
        base_fee: u64,
        /// Price per unit of callback gas
        gas_price_link: u64,
    },

    /// Open a subscription on the coordinator
    ///
    /// Accounts expected:
    /// 0. `[signer]` The subscription owner
    /// 1. `[writable]` The coordinator account
    CreateSubscription {},

    /// Add balance to a subscription
    ///
    /// Accounts expected:
    /// 0. `[signer]` The funder
    /// 1. `[writable]` The coordinator account
    FundSubscription { subscription_id: u64, amount: u64 },

    /// Allow a raffle to spend from a subscription
    ///
    /// Accounts expected:
    /// 0. `[signer]` The subscription owner
    /// 1. `[writable]` The coordinator account
    /// 2. `[]` The consumer (raffle) account
    AddConsumer { subscription_id: u64 },

    /// Initialize a raffle
    ///
    /// Accounts expected:
    /// 0. `[signer]` The deployer
    /// 1. `[signer, writable]` The raffle account, allocated with `Raffle::LEN` and owned by the program
    InitializeRaffle {
        /// Minimum payment in lamports
        entrance_fee: u64,
        /// Seconds between draws
        interval: i64,
        /// Randomness source
        oracle: OracleConfig,
    },

    /// Enter the raffle
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    EnterRaffle {
        /// Lamports paid, at least the entrance fee
        amount: u64,
    },

    /// Report whether a draw is due. Sets return data to `[upkeep_needed]`.
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep {},

    /// Start a draw: request randomness and stop accepting entries
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The coordinator account, or `[]` the Switchboard VRF account
    PerformUpkeep {},

    /// Deliver randomness from the mock coordinator
    ///
    /// Accounts expected:
    /// 0. `[signer]` The coordinator authority
    /// 1. `[writable]` The coordinator account
    /// 2. `[writable]` The raffle account
    /// 3. `[writable]` The winner (entrant selected by the random words)
    FulfillRandomWords {
        request_id: u64,
        /// Words to deliver instead of the deterministic mock words
        words: Option<Vec<u64>>,
    },

    /// Settle a draw with the result of the Switchboard VRF account. The VRF
    /// round must be newer than the one current at `PerformUpkeep`.
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The VRF account
    /// 3. `[writable]` The winner
    FulfillFromSwitchboard { request_id: u64 },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (base_fee, rest) = Self::unpack_u64(rest)?;
                let (gas_price_link, _) = Self::unpack_u64(rest)?;
                Self::InitializeCoordinator {
                    base_fee,
                    gas_price_link,
                }
            }
            1 => Self::CreateSubscription {},
            2 => {
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::FundSubscription {
                    subscription_id,
                    amount,
                }
            }
            3 => {
                let (subscription_id, _) = Self::unpack_u64(rest)?;
                Self::AddConsumer { subscription_id }
            }
            4 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_u64(rest)?;
                let (oracle, _) = Self::unpack_oracle(rest)?;
                Self::InitializeRaffle {
                    entrance_fee,
                    interval: interval as i64,
                    oracle,
                }
            }
            5 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::EnterRaffle { amount }
            }
            6 => Self::CheckUpkeep {},
            7 => Self::PerformUpkeep {},
            8 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (flag, rest) = rest
                    .split_first()
                    .ok_or(RaffleError::InvalidInstructionData)?;
                let words = match flag {
                    0 => None,
                    1 => {
                        let (count, mut rest) = Self::unpack_u32(rest)?;
                        if count > MAX_NUM_WORDS {
                            return Err(RaffleError::NumWordsTooBig.into());
                        }
                        let mut words = Vec::with_capacity(count as usize);
                        for _ in 0..count {
                            let (word, next) = Self::unpack_u64(rest)?;
                            words.push(word);
                            rest = next;
                        }
                        Some(words)
                    }
                    _ => return Err(RaffleError::InvalidInstructionData.into()),
                };
                Self::FulfillRandomWords { request_id, words }
            }
            9 => {
                let (request_id, _) = Self::unpack_u64(rest)?;
                Self::FulfillFromSwitchboard { request_id }
            }
            _ => return Err(RaffleError::InvalidInstructionData.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::InitializeCoordinator {
                base_fee,
                gas_price_link,
            } => {
                buf.push(0);
                buf.extend_from_slice(&base_fee.to_le_bytes());
                buf.extend_from_slice(&gas_price_link.to_le_bytes());
            }
            Self::CreateSubscription {} => buf.push(1),
            Self::FundSubscription {
                subscription_id,
                amount,
            } => {
                buf.push(2);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::AddConsumer { subscription_id } => {
                buf.push(3);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
            }
            Self::InitializeRaffle {
                entrance_fee,
                interval,
                oracle,
            } => {
                buf.push(4);
                buf.extend_from_slice(&entrance_fee.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
                match oracle {
                    OracleConfig::Coordinator {
                        coordinator,
                        key_hash,
                        subscription_id,
                        callback_gas_limit,
                    } => {
                        buf.push(0);
                        buf.extend_from_slice(coordinator.as_ref());
                        buf.extend_from_slice(key_hash);
                        buf.extend_from_slice(&subscription_id.to_le_bytes());
                        buf.extend_from_slice(&callback_gas_limit.to_le_bytes());
                    }
                    OracleConfig::Switchboard { vrf_account } => {
                        buf.push(1);
                        buf.extend_from_slice(vrf_account.as_ref());
                    }
                }
            }
            Self::EnterRaffle { amount } => {
                buf.push(5);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep {} => buf.push(6),
            Self::PerformUpkeep {} => buf.push(7),
            Self::FulfillRandomWords { request_id, words } => {
                buf.push(8);
                buf.extend_from_slice(&request_id.to_le_bytes());
                match words {
                    None => buf.push(0),
                    Some(words) => {
                        buf.push(1);
                        buf.extend_from_slice(&(words.len() as u32).to_le_bytes());
                        for word in words {
                            buf.extend_from_slice(&word.to_le_bytes());
                        }
                    }
                }
            }
            Self::FulfillFromSwitchboard { request_id } => {
                buf.push(9);
                buf.extend_from_slice(&request_id.to_le_bytes());
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        if input.len() < 8 {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(8);
        Ok((u64::from_le_bytes(*array_ref![bytes, 0, 8]), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        if input.len() < 4 {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(4);
        Ok((u32::from_le_bytes(*array_ref![bytes, 0, 4]), rest))
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        if input.len() < N {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(N);
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok((out, rest))
    }

    fn unpack_oracle(input: &[u8]) -> Result<(OracleConfig, &[u8]), ProgramError> {
        let (kind, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstructionData)?;
        match kind {
            0 => {
                let (coordinator, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (key_hash, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (callback_gas_limit, rest) = Self::unpack_u32(rest)?;
                Ok((
                    OracleConfig::Coordinator {
                        coordinator: Pubkey::new_from_array(coordinator),
                        key_hash,
                        subscription_id,
                        callback_gas_limit,
                    },
                    rest,
                ))
            }
            1 => {
                let (vrf_account, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                Ok((
                    OracleConfig::Switchboard {
                        vrf_account: Pubkey::new_from_array(vrf_account),
                    },
                    rest,
                ))
            }
            _ => Err(RaffleError::InvalidInstructionData.into()),
        }
    }
}

/// Create initialize_coordinator instruction
pub fn initialize_coordinator(
    program_id: &Pubkey,
    authority: &Pubkey,
    base_fee: u64,
    gas_price_link: u64,
) -> Instruction {
    let (coordinator, _) = Coordinator::find_address(program_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(coordinator, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::InitializeCoordinator {
            base_fee,
            gas_price_link,
        }
        .pack(),
    }
}

/// Create create_subscription instruction
pub fn create_subscription(program_id: &Pubkey, owner: &Pubkey) -> Instruction {
    let (coordinator, _) = Coordinator::find_address(program_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*owner, true),
            AccountMeta::new(coordinator, false),
        ],
        data: RaffleInstruction::CreateSubscription {}.pack(),
    }
}

/// Create fund_subscription instruction
pub fn fund_subscription(
    program_id: &Pubkey,
    funder: &Pubkey,
    subscription_id: u64,
    amount: u64,
) -> Instruction {
    let (coordinator, _) = Coordinator::find_address(program_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*funder, true),
            AccountMeta::new(coordinator, false),
        ],
        data: RaffleInstruction::FundSubscription {
            subscription_id,
            amount,
        }
        .pack(),
    }
}

/// Create add_consumer instruction
pub fn add_consumer(
    program_id: &Pubkey,
    owner: &Pubkey,
    subscription_id: u64,
    consumer: &Pubkey,
) -> Instruction {
    let (coordinator, _) = Coordinator::find_address(program_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*owner, true),
            AccountMeta::new(coordinator, false),
            AccountMeta::new_readonly(*consumer, false),
        ],
        data: RaffleInstruction::AddConsumer { subscription_id }.pack(),
    }
}

/// Create initialize_raffle instruction
pub fn initialize_raffle(
    program_id: &Pubkey,
    authority: &Pubkey,
    raffle_account: &Pubkey,
    entrance_fee: u64,
    interval: i64,
    oracle: OracleConfig,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*authority, true),
            AccountMeta::new(*raffle_account, true),
        ],
        data: RaffleInstruction::InitializeRaffle {
            entrance_fee,
            interval,
            oracle,
        }
        .pack(),
    }
}

/// Create enter_raffle instruction
pub fn enter_raffle(
    program_id: &Pubkey,
    player: &Pubkey,
    raffle_account: &Pubkey,
    amount: u64,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*player, true),
            AccountMeta::new(*raffle_account, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::EnterRaffle { amount }.pack(),
    }
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, raffle_account: &Pubkey) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*raffle_account, false)],
        data: RaffleInstruction::CheckUpkeep {}.pack(),
    }
}

/// Create perform_upkeep instruction for a raffle using `oracle`
pub fn perform_upkeep(
    program_id: &Pubkey,
    caller: &Pubkey,
    raffle_account: &Pubkey,
    oracle: &OracleConfig,
) -> Instruction {
    let oracle_meta = match oracle {
        OracleConfig::Coordinator { coordinator, .. } => AccountMeta::new(*coordinator, false),
        OracleConfig::Switchboard { vrf_account } => AccountMeta::new_readonly(*vrf_account, false),
    };
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*caller, true),
            AccountMeta::new(*raffle_account, false),
            oracle_meta,
        ],
        data: RaffleInstruction::PerformUpkeep {}.pack(),
    }
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    authority: &Pubkey,
    raffle_account: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    words: Option<Vec<u64>>,
) -> Instruction {
    let (coordinator, _) = Coordinator::find_address(program_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*authority, true),
            AccountMeta::new(coordinator, false),
            AccountMeta::new(*raffle_account, false),
            AccountMeta::new(*winner, false),
        ],
        data: RaffleInstruction::FulfillRandomWords { request_id, words }.pack(),
    }
}

/// Create fulfill_from_switchboard instruction
pub fn fulfill_from_switchboard(
    program_id: &Pubkey,
    caller: &Pubkey,
    raffle_account: &Pubkey,
    vrf_account: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*caller, true),
            AccountMeta::new(*raffle_account, false),
            AccountMeta::new_readonly(*vrf_account, false),
            AccountMeta::new(*winner, false),
        ],
        data: RaffleInstruction::FulfillFromSwitchboard { request_id }.pack(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_raffle_keeps_oracle_fields() {
        let instruction = RaffleInstruction::InitializeRaffle {
            entrance_fee: 100_000_000,
            interval: 30,
            oracle: OracleConfig::Coordinator {
                coordinator: Pubkey::new_unique(),
                key_hash: [9; 32],
                subscription_id: 1333,
                callback_gas_limit: 500_000,
            },
        };
        let packed = instruction.pack();
        assert_eq!(packed[0], 4);
        assert_eq!(RaffleInstruction::unpack(&packed).unwrap(), instruction);
    }

    #[test]
    fn fulfill_carries_override_words() {
        let instruction = RaffleInstruction::FulfillRandomWords {
            request_id: 3,
            words: Some(vec![11, 22]),
        };
        assert_eq!(
            RaffleInstruction::unpack(&instruction.pack()).unwrap(),
            instruction
        );
        let mock = RaffleInstruction::FulfillRandomWords {
            request_id: 3,
            words: None,
        };
        assert_eq!(mock.pack().len(), 1 + 8 + 1);
    }

    #[test]
    fn rejects_truncated_and_unknown_data() {
        assert!(RaffleInstruction::unpack(&[]).is_err());
        assert!(RaffleInstruction::unpack(&[5, 1, 2, 3]).is_err());
        assert!(RaffleInstruction::unpack(&[42]).is_err());
        assert!(RaffleInstruction::unpack(&[8, 1, 0, 0, 0, 0, 0, 0, 0, 2]).is_err());
    }

    #[test]
    fn rejects_oversized_word_lists() {
        let mut data = vec![8];
        data.extend_from_slice(&1u64.to_le_bytes());
        data.push(1);
        data.extend_from_slice(&(MAX_NUM_WORDS + 1).to_le_bytes());
        assert_eq!(
            RaffleInstruction::unpack(&data),
            Err(RaffleError::NumWordsTooBig.into())
        );
    }

    #[test]
    fn perform_upkeep_routes_to_oracle_account() {
        let program_id = Pubkey::new_unique();
        let vrf_account = Pubkey::new_unique();
        let instruction = perform_upkeep(
            &program_id,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &OracleConfig::Switchboard { vrf_account },
        );
        assert_eq!(instruction.accounts[2].pubkey, vrf_account);
        assert!(!instruction.accounts[2].is_writable);
    }
}
