// Interval raffle on Solana
// Players pay an entrance fee; once the interval has passed anyone can start a
// draw, and verifiable randomness picks the entrant who takes the whole pot.

pub mod coordinator;
pub mod deploy;
pub mod error;
pub mod event;
pub mod instruction;
pub mod network;
pub mod processor;
pub mod state;
pub mod vrf;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

#[cfg(not(feature = "no-entrypoint"))]
solana_program::entrypoint!(process_instruction);

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
