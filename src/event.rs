// Notifications observers and tests listen for
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    /// A player joined the current round
    RaffleEnter { player: Pubkey },
    /// A draw started and randomness was requested
    RequestedRaffleWinner { request_id: u64 },
    /// The pot was paid out
    WinnerPicked { winner: Pubkey },
    SubscriptionCreated { subscription_id: u64, owner: Pubkey },
    SubscriptionFunded { subscription_id: u64, old_balance: u64, new_balance: u64 },
    ConsumerAdded { subscription_id: u64, consumer: Pubkey },
    RandomWordsRequested {
        request_id: u64,
        subscription_id: u64,
        consumer: Pubkey,
        key_hash: [u8; 32],
        request_confirmations: u16,
        callback_gas_limit: u32,
        num_words: u32,
    },
    RandomWordsFulfilled { request_id: u64, payment: u64 },
}

impl RaffleEvent {
    /// Log name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Self::RaffleEnter { .. } => "RaffleEnter",
            Self::RequestedRaffleWinner { .. } => "RequestedRaffleWinner",
            Self::WinnerPicked { .. } => "WinnerPicked",
            Self::SubscriptionCreated { .. } => "SubscriptionCreated",
            Self::SubscriptionFunded { .. } => "SubscriptionFunded",
            Self::ConsumerAdded { .. } => "ConsumerAdded",
            Self::RandomWordsRequested { .. } => "RandomWordsRequested",
            Self::RandomWordsFulfilled { .. } => "RandomWordsFulfilled",
        }
    }

    /// Write the event to the program log, readable and as borsh data
    pub fn emit(&self) {
        msg!("Event: {}", self.name());
        if let Ok(data) = self.try_to_vec() {
            sol_log_data(&[&data]);
        }
    }
}
