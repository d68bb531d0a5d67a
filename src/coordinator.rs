// Mock VRF coordinator for development clusters.
//
// Stands in for the oracle network: raffles request random words through it
// and the coordinator authority later delivers them. Requests are kept in a
// pending table keyed by request id and paid for from a funded subscription.
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    keccak,
    program_error::ProgramError,
    program_pack::{IsInitialized, Sealed},
    pubkey::Pubkey,
};

use crate::error::RaffleError;

/// Seed of the coordinator PDA
pub const COORDINATOR_SEED: &[u8] = b"coordinator";

pub const MAX_SUBSCRIPTIONS: usize = 8;
pub const MAX_CONSUMERS: usize = 8;
pub const MAX_PENDING_REQUESTS: usize = 16;
pub const MAX_CALLBACK_GAS_LIMIT: u32 = 2_500_000;
pub const MAX_NUM_WORDS: u32 = 500;

/// Prepaid balance paying for randomness requests
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    pub id: u64,
    pub owner: Pubkey,
    pub balance: u64,
    pub consumers: Vec<Pubkey>,
}

impl Subscription {
    const LEN: usize = 8 + 32 + 8 + 4 + 32 * MAX_CONSUMERS;
}

/// Randomness request waiting for delivery
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: u64,
    pub subscription_id: u64,
    /// Raffle account the words are delivered to
    pub consumer: Pubkey,
    pub key_hash: [u8; 32],
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

impl PendingRequest {
    const LEN: usize = 8 + 8 + 32 + 32 + 4 + 4;
}

/// Parameters of a randomness request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomWordsRequest {
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

/// Coordinator account data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub struct Coordinator {
    pub is_initialized: bool,
    /// Oracle operator allowed to deliver randomness
    pub authority: Pubkey,
    /// Flat premium per fulfillment
    pub base_fee: u64,
    /// Price per unit of callback gas
    pub gas_price_link: u64,
    pub next_subscription_id: u64,
    pub next_request_id: u64,
    pub subscriptions: Vec<Subscription>,
    pub pending: Vec<PendingRequest>,
}

impl Sealed for Coordinator {}

impl IsInitialized for Coordinator {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Coordinator {
    pub const LEN: usize = 1
        + 32
        + 8
        + 8
        + 8
        + 8
        + (4 + Subscription::LEN * MAX_SUBSCRIPTIONS)
        + (4 + PendingRequest::LEN * MAX_PENDING_REQUESTS);

    pub fn new(authority: Pubkey, base_fee: u64, gas_price_link: u64) -> Self {
        Self {
            is_initialized: true,
            authority,
            base_fee,
            gas_price_link,
            next_subscription_id: 1,
            next_request_id: 1,
            subscriptions: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Address of the coordinator PDA
    pub fn find_address(program_id: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[COORDINATOR_SEED], program_id)
    }

    pub fn load(data: &[u8]) -> Result<Self, ProgramError> {
        let coordinator = Self::deserialize(&mut &data[..])
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        if !coordinator.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(coordinator)
    }

    pub fn store(&self, data: &mut [u8]) -> Result<(), ProgramError> {
        let mut writer = data;
        self.serialize(&mut writer)
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }

    pub fn create_subscription(&mut self, owner: Pubkey) -> Result<u64, RaffleError> {
        if self.subscriptions.len() >= MAX_SUBSCRIPTIONS {
            return Err(RaffleError::CoordinatorFull);
        }
        let id = self.next_subscription_id;
        self.next_subscription_id += 1;
        self.subscriptions.push(Subscription {
            id,
            owner,
            balance: 0,
            consumers: Vec::new(),
        });
        Ok(id)
    }

    pub fn subscription(&self, id: u64) -> Option<&Subscription> {
        self.subscriptions.iter().find(|s| s.id == id)
    }

    fn subscription_mut(&mut self, id: u64) -> Result<&mut Subscription, RaffleError> {
        self.subscriptions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(RaffleError::InvalidSubscription)
    }

    /// Top up a subscription. Returns the new balance.
    pub fn fund_subscription(&mut self, id: u64, amount: u64) -> Result<u64, RaffleError> {
        let subscription = self.subscription_mut(id)?;
        subscription.balance = subscription
            .balance
            .checked_add(amount)
            .ok_or(RaffleError::InvalidSubscription)?;
        Ok(subscription.balance)
    }

    pub fn add_consumer(
        &mut self,
        id: u64,
        owner: &Pubkey,
        consumer: Pubkey,
    ) -> Result<(), RaffleError> {
        let subscription = self.subscription_mut(id)?;
        if subscription.owner != *owner {
            return Err(RaffleError::MustBeSubOwner);
        }
        if subscription.consumers.contains(&consumer) {
            return Ok(());
        }
        if subscription.consumers.len() >= MAX_CONSUMERS {
            return Err(RaffleError::CoordinatorFull);
        }
        subscription.consumers.push(consumer);
        Ok(())
    }

    /// Queue a request from `consumer`. Returns the request id.
    pub fn request_random_words(
        &mut self,
        consumer: Pubkey,
        request: &RandomWordsRequest,
    ) -> Result<u64, RaffleError> {
        let subscription = self
            .subscription(request.subscription_id)
            .ok_or(RaffleError::InvalidSubscription)?;
        if !subscription.consumers.contains(&consumer) {
            return Err(RaffleError::InvalidConsumer);
        }
        if request.callback_gas_limit > MAX_CALLBACK_GAS_LIMIT {
            return Err(RaffleError::GasLimitTooBig);
        }
        if request.num_words > MAX_NUM_WORDS {
            return Err(RaffleError::NumWordsTooBig);
        }
        if self.pending.len() >= MAX_PENDING_REQUESTS {
            return Err(RaffleError::CoordinatorFull);
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.pending.push(PendingRequest {
            request_id,
            subscription_id: request.subscription_id,
            consumer,
            key_hash: request.key_hash,
            callback_gas_limit: request.callback_gas_limit,
            num_words: request.num_words,
        });
        Ok(request_id)
    }

    /// Fee charged for delivering `request`
    pub fn fulfillment_cost(&self, request: &PendingRequest) -> Option<u64> {
        self.gas_price_link
            .checked_mul(u64::from(request.callback_gas_limit))?
            .checked_add(self.base_fee)
    }

    /// Remove `request_id` from the pending table and charge its subscription.
    /// Returns the settled request and the amount charged.
    pub fn settle_request(&mut self, request_id: u64) -> Result<(PendingRequest, u64), RaffleError> {
        let position = self
            .pending
            .iter()
            .position(|p| p.request_id == request_id)
            .ok_or(RaffleError::UnknownRequest)?;
        let request = self.pending[position];
        let payment = self
            .fulfillment_cost(&request)
            .ok_or(RaffleError::InsufficientSubscriptionBalance)?;

        let subscription = self.subscription_mut(request.subscription_id)?;
        subscription.balance = subscription
            .balance
            .checked_sub(payment)
            .ok_or(RaffleError::InsufficientSubscriptionBalance)?;

        self.pending.remove(position);
        Ok((request, payment))
    }
}

/// Words the mock delivers for `request_id` when no override is given
pub fn mock_random_words(request_id: u64, num_words: u32) -> Vec<u64> {
    (0..u64::from(num_words))
        .map(|i| {
            let hash = keccak::hashv(&[&request_id.to_le_bytes(), &i.to_le_bytes()]);
            let mut word = [0u8; 8];
            word.copy_from_slice(&hash.0[..8]);
            u64::from_le_bytes(word)
        })
        .collect()
}
