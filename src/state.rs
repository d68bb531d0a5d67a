use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Sealed},
    pubkey::Pubkey,
};

use crate::error::RaffleError;

/// Random words requested per draw
pub const NUM_WORDS: u32 = 1;
/// Block confirmations asked of the coordinator before it answers
pub const REQUEST_CONFIRMATIONS: u16 = 3;
/// Entrants a single raffle account can hold
pub const MAX_ENTRANTS: usize = 100;

/// Lifecycle state of a raffle
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entries
    Open,
    /// Randomness requested, waiting for fulfillment
    Calculating,
}

/// Where a raffle gets its randomness from, fixed at initialization
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OracleConfig {
    /// In-program VRF coordinator (development clusters)
    Coordinator {
        /// Coordinator account
        coordinator: Pubkey,
        /// Gas lane the request is priced on
        key_hash: [u8; 32],
        /// Funded subscription paying for requests
        subscription_id: u64,
        /// Gas budget for the fulfillment callback
        callback_gas_limit: u32,
    },
    /// Switchboard VRF account answered by the Switchboard oracles
    Switchboard {
        /// VRF account holding the result buffer
        vrf_account: Pubkey,
    },
}

impl OracleConfig {
    const LEN: usize = 1 + 32 + 32 + 8 + 4;
}

/// Raffle account data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Deployer of the raffle
    pub authority: Pubkey,
    /// Minimum payment to enter, in lamports
    pub entrance_fee: u64,
    /// Minimum seconds between payouts
    pub interval: i64,
    /// Randomness source
    pub oracle: OracleConfig,
    /// Lifecycle state
    pub state: RaffleState,
    /// Time of the last payout (initialization time before the first one)
    pub last_timestamp: UnixTimestamp,
    /// Winner of the last draw
    pub recent_winner: Pubkey,
    /// Outstanding randomness request, present only while calculating
    pub pending_request: Option<u64>,
    /// Local request id source for the Switchboard path
    pub request_counter: u64,
    /// Switchboard VRF round current when the draw started; only a later round settles it
    pub vrf_round: u128,
    /// Players of the current round, in entry order
    pub entrants: Vec<Pubkey>,
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Raffle {
    /// Space to allocate for a raffle account
    pub const LEN: usize =
        1 + 32 + 8 + 8 + OracleConfig::LEN + 1 + 8 + 32 + (1 + 8) + 8 + 16 + (4 + 32 * MAX_ENTRANTS);

    /// Create a new open raffle
    pub fn new(
        authority: Pubkey,
        entrance_fee: u64,
        interval: i64,
        oracle: OracleConfig,
        now: UnixTimestamp,
    ) -> Self {
        Self {
            is_initialized: true,
            authority,
            entrance_fee,
            interval,
            oracle,
            state: RaffleState::Open,
            last_timestamp: now,
            recent_winner: Pubkey::default(),
            pending_request: None,
            request_counter: 0,
            vrf_round: 0,
            entrants: Vec::new(),
        }
    }

    /// Read an initialized raffle from account data
    pub fn load(data: &[u8]) -> Result<Self, ProgramError> {
        let raffle = Self::deserialize(&mut &data[..])
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        if !raffle.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(raffle)
    }

    /// Write the raffle into account data
    pub fn store(&self, data: &mut [u8]) -> Result<(), ProgramError> {
        let mut writer = data;
        self.serialize(&mut writer)
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }

    pub fn entrance_fee(&self) -> u64 {
        self.entrance_fee
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn raffle_state(&self) -> RaffleState {
        self.state
    }

    pub fn number_of_players(&self) -> usize {
        self.entrants.len()
    }

    /// Entrant at `index`, `None` past the end of the current round
    pub fn player(&self, index: usize) -> Option<&Pubkey> {
        self.entrants.get(index)
    }

    pub fn recent_winner(&self) -> &Pubkey {
        &self.recent_winner
    }

    pub fn latest_timestamp(&self) -> UnixTimestamp {
        self.last_timestamp
    }

    /// Add `player` to the current round
    pub fn enter(&mut self, player: Pubkey, payment: u64) -> Result<(), RaffleError> {
        if payment < self.entrance_fee {
            return Err(RaffleError::InsufficientPayment);
        }
        if self.state != RaffleState::Open {
            return Err(RaffleError::NotOpen);
        }
        if self.entrants.len() >= MAX_ENTRANTS {
            return Err(RaffleError::RaffleFull);
        }
        self.entrants.push(player);
        Ok(())
    }

    /// Whether a draw should be started. `balance` is the prize pot in lamports.
    pub fn check_upkeep(&self, now: UnixTimestamp, balance: u64) -> bool {
        let is_open = self.state == RaffleState::Open;
        let time_passed = now.saturating_sub(self.last_timestamp) >= self.interval;
        let has_players = !self.entrants.is_empty();
        let has_balance = balance > 0;
        is_open && time_passed && has_players && has_balance
    }

    /// Move to `Calculating` with `request_id` as the outstanding request
    pub fn begin_draw(&mut self, request_id: u64) {
        self.state = RaffleState::Calculating;
        self.pending_request = Some(request_id);
    }

    /// Next id for a request the raffle numbers itself
    pub fn next_local_request_id(&mut self) -> u64 {
        self.request_counter = self.request_counter.saturating_add(1);
        self.request_counter
    }

    /// Pick the winner for `request_id` and reset the round. Returns the winner.
    pub fn settle(
        &mut self,
        request_id: u64,
        random_words: &[u64],
        now: UnixTimestamp,
    ) -> Result<Pubkey, RaffleError> {
        if self.state != RaffleState::Calculating || self.pending_request != Some(request_id) {
            return Err(RaffleError::UnknownRequest);
        }
        let random_value = *random_words.first().ok_or(RaffleError::InvalidRandomWords)?;
        let index = select_winner(random_value, self.entrants.len())
            .ok_or(RaffleError::UnknownRequest)?;
        let winner = self.entrants[index];

        self.recent_winner = winner;
        self.entrants.clear();
        self.state = RaffleState::Open;
        self.pending_request = None;
        self.last_timestamp = now;
        Ok(winner)
    }
}

/// Index of the winning entrant for `random_value`, `None` when nobody entered
pub fn select_winner(random_value: u64, entrant_count: usize) -> Option<usize> {
    if entrant_count == 0 {
        return None;
    }
    Some((random_value % entrant_count as u64) as usize)
}
