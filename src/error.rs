use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the Raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Payment below the entrance fee
    #[error("Not enough lamports entered")]
    InsufficientPayment,

    /// Entry attempted while a draw is in flight
    #[error("Raffle is not open")]
    NotOpen,

    /// Perform upkeep called while the upkeep predicate is false
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// Fulfillment for a request that is not outstanding
    #[error("nonexistent request")]
    UnknownRequest,

    /// Moving the pot to the winner failed
    #[error("Payout transfer failed")]
    PayoutTransferFailed,

    /// The entrants list is at capacity
    #[error("Raffle is full")]
    RaffleFull,

    /// Fulfillment delivered no random words
    #[error("No random words delivered")]
    InvalidRandomWords,

    /// The winner account does not match the selected entrant
    #[error("Winner account does not match the selected entrant")]
    WinnerAccountMismatch,

    /// The randomness source account does not match the raffle configuration
    #[error("Randomness source does not match the raffle configuration")]
    OracleMismatch,

    /// Interval must be positive
    #[error("Invalid interval")]
    InvalidInterval,

    /// Subscription id not known to the coordinator
    #[error("Invalid subscription")]
    InvalidSubscription,

    /// Only the subscription owner may manage it
    #[error("Must be subscription owner")]
    MustBeSubOwner,

    /// Requesting consumer is not registered on the subscription
    #[error("Invalid consumer")]
    InvalidConsumer,

    /// Subscription cannot pay for the fulfillment
    #[error("Insufficient subscription balance")]
    InsufficientSubscriptionBalance,

    /// Requested callback gas limit above the coordinator maximum
    #[error("Gas limit too big")]
    GasLimitTooBig,

    /// Requested more words than the coordinator allows
    #[error("Num words too big")]
    NumWordsTooBig,

    /// A coordinator table is at capacity
    #[error("Coordinator capacity reached")]
    CoordinatorFull,

    /// Only the coordinator authority can deliver randomness
    #[error("Only the coordinator authority can deliver randomness")]
    NotCoordinatorAuthority,

    /// Randomness from the VRF account is not available yet
    #[error("VRF result not ready")]
    VrfResultNotReady,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_codes_follow_declaration_order() {
        assert_eq!(
            ProgramError::from(RaffleError::InvalidInstructionData),
            ProgramError::Custom(0)
        );
        assert_eq!(
            ProgramError::from(RaffleError::UnknownRequest),
            ProgramError::Custom(4)
        );
    }

    #[test]
    fn unknown_request_reads_like_the_coordinator() {
        assert_eq!(RaffleError::UnknownRequest.to_string(), "nonexistent request");
    }
}
