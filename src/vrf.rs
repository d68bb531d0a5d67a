// Switchboard VRF integration for live clusters
use solana_program::{account_info::AccountInfo, msg, program_error::ProgramError};
use switchboard_v2::{VrfAccountData, VrfStatus, SWITCHBOARD_PROGRAM_ID};

use crate::error::RaffleError;

fn load_vrf<'a>(
    vrf_account_info: &'a AccountInfo,
) -> Result<std::cell::Ref<'a, VrfAccountData>, ProgramError> {
    if vrf_account_info.owner != &SWITCHBOARD_PROGRAM_ID {
        msg!("VRF account not owned by Switchboard program");
        return Err(ProgramError::IllegalOwner);
    }
    Ok(VrfAccountData::new(vrf_account_info)?)
}

/// Round id the VRF account is currently on. Recorded when a draw starts.
pub fn current_round(vrf_account_info: &AccountInfo) -> Result<u128, ProgramError> {
    let vrf_account = load_vrf(vrf_account_info)?;
    Ok(vrf_account.get_current_randomness_round_id())
}

/// Accept a VRF round only if it was requested after `requested_after` and
/// the oracles finished verifying it
pub fn ensure_fresh_round(
    round: u128,
    status: VrfStatus,
    requested_after: u128,
) -> Result<(), RaffleError> {
    if round <= requested_after {
        msg!(
            "VRF round {} is not newer than round {} seen when the draw started",
            round,
            requested_after
        );
        return Err(RaffleError::VrfResultNotReady);
    }
    match status {
        VrfStatus::StatusVerified | VrfStatus::StatusCallbackSuccess => Ok(()),
        _ => {
            msg!("VRF round {} is not verified yet", round);
            Err(RaffleError::VrfResultNotReady)
        }
    }
}

/// Read the result of a Switchboard VRF round started after `requested_after`.
///
/// The account must be owned by the Switchboard program. A round that is
/// older, unverified or still has an empty buffer is not ready.
pub fn read_vrf_result(
    vrf_account_info: &AccountInfo,
    requested_after: u128,
) -> Result<[u8; 32], ProgramError> {
    let vrf_account = load_vrf(vrf_account_info)?;
    let status = vrf_account.status;
    ensure_fresh_round(
        vrf_account.get_current_randomness_round_id(),
        status,
        requested_after,
    )?;

    let result = vrf_account.get_result().map_err(|_| {
        msg!("VRF account does not have a result yet");
        RaffleError::VrfResultNotReady
    })?;
    Ok(result)
}

/// Split a 32 byte VRF result into little-endian random words
pub fn words_from_result(result: &[u8; 32]) -> Vec<u64> {
    result
        .chunks_exact(8)
        .map(|chunk| {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            u64::from_le_bytes(word)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_word_is_leading_bytes() {
        let mut result = [0u8; 32];
        result[0] = 5;
        result[8] = 1;
        let words = words_from_result(&result);
        assert_eq!(words.len(), 4);
        assert_eq!(words[0], 5);
        assert_eq!(words[1], 1);
    }

    #[test]
    fn rounds_from_before_the_draw_are_rejected() {
        assert_eq!(
            ensure_fresh_round(4, VrfStatus::StatusVerified, 4),
            Err(RaffleError::VrfResultNotReady)
        );
        assert_eq!(
            ensure_fresh_round(3, VrfStatus::StatusCallbackSuccess, 4),
            Err(RaffleError::VrfResultNotReady)
        );
        assert_eq!(ensure_fresh_round(5, VrfStatus::StatusVerified, 4), Ok(()));
    }

    #[test]
    fn unverified_rounds_are_rejected() {
        for status in [
            VrfStatus::StatusNone,
            VrfStatus::StatusRequesting,
            VrfStatus::StatusVerifying,
            VrfStatus::StatusVerifyFailure,
        ] {
            assert_eq!(
                ensure_fresh_round(1, status, 0),
                Err(RaffleError::VrfResultNotReady)
            );
        }
        assert_eq!(ensure_fresh_round(1, VrfStatus::StatusCallbackSuccess, 0), Ok(()));
    }
}
