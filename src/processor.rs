use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::{
    coordinator::{mock_random_words, Coordinator, RandomWordsRequest, COORDINATOR_SEED},
    error::RaffleError,
    event::RaffleEvent,
    instruction::RaffleInstruction,
    state::{OracleConfig, Raffle, NUM_WORDS, REQUEST_CONFIRMATIONS},
    vrf,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeCoordinator {
                base_fee,
                gas_price_link,
            } => {
                msg!("Instruction: Initialize Coordinator");
                Self::process_initialize_coordinator(accounts, base_fee, gas_price_link, program_id)
            }
            RaffleInstruction::CreateSubscription {} => {
                msg!("Instruction: Create Subscription");
                Self::process_create_subscription(accounts, program_id)
            }
            RaffleInstruction::FundSubscription {
                subscription_id,
                amount,
            } => {
                msg!("Instruction: Fund Subscription");
                Self::process_fund_subscription(accounts, subscription_id, amount, program_id)
            }
            RaffleInstruction::AddConsumer { subscription_id } => {
                msg!("Instruction: Add Consumer");
                Self::process_add_consumer(accounts, subscription_id, program_id)
            }
            RaffleInstruction::InitializeRaffle {
                entrance_fee,
                interval,
                oracle,
            } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(accounts, entrance_fee, interval, oracle, program_id)
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep {} => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            RaffleInstruction::PerformUpkeep {} => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            RaffleInstruction::FulfillRandomWords { request_id, words } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, words, program_id)
            }
            RaffleInstruction::FulfillFromSwitchboard { request_id } => {
                msg!("Instruction: Fulfill From Switchboard");
                Self::process_fulfill_from_switchboard(accounts, request_id, program_id)
            }
        }
    }

    /// Creates the coordinator PDA. Called once per program deployment on
    /// development clusters.
    fn process_initialize_coordinator(
        accounts: &[AccountInfo],
        base_fee: u64,
        gas_price_link: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            msg!("Authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_coordinator, bump_seed) = Coordinator::find_address(program_id);
        if *coordinator_info.key != expected_coordinator {
            msg!("Invalid coordinator account address");
            return Err(ProgramError::InvalidArgument);
        }

        if coordinator_info.owner == program_id {
            msg!("Coordinator account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let rent = Rent::get()?;
        invoke_signed(
            &system_instruction::create_account(
                authority_info.key,
                coordinator_info.key,
                rent.minimum_balance(Coordinator::LEN),
                Coordinator::LEN as u64,
                program_id,
            ),
            &[
                authority_info.clone(),
                coordinator_info.clone(),
                system_program_info.clone(),
            ],
            &[&[COORDINATOR_SEED, &[bump_seed]]],
        )?;

        let coordinator = Coordinator::new(*authority_info.key, base_fee, gas_price_link);
        coordinator.store(&mut coordinator_info.data.borrow_mut())?;

        msg!(
            "Coordinator initialized: Authority={}, BaseFee={}, GasPriceLink={}",
            authority_info.key,
            base_fee,
            gas_price_link
        );
        Ok(())
    }

    fn process_create_subscription(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;

        if !owner_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut coordinator = Self::load_coordinator(coordinator_info, program_id)?;
        let subscription_id = coordinator.create_subscription(*owner_info.key)?;
        coordinator.store(&mut coordinator_info.data.borrow_mut())?;

        RaffleEvent::SubscriptionCreated {
            subscription_id,
            owner: *owner_info.key,
        }
        .emit();
        msg!("Subscription {} created", subscription_id);
        Ok(())
    }

    fn process_fund_subscription(
        accounts: &[AccountInfo],
        subscription_id: u64,
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let funder_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;

        if !funder_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut coordinator = Self::load_coordinator(coordinator_info, program_id)?;
        let new_balance = coordinator.fund_subscription(subscription_id, amount)?;
        coordinator.store(&mut coordinator_info.data.borrow_mut())?;

        RaffleEvent::SubscriptionFunded {
            subscription_id,
            old_balance: new_balance - amount,
            new_balance,
        }
        .emit();
        Ok(())
    }

    fn process_add_consumer(
        accounts: &[AccountInfo],
        subscription_id: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let consumer_info = next_account_info(account_info_iter)?;

        if !owner_info.is_signer {
            msg!("Subscription owner must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut coordinator = Self::load_coordinator(coordinator_info, program_id)?;
        coordinator.add_consumer(subscription_id, owner_info.key, *consumer_info.key)?;
        coordinator.store(&mut coordinator_info.data.borrow_mut())?;

        RaffleEvent::ConsumerAdded {
            subscription_id,
            consumer: *consumer_info.key,
        }
        .emit();
        Ok(())
    }

    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        entrance_fee: u64,
        interval: i64,
        oracle: OracleConfig,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            msg!("Authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if !raffle_info.is_signer {
            msg!("Raffle account must sign its initialization");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        if raffle_info.data_len() < Raffle::LEN {
            msg!("Raffle account needs {} bytes", Raffle::LEN);
            return Err(ProgramError::AccountDataTooSmall);
        }

        if Raffle::load(&raffle_info.data.borrow()).is_ok() {
            msg!("Raffle account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let rent = Rent::get()?;
        if !rent.is_exempt(raffle_info.lamports(), raffle_info.data_len()) {
            return Err(ProgramError::AccountNotRentExempt);
        }

        if interval <= 0 {
            return Err(RaffleError::InvalidInterval.into());
        }

        let clock = Clock::get()?;
        let raffle = Raffle::new(
            *authority_info.key,
            entrance_fee,
            interval,
            oracle,
            clock.unix_timestamp,
        );
        raffle.store(&mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: EntranceFee={}, Interval={}s, Oracle={:?}",
            entrance_fee,
            interval,
            oracle
        );
        Ok(())
    }

    fn process_enter_raffle(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        if let Err(e) = raffle.enter(*player_info.key, amount) {
            msg!(
                "Entry rejected: paid {} lamports, fee {}, state {:?}",
                amount,
                raffle.entrance_fee,
                raffle.state
            );
            return Err(e.into());
        }

        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, amount),
            &[
                player_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        raffle.store(&mut raffle_info.data.borrow_mut())?;

        RaffleEvent::RaffleEnter {
            player: *player_info.key,
        }
        .emit();
        msg!(
            "Player {} entered with {} lamports ({} players)",
            player_info.key,
            amount,
            raffle.number_of_players()
        );
        Ok(())
    }

    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        let raffle = Self::load_raffle(raffle_info, program_id)?;
        let clock = Clock::get()?;
        let pot = Self::prize_pot(raffle_info)?;
        let upkeep_needed = raffle.check_upkeep(clock.unix_timestamp, pot);

        msg!("Upkeep needed: {}", upkeep_needed);
        set_return_data(&[upkeep_needed as u8]);
        Ok(())
    }

    /// Starts a draw. Anyone may call this; the upkeep predicate is the only gate.
    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let oracle_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        let clock = Clock::get()?;
        let pot = Self::prize_pot(raffle_info)?;

        if !raffle.check_upkeep(clock.unix_timestamp, pot) {
            msg!(
                "Upkeep not needed: balance={}, players={}, state={:?}",
                pot,
                raffle.number_of_players(),
                raffle.state
            );
            return Err(RaffleError::UpkeepNotNeeded.into());
        }

        let request_id = match raffle.oracle {
            OracleConfig::Coordinator {
                coordinator,
                key_hash,
                subscription_id,
                callback_gas_limit,
            } => {
                if *oracle_info.key != coordinator {
                    msg!("Coordinator account does not match the raffle configuration");
                    return Err(RaffleError::OracleMismatch.into());
                }
                let mut coordinator = Self::load_coordinator(oracle_info, program_id)?;
                let request = RandomWordsRequest {
                    key_hash,
                    subscription_id,
                    request_confirmations: REQUEST_CONFIRMATIONS,
                    callback_gas_limit,
                    num_words: NUM_WORDS,
                };
                let request_id = coordinator.request_random_words(*raffle_info.key, &request)?;
                coordinator.store(&mut oracle_info.data.borrow_mut())?;

                RaffleEvent::RandomWordsRequested {
                    request_id,
                    subscription_id,
                    consumer: *raffle_info.key,
                    key_hash,
                    request_confirmations: REQUEST_CONFIRMATIONS,
                    callback_gas_limit,
                    num_words: NUM_WORDS,
                }
                .emit();
                request_id
            }
            OracleConfig::Switchboard { vrf_account } => {
                if *oracle_info.key != vrf_account {
                    msg!("VRF account does not match the raffle configuration");
                    return Err(RaffleError::OracleMismatch.into());
                }
                // The Switchboard crank requests randomness for the VRF account off-chain.
                // Rounds up to the current one were visible to entrants and cannot settle this draw.
                raffle.vrf_round = vrf::current_round(oracle_info)?;
                raffle.next_local_request_id()
            }
        };

        raffle.begin_draw(request_id);
        raffle.store(&mut raffle_info.data.borrow_mut())?;

        RaffleEvent::RequestedRaffleWinner { request_id }.emit();
        msg!("Randomness requested: request id {}", request_id);
        Ok(())
    }

    /// Delivers randomness from the mock coordinator to the raffle that asked for it
    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        words: Option<Vec<u64>>,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut coordinator = Self::load_coordinator(coordinator_info, program_id)?;
        if coordinator.authority != *authority_info.key {
            msg!("Only the coordinator authority can deliver randomness");
            return Err(RaffleError::NotCoordinatorAuthority.into());
        }

        let (request, payment) = coordinator.settle_request(request_id)?;
        if request.consumer != *raffle_info.key {
            msg!("Request {} belongs to consumer {}", request_id, request.consumer);
            return Err(RaffleError::OracleMismatch.into());
        }

        let words = match words {
            Some(words) => {
                if words.len() != request.num_words as usize {
                    msg!("Expected {} words, got {}", request.num_words, words.len());
                    return Err(RaffleError::InvalidRandomWords.into());
                }
                words
            }
            None => mock_random_words(request_id, request.num_words),
        };

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        match raffle.oracle {
            OracleConfig::Coordinator {
                coordinator: configured,
                ..
            } if configured == *coordinator_info.key => {}
            _ => {
                msg!("Raffle does not take randomness from this coordinator");
                return Err(RaffleError::OracleMismatch.into());
            }
        }

        Self::settle_draw(raffle_info, winner_info, &mut raffle, request_id, &words)?;

        coordinator.store(&mut coordinator_info.data.borrow_mut())?;
        RaffleEvent::RandomWordsFulfilled { request_id, payment }.emit();
        Ok(())
    }

    fn process_fulfill_from_switchboard(
        accounts: &[AccountInfo],
        request_id: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let vrf_account_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        match raffle.oracle {
            OracleConfig::Switchboard { vrf_account } if vrf_account == *vrf_account_info.key => {}
            _ => {
                msg!("VRF account does not match the one registered with this raffle");
                return Err(RaffleError::OracleMismatch.into());
            }
        }

        let result = vrf::read_vrf_result(vrf_account_info, raffle.vrf_round)?;
        let words = vrf::words_from_result(&result);
        Self::settle_draw(raffle_info, winner_info, &mut raffle, request_id, &words)
    }

    /// Picks the winner, moves the pot and reopens the raffle
    fn settle_draw(
        raffle_info: &AccountInfo,
        winner_info: &AccountInfo,
        raffle: &mut Raffle,
        request_id: u64,
        words: &[u64],
    ) -> ProgramResult {
        let clock = Clock::get()?;
        let players = raffle.number_of_players();
        let winner = raffle.settle(request_id, words, clock.unix_timestamp)?;

        if winner != *winner_info.key {
            msg!("Selected entrant {} but winner account is {}", winner, winner_info.key);
            return Err(RaffleError::WinnerAccountMismatch.into());
        }

        let prize = Self::pay_out(raffle_info, winner_info)?;
        raffle.store(&mut raffle_info.data.borrow_mut())?;

        RaffleEvent::WinnerPicked { winner }.emit();
        msg!(
            "Winner picked: {} won {} lamports from {} players",
            winner,
            prize,
            players
        );
        Ok(())
    }

    /// Moves everything above the rent reserve from the raffle to the winner
    fn pay_out(raffle_info: &AccountInfo, winner_info: &AccountInfo) -> Result<u64, ProgramError> {
        if !winner_info.is_writable {
            msg!("Winner account must be writable");
            return Err(RaffleError::PayoutTransferFailed.into());
        }

        let rent = Rent::get()?;
        let reserve = rent.minimum_balance(raffle_info.data_len());
        let prize = raffle_info
            .lamports()
            .checked_sub(reserve)
            .ok_or(RaffleError::PayoutTransferFailed)?;
        let winner_balance = winner_info
            .lamports()
            .checked_add(prize)
            .ok_or(RaffleError::PayoutTransferFailed)?;

        **raffle_info.try_borrow_mut_lamports()? = reserve;
        **winner_info.try_borrow_mut_lamports()? = winner_balance;
        Ok(prize)
    }

    /// Lamports in the raffle account above its rent reserve
    fn prize_pot(raffle_info: &AccountInfo) -> Result<u64, ProgramError> {
        let rent = Rent::get()?;
        Ok(raffle_info
            .lamports()
            .saturating_sub(rent.minimum_balance(raffle_info.data_len())))
    }

    fn load_raffle(raffle_info: &AccountInfo, program_id: &Pubkey) -> Result<Raffle, ProgramError> {
        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }
        Raffle::load(&raffle_info.data.borrow())
    }

    fn load_coordinator(
        coordinator_info: &AccountInfo,
        program_id: &Pubkey,
    ) -> Result<Coordinator, ProgramError> {
        let (expected_coordinator, _) = Coordinator::find_address(program_id);
        if *coordinator_info.key != expected_coordinator {
            msg!("Invalid coordinator account address");
            return Err(ProgramError::InvalidArgument);
        }
        if coordinator_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }
        Coordinator::load(&coordinator_info.data.borrow())
    }
}
