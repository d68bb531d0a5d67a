// Instruction plans for deploying the raffle. Built client side and submitted
// in order by the deployer.
use solana_program::{
    instruction::Instruction, pubkey::Pubkey, rent::Rent, system_instruction,
};
use thiserror::Error;

use crate::{
    coordinator::Coordinator,
    instruction,
    network::{NetworkConfig, BASE_FEE, GAS_PRICE_LINK, SUBSCRIPTION_FUND_AMOUNT},
    state::{OracleConfig, Raffle},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error("cluster {0} needs a Switchboard VRF account")]
    MissingVrfAccount(&'static str),
}

/// Instructions plus the oracle configuration the raffle will be created with
#[derive(Clone, Debug, PartialEq)]
pub struct DeployPlan {
    pub instructions: Vec<Instruction>,
    pub oracle: OracleConfig,
}

/// Mock coordinator provisioning. Empty on live clusters.
pub fn deploy_mocks(program_id: &Pubkey, deployer: &Pubkey, config: &NetworkConfig) -> Vec<Instruction> {
    if !config.cluster.is_development() {
        return Vec::new();
    }
    vec![instruction::initialize_coordinator(
        program_id,
        deployer,
        BASE_FEE,
        GAS_PRICE_LINK,
    )]
}

/// Raffle deployment.
///
/// On development clusters this opens and funds a mock subscription and
/// registers the raffle as its consumer; `next_subscription_id` is read from
/// the coordinator account beforehand. On live clusters the raffle is bound
/// to the configured Switchboard VRF account. The raffle account keypair must
/// sign the transaction carrying the plan.
pub fn deploy_raffle(
    program_id: &Pubkey,
    deployer: &Pubkey,
    raffle_account: &Pubkey,
    rent: &Rent,
    config: &NetworkConfig,
    next_subscription_id: u64,
) -> Result<DeployPlan, DeployError> {
    let mut instructions = Vec::new();

    let oracle = if config.cluster.is_development() {
        let (coordinator, _) = Coordinator::find_address(program_id);
        instructions.push(instruction::create_subscription(program_id, deployer));
        instructions.push(instruction::fund_subscription(
            program_id,
            deployer,
            next_subscription_id,
            SUBSCRIPTION_FUND_AMOUNT,
        ));
        OracleConfig::Coordinator {
            coordinator,
            key_hash: config.key_hash,
            subscription_id: next_subscription_id,
            callback_gas_limit: config.callback_gas_limit,
        }
    } else {
        let vrf_account = config
            .vrf_account
            .ok_or(DeployError::MissingVrfAccount(config.name))?;
        OracleConfig::Switchboard { vrf_account }
    };

    instructions.push(system_instruction::create_account(
        deployer,
        raffle_account,
        rent.minimum_balance(Raffle::LEN),
        Raffle::LEN as u64,
        program_id,
    ));
    instructions.push(instruction::initialize_raffle(
        program_id,
        deployer,
        raffle_account,
        config.entrance_fee,
        config.interval,
        oracle,
    ));

    if let OracleConfig::Coordinator {
        subscription_id, ..
    } = oracle
    {
        instructions.push(instruction::add_consumer(
            program_id,
            deployer,
            subscription_id,
            raffle_account,
        ));
    }

    Ok(DeployPlan {
        instructions,
        oracle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{network_config, Cluster};

    #[test]
    fn mocks_only_on_development_clusters() {
        let program_id = Pubkey::new_unique();
        let deployer = Pubkey::new_unique();
        assert_eq!(
            deploy_mocks(&program_id, &deployer, &network_config(Cluster::Localnet)).len(),
            1
        );
        assert!(deploy_mocks(&program_id, &deployer, &network_config(Cluster::Devnet)).is_empty());
    }

    #[test]
    fn development_plan_wires_subscription() {
        let program_id = Pubkey::new_unique();
        let raffle = Pubkey::new_unique();
        let plan = deploy_raffle(
            &program_id,
            &Pubkey::new_unique(),
            &raffle,
            &Rent::default(),
            &network_config(Cluster::Localnet),
            1,
        )
        .unwrap();

        assert_eq!(plan.instructions.len(), 5);
        assert_eq!(plan.instructions[4].accounts[2].pubkey, raffle);
        match plan.oracle {
            OracleConfig::Coordinator {
                subscription_id,
                callback_gas_limit,
                ..
            } => {
                assert_eq!(subscription_id, 1);
                assert_eq!(callback_gas_limit, 500_000);
            }
            other => panic!("unexpected oracle {:?}", other),
        }
    }

    #[test]
    fn live_plan_needs_vrf_account() {
        let program_id = Pubkey::new_unique();
        let deployer = Pubkey::new_unique();
        let raffle = Pubkey::new_unique();
        let config = network_config(Cluster::Devnet);

        assert_eq!(
            deploy_raffle(&program_id, &deployer, &raffle, &Rent::default(), &config, 0),
            Err(DeployError::MissingVrfAccount("devnet"))
        );

        let vrf_account = Pubkey::new_unique();
        let plan = deploy_raffle(
            &program_id,
            &deployer,
            &raffle,
            &Rent::default(),
            &config.with_vrf_account(vrf_account),
            0,
        )
        .unwrap();
        assert_eq!(plan.instructions.len(), 2);
        assert_eq!(plan.oracle, OracleConfig::Switchboard { vrf_account });
    }
}
