// Per-cluster deployment settings
use std::str::FromStr;

use solana_program::pubkey::Pubkey;

/// 0.1 SOL
pub const ENTRANCE_FEE: u64 = 100_000_000;
/// Seconds between draws
pub const INTERVAL: i64 = 30;
pub const CALLBACK_GAS_LIMIT: u32 = 500_000;
/// Gas lane the mock coordinator prices requests on
pub const GAS_LANE: [u8; 32] = [
    0x79, 0xd3, 0xd8, 0x83, 0x2d, 0x90, 0x45, 0x92, 0xc0, 0xbf, 0x98, 0x18, 0xb6, 0x21, 0x52, 0x2c,
    0x98, 0x8b, 0xb8, 0xb0, 0xc0, 0x5c, 0xdc, 0x3b, 0x15, 0xae, 0xa1, 0xb6, 0xe8, 0xdb, 0x0c, 0x15,
];

/// Mock coordinator premium per fulfillment: 0.25 LINK in juels
pub const BASE_FEE: u64 = 250_000_000_000_000_000;
/// Mock coordinator price per unit of callback gas
pub const GAS_PRICE_LINK: u64 = 1_000_000_000;
/// Amount a freshly created mock subscription is funded with: 2 LINK
pub const SUBSCRIPTION_FUND_AMOUNT: u64 = 2_000_000_000_000_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cluster {
    Localnet,
    Devnet,
    Mainnet,
}

/// Clusters where the mock coordinator is deployed instead of a live oracle
pub const DEVELOPMENT_CLUSTERS: &[Cluster] = &[Cluster::Localnet];

impl Cluster {
    pub fn is_development(&self) -> bool {
        DEVELOPMENT_CLUSTERS.contains(self)
    }
}

impl FromStr for Cluster {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "localnet" | "localhost" => Ok(Cluster::Localnet),
            "devnet" => Ok(Cluster::Devnet),
            "mainnet" | "mainnet-beta" => Ok(Cluster::Mainnet),
            other => Err(format!("unknown cluster: {}", other)),
        }
    }
}

/// Raffle settings for one cluster
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: &'static str,
    pub cluster: Cluster,
    pub entrance_fee: u64,
    pub interval: i64,
    pub key_hash: [u8; 32],
    pub callback_gas_limit: u32,
    /// Switchboard VRF account used on live clusters
    pub vrf_account: Option<Pubkey>,
}

impl NetworkConfig {
    pub fn with_vrf_account(mut self, vrf_account: Pubkey) -> Self {
        self.vrf_account = Some(vrf_account);
        self
    }
}

pub fn network_config(cluster: Cluster) -> NetworkConfig {
    let name = match cluster {
        Cluster::Localnet => "localnet",
        Cluster::Devnet => "devnet",
        Cluster::Mainnet => "mainnet",
    };
    NetworkConfig {
        name,
        cluster,
        entrance_fee: ENTRANCE_FEE,
        interval: INTERVAL,
        key_hash: GAS_LANE,
        callback_gas_limit: CALLBACK_GAS_LIMIT,
        vrf_account: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_localnet_is_development() {
        assert!(Cluster::Localnet.is_development());
        assert!(!Cluster::Devnet.is_development());
        assert!(!Cluster::Mainnet.is_development());
    }

    #[test]
    fn parses_cluster_names() {
        assert_eq!("localhost".parse::<Cluster>(), Ok(Cluster::Localnet));
        assert_eq!("mainnet-beta".parse::<Cluster>(), Ok(Cluster::Mainnet));
        assert!("goerli".parse::<Cluster>().is_err());
    }

    #[test]
    fn presets_share_raffle_parameters() {
        let config = network_config(Cluster::Devnet);
        assert_eq!(config.entrance_fee, 100_000_000);
        assert_eq!(config.interval, 30);
        assert_eq!(config.vrf_account, None);
    }
}
