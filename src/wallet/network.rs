//! Known EVM networks by chain id.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u64", from = "u64")]
pub enum Network {
    Mainnet,
    Ropsten,
    #[default]
    Rinkeby,
    Goerli,
    Sepolia,
    Other(u64),
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Ropsten => 3,
            Network::Rinkeby => 4,
            Network::Goerli => 5,
            Network::Sepolia => 11_155_111,
            Network::Other(id) => *id,
        }
    }

    pub fn from_chain_id(id: u64) -> Self {
        match id {
            1 => Network::Mainnet,
            3 => Network::Ropsten,
            4 => Network::Rinkeby,
            5 => Network::Goerli,
            11_155_111 => Network::Sepolia,
            other => Network::Other(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Ropsten => "ropsten",
            Network::Rinkeby => "rinkeby",
            Network::Goerli => "goerli",
            Network::Sepolia => "sepolia",
            Network::Other(_) => "unknown",
        }
    }

    /// Accepts a network name or a decimal chain id.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        match value.as_str() {
            "mainnet" | "homestead" => Some(Network::Mainnet),
            "ropsten" => Some(Network::Ropsten),
            "rinkeby" => Some(Network::Rinkeby),
            "goerli" => Some(Network::Goerli),
            "sepolia" => Some(Network::Sepolia),
            other => other.parse::<u64>().ok().map(Network::from_chain_id),
        }
    }
}

impl From<Network> for u64 {
    fn from(network: Network) -> u64 { network.chain_id() }
}

impl From<u64> for Network {
    fn from(id: u64) -> Self { Network::from_chain_id(id) }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Other(id) => write!(f, "chain {id}"),
            named => write!(f, "{} ({})", named.as_str(), named.chain_id()),
        }
    }
}
