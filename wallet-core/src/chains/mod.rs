// src/chains/mod.rs
pub mod lbr;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain ID dùng cho EIP-155 replay protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub u64);

impl NetworkId {
    pub const MAINNET: NetworkId = NetworkId(1);
    pub const ROPSTEN: NetworkId = NetworkId(3);
    pub const RINKEBY: NetworkId = NetworkId(4);
    pub const KOVAN: NetworkId = NetworkId(42);

    pub const ALL: [NetworkId; 4] = [Self::MAINNET, Self::ROPSTEN, Self::RINKEBY, Self::KOVAN];

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Preset name, or `None` for a custom chain.
    pub fn name(self) -> Option<&'static str> {
        match self.0 {
            1 => Some("mainnet"),
            3 => Some("ropsten"),
            4 => Some("rinkeby"),
            42 => Some("kovan"),
            _ => None,
        }
    }
}

impl From<u64> for NetworkId {
    fn from(value: u64) -> Self {
        NetworkId(value)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

// Cấu hình chung cho một LBR network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub network_id: NetworkId,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

// Helper để tạo nhanh config cho các mạng phổ biến
impl ChainConfig {
    pub fn for_network(network_id: NetworkId) -> Self {
        let name = match network_id.name() {
            Some(name) => format!("LBR {}", name),
            None => format!("LBR chain {}", network_id.0),
        };
        Self {
            network_id,
            name,
            symbol: "LBR".to_string(),
            decimals: 18,
        }
    }

    pub fn mainnet() -> Self {
        Self::for_network(NetworkId::MAINNET)
    }

    pub fn ropsten() -> Self {
        Self::for_network(NetworkId::ROPSTEN)
    }

    pub fn rinkeby() -> Self {
        Self::for_network(NetworkId::RINKEBY)
    }

    pub fn kovan() -> Self {
        Self::for_network(NetworkId::KOVAN)
    }
}
