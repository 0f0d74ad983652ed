// wallet-core/src/chains/lbr/address.rs
//
// LBR Address Module
// Keccak-256(uncompressed pubkey[1..])[12..32], mixed-case checksum (EIP-55 style)

use crate::codec::strip_hex_prefix;
use crate::crypto::hash::keccak256;
use crate::crypto::secp256k1::{private_to_public, serialize_public_key};
use crate::error::{WalletError, WalletResult};
use alloy::rlp::{Encodable, Header};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

pub const ADDRESS_LEN: usize = 20;

/// 20-byte account address, or the contract-creation sentinel.
///
/// Equality compares the checksum rendering and the variant, so two `Normal`
/// addresses are equal exactly when their bytes are.
#[derive(Debug, Clone, Copy)]
pub enum Address {
    Normal([u8; ADDRESS_LEN]),
    /// Recipient of a contract-creation transaction. Renders as `"0x"`.
    ContractDeployment,
}

impl Address {
    // =========================================================================
    // CONSTRUCTORS
    // =========================================================================

    pub fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        let array: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| {
            WalletError::Validation(format!(
                "address must be {} bytes, got {}",
                ADDRESS_LEN,
                bytes.len()
            ))
        })?;
        Ok(Address::Normal(array))
    }

    /// Parse `0x`-prefixed (or bare) 40-hex-char address, any letter case.
    pub fn parse(s: &str) -> WalletResult<Self> {
        let hex_part = strip_hex_prefix(s.trim());
        if hex_part.len() != ADDRESS_LEN * 2 {
            return Err(WalletError::Validation(format!("invalid address '{}'", s)));
        }
        let bytes = hex::decode(hex_part)
            .map_err(|_| WalletError::Validation(format!("invalid address '{}'", s)))?;
        Self::from_bytes(&bytes)
    }

    /// Address of a SEC1 public key (compressed or uncompressed).
    pub fn from_public_key(public_key: &[u8]) -> WalletResult<Self> {
        let uncompressed = serialize_public_key(public_key, false)?;
        let hash = keccak256(&uncompressed[1..]);
        Self::from_bytes(&hash[12..])
    }

    pub fn from_private_key(private_key: &[u8]) -> WalletResult<Self> {
        let public_key = private_to_public(private_key, false)?;
        Self::from_public_key(&public_key)
    }

    // =========================================================================
    // GETTERS
    // =========================================================================

    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8; ADDRESS_LEN]> {
        match self {
            Address::Normal(bytes) => Some(bytes),
            Address::ContractDeployment => None,
        }
    }

    #[inline]
    pub fn is_contract_deployment(&self) -> bool {
        matches!(self, Address::ContractDeployment)
    }

    /// Mixed-case checksum form with `0x`; `"0x"` for the sentinel.
    pub fn to_checksum(&self) -> String {
        match self {
            Address::Normal(bytes) => format!("0x{}", checksum_hex(&hex::encode(bytes))),
            Address::ContractDeployment => "0x".to_string(),
        }
    }

    /// 40 lowercase hex chars without prefix, as stored in keystore records.
    pub fn to_lowercase_hex(&self) -> String {
        match self {
            Address::Normal(bytes) => hex::encode(bytes),
            Address::ContractDeployment => String::new(),
        }
    }
}

/// Uppercase every hex letter whose nibble in keccak(lowercase hex) is ≥ 8.
pub fn checksum_hex(lowercase_hex: &str) -> String {
    let lower = lowercase_hex.to_ascii_lowercase();
    let hash = keccak256(lower.as_bytes());
    lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

/// Normalize any-case address string to its checksum form.
pub fn to_checksum_address(address: &str) -> WalletResult<String> {
    Ok(Address::parse(address)?.to_checksum())
}

/// keccak256(rlp([sender, nonce]))[12..]
pub fn calculate_contract_address(from: &Address, nonce: u64) -> WalletResult<Address> {
    let sender = from
        .as_bytes()
        .ok_or_else(|| WalletError::Validation("contract deployer must be a normal address".into()))?;

    let payload_length = sender.length() + nonce.length();
    let mut out = Vec::with_capacity(payload_length + 2);
    Header {
        list: true,
        payload_length,
    }
    .encode(&mut out);
    sender.encode(&mut out);
    nonce.encode(&mut out);

    let hash = keccak256(&out);
    Address::from_bytes(&hash[12..])
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.is_contract_deployment() == other.is_contract_deployment()
            && self.to_checksum() == other.to_checksum()
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.is_contract_deployment().hash(state);
        self.to_checksum().hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// TESTS
// =============================================================================
