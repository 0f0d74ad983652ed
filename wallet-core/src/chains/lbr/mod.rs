// wallet-core/src/chains/lbr/mod.rs

//! LBR Chain Support
//!
//! - **Address**: 20-byte accounts with EIP-55 checksum display via [`Address`].
//! - **Transactions**: RLP wire encoding, signature hashing and sender recovery via [`LbrTransaction`].
//! - **Signing**: EIP-155 / legacy transaction signing and personal messages via [`Signer`].

pub mod address;
pub mod signer;
pub mod transaction;

// Re-exports for cleaner API access
pub use address::{calculate_contract_address, to_checksum_address, Address};
pub use signer::{hash_ec_recover, Signer};
pub use transaction::LbrTransaction;
