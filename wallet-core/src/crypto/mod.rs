// wallet-core/src/crypto/mod.rs

//! Core Cryptography Module
//!
//! - **Mnemonic**: BIP-39 phrases in eight languages via [`Mnemonic`].
//! - **HD Keys**: BIP-32 private/public derivation and xprv/xpub export via [`HdNode`].
//! - **Derivation Paths**: parsing and well-known prefixes via [`HdPath`] and [`DerivationPaths`].
//! - **Primitives**: hashing and the secp256k1 seam (validation, signing, recovery).

pub mod hash;
pub mod hd_node;
pub mod mnemonic;
pub mod paths;
pub mod secp256k1;

// Re-exports for cleaner API access
pub use hd_node::HdNode;
pub use mnemonic::{EntropySize, Mnemonic, MnemonicLanguage};
pub use paths::{DerivationPaths, HdPath, PathComponent};
pub use secp256k1::RecoverableSignature;
