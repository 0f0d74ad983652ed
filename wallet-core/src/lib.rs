// wallet-core/src/lib.rs

//! LBR Wallet Core
//!
//! Client-side key management and signing for the LBR chain:
//!
//! - [`crypto`]: BIP-39 mnemonics, BIP-32 HD nodes, derivation paths, secp256k1 primitives.
//! - [`keystore`]: encrypted V3 / BIP-32 keystores, an in-memory plain keystore and the [`KeystoreManager`] registry.
//! - [`chains`]: network presets, addresses, transactions and the [`Signer`].
//!
//! Configuration is passed explicitly ([`WalletConfig`]); the library installs no
//! `tracing` subscriber.

pub mod chains;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod keystore;

// Re-exports for cleaner API access
pub use chains::lbr::{Address, LbrTransaction, Signer};
pub use chains::{ChainConfig, NetworkId};
pub use config::{KeystoreConfig, SignerConfig, WalletConfig};
pub use crypto::{HdNode, HdPath, Mnemonic, MnemonicLanguage};
pub use error::{WalletError, WalletResult};
pub use keystore::{AbstractKeystore, Bip32Keystore, Keystore, KeystoreManager, KeystoreV3, PlainKeystore};
