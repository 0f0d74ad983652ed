// wallet-core/src/error.rs

use thiserror::Error;

pub type WalletResult<T> = std::result::Result<T, WalletError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("Mnemonic Error: {0}")]
    Mnemonic(#[from] MnemonicError),

    #[error("Cryptography Error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Keystore Error: {0}")]
    Keystore(#[from] KeystoreError),

    #[error("Signer Error: {0}")]
    Signer(#[from] SignerError),

    #[error("Validation Error: {0}")]
    Validation(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MnemonicError {
    #[error("Invalid entropy size: {0} bits. Expected 128, 160, 192, 224 or 256.")]
    InvalidEntropySize(usize),

    #[error("Not enough words: {0}. At least 12 words are required.")]
    NotEnoughWords(usize),

    #[error("Invalid word count: {0}. Word count must be a multiple of 3.")]
    InvalidWordCount(usize),

    #[error("Word '{0}' not found in the wordlist.")]
    WordNotFound(String),

    #[error("Invalid bit length: {0}. Must be a multiple of 33.")]
    InvalidBitLength(usize),

    #[error("Checksum mismatch: computed {computed}, expected {expected}")]
    ChecksumMismatch { computed: String, expected: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid seed size: {0} bytes. At least 16 bytes are required.")]
    InvalidSeedSize(usize),

    #[error("Invalid secp256k1 private key")]
    InvalidPrivateKey,

    #[error("Invalid secp256k1 public key")]
    InvalidPublicKey,

    #[error("Invalid compressed public key prefix: 0x{0:02x}")]
    InvalidPublicKeyPrefix(u8),

    #[error("Private derivation requires a node with a private key")]
    MustProvidePrivateKey,

    #[error("Hardened derivation requires a private key")]
    HardenedDerivationRequiresPrivateKey,

    #[error("Child index is too big")]
    IndexTooBig,

    #[error("Derivation depth is too big")]
    DepthTooBig,

    #[error("Path component is not numeric: '{0}'")]
    PathComponentNotNumeric(String),

    #[error("Invalid extended key length: {0} bytes. Expected 82.")]
    InvalidExtendedKeyLength(usize),

    #[error("Extended key checksum mismatch")]
    InvalidExtendedKeyChecksum,

    #[error("Unknown extended key version prefix")]
    InvalidExtendedKeyVersion,

    #[error("Invalid base58: {0}")]
    InvalidBase58(String),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Random byte generation failed: {0}")]
    RandomnessUnavailable(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeystoreError {
    #[error("Decryption failed: wrong password or corrupted keystore")]
    DecryptionFailed,

    #[error("Corrupted keystore: {0}")]
    CorruptedKeystore(String),

    #[error("Unsupported KDF: {0}")]
    UnsupportedKdf(String),

    #[error("Unsupported PRF: {0}")]
    UnsupportedPrf(String),

    #[error("Unsupported cipher: {0}")]
    UnsupportedCipher(String),

    #[error("Unsupported keystore version: {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid KDF parameters: {0}")]
    InvalidKdfParams(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Keystore is not an HD keystore")]
    NotHdKeystore,

    #[error("JSON error: {0}")]
    Json(String),

    #[error("IO error: {0}")]
    Io(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignerError {
    #[error("Invalid signature length: {0} bytes. Expected 65.")]
    InvalidSignatureLength(usize),

    #[error("Signature verification failed after all attempts")]
    SignatureVerificationFailed,

    #[error("Public key recovery failed: {0}")]
    RecoveryFailed(String),
}

impl From<serde_json::Error> for KeystoreError {
    fn from(e: serde_json::Error) -> Self {
        KeystoreError::Json(e.to_string())
    }
}

impl From<std::io::Error> for KeystoreError {
    fn from(e: std::io::Error) -> Self {
        KeystoreError::Io(e.to_string())
    }
}

impl From<hex::FromHexError> for CryptoError {
    fn from(e: hex::FromHexError) -> Self {
        CryptoError::InvalidHex(e.to_string())
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(e: serde_json::Error) -> Self {
        WalletError::Keystore(e.into())
    }
}

impl From<std::io::Error> for WalletError {
    fn from(e: std::io::Error) -> Self {
        WalletError::Keystore(e.into())
    }
}
