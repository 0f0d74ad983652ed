// wallet-core/src/config.rs
//
// Wallet configuration - KDF / cipher choice cho keystore, tham số signer,
// derivation prefix mặc định. Load được từ JSON (serde), mọi field đều có default.

use crate::crypto::paths::DerivationPaths;
use crate::error::{KeystoreError, WalletResult};
use serde::{Deserialize, Serialize};

/// Default scrypt cost parameter.
pub const DEFAULT_SCRYPT_N: u64 = 4096;
pub const DEFAULT_SCRYPT_R: u32 = 6;
pub const DEFAULT_SCRYPT_P: u32 = 1;
/// Derived key length; the first 16 bytes encrypt, the last 16 authenticate.
pub const DEFAULT_DKLEN: usize = 32;
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 262_144;

// =============================================================================
// KEYSTORE
// =============================================================================

/// PBKDF2 pseudo-random function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Prf {
    #[default]
    #[serde(rename = "hmac-sha256")]
    HmacSha256,
    #[serde(rename = "hmac-sha384")]
    HmacSha384,
    #[serde(rename = "hmac-sha512")]
    HmacSha512,
}

impl Prf {
    pub const fn as_str(self) -> &'static str {
        match self {
            Prf::HmacSha256 => "hmac-sha256",
            Prf::HmacSha384 => "hmac-sha384",
            Prf::HmacSha512 => "hmac-sha512",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, KeystoreError> {
        match name {
            "hmac-sha256" => Ok(Prf::HmacSha256),
            "hmac-sha384" => Ok(Prf::HmacSha384),
            "hmac-sha512" => Ok(Prf::HmacSha512),
            other => Err(KeystoreError::UnsupportedPrf(other.to_string())),
        }
    }
}

/// Password-based key derivation function and its cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kdf", rename_all = "lowercase")]
pub enum KdfChoice {
    Scrypt {
        n: u64,
        r: u32,
        p: u32,
        dklen: usize,
    },
    Pbkdf2 {
        prf: Prf,
        iterations: u32,
        dklen: usize,
    },
}

impl Default for KdfChoice {
    fn default() -> Self {
        KdfChoice::Scrypt {
            n: DEFAULT_SCRYPT_N,
            r: DEFAULT_SCRYPT_R,
            p: DEFAULT_SCRYPT_P,
            dklen: DEFAULT_DKLEN,
        }
    }
}

impl KdfChoice {
    /// PBKDF2 with the default iteration count.
    pub fn pbkdf2(prf: Prf) -> Self {
        KdfChoice::Pbkdf2 {
            prf,
            iterations: DEFAULT_PBKDF2_ITERATIONS,
            dklen: DEFAULT_DKLEN,
        }
    }

    /// JSON `kdf` name.
    pub const fn name(&self) -> &'static str {
        match self {
            KdfChoice::Scrypt { .. } => "scrypt",
            KdfChoice::Pbkdf2 { .. } => "pbkdf2",
        }
    }
}

/// AES-128 block mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CipherMode {
    #[default]
    #[serde(rename = "aes-128-cbc")]
    Aes128Cbc,
    #[serde(rename = "aes-128-ctr")]
    Aes128Ctr,
}

impl CipherMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            CipherMode::Aes128Cbc => "aes-128-cbc",
            CipherMode::Aes128Ctr => "aes-128-ctr",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, KeystoreError> {
        match name {
            "aes-128-cbc" => Ok(CipherMode::Aes128Cbc),
            "aes-128-ctr" => Ok(CipherMode::Aes128Ctr),
            other => Err(KeystoreError::UnsupportedCipher(other.to_string())),
        }
    }
}

/// How new keystore records are encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystoreConfig {
    pub kdf: KdfChoice,
    pub cipher: CipherMode,
}

impl KeystoreConfig {
    pub fn new(kdf: KdfChoice, cipher: CipherMode) -> Self {
        Self { kdf, cipher }
    }
}

// =============================================================================
// SIGNER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Brand in the personal-message prefix `"\x19<brand> Signed Message:\n"`.
    pub message_brand: String,
    /// Upper bound of sign-then-verify attempts.
    pub max_attempts: u32,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            message_brand: "LBR".to_string(),
            max_attempts: 1024,
        }
    }
}

impl SignerConfig {
    /// `"\x19<brand> Signed Message:\n"`
    pub fn message_prefix(&self) -> String {
        format!("\x19{} Signed Message:\n", self.message_brand)
    }
}

// =============================================================================
// WALLET
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub keystore: KeystoreConfig,
    pub signer: SignerConfig,
    /// Prefix under which HD keystores create accounts.
    pub default_path_prefix: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keystore: KeystoreConfig::default(),
            signer: SignerConfig::default(),
            default_path_prefix: DerivationPaths::METAMASK_PREFIX.to_string(),
        }
    }
}

impl WalletConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> WalletResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WalletConfig::default();
        assert_eq!(
            config.keystore.kdf,
            KdfChoice::Scrypt {
                n: 4096,
                r: 6,
                p: 1,
                dklen: 32
            }
        );
        assert_eq!(config.keystore.cipher, CipherMode::Aes128Cbc);
        assert_eq!(config.signer.max_attempts, 1024);
        assert_eq!(config.signer.message_prefix(), "\x19LBR Signed Message:\n");
        assert_eq!(config.default_path_prefix, "m/44'/60'/0'/0");
    }

    #[test]
    fn test_from_json_partial() {
        let config = WalletConfig::from_json(
            r#"{
                "keystore": {
                    "kdf": { "kdf": "pbkdf2", "prf": "hmac-sha512", "iterations": 10, "dklen": 32 },
                    "cipher": "aes-128-ctr"
                },
                "signer": { "message_brand": "Test" }
            }"#,
        )
        .unwrap();
        assert_eq!(
            config.keystore.kdf,
            KdfChoice::Pbkdf2 {
                prf: Prf::HmacSha512,
                iterations: 10,
                dklen: 32
            }
        );
        assert_eq!(config.keystore.cipher, CipherMode::Aes128Ctr);
        assert_eq!(config.signer.message_brand, "Test");
        assert_eq!(config.signer.max_attempts, 1024);
        assert_eq!(config.default_path_prefix, DerivationPaths::METAMASK_PREFIX);
    }

    #[test]
    fn test_from_json_empty_object_is_default() {
        assert_eq!(WalletConfig::from_json("{}").unwrap(), WalletConfig::default());
        assert!(WalletConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_names_roundtrip() {
        for mode in [CipherMode::Aes128Cbc, CipherMode::Aes128Ctr] {
            assert_eq!(CipherMode::from_name(mode.as_str()).unwrap(), mode);
        }
        for prf in [Prf::HmacSha256, Prf::HmacSha384, Prf::HmacSha512] {
            assert_eq!(Prf::from_name(prf.as_str()).unwrap(), prf);
        }
        assert_eq!(
            CipherMode::from_name("aes-256-gcm"),
            Err(KeystoreError::UnsupportedCipher("aes-256-gcm".into()))
        );
        assert_eq!(
            Prf::from_name("hmac-md5"),
            Err(KeystoreError::UnsupportedPrf("hmac-md5".into()))
        );
    }
}
