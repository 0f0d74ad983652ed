// wallet-core/src/keystore/v3.rs
//
// Single-key keystore (Web3 Secret Storage v3). Payload = 32-byte private key,
// encrypted WITHOUT padding (đã block-aligned).

use crate::chains::lbr::address::Address;
use crate::config::KeystoreConfig;
use crate::crypto::secp256k1::verify_private_key;
use crate::error::{CryptoError, KeystoreError, WalletResult};
use crate::keystore::crypto::{self, config_from_record, random_bytes, Padding};
use crate::keystore::params::{check_versions, KeystoreParamsV3, KEYSTORE_VERSION};
use crate::keystore::AbstractKeystore;
use tracing::info;
use uuid::Uuid;
use zeroize::Zeroizing;

pub const PRIVATE_KEY_LEN: usize = 32;

// Số lần thử sinh key ngẫu nhiên hợp lệ (xác suất thất bại ~2^-128 mỗi lần)
const KEY_GENERATION_ATTEMPTS: usize = 8;

/// Encrypted single private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystoreV3 {
    address: Address,
    params: KeystoreParamsV3,
}

impl KeystoreV3 {
    // =========================================================================
    // CONSTRUCTORS
    // =========================================================================

    /// Generate a fresh random key and encrypt it.
    pub fn new(password: &str, config: &KeystoreConfig) -> WalletResult<Self> {
        for _ in 0..KEY_GENERATION_ATTEMPTS {
            let candidate = Zeroizing::new(random_bytes(PRIVATE_KEY_LEN)?);
            if verify_private_key(&candidate).is_ok() {
                return Self::from_private_key(&candidate, password, config);
            }
        }
        Err(CryptoError::InvalidPrivateKey.into())
    }

    /// Encrypt a caller-supplied key.
    ///
    /// # Errors
    /// `InvalidPrivateKey` unless `private_key` is 32 bytes in `[1, n)`.
    pub fn from_private_key(private_key: &[u8], password: &str, config: &KeystoreConfig) -> WalletResult<Self> {
        verify_private_key(private_key)?;
        let address = Address::from_private_key(private_key)?;
        let crypto = crypto::encrypt(password, private_key, config, Padding::None)?;

        info!(%address, kdf = config.kdf.name(), cipher = config.cipher.as_str(), "created v3 keystore");
        Ok(Self {
            params: KeystoreParamsV3 {
                address: Some(address.to_lowercase_hex()),
                crypto,
                id: Some(Uuid::new_v4().to_string()),
                version: KEYSTORE_VERSION,
            },
            address,
        })
    }

    /// Import a JSON record. The document is lower-cased before parsing.
    pub fn from_json(json: &str) -> WalletResult<Self> {
        let params: KeystoreParamsV3 = serde_json::from_str(&json.to_lowercase())?;
        Self::from_params(params)
    }

    /// # Errors
    /// - `UnsupportedVersion` unless `version == 3`
    /// - `CorruptedKeystore` for a bad crypto version or a missing/invalid address
    pub fn from_params(params: KeystoreParamsV3) -> WalletResult<Self> {
        check_versions(params.version, &params.crypto)?;
        let address = params
            .address
            .as_deref()
            .ok_or_else(|| KeystoreError::CorruptedKeystore("missing address".into()))
            .and_then(|raw| {
                Address::parse(raw)
                    .map_err(|_| KeystoreError::CorruptedKeystore(format!("invalid address '{}'", raw)))
            })?;
        Ok(Self { address, params })
    }

    // =========================================================================
    // GETTERS
    // =========================================================================

    #[inline]
    pub fn address(&self) -> &Address {
        &self.address
    }

    #[inline]
    pub fn params(&self) -> &KeystoreParamsV3 {
        &self.params
    }

    pub fn serialize(&self) -> WalletResult<String> {
        Ok(serde_json::to_string(&self.params)?)
    }

    // =========================================================================
    // DECRYPTION
    // =========================================================================

    /// Decrypt the private key. Wiped on drop.
    ///
    /// # Errors
    /// - `DecryptionFailed`: wrong password or tampered record
    /// - `CorruptedKeystore`: payload is not a valid key for the stored address
    pub fn get_private_key(&self, password: &str) -> WalletResult<Zeroizing<[u8; PRIVATE_KEY_LEN]>> {
        let payload = crypto::decrypt(password, &self.params.crypto, Padding::None)?;
        if payload.len() != PRIVATE_KEY_LEN {
            return Err(KeystoreError::CorruptedKeystore(format!(
                "decrypted key is {} bytes",
                payload.len()
            ))
            .into());
        }
        let mut key = Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
        key.copy_from_slice(&payload);

        let derived = Address::from_private_key(&key[..])
            .map_err(|_| KeystoreError::CorruptedKeystore("decrypted key is invalid".into()))?;
        if derived != self.address {
            return Err(KeystoreError::CorruptedKeystore("decrypted key does not match address".into()).into());
        }
        Ok(key)
    }

    /// Re-encrypt under `new_password` with fresh salt and IV.
    /// KDF cost and cipher mode are kept; the record is only replaced on success.
    pub fn regenerate(&mut self, old_password: &str, new_password: &str) -> WalletResult<()> {
        let key = self.get_private_key(old_password)?;
        let config = config_from_record(&self.params.crypto)?;
        let crypto = crypto::encrypt(new_password, &key[..], &config, Padding::None)?;

        self.params = KeystoreParamsV3 {
            address: Some(self.address.to_lowercase_hex()),
            crypto,
            id: Some(Uuid::new_v4().to_string()),
            version: KEYSTORE_VERSION,
        };
        info!(address = %self.address, "regenerated v3 keystore");
        Ok(())
    }
}

impl AbstractKeystore for KeystoreV3 {
    fn addresses(&self) -> Vec<Address> {
        vec![self.address]
    }

    fn is_hd_keystore(&self) -> bool {
        false
    }

    fn unsafe_get_private_key(&self, password: &str, address: &Address) -> WalletResult<Zeroizing<[u8; 32]>> {
        if *address != self.address {
            return Err(KeystoreError::AccountNotFound(address.to_string()).into());
        }
        self.get_private_key(password)
    }
}

// =============================================================================
// TESTS
// =============================================================================
