// wallet-core/src/keystore/mod.rs
//
// Keystore Module - encrypted key storage
//
// Các biến thể:
//   - v3:    một private key (Web3 Secret Storage v3)
//   - bip32: HD root node + danh sách account đã derive
//   - plain: key không mã hoá, chỉ dùng in-memory
//
// Tất cả đều implement `AbstractKeystore`, là interface duy nhất mà signer dùng.

pub mod bip32;
pub mod crypto;
pub mod manager;
pub mod params;
pub mod plain;
pub mod v3;

pub use bip32::Bip32Keystore;
pub use manager::KeystoreManager;
pub use plain::PlainKeystore;
pub use v3::KeystoreV3;

use crate::chains::lbr::address::Address;
use crate::error::{KeystoreError, WalletError, WalletResult};
use zeroize::Zeroizing;

/// Any source of private keys addressed by account.
pub trait AbstractKeystore {
    /// Accounts this keystore can sign for.
    fn addresses(&self) -> Vec<Address>;

    fn is_hd_keystore(&self) -> bool;

    /// Decrypt the key for `address`.
    ///
    /// The key is wiped when the returned buffer is dropped; callers should
    /// keep it for as short as possible.
    ///
    /// # Errors
    /// - `AccountNotFound`: `address` is not held by this keystore
    /// - `DecryptionFailed`: wrong password
    fn unsafe_get_private_key(&self, password: &str, address: &Address) -> WalletResult<Zeroizing<[u8; 32]>>;
}

/// Closed set of keystore variants.
#[derive(Debug, Clone)]
pub enum Keystore {
    V3(KeystoreV3),
    Bip32(Bip32Keystore),
    Plain(PlainKeystore),
}

impl Keystore {
    /// Import any on-disk record; `isHDWallet: true` selects the HD variant.
    pub fn from_json(json: &str) -> WalletResult<Self> {
        let lowered = json.to_lowercase();
        let value: serde_json::Value = serde_json::from_str(&lowered)?;
        let is_hd = value
            .get("ishdwallet")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        if is_hd {
            Ok(Self::Bip32(Bip32Keystore::from_json(&lowered)?))
        } else {
            Ok(Self::V3(KeystoreV3::from_json(&lowered)?))
        }
    }

    /// JSON record. Plain keystores have no on-disk form.
    pub fn serialize(&self) -> WalletResult<String> {
        match self {
            Self::V3(keystore) => keystore.serialize(),
            Self::Bip32(keystore) => keystore.serialize(),
            Self::Plain(_) => Err(WalletError::Validation(
                "plain keystores cannot be serialized".into(),
            )),
        }
    }

    /// True if `address` is one of this keystore's accounts.
    pub fn contains(&self, address: &Address) -> bool {
        self.addresses().contains(address)
    }

    fn inner(&self) -> &dyn AbstractKeystore {
        match self {
            Self::V3(keystore) => keystore,
            Self::Bip32(keystore) => keystore,
            Self::Plain(keystore) => keystore,
        }
    }
}

impl AbstractKeystore for Keystore {
    fn addresses(&self) -> Vec<Address> {
        self.inner().addresses()
    }

    fn is_hd_keystore(&self) -> bool {
        self.inner().is_hd_keystore()
    }

    fn unsafe_get_private_key(&self, password: &str, address: &Address) -> WalletResult<Zeroizing<[u8; 32]>> {
        if !self.contains(address) {
            return Err(KeystoreError::AccountNotFound(address.to_string()).into());
        }
        self.inner().unsafe_get_private_key(password, address)
    }
}

impl From<KeystoreV3> for Keystore {
    fn from(keystore: KeystoreV3) -> Self {
        Self::V3(keystore)
    }
}

impl From<Bip32Keystore> for Keystore {
    fn from(keystore: Bip32Keystore) -> Self {
        Self::Bip32(keystore)
    }
}

impl From<PlainKeystore> for Keystore {
    fn from(keystore: PlainKeystore) -> Self {
        Self::Plain(keystore)
    }
}

// =============================================================================
// TESTS
// =============================================================================
