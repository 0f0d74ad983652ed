// wallet-core/src/keystore/manager.rs
//
// Keystore registry: address → keystore lookup (first match wins).
// Registry được chia sẻ giữa các thread nên mọi truy cập đều qua RwLock.

use crate::chains::lbr::address::Address;
use crate::error::{KeystoreError, WalletResult};
use crate::keystore::{AbstractKeystore, Bip32Keystore, Keystore, KeystoreV3, PlainKeystore};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Process-wide manager set by the application.
static DEFAULT_MANAGER: Lazy<RwLock<Option<Arc<KeystoreManager>>>> = Lazy::new(|| RwLock::new(None));

#[derive(Debug, Default)]
pub struct KeystoreManager {
    path: Option<PathBuf>,
    keystores: RwLock<Vec<Keystore>>,
}

impl KeystoreManager {
    // =========================================================================
    // CONSTRUCTORS
    // =========================================================================

    pub fn new(keystores: Vec<Keystore>) -> Self {
        Self {
            path: None,
            keystores: RwLock::new(keystores),
        }
    }

    /// Load every keystore file in `dir`.
    ///
    /// Unreadable or unparseable files are skipped with a warning. HD records
    /// are only picked up when `scan_for_hd_wallets` is set.
    ///
    /// # Arguments
    /// * `suffix` - only consider file names ending with it (e.g. `.json`)
    ///
    /// # Errors
    /// `Io` if `dir` cannot be listed.
    pub fn manager_for_path(
        dir: impl AsRef<Path>,
        scan_for_hd_wallets: bool,
        suffix: Option<&str>,
    ) -> WalletResult<Self> {
        let dir = dir.as_ref();
        let mut keystores = Vec::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let matches_suffix = match suffix {
                Some(suffix) => path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.ends_with(suffix)),
                None => true,
            };
            if !matches_suffix {
                continue;
            }

            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable keystore file");
                    continue;
                }
            };
            match load_keystore(&content, scan_for_hd_wallets) {
                Ok(keystore) => {
                    debug!(path = %path.display(), hd = keystore.is_hd_keystore(), "loaded keystore");
                    keystores.push(keystore);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping invalid keystore file"),
            }
        }

        info!(dir = %dir.display(), count = keystores.len(), "keystore directory scanned");
        Ok(Self {
            path: Some(dir.to_path_buf()),
            keystores: RwLock::new(keystores),
        })
    }

    // =========================================================================
    // DEFAULT INSTANCE
    // =========================================================================

    pub fn set_default(manager: Arc<KeystoreManager>) {
        *DEFAULT_MANAGER.write() = Some(manager);
    }

    pub fn get_default() -> Option<Arc<KeystoreManager>> {
        DEFAULT_MANAGER.read().clone()
    }

    pub fn clear_default() {
        *DEFAULT_MANAGER.write() = None;
    }

    // =========================================================================
    // REGISTRY
    // =========================================================================

    /// Directory this manager was loaded from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn add(&self, keystore: impl Into<Keystore>) {
        self.keystores.write().push(keystore.into());
    }

    /// Snapshot of every registered keystore.
    pub fn keystores(&self) -> Vec<Keystore> {
        self.keystores.read().clone()
    }

    pub fn v3_keystores(&self) -> Vec<KeystoreV3> {
        self.keystores
            .read()
            .iter()
            .filter_map(|keystore| match keystore {
                Keystore::V3(inner) => Some(inner.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn bip32_keystores(&self) -> Vec<Bip32Keystore> {
        self.keystores
            .read()
            .iter()
            .filter_map(|keystore| match keystore {
                Keystore::Bip32(inner) => Some(inner.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn plain_keystores(&self) -> Vec<PlainKeystore> {
        self.keystores
            .read()
            .iter()
            .filter_map(|keystore| match keystore {
                Keystore::Plain(inner) => Some(inner.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keystores.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keystores.read().is_empty()
    }

    /// First keystore holding `address`.
    pub fn wallet_for_address(&self, address: &Address) -> Option<Keystore> {
        self.keystores
            .read()
            .iter()
            .find(|keystore| keystore.contains(address))
            .cloned()
    }
}

fn load_keystore(content: &str, scan_for_hd_wallets: bool) -> WalletResult<Keystore> {
    if scan_for_hd_wallets {
        Keystore::from_json(content)
    } else {
        Ok(Keystore::V3(KeystoreV3::from_json(content)?))
    }
}

impl AbstractKeystore for KeystoreManager {
    /// Every account of every keystore, in registration order.
    fn addresses(&self) -> Vec<Address> {
        self.keystores
            .read()
            .iter()
            .flat_map(|keystore| keystore.addresses())
            .collect()
    }

    fn is_hd_keystore(&self) -> bool {
        false
    }

    fn unsafe_get_private_key(&self, password: &str, address: &Address) -> WalletResult<Zeroizing<[u8; 32]>> {
        let keystore = self
            .wallet_for_address(address)
            .ok_or_else(|| KeystoreError::AccountNotFound(address.to_string()))?;
        keystore.unsafe_get_private_key(password, address)
    }
}

// =============================================================================
// TESTS
// =============================================================================
