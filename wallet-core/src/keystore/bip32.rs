// wallet-core/src/keystore/bip32.rs
//
// HD-tree keystore. Ciphertext luôn là root-prefix node (82 bytes, PKCS7 → 96 bytes);
// các account được derive lại từ root + path khi cần, không lưu leaf key.

use crate::chains::lbr::address::Address;
use crate::config::KeystoreConfig;
use crate::crypto::hd_node::{HdNode, EXTENDED_KEY_LEN};
use crate::crypto::mnemonic::Mnemonic;
use crate::crypto::paths::{DerivationPaths, HdPath, PathComponent, HARDENED_OFFSET};
use crate::error::{CryptoError, KeystoreError, WalletError, WalletResult};
use crate::keystore::crypto::{self, config_from_record, Padding};
use crate::keystore::params::{check_versions, KeystoreParamsBip32, KEYSTORE_VERSION};
use crate::keystore::AbstractKeystore;
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;
use zeroize::Zeroizing;

/// Encrypted HD root plus the accounts derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bip32Keystore {
    root_prefix: String,
    paths: BTreeMap<String, Address>,
    params: KeystoreParamsBip32,
}

impl Bip32Keystore {
    // =========================================================================
    // CONSTRUCTORS
    // =========================================================================

    /// Derive `prefix_path` from `seed`, encrypt it, and create account 0.
    ///
    /// # Arguments
    /// * `seed` - BIP-39 seed (≥ 16 bytes)
    /// * `prefix_path` - absolute root prefix, e.g. `m/44'/60'/0'/0`
    pub fn from_seed(
        seed: &[u8],
        password: &str,
        prefix_path: &str,
        config: &KeystoreConfig,
    ) -> WalletResult<Self> {
        let prefix = HdPath::parse(prefix_path)?;
        if !prefix.is_absolute() {
            return Err(WalletError::Validation(format!(
                "root prefix '{}' must start with m",
                prefix_path
            )));
        }
        let prefix_node = HdNode::from_seed(seed)?.derive_path(prefix_path, true)?;
        let root_prefix = prefix.to_string();

        let (path, address) = derive_account(&prefix_node, &root_prefix, 0)?;
        let mut paths = BTreeMap::new();
        paths.insert(path, address);
        let params = seal(&prefix_node, &paths, &root_prefix, password, config)?;

        info!(%root_prefix, %address, "created bip32 keystore");
        Ok(Self {
            root_prefix,
            paths,
            params,
        })
    }

    pub fn from_mnemonic(
        mnemonic: &Mnemonic,
        password: &str,
        prefix_path: &str,
        config: &KeystoreConfig,
    ) -> WalletResult<Self> {
        let seed = mnemonic.seed();
        Self::from_seed(&seed[..], password, prefix_path, config)
    }

    /// Import a JSON record. The document is lower-cased before parsing.
    pub fn from_json(json: &str) -> WalletResult<Self> {
        let params: KeystoreParamsBip32 = serde_json::from_str(&json.to_lowercase())?;
        Self::from_params(params)
    }

    /// # Errors
    /// - `UnsupportedVersion` / `CorruptedKeystore`: bad record or crypto version
    /// - `NotHdKeystore`: `isHDWallet` is not set
    pub fn from_params(mut params: KeystoreParamsBip32) -> WalletResult<Self> {
        check_versions(params.version, &params.crypto)?;
        if !params.is_hd_wallet {
            return Err(KeystoreError::NotHdKeystore.into());
        }

        let mut paths = BTreeMap::new();
        for (path, raw) in &params.path_to_address {
            let address = Address::parse(raw).map_err(|_| {
                KeystoreError::CorruptedKeystore(format!("invalid address '{}' for {}", raw, path))
            })?;
            paths.insert(path.clone(), address);
        }

        let root_prefix = params
            .root_path
            .get_or_insert_with(|| DerivationPaths::DEFAULT_PREFIX.to_string())
            .clone();
        Ok(Self {
            root_prefix,
            paths,
            params,
        })
    }

    // =========================================================================
    // GETTERS
    // =========================================================================

    #[inline]
    pub fn root_prefix(&self) -> &str {
        &self.root_prefix
    }

    /// Full derivation path → address, one entry per account.
    #[inline]
    pub fn paths(&self) -> &BTreeMap<String, Address> {
        &self.paths
    }

    #[inline]
    pub fn params(&self) -> &KeystoreParamsBip32 {
        &self.params
    }

    pub fn path_for_address(&self, address: &Address) -> Option<&str> {
        self.paths
            .iter()
            .find(|(_, candidate)| *candidate == address)
            .map(|(path, _)| path.as_str())
    }

    pub fn serialize(&self) -> WalletResult<String> {
        Ok(serde_json::to_string(&self.params)?)
    }

    // =========================================================================
    // ACCOUNTS
    // =========================================================================

    /// Derive the next unused index under the root and record its address.
    pub fn create_new_child_account(&mut self, password: &str) -> WalletResult<Address> {
        let root = self.decrypt_root(password)?;
        let config = config_from_record(&self.params.crypto)?;
        self.create_new_account(&root, password, &config)
    }

    /// Record the account at `path`, given either as a full path under the root
    /// prefix (`m/44'/60'/0'/0/7`) or relative to it (`7`, `/1/2'`).
    pub fn create_new_custom_child_account(&mut self, password: &str, path: &str) -> WalletResult<Address> {
        let appendix = self.relative_path(path)?;
        let root = self.decrypt_root(password)?;
        let node = root.derive_path(&appendix.to_string(), true)?;
        let address = Address::from_public_key(node.public_key())?;

        let mut paths = self.paths.clone();
        let full_path = format!("{}/{}", self.root_prefix, appendix);
        paths.insert(full_path.clone(), address);

        let config = config_from_record(&self.params.crypto)?;
        self.store(&root, paths, password, &config)?;
        info!(path = %full_path, %address, "created custom bip32 account");
        Ok(address)
    }

    fn create_new_account(
        &mut self,
        parent: &HdNode,
        password: &str,
        config: &KeystoreConfig,
    ) -> WalletResult<Address> {
        let index = self.next_index()?;
        let (full_path, address) = derive_account(parent, &self.root_prefix, index)?;

        let mut paths = self.paths.clone();
        paths.insert(full_path.clone(), address);
        self.store(parent, paths, password, config)?;
        info!(path = %full_path, %address, "created bip32 account");
        Ok(address)
    }

    /// `max(last numeric segment) + 1`, or 0 when empty.
    ///
    /// # Errors
    /// `IndexTooBig` once the next index would fall in the hardened range.
    fn next_index(&self) -> WalletResult<u32> {
        let last_used = self
            .paths
            .keys()
            .filter_map(|path| path.rsplit('/').next())
            .filter_map(|segment| segment.parse::<u32>().ok())
            .max();
        match last_used {
            None => Ok(0),
            Some(index) => index
                .checked_add(1)
                .filter(|next| *next < HARDENED_OFFSET)
                .ok_or_else(|| CryptoError::IndexTooBig.into()),
        }
    }

    fn relative_path(&self, path: &str) -> WalletResult<HdPath> {
        let relative = match path.strip_prefix(self.root_prefix.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
            _ if path.starts_with('m') => {
                return Err(WalletError::Validation(format!(
                    "path '{}' is not under root prefix '{}'",
                    path, self.root_prefix
                )))
            }
            _ => path.trim_start_matches('/'),
        };
        let parsed = HdPath::parse(relative)?;
        if parsed.depth() == 0 {
            return Err(WalletError::Validation(format!("path '{}' names no child of the root", path)));
        }
        Ok(parsed)
    }

    // =========================================================================
    // ENCRYPTION
    // =========================================================================

    /// Decrypt and validate the root-prefix node.
    ///
    /// # Errors
    /// - `DecryptionFailed`: wrong password or tampered record
    /// - `CorruptedKeystore`: payload is not an 82-byte private node at the
    ///   depth of the root prefix
    fn decrypt_root(&self, password: &str) -> WalletResult<HdNode> {
        let payload = crypto::decrypt(password, &self.params.crypto, Padding::Pkcs7)?;
        if payload.len() != EXTENDED_KEY_LEN {
            return Err(KeystoreError::CorruptedKeystore(format!(
                "root node is {} bytes",
                payload.len()
            ))
            .into());
        }
        let root = HdNode::deserialize(&payload)
            .map_err(|e| KeystoreError::CorruptedKeystore(format!("root node: {}", e)))?;

        let expected_depth = self.root_prefix.split('/').count() - 1;
        if usize::from(root.depth()) != expected_depth {
            return Err(KeystoreError::CorruptedKeystore(format!(
                "root depth {} does not match prefix {}",
                root.depth(),
                self.root_prefix
            ))
            .into());
        }
        if !root.has_private() {
            return Err(KeystoreError::CorruptedKeystore("root node has no private key".into()).into());
        }
        Ok(root)
    }

    /// Encrypt `root` and swap in the new record and path map together.
    fn store(
        &mut self,
        root: &HdNode,
        paths: BTreeMap<String, Address>,
        password: &str,
        config: &KeystoreConfig,
    ) -> WalletResult<()> {
        self.params = seal(root, &paths, &self.root_prefix, password, config)?;
        self.paths = paths;
        Ok(())
    }

    /// Re-encrypt the root under `new_password` with fresh salt and IV.
    pub fn regenerate(&mut self, old_password: &str, new_password: &str) -> WalletResult<()> {
        let root = self.decrypt_root(old_password)?;
        let config = config_from_record(&self.params.crypto)?;
        self.store(&root, self.paths.clone(), new_password, &config)?;
        info!(root_prefix = %self.root_prefix, "regenerated bip32 keystore");
        Ok(())
    }

    /// Root-prefix node as a base58 extended private key.
    ///
    /// # Security
    /// Chuỗi trả về chứa private key + chain code của toàn bộ cây con.
    pub fn serialize_root_node_to_string(&self, password: &str) -> WalletResult<Zeroizing<String>> {
        let root = self.decrypt_root(password)?;
        Ok(Zeroizing::new(root.serialize_to_string(false)?))
    }
}

/// Non-hardened child `index` of the root; the index actually used (after
/// skipping unusable ones) names the path.
fn derive_account(root: &HdNode, root_prefix: &str, index: u32) -> WalletResult<(String, Address)> {
    let node = root.derive(index, true, false)?;
    let address = Address::from_public_key(node.public_key())?;
    let component = PathComponent::new(node.index(), node.is_hardened());
    Ok((format!("{}/{}", root_prefix, component), address))
}

/// Encrypt `root` into a complete record carrying `paths`.
fn seal(
    root: &HdNode,
    paths: &BTreeMap<String, Address>,
    root_prefix: &str,
    password: &str,
    config: &KeystoreConfig,
) -> WalletResult<KeystoreParamsBip32> {
    let serialized = root.serialize(false)?;
    let crypto = crypto::encrypt(password, &serialized[..], config, Padding::Pkcs7)?;
    Ok(KeystoreParamsBip32 {
        crypto,
        id: Some(Uuid::new_v4().to_string()),
        version: KEYSTORE_VERSION,
        is_hd_wallet: true,
        path_to_address: paths
            .iter()
            .map(|(path, address)| (path.clone(), address.to_lowercase_hex()))
            .collect(),
        root_path: Some(root_prefix.to_string()),
    })
}

impl AbstractKeystore for Bip32Keystore {
    fn addresses(&self) -> Vec<Address> {
        self.paths.values().copied().collect()
    }

    fn is_hd_keystore(&self) -> bool {
        true
    }

    fn unsafe_get_private_key(&self, password: &str, address: &Address) -> WalletResult<Zeroizing<[u8; 32]>> {
        let path = self
            .path_for_address(address)
            .ok_or_else(|| KeystoreError::AccountNotFound(address.to_string()))?;
        let relative = self.relative_path(path)?;
        let root = self.decrypt_root(password)?;
        let node = root.derive_path(&relative.to_string(), true)?;
        debug!(%path, "derived account key");

        let private_key = node.private_key().ok_or(CryptoError::MustProvidePrivateKey)?;
        Ok(Zeroizing::new(*private_key))
    }
}

// =============================================================================
// TESTS
// =============================================================================
