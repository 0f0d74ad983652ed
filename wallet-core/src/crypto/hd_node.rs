// wallet-core/src/crypto/hd_node.rs
//
// HD Key Tree - BIP-32 hierarchical deterministic derivation
// Algorithm: HMAC-SHA512, private (normal + hardened) & public-only derivation
// Reference: https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki
//
// HdNode là value type bất biến: derive luôn trả về node mới, không sửa node cha.

use crate::codec::{from_base58, serialize_u32, to_base58};
use crate::crypto::hash::{double_sha256, hash160, hmac_sha512};
use crate::crypto::paths::{HdPath, HARDENED_OFFSET};
use crate::crypto::secp256k1::{
    private_to_compressed_public, serialize_public_key, tweak_add_private, tweak_add_public,
};
use crate::error::{CryptoError, WalletResult};
use zeroize::Zeroizing;

/// Length of a serialized extended key (with checksum).
pub const EXTENDED_KEY_LEN: usize = 82;
/// `xprv` version bytes.
pub const PRIVATE_VERSION: [u8; 4] = [0x04, 0x88, 0xAD, 0xE4];
/// `xpub` version bytes.
pub const PUBLIC_VERSION: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];

const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";
const MIN_SEED_LEN: usize = 16;

/// One node of a BIP-32 key tree.
///
/// # Security
/// - Private key nằm trong `Zeroizing`, tự xóa khi drop
/// - `Debug` không in private key
#[derive(Clone, PartialEq, Eq)]
pub struct HdNode {
    private_key: Option<Zeroizing<[u8; 32]>>,
    public_key: [u8; 33],
    chain_code: [u8; 32],
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: u32,
    path: Option<String>,
}

impl std::fmt::Debug for HdNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HdNode")
            .field("public_key", &hex::encode(self.public_key))
            .field("depth", &self.depth)
            .field("child_number", &self.child_number)
            .field("path", &self.path)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl HdNode {
    // =========================================================================
    // CONSTRUCTORS
    // =========================================================================

    /// Master node from a BIP-39 seed (≥ 16 bytes).
    ///
    /// An out-of-range master key is not retried: the seed is rejected.
    pub fn from_seed(seed: &[u8]) -> WalletResult<Self> {
        if seed.len() < MIN_SEED_LEN {
            return Err(CryptoError::InvalidSeedSize(seed.len()).into());
        }
        let (private_key, chain_code) = hmac_sha512(MASTER_HMAC_KEY, seed);
        let public_key = private_to_compressed_public(&*private_key)?;
        check_public_key_prefix(&public_key)?;

        Ok(Self {
            private_key: Some(private_key),
            public_key,
            chain_code,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_number: 0,
            path: Some("m".to_string()),
        })
    }

    /// Parse an 82-byte extended key blob.
    ///
    /// The checksum is verified before anything else; a private blob also has
    /// its public key recomputed and validated.
    pub fn deserialize(data: &[u8]) -> WalletResult<Self> {
        if data.len() != EXTENDED_KEY_LEN {
            return Err(CryptoError::InvalidExtendedKeyLength(data.len()).into());
        }
        let (payload, checksum) = data.split_at(78);
        if double_sha256(payload)[..4] != *checksum {
            return Err(CryptoError::InvalidExtendedKeyChecksum.into());
        }

        let version = &payload[0..4];
        let depth = payload[4];
        let mut parent_fingerprint = [0u8; 4];
        parent_fingerprint.copy_from_slice(&payload[5..9]);
        let child_number = u32::from_be_bytes([payload[9], payload[10], payload[11], payload[12]]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&payload[13..45]);
        let key_data = &payload[45..78];

        let (private_key, public_key) = if version == PRIVATE_VERSION {
            if key_data[0] != 0x00 {
                return Err(CryptoError::InvalidPrivateKey.into());
            }
            let mut key = Zeroizing::new([0u8; 32]);
            key.copy_from_slice(&key_data[1..]);
            let public_key = private_to_compressed_public(&*key)?;
            (Some(key), public_key)
        } else if version == PUBLIC_VERSION {
            check_public_key_prefix(key_data)?;
            // Validate that the bytes are a point on the curve
            serialize_public_key(key_data, true)?;
            let mut public_key = [0u8; 33];
            public_key.copy_from_slice(key_data);
            (None, public_key)
        } else {
            return Err(CryptoError::InvalidExtendedKeyVersion.into());
        };
        check_public_key_prefix(&public_key)?;

        Ok(Self {
            private_key,
            public_key,
            chain_code,
            depth,
            parent_fingerprint,
            child_number,
            path: (depth == 0).then(|| "m".to_string()),
        })
    }

    /// Parse a base58 `xprv…` / `xpub…` string.
    pub fn from_base58(encoded: &str) -> WalletResult<Self> {
        let data = Zeroizing::new(from_base58(encoded)?);
        Self::deserialize(&data)
    }

    // =========================================================================
    // GETTERS
    // =========================================================================

    #[inline]
    pub fn private_key(&self) -> Option<&[u8; 32]> {
        self.private_key.as_deref()
    }

    #[inline]
    pub fn has_private(&self) -> bool {
        self.private_key.is_some()
    }

    /// Compressed secp256k1 public key.
    #[inline]
    pub fn public_key(&self) -> &[u8; 33] {
        &self.public_key
    }

    #[inline]
    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    #[inline]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    #[inline]
    pub fn parent_fingerprint(&self) -> &[u8; 4] {
        &self.parent_fingerprint
    }

    #[inline]
    pub fn child_number(&self) -> u32 {
        self.child_number
    }

    #[inline]
    pub fn is_hardened(&self) -> bool {
        self.child_number >= HARDENED_OFFSET
    }

    /// Child number without the hardened bit.
    #[inline]
    pub fn index(&self) -> u32 {
        self.child_number & !HARDENED_OFFSET
    }

    /// Human-readable path. `None` for nodes imported below the root, whose
    /// ancestry is unknown.
    #[inline]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// This node's own fingerprint (parent fingerprint of its children).
    pub fn fingerprint(&self) -> [u8; 4] {
        let hash = hash160(&self.public_key);
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Same node without the private key.
    pub fn neutered(&self) -> Self {
        Self {
            private_key: None,
            ..self.clone()
        }
    }

    // =========================================================================
    // DERIVATION
    // =========================================================================

    /// Derive one child.
    ///
    /// `index ≥ 2^31` or `hardened = true` selects hardened derivation. When
    /// `I_L ≥ n` or the child key is zero the next index is tried, up to
    /// `u32::MAX`.
    ///
    /// # Errors
    /// - `MustProvidePrivateKey`: private derivation on a public-only node
    /// - `HardenedDerivationRequiresPrivateKey`: public-only hardened request
    /// - `IndexTooBig`: every index up to `u32::MAX` was unusable
    /// - `DepthTooBig`: parent is already at depth 255
    pub fn derive(&self, index: u32, derive_private_key: bool, hardened: bool) -> WalletResult<Self> {
        let hardened = hardened || index >= HARDENED_OFFSET;
        if derive_private_key {
            self.derive_private(index, hardened)
        } else {
            if hardened {
                return Err(CryptoError::HardenedDerivationRequiresPrivateKey.into());
            }
            self.derive_public(index)
        }
    }

    /// Derive along a path such as `m/44'/60'/0'/0/0` or `0/1`, left to right.
    ///
    /// A leading `m` is skipped; the path is applied relative to `self`.
    pub fn derive_path(&self, path: &str, derive_private_key: bool) -> WalletResult<Self> {
        let path = HdPath::parse(path)?;
        let mut node = self.clone();
        for component in path.components() {
            node = node.derive(component.index, derive_private_key, component.hardened)?;
        }
        Ok(node)
    }

    fn derive_private(&self, index: u32, mut hardened: bool) -> WalletResult<Self> {
        let private_key = self
            .private_key
            .as_ref()
            .ok_or(CryptoError::MustProvidePrivateKey)?;
        self.check_depth()?;

        let mut child_number = if hardened {
            index | HARDENED_OFFSET
        } else {
            index
        };
        loop {
            let mut data = Zeroizing::new(Vec::with_capacity(37));
            if hardened {
                data.push(0x00);
                data.extend_from_slice(&**private_key);
            } else {
                data.extend_from_slice(&self.public_key);
            }
            data.extend_from_slice(&serialize_u32(child_number));

            let (il, chain_code) = hmac_sha512(&self.chain_code, &data);
            if let Some(child_key) = tweak_add_private(private_key, &il)? {
                let public_key = private_to_compressed_public(&*child_key)?;
                check_public_key_prefix(&public_key)?;
                return Ok(self.child(Some(child_key), public_key, chain_code, child_number));
            }

            if child_number == u32::MAX {
                return Err(CryptoError::IndexTooBig.into());
            }
            child_number += 1;
            hardened = hardened || child_number >= HARDENED_OFFSET;
        }
    }

    fn derive_public(&self, index: u32) -> WalletResult<Self> {
        self.check_depth()?;

        let mut child_number = index;
        loop {
            let mut data = Vec::with_capacity(37);
            data.extend_from_slice(&self.public_key);
            data.extend_from_slice(&serialize_u32(child_number));

            let (il, chain_code) = hmac_sha512(&self.chain_code, &data);
            if let Some(public_key) = tweak_add_public(&self.public_key, &il)? {
                check_public_key_prefix(&public_key)?;
                return Ok(self.child(None, public_key, chain_code, child_number));
            }

            // Bước tiếp theo sẽ là hardened, không thể derive từ public key
            if child_number + 1 >= HARDENED_OFFSET {
                return Err(CryptoError::IndexTooBig.into());
            }
            child_number += 1;
        }
    }

    fn check_depth(&self) -> Result<(), CryptoError> {
        if self.depth == u8::MAX {
            return Err(CryptoError::DepthTooBig);
        }
        Ok(())
    }

    fn child(
        &self,
        private_key: Option<Zeroizing<[u8; 32]>>,
        public_key: [u8; 33],
        chain_code: [u8; 32],
        child_number: u32,
    ) -> Self {
        let hardened = child_number >= HARDENED_OFFSET;
        let display_index = child_number & !HARDENED_OFFSET;
        let path = self.path.as_ref().map(|parent| {
            if hardened {
                format!("{}/{}'", parent, display_index)
            } else {
                format!("{}/{}", parent, display_index)
            }
        });

        Self {
            private_key,
            public_key,
            chain_code,
            depth: self.depth + 1,
            parent_fingerprint: self.fingerprint(),
            child_number,
            path,
        }
    }

    // =========================================================================
    // SERIALIZATION
    // =========================================================================

    /// 82-byte extended key: version ‖ depth ‖ fingerprint ‖ child ‖ chain code ‖ key ‖ checksum.
    ///
    /// `serialize_public = false` needs a private key (`MustProvidePrivateKey`).
    pub fn serialize(&self, serialize_public: bool) -> WalletResult<Zeroizing<[u8; EXTENDED_KEY_LEN]>> {
        let mut out = Zeroizing::new([0u8; EXTENDED_KEY_LEN]);
        if serialize_public {
            out[0..4].copy_from_slice(&PUBLIC_VERSION);
            out[45..78].copy_from_slice(&self.public_key);
        } else {
            let private_key = self
                .private_key
                .as_ref()
                .ok_or(CryptoError::MustProvidePrivateKey)?;
            out[0..4].copy_from_slice(&PRIVATE_VERSION);
            out[45] = 0x00;
            out[46..78].copy_from_slice(&**private_key);
        }
        out[4] = self.depth;
        out[5..9].copy_from_slice(&self.parent_fingerprint);
        out[9..13].copy_from_slice(&serialize_u32(self.child_number));
        out[13..45].copy_from_slice(&self.chain_code);

        let checksum = double_sha256(&out[..78]);
        out[78..].copy_from_slice(&checksum[..4]);
        Ok(out)
    }

    /// Base58 `xprv…` / `xpub…`.
    pub fn serialize_to_string(&self, serialize_public: bool) -> WalletResult<String> {
        let data = self.serialize(serialize_public)?;
        Ok(to_base58(&*data))
    }
}

fn check_public_key_prefix(public_key: &[u8]) -> Result<(), CryptoError> {
    match public_key.first() {
        Some(0x02) | Some(0x03) => Ok(()),
        Some(prefix) => Err(CryptoError::InvalidPublicKeyPrefix(*prefix)),
        None => Err(CryptoError::InvalidPublicKey),
    }
}

// =============================================================================
// TESTS
// =============================================================================
