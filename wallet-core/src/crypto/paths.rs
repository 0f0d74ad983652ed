// wallet-core/src/crypto/paths.rs
//
// Derivation Paths Module - BIP-32 / BIP-44 path parsing & rendering
// Format: `m/44'/60'/0'/0/0` (`'` = hardened)

use crate::error::CryptoError;
use std::fmt;
use std::str::FromStr;

/// Child numbers at or above this value are hardened.
pub const HARDENED_OFFSET: u32 = 1 << 31;

// =============================================================================
// SLIP-44 COIN TYPES
// =============================================================================
pub mod coin_type {
    /// LBR dùng chung coin_type 60 với các chain EVM
    pub const LBR: u32 = 60;
}

// =============================================================================
// WELL-KNOWN PATHS
// =============================================================================
/// Pre-built derivation paths.
pub struct DerivationPaths;

impl DerivationPaths {
    /// Default HD keystore prefix.
    pub const DEFAULT: &'static str = "m/44'/60'/0'/0";
    /// Account-level prefix.
    pub const DEFAULT_PREFIX: &'static str = "m/44'/60'/0'";
    /// First address, metamask-compatible.
    pub const METAMASK: &'static str = "m/44'/60'/0'/0/0";
    pub const METAMASK_PREFIX: &'static str = "m/44'/60'/0'/0";

    /// LBR path with custom address index
    #[inline]
    pub fn lbr(index: u32) -> String {
        format!("m/44'/{}'/0'/0/{}", coin_type::LBR, index)
    }

    /// LBR path with custom account & index (multi-account)
    #[inline]
    pub fn lbr_account(account: u32, index: u32) -> String {
        format!("m/44'/{}'/{}'/0/{}", coin_type::LBR, account, index)
    }
}

// =============================================================================
// HD PATH
// =============================================================================

/// One path segment. `index` is always below [`HARDENED_OFFSET`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathComponent {
    pub index: u32,
    pub hardened: bool,
}

impl PathComponent {
    /// A raw index ≥ 2^31 already carries the hardened bit: it is stored as
    /// `index - 2^31` with `hardened = true` regardless of the flag.
    pub const fn new(index: u32, hardened: bool) -> Self {
        if index >= HARDENED_OFFSET {
            Self {
                index: index - HARDENED_OFFSET,
                hardened: true,
            }
        } else {
            Self { index, hardened }
        }
    }

    /// BIP-32 child number (hardened bit set when hardened).
    #[inline]
    pub const fn child_number(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// Parsed derivation path. `absolute` means it starts at `m`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HdPath {
    absolute: bool,
    components: Vec<PathComponent>,
}

impl HdPath {
    /// `m` with no components.
    pub fn master() -> Self {
        Self {
            absolute: true,
            components: Vec::new(),
        }
    }

    pub fn new(absolute: bool, components: Vec<PathComponent>) -> Self {
        Self {
            absolute,
            components,
        }
    }

    /// Parse `m/44'/60'/0'/0` or a relative `0/1'`.
    ///
    /// # Errors
    /// `PathComponentNotNumeric` for any segment that is not a `u32` after
    /// stripping one trailing `'`.
    pub fn parse(path: &str) -> Result<Self, CryptoError> {
        let mut segments = path.split('/').peekable();
        let absolute = segments.peek() == Some(&"m");
        if absolute {
            segments.next();
        }

        let mut components = Vec::new();
        for segment in segments {
            let (digits, hardened) = match segment.strip_suffix('\'') {
                Some(digits) => (digits, true),
                None => (segment, false),
            };
            let index: u32 = digits
                .parse()
                .map_err(|_| CryptoError::PathComponentNotNumeric(segment.to_string()))?;
            components.push(PathComponent::new(index, hardened));
        }
        Ok(Self {
            absolute,
            components,
        })
    }

    /// Copy of this path with one more segment.
    pub fn appending(&self, index: u32, hardened: bool) -> Self {
        let mut path = self.clone();
        path.components.push(PathComponent::new(index, hardened));
        path
    }

    #[inline]
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    #[inline]
    pub fn components(&self) -> &[PathComponent] {
        &self.components
    }

    /// Number of segments after `m`; equals the depth of the node it names.
    #[inline]
    pub fn depth(&self) -> usize {
        self.components.len()
    }

    #[inline]
    pub fn last(&self) -> Option<&PathComponent> {
        self.components.last()
    }
}

impl fmt::Display for HdPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("m")?;
            for component in &self.components {
                write!(f, "/{}", component)?;
            }
            Ok(())
        } else {
            let rendered: Vec<String> = self.components.iter().map(|c| c.to_string()).collect();
            f.write_str(&rendered.join("/"))
        }
    }
}

impl FromStr for HdPath {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// TESTS
// =============================================================================
