// wallet-core/src/crypto/secp256k1.rs
//
// secp256k1 primitive seam (k256)
//
// Mọi thao tác đường cong elliptic của wallet core đi qua module này:
// - Private key validation (0 < k < n)
// - Public key derivation (compressed 33B / uncompressed 65B)
// - Public key combination (EC point addition) cho BIP-32 public derivation
// - Recoverable ECDSA signing + public key recovery

use crate::error::{CryptoError, SignerError, WalletError, WalletResult};
use k256::{
    ecdsa::{
        signature::hazmat::RandomizedPrehashSigner, RecoveryId, Signature, SigningKey,
        VerifyingKey,
    },
    elliptic_curve::{sec1::ToEncodedPoint, PrimeField},
    FieldBytes, ProjectivePoint, PublicKey, Scalar, SecretKey,
};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

/// Length of a compressed SEC1 public key.
pub const COMPRESSED_PUBLIC_KEY_LEN: usize = 33;
/// Length of an uncompressed SEC1 public key.
pub const UNCOMPRESSED_PUBLIC_KEY_LEN: usize = 65;
/// r ‖ s ‖ v
pub const SIGNATURE_LEN: usize = 65;

// =============================================================================
// KEYS
// =============================================================================

/// Parse & validate a 32-byte private key (must lie in `[1, n-1]`).
fn secret_key(private_key: &[u8]) -> Result<SecretKey, CryptoError> {
    if private_key.len() != 32 {
        return Err(CryptoError::InvalidPrivateKey);
    }
    SecretKey::from_slice(private_key).map_err(|_| CryptoError::InvalidPrivateKey)
}

/// Check that `private_key` is a valid secp256k1 scalar.
pub fn verify_private_key(private_key: &[u8]) -> Result<(), CryptoError> {
    secret_key(private_key).map(|_| ())
}

/// Derive the SEC1 public key for `private_key`.
pub fn private_to_public(private_key: &[u8], compressed: bool) -> Result<Vec<u8>, CryptoError> {
    let secret = secret_key(private_key)?;
    let point = secret.public_key().to_encoded_point(compressed);
    Ok(point.as_bytes().to_vec())
}

/// Compressed public key as a fixed array.
pub fn private_to_compressed_public(private_key: &[u8]) -> Result<[u8; 33], CryptoError> {
    let bytes = private_to_public(private_key, true)?;
    let mut out = [0u8; COMPRESSED_PUBLIC_KEY_LEN];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Re-encode any valid SEC1 public key (compressed or not).
pub fn serialize_public_key(public_key: &[u8], compressed: bool) -> Result<Vec<u8>, CryptoError> {
    let key = PublicKey::from_sec1_bytes(public_key).map_err(|_| CryptoError::InvalidPublicKey)?;
    Ok(key.to_encoded_point(compressed).as_bytes().to_vec())
}

/// Interpret 32 big-endian bytes as a scalar. `None` if the value is ≥ n.
pub fn scalar_from_bytes(bytes: &[u8; 32]) -> Option<Scalar> {
    Option::from(Scalar::from_repr(FieldBytes::from(*bytes)))
}

/// `(tweak + private_key) mod n`.
///
/// Returns `Ok(None)` when the tweak is out of range or the sum is zero; BIP-32
/// treats both as "skip to the next index".
pub fn tweak_add_private(
    private_key: &[u8; 32],
    tweak: &[u8; 32],
) -> Result<Option<Zeroizing<[u8; 32]>>, CryptoError> {
    let Some(tweak) = scalar_from_bytes(tweak) else {
        return Ok(None);
    };
    let parent = scalar_from_bytes(private_key).ok_or(CryptoError::InvalidPrivateKey)?;
    let child = parent + tweak;
    if bool::from(child.is_zero()) {
        return Ok(None);
    }
    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(&child.to_bytes());
    Ok(Some(out))
}

/// `point(tweak) + public_key`, compressed.
///
/// Returns `Ok(None)` when the tweak is out of range or the sum is the point at
/// infinity.
pub fn tweak_add_public(public_key: &[u8], tweak: &[u8; 32]) -> Result<Option<[u8; 33]>, CryptoError> {
    let Some(tweak) = scalar_from_bytes(tweak) else {
        return Ok(None);
    };
    if bool::from(tweak.is_zero()) {
        return Ok(None);
    }
    let tweak_point = ProjectivePoint::GENERATOR * tweak;
    let tweak_key = PublicKey::from_affine(tweak_point.to_affine())
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    let tweak_compressed = tweak_key.to_encoded_point(true);
    combine_public_keys(&[public_key, tweak_compressed.as_bytes()]).map(Some)
}

/// EC point addition of serialized public keys, compressed output.
pub fn combine_public_keys(keys: &[&[u8]]) -> Result<[u8; 33], CryptoError> {
    let mut sum = ProjectivePoint::IDENTITY;
    for key in keys {
        let point =
            PublicKey::from_sec1_bytes(key).map_err(|_| CryptoError::InvalidPublicKey)?;
        sum += point.to_projective();
    }
    let combined =
        PublicKey::from_affine(sum.to_affine()).map_err(|_| CryptoError::InvalidPublicKey)?;
    let mut out = [0u8; COMPRESSED_PUBLIC_KEY_LEN];
    out.copy_from_slice(combined.to_encoded_point(true).as_bytes());
    Ok(out)
}

// =============================================================================
// RECOVERABLE SIGNATURES
// =============================================================================

/// Unmarshalled recoverable signature. `v` is the raw recovery id (0 or 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub v: u8,
}

impl RecoverableSignature {
    /// `r ‖ s ‖ v` (65 bytes).
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    /// Parse `r ‖ s ‖ v`. A `v` of 27/28 is normalized to 0/1.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignerError> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(SignerError::InvalidSignatureLength(bytes.len()));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        let v = match bytes[64] {
            v @ (27 | 28) => v - 27,
            v => v,
        };
        Ok(Self { r, s, v })
    }
}

/// Recoverable ECDSA over a 32-byte prehash.
///
/// Without `extra_entropy` the nonce is RFC6979-deterministic; with it, fresh
/// OS randomness is mixed into the nonce so a retry yields a different signature.
pub fn sign_recoverable(
    hash: &[u8; 32],
    private_key: &[u8],
    extra_entropy: bool,
) -> WalletResult<RecoverableSignature> {
    let signing_key = SigningKey::from_slice(private_key)
        .map_err(|_| WalletError::Crypto(CryptoError::InvalidPrivateKey))?;

    let signing_failed = |e: k256::ecdsa::Error| WalletError::Crypto(CryptoError::SigningFailed(e.to_string()));
    let (signature, recovery_id) = if extra_entropy {
        let signature: Signature =
            RandomizedPrehashSigner::<Signature>::sign_prehash_with_rng(&signing_key, &mut OsRng, hash)
                .map_err(signing_failed)?;
        // low-s, giống nhánh deterministic
        let signature = signature.normalize_s().unwrap_or(signature);
        let recovery_id =
            RecoveryId::trial_recovery_from_prehash(signing_key.verifying_key(), hash, &signature)
                .map_err(signing_failed)?;
        (signature, recovery_id)
    } else {
        signing_key.sign_prehash_recoverable(hash).map_err(signing_failed)?
    };

    let bytes = signature.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..32]);
    s.copy_from_slice(&bytes[32..]);
    Ok(RecoverableSignature {
        r,
        s,
        v: recovery_id.to_byte(),
    })
}

/// Recover the uncompressed (65-byte) public key that produced `signature`.
pub fn recover_public_key(
    hash: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<Vec<u8>, SignerError> {
    let sig = Signature::from_scalars(FieldBytes::from(signature.r), FieldBytes::from(signature.s))
        .map_err(|e| SignerError::RecoveryFailed(e.to_string()))?;
    let recovery_id = RecoveryId::from_byte(signature.v)
        .ok_or_else(|| SignerError::RecoveryFailed(format!("invalid recovery id {}", signature.v)))?;
    let key = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id)
        .map_err(|e| SignerError::RecoveryFailed(e.to_string()))?;
    Ok(PublicKey::from(&key)
        .to_encoded_point(false)
        .as_bytes()
        .to_vec())
}

// =============================================================================
// TESTS
// =============================================================================
