// wallet-core/src/crypto/hash.rs
//
// Hash primitives used across the wallet core.
// Keccak-256 (tiny-keccak), SHA-256 / SHA-512 (sha2), RIPEMD-160 (ripemd), HMAC (hmac)

use hmac::{Hmac, Mac};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};
use tiny_keccak::{Hasher, Keccak};
use zeroize::{Zeroize, Zeroizing};

type HmacSha512 = Hmac<Sha512>;

/// Keccak-256 (the pre-standard SHA3 variant used for addresses and MACs).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut out = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut out);
    out
}

/// Keccak-256 over several slices without concatenating them first.
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut out = [0u8; 32];
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize(&mut out);
    out
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA256(SHA256(data)), used by extended-key checksums.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// RIPEMD160(SHA256(data)), used by BIP-32 fingerprints.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(sha256(data)).into()
}

/// HMAC-SHA512 → (I_L, I_R).
///
/// I_L is key material in every BIP-32 use, so it comes back wrapped and the
/// intermediate MAC output is wiped.
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> (Zeroizing<[u8; 32]>, [u8; 32]) {
    // HMAC chấp nhận key mọi độ dài, new_from_slice không bao giờ lỗi
    let mut mac = <HmacSha512 as Mac>::new_from_slice(key)
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(data);
    let mut output = mac.finalize().into_bytes();

    let mut left = Zeroizing::new([0u8; 32]);
    let mut right = [0u8; 32];
    left.copy_from_slice(&output[..32]);
    right.copy_from_slice(&output[32..]);
    output.as_mut_slice().zeroize();
    (left, right)
}
