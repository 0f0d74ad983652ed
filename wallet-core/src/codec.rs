// wallet-core/src/codec.rs
//
// Codec Utilities - hex / base58 / big-endian integers / fixed-length padding
//
// Mọi module khác đều dùng các helper ở đây, nên giữ chúng nhỏ và không panic.

use crate::error::CryptoError;

/// AES block size, used by the PKCS7 helpers.
pub const AES_BLOCK_SIZE: usize = 16;

// =============================================================================
// HEX
// =============================================================================

/// Strip an optional `0x` / `0X` prefix.
#[inline]
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Add a `0x` prefix if it is missing.
#[inline]
pub fn with_hex_prefix(s: &str) -> String {
    format!("0x{}", strip_hex_prefix(s))
}

/// Decode hex with or without the `0x` prefix.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, CryptoError> {
    Ok(hex::decode(strip_hex_prefix(s))?)
}

/// Decode hex into a fixed-size array.
pub fn decode_hex_array<const N: usize>(s: &str) -> Result<[u8; N], CryptoError> {
    let bytes = decode_hex(s)?;
    bytes.as_slice().try_into().map_err(|_| {
        CryptoError::InvalidHex(format!("expected {} bytes, got {}", N, bytes.len()))
    })
}

/// `0x`-prefixed lowercase hex.
#[inline]
pub fn encode_hex_prefixed(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

// =============================================================================
// BASE58
// =============================================================================

/// Plain base58 (Bitcoin alphabet). Checksums are the caller's business: the
/// extended-key blob already carries its own.
#[inline]
pub fn to_base58(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

pub fn from_base58(s: &str) -> Result<Vec<u8>, CryptoError> {
    bs58::decode(s)
        .into_vec()
        .map_err(|e| CryptoError::InvalidBase58(e.to_string()))
}

// =============================================================================
// INTEGERS & PADDING
// =============================================================================

/// `ser32(i)` from BIP-32: 4-byte big-endian.
#[inline]
pub const fn serialize_u32(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Left-pad with zeros to exactly `len` bytes. `None` if `bytes` is longer.
pub fn pad_left(bytes: &[u8], len: usize) -> Option<Vec<u8>> {
    if bytes.len() > len {
        return None;
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(bytes);
    Some(out)
}

/// Drop leading zero bytes (minimal big-endian form).
#[inline]
pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

/// PKCS7-pad to a multiple of the AES block size (always adds 1..=16 bytes).
pub fn pkcs7_pad(data: &[u8]) -> Vec<u8> {
    let pad = AES_BLOCK_SIZE - data.len() % AES_BLOCK_SIZE;
    let mut out = Vec::with_capacity(data.len() + pad);
    out.extend_from_slice(data);
    out.resize(data.len() + pad, pad as u8);
    out
}

/// Strip PKCS7 padding. `None` when the padding bytes are malformed.
pub fn pkcs7_unpad(data: &[u8]) -> Option<&[u8]> {
    let pad = *data.last()? as usize;
    if pad == 0 || pad > AES_BLOCK_SIZE || pad > data.len() || data.len() % AES_BLOCK_SIZE != 0 {
        return None;
    }
    let (body, tail) = data.split_at(data.len() - pad);
    if tail.iter().all(|b| *b as usize == pad) {
        Some(body)
    } else {
        None
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_prefix_handling() {
        assert_eq!(strip_hex_prefix("0xabcd"), "abcd");
        assert_eq!(strip_hex_prefix("0XABCD"), "ABCD");
        assert_eq!(strip_hex_prefix("abcd"), "abcd");
        assert_eq!(with_hex_prefix("abcd"), "0xabcd");
        assert_eq!(with_hex_prefix("0xabcd"), "0xabcd");
        assert_eq!(decode_hex("0x0102").unwrap(), vec![1, 2]);
        assert!(decode_hex("0xzz").is_err());
    }

    #[test]
    fn test_decode_hex_array_length() {
        let ok: [u8; 2] = decode_hex_array("0x0a0b").unwrap();
        assert_eq!(ok, [0x0a, 0x0b]);
        assert!(decode_hex_array::<3>("0a0b").is_err());
    }

    #[test]
    fn test_base58_known_value() {
        // "Hello World!" là vector quen thuộc của bs58
        assert_eq!(to_base58(b"Hello World!"), "2NEpo7TZRRrLZSi2U");
        assert_eq!(from_base58("2NEpo7TZRRrLZSi2U").unwrap(), b"Hello World!");
        assert!(from_base58("0OIl").is_err());
    }

    #[test]
    fn test_serialize_u32_big_endian() {
        assert_eq!(serialize_u32(1), [0, 0, 0, 1]);
        assert_eq!(serialize_u32(0x8000_0000), [0x80, 0, 0, 0]);
    }

    #[test]
    fn test_pad_left_and_trim() {
        assert_eq!(pad_left(&[1, 2], 4).unwrap(), vec![0, 0, 1, 2]);
        assert!(pad_left(&[1, 2, 3], 2).is_none());
        assert_eq!(trim_leading_zeros(&[0, 0, 5, 0]), &[5, 0]);
        assert!(trim_leading_zeros(&[0, 0]).is_empty());
    }

    #[test]
    fn test_pkcs7() {
        let padded = pkcs7_pad(&[7u8; 82]);
        assert_eq!(padded.len(), 96);
        assert!(padded[82..].iter().all(|b| *b == 14));
        assert_eq!(pkcs7_unpad(&padded).unwrap(), &[7u8; 82][..]);

        // Block-aligned input gets a full block of padding
        assert_eq!(pkcs7_pad(&[0u8; 32]).len(), 48);

        let mut broken = padded.clone();
        broken[90] = 3;
        assert!(pkcs7_unpad(&broken).is_none());
        assert!(pkcs7_unpad(&[]).is_none());
    }
}
