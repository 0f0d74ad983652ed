// wallet-core/src/keystore/crypto.rs
//
// Keystore encryption protocol (chung cho V3 và BIP-32):
//   password --KDF(scrypt | pbkdf2)--> dk
//   encKey = dk[0..16], macKey = dk[len-16..]
//   ciphertext = AES-128-{CBC,CTR}(encKey, iv, payload)
//   mac = keccak256(macKey ‖ ciphertext)
//
// Decrypt luôn kiểm tra MAC (constant-time) TRƯỚC khi giải mã.

use crate::codec::{decode_hex, pkcs7_pad, pkcs7_unpad, AES_BLOCK_SIZE};
use crate::config::{CipherMode, KdfChoice, KeystoreConfig, Prf};
use crate::crypto::hash::keccak256_concat;
use crate::error::{CryptoError, KeystoreError, WalletResult};
use crate::keystore::params::{CipherParamsV3, CryptoParamsV3, KdfParamsV3};
use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit, StreamCipher};
use aes::Aes128;
use rand::{rngs::OsRng, RngCore};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::Zeroizing;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes128Ctr = ctr::Ctr128BE<Aes128>;

pub const SALT_LEN: usize = 32;
pub const IV_LEN: usize = 16;
const KEY_HALF: usize = 16;

/// Payload padding, fixed per keystore variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// Payload must already be block-aligned (V3: 32-byte key).
    None,
    /// PKCS7 in both CBC and CTR mode (BIP-32: 82-byte node → 96 bytes).
    Pkcs7,
}

/// Fill `len` bytes from the OS RNG, propagating failure.
pub(crate) fn random_bytes(len: usize) -> Result<Vec<u8>, CryptoError> {
    let mut out = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut out)
        .map_err(|e| CryptoError::RandomnessUnavailable(e.to_string()))?;
    Ok(out)
}

fn corrupted(field: &str) -> KeystoreError {
    KeystoreError::CorruptedKeystore(format!("invalid {}", field))
}

// =============================================================================
// KDF
// =============================================================================

/// KDF choice and cost recorded in `kdf` / `kdfparams`.
pub(crate) fn kdf_choice_from_record(kdf: &str, params: &KdfParamsV3) -> Result<KdfChoice, KeystoreError> {
    let missing = |name: &str| KeystoreError::InvalidKdfParams(format!("missing {}", name));
    match kdf {
        "scrypt" => Ok(KdfChoice::Scrypt {
            n: params.n.ok_or_else(|| missing("n"))?,
            r: params.r.ok_or_else(|| missing("r"))?,
            p: params.p.ok_or_else(|| missing("p"))?,
            dklen: params.dklen,
        }),
        "pbkdf2" => Ok(KdfChoice::Pbkdf2 {
            prf: Prf::from_name(params.prf.as_deref().ok_or_else(|| missing("prf"))?)?,
            iterations: params.c.ok_or_else(|| missing("c"))?,
            dklen: params.dklen,
        }),
        other => Err(KeystoreError::UnsupportedKdf(other.to_string())),
    }
}

/// Config that re-creates a record with the same KDF cost and cipher mode.
pub(crate) fn config_from_record(crypto: &CryptoParamsV3) -> Result<KeystoreConfig, KeystoreError> {
    Ok(KeystoreConfig::new(
        kdf_choice_from_record(&crypto.kdf, &crypto.kdfparams)?,
        CipherMode::from_name(&crypto.cipher)?,
    ))
}

/// Run the KDF named in a record over `password`.
pub fn derive_key(password: &[u8], kdf: &str, params: &KdfParamsV3) -> WalletResult<Zeroizing<Vec<u8>>> {
    let choice = kdf_choice_from_record(kdf, params)?;
    let salt = decode_hex(&params.salt).map_err(|_| corrupted("salt"))?;
    run_kdf(password, &salt, &choice)
}

fn run_kdf(password: &[u8], salt: &[u8], choice: &KdfChoice) -> WalletResult<Zeroizing<Vec<u8>>> {
    match *choice {
        KdfChoice::Scrypt { n, r, p, dklen } => {
            check_dklen(dklen)?;
            if n < 2 || !n.is_power_of_two() {
                return Err(KeystoreError::InvalidKdfParams(format!(
                    "scrypt n must be a power of two > 1, got {}",
                    n
                ))
                .into());
            }
            let log_n = n.trailing_zeros() as u8;
            let params = scrypt::Params::new(log_n, r, p, dklen)
                .map_err(|e| KeystoreError::InvalidKdfParams(e.to_string()))?;
            let mut out = Zeroizing::new(vec![0u8; dklen]);
            scrypt::scrypt(password, salt, &params, &mut out)
                .map_err(|e| KeystoreError::InvalidKdfParams(e.to_string()))?;
            Ok(out)
        }
        KdfChoice::Pbkdf2 {
            prf,
            iterations,
            dklen,
        } => {
            check_dklen(dklen)?;
            if iterations == 0 {
                return Err(KeystoreError::InvalidKdfParams("pbkdf2 c must be > 0".into()).into());
            }
            let mut out = Zeroizing::new(vec![0u8; dklen]);
            match prf {
                Prf::HmacSha256 => pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out),
                Prf::HmacSha384 => pbkdf2::pbkdf2_hmac::<Sha384>(password, salt, iterations, &mut out),
                Prf::HmacSha512 => pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut out),
            }
            Ok(out)
        }
    }
}

fn check_dklen(dklen: usize) -> Result<(), KeystoreError> {
    if !(2 * KEY_HALF..=64).contains(&dklen) {
        return Err(KeystoreError::InvalidKdfParams(format!(
            "dklen must be between 32 and 64, got {}",
            dklen
        )));
    }
    Ok(())
}

fn kdf_params_for(choice: &KdfChoice, salt: &[u8]) -> KdfParamsV3 {
    let salt = hex::encode(salt);
    match *choice {
        KdfChoice::Scrypt { n, r, p, dklen } => KdfParamsV3 {
            salt,
            dklen,
            n: Some(n),
            p: Some(p),
            r: Some(r),
            c: None,
            prf: None,
        },
        KdfChoice::Pbkdf2 {
            prf,
            iterations,
            dklen,
        } => KdfParamsV3 {
            salt,
            dklen,
            n: None,
            p: None,
            r: None,
            c: Some(iterations),
            prf: Some(prf.as_str().to_string()),
        },
    }
}

// =============================================================================
// AES
// =============================================================================

fn aes_encrypt(mode: CipherMode, key: &[u8], iv: &[u8], data: &[u8]) -> WalletResult<Vec<u8>> {
    let invalid = |e: aes::cipher::InvalidLength| KeystoreError::CorruptedKeystore(e.to_string());
    match mode {
        CipherMode::Aes128Cbc => {
            if data.len() % AES_BLOCK_SIZE != 0 {
                return Err(KeystoreError::CorruptedKeystore(format!(
                    "payload of {} bytes is not block aligned",
                    data.len()
                ))
                .into());
            }
            let cipher = Aes128CbcEnc::new_from_slices(key, iv).map_err(invalid)?;
            Ok(cipher.encrypt_padded_vec_mut::<NoPadding>(data))
        }
        CipherMode::Aes128Ctr => {
            let mut cipher = Aes128Ctr::new_from_slices(key, iv).map_err(invalid)?;
            let mut buf = data.to_vec();
            cipher.apply_keystream(&mut buf);
            Ok(buf)
        }
    }
}

fn aes_decrypt(mode: CipherMode, key: &[u8], iv: &[u8], data: &[u8]) -> WalletResult<Zeroizing<Vec<u8>>> {
    let invalid = |e: aes::cipher::InvalidLength| KeystoreError::CorruptedKeystore(e.to_string());
    match mode {
        CipherMode::Aes128Cbc => {
            let cipher = Aes128CbcDec::new_from_slices(key, iv).map_err(invalid)?;
            let plain = cipher
                .decrypt_padded_vec_mut::<NoPadding>(data)
                .map_err(|_| corrupted("ciphertext length"))?;
            Ok(Zeroizing::new(plain))
        }
        CipherMode::Aes128Ctr => {
            let mut cipher = Aes128Ctr::new_from_slices(key, iv).map_err(invalid)?;
            let mut buf = Zeroizing::new(data.to_vec());
            cipher.apply_keystream(&mut buf);
            Ok(buf)
        }
    }
}

// =============================================================================
// PROTOCOL
// =============================================================================

/// Encrypt `payload` under `password` with fresh salt and IV.
pub fn encrypt(
    password: &str,
    payload: &[u8],
    config: &KeystoreConfig,
    padding: Padding,
) -> WalletResult<CryptoParamsV3> {
    let salt = random_bytes(SALT_LEN)?;
    let iv = random_bytes(IV_LEN)?;
    let derived = run_kdf(password.as_bytes(), &salt, &config.kdf)?;
    let (enc_key, mac_key) = split_derived_key(&derived);

    let plaintext = match padding {
        Padding::None => Zeroizing::new(payload.to_vec()),
        Padding::Pkcs7 => Zeroizing::new(pkcs7_pad(payload)),
    };
    let ciphertext = aes_encrypt(config.cipher, enc_key, &iv, &plaintext)?;
    let mac = keccak256_concat(&[mac_key, &ciphertext]);

    Ok(CryptoParamsV3 {
        ciphertext: hex::encode(&ciphertext),
        cipher: config.cipher.as_str().to_string(),
        cipherparams: CipherParamsV3 {
            iv: hex::encode(&iv),
        },
        kdf: config.kdf.name().to_string(),
        kdfparams: kdf_params_for(&config.kdf, &salt),
        mac: hex::encode(mac),
        version: None,
    })
}

/// Verify the MAC and decrypt. The returned payload is wiped on drop.
///
/// # Errors
/// - `DecryptionFailed`: MAC mismatch (sai password hoặc record bị sửa)
/// - `UnsupportedCipher` / `UnsupportedKdf` / `UnsupportedPrf`
/// - `CorruptedKeystore`: malformed hex, ciphertext length or padding
pub fn decrypt(password: &str, crypto: &CryptoParamsV3, padding: Padding) -> WalletResult<Zeroizing<Vec<u8>>> {
    let mode = CipherMode::from_name(&crypto.cipher)?;
    let ciphertext = decode_hex(&crypto.ciphertext).map_err(|_| corrupted("ciphertext"))?;
    let iv = decode_hex(&crypto.cipherparams.iv).map_err(|_| corrupted("iv"))?;
    let stored_mac = decode_hex(&crypto.mac).map_err(|_| corrupted("mac"))?;
    if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_SIZE != 0 {
        return Err(KeystoreError::CorruptedKeystore(format!(
            "ciphertext of {} bytes is not block aligned",
            ciphertext.len()
        ))
        .into());
    }

    let derived = derive_key(password.as_bytes(), &crypto.kdf, &crypto.kdfparams)?;
    let (enc_key, mac_key) = split_derived_key(&derived);

    let mac = keccak256_concat(&[mac_key, &ciphertext]);
    if !bool::from(mac[..].ct_eq(&stored_mac[..])) {
        debug!("keystore MAC mismatch");
        return Err(KeystoreError::DecryptionFailed.into());
    }

    let plaintext = aes_decrypt(mode, enc_key, &iv, &ciphertext)?;
    match padding {
        Padding::None => Ok(plaintext),
        Padding::Pkcs7 => {
            let unpadded = pkcs7_unpad(&plaintext).ok_or_else(|| corrupted("padding"))?;
            Ok(Zeroizing::new(unpadded.to_vec()))
        }
    }
}

fn split_derived_key(derived: &[u8]) -> (&[u8], &[u8]) {
    (&derived[..KEY_HALF], &derived[derived.len() - KEY_HALF..])
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::WalletError;

    /// Low-cost parameters for tests.
    pub(crate) fn cheap_scrypt(cipher: CipherMode) -> KeystoreConfig {
        KeystoreConfig::new(
            KdfChoice::Scrypt {
                n: 16,
                r: 8,
                p: 1,
                dklen: 32,
            },
            cipher,
        )
    }

    pub(crate) fn cheap_pbkdf2(prf: Prf, cipher: CipherMode) -> KeystoreConfig {
        KeystoreConfig::new(
            KdfChoice::Pbkdf2 {
                prf,
                iterations: 2,
                dklen: 32,
            },
            cipher,
        )
    }

    fn all_configs() -> Vec<KeystoreConfig> {
        let mut configs = Vec::new();
        for cipher in [CipherMode::Aes128Cbc, CipherMode::Aes128Ctr] {
            configs.push(cheap_scrypt(cipher));
            for prf in [Prf::HmacSha256, Prf::HmacSha384, Prf::HmacSha512] {
                configs.push(cheap_pbkdf2(prf, cipher));
            }
        }
        configs
    }

    #[test]
    fn test_roundtrip_all_kdfs_and_ciphers() {
        let key = [0x11u8; 32];
        let node = [0x22u8; 82];
        for config in all_configs() {
            let record = encrypt("password", &key, &config, Padding::None).unwrap();
            assert_eq!(record.cipher, config.cipher.as_str());
            assert_eq!(record.kdf, config.kdf.name());
            assert_eq!(hex::decode(&record.ciphertext).unwrap().len(), 32);
            assert_eq!(&decrypt("password", &record, Padding::None).unwrap()[..], &key);

            let record = encrypt("password", &node, &config, Padding::Pkcs7).unwrap();
            assert_eq!(hex::decode(&record.ciphertext).unwrap().len(), 96);
            assert_eq!(&decrypt("password", &record, Padding::Pkcs7).unwrap()[..], &node[..]);
        }
    }

    #[test]
    fn test_wrong_password_fails_mac() {
        for config in all_configs() {
            let record = encrypt("right", &[7u8; 32], &config, Padding::None).unwrap();
            assert_eq!(
                decrypt("wrong", &record, Padding::None),
                Err(WalletError::Keystore(KeystoreError::DecryptionFailed))
            );
        }
    }

    #[test]
    fn test_tampered_ciphertext_fails_mac() {
        let config = cheap_scrypt(CipherMode::Aes128Ctr);
        let mut record = encrypt("pw", &[7u8; 32], &config, Padding::None).unwrap();
        let mut bytes = hex::decode(&record.ciphertext).unwrap();
        bytes[0] ^= 0x80;
        record.ciphertext = hex::encode(bytes);
        assert_eq!(
            decrypt("pw", &record, Padding::None),
            Err(WalletError::Keystore(KeystoreError::DecryptionFailed))
        );
    }

    #[test]
    fn test_fresh_salt_and_iv() {
        let config = cheap_scrypt(CipherMode::Aes128Cbc);
        let a = encrypt("pw", &[1u8; 32], &config, Padding::None).unwrap();
        let b = encrypt("pw", &[1u8; 32], &config, Padding::None).unwrap();
        assert_ne!(a.kdfparams.salt, b.kdfparams.salt);
        assert_ne!(a.cipherparams.iv, b.cipherparams.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
        assert_eq!(hex::decode(&a.kdfparams.salt).unwrap().len(), SALT_LEN);
        assert_eq!(hex::decode(&a.cipherparams.iv).unwrap().len(), IV_LEN);
    }

    #[test]
    fn test_unsupported_names() {
        let config = cheap_scrypt(CipherMode::Aes128Cbc);
        let record = encrypt("pw", &[1u8; 32], &config, Padding::None).unwrap();

        let mut bad_cipher = record.clone();
        bad_cipher.cipher = "aes-256-gcm".into();
        assert_eq!(
            decrypt("pw", &bad_cipher, Padding::None),
            Err(WalletError::Keystore(KeystoreError::UnsupportedCipher("aes-256-gcm".into())))
        );

        let mut bad_kdf = record.clone();
        bad_kdf.kdf = "argon2".into();
        assert_eq!(
            decrypt("pw", &bad_kdf, Padding::None),
            Err(WalletError::Keystore(KeystoreError::UnsupportedKdf("argon2".into())))
        );

        let mut missing_param = record;
        missing_param.kdfparams.n = None;
        assert!(matches!(
            decrypt("pw", &missing_param, Padding::None),
            Err(WalletError::Keystore(KeystoreError::InvalidKdfParams(_)))
        ));
    }

    #[test]
    fn test_config_from_record() {
        for config in all_configs() {
            let record = encrypt("pw", &[3u8; 32], &config, Padding::None).unwrap();
            assert_eq!(config_from_record(&record).unwrap(), config);
        }
    }

    #[test]
    fn test_invalid_scrypt_n() {
        let config = KeystoreConfig::new(
            KdfChoice::Scrypt {
                n: 1000,
                r: 8,
                p: 1,
                dklen: 32,
            },
            CipherMode::Aes128Cbc,
        );
        assert!(matches!(
            encrypt("pw", &[1u8; 32], &config, Padding::None),
            Err(WalletError::Keystore(KeystoreError::InvalidKdfParams(_)))
        ));
    }

    #[test]
    fn test_unaligned_payload_without_padding_is_rejected() {
        let config = cheap_scrypt(CipherMode::Aes128Cbc);
        assert!(matches!(
            encrypt("pw", &[1u8; 20], &config, Padding::None),
            Err(WalletError::Keystore(KeystoreError::CorruptedKeystore(_)))
        ));
    }

    #[test]
    fn test_web3_secret_storage_pbkdf2_vector() {
        // Web3 Secret Storage Definition, PBKDF2-SHA-256 test vector
        let crypto = CryptoParamsV3 {
            ciphertext: "5318b4d5bcd28de64ee5559e671353e16f075ecae9f99c7a79a38af5f869aa46".into(),
            cipher: "aes-128-ctr".into(),
            cipherparams: CipherParamsV3 {
                iv: "6087dab2f9fdbbfaddc31a909735c1e6".into(),
            },
            kdf: "pbkdf2".into(),
            kdfparams: KdfParamsV3 {
                salt: "ae3cd4e7013836a3df6bd7241b12db061dbe2c6785853cce422d148a624ce0bd".into(),
                dklen: 32,
                n: None,
                p: None,
                r: None,
                c: Some(262_144),
                prf: Some("hmac-sha256".into()),
            },
            mac: "517ead924a9d0dc3124507e3393d175ce3ff7c1e96529c6c555ce9e51205e9b2".into(),
            version: None,
        };
        let key = decrypt("testpassword", &crypto, Padding::None).unwrap();
        assert_eq!(
            hex::encode(&key[..]),
            "7a28b5ba57c53603b0b07b56bba752f7784bf506fa95edc395f5cf6c7514fe9d"
        );
    }
}
