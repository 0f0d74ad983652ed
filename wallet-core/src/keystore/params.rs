// wallet-core/src/keystore/params.rs
//
// JSON records (Web3 Secret Storage v3 + HD extension).
// Import lower-case toàn bộ document trước khi parse, nên các field camelCase
// của bản BIP-32 có alias lowercase.

use crate::error::KeystoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Only supported record version.
pub const KEYSTORE_VERSION: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParamsV3 {
    pub salt: String,
    pub dklen: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prf: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherParamsV3 {
    pub iv: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoParamsV3 {
    pub ciphertext: String,
    pub cipher: String,
    pub cipherparams: CipherParamsV3,
    pub kdf: String,
    pub kdfparams: KdfParamsV3,
    pub mac: String,
    /// Legacy field; must be `"1"` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Single-key record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreParamsV3 {
    /// 40 lowercase hex chars, no `0x`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub crypto: CryptoParamsV3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub version: u32,
}

/// HD-tree record: the ciphertext is the serialized root node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreParamsBip32 {
    pub crypto: CryptoParamsV3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub version: u32,
    #[serde(rename = "isHDWallet", alias = "ishdwallet", default)]
    pub is_hd_wallet: bool,
    #[serde(rename = "pathToAddress", alias = "pathtoaddress", default)]
    pub path_to_address: BTreeMap<String, String>,
    #[serde(
        rename = "rootPath",
        alias = "rootpath",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub root_path: Option<String>,
}

/// Shared header checks: record version 3, crypto version absent or `"1"`.
pub(crate) fn check_versions(version: u32, crypto: &CryptoParamsV3) -> Result<(), KeystoreError> {
    if version != KEYSTORE_VERSION {
        return Err(KeystoreError::UnsupportedVersion(version));
    }
    match crypto.version.as_deref() {
        None | Some("1") => Ok(()),
        Some(other) => Err(KeystoreError::CorruptedKeystore(format!(
            "unsupported crypto version {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIP32_JSON: &str = r#"{
        "crypto": {
            "ciphertext": "00", "cipher": "aes-128-cbc",
            "cipherparams": { "iv": "00" },
            "kdf": "scrypt",
            "kdfparams": { "salt": "00", "dklen": 32, "n": 16, "r": 8, "p": 1 },
            "mac": "00"
        },
        "id": "x", "version": 3,
        "isHDWallet": true,
        "pathToAddress": { "m/44'/60'/0'/0/0": "f39fd6e51aad88f6f4ce6ab8827279cfffb92266" },
        "rootPath": "m/44'/60'/0'/0"
    }"#;

    #[test]
    fn test_bip32_field_names() {
        let params: KeystoreParamsBip32 = serde_json::from_str(BIP32_JSON).unwrap();
        assert!(params.is_hd_wallet);
        assert_eq!(params.root_path.as_deref(), Some("m/44'/60'/0'/0"));

        // Lowercased document still parses through the aliases
        let lowered: KeystoreParamsBip32 =
            serde_json::from_str(&BIP32_JSON.to_lowercase()).unwrap();
        assert_eq!(lowered, params);

        let out = serde_json::to_string(&params).unwrap();
        assert!(out.contains("\"isHDWallet\":true"));
        assert!(out.contains("\"pathToAddress\""));
        assert!(out.contains("\"rootPath\""));
    }

    #[test]
    fn test_kdf_params_skip_absent_fields() {
        let params = KdfParamsV3 {
            salt: "ab".into(),
            dklen: 32,
            n: None,
            p: None,
            r: None,
            c: Some(2),
            prf: Some("hmac-sha256".into()),
        };
        let out = serde_json::to_string(&params).unwrap();
        assert!(!out.contains("\"n\""));
        assert!(out.contains("\"c\":2"));
    }

    #[test]
    fn test_check_versions() {
        let params: KeystoreParamsBip32 = serde_json::from_str(BIP32_JSON).unwrap();
        assert!(check_versions(3, &params.crypto).is_ok());
        assert_eq!(
            check_versions(1, &params.crypto),
            Err(KeystoreError::UnsupportedVersion(1))
        );

        let mut crypto = params.crypto.clone();
        crypto.version = Some("1".into());
        assert!(check_versions(3, &crypto).is_ok());
        crypto.version = Some("2".into());
        assert!(check_versions(3, &crypto).is_err());
    }
}
