// wallet-core/src/chains/lbr/signer.rs
//
// LBR Signer Module
// Hỗ trợ: EIP-155 (Replay Protection), legacy (v = 27/28), Personal Sign ("\x19LBR Signed Message:\n")
//
// Mọi chữ ký đều được tự kiểm tra bằng public-key recovery trước khi trả về.

use crate::chains::lbr::address::Address;
use crate::chains::lbr::transaction::LbrTransaction;
use crate::config::SignerConfig;
use crate::crypto::hash::keccak256;
use crate::crypto::secp256k1::{
    private_to_public, recover_public_key, sign_recoverable, RecoverableSignature, SIGNATURE_LEN,
};
use crate::error::{SignerError, WalletResult};
use crate::keystore::AbstractKeystore;
use alloy::primitives::U256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

/// Added to the recovery id of personal-message signatures.
const PERSONAL_V_OFFSET: u8 = 27;

/// Offline signer for LBR transactions and personal messages.
///
/// Stateless apart from its [`SignerConfig`]; the private key is passed per call
/// (or decrypted from a keystore for the duration of one call).
#[derive(Debug, Clone, Default)]
pub struct Signer {
    config: SignerConfig,
}

impl Signer {
    pub fn new(config: SignerConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    // =========================================================================
    // TRANSACTION SIGNING
    // =========================================================================

    /// Sign `transaction` in place.
    ///
    /// `transaction.chain_id` chọn mode: `Some` → EIP-155 (`v = recid + 35 + 2·chainId`),
    /// `None` → legacy (`v = recid + 27`). The transaction is only modified on success.
    ///
    /// # Errors
    /// `SignatureVerificationFailed` if no attempt within `max_attempts` recovers
    /// to the signing key.
    pub fn sign_transaction_with_key(
        &self,
        transaction: &mut LbrTransaction,
        private_key: &[u8],
    ) -> WalletResult<()> {
        let expected_public_key = private_to_public(private_key, false)?;
        let chain_id = transaction.chain_id;
        let hash = transaction.hash_for_signature(chain_id);
        let v_offset = match chain_id {
            Some(id) => U256::from(35u64) + U256::from(id.value()) * U256::from(2u64),
            None => U256::from(27u64),
        };

        for attempt in 0..self.config.max_attempts {
            let signature = sign_recoverable(&hash, private_key, attempt > 0)?;

            let mut candidate = transaction.clone();
            candidate.v = U256::from(signature.v) + v_offset;
            candidate.r = U256::from_be_bytes(signature.r);
            candidate.s = U256::from_be_bytes(signature.s);

            match candidate.recover_public_key() {
                Ok(recovered) if bool::from(recovered.ct_eq(&expected_public_key)) => {
                    *transaction = candidate;
                    return Ok(());
                }
                _ => debug!(attempt, "recovered public key mismatch, retrying"),
            }
        }

        warn!(
            max_attempts = self.config.max_attempts,
            "transaction signature self-verification exhausted"
        );
        Err(SignerError::SignatureVerificationFailed.into())
    }

    /// Decrypt the key of `address` from `keystore` and sign `transaction`.
    pub fn sign_transaction<K: AbstractKeystore + ?Sized>(
        &self,
        transaction: &mut LbrTransaction,
        keystore: &K,
        address: &Address,
        password: &str,
    ) -> WalletResult<()> {
        let private_key = keystore.unsafe_get_private_key(password, address)?;
        self.sign_transaction_with_key(transaction, &private_key[..])
    }

    // =========================================================================
    // HASH SIGNING (Low-level)
    // =========================================================================

    /// Self-verified recoverable signature over a 32-byte hash. `v` is the raw recovery id.
    ///
    /// # Warning
    /// Chỉ dùng khi hash đã được tính đúng chuẩn (transaction hoặc personal message).
    pub fn sign_hash(&self, hash: &[u8; 32], private_key: &[u8]) -> WalletResult<RecoverableSignature> {
        let expected_public_key = private_to_public(private_key, false)?;

        for attempt in 0..self.config.max_attempts {
            let signature = sign_recoverable(hash, private_key, attempt > 0)?;
            match recover_public_key(hash, &signature) {
                Ok(recovered) if bool::from(recovered.ct_eq(&expected_public_key)) => {
                    return Ok(signature)
                }
                _ => debug!(attempt, "recovered public key mismatch, retrying"),
            }
        }

        warn!(
            max_attempts = self.config.max_attempts,
            "hash signature self-verification exhausted"
        );
        Err(SignerError::SignatureVerificationFailed.into())
    }

    // =========================================================================
    // PERSONAL MESSAGES
    // =========================================================================

    /// `prefix ‖ len(message) ‖ message`, unless `message` already starts with
    /// `prefix ‖ len(message)`.
    pub fn prefixed_message(&self, message: &[u8]) -> Vec<u8> {
        let prefix = format!("{}{}", self.config.message_prefix(), message.len());
        if message.starts_with(prefix.as_bytes()) {
            return message.to_vec();
        }
        let mut data = Vec::with_capacity(prefix.len() + message.len());
        data.extend_from_slice(prefix.as_bytes());
        data.extend_from_slice(message);
        data
    }

    pub fn hash_personal_message(&self, message: &[u8]) -> [u8; 32] {
        keccak256(&self.prefixed_message(message))
    }

    /// 65-byte `r ‖ s ‖ v` with `v` = 27/28.
    pub fn sign_personal_message_with_key(
        &self,
        message: &[u8],
        private_key: &[u8],
    ) -> WalletResult<[u8; SIGNATURE_LEN]> {
        let hash = self.hash_personal_message(message);
        let mut signature = self.sign_hash(&hash, private_key)?;
        signature.v += PERSONAL_V_OFFSET;
        Ok(signature.to_bytes())
    }

    pub fn sign_personal_message<K: AbstractKeystore + ?Sized>(
        &self,
        message: &[u8],
        keystore: &K,
        address: &Address,
        password: &str,
    ) -> WalletResult<[u8; SIGNATURE_LEN]> {
        let private_key = keystore.unsafe_get_private_key(password, address)?;
        self.sign_personal_message_with_key(message, &private_key[..])
    }

    /// Address that signed `message` (prefixed the same way as signing).
    pub fn personal_ec_recover(&self, message: &[u8], signature: &[u8]) -> WalletResult<Address> {
        hash_ec_recover(&self.hash_personal_message(message), signature)
    }
}

/// Address that produced `signature` (65 bytes `r ‖ s ‖ v`, v ∈ {0,1,27,28}) over `hash`.
pub fn hash_ec_recover(hash: &[u8; 32], signature: &[u8]) -> WalletResult<Address> {
    let signature = RecoverableSignature::from_bytes(signature)?;
    let public_key = recover_public_key(hash, &signature)?;
    Address::from_public_key(&public_key)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::NetworkId;
    use crate::error::WalletError;
    use crate::keystore::PlainKeystore;
    use rand::{rngs::OsRng, RngCore};

    const ANVIL_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ANVIL_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn anvil_key() -> Vec<u8> {
        hex::decode(ANVIL_PRIVATE_KEY).unwrap()
    }

    fn sample_transaction(chain_id: Option<NetworkId>) -> LbrTransaction {
        LbrTransaction::new(
            U256::from(9u64),
            U256::from(20_000_000_000u64),
            U256::from(21_000u64),
            "0x3535353535353535353535353535353535353535".parse().unwrap(),
            U256::from(1_000_000_000_000_000_000u64),
            Vec::new(),
        )
        .with_chain_id(chain_id)
    }

    #[test]
    fn test_eip155_reference_signature() {
        let signer = Signer::default();
        let mut tx = sample_transaction(Some(NetworkId::MAINNET));
        signer.sign_transaction_with_key(&mut tx, &[0x46u8; 32]).unwrap();

        // First attempt is RFC6979-deterministic
        assert_eq!(tx.v, U256::from(37u64));
        assert_eq!(
            hex::encode(tx.encode()),
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }

    #[test]
    fn test_sign_transaction_modes() {
        let signer = Signer::default();

        let mut legacy = sample_transaction(None);
        signer.sign_transaction_with_key(&mut legacy, &anvil_key()).unwrap();
        assert!(legacy.v == U256::from(27u64) || legacy.v == U256::from(28u64));
        assert_eq!(legacy.sender().unwrap().to_string(), ANVIL_ADDRESS);
        assert_eq!(legacy.chain_id, None);

        let mut replay_protected = sample_transaction(Some(NetworkId::KOVAN));
        signer.sign_transaction_with_key(&mut replay_protected, &anvil_key()).unwrap();
        let v = u64::try_from(replay_protected.v).unwrap();
        assert!(v == 35 + 84 || v == 36 + 84);
        assert_eq!(replay_protected.sender().unwrap().to_string(), ANVIL_ADDRESS);
        assert_eq!(replay_protected.inferred_chain_id(), Some(NetworkId::KOVAN));
        assert_ne!(legacy.r, U256::ZERO);
        assert_ne!(legacy.r, replay_protected.r);
    }

    #[test]
    fn test_signature_self_consistency_random_keys() {
        let signer = Signer::default();
        for i in 0..128u32 {
            let mut key = [0u8; 32];
            OsRng.fill_bytes(&mut key);
            let mut hash = [0u8; 32];
            OsRng.fill_bytes(&mut hash);

            let Ok(expected) = Address::from_private_key(&key) else {
                continue; // out of curve range, astronomically unlikely
            };
            let signature = signer.sign_hash(&hash, &key).unwrap();
            assert_eq!(hash_ec_recover(&hash, &signature.to_bytes()).unwrap(), expected);

            let chain_id = if i % 2 == 0 { Some(NetworkId(u64::from(i) + 1)) } else { None };
            let mut tx = sample_transaction(chain_id);
            tx.data = hash.to_vec();
            signer.sign_transaction_with_key(&mut tx, &key).unwrap();
            assert_eq!(tx.sender().unwrap(), expected);
        }
    }

    #[test]
    fn test_attempts_exhausted() {
        let signer = Signer::new(SignerConfig {
            max_attempts: 0,
            ..SignerConfig::default()
        });
        let mut tx = sample_transaction(None);
        let result = signer.sign_transaction_with_key(&mut tx, &anvil_key());
        assert_eq!(
            result,
            Err(WalletError::Signer(SignerError::SignatureVerificationFailed))
        );
        assert!(!tx.is_signed());
    }

    #[test]
    fn test_invalid_private_key() {
        let signer = Signer::default();
        let mut tx = sample_transaction(None);
        assert!(signer.sign_transaction_with_key(&mut tx, &[0u8; 32]).is_err());
        assert!(signer.sign_transaction_with_key(&mut tx, &[1u8; 31]).is_err());
    }

    #[test]
    fn test_personal_prefix() {
        let signer = Signer::default();
        assert_eq!(signer.prefixed_message(b"hello"), b"\x19LBR Signed Message:\n5hello".to_vec());

        // Already-prefixed input is not wrapped twice
        let already = b"\x19LBR Signed Message:\n28hello".to_vec();
        assert_eq!(already.len(), 28);
        assert_eq!(signer.prefixed_message(&already), already);

        let custom = Signer::new(SignerConfig {
            message_brand: "Test".into(),
            ..SignerConfig::default()
        });
        assert!(custom.prefixed_message(b"x").starts_with(b"\x19Test Signed Message:\n1"));
    }

    #[test]
    fn test_personal_sign_and_recover() {
        let signer = Signer::default();
        let message = b"Hello LBR";
        let signature = signer.sign_personal_message_with_key(message, &anvil_key()).unwrap();
        assert!(signature[64] == 27 || signature[64] == 28);

        let recovered = signer.personal_ec_recover(message, &signature).unwrap();
        assert_eq!(recovered.to_string(), ANVIL_ADDRESS);

        // Different message recovers a different address
        let other = signer.personal_ec_recover(b"Hello LBR!", &signature).unwrap();
        assert_ne!(other.to_string(), ANVIL_ADDRESS);
    }

    #[test]
    fn test_recover_rejects_bad_length() {
        let hash = [7u8; 32];
        assert_eq!(
            hash_ec_recover(&hash, &[0u8; 64]),
            Err(WalletError::Signer(SignerError::InvalidSignatureLength(64)))
        );
        assert!(hash_ec_recover(&hash, &[0u8; 65]).is_err());
    }

    #[test]
    fn test_sign_through_keystore() {
        let keystore = PlainKeystore::new(&anvil_key()).unwrap();
        let address: Address = ANVIL_ADDRESS.parse().unwrap();
        let signer = Signer::default();

        let mut tx = sample_transaction(Some(NetworkId::MAINNET));
        signer.sign_transaction(&mut tx, &keystore, &address, "").unwrap();
        assert_eq!(tx.sender().unwrap(), address);

        let signature = signer.sign_personal_message(b"msg", &keystore, &address, "").unwrap();
        assert_eq!(signer.personal_ec_recover(b"msg", &signature).unwrap(), address);

        let stranger: Address = "0x0000000000000000000000000000000000000001".parse().unwrap();
        assert!(signer.sign_transaction(&mut tx, &keystore, &stranger, "").is_err());
    }
}
