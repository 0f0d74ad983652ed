// wallet-core/src/chains/lbr/transaction.rs
//
// LBR legacy transaction + RLP encoding
//   signing payload (legacy):  rlp([nonce, gasPrice, gasLimit, to, value, data])
//   signing payload (EIP-155): rlp([nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0])
//   signed encoding:           rlp([nonce, gasPrice, gasLimit, to, value, data, v, r, s])

use crate::chains::lbr::address::Address;
use crate::chains::NetworkId;
use crate::codec::encode_hex_prefixed;
use crate::crypto::hash::keccak256;
use crate::crypto::secp256k1::{recover_public_key, RecoverableSignature};
use crate::error::{SignerError, WalletResult};
use alloy::primitives::U256;
use alloy::rlp::{Encodable, Header};

const LEGACY_V_OFFSET: u64 = 27;
const EIP155_V_OFFSET: u64 = 35;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LbrTransaction {
    pub nonce: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
    pub v: U256,
    pub r: U256,
    pub s: U256,
    /// `Some` → EIP-155 signing, `None` → legacy signing.
    pub chain_id: Option<NetworkId>,
}

fn rlp_list(fields: &[&dyn Encodable]) -> Vec<u8> {
    let payload_length: usize = fields.iter().map(|field| field.length()).sum();
    let mut out = Vec::with_capacity(payload_length + 9);
    Header {
        list: true,
        payload_length,
    }
    .encode(&mut out);
    for field in fields {
        field.encode(&mut out);
    }
    out
}

impl LbrTransaction {
    // =========================================================================
    // CONSTRUCTORS
    // =========================================================================

    /// Unsigned transaction (v = r = s = 0, legacy mode).
    pub fn new(
        nonce: U256,
        gas_price: U256,
        gas_limit: U256,
        to: Address,
        value: U256,
        data: Vec<u8>,
    ) -> Self {
        Self {
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            data,
            v: U256::ZERO,
            r: U256::ZERO,
            s: U256::ZERO,
            chain_id: None,
        }
    }

    pub fn with_chain_id(mut self, chain_id: Option<NetworkId>) -> Self {
        self.chain_id = chain_id;
        self
    }

    // =========================================================================
    // ENCODING
    // =========================================================================

    /// RLP payload whose keccak is signed.
    pub fn encode_for_signature(&self, chain_id: Option<NetworkId>) -> Vec<u8> {
        let to: &[u8] = match self.to.as_bytes() {
            Some(bytes) => bytes,
            None => &[],
        };
        let data = self.data.as_slice();
        match chain_id {
            Some(id) => {
                let id = U256::from(id.value());
                rlp_list(&[
                    &self.nonce,
                    &self.gas_price,
                    &self.gas_limit,
                    &to,
                    &self.value,
                    &data,
                    &id,
                    &U256::ZERO,
                    &U256::ZERO,
                ])
            }
            None => rlp_list(&[
                &self.nonce,
                &self.gas_price,
                &self.gas_limit,
                &to,
                &self.value,
                &data,
            ]),
        }
    }

    pub fn hash_for_signature(&self, chain_id: Option<NetworkId>) -> [u8; 32] {
        keccak256(&self.encode_for_signature(chain_id))
    }

    /// Signed wire encoding, ready for `sendRawTransaction`.
    pub fn encode(&self) -> Vec<u8> {
        let to: &[u8] = match self.to.as_bytes() {
            Some(bytes) => bytes,
            None => &[],
        };
        let data = self.data.as_slice();
        rlp_list(&[
            &self.nonce,
            &self.gas_price,
            &self.gas_limit,
            &to,
            &self.value,
            &data,
            &self.v,
            &self.r,
            &self.s,
        ])
    }

    /// keccak256 of the signed encoding.
    pub fn hash(&self) -> [u8; 32] {
        keccak256(&self.encode())
    }

    /// `0x`-prefixed hash, `None` while unsigned.
    pub fn txhash(&self) -> Option<String> {
        self.is_signed().then(|| encode_hex_prefixed(self.hash()))
    }

    // =========================================================================
    // SIGNATURE
    // =========================================================================

    #[inline]
    pub fn is_signed(&self) -> bool {
        !(self.r.is_zero() && self.s.is_zero())
    }

    /// Chain ID encoded in `v`: `None` for 27/28, `(v - 35) / 2` for v ≥ 35.
    /// An unsigned transaction carrying `v = chainId` reports that value.
    pub fn inferred_chain_id(&self) -> Option<NetworkId> {
        let v = u64::try_from(self.v).ok()?;
        if !self.is_signed() {
            return (v != 0).then_some(NetworkId(v));
        }
        match v {
            27 | 28 => None,
            v if v >= EIP155_V_OFFSET => Some(NetworkId((v - EIP155_V_OFFSET) / 2)),
            _ => None,
        }
    }

    /// Chain used to verify the current signature.
    fn signing_chain_id(&self) -> Option<NetworkId> {
        match self.chain_id {
            Some(id) if id.value() != 0 => Some(id),
            _ => self.inferred_chain_id(),
        }
    }

    fn unmarshalled_signature(&self) -> Result<RecoverableSignature, SignerError> {
        if !self.is_signed() {
            return Err(SignerError::RecoveryFailed("transaction is not signed".into()));
        }
        let v = u64::try_from(self.v)
            .map_err(|_| SignerError::RecoveryFailed("v out of range".into()))?;
        let offset = match self.signing_chain_id() {
            Some(id) => id
                .value()
                .checked_mul(2)
                .and_then(|x| x.checked_add(EIP155_V_OFFSET)),
            None => Some(LEGACY_V_OFFSET),
        };
        let recovery_id = offset
            .and_then(|offset| v.checked_sub(offset))
            .filter(|id| *id <= 3)
            .ok_or_else(|| SignerError::RecoveryFailed(format!("invalid v {}", v)))?;

        Ok(RecoverableSignature {
            r: self.r.to_be_bytes::<32>(),
            s: self.s.to_be_bytes::<32>(),
            v: recovery_id as u8,
        })
    }

    /// Uncompressed (65-byte) public key of the signer.
    pub fn recover_public_key(&self) -> WalletResult<Vec<u8>> {
        let signature = self.unmarshalled_signature()?;
        let hash = self.hash_for_signature(self.signing_chain_id());
        Ok(recover_public_key(&hash, &signature)?)
    }

    pub fn sender(&self) -> WalletResult<Address> {
        Address::from_public_key(&self.recover_public_key()?)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // EIP-155 example transaction
    fn eip155_example() -> LbrTransaction {
        LbrTransaction::new(
            U256::from(9u64),
            U256::from(20_000_000_000u64),
            U256::from(21_000u64),
            "0x3535353535353535353535353535353535353535".parse().unwrap(),
            U256::from(1_000_000_000_000_000_000u64),
            Vec::new(),
        )
        .with_chain_id(Some(NetworkId::MAINNET))
    }

    const EIP155_SIGNING_DATA: &str = "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080";
    const EIP155_SIGNING_HASH: &str = "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53";
    const EIP155_SIGNED: &str = "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83";

    fn signed_example() -> LbrTransaction {
        let mut tx = eip155_example();
        tx.v = U256::from(37u64);
        tx.r = U256::from_be_slice(
            &hex::decode("28ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276").unwrap(),
        );
        tx.s = U256::from_be_slice(
            &hex::decode("67cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83").unwrap(),
        );
        tx
    }

    #[test]
    fn test_eip155_signing_payload() {
        let tx = eip155_example();
        assert_eq!(hex::encode(tx.encode_for_signature(tx.chain_id)), EIP155_SIGNING_DATA);
        assert_eq!(hex::encode(tx.hash_for_signature(tx.chain_id)), EIP155_SIGNING_HASH);
    }

    #[test]
    fn test_legacy_payload_has_six_fields() {
        let tx = eip155_example();
        let legacy = tx.encode_for_signature(None);
        let eip155 = tx.encode_for_signature(Some(NetworkId::MAINNET));
        // chainId, 0, 0 → 3 extra bytes (0x01, 0x80, 0x80)
        assert_eq!(eip155.len(), legacy.len() + 3);
        assert_ne!(tx.hash_for_signature(None), tx.hash_for_signature(Some(NetworkId::MAINNET)));
    }

    #[test]
    fn test_signed_encoding_and_sender() {
        let tx = signed_example();
        assert_eq!(hex::encode(tx.encode()), EIP155_SIGNED);
        assert_eq!(tx.inferred_chain_id(), Some(NetworkId::MAINNET));

        // private key 0x4646…46
        let expected = Address::from_private_key(&[0x46u8; 32]).unwrap();
        assert_eq!(tx.sender().unwrap(), expected);

        // Chain ID is recovered from v alone
        let inferred = signed_example().with_chain_id(None);
        assert_eq!(inferred.sender().unwrap(), expected);
        assert_eq!(inferred.txhash(), tx.txhash());
    }

    #[test]
    fn test_unsigned_transaction() {
        let tx = eip155_example();
        assert!(!tx.is_signed());
        assert!(tx.txhash().is_none());
        assert!(tx.sender().is_err());
    }

    #[test]
    fn test_inferred_chain_id() {
        let mut tx = signed_example();
        tx.v = U256::from(27u64);
        assert_eq!(tx.inferred_chain_id(), None);
        tx.v = U256::from(35u64 + 2 * 42);
        assert_eq!(tx.inferred_chain_id(), Some(NetworkId::KOVAN));
    }

    #[test]
    fn test_contract_deployment_encodes_empty_to() {
        let tx = LbrTransaction::new(
            U256::ZERO,
            U256::from(1u64),
            U256::from(100_000u64),
            Address::ContractDeployment,
            U256::ZERO,
            vec![0x60, 0x80],
        );
        let encoded = tx.encode_for_signature(None);
        // [0x80 nonce, 0x01 gasPrice, 0x83 0x01 0x86 0xa0 gasLimit, 0x80 to, ...]
        assert_eq!(&encoded[1..8], &[0x80, 0x01, 0x83, 0x01, 0x86, 0xa0, 0x80]);
    }

    #[test]
    fn test_wrong_v_fails_recovery() {
        let mut tx = signed_example();
        tx.v = U256::from(99u64);
        assert!(tx.sender().is_err());
    }
}
