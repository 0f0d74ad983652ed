// wallet-core/src/keystore/plain.rs
//
// Unencrypted in-memory keystore. Password bị bỏ qua.

use crate::chains::lbr::address::Address;
use crate::codec::decode_hex_array;
use crate::crypto::secp256k1::verify_private_key;
use crate::error::{KeystoreError, WalletResult};
use crate::keystore::AbstractKeystore;
use std::fmt;
use zeroize::Zeroizing;

#[derive(Clone)]
pub struct PlainKeystore {
    private_key: Zeroizing<[u8; 32]>,
    address: Address,
}

// Custom Debug - KHÔNG BAO GIỜ hiển thị private key
impl fmt::Debug for PlainKeystore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainKeystore")
            .field("address", &self.address)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl PlainKeystore {
    /// # Errors
    /// `InvalidPrivateKey` unless `private_key` is 32 bytes in `[1, n)`.
    pub fn new(private_key: &[u8]) -> WalletResult<Self> {
        verify_private_key(private_key)?;
        let address = Address::from_private_key(private_key)?;
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(private_key);
        Ok(Self {
            private_key: key,
            address,
        })
    }

    /// Hex key with or without `0x`.
    pub fn from_hex(private_key: &str) -> WalletResult<Self> {
        let key = Zeroizing::new(decode_hex_array::<32>(private_key)?);
        Self::new(&key[..])
    }

    #[inline]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

impl AbstractKeystore for PlainKeystore {
    fn addresses(&self) -> Vec<Address> {
        vec![self.address]
    }

    fn is_hd_keystore(&self) -> bool {
        false
    }

    fn unsafe_get_private_key(&self, _password: &str, address: &Address) -> WalletResult<Zeroizing<[u8; 32]>> {
        if *address != self.address {
            return Err(KeystoreError::AccountNotFound(address.to_string()).into());
        }
        Ok(self.private_key.clone())
    }
}
