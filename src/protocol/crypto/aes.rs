use super::{CryptoError, lengths};
use aes::Aes128;
use cbc::cipher::{BlockEncryptMut, KeyIvInit, block_padding::NoPadding};
use zeroize::Zeroize;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;

/// AES-128-CBC cipher for RAOP audio payloads
///
/// Every call starts a fresh CBC chain from the session IV; the chain is not
/// carried across packets. Only whole 16-byte blocks are encrypted, a
/// trailing partial block is sent in the clear. Receivers decrypt each
/// packet the same way, so both quirks are part of the wire format.
///
/// Reusing one IV for every packet leaks equality of leading blocks between
/// packets. That weakness belongs to the protocol and cannot be fixed here
/// without breaking interoperability.
pub struct AesCbcPacketCipher {
    key: [u8; lengths::AES_128_KEY],
    iv: [u8; lengths::AES_BLOCK],
}

impl AesCbcPacketCipher {
    /// Create cipher with 16-byte key and 16-byte IV
    #[must_use]
    pub fn new(key: [u8; lengths::AES_128_KEY], iv: [u8; lengths::AES_BLOCK]) -> Self {
        Self { key, iv }
    }

    /// Create cipher from slices
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` if either slice is not 16 bytes.
    pub fn from_slices(key: &[u8], iv: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; lengths::AES_128_KEY] =
            key.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: lengths::AES_128_KEY,
                actual: key.len(),
            })?;
        let iv: [u8; lengths::AES_BLOCK] =
            iv.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: lengths::AES_BLOCK,
                actual: iv.len(),
            })?;
        Ok(Self::new(key, iv))
    }

    /// Number of leading bytes of a `len`-byte payload that get encrypted
    #[must_use]
    pub fn encrypted_len(len: usize) -> usize {
        len / lengths::AES_BLOCK * lengths::AES_BLOCK
    }

    /// Encrypt the block-aligned prefix of `payload` in place
    pub fn encrypt_in_place(&self, payload: &mut [u8]) {
        let aligned = Self::encrypted_len(payload.len());
        if aligned == 0 {
            return;
        }

        let encryptor = Aes128CbcEnc::new(&self.key.into(), &self.iv.into());
        // aligned is a multiple of the block size, so unpadded encryption cannot fail
        let _ = encryptor.encrypt_padded_mut::<NoPadding>(&mut payload[..aligned], aligned);
    }

    /// Encrypt, returning a new buffer
    #[must_use]
    pub fn encrypt(&self, payload: &[u8]) -> Vec<u8> {
        let mut output = payload.to_vec();
        self.encrypt_in_place(&mut output);
        output
    }

    /// Get the session IV
    #[must_use]
    pub fn iv(&self) -> &[u8; lengths::AES_BLOCK] {
        &self.iv
    }
}

impl Drop for AesCbcPacketCipher {
    fn drop(&mut self) {
        self.key.zeroize();
        self.iv.zeroize();
    }
}
