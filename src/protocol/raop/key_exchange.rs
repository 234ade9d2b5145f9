//! AES key exchange for RAOP audio encryption

use super::super::crypto::{AesCbcPacketCipher, AppleRsaPublicKey, CryptoError, KeyWrapPadding};
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD as BASE64};
use zeroize::Zeroize;

/// AES key size (128 bits)
pub const AES_KEY_SIZE: usize = 16;
/// AES IV size (128 bits)
pub const AES_IV_SIZE: usize = 16;

/// Session keys for RAOP audio encryption
///
/// Generated once per session and never rotated.
pub struct RaopSessionKeys {
    /// AES encryption key
    pub(crate) aes_key: [u8; AES_KEY_SIZE],
    /// AES initialization vector
    pub(crate) aes_iv: [u8; AES_IV_SIZE],
    /// RSA-encrypted AES key (for SDP)
    pub(crate) encrypted_key: Vec<u8>,
}

impl RaopSessionKeys {
    /// Generate new random session keys wrapped with the Apple public key
    ///
    /// # Errors
    ///
    /// Returns `CryptoError` if the key cannot be loaded or encryption fails.
    pub fn generate(padding: KeyWrapPadding) -> Result<Self, CryptoError> {
        let public_key = AppleRsaPublicKey::load()?;
        Self::generate_with_key(&public_key, padding)
    }

    /// Generate new random session keys wrapped with `public_key`
    ///
    /// # Errors
    ///
    /// Returns `CryptoError` if encryption fails.
    pub fn generate_with_key(
        public_key: &AppleRsaPublicKey,
        padding: KeyWrapPadding,
    ) -> Result<Self, CryptoError> {
        use rand::RngCore;

        let mut aes_key = [0u8; AES_KEY_SIZE];
        let mut aes_iv = [0u8; AES_IV_SIZE];

        let mut rng = rand::rngs::OsRng;
        rng.try_fill_bytes(&mut aes_key)
            .map_err(|_| CryptoError::RngError)?;
        rng.try_fill_bytes(&mut aes_iv)
            .map_err(|_| CryptoError::RngError)?;

        let encrypted_key = public_key.encrypt(padding, &aes_key)?;

        Ok(Self {
            aes_key,
            aes_iv,
            encrypted_key,
        })
    }

    /// Get the AES key
    #[must_use]
    pub fn aes_key(&self) -> &[u8; AES_KEY_SIZE] {
        &self.aes_key
    }

    /// Get the AES IV
    #[must_use]
    pub fn aes_iv(&self) -> &[u8; AES_IV_SIZE] {
        &self.aes_iv
    }

    /// Get the wrapped AES key
    #[must_use]
    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }

    /// Wrapped AES key as unpadded Base64 for the `rsaaeskey` SDP attribute
    #[must_use]
    pub fn rsaaeskey(&self) -> String {
        BASE64.encode(&self.encrypted_key)
    }

    /// AES IV as unpadded Base64 for the `aesiv` SDP attribute
    #[must_use]
    pub fn aesiv(&self) -> String {
        BASE64.encode(self.aes_iv)
    }

    /// Build the packet cipher for these keys
    #[must_use]
    pub fn cipher(&self) -> AesCbcPacketCipher {
        AesCbcPacketCipher::new(self.aes_key, self.aes_iv)
    }
}

impl std::fmt::Debug for RaopSessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaopSessionKeys")
            .field("encrypted_key_len", &self.encrypted_key.len())
            .finish_non_exhaustive()
    }
}

impl Drop for RaopSessionKeys {
    fn drop(&mut self) {
        self.aes_key.zeroize();
        self.aes_iv.zeroize();
    }
}
