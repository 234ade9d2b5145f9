//! RSA key wrapping for the RAOP key exchange

use super::CryptoError;

/// RSA key sizes used in RAOP
pub mod sizes {
    /// RSA modulus size of the Apple key (2048 bits)
    pub const MODULUS_BITS: usize = 2048;
    /// RSA modulus size in bytes
    pub const MODULUS_BYTES: usize = 256;
    /// Maximum plaintext size for PKCS#1 v1.5 encryption
    pub const PKCS1_MAX_PLAINTEXT: usize = MODULUS_BYTES - 11;
    /// Maximum plaintext size for OAEP (with SHA-1)
    pub const OAEP_MAX_PLAINTEXT: usize = MODULUS_BYTES - 2 * 20 - 2;
}

/// Padding scheme used to wrap the session key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyWrapPadding {
    /// PKCS#1 v1.5 encryption padding
    #[default]
    Pkcs1v15,
    /// OAEP with SHA-1, as decrypted by AirPort Express class receivers
    Oaep,
}

/// Public key used to wrap the session AES key
///
/// [`AppleRsaPublicKey::load`] returns the well-known key shipped in iTunes;
/// any other key can be supplied for testing against a receiver whose
/// private key is known.
#[derive(Debug, Clone)]
pub struct AppleRsaPublicKey {
    inner: rsa::RsaPublicKey,
}

impl AppleRsaPublicKey {
    /// The Apple RSA public key modulus (hex)
    const MODULUS_HEX: &'static str = concat!(
        "e7d744f2a2e2788b6c1f55a08eb70544a8fa7945aa8be6c62ce5f51cbdd4dc68",
        "42fe3d1083dd2edec1bfd4252dc02e6f398bdf0e6148ea84855e2e442da6d626",
        "64f674a1f304929ade4f6893ef2df6e711a8c77a0d91c9d980822e50d12922af",
        "ea40ea9f0e14c0f76938c5f3882fc0323dd9fe55155f51bb5921c201629fd733",
        "52d5e2efaabf9ba048d7b813a2b6767f6c3ccf1eb4ce673d037b0d2ea30c5fff",
        "eb06f8d08adde409571a9c689fef10728855dd8cfb9a8bef5c8943ef3b5faa15",
        "dde698beddf3599603eb3e6f61372bb628f6559f599a78bf500687aa7f4976c0",
        "562d412956f8989e18a6355bd81597825e0fc875343ec782117625cdbf98447b"
    );

    /// Standard RSA exponent
    const EXPONENT: u32 = 65537;

    /// Load the Apple public key
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidPublicKey` if the embedded key is rejected.
    pub fn load() -> Result<Self, CryptoError> {
        use rsa::BigUint;

        let n = BigUint::parse_bytes(Self::MODULUS_HEX.as_bytes(), 16)
            .ok_or(CryptoError::InvalidPublicKey)?;
        let e = BigUint::from(Self::EXPONENT);

        let inner = rsa::RsaPublicKey::new(n, e).map_err(|_| CryptoError::InvalidPublicKey)?;

        Ok(Self { inner })
    }

    /// Wrap an arbitrary RSA public key
    #[must_use]
    pub fn from_public_key(inner: rsa::RsaPublicKey) -> Self {
        Self { inner }
    }

    /// Modulus size in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        use rsa::traits::PublicKeyParts;

        self.inner.size()
    }

    /// Encrypt `plaintext` with the given padding
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::EncryptionFailed` if the plaintext is too long
    /// for the key or the RSA operation fails.
    pub fn encrypt(&self, padding: KeyWrapPadding, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        use rand::rngs::OsRng;
        use rsa::{Oaep, Pkcs1v15Encrypt};
        use sha1::Sha1;

        let max = match padding {
            KeyWrapPadding::Pkcs1v15 => self.size().saturating_sub(11),
            KeyWrapPadding::Oaep => self.size().saturating_sub(2 * 20 + 2),
        };
        if plaintext.len() > max {
            return Err(CryptoError::EncryptionFailed(format!(
                "plaintext too long: {} > {max}",
                plaintext.len()
            )));
        }

        let result = match padding {
            KeyWrapPadding::Pkcs1v15 => self.inner.encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext),
            KeyWrapPadding::Oaep => self.inner.encrypt(&mut OsRng, Oaep::new::<Sha1>(), plaintext),
        };

        result.map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    }
}
