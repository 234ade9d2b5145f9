//! Cryptographic primitives for the RAOP key exchange and audio encryption

mod aes;
mod error;
mod rsa;

pub use self::aes::AesCbcPacketCipher;
pub use self::error::CryptoError;
pub use self::rsa::{AppleRsaPublicKey, KeyWrapPadding, sizes as rsa_sizes};

/// Length of various cryptographic values
pub mod lengths {
    /// AES-128 key length
    pub const AES_128_KEY: usize = 16;
    /// AES block (and CBC IV) length
    pub const AES_BLOCK: usize = 16;
}
