use thiserror::Error;

/// Key wrapping and cipher setup errors
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key or IV slice of the wrong size
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Required length in bytes
        expected: usize,
        /// Length supplied
        actual: usize,
    },

    /// RSA encryption of the session key failed
    #[error("key wrap failed: {0}")]
    EncryptionFailed(String),

    /// The embedded or supplied public key is unusable
    #[error("invalid public key")]
    InvalidPublicKey,

    /// The OS random source failed
    #[error("RNG error")]
    RngError,
}
