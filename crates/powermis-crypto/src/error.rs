//! Error types for powermis-crypto

use thiserror::Error;

/// Errors that can occur while opening or sealing a container
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The length-prefixed envelope itself is corrupt; no key can fix it
    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    /// A single decryption attempt failed (wrong key size or bad padding)
    #[error("Decryption error: {0}")]
    DecryptionError(String),

    /// Both the supplied key and the fallback key were rejected
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
}

impl CryptoError {
    /// Whether retrying with a different key could succeed
    pub fn is_key_related(&self) -> bool {
        matches!(self, CryptoError::DecryptionError(_))
    }
}

/// Result type for crypto operations
pub type CryptoResult<T> = Result<T, CryptoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_error_display() {
        let err = CryptoError::MalformedContainer("declared 10 bytes".to_string());
        assert!(format!("{}", err).contains("Malformed container"));
        assert!(format!("{}", err).contains("declared 10 bytes"));

        let err = CryptoError::DecryptionError("bad padding".to_string());
        assert!(format!("{}", err).contains("Decryption error"));

        let err = CryptoError::DecryptionFailed("both keys".to_string());
        assert!(format!("{}", err).contains("Decryption failed"));

        let err = CryptoError::EncryptionFailed("key length".to_string());
        assert!(format!("{}", err).contains("Encryption failed"));
    }

    #[test]
    fn test_only_decryption_errors_are_key_related() {
        assert!(CryptoError::DecryptionError("x".into()).is_key_related());
        assert!(!CryptoError::MalformedContainer("x".into()).is_key_related());
        assert!(!CryptoError::DecryptionFailed("x".into()).is_key_related());
    }
}
