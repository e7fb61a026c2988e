//! Partially encrypted document containers.
//!
//! A container encrypts only the leading region of a document; the rest is
//! stored verbatim. The byte layout is:
//!
//! ```text
//! +----------------+---------------------------+-----------------+
//! | N (u32, BE)    | N bytes ciphertext        | tail (verbatim) |
//! +----------------+---------------------------+-----------------+
//! ```
//!
//! The ciphertext is AES-128 in ECB mode with PKCS#7 padding. ECB needs no
//! IV, so the container carries none.
//!
//! ## Known limitation
//!
//! ECB carries no integrity check. A wrong key usually fails padding
//! validation, but it can occasionally produce bytes that happen to be
//! validly padded; the result is then a corrupted document reported as a
//! successful decryption.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use powermis_crypto::{decrypt_container, seal_container};
//!
//! let container = seal_container(b"%PDF-1.7 header", b" rest of file", b"0123456789abcdef")?;
//! let document = decrypt_container(&container, b"0123456789abcdef")?;
//! assert_eq!(document, b"%PDF-1.7 header rest of file");
//! ```

use aes::Aes128;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit};

use crate::error::{CryptoError, CryptoResult};

/// Size of the big-endian length prefix
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// AES-128 key size in bytes
pub const KEY_SIZE: usize = 16;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Parsed view of a container, borrowed from the raw bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerLayout<'a> {
    /// Encrypted leading region
    pub ciphertext: &'a [u8],
    /// Bytes stored verbatim after the ciphertext
    pub tail: &'a [u8],
}

impl<'a> ContainerLayout<'a> {
    /// Split a container into its ciphertext and tail regions.
    ///
    /// No cipher work happens here.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedContainer`] if the buffer is shorter
    /// than the length prefix or the declared length exceeds the bytes that
    /// follow it.
    pub fn parse(data: &'a [u8]) -> CryptoResult<Self> {
        let Some((prefix, body)) = data.split_first_chunk::<LENGTH_PREFIX_SIZE>() else {
            return Err(CryptoError::MalformedContainer(format!(
                "container is {} bytes, shorter than the {}-byte length prefix",
                data.len(),
                LENGTH_PREFIX_SIZE
            )));
        };

        let declared = u32::from_be_bytes(*prefix) as usize;
        if declared > body.len() {
            return Err(CryptoError::MalformedContainer(format!(
                "declared ciphertext length {} exceeds the {} bytes available",
                declared,
                body.len()
            )));
        }

        let (ciphertext, tail) = body.split_at(declared);
        Ok(Self { ciphertext, tail })
    }

    /// Declared ciphertext length
    pub fn ciphertext_len(&self) -> usize {
        self.ciphertext.len()
    }

    /// Length of the verbatim tail
    pub fn tail_len(&self) -> usize {
        self.tail.len()
    }

    /// Total size of the container this layout was parsed from
    pub fn total_len(&self) -> usize {
        LENGTH_PREFIX_SIZE + self.ciphertext.len() + self.tail.len()
    }
}

fn cipher_for(key: &[u8]) -> Result<Aes128, String> {
    Aes128::new_from_slice(key).map_err(|_| {
        format!(
            "key must be {} bytes for AES-128, got {}",
            KEY_SIZE,
            key.len()
        )
    })
}

/// Decrypt a container and return the reconstructed document.
///
/// The result is the decrypted leading region followed by the tail bytes,
/// which are copied untouched.
///
/// # Errors
///
/// - [`CryptoError::MalformedContainer`] if the envelope is corrupt
/// - [`CryptoError::DecryptionError`] if the key is not 16 bytes, the
///   ciphertext is not a whole number of blocks, or padding is invalid
pub fn decrypt_container(data: &[u8], key: &[u8]) -> CryptoResult<Vec<u8>> {
    let layout = ContainerLayout::parse(data)?;
    let cipher = cipher_for(key).map_err(CryptoError::DecryptionError)?;

    let mut document = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(layout.ciphertext)
        .map_err(|_| {
            CryptoError::DecryptionError(format!(
                "padding check failed on {} ciphertext bytes",
                layout.ciphertext_len()
            ))
        })?;

    document.reserve_exact(layout.tail_len());
    document.extend_from_slice(layout.tail);
    Ok(document)
}

/// Build a container that encrypts `prefix` and stores `tail` verbatim.
///
/// Inverse of [`decrypt_container`]; used to produce fixtures and by the
/// `seal` command.
pub fn seal_container(prefix: &[u8], tail: &[u8], key: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = cipher_for(key).map_err(CryptoError::EncryptionFailed)?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(prefix);

    let declared = u32::try_from(ciphertext.len()).map_err(|_| {
        CryptoError::EncryptionFailed(format!(
            "ciphertext of {} bytes does not fit the length prefix",
            ciphertext.len()
        ))
    })?;

    let mut container = Vec::with_capacity(LENGTH_PREFIX_SIZE + ciphertext.len() + tail.len());
    container.extend_from_slice(&declared.to_be_bytes());
    container.extend_from_slice(&ciphertext);
    container.extend_from_slice(tail);
    Ok(container)
}
