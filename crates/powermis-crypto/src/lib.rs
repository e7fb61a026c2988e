//! # Powermis Crypto
//!
//! Decryption of partially encrypted document containers.
//!
//! ## Features
//!
//! - Length-prefixed container parsing ([`ContainerLayout`])
//! - AES-128-ECB/PKCS#7 decryption of the leading region, tail copied verbatim
//! - Two-tier key resolution: supplied key first, then [`FALLBACK_KEY`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use powermis_crypto::{decrypt_with_fallback, CryptoError};
//!
//! match decrypt_with_fallback(&body, &file_key) {
//!     Ok(document) => std::fs::write("out.pdf", document)?,
//!     Err(CryptoError::MalformedContainer(reason)) => eprintln!("corrupt: {}", reason),
//!     Err(e) => eprintln!("cannot open document: {}", e),
//! }
//! ```

pub mod container;
pub mod error;
pub mod fallback;

// Re-exports
pub use container::{
    BLOCK_SIZE, ContainerLayout, KEY_SIZE, LENGTH_PREFIX_SIZE, decrypt_container, seal_container,
};
pub use error::{CryptoError, CryptoResult};
pub use fallback::{FALLBACK_KEY, KeyResolver, KeySource, decrypt_with_fallback};
