//! # Powermis Reader
//!
//! Opens partially encrypted PDF documents handed over through a custom URL
//! scheme, and prints them silently.
//!
//! ## Flow
//!
//! 1. [`parse_invocation`] extracts the document location and key from
//!    `powermis://reader?file_url=...&file_key=...`
//! 2. [`DocumentPipeline`] downloads the container, decrypts it (supplied key
//!    first, then the fallback key), and stages the PDF in a temp file
//! 3. The viewer is told to display the staged file
//! 4. [`PrintOrchestrator`] prints it through an offscreen surface on request
//! 5. [`ReaderApp::shutdown`] deletes every staged file
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use powermis_reader::{HttpFetcher, ReaderApp, ReaderConfig};
//!
//! let config = ReaderConfig::default();
//! let fetcher = Arc::new(HttpFetcher::new(config.http_timeout())?);
//! let app = ReaderApp::new(config, fetcher, viewer)
//!     .with_printing(surfaces, printers);
//!
//! app.viewer_ready().await?;
//! app.handle_invocation(&url).await?;
//! // ...
//! app.shutdown();
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod fetch;
pub mod invocation;
pub mod pipeline;
pub mod print;
pub mod printers;

// Re-exports
pub use app::{PrintOutcome, ReaderApp};
pub use config::{Cli, Command, PrintConfig, ReaderConfig};
pub use error::{ReaderError, ReaderResult};
pub use fetch::HttpFetcher;
pub use invocation::{find_invocation_arg, parse_invocation};
pub use pipeline::DocumentPipeline;
pub use print::{PrintOrchestrator, PrintReceipt, PrintState};
pub use printers::{is_virtual_printer, physical_printers};
