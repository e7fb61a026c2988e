//! Reader configuration and command line

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use powermis_logging::LogConfig;
use powermis_storage::StagingConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ReaderError, ReaderResult};

/// Configuration for a [`ReaderApp`](crate::ReaderApp)
///
/// Loaded from TOML; every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// URL scheme the reader is registered for
    pub scheme: String,
    /// Directory decrypted documents are staged in; the OS temp dir if unset
    pub temp_dir: Option<PathBuf>,
    /// File name prefix for staged documents
    pub file_prefix: String,
    /// Whole-request timeout for document downloads, in seconds
    pub http_timeout_secs: u64,
    /// Print job settings
    pub print: PrintConfig,
    /// Logging settings
    pub logging: LogConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            scheme: "powermis".to_string(),
            temp_dir: None,
            file_prefix: "powermis".to_string(),
            http_timeout_secs: 60,
            print: PrintConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl ReaderConfig {
    /// Read a TOML config file
    pub fn load(path: impl AsRef<Path>) -> ReaderResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ReaderError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> ReaderResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Stage documents in `dir` instead of the OS temp dir
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_print(mut self, print: PrintConfig) -> Self {
        self.print = print;
        self
    }

    pub fn with_logging(mut self, logging: LogConfig) -> Self {
        self.logging = logging;
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Staging settings derived from this config
    pub fn staging(&self) -> StagingConfig {
        let base = match &self.temp_dir {
            Some(dir) => StagingConfig::with_dir(dir),
            None => StagingConfig::default(),
        };
        base.with_prefix(&self.file_prefix)
    }

    fn validate(&self) -> ReaderResult<()> {
        if self.scheme.is_empty() || !self.scheme.chars().all(is_scheme_char) {
            return Err(ReaderError::Config(format!("invalid scheme {:?}", self.scheme)));
        }
        if self.file_prefix.is_empty() {
            return Err(ReaderError::Config("file_prefix must not be empty".into()));
        }
        if self.print.content_timeout_ms == 0 {
            return Err(ReaderError::Config("print.content_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

fn is_scheme_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
}

/// Print job settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    /// Page that renders a document for printing; receives `?file=<uri>`
    pub page_url: String,
    /// How long the print page may take to report readiness, in milliseconds
    pub content_timeout_ms: u64,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            page_url: "app://powermis/print.html".to_string(),
            content_timeout_ms: 10_000,
        }
    }
}

impl PrintConfig {
    pub fn content_timeout(&self) -> Duration {
        Duration::from_millis(self.content_timeout_ms)
    }

    pub fn with_content_timeout(mut self, timeout: Duration) -> Self {
        self.content_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = url.into();
        self
    }
}

#[derive(Parser)]
#[command(name = "powermis", about = "Reader for partially encrypted PDF documents")]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Handle a scheme invocation and keep the document until Ctrl-C
    Open {
        /// Invocation URL, e.g. powermis://reader?file_url=...&file_key=...
        url: String,
    },
    /// Decrypt a local container file
    Decrypt {
        #[arg(long)]
        input: PathBuf,
        /// Per-document key; the fallback key is tried if it is rejected
        #[arg(long)]
        key: String,
        #[arg(long)]
        output: PathBuf,
    },
    /// Show the layout of a container without decrypting it
    Inspect {
        file: PathBuf,
    },
    /// Build a container from a plain document
    Seal {
        #[arg(long)]
        input: PathBuf,
        /// Number of leading bytes to encrypt
        #[arg(long)]
        prefix_len: usize,
        #[arg(long)]
        key: String,
        #[arg(long)]
        output: PathBuf,
    },
}
