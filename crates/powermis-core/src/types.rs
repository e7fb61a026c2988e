//! Shared data types for the document reader

use std::fmt;

use serde::{Deserialize, Serialize};

/// Document location and decryption key carried by a scheme invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationParams {
    /// Remote location of the encrypted container
    pub file_url: String,
    /// Per-request decryption key
    pub file_key: String,
}

impl InvocationParams {
    pub fn new(file_url: impl Into<String>, file_key: impl Into<String>) -> Self {
        Self {
            file_url: file_url.into(),
            file_key: file_key.into(),
        }
    }
}

/// Which paper edge a duplex job binds on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplexBinding {
    #[default]
    LongEdge,
    ShortEdge,
}

/// A print request as issued by the viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintJobRequest {
    /// Local file reference (URI) of the staged document
    pub file: String,
    /// Target printer; the platform default when absent
    #[serde(default)]
    pub printer: Option<String>,
    /// Number of copies
    #[serde(default = "default_copies")]
    pub copies: u32,
    /// Print on both sides
    #[serde(default)]
    pub duplex: bool,
    /// Binding edge used when `duplex` is set
    #[serde(default)]
    pub binding: DuplexBinding,
}

fn default_copies() -> u32 {
    1
}

impl PrintJobRequest {
    /// Single-sided, single copy on the default printer
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            printer: None,
            copies: default_copies(),
            duplex: false,
            binding: DuplexBinding::default(),
        }
    }

    pub fn with_printer(mut self, printer: impl Into<String>) -> Self {
        self.printer = Some(printer.into());
        self
    }

    pub fn with_copies(mut self, copies: u32) -> Self {
        self.copies = copies;
        self
    }

    pub fn with_duplex(mut self, binding: DuplexBinding) -> Self {
        self.duplex = true;
        self.binding = binding;
        self
    }

    /// Resolve the request into the settings handed to the print command
    pub fn settings(&self) -> PrintSettings {
        let duplex = match (self.duplex, self.binding) {
            (false, _) => DuplexMode::Simplex,
            (true, DuplexBinding::LongEdge) => DuplexMode::LongEdge,
            (true, DuplexBinding::ShortEdge) => DuplexMode::ShortEdge,
        };

        PrintSettings {
            silent: true,
            print_background: true,
            device_name: self.printer.clone().unwrap_or_default(),
            copies: self.copies.max(1),
            duplex,
            margins: MarginType::PrintableArea,
        }
    }
}

/// Duplex mode understood by the print command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DuplexMode {
    Simplex,
    LongEdge,
    ShortEdge,
}

/// Margin handling for the print command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarginType {
    Default,
    None,
    PrintableArea,
}

/// Fully resolved print command configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintSettings {
    /// Suppress the platform print dialog
    pub silent: bool,
    pub print_background: bool,
    /// Empty string selects the platform default printer
    pub device_name: String,
    pub copies: u32,
    pub duplex: DuplexMode,
    pub margins: MarginType,
}

/// A print target as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterInfo {
    /// Name used to select the device
    pub name: String,
    /// Human-readable name
    pub display_name: String,
    /// Platform status code
    #[serde(default)]
    pub status: i32,
}

impl PrinterInfo {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            status: 0,
        }
    }
}

/// Signals raised by a render surface while a print page loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The embedded viewer finished rendering the document
    ContentReady,
    /// The embedded viewer could not render the document
    ContentError(String),
    /// The surface host failed to load the page
    LoadFailed { code: i32, description: String },
}

/// Instructions sent to the user-facing viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ViewerEvent {
    /// A document request was accepted and is being prepared
    Loading,
    /// Display the document at this local URI
    Load(String),
    /// Show a short informational message instead of a document
    Notice(String),
}

impl fmt::Display for ViewerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerEvent::Loading => write!(f, "loading"),
            ViewerEvent::Load(uri) => write!(f, "load {}", uri),
            ViewerEvent::Notice(msg) => write!(f, "notice: {}", msg),
        }
    }
}
