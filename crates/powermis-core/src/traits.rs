//! Collaborator traits for the document reader
//!
//! Everything platform-specific sits behind one of these traits:
//!
//! - [`DocumentFetcher`]: Remote document store (HTTP in production)
//! - [`ViewerSink`]: The user-facing viewer window
//! - [`RenderSurface`] / [`SurfaceFactory`]: Offscreen surface used for printing
//! - [`PrinterEnumerator`]: Printer list of the host

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::{FetchError, PrinterError, SurfaceError};
use crate::types::{PrintSettings, PrinterInfo, SurfaceEvent, ViewerEvent};

/// Retrieves encrypted containers from the remote document store
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch the full body at `location`
    ///
    /// # Errors
    ///
    /// Returns an error for malformed locations, transport failures and
    /// non-success responses.
    async fn fetch(&self, location: &str) -> Result<Bytes, FetchError>;
}

/// The user-facing viewer
///
/// The reader never waits on the viewer; events are fire-and-forget.
pub trait ViewerSink: Send + Sync {
    fn emit(&self, event: ViewerEvent);
}

/// An offscreen surface able to load a print page and print it
#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// Navigate to `url`
    ///
    /// Completion only means navigation was accepted. Content readiness is
    /// reported separately through [`SurfaceEvent`]s.
    async fn load(&self, url: &str) -> Result<(), SurfaceError>;

    /// Print the loaded page and wait for the completion callback
    async fn print(&self, settings: &PrintSettings) -> Result<(), SurfaceError>;

    /// Close and discard the surface. Closing twice is a no-op.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Creates render surfaces
pub trait SurfaceFactory: Send + Sync {
    /// Create a new surface that reports its signals on `events`
    fn create(&self, events: mpsc::UnboundedSender<SurfaceEvent>) -> Arc<dyn RenderSurface>;
}

/// Lists the print targets known to the host
#[async_trait]
pub trait PrinterEnumerator: Send + Sync {
    async fn printers(&self) -> Result<Vec<PrinterInfo>, PrinterError>;
}
