//! Mock collaborators for testing
//!
//! In-memory stand-ins for the platform: a scripted render surface, a fixed
//! printer list, a recording viewer, and a map-backed document fetcher.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use powermis_core::{MockSurfaceFactory, SurfaceBehavior};
//!
//! // Every surface created by this factory reports "content ready" on load
//! let factory = MockSurfaceFactory::new(SurfaceBehavior::SignalReady);
//! // ... run a print job ...
//! assert!(factory.surfaces().iter().all(|s| s.is_closed()));
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::{FetchError, PrinterError, SurfaceError};
use crate::traits::{DocumentFetcher, PrinterEnumerator, RenderSurface, SurfaceFactory, ViewerSink};
use crate::types::{PrintSettings, PrinterInfo, SurfaceEvent, ViewerEvent};

/// What a mock surface does when asked to load a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceBehavior {
    /// Report `ContentReady` as soon as the page loads
    SignalReady,
    /// Report `ContentReady` after a delay
    SignalReadyAfter(Duration),
    /// Report `ContentError` with the given message
    SignalContentError(String),
    /// Report a host-level page load failure
    FailPageLoad { code: i32, description: String },
    /// Reject the navigation call itself
    RejectNavigation(String),
    /// Load without ever signalling
    Silent,
}

/// A scripted render surface
pub struct MockSurface {
    id: usize,
    behavior: SurfaceBehavior,
    print_failure: Option<String>,
    /// Dropped on close so listeners observe the surface going away
    events: Mutex<Option<mpsc::UnboundedSender<SurfaceEvent>>>,
    closed: AtomicBool,
    close_calls: AtomicUsize,
    loaded: Mutex<Vec<String>>,
    printed: Mutex<Vec<PrintSettings>>,
}

impl MockSurface {
    fn new(
        id: usize,
        behavior: SurfaceBehavior,
        print_failure: Option<String>,
        events: mpsc::UnboundedSender<SurfaceEvent>,
    ) -> Self {
        Self {
            id,
            behavior,
            print_failure,
            events: Mutex::new(Some(events)),
            closed: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
            loaded: Mutex::new(Vec::new()),
            printed: Mutex::new(Vec::new()),
        }
    }

    /// Creation order within the factory, starting at 0
    pub fn id(&self) -> usize {
        self.id
    }

    /// URLs this surface was asked to load
    pub fn loaded_urls(&self) -> Vec<String> {
        self.loaded.lock().clone()
    }

    /// Settings of every print command issued on this surface
    pub fn print_calls(&self) -> Vec<PrintSettings> {
        self.printed.lock().clone()
    }

    /// Number of times `close` was called
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    fn send(&self, event: SurfaceEvent) {
        if let Some(tx) = self.events.lock().as_ref() {
            let _ = tx.send(event);
        }
    }
}

#[async_trait]
impl RenderSurface for MockSurface {
    async fn load(&self, url: &str) -> Result<(), SurfaceError> {
        if self.is_closed() {
            return Err(SurfaceError::Closed);
        }
        self.loaded.lock().push(url.to_string());

        match &self.behavior {
            SurfaceBehavior::SignalReady => self.send(SurfaceEvent::ContentReady),
            SurfaceBehavior::SignalReadyAfter(delay) => {
                if let Some(tx) = self.events.lock().clone() {
                    let delay = *delay;
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(SurfaceEvent::ContentReady);
                    });
                }
            }
            SurfaceBehavior::SignalContentError(msg) => {
                self.send(SurfaceEvent::ContentError(msg.clone()))
            }
            SurfaceBehavior::FailPageLoad { code, description } => {
                self.send(SurfaceEvent::LoadFailed {
                    code: *code,
                    description: description.clone(),
                })
            }
            SurfaceBehavior::RejectNavigation(msg) => {
                return Err(SurfaceError::Navigation(msg.clone()));
            }
            SurfaceBehavior::Silent => {}
        }
        Ok(())
    }

    async fn print(&self, settings: &PrintSettings) -> Result<(), SurfaceError> {
        if self.is_closed() {
            return Err(SurfaceError::Closed);
        }
        self.printed.lock().push(settings.clone());
        match &self.print_failure {
            Some(reason) => Err(SurfaceError::PrintFailed(reason.clone())),
            None => Ok(()),
        }
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        self.events.lock().take();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Factory handing out [`MockSurface`]s and remembering every one of them
pub struct MockSurfaceFactory {
    behavior: Mutex<SurfaceBehavior>,
    print_failure: Mutex<Option<String>>,
    surfaces: Mutex<Vec<Arc<MockSurface>>>,
}

impl MockSurfaceFactory {
    pub fn new(behavior: SurfaceBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            print_failure: Mutex::new(None),
            surfaces: Mutex::new(Vec::new()),
        }
    }

    /// Make print commands on subsequently created surfaces fail
    pub fn with_print_failure(self, reason: impl Into<String>) -> Self {
        *self.print_failure.lock() = Some(reason.into());
        self
    }

    /// Change the behavior of surfaces created from now on
    pub fn set_behavior(&self, behavior: SurfaceBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// Every surface created so far, in creation order
    pub fn surfaces(&self) -> Vec<Arc<MockSurface>> {
        self.surfaces.lock().clone()
    }

    /// Number of surfaces not yet closed
    pub fn open_count(&self) -> usize {
        self.surfaces.lock().iter().filter(|s| !s.is_closed()).count()
    }
}

impl SurfaceFactory for MockSurfaceFactory {
    fn create(&self, events: mpsc::UnboundedSender<SurfaceEvent>) -> Arc<dyn RenderSurface> {
        let mut surfaces = self.surfaces.lock();
        let surface = Arc::new(MockSurface::new(
            surfaces.len(),
            self.behavior.lock().clone(),
            self.print_failure.lock().clone(),
            events,
        ));
        surfaces.push(surface.clone());
        surface
    }
}

/// Fixed printer list
#[derive(Debug, Default)]
pub struct MockPrinters {
    printers: Vec<PrinterInfo>,
    fail: bool,
}

impl MockPrinters {
    pub fn new(printers: Vec<PrinterInfo>) -> Self {
        Self {
            printers,
            fail: false,
        }
    }

    /// A host with a single printer called `name`
    pub fn single(name: &str) -> Self {
        Self::new(vec![PrinterInfo::new(name)])
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A host whose enumeration call fails
    pub fn failing() -> Self {
        Self {
            printers: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl PrinterEnumerator for MockPrinters {
    async fn printers(&self) -> Result<Vec<PrinterInfo>, PrinterError> {
        if self.fail {
            return Err(PrinterError::Enumeration("mock enumeration failure".into()));
        }
        Ok(self.printers.clone())
    }
}

/// Viewer that records every event it receives
#[derive(Debug, Default)]
pub struct RecordingViewer {
    events: Mutex<Vec<ViewerEvent>>,
}

impl RecordingViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ViewerEvent> {
        self.events.lock().clone()
    }

    pub fn last(&self) -> Option<ViewerEvent> {
        self.events.lock().last().cloned()
    }
}

impl ViewerSink for RecordingViewer {
    fn emit(&self, event: ViewerEvent) {
        self.events.lock().push(event);
    }
}

/// Map-backed document store; unknown locations answer 404
#[derive(Debug, Default)]
pub struct MockFetcher {
    documents: Mutex<HashMap<String, Bytes>>,
    requests: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, location: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.documents.lock().insert(location.into(), body.into());
        self
    }

    /// Number of fetch calls made
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for MockFetcher {
    async fn fetch(&self, location: &str) -> Result<Bytes, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.documents
            .lock()
            .get(location)
            .cloned()
            .ok_or(FetchError::Status(404))
    }
}
