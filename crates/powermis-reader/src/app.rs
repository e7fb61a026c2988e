//! Reader application
//!
//! Ties invocation handling, the document pipeline, printing, and temp file
//! cleanup together behind the calls the host shell makes: an invocation
//! arrived, the viewer is ready, the viewer wants to print, the process is
//! quitting.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use powermis_core::{
    DocumentFetcher, PrintJobRequest, PrinterEnumerator, PrinterInfo, SurfaceFactory, ViewerEvent,
    ViewerSink,
};
use powermis_crypto::KeyResolver;
use powermis_storage::{DrainReport, StagedFile, StagingArea, TempArtifactRegistry};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ReaderConfig;
use crate::error::{ReaderError, ReaderResult};
use crate::invocation::{find_invocation_arg, parse_invocation};
use crate::pipeline::DocumentPipeline;
use crate::print::{PrintOrchestrator, PrintState};

/// Result of a print request as reported back to the viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintOutcome {
    pub success: bool,
    /// Short user-facing text
    pub message: String,
}

impl PrintOutcome {
    fn succeeded() -> Self {
        Self {
            success: true,
            message: "print succeeded".to_string(),
        }
    }

    fn failed(error: &ReaderError) -> Self {
        Self {
            success: false,
            message: error.user_message(),
        }
    }
}

/// The reader process
pub struct ReaderApp {
    config: ReaderConfig,
    pipeline: DocumentPipeline,
    viewer: Arc<dyn ViewerSink>,
    registry: Arc<TempArtifactRegistry>,
    printing: Option<PrintOrchestrator>,
    viewer_ready: AtomicBool,
    /// Invocation received before the viewer was ready; latest wins
    pending: Mutex<Option<String>>,
    shut_down: AtomicBool,
}

impl ReaderApp {
    /// Reader without print support
    pub fn new(
        config: ReaderConfig,
        fetcher: Arc<dyn DocumentFetcher>,
        viewer: Arc<dyn ViewerSink>,
    ) -> Self {
        let registry = Arc::new(TempArtifactRegistry::new());
        let staging = StagingArea::new(config.staging(), registry.clone());
        Self {
            pipeline: DocumentPipeline::new(fetcher, staging),
            config,
            viewer,
            registry,
            printing: None,
            viewer_ready: AtomicBool::new(false),
            pending: Mutex::new(None),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Enable printing through `surfaces` onto the printers of `printers`
    pub fn with_printing(
        mut self,
        surfaces: Arc<dyn SurfaceFactory>,
        printers: Arc<dyn PrinterEnumerator>,
    ) -> Self {
        self.printing = Some(PrintOrchestrator::new(
            surfaces,
            printers,
            self.config.print.clone(),
        ));
        self
    }

    pub fn with_key_resolver(mut self, resolver: KeyResolver) -> Self {
        self.pipeline = self.pipeline.with_key_resolver(resolver);
        self
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<TempArtifactRegistry> {
        &self.registry
    }

    /// Handle an invocation URL.
    ///
    /// Before [`viewer_ready`](Self::viewer_ready) the URL is parked and
    /// `Ok(None)` is returned. Otherwise the viewer is told what happened and
    /// the staged document is returned.
    pub async fn handle_invocation(&self, raw: &str) -> ReaderResult<Option<StagedFile>> {
        {
            // Same lock as `viewer_ready`
            let mut pending = self.pending.lock();
            if !self.viewer_ready.load(Ordering::SeqCst) {
                debug!("Viewer not ready, deferring invocation");
                *pending = Some(raw.to_string());
                return Ok(None);
            }
        }
        self.open(raw).await.map(Some)
    }

    /// Handle the argument list of a (second) process launch.
    ///
    /// Launches without an invocation argument are ignored.
    pub async fn handle_args<I, S>(&self, args: I) -> ReaderResult<Option<StagedFile>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match find_invocation_arg(args, &self.config.scheme) {
            Some(raw) => self.handle_invocation(&raw).await,
            None => Ok(None),
        }
    }

    /// Mark the viewer ready and process the parked invocation, if any
    pub async fn viewer_ready(&self) -> ReaderResult<Option<StagedFile>> {
        let pending = {
            let mut pending = self.pending.lock();
            self.viewer_ready.store(true, Ordering::SeqCst);
            pending.take()
        };
        match pending {
            Some(raw) => {
                info!("Processing deferred invocation");
                self.open(&raw).await.map(Some)
            }
            None => Ok(None),
        }
    }

    async fn open(&self, raw: &str) -> ReaderResult<StagedFile> {
        if self.shut_down.load(Ordering::SeqCst) {
            info!("Invocation after shutdown ignored");
            return Err(self.notify(ReaderError::ShuttingDown));
        }
        let Some(params) = parse_invocation(raw) else {
            info!("Invocation names no document");
            return Err(self.notify(ReaderError::NoDocument));
        };

        self.viewer.emit(ViewerEvent::Loading);
        let staged = self.pipeline.open(&params).await.map_err(|e| self.notify(e))?;

        // Shutdown may have drained before this document was registered
        if self.shut_down.load(Ordering::SeqCst) {
            self.registry.discard(&staged.path);
            info!(path = %staged.path.display(), "Discarded document staged during shutdown");
            return Err(self.notify(ReaderError::ShuttingDown));
        }

        self.viewer.emit(ViewerEvent::Load(staged.uri.clone()));
        Ok(staged)
    }

    fn notify(&self, error: ReaderError) -> ReaderError {
        self.viewer.emit(ViewerEvent::Notice(error.user_message()));
        error
    }

    /// Open `raw`, keep the document until `signal` resolves, then shut down.
    ///
    /// Returns the output of `signal`, or `None` when the invocation named no
    /// document (the viewer has already been told). Shutdown runs on every
    /// path.
    pub async fn serve_until<F>(&self, raw: &str, signal: F) -> ReaderResult<Option<F::Output>>
    where
        F: Future,
    {
        let result = match self.handle_invocation(raw).await {
            Ok(_) => Ok(Some(signal.await)),
            Err(ReaderError::NoDocument) => Ok(None),
            Err(e) => Err(e),
        };
        self.shutdown();
        result
    }

    /// Silently print a staged document
    pub async fn print(&self, request: &PrintJobRequest) -> PrintOutcome {
        let Some(printing) = &self.printing else {
            return PrintOutcome::failed(&ReaderError::NoPrinterAvailable);
        };
        match printing.run(request).await {
            Ok(_) => PrintOutcome::succeeded(),
            Err(e) => PrintOutcome::failed(&e),
        }
    }

    /// Printers the viewer may offer
    pub async fn available_printers(&self) -> Vec<PrinterInfo> {
        match &self.printing {
            Some(printing) => printing.available_printers().await,
            None => Vec::new(),
        }
    }

    pub fn print_state(&self) -> Option<PrintState> {
        self.printing.as_ref().map(PrintOrchestrator::state)
    }

    /// Close any print surface and delete every staged document.
    ///
    /// Only the first call does anything; later calls return `None`.
    pub fn shutdown(&self) -> Option<DrainReport> {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return None;
        }
        if let Some(printing) = &self.printing {
            printing.close_active();
        }
        let report = self.registry.drain_all();
        info!(removed = report.removed, "Reader shut down");
        Some(report)
    }
}
