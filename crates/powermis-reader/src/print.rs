//! Silent print orchestration
//!
//! A print job loads the staged document into an offscreen surface, waits
//! for the surface to report that the content rendered, prints it, and
//! closes the surface. Only one job is in flight: starting a job closes any
//! surface left over from the previous one.
//!
//! ```text
//! Idle -> SurfaceLoading -> AwaitingContentSignal -> Printing -> Closed
//!               \__________________\_____________________\______> Failed
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use powermis_core::{
    DuplexMode, PrintJobRequest, PrinterEnumerator, PrinterInfo, RenderSurface, SurfaceError,
    SurfaceEvent, SurfaceFactory,
};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::PrintConfig;
use crate::error::{ReaderError, ReaderResult};
use crate::printers::physical_printers;

/// Lifecycle of the current print job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintState {
    Idle,
    SurfaceLoading,
    AwaitingContentSignal,
    Printing,
    Closed,
    Failed,
}

/// Confirmation of a finished print job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintReceipt {
    /// Device the job went to; empty for the platform default
    pub printer: String,
    pub copies: u32,
    pub duplex: DuplexMode,
}

/// State of the most recently started job
#[derive(Debug)]
struct JobState {
    job: u64,
    state: PrintState,
}

/// First thing that happened while waiting for the print page
#[derive(Debug)]
enum ReadyOutcome {
    Ready,
    ContentError(String),
    PageLoadFailed { code: i32, description: String },
    NavigationRejected(SurfaceError),
    SurfaceGone,
    TimedOut,
}

/// Drives print jobs through a [`SurfaceFactory`]
pub struct PrintOrchestrator {
    factory: Arc<dyn SurfaceFactory>,
    printers: Arc<dyn PrinterEnumerator>,
    config: PrintConfig,
    active: Mutex<Option<Arc<dyn RenderSurface>>>,
    /// Superseded jobs never write here
    state: Mutex<JobState>,
}

impl PrintOrchestrator {
    pub fn new(
        factory: Arc<dyn SurfaceFactory>,
        printers: Arc<dyn PrinterEnumerator>,
        config: PrintConfig,
    ) -> Self {
        Self {
            factory,
            printers,
            config,
            active: Mutex::new(None),
            state: Mutex::new(JobState {
                job: 0,
                state: PrintState::Idle,
            }),
        }
    }

    pub fn state(&self) -> PrintState {
        self.state.lock().state
    }

    /// Printers that produce paper. Empty if enumeration fails.
    pub async fn available_printers(&self) -> Vec<PrinterInfo> {
        match self.printers.printers().await {
            Ok(printers) => physical_printers(printers),
            Err(e) => {
                warn!(error = %e, "Failed to list printers");
                Vec::new()
            }
        }
    }

    /// Close the surface of the job in flight, if any.
    ///
    /// Returns `true` if a surface was closed.
    pub fn close_active(&self) -> bool {
        let active = self.active.lock().take();
        match active {
            Some(surface) => {
                debug!("Closing print surface");
                surface.close();
                true
            }
            None => false,
        }
    }

    /// Print the staged document `request.file`.
    ///
    /// # Errors
    ///
    /// - [`ReaderError::NoPrinterAvailable`] before any surface is created
    /// - [`ReaderError::SurfaceLoadFailure`] / [`ReaderError::SurfaceTimeout`]
    ///   when the print page does not become ready
    /// - [`ReaderError::PrintFailed`] when the print command fails
    ///
    /// The surface is closed on every path.
    #[instrument(skip(self, request), fields(file = %request.file, copies = request.copies))]
    pub async fn run(&self, request: &PrintJobRequest) -> ReaderResult<PrintReceipt> {
        let job = self.begin_job();
        let result = self.run_job(job, request).await;
        match &result {
            Ok(receipt) => {
                info!(job, printer = %receipt.printer, "Print job finished");
                self.set_state(job, PrintState::Closed);
            }
            Err(e) => {
                warn!(job, error = %e, "Print job failed");
                self.set_state(job, PrintState::Failed);
            }
        }
        result
    }

    async fn run_job(&self, job: u64, request: &PrintJobRequest) -> ReaderResult<PrintReceipt> {
        let printers = self.printers.printers().await?;
        if printers.is_empty() {
            return Err(ReaderError::NoPrinterAvailable);
        }
        let page_url = print_page_url(&self.config.page_url, &request.file)?;

        if self.close_active() {
            info!("Closed stale print surface");
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let surface = self.factory.create(events_tx);
        *self.active.lock() = Some(surface.clone());

        let result = self
            .load_and_print(job, &surface, events_rx, &page_url, request)
            .await;

        surface.close();
        self.release(&surface);
        result
    }

    async fn load_and_print(
        &self,
        job: u64,
        surface: &Arc<dyn RenderSurface>,
        events: mpsc::UnboundedReceiver<SurfaceEvent>,
        page_url: &str,
        request: &PrintJobRequest,
    ) -> ReaderResult<PrintReceipt> {
        let timeout = self.config.content_timeout();

        self.set_state(job, PrintState::SurfaceLoading);
        match self.await_content(job, surface, events, page_url, timeout).await {
            ReadyOutcome::Ready => debug!("Print page ready"),
            ReadyOutcome::ContentError(reason) => {
                return Err(ReaderError::SurfaceLoadFailure(reason));
            }
            ReadyOutcome::PageLoadFailed { code, description } => {
                return Err(ReaderError::SurfaceLoadFailure(format!(
                    "{} (code {})",
                    description, code
                )));
            }
            ReadyOutcome::NavigationRejected(e) => {
                return Err(ReaderError::SurfaceLoadFailure(e.to_string()));
            }
            ReadyOutcome::SurfaceGone => {
                return Err(ReaderError::SurfaceLoadFailure(
                    "print surface closed before the document was ready".to_string(),
                ));
            }
            ReadyOutcome::TimedOut => return Err(ReaderError::SurfaceTimeout(timeout)),
        }

        self.set_state(job, PrintState::Printing);
        let settings = request.settings();
        surface.print(&settings).await.map_err(|e| match e {
            SurfaceError::PrintFailed(reason) => ReaderError::PrintFailed(reason),
            other => ReaderError::PrintFailed(other.to_string()),
        })?;

        Ok(PrintReceipt {
            printer: settings.device_name,
            copies: settings.copies,
            duplex: settings.duplex,
        })
    }

    /// Wait for the first of: navigation rejected, a surface signal, the
    /// surface going away, or the deadline. The deadline covers loading too.
    async fn await_content(
        &self,
        job: u64,
        surface: &Arc<dyn RenderSurface>,
        mut events: mpsc::UnboundedReceiver<SurfaceEvent>,
        page_url: &str,
        timeout: Duration,
    ) -> ReadyOutcome {
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        let load = surface.load(page_url);
        tokio::pin!(load);
        let mut loaded = false;

        let outcome = loop {
            tokio::select! {
                result = &mut load, if !loaded => match result {
                    Ok(()) => {
                        loaded = true;
                        self.set_state(job, PrintState::AwaitingContentSignal);
                    }
                    Err(e) => break ReadyOutcome::NavigationRejected(e),
                },
                event = events.recv() => break match event {
                    Some(SurfaceEvent::ContentReady) => ReadyOutcome::Ready,
                    Some(SurfaceEvent::ContentError(reason)) => ReadyOutcome::ContentError(reason),
                    Some(SurfaceEvent::LoadFailed { code, description }) => {
                        ReadyOutcome::PageLoadFailed { code, description }
                    }
                    None => ReadyOutcome::SurfaceGone,
                },
                _ = &mut deadline => break ReadyOutcome::TimedOut,
            }
        };

        // Later signals have nowhere to go
        drop(events);
        outcome
    }

    /// Clear the active slot if it still holds `surface`
    fn release(&self, surface: &Arc<dyn RenderSurface>) {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|current| Arc::ptr_eq(current, surface)) {
            *active = None;
        }
    }

    /// Claim the state slot for a new job
    fn begin_job(&self) -> u64 {
        let mut current = self.state.lock();
        current.job += 1;
        current.job
    }

    fn set_state(&self, job: u64, state: PrintState) {
        let mut current = self.state.lock();
        if current.job == job {
            current.state = state;
        } else {
            debug!(job, latest = current.job, ?state, "Ignoring state of superseded job");
        }
    }
}

/// `<page>?file=<urlencoded file>`
fn print_page_url(page: &str, file: &str) -> ReaderResult<String> {
    let mut url = Url::parse(page)
        .map_err(|e| ReaderError::Config(format!("print page {:?}: {}", page, e)))?;
    url.query_pairs_mut().append_pair("file", file);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use powermis_core::{
        DuplexBinding, MarginType, MockPrinters, MockSurfaceFactory, SurfaceBehavior,
    };

    const FILE: &str = "file:///tmp/powermis_1700000000000_0.pdf";

    fn orchestrator(
        factory: &Arc<MockSurfaceFactory>,
        printers: MockPrinters,
    ) -> PrintOrchestrator {
        PrintOrchestrator::new(factory.clone(), Arc::new(printers), PrintConfig::default())
    }

    #[test]
    fn test_print_page_url() {
        let url = print_page_url("app://powermis/print.html", "file:///tmp/a b.pdf").unwrap();
        assert_eq!(url, "app://powermis/print.html?file=file%3A%2F%2F%2Ftmp%2Fa+b.pdf");
        assert!(print_page_url("not a url", FILE).is_err());
    }

    #[tokio::test]
    async fn test_successful_job_closes_surface() {
        let factory = Arc::new(MockSurfaceFactory::new(SurfaceBehavior::SignalReady));
        let orch = orchestrator(&factory, MockPrinters::single("Office"));

        let receipt = orch.run(&PrintJobRequest::new(FILE)).await.unwrap();
        assert_eq!(receipt.copies, 1);
        assert_eq!(receipt.duplex, DuplexMode::Simplex);
        assert_eq!(orch.state(), PrintState::Closed);

        let surfaces = factory.surfaces();
        assert_eq!(surfaces.len(), 1);
        assert!(surfaces[0].is_closed());
        assert_eq!(surfaces[0].print_calls().len(), 1);
        assert!(surfaces[0].loaded_urls()[0].contains("file=file%3A%2F%2F%2Ftmp"));
    }

    #[tokio::test]
    async fn test_request_settings_reach_surface() {
        let factory = Arc::new(MockSurfaceFactory::new(SurfaceBehavior::SignalReady));
        let orch = orchestrator(&factory, MockPrinters::single("Office"));
        let request = PrintJobRequest::new(FILE)
            .with_printer("Office")
            .with_copies(3)
            .with_duplex(DuplexBinding::LongEdge);

        let receipt = orch.run(&request).await.unwrap();
        assert_eq!(receipt.printer, "Office");

        let settings = &factory.surfaces()[0].print_calls()[0];
        assert!(settings.silent);
        assert_eq!(settings.device_name, "Office");
        assert_eq!(settings.copies, 3);
        assert_eq!(settings.duplex, DuplexMode::LongEdge);
        assert_eq!(settings.margins, MarginType::PrintableArea);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_closes_surface() {
        let factory = Arc::new(MockSurfaceFactory::new(SurfaceBehavior::Silent));
        let orch = orchestrator(&factory, MockPrinters::single("Office"));

        let err = orch.run(&PrintJobRequest::new(FILE)).await.unwrap_err();
        assert!(matches!(err, ReaderError::SurfaceTimeout(t) if t == Duration::from_secs(10)));
        assert_eq!(orch.state(), PrintState::Failed);

        let surface = &factory.surfaces()[0];
        assert!(surface.is_closed());
        assert!(surface.print_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_signal_within_deadline() {
        let factory = Arc::new(MockSurfaceFactory::new(SurfaceBehavior::SignalReadyAfter(
            Duration::from_secs(9),
        )));
        let orch = orchestrator(&factory, MockPrinters::single("Office"));

        assert!(orch.run(&PrintJobRequest::new(FILE)).await.is_ok());
    }

    #[tokio::test]
    async fn test_content_error() {
        let factory = Arc::new(MockSurfaceFactory::new(SurfaceBehavior::SignalContentError(
            "Invalid PDF structure".into(),
        )));
        let orch = orchestrator(&factory, MockPrinters::single("Office"));

        let err = orch.run(&PrintJobRequest::new(FILE)).await.unwrap_err();
        assert_eq!(err.user_message(), "PDF load failed: Invalid PDF structure");
        assert!(factory.surfaces()[0].is_closed());
        assert!(factory.surfaces()[0].print_calls().is_empty());
    }

    #[tokio::test]
    async fn test_page_load_failure() {
        let factory = Arc::new(MockSurfaceFactory::new(SurfaceBehavior::FailPageLoad {
            code: -6,
            description: "ERR_FILE_NOT_FOUND".into(),
        }));
        let orch = orchestrator(&factory, MockPrinters::single("Office"));

        let err = orch.run(&PrintJobRequest::new(FILE)).await.unwrap_err();
        assert!(matches!(&err, ReaderError::SurfaceLoadFailure(msg) if msg.contains("code -6")));
        assert_eq!(factory.open_count(), 0);
    }

    #[tokio::test]
    async fn test_navigation_rejected() {
        let factory = Arc::new(MockSurfaceFactory::new(SurfaceBehavior::RejectNavigation(
            "ERR_ABORTED".into(),
        )));
        let orch = orchestrator(&factory, MockPrinters::single("Office"));

        let err = orch.run(&PrintJobRequest::new(FILE)).await.unwrap_err();
        assert!(
            matches!(&err, ReaderError::SurfaceLoadFailure(msg) if msg.contains("ERR_ABORTED"))
        );
        assert_eq!(factory.open_count(), 0);
    }

    #[tokio::test]
    async fn test_no_printers_creates_no_surface() {
        let factory = Arc::new(MockSurfaceFactory::new(SurfaceBehavior::SignalReady));

        let orch = orchestrator(&factory, MockPrinters::empty());
        let err = orch.run(&PrintJobRequest::new(FILE)).await.unwrap_err();
        assert!(matches!(err, ReaderError::NoPrinterAvailable));

        let orch = orchestrator(&factory, MockPrinters::failing());
        let err = orch.run(&PrintJobRequest::new(FILE)).await.unwrap_err();
        assert!(matches!(err, ReaderError::NoPrinterAvailable));

        assert!(factory.surfaces().is_empty());
    }

    #[tokio::test]
    async fn test_print_command_failure() {
        let factory = Arc::new(
            MockSurfaceFactory::new(SurfaceBehavior::SignalReady).with_print_failure("paper jam"),
        );
        let orch = orchestrator(&factory, MockPrinters::single("Office"));

        let err = orch.run(&PrintJobRequest::new(FILE)).await.unwrap_err();
        assert_eq!(err.user_message(), "print failed: paper jam");
        assert!(factory.surfaces()[0].is_closed());
    }

    #[tokio::test]
    async fn test_new_job_closes_stale_surface() {
        let factory = Arc::new(MockSurfaceFactory::new(SurfaceBehavior::Silent));
        let orch = Arc::new(orchestrator(&factory, MockPrinters::single("Office")));

        let first = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.run(&PrintJobRequest::new(FILE)).await })
        };
        while factory.surfaces().is_empty() {
            tokio::task::yield_now().await;
        }

        factory.set_behavior(SurfaceBehavior::SignalReady);
        orch.run(&PrintJobRequest::new(FILE)).await.unwrap();

        assert_eq!(orch.state(), PrintState::Closed);

        let err = first.await.unwrap().unwrap_err();
        assert!(matches!(err, ReaderError::SurfaceLoadFailure(_)));
        // The superseded job does not overwrite the latest outcome
        assert_eq!(orch.state(), PrintState::Closed);

        let surfaces = factory.surfaces();
        assert_eq!(surfaces.len(), 2);
        assert!(surfaces[0].print_calls().is_empty());
        assert_eq!(surfaces[1].print_calls().len(), 1);
        assert_eq!(factory.open_count(), 0);
        assert!(!orch.close_active());
    }

    #[tokio::test]
    async fn test_available_printers_filters_virtual() {
        let factory = Arc::new(MockSurfaceFactory::new(SurfaceBehavior::SignalReady));
        let printers = MockPrinters::new(vec![
            PrinterInfo::new("Microsoft Print to PDF"),
            PrinterInfo::new("Office"),
        ]);
        let orch = orchestrator(&factory, printers);
        let names: Vec<String> = orch
            .available_printers()
            .await
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["Office"]);

        let orch = orchestrator(&factory, MockPrinters::failing());
        assert!(orch.available_printers().await.is_empty());
        assert_eq!(orch.state(), PrintState::Idle);
    }
}
