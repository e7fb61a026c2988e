//! Integration tests for the reader
//!
//! Runs the whole chain against a local HTTP server: invocation, download,
//! decryption with key fallback, staging, display, silent printing, and
//! shutdown cleanup.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use powermis_core::{
    MockPrinters, MockSurfaceFactory, PrintJobRequest, RecordingViewer, SurfaceBehavior,
    ViewerEvent,
};
use powermis_crypto::{FALLBACK_KEY, KeyResolver, seal_container};
use powermis_reader::{
    HttpFetcher, PrintConfig, PrintState, ReaderApp, ReaderConfig, ReaderError,
};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const REQUEST_KEY: &str = "0123456789abcdef";

/// Minimal HTTP/1.1 server: one response per connection, 404 for unknown paths
async fn serve(routes: HashMap<String, Vec<u8>>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&request);
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();

                let (status, body) = match routes.get(&path) {
                    Some(body) => ("200 OK", body.clone()),
                    None => ("404 Not Found", b"not found".to_vec()),
                };
                let header = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes()).await;
                let _ = stream.write_all(&body).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}

fn sample_pdf() -> (Vec<u8>, Vec<u8>) {
    let head = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n".to_vec();
    let tail = b"2 0 obj << /Type /Pages /Kids [] /Count 0 >> endobj\ntrailer << /Root 1 0 R >>\n%%EOF\n"
        .repeat(16);
    (head, tail)
}

fn invocation(addr: SocketAddr, path: &str, key: &str) -> String {
    let file_url = format!("http://{}{}", addr, path);
    let encoded: String = url::form_urlencoded::byte_serialize(file_url.as_bytes()).collect();
    format!("powermis://reader?file_url={}&file_key={}", encoded, key)
}

struct Harness {
    app: ReaderApp,
    viewer: Arc<RecordingViewer>,
    surfaces: Arc<MockSurfaceFactory>,
    _temp: TempDir,
}

fn harness(behavior: SurfaceBehavior, printers: MockPrinters) -> Harness {
    let temp = TempDir::new().unwrap();
    let config = ReaderConfig::default()
        .with_temp_dir(temp.path())
        .with_print(PrintConfig::default().with_content_timeout(Duration::from_secs(10)));
    let viewer = Arc::new(RecordingViewer::new());
    let surfaces = Arc::new(MockSurfaceFactory::new(behavior));
    let fetcher = Arc::new(HttpFetcher::new(config.http_timeout()).unwrap());

    let app = ReaderApp::new(config, fetcher, viewer.clone())
        .with_printing(surfaces.clone(), Arc::new(printers));
    Harness {
        app,
        viewer,
        surfaces,
        _temp: temp,
    }
}

#[tokio::test]
async fn test_open_print_and_shutdown() {
    let (head, tail) = sample_pdf();
    let container = seal_container(&head, &tail, REQUEST_KEY.as_bytes()).unwrap();
    let addr = serve(HashMap::from([("/docs/a.bin".to_string(), container)])).await;

    let h = harness(SurfaceBehavior::SignalReady, MockPrinters::single("Office"));
    h.app.viewer_ready().await.unwrap();

    let staged = h
        .app
        .handle_invocation(&invocation(addr, "/docs/a.bin", REQUEST_KEY))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(std::fs::read(&staged.path).unwrap(), [head, tail].concat());
    assert_eq!(h.viewer.last(), Some(ViewerEvent::Load(staged.uri.clone())));

    let outcome = h
        .app
        .print(&PrintJobRequest::new(staged.uri.clone()).with_copies(2))
        .await;
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(h.app.print_state(), Some(PrintState::Closed));
    assert_eq!(h.surfaces.open_count(), 0);
    assert_eq!(h.surfaces.surfaces()[0].print_calls()[0].copies, 2);

    let report = h.app.shutdown().unwrap();
    assert_eq!(report.removed, 1);
    assert!(!staged.path.exists());
}

#[tokio::test]
async fn test_legacy_document_opens_with_fallback_key() {
    let (head, tail) = sample_pdf();
    let container = seal_container(&head, &tail, FALLBACK_KEY.as_bytes()).unwrap();
    let addr = serve(HashMap::from([("/legacy.bin".to_string(), container)])).await;

    let h = harness(SurfaceBehavior::SignalReady, MockPrinters::single("Office"));
    h.app.viewer_ready().await.unwrap();

    // A full-length key that fails unpadding on this document
    let staged = h
        .app
        .handle_invocation(&invocation(addr, "/legacy.bin", "expired-key-2023"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(std::fs::read(&staged.path).unwrap(), [head, tail].concat());
}

#[tokio::test]
async fn test_http_error_status_is_not_decrypted() {
    let addr = serve(HashMap::new()).await;

    let h = harness(SurfaceBehavior::SignalReady, MockPrinters::single("Office"));
    h.app.viewer_ready().await.unwrap();

    let err = h
        .app
        .handle_invocation(&invocation(addr, "/missing.bin", REQUEST_KEY))
        .await
        .unwrap_err();
    assert!(matches!(err, ReaderError::Fetch(_)));
    assert_eq!(
        h.viewer.events(),
        vec![
            ViewerEvent::Loading,
            ViewerEvent::Notice("unable to load PDF".into())
        ]
    );
    assert!(h.app.registry().is_empty());
}

#[tokio::test]
async fn test_both_keys_rejected() {
    let (head, tail) = sample_pdf();
    let container = seal_container(&head, &tail, REQUEST_KEY.as_bytes()).unwrap();
    let addr = serve(HashMap::from([("/a.bin".to_string(), container)])).await;

    let h = harness(SurfaceBehavior::SignalReady, MockPrinters::single("Office"));
    let app = h.app.with_key_resolver(KeyResolver::with_fallback_key("retired-key-2019"));
    app.viewer_ready().await.unwrap();

    let err = app
        .handle_invocation(&invocation(addr, "/a.bin", "expired-key-2023"))
        .await
        .unwrap_err();
    let ReaderError::DecryptionFailed(detail) = &err else {
        panic!("unexpected error {:?}", err);
    };
    assert!(detail.contains("supplied key"));
    assert!(detail.contains("fallback key"));
    assert_eq!(err.user_message(), "unable to load PDF");
}

#[tokio::test]
async fn test_cold_start_invocation_replayed() {
    let (head, tail) = sample_pdf();
    let container = seal_container(&head, &tail, REQUEST_KEY.as_bytes()).unwrap();
    let addr = serve(HashMap::from([("/a.bin".to_string(), container)])).await;

    let h = harness(SurfaceBehavior::SignalReady, MockPrinters::single("Office"));
    let args = vec![
        "/opt/powermis/powermis".to_string(),
        invocation(addr, "/a.bin", REQUEST_KEY),
    ];

    assert!(h.app.handle_args(&args).await.unwrap().is_none());
    assert!(h.viewer.events().is_empty());

    let staged = h.app.viewer_ready().await.unwrap().unwrap();
    assert!(staged.path.exists());
    assert_eq!(h.app.registry().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_print_timeout_reports_and_closes() {
    let h = harness(SurfaceBehavior::Silent, MockPrinters::single("Office"));

    let outcome = h
        .app
        .print(&PrintJobRequest::new("file:///tmp/powermis_1_0.pdf"))
        .await;
    assert!(!outcome.success);
    assert_eq!(outcome.message, "PDF load timed out (10 s)");
    assert_eq!(h.app.print_state(), Some(PrintState::Failed));
    assert_eq!(h.surfaces.open_count(), 0);
}

#[tokio::test]
async fn test_print_without_printers() {
    let h = harness(SurfaceBehavior::SignalReady, MockPrinters::empty());

    let outcome = h
        .app
        .print(&PrintJobRequest::new("file:///tmp/powermis_1_0.pdf"))
        .await;
    assert_eq!(outcome.message, "no available printer");
    assert!(h.surfaces.surfaces().is_empty());
}

#[tokio::test]
async fn test_shutdown_closes_inflight_surface() {
    let h = Arc::new(harness(SurfaceBehavior::Silent, MockPrinters::single("Office")));

    let job = {
        let h = h.clone();
        tokio::spawn(async move {
            h.app
                .print(&PrintJobRequest::new("file:///tmp/powermis_1_0.pdf"))
                .await
        })
    };
    while h.surfaces.surfaces().is_empty() {
        tokio::task::yield_now().await;
    }

    h.app.shutdown().unwrap();
    let outcome = job.await.unwrap();
    assert!(!outcome.success);
    assert_eq!(h.surfaces.open_count(), 0);
}
