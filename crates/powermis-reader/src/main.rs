use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use powermis_core::{ViewerEvent, ViewerSink};
use powermis_crypto::{BLOCK_SIZE, ContainerLayout, KeyResolver, KeySource, seal_container};
use powermis_logging::ReaderSubscriberBuilder;
use powermis_reader::{Cli, Command, HttpFetcher, ReaderApp, ReaderConfig};

/// Viewer for a terminal: document URIs on stdout, notices on stderr
struct ConsoleViewer;

impl ViewerSink for ConsoleViewer {
    fn emit(&self, event: ViewerEvent) {
        match event {
            ViewerEvent::Loading => tracing::info!("Loading document"),
            ViewerEvent::Load(uri) => println!("{}", uri),
            ViewerEvent::Notice(message) => eprintln!("{}", message),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ReaderConfig::load(path)?,
        None => ReaderConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.logging.default_level = level;
    }
    let _guard = ReaderSubscriberBuilder::new()
        .with_config(config.logging.clone())
        .init()?;

    match cli.command {
        Command::Open { url } => open(config, &url).await?,

        Command::Decrypt { input, key, output } => {
            let data = read(&input)?;
            let (document, source) = KeyResolver::new().decrypt_resolved(&data, &key)?;
            std::fs::write(&output, &document)
                .with_context(|| format!("writing {}", output.display()))?;
            let source = match source {
                KeySource::Supplied => "supplied",
                KeySource::Fallback => "fallback",
            };
            println!(
                "Decrypted {} bytes to {} ({} key)",
                document.len(),
                output.display(),
                source
            );
        }

        Command::Inspect { file } => {
            let data = read(&file)?;
            let layout = ContainerLayout::parse(&data)?;
            let aligned = layout.ciphertext_len() % BLOCK_SIZE == 0;
            println!("Container: {}", file.display());
            println!(
                "  ciphertext: {} bytes ({} blocks{})",
                layout.ciphertext_len(),
                layout.ciphertext_len() / BLOCK_SIZE,
                if aligned { "" } else { ", NOT block aligned" }
            );
            println!("  tail:       {} bytes", layout.tail_len());
            println!("  total:      {} bytes", layout.total_len());
        }

        Command::Seal {
            input,
            prefix_len,
            key,
            output,
        } => {
            let data = read(&input)?;
            if prefix_len > data.len() {
                anyhow::bail!(
                    "prefix length {} exceeds document size {}",
                    prefix_len,
                    data.len()
                );
            }
            let (prefix, tail) = data.split_at(prefix_len);
            let container = seal_container(prefix, tail, key.as_bytes())?;
            std::fs::write(&output, &container)
                .with_context(|| format!("writing {}", output.display()))?;
            println!(
                "Sealed {} into {} bytes at {}",
                input.display(),
                container.len(),
                output.display()
            );
        }
    }

    Ok(())
}

/// Stage the invoked document and keep it until Ctrl-C
async fn open(config: ReaderConfig, url: &str) -> anyhow::Result<()> {
    let fetcher = Arc::new(HttpFetcher::new(config.http_timeout())?);
    let app = ReaderApp::new(config, fetcher, Arc::new(ConsoleViewer));
    app.viewer_ready().await?;

    let waited = app
        .serve_until(url, async {
            eprintln!("Press Ctrl-C to close the document");
            tokio::signal::ctrl_c().await
        })
        .await?;
    if let Some(waited) = waited {
        waited.context("waiting for Ctrl-C")?;
    }
    Ok(())
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}
