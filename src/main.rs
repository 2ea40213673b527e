use std::sync::Arc;

use callnote_enricher::config::WorkerConfig;
use callnote_enricher::llm::{FailoverProvider, create_provider};
use callnote_enricher::pipeline::EnrichmentEngine;
use callnote_enricher::stream::{LineSink, LineSource, StreamWorker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    // Optional .env file; real environment variables win
    let _ = dotenvy::dotenv();

    // Initialize tracing (stderr, so stdout carries only enriched records)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = WorkerConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("  export GROQ_API_KEY=gsk_...");
        std::process::exit(1);
    });

    eprintln!("📞 Callnote Enricher v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Primary: {} ({})",
        config.primary.model,
        config.primary.backend.label()
    );
    eprintln!(
        "   Fallback: {} ({})",
        config.fallback.model,
        config.fallback.backend.label()
    );
    eprintln!(
        "   Input: {} (stdin)   Output: {} (stdout)\n",
        config.stream.input_topic, config.stream.output_topic
    );

    // ── LLM chain ───────────────────────────────────────────────────────
    let primary = create_provider(&config.primary)?;
    let fallback = create_provider(&config.fallback)?;
    let chain = FailoverProvider::primary_fallback(primary, fallback);

    let engine = Arc::new(EnrichmentEngine::new(Arc::new(chain), config.generation));
    let worker = StreamWorker::new(engine, config.stream);

    // ── Stream loop ─────────────────────────────────────────────────────
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let source = LineSource::stdin()?;
    let stats = worker.run(source, LineSink::stdout(), shutdown).await;

    eprintln!(
        "🛑 Stopped: {} received, {} published, {} skipped, {} failed",
        stats.received, stats.published, stats.skipped, stats.failed
    );

    Ok(())
}
