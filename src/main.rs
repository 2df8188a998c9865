//! ITCH Market Data Handler
//!
//! Reads an ITCH stream from a file or standard input, rebuilds every
//! instrument's book and reports processing throughput.

use anyhow::Context;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use itch_market_data::config::{Config, LogFormat};
use itch_market_data::{FeedProcessor, FeedStats, Market};

fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    init_tracing(config.log_format);

    info!(
        input = config.input_path.as_deref().unwrap_or("<stdin>"),
        buffer_capacity = config.buffer_capacity,
        collision_policy = ?config.collision_policy,
        "Starting ITCH Market Data Handler"
    );

    let source: Box<dyn Read> = match &config.input_path {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("failed to open feed file {}", path))?,
        ),
        None => Box::new(io::stdin().lock()),
    };

    let mut market = Market::with_policy(config.collision_policy);
    let mut processor = FeedProcessor::new(source, config.buffer_capacity)?;

    let started_at = chrono::Utc::now();
    let t0 = Instant::now();
    let outcome = processor.run(&mut market);
    let elapsed = t0.elapsed();

    report(processor.stats(), elapsed, started_at);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for &locate in &config.dump_locates {
        let book = market.book(locate);
        if book.is_empty() {
            warn!(locate, "Requested book is empty");
        }
        let state = book.state(config.dump_depth);
        serde_json::to_writer(&mut out, &state)?;
        writeln!(out)?;
    }

    if config.dump_metrics {
        write!(out, "{}", processor.metrics().encode_text()?)?;
    }
    out.flush()?;

    outcome.context("feed processing failed")?;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(io::stderr))
            .with(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer().pretty().with_writer(io::stderr))
            .with(filter)
            .init(),
    }
}

fn report(
    stats: &FeedStats,
    elapsed: std::time::Duration,
    started_at: chrono::DateTime<chrono::Utc>,
) {
    let avg_ns = if stats.messages > 0 {
        elapsed.as_nanos() as f64 / stats.messages as f64
    } else {
        0.0
    };

    for (ty, count) in stats.by_type() {
        info!(message_type = ty.name(), count, "Message type total");
    }

    info!(
        started_at = %started_at.to_rfc3339(),
        finished_at = %chrono::Utc::now().to_rfc3339(),
        total_secs = elapsed.as_secs_f64(),
        avg_message_ns = avg_ns,
        messages = stats.messages,
        bytes = stats.bytes,
        unknown = stats.unknown,
        dangling_references = stats.dangling_references,
        reference_collisions = stats.reference_collisions,
        malformed = stats.malformed,
        missing_levels = stats.missing_levels,
        "Run summary"
    );
}
