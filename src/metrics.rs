//! Prometheus counters for the feed processor

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::{FeedError, Result};
use crate::message::MessageType;

/// Counters owned by one processor, registered in their own registry
pub struct FeedMetrics {
    registry: Registry,
    /// Pre-resolved per type, indexed like `MessageType::ALL`
    messages: Vec<IntCounter>,
    unknown: IntCounter,
    empty: IntCounter,
    anomalies: IntCounterVec,
    missing_levels: IntCounter,
    stream_errors: IntCounterVec,
    bytes: IntCounter,
}

impl FeedMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let by_type = IntCounterVec::new(
            Opts::new("itch_messages_total", "Framed messages by type"),
            &["type"],
        )?;
        let anomalies = IntCounterVec::new(
            Opts::new("itch_anomalies_total", "Per-message anomalies by kind"),
            &["kind"],
        )?;
        let stream_errors = IntCounterVec::new(
            Opts::new("itch_stream_errors_total", "Fatal stream errors by kind"),
            &["kind"],
        )?;
        let missing_levels = IntCounter::new(
            "itch_missing_levels_total",
            "Reductions that found no level at the order price",
        )?;
        let bytes = IntCounter::new("itch_bytes_total", "Bytes framed, length prefixes included")?;

        registry.register(Box::new(by_type.clone()))?;
        registry.register(Box::new(anomalies.clone()))?;
        registry.register(Box::new(stream_errors.clone()))?;
        registry.register(Box::new(missing_levels.clone()))?;
        registry.register(Box::new(bytes.clone()))?;

        let messages = MessageType::ALL
            .iter()
            .map(|ty| by_type.with_label_values(&[ty.name()]))
            .collect();
        let unknown = by_type.with_label_values(&["unknown"]);
        let empty = by_type.with_label_values(&["empty"]);

        Ok(Self {
            registry,
            messages,
            unknown,
            empty,
            anomalies,
            missing_levels,
            stream_errors,
            bytes,
        })
    }

    #[inline]
    pub fn record_message(&self, ty: Option<MessageType>, framed_bytes: usize) {
        match ty {
            Some(ty) => self.messages[ty as usize].inc(),
            None => self.unknown.inc(),
        }
        self.bytes.inc_by(framed_bytes as u64);
    }

    /// Zero-length frame, only the length prefix was framed
    pub fn record_empty_frame(&self, framed_bytes: usize) {
        self.empty.inc();
        self.bytes.inc_by(framed_bytes as u64);
    }

    pub fn record_anomaly(&self, kind: &str) {
        self.anomalies.with_label_values(&[kind]).inc();
    }

    pub fn record_missing_levels(&self, count: u64) {
        self.missing_levels.inc_by(count);
    }

    pub fn record_stream_error(&self, kind: &str) {
        self.stream_errors.with_label_values(&[kind]).inc();
    }

    /// Prometheus text exposition of every counter
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| FeedError::Metrics(format!("text is not UTF-8: {}", e)))
    }
}
