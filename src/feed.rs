//! Message framing and dispatch
//!
//! Splits the byte stream into `[u16 length][body]` frames, hands each
//! complete body to the decoder and applies the result to the market.

use serde::Serialize;
use std::io::Read;
use tracing::{debug, error, info, trace, warn};

use crate::config::MIN_BUFFER_CAPACITY;
use crate::error::{BookError, FeedError, Result};
use crate::message::{u16_at, MessageType, OrderEvent};
use crate::metrics::FeedMetrics;
use crate::orderbook::Market;
use crate::reader::StreamBuffer;

const LENGTH_PREFIX: usize = 2;

/// Outcome of framing one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A frame was consumed; `None` for tags outside the protocol
    Message(Option<MessageType>),
    /// Clean end of stream at a frame boundary
    EndOfStream,
}

/// Totals for one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedStats {
    pub messages: u64,
    pub bytes: u64,
    /// Indexed like `MessageType::ALL`
    #[serde(skip)]
    pub by_type: [u64; 21],
    pub unknown: u64,
    pub empty: u64,
    pub dangling_references: u64,
    pub reference_collisions: u64,
    pub malformed: u64,
    pub missing_levels: u64,
}

impl FeedStats {
    pub fn count(&self, ty: MessageType) -> u64 {
        self.by_type[ty as usize]
    }

    /// Non-zero per-type counts
    pub fn by_type(&self) -> impl Iterator<Item = (MessageType, u64)> + '_ {
        MessageType::ALL
            .iter()
            .map(|ty| (*ty, self.by_type[*ty as usize]))
            .filter(|(_, count)| *count > 0)
    }

    pub fn anomalies(&self) -> u64 {
        self.dangling_references + self.reference_collisions + self.malformed
    }

    fn record_anomaly(&mut self, err: &BookError) {
        match err {
            BookError::DanglingReference { .. } => self.dangling_references += 1,
            BookError::ReferenceCollision { .. } => self.reference_collisions += 1,
            BookError::MessageTooShort { .. } => self.malformed += 1,
        }
    }
}

/// Drives a stream buffer through the framer into a market
pub struct FeedProcessor<R> {
    reader: StreamBuffer<R>,
    metrics: FeedMetrics,
    stats: FeedStats,
}

impl<R: Read> FeedProcessor<R> {
    /// `capacity` is raised to fit the largest possible frame
    pub fn new(source: R, capacity: usize) -> Result<Self> {
        Ok(Self {
            reader: StreamBuffer::new(source, capacity.max(MIN_BUFFER_CAPACITY)),
            metrics: FeedMetrics::new()?,
            stats: FeedStats::default(),
        })
    }

    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }

    pub fn metrics(&self) -> &FeedMetrics {
        &self.metrics
    }

    /// Process messages until a clean end of stream
    pub fn run(&mut self, market: &mut Market) -> Result<FeedStats> {
        info!(capacity = self.reader.capacity(), "Starting feed processing");

        let outcome = loop {
            match self.step(market) {
                Ok(Step::EndOfStream) => break Ok(()),
                Ok(Step::Message(_)) => {}
                Err(e) => break Err(e),
            }
        };

        match outcome {
            Ok(()) => {
                info!(
                    messages = self.stats.messages,
                    bytes = self.stats.bytes,
                    anomalies = self.stats.anomalies(),
                    "Feed processing completed"
                );
                Ok(self.stats.clone())
            }
            Err(e) => {
                error!(error = %e, messages = self.stats.messages, "Feed processing aborted");
                Err(e)
            }
        }
    }

    /// Frame, decode and apply a single message
    pub fn step(&mut self, market: &mut Market) -> Result<Step> {
        if !self.reader.ensure(LENGTH_PREFIX) {
            return self.end_at_boundary();
        }

        let len = u16_at(self.reader.peek(), 0) as usize;
        self.reader.advance(LENGTH_PREFIX);

        if len == 0 {
            self.stats.messages += 1;
            self.stats.empty += 1;
            self.stats.bytes += LENGTH_PREFIX as u64;
            self.metrics.record_empty_frame(LENGTH_PREFIX);
            trace!("Skipping empty frame");
            return Ok(Step::Message(None));
        }

        if !self.reader.ensure(len) {
            return Err(self.stream_failure(len));
        }

        let body = &self.reader.peek()[..len];
        let ty = Self::dispatch(body, market, &mut self.stats, &self.metrics);
        self.reader.advance(len);

        Ok(Step::Message(ty))
    }

    fn dispatch(
        body: &[u8],
        market: &mut Market,
        stats: &mut FeedStats,
        metrics: &FeedMetrics,
    ) -> Option<MessageType> {
        let tag = body[0];
        let ty = MessageType::from_tag(tag);

        stats.messages += 1;
        stats.bytes += (LENGTH_PREFIX + body.len()) as u64;
        metrics.record_message(ty, LENGTH_PREFIX + body.len());

        match ty {
            Some(ty) if ty.is_order_event() => {
                stats.by_type[ty as usize] += 1;
                let missing_before = market.missing_levels();
                let applied = OrderEvent::decode(body)
                    .and_then(|event| event.map_or(Ok(()), |event| market.apply(&event)));
                let missing = market.missing_levels() - missing_before;
                if missing > 0 {
                    stats.missing_levels += missing;
                    metrics.record_missing_levels(missing);
                }
                if let Err(err) = applied {
                    stats.record_anomaly(&err);
                    metrics.record_anomaly(err.kind());
                    match err {
                        BookError::DanglingReference { .. } => {
                            debug!(error = %err, tag = %(tag as char), "Skipping message")
                        }
                        _ => warn!(error = %err, tag = %(tag as char), "Anomalous message"),
                    }
                }
            }
            Some(ty) => {
                stats.by_type[ty as usize] += 1;
                trace!(message_type = ty.name(), "Skipping informational message");
            }
            None => {
                stats.unknown += 1;
                trace!(tag, "Skipping unknown message type");
            }
        }

        ty
    }

    fn end_at_boundary(&mut self) -> Result<Step> {
        if let Some(e) = self.reader.take_error() {
            self.metrics.record_stream_error("io");
            return Err(FeedError::Io(e));
        }
        match self.reader.available() {
            0 => Ok(Step::EndOfStream),
            available => {
                self.metrics.record_stream_error("truncated");
                Err(FeedError::Truncated {
                    expected: LENGTH_PREFIX,
                    available,
                })
            }
        }
    }

    fn stream_failure(&mut self, expected: usize) -> FeedError {
        let err = match self.reader.take_error() {
            Some(e) => FeedError::Io(e),
            None => FeedError::Truncated {
                expected,
                available: self.reader.available(),
            },
        };
        self.metrics.record_stream_error(err.kind());
        err
    }
}
