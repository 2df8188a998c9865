//! Configuration module for the feed handler

use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::error::FeedError;
use crate::orderbook::CollisionPolicy;

/// Smallest buffer that can hold a maximal frame (2-byte prefix + 65535-byte body)
pub const MIN_BUFFER_CAPACITY: usize = 2 + u16::MAX as usize;

/// Default stream buffer size (1 MiB)
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(FeedError::ConfigError(format!("unknown LOG_FORMAT: {}", other))),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Feed file to read; standard input when unset
    pub input_path: Option<String>,

    /// Stream buffer capacity in bytes
    pub buffer_capacity: usize,

    /// What to do when an add reuses a live order reference
    pub collision_policy: CollisionPolicy,

    /// Instruments (stock locates) whose final book is dumped at exit
    pub dump_locates: Vec<u16>,

    /// Levels per side in the book dump
    pub dump_depth: usize,

    /// Print Prometheus metrics text at exit
    pub dump_metrics: bool,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let dump_locates = match env::var("DUMP_LOCATES") {
            Ok(raw) => parse_locates(&raw)?,
            Err(_) => defaults.dump_locates,
        };

        let collision_policy = match env::var("COLLISION_POLICY") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.collision_policy,
        };

        let log_format = match env::var("LOG_FORMAT") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.log_format,
        };

        let config = Self {
            input_path: env::var("INPUT_PATH").ok().filter(|p| !p.trim().is_empty()),
            buffer_capacity: env::var("BUFFER_CAPACITY")
                .unwrap_or_else(|_| DEFAULT_BUFFER_CAPACITY.to_string())
                .parse()
                .unwrap_or(DEFAULT_BUFFER_CAPACITY),
            collision_policy,
            dump_locates,
            dump_depth: env::var("DUMP_DEPTH")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            dump_metrics: env::var("DUMP_METRICS")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            log_format,
        };

        Ok(config.normalized())
    }

    /// Clamp values that would make the pipeline unable to frame a message
    pub fn normalized(mut self) -> Self {
        if self.buffer_capacity < MIN_BUFFER_CAPACITY {
            self.buffer_capacity = MIN_BUFFER_CAPACITY;
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: None,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            collision_policy: CollisionPolicy::Report,
            dump_locates: Vec::new(),
            dump_depth: 10,
            dump_metrics: false,
            log_format: LogFormat::Json,
        }
    }
}

fn parse_locates(raw: &str) -> Result<Vec<u16>, FeedError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>()
                .map_err(|e| FeedError::ConfigError(format!("invalid locate {:?}: {}", s, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locates() {
        assert_eq!(parse_locates("5, 13,,42").unwrap(), vec![5, 13, 42]);
        assert!(parse_locates("5,70000").is_err());
        assert!(parse_locates("").unwrap().is_empty());
    }

    #[test]
    fn test_normalized_raises_small_buffer() {
        let config = Config {
            buffer_capacity: 16,
            ..Config::default()
        }
        .normalized();
        assert_eq!(config.buffer_capacity, MIN_BUFFER_CAPACITY);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
