use crate::error::{ColstreamError, Result};
use crate::stream::{CodecKind, StreamOptions, HEADER_LEN, TEXT_BYTES_PER_RECORD};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub stream: StreamConfig,
    pub request: RequestConfig,
    pub trace: TraceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub codec: CodecKind,
    pub batch_capacity: usize,
    pub scratch_capacity: usize,
    pub max_chunk_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    pub compression_level: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    pub record_max: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        let stream = StreamOptions::default();
        Self {
            stream: StreamConfig {
                codec: stream.codec,
                batch_capacity: stream.batch_capacity,
                scratch_capacity: stream.scratch_capacity,
                max_chunk_bytes: stream.max_chunk_bytes,
            },
            request: RequestConfig {
                compression_level: 1,
            },
            trace: TraceConfig { record_max: 10 },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_file(path: PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ColstreamError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ColstreamError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn stream_options(&self) -> StreamOptions {
        StreamOptions {
            codec: self.stream.codec,
            batch_capacity: self.stream.batch_capacity,
            scratch_capacity: self.stream.scratch_capacity,
            max_chunk_bytes: self.stream.max_chunk_bytes,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.stream.batch_capacity == 0 {
            return Err(ColstreamError::Config(
                "Batch capacity must be greater than 0".to_string(),
            ));
        }

        if self.stream.scratch_capacity == 0 {
            return Err(ColstreamError::Config(
                "Scratch capacity must be greater than 0".to_string(),
            ));
        }

        if self.stream.max_chunk_bytes < HEADER_LEN {
            return Err(ColstreamError::Config(format!(
                "Max chunk bytes must be at least {}",
                HEADER_LEN
            )));
        }

        let presized = self
            .stream
            .batch_capacity
            .checked_mul(TEXT_BYTES_PER_RECORD);
        if presized.map_or(true, |bytes| bytes > self.stream.max_chunk_bytes) {
            return Err(ColstreamError::Config(format!(
                "Batch capacity {} needs more than the {} byte chunk limit",
                self.stream.batch_capacity, self.stream.max_chunk_bytes
            )));
        }

        if self.stream.scratch_capacity > self.stream.max_chunk_bytes {
            return Err(ColstreamError::Config(format!(
                "Scratch capacity {} exceeds the {} byte chunk limit",
                self.stream.scratch_capacity, self.stream.max_chunk_bytes
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ColstreamError::Config(format!(
                "Invalid log level '{}'. Valid options: {:?}",
                self.logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
