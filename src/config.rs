use serde::Deserialize;
use std::{fs, path::Path, time::Duration};

use crate::codec::CodecKind;
use crate::errors::AppError;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// Host to listen on; the handshake client connects to the same host.
    pub host: String,

    /// HTTP port to listen on.
    pub port: u16,

    /// Log level for tracing (e.g. "info", "debug").
    pub log_level: String,

    /// Wire encoding of the time slot, fixed for the whole run.
    pub codec: CodecKind,

    /// Delay (milliseconds) between readiness checks.
    pub readiness_interval_ms: u64,

    /// Give up waiting for the server after this many milliseconds.
    ///
    /// If `None`, the client waits indefinitely.
    pub readiness_timeout_ms: Option<u64>,

    /// Largest accepted request body.
    pub max_body_bytes: usize,

    /// Keep serving after the handshake until CTRL+C instead of exiting.
    pub serve_after_handshake: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            codec: CodecKind::default(),
            readiness_interval_ms: 200,
            readiness_timeout_ms: None,
            max_body_bytes: 64 * 1024,
            serve_after_handshake: false,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, AppError> {
        let err = |reason: String| AppError::Config {
            path: path.display().to_string(),
            reason,
        };

        let file = fs::read_to_string(path).map_err(|e| err(e.to_string()))?;
        serde_json::from_str::<AppConfig>(&file).map_err(|e| err(e.to_string()))
    }

    /// Base URL the handshake client talks to.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn readiness_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_interval_ms)
    }

    pub fn readiness_timeout(&self) -> Option<Duration> {
        self.readiness_timeout_ms.map(Duration::from_millis)
    }
}
