use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    API_URL_ENV, DEFAULT_API_URL, DEFAULT_JPEG_QUALITY, DEFAULT_POLL_INTERVAL,
    DEFAULT_READY_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, IDEAL_HEIGHT, IDEAL_WIDTH, MAX_UPLOAD_BYTES,
};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("JPEG quality must be between 1 and 100, got {0}")]
    JpegQuality(u8),
    #[error("{name} must be greater than zero")]
    ZeroDuration { name: &'static str },
}

/// Tunables for one capture/detection session.
///
/// Hosts may embed this in their own settings file; every field falls back to
/// its default when missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub api_url: String,
    pub request_timeout_ms: u64,
    pub ready_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub jpeg_quality: u8,
    pub max_upload_bytes: usize,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            ready_timeout_ms: DEFAULT_READY_TIMEOUT.as_millis() as u64,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            ideal_width: IDEAL_WIDTH,
            ideal_height: IDEAL_HEIGHT,
        }
    }
}

impl SessionConfig {
    /// Defaults, with the backend URL taken from `MASKWATCH_API_URL` when set.
    pub fn from_env() -> Self {
        Self::default().with_api_url_override(std::env::var(API_URL_ENV).ok())
    }

    fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            self.api_url = url;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.api_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.api_url.clone(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl {
                url: self.api_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::JpegQuality(self.jpeg_quality));
        }
        for (name, value) in [
            ("request_timeout_ms", self.request_timeout_ms),
            ("ready_timeout_ms", self.ready_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDuration { name });
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
