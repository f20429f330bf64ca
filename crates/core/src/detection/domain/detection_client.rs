use std::time::Duration;

use thiserror::Error;

use crate::detection::domain::detection_result::DetectionResult;
use crate::shared::raw_frame::RawFrame;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error("cannot reach detection backend: {0}")]
    Network(String),
    #[error("detection request timed out after {0:?}")]
    Timeout(Duration),
    #[error("detection backend returned HTTP {status}: {body}")]
    Server { status: u16, body: String },
    #[error("invalid response from detection backend: {0}")]
    Protocol(String),
}

/// Domain interface to the remote detection service.
///
/// Implementations issue exactly one request per call, never retry, and never
/// touch session state.
pub trait DetectionClient: Send + Sync {
    fn detect(&self, frame: &RawFrame) -> Result<DetectionResult, DetectError>;

    /// Succeeds when the backend answers its health endpoint with 200.
    fn health(&self) -> Result<(), DetectError>;
}
