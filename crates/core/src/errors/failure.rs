use thiserror::Error;

use crate::camera::domain::camera_device::DeviceFailure;
use crate::capture::frame_capturer::CaptureError;
use crate::detection::domain::detection_client::DetectError;

/// Any raw failure the session can run into, before classification.
#[derive(Error, Debug)]
pub enum Failure {
    #[error(transparent)]
    Device(#[from] DeviceFailure),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error("{0}")]
    Other(String),
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Failure::Other(message)
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Failure::Other(message.to_string())
    }
}
