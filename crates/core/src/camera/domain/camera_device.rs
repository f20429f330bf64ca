use std::time::Duration;

use thiserror::Error;

use crate::shared::frame::Frame;

/// A failure reported by the device layer.
///
/// `name` carries the failure signal type (e.g. `NotAllowedError`,
/// `FfmpegError`); `message` the human-readable detail. Both feed the error
/// classifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{name}: {message}")]
pub struct DeviceFailure {
    pub name: String,
    pub message: String,
}

impl DeviceFailure {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacingMode {
    User,
    Environment,
}

/// Loose acquisition constraints. Every field is a preference; devices pick the
/// closest mode they support and only fail when nothing fits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing_mode: Option<FacingMode>,
    pub ideal_width: Option<u32>,
    pub ideal_height: Option<u32>,
}

impl StreamConstraints {
    /// Front-facing camera at the given ideal resolution.
    pub fn preferred(ideal_width: u32, ideal_height: u32) -> Self {
        Self {
            facing_mode: Some(FacingMode::User),
            ideal_width: Some(ideal_width),
            ideal_height: Some(ideal_height),
        }
    }

    /// Any video device, any mode.
    pub fn unconstrained() -> Self {
        Self::default()
    }

    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamMetadata {
    pub width: u32,
    pub height: u32,
}

impl StreamMetadata {
    pub fn is_usable(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// An acquired video stream.
///
/// Owned by the camera session; the capturer only borrows it for one sample.
pub trait LiveStream: Send {
    /// Blocks until the stream reports frame dimensions, or fails once
    /// `timeout` has elapsed.
    fn wait_ready(&mut self, timeout: Duration) -> Result<StreamMetadata, DeviceFailure>;

    fn play(&mut self) -> Result<(), DeviceFailure>;

    /// Latest known metadata, `None` until the stream has become ready.
    fn metadata(&self) -> Option<StreamMetadata>;

    fn is_playing(&self) -> bool;

    /// Samples the current visual frame at native resolution.
    fn grab(&mut self) -> Result<Frame, DeviceFailure>;

    /// Halts and releases every track. Safe to call more than once.
    fn stop(&mut self);
}

/// Platform media-capture entry point.
pub trait CameraDevice: Send {
    fn open(
        &mut self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn LiveStream>, DeviceFailure>;
}
