use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use thiserror::Error;

use crate::camera::domain::camera_device::{DeviceFailure, LiveStream};
use crate::shared::config::SessionConfig;
use crate::shared::constants::{DEFAULT_JPEG_QUALITY, JPEG_MIME, MAX_UPLOAD_BYTES};
use crate::shared::frame::Frame;
use crate::shared::raw_frame::RawFrame;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("failed to encode frame: {0}")]
    Encode(String),
    #[error(transparent)]
    Device(#[from] DeviceFailure),
}

/// Turns a live stream sample or an uploaded image into a JPEG [`RawFrame`].
///
/// Both paths end in the same encoder, so detection never needs to know where
/// a frame came from.
#[derive(Clone, Debug)]
pub struct FrameCapturer {
    jpeg_quality: u8,
    max_upload_bytes: usize,
}

impl Default for FrameCapturer {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY, MAX_UPLOAD_BYTES)
    }
}

impl FrameCapturer {
    pub fn new(jpeg_quality: u8, max_upload_bytes: usize) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
            max_upload_bytes,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.jpeg_quality, config.max_upload_bytes)
    }

    /// Samples the current frame of an attached, ready stream.
    ///
    /// Fails without side effects when no stream is attached or it has not
    /// reported dimensions yet.
    pub fn capture_live(
        &self,
        stream: Option<&mut (dyn LiveStream + 'static)>,
    ) -> Result<RawFrame, CaptureError> {
        let stream = stream.ok_or_else(|| {
            CaptureError::Unavailable(
                "Camera stream not available. Please start the camera first.".to_string(),
            )
        })?;
        let metadata = stream.metadata().ok_or_else(|| {
            CaptureError::Unavailable(
                "Video is still loading. Please wait a moment and try again.".to_string(),
            )
        })?;
        if !metadata.is_usable() {
            return Err(no_dimensions());
        }

        let frame = stream.grab()?;
        if frame.is_empty() {
            return Err(no_dimensions());
        }
        self.encode(&frame)
    }

    /// Validates and re-encodes an uploaded image.
    pub fn capture_file(&self, bytes: &[u8], mime_type: &str) -> Result<RawFrame, CaptureError> {
        self.validate_upload(bytes.len(), mime_type)?;

        let decoded = image::load_from_memory(bytes).map_err(|e| {
            CaptureError::InvalidInput(format!("Failed to read image file: {e}"))
        })?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        self.encode(&Frame::new(rgb.into_raw(), width, height, 0))
    }

    /// Type and size checks applied before any decoding.
    pub fn validate_upload(&self, len: usize, mime_type: &str) -> Result<(), CaptureError> {
        if !mime_type.trim().to_ascii_lowercase().starts_with("image/") {
            return Err(CaptureError::InvalidInput(
                "Please select an image file (jpg, png, etc.)".to_string(),
            ));
        }
        if len > self.max_upload_bytes {
            return Err(CaptureError::InvalidInput(format!(
                "Image file is too large. Please select an image smaller than {}MB",
                self.max_upload_bytes / (1024 * 1024)
            )));
        }
        if len == 0 {
            return Err(CaptureError::InvalidInput(
                "Failed to read image file: the file is empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn encode(&self, frame: &Frame) -> Result<RawFrame, CaptureError> {
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality)
            .encode(
                frame.data(),
                frame.width(),
                frame.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| CaptureError::Encode(e.to_string()))?;

        if bytes.is_empty() {
            return Err(CaptureError::Encode("encoder produced no data".to_string()));
        }
        Ok(RawFrame::new(bytes, frame.width(), frame.height(), JPEG_MIME))
    }
}

fn no_dimensions() -> CaptureError {
    CaptureError::Unavailable(
        "Video has no dimensions. Camera may not be working properly.".to_string(),
    )
}
