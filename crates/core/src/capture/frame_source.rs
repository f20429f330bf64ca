use std::path::Path;

use crate::camera::camera_session::CameraSession;
use crate::capture::frame_capturer::{CaptureError, FrameCapturer};
use crate::shared::raw_frame::RawFrame;

/// An image file handed in by the user, not yet validated.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub name: Option<String>,
}

impl UploadedFile {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            name: None,
        }
    }

    /// Reads a file from disk, guessing its MIME type from the extension.
    /// Unknown extensions get `application/octet-stream` and will be rejected
    /// by the capturer.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let mime_type = image::ImageFormat::from_path(path)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream");
        Ok(Self {
            bytes,
            mime_type: mime_type.to_string(),
            name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
        })
    }
}

/// Where the frame for one detect cycle comes from.
#[derive(Clone, Debug)]
pub enum FrameSource {
    LiveCamera,
    Upload(UploadedFile),
}

impl FrameSource {
    /// Live results are subject to the stale-response guard; uploads are not.
    pub fn is_live(&self) -> bool {
        matches!(self, FrameSource::LiveCamera)
    }

    pub fn acquire(
        &self,
        camera: &CameraSession,
        capturer: &FrameCapturer,
    ) -> Result<RawFrame, CaptureError> {
        match self {
            FrameSource::LiveCamera => camera.with_stream(|stream| capturer.capture_live(stream)),
            FrameSource::Upload(file) => capturer.capture_file(&file.bytes, &file.mime_type),
        }
    }
}
