use std::path::Path;
use std::time::Duration;

use crate::camera::domain::camera_device::{
    CameraDevice, DeviceFailure, LiveStream, StreamConstraints, StreamMetadata,
};
use crate::shared::frame::Frame;

/// A camera that always shows the same picture.
///
/// Useful wherever a deterministic source is needed: every grab returns the
/// same pixels, so every capture encodes to the same bytes.
pub struct StillImageCamera {
    frame: Frame,
}

impl StillImageCamera {
    pub fn new(frame: Frame) -> Self {
        Self { frame }
    }

    /// Decodes an image file into the frame to show.
    pub fn from_path(path: &Path) -> Result<Self, DeviceFailure> {
        let decoded = image::open(path).map_err(|e| {
            DeviceFailure::new(
                "NotFoundError",
                format!("Failed to load {}: {e}", path.display()),
            )
        })?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Self::new(Frame::new(rgb.into_raw(), width, height, 0)))
    }
}

impl CameraDevice for StillImageCamera {
    fn open(
        &mut self,
        _constraints: &StreamConstraints,
    ) -> Result<Box<dyn LiveStream>, DeviceFailure> {
        if self.frame.is_empty() {
            return Err(DeviceFailure::new(
                "NotFoundError",
                "Requested device not found",
            ));
        }
        Ok(Box::new(StillImageStream {
            frame: self.frame.clone(),
            playing: false,
            stopped: false,
            next_index: 0,
        }))
    }
}

struct StillImageStream {
    frame: Frame,
    playing: bool,
    stopped: bool,
    next_index: u64,
}

impl StillImageStream {
    fn ensure_live(&self) -> Result<(), DeviceFailure> {
        if self.stopped {
            return Err(DeviceFailure::new(
                "InvalidStateError",
                "The stream has been stopped",
            ));
        }
        Ok(())
    }
}

impl LiveStream for StillImageStream {
    fn wait_ready(&mut self, _timeout: Duration) -> Result<StreamMetadata, DeviceFailure> {
        self.ensure_live()?;
        Ok(StreamMetadata {
            width: self.frame.width(),
            height: self.frame.height(),
        })
    }

    fn play(&mut self) -> Result<(), DeviceFailure> {
        self.ensure_live()?;
        self.playing = true;
        Ok(())
    }

    fn metadata(&self) -> Option<StreamMetadata> {
        if self.stopped {
            return None;
        }
        Some(StreamMetadata {
            width: self.frame.width(),
            height: self.frame.height(),
        })
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn grab(&mut self) -> Result<Frame, DeviceFailure> {
        self.ensure_live()?;
        let frame = Frame::new(
            self.frame.data().to_vec(),
            self.frame.width(),
            self.frame.height(),
            self.next_index,
        );
        self.next_index += 1;
        Ok(frame)
    }

    fn stop(&mut self) {
        self.playing = false;
        self.stopped = true;
    }
}
