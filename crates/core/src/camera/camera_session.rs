use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::camera::domain::camera_device::{
    CameraDevice, DeviceFailure, LiveStream, StreamConstraints, StreamMetadata,
};
use crate::errors::classified_error::{ClassifiedError, ErrorKind};
use crate::errors::error_classifier::classify;
use crate::errors::failure::Failure;
use crate::scheduling::poll_handle::PollSlot;
use crate::session::session_state::SessionEvent;
use crate::session::session_store::SessionStore;
use crate::shared::config::SessionConfig;

/// Acquires, holds and releases the live camera stream.
///
/// The only component allowed to mark the session as streaming.
pub struct CameraSession {
    device: Mutex<Box<dyn CameraDevice>>,
    stream: Mutex<Option<Box<dyn LiveStream>>>,
    store: Arc<SessionStore>,
    poll_slot: Arc<PollSlot>,
    constraints: StreamConstraints,
    ready_timeout: Duration,
}

impl CameraSession {
    pub fn new(
        device: Box<dyn CameraDevice>,
        store: Arc<SessionStore>,
        poll_slot: Arc<PollSlot>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            device: Mutex::new(device),
            stream: Mutex::new(None),
            store,
            poll_slot,
            constraints: StreamConstraints::preferred(config.ideal_width, config.ideal_height),
            ready_timeout: config.ready_timeout(),
        }
    }

    /// Opens the camera, waits for it to report dimensions and starts playback.
    ///
    /// A no-op when already streaming. On failure the classified error is
    /// recorded in the session and returned; nothing stays acquired.
    pub fn start(&self) -> Result<StreamMetadata, ClassifiedError> {
        let mut device = self.device.lock().unwrap_or_else(PoisonError::into_inner);
        if self.store.is_streaming() {
            if let Some(metadata) = self.metadata() {
                return Ok(metadata);
            }
        }
        self.store.dispatch(SessionEvent::ErrorCleared);

        match self.acquire(&mut **device) {
            Ok((stream, metadata)) => {
                if let Some(mut previous) = self.lock_stream().replace(stream) {
                    previous.stop();
                }
                self.store.dispatch(SessionEvent::StreamAttached);
                log::info!("Camera started at {}x{}", metadata.width, metadata.height);
                Ok(metadata)
            }
            Err(failure) => {
                let error = classify(&Failure::Device(failure));
                log::warn!("Camera start failed: {error}");
                self.store.dispatch(SessionEvent::OperationFailed {
                    error: error.clone(),
                    live_epoch: None,
                });
                Err(error)
            }
        }
    }

    /// Cancels polling, stops every track and detaches the stream.
    /// Safe to call at any time, any number of times.
    pub fn stop(&self) {
        self.poll_slot.cancel();
        let stream = self.lock_stream().take();
        if let Some(mut stream) = stream {
            stream.stop();
            log::info!("Camera stopped");
        }
        self.store.dispatch(SessionEvent::StreamDetached);
    }

    pub fn is_attached(&self) -> bool {
        self.lock_stream().is_some()
    }

    /// Attached, playing and reporting non-zero dimensions.
    pub fn is_ready(&self) -> bool {
        self.lock_stream().as_ref().is_some_and(|stream| {
            stream.is_playing() && stream.metadata().is_some_and(|m| m.is_usable())
        })
    }

    pub fn metadata(&self) -> Option<StreamMetadata> {
        self.lock_stream().as_ref().and_then(|stream| stream.metadata())
    }

    /// Lends the stream, if any, for the duration of `f`.
    pub fn with_stream<R>(&self, f: impl FnOnce(Option<&mut (dyn LiveStream + 'static)>) -> R) -> R {
        let mut guard = self.lock_stream();
        f(guard.as_deref_mut())
    }

    fn acquire(
        &self,
        device: &mut dyn CameraDevice,
    ) -> Result<(Box<dyn LiveStream>, StreamMetadata), DeviceFailure> {
        let mut stream = match device.open(&self.constraints) {
            Ok(stream) => stream,
            Err(failure) if self.may_relax(&failure) => {
                log::info!("Camera rejected preferred settings ({failure}), retrying without");
                device.open(&StreamConstraints::unconstrained())?
            }
            Err(failure) => return Err(failure),
        };

        match self.prepare(stream.as_mut()) {
            Ok(metadata) => Ok((stream, metadata)),
            Err(failure) => {
                stream.stop();
                Err(failure)
            }
        }
    }

    fn prepare(&self, stream: &mut dyn LiveStream) -> Result<StreamMetadata, DeviceFailure> {
        let metadata = stream.wait_ready(self.ready_timeout)?;
        if !metadata.is_usable() {
            return Err(DeviceFailure::new(
                "NotReadableError",
                "Video has no dimensions. Camera may not be working properly.",
            ));
        }
        stream.play()?;
        Ok(metadata)
    }

    fn may_relax(&self, failure: &DeviceFailure) -> bool {
        !self.constraints.is_unconstrained()
            && classify(&Failure::Device(failure.clone())).kind == ErrorKind::UnsupportedConstraints
    }

    fn lock_stream(&self) -> MutexGuard<'_, Option<Box<dyn LiveStream>>> {
        self.stream.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
