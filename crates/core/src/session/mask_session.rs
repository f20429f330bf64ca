use std::sync::Arc;

use crate::camera::camera_session::CameraSession;
use crate::camera::domain::camera_device::CameraDevice;
use crate::detection::domain::detection_client::DetectionClient;
use crate::detection::infrastructure::http_detection_client::HttpDetectionClient;
use crate::scheduling::detection_scheduler::DetectionScheduler;
use crate::scheduling::poll_handle::PollSlot;
use crate::session::session_state::{SessionEvent, SessionState};
use crate::session::session_store::SessionStore;
use crate::shared::config::{ConfigError, SessionConfig};

/// One mask-detection session: a camera, a backend and the state they share.
///
/// Everything is wired to a single [`SessionStore`] so the host can render
/// from [`MaskSession::state`] alone.
pub struct MaskSession {
    store: Arc<SessionStore>,
    camera: Arc<CameraSession>,
    scheduler: DetectionScheduler,
    client: Arc<dyn DetectionClient>,
}

impl MaskSession {
    pub fn new(
        config: &SessionConfig,
        device: Box<dyn CameraDevice>,
        client: Arc<dyn DetectionClient>,
    ) -> Self {
        let store = Arc::new(SessionStore::new());
        let poll_slot = Arc::new(PollSlot::new(store.clone()));
        let camera = Arc::new(CameraSession::new(
            device,
            store.clone(),
            poll_slot.clone(),
            config,
        ));
        let scheduler = DetectionScheduler::new(
            store.clone(),
            camera.clone(),
            client.clone(),
            poll_slot,
            config,
        );
        Self {
            store,
            camera,
            scheduler,
            client,
        }
    }

    /// Validates `config` and talks to the backend at `config.api_url` over
    /// HTTP.
    pub fn connect(
        config: &SessionConfig,
        device: Box<dyn CameraDevice>,
    ) -> Result<Self, SessionSetupError> {
        config.validate()?;
        let client = HttpDetectionClient::from_config(config)?;
        log::info!("Using detection backend at {}", client.base_url());
        Ok(Self::new(config, device, Arc::new(client)))
    }

    pub fn camera(&self) -> &CameraSession {
        &self.camera
    }

    pub fn scheduler(&self) -> &DetectionScheduler {
        &self.scheduler
    }

    pub fn state(&self) -> SessionState {
        self.store.snapshot()
    }

    /// Probes the backend and records whether it answered. An unreachable
    /// backend is not an error: capture keeps working, detections will fail.
    pub fn check_backend(&self) -> bool {
        let reachable = match self.client.health() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Detection backend unavailable: {e}");
                false
            }
        };
        self.store
            .dispatch(SessionEvent::BackendChecked { reachable });
        reachable
    }
}

impl Drop for MaskSession {
    fn drop(&mut self) {
        self.camera.stop();
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SessionSetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::infrastructure::still_image_camera::StillImageCamera;
    use crate::detection::domain::detection_client::DetectError;
    use crate::detection::domain::detection_result::DetectionResult;
    use crate::shared::frame::Frame;
    use crate::shared::raw_frame::RawFrame;

    struct HealthOnly {
        healthy: bool,
    }

    impl DetectionClient for HealthOnly {
        fn detect(&self, _frame: &RawFrame) -> Result<DetectionResult, DetectError> {
            Err(DetectError::Network("not wired".into()))
        }

        fn health(&self) -> Result<(), DetectError> {
            if self.healthy {
                Ok(())
            } else {
                Err(DetectError::Network("Connection refused".into()))
            }
        }
    }

    fn session(healthy: bool) -> MaskSession {
        MaskSession::new(
            &SessionConfig::default(),
            Box::new(StillImageCamera::new(Frame::solid(32, 32, [0, 0, 0], 0))),
            Arc::new(HealthOnly { healthy }),
        )
    }

    #[test]
    fn test_initial_state_is_idle() {
        let state = session(true).state();
        assert_eq!(state, SessionState::default());
        assert_eq!(state.backend_reachable, None);
    }

    #[test]
    fn test_check_backend_records_reachability() {
        let up = session(true);
        assert!(up.check_backend());
        assert_eq!(up.state().backend_reachable, Some(true));

        let down = session(false);
        assert!(!down.check_backend());
        assert_eq!(down.state().backend_reachable, Some(false));
        assert_eq!(down.state().last_error, None);
    }

    #[test]
    fn test_camera_and_scheduler_share_state() {
        let session = session(true);
        session.camera().start().unwrap();
        assert!(session.state().streaming);

        session.scheduler().start_polling().unwrap();
        assert!(session.state().polling);

        session.camera().stop();
        session.scheduler().join_polling();
        let state = session.state();
        assert!(!state.streaming);
        assert!(!state.polling);
    }

    #[test]
    fn test_connect_rejects_invalid_url() {
        let config = SessionConfig {
            api_url: "not a url".into(),
            ..SessionConfig::default()
        };
        let result = MaskSession::connect(
            &config,
            Box::new(StillImageCamera::new(Frame::solid(8, 8, [0, 0, 0], 0))),
        );
        assert!(matches!(result, Err(SessionSetupError::Config(_))));
    }
}
