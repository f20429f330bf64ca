use serde::Serialize;

use crate::detection::domain::detection_result::DetectionResult;
use crate::errors::classified_error::ClassifiedError;

/// Authoritative record of one capture/detection session.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub streaming: bool,
    pub processing: bool,
    pub polling: bool,
    pub last_result: Option<DetectionResult>,
    pub last_error: Option<ClassifiedError>,
    /// `None` until the first health check has completed.
    pub backend_reachable: Option<bool>,
    /// Bumped on every attach, so a restart is distinguishable from the
    /// stream that was running when a request started.
    pub stream_epoch: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    StreamAttached,
    StreamDetached,
    ProcessingStarted,
    ProcessingFinished,
    /// `live_epoch` is the stream the frame came from. Such outcomes are
    /// dropped unless that same stream is still attached.
    DetectionSucceeded {
        result: DetectionResult,
        live_epoch: Option<u64>,
    },
    OperationFailed {
        error: ClassifiedError,
        live_epoch: Option<u64>,
    },
    ErrorCleared,
    PollingStarted,
    PollingStopped,
    BackendChecked {
        reachable: bool,
    },
}

impl SessionState {
    /// Pure transition function.
    pub fn apply(self, event: SessionEvent) -> SessionState {
        match event {
            SessionEvent::StreamAttached => SessionState {
                streaming: true,
                stream_epoch: self.stream_epoch + 1,
                ..self
            },
            SessionEvent::StreamDetached => SessionState {
                streaming: false,
                polling: false,
                ..self
            },
            SessionEvent::ProcessingStarted => SessionState {
                processing: true,
                ..self
            },
            SessionEvent::ProcessingFinished => SessionState {
                processing: false,
                ..self
            },
            SessionEvent::DetectionSucceeded { live_epoch, .. } if self.is_stale(live_epoch) => self,
            SessionEvent::DetectionSucceeded { result, .. } => SessionState {
                last_result: Some(result),
                last_error: None,
                ..self
            },
            SessionEvent::OperationFailed { live_epoch, .. } if self.is_stale(live_epoch) => self,
            SessionEvent::OperationFailed { error, .. } => SessionState {
                last_error: Some(error),
                ..self
            },
            SessionEvent::ErrorCleared => SessionState {
                last_error: None,
                ..self
            },
            SessionEvent::PollingStarted => SessionState {
                polling: true,
                ..self
            },
            SessionEvent::PollingStopped => SessionState {
                polling: false,
                ..self
            },
            SessionEvent::BackendChecked { reachable } => SessionState {
                backend_reachable: Some(reachable),
                ..self
            },
        }
    }

    /// Whether the stream that produced a live frame is still the one attached.
    pub fn is_current_stream(&self, epoch: u64) -> bool {
        self.streaming && self.stream_epoch == epoch
    }

    fn is_stale(&self, live_epoch: Option<u64>) -> bool {
        live_epoch.is_some_and(|epoch| !self.is_current_stream(epoch))
    }
}
