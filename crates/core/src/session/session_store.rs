use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::session::session_state::{SessionEvent, SessionState};

/// Why a capture-detect cycle was refused before it began.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingRejected {
    #[error("Please start the camera first")]
    NotStreaming,
    #[error("A detection is already in progress")]
    Busy,
}

/// Thread-safe holder of the [`SessionState`].
///
/// Mutation goes through [`SessionEvent`]s only, and only from inside the
/// crate, so `streaming` can be set by nobody but the camera session.
#[derive(Debug, Default)]
pub struct SessionStore {
    state: Mutex<SessionState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn is_streaming(&self) -> bool {
        self.lock().streaming
    }

    pub fn is_processing(&self) -> bool {
        self.lock().processing
    }

    pub fn is_current_stream(&self, epoch: u64) -> bool {
        self.lock().is_current_stream(epoch)
    }

    /// Applies `event` and returns the resulting state.
    pub(crate) fn dispatch(&self, event: SessionEvent) -> SessionState {
        let mut guard = self.lock();
        let current = std::mem::take(&mut *guard);
        *guard = current.apply(event);
        guard.clone()
    }

    /// Checks the preconditions and sets `processing` in one critical section.
    pub(crate) fn begin_processing(
        &self,
        require_streaming: bool,
    ) -> Result<ProcessingGuard<'_>, ProcessingRejected> {
        let mut guard = self.lock();
        if require_streaming && !guard.streaming {
            return Err(ProcessingRejected::NotStreaming);
        }
        if guard.processing {
            return Err(ProcessingRejected::Busy);
        }
        let epoch = guard.stream_epoch;
        let current = std::mem::take(&mut *guard);
        *guard = current.apply(SessionEvent::ProcessingStarted);
        Ok(ProcessingGuard { store: self, epoch })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears `processing` when dropped, whichever way the cycle ended.
pub(crate) struct ProcessingGuard<'a> {
    store: &'a SessionStore,
    epoch: u64,
}

impl ProcessingGuard<'_> {
    /// The stream attached when processing began.
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.store.dispatch(SessionEvent::ProcessingFinished);
    }
}
