use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::session::session_state::SessionEvent;
use crate::session::session_store::SessionStore;

/// The running poll worker: its cancel flag, its wake-up channel and its
/// thread.
pub struct PollHandle {
    id: u64,
    cancelled: Arc<AtomicBool>,
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    fn signal(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
        let _ = self.stop_tx.try_send(());
    }
}

/// What a freshly spawned worker needs to know about itself.
pub struct PollWorker {
    pub id: u64,
    pub cancelled: Arc<AtomicBool>,
    pub stop_rx: Receiver<()>,
}

/// Holds at most one [`PollHandle`] per session.
///
/// Shared between the scheduler, which installs workers, and the camera
/// session, which cancels them on stop. Cancelling never joins: an in-flight
/// cycle is left to finish and its result is discarded by the stale guard.
pub struct PollSlot {
    current: Mutex<Option<PollHandle>>,
    retired: Mutex<Vec<JoinHandle<()>>>,
    store: Arc<SessionStore>,
    next_id: AtomicU64,
}

impl PollSlot {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            current: Mutex::new(None),
            retired: Mutex::new(Vec::new()),
            store,
            next_id: AtomicU64::new(1),
        }
    }

    /// Cancels any running worker, then spawns and installs a new one.
    ///
    /// The slot stays locked while `spawn` runs, so a worker that exits at once
    /// still finds itself installed when it reports back.
    pub(crate) fn install<F>(&self, spawn: F) -> u64
    where
        F: FnOnce(PollWorker) -> JoinHandle<()>,
    {
        let mut current = self.lock_current();
        if let Some(previous) = current.take() {
            log::debug!("Replacing poll worker {}", previous.id);
            self.retire(previous);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancelled = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let thread = spawn(PollWorker {
            id,
            cancelled: cancelled.clone(),
            stop_rx,
        });

        *current = Some(PollHandle {
            id,
            cancelled,
            stop_tx,
            thread: Some(thread),
        });
        self.store.dispatch(SessionEvent::PollingStarted);
        id
    }

    /// Signals the running worker to stop. Returns `false` when nothing was
    /// polling.
    pub fn cancel(&self) -> bool {
        let Some(handle) = self.lock_current().take() else {
            return false;
        };
        log::debug!("Cancelling poll worker {}", handle.id);
        self.retire(handle);
        self.store.dispatch(SessionEvent::PollingStopped);
        true
    }

    /// Called by a worker on its way out. A worker that has already been
    /// replaced or cancelled leaves the slot alone.
    pub(crate) fn finished(&self, id: u64) {
        let mut current = self.lock_current();
        if current.as_ref().map(PollHandle::id) != Some(id) {
            return;
        }
        if let Some(handle) = current.take() {
            self.retire(handle);
            self.store.dispatch(SessionEvent::PollingStopped);
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock_current().is_some()
    }

    /// Waits for every worker that has been cancelled or has exited.
    pub fn join_retired(&self) {
        let threads = std::mem::take(&mut *self.lock_retired());
        for thread in threads {
            if thread.join().is_err() {
                log::warn!("Poll worker panicked");
            }
        }
    }

    fn retire(&self, mut handle: PollHandle) {
        handle.signal();
        if let Some(thread) = handle.thread.take() {
            self.lock_retired().push(thread);
        }
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<PollHandle>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_retired(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.retired.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
