use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use thiserror::Error;

use crate::camera::camera_session::CameraSession;
use crate::capture::frame_capturer::{CaptureError, FrameCapturer};
use crate::capture::frame_source::{FrameSource, UploadedFile};
use crate::detection::domain::detection_client::{DetectError, DetectionClient};
use crate::detection::domain::detection_result::DetectionResult;
use crate::errors::classified_error::ClassifiedError;
use crate::errors::error_classifier::classify;
use crate::errors::failure::Failure;
use crate::scheduling::poll_handle::{PollSlot, PollWorker};
use crate::session::session_state::SessionEvent;
use crate::session::session_store::{ProcessingRejected, SessionStore};
use crate::shared::config::SessionConfig;
use crate::shared::raw_frame::RawFrame;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Please start the camera first")]
    NotStreaming,
    #[error("A detection is already in progress")]
    Busy,
    #[error(transparent)]
    Failed(#[from] ClassifiedError),
    /// The camera stopped while the request was in flight.
    #[error("camera stopped before the detection result arrived")]
    Discarded,
}

impl From<ProcessingRejected> for ScheduleError {
    fn from(rejected: ProcessingRejected) -> Self {
        match rejected {
            ProcessingRejected::NotStreaming => ScheduleError::NotStreaming,
            ProcessingRejected::Busy => ScheduleError::Busy,
        }
    }
}

const CAMERA_NOT_STARTED: &str = "Camera stream not available. Please start the camera first.";

/// What a single poll tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Detected,
    Failed,
    SkippedNotReady,
    SkippedBusy,
    StreamEnded,
}

/// Runs capture-then-detect cycles, one at a time per session, either on
/// demand or on a fixed interval.
#[derive(Clone)]
pub struct DetectionScheduler {
    store: Arc<SessionStore>,
    camera: Arc<CameraSession>,
    client: Arc<dyn DetectionClient>,
    capturer: FrameCapturer,
    poll_slot: Arc<PollSlot>,
    request_timeout: Duration,
    poll_interval: Duration,
}

impl DetectionScheduler {
    pub fn new(
        store: Arc<SessionStore>,
        camera: Arc<CameraSession>,
        client: Arc<dyn DetectionClient>,
        poll_slot: Arc<PollSlot>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            store,
            camera,
            client,
            capturer: FrameCapturer::from_config(config),
            poll_slot,
            request_timeout: config.request_timeout(),
            poll_interval: config.poll_interval(),
        }
    }

    /// One detection on the current camera frame.
    ///
    /// Refused immediately when another cycle is in flight. Without a stream
    /// it is refused too, and the refusal is recorded as the session error.
    pub fn capture_once(&self) -> Result<DetectionResult, ScheduleError> {
        self.run_cycle(&FrameSource::LiveCamera)
            .map_err(|err| self.record_not_streaming(err))
    }

    /// One detection on a user-supplied image. Needs no camera.
    pub fn detect_upload(&self, file: UploadedFile) -> Result<DetectionResult, ScheduleError> {
        self.run_cycle(&FrameSource::Upload(file))
    }

    fn run_cycle(&self, source: &FrameSource) -> Result<DetectionResult, ScheduleError> {
        let live = source.is_live();
        let processing = self.store.begin_processing(live)?;
        let live_epoch = live.then(|| processing.epoch());

        let outcome = source
            .acquire(&self.camera, &self.capturer)
            .map_err(Failure::from)
            .and_then(|frame| self.detect_with_deadline(frame).map_err(Failure::from));

        if let Some(epoch) = live_epoch {
            if !self.store.is_current_stream(epoch) {
                log::debug!("Discarding detection outcome: camera stopped mid-cycle");
                return Err(ScheduleError::Discarded);
            }
        }

        match outcome {
            Ok(result) => {
                log::debug!(
                    "Detected {} face(s), {} with mask",
                    result.total_faces,
                    result.masked_count()
                );
                self.store.dispatch(SessionEvent::DetectionSucceeded {
                    result: result.clone(),
                    live_epoch,
                });
                Ok(result)
            }
            Err(failure) => {
                let error = classify(&failure);
                log::warn!("Detection failed: {error}");
                self.store.dispatch(SessionEvent::OperationFailed {
                    error: error.clone(),
                    live_epoch,
                });
                Err(ScheduleError::Failed(error))
            }
        }
    }

    fn record_not_streaming(&self, err: ScheduleError) -> ScheduleError {
        if err == ScheduleError::NotStreaming {
            let error = classify(&Failure::Capture(CaptureError::Unavailable(
                CAMERA_NOT_STARTED.to_string(),
            )));
            self.store.dispatch(SessionEvent::OperationFailed {
                error,
                live_epoch: None,
            });
        }
        err
    }

    /// Runs the request on its own thread and gives up after the request
    /// timeout. A response that arrives later is dropped.
    fn detect_with_deadline(&self, frame: RawFrame) -> Result<DetectionResult, DetectError> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let client = self.client.clone();
        thread::spawn(move || {
            let _ = tx.send(client.detect(&frame));
        });

        match rx.recv_timeout(self.request_timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Detection request exceeded {:?}, abandoning it",
                    self.request_timeout
                );
                Err(DetectError::Timeout(self.request_timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(DetectError::Network(
                "detection request ended without a response".to_string(),
            )),
        }
    }

    /// Polls at the configured interval until stopped or the camera stops.
    pub fn start_polling(&self) -> Result<(), ScheduleError> {
        self.start_polling_every(self.poll_interval)
    }

    pub fn start_polling_every(&self, interval: Duration) -> Result<(), ScheduleError> {
        self.start_polling_with(crossbeam_channel::tick(interval))
    }

    /// Polls once per message on `ticks`. The worker ends when the channel
    /// disconnects, when polling is stopped, or when the camera stops.
    ///
    /// Replaces any poll already running.
    pub fn start_polling_with(&self, ticks: Receiver<Instant>) -> Result<(), ScheduleError> {
        if !self.store.is_streaming() {
            return Err(self.record_not_streaming(ScheduleError::NotStreaming));
        }
        let scheduler = self.clone();
        let id = self
            .poll_slot
            .install(move |worker| thread::spawn(move || scheduler.poll_loop(worker, ticks)));
        log::info!("Started detection polling (worker {id})");
        Ok(())
    }

    /// Cancels the running poll, if any. An in-flight cycle still completes.
    pub fn stop_polling(&self) {
        if self.poll_slot.cancel() {
            log::info!("Stopped detection polling");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poll_slot.is_active()
    }

    /// Blocks until every stopped or finished poll worker has exited.
    pub fn join_polling(&self) {
        self.poll_slot.join_retired();
    }

    /// One poll step: skip when the stream is not ready or a cycle is already
    /// running, otherwise run a live cycle. Skips leave `last_error` alone.
    pub fn poll_tick(&self) -> TickOutcome {
        if !self.store.is_streaming() {
            return TickOutcome::StreamEnded;
        }
        if !self.camera.is_ready() {
            log::debug!("Skipping poll tick: stream not ready");
            return TickOutcome::SkippedNotReady;
        }
        match self.run_cycle(&FrameSource::LiveCamera) {
            Ok(_) => TickOutcome::Detected,
            Err(ScheduleError::Busy) => {
                log::debug!("Skipping poll tick: detection in flight");
                TickOutcome::SkippedBusy
            }
            Err(ScheduleError::NotStreaming | ScheduleError::Discarded) => TickOutcome::StreamEnded,
            Err(ScheduleError::Failed(_)) => TickOutcome::Failed,
        }
    }

    fn poll_loop(&self, worker: PollWorker, ticks: Receiver<Instant>) {
        loop {
            let ticked = crossbeam_channel::select! {
                recv(worker.stop_rx) -> _ => false,
                recv(ticks) -> tick => tick.is_ok(),
            };
            if !ticked || worker.cancelled.load(Ordering::Relaxed) {
                break;
            }
            if self.poll_tick() == TickOutcome::StreamEnded {
                break;
            }
        }
        log::debug!("Poll worker {} exiting", worker.id);
        self.poll_slot.finished(worker.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::domain::camera_device::{
        CameraDevice, DeviceFailure, LiveStream, StreamConstraints, StreamMetadata,
    };
    use crate::camera::infrastructure::still_image_camera::StillImageCamera;
    use crate::detection::domain::detection_result::Detection;
    use crate::errors::classified_error::ErrorKind;
    use crate::shared::frame::Frame;
    use crossbeam_channel::Sender;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn result(total_faces: u32) -> DetectionResult {
        DetectionResult {
            detections: vec![Detection {
                x: 10.0,
                y: 20.0,
                width: 50.0,
                height: 60.0,
                has_mask: true,
                confidence: 0.92,
            }],
            encoded_image: "data:image/jpeg;base64,AAAA".into(),
            total_faces,
        }
    }

    /// Scripted backend that tracks how many requests overlap.
    #[derive(Default)]
    struct StubClient {
        responses: Mutex<VecDeque<Result<DetectionResult, DetectError>>>,
        delay: Duration,
        gate: Option<Receiver<()>>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl StubClient {
        fn answering(responses: Vec<Result<DetectionResult, DetectError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        /// Each request blocks until a message arrives on the returned sender.
        fn gated() -> (Self, Sender<()>) {
            let (tx, rx) = crossbeam_channel::unbounded();
            let client = Self {
                gate: Some(rx),
                ..Self::default()
            };
            (client, tx)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn wait_for_calls(&self, n: usize) {
            while self.calls() < n {
                thread::yield_now();
            }
        }
    }

    impl DetectionClient for StubClient {
        fn detect(&self, _frame: &RawFrame) -> Result<DetectionResult, DetectError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                let _ = gate.recv();
            }
            thread::sleep(self.delay);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(result(1)))
        }

        fn health(&self) -> Result<(), DetectError> {
            Ok(())
        }
    }

    struct Harness {
        store: Arc<SessionStore>,
        camera: Arc<CameraSession>,
        client: Arc<StubClient>,
        scheduler: DetectionScheduler,
    }

    fn harness_with(
        device: Box<dyn CameraDevice>,
        client: StubClient,
        config: SessionConfig,
    ) -> Harness {
        let store = Arc::new(SessionStore::new());
        let slot = Arc::new(PollSlot::new(store.clone()));
        let camera = Arc::new(CameraSession::new(device, store.clone(), slot.clone(), &config));
        let client = Arc::new(client);
        let scheduler = DetectionScheduler::new(
            store.clone(),
            camera.clone(),
            client.clone(),
            slot,
            &config,
        );
        Harness {
            store,
            camera,
            client,
            scheduler,
        }
    }

    fn harness(client: StubClient) -> Harness {
        harness_with(
            Box::new(StillImageCamera::new(Frame::solid(64, 48, [100, 100, 100], 0))),
            client,
            SessionConfig::default(),
        )
    }

    fn streaming(client: StubClient) -> Harness {
        let h = harness(client);
        h.camera.start().unwrap();
        h
    }

    fn png_upload() -> UploadedFile {
        let img = image::RgbImage::from_pixel(20, 10, image::Rgb([1, 2, 3]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        UploadedFile::new(out.into_inner(), "image/png")
    }

    #[test]
    fn test_capture_once_records_result() {
        let h = streaming(StubClient::answering(vec![Ok(result(1))]));

        let detected = h.scheduler.capture_once().unwrap();

        let state = h.store.snapshot();
        assert_eq!(state.last_result, Some(detected));
        assert_eq!(state.last_error, None);
        assert!(!state.processing);
        assert_eq!(h.client.calls(), 1);
    }

    #[test]
    fn test_capture_once_without_camera_records_error() {
        let h = harness(StubClient::default());

        assert_eq!(h.scheduler.capture_once(), Err(ScheduleError::NotStreaming));

        let state = h.store.snapshot();
        let error = state.last_error.expect("refusal should be recorded");
        assert_eq!(error.kind, ErrorKind::DeviceGenericFailure);
        assert_eq!(error.message, CAMERA_NOT_STARTED);
        assert!(!state.processing);
        assert_eq!(state.last_result, None);
        assert_eq!(h.client.calls(), 0);
    }

    #[test]
    fn test_capture_once_while_busy_leaves_error_alone() {
        let (client, release) = StubClient::gated();
        let h = streaming(client);
        let scheduler = h.scheduler.clone();
        let first = thread::spawn(move || scheduler.capture_once());
        h.client.wait_for_calls(1);

        assert_eq!(h.scheduler.capture_once(), Err(ScheduleError::Busy));
        assert_eq!(h.store.snapshot().last_error, None);

        release.send(()).unwrap();
        first.join().unwrap().unwrap();
    }

    #[test]
    fn test_failure_preserves_previous_result() {
        let h = streaming(StubClient::answering(vec![
            Ok(result(1)),
            Err(DetectError::Server {
                status: 500,
                body: "Error processing image".into(),
            }),
        ]));

        let first = h.scheduler.capture_once().unwrap();
        let err = h.scheduler.capture_once().unwrap_err();

        let ScheduleError::Failed(error) = err else {
            panic!("expected classified failure, got {err:?}");
        };
        assert_eq!(error.kind, ErrorKind::ServerError { status: 500 });
        let state = h.store.snapshot();
        assert_eq!(state.last_result, Some(first));
        assert_eq!(state.last_error, Some(error));
        assert!(!state.processing);
    }

    #[test]
    fn test_success_clears_previous_error() {
        let h = streaming(StubClient::answering(vec![
            Err(DetectError::Protocol("missing 'detections' field".into())),
            Ok(result(2)),
        ]));

        assert!(h.scheduler.capture_once().is_err());
        assert_eq!(
            h.store.snapshot().last_error.map(|e| e.kind),
            Some(ErrorKind::MalformedResponse)
        );

        h.scheduler.capture_once().unwrap();
        assert_eq!(h.store.snapshot().last_error, None);
    }

    #[test]
    fn test_second_capture_while_in_flight_is_busy() {
        let (client, release) = StubClient::gated();
        let h = streaming(client);
        let scheduler = h.scheduler.clone();
        let first = thread::spawn(move || scheduler.capture_once());
        h.client.wait_for_calls(1);

        assert_eq!(h.scheduler.capture_once(), Err(ScheduleError::Busy));
        assert!(h.store.is_processing());

        release.send(()).unwrap();
        assert!(first.join().unwrap().is_ok());
        assert!(!h.store.is_processing());
        assert_eq!(h.client.calls(), 1);
    }

    #[test]
    fn test_concurrent_callers_never_overlap() {
        let h = streaming(StubClient::slow(Duration::from_millis(5)));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let scheduler = h.scheduler.clone();
                thread::spawn(move || {
                    (0..10)
                        .map(|_| scheduler.capture_once())
                        .filter(|r| r.is_ok())
                        .count()
                })
            })
            .collect();
        let succeeded: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();

        assert_eq!(h.client.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(succeeded, h.client.calls());
        assert!(succeeded >= 1);
        assert!(!h.store.is_processing());
    }

    #[test]
    fn test_timeout_resets_processing_and_drops_late_response() {
        let config = SessionConfig {
            request_timeout_ms: 50,
            ..SessionConfig::default()
        };
        let h = harness_with(
            Box::new(StillImageCamera::new(Frame::solid(16, 16, [0, 0, 0], 0))),
            StubClient::slow(Duration::from_millis(300)),
            config,
        );
        h.camera.start().unwrap();

        let err = h.scheduler.capture_once().unwrap_err();

        let ScheduleError::Failed(error) = err else {
            panic!("expected classified failure, got {err:?}");
        };
        assert_eq!(error.kind, ErrorKind::NetworkUnreachable);
        assert!(!h.store.is_processing());

        thread::sleep(Duration::from_millis(400));
        assert_eq!(h.store.snapshot().last_result, None);
    }

    #[test]
    fn test_result_after_camera_stop_is_discarded() {
        let (client, release) = StubClient::gated();
        let h = streaming(client);
        let scheduler = h.scheduler.clone();
        let cycle = thread::spawn(move || scheduler.capture_once());
        h.client.wait_for_calls(1);

        h.camera.stop();
        release.send(()).unwrap();

        assert_eq!(cycle.join().unwrap(), Err(ScheduleError::Discarded));
        let state = h.store.snapshot();
        assert_eq!(state.last_result, None);
        assert_eq!(state.last_error, None);
        assert!(!state.processing);
        assert!(!state.streaming);
    }

    #[test]
    fn test_result_after_camera_restart_is_discarded() {
        let (client, release) = StubClient::gated();
        let h = streaming(client);
        let scheduler = h.scheduler.clone();
        let cycle = thread::spawn(move || scheduler.capture_once());
        h.client.wait_for_calls(1);

        h.camera.stop();
        h.camera.start().unwrap();
        release.send(()).unwrap();

        assert_eq!(cycle.join().unwrap(), Err(ScheduleError::Discarded));
        let state = h.store.snapshot();
        assert_eq!(state.last_result, None);
        assert_eq!(state.last_error, None);
        assert!(!state.processing);
        assert!(state.streaming);
    }

    #[test]
    fn test_failure_after_camera_restart_is_discarded() {
        let (mut client, release) = StubClient::gated();
        client.responses = Mutex::new(
            vec![Err(DetectError::Server {
                status: 500,
                body: "Error processing image".into(),
            })]
            .into(),
        );
        let h = streaming(client);
        let scheduler = h.scheduler.clone();
        let cycle = thread::spawn(move || scheduler.capture_once());
        h.client.wait_for_calls(1);

        h.camera.stop();
        h.camera.start().unwrap();
        release.send(()).unwrap();

        assert_eq!(cycle.join().unwrap(), Err(ScheduleError::Discarded));
        assert_eq!(h.store.snapshot().last_error, None);

        release.send(()).unwrap();
        h.scheduler.capture_once().unwrap();
        assert!(h.store.snapshot().last_result.is_some());
    }

    #[test]
    fn test_upload_needs_no_camera() {
        let h = harness(StubClient::answering(vec![Ok(result(3))]));

        let detected = h.scheduler.detect_upload(png_upload()).unwrap();

        assert_eq!(detected.total_faces, 3);
        assert_eq!(h.store.snapshot().last_result, Some(detected));
    }

    #[test]
    fn test_rejected_upload_records_invalid_input() {
        let h = harness(StubClient::default());

        let err = h
            .scheduler
            .detect_upload(UploadedFile::new(b"hello".to_vec(), "text/plain"))
            .unwrap_err();

        let ScheduleError::Failed(error) = err else {
            panic!("expected classified failure, got {err:?}");
        };
        assert_eq!(error.kind, ErrorKind::InvalidInput);
        assert_eq!(h.store.snapshot().last_error, Some(error));
        assert_eq!(h.client.calls(), 0);
    }

    #[test]
    fn test_three_ticks_give_three_sequential_attempts() {
        let h = streaming(StubClient::slow(Duration::from_millis(5)));
        let (tx, ticks) = crossbeam_channel::unbounded();
        for _ in 0..3 {
            tx.send(Instant::now()).unwrap();
        }
        drop(tx);

        h.scheduler.start_polling_with(ticks).unwrap();
        while h.scheduler.is_polling() {
            thread::yield_now();
        }
        h.scheduler.join_polling();

        assert_eq!(h.client.calls(), 3);
        assert_eq!(h.client.max_in_flight.load(Ordering::SeqCst), 1);
        let state = h.store.snapshot();
        assert!(!state.polling);
        assert!(state.last_result.is_some());
    }

    #[test]
    fn test_interval_polling_runs_sequential_attempts() {
        let h = streaming(StubClient::slow(Duration::from_millis(5)));

        h.scheduler
            .start_polling_every(Duration::from_millis(20))
            .unwrap();
        let deadline = Instant::now() + Duration::from_secs(10);
        while h.client.calls() < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        h.scheduler.stop_polling();
        h.scheduler.join_polling();

        assert!(h.client.calls() >= 3);
        assert_eq!(h.client.max_in_flight.load(Ordering::SeqCst), 1);
        let state = h.store.snapshot();
        assert!(!state.polling);
        assert!(!state.processing);
        assert!(state.last_result.is_some());
        assert_eq!(state.last_error, None);
    }

    #[test]
    fn test_stop_polling_is_idempotent() {
        let h = streaming(StubClient::default());
        h.scheduler
            .start_polling_every(Duration::from_secs(3600))
            .unwrap();
        assert!(h.store.snapshot().polling);

        h.scheduler.stop_polling();
        let after_first = h.store.snapshot();
        h.scheduler.stop_polling();

        assert_eq!(h.store.snapshot(), after_first);
        assert!(!after_first.polling);
        h.scheduler.join_polling();
        assert_eq!(h.client.calls(), 0);
    }

    #[test]
    fn test_start_polling_requires_streaming() {
        let h = harness(StubClient::default());
        assert_eq!(
            h.scheduler.start_polling(),
            Err(ScheduleError::NotStreaming)
        );
        let state = h.store.snapshot();
        assert!(!state.polling);
        assert_eq!(
            state.last_error.map(|e| e.message),
            Some(CAMERA_NOT_STARTED.to_string())
        );
    }

    #[test]
    fn test_camera_stop_ends_polling() {
        let h = streaming(StubClient::default());
        let (tx, ticks) = crossbeam_channel::unbounded::<Instant>();
        h.scheduler.start_polling_with(ticks).unwrap();

        h.camera.stop();
        h.scheduler.join_polling();

        assert!(!h.scheduler.is_polling());
        assert!(!h.store.snapshot().polling);
        drop(tx);
    }

    #[test]
    fn test_tick_while_in_flight_is_skipped() {
        let (client, release) = StubClient::gated();
        let h = streaming(client);
        let scheduler = h.scheduler.clone();
        let cycle = thread::spawn(move || scheduler.capture_once());
        h.client.wait_for_calls(1);

        assert_eq!(h.scheduler.poll_tick(), TickOutcome::SkippedBusy);

        release.send(()).unwrap();
        cycle.join().unwrap().unwrap();
        assert_eq!(h.client.calls(), 1);
    }

    #[test]
    fn test_tick_without_stream_ends_loop() {
        let h = harness(StubClient::default());
        assert_eq!(h.scheduler.poll_tick(), TickOutcome::StreamEnded);
        assert_eq!(h.store.snapshot().last_error, None);
    }

    /// Attaches fine but never starts playing.
    struct PausedDevice;

    struct PausedStream;

    impl LiveStream for PausedStream {
        fn wait_ready(&mut self, _timeout: Duration) -> Result<StreamMetadata, DeviceFailure> {
            Ok(StreamMetadata {
                width: 640,
                height: 480,
            })
        }

        fn play(&mut self) -> Result<(), DeviceFailure> {
            Ok(())
        }

        fn metadata(&self) -> Option<StreamMetadata> {
            None
        }

        fn is_playing(&self) -> bool {
            false
        }

        fn grab(&mut self) -> Result<Frame, DeviceFailure> {
            Err(DeviceFailure::new("InvalidStateError", "paused"))
        }

        fn stop(&mut self) {}
    }

    impl CameraDevice for PausedDevice {
        fn open(
            &mut self,
            _constraints: &StreamConstraints,
        ) -> Result<Box<dyn LiveStream>, DeviceFailure> {
            Ok(Box::new(PausedStream))
        }
    }

    #[test]
    fn test_tick_on_unready_stream_is_skipped_silently() {
        let h = harness_with(
            Box::new(PausedDevice),
            StubClient::default(),
            SessionConfig::default(),
        );
        h.camera.start().unwrap();

        assert_eq!(h.scheduler.poll_tick(), TickOutcome::SkippedNotReady);

        let state = h.store.snapshot();
        assert_eq!(state.last_error, None);
        assert!(!state.processing);
        assert_eq!(h.client.calls(), 0);
    }
}
