use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::camera::domain::camera_device::{
    CameraDevice, DeviceFailure, LiveStream, StreamConstraints, StreamMetadata,
};
use crate::shared::frame::{Frame, RGB_CHANNELS};

/// Opens capture devices through libavdevice (v4l2, AVFoundation, DirectShow).
///
/// With no input format the source is handed to libavformat as a plain URL,
/// so image and video files work too.
pub struct FfmpegCameraDevice {
    source: String,
    input_format: Option<String>,
}

impl FfmpegCameraDevice {
    pub fn new(source: impl Into<String>, input_format: Option<String>) -> Self {
        Self {
            source: source.into(),
            input_format,
        }
    }

    /// The platform's first video capture device.
    pub fn system_default() -> Self {
        #[cfg(target_os = "linux")]
        let (source, format) = ("/dev/video0", "video4linux2");
        #[cfg(target_os = "macos")]
        let (source, format) = ("0", "avfoundation");
        #[cfg(target_os = "windows")]
        let (source, format) = ("video=Integrated Camera", "dshow");
        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        let (source, format) = ("/dev/video0", "video4linux2");

        Self::new(source, Some(format.to_string()))
    }

    /// Any file libavformat can demux, played as if it were a camera.
    pub fn from_path(path: &Path) -> Self {
        Self::new(path.to_string_lossy(), None)
    }

    fn open_input(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<ffmpeg_next::format::context::Input, DeviceFailure> {
        ffmpeg_next::init().map_err(ffmpeg_failure)?;

        let Some(format_name) = self.input_format.as_deref() else {
            return ffmpeg_next::format::input(&self.source).map_err(ffmpeg_failure);
        };

        ffmpeg_next::device::register_all();
        let format = ffmpeg_next::device::input::video()
            .find(|f| f.name() == format_name)
            .ok_or_else(|| {
                DeviceFailure::new(
                    "NotFoundError",
                    format!("No capture device backend named '{format_name}'"),
                )
            })?;

        let mut options = ffmpeg_next::Dictionary::new();
        if let (Some(width), Some(height)) = (constraints.ideal_width, constraints.ideal_height) {
            options.set("video_size", &format!("{width}x{height}"));
        }

        let context = ffmpeg_next::format::open_with(&self.source, &format, options)
            .map_err(ffmpeg_failure)?;
        Ok(context.input())
    }
}

impl CameraDevice for FfmpegCameraDevice {
    fn open(
        &mut self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn LiveStream>, DeviceFailure> {
        let ictx = self.open_input(constraints)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| DeviceFailure::new("NotFoundError", "No video track found"))?;
        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(ffmpeg_failure)?;
        let decoder = codec_ctx.decoder().video().map_err(ffmpeg_failure)?;

        log::info!(
            "Opened video source {} ({})",
            self.source,
            self.input_format.as_deref().unwrap_or("auto")
        );

        Ok(Box::new(FfmpegLiveStream::spawn(Decoding {
            ictx,
            decoder,
            scaler: None,
            stream_index,
            eof: false,
        })))
    }
}

struct Decoding {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    stream_index: usize,
    eof: bool,
}

// Safety: a Decoding is moved into its reader thread once and only used there.
unsafe impl Send for Decoding {}

impl Decoding {
    /// Decodes the next picture, or `None` once the source is exhausted.
    fn next_pixels(&mut self) -> Result<Option<(Vec<u8>, u32, u32)>, DeviceFailure> {
        loop {
            let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return self.convert(&decoded).map(Some);
            }
            if self.eof {
                return Ok(None);
            }

            match self.ictx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::debug!("Dropping undecodable packet: {e}");
                    }
                }
                None => {
                    let _ = self.decoder.send_eof();
                    self.eof = true;
                }
            }
        }
    }

    fn convert(
        &mut self,
        decoded: &ffmpeg_next::util::frame::video::Video,
    ) -> Result<(Vec<u8>, u32, u32), DeviceFailure> {
        let (width, height) = (decoded.width(), decoded.height());
        if self.scaler.is_none() {
            let scaler = ffmpeg_next::software::scaling::Context::get(
                decoded.format(),
                width,
                height,
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            )
            .map_err(ffmpeg_failure)?;
            self.scaler = Some(scaler);
        }
        let Some(scaler) = self.scaler.as_mut() else {
            return Err(DeviceFailure::new("FfmpegError", "scaler unavailable"));
        };

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(decoded, &mut rgb_frame).map_err(ffmpeg_failure)?;
        Ok((extract_rgb_pixels(&rgb_frame, width, height), width, height))
    }
}

/// How long `stop` waits for the reader to let go of the device.
const RELEASE_TIMEOUT: Duration = Duration::from_secs(1);

/// Newest decoded picture, shared between the reader thread and the stream.
#[derive(Default)]
struct LatestFrame {
    frame: Option<Frame>,
    failure: Option<DeviceFailure>,
}

type ReadySignal = Result<StreamMetadata, DeviceFailure>;

/// A decoding session on an opened source.
///
/// A reader thread decodes continuously and keeps only the newest picture, so
/// a grab sees the current frame rather than the next one queued in the
/// demuxer. When a file-backed source runs out of pictures the last one is
/// held, which makes a single image behave like a paused camera.
pub struct FfmpegLiveStream {
    latest: Arc<Mutex<LatestFrame>>,
    ready_rx: Receiver<ReadySignal>,
    reader_done: Receiver<()>,
    cancelled: Arc<AtomicBool>,
    metadata: Option<StreamMetadata>,
    playing: bool,
    stopped: bool,
    next_index: u64,
}

impl FfmpegLiveStream {
    fn spawn(decoding: Decoding) -> Self {
        let latest = Arc::new(Mutex::new(LatestFrame::default()));
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);
        let (done_tx, reader_done) = crossbeam_channel::bounded::<()>(0);
        let cancelled = Arc::new(AtomicBool::new(false));

        let reader_latest = latest.clone();
        let reader_cancelled = cancelled.clone();
        thread::spawn(move || {
            run_reader(decoding, &reader_latest, &ready_tx, &reader_cancelled);
            drop(done_tx);
        });

        Self::from_parts(latest, ready_rx, reader_done, cancelled)
    }

    fn from_parts(
        latest: Arc<Mutex<LatestFrame>>,
        ready_rx: Receiver<ReadySignal>,
        reader_done: Receiver<()>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            latest,
            ready_rx,
            reader_done,
            cancelled,
            metadata: None,
            playing: false,
            stopped: false,
            next_index: 0,
        }
    }

    fn ensure_running(&self) -> Result<(), DeviceFailure> {
        if self.stopped {
            return Err(DeviceFailure::new(
                "InvalidStateError",
                "The stream has been stopped",
            ));
        }
        Ok(())
    }
}

fn lock_latest(latest: &Mutex<LatestFrame>) -> MutexGuard<'_, LatestFrame> {
    latest.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decodes until cancelled or the source ends, overwriting the shared frame.
/// The first picture (or the failure to get one) is announced on `ready_tx`.
fn run_reader(
    mut decoding: Decoding,
    latest: &Mutex<LatestFrame>,
    ready_tx: &Sender<ReadySignal>,
    cancelled: &AtomicBool,
) {
    let mut announced = false;
    while !cancelled.load(Ordering::Relaxed) {
        match decoding.next_pixels() {
            Ok(Some((pixels, width, height))) => {
                lock_latest(latest).frame = Some(Frame::new(pixels, width, height, 0));
                if !announced {
                    announced = true;
                    let _ = ready_tx.send(Ok(StreamMetadata { width, height }));
                }
            }
            Ok(None) => {
                if !announced {
                    let _ = ready_tx.send(Err(DeviceFailure::new(
                        "NotReadableError",
                        "Video source ended before producing a frame",
                    )));
                }
                break;
            }
            Err(failure) => {
                log::warn!("Video source failed: {failure}");
                if announced {
                    lock_latest(latest).failure = Some(failure);
                } else {
                    let _ = ready_tx.send(Err(failure));
                }
                break;
            }
        }
    }
    log::debug!("Released video source");
}

impl LiveStream for FfmpegLiveStream {
    fn wait_ready(&mut self, timeout: Duration) -> Result<StreamMetadata, DeviceFailure> {
        self.ensure_running()?;
        if let Some(metadata) = self.metadata {
            return Ok(metadata);
        }
        match self.ready_rx.recv_timeout(timeout) {
            Ok(Ok(metadata)) => {
                self.metadata = Some(metadata);
                Ok(metadata)
            }
            Ok(Err(failure)) => Err(failure),
            Err(RecvTimeoutError::Timeout) => Err(DeviceFailure::new(
                "TimeoutError",
                format!("Video source did not produce a frame within {timeout:?}"),
            )),
            Err(RecvTimeoutError::Disconnected) => Err(DeviceFailure::new(
                "NotReadableError",
                "Video reader exited before producing a frame",
            )),
        }
    }

    fn play(&mut self) -> Result<(), DeviceFailure> {
        self.ensure_running()?;
        self.playing = true;
        Ok(())
    }

    fn metadata(&self) -> Option<StreamMetadata> {
        if self.stopped {
            return None;
        }
        self.metadata.or_else(|| {
            lock_latest(&self.latest).frame.as_ref().map(|f| StreamMetadata {
                width: f.width(),
                height: f.height(),
            })
        })
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn grab(&mut self) -> Result<Frame, DeviceFailure> {
        self.ensure_running()?;
        let frame = {
            let latest = lock_latest(&self.latest);
            if let Some(failure) = &latest.failure {
                return Err(failure.clone());
            }
            let newest = latest
                .frame
                .as_ref()
                .ok_or_else(|| DeviceFailure::new("NotReadableError", "No frame decoded yet"))?;
            Frame::new(
                newest.data().to_vec(),
                newest.width(),
                newest.height(),
                self.next_index,
            )
        };
        self.next_index += 1;
        Ok(frame)
    }

    fn stop(&mut self) {
        self.playing = false;
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.cancelled.store(true, Ordering::Relaxed);
        if let Err(RecvTimeoutError::Timeout) = self.reader_done.recv_timeout(RELEASE_TIMEOUT) {
            log::warn!("Video reader still busy after {RELEASE_TIMEOUT:?}, detaching it");
        }
        lock_latest(&self.latest).frame = None;
    }
}

impl Drop for FfmpegLiveStream {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

fn ffmpeg_failure(err: ffmpeg_next::Error) -> DeviceFailure {
    DeviceFailure::new("FfmpegError", err.to_string())
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_len = width as usize * RGB_CHANNELS;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(row_len * h);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_len]);
    }
    pixels
}
