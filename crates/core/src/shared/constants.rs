use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const API_URL_ENV: &str = "MASKWATCH_API_URL";

pub const HEALTH_PATH: &str = "/health";
pub const DETECT_PATH: &str = "/detect-base64";

/// Upper bound for a single detection request; also caps how long the
/// processing flag can stay set.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long `start()` waits for a freshly attached stream to report frame
/// dimensions.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// JPEG quality on the `image` crate's 1-100 scale (≈0.8).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const IDEAL_WIDTH: u32 = 1280;
pub const IDEAL_HEIGHT: u32 = 720;

pub const JPEG_MIME: &str = "image/jpeg";
