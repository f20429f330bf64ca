use crate::camera::domain::camera_device::DeviceFailure;
use crate::capture::frame_capturer::CaptureError;
use crate::detection::domain::detection_client::DetectError;
use crate::errors::classified_error::{ClassifiedError, ErrorKind};
use crate::errors::failure::Failure;

/// One step of the substring matcher: any needle found in the lowercased
/// failure text selects `kind`.
struct Rule {
    kind: ErrorKind,
    needles: &'static [&'static str],
    message: &'static str,
}

/// Checked in order; the first match wins.
const DEVICE_RULES: &[Rule] = &[
    Rule {
        kind: ErrorKind::PermissionDenied,
        needles: &["notallowederror", "securityerror", "permission", "access denied"],
        message: "Camera permission denied. Please allow camera access and try again.",
    },
    Rule {
        kind: ErrorKind::DeviceNotFound,
        needles: &[
            "notfounderror",
            "not found",
            "no such file",
            "no such device",
            "no devices",
            "no capture device",
        ],
        message: "No camera found. Please connect a camera and try again.",
    },
    Rule {
        kind: ErrorKind::DeviceBusy,
        needles: &["notreadableerror", "trackstarterror", "in use", "busy"],
        message: "Camera is being used by another application. Please close other apps using the camera.",
    },
    Rule {
        kind: ErrorKind::UnsupportedConstraints,
        needles: &["overconstrainederror", "overconstrained", "constraint", "invalid argument"],
        message: "Camera doesn't support the requested settings.",
    },
];

const NETWORK_NEEDLES: &[&str] = &[
    "failed to fetch",
    "network",
    "connection",
    "connect",
    "refused",
    "unreachable",
    "timed out",
    "timeout",
    "dns",
];

const SERVER_NEEDLES: &[&str] = &["status", "http", "server"];

const MALFORMED_NEEDLES: &[&str] = &[
    "invalid response",
    "malformed",
    "missing field",
    "expected value",
    "unexpected end",
    "json",
];

const NETWORK_MESSAGE: &str =
    "Cannot connect to the detection backend. Make sure the backend server is running.";

/// Maps any raw failure onto exactly one [`ClassifiedError`].
///
/// Typed failures map directly. Untyped device errors go through the device
/// rules: permission, not-found, busy, overconstrained, then generic device.
/// Free-form messages try the device rules only when they carry no HTTP
/// status, then network, server status, malformed response, and finally
/// `Unexpected` with the original text.
pub fn classify(failure: &Failure) -> ClassifiedError {
    match failure {
        Failure::Device(device) => classify_device(device),
        Failure::Capture(capture) => classify_capture(capture),
        Failure::Detect(detect) => classify_detect(detect),
        Failure::Other(message) => classify_message(message),
    }
}

fn classify_device(failure: &DeviceFailure) -> ClassifiedError {
    let text = format!("{} {}", failure.name, failure.message).to_lowercase();
    match_device_rules(&text).unwrap_or_else(|| {
        ClassifiedError::new(
            ErrorKind::DeviceGenericFailure,
            format!("Failed to access camera: {}", failure.message),
        )
    })
}

fn classify_capture(failure: &CaptureError) -> ClassifiedError {
    match failure {
        CaptureError::Device(device) => classify_device(device),
        CaptureError::InvalidInput(message) => {
            ClassifiedError::new(ErrorKind::InvalidInput, message.clone())
        }
        CaptureError::Unavailable(message) => {
            ClassifiedError::new(ErrorKind::DeviceGenericFailure, message.clone())
        }
        CaptureError::Encode(message) => ClassifiedError::new(
            ErrorKind::DeviceGenericFailure,
            format!("Failed to capture frame: {message}"),
        ),
    }
}

fn classify_detect(failure: &DetectError) -> ClassifiedError {
    match failure {
        DetectError::Network(_) | DetectError::Timeout(_) => {
            ClassifiedError::new(ErrorKind::NetworkUnreachable, NETWORK_MESSAGE)
        }
        DetectError::Server { status, .. } => server_error(*status),
        DetectError::Protocol(detail) => malformed(detail),
    }
}

/// A message carrying an HTTP status never reaches the device rules, so
/// "HTTP 404 Not Found" or "Server busy (HTTP 503)" stay server errors.
fn classify_message(message: &str) -> ClassifiedError {
    let text = message.to_lowercase();
    let status = server_status(&text);
    if status.is_none() {
        if let Some(classified) = match_device_rules(&text) {
            return classified;
        }
    }
    if contains_any(&text, NETWORK_NEEDLES) {
        return ClassifiedError::new(ErrorKind::NetworkUnreachable, NETWORK_MESSAGE);
    }
    if let Some(status) = status {
        return server_error(status);
    }
    if contains_any(&text, MALFORMED_NEEDLES) {
        return malformed(message);
    }
    ClassifiedError::new(ErrorKind::Unexpected, format!("Unexpected error: {message}"))
}

fn match_device_rules(text: &str) -> Option<ClassifiedError> {
    DEVICE_RULES
        .iter()
        .find(|rule| contains_any(text, rule.needles))
        .map(|rule| ClassifiedError::new(rule.kind, rule.message))
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

/// First three-digit 4xx/5xx code in a message that mentions a status, or
/// the code of a `": 503 Service Unavailable"` status line.
fn server_status(text: &str) -> Option<u16> {
    if !contains_any(text, SERVER_NEEDLES) {
        return status_line(text);
    }
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|token| token.len() == 3)
        .filter_map(|token| token.parse::<u16>().ok())
        .find(|status| is_error_status(*status))
}

fn status_line(text: &str) -> Option<u16> {
    text.split(": ").skip(1).find_map(|rest| {
        let code = rest.get(..3)?;
        let tail = rest.get(3..)?;
        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !(tail.is_empty() || tail.starts_with(' ')) {
            return None;
        }
        code.parse::<u16>().ok().filter(|status| is_error_status(*status))
    })
}

fn is_error_status(status: u16) -> bool {
    (400..=599).contains(&status)
}

fn server_error(status: u16) -> ClassifiedError {
    ClassifiedError::new(
        ErrorKind::ServerError { status },
        format!("Failed to process image: the detection server returned HTTP {status}"),
    )
}

fn malformed(detail: &str) -> ClassifiedError {
    ClassifiedError::new(
        ErrorKind::MalformedResponse,
        format!("Invalid response from server: {detail}"),
    )
}
