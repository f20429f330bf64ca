use serde::Serialize;

/// Closed set of user-meaningful failure states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ErrorKind {
    PermissionDenied,
    DeviceNotFound,
    DeviceBusy,
    UnsupportedConstraints,
    DeviceGenericFailure,
    InvalidInput,
    NetworkUnreachable,
    ServerError { status: u16 },
    MalformedResponse,
    Unexpected,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::PermissionDenied => write!(f, "permission denied"),
            ErrorKind::DeviceNotFound => write!(f, "device not found"),
            ErrorKind::DeviceBusy => write!(f, "device busy"),
            ErrorKind::UnsupportedConstraints => write!(f, "unsupported constraints"),
            ErrorKind::DeviceGenericFailure => write!(f, "device failure"),
            ErrorKind::InvalidInput => write!(f, "invalid input"),
            ErrorKind::NetworkUnreachable => write!(f, "network unreachable"),
            ErrorKind::ServerError { status } => write!(f, "server error ({status})"),
            ErrorKind::MalformedResponse => write!(f, "malformed response"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// A failure after classification: what went wrong, phrased for the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ClassifiedError {}
