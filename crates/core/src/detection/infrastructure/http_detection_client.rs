use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detection::domain::detection_client::{DetectError, DetectionClient};
use crate::detection::domain::detection_result::{Detection, DetectionResult};
use crate::shared::config::SessionConfig;
use crate::shared::constants::{DETECT_PATH, HEALTH_PATH};
use crate::shared::raw_frame::RawFrame;

#[derive(Serialize)]
struct DetectRequest<'a> {
    image: &'a str,
}

/// Wire shape of `/detect-base64`. `detections` stays optional so a missing
/// field can be reported as a protocol error instead of a serde message.
#[derive(Deserialize)]
struct DetectResponse {
    detections: Option<Vec<Detection>>,
    #[serde(default)]
    image: String,
    #[serde(default)]
    total_faces: u32,
}

/// Talks to the mask-detection backend over blocking HTTP/JSON.
pub struct HttpDetectionClient {
    http: reqwest::blocking::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpDetectionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, reqwest::Error> {
        Self::new(&config.api_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, err: reqwest::Error) -> DetectError {
        if err.is_timeout() {
            DetectError::Timeout(self.timeout)
        } else {
            DetectError::Network(error_chain(&err))
        }
    }
}

impl DetectionClient for HttpDetectionClient {
    fn detect(&self, frame: &RawFrame) -> Result<DetectionResult, DetectError> {
        let image = frame.to_data_url();
        log::debug!(
            "Sending {} byte frame ({}x{}) to {}",
            frame.len(),
            frame.width(),
            frame.height(),
            self.base_url
        );

        let response = self
            .http
            .post(self.endpoint(DETECT_PATH))
            .json(&DetectRequest { image: &image })
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(DetectError::Server {
                status: status.as_u16(),
                body,
            });
        }
        parse_detect_response(&body)
    }

    fn health(&self) -> Result<(), DetectError> {
        let response = self
            .http
            .get(self.endpoint(HEALTH_PATH))
            .send()
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if status == reqwest::StatusCode::OK {
            return Ok(());
        }
        Err(DetectError::Server {
            status: status.as_u16(),
            body: response.text().unwrap_or_default(),
        })
    }
}

fn parse_detect_response(body: &str) -> Result<DetectionResult, DetectError> {
    let parsed: DetectResponse =
        serde_json::from_str(body).map_err(|e| DetectError::Protocol(e.to_string()))?;
    let detections = parsed
        .detections
        .ok_or_else(|| DetectError::Protocol("missing 'detections' field".to_string()))?;
    Ok(DetectionResult {
        detections,
        encoded_image: parsed.image,
        total_faces: parsed.total_faces,
    })
}

/// reqwest's top-level message hides the cause ("error sending request");
/// the classifier needs the whole chain.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
