use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// One face box with its mask classification, in source-image pixels
/// (origin top-left).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub has_mask: bool,
    pub confidence: f64,
}

impl Detection {
    pub fn label(&self) -> &'static str {
        if self.has_mask {
            "Mask"
        } else {
            "No Mask"
        }
    }
}

/// What the backend returned for one frame.
///
/// `total_faces` is whatever the backend asserts; it is never recomputed from
/// `detections`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
    /// Annotated image as sent by the backend, usually a JPEG data URL.
    pub encoded_image: String,
    pub total_faces: u32,
}

impl DetectionResult {
    pub fn masked_count(&self) -> usize {
        self.detections.iter().filter(|d| d.has_mask).count()
    }

    pub fn unmasked_count(&self) -> usize {
        self.detections.iter().filter(|d| !d.has_mask).count()
    }

    /// Decodes the annotated image into raw bytes. Accepts both data URLs and
    /// bare base64.
    pub fn annotated_image_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let payload = match self.encoded_image.split_once(',') {
            Some((_, data)) => data,
            None => self.encoded_image.as_str(),
        };
        STANDARD.decode(payload.trim())
    }
}
