use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// An encoded still image ready for transmission.
///
/// Produced fresh by every capture, regardless of whether it came from a live
/// stream or an uploaded file, and dropped once it has been sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFrame {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    mime_type: &'static str,
}

impl RawFrame {
    pub fn new(bytes: Vec<u8>, width: u32, height: u32, mime_type: &'static str) -> Self {
        Self {
            bytes,
            width,
            height,
            mime_type,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `data:<mime>;base64,<payload>`, the form the detection backend accepts.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            STANDARD.encode(&self.bytes)
        )
    }
}
