/// A single decoded frame sampled from a live stream: contiguous RGB24 bytes
/// in row-major order.
///
/// Frames exist only between sampling and encoding; nothing downstream of the
/// capturer sees decoded pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: u64,
}

pub const RGB_CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: u64) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * RGB_CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// Builds a frame filled with a single colour.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3], index: u64) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * RGB_CHANNELS)
            .collect();
        Self::new(data, width, height, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sequence number assigned by the stream that produced this frame.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
