pub mod frame_capturer;
pub mod frame_source;
