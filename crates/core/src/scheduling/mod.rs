pub mod detection_scheduler;
pub mod poll_handle;
