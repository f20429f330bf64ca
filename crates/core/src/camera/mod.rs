pub mod camera_session;
pub mod domain;
pub mod infrastructure;
