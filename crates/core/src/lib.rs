pub mod camera;
pub mod capture;
pub mod detection;
pub mod errors;
pub mod scheduling;
pub mod session;
pub mod shared;
