pub mod detection_client;
pub mod detection_result;
