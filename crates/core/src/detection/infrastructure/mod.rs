pub mod http_detection_client;
