pub mod classified_error;
pub mod error_classifier;
pub mod failure;
