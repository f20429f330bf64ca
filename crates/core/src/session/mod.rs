pub mod mask_session;
pub mod session_state;
pub mod session_store;
