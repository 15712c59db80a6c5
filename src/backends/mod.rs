//! Backend implementations.

pub mod cloud;
pub mod whisper_local;

pub use cloud::{CloudDiarizeBackend, CloudWhisperBackend};
pub use whisper_local::WhisperLocalBackend;
