//! # ONNX Runtime
//!
//! Session creation with accelerator fallback.

pub mod providers;

pub use providers::{create_session, fallback_chain, Provider};
