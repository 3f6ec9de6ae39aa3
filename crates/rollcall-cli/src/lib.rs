//! rollcall-cli — session wiring and the two operator pipelines.
//!
//! The binary in `main.rs` is a thin driver: configuration comes from the
//! environment, the [`session::Session`] context object owns the durable
//! resources, and the pipelines in [`enroll`] and [`recognize`] are
//! generic over frame/signal/detector/recognizer seams so the decision
//! logic runs the same under a camera or a scripted test double.

pub mod config;
pub mod enroll;
pub mod error;
pub mod recognize;
pub mod session;
