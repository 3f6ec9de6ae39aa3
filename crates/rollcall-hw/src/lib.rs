//! rollcall-hw — Hardware and operator-input abstraction.
//!
//! V4L2 camera access for the live frame stream and a raw-mode terminal
//! keyboard for the discrete operator signals that drive the pipelines.

pub mod camera;
pub mod console;
pub mod frame;

pub use camera::{Camera, CameraError, CameraStream, PixelFormat};
pub use console::{ConsoleError, KeySignal, Keyboard, SignalSource};
pub use frame::{Frame, FrameSource};
