use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("display name must not be empty")]
    EmptyName,
    #[error("camera error: {0}")]
    Camera(#[from] rollcall_hw::CameraError),
    #[error("console error: {0}")]
    Console(#[from] rollcall_hw::ConsoleError),
    #[error("detector error: {0}")]
    Detector(#[from] rollcall_core::detector::DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] rollcall_core::recognizer::RecognizerError),
    #[error("store error: {0}")]
    Store(#[from] rollcall_store::StoreError),
}
