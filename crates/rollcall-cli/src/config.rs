use std::path::PathBuf;

/// Process configuration, loaded from `ROLLCALL_*` environment variables.
pub struct Config {
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Directory containing the detector ONNX model.
    pub model_dir: PathBuf,
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Path to the trained recognizer artifact.
    pub recognizer_path: PathBuf,
    /// Distance below which a match is accepted (lower = better).
    pub distance_threshold: f32,
    /// Samples required to complete an enrollment.
    pub sample_target: usize,
}

impl Config {
    /// Load configuration from the environment with defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("rollcall");

        let model_dir = std::env::var("ROLLCALL_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("models"));

        let db_path = std::env::var("ROLLCALL_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("attendance.db"));

        let recognizer_path = std::env::var("ROLLCALL_RECOGNIZER_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("recognizer.json"));

        Self {
            camera_device: std::env::var("ROLLCALL_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            model_dir,
            db_path,
            recognizer_path,
            distance_threshold: env_f32(
                "ROLLCALL_DISTANCE_THRESHOLD",
                rollcall_core::DISTANCE_THRESHOLD,
            ),
            sample_target: env_usize("ROLLCALL_SAMPLE_TARGET", 20),
        }
    }

    /// Path to the SCRFD detection model.
    pub fn detector_model_path(&self) -> String {
        self.model_dir.join("det_10g.onnx").to_string_lossy().into_owned()
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
