//! Session context: the durable resources behind every operation.
//!
//! Opened once at startup, fail-fast: if the store, the detector model,
//! or the recognizer artifact cannot be loaded, the process exits before
//! any menu is shown. The camera and keyboard are NOT held here — each
//! pipeline opens them on entry and releases them on every exit path.

use crate::config::Config;
use crate::enroll::{run_enroll, EnrollOutcome};
use crate::error::PipelineError;
use crate::recognize::{run_mark, MarkOutcome};
use rollcall_core::{LbphRecognizer, ScrfdDetector};
use rollcall_hw::{Camera, Keyboard};
use rollcall_store::{AttendanceStore, IdentityCache};

pub struct Session {
    config: Config,
    store: AttendanceStore,
    cache: IdentityCache,
    detector: ScrfdDetector,
    recognizer: LbphRecognizer,
}

impl Session {
    /// Open the store, hydrate the identity cache, and load the models.
    pub fn open(config: Config) -> Result<Self, PipelineError> {
        let store = AttendanceStore::open(&config.db_path)?;
        let cache = IdentityCache::hydrate(&store)?;
        let detector = ScrfdDetector::load(&config.detector_model_path())?;
        let recognizer = LbphRecognizer::load_or_empty(&config.recognizer_path)?;

        tracing::info!(
            identities = cache.len(),
            observations = recognizer.observations(),
            "session ready"
        );

        // Identities registered but never trained (e.g. aborted
        // enrollments) can never be recognized until re-enrolled.
        let trained = recognizer.identities();
        for user in store.list_users()? {
            if !trained.contains(&user.id) {
                tracing::warn!(user_id = user.id, name = %user.name, "identity has no trained samples");
            }
        }

        Ok(Self { config, store, cache, detector, recognizer })
    }

    /// Enroll a new identity: register, capture samples, train, persist.
    pub fn register(&mut self, name: &str) -> Result<(), PipelineError> {
        let camera = Camera::open(&self.config.camera_device)?;
        let mut frames = camera.stream()?;
        let mut keyboard = Keyboard::open()?;

        let outcome = run_enroll(
            name,
            &mut frames,
            &mut keyboard,
            &mut self.detector,
            &mut self.recognizer,
            &self.store,
            &mut self.cache,
            self.config.sample_target,
            &self.config.recognizer_path,
        )?;

        if let EnrollOutcome::Aborted { user_id, captured } = outcome {
            tracing::info!(user_id, captured, "enrollment aborted by operator");
        }
        Ok(())
    }

    /// Run the recognition loop and mark attendance on operator signal.
    pub fn mark(&mut self) -> Result<(), PipelineError> {
        let camera = Camera::open(&self.config.camera_device)?;
        let mut frames = camera.stream()?;
        let mut keyboard = Keyboard::open()?;

        let outcome = run_mark(
            &mut frames,
            &mut keyboard,
            &mut self.detector,
            &mut self.recognizer,
            &self.store,
            &self.cache,
            self.config.distance_threshold,
        )?;

        if outcome == MarkOutcome::Cancelled {
            println!("No attendance marked");
        }
        Ok(())
    }

    /// Print the attendance report, most recent check-in first.
    pub fn view(&self) -> Result<(), PipelineError> {
        let records = self.store.list_attendance()?;
        if records.is_empty() {
            println!("No attendance records yet");
            return Ok(());
        }
        println!("{:<24} | Check-in Time", "Name");
        println!("{}", "-".repeat(48));
        for record in records {
            println!("{:<24} | {}", record.name, record.check_in);
        }
        Ok(())
    }
}
