// src/session.rs
// Per-user view-model: everything the front-end renders, with explicit mutations.
use crate::catalog::Catalog;
use crate::errors::MockitError;
use crate::models::{GenerationTask, LoadingState, Logo, Mockup};
use crate::pipeline::{SelectionMatrix, expand_selections};
use crate::services::ImageProcessor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const NO_LOGO_MESSAGE: &str = "Please upload a logo first.";
pub const NO_PLACEMENTS_MESSAGE: &str = "Please select at least one placement option.";
pub const BUSY_MESSAGE: &str = "A generation is already in progress.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub logo: Option<Logo>,
    pub selection: SelectionMatrix,
    pub loading: LoadingState,
    pub error: Option<String>,
    pub mockups: Vec<Mockup>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sessions with a batch running in this process. At most one batch per session.
#[derive(Debug, Clone, Default)]
pub struct ActiveBatches {
    running: Arc<Mutex<HashSet<Uuid>>>,
}

/// Held for the lifetime of a batch; releases the session on drop.
#[derive(Debug)]
pub struct BatchGuard {
    session_id: Uuid,
    running: Arc<Mutex<HashSet<Uuid>>>,
}

impl ActiveBatches {
    /// Claim the session for a new batch. `None` if one is already running.
    pub fn try_acquire(&self, session_id: Uuid) -> Option<BatchGuard> {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if !running.insert(session_id) {
            return None;
        }
        Some(BatchGuard {
            session_id,
            running: Arc::clone(&self.running),
        })
    }

    pub fn is_running(&self, session_id: &Uuid) -> bool {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(session_id)
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.session_id);
    }
}

/// What a batch needs once the session has accepted it.
#[derive(Debug)]
pub struct Batch {
    pub logo: String,
    pub tasks: Vec<GenerationTask>,
}

impl Session {
    pub fn new(catalog: &Catalog) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            logo: None,
            selection: SelectionMatrix::for_catalog(catalog),
            loading: LoadingState::default(),
            error: None,
            mockups: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Replace the logo. Previous results, errors and selections are discarded.
    pub fn set_logo(&mut self, logo: Logo, catalog: &Catalog) {
        self.logo = Some(logo);
        self.mockups.clear();
        self.error = None;
        self.selection = SelectionMatrix::for_catalog(catalog);
        self.touch();
    }

    /// Validate an uploaded file and make it the logo. Rejected files leave the session untouched.
    pub fn accept_logo_upload(
        &mut self,
        processor: &ImageProcessor,
        catalog: &Catalog,
        filename: String,
        content_type: String,
        data: &[u8],
    ) -> Result<(), MockitError> {
        processor.validate_upload(&content_type, data.len())?;
        let logo = Logo {
            data_uri: processor.to_data_uri(&content_type, data),
            filename,
            content_type,
            size: data.len(),
        };
        self.set_logo(logo, catalog);
        Ok(())
    }

    /// Drop a loading state whose batch is no longer running, e.g. after a restart.
    pub fn clear_stale_loading(&mut self) -> bool {
        if !self.loading.active {
            return false;
        }
        self.loading = LoadingState::default();
        self.touch();
        true
    }

    pub fn toggle_placement(&mut self, product_id: &str, placement_id: &str) -> bool {
        let selected = self.selection.toggle(product_id, placement_id);
        self.touch();
        selected
    }

    /// Validate and enter the loading state. Rejections are recorded as the session error.
    pub fn start_generation(&mut self, catalog: &Catalog) -> Result<Batch, MockitError> {
        if self.loading.active {
            return Err(MockitError::Validation(BUSY_MESSAGE.to_string()));
        }
        let Some(logo) = self.logo.as_ref().map(|l| l.data_uri.clone()) else {
            return Err(self.reject(NO_LOGO_MESSAGE));
        };
        if self.selection.is_empty() {
            return Err(self.reject(NO_PLACEMENTS_MESSAGE));
        }
        let tasks = expand_selections(catalog, &self.selection);
        if tasks.is_empty() {
            return Err(self.reject(NO_PLACEMENTS_MESSAGE));
        }

        self.loading = LoadingState {
            active: true,
            progress: 0,
            total: tasks.len(),
            message: "Starting generation...".to_string(),
        };
        self.error = None;
        self.mockups.clear();
        self.touch();

        Ok(Batch { logo, tasks })
    }

    fn reject(&mut self, message: &str) -> MockitError {
        self.error = Some(message.to_string());
        self.touch();
        MockitError::Validation(message.to_string())
    }

    pub fn record_progress(&mut self, completed: usize, total: usize) {
        self.loading = LoadingState {
            active: true,
            progress: completed,
            total,
            message: format!("Generating mockup {} of {}...", completed, total),
        };
        self.touch();
    }

    /// Leave the loading state with the batch outcome. Partial success counts as success.
    pub fn finish(&mut self, outcome: Result<Vec<Mockup>, MockitError>) {
        match outcome {
            Ok(mockups) => self.mockups = mockups,
            Err(e) => {
                self.mockups.clear();
                self.error = Some(format!("Failed to generate mockups. {}", e));
            }
        }
        self.loading = LoadingState::default();
        self.touch();
    }

    pub fn clear_mockups(&mut self) {
        self.mockups.clear();
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ALL_FAILED_MESSAGE;
    use crate::services::image_processor::{DEFAULT_MAX_UPLOAD_BYTES, TOO_LARGE_MESSAGE};

    fn logo() -> Logo {
        Logo {
            filename: "logo.png".into(),
            content_type: "image/png".into(),
            size: 4,
            data_uri: "data:image/png;base64,AAAA".into(),
        }
    }

    fn mockup_for(catalog: &Catalog) -> Mockup {
        let product = catalog.products()[0].clone();
        Mockup {
            placement: product.placements[0].clone(),
            product,
            image_url: "data:image/png;base64,AAAA".into(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn generation_requires_a_logo() {
        let catalog = Catalog::builtin();
        let mut session = Session::new(&catalog);
        session.toggle_placement("cap", "front-panel");

        let err = session.start_generation(&catalog).unwrap_err();
        assert!(matches!(err, MockitError::Validation(_)));
        assert_eq!(session.error.as_deref(), Some(NO_LOGO_MESSAGE));
        assert!(!session.loading.active);
    }

    #[test]
    fn generation_requires_a_resolvable_selection() {
        let catalog = Catalog::builtin();
        let mut session = Session::new(&catalog);
        session.set_logo(logo(), &catalog);
        session.toggle_placement("cap", "no-such-placement");

        assert!(session.start_generation(&catalog).is_err());
        assert_eq!(session.error.as_deref(), Some(NO_PLACEMENTS_MESSAGE));
    }

    #[test]
    fn batch_lifecycle_updates_loading_state() {
        let catalog = Catalog::builtin();
        let mut session = Session::new(&catalog);
        session.set_logo(logo(), &catalog);
        session.toggle_placement("hoodie", "back-center");
        session.toggle_placement("t-shirt", "left-pocket");

        let batch = session.start_generation(&catalog).unwrap();
        assert_eq!(batch.tasks.len(), 2);
        assert_eq!(batch.tasks[0].product.id, "t-shirt");
        assert_eq!(batch.logo, "data:image/png;base64,AAAA");
        assert!(session.loading.active);
        assert_eq!(session.loading.total, 2);

        assert!(matches!(
            session.start_generation(&catalog),
            Err(MockitError::Validation(_))
        ));

        session.record_progress(1, 2);
        assert_eq!(session.loading.message, "Generating mockup 1 of 2...");

        session.finish(Ok(vec![mockup_for(&catalog)]));
        assert_eq!(session.loading, LoadingState::default());
        assert_eq!(session.mockups.len(), 1);
        assert!(session.error.is_none());
    }

    #[test]
    fn total_failure_is_recorded_as_session_error() {
        let catalog = Catalog::builtin();
        let mut session = Session::new(&catalog);
        session.set_logo(logo(), &catalog);
        session.toggle_placement("cap", "side-panel");
        session.start_generation(&catalog).unwrap();

        session.finish(Err(MockitError::AllGenerationsFailed { attempted: 1 }));
        assert!(!session.loading.active);
        assert!(session.mockups.is_empty());
        assert_eq!(
            session.error,
            Some(format!("Failed to generate mockups. {}", ALL_FAILED_MESSAGE))
        );
    }

    #[test]
    fn new_logo_resets_results_and_selection() {
        let catalog = Catalog::builtin();
        let mut session = Session::new(&catalog);
        session.set_logo(logo(), &catalog);
        session.toggle_placement("cap", "side-panel");
        session.mockups.push(mockup_for(&catalog));
        session.error = Some("old".into());

        session.set_logo(logo(), &catalog);
        assert!(session.mockups.is_empty());
        assert!(session.error.is_none());
        assert!(session.selection.is_empty());
        assert!(session.selection.selected_for("cap").is_empty());
    }

    #[test]
    fn oversized_upload_leaves_session_without_logo() {
        let catalog = Catalog::builtin();
        let processor = ImageProcessor::new(DEFAULT_MAX_UPLOAD_BYTES);
        let mut session = Session::new(&catalog);
        session.toggle_placement("cap", "front-panel");
        let before = session.updated_at;

        let data = vec![0u8; 6 * 1024 * 1024];
        let err = session
            .accept_logo_upload(&processor, &catalog, "big.png".into(), "image/png".into(), &data)
            .unwrap_err();

        assert!(matches!(err, MockitError::Validation(_)));
        assert_eq!(err.to_string(), TOO_LARGE_MESSAGE);
        assert!(session.logo.is_none());
        assert_eq!(session.updated_at, before);
        assert!(session.selection.is_selected("cap", "front-panel"));

        assert!(session.start_generation(&catalog).is_err());
        assert_eq!(session.error.as_deref(), Some(NO_LOGO_MESSAGE));
        assert!(!session.loading.active);
    }

    #[test]
    fn accepted_upload_becomes_data_uri_logo() {
        let catalog = Catalog::builtin();
        let processor = ImageProcessor::new(DEFAULT_MAX_UPLOAD_BYTES);
        let mut session = Session::new(&catalog);

        session
            .accept_logo_upload(&processor, &catalog, "l.png".into(), "image/png".into(), b"\x00")
            .unwrap();
        let logo = session.logo.as_ref().unwrap();
        assert_eq!(logo.data_uri, "data:image/png;base64,AA==");
        assert_eq!(logo.size, 1);
    }

    #[test]
    fn second_batch_for_same_session_is_refused() {
        let batches = ActiveBatches::default();
        let first = Uuid::new_v4();
        let other = Uuid::new_v4();

        let guard = batches.try_acquire(first).unwrap();
        assert!(batches.try_acquire(first).is_none());
        assert!(batches.try_acquire(other).is_some());
        assert!(batches.is_running(&first));

        drop(guard);
        assert!(!batches.is_running(&first));
        assert!(batches.try_acquire(first).is_some());
    }

    #[test]
    fn stale_loading_state_can_be_recovered() {
        let catalog = Catalog::builtin();
        let mut session = Session::new(&catalog);
        session.set_logo(logo(), &catalog);
        session.toggle_placement("cap", "side-panel");
        session.start_generation(&catalog).unwrap();

        // The batch died without calling finish
        assert!(matches!(
            session.start_generation(&catalog),
            Err(MockitError::Validation(_))
        ));
        assert!(session.clear_stale_loading());
        assert!(!session.clear_stale_loading());

        let batch = session.start_generation(&catalog).unwrap();
        assert_eq!(batch.tasks.len(), 1);
    }
}
