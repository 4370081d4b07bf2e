use std::time::Duration;

use crate::view_model::{AppViewModel, ResultSummary};
use crate::{
    validate_submission, DocumentUpload, FitTier, SubmissionRequest, SubmissionResult,
    ValidationError,
};

/// The backend job may legitimately run for minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);
/// Pause between the success notice and the switch to the preview.
pub const DEFAULT_PREVIEW_DELAY: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    InFlight,
    Persisting,
    Reporting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub timeout: Duration,
    pub preview_delay: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            preview_delay: DEFAULT_PREVIEW_DELAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    settings: ControllerSettings,
    phase: Phase,
    document: Option<DocumentUpload>,
    job_description: String,
    humanize: bool,
    inputs_enabled: bool,
    cancel_visible: bool,
    last_branch: Option<Phase>,
    last_result: Option<SubmissionResult>,
    last_error: Option<String>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_settings(ControllerSettings::default())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ControllerSettings) -> Self {
        Self {
            settings,
            phase: Phase::Idle,
            document: None,
            job_description: String::new(),
            humanize: false,
            inputs_enabled: true,
            cancel_visible: false,
            last_branch: None,
            last_result: None,
            last_error: None,
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.phase,
            inputs_enabled: self.inputs_enabled,
            cancel_visible: self.cancel_visible,
            document_name: self.document.as_ref().map(|doc| doc.filename.clone()),
            job_description_chars: self.job_description.chars().count(),
            humanize: self.humanize,
            can_submit: self.phase == Phase::Idle
                && validate_submission(self.document.as_ref(), &self.job_description).is_ok(),
            last_result: self.last_result.as_ref().map(|result| ResultSummary {
                company_name: result.company_name.clone(),
                role_name: result.role_name.clone(),
                fit_score: result.fit_score,
                fit_tier: FitTier::from_score(result.fit_score),
            }),
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn settings(&self) -> ControllerSettings {
        self.settings
    }

    /// Branch taken by the most recent completed submission
    /// (`Persisting` or `Reporting`).
    pub fn last_branch(&self) -> Option<Phase> {
        self.last_branch
    }

    /// The last normalized result, kept in memory even if persisting it failed.
    pub fn last_result(&self) -> Option<&SubmissionResult> {
        self.last_result.as_ref()
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn inputs_enabled(&self) -> bool {
        self.inputs_enabled
    }

    pub(crate) fn humanize(&self) -> bool {
        self.humanize
    }

    pub(crate) fn set_document(&mut self, document: Option<DocumentUpload>) {
        self.document = document;
        self.mark_dirty();
    }

    pub(crate) fn set_job_description(&mut self, text: String) {
        self.job_description = text;
        self.mark_dirty();
    }

    pub(crate) fn set_humanize(&mut self, humanize: bool) {
        self.humanize = humanize;
        self.mark_dirty();
    }

    /// `Idle -> Validating`, then either back to `Idle` or on to `InFlight`
    /// with a freshly built request.
    pub(crate) fn begin_submission(&mut self) -> Result<SubmissionRequest, ValidationError> {
        self.phase = Phase::Validating;
        if let Err(err) = validate_submission(self.document.as_ref(), &self.job_description) {
            self.phase = Phase::Idle;
            self.last_error = Some(err.to_string());
            self.mark_dirty();
            return Err(err);
        }
        let Some(document) = self.document.clone() else {
            self.phase = Phase::Idle;
            return Err(ValidationError::MissingDocument);
        };

        self.phase = Phase::InFlight;
        self.inputs_enabled = false;
        self.cancel_visible = true;
        self.last_error = None;
        self.mark_dirty();
        Ok(SubmissionRequest {
            document,
            job_description: self.job_description.trim().to_string(),
            humanize: self.humanize,
        })
    }

    pub(crate) fn enter_persisting(&mut self, result: SubmissionResult) {
        self.phase = Phase::Persisting;
        self.last_branch = Some(Phase::Persisting);
        self.last_result = Some(result);
        self.mark_dirty();
    }

    pub(crate) fn enter_reporting(&mut self, message: String) {
        self.phase = Phase::Reporting;
        self.last_branch = Some(Phase::Reporting);
        self.last_error = Some(message);
        self.mark_dirty();
    }

    /// Unconditional cleanup after either branch.
    pub(crate) fn finish_submission(&mut self) {
        self.phase = Phase::Idle;
        self.inputs_enabled = true;
        self.cancel_visible = false;
        self.mark_dirty();
    }

    pub(crate) fn record_error(&mut self, message: String) {
        self.last_error = Some(message);
        self.mark_dirty();
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
