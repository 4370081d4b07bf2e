use crate::{FitTier, ScoreRound, UNKNOWN_COMPANY, UNKNOWN_ROLE};

/// Read-only projection of the cached result, rebuilt on every preview load.
/// The tier is derived for display and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedState {
    pub document_text: String,
    pub primary_pdf_base64: Option<String>,
    pub secondary_pdf_base64: Option<String>,
    pub timestamp: Option<String>,
    pub company_name: String,
    pub role_name: String,
    pub humanize_used: bool,
    pub cache_version: Option<String>,
    pub version_mismatch: bool,
    pub saved_paths: Vec<String>,
    pub fit_score: Option<u8>,
    pub fit_score_history: Vec<ScoreRound>,
    pub fit_tier: FitTier,
    pub humanize_preference: bool,
}

impl Default for CachedState {
    fn default() -> Self {
        Self {
            document_text: String::new(),
            primary_pdf_base64: None,
            secondary_pdf_base64: None,
            timestamp: None,
            company_name: UNKNOWN_COMPANY.to_string(),
            role_name: UNKNOWN_ROLE.to_string(),
            humanize_used: false,
            cache_version: None,
            version_mismatch: false,
            saved_paths: Vec::new(),
            fit_score: None,
            fit_score_history: Vec::new(),
            fit_tier: FitTier::AwaitingAnalysis,
            humanize_preference: false,
        }
    }
}

impl CachedState {
    /// False for the "no result yet" state.
    pub fn has_result(&self) -> bool {
        !self.document_text.trim().is_empty()
    }

    pub fn has_any_pdf(&self) -> bool {
        self.primary_pdf_base64.is_some() || self.secondary_pdf_base64.is_some()
    }
}
