use crate::{FitTier, Phase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSummary {
    pub company_name: String,
    pub role_name: String,
    pub fit_score: Option<u8>,
    pub fit_tier: FitTier,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub inputs_enabled: bool,
    pub cancel_visible: bool,
    pub document_name: Option<String>,
    pub job_description_chars: usize,
    pub humanize: bool,
    pub can_submit: bool,
    pub last_result: Option<ResultSummary>,
    pub last_error: Option<String>,
    pub dirty: bool,
}
