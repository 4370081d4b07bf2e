use serde::{Deserialize, Deserializer, Serialize};

use crate::score::derive_fit_score;

pub const UNKNOWN_COMPANY: &str = "UnknownCompany";
pub const UNKNOWN_ROLE: &str = "UnknownRole";

/// Tag written next to every cached result. A different tag on load is only
/// reported, never purged.
pub const CURRENT_CACHE_VERSION: &str = "hirex-cache-v2";

/// Coverage reached after one optimization round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRound {
    pub round: u32,
    pub coverage: f64,
}

/// JSON body returned by `POST /api/optimize`. Every field is optional on the
/// wire; `tex_string` is checked separately.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizePayload {
    pub tex_string: Option<String>,
    pub pdf_base64: Option<String>,
    pub pdf_base64_humanized: Option<String>,
    pub company_name: Option<String>,
    pub role: Option<String>,
    pub humanized: Option<bool>,
    pub fit_score: Option<f64>,
    pub coverage_ratio: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub coverage_history: Vec<ScoreRound>,
    #[serde(deserialize_with = "null_as_default")]
    pub saved_paths: Vec<String>,
    pub cache_version: Option<String>,
}

/// `null` reads the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl OptimizePayload {
    pub fn has_document_text(&self) -> bool {
        self.tex_string
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    pub document_text: String,
    pub primary_pdf_base64: Option<String>,
    pub secondary_pdf_base64: Option<String>,
    pub company_name: String,
    pub role_name: String,
    pub humanize_used: bool,
    pub fit_score: Option<u8>,
    pub fit_score_history: Vec<ScoreRound>,
    pub saved_paths: Vec<String>,
    pub cache_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("Empty output from server")]
    EmptyDocument,
}

/// Turns a backend payload into the record the cache stores.
pub fn normalize_payload(
    payload: OptimizePayload,
    requested_humanize: bool,
) -> Result<SubmissionResult, NormalizeError> {
    if !payload.has_document_text() {
        return Err(NormalizeError::EmptyDocument);
    }
    let fit_score = derive_fit_score(payload.fit_score, payload.coverage_ratio).value();

    Ok(SubmissionResult {
        document_text: payload.tex_string.unwrap_or_default(),
        primary_pdf_base64: non_blank(payload.pdf_base64),
        secondary_pdf_base64: non_blank(payload.pdf_base64_humanized),
        company_name: non_blank(payload.company_name)
            .unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
        role_name: non_blank(payload.role).unwrap_or_else(|| UNKNOWN_ROLE.to_string()),
        humanize_used: payload.humanized.unwrap_or(requested_humanize),
        fit_score,
        fit_score_history: payload.coverage_history,
        saved_paths: payload.saved_paths,
        cache_version: non_blank(payload.cache_version)
            .unwrap_or_else(|| CURRENT_CACHE_VERSION.to_string()),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
