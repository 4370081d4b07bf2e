//! Namespaced storage keys shared by the cache, preferences and reset.

pub const TEX: &str = "hirex_tex";
pub const PDF: &str = "hirex_pdf";
pub const PDF_HUMANIZED: &str = "hirex_pdf_humanized";
pub const TIMESTAMP: &str = "hirex_timestamp";
pub const COMPANY: &str = "hirex_company";
pub const ROLE: &str = "hirex_role";
pub const USE_HUMANIZE: &str = "hirex_use_humanize";
pub const VERSION: &str = "hirex_version";
pub const SAVED_PATHS: &str = "hirex_saved_paths";
pub const FIT_SCORE: &str = "hirex_fit_score";
pub const FIT_HISTORY: &str = "hirex_fit_history";

/// Every key that belongs to a cached submission result. Reset removes
/// exactly these.
pub const RESULT_KEYS: [&str; 11] = [
    TEX,
    PDF,
    PDF_HUMANIZED,
    TIMESTAMP,
    COMPANY,
    ROLE,
    USE_HUMANIZE,
    VERSION,
    SAVED_PATHS,
    FIT_SCORE,
    FIT_HISTORY,
];

/// Preference keys live outside the result and survive a reset.
pub const THEME: &str = "hirex-theme";
pub const HUMANIZE_PREF: &str = "hirex-humanize-pref";

pub(crate) fn encode_flag(flag: bool) -> &'static str {
    if flag {
        "true"
    } else {
        "false"
    }
}

pub(crate) fn decode_flag(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("true" | "1" | "on"))
}
