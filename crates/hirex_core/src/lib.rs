//! HIREX core: pure submission state machine, data model and derivations.
mod cached;
mod effect;
mod msg;
mod outcome;
mod request;
mod result;
mod score;
mod state;
mod update;
mod view_model;

pub use cached::CachedState;
pub use effect::{Effect, NoticeKind};
pub use msg::Msg;
pub use outcome::{server_message, TransportOutcome};
pub use request::{
    has_required_extension, validate_submission, DocumentUpload, SubmissionRequest,
    ValidationError, REQUIRED_EXTENSION,
};
pub use result::{
    normalize_payload, NormalizeError, OptimizePayload, ScoreRound, SubmissionResult,
    CURRENT_CACHE_VERSION, UNKNOWN_COMPANY, UNKNOWN_ROLE,
};
pub use score::{derive_fit_score, FitScore, FitTier};
pub use state::{AppState, ControllerSettings, Phase, DEFAULT_PREVIEW_DELAY, DEFAULT_TIMEOUT};
pub use update::update;
pub use view_model::{AppViewModel, ResultSummary};
