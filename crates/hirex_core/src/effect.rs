use std::time::Duration;

use crate::{SubmissionRequest, SubmissionResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Notify { message: String, kind: NoticeKind },
    SetInputsEnabled(bool),
    SetCancelVisible(bool),
    StartSubmission {
        request: SubmissionRequest,
        timeout: Duration,
    },
    AbortSubmission,
    PersistResult(SubmissionResult),
    NavigateToPreview { delay: Duration },
    ClearCache,
}

impl Effect {
    pub(crate) fn notify(kind: NoticeKind, message: impl Into<String>) -> Self {
        Effect::Notify {
            message: message.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}
