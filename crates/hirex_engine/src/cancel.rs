use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

/// Which trigger aborted the in-flight submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    Timeout,
    UserCancelled,
}

/// One cancellation signal shared by the timeout and the cancel affordance.
///
/// The first `abort` records its reason; later calls only observe it.
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    token: CancellationToken,
    reason: Arc<OnceLock<AbortReason>>,
}

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if this call was the one that aborted.
    pub fn abort(&self, reason: AbortReason) -> bool {
        let first = self.reason.set(reason).is_ok();
        self.token.cancel();
        first
    }

    pub fn reason(&self) -> Option<AbortReason> {
        self.reason.get().copied()
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once aborted, with the winning reason.
    pub async fn aborted(&self) -> AbortReason {
        self.token.cancelled().await;
        self.reason().unwrap_or(AbortReason::UserCancelled)
    }
}
