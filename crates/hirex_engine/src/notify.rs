use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use engine_logging::engine_debug;
use hirex_core::NoticeKind;

pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced clock for deterministic timer tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Where toasts are drawn.
pub trait NotificationSurface {
    fn is_available(&self) -> bool;
    fn display(&mut self, notice: &Notice);
    fn clear(&mut self);
}

/// Last resort when no surface is available; blocks until delivered.
pub trait AlertFallback {
    fn alert(&mut self, notice: &Notice);
}

/// At most one visible notice. A new one replaces the current one and restarts
/// the dismiss timer; nothing is queued.
pub struct Notifier {
    surface: Box<dyn NotificationSurface>,
    fallback: Box<dyn AlertFallback>,
    clock: Arc<dyn Clock>,
    default_duration: Duration,
    current: Option<(Notice, Instant)>,
}

impl Notifier {
    pub fn new(
        surface: Box<dyn NotificationSurface>,
        fallback: Box<dyn AlertFallback>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            surface,
            fallback,
            clock,
            default_duration: DEFAULT_NOTICE_DURATION,
            current: None,
        }
    }

    pub fn with_default_duration(mut self, duration: Duration) -> Self {
        self.default_duration = duration;
        self
    }

    pub fn show(&mut self, notice: Notice) {
        let duration = self.default_duration;
        self.show_for(notice, duration);
    }

    pub fn show_for(&mut self, notice: Notice, duration: Duration) {
        if !self.surface.is_available() {
            self.current = None;
            self.fallback.alert(&notice);
            return;
        }
        if self.current.take().is_some() {
            self.surface.clear();
        }
        self.surface.display(&notice);
        engine_debug!("notice ({:?}): {}", notice.kind, notice.message);
        self.current = Some((notice, self.clock.now() + duration));
    }

    /// Dismisses the current notice if its time is up. Returns `true` if one
    /// was dismissed.
    pub fn tick(&mut self) -> bool {
        let expired = self
            .current
            .as_ref()
            .is_some_and(|(_, deadline)| self.clock.now() >= *deadline);
        if expired {
            self.current = None;
            self.surface.clear();
        }
        expired
    }

    pub fn visible(&self) -> Option<&Notice> {
        self.current.as_ref().map(|(notice, _)| notice)
    }

    /// Time until the visible notice is dismissed.
    pub fn remaining(&self) -> Option<Duration> {
        self.current
            .as_ref()
            .map(|(_, deadline)| deadline.saturating_duration_since(self.clock.now()))
    }
}
