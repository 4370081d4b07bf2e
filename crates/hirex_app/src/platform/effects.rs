use std::io::{self, Write};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use hirex_core::{Effect, Msg, TransportOutcome};
use hirex_engine::{EngineEvent, EngineHandle, Notice, Notifier, ResultCache};

/// Executes the effects returned by `update` against the engine, the cache
/// and the notifier. Follow-up messages go back through `msg_tx`.
pub struct EffectRunner {
    engine: Option<EngineHandle>,
    cache: ResultCache,
    notifier: Notifier,
    msg_tx: mpsc::Sender<Msg>,
    preview_due: Option<Instant>,
    submissions_started: usize,
}

impl EffectRunner {
    pub fn new(cache: ResultCache, notifier: Notifier, msg_tx: mpsc::Sender<Msg>) -> Self {
        Self {
            engine: None,
            cache,
            notifier,
            msg_tx,
            preview_due: None,
            submissions_started: 0,
        }
    }

    pub fn with_engine(mut self, engine: EngineHandle) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn submissions_started(&self) -> usize {
        self.submissions_started
    }

    /// When the preview should be shown, once a successful submission asked
    /// for it.
    pub fn preview_due(&self) -> Option<Instant> {
        self.preview_due
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.run(effect);
        }
    }

    /// Forwards finished submissions as messages.
    pub fn pump_engine(&mut self) {
        let Some(engine) = &self.engine else {
            return;
        };
        while let Some(event) = engine.try_recv() {
            match event {
                EngineEvent::SubmissionFinished(outcome) => {
                    let _ = self.msg_tx.send(Msg::SubmissionFinished(outcome));
                }
            }
        }
    }

    pub fn tick(&mut self) {
        self.notifier.tick();
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::Notify { message, kind } => self.notifier.show(Notice::new(kind, message)),
            Effect::SetInputsEnabled(enabled) => {
                engine_debug!("Inputs enabled: {}", enabled);
            }
            Effect::SetCancelVisible(visible) => {
                engine_debug!("Cancel visible: {}", visible);
                if visible {
                    let _ = writeln!(io::stderr(), "        (press Ctrl-C to cancel)");
                }
            }
            Effect::StartSubmission { request, timeout } => {
                self.submissions_started += 1;
                match &self.engine {
                    Some(engine) => {
                        engine_info!(
                            "Starting submission of {} with a {:?} budget",
                            request.document.filename,
                            timeout
                        );
                        engine.submit(request, timeout);
                    }
                    None => {
                        engine_error!("Submission requested without an engine");
                        let outcome =
                            TransportOutcome::NetworkError("engine not running".to_string());
                        let _ = self.msg_tx.send(Msg::SubmissionFinished(outcome));
                    }
                }
            }
            Effect::AbortSubmission => {
                let aborted = self.engine.as_ref().is_some_and(EngineHandle::abort);
                engine_info!("Abort requested (took effect: {})", aborted);
            }
            Effect::PersistResult(result) => {
                if let Err(err) = self.cache.persist(&result) {
                    engine_warn!("Could not cache result: {}", err);
                    let _ = self.msg_tx.send(Msg::PersistFailed(err.to_string()));
                }
            }
            Effect::NavigateToPreview { delay } => {
                self.preview_due = Some(Instant::now() + delay);
            }
            Effect::ClearCache => self.cache.clear(),
        }
    }
}

/// Time until `deadline`, or zero once it has passed.
pub fn until(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hirex_core::{NoticeKind, SubmissionResult, CURRENT_CACHE_VERSION};
    use hirex_engine::{
        AlertFallback, ChangeBus, ManualClock, MemoryBackend, NotificationSurface, StorageAdapter,
    };

    use super::*;

    struct Silent;

    impl NotificationSurface for Silent {
        fn is_available(&self) -> bool {
            true
        }
        fn display(&mut self, _notice: &Notice) {}
        fn clear(&mut self) {}
    }

    impl AlertFallback for Silent {
        fn alert(&mut self, _notice: &Notice) {}
    }

    fn runner(storage: StorageAdapter) -> (EffectRunner, mpsc::Receiver<Msg>) {
        let (tx, rx) = mpsc::channel();
        let notifier = Notifier::new(
            Box::new(Silent),
            Box::new(Silent),
            Arc::new(ManualClock::new()),
        );
        (EffectRunner::new(ResultCache::new(storage), notifier, tx), rx)
    }

    fn result() -> SubmissionResult {
        SubmissionResult {
            document_text: "\\documentclass{article}".to_string(),
            primary_pdf_base64: None,
            secondary_pdf_base64: None,
            company_name: "Acme".to_string(),
            role_name: "Engineer".to_string(),
            humanize_used: false,
            fit_score: None,
            fit_score_history: Vec::new(),
            saved_paths: Vec::new(),
            cache_version: CURRENT_CACHE_VERSION.to_string(),
        }
    }

    #[test]
    fn failed_persist_comes_back_as_a_message() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_fail_writes(true);
        let (mut runner, rx) = runner(StorageAdapter::new(backend, Arc::new(ChangeBus::new())));

        runner.enqueue(vec![Effect::PersistResult(result())]);

        assert!(matches!(rx.try_recv(), Ok(Msg::PersistFailed(_))));
    }

    #[test]
    fn persist_then_clear_round_trip() {
        let (mut runner, rx) = runner(StorageAdapter::in_memory());

        runner.enqueue(vec![
            Effect::PersistResult(result()),
            Effect::NavigateToPreview {
                delay: Duration::from_millis(1200),
            },
        ]);
        assert!(runner.cache().load().has_result());
        assert!(runner.preview_due().is_some());

        runner.enqueue(vec![
            Effect::ClearCache,
            Effect::Notify {
                message: "Cached results cleared.".to_string(),
                kind: NoticeKind::Info,
            },
        ]);
        assert!(!runner.cache().load().has_result());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn submission_without_engine_reports_a_network_error() {
        let (mut runner, rx) = runner(StorageAdapter::in_memory());
        let request = hirex_core::SubmissionRequest {
            document: hirex_core::DocumentUpload::new("cv.tex", b"x".to_vec()),
            job_description: "jd".to_string(),
            humanize: false,
        };

        runner.enqueue(vec![
            Effect::StartSubmission {
                request,
                timeout: Duration::from_secs(1),
            },
            Effect::AbortSubmission,
        ]);

        assert_eq!(runner.submissions_started(), 1);
        assert!(matches!(
            rx.try_recv(),
            Ok(Msg::SubmissionFinished(TransportOutcome::NetworkError(_)))
        ));
    }
}
