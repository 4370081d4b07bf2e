use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_info};
use hirex_core::{SubmissionRequest, TransportOutcome};
use serde_json::json;

use crate::cancel::{AbortReason, AbortToken};
use crate::transport::{DiagnosticsSink, Transport};

enum EngineCommand {
    Submit {
        request: SubmissionRequest,
        timeout: Duration,
        token: AbortToken,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SubmissionFinished(TransportOutcome),
}

/// Runs the transport on a background thread with its own tokio runtime.
/// The caller polls [`EngineHandle::try_recv`] from its own loop.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    current: Arc<Mutex<Option<AbortToken>>>,
}

impl EngineHandle {
    pub fn new(transport: Arc<dyn Transport>, diagnostics: DiagnosticsSink) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    engine_error!("Could not start the engine runtime: {}", err);
                    let message = format!("engine runtime unavailable: {err}");
                    while let Ok(EngineCommand::Submit { .. }) = cmd_rx.recv() {
                        let outcome = TransportOutcome::NetworkError(message.clone());
                        let _ = event_tx.send(EngineEvent::SubmissionFinished(outcome));
                    }
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let transport = Arc::clone(&transport);
                let diagnostics = diagnostics.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(transport.as_ref(), &diagnostics, command, event_tx).await;
                });
            }
        });

        Self {
            cmd_tx,
            event_rx,
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// Starts a submission with a fresh token, replacing any previous one.
    pub fn submit(&self, request: SubmissionRequest, timeout: Duration) {
        let token = AbortToken::new();
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        if self
            .cmd_tx
            .send(EngineCommand::Submit {
                request,
                timeout,
                token,
            })
            .is_err()
        {
            engine_error!("Engine thread is gone; submission dropped");
        }
    }

    /// Aborts the current submission as user-cancelled. Returns `false` when
    /// nothing was in flight or another reason already won.
    pub fn abort(&self) -> bool {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        match current.as_ref() {
            Some(token) => token.abort(AbortReason::UserCancelled),
            None => false,
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        let event = self.event_rx.try_recv().ok()?;
        self.clear_current();
        Some(event)
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        let event = self.event_rx.recv_timeout(timeout).ok()?;
        self.clear_current();
        Some(event)
    }

    fn clear_current(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

async fn handle_command(
    transport: &dyn Transport,
    diagnostics: &DiagnosticsSink,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Submit {
            request,
            timeout,
            token,
        } => {
            diagnostics.post(
                "submit",
                json!({
                    "filename": request.document.filename,
                    "jd_len": request.job_description.len(),
                    "humanize": request.humanize,
                }),
            );
            let outcome = transport.submit(&request, timeout, &token).await;
            engine_info!("Engine finished submission: {}", outcome.kind());
            diagnostics.post("submit_finished", json!({ "outcome": outcome.kind() }));
            let _ = event_tx.send(EngineEvent::SubmissionFinished(outcome));
        }
    }
}
