use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use hirex_core::{OptimizePayload, SubmissionRequest, TransportOutcome};
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde_json::json;

use crate::cancel::{AbortReason, AbortToken};

pub const EMPTY_OUTPUT_MESSAGE: &str = "Empty output from server";

const OPTIMIZE_PATH: &str = "api/optimize";
const DEBUG_LOG_PATH: &str = "api/debug/log";
const HEALTH_PATH: &str = "health";

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid base url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
    #[error("http status {0}")]
    Status(u16),
}

/// The one outbound call: submit a job and wait for its outcome.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Never fails: every way the call can end is a [`TransportOutcome`].
    /// `token` is the cancel hook; the same token is aborted with
    /// [`AbortReason::Timeout`] once `timeout` elapses.
    async fn submit(
        &self,
        request: &SubmissionRequest,
        timeout: Duration,
        token: &AbortToken,
    ) -> TransportOutcome;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    pub fn new(settings: &TransportSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: parse_base_url(&settings.base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /health`, returned as raw JSON.
    pub async fn health(&self) -> Result<serde_json::Value, TransportError> {
        let url = endpoint(&self.base_url, HEALTH_PATH)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }

    pub fn diagnostics(&self) -> DiagnosticsSink {
        DiagnosticsSink {
            client: self.client.clone(),
            endpoint: endpoint(&self.base_url, DEBUG_LOG_PATH).ok(),
        }
    }

    async fn send(&self, request: &SubmissionRequest) -> TransportOutcome {
        let url = match endpoint(&self.base_url, OPTIMIZE_PATH) {
            Ok(url) => url,
            Err(err) => return TransportOutcome::NetworkError(err.to_string()),
        };
        let part = match Part::bytes(request.document.bytes.clone())
            .file_name(request.document.filename.clone())
            .mime_str("application/x-tex")
        {
            Ok(part) => part,
            Err(err) => return TransportOutcome::NetworkError(err.to_string()),
        };
        let form = Form::new()
            .part("base_resume_tex", part)
            .text("jd_text", request.job_description.clone())
            .text("use_humanize", if request.humanize { "true" } else { "false" });

        let response = match self.client.post(url).multipart(form).send().await {
            Ok(response) => response,
            Err(err) => return map_reqwest_error(err),
        };

        let status = response.status();
        if !status.is_success() {
            // Best effort: a body that cannot be read is reported as empty.
            let body = response.text().await.unwrap_or_default();
            return TransportOutcome::HttpError {
                status: status.as_u16(),
                body,
            };
        }

        match response.bytes().await {
            Ok(body) => parse_success_body(status.as_u16(), &body),
            Err(err) => map_reqwest_error(err),
        }
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn submit(
        &self,
        request: &SubmissionRequest,
        timeout: Duration,
        token: &AbortToken,
    ) -> TransportOutcome {
        engine_info!(
            "Submitting {} ({} bytes), jd_len={}, humanize={}",
            request.document.filename,
            request.document.bytes.len(),
            request.job_description.len(),
            request.humanize
        );
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let outcome = tokio::select! {
            biased;
            reason = token.aborted() => outcome_for(reason),
            _ = &mut deadline => {
                token.abort(AbortReason::Timeout);
                // A cancel that landed first keeps its reason.
                outcome_for(token.reason().unwrap_or(AbortReason::Timeout))
            }
            outcome = self.send(request) => outcome,
        };
        engine_info!("Submission finished: {}", outcome.kind());
        outcome
    }
}

/// Success is more than a 2xx: the body must be JSON with document text.
pub(crate) fn parse_success_body(status: u16, body: &[u8]) -> TransportOutcome {
    match serde_json::from_slice::<OptimizePayload>(body) {
        Ok(payload) if payload.has_document_text() => TransportOutcome::Success(payload),
        Ok(_) => TransportOutcome::HttpError {
            status,
            body: EMPTY_OUTPUT_MESSAGE.to_string(),
        },
        Err(err) => TransportOutcome::HttpError {
            status,
            body: format!("Invalid JSON from server: {err}"),
        },
    }
}

fn outcome_for(reason: AbortReason) -> TransportOutcome {
    match reason {
        AbortReason::Timeout => TransportOutcome::Timeout,
        AbortReason::UserCancelled => TransportOutcome::UserCancelled,
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportOutcome {
    if err.is_timeout() {
        return TransportOutcome::Timeout;
    }
    TransportOutcome::NetworkError(err.to_string())
}

fn parse_base_url(raw: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(raw.trim()).map_err(|err| TransportError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(TransportError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "not a base url".to_string(),
        });
    }
    // Keep any path prefix when joining relative endpoints.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn endpoint(base: &Url, path: &str) -> Result<Url, TransportError> {
    base.join(path).map_err(|err| TransportError::InvalidBaseUrl {
        url: base.to_string(),
        reason: err.to_string(),
    })
}

/// Fire-and-forget sink for `POST /api/debug/log`. Failures never reach the
/// caller.
#[derive(Debug, Clone)]
pub struct DiagnosticsSink {
    client: reqwest::Client,
    endpoint: Option<Url>,
}

impl DiagnosticsSink {
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Must be called from inside a tokio runtime; otherwise the event is
    /// dropped.
    pub fn post(&self, event: &str, detail: serde_json::Value) {
        let Some(url) = self.endpoint.clone() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            engine_debug!("Diagnostics event {} dropped: no runtime", event);
            return;
        };
        let body = json!({
            "event": event,
            "detail": detail,
            "ts": chrono::Utc::now().to_rfc3339(),
        });
        let client = self.client.clone();
        let event = event.to_string();
        handle.spawn(async move {
            match client.post(url).json(&body).send().await {
                Ok(response) if !response.status().is_success() => {
                    engine_debug!("Diagnostics event {} rejected: {}", event, response.status());
                }
                Ok(_) => {}
                Err(err) => engine_debug!("Diagnostics event {} failed: {}", event, err),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_path_prefix() {
        let base = parse_base_url("http://localhost:8000/hirex").unwrap();
        assert_eq!(
            endpoint(&base, OPTIMIZE_PATH).unwrap().as_str(),
            "http://localhost:8000/hirex/api/optimize"
        );
        let base = parse_base_url("http://localhost:8000").unwrap();
        assert_eq!(
            endpoint(&base, OPTIMIZE_PATH).unwrap().as_str(),
            "http://localhost:8000/api/optimize"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(TransportError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn success_body_requires_document_text() {
        assert_eq!(
            parse_success_body(200, br#"{"tex_string": ""}"#),
            TransportOutcome::HttpError {
                status: 200,
                body: EMPTY_OUTPUT_MESSAGE.to_string()
            }
        );
        assert!(matches!(
            parse_success_body(200, b"<html>"),
            TransportOutcome::HttpError { status: 200, .. }
        ));
        assert!(matches!(
            parse_success_body(200, br#"{"tex_string": "x"}"#),
            TransportOutcome::Success(_)
        ));
    }
}
