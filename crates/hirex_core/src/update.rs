use crate::{
    normalize_payload, server_message, AppState, Effect, Msg, NoticeKind, Phase, SubmissionResult,
    TransportOutcome,
};

const MSG_IN_PROGRESS: &str = "Optimizing your resume... this can take a few minutes.";
const MSG_CANCELLED: &str = "Request canceled or timed out. Please try again.";
const MSG_NETWORK: &str = "Network error: could not reach the HIREX server.";
const MSG_GENERIC_FAILURE: &str = "Optimization failed. Please try again.";
const MSG_CACHE_CLEARED: &str = "Cached results cleared.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::DocumentSelected(document) => {
            if state.inputs_enabled() {
                state.set_document(Some(document));
            }
            Vec::new()
        }
        Msg::DocumentCleared => {
            if state.inputs_enabled() {
                state.set_document(None);
            }
            Vec::new()
        }
        Msg::JobDescriptionChanged(text) => {
            if state.inputs_enabled() {
                state.set_job_description(text);
            }
            Vec::new()
        }
        Msg::HumanizeToggled(humanize) => {
            if state.inputs_enabled() {
                state.set_humanize(humanize);
            }
            Vec::new()
        }
        Msg::SubmitClicked => {
            if state.phase() != Phase::Idle {
                return (state, Vec::new());
            }
            match state.begin_submission() {
                Ok(request) => vec![
                    Effect::SetInputsEnabled(false),
                    Effect::notify(NoticeKind::Info, MSG_IN_PROGRESS),
                    Effect::StartSubmission {
                        request,
                        timeout: state.settings().timeout,
                    },
                    Effect::SetCancelVisible(true),
                ],
                Err(err) => vec![Effect::notify(NoticeKind::Warning, err.to_string())],
            }
        }
        Msg::CancelClicked => {
            if state.phase() == Phase::InFlight {
                vec![Effect::AbortSubmission]
            } else {
                Vec::new()
            }
        }
        Msg::SubmissionFinished(outcome) => {
            if state.phase() != Phase::InFlight {
                return (state, Vec::new());
            }
            let humanize = state.humanize();
            let mut effects = complete_submission(&mut state, outcome, humanize);
            // Runs for every branch: success, error, timeout and cancellation.
            state.finish_submission();
            effects.push(Effect::SetInputsEnabled(true));
            effects.push(Effect::SetCancelVisible(false));
            effects
        }
        Msg::PersistFailed(reason) => {
            let message =
                format!("Results could not be saved ({reason}); they may not survive a reload.");
            state.record_error(message.clone());
            vec![Effect::notify(NoticeKind::Warning, message)]
        }
        Msg::ResetClicked => vec![
            Effect::ClearCache,
            Effect::notify(NoticeKind::Info, MSG_CACHE_CLEARED),
        ],
    };

    (state, effects)
}

fn complete_submission(
    state: &mut AppState,
    outcome: TransportOutcome,
    requested_humanize: bool,
) -> Vec<Effect> {
    let failure = match outcome {
        TransportOutcome::Success(payload) => match normalize_payload(payload, requested_humanize)
        {
            Ok(result) => {
                let notice = success_message(&result);
                state.enter_persisting(result.clone());
                return vec![
                    Effect::PersistResult(result),
                    Effect::notify(NoticeKind::Success, notice),
                    Effect::NavigateToPreview {
                        delay: state.settings().preview_delay,
                    },
                ];
            }
            Err(err) => err.to_string(),
        },
        TransportOutcome::Timeout | TransportOutcome::UserCancelled => MSG_CANCELLED.to_string(),
        TransportOutcome::NetworkError(_) => MSG_NETWORK.to_string(),
        TransportOutcome::HttpError { body, .. } => {
            server_message(&body).unwrap_or_else(|| MSG_GENERIC_FAILURE.to_string())
        }
    };

    state.enter_reporting(failure.clone());
    vec![Effect::notify(NoticeKind::Error, failure)]
}

fn success_message(result: &SubmissionResult) -> String {
    let score = result
        .fit_score
        .map(|score| format!(" (fit score {score}/100)"))
        .unwrap_or_default();
    format!(
        "Resume optimized for {} at {}{}.",
        result.role_name, result.company_name, score
    )
}
