use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use engine_logging::{engine_debug, engine_info, engine_warn};
use hirex_core::{update, AppState, DocumentUpload, Msg, NoticeKind, Phase};
use hirex_engine::{
    DiagnosticsSink, EngineHandle, ExportError, Notice, Notifier, PdfVariant, Preferences,
    ReqwestTransport, ResultCache, StorageAdapter, SystemClock, Theme,
};

use super::cli::{Cli, Command, SubmitArgs, Switch, ThemeArg};
use super::config::AppConfig;
use super::effects::{until, EffectRunner};
use super::logging;
use super::preview::{self, PreviewPage};
use super::surface::{StderrAlert, TerminalSurface};

const LOOP_INTERVAL: Duration = Duration::from_millis(25);

pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::initialize(&cli);
    let config = AppConfig::load(&cli);
    engine_debug!("Effective config: {:?}", config);

    let storage = StorageAdapter::open_file(&config.storage_path, config.storage_quota_bytes);
    let mut prefs = Preferences::load(storage.clone());
    let mut notifier = Notifier::new(
        Box::new(TerminalSurface::new(prefs.theme())),
        Box::new(StderrAlert),
        Arc::new(SystemClock),
    )
    .with_default_duration(config.notification_duration);

    match cli.command {
        Command::Submit(args) => submit(&config, storage, &prefs, notifier, args),
        Command::Preview => {
            let state = ResultCache::new(storage).load();
            print!("{}", preview::render(&state, prefs.theme()));
            Ok(ExitCode::SUCCESS)
        }
        Command::ExportTex { out } => {
            let page = PreviewPage::new(ResultCache::new(storage).load(), &config.export_dir);
            let result = page.export_tex(out.as_deref());
            Ok(report_export(&mut notifier, "LaTeX source", result))
        }
        Command::ExportPdf { humanized, out } => {
            let variant = if humanized {
                PdfVariant::Humanized
            } else {
                PdfVariant::Primary
            };
            let mut page = PreviewPage::new(ResultCache::new(storage).load(), &config.export_dir);
            let result = page
                .export_pdf(variant, out.as_deref())
                .map(|exported| exported.path);
            page.unload();
            Ok(report_export(&mut notifier, "PDF", result))
        }
        Command::Copy => {
            let page = PreviewPage::new(ResultCache::new(storage).load(), &config.export_dir);
            Ok(copy(&page, &mut notifier))
        }
        Command::Reset => {
            let (tx, _rx) = mpsc::channel();
            let mut runner = EffectRunner::new(ResultCache::new(storage), notifier, tx);
            let (_, effects) = update(AppState::new(), Msg::ResetClicked);
            runner.enqueue(effects);
            Ok(ExitCode::SUCCESS)
        }
        Command::Theme { mode } => {
            let theme = match mode {
                None => {
                    println!("{}", prefs.theme());
                    return Ok(ExitCode::SUCCESS);
                }
                Some(ThemeArg::Toggle) => prefs.toggle_theme(),
                Some(ThemeArg::Light) => apply_theme(&mut prefs, Theme::Light),
                Some(ThemeArg::Dark) => apply_theme(&mut prefs, Theme::Dark),
            };
            notifier.show(Notice::new(NoticeKind::Success, format!("Theme set to {theme}.")));
            Ok(ExitCode::SUCCESS)
        }
        Command::Humanize { state } => {
            let Some(state) = state else {
                println!("{}", if prefs.humanize() { "on" } else { "off" });
                return Ok(ExitCode::SUCCESS);
            };
            let on = state == Switch::On;
            if prefs.set_humanize(on) {
                let word = if on { "on" } else { "off" };
                notifier.show(Notice::new(
                    NoticeKind::Success,
                    format!("Humanize is now {word} by default."),
                ));
                Ok(ExitCode::SUCCESS)
            } else {
                notifier.show(Notice::new(
                    NoticeKind::Warning,
                    "Preference could not be saved.",
                ));
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Health => health(&config, &mut notifier),
    }
}

fn apply_theme(prefs: &mut Preferences, theme: Theme) -> Theme {
    if !prefs.set_theme(theme) {
        engine_warn!("Theme {} applied but not saved", theme);
    }
    theme
}

fn submit(
    config: &AppConfig,
    storage: StorageAdapter,
    prefs: &Preferences,
    notifier: Notifier,
    args: SubmitArgs,
) -> Result<ExitCode> {
    let bytes = fs::read(&args.resume)
        .with_context(|| format!("could not read resume {:?}", args.resume))?;
    let filename = args
        .resume
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let job_description = match (&args.jd, args.jd_text) {
        (Some(path), _) => fs::read_to_string(path)
            .with_context(|| format!("could not read job description {path:?}"))?,
        (None, Some(text)) => text,
        (None, None) => String::new(),
    };

    let mut settings = config.controller_settings();
    if let Some(timeout) = args.timeout {
        settings.timeout = timeout.into();
    }

    let transport = ReqwestTransport::new(&config.transport_settings())?;
    let diagnostics = if config.diagnostics {
        transport.diagnostics()
    } else {
        DiagnosticsSink::disabled()
    };
    let engine = EngineHandle::new(Arc::new(transport), diagnostics);

    let (msg_tx, msg_rx) = mpsc::channel();
    let in_flight = Arc::new(AtomicBool::new(true));
    spawn_interrupt_listener(msg_tx.clone(), Arc::clone(&in_flight));
    let mut runner =
        EffectRunner::new(ResultCache::new(storage), notifier, msg_tx.clone()).with_engine(engine);

    for msg in [
        Msg::DocumentSelected(DocumentUpload::new(filename, bytes)),
        Msg::JobDescriptionChanged(job_description),
        Msg::HumanizeToggled(args.humanize || prefs.humanize()),
        Msg::SubmitClicked,
    ] {
        let _ = msg_tx.send(msg);
    }

    let mut state = AppState::with_settings(settings);
    loop {
        runner.pump_engine();
        while let Ok(msg) = msg_rx.try_recv() {
            state = dispatch(state, msg, &mut runner);
        }
        runner.tick();

        if state.phase() == Phase::Idle {
            if runner.submissions_started() == 0 {
                return Ok(ExitCode::FAILURE);
            }
            if state.last_branch().is_some() {
                break;
            }
        }
        thread::sleep(LOOP_INTERVAL);
    }
    in_flight.store(false, Ordering::SeqCst);

    if state.last_branch() != Some(Phase::Persisting) {
        return Ok(ExitCode::FAILURE);
    }
    if args.no_preview {
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(due) = runner.preview_due() {
        wait_until(due, &mut runner);
    }
    let cached = runner.cache().load();
    if cached.has_result() {
        print!("{}", preview::render(&cached, prefs.theme()));
    } else if let Some(summary) = state.view().last_result {
        print!("{}", preview::render_summary(&summary));
    }
    Ok(ExitCode::SUCCESS)
}

fn dispatch(state: AppState, msg: Msg, runner: &mut EffectRunner) -> AppState {
    let (mut state, effects) = update(state, msg);
    if state.consume_dirty() {
        let view = state.view();
        engine_debug!(
            "phase={:?} inputs_enabled={} cancel_visible={}",
            view.phase,
            view.inputs_enabled,
            view.cancel_visible
        );
    }
    runner.enqueue(effects);
    state
}

fn wait_until(deadline: Instant, runner: &mut EffectRunner) {
    while Instant::now() < deadline {
        runner.tick();
        thread::sleep(until(deadline).min(LOOP_INTERVAL));
    }
}

/// Exit status for a run ended by Ctrl-C.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    Cancel,
    Exit,
}

/// While a request is in flight Ctrl-C is the cancel button. Afterwards the
/// installed handler cannot be removed, so Ctrl-C ends the process itself.
fn interrupt_action(in_flight: &AtomicBool) -> Interrupt {
    if in_flight.load(Ordering::SeqCst) {
        Interrupt::Cancel
    } else {
        Interrupt::Exit
    }
}

fn spawn_interrupt_listener(msg_tx: mpsc::Sender<Msg>, in_flight: Arc<AtomicBool>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                engine_warn!("Ctrl-C handling unavailable: {}", err);
                return;
            }
        };
        runtime.block_on(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                engine_info!("Interrupt received");
                match interrupt_action(&in_flight) {
                    Interrupt::Cancel => {
                        if msg_tx.send(Msg::CancelClicked).is_err() {
                            break;
                        }
                    }
                    Interrupt::Exit => std::process::exit(INTERRUPTED_EXIT_CODE),
                }
            }
        });
    });
}

fn report_export(
    notifier: &mut Notifier,
    what: &str,
    result: Result<PathBuf, ExportError>,
) -> ExitCode {
    match result {
        Ok(path) => {
            notifier.show(Notice::new(
                NoticeKind::Success,
                format!("{what} saved to {}.", path.display()),
            ));
            ExitCode::SUCCESS
        }
        Err(err) => {
            notifier.show(export_failure(&err));
            ExitCode::FAILURE
        }
    }
}

fn export_failure(err: &ExportError) -> Notice {
    match err {
        ExportError::NothingCached => Notice::new(
            NoticeKind::Warning,
            "Nothing to export yet. Run `hirex submit` first.",
        ),
        other => Notice::new(NoticeKind::Error, format!("Export failed: {other}")),
    }
}

#[cfg(feature = "clipboard")]
fn copy(page: &PreviewPage, notifier: &mut Notifier) -> ExitCode {
    let mut clipboard = hirex_engine::SystemClipboard::default();
    match page.copy(&mut clipboard) {
        Ok(()) => {
            let chars = page.state().document_text.chars().count();
            notifier.show(Notice::new(
                NoticeKind::Success,
                format!("Copied {chars} characters of LaTeX to the clipboard."),
            ));
            ExitCode::SUCCESS
        }
        Err(err) => {
            notifier.show(export_failure(&err));
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "clipboard"))]
fn copy(_page: &PreviewPage, notifier: &mut Notifier) -> ExitCode {
    notifier.show(Notice::new(
        NoticeKind::Error,
        "This build has no clipboard support.",
    ));
    ExitCode::FAILURE
}

fn health(config: &AppConfig, notifier: &mut Notifier) -> Result<ExitCode> {
    let transport = ReqwestTransport::new(&config.transport_settings())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("could not start the async runtime")?;
    match runtime.block_on(transport.health()) {
        Ok(status) => {
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            notifier.show(Notice::new(
                NoticeKind::Error,
                format!("Backend at {} is not healthy: {err}", transport.base_url()),
            ));
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_cancels_only_while_in_flight() {
        let in_flight = AtomicBool::new(true);
        assert_eq!(interrupt_action(&in_flight), Interrupt::Cancel);

        in_flight.store(false, Ordering::SeqCst);
        assert_eq!(interrupt_action(&in_flight), Interrupt::Exit);
    }
}
