use std::fmt::Write;
use std::path::{Path, PathBuf};

use hirex_core::{CachedState, FitTier, ResultSummary};
use hirex_engine::{
    copy_text, BlobRegistry, Clipboard, ExportError, ExportedBlob, Exporter, PdfVariant, Theme,
};

const SOURCE_PREVIEW_LINES: usize = 12;

/// The result page: rendering plus the export and copy actions over a
/// cached result. Blobs created here are released when the page goes away.
pub struct PreviewPage {
    state: CachedState,
    exporter: Exporter,
    blobs: BlobRegistry,
}

impl PreviewPage {
    pub fn new(state: CachedState, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            state,
            exporter: Exporter::new(export_dir),
            blobs: BlobRegistry::new(),
        }
    }

    pub fn state(&self) -> &CachedState {
        &self.state
    }

    pub fn export_tex(&self, out: Option<&Path>) -> Result<PathBuf, ExportError> {
        match split_out(out) {
            Some((dir, name)) => Exporter::new(dir).export_text(&self.state, Some(&name)),
            None => self.exporter.export_text(&self.state, None),
        }
    }

    pub fn export_pdf(
        &mut self,
        variant: PdfVariant,
        out: Option<&Path>,
    ) -> Result<ExportedBlob, ExportError> {
        match split_out(out) {
            Some((dir, name)) => {
                Exporter::new(dir).export_pdf(&self.state, variant, Some(&name), &mut self.blobs)
            }
            None => self
                .exporter
                .export_pdf(&self.state, variant, None, &mut self.blobs),
        }
    }

    pub fn copy(&self, clipboard: &mut dyn Clipboard) -> Result<(), ExportError> {
        copy_text(clipboard, &self.state.document_text)
    }

    pub fn unload(&mut self) {
        self.blobs.release_all();
    }
}

impl Drop for PreviewPage {
    fn drop(&mut self) {
        self.unload();
    }
}

/// `--out some/dir/name.pdf` becomes the directory and the file name.
fn split_out(out: Option<&Path>) -> Option<(PathBuf, String)> {
    let out = out?;
    let name = out.file_name()?.to_string_lossy().into_owned();
    let dir = out
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Some((dir, name))
}

pub fn render(state: &CachedState, theme: Theme) -> String {
    if !state.has_result() {
        return "No result yet. Run `hirex submit` to optimize a resume.\n".to_string();
    }

    let mut out = String::new();
    let rule = (if theme == Theme::Dark { "━" } else { "─" }).repeat(48);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "{} at {}", state.role_name, state.company_name);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Fit score:  {}", score_line(state.fit_score, state.fit_tier));
    if !state.fit_score_history.is_empty() {
        let rounds = state
            .fit_score_history
            .iter()
            .map(|round| format!("#{} {:.0}%", round.round, round.coverage * 100.0))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "Coverage:   {rounds}");
    }
    let _ = writeln!(
        out,
        "Humanized:  {}",
        if state.humanize_used { "yes" } else { "no" }
    );
    if let Some(timestamp) = &state.timestamp {
        let _ = writeln!(out, "Generated:  {timestamp}");
    }
    let _ = writeln!(
        out,
        "PDF:        {}",
        match (&state.primary_pdf_base64, &state.secondary_pdf_base64) {
            (Some(_), Some(_)) => "original and humanized",
            (Some(_), None) => "original",
            (None, Some(_)) => "humanized",
            (None, None) => "not available",
        }
    );
    for path in &state.saved_paths {
        let _ = writeln!(out, "Saved:      {path}");
    }
    if state.version_mismatch {
        let _ = writeln!(
            out,
            "Note: this result was cached by another version ({}); re-run to refresh it.",
            state.cache_version.as_deref().unwrap_or("unknown")
        );
    }

    let total = state.document_text.lines().count();
    let _ = writeln!(out, "\nLaTeX source ({total} lines):");
    for line in state.document_text.lines().take(SOURCE_PREVIEW_LINES) {
        let _ = writeln!(out, "  {line}");
    }
    if total > SOURCE_PREVIEW_LINES {
        let _ = writeln!(out, "  ... ({} more)", total - SOURCE_PREVIEW_LINES);
    }
    out
}

/// Shown when the result is only in memory because caching it failed.
pub fn render_summary(summary: &ResultSummary) -> String {
    format!(
        "{} at {}\nFit score:  {}\n(not cached; exports are unavailable)\n",
        summary.role_name,
        summary.company_name,
        score_line(summary.fit_score, summary.fit_tier)
    )
}

fn score_line(score: Option<u8>, tier: FitTier) -> String {
    match score {
        Some(score) => format!("{score}/100 ({tier})"),
        None => tier.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hirex_core::ScoreRound;
    use tempfile::TempDir;

    fn state() -> CachedState {
        CachedState {
            document_text: "\\documentclass{article}\n\\begin{document}\n\\end{document}"
                .to_string(),
            primary_pdf_base64: Some("JVBERi0xLjQ=".to_string()),
            company_name: "Acme".to_string(),
            role_name: "Engineer".to_string(),
            fit_score: Some(92),
            fit_tier: FitTier::Excellent,
            fit_score_history: vec![ScoreRound {
                round: 1,
                coverage: 0.92,
            }],
            ..CachedState::default()
        }
    }

    #[test]
    fn empty_cache_renders_the_no_result_page() {
        let text = render(&CachedState::default(), Theme::Light);
        assert!(text.starts_with("No result yet"));
    }

    #[test]
    fn result_page_shows_score_and_source() {
        let text = render(&state(), Theme::Light);
        assert!(text.contains("Engineer at Acme"));
        assert!(text.contains("92/100 (Excellent)"));
        assert!(text.contains("#1 92%"));
        assert!(text.contains("PDF:        original\n"));
        assert!(text.contains("LaTeX source (3 lines)"));
        assert!(!text.contains("another version"));
    }

    #[test]
    fn version_mismatch_is_called_out() {
        let mut state = state();
        state.version_mismatch = true;
        state.cache_version = Some("hirex-cache-v1".to_string());
        assert!(render(&state, Theme::Dark).contains("another version (hirex-cache-v1)"));
    }

    #[test]
    fn explicit_out_path_is_honoured_and_blobs_released_on_unload() {
        let temp = TempDir::new().unwrap();
        let mut page = PreviewPage::new(state(), temp.path().join("default"));
        let target = temp.path().join("picked").join("cv.pdf");

        let exported = page.export_pdf(PdfVariant::Primary, Some(&target)).unwrap();
        assert_eq!(exported.path, target);
        assert!(exported.handle.path.exists());

        page.unload();
        assert!(!exported.handle.path.exists());
        assert!(target.exists());
    }
}
