use std::io::{self, IsTerminal, Write};

use crossterm::style::{Color, Stylize};

use hirex_core::NoticeKind;
use hirex_engine::{AlertFallback, Notice, NotificationSurface, Theme};

/// Notices as coloured lines on an interactive stderr.
pub struct TerminalSurface {
    theme: Theme,
}

impl TerminalSurface {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }
}

impl NotificationSurface for TerminalSurface {
    fn is_available(&self) -> bool {
        io::stderr().is_terminal()
    }

    fn display(&mut self, notice: &Notice) {
        let tag = format!("{:>7}", label(notice.kind))
            .with(color_for(notice.kind, self.theme))
            .bold();
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{tag} {}", notice.message);
    }

    fn clear(&mut self) {
        // Printed lines scroll away on their own.
    }
}

/// Plain stderr lines for pipes and redirects.
#[derive(Default)]
pub struct StderrAlert;

impl AlertFallback for StderrAlert {
    fn alert(&mut self, notice: &Notice) {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "[{}] {}", label(notice.kind), notice.message);
        let _ = err.flush();
    }
}

fn label(kind: NoticeKind) -> &'static str {
    match kind {
        NoticeKind::Info => "info",
        NoticeKind::Success => "success",
        NoticeKind::Warning => "warning",
        NoticeKind::Error => "error",
    }
}

/// Light terminals get the dark variants, dark terminals the bright ones.
fn color_for(kind: NoticeKind, theme: Theme) -> Color {
    match (kind, theme) {
        (NoticeKind::Info, Theme::Light) => Color::DarkBlue,
        (NoticeKind::Info, Theme::Dark) => Color::Blue,
        (NoticeKind::Success, Theme::Light) => Color::DarkGreen,
        (NoticeKind::Success, Theme::Dark) => Color::Green,
        (NoticeKind::Warning, Theme::Light) => Color::DarkYellow,
        (NoticeKind::Warning, Theme::Dark) => Color::Yellow,
        (NoticeKind::Error, Theme::Light) => Color::DarkRed,
        (NoticeKind::Error, Theme::Dark) => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_picks_the_palette() {
        assert_eq!(color_for(NoticeKind::Error, Theme::Light), Color::DarkRed);
        assert_eq!(color_for(NoticeKind::Error, Theme::Dark), Color::Red);
        assert_ne!(
            color_for(NoticeKind::Success, Theme::Light),
            color_for(NoticeKind::Success, Theme::Dark)
        );
    }
}
