use engine_logging::engine_debug;

use crate::export::ExportError;

pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), String>;
}

/// Copies `text`. An empty document is reported as nothing to copy.
pub fn copy_text(clipboard: &mut dyn Clipboard, text: &str) -> Result<(), ExportError> {
    if text.trim().is_empty() {
        return Err(ExportError::NothingCached);
    }
    clipboard.set_text(text).map_err(ExportError::Clipboard)?;
    engine_debug!("Copied {} chars to the clipboard", text.len());
    Ok(())
}

#[cfg(feature = "clipboard")]
pub use system::SystemClipboard;

#[cfg(feature = "clipboard")]
mod system {
    use std::time::Duration;

    use super::Clipboard;

    /// The OS clipboard via `arboard`.
    ///
    /// On X11 the contents vanish when the owning process exits, so the
    /// clipboard is held open for `hold` after a copy.
    pub struct SystemClipboard {
        hold: Duration,
    }

    impl SystemClipboard {
        pub fn new(hold: Duration) -> Self {
            Self { hold }
        }
    }

    impl Default for SystemClipboard {
        fn default() -> Self {
            Self::new(Duration::from_millis(250))
        }
    }

    impl Clipboard for SystemClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), String> {
            let mut clipboard = arboard::Clipboard::new().map_err(|err| err.to_string())?;
            clipboard
                .set_text(text.to_string())
                .map_err(|err| err.to_string())?;
            if !self.hold.is_zero() {
                std::thread::sleep(self.hold);
            }
            Ok(())
        }
    }
}
