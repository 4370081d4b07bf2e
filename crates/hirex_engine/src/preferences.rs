use std::fmt;

use engine_logging::{engine_debug, engine_warn};

use crate::events::Subscription;
use crate::keys::{self, decode_flag, encode_flag};
use crate::storage::StorageAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Theme and humanize toggle, kept in sync with other adapters on the same
/// medium through [`Preferences::sync`].
pub struct Preferences {
    storage: StorageAdapter,
    subscription: Subscription,
    theme: Theme,
    humanize: bool,
}

impl Preferences {
    pub fn load(storage: StorageAdapter) -> Self {
        let subscription = storage.subscribe();
        let theme = storage
            .get(keys::THEME)
            .as_deref()
            .and_then(Theme::parse)
            .unwrap_or_default();
        let humanize = decode_flag(storage.get(keys::HUMANIZE_PREF).as_deref());
        Self {
            storage,
            subscription,
            theme,
            humanize,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn humanize(&self) -> bool {
        self.humanize
    }

    /// The in-memory value changes even if the write fails.
    pub fn set_theme(&mut self, theme: Theme) -> bool {
        self.theme = theme;
        self.storage.set(keys::THEME, theme.as_str())
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let next = self.theme.toggle();
        self.set_theme(next);
        next
    }

    pub fn set_humanize(&mut self, humanize: bool) -> bool {
        self.humanize = humanize;
        self.storage.set(keys::HUMANIZE_PREF, encode_flag(humanize))
    }

    /// Applies preference changes made elsewhere. Returns how many were
    /// applied.
    pub fn sync(&mut self) -> usize {
        let mut applied = 0;
        for change in self.subscription.drain() {
            match change.key.as_str() {
                keys::THEME => {
                    let theme = change.new_value.as_deref().and_then(Theme::parse);
                    match (theme, change.new_value.is_some()) {
                        (Some(theme), _) => self.theme = theme,
                        (None, false) => self.theme = Theme::default(),
                        (None, true) => {
                            engine_warn!("Ignoring unknown theme {:?}", change.new_value);
                            continue;
                        }
                    }
                }
                keys::HUMANIZE_PREF => self.humanize = decode_flag(change.new_value.as_deref()),
                _ => continue,
            }
            applied += 1;
        }
        if applied > 0 {
            engine_debug!(
                "Synced {} preference change(s): theme={}, humanize={}",
                applied,
                self.theme,
                self.humanize
            );
        }
        applied
    }
}
