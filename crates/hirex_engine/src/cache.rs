use chrono::{DateTime, Local, SecondsFormat};
use engine_logging::{engine_debug, engine_info, engine_warn};
use hirex_core::{
    derive_fit_score, CachedState, FitTier, ScoreRound, SubmissionResult, CURRENT_CACHE_VERSION,
};
use thiserror::Error;

use crate::events::{StorageChange, Subscription};
use crate::keys::{self, decode_flag, encode_flag};
use crate::storage::StorageAdapter;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    #[error("refusing to cache a result without document text")]
    EmptyDocument,
    #[error("could not write {key}")]
    WriteFailed { key: String },
}

/// Persists submission results and rebuilds [`CachedState`] from them.
pub struct ResultCache {
    storage: StorageAdapter,
    subscription: Subscription,
}

impl ResultCache {
    pub fn new(storage: StorageAdapter) -> Self {
        let subscription = storage.subscribe();
        Self {
            storage,
            subscription,
        }
    }

    pub fn storage(&self) -> &StorageAdapter {
        &self.storage
    }

    pub fn persist(&self, result: &SubmissionResult) -> Result<(), PersistError> {
        self.persist_at(result, Local::now())
    }

    /// Writes every field of `result` under its own key, stamped with `at`.
    ///
    /// A record is either complete or absent: if any write fails, every result
    /// key is removed so the previous result cannot mix with the new one.
    pub fn persist_at(
        &self,
        result: &SubmissionResult,
        at: DateTime<Local>,
    ) -> Result<(), PersistError> {
        if result.document_text.trim().is_empty() {
            return Err(PersistError::EmptyDocument);
        }
        if let Err(err) = self.write_fields(result, at) {
            engine_warn!("{}; dropping the partially written result", err);
            self.clear();
            return Err(err);
        }

        engine_info!(
            "Cached result for {} at {} ({} chars)",
            result.role_name,
            result.company_name,
            result.document_text.len()
        );
        Ok(())
    }

    fn write_fields(
        &self,
        result: &SubmissionResult,
        at: DateTime<Local>,
    ) -> Result<(), PersistError> {
        self.put(keys::TEX, &result.document_text)?;
        self.put_optional(keys::PDF, result.primary_pdf_base64.as_deref())?;
        self.put_optional(keys::PDF_HUMANIZED, result.secondary_pdf_base64.as_deref())?;
        self.put(
            keys::TIMESTAMP,
            &at.to_rfc3339_opts(SecondsFormat::Secs, false),
        )?;
        self.put(keys::COMPANY, &result.company_name)?;
        self.put(keys::ROLE, &result.role_name)?;
        self.put(keys::USE_HUMANIZE, encode_flag(result.humanize_used))?;
        self.put(keys::VERSION, &result.cache_version)?;
        self.put_json(keys::SAVED_PATHS, &result.saved_paths)?;
        match result.fit_score {
            Some(score) => self.put(keys::FIT_SCORE, &score.to_string())?,
            None => self.storage.remove(keys::FIT_SCORE),
        }
        self.put_json(keys::FIT_HISTORY, &result.fit_score_history)
    }

    /// Every key is read independently; anything missing or malformed falls
    /// back to its default.
    pub fn load(&self) -> CachedState {
        let mut state = CachedState::default();

        let document_text = self.storage.get(keys::TEX).unwrap_or_default();
        if !document_text.trim().is_empty() {
            state.document_text = document_text;
            state.primary_pdf_base64 = self.non_blank(keys::PDF);
            state.secondary_pdf_base64 = self.non_blank(keys::PDF_HUMANIZED);
        } else if self.storage.get(keys::PDF).is_some() {
            engine_warn!("Cached binaries without document text are ignored");
        }

        state.timestamp = self.non_blank(keys::TIMESTAMP);
        if let Some(company) = self.non_blank(keys::COMPANY) {
            state.company_name = company;
        }
        if let Some(role) = self.non_blank(keys::ROLE) {
            state.role_name = role;
        }
        state.humanize_used = decode_flag(self.storage.get(keys::USE_HUMANIZE).as_deref());
        state.saved_paths = self.storage.get_json_or_default(keys::SAVED_PATHS);
        state.fit_score_history = self
            .storage
            .get_json_or_default::<Vec<ScoreRound>>(keys::FIT_HISTORY);

        state.fit_score = self
            .non_blank(keys::FIT_SCORE)
            .and_then(|raw| raw.parse::<f64>().ok())
            .and_then(|score| derive_fit_score(Some(score), None).value())
            .or_else(|| {
                let last = state.fit_score_history.last()?;
                derive_fit_score(None, Some(last.coverage)).value()
            });
        state.fit_tier = FitTier::from_score(state.fit_score);
        state.humanize_preference = decode_flag(self.storage.get(keys::HUMANIZE_PREF).as_deref());

        state.cache_version = self.non_blank(keys::VERSION);
        if let Some(version) = state.cache_version.as_deref() {
            if version != CURRENT_CACHE_VERSION {
                engine_warn!(
                    "Cached result has version {}, expected {}",
                    version,
                    CURRENT_CACHE_VERSION
                );
                state.version_mismatch = true;
            }
        }
        state
    }

    /// Removes the result keys. Preferences are left alone.
    pub fn clear(&self) {
        for key in keys::RESULT_KEYS {
            self.storage.remove(key);
        }
        engine_info!("Cleared cached result");
    }

    /// Result keys changed by another adapter since the last poll.
    pub fn poll_changes(&self) -> Vec<StorageChange> {
        let changes: Vec<_> = self
            .subscription
            .drain()
            .into_iter()
            .filter(|change| keys::RESULT_KEYS.contains(&change.key.as_str()))
            .collect();
        if !changes.is_empty() {
            engine_debug!("{} cached field(s) changed elsewhere", changes.len());
        }
        changes
    }

    fn non_blank(&self, key: &str) -> Option<String> {
        self.storage.get(key).filter(|v| !v.trim().is_empty())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), PersistError> {
        if self.storage.set(key, value) {
            Ok(())
        } else {
            Err(PersistError::WriteFailed {
                key: key.to_string(),
            })
        }
    }

    fn put_optional(&self, key: &str, value: Option<&str>) -> Result<(), PersistError> {
        match value {
            Some(value) => self.put(key, value),
            None => {
                self.storage.remove(key);
                Ok(())
            }
        }
    }

    fn put_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<(), PersistError> {
        if self.storage.set_json(key, value) {
            Ok(())
        } else {
            Err(PersistError::WriteFailed {
                key: key.to_string(),
            })
        }
    }
}
