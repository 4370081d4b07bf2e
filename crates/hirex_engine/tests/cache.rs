use std::sync::Arc;

use chrono::{Local, TimeZone};
use hirex_core::{
    FitTier, ScoreRound, SubmissionResult, CURRENT_CACHE_VERSION, UNKNOWN_COMPANY, UNKNOWN_ROLE,
};
use hirex_engine::keys;
use hirex_engine::{
    ChangeBus, FileBackend, MemoryBackend, PersistError, ResultCache, StorageAdapter,
};
use tempfile::TempDir;
use pretty_assertions::assert_eq;

fn sample_result() -> SubmissionResult {
    SubmissionResult {
        document_text: "\\documentclass{article}".to_string(),
        primary_pdf_base64: Some("JVBERi0=".to_string()),
        secondary_pdf_base64: None,
        company_name: "Acme".to_string(),
        role_name: "Data Engineer".to_string(),
        humanize_used: true,
        fit_score: Some(87),
        fit_score_history: vec![
            ScoreRound {
                round: 1,
                coverage: 0.6,
            },
            ScoreRound {
                round: 2,
                coverage: 0.873,
            },
        ],
        saved_paths: vec!["/out/resume.pdf".to_string()],
        cache_version: CURRENT_CACHE_VERSION.to_string(),
    }
}

#[test]
fn persisted_result_loads_back_in_a_fresh_cache() {
    let storage = StorageAdapter::in_memory();
    let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
    ResultCache::new(storage.clone())
        .persist_at(&sample_result(), at)
        .unwrap();

    let state = ResultCache::new(storage.new_tab()).load();

    assert!(state.has_result());
    assert_eq!(state.document_text, "\\documentclass{article}");
    assert_eq!(state.primary_pdf_base64.as_deref(), Some("JVBERi0="));
    assert_eq!(state.secondary_pdf_base64, None);
    assert_eq!(state.company_name, "Acme");
    assert_eq!(state.role_name, "Data Engineer");
    assert!(state.humanize_used);
    assert_eq!(state.fit_score, Some(87));
    assert_eq!(state.fit_tier, FitTier::Strong);
    assert_eq!(state.fit_score_history.len(), 2);
    assert_eq!(state.saved_paths, vec!["/out/resume.pdf".to_string()]);
    assert_eq!(state.timestamp, Some(at.to_rfc3339_opts(chrono::SecondsFormat::Secs, false)));
    assert!(!state.version_mismatch);
}

#[test]
fn empty_storage_is_the_no_result_state() {
    let state = ResultCache::new(StorageAdapter::in_memory()).load();

    assert!(!state.has_result());
    assert!(!state.has_any_pdf());
    assert_eq!(state.company_name, UNKNOWN_COMPANY);
    assert_eq!(state.role_name, UNKNOWN_ROLE);
    assert_eq!(state.fit_score, None);
    assert_eq!(state.fit_tier, FitTier::AwaitingAnalysis);
    assert_eq!(state.timestamp, None);
}

#[test]
fn reset_clears_result_keys_and_keeps_preferences() {
    let backend = Arc::new(MemoryBackend::new());
    let storage = StorageAdapter::new(backend.clone(), Arc::new(ChangeBus::new()));
    storage.set(keys::THEME, "dark");
    storage.set(keys::HUMANIZE_PREF, "true");

    let mut result = sample_result();
    result.secondary_pdf_base64 = Some("JVBERi0=".to_string());
    let cache = ResultCache::new(storage.clone());
    cache.persist(&result).unwrap();
    assert_eq!(backend.keys().len(), keys::RESULT_KEYS.len() + 2);

    cache.clear();

    let mut remaining = backend.keys();
    remaining.sort();
    assert_eq!(
        remaining,
        vec!["hirex-humanize-pref".to_string(), "hirex-theme".to_string()]
    );
    let state = cache.load();
    assert!(!state.has_result());
    assert!(state.humanize_preference);
}

#[test]
fn missing_score_is_derived_from_last_round() {
    let storage = StorageAdapter::in_memory();
    let mut result = sample_result();
    result.fit_score = None;
    ResultCache::new(storage.clone()).persist(&result).unwrap();

    assert_eq!(storage.get(keys::FIT_SCORE), None);
    let state = ResultCache::new(storage).load();
    assert_eq!(state.fit_score, Some(87));
    assert_eq!(state.fit_tier, FitTier::Strong);
}

#[test]
fn version_mismatch_is_flagged_not_purged() {
    let storage = StorageAdapter::in_memory();
    let mut result = sample_result();
    result.cache_version = "hirex-cache-v1".to_string();
    ResultCache::new(storage.clone()).persist(&result).unwrap();

    let state = ResultCache::new(storage).load();
    assert!(state.version_mismatch);
    assert!(state.has_result());
    assert_eq!(state.cache_version.as_deref(), Some("hirex-cache-v1"));
}

#[test]
fn empty_document_is_never_persisted() {
    let backend = Arc::new(MemoryBackend::new());
    let storage = StorageAdapter::new(backend.clone(), Arc::new(ChangeBus::new()));
    let mut result = sample_result();
    result.document_text = "   ".to_string();

    let err = ResultCache::new(storage).persist(&result).unwrap_err();

    assert_eq!(err, PersistError::EmptyDocument);
    assert!(backend.keys().is_empty());
}

#[test]
fn write_failure_names_the_key() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_fail_writes(true);
    let storage = StorageAdapter::new(backend, Arc::new(ChangeBus::new()));

    let err = ResultCache::new(storage).persist(&sample_result()).unwrap_err();

    assert_eq!(
        err,
        PersistError::WriteFailed {
            key: keys::TEX.to_string()
        }
    );
}

#[test]
fn failed_overwrite_leaves_no_mixed_record() {
    let temp = TempDir::new().unwrap();
    let backend = Arc::new(FileBackend::with_quota(temp.path().join("store.ron"), 4096));
    let storage = StorageAdapter::new(backend, Arc::new(ChangeBus::new()));
    let cache = ResultCache::new(storage.clone());
    storage.set(keys::THEME, "dark");

    let mut old = sample_result();
    old.company_name = "OldCo".to_string();
    old.primary_pdf_base64 = Some("T0xE".to_string());
    cache.persist(&old).unwrap();

    let mut new = sample_result();
    new.document_text = "NEW TEXT".to_string();
    new.company_name = "NewCo".to_string();
    new.primary_pdf_base64 = Some("A".repeat(8000));
    let err = cache.persist(&new).unwrap_err();

    assert_eq!(
        err,
        PersistError::WriteFailed {
            key: keys::PDF.to_string()
        }
    );
    let state = cache.load();
    assert!(!state.has_result());
    assert_eq!(state.company_name, UNKNOWN_COMPANY);
    assert_eq!(state.primary_pdf_base64, None);
    assert_eq!(storage.get(keys::THEME).as_deref(), Some("dark"));
}

#[test]
fn binaries_without_text_are_dropped_on_load() {
    let storage = StorageAdapter::in_memory();
    storage.set(keys::PDF, "JVBERi0=");
    storage.set(keys::COMPANY, "Acme");

    let state = ResultCache::new(storage).load();

    assert!(!state.has_result());
    assert!(!state.has_any_pdf());
    assert_eq!(state.company_name, "Acme");
}

#[test]
fn other_tabs_see_result_changes() {
    let storage = StorageAdapter::in_memory();
    let watcher = ResultCache::new(storage.new_tab());

    ResultCache::new(storage.clone()).persist(&sample_result()).unwrap();
    storage.set(keys::THEME, "dark");

    let changes = watcher.poll_changes();
    assert!(changes.iter().any(|c| c.key == keys::TEX));
    assert!(changes.iter().all(|c| c.key != keys::THEME));
    assert!(watcher.poll_changes().is_empty());
}
