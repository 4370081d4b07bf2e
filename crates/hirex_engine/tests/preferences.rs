use hirex_engine::{keys, Preferences, StorageAdapter, Theme};

#[test]
fn defaults_when_nothing_stored() {
    let prefs = Preferences::load(StorageAdapter::in_memory());
    assert_eq!(prefs.theme(), Theme::Light);
    assert!(!prefs.humanize());
}

#[test]
fn changes_in_one_tab_reach_the_other_on_sync() {
    let storage = StorageAdapter::in_memory();
    let mut tab_a = Preferences::load(storage.clone());
    let mut tab_b = Preferences::load(storage.new_tab());

    assert_eq!(tab_a.toggle_theme(), Theme::Dark);
    assert!(tab_a.set_humanize(true));
    assert_eq!(tab_b.theme(), Theme::Light);

    assert_eq!(tab_b.sync(), 2);
    assert_eq!(tab_b.theme(), Theme::Dark);
    assert!(tab_b.humanize());

    // Own writes are not echoed back.
    assert_eq!(tab_a.sync(), 0);
}

#[test]
fn removed_theme_falls_back_to_default() {
    let storage = StorageAdapter::in_memory();
    storage.set(keys::THEME, "dark");
    let mut prefs = Preferences::load(storage.new_tab());
    assert_eq!(prefs.theme(), Theme::Dark);

    storage.set(keys::THEME, "sepia");
    assert_eq!(prefs.sync(), 0);
    assert_eq!(prefs.theme(), Theme::Dark);

    storage.remove(keys::THEME);
    assert_eq!(prefs.sync(), 1);
    assert_eq!(prefs.theme(), Theme::Light);
}

#[test]
fn preferences_persist_across_loads() {
    let storage = StorageAdapter::in_memory();
    let mut prefs = Preferences::load(storage.clone());
    prefs.set_theme(Theme::Dark);
    prefs.set_humanize(true);

    let reloaded = Preferences::load(storage);
    assert_eq!(reloaded.theme(), Theme::Dark);
    assert!(reloaded.humanize());
}
