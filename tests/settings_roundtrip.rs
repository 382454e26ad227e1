//! Integration tests for loading and saving settings documents on disk
//!
//! These tests drive `AppSettings` through the public API against real files
//! in a temporary directory.

use std::fs;
use std::path::Path;

use magnifier_settings::config::{
    AppSettings, CaptureMode, ConfigLocations, Cropping, CursorScaling, EffectInstance, FixedAnswer,
    FsStorage, LoadError, NewProfile, ProfileFlags, ProfileRef, ScalingMode, ScalingType, Theme,
    WindowRect,
};
use magnifier_settings::hotkeys::{HotkeyAction, HotkeySettings};
use serde_json::Value;
use tempfile::TempDir;

fn locations(dir: &TempDir) -> ConfigLocations {
    ConfigLocations::new(dir.path().join("app").join("config"), dir.path().join("data").join("config"))
}

fn load(dir: &TempDir) -> AppSettings {
    AppSettings::load(locations(dir), FsStorage, &FixedAnswer(false)).expect("Failed to load settings")
}

fn write_document(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn profile(name: &str, path: &str, class_name: &str) -> NewProfile {
    NewProfile {
        name: name.to_string(),
        is_packaged: false,
        path_rule: path.to_string(),
        class_name_rule: class_name.to_string(),
    }
}

#[test]
fn test_full_session_survives_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let settings = load(&dir);

    settings.set_theme(Theme::Light);
    settings.set_window_placement(WindowRect { x: 120, y: -8, width: 1600, height: 900 }, true);
    settings.set_hotkey(HotkeyAction::Scale, HotkeySettings::new(0x7B, false, true, false, false));
    settings.set_auto_restore(true);
    settings.set_down_count(0);
    settings.set_disable_effect_cache(true);
    settings.set_save_effect_sources(true);
    settings.set_simulate_exclusive_fullscreen(true);
    settings.set_always_run_as_elevated(true);
    settings.set_show_tray_icon(false);
    settings.set_downscaling_effect(Some(EffectInstance::new("Lanczos").with_parameter("ARStrength", 0.25)));

    let mode = settings.add_scaling_mode(ScalingMode::new(
        "Sharp fill",
        vec![
            EffectInstance::new("Jinc").with_scaling_type(ScalingType::Fill),
            EffectInstance::new("Sharpen\\CAS")
                .with_scaling_type(ScalingType::Absolute)
                .with_scale(2560.0, 1440.0)
                .with_parameter("sharpness", 0.4),
        ],
    ));

    settings.add_profile(profile("Emulator", "D:\\Emu\\emu.exe", "EmuWindow"), None).unwrap();
    settings.add_profile(profile("Browser", "C:\\Browser\\browser.exe", "BrowserFrame"), None).unwrap();
    settings
        .update_profile(ProfileRef::User(0), |p| {
            p.scaling_mode = mode as i32;
            p.capture_mode = CaptureMode::DwmSharedSurface;
            p.cursor_scaling = CursorScaling::X1_5;
            p.set_flag(ProfileFlags::IS_3D_GAME_MODE, true);
            p.set_flag(ProfileFlags::DRAW_CURSOR, false);
            p.is_cropping_enabled = true;
            p.cropping = Cropping { left: 8.0, top: 30.5, right: 8.0, bottom: 8.0 };
        })
        .unwrap();

    settings.save().unwrap();
    let reloaded = load(&dir);

    assert_eq!(*reloaded.model(), *settings.model());
    assert_eq!(reloaded.theme(), Theme::Light);
    assert_eq!(reloaded.hotkey(HotkeyAction::Scale).to_string(), "Ctrl+0x7B");
    assert_eq!(
        reloaded.find_profile("d:\\emu\\EMU.exe", "EmuWindow", false),
        ProfileRef::User(0)
    );
}

#[test]
fn test_saved_document_layout() {
    let dir = tempfile::tempdir().unwrap();
    let settings = load(&dir);
    settings.add_profile(profile("Game", "C:\\game.exe", "GameWindow"), None).unwrap();
    settings.save().unwrap();

    let text = fs::read_to_string(settings.config_path()).unwrap();
    let document: Value = serde_json::from_str(&text).unwrap();

    assert_eq!(document["version"], 0);
    assert_eq!(document["theme"], 2);
    assert_eq!(document["downCount"], 5);
    assert_eq!(document["downscalingEffect"]["name"], "Bicubic");
    assert_eq!(document["scalingModes"].as_array().unwrap().len(), 7);

    let profiles = document["scalingProfiles"].as_array().unwrap();
    assert_eq!(profiles.len(), 2);
    assert!(profiles[0].get("name").is_none());
    assert_eq!(profiles[1]["name"], "Game");
    assert_eq!(profiles[1]["scalingMode"], -1);
    assert_eq!(profiles[1]["VSync"], true);
    assert_eq!(profiles[1]["3DGameMode"], false);

    // Saving twice gives the same bytes
    settings.save().unwrap();
    assert_eq!(fs::read_to_string(settings.config_path()).unwrap(), text);
}

#[test]
fn test_malformed_entries_fall_back_independently() {
    let dir = tempfile::tempdir().unwrap();
    write_document(
        &locations(&dir).config_path(false),
        r#"{
            "theme": "dark",
            "downCount": 3,
            "hotkeys": { "scale": 4096, "overlay": 2375 },
            "scalingModes": [ { "name": "Only", "effects": [ { "name": "Nearest" } ] } ],
            "scalingProfiles": [
                { "scalingMode": 0, "showFPS": true },
                { "name": "One", "packaged": false, "pathRule": "a.exe", "classNameRule": "A" },
                { "name": "Two", "packaged": false, "classNameRule": "B" },
                { "name": "Three", "packaged": true, "pathRule": "c", "classNameRule": "C", "scalingMode": 4 }
            ]
        }"#,
    );

    let settings = load(&dir);
    let profiles = settings.profiles();

    assert_eq!(settings.theme(), Theme::System);
    assert_eq!(settings.down_count(), 3);
    assert_eq!(settings.hotkey(HotkeyAction::Scale).to_string(), "Win+Shift+A");
    assert_eq!(settings.hotkey(HotkeyAction::Overlay).to_string(), "Win+Shift+G");
    assert_eq!(settings.scaling_modes().len(), 1);
    assert!(settings.downscaling_effect().is_none());

    assert_eq!(profiles.default_profile().scaling_mode, 0);
    assert!(profiles.default_profile().has_flag(ProfileFlags::SHOW_FPS));
    let names: Vec<&str> = profiles.profiles().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["One", "Three"]);
    assert_eq!(profiles.get_profile(1).unwrap().scaling_mode, -1);
}

#[test]
fn test_declined_future_document_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let portable_path = locations(&dir).config_path(true);
    let text = r#"{ "version": 9, "theme": 1, "futureKey": [1, 2, 3] }"#;
    write_document(&portable_path, text);

    let result = AppSettings::load(locations(&dir), FsStorage, &FixedAnswer(false));

    assert!(matches!(result, Err(LoadError::FutureVersionDeclined { found: 9, .. })));
    assert_eq!(fs::read_to_string(&portable_path).unwrap(), text);
}

#[test]
fn test_declined_future_user_document_saves_portably() {
    let dir = tempfile::tempdir().unwrap();
    let user_path = locations(&dir).config_path(false);
    let text = r#"{ "version": 2 }"#;
    write_document(&user_path, text);

    let settings = load(&dir);
    assert!(settings.is_portable_mode());
    settings.shutdown().unwrap();

    assert!(locations(&dir).config_path(true).exists());
    assert_eq!(fs::read_to_string(&user_path).unwrap(), text);
}
