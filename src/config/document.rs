//! Settings document codec
//!
//! Decoding is defensive: the text is parsed into a `serde_json::Value`, the
//! root must be an object, and from there every section and leaf is read on
//! its own. A missing or mistyped entry is skipped and the model keeps its
//! default for it; nothing below the root can fail the load.
//!
//! Encoding goes through borrowed `Serialize` structs so keys are always
//! written in the same order.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::config::SETTINGS_VERSION;
use crate::hotkeys::{HotkeyAction, HotkeySettings};

use super::model::{SettingsModel, Theme};
use super::profile::{
    CaptureMode, Cropping, CursorInterpolationMode, CursorScaling, MultiMonitorUsage, ProfileFlags,
    ScalingProfile,
};
use super::scaling_mode::{EffectInstance, ScalingModeDocument, ScalingModeRegistry, read_parameters};

/// Structural problems that make a document unusable
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("settings document is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("settings document root is not an object")]
    RootNotObject,
}

/// Document key → profile flag, in the order they are written
const PROFILE_FLAG_KEYS: [(&str, ProfileFlags); 9] = [
    ("disableWindowResizing", ProfileFlags::DISABLE_WINDOW_RESIZING),
    ("3DGameMode", ProfileFlags::IS_3D_GAME_MODE),
    ("showFPS", ProfileFlags::SHOW_FPS),
    ("VSync", ProfileFlags::VSYNC),
    ("tripleBuffering", ProfileFlags::TRIPLE_BUFFERING),
    ("reserveTitleBar", ProfileFlags::RESERVE_TITLE_BAR),
    ("adjustCursorSpeed", ProfileFlags::ADJUST_CURSOR_SPEED),
    ("drawCursor", ProfileFlags::DRAW_CURSOR),
    ("disableDirectFlip", ProfileFlags::DISABLE_DIRECT_FLIP),
];

// ==============================================================================
// Leaf readers
// ==============================================================================

/// Read `key` with `convert`; `None` when absent or of the wrong shape
fn read_with<'a, T>(
    obj: &'a Map<String, Value>,
    key: &str,
    convert: impl FnOnce(&'a Value) -> Option<T>,
) -> Option<T> {
    let value = obj.get(key)?;
    let converted = convert(value);
    if converted.is_none() {
        debug!(key = %key, value = %value, "Ignoring settings entry with unexpected value");
    }
    converted
}

pub(crate) fn read_bool(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    read_with(obj, key, Value::as_bool)
}

pub(crate) fn read_u32(obj: &Map<String, Value>, key: &str) -> Option<u32> {
    read_with(obj, key, |v| v.as_u64().and_then(|n| u32::try_from(n).ok()))
}

pub(crate) fn read_i32(obj: &Map<String, Value>, key: &str) -> Option<i32> {
    read_with(obj, key, |v| v.as_i64().and_then(|n| i32::try_from(n).ok()))
}

pub(crate) fn read_f32(obj: &Map<String, Value>, key: &str) -> Option<f32> {
    read_with(obj, key, |v| v.as_f64().map(|n| n as f32))
}

pub(crate) fn read_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    read_with(obj, key, |v| v.as_str().map(str::to_owned))
}

pub(crate) fn read_object<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    read_with(obj, key, Value::as_object)
}

pub(crate) fn read_array<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Vec<Value>> {
    read_with(obj, key, Value::as_array)
}

fn read_enum<T>(obj: &Map<String, Value>, key: &str, from_u32: fn(u32) -> Option<T>) -> Option<T> {
    let raw = read_u32(obj, key)?;
    let value = from_u32(raw);
    if value.is_none() {
        debug!(key = %key, value = raw, "Ignoring unknown enum value");
    }
    value
}

fn assign<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

// ==============================================================================
// Decoding
// ==============================================================================

/// Parse document text and check that the root is an object
pub fn parse(text: &str) -> Result<Map<String, Value>, DocumentError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(root) => Ok(root),
        _ => Err(DocumentError::RootNotObject),
    }
}

/// Schema version of a parsed document; 0 when absent
pub fn read_version(root: &Map<String, Value>) -> u32 {
    read_u32(root, "version").unwrap_or(0)
}

/// Build a model from a parsed document. Never fails; see the module docs.
///
/// Hotkeys left unset are *not* back-filled here so callers can tell which
/// actions the document actually bound.
pub fn decode(root: &Map<String, Value>) -> SettingsModel {
    let mut model = SettingsModel::default();

    assign(&mut model.theme, read_enum(root, "theme", Theme::from_u32));

    if let Some(window_pos) = read_object(root, "windowPos") {
        if let (Some(x), Some(y)) = (read_i32(window_pos, "x"), read_i32(window_pos, "y")) {
            model.window_rect.x = x;
            model.window_rect.y = y;
        }
        if let (Some(width), Some(height)) = (read_u32(window_pos, "width"), read_u32(window_pos, "height")) {
            model.window_rect.width = width;
            model.window_rect.height = height;
        }
        assign(&mut model.is_window_maximized, read_bool(window_pos, "maximized"));
    }

    if let Some(hotkeys) = read_object(root, "hotkeys") {
        for action in HotkeyAction::ALL {
            if let Some(packed) = read_u32(hotkeys, action.key()) {
                if !HotkeySettings::decode_into(packed, &mut model.hotkeys[action]) {
                    warn!(action = %action, value = packed, "Ignoring malformed hotkey");
                }
            }
        }
    }

    assign(&mut model.auto_restore, read_bool(root, "autoRestore"));
    assign(&mut model.down_count, read_u32(root, "downCount"));
    assign(&mut model.debug_mode, read_bool(root, "debugMode"));
    assign(&mut model.disable_effect_cache, read_bool(root, "disableEffectCache"));
    assign(&mut model.save_effect_sources, read_bool(root, "saveEffectSources"));
    assign(&mut model.warnings_are_errors, read_bool(root, "warningsAreErrors"));
    assign(&mut model.simulate_exclusive_fullscreen, read_bool(root, "simulateExclusiveFullscreen"));
    assign(&mut model.always_run_as_elevated, read_bool(root, "alwaysRunAsElevated"));
    assign(&mut model.show_tray_icon, read_bool(root, "showTrayIcon"));
    assign(&mut model.inline_params, read_bool(root, "inlineParams"));

    model.downscaling_effect = read_object(root, "downscalingEffect").and_then(decode_downscaling_effect);

    if let Some(registry) = ScalingModeRegistry::import(root) {
        model.scaling_modes = registry;
    }

    if let Some(entries) = read_array(root, "scalingProfiles") {
        decode_profiles(entries, &mut model);
    }

    let reset = model.clamp_profile_scaling_modes();
    if reset > 0 {
        warn!(count = reset, "Profiles referenced missing scaling modes, reset to none");
    }

    model
}

fn decode_downscaling_effect(obj: &Map<String, Value>) -> Option<EffectInstance> {
    let name = read_string(obj, "name").filter(|name| !name.is_empty())?;
    let mut effect = EffectInstance::new(name);
    if let Some(parameters) = read_object(obj, "parameters") {
        effect.parameters = read_parameters(parameters);
    }
    Some(effect)
}

/// Element 0 is the default profile, the rest are user profiles
fn decode_profiles(entries: &[Value], model: &mut SettingsModel) {
    let Some((first, rest)) = entries.split_first() else {
        return;
    };

    if let Some(obj) = first.as_object() {
        // The default profile has no identity to validate, so it always loads
        if let Some(profile) = decode_profile(obj, true) {
            model.profiles.set_default_profile(profile);
        }
    }

    for (position, entry) in rest.iter().enumerate() {
        let Some(obj) = entry.as_object() else {
            debug!(position = position + 1, "Ignoring scaling profile that is not an object");
            continue;
        };
        match decode_profile(obj, false) {
            Some(profile) => {
                model.profiles.push_loaded(profile);
            }
            None => warn!(position = position + 1, "Ignoring scaling profile without a valid name or match rules"),
        }
    }
}

fn decode_profile(obj: &Map<String, Value>, is_default: bool) -> Option<ScalingProfile> {
    let mut profile = ScalingProfile::default();

    if !is_default {
        profile.name = read_string(obj, "name").filter(|s| !s.is_empty())?;
        profile.is_packaged = read_bool(obj, "packaged")?;
        profile.path_rule = read_string(obj, "pathRule").filter(|s| !s.is_empty())?;
        profile.class_name_rule = read_string(obj, "classNameRule").filter(|s| !s.is_empty())?;
    }

    assign(&mut profile.scaling_mode, read_i32(obj, "scalingMode"));
    assign(&mut profile.capture_mode, read_enum(obj, "captureMode", CaptureMode::from_u32));
    assign(
        &mut profile.multi_monitor_usage,
        read_enum(obj, "multiMonitorUsage", MultiMonitorUsage::from_u32),
    );
    assign(&mut profile.graphics_adapter, read_u32(obj, "graphicsAdapter"));

    for (key, flag) in PROFILE_FLAG_KEYS {
        if let Some(enabled) = read_bool(obj, key) {
            profile.flags.set(flag, enabled);
        }
    }

    assign(&mut profile.cursor_scaling, read_enum(obj, "cursorScaling", CursorScaling::from_u32));
    assign(&mut profile.custom_cursor_scaling, read_f32(obj, "customCursorScaling"));
    assign(
        &mut profile.cursor_interpolation_mode,
        read_enum(obj, "cursorInterpolationMode", CursorInterpolationMode::from_u32),
    );

    assign(&mut profile.is_cropping_enabled, read_bool(obj, "croppingEnabled"));
    if let Some(cropping) = read_object(obj, "cropping") {
        // All four sides or nothing
        profile.cropping = match (
            read_f32(cropping, "left"),
            read_f32(cropping, "top"),
            read_f32(cropping, "right"),
            read_f32(cropping, "bottom"),
        ) {
            (Some(left), Some(top), Some(right), Some(bottom)) => Cropping { left, top, right, bottom },
            _ => Cropping::default(),
        };
    }

    Some(profile)
}

// ==============================================================================
// Encoding
// ==============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingsDocument<'a> {
    version: u32,
    theme: u32,
    window_pos: WindowPosDocument,
    hotkeys: HotkeysDocument,
    auto_restore: bool,
    down_count: u32,
    debug_mode: bool,
    disable_effect_cache: bool,
    save_effect_sources: bool,
    warnings_are_errors: bool,
    simulate_exclusive_fullscreen: bool,
    always_run_as_elevated: bool,
    show_tray_icon: bool,
    inline_params: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    downscaling_effect: Option<DownscalingEffectDocument<'a>>,
    scaling_modes: Vec<ScalingModeDocument<'a>>,
    scaling_profiles: Vec<ProfileDocument<'a>>,
}

#[derive(Serialize)]
struct WindowPosDocument {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    maximized: bool,
}

#[derive(Serialize)]
struct HotkeysDocument {
    scale: u32,
    overlay: u32,
}

#[derive(Serialize)]
struct DownscalingEffectDocument<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<&'a BTreeMap<String, f32>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileIdentityDocument<'a> {
    name: &'a str,
    packaged: bool,
    path_rule: &'a str,
    class_name_rule: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDocument<'a> {
    #[serde(flatten)]
    identity: Option<ProfileIdentityDocument<'a>>,
    scaling_mode: i32,
    capture_mode: u32,
    multi_monitor_usage: u32,
    graphics_adapter: u32,
    disable_window_resizing: bool,
    #[serde(rename = "3DGameMode")]
    is_3d_game_mode: bool,
    #[serde(rename = "showFPS")]
    show_fps: bool,
    #[serde(rename = "VSync")]
    vsync: bool,
    triple_buffering: bool,
    reserve_title_bar: bool,
    adjust_cursor_speed: bool,
    draw_cursor: bool,
    disable_direct_flip: bool,
    cursor_scaling: u32,
    custom_cursor_scaling: f32,
    cursor_interpolation_mode: u32,
    cropping_enabled: bool,
    cropping: CroppingDocument,
}

#[derive(Serialize)]
struct CroppingDocument {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl<'a> ProfileDocument<'a> {
    fn new(profile: &'a ScalingProfile) -> Self {
        let identity = (!profile.is_default()).then(|| ProfileIdentityDocument {
            name: &profile.name,
            packaged: profile.is_packaged,
            path_rule: &profile.path_rule,
            class_name_rule: &profile.class_name_rule,
        });
        let flag = |flag| profile.has_flag(flag);

        Self {
            identity,
            scaling_mode: profile.scaling_mode,
            capture_mode: profile.capture_mode.as_u32(),
            multi_monitor_usage: profile.multi_monitor_usage.as_u32(),
            graphics_adapter: profile.graphics_adapter,
            disable_window_resizing: flag(ProfileFlags::DISABLE_WINDOW_RESIZING),
            is_3d_game_mode: flag(ProfileFlags::IS_3D_GAME_MODE),
            show_fps: flag(ProfileFlags::SHOW_FPS),
            vsync: flag(ProfileFlags::VSYNC),
            triple_buffering: flag(ProfileFlags::TRIPLE_BUFFERING),
            reserve_title_bar: flag(ProfileFlags::RESERVE_TITLE_BAR),
            adjust_cursor_speed: flag(ProfileFlags::ADJUST_CURSOR_SPEED),
            draw_cursor: flag(ProfileFlags::DRAW_CURSOR),
            disable_direct_flip: flag(ProfileFlags::DISABLE_DIRECT_FLIP),
            cursor_scaling: profile.cursor_scaling.as_u32(),
            custom_cursor_scaling: profile.custom_cursor_scaling,
            cursor_interpolation_mode: profile.cursor_interpolation_mode.as_u32(),
            cropping_enabled: profile.is_cropping_enabled,
            cropping: CroppingDocument {
                left: profile.cropping.left,
                top: profile.cropping.top,
                right: profile.cropping.right,
                bottom: profile.cropping.bottom,
            },
        }
    }
}

/// Serialize the whole model as pretty-printed JSON with a fixed key order
pub fn encode(model: &SettingsModel) -> Result<String, serde_json::Error> {
    let document = SettingsDocument {
        version: SETTINGS_VERSION,
        theme: model.theme.as_u32(),
        window_pos: WindowPosDocument {
            x: model.window_rect.x,
            y: model.window_rect.y,
            width: model.window_rect.width,
            height: model.window_rect.height,
            maximized: model.is_window_maximized,
        },
        hotkeys: HotkeysDocument {
            scale: model.hotkeys[HotkeyAction::Scale].encode(),
            overlay: model.hotkeys[HotkeyAction::Overlay].encode(),
        },
        auto_restore: model.auto_restore,
        down_count: model.down_count,
        debug_mode: model.debug_mode,
        disable_effect_cache: model.disable_effect_cache,
        save_effect_sources: model.save_effect_sources,
        warnings_are_errors: model.warnings_are_errors,
        simulate_exclusive_fullscreen: model.simulate_exclusive_fullscreen,
        always_run_as_elevated: model.always_run_as_elevated,
        show_tray_icon: model.show_tray_icon,
        inline_params: model.inline_params,
        downscaling_effect: model
            .downscaling_effect
            .as_ref()
            .filter(|effect| !effect.name.is_empty())
            .map(|effect| DownscalingEffectDocument {
                name: &effect.name,
                parameters: (!effect.parameters.is_empty()).then_some(&effect.parameters),
            }),
        scaling_modes: model.scaling_modes.export(),
        scaling_profiles: model.profiles.iter_all().map(ProfileDocument::new).collect(),
    };

    serde_json::to_string_pretty(&document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::WindowRect;
    use crate::config::profile::NewProfile;
    use crate::config::scaling_mode::{ScalingMode, ScalingType};
    use serde_json::json;

    fn decode_value(value: Value) -> SettingsModel {
        decode(value.as_object().unwrap())
    }

    fn user_profile(name: &str, path: &str, class_name: &str) -> Value {
        json!({ "name": name, "packaged": false, "pathRule": path, "classNameRule": class_name })
    }

    fn populated_model() -> SettingsModel {
        let mut model = SettingsModel::first_run();
        model.theme = Theme::Dark;
        model.window_rect = WindowRect { x: -40, y: 25, width: 1024, height: 700 };
        model.is_window_maximized = true;
        model.hotkeys[HotkeyAction::Overlay] = HotkeySettings::new(0x70, false, true, true, false);
        model.auto_restore = true;
        model.down_count = 12;
        model.debug_mode = true;
        model.warnings_are_errors = true;
        model.show_tray_icon = false;
        model.inline_params = true;
        model.scaling_modes.push(ScalingMode::new(
            "Custom",
            vec![EffectInstance::new("Sharpen\\CAS")
                .with_scaling_type(ScalingType::Absolute)
                .with_scale(1920.0, 1080.0)
                .with_parameter("sharpness", 0.33)],
        ));

        let default = model.profiles.default_profile_mut();
        default.scaling_mode = 1;
        default.set_flag(ProfileFlags::SHOW_FPS, true);

        let index = model
            .profiles
            .add_profile(
                NewProfile {
                    name: "Game".to_string(),
                    is_packaged: true,
                    path_rule: "Vendor.Game_abc123!App".to_string(),
                    class_name_rule: "Windows.UI.Core.CoreWindow".to_string(),
                },
                None,
            )
            .unwrap();
        let profile = model.profiles.get_profile_mut(index).unwrap();
        profile.scaling_mode = 7;
        profile.capture_mode = CaptureMode::DesktopDuplication;
        profile.multi_monitor_usage = MultiMonitorUsage::All;
        profile.graphics_adapter = 2;
        profile.set_flag(ProfileFlags::VSYNC, false);
        profile.set_flag(ProfileFlags::DISABLE_WINDOW_RESIZING, true);
        profile.set_flag(ProfileFlags::DISABLE_DIRECT_FLIP, true);
        profile.cursor_scaling = CursorScaling::Custom;
        profile.custom_cursor_scaling = 1.37;
        profile.cursor_interpolation_mode = CursorInterpolationMode::Bilinear;
        profile.is_cropping_enabled = true;
        profile.cropping = Cropping { left: 1.5, top: 31.0, right: 0.25, bottom: 8.0 };
        model
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let model = populated_model();
        let text = encode(&model).unwrap();
        let decoded = decode(&parse(&text).unwrap());
        assert_eq!(decoded, model);
    }

    #[test]
    fn test_encode_key_order() {
        let text = encode(&SettingsModel::first_run()).unwrap();
        // Parsed maps are sorted, so compare positions in the raw text
        let mut positions: Vec<(usize, &str)> = [
            "version", "theme", "windowPos", "hotkeys", "autoRestore", "downCount", "debugMode",
            "disableEffectCache", "saveEffectSources", "warningsAreErrors",
            "simulateExclusiveFullscreen", "alwaysRunAsElevated", "showTrayIcon", "inlineParams",
            "downscalingEffect", "scalingModes", "scalingProfiles",
        ]
        .into_iter()
        .map(|key| (text.find(&format!("\"{key}\"")).unwrap(), key))
        .collect();
        let expected: Vec<&str> = positions.iter().map(|(_, key)| *key).collect();
        positions.sort();
        let actual: Vec<&str> = positions.iter().map(|(_, key)| *key).collect();

        assert_eq!(actual, expected);
        assert_eq!(parse(&text).unwrap().len(), expected.len());
    }

    #[test]
    fn test_encode_default_profile_first_without_identity() {
        let model = populated_model();
        let value: Value = serde_json::from_str(&encode(&model).unwrap()).unwrap();
        let profiles = value["scalingProfiles"].as_array().unwrap();

        assert_eq!(profiles.len(), 2);
        assert!(profiles[0].get("name").is_none());
        assert!(profiles[0].get("pathRule").is_none());
        assert_eq!(profiles[0]["showFPS"], json!(true));
        assert_eq!(profiles[1]["name"], json!("Game"));
        assert_eq!(profiles[1]["packaged"], json!(true));
        assert_eq!(profiles[1]["disableWindowResizing"], json!(true));
        assert_eq!(profiles[1]["VSync"], json!(false));
    }

    #[test]
    fn test_encode_omits_absent_downscaling_effect() {
        let model = SettingsModel::empty_document();
        let value: Value = serde_json::from_str(&encode(&model).unwrap()).unwrap();
        assert!(value.get("downscalingEffect").is_none());
        assert_eq!(value["version"], json!(0));
    }

    #[test]
    fn test_encode_hotkeys_packed() {
        let value: Value = serde_json::from_str(&encode(&SettingsModel::first_run()).unwrap()).unwrap();
        assert_eq!(value["hotkeys"], json!({ "scale": 0x941, "overlay": 0x944 }));
    }

    #[test]
    fn test_parse_rejects_non_object_root() {
        assert!(matches!(parse("[1, 2]"), Err(DocumentError::RootNotObject)));
        assert!(matches!(parse("\"text\""), Err(DocumentError::RootNotObject)));
        assert!(matches!(parse("{ \"theme\": "), Err(DocumentError::Syntax(_))));
    }

    #[test]
    fn test_read_version_defaults_to_zero() {
        assert_eq!(read_version(&parse("{}").unwrap()), 0);
        assert_eq!(read_version(&parse("{\"version\": \"3\"}").unwrap()), 0);
        assert_eq!(read_version(&parse("{\"version\": 3}").unwrap()), 3);
    }

    #[test]
    fn test_decode_malformed_profile_is_dropped() {
        let model = decode_value(json!({
            "scalingProfiles": [
                {},
                user_profile("First", "C:\\a.exe", "A"),
                { "name": "Broken", "packaged": false, "pathRule": "C:\\b.exe" },
                user_profile("Third", "C:\\c.exe", "C"),
            ]
        }));

        let names: Vec<&str> = model.profiles.profiles().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["First", "Third"]);
    }

    #[test]
    fn test_decode_profile_identity_rules() {
        let model = decode_value(json!({
            "scalingProfiles": [
                {},
                { "name": "", "packaged": false, "pathRule": "p", "classNameRule": "c" },
                { "name": "NoPackaged", "pathRule": "p", "classNameRule": "c" },
                { "name": "EmptyPath", "packaged": false, "pathRule": "", "classNameRule": "c" },
                { "name": "WrongType", "packaged": "no", "pathRule": "p", "classNameRule": "c" },
                "not an object",
                user_profile("Valid", "p", "c"),
            ]
        }));

        assert_eq!(model.profiles.profile_count(), 1);
        assert_eq!(model.profiles.get_profile(0).unwrap().name, "Valid");
    }

    #[test]
    fn test_decode_default_profile_ignores_identity_fields() {
        let model = decode_value(json!({
            "scalingProfiles": [ { "name": "ignored", "captureMode": 2, "VSync": false } ]
        }));

        let default = model.profiles.default_profile();
        assert!(default.is_default());
        assert_eq!(default.capture_mode, CaptureMode::Gdi);
        assert!(!default.has_flag(ProfileFlags::VSYNC));
    }

    #[test]
    fn test_decode_partial_cropping_resets() {
        let mut profile = user_profile("P", "p", "c");
        profile["cropping"] = json!({ "left": 4.0, "top": 2.0, "right": 1.0 });
        profile["croppingEnabled"] = json!(true);

        let model = decode_value(json!({ "scalingProfiles": [ {}, profile ] }));
        let loaded = model.profiles.get_profile(0).unwrap();

        assert!(loaded.is_cropping_enabled);
        assert_eq!(loaded.cropping, Cropping::default());
    }

    #[test]
    fn test_decode_skips_wrong_types() {
        let model = decode_value(json!({
            "theme": 7,
            "windowPos": { "x": 10, "y": "20", "width": 800, "height": 600, "maximized": 1 },
            "hotkeys": { "scale": 4096, "overlay": "0x944" },
            "autoRestore": "yes",
            "downCount": -3,
            "showTrayIcon": false,
            "downscalingEffect": { "parameters": { "paramB": 1.0 } },
        }));

        let defaults = SettingsModel::default();
        assert_eq!(model.theme, defaults.theme);
        assert_eq!((model.window_rect.x, model.window_rect.y), (defaults.window_rect.x, defaults.window_rect.y));
        assert_eq!((model.window_rect.width, model.window_rect.height), (800, 600));
        assert!(!model.is_window_maximized);
        assert!(model.hotkeys[HotkeyAction::Scale].is_empty());
        assert!(model.hotkeys[HotkeyAction::Overlay].is_empty());
        assert!(!model.auto_restore);
        assert_eq!(model.down_count, defaults.down_count);
        assert!(!model.show_tray_icon);
        assert!(model.downscaling_effect.is_none());
    }

    #[test]
    fn test_decode_downscaling_effect_numeric_parameters_only() {
        let model = decode_value(json!({
            "downscalingEffect": { "name": "Bicubic", "parameters": { "paramB": 0.0, "paramC": 0.5, "bad": null } }
        }));

        let effect = model.downscaling_effect.unwrap();
        assert_eq!(effect.name, "Bicubic");
        assert_eq!(effect.parameters.len(), 2);
        assert_eq!(effect.parameter("paramC"), Some(0.5));
    }

    #[test]
    fn test_decode_resets_dangling_scaling_mode() {
        let mut profile = user_profile("P", "p", "c");
        profile["scalingMode"] = json!(3);

        let model = decode_value(json!({
            "scalingModes": [ { "name": "Only", "effects": [] } ],
            "scalingProfiles": [ { "scalingMode": 0 }, profile ],
        }));

        assert_eq!(model.profiles.default_profile().scaling_mode, 0);
        assert_eq!(model.profiles.get_profile(0).unwrap().scaling_mode, -1);
    }

    #[test]
    fn test_decode_empty_object_is_defaults() {
        assert_eq!(decode_value(json!({})), SettingsModel::default());
    }
}
