//! Plain settings model
//!
//! Everything persisted in the settings document, without the change
//! notification and file plumbing of `AppSettings`. The codec converts this
//! model to and from JSON; `AppSettings` owns one instance for the session.

use crate::constants::{defaults, window};
use crate::hotkeys::HotkeyTable;

use super::profile::ScalingProfileStore;
use super::scaling_mode::{EffectInstance, ScalingModeRegistry, default_downscaling_effect};

u32_enum! {
    /// Main window theme
    #[derive(Default)]
    pub enum Theme {
        Light = 0,
        Dark = 1,
        /// Follow the system setting
        #[default]
        System = 2,
    }
}

/// Restored (non-maximized) main window placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowRect {
    fn default() -> Self {
        Self {
            x: window::USE_DEFAULT_POSITION,
            y: window::USE_DEFAULT_POSITION,
            width: window::DEFAULT_WIDTH,
            height: window::DEFAULT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsModel {
    pub theme: Theme,
    pub window_rect: WindowRect,
    pub is_window_maximized: bool,
    pub hotkeys: HotkeyTable,

    pub auto_restore: bool,
    /// Frame-cap count
    pub down_count: u32,
    pub debug_mode: bool,
    pub disable_effect_cache: bool,
    pub save_effect_sources: bool,
    pub warnings_are_errors: bool,
    pub simulate_exclusive_fullscreen: bool,
    pub always_run_as_elevated: bool,
    pub show_tray_icon: bool,
    pub inline_params: bool,

    /// `None` disables downscaling
    pub downscaling_effect: Option<EffectInstance>,
    pub scaling_modes: ScalingModeRegistry,
    pub profiles: ScalingProfileStore,
}

impl Default for SettingsModel {
    /// Built-in scalar defaults with no hotkeys, scaling modes or downscaling
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            window_rect: WindowRect::default(),
            is_window_maximized: false,
            hotkeys: HotkeyTable::default(),
            auto_restore: false,
            down_count: defaults::DOWN_COUNT,
            debug_mode: false,
            disable_effect_cache: false,
            save_effect_sources: false,
            warnings_are_errors: false,
            simulate_exclusive_fullscreen: false,
            always_run_as_elevated: false,
            show_tray_icon: true,
            inline_params: false,
            downscaling_effect: None,
            scaling_modes: ScalingModeRegistry::default(),
            profiles: ScalingProfileStore::default(),
        }
    }
}

impl SettingsModel {
    /// Model used when no settings document exists yet
    pub fn first_run() -> Self {
        Self {
            hotkeys: HotkeyTable::with_defaults(),
            downscaling_effect: Some(default_downscaling_effect()),
            scaling_modes: ScalingModeRegistry::with_defaults(),
            ..Self::default()
        }
    }

    /// Model used for an empty settings document: defaults and hotkeys only
    pub fn empty_document() -> Self {
        Self {
            hotkeys: HotkeyTable::with_defaults(),
            ..Self::default()
        }
    }

    /// Reset profiles that point past the scaling mode registry to "none".
    /// Returns how many profiles were changed.
    pub fn clamp_profile_scaling_modes(&mut self) -> usize {
        let registry = &self.scaling_modes;
        let mut reset = 0;
        for profile in self.profiles.iter_all_mut() {
            if profile.scaling_mode != defaults::NO_SCALING_MODE
                && !registry.contains_index(profile.scaling_mode)
            {
                profile.scaling_mode = defaults::NO_SCALING_MODE;
                reset += 1;
            }
        }
        reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkeys::HotkeyAction;

    #[test]
    fn test_first_run_model() {
        let model = SettingsModel::first_run();
        assert_eq!(model.scaling_modes.len(), 7);
        assert_eq!(model.downscaling_effect.as_ref().map(|e| e.name.as_str()), Some("Bicubic"));
        assert_eq!(model.hotkeys[HotkeyAction::Scale].to_string(), "Win+Shift+A");
        assert_eq!(model.hotkeys[HotkeyAction::Overlay].to_string(), "Win+Shift+D");
        assert_eq!(model.profiles.profile_count(), 0);
    }

    #[test]
    fn test_empty_document_model_has_no_scaling_modes() {
        let model = SettingsModel::empty_document();
        assert!(model.scaling_modes.is_empty());
        assert!(model.downscaling_effect.is_none());
        assert!(!model.hotkeys[HotkeyAction::Scale].is_empty());
    }

    #[test]
    fn test_scalar_defaults() {
        let model = SettingsModel::default();
        assert_eq!(model.theme, Theme::System);
        assert_eq!(model.down_count, 5);
        assert!(model.show_tray_icon);
        assert!(!model.auto_restore);
        assert_eq!(model.window_rect.width, 1280);
        assert_eq!(model.window_rect.x, i32::MIN);
    }

    #[test]
    fn test_clamp_profile_scaling_modes() {
        let mut model = SettingsModel::first_run();
        model.profiles.default_profile_mut().scaling_mode = 7;

        assert_eq!(model.clamp_profile_scaling_modes(), 1);
        assert_eq!(model.profiles.default_profile().scaling_mode, -1);

        model.profiles.default_profile_mut().scaling_mode = 6;
        assert_eq!(model.clamp_profile_scaling_modes(), 0);
        assert_eq!(model.profiles.default_profile().scaling_mode, 6);
    }

    #[test]
    fn test_theme_from_u32() {
        assert_eq!(Theme::from_u32(0), Some(Theme::Light));
        assert_eq!(Theme::from_u32(2), Some(Theme::System));
        assert_eq!(Theme::from_u32(3), None);
    }
}
