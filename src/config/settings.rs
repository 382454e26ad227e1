//! Settings root
//!
//! `AppSettings` owns the session's `SettingsModel`, knows where the document
//! lives and raises change notifications. It is single-threaded: every mutator
//! takes `&self`, releases its borrow of the model and only then notifies, so
//! a handler may read or change the settings again while it runs.

use std::cell::{Cell, Ref, RefCell};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::config::SETTINGS_VERSION;
use crate::constants::defaults::NO_SCALING_MODE;
use crate::events::Event;
use crate::hotkeys::{HotkeyAction, HotkeySettings, HotkeyTable};

use super::document::{self, DocumentError};
use super::model::{SettingsModel, Theme, WindowRect};
use super::profile::{NewProfile, ProfileError, ProfileRef, ScalingProfile, ScalingProfileStore};
use super::scaling_mode::{EffectInstance, ScalingMode, ScalingModeRegistry};
use super::storage::{ConfigLocations, ConfigStorage, VersionPrompt};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read settings from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("settings at {} are not valid JSON", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("settings root at {} is not an object", path.display())]
    RootNotObject { path: PathBuf },

    #[error(
        "settings at {} come from a newer version ({found}, supported {supported}) and were not loaded",
        path.display()
    )]
    FutureVersionDeclined {
        path: PathBuf,
        found: u32,
        supported: u32,
    },
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to create settings directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write settings to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize settings")]
    Serialize(#[source] serde_json::Error),

    #[error("settings at {} are already being saved", path.display())]
    InProgress { path: PathBuf },
}

/// Structural change to the user profile list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileChange {
    Added(usize),
    Removed(usize),
    Renamed(usize),
    Moved { from: usize, to: usize },
    Updated(ProfileRef),
}

/// Structural change to the scaling mode registry.
/// Profile indices have already been adjusted when this is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingModeChange {
    Added(usize),
    Removed(usize),
    Moved { from: usize, to: usize },
}

/// Change notifications raised by `AppSettings`
#[derive(Debug, Default)]
pub struct SettingsEvents {
    pub theme_changed: Event<Theme>,
    pub show_tray_icon_changed: Event<bool>,
    pub hotkey_changed: Event<HotkeyAction>,
    pub auto_restore_changed: Event<bool>,
    pub down_count_changed: Event<u32>,
    pub profiles_changed: Event<ProfileChange>,
    pub scaling_modes_changed: Event<ScalingModeChange>,
}

/// Paths with a save currently running, process-wide
static SAVES_IN_FLIGHT: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

/// Marks a path as being saved until dropped
struct SaveGuard {
    path: PathBuf,
}

impl SaveGuard {
    fn acquire(path: &Path) -> Result<Self, SaveError> {
        let mut in_flight = SAVES_IN_FLIGHT.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight.iter().any(|p| p == path) {
            return Err(SaveError::InProgress { path: path.to_path_buf() });
        }
        in_flight.push(path.to_path_buf());
        Ok(Self { path: path.to_path_buf() })
    }
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        let mut in_flight = SAVES_IN_FLIGHT.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.retain(|p| p != &self.path);
    }
}

/// Getter and silent setter for a scalar flag that has no change notification
macro_rules! quiet_flag {
    ($(#[$meta:meta])* $getter:ident, $setter:ident) => {
        $(#[$meta])*
        pub fn $getter(&self) -> bool {
            self.model.borrow().$getter
        }

        pub fn $setter(&self, value: bool) -> bool {
            self.replace_field(|m| &mut m.$getter, value)
        }
    };
}

pub struct AppSettings {
    model: RefCell<SettingsModel>,
    is_portable_mode: Cell<bool>,
    locations: ConfigLocations,
    storage: Box<dyn ConfigStorage>,
    events: SettingsEvents,
}

impl AppSettings {
    /// Locate, read and decode the settings document.
    ///
    /// Only a document that cannot be read or parsed at all is an error;
    /// individual bad entries fall back to their defaults.
    pub fn load(
        locations: ConfigLocations,
        storage: impl ConfigStorage + 'static,
        prompt: &dyn VersionPrompt,
    ) -> Result<Self, LoadError> {
        let mut is_portable = storage.exists(&locations.config_path(true));
        let path = locations.config_path(is_portable);
        info!(path = %path.display(), portable = is_portable, "Loading settings");

        let model = if !storage.exists(&path) {
            info!("No settings document found, using defaults");
            SettingsModel::first_run()
        } else {
            let text = storage
                .read_text(&path)
                .map_err(|source| LoadError::Read { path: path.clone(), source })?;

            if text.is_empty() {
                info!("Settings document is empty");
                SettingsModel::empty_document()
            } else {
                let root = document::parse(&text).map_err(|e| match e {
                    DocumentError::Syntax(source) => LoadError::Parse { path: path.clone(), source },
                    DocumentError::RootNotObject => LoadError::RootNotObject { path: path.clone() },
                })?;

                let version = document::read_version(&root);
                let is_future = version > SETTINGS_VERSION;
                if is_future {
                    warn!(version, supported = SETTINGS_VERSION, "Settings document is from a newer version");
                }

                if is_future && !prompt.confirm_future_version(version, SETTINGS_VERSION, is_portable) {
                    if is_portable {
                        return Err(LoadError::FutureVersionDeclined {
                            path,
                            found: version,
                            supported: SETTINGS_VERSION,
                        });
                    }
                    // Leave the newer per-user document alone and start over portably
                    info!("Switching to portable mode with default settings");
                    is_portable = true;
                    SettingsModel::first_run()
                } else {
                    let mut model = document::decode(&root);
                    model.hotkeys.fill_defaults();
                    model
                }
            }
        };

        Ok(Self {
            model: RefCell::new(model),
            is_portable_mode: Cell::new(is_portable),
            locations,
            storage: Box::new(storage),
            events: SettingsEvents::default(),
        })
    }

    /// Serialize the model and atomically replace the document
    pub fn save(&self) -> Result<(), SaveError> {
        let path = self.config_path();
        let _guard = SaveGuard::acquire(&path)?;

        let text = document::encode(&self.model.borrow()).map_err(SaveError::Serialize)?;

        let dir = self.config_dir();
        self.storage
            .create_dir_all(dir)
            .map_err(|source| SaveError::CreateDir { path: dir.to_path_buf(), source })?;
        self.storage
            .write_text_atomic(&path, &text)
            .map_err(|source| SaveError::Write { path: path.clone(), source })?;

        info!(path = %path.display(), "Saved settings");
        Ok(())
    }

    /// Save once more and give up the settings
    pub fn shutdown(self) -> Result<(), SaveError> {
        self.save()
    }

    pub fn events(&self) -> &SettingsEvents {
        &self.events
    }

    /// Read-only view of the whole model. Drop it before calling a mutator.
    pub fn model(&self) -> Ref<'_, SettingsModel> {
        self.model.borrow()
    }

    pub fn is_portable_mode(&self) -> bool {
        self.is_portable_mode.get()
    }

    pub fn config_dir(&self) -> &Path {
        self.locations.config_dir(self.is_portable_mode())
    }

    pub fn config_path(&self) -> PathBuf {
        self.locations.config_path(self.is_portable_mode())
    }

    /// Switch document location. Turning portable mode off deletes the
    /// portable document so the next start does not pick it up again.
    pub fn set_portable_mode(&self, value: bool) -> bool {
        if self.is_portable_mode() == value {
            return false;
        }

        if !value {
            let portable_path = self.locations.config_path(true);
            if let Err(e) = self.storage.remove_file(&portable_path) {
                debug!(path = %portable_path.display(), error = %e, "Could not remove portable settings");
            }
        }

        self.is_portable_mode.set(value);
        info!(portable = value, path = %self.config_path().display(), "Portable mode changed");
        true
    }

    // ==========================================================================
    // Scalar settings
    // ==========================================================================

    /// Store `value` in the field picked by `field`; false when it was already equal
    fn replace_field<T: PartialEq>(&self, field: impl FnOnce(&mut SettingsModel) -> &mut T, value: T) -> bool {
        let mut model = self.model.borrow_mut();
        let slot = field(&mut *model);
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    pub fn theme(&self) -> Theme {
        self.model.borrow().theme
    }

    pub fn set_theme(&self, theme: Theme) -> bool {
        if !self.replace_field(|m| &mut m.theme, theme) {
            return false;
        }
        debug!(theme = ?theme, "Theme changed");
        self.events.theme_changed.emit(&theme);
        true
    }

    pub fn window_rect(&self) -> WindowRect {
        self.model.borrow().window_rect
    }

    pub fn is_window_maximized(&self) -> bool {
        self.model.borrow().is_window_maximized
    }

    pub fn set_window_placement(&self, rect: WindowRect, maximized: bool) -> bool {
        let rect_changed = self.replace_field(|m| &mut m.window_rect, rect);
        let maximized_changed = self.replace_field(|m| &mut m.is_window_maximized, maximized);
        rect_changed || maximized_changed
    }

    pub fn hotkey(&self, action: HotkeyAction) -> HotkeySettings {
        self.model.borrow().hotkeys[action]
    }

    pub fn hotkeys(&self) -> HotkeyTable {
        self.model.borrow().hotkeys
    }

    pub fn set_hotkey(&self, action: HotkeyAction, hotkey: HotkeySettings) -> bool {
        if !self.replace_field(|m| &mut m.hotkeys[action], hotkey) {
            return false;
        }
        info!(action = %action, hotkey = %hotkey, "Hotkey changed");
        self.events.hotkey_changed.emit(&action);
        true
    }

    pub fn auto_restore(&self) -> bool {
        self.model.borrow().auto_restore
    }

    pub fn set_auto_restore(&self, value: bool) -> bool {
        if !self.replace_field(|m| &mut m.auto_restore, value) {
            return false;
        }
        self.events.auto_restore_changed.emit(&value);
        true
    }

    pub fn down_count(&self) -> u32 {
        self.model.borrow().down_count
    }

    pub fn set_down_count(&self, value: u32) -> bool {
        if !self.replace_field(|m| &mut m.down_count, value) {
            return false;
        }
        self.events.down_count_changed.emit(&value);
        true
    }

    pub fn show_tray_icon(&self) -> bool {
        self.model.borrow().show_tray_icon
    }

    pub fn set_show_tray_icon(&self, value: bool) -> bool {
        if !self.replace_field(|m| &mut m.show_tray_icon, value) {
            return false;
        }
        self.events.show_tray_icon_changed.emit(&value);
        true
    }

    quiet_flag!(debug_mode, set_debug_mode);
    quiet_flag!(disable_effect_cache, set_disable_effect_cache);
    quiet_flag!(save_effect_sources, set_save_effect_sources);
    quiet_flag!(warnings_are_errors, set_warnings_are_errors);
    quiet_flag!(simulate_exclusive_fullscreen, set_simulate_exclusive_fullscreen);
    quiet_flag!(
        /// Registered auto-start tasks pick this up on their next update
        always_run_as_elevated,
        set_always_run_as_elevated
    );
    quiet_flag!(inline_params, set_inline_params);

    pub fn downscaling_effect(&self) -> Ref<'_, Option<EffectInstance>> {
        Ref::map(self.model.borrow(), |m| &m.downscaling_effect)
    }

    /// `None` disables downscaling; an effect without a name counts as `None`
    pub fn set_downscaling_effect(&self, effect: Option<EffectInstance>) -> bool {
        let effect = effect.filter(|e| !e.name.is_empty()).map(|mut e| {
            e.sanitize();
            e
        });
        self.replace_field(|m| &mut m.downscaling_effect, effect)
    }

    // ==========================================================================
    // Scaling profiles
    // ==========================================================================

    pub fn profiles(&self) -> Ref<'_, ScalingProfileStore> {
        Ref::map(self.model.borrow(), |m| &m.profiles)
    }

    pub fn profile(&self, profile: ProfileRef) -> Option<ScalingProfile> {
        self.model.borrow().profiles.resolve(profile).cloned()
    }

    pub fn find_profile(&self, path: &str, class_name: &str, is_packaged: bool) -> ProfileRef {
        self.model.borrow().profiles.find_profile(path, class_name, is_packaged)
    }

    pub fn add_profile(&self, new: NewProfile, copy_from: Option<ProfileRef>) -> Result<usize, ProfileError> {
        let index = self.model.borrow_mut().profiles.add_profile(new, copy_from)?;
        self.events.profiles_changed.emit(&ProfileChange::Added(index));
        Ok(index)
    }

    pub fn remove_profile(&self, index: usize) -> Result<ScalingProfile, ProfileError> {
        let removed = self.model.borrow_mut().profiles.remove_profile(index)?;
        self.events.profiles_changed.emit(&ProfileChange::Removed(index));
        Ok(removed)
    }

    /// `Ok(false)` when the trimmed name equals the current one; nothing is raised then
    pub fn rename_profile(&self, index: usize, name: &str) -> Result<bool, ProfileError> {
        let renamed = self.model.borrow_mut().profiles.rename_profile(index, name)?;
        if renamed {
            self.events.profiles_changed.emit(&ProfileChange::Renamed(index));
        }
        Ok(renamed)
    }

    pub fn move_profile(&self, index: usize, up: bool) -> bool {
        if !self.model.borrow_mut().profiles.move_profile(index, up) {
            return false;
        }
        let to = if up { index - 1 } else { index + 1 };
        self.events.profiles_changed.emit(&ProfileChange::Moved { from: index, to });
        true
    }

    /// Edit a profile's behavior. Identity fields are kept; use
    /// `rename_profile` to change the name. Returns whether anything changed.
    pub fn update_profile(
        &self,
        profile: ProfileRef,
        edit: impl FnOnce(&mut ScalingProfile),
    ) -> Result<bool, ProfileError> {
        let current = self.profile(profile).ok_or_else(|| ProfileError::IndexOutOfRange {
            index: match profile {
                ProfileRef::User(index) => index,
                ProfileRef::Default => 0,
            },
            count: self.model.borrow().profiles.profile_count(),
        })?;

        // The edit runs without a borrow held so it may read the settings
        let mut edited = current;
        edit(&mut edited);
        edited.sanitize();

        let changed = {
            let mut model = self.model.borrow_mut();
            let model = &mut *model;
            if edited.scaling_mode != NO_SCALING_MODE && !model.scaling_modes.contains_index(edited.scaling_mode) {
                warn!(scaling_mode = edited.scaling_mode, "Unknown scaling mode, using none");
                edited.scaling_mode = NO_SCALING_MODE;
            }

            let Some(target) = model.profiles.resolve_mut(profile) else {
                return Ok(false);
            };
            let before = target.clone();
            target.copy_behavior_from(&edited);
            *target != before
        };

        if changed {
            self.events.profiles_changed.emit(&ProfileChange::Updated(profile));
        }
        Ok(changed)
    }

    // ==========================================================================
    // Scaling modes
    // ==========================================================================

    pub fn scaling_modes(&self) -> Ref<'_, ScalingModeRegistry> {
        Ref::map(self.model.borrow(), |m| &m.scaling_modes)
    }

    pub fn add_scaling_mode(&self, mut mode: ScalingMode) -> usize {
        mode.sanitize();
        let index = {
            let mut model = self.model.borrow_mut();
            info!(name = %mode.name, "Added scaling mode");
            model.scaling_modes.push(mode)
        };
        self.events.scaling_modes_changed.emit(&ScalingModeChange::Added(index));
        index
    }

    /// Remove a mode; profiles using it fall back to none, later indices shift down
    pub fn remove_scaling_mode(&self, index: usize) -> Option<ScalingMode> {
        let removed = {
            let mut model = self.model.borrow_mut();
            let removed = model.scaling_modes.remove(index)?;
            let index = index as i32;
            for profile in model.profiles.iter_all_mut() {
                if profile.scaling_mode == index {
                    profile.scaling_mode = NO_SCALING_MODE;
                } else if profile.scaling_mode > index {
                    profile.scaling_mode -= 1;
                }
            }
            removed
        };

        info!(name = %removed.name, index, "Removed scaling mode");
        self.events.scaling_modes_changed.emit(&ScalingModeChange::Removed(index));
        Some(removed)
    }

    /// Swap a mode with its neighbor; profiles follow the mode they point at
    pub fn move_scaling_mode(&self, index: usize, up: bool) -> bool {
        let target = {
            let mut model = self.model.borrow_mut();
            let Some(target) = model.scaling_modes.swap_with_neighbor(index, up) else {
                return false;
            };
            let (a, b) = (index as i32, target as i32);
            for profile in model.profiles.iter_all_mut() {
                if profile.scaling_mode == a {
                    profile.scaling_mode = b;
                } else if profile.scaling_mode == b {
                    profile.scaling_mode = a;
                }
            }
            target
        };

        self.events
            .scaling_modes_changed
            .emit(&ScalingModeChange::Moved { from: index, to: target });
        true
    }
}
