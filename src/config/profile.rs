//! Scaling profiles
//!
//! A profile binds per-application overrides to a window by executable path and
//! window class. The store keeps the default profile apart from the ordered
//! user profiles; that order is the matching precedence.

use thiserror::Error;
use tracing::{info, warn};

use crate::constants::defaults;

u32_enum! {
    #[derive(Default)]
    pub enum CaptureMode {
        #[default]
        GraphicsCapture = 0,
        DesktopDuplication = 1,
        Gdi = 2,
        DwmSharedSurface = 3,
    }
}

u32_enum! {
    /// Which monitors the scaled window may span
    #[derive(Default)]
    pub enum MultiMonitorUsage {
        #[default]
        Nearest = 0,
        Intersected = 1,
        All = 2,
    }
}

u32_enum! {
    #[derive(Default)]
    pub enum CursorScaling {
        X0_5 = 0,
        X0_75 = 1,
        #[default]
        NoScaling = 2,
        X1_25 = 3,
        X1_5 = 4,
        X2 = 5,
        /// Same factor as the source window
        Source = 6,
        /// Use `ScalingProfile::custom_cursor_scaling`
        Custom = 7,
    }
}

u32_enum! {
    #[derive(Default)]
    pub enum CursorInterpolationMode {
        #[default]
        NearestNeighbor = 0,
        Bilinear = 1,
    }
}

/// Boolean profile options packed into one word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProfileFlags(u32);

impl ProfileFlags {
    pub const DISABLE_WINDOW_RESIZING: Self = Self(1 << 0);
    pub const IS_3D_GAME_MODE: Self = Self(1 << 1);
    pub const SHOW_FPS: Self = Self(1 << 2);
    pub const VSYNC: Self = Self(1 << 3);
    pub const TRIPLE_BUFFERING: Self = Self(1 << 4);
    pub const RESERVE_TITLE_BAR: Self = Self(1 << 5);
    pub const ADJUST_CURSOR_SPEED: Self = Self(1 << 6);
    pub const DRAW_CURSOR: Self = Self(1 << 7);
    pub const DISABLE_DIRECT_FLIP: Self = Self(1 << 8);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, flag: Self) -> bool {
        (self.0 & flag.0) == flag.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn set(&mut self, flag: Self, enabled: bool) {
        if enabled {
            self.0 |= flag.0;
        } else {
            self.0 &= !flag.0;
        }
    }
}

impl Default for ProfileFlags {
    fn default() -> Self {
        Self::VSYNC
            .union(Self::ADJUST_CURSOR_SPEED)
            .union(Self::DRAW_CURSOR)
    }
}

/// Source-window cropping in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cropping {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalingProfile {
    // Identity (empty on the default profile)
    pub name: String,
    pub is_packaged: bool,
    pub path_rule: String,
    pub class_name_rule: String,

    /// Index into the scaling mode registry, `-1` for none
    pub scaling_mode: i32,
    pub capture_mode: CaptureMode,
    pub multi_monitor_usage: MultiMonitorUsage,
    pub graphics_adapter: u32,
    pub flags: ProfileFlags,

    pub cursor_scaling: CursorScaling,
    pub custom_cursor_scaling: f32,
    pub cursor_interpolation_mode: CursorInterpolationMode,

    pub is_cropping_enabled: bool,
    pub cropping: Cropping,
}

impl Default for ScalingProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            is_packaged: false,
            path_rule: String::new(),
            class_name_rule: String::new(),
            scaling_mode: defaults::NO_SCALING_MODE,
            capture_mode: CaptureMode::default(),
            multi_monitor_usage: MultiMonitorUsage::default(),
            graphics_adapter: 0,
            flags: ProfileFlags::default(),
            cursor_scaling: CursorScaling::default(),
            custom_cursor_scaling: defaults::CUSTOM_CURSOR_SCALING,
            cursor_interpolation_mode: CursorInterpolationMode::default(),
            is_cropping_enabled: false,
            cropping: Cropping::default(),
        }
    }
}

impl ScalingProfile {
    /// The default profile carries no identity
    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }

    pub fn has_flag(&self, flag: ProfileFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: ProfileFlags, enabled: bool) {
        self.flags.set(flag, enabled);
    }

    /// Copy every behavioral field from `source`, keeping this profile's identity
    pub fn copy_behavior_from(&mut self, source: &ScalingProfile) {
        let identity = (
            std::mem::take(&mut self.name),
            self.is_packaged,
            std::mem::take(&mut self.path_rule),
            std::mem::take(&mut self.class_name_rule),
        );
        *self = source.clone();
        (self.name, self.is_packaged, self.path_rule, self.class_name_rule) = identity;
    }

    /// Replace non-finite floats with their defaults. They would never compare
    /// equal to themselves and are written to the document as `null`.
    pub fn sanitize(&mut self) {
        for side in [
            &mut self.cropping.left,
            &mut self.cropping.top,
            &mut self.cropping.right,
            &mut self.cropping.bottom,
        ] {
            if !side.is_finite() {
                *side = 0.0;
            }
        }
        if !self.custom_cursor_scaling.is_finite() {
            self.custom_cursor_scaling = defaults::CUSTOM_CURSOR_SCALING;
        }
    }

    /// Match rule check: path ignores case (Windows paths), class name is exact
    pub fn matches(&self, path: &str, class_name: &str, is_packaged: bool) -> bool {
        !self.is_default()
            && self.is_packaged == is_packaged
            && self.path_rule.to_lowercase() == path.to_lowercase()
            && self.class_name_rule == class_name
    }
}

/// Identity of a profile being created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub name: String,
    pub is_packaged: bool,
    pub path_rule: String,
    pub class_name_rule: String,
}

/// Handle to a profile; re-resolve after add/remove/move instead of caching references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileRef {
    Default,
    User(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("profile name must not be empty")]
    EmptyName,

    #[error("a profile named '{name}' already exists")]
    DuplicateName { name: String },

    #[error("profile {field} must not be empty")]
    EmptyRule { field: &'static str },

    #[error("no profile at index {index} (have {count})")]
    IndexOutOfRange { index: usize, count: usize },
}

/// Default profile plus ordered user profiles
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScalingProfileStore {
    default_profile: ScalingProfile,
    profiles: Vec<ScalingProfile>,
}

impl ScalingProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_profile(&self) -> &ScalingProfile {
        &self.default_profile
    }

    pub fn default_profile_mut(&mut self) -> &mut ScalingProfile {
        &mut self.default_profile
    }

    /// User profiles in matching order
    pub fn profiles(&self) -> &[ScalingProfile] {
        &self.profiles
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }

    pub fn get_profile(&self, index: usize) -> Option<&ScalingProfile> {
        self.profiles.get(index)
    }

    pub fn get_profile_mut(&mut self, index: usize) -> Option<&mut ScalingProfile> {
        self.profiles.get_mut(index)
    }

    pub fn resolve(&self, profile: ProfileRef) -> Option<&ScalingProfile> {
        match profile {
            ProfileRef::Default => Some(&self.default_profile),
            ProfileRef::User(index) => self.profiles.get(index),
        }
    }

    pub fn resolve_mut(&mut self, profile: ProfileRef) -> Option<&mut ScalingProfile> {
        match profile {
            ProfileRef::Default => Some(&mut self.default_profile),
            ProfileRef::User(index) => self.profiles.get_mut(index),
        }
    }

    /// Default profile first, then user profiles in order (document order)
    pub fn iter_all(&self) -> impl Iterator<Item = &ScalingProfile> {
        std::iter::once(&self.default_profile).chain(self.profiles.iter())
    }

    pub(crate) fn iter_all_mut(&mut self) -> impl Iterator<Item = &mut ScalingProfile> {
        std::iter::once(&mut self.default_profile).chain(self.profiles.iter_mut())
    }

    /// Create a profile from `new`, copying behavior from `copy_from`
    /// (the default profile when `None`). Returns the new profile's index.
    pub fn add_profile(
        &mut self,
        new: NewProfile,
        copy_from: Option<ProfileRef>,
    ) -> Result<usize, ProfileError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if self.name_taken(name, None) {
            return Err(ProfileError::DuplicateName { name: name.to_string() });
        }
        if new.path_rule.is_empty() {
            return Err(ProfileError::EmptyRule { field: "path rule" });
        }
        if new.class_name_rule.is_empty() {
            return Err(ProfileError::EmptyRule { field: "class name rule" });
        }

        let source = copy_from.unwrap_or(ProfileRef::Default);
        let source = self.resolve(source).ok_or_else(|| self.out_of_range(source))?;

        let mut profile = ScalingProfile {
            name: name.to_string(),
            is_packaged: new.is_packaged,
            path_rule: new.path_rule,
            class_name_rule: new.class_name_rule,
            ..ScalingProfile::default()
        };
        profile.copy_behavior_from(source);

        info!(name = %profile.name, path = %profile.path_rule, class = %profile.class_name_rule, "Added scaling profile");
        self.profiles.push(profile);
        Ok(self.profiles.len() - 1)
    }

    pub fn remove_profile(&mut self, index: usize) -> Result<ScalingProfile, ProfileError> {
        if index >= self.profiles.len() {
            return Err(self.out_of_range(ProfileRef::User(index)));
        }
        let removed = self.profiles.remove(index);
        info!(name = %removed.name, index, "Removed scaling profile");
        Ok(removed)
    }

    /// Rename after trimming. `Ok(false)` when the name is unchanged.
    pub fn rename_profile(&mut self, index: usize, name: &str) -> Result<bool, ProfileError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }

        let current = self
            .profiles
            .get(index)
            .ok_or_else(|| self.out_of_range(ProfileRef::User(index)))?;
        if current.name == name {
            return Ok(false);
        }
        if self.name_taken(name, Some(index)) {
            return Err(ProfileError::DuplicateName { name: name.to_string() });
        }

        let profile = &mut self.profiles[index];
        info!(old = %profile.name, new = %name, "Renamed scaling profile");
        profile.name = name.to_string();
        Ok(true)
    }

    /// Swap with the neighbor above (`up`) or below.
    /// Returns false at either boundary or for an invalid index.
    pub fn move_profile(&mut self, index: usize, up: bool) -> bool {
        if index >= self.profiles.len() {
            return false;
        }
        let target = if up {
            match index.checked_sub(1) {
                Some(target) => target,
                None => return false,
            }
        } else {
            if index + 1 >= self.profiles.len() {
                return false;
            }
            index + 1
        };

        self.profiles.swap(index, target);
        true
    }

    /// First user profile whose rules match wins; otherwise the default profile
    pub fn find_profile(&self, path: &str, class_name: &str, is_packaged: bool) -> ProfileRef {
        self.profiles
            .iter()
            .position(|profile| profile.matches(path, class_name, is_packaged))
            .map_or(ProfileRef::Default, ProfileRef::User)
    }

    pub(crate) fn set_default_profile(&mut self, profile: ScalingProfile) {
        self.default_profile = profile;
    }

    /// Append a profile read from a document; duplicate names are dropped
    pub(crate) fn push_loaded(&mut self, profile: ScalingProfile) -> bool {
        if self.name_taken(&profile.name, None) {
            warn!(
                name = %profile.name,
                path = %profile.path_rule,
                class = %profile.class_name_rule,
                packaged = profile.is_packaged,
                "Dropping scaling profile with duplicate name; its match rules will not be saved"
            );
            return false;
        }
        self.profiles.push(profile);
        true
    }

    fn name_taken(&self, name: &str, except: Option<usize>) -> bool {
        self.profiles
            .iter()
            .enumerate()
            .any(|(i, profile)| Some(i) != except && profile.name == name)
    }

    fn out_of_range(&self, profile: ProfileRef) -> ProfileError {
        let index = match profile {
            ProfileRef::User(index) => index,
            ProfileRef::Default => 0,
        };
        ProfileError::IndexOutOfRange { index, count: self.profiles.len() }
    }
}
