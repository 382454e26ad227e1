//! Configuration management for the magnifier
//!
//! - **settings**: `AppSettings`, the settings root with load/save and change events
//! - **model**: plain settings model shared by the codec and the root
//! - **document**: JSON document ↔ model codec
//! - **profile**: scaling profiles and their ordered store
//! - **scaling_mode**: named effect chains and the built-in defaults
//! - **storage**: file-system and confirmation collaborators

/// Fieldless enum persisted as its `u32` discriminant
macro_rules! u32_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            /// Decode the document representation, `None` for unknown values
            pub const fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $( $value => Some(Self::$variant), )+
                    _ => None,
                }
            }

            pub const fn as_u32(self) -> u32 {
                self as u32
            }
        }
    };
}

pub mod document;
pub mod model;
pub mod profile;
pub mod scaling_mode;
pub mod settings;
pub mod storage;

// Re-export commonly used types
pub use document::DocumentError;
pub use model::{SettingsModel, Theme, WindowRect};
pub use profile::{
    CaptureMode, Cropping, CursorInterpolationMode, CursorScaling, MultiMonitorUsage, NewProfile,
    ProfileError, ProfileFlags, ProfileRef, ScalingProfile, ScalingProfileStore,
};
pub use scaling_mode::{EffectInstance, ScalingMode, ScalingModeRegistry, ScalingType};
pub use settings::{AppSettings, LoadError, ProfileChange, SaveError, ScalingModeChange, SettingsEvents};
pub use storage::{ConfigLocations, ConfigStorage, FixedAnswer, FsStorage, VersionPrompt};
