//! Application-wide constants
//!
//! This module contains the magic numbers and string literals used by the
//! settings engine, providing a single source of truth for the document format.

/// Settings document location and schema
pub mod config {
    /// Application directory under the per-user local data directory
    pub const APP_DIR: &str = "Magnifier";

    /// Directory holding the document, relative to the app or executable directory
    pub const CONFIG_DIR: &str = "config";

    /// Settings document file name
    pub const FILENAME: &str = "config.json";

    /// Schema version written on save; newer documents need user confirmation
    pub const SETTINGS_VERSION: u32 = 0;
}

/// Packed hotkey layout (bits 0-7 key code, bits 8-11 modifiers)
pub mod hotkey {
    /// Virtual key code bits
    pub const CODE_MASK: u32 = 0xFF;

    pub const WIN: u32 = 0x100;
    pub const CTRL: u32 = 0x200;
    pub const ALT: u32 = 0x400;
    pub const SHIFT: u32 = 0x800;

    /// Largest packed value accepted on decode
    pub const MAX_PACKED: u32 = 0xFFF;

    /// Win+Shift+A
    pub const DEFAULT_SCALE_CODE: u8 = b'A';

    /// Win+Shift+D
    pub const DEFAULT_OVERLAY_CODE: u8 = b'D';
}

/// Main window geometry defaults
pub mod window {
    /// Position sentinel meaning "let the window manager place it"
    pub const USE_DEFAULT_POSITION: i32 = i32::MIN;

    pub const DEFAULT_WIDTH: u32 = 1280;

    pub const DEFAULT_HEIGHT: u32 = 820;
}

/// Scalar setting and profile defaults
pub mod defaults {
    /// Frame-cap count used when the document does not specify one
    pub const DOWN_COUNT: u32 = 5;

    /// `scalingMode` value meaning "no scaling mode selected"
    pub const NO_SCALING_MODE: i32 = -1;

    /// Custom cursor scale factor for new profiles
    pub const CUSTOM_CURSOR_SCALING: f32 = 1.0;
}
