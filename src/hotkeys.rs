//! Hotkey bindings and their packed integer form
//!
//! Hotkeys are persisted as a `u32` instead of a key name because some keys
//! share a display name (the period and the keypad decimal point, for example).

use std::fmt;
use std::ops::{Index, IndexMut};

use tracing::info;

use crate::constants::hotkey;

/// Actions that can be bound to a global hotkey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    Scale,
    Overlay,
}

impl HotkeyAction {
    pub const COUNT: usize = 2;

    pub const ALL: [HotkeyAction; Self::COUNT] = [HotkeyAction::Scale, HotkeyAction::Overlay];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Key used for this action inside the `hotkeys` document object
    pub const fn key(self) -> &'static str {
        match self {
            HotkeyAction::Scale => "scale",
            HotkeyAction::Overlay => "overlay",
        }
    }

    /// Binding applied when the action has no usable binding after load
    pub const fn default_hotkey(self) -> HotkeySettings {
        let code = match self {
            HotkeyAction::Scale => hotkey::DEFAULT_SCALE_CODE,
            HotkeyAction::Overlay => hotkey::DEFAULT_OVERLAY_CODE,
        };
        HotkeySettings::new(code, true, false, false, true)
    }
}

impl fmt::Display for HotkeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Key code plus modifier state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HotkeySettings {
    pub code: u8,
    pub win: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl HotkeySettings {
    pub const fn new(code: u8, win: bool, ctrl: bool, alt: bool, shift: bool) -> Self {
        Self { code, win, ctrl, alt, shift }
    }

    /// No key and no modifiers
    pub const fn is_empty(&self) -> bool {
        self.code == 0 && !self.win && !self.ctrl && !self.alt && !self.shift
    }

    pub const fn encode(&self) -> u32 {
        let mut value = self.code as u32;
        if self.win {
            value |= hotkey::WIN;
        }
        if self.ctrl {
            value |= hotkey::CTRL;
        }
        if self.alt {
            value |= hotkey::ALT;
        }
        if self.shift {
            value |= hotkey::SHIFT;
        }
        value
    }

    /// Unpack a stored value, `None` for anything above `0xFFF`
    pub const fn decode(value: u32) -> Option<Self> {
        if value > hotkey::MAX_PACKED {
            return None;
        }

        Some(Self {
            code: (value & hotkey::CODE_MASK) as u8,
            win: value & hotkey::WIN != 0,
            ctrl: value & hotkey::CTRL != 0,
            alt: value & hotkey::ALT != 0,
            shift: value & hotkey::SHIFT != 0,
        })
    }

    /// Decode into `target`, leaving it untouched when `value` is malformed.
    /// Returns whether `target` was overwritten.
    pub fn decode_into(value: u32, target: &mut Self) -> bool {
        match Self::decode(value) {
            Some(decoded) => {
                *target = decoded;
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for HotkeySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }

        let modifiers = [(self.win, "Win"), (self.ctrl, "Ctrl"), (self.alt, "Alt"), (self.shift, "Shift")];
        for (_, name) in modifiers.iter().filter(|(held, _)| *held) {
            write!(f, "{name}+")?;
        }

        // Virtual key codes only coincide with ASCII for digits and capitals
        if self.code.is_ascii_digit() || self.code.is_ascii_uppercase() {
            write!(f, "{}", self.code as char)
        } else {
            write!(f, "0x{:02X}", self.code)
        }
    }
}

/// One binding per [`HotkeyAction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HotkeyTable([HotkeySettings; HotkeyAction::COUNT]);

impl HotkeyTable {
    /// Table with every action bound to its default
    pub fn with_defaults() -> Self {
        let mut table = Self::default();
        table.fill_defaults();
        table
    }

    pub fn get(&self, action: HotkeyAction) -> HotkeySettings {
        self.0[action.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (HotkeyAction, HotkeySettings)> + '_ {
        HotkeyAction::ALL.iter().map(|&action| (action, self.get(action)))
    }

    /// Bind the default to every action that is still empty.
    /// Each action is checked on its own; returns the actions that were filled.
    pub fn fill_defaults(&mut self) -> Vec<HotkeyAction> {
        let mut filled = Vec::new();
        for action in HotkeyAction::ALL {
            if self[action].is_empty() {
                self[action] = action.default_hotkey();
                info!(action = %action, hotkey = %self[action], "Using default hotkey");
                filled.push(action);
            }
        }
        filled
    }
}

impl Index<HotkeyAction> for HotkeyTable {
    type Output = HotkeySettings;

    fn index(&self, action: HotkeyAction) -> &HotkeySettings {
        &self.0[action.index()]
    }
}

impl IndexMut<HotkeyAction> for HotkeyTable {
    fn index_mut(&mut self, action: HotkeyAction) -> &mut HotkeySettings {
        &mut self.0[action.index()]
    }
}
