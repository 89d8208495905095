//! Command surface — named actions and the key table.
//!
//! The edit loop reads one byte at a time; this module maps it to an
//! [`Action`]. Every action has a stable kebab-case name (the same names
//! the config file's `bind.` directives use) and a default single-key
//! binding. Rebinding replaces the action's old key and steals the new
//! key from whatever held it.

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Everything a keypress can mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveLeft,
    MoveDown,
    MoveUp,
    MoveRight,
    ScrollLeft,
    ScrollDown,
    ScrollUp,
    ScrollRight,
    JumpTop,
    JumpBottom,
    Fill,
    Delete,
    ToggleSelect,
    JumpForward,
    JumpBackward,
    /// Set the current color from a palette digit.
    SelectColor(u8),
    Save,
    ReloadSize,
    Pipette,
    /// Pipette, then store into a palette slot. The slot digit is read as
    /// a second byte by the edit loop.
    PipetteSave,
    Quit,
}

impl Action {
    /// Look up an action by its config-file name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(digit) = name.strip_prefix("select-color-") {
            let slot: u8 = digit.parse().ok()?;
            return (slot <= 9).then_some(Self::SelectColor(slot));
        }

        Some(match name {
            "move-left" => Self::MoveLeft,
            "move-down" => Self::MoveDown,
            "move-up" => Self::MoveUp,
            "move-right" => Self::MoveRight,
            "scroll-offset-left" => Self::ScrollLeft,
            "scroll-offset-down" => Self::ScrollDown,
            "scroll-offset-up" => Self::ScrollUp,
            "scroll-offset-right" => Self::ScrollRight,
            "jump-to-top" => Self::JumpTop,
            "jump-to-bottom" => Self::JumpBottom,
            "fill" => Self::Fill,
            "delete" => Self::Delete,
            "toggle-select" => Self::ToggleSelect,
            "jump-forward" => Self::JumpForward,
            "jump-backward" => Self::JumpBackward,
            "save" => Self::Save,
            "reload-terminal-size" => Self::ReloadSize,
            "pipette" => Self::Pipette,
            "pipette-and-save" => Self::PipetteSave,
            "quit" => Self::Quit,
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// Keymap
// ---------------------------------------------------------------------------

/// Input byte → action table.
#[derive(Debug, Clone)]
pub struct Keymap {
    map: HashMap<u8, Action>,
}

impl Keymap {
    /// Decode one input byte. Unbound bytes mean "do nothing".
    #[inline]
    #[must_use]
    pub fn decode(&self, byte: u8) -> Option<Action> {
        self.map.get(&byte).copied()
    }

    /// Bind `action` to `key`, releasing the action's previous key and
    /// displacing whatever was bound to `key` before.
    pub fn rebind(&mut self, action: Action, key: u8) {
        self.map.retain(|_, a| *a != action);
        self.map.insert(key, action);
    }
}

impl Default for Keymap {
    /// The stock vim-flavored layout the original editor shipped with.
    fn default() -> Self {
        let mut map = HashMap::new();

        map.insert(b'h', Action::MoveLeft);
        map.insert(b'j', Action::MoveDown);
        map.insert(b'k', Action::MoveUp);
        map.insert(b'l', Action::MoveRight);

        map.insert(b'H', Action::ScrollLeft);
        map.insert(b'J', Action::ScrollDown);
        map.insert(b'K', Action::ScrollUp);
        map.insert(b'L', Action::ScrollRight);

        map.insert(b'g', Action::JumpTop);
        map.insert(b'G', Action::JumpBottom);
        map.insert(b'w', Action::JumpForward);
        map.insert(b'b', Action::JumpBackward);

        map.insert(b'f', Action::Fill);
        map.insert(b'd', Action::Delete);
        map.insert(b'v', Action::ToggleSelect);
        map.insert(b'p', Action::Pipette);
        map.insert(b'P', Action::PipetteSave);

        for slot in 0..=9u8 {
            map.insert(b'0' + slot, Action::SelectColor(slot));
        }

        map.insert(b's', Action::Save);
        map.insert(b'r', Action::ReloadSize);
        map.insert(b'q', Action::Quit);

        Self { map }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
