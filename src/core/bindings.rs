//! Setting up and responding to user defined key bindings
use crate::core::command::Command;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::EnumIter;

#[doc(inline)]
pub use xkeysym::Keysym;

/// X modifier mask bits
pub mod mask {
    /// ShiftMask
    pub const SHIFT: u16 = 1 << 0;
    /// LockMask (caps lock)
    pub const LOCK: u16 = 1 << 1;
    /// ControlMask
    pub const CONTROL: u16 = 1 << 2;
    /// Mod1Mask (alt)
    pub const MOD1: u16 = 1 << 3;
    /// Mod2Mask (num lock)
    pub const MOD2: u16 = 1 << 4;
    /// Mod3Mask
    pub const MOD3: u16 = 1 << 5;
    /// Mod4Mask (super)
    pub const MOD4: u16 = 1 << 6;
    /// Mod5Mask
    pub const MOD5: u16 = 1 << 7;

    /// The lock modifiers that are ignored when matching bindings
    pub const NUM_LOCK: u16 = MOD2;
}

/// A key press and held modifiers
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct KeyCode {
    /// The held modifier mask
    pub mask: u16,
    /// The key code that was held
    pub code: u8,
}

impl KeyCode {
    /// Create a new KeyCode from an existing one, removing the given modifier mask
    pub fn ignoring_modifier(&self, mask: u16) -> KeyCode {
        KeyCode {
            mask: self.mask & !mask,
            code: self.code,
        }
    }
}

/// Strip lock modifiers and anything that isn't a real modifier key from a mask.
/// ```
/// # use tessera::core::bindings::{clean_mask, mask};
/// assert_eq!(clean_mask(mask::MOD4 | mask::LOCK | mask::NUM_LOCK), mask::MOD4);
/// ```
pub fn clean_mask(m: u16) -> u16 {
    use mask::*;

    m & !(NUM_LOCK | LOCK) & (SHIFT | CONTROL | MOD1 | MOD2 | MOD3 | MOD4 | MOD5)
}

/// Known modifier keys for bindings
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, EnumIter, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ModifierKey {
    /// Control
    Ctrl,
    /// Alt
    Alt,
    /// Shift
    Shift,
    /// Meta / super / windows
    Meta,
}

impl From<ModifierKey> for u16 {
    fn from(m: ModifierKey) -> u16 {
        match m {
            ModifierKey::Ctrl => mask::CONTROL,
            ModifierKey::Alt => mask::MOD1,
            ModifierKey::Shift => mask::SHIFT,
            ModifierKey::Meta => mask::MOD4,
        }
    }
}

/// A (modifiers, keysym) combination bound to a [Command]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBinding {
    /// The modifier mask that must be held
    pub mask: u16,
    /// The keysym that must be pressed
    pub keysym: u32,
    /// What to run
    pub command: Command,
}

impl KeyBinding {
    /// Bind `keysym` with the given modifiers held to `command`.
    /// ```
    /// # use tessera::core::{bindings::{mask, KeyBinding, Keysym, ModifierKey::*}, Command};
    /// let b = KeyBinding::new(&[Meta, Shift], Keysym::q, Command::KillClient);
    ///
    /// assert_eq!(b.mask, mask::MOD4 | mask::SHIFT);
    /// assert_eq!(b.keysym, 0x71);
    /// ```
    pub fn new(mods: &[ModifierKey], keysym: Keysym, command: Command) -> Self {
        Self {
            mask: mods.iter().fold(0, |acc, &m| acc | u16::from(m)),
            keysym: keysym.raw(),
            command,
        }
    }
}

/// Lookup from (clean modifier mask, keysym) to the bound [Command].
#[derive(Debug, Default, Clone)]
pub struct KeyBindings {
    inner: HashMap<(u16, u32), Command>,
}

impl KeyBindings {
    /// Build the lookup table. Later bindings for the same keys win.
    pub fn new(bindings: &[KeyBinding]) -> Self {
        let inner = bindings
            .iter()
            .map(|b| ((clean_mask(b.mask), b.keysym), b.command))
            .collect();

        Self { inner }
    }

    /// The (mask, keysym) pairs that need to be grabbed.
    pub fn keys(&self) -> Vec<(u16, u32)> {
        let mut keys: Vec<_> = self.inner.keys().copied().collect();
        keys.sort_unstable();

        keys
    }

    /// The command bound to a key press, if any.
    pub fn command_for(&self, mask: u16, keysym: u32) -> Option<Command> {
        self.inner.get(&(clean_mask(mask), keysym)).copied()
    }
}
