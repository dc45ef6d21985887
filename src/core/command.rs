//! User intents that can be triggered from key bindings or the command pipe
use crate::builtin::layout::LayoutKind;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The tag mask for a single zero-indexed tag
pub const fn tag(i: u32) -> u32 {
    1 << i
}

/// Something the user has asked the window manager to do.
///
/// Tag arguments are bitmasks over the configured tags.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Show exactly these tags. `View(0)` toggles back to the previous view.
    View(u32),
    /// Toggle these tags in or out of the current view
    ToggleView(u32),
    /// Move the focused client to these tags
    Tag(u32),
    /// Toggle these tags on the focused client
    ToggleTag(u32),
    /// Move focus forward (positive) or backward through the visible clients
    FocusStack(i32),
    /// Step through the configured layouts
    CycleLayout(i32),
    /// Select a specific layout
    SetLayout(LayoutKind),
    /// Adjust the master fraction
    SetMfact(f32),
    /// Swap the focused client with the master
    Zoom,
    /// Politely close the focused client
    KillClient,
    /// Toggle whether the focused client floats
    ToggleFloating,
    /// Focus the next (positive) or previous monitor
    FocusMon(i32),
    /// Send the focused client to the next (positive) or previous monitor
    TagMon(i32),
    /// Exit the window manager
    Quit,
}

impl Command {
    /// Decode a single byte read from the command pipe.
    /// ```
    /// # use tessera::core::command::{tag, Command};
    /// assert_eq!(Command::from_pipe_byte(b'b'), Some(Command::View(tag(1))));
    /// assert_eq!(Command::from_pipe_byte(b'\n'), None);
    /// ```
    pub fn from_pipe_byte(b: u8) -> Option<Self> {
        use Command::*;

        let cmd = match b {
            b'a'..=b'd' => View(tag((b - b'a') as u32)),
            b'A'..=b'D' => Tag(tag((b - b'A') as u32)),
            b'w' => FocusStack(1),
            b'W' => FocusStack(-1),
            b'l' => CycleLayout(1),
            b'L' => CycleLayout(-1),
            b'm' => FocusMon(1),
            b'M' => FocusMon(-1),
            b't' => TagMon(-1),
            b'T' => TagMon(1),
            b'r' => SetMfact(0.1),
            b'R' => SetMfact(-0.1),
            b'z' => Zoom,
            b'q' => KillClient,
            b'f' => ToggleFloating,
            _ => return None,
        };

        Some(cmd)
    }
}
