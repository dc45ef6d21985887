//! Classification of X protocol errors
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Base X11 error codes taken from /usr/include/X11/X.h (line 347)
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub enum XErrorCode {
    /// bad request code
    BadRequest = 1,
    /// int parameter out of range
    BadValue = 2,
    /// parameter not a Window
    BadWindow = 3,
    /// parameter not a Pixmap
    BadPixmap = 4,
    /// parameter not an Atom
    BadAtom = 5,
    /// parameter not a Cursor
    BadCursor = 6,
    /// parameter not a Font
    BadFont = 7,
    /// parameter mismatch
    BadMatch = 8,
    /// parameter not a Pixmap or Window
    BadDrawable = 9,
    /// depending on context:
    ///   - key/button already grabbed
    ///   - attempt to free an illegal cmap entry
    ///   - attempt to store into a read-only color map entry.
    ///   - attempt to modify the access control list from other than the local host.
    BadAccess = 10,
}

impl XErrorCode {
    /// Look up a known error code
    pub fn from_u8(code: u8) -> Option<Self> {
        use XErrorCode::*;

        let known = match code {
            1 => BadRequest,
            2 => BadValue,
            3 => BadWindow,
            4 => BadPixmap,
            5 => BadAtom,
            6 => BadCursor,
            7 => BadFont,
            8 => BadMatch,
            9 => BadDrawable,
            10 => BadAccess,
            _ => return None,
        };

        Some(known)
    }
}

/// Major opcodes of the core protocol requests that can race against a destroyed window.
pub mod request {
    /// ConfigureWindow
    pub const CONFIGURE_WINDOW: u8 = 12;
    /// GetProperty
    pub const GET_PROPERTY: u8 = 20;
    /// GrabKey
    pub const GRAB_KEY: u8 = 33;
    /// SetInputFocus
    pub const SET_INPUT_FOCUS: u8 = 42;
    /// CopyArea
    pub const COPY_AREA: u8 = 62;
    /// PolySegment
    pub const POLY_SEGMENT: u8 = 66;
    /// PolyFillRectangle
    pub const POLY_FILL_RECTANGLE: u8 = 70;
    /// PolyText8
    pub const POLY_TEXT8: u8 = 74;
}

/// An error reported by the X server for a specific request.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct XError {
    /// The X error code
    pub error_code: u8,
    /// The major opcode of the request that failed
    pub request_code: u8,
}

impl XError {
    /// Errors that only arise from racing a window that has already been destroyed.
    ///
    /// There is no way to check for these ahead of time so they are logged and dropped.
    /// Everything else indicates a bug and is fatal.
    pub fn is_destroyed_window_race(&self) -> bool {
        use request::*;
        use XErrorCode::*;

        matches!(
            (XErrorCode::from_u8(self.error_code), self.request_code),
            (Some(BadWindow), _)
                | (Some(BadMatch), SET_INPUT_FOCUS | CONFIGURE_WINDOW)
                | (
                    Some(BadDrawable),
                    POLY_TEXT8 | POLY_FILL_RECTANGLE | POLY_SEGMENT | COPY_AREA
                )
                | (Some(BadAccess), GRAB_KEY)
        )
    }
}

impl From<XError> for crate::Error {
    fn from(e: XError) -> Self {
        let XError {
            request_code,
            error_code,
        } = e;

        if e.is_destroyed_window_race() {
            crate::Error::DestroyedWindow {
                request_code,
                error_code,
            }
        } else {
            crate::Error::UnhandledXError {
                request_code,
                error_code,
            }
        }
    }
}
