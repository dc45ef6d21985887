//! tessera :: a dynamic tiling window manager for X11 in the style of dwm
//!
//! The crate is split into a side effect free core and the parts that talk to
//! the X server:
//!
//!   - [pure] holds geometry primitives and the size hint engine.
//!   - [builtin] holds the layout algorithms.
//!   - [core] holds the window manager state machine: client and monitor
//!     registries, focus handling, user commands and the event loop.
//!   - [x] defines the [XConn][x::XConn] trait that the state machine uses to
//!     talk to the X server along with the X data types it needs.
//!   - [x11rb] (behind the `x11rb` feature) implements [XConn][x::XConn] on top
//!     of the [x11rb](https://crates.io/crates/x11rb) crate.
#![warn(rust_2018_idioms)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod builtin;
pub mod core;
pub mod pure;
pub mod util;
pub mod x;
#[cfg(feature = "x11rb")]
pub mod x11rb;

#[doc(inline)]
pub use crate::core::{config::Config, Command, State, WindowManager};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// An X11 ID for a given resource
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Xid(pub u32);

impl std::fmt::Display for Xid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for Xid {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u32> for Xid {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Error variants from the core tessera library.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Another window manager already holds SubstructureRedirect on the root window
    #[error("another window manager is already running")]
    OtherWmRunning,

    /// The user supplied configuration is not usable
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// Why the config was rejected
        reason: String,
    },

    /// A hex color code could not be parsed
    #[error("invalid hex color code: '{hex}'")]
    InvalidHexColor {
        /// The string that failed to parse
        hex: String,
    },

    /// Raw WM_HINTS or WM_NORMAL_HINTS data was malformed
    #[error("invalid window hints: {reason}")]
    InvalidHints {
        /// Why the hints were rejected
        reason: String,
    },

    /// A client message was received with a data format other than 8, 16 or 32
    #[error("invalid client message data format: {format}")]
    InvalidClientMessageData {
        /// The format that was specified
        format: u8,
    },

    /// The requested window is not a managed client
    #[error("{0} is not a managed client")]
    UnknownClient(Xid),

    /// An X protocol error outside of the known set of destroyed window races
    #[error("fatal X error: request code={request_code}, error code={error_code}")]
    UnhandledXError {
        /// The major opcode of the failed request
        request_code: u8,
        /// The X error code
        error_code: u8,
    },

    /// An X request targeted a window that has already been destroyed
    #[error("X request raced a destroyed window: request code={request_code}, error code={error_code}")]
    DestroyedWindow {
        /// The major opcode of the failed request
        request_code: u8,
        /// The X error code
        error_code: u8,
    },

    /// Unable to parse a string into a known atom
    #[error(transparent)]
    Strum(#[from] strum::ParseError),

    /// An IO error from the command pipe
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An error from a raw system call
    #[error(transparent)]
    Nix(#[from] nix::Error),

    /// An error from the x11rb backend
    #[cfg(feature = "x11rb")]
    #[error(transparent)]
    X11rb(#[from] crate::x11rb::X11rbError),
}

impl Error {
    /// Whether or not this error should bring down the window manager.
    ///
    /// Anything else is logged by the event loop and the next event is processed.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::OtherWmRunning | Error::UnhandledXError { .. } => true,
            #[cfg(feature = "x11rb")]
            Error::X11rb(e) => e.is_fatal(),
            _ => false,
        }
    }

    /// Whether this error came from racing a window that has already been destroyed.
    ///
    /// Reads from client windows treat these as the window having no data.
    pub fn is_destroyed_window_race(&self) -> bool {
        match self {
            Error::DestroyedWindow { .. } => true,
            #[cfg(feature = "x11rb")]
            Error::X11rb(e) => e.is_destroyed_window_race(),
            _ => false,
        }
    }
}

/// A Result where the error type is a tessera [Error]
pub type Result<T> = std::result::Result<T, Error>;
