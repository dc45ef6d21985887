//! Helpers and utilities for using x11rb as a back end for tessera
use crate::x::XError;
use x11rb::{
    errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError},
    x11_utils::X11Error,
};

pub(crate) mod conversions;
pub mod xconn;

#[doc(inline)]
pub use xconn::X11rbConnection;

/// Enum to store the various ways that operations can fail inside of the
/// x11rb implementation of [XConn][crate::x::XConn].
#[derive(thiserror::Error, Debug)]
pub enum X11rbError {
    /// Unable to establish a connection to the X server
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The X11 connection broke
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Could not get X11 request reply
    #[error(transparent)]
    ReplyError(#[from] ReplyError),

    /// Could not get X11 request reply or could not generate_id()
    #[error(transparent)]
    ReplyOrIdError(#[from] ReplyOrIdError),

    /// An error event was received from the X server
    #[error("X11 error: {0:?}")]
    X11Error(X11Error),
}

impl X11rbError {
    /// Losing the connection is always fatal. Protocol errors are fatal unless they come
    /// from racing a window that has already been destroyed.
    pub fn is_fatal(&self) -> bool {
        !self.is_destroyed_window_race()
    }

    /// Whether this is a protocol error from racing a window that has already been destroyed.
    pub fn is_destroyed_window_race(&self) -> bool {
        match self {
            X11rbError::ReplyError(ReplyError::X11Error(e))
            | X11rbError::ReplyOrIdError(ReplyOrIdError::X11Error(e))
            | X11rbError::X11Error(e) => to_x_error(e).is_destroyed_window_race(),
            _ => false,
        }
    }
}

pub(crate) fn to_x_error(e: &X11Error) -> XError {
    XError {
        error_code: e.error_code,
        request_code: e.major_opcode,
    }
}

macro_rules! impl_from_x11rb_error {
    ($($t:ty),+) => {
        $(
            impl From<$t> for crate::Error {
                fn from(e: $t) -> Self {
                    crate::Error::X11rb(X11rbError::from(e))
                }
            }
        )+
    };
}

impl_from_x11rb_error!(ConnectError, ConnectionError, ReplyError, ReplyOrIdError);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::x::{error::request, XErrorCode};
    use simple_test_case::test_case;
    use x11rb::protocol::ErrorKind;

    fn x11_error(code: XErrorCode, major_opcode: u8) -> X11Error {
        X11Error {
            error_kind: ErrorKind::Unknown(code as u8),
            error_code: code as u8,
            sequence: 0,
            bad_value: 0,
            minor_opcode: 0,
            major_opcode,
            extension_name: None,
            request_name: None,
        }
    }

    #[test_case(XErrorCode::BadWindow, request::CONFIGURE_WINDOW, false; "destroyed window")]
    #[test_case(XErrorCode::BadAccess, request::GRAB_KEY, false; "key already grabbed")]
    #[test_case(XErrorCode::BadValue, request::CONFIGURE_WINDOW, true; "bad value")]
    #[test_case(XErrorCode::BadMatch, request::GRAB_KEY, true; "bad match on grab")]
    #[test]
    fn protocol_error_fatality(code: XErrorCode, opcode: u8, fatal: bool) {
        let err = X11rbError::X11Error(x11_error(code, opcode));

        assert_eq!(err.is_fatal(), fatal);
        assert_eq!(err.is_destroyed_window_race(), !fatal);
    }

    #[test]
    fn connection_errors_are_fatal() {
        let err = X11rbError::Connection(ConnectionError::UnknownError);

        assert!(err.is_fatal());
    }
}
