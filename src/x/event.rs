//! Data types for working with X events
use crate::{
    core::bindings::KeyCode,
    pure::geometry::{Point, Rect},
    Xid,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Wrapper around the low level X event types that correspond to request / response data when
/// communicating with the X server itself.
///
/// The variant names and data have developed with the x11rb implementation in mind but
/// should be applicable for all back ends.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum XEvent {
    /// A message has been sent to a particular client
    ClientMessage(ClientMessage),
    /// Client config has changed in some way
    ConfigureNotify(ConfigureEvent),
    /// A client is requesting to be repositioned
    ConfigureRequest(ConfigureRequest),
    /// A client window has been closed
    Destroy(Xid),
    /// The mouse pointer has entered a new client window
    Enter(PointerChange),
    /// Input focus has moved to the given window
    FocusIn(Xid),
    /// A grabbed key combination has been entered by the user
    KeyPress(KeyCode),
    /// The keyboard mapping has changed
    MappingNotify,
    /// A client window is requesting to be positioned and rendered on the screen
    MapRequest(Xid),
    /// The mouse pointer has moved across the root window
    Motion(PointerChange),
    /// A client property has changed in some way
    PropertyNotify(PropertyEvent),
    /// A client window has been unmapped
    UnmapNotify(UnmapEvent),
}

/// The data carried by a client message
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMessage {
    /// The window the message is about
    pub id: Xid,
    /// The message type
    pub dtype: String,
    /// The message data, widened to u32
    pub data: [u32; 5],
}

impl ClientMessage {
    /// Create a new message for the given window.
    pub fn new(id: Xid, dtype: impl Into<String>, data: [u32; 5]) -> Self {
        Self {
            id,
            dtype: dtype.into(),
            data,
        }
    }
}

/// A configure notification
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigureEvent {
    /// The window that was reconfigured
    pub id: Xid,
    /// The new window geometry
    pub r: Rect,
    /// Is this window the root window?
    pub is_root: bool,
}

/// The stacking modes that can be requested when configuring a window
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackMode {
    /// Above its sibling (or all windows)
    Above,
    /// Below its sibling (or all windows)
    Below,
    /// Above if a sibling occludes it
    TopIf,
    /// Below if it occludes a sibling
    BottomIf,
    /// Toggle between TopIf and BottomIf
    Opposite,
}

/// A request from a client to change its geometry or stacking.
///
/// Only the fields the client asked to change are set.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConfigureRequest {
    /// The window making the request
    pub id: Xid,
    /// Requested x position
    pub x: Option<i32>,
    /// Requested y position
    pub y: Option<i32>,
    /// Requested width
    pub w: Option<u32>,
    /// Requested height
    pub h: Option<u32>,
    /// Requested border width
    pub border: Option<u32>,
    /// Requested stacking sibling
    pub sibling: Option<Xid>,
    /// Requested stacking mode
    pub stack_mode: Option<StackMode>,
}

/// The pointer entering a window or moving across the root
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerChange {
    /// The window the event was reported for
    pub id: Xid,
    /// Absolute coordinate of the event
    pub abs: Point,
    /// False for grab related crossings and for crossings into an inferior window
    pub normal: bool,
}

/// A property change on a window
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEvent {
    /// The window whose property changed
    pub id: Xid,
    /// The name of the property that changed
    pub atom: String,
    /// Is this window the root window?
    pub is_root: bool,
    /// Was the property deleted rather than changed?
    pub deleted: bool,
}

/// A window being unmapped
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmapEvent {
    /// The window being unmapped
    pub id: Xid,
    /// Sent by a client via SendEvent (ICCCM 4.1.4) rather than by the server
    pub synthetic: bool,
}
