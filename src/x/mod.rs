//! Logic for interacting with the X server
use crate::{
    core::bindings::KeyCode,
    pure::geometry::{Point, Rect},
    Result, Xid,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

pub mod atom;
pub mod error;
pub mod event;
#[cfg(test)]
pub(crate) mod mock;
pub mod property;

pub use atom::Atom;
pub use error::{XError, XErrorCode};
pub use event::{ClientMessage, StackMode, XEvent};
pub use property::{MapState, Prop, WindowAttributes, WmHints, WmNormalHints, WmState};

/// On screen configuration options for X clients
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClientConfig {
    /// The border width in pixels
    BorderPx(u32),
    /// Absolute size and position on the screen as a [Rect]
    Position(Rect),
    /// Absolute position on the screen leaving the size untouched
    Move(Point),
    /// Set only the x coordinate
    X(i32),
    /// Set only the y coordinate
    Y(i32),
    /// Set only the width
    Width(u32),
    /// Set only the height
    Height(u32),
    /// The sibling that [ClientConfig::StackMode] is relative to
    Sibling(Xid),
    /// Restack relative to the sibling, or to all windows if none is given
    StackMode(StackMode),
}

/// Attributes for an X11 client window
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientAttr {
    /// Border color as an rgb hex value
    BorderColor(u32),
    /// Set the pre-defined client event mask
    ClientEventMask,
    /// Set the pre-defined root event mask
    RootEventMask,
}

/// A handle on a running X11 connection that we can use for issuing X requests.
///
/// XConn is intended as an abstraction layer to allow for communication with the underlying
/// display system (assumed to be X) using whatever mechanism the implementer wishes. The
/// window manager state machine only ever talks to the X server through this trait.
pub trait XConn {
    /// The ID of the window manager root window.
    fn root(&self) -> Xid;
    /// The full extent of the X screen.
    fn screen_size(&self) -> Rect;
    /// Ask the X server for the geometry of each physical output, if it can report them.
    ///
    /// `None` means the screen should be treated as a single monitor.
    fn outputs(&self) -> Result<Option<Vec<Rect>>>;
    /// Ask the X server for the current (x, y) coordinate of the mouse cursor.
    fn cursor_position(&self) -> Result<Option<Point>>;

    /// Grab the given (modifier mask, keysym) combinations on the root window, replacing
    /// any previous grabs.
    fn grab_keys(&self, keys: &[(u16, u32)]) -> Result<()>;
    /// Release all key grabs.
    fn ungrab_keys(&self) -> Result<()>;
    /// The keysym currently bound to the given key code.
    fn keysym(&self, code: KeyCode) -> Result<u32>;
    /// Refetch the keyboard mapping after a MappingNotify.
    fn refresh_keyboard_mapping(&self) -> Result<()>;

    /// Return the next queued event without blocking.
    fn poll_event(&self) -> Result<Option<XEvent>>;
    /// Flush any pending requests to the X server.
    fn flush(&self);
    /// Wait for the X server to process all pending requests.
    fn sync(&self) -> Result<()>;
    /// Discard any queued pointer crossing events.
    fn drop_enter_events(&self) -> Result<()>;

    /// Look up the [Xid] of a given [Atom] name. If it is not currently interned, intern it.
    fn intern_atom(&self, atom: &str) -> Result<Xid>;
    /// Look up the string name of a given [Atom] by its [Xid].
    fn atom_name(&self, xid: Xid) -> Result<String>;

    /// Request the [WindowAttributes] for a given window, `None` if it no longer exists.
    fn window_attributes(&self, client: Xid) -> Result<Option<WindowAttributes>>;
    /// Ask the X server for the IDs of all current top level windows
    fn existing_clients(&self) -> Result<Vec<Xid>>;

    /// Map the given client window to the screen with its current geometry, making it visible.
    fn map(&self, client: Xid) -> Result<()>;
    /// Forcibly disconnect the owner of the given client window.
    fn kill(&self, client: Xid) -> Result<()>;
    /// Set X input focus to be held by the given window.
    fn focus(&self, client: Xid) -> Result<()>;
    /// Return input focus to whichever window is under the pointer.
    fn focus_pointer_root(&self) -> Result<()>;

    /// Look up a specific property on a given client window.
    fn get_prop(&self, client: Xid, prop_name: &str) -> Result<Option<Prop>>;
    /// Set a specific property on a given client window.
    fn set_prop(&self, client: Xid, name: &str, val: Prop) -> Result<()>;
    /// Delete a property for a given client window.
    fn delete_prop(&self, client: Xid, prop_name: &str) -> Result<()>;
    /// Get the current [WmState] for a given client window.
    fn get_wm_state(&self, client: Xid) -> Result<Option<WmState>>;
    /// Set the current [WmState] for a given client window.
    fn set_wm_state(&self, client: Xid, wm_state: WmState) -> Result<()>;

    /// Set one or more [ClientAttr] for a given client window.
    fn set_client_attributes(&self, client: Xid, attrs: &[ClientAttr]) -> Result<()>;
    /// Set the [ClientConfig] for a given client window.
    fn set_client_config(&self, client: Xid, data: &[ClientConfig]) -> Result<()>;
    /// Tell a client its geometry with a synthetic ConfigureNotify.
    fn send_configure_notify(&self, client: Xid, r: Rect, border: u32) -> Result<()>;
    /// Send a [ClientMessage] to a given client.
    fn send_client_message(&self, msg: ClientMessage) -> Result<()>;

    /// Create the hidden window used for `_NET_SUPPORTING_WM_CHECK`.
    fn create_check_window(&self) -> Result<Xid>;
    /// Destroy a window created by the window manager.
    fn destroy_window(&self, id: Xid) -> Result<()>;

    /// Run `f` with the server grabbed, dropping any protocol errors raised by its requests.
    fn with_errors_ignored<T, F>(&self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T>;
}

/// Extended functionality for [XConn] impls in order to run the window manager.
pub trait XConnExt: XConn + Sized {
    /// Read a property from a client window, treating a window that has already been
    /// destroyed as having no value set.
    fn client_prop(&self, id: Xid, prop_name: &str) -> Result<Option<Prop>> {
        match self.get_prop(id, prop_name) {
            Err(e) if e.is_destroyed_window_race() => {
                trace!(%id, prop_name, "window destroyed before its property could be read");
                Ok(None)
            }
            res => res,
        }
    }

    /// Look up the name of the first atom stored in the given property.
    fn atom_prop(&self, id: Xid, atom: Atom) -> Result<Option<String>> {
        match self.client_prop(id, atom.as_ref())? {
            Some(Prop::Atom(mut atoms)) if !atoms.is_empty() => Ok(Some(atoms.remove(0))),
            _ => Ok(None),
        }
    }

    /// Request the title of a given client window following ICCCM/EWMH standards.
    fn window_title(&self, id: Xid) -> Result<String> {
        for atom in [Atom::NetWmName, Atom::WmName] {
            if let Some(Prop::UTF8String(mut strs)) = self.client_prop(id, atom.as_ref())? {
                if !strs.is_empty() {
                    return Ok(strs.remove(0));
                }
            }
        }

        Ok(String::new())
    }

    /// Request the (instance, class) pair stored in WM_CLASS.
    fn window_class(&self, id: Xid) -> Result<(String, String)> {
        match self.client_prop(id, Atom::WmClass.as_ref())? {
            Some(Prop::UTF8String(strs)) => {
                let mut it = strs.into_iter();
                let instance = it.next().unwrap_or_default();
                let class = it.next().unwrap_or_default();

                Ok((instance, class))
            }
            _ => Ok(Default::default()),
        }
    }

    /// The window this window is transient for, if any.
    fn transient_for(&self, id: Xid) -> Result<Option<Xid>> {
        match self.client_prop(id, Atom::WmTransientFor.as_ref())? {
            Some(Prop::Window(ids)) => Ok(ids.first().copied().filter(|&t| *t != 0)),
            _ => Ok(None),
        }
    }

    /// The WM_HINTS set by the client, if any.
    fn wm_hints(&self, id: Xid) -> Result<Option<WmHints>> {
        match self.client_prop(id, Atom::WmHints.as_ref())? {
            Some(Prop::WmHints(hints)) => Ok(Some(hints)),
            _ => Ok(None),
        }
    }

    /// The WM_NORMAL_HINTS set by the client, if any.
    fn normal_hints(&self, id: Xid) -> Result<Option<WmNormalHints>> {
        match self.client_prop(id, Atom::WmNormalHints.as_ref())? {
            Some(Prop::WmNormalHints(hints)) => Ok(Some(hints)),
            _ => Ok(None),
        }
    }

    /// Check to see if a given client window supports a particular protocol or not
    fn client_supports_protocol(&self, id: Xid, proto: Atom) -> Result<bool> {
        if let Some(Prop::Atom(protocols)) = self.client_prop(id, Atom::WmProtocols.as_ref())? {
            Ok(protocols.iter().any(|p| p == proto.as_ref()))
        } else {
            Ok(false)
        }
    }

    /// Send a WM_PROTOCOLS message to the client if it supports the given protocol.
    ///
    /// Returns whether or not the message was sent.
    fn send_protocol(&self, id: Xid, proto: Atom) -> Result<bool> {
        if !self.client_supports_protocol(id, proto)? {
            return Ok(false);
        }

        trace!(%id, proto = proto.as_ref(), "sending protocol message");
        let atom = self.intern_atom(proto.as_ref())?;
        let msg = ClientMessage::new(id, Atom::WmProtocols.as_ref(), [*atom, 0, 0, 0, 0]);
        self.send_client_message(msg)?;

        Ok(true)
    }

    /// Update the border color of the given client window.
    fn set_border_color(&self, id: Xid, rgb: u32) -> Result<()> {
        self.set_client_attributes(id, &[ClientAttr::BorderColor(rgb)])
    }

    /// Raise a window above all of its siblings.
    fn raise(&self, id: Xid) -> Result<()> {
        self.set_client_config(id, &[ClientConfig::StackMode(StackMode::Above)])
    }
}

// Auto impl XConnExt for all XConn impls
impl<T> XConnExt for T where T: XConn {}
