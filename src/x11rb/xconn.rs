//! An implementation of [XConn] on top of an x11rb [Connection].
use crate::{
    core::{bindings::KeyCode, config::Config},
    pure::geometry::{Point, Rect},
    x::{
        property::{WindowAttributes, WmHints, WmNormalHints, WmState},
        Atom, ClientAttr, ClientConfig, ClientMessage, Prop, XConn, XErrorCode, XEvent,
    },
    x11rb::{
        conversions::{convert_event, to_map_state, to_stack_mode},
        to_x_error,
    },
    Error, Result, Xid,
};
use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    os::unix::io::{AsRawFd, RawFd},
};
use strum::IntoEnumIterator;
use tracing::{debug, trace, warn};
use x11rb::{
    connection::Connection,
    errors::ReplyError,
    protocol::{
        xinerama::{self, ConnectionExt as _},
        xproto::{
            AtomEnum, ChangeWindowAttributesAux, ClientMessageEvent, ConfigureNotifyEvent,
            ConfigureWindowAux, ConnectionExt as _, CreateWindowAux, EventMask, Grab, GrabMode,
            InputFocus, ModMask, PropMode, WindowClass, CONFIGURE_NOTIFY_EVENT,
        },
        Event,
    },
    resource_manager,
    rust_connection::RustConnection,
    wrapper::ConnectionExt as _,
    COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT, CURRENT_TIME, NONE,
};

// Longest property value we will read in 32 bit units
const MAX_PROP_LEN: u32 = 1024;

fn client_event_mask() -> EventMask {
    EventMask::ENTER_WINDOW
        | EventMask::FOCUS_CHANGE
        | EventMask::PROPERTY_CHANGE
        | EventMask::STRUCTURE_NOTIFY
}

fn root_event_mask() -> EventMask {
    EventMask::SUBSTRUCTURE_REDIRECT
        | EventMask::SUBSTRUCTURE_NOTIFY
        | EventMask::POINTER_MOTION
        | EventMask::ENTER_WINDOW
        | EventMask::LEAVE_WINDOW
        | EventMask::STRUCTURE_NOTIFY
        | EventMask::PROPERTY_CHANGE
}

/// The keysym table reported by GetKeyboardMapping
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct KeyboardMapping {
    min_keycode: u8,
    keysyms_per_keycode: usize,
    keysyms: Vec<u32>,
}

impl KeyboardMapping {
    /// The unshifted keysym for a key code, 0 (NoSymbol) if it is unmapped.
    fn keysym(&self, code: u8) -> u32 {
        if code < self.min_keycode || self.keysyms_per_keycode == 0 {
            return 0;
        }

        let ix = (code - self.min_keycode) as usize * self.keysyms_per_keycode;
        self.keysyms.get(ix).copied().unwrap_or(0)
    }

    /// Every key code whose unshifted keysym is `keysym`.
    fn keycodes(&self, keysym: u32) -> Vec<u8> {
        if self.keysyms_per_keycode == 0 {
            return vec![];
        }

        self.keysyms
            .chunks(self.keysyms_per_keycode)
            .enumerate()
            .filter(|(_, syms)| syms.first() == Some(&keysym))
            .filter_map(|(i, _)| u8::try_from(i).ok()?.checked_add(self.min_keycode))
            .collect()
    }
}

/// Handles communication with an X server via the x11rb crate.
#[derive(Debug)]
pub struct X11rbConnection<C: Connection> {
    conn: C,
    root: Xid,
    screen: Rect,
    atoms: RefCell<HashMap<String, Xid>>,
    keyboard: RefCell<KeyboardMapping>,
    pending: RefCell<VecDeque<Event>>,
}

impl X11rbConnection<RustConnection> {
    /// Connect to the X server named by `$DISPLAY`.
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)?;

        Self::new(conn, screen_num)
    }
}

impl AsRawFd for X11rbConnection<RustConnection> {
    fn as_raw_fd(&self) -> RawFd {
        self.conn.stream().as_raw_fd()
    }
}

impl<C: Connection> X11rbConnection<C> {
    /// Wrap an existing connection, selecting SubstructureRedirect on the root window of the
    /// given screen.
    ///
    /// Fails with [Error::OtherWmRunning] if another client already holds the redirect.
    pub fn new(conn: C, screen_num: usize) -> Result<Self> {
        let setup = conn.setup();
        let (root, screen) = match setup.roots.get(screen_num) {
            Some(s) => (
                Xid(s.root),
                Rect::new(0, 0, s.width_in_pixels as u32, s.height_in_pixels as u32),
            ),
            None => {
                return Err(Error::InvalidConfig {
                    reason: format!("X screen {screen_num} does not exist"),
                })
            }
        };

        let aux = ChangeWindowAttributesAux::new().event_mask(EventMask::SUBSTRUCTURE_REDIRECT);
        match conn.change_window_attributes(*root, &aux)?.check() {
            Ok(()) => (),
            Err(ReplyError::X11Error(e)) if e.error_code == XErrorCode::BadAccess as u8 => {
                return Err(Error::OtherWmRunning)
            }
            Err(e) => return Err(e.into()),
        }

        let cookies = Atom::iter()
            .map(|atom| Ok((atom, conn.intern_atom(false, atom.as_ref().as_bytes())?)))
            .collect::<Result<Vec<_>>>()?;
        let atoms = cookies
            .into_iter()
            .map(|(atom, cookie)| Ok((atom.as_ref().to_owned(), Xid(cookie.reply()?.atom))))
            .collect::<Result<HashMap<_, _>>>()?;

        let keyboard = fetch_keyboard_mapping(&conn)?;

        debug!(%root, ?screen, "connected to X server");

        Ok(Self {
            conn,
            root,
            screen,
            atoms: RefCell::new(atoms),
            keyboard: RefCell::new(keyboard),
            pending: RefCell::new(VecDeque::new()),
        })
    }

    /// A reference to the underlying x11rb [Connection].
    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Override values in `config` from the `tessera.*` entries of the X resource database.
    pub fn load_resources(&self, config: &mut Config) -> Result<()> {
        let db = resource_manager::new_from_default(&self.conn)?;
        config.apply_resources(|name| db.get_string(name, "").map(String::from));

        Ok(())
    }

    fn next_raw_event(&self) -> Result<Option<Event>> {
        let pending = self.pending.borrow_mut().pop_front();
        match pending {
            Some(event) => Ok(Some(event)),
            None => Ok(self.conn.poll_for_event()?),
        }
    }

    // Read everything the server has sent so far into the pending queue, keeping only
    // the events that `keep` accepts.
    fn drain_into_pending<F>(&self, keep: F) -> Result<()>
    where
        F: Fn(&Event) -> bool,
    {
        while let Some(event) = self.conn.poll_for_event()? {
            if keep(&event) {
                self.pending.borrow_mut().push_back(event);
            } else {
                trace!(?event, "discarding event");
            }
        }

        Ok(())
    }

    fn utf8_string(&self) -> Result<u32> {
        Ok(*self.intern_atom(Atom::UTF8String.as_ref())?)
    }
}

fn fetch_keyboard_mapping<C: Connection>(conn: &C) -> Result<KeyboardMapping> {
    let setup = conn.setup();
    let (min, max) = (setup.min_keycode, setup.max_keycode);
    let reply = conn.get_keyboard_mapping(min, max - min + 1)?.reply()?;

    Ok(KeyboardMapping {
        min_keycode: min,
        keysyms_per_keycode: reply.keysyms_per_keycode as usize,
        keysyms: reply.keysyms,
    })
}

fn split_strings(mut raw: Vec<u8>) -> Vec<String> {
    if raw.last() == Some(&0) {
        raw.pop();
    }

    raw.split(|&b| b == 0)
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect()
}

impl<C: Connection> XConn for X11rbConnection<C> {
    fn root(&self) -> Xid {
        self.root
    }

    fn screen_size(&self) -> Rect {
        self.screen
    }

    fn outputs(&self) -> Result<Option<Vec<Rect>>> {
        if self
            .conn
            .extension_information(xinerama::X11_EXTENSION_NAME)?
            .is_none()
        {
            return Ok(None);
        }

        if self.conn.xinerama_is_active()?.reply()?.state == 0 {
            return Ok(None);
        }

        let rects = self
            .conn
            .xinerama_query_screens()?
            .reply()?
            .screen_info
            .iter()
            .map(|s| Rect::new(s.x_org as i32, s.y_org as i32, s.width as u32, s.height as u32))
            .collect();

        Ok(Some(rects))
    }

    fn cursor_position(&self) -> Result<Option<Point>> {
        let reply = self.conn.query_pointer(*self.root)?.reply()?;

        Ok(Some(Point::new(reply.root_x as i32, reply.root_y as i32)))
    }

    fn grab_keys(&self, keys: &[(u16, u32)]) -> Result<()> {
        let numlock = u16::from(ModMask::M2);
        let lock = u16::from(ModMask::LOCK);
        let keyboard = self.keyboard.borrow();

        self.conn
            .ungrab_key(Grab::ANY, *self.root, ModMask::ANY)?;

        for &(mods, keysym) in keys {
            let codes = keyboard.keycodes(keysym);
            if codes.is_empty() {
                warn!(keysym, "no key code for keysym");
            }

            for code in codes {
                for extra in [0, lock, numlock, lock | numlock] {
                    self.conn.grab_key(
                        true,
                        *self.root,
                        ModMask::from(mods | extra),
                        code,
                        GrabMode::ASYNC,
                        GrabMode::ASYNC,
                    )?;
                }
            }
        }

        Ok(())
    }

    fn ungrab_keys(&self) -> Result<()> {
        self.conn
            .ungrab_key(Grab::ANY, *self.root, ModMask::ANY)?;

        Ok(())
    }

    fn keysym(&self, code: KeyCode) -> Result<u32> {
        Ok(self.keyboard.borrow().keysym(code.code))
    }

    fn refresh_keyboard_mapping(&self) -> Result<()> {
        let mapping = fetch_keyboard_mapping(&self.conn)?;
        *self.keyboard.borrow_mut() = mapping;

        Ok(())
    }

    fn poll_event(&self) -> Result<Option<XEvent>> {
        while let Some(event) = self.next_raw_event()? {
            if let Event::Error(e) = &event {
                let err = to_x_error(e);
                if err.is_destroyed_window_race() {
                    warn!(?err, "ignoring X error for destroyed window");
                    continue;
                }
            }

            if let Some(event) = convert_event(self, event)? {
                return Ok(Some(event));
            }
        }

        Ok(None)
    }

    fn flush(&self) {
        if let Err(error) = self.conn.flush() {
            warn!(%error, "unable to flush X connection");
        }
    }

    fn sync(&self) -> Result<()> {
        self.conn.get_input_focus()?.reply()?;

        Ok(())
    }

    fn drop_enter_events(&self) -> Result<()> {
        self.sync()?;
        self.drain_into_pending(|e| !matches!(e, Event::EnterNotify(_)))
    }

    fn intern_atom(&self, atom: &str) -> Result<Xid> {
        if let Some(&id) = self.atoms.borrow().get(atom) {
            return Ok(id);
        }

        let id = Xid(self.conn.intern_atom(false, atom.as_bytes())?.reply()?.atom);
        self.atoms.borrow_mut().insert(atom.to_owned(), id);

        Ok(id)
    }

    fn atom_name(&self, xid: Xid) -> Result<String> {
        let known = self
            .atoms
            .borrow()
            .iter()
            .find(|(_, &id)| id == xid)
            .map(|(name, _)| name.clone());

        if let Some(name) = known {
            return Ok(name);
        }

        let reply = self.conn.get_atom_name(*xid)?.reply()?;
        let name = String::from_utf8_lossy(&reply.name).into_owned();
        self.atoms.borrow_mut().insert(name.clone(), xid);

        Ok(name)
    }

    fn window_attributes(&self, client: Xid) -> Result<Option<WindowAttributes>> {
        let attrs = self.conn.get_window_attributes(*client)?.reply();
        let geom = self.conn.get_geometry(*client)?.reply();

        match (attrs, geom) {
            (Ok(attrs), Ok(geom)) => Ok(Some(WindowAttributes {
                override_redirect: attrs.override_redirect,
                map_state: to_map_state(attrs.map_state),
                r: Rect::new(
                    geom.x as i32,
                    geom.y as i32,
                    geom.width as u32,
                    geom.height as u32,
                ),
                border: geom.border_width as u32,
            })),

            (Err(ReplyError::X11Error(e)), _) | (_, Err(ReplyError::X11Error(e)))
                if e.error_code == XErrorCode::BadWindow as u8 =>
            {
                trace!(%client, "window no longer exists");
                Ok(None)
            }

            (Err(e), _) | (_, Err(e)) => Err(e.into()),
        }
    }

    fn existing_clients(&self) -> Result<Vec<Xid>> {
        let tree = self.conn.query_tree(*self.root)?.reply()?;

        Ok(tree.children.into_iter().map(Xid).collect())
    }

    fn map(&self, client: Xid) -> Result<()> {
        self.conn.map_window(*client)?;

        Ok(())
    }

    fn kill(&self, client: Xid) -> Result<()> {
        self.conn.kill_client(*client)?;

        Ok(())
    }

    fn focus(&self, client: Xid) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, *client, CURRENT_TIME)?;

        Ok(())
    }

    fn focus_pointer_root(&self) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, *self.root, CURRENT_TIME)?;

        Ok(())
    }

    fn get_prop(&self, client: Xid, prop_name: &str) -> Result<Option<Prop>> {
        let atom = *self.intern_atom(prop_name)?;
        let r = self
            .conn
            .get_property(false, *client, atom, AtomEnum::ANY, 0, MAX_PROP_LEN)?
            .reply()?;

        if r.type_ == NONE {
            trace!(%client, prop_name, "property not set");
            return Ok(None);
        }

        let ty = r.type_;
        let words = || r.value32().into_iter().flatten();

        let prop = if ty == u32::from(AtomEnum::ATOM) {
            Prop::Atom(
                words()
                    .map(|a| self.atom_name(Xid(a)))
                    .collect::<Result<_>>()?,
            )
        } else if ty == u32::from(AtomEnum::CARDINAL) {
            Prop::Cardinal(words().collect())
        } else if ty == u32::from(AtomEnum::WINDOW) {
            Prop::Window(words().map(Xid).collect())
        } else if ty == u32::from(AtomEnum::WM_HINTS) {
            Prop::WmHints(WmHints::try_from_bytes(&words().collect::<Vec<_>>())?)
        } else if ty == u32::from(AtomEnum::WM_SIZE_HINTS) {
            Prop::WmNormalHints(WmNormalHints::try_from_bytes(&words().collect::<Vec<_>>())?)
        } else if ty == u32::from(AtomEnum::STRING) || ty == self.utf8_string()? || r.format == 8 {
            Prop::UTF8String(split_strings(r.value.clone()))
        } else {
            Prop::Bytes(words().collect())
        };

        Ok(Some(prop))
    }

    fn set_prop(&self, client: Xid, name: &str, val: Prop) -> Result<()> {
        let atom = *self.intern_atom(name)?;

        let (ty, data) = match val {
            Prop::Atom(atoms) => (
                u32::from(AtomEnum::ATOM),
                atoms
                    .iter()
                    .map(|a| self.intern_atom(a).map(|id| *id))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Prop::Bytes(data) | Prop::Cardinal(data) => (u32::from(AtomEnum::CARDINAL), data),
            Prop::Window(ids) => (
                u32::from(AtomEnum::WINDOW),
                ids.into_iter().map(|id| *id).collect(),
            ),
            Prop::WmHints(hints) => (u32::from(AtomEnum::WM_HINTS), hints.to_bytes()),
            Prop::WmNormalHints(hints) => (u32::from(AtomEnum::WM_SIZE_HINTS), hints.to_bytes()),

            Prop::UTF8String(strs) => {
                let joined = strs.join("\0");
                self.conn.change_property8(
                    PropMode::REPLACE,
                    *client,
                    atom,
                    self.utf8_string()?,
                    joined.as_bytes(),
                )?;

                return Ok(());
            }
        };

        self.conn
            .change_property32(PropMode::REPLACE, *client, atom, ty, &data)?;

        Ok(())
    }

    fn delete_prop(&self, client: Xid, prop_name: &str) -> Result<()> {
        let atom = *self.intern_atom(prop_name)?;
        self.conn.delete_property(*client, atom)?;

        Ok(())
    }

    fn get_wm_state(&self, client: Xid) -> Result<Option<WmState>> {
        let atom = *self.intern_atom(Atom::WmState.as_ref())?;
        let r = self
            .conn
            .get_property(false, *client, atom, atom, 0, 2)?
            .reply()?;

        Ok(r
            .value32()
            .and_then(|mut it| it.next())
            .and_then(WmState::from_u32))
    }

    fn set_wm_state(&self, client: Xid, wm_state: WmState) -> Result<()> {
        let atom = *self.intern_atom(Atom::WmState.as_ref())?;
        self.conn.change_property32(
            PropMode::REPLACE,
            *client,
            atom,
            atom,
            &[wm_state.as_u32(), NONE],
        )?;

        Ok(())
    }

    fn set_client_attributes(&self, client: Xid, attrs: &[ClientAttr]) -> Result<()> {
        let aux = attrs
            .iter()
            .fold(ChangeWindowAttributesAux::new(), |aux, attr| match attr {
                ClientAttr::BorderColor(c) => aux.border_pixel(*c),
                ClientAttr::ClientEventMask => aux.event_mask(client_event_mask()),
                ClientAttr::RootEventMask => aux.event_mask(root_event_mask()),
            });

        self.conn.change_window_attributes(*client, &aux)?;

        Ok(())
    }

    fn set_client_config(&self, client: Xid, data: &[ClientConfig]) -> Result<()> {
        let aux = data
            .iter()
            .fold(ConfigureWindowAux::new(), |aux, conf| match *conf {
                ClientConfig::BorderPx(px) => aux.border_width(px),
                ClientConfig::Position(r) => aux.x(r.x).y(r.y).width(r.w).height(r.h),
                ClientConfig::Move(p) => aux.x(p.x).y(p.y),
                ClientConfig::X(x) => aux.x(x),
                ClientConfig::Y(y) => aux.y(y),
                ClientConfig::Width(w) => aux.width(w),
                ClientConfig::Height(h) => aux.height(h),
                ClientConfig::Sibling(id) => aux.sibling(*id),
                ClientConfig::StackMode(mode) => aux.stack_mode(to_stack_mode(mode)),
            });

        self.conn.configure_window(*client, &aux)?;

        Ok(())
    }

    fn send_configure_notify(&self, client: Xid, r: Rect, border: u32) -> Result<()> {
        let event = ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: *client,
            window: *client,
            above_sibling: NONE,
            x: r.x as i16,
            y: r.y as i16,
            width: r.w as u16,
            height: r.h as u16,
            border_width: border as u16,
            override_redirect: false,
        };

        self.conn
            .send_event(false, *client, EventMask::STRUCTURE_NOTIFY, event)?;

        Ok(())
    }

    fn send_client_message(&self, msg: ClientMessage) -> Result<()> {
        let type_ = *self.intern_atom(&msg.dtype)?;
        let event = ClientMessageEvent::new(32, *msg.id, type_, msg.data);

        self.conn
            .send_event(false, *msg.id, EventMask::NO_EVENT, event)?;

        Ok(())
    }

    fn create_check_window(&self) -> Result<Xid> {
        let id = self.conn.generate_id()?;
        self.conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            id,
            *self.root,
            0,
            0,
            1,
            1,
            0,
            WindowClass::INPUT_OUTPUT,
            COPY_FROM_PARENT,
            &CreateWindowAux::new(),
        )?;

        Ok(Xid(id))
    }

    fn destroy_window(&self, id: Xid) -> Result<()> {
        self.conn.destroy_window(*id)?;

        Ok(())
    }

    fn with_errors_ignored<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.conn.grab_server()?;
        let res = f(self);
        self.sync()?;
        self.drain_into_pending(|e| !matches!(e, Event::Error(_)))?;
        self.conn.ungrab_server()?;

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    // Two keysyms per key code starting at key code 8
    fn mapping() -> KeyboardMapping {
        KeyboardMapping {
            min_keycode: 8,
            keysyms_per_keycode: 2,
            keysyms: vec![0x61, 0x41, 0x62, 0x42, 0x61, 0x41, 0, 0],
        }
    }

    #[test_case(8, 0x61; "first key")]
    #[test_case(9, 0x62; "second key")]
    #[test_case(11, 0; "unmapped key")]
    #[test_case(7, 0; "below min key code")]
    #[test_case(200, 0; "past the end of the table")]
    #[test]
    fn keysym_lookup(code: u8, expected: u32) {
        assert_eq!(mapping().keysym(code), expected);
    }

    #[test]
    fn every_key_code_for_a_keysym_is_found() {
        assert_eq!(mapping().keycodes(0x61), vec![8, 10]);
        assert_eq!(mapping().keycodes(0x62), vec![9]);
    }

    #[test]
    fn shifted_keysyms_do_not_match() {
        assert_eq!(mapping().keycodes(0x41), vec![]);
    }

    #[test]
    fn empty_mappings_have_no_keys() {
        let m = KeyboardMapping::default();

        assert_eq!(m.keysym(10), 0);
        assert_eq!(m.keycodes(0x61), vec![]);
    }

    #[test_case(b"foo\0".to_vec(), &["foo"]; "trailing nul")]
    #[test_case(b"foo".to_vec(), &["foo"]; "no trailing nul")]
    #[test_case(b"xterm\0XTerm\0".to_vec(), &["xterm", "XTerm"]; "wm class")]
    #[test_case(vec![], &[""]; "empty")]
    #[test]
    fn string_properties_are_split(raw: Vec<u8>, expected: &[&str]) {
        assert_eq!(split_strings(raw), expected);
    }
}
