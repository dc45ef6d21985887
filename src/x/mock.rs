//! A recording implementation of XConn for use in tests.
//!
//! Windows, properties and outputs are held in memory and every request with a visible
//! side effect is logged as a [Call] so that tests can assert on what the window manager
//! asked the X server to do.
//! This module and its contents are only available when testing.
use crate::{
    core::bindings::KeyCode,
    pure::geometry::{Point, Rect},
    x::{
        error::request,
        event::{ClientMessage, XEvent},
        property::{MapState, Prop, WindowAttributes, WmState},
        ClientAttr, ClientConfig, XConn, XError, XErrorCode,
    },
    Error, Result, Xid,
};
use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet, VecDeque},
    os::unix::io::{AsRawFd, RawFd},
};

/// A side effecting request made against a [MockXConn]
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    GrabKeys(Vec<(u16, u32)>),
    UngrabKeys,
    Map(Xid),
    Kill(Xid),
    Focus(Xid),
    FocusPointerRoot,
    SetProp(Xid, String, Prop),
    DeleteProp(Xid, String),
    SetWmState(Xid, WmState),
    SetAttrs(Xid, Vec<ClientAttr>),
    SetConfig(Xid, Vec<ClientConfig>),
    ConfigureNotify(Xid, Rect, u32),
    ClientMessage(ClientMessage),
    CreateCheckWindow(Xid),
    DestroyWindow(Xid),
}

pub(crate) const ROOT: Xid = Xid(1);
pub(crate) const CHECK_WINDOW: Xid = Xid(2);

#[derive(Debug)]
pub(crate) struct MockXConn {
    pub(crate) screen: Rect,
    pub(crate) outputs: RefCell<Option<Vec<Rect>>>,
    pub(crate) pointer: Cell<Option<Point>>,
    pub(crate) props: RefCell<HashMap<(Xid, String), Prop>>,
    pub(crate) attrs: RefCell<HashMap<Xid, WindowAttributes>>,
    pub(crate) wm_states: RefCell<HashMap<Xid, WmState>>,
    pub(crate) events: RefCell<VecDeque<XEvent>>,
    pub(crate) poll_errors: RefCell<VecDeque<Error>>,
    pub(crate) destroyed: RefCell<HashSet<Xid>>,
    pub(crate) calls: RefCell<Vec<Call>>,
    atoms: RefCell<Vec<String>>,
}

impl MockXConn {
    pub(crate) fn new(screen: Rect, outputs: Option<Vec<Rect>>) -> Self {
        Self {
            screen,
            outputs: RefCell::new(outputs),
            pointer: Cell::new(None),
            props: Default::default(),
            attrs: Default::default(),
            wm_states: Default::default(),
            events: Default::default(),
            poll_errors: Default::default(),
            destroyed: Default::default(),
            calls: Default::default(),
            atoms: Default::default(),
        }
    }

    /// Register a top level window with the given geometry and no border.
    pub(crate) fn add_window(&self, id: Xid, r: Rect) {
        self.attrs.borrow_mut().insert(
            id,
            WindowAttributes {
                override_redirect: false,
                map_state: MapState::Viewable,
                r,
                border: 0,
            },
        );
    }

    pub(crate) fn remove_window(&self, id: Xid) {
        self.attrs.borrow_mut().remove(&id);
        self.props.borrow_mut().retain(|(w, _), _| *w != id);
    }

    pub(crate) fn put_prop(&self, id: Xid, name: &str, val: Prop) {
        self.props.borrow_mut().insert((id, name.to_owned()), val);
    }

    pub(crate) fn prop(&self, id: Xid, name: &str) -> Option<Prop> {
        self.props.borrow().get(&(id, name.to_owned())).cloned()
    }

    pub(crate) fn push_event(&self, event: XEvent) {
        self.events.borrow_mut().push_back(event);
    }

    /// Fail the next call to poll_event with `error` before any queued events are returned.
    pub(crate) fn push_poll_error(&self, error: Error) {
        self.poll_errors.borrow_mut().push_back(error);
    }

    /// Destroy a window on the server without the window manager having been told yet:
    /// reading its properties fails with BadWindow.
    pub(crate) fn destroy_on_server(&self, id: Xid) {
        self.destroyed.borrow_mut().insert(id);
    }

    pub(crate) fn take_calls(&self) -> Vec<Call> {
        self.calls.take()
    }

    /// The geometry most recently sent to the given window.
    pub(crate) fn last_position(&self, id: Xid) -> Option<Rect> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            Call::SetConfig(w, data) if *w == id => data.iter().find_map(|d| match d {
                ClientConfig::Position(r) => Some(*r),
                _ => None,
            }),
            _ => None,
        })
    }

    /// The window most recently given input focus.
    pub(crate) fn focused(&self) -> Option<Xid> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            Call::Focus(id) => Some(*id),
            Call::FocusPointerRoot => Some(ROOT),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl XConn for MockXConn {
    fn root(&self) -> Xid {
        ROOT
    }

    fn screen_size(&self) -> Rect {
        self.screen
    }

    fn outputs(&self) -> Result<Option<Vec<Rect>>> {
        Ok(self.outputs.borrow().clone())
    }

    fn cursor_position(&self) -> Result<Option<Point>> {
        Ok(self.pointer.get())
    }

    fn grab_keys(&self, keys: &[(u16, u32)]) -> Result<()> {
        self.record(Call::GrabKeys(keys.to_vec()));
        Ok(())
    }

    fn ungrab_keys(&self) -> Result<()> {
        self.record(Call::UngrabKeys);
        Ok(())
    }

    fn keysym(&self, code: KeyCode) -> Result<u32> {
        Ok(code.code as u32)
    }

    fn refresh_keyboard_mapping(&self) -> Result<()> {
        Ok(())
    }

    fn poll_event(&self) -> Result<Option<XEvent>> {
        if let Some(error) = self.poll_errors.borrow_mut().pop_front() {
            return Err(error);
        }

        Ok(self.events.borrow_mut().pop_front())
    }

    fn flush(&self) {}

    fn sync(&self) -> Result<()> {
        Ok(())
    }

    fn drop_enter_events(&self) -> Result<()> {
        self.events
            .borrow_mut()
            .retain(|e| !matches!(e, XEvent::Enter(_)));

        Ok(())
    }

    fn intern_atom(&self, atom: &str) -> Result<Xid> {
        let mut atoms = self.atoms.borrow_mut();
        let i = match atoms.iter().position(|a| a == atom) {
            Some(i) => i,
            None => {
                atoms.push(atom.to_owned());
                atoms.len() - 1
            }
        };

        Ok(Xid(100 + i as u32))
    }

    fn atom_name(&self, xid: Xid) -> Result<String> {
        let i = xid.0.checked_sub(100).ok_or(Error::UnknownClient(xid))?;

        self.atoms
            .borrow()
            .get(i as usize)
            .cloned()
            .ok_or(Error::UnknownClient(xid))
    }

    fn window_attributes(&self, client: Xid) -> Result<Option<WindowAttributes>> {
        Ok(self.attrs.borrow().get(&client).copied())
    }

    fn existing_clients(&self) -> Result<Vec<Xid>> {
        let mut ids: Vec<Xid> = self.attrs.borrow().keys().copied().collect();
        ids.sort();

        Ok(ids)
    }

    fn map(&self, client: Xid) -> Result<()> {
        self.record(Call::Map(client));
        Ok(())
    }

    fn kill(&self, client: Xid) -> Result<()> {
        self.record(Call::Kill(client));
        Ok(())
    }

    fn focus(&self, client: Xid) -> Result<()> {
        self.record(Call::Focus(client));
        Ok(())
    }

    fn focus_pointer_root(&self) -> Result<()> {
        self.record(Call::FocusPointerRoot);
        Ok(())
    }

    fn get_prop(&self, client: Xid, prop_name: &str) -> Result<Option<Prop>> {
        if self.destroyed.borrow().contains(&client) {
            return Err(Error::from(XError {
                error_code: XErrorCode::BadWindow as u8,
                request_code: request::GET_PROPERTY,
            }));
        }

        Ok(self.prop(client, prop_name))
    }

    fn set_prop(&self, client: Xid, name: &str, val: Prop) -> Result<()> {
        self.put_prop(client, name, val.clone());
        self.record(Call::SetProp(client, name.to_owned(), val));
        Ok(())
    }

    fn delete_prop(&self, client: Xid, prop_name: &str) -> Result<()> {
        self.props
            .borrow_mut()
            .remove(&(client, prop_name.to_owned()));
        self.record(Call::DeleteProp(client, prop_name.to_owned()));
        Ok(())
    }

    fn get_wm_state(&self, client: Xid) -> Result<Option<WmState>> {
        Ok(self.wm_states.borrow().get(&client).copied())
    }

    fn set_wm_state(&self, client: Xid, wm_state: WmState) -> Result<()> {
        self.wm_states.borrow_mut().insert(client, wm_state);
        self.record(Call::SetWmState(client, wm_state));
        Ok(())
    }

    fn set_client_attributes(&self, client: Xid, attrs: &[ClientAttr]) -> Result<()> {
        self.record(Call::SetAttrs(client, attrs.to_vec()));
        Ok(())
    }

    fn set_client_config(&self, client: Xid, data: &[ClientConfig]) -> Result<()> {
        self.record(Call::SetConfig(client, data.to_vec()));
        Ok(())
    }

    fn send_configure_notify(&self, client: Xid, r: Rect, border: u32) -> Result<()> {
        self.record(Call::ConfigureNotify(client, r, border));
        Ok(())
    }

    fn send_client_message(&self, msg: ClientMessage) -> Result<()> {
        self.record(Call::ClientMessage(msg));
        Ok(())
    }

    fn create_check_window(&self) -> Result<Xid> {
        self.record(Call::CreateCheckWindow(CHECK_WINDOW));
        Ok(CHECK_WINDOW)
    }

    fn destroy_window(&self, id: Xid) -> Result<()> {
        self.record(Call::DestroyWindow(id));
        Ok(())
    }

    fn with_errors_ignored<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        f(self)
    }
}

// Only used to satisfy the run loop's bounds: tests always quit before it polls
impl AsRawFd for MockXConn {
    fn as_raw_fd(&self) -> RawFd {
        -1
    }
}
