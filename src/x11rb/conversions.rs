//! Conversions to tessera types from x11rb types
use crate::{
    core::bindings::KeyCode,
    pure::geometry::{Point, Rect},
    x::{
        event::{
            ClientMessage, ConfigureEvent, ConfigureRequest, PointerChange, PropertyEvent,
            StackMode, UnmapEvent,
        },
        MapState, XConn, XEvent,
    },
    x11rb::{X11rbConnection, X11rbError},
    Error, Result, Xid,
};
use tracing::{trace, warn};
use x11rb::{
    connection::Connection,
    errors::ReplyError,
    protocol::{
        xproto::{
            self, ClientMessageEvent, ConfigWindow, ConfigureRequestEvent, Mapping, ModMask,
            NotifyDetail, NotifyMode, Property,
        },
        Event,
    },
};

// The high bit of the response type marks events sent with SendEvent
const SEND_EVENT_MASK: u8 = 0x80;

pub(crate) fn convert_event<C: Connection>(
    conn: &X11rbConnection<C>,
    event: Event,
) -> Result<Option<XEvent>> {
    let root = conn.root();

    match event {
        Event::KeyPress(event) => {
            let code = KeyCode {
                mask: event.state.into(),
                code: event.detail,
            };
            let numlock = ModMask::M2;

            Ok(Some(XEvent::KeyPress(code.ignoring_modifier(numlock.into()))))
        }

        Event::MapRequest(event) => Ok(Some(XEvent::MapRequest(Xid(event.window)))),

        Event::UnmapNotify(event) => Ok(Some(XEvent::UnmapNotify(UnmapEvent {
            id: Xid(event.window),
            synthetic: event.response_type & SEND_EVENT_MASK != 0,
        }))),

        Event::EnterNotify(event) => Ok(Some(XEvent::Enter(PointerChange {
            id: Xid(event.event),
            abs: Point::new(event.root_x as i32, event.root_y as i32),
            normal: event.mode == NotifyMode::NORMAL && event.detail != NotifyDetail::INFERIOR,
        }))),

        Event::MotionNotify(event) => Ok(Some(XEvent::Motion(PointerChange {
            id: Xid(event.event),
            abs: Point::new(event.root_x as i32, event.root_y as i32),
            normal: true,
        }))),

        Event::FocusIn(event) => Ok(Some(XEvent::FocusIn(Xid(event.event)))),

        Event::DestroyNotify(event) => Ok(Some(XEvent::Destroy(Xid(event.window)))),

        Event::ConfigureNotify(event) => Ok(Some(XEvent::ConfigureNotify(ConfigureEvent {
            id: Xid(event.window),
            r: Rect::new(
                event.x as i32,
                event.y as i32,
                event.width as u32,
                event.height as u32,
            ),
            is_root: Xid(event.window) == root,
        }))),

        Event::ConfigureRequest(event) => Ok(Some(XEvent::ConfigureRequest(
            to_configure_request(&event),
        ))),

        Event::MappingNotify(event) if event.request == Mapping::KEYBOARD => {
            Ok(Some(XEvent::MappingNotify))
        }

        Event::ClientMessage(event) => to_client_message(conn, event),

        Event::PropertyNotify(event) => {
            let atom = match client_atom_name(conn, event.atom)? {
                Some(atom) => atom,
                None => return Ok(None),
            };

            Ok(Some(XEvent::PropertyNotify(PropertyEvent {
                id: Xid(event.window),
                atom,
                is_root: Xid(event.window) == root,
                deleted: event.state == Property::DELETE,
            })))
        }

        Event::Error(err) => Err(Error::X11rb(super::X11rbError::X11Error(err))),

        // NOTE: Ignoring other event types
        event => {
            trace!(?event, "dropping unhandled event");
            Ok(None)
        }
    }
}

fn to_configure_request(event: &ConfigureRequestEvent) -> ConfigureRequest {
    let has = |flag: ConfigWindow| event.value_mask.contains(flag);

    ConfigureRequest {
        id: Xid(event.window),
        x: has(ConfigWindow::X).then_some(event.x as i32),
        y: has(ConfigWindow::Y).then_some(event.y as i32),
        w: has(ConfigWindow::WIDTH).then_some(event.width as u32),
        h: has(ConfigWindow::HEIGHT).then_some(event.height as u32),
        border: has(ConfigWindow::BORDER_WIDTH).then_some(event.border_width as u32),
        sibling: has(ConfigWindow::SIBLING).then_some(Xid(event.sibling)),
        stack_mode: has(ConfigWindow::STACK_MODE).then(|| from_stack_mode(event.stack_mode)),
    }
}

fn to_client_message<C: Connection>(
    conn: &X11rbConnection<C>,
    event: ClientMessageEvent,
) -> Result<Option<XEvent>> {
    let data = match event.format {
        8 => widen(event.data.as_data8().iter().map(|&b| b as u32)),
        16 => widen(event.data.as_data16().iter().map(|&b| b as u32)),
        32 => event.data.as_data32(),
        format => return Err(Error::InvalidClientMessageData { format }),
    };

    let dtype = match client_atom_name(conn, event.type_)? {
        Some(dtype) => dtype,
        None => return Ok(None),
    };

    Ok(Some(XEvent::ClientMessage(ClientMessage::new(
        Xid(event.window),
        dtype,
        data,
    ))))
}

// Atoms in events come from clients: anything the server can not name is dropped along
// with the event that carried it.
fn client_atom_name<C: Connection>(conn: &X11rbConnection<C>, atom: u32) -> Result<Option<String>> {
    match conn.atom_name(Xid(atom)) {
        Ok(name) => Ok(Some(name)),
        Err(Error::X11rb(X11rbError::ReplyError(ReplyError::X11Error(e)))) => {
            warn!(atom, error_code = e.error_code, "unknown atom in client event: dropping");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

// Only the first five values are meaningful for the messages we handle
fn widen(it: impl Iterator<Item = u32>) -> [u32; 5] {
    let mut data = [0; 5];
    for (slot, val) in data.iter_mut().zip(it) {
        *slot = val;
    }

    data
}

pub(crate) fn from_stack_mode(mode: xproto::StackMode) -> StackMode {
    match mode {
        xproto::StackMode::BELOW => StackMode::Below,
        xproto::StackMode::TOP_IF => StackMode::TopIf,
        xproto::StackMode::BOTTOM_IF => StackMode::BottomIf,
        xproto::StackMode::OPPOSITE => StackMode::Opposite,
        _ => StackMode::Above,
    }
}

pub(crate) fn to_stack_mode(mode: StackMode) -> xproto::StackMode {
    match mode {
        StackMode::Above => xproto::StackMode::ABOVE,
        StackMode::Below => xproto::StackMode::BELOW,
        StackMode::TopIf => xproto::StackMode::TOP_IF,
        StackMode::BottomIf => xproto::StackMode::BOTTOM_IF,
        StackMode::Opposite => xproto::StackMode::OPPOSITE,
    }
}

pub(crate) fn to_map_state(state: xproto::MapState) -> MapState {
    match state {
        xproto::MapState::VIEWABLE => MapState::Viewable,
        xproto::MapState::UNVIEWABLE => MapState::UnViewable,
        _ => MapState::Unmapped,
    }
}
