//! XEvent handlers for use in the main event loop
use crate::{
    core::{
        bindings::{KeyBindings, KeyCode},
        State,
    },
    pure::geometry::Rect,
    x::{
        event::{ClientMessage, ConfigureEvent, ConfigureRequest, PointerChange, PropertyEvent, UnmapEvent},
        Atom, ClientConfig, WmState, XConn, XConnExt,
    },
    Result, Xid,
};
use std::str::FromStr;
use tracing::{error, trace};

// _NET_WM_STATE actions
const NET_WM_STATE_ADD: u32 = 1;
const NET_WM_STATE_TOGGLE: u32 = 2;

pub(crate) fn client_message<X>(msg: ClientMessage, state: &mut State, x: &X) -> Result<()>
where
    X: XConn,
{
    let (is_fullscreen, is_urgent) = match state.clients.get(&msg.id) {
        Some(c) => (c.is_fullscreen, c.is_urgent),
        None => return Ok(()),
    };

    trace!(id = %msg.id, dtype = %msg.dtype, data = ?msg.data, "got client message");

    match Atom::from_str(&msg.dtype) {
        Ok(Atom::NetWmState) => {
            let fullscreen = *x.intern_atom(Atom::NetWmStateFullscreen.as_ref())?;
            if msg.data[1] != fullscreen && msg.data[2] != fullscreen {
                return Ok(());
            }

            let action = msg.data[0];
            let enable = action == NET_WM_STATE_ADD || (action == NET_WM_STATE_TOGGLE && !is_fullscreen);
            state.set_fullscreen(x, msg.id, enable)
        }

        Ok(Atom::NetActiveWindow) if state.focused_client() != Some(msg.id) && !is_urgent => {
            state.set_urgent(x, msg.id, true)
        }

        // NOTE: all other client message types are ignored
        _ => Ok(()),
    }
}

pub(crate) fn configure_request<X>(req: ConfigureRequest, state: &mut State, x: &X) -> Result<()>
where
    X: XConn,
{
    let c = match state.clients.get_mut(&req.id) {
        Some(c) => c,
        None => return forward_configure_request(req, x),
    };

    let arranged = state.monitors[state.selmon].layout.is_arranged();
    if !c.is_floating && arranged {
        // tiled clients are told where they already are
        return x.send_configure_notify(c.id, c.r, c.border);
    }

    let m = state.monitors[c.mon].r;
    let mut r = c.r;
    if let Some(rx) = req.x {
        r.x = m.x + rx;
    }
    if let Some(ry) = req.y {
        r.y = m.y + ry;
    }
    if let Some(w) = req.w {
        r.w = w;
    }
    if let Some(h) = req.h {
        r.h = h;
    }

    c.old_r = c.r;
    c.r = r;

    if c.is_floating {
        let (w, h) = (c.outer_width() as i32, c.outer_height() as i32);
        if c.r.x + c.r.w as i32 > m.right() {
            c.r.x = m.x + (m.w as i32 / 2 - w / 2);
        }
        if c.r.y + c.r.h as i32 > m.bottom() {
            c.r.y = m.y + (m.h as i32 / 2 - h / 2);
        }
    }

    let (id, r, border) = (c.id, c.r, c.border);
    let moved_only = (req.x.is_some() || req.y.is_some()) && req.w.is_none() && req.h.is_none();
    if moved_only {
        x.send_configure_notify(id, r, border)?;
    }

    if state.is_visible(id) {
        x.set_client_config(id, &[ClientConfig::Position(r)])?;
    }

    Ok(())
}

// Windows we are not managing get exactly what they asked for
fn forward_configure_request<X: XConn>(req: ConfigureRequest, x: &X) -> Result<()> {
    let data: Vec<ClientConfig> = [
        req.x.map(ClientConfig::X),
        req.y.map(ClientConfig::Y),
        req.w.map(ClientConfig::Width),
        req.h.map(ClientConfig::Height),
        req.border.map(ClientConfig::BorderPx),
        req.sibling.map(ClientConfig::Sibling),
        req.stack_mode.map(ClientConfig::StackMode),
    ]
    .into_iter()
    .flatten()
    .collect();

    trace!(id = %req.id, ?data, "forwarding configure request for unmanaged window");
    x.set_client_config(req.id, &data)
}

pub(crate) fn configure_notify<X>(evt: ConfigureEvent, state: &mut State, x: &X) -> Result<()>
where
    X: XConn,
{
    if !evt.is_root {
        return Ok(());
    }

    let screen = Rect::new(0, 0, evt.r.w, evt.r.h);
    let dirty = state.screen != screen;
    state.screen = screen;

    if state.update_geometry(x)? || dirty {
        let fullscreen: Vec<(Xid, Rect)> = state
            .clients
            .values()
            .filter(|c| c.is_fullscreen)
            .map(|c| (c.id, state.monitors[c.mon].r))
            .collect();

        for (id, r) in fullscreen {
            state.resize_client(x, id, r)?;
        }

        state.focus(x, None)?;
        state.arrange(x, None)?;
    }

    Ok(())
}

pub(crate) fn destroy<X>(id: Xid, state: &mut State, x: &X) -> Result<()>
where
    X: XConn,
{
    if state.clients.contains_key(&id) {
        state.unmanage(x, id, true)?;
    }

    Ok(())
}

// Synthetic unmaps come from clients withdrawing themselves
pub(crate) fn unmap_notify<X>(evt: UnmapEvent, state: &mut State, x: &X) -> Result<()>
where
    X: XConn,
{
    if !state.clients.contains_key(&evt.id) {
        return Ok(());
    }

    if evt.synthetic {
        x.set_wm_state(evt.id, WmState::Withdrawn)
    } else {
        state.unmanage(x, evt.id, false)
    }
}

pub(crate) fn enter<X>(p: PointerChange, state: &mut State, x: &X) -> Result<()>
where
    X: XConn,
{
    if !p.normal && p.id != state.root {
        return Ok(());
    }

    let managed = state.clients.get(&p.id).map(|c| c.mon);
    let m = match managed {
        Some(m) => m,
        None => state.win_to_mon(x, p.id)?,
    };

    if m != state.selmon {
        if let Some(sel) = state.focused_client() {
            state.unfocus(x, sel, true)?;
        }
        state.selmon = m;
    } else if managed.is_none() || state.focused_client() == Some(p.id) {
        return Ok(());
    }

    let target = managed.map(|_| p.id);
    state.focus(x, target)
}

// Track which monitor the pointer is on when it moves over the root window
pub(crate) fn motion<X>(p: PointerChange, state: &mut State, x: &X) -> Result<()>
where
    X: XConn,
{
    if p.id != state.root {
        return Ok(());
    }

    let m = state.point_to_mon(p.abs);
    if state.motion_mon.is_some() && state.motion_mon != Some(m) {
        if let Some(sel) = state.focused_client() {
            state.unfocus(x, sel, true)?;
        }
        state.selmon = m;
        state.focus(x, None)?;
    }
    state.motion_mon = Some(m);

    Ok(())
}

// Some clients try to grab focus for themselves so we hand it back to the selection
pub(crate) fn focus_in<X>(id: Xid, state: &mut State, x: &X) -> Result<()>
where
    X: XConn,
{
    match state.focused_client() {
        Some(sel) if sel != id => state.set_focus(x, sel),
        _ => Ok(()),
    }
}

pub(crate) fn mapping_notify<X>(bindings: &KeyBindings, x: &X) -> Result<()>
where
    X: XConn,
{
    x.refresh_keyboard_mapping()?;
    x.grab_keys(&bindings.keys())
}

pub(crate) fn map_request<X>(id: Xid, state: &mut State, x: &X) -> Result<()>
where
    X: XConn,
{
    let attrs = match x.window_attributes(id)? {
        Some(attrs) if !attrs.override_redirect => attrs,
        _ => return Ok(()),
    };

    if !state.clients.contains_key(&id) {
        state.manage(x, id, attrs)?;
    }

    Ok(())
}

pub(crate) fn property_notify<X>(evt: PropertyEvent, state: &mut State, x: &X) -> Result<()>
where
    X: XConn,
{
    if evt.deleted || !state.clients.contains_key(&evt.id) {
        return Ok(());
    }

    trace!(id = %evt.id, atom = %evt.atom, "client property changed");

    match Atom::from_str(&evt.atom) {
        Ok(Atom::WmTransientFor) => {
            let (floating, mon) = match state.clients.get(&evt.id) {
                Some(c) => (c.is_floating, c.mon),
                None => return Ok(()),
            };

            let parent_managed = x
                .transient_for(evt.id)?
                .map(|t| state.clients.contains_key(&t))
                .unwrap_or(false);

            if !floating && parent_managed {
                if let Some(c) = state.clients.get_mut(&evt.id) {
                    c.is_floating = true;
                }
                state.arrange(x, Some(mon))?;
            }

            Ok(())
        }

        Ok(Atom::WmNormalHints) => state.update_size_hints(x, evt.id),
        Ok(Atom::WmHints) => state.update_wm_hints(x, evt.id),
        Ok(Atom::WmName | Atom::NetWmName) => state.update_title(x, evt.id),
        Ok(Atom::NetWmWindowType) => state.update_window_type(x, evt.id),

        _ => Ok(()),
    }
}

pub(crate) fn keypress<X>(key: KeyCode, bindings: &KeyBindings, state: &mut State, x: &X) -> Result<()>
where
    X: XConn,
{
    let keysym = x.keysym(key)?;

    if let Some(cmd) = bindings.command_for(key.mask, keysym) {
        if let Err(error) = state.run_command(x, cmd) {
            error!(%error, ?key, "error running user keybinding");
        }
    }

    Ok(())
}
