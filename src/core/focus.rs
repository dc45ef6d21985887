//! Input focus and the per-monitor stacking order
use crate::{
    core::State,
    x::{Atom, ClientConfig, Prop, StackMode, XConn, XConnExt},
    Result, Xid,
};
use tracing::{debug, trace};

impl State {
    /// Give focus to `target`, or the most recently focused visible client on the selected
    /// monitor if `target` is `None` or not currently visible.
    ///
    /// With nothing to focus, input focus returns to the root window.
    pub(crate) fn focus<X: XConn>(&mut self, x: &X, target: Option<Xid>) -> Result<()> {
        let target = match target.filter(|&id| self.is_visible(id)) {
            Some(id) => Some(id),
            None => self.first_visible_in_stack(self.selmon),
        };

        if let Some(prev) = self.monitors[self.selmon].sel {
            if Some(prev) != target {
                self.unfocus(x, prev, false)?;
            }
        }

        match target {
            Some(id) => {
                let (mon, urgent) = match self.clients.get(&id) {
                    Some(c) => (c.mon, c.is_urgent),
                    None => return Ok(()),
                };

                trace!(%id, mon, "focusing client");
                self.selmon = mon;
                self.detach_stack(id);
                self.attach_stack(id);
                self.monitors[mon].sel = Some(id);

                if urgent {
                    self.set_urgent(x, id, false)?;
                }
                x.set_border_color(id, self.config.selected_border.rgb_u32())?;
                self.set_focus(x, id)?;
            }

            None => {
                trace!("no focusable clients: focusing root");
                self.monitors[self.selmon].sel = None;
                x.focus(self.root)?;
                x.delete_prop(self.root, Atom::NetActiveWindow.as_ref())?;
            }
        }

        Ok(())
    }

    /// Mark a client as no longer focused, optionally handing input focus back to the root.
    pub(crate) fn unfocus<X: XConn>(&mut self, x: &X, id: Xid, set_focus: bool) -> Result<()> {
        x.set_border_color(id, self.config.normal_border.rgb_u32())?;

        if set_focus {
            x.focus(self.root)?;
            x.delete_prop(self.root, Atom::NetActiveWindow.as_ref())?;
        }

        Ok(())
    }

    /// Pass X input focus to a client unless it refuses keyboard input, offering
    /// WM_TAKE_FOCUS when it is supported.
    pub(crate) fn set_focus<X: XConn>(&self, x: &X, id: Xid) -> Result<()> {
        let never_focus = self.clients.get(&id).map(|c| c.never_focus).unwrap_or(false);

        if !never_focus {
            x.focus(id)?;
            x.set_prop(
                self.root,
                Atom::NetActiveWindow.as_ref(),
                Prop::Window(vec![id]),
            )?;
        }

        x.send_protocol(id, Atom::WmTakeFocus)?;

        Ok(())
    }

    /// Set or clear the urgency of a client, keeping its WM_HINTS in sync.
    pub(crate) fn set_urgent<X: XConn>(&mut self, x: &X, id: Xid, urgent: bool) -> Result<()> {
        match self.clients.get_mut(&id) {
            Some(c) => c.is_urgent = urgent,
            None => return Ok(()),
        }

        if let Some(mut hints) = x.wm_hints(id)? {
            hints.set_urgent(urgent);
            x.set_prop(id, Atom::WmHints.as_ref(), Prop::WmHints(hints))?;
        }

        Ok(())
    }

    /// Move focus to the next (positive `dir`) or previous visible client on the selected
    /// monitor, wrapping around at either end of the client list.
    pub fn focus_stack<X: XConn>(&mut self, x: &X, dir: i32) -> Result<()> {
        let m = self.selmon;
        let sel = match self.monitors[m].sel {
            Some(id) => id,
            None => return Ok(()),
        };

        if self.clients.get(&sel).map(|c| c.is_fullscreen).unwrap_or(true) {
            return Ok(());
        }

        let visible: Vec<Xid> = self.monitors[m]
            .clients
            .iter()
            .copied()
            .filter(|&id| self.is_visible(id))
            .collect();

        let i = match visible.iter().position(|&id| id == sel) {
            Some(i) => i,
            None => return Ok(()),
        };

        let n = visible.len();
        let next = if dir > 0 { (i + 1) % n } else { (i + n - 1) % n };

        self.focus(x, Some(visible[next]))?;
        self.restack(x, m)
    }

    /// Raise the selected client if it floats and stack the tiled clients of the monitor
    /// below one another in focus order.
    pub(crate) fn restack<X: XConn>(&self, x: &X, m: usize) -> Result<()> {
        let mon = &self.monitors[m];
        let sel = match mon.sel.and_then(|id| self.clients.get(&id)) {
            Some(c) => c,
            None => return Ok(()),
        };

        let arranged = mon.layout.is_arranged();
        if sel.is_floating || !arranged {
            x.raise(sel.id)?;
        }

        if arranged {
            let mut sibling = None;
            for &id in mon.stack.iter() {
                let c = match self.clients.get(&id) {
                    Some(c) if !c.is_floating && c.is_visible_on(mon) => c,
                    _ => continue,
                };

                let mut data = vec![ClientConfig::StackMode(StackMode::Below)];
                if let Some(s) = sibling {
                    data.insert(0, ClientConfig::Sibling(s));
                }
                x.set_client_config(c.id, &data)?;
                sibling = Some(c.id);
            }
        }

        debug!(m, "restacked monitor");
        x.drop_enter_events()
    }
}
