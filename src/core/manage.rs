//! Bringing windows under management and releasing them again
use crate::{
    core::{client::Client, State},
    pure::{geometry::Rect, SizeHints},
    x::{
        Atom, ClientAttr, ClientConfig, MapState, Prop, WindowAttributes, WmState, XConn,
        XConnExt,
    },
    Result, Xid,
};
use tracing::{debug, info};

impl State {
    /// Take control of a new top level window.
    ///
    /// Everything the window manager needs to know about the window is read from the X
    /// server before any state is modified.
    pub(crate) fn manage<X: XConn>(&mut self, x: &X, id: Xid, attrs: WindowAttributes) -> Result<()> {
        let transient_for = x.transient_for(id)?;
        let title = x.window_title(id)?;
        let (instance, class) = x.window_class(id)?;
        let normal_hints = x.normal_hints(id)?;
        let wm_hints = x.wm_hints(id)?;
        let wm_state = x.atom_prop(id, Atom::NetWmState)?;
        let window_type = x.atom_prop(id, Atom::NetWmWindowType)?;

        let parent = transient_for.and_then(|t| self.clients.get(&t));
        let (mon, tags, mut floating) = match parent {
            Some(p) => (p.mon, p.tags, false),
            None => self.apply_rules(&class, &instance, &title),
        };

        let mut c = Client::new(id, attrs.r, self.config.border_px, mon, tags);
        c.old_border = attrs.border;
        c.title = title;
        c.r = self.initial_position(&c);
        c.set_size_hints(normal_hints.map(|h| SizeHints::from(&h)).unwrap_or_default());
        if let Some(h) = &wm_hints {
            c.is_urgent = h.is_urgent();
            c.never_focus = h.never_focus();
        }
        if window_type.as_deref() == Some(Atom::NetWindowTypeDialog.as_ref()) {
            floating = true;
        }
        if !floating {
            floating = transient_for.is_some() || c.is_fixed;
        }
        c.is_floating = floating;
        c.old_floating = floating;

        info!(%id, %class, %instance, title = %c.title, mon, tags, floating, "managing client");
        let (r, border) = (c.r, c.border);
        self.clients.insert(id, c);

        x.set_client_config(id, &[ClientConfig::BorderPx(border)])?;
        x.set_border_color(id, self.config.normal_border.rgb_u32())?;
        x.send_configure_notify(id, r, border)?;
        x.set_client_attributes(id, &[ClientAttr::ClientEventMask])?;

        if wm_state.as_deref() == Some(Atom::NetWmStateFullscreen.as_ref()) {
            self.set_fullscreen(x, id, true)?;
        }
        if floating {
            x.raise(id)?;
        }

        self.attach(id);
        self.attach_stack(id);
        self.update_client_list(x)?;

        // some clients need to be mapped somewhere before they will accept their position
        let offscreen = Rect::new(r.x + 2 * self.screen.w as i32, r.y, r.w, r.h);
        x.set_client_config(id, &[ClientConfig::Position(offscreen)])?;
        x.set_wm_state(id, WmState::Normal)?;

        // clients placed on tags their monitor is not showing can not hold its selection
        if self.is_visible(id) {
            if mon == self.selmon {
                if let Some(prev) = self.monitors[self.selmon].sel {
                    self.unfocus(x, prev, false)?;
                }
            }
            self.monitors[mon].sel = Some(id);
        }
        self.arrange(x, Some(mon))?;
        x.map(id)?;

        self.focus(x, None)
    }

    // Keep a new client inside its monitor, only pushing it below the bar if its
    // horizontal centre is over the bar.
    fn initial_position(&self, c: &Client) -> Rect {
        let m = &self.monitors[c.mon];
        let mut r = c.r;
        let (w, h) = (c.outer_width() as i32, c.outer_height() as i32);

        if r.x + w > m.r.right() {
            r.x = m.r.right() - w;
        }
        if r.y + h > m.r.bottom() {
            r.y = m.r.bottom() - h;
        }
        r.x = r.x.max(m.r.x);

        let cx = r.x + (r.w / 2) as i32;
        let under_bar = m.wr.y != m.r.y && cx >= m.wr.x && cx < m.wr.right();
        r.y = r.y.max(if under_bar { m.wr.y } else { m.r.y });

        r
    }

    /// Match the configured rules against a new client, returning the monitor, tags and
    /// floating state it should start with.
    pub(crate) fn apply_rules(&self, class: &str, instance: &str, title: &str) -> (usize, u32, bool) {
        let mut mon = self.selmon;
        let mut tags = 0;
        let mut floating = false;

        for rule in self.config.rules.iter() {
            if !rule.matches(class, instance, title) {
                continue;
            }

            debug!(?rule, "matched rule");
            floating = rule.floating;
            tags |= rule.tags;
            if let Some(m) = rule.monitor.filter(|&m| m < self.monitors.len()) {
                mon = m;
            }
        }

        let tags = match tags & self.config.tag_mask() {
            0 => self.monitors[mon].active_tags(),
            t => t,
        };

        (mon, tags, floating)
    }

    /// Stop managing a client. Windows that still exist have their border and WM_STATE
    /// restored, ignoring any errors from them having gone away in the meantime.
    pub(crate) fn unmanage<X: XConn>(&mut self, x: &X, id: Xid, destroyed: bool) -> Result<()> {
        let (m, old_border) = match self.clients.get(&id) {
            Some(c) => (c.mon, c.old_border),
            None => return Ok(()),
        };

        info!(%id, destroyed, "unmanaging client");
        self.detach(id);
        self.detach_stack(id);
        self.clients.remove(&id);
        self.update_client_list(x)?;

        if !destroyed {
            x.with_errors_ignored(|x| {
                x.set_client_config(id, &[ClientConfig::BorderPx(old_border)])?;
                x.set_wm_state(id, WmState::Withdrawn)
            })?;
        }

        self.arrange(x, Some(m))?;
        self.focus(x, None)
    }

    /// Adopt any windows that were already mapped (or iconified) before startup,
    /// managing transient windows after their parents.
    pub(crate) fn scan<X: XConn>(&mut self, x: &X) -> Result<()> {
        let mut transients = Vec::new();

        for id in x.existing_clients()? {
            let attrs = match x.window_attributes(id)? {
                Some(attrs) if !attrs.override_redirect => attrs,
                _ => continue,
            };

            let viewable = attrs.map_state == MapState::Viewable
                || x.get_wm_state(id)? == Some(WmState::Iconic);
            if !viewable {
                continue;
            }

            if x.transient_for(id)?.is_some() {
                transients.push((id, attrs));
            } else {
                self.manage(x, id, attrs)?;
            }
        }

        for (id, attrs) in transients {
            self.manage(x, id, attrs)?;
        }

        debug!(n_clients = self.clients.len(), "finished scanning existing windows");
        Ok(())
    }

    /// Move a client to another monitor where it takes on that monitor's active tags.
    pub(crate) fn send_mon<X: XConn>(&mut self, x: &X, id: Xid, m: usize) -> Result<()> {
        match self.clients.get(&id) {
            Some(c) if c.mon != m => (),
            _ => return Ok(()),
        }

        debug!(%id, m, "sending client to monitor");
        self.unfocus(x, id, true)?;
        self.detach(id);
        self.detach_stack(id);

        let tags = self.monitors[m].active_tags();
        if let Some(c) = self.clients.get_mut(&id) {
            c.mon = m;
            c.tags = tags;
        }

        self.attach(id);
        self.attach_stack(id);
        self.focus(x, None)?;
        self.arrange(x, None)
    }

    pub(crate) fn update_title<X: XConn>(&mut self, x: &X, id: Xid) -> Result<()> {
        let title = x.window_title(id)?;
        if let Some(c) = self.clients.get_mut(&id) {
            c.title = title;
        }

        Ok(())
    }

    pub(crate) fn update_size_hints<X: XConn>(&mut self, x: &X, id: Xid) -> Result<()> {
        let hints = x.normal_hints(id)?;
        if let Some(c) = self.clients.get_mut(&id) {
            c.set_size_hints(hints.map(|h| SizeHints::from(&h)).unwrap_or_default());
        }

        Ok(())
    }

    /// Refresh urgency and input handling from WM_HINTS. The focused client can not
    /// become urgent: the flag is cleared on the window instead.
    pub(crate) fn update_wm_hints<X: XConn>(&mut self, x: &X, id: Xid) -> Result<()> {
        let mut hints = match x.wm_hints(id)? {
            Some(hints) => hints,
            None => return Ok(()),
        };

        let focused = self.focused_client() == Some(id);
        if focused && hints.is_urgent() {
            hints.set_urgent(false);
            x.set_prop(id, Atom::WmHints.as_ref(), Prop::WmHints(hints.clone()))?;
        }

        if let Some(c) = self.clients.get_mut(&id) {
            c.is_urgent = hints.is_urgent();
            c.never_focus = hints.never_focus();
        }

        Ok(())
    }

    pub(crate) fn update_window_type<X: XConn>(&mut self, x: &X, id: Xid) -> Result<()> {
        let state = x.atom_prop(id, Atom::NetWmState)?;
        let window_type = x.atom_prop(id, Atom::NetWmWindowType)?;

        if state.as_deref() == Some(Atom::NetWmStateFullscreen.as_ref()) {
            self.set_fullscreen(x, id, true)?;
        }
        if window_type.as_deref() == Some(Atom::NetWindowTypeDialog.as_ref()) {
            if let Some(c) = self.clients.get_mut(&id) {
                c.is_floating = true;
            }
        }

        Ok(())
    }
}
