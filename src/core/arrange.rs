//! Positioning clients on screen
use crate::{
    core::State,
    pure::{
        geometry::{Point, Rect},
        Bounds,
    },
    x::{Atom, ClientConfig, Prop, XConn, XConnExt},
    Result, Xid,
};
use tracing::trace;

impl State {
    /// Show and hide clients based on their tags then lay out either a single monitor
    /// (restacking it) or every monitor.
    pub(crate) fn arrange<X: XConn>(&mut self, x: &X, m: Option<usize>) -> Result<()> {
        match m {
            Some(m) => {
                self.show_hide(x, m)?;
                self.arrange_mon(x, m)?;
                self.restack(x, m)
            }

            None => {
                for m in 0..self.monitors.len() {
                    self.show_hide(x, m)?;
                }
                for m in 0..self.monitors.len() {
                    self.arrange_mon(x, m)?;
                }

                Ok(())
            }
        }
    }

    // Visible clients are moved into place top down, hidden clients are moved off
    // screen bottom up.
    fn show_hide<X: XConn>(&mut self, x: &X, m: usize) -> Result<()> {
        let stack = self.monitors[m].stack.clone();
        let arranged = self.monitors[m].layout.is_arranged();

        for &id in stack.iter() {
            let c = match self.clients.get(&id) {
                Some(c) if c.is_visible_on(&self.monitors[m]) => c,
                _ => continue,
            };

            let r = c.r;
            let free = (!arranged || c.is_floating) && !c.is_fullscreen;
            x.set_client_config(id, &[ClientConfig::Move(Point::new(r.x, r.y))])?;
            if free {
                self.resize(x, id, r, false)?;
            }
        }

        for &id in stack.iter().rev() {
            let c = match self.clients.get(&id) {
                Some(c) if !c.is_visible_on(&self.monitors[m]) => c,
                _ => continue,
            };

            let hidden = Point::new(-2 * c.outer_width() as i32, c.r.y);
            x.set_client_config(id, &[ClientConfig::Move(hidden)])?;
        }

        Ok(())
    }

    /// Apply the monitor's layout to its visible tiled clients.
    pub(crate) fn arrange_mon<X: XConn>(&mut self, x: &X, m: usize) -> Result<()> {
        let mon = &self.monitors[m];
        let tiled = self.tiled_clients(m);
        let rects = mon.layout.arrange(mon.wr, mon.mfact, tiled.len());
        trace!(m, layout = mon.layout.as_ref(), n = tiled.len(), "arranging monitor");

        for (id, r) in tiled.into_iter().zip(rects) {
            let border = match self.clients.get(&id) {
                Some(c) => c.border,
                None => continue,
            };
            self.resize(x, id, r.shrink_in(border), false)?;
        }

        Ok(())
    }

    /// Constrain and apply a new geometry for a client, doing nothing if the constrained
    /// geometry matches its current one.
    pub(crate) fn resize<X: XConn>(&mut self, x: &X, id: Xid, r: Rect, interact: bool) -> Result<()> {
        let c = match self.clients.get(&id) {
            Some(c) => c,
            None => return Ok(()),
        };

        let mon = &self.monitors[c.mon];
        let bounds = Bounds {
            screen: self.screen,
            usable: mon.wr,
            bar_height: self.config.bar_height,
        };

        let (r, changed) = c.apply_constraints(r, &bounds, mon.layout.is_arranged(), interact);
        if changed {
            self.resize_client(x, id, r)?;
        }

        Ok(())
    }

    /// Unconditionally move and resize a client, remembering its previous geometry.
    pub(crate) fn resize_client<X: XConn>(&mut self, x: &X, id: Xid, r: Rect) -> Result<()> {
        let c = match self.clients.get_mut(&id) {
            Some(c) => c,
            None => return Ok(()),
        };

        c.old_r = c.r;
        c.r = r;
        x.set_client_config(id, &[ClientConfig::Position(r), ClientConfig::BorderPx(c.border)])?;
        x.send_configure_notify(id, r, c.border)?;

        Ok(())
    }

    /// Make a client cover its whole monitor or restore it to its previous geometry.
    pub(crate) fn set_fullscreen<X: XConn>(&mut self, x: &X, id: Xid, fullscreen: bool) -> Result<()> {
        let border_px = self.config.border_px;
        let c = match self.clients.get_mut(&id) {
            Some(c) => c,
            None => return Ok(()),
        };

        if fullscreen && !c.is_fullscreen {
            let full = vec![Atom::NetWmStateFullscreen.as_ref().to_owned()];
            x.set_prop(id, Atom::NetWmState.as_ref(), Prop::Atom(full))?;

            c.is_fullscreen = true;
            c.old_floating = c.is_floating;
            c.is_floating = true;
            c.border = 0;
            let r = self.monitors[c.mon].r;

            self.resize_client(x, id, r)?;
            x.raise(id)?;
        } else if !fullscreen && c.is_fullscreen {
            x.set_prop(id, Atom::NetWmState.as_ref(), Prop::Atom(vec![]))?;

            c.is_fullscreen = false;
            c.is_floating = c.old_floating;
            c.border = border_px;
            let (r, m) = (c.old_r, c.mon);

            self.resize_client(x, id, r)?;
            self.arrange(x, Some(m))?;
        }

        Ok(())
    }
}
