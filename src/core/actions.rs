//! The handlers behind each user [Command]
use crate::{
    builtin::layout::LayoutKind,
    core::{Command, State},
    x::{Atom, XConn, XConnExt},
    Result,
};
use tracing::{debug, info};

impl State {
    /// Run a single user command against the current state.
    pub fn run_command<X: XConn>(&mut self, x: &X, cmd: Command) -> Result<()> {
        debug!(?cmd, "running command");

        match cmd {
            Command::View(tags) => self.view(x, tags),
            Command::ToggleView(tags) => self.toggle_view(x, tags),
            Command::Tag(tags) => self.tag(x, tags),
            Command::ToggleTag(tags) => self.toggle_tag(x, tags),
            Command::FocusStack(dir) => self.focus_stack(x, dir),
            Command::CycleLayout(dir) => self.cycle_layout(x, dir),
            Command::SetLayout(kind) => self.set_layout(x, kind),
            Command::SetMfact(delta) => self.set_mfact(x, delta),
            Command::Zoom => self.zoom(x),
            Command::KillClient => self.kill_client(x),
            Command::ToggleFloating => self.toggle_floating(x),
            Command::FocusMon(dir) => self.focus_mon(x, dir),
            Command::TagMon(dir) => self.tag_mon(x, dir),
            Command::Quit => {
                info!("quit requested");
                self.running = false;
                Ok(())
            }
        }
    }

    /// Show exactly the given tags on the selected monitor, remembering the previous view.
    ///
    /// A mask with no configured tags in it swaps back to the previous view.
    pub fn view<X: XConn>(&mut self, x: &X, tags: u32) -> Result<()> {
        let tags = tags & self.config.tag_mask();
        let m = &mut self.monitors[self.selmon];

        if tags == m.active_tags() {
            return Ok(());
        }

        m.seltags ^= 1;
        if tags != 0 {
            m.tagset[m.seltags] = tags;
        }

        self.focus(x, None)?;
        self.arrange(x, Some(self.selmon))
    }

    /// Add or remove tags from the view of the selected monitor. The view can not be
    /// left empty.
    pub fn toggle_view<X: XConn>(&mut self, x: &X, tags: u32) -> Result<()> {
        let m = &mut self.monitors[self.selmon];
        let new = m.active_tags() ^ (tags & self.config.tag_mask());

        if new == 0 {
            return Ok(());
        }

        m.tagset[m.seltags] = new;
        self.focus(x, None)?;
        self.arrange(x, Some(self.selmon))
    }

    /// Replace the tags of the focused client.
    pub fn tag<X: XConn>(&mut self, x: &X, tags: u32) -> Result<()> {
        let tags = tags & self.config.tag_mask();
        let c = match self.focused_client().and_then(|id| self.clients.get_mut(&id)) {
            Some(c) if tags != 0 => c,
            _ => return Ok(()),
        };

        c.tags = tags;
        self.focus(x, None)?;
        self.arrange(x, Some(self.selmon))
    }

    /// Add or remove tags from the focused client. A client can not be left without tags.
    pub fn toggle_tag<X: XConn>(&mut self, x: &X, tags: u32) -> Result<()> {
        let mask = self.config.tag_mask();
        let c = match self.focused_client().and_then(|id| self.clients.get_mut(&id)) {
            Some(c) => c,
            None => return Ok(()),
        };

        let new = c.tags ^ (tags & mask);
        if new == 0 {
            return Ok(());
        }

        c.tags = new;
        self.focus(x, None)?;
        self.arrange(x, Some(self.selmon))
    }

    /// Step forward (positive `dir`) or backward through the configured layouts.
    ///
    /// A layout that is not in the configured list (selected with [Command::SetLayout])
    /// re-enters the cycle at the first layout going forward or the last going backward.
    pub fn cycle_layout<X: XConn>(&mut self, x: &X, dir: i32) -> Result<()> {
        let layouts = &self.config.layouts;
        let n = layouts.len();
        let current = self.monitors[self.selmon].layout;

        let next = match layouts.iter().position(|&l| l == current) {
            Some(i) if dir > 0 => (i + 1) % n,
            Some(i) => (i + n - 1) % n,
            None if dir > 0 => 0,
            None => n - 1,
        };
        let kind = layouts[next];

        self.set_layout(x, kind)
    }

    /// Select a layout for the selected monitor.
    pub fn set_layout<X: XConn>(&mut self, x: &X, kind: LayoutKind) -> Result<()> {
        let m = &mut self.monitors[self.selmon];
        debug!(layout = kind.as_ref(), "setting layout");
        m.layout = kind;

        if m.sel.is_some() {
            self.arrange(x, Some(self.selmon))?;
        }

        Ok(())
    }

    /// Adjust the master fraction of the selected monitor, keeping it within [0.1, 0.9].
    pub fn set_mfact<X: XConn>(&mut self, x: &X, delta: f32) -> Result<()> {
        let m = &mut self.monitors[self.selmon];
        if delta == 0.0 || !m.layout.is_arranged() {
            return Ok(());
        }

        m.mfact = (m.mfact + delta).clamp(0.1, 0.9);
        self.arrange(x, Some(self.selmon))
    }

    /// Swap the focused client with the master, or promote the next tiled client if the
    /// master is already focused.
    pub fn zoom<X: XConn>(&mut self, x: &X) -> Result<()> {
        let m = self.selmon;
        let sel = match self.monitors[m].sel.and_then(|id| self.clients.get(&id)) {
            Some(c) if !c.is_floating => c.id,
            _ => return Ok(()),
        };

        if !self.monitors[m].layout.is_arranged() {
            return Ok(());
        }

        let tiled = self.tiled_clients(m);
        let target = if tiled.first() == Some(&sel) {
            match tiled.get(1) {
                Some(&next) => next,
                None => return Ok(()),
            }
        } else {
            sel
        };

        self.detach(target);
        self.attach(target);
        self.focus(x, Some(target))?;
        self.arrange(x, Some(m))
    }

    /// Ask the focused client to close, killing it if it does not support WM_DELETE_WINDOW.
    pub fn kill_client<X: XConn>(&mut self, x: &X) -> Result<()> {
        let id = match self.focused_client() {
            Some(id) => id,
            None => return Ok(()),
        };

        if !x.send_protocol(id, Atom::WmDeleteWindow)? {
            info!(%id, "client does not support WM_DELETE_WINDOW: killing");
            x.with_errors_ignored(|x| x.kill(id))?;
        }

        Ok(())
    }

    /// Toggle floating for the focused client. Fixed size clients always float and
    /// fullscreen clients are left alone.
    pub fn toggle_floating<X: XConn>(&mut self, x: &X) -> Result<()> {
        let c = match self.focused_client().and_then(|id| self.clients.get_mut(&id)) {
            Some(c) if !c.is_fullscreen => c,
            _ => return Ok(()),
        };

        c.is_floating = !c.is_floating || c.is_fixed;
        let (id, r, floating) = (c.id, c.r, c.is_floating);
        if floating {
            self.resize(x, id, r, false)?;
        }

        self.arrange(x, Some(self.selmon))
    }

    /// Move focus to the next (positive `dir`) or previous monitor.
    pub fn focus_mon<X: XConn>(&mut self, x: &X, dir: i32) -> Result<()> {
        if self.monitors.len() < 2 {
            return Ok(());
        }

        let m = self.dir_to_mon(dir);
        if m == self.selmon {
            return Ok(());
        }

        if let Some(sel) = self.focused_client() {
            self.unfocus(x, sel, false)?;
        }
        self.selmon = m;

        self.focus(x, None)
    }

    /// Send the focused client to the next (positive `dir`) or previous monitor.
    pub fn tag_mon<X: XConn>(&mut self, x: &X, dir: i32) -> Result<()> {
        match self.focused_client() {
            Some(id) if self.monitors.len() > 1 => {
                let m = self.dir_to_mon(dir);
                self.send_mon(x, id, m)
            }
            _ => Ok(()),
        }
    }
}
