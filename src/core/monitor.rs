//! Physical outputs and the reconciliation of monitors against them
use crate::{
    builtin::layout::LayoutKind,
    core::{config::Config, State},
    pure::geometry::{Point, Rect},
    x::XConn,
    Result, Xid,
};
use tracing::{debug, info};

/// A physical output along with the clients assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    pub(crate) r: Rect,
    pub(crate) wr: Rect,
    pub(crate) mfact: f32,
    pub(crate) layout: LayoutKind,
    pub(crate) tagset: [u32; 2],
    pub(crate) seltags: usize,
    pub(crate) clients: Vec<Xid>,
    pub(crate) stack: Vec<Xid>,
    pub(crate) sel: Option<Xid>,
}

impl Monitor {
    pub(crate) fn new(r: Rect, config: &Config) -> Self {
        Self {
            r,
            wr: r.without_top(config.bar_height),
            mfact: config.mfact,
            layout: config.layouts[0],
            tagset: [1, 1],
            seltags: 0,
            clients: vec![],
            stack: vec![],
            sel: None,
        }
    }

    pub(crate) fn set_geometry(&mut self, r: Rect, bar_height: u32) {
        self.r = r;
        self.wr = r.without_top(bar_height);
    }

    /// The full geometry of this monitor
    pub fn r(&self) -> Rect {
        self.r
    }

    /// The area of this monitor available to clients
    pub fn wr(&self) -> Rect {
        self.wr
    }

    /// The current master fraction
    pub fn mfact(&self) -> f32 {
        self.mfact
    }

    /// The currently selected layout
    pub fn layout(&self) -> LayoutKind {
        self.layout
    }

    /// The tags currently being shown
    pub fn active_tags(&self) -> u32 {
        self.tagset[self.seltags]
    }

    /// The focused client on this monitor
    pub fn sel(&self) -> Option<Xid> {
        self.sel
    }

    /// Clients in insertion order (newest first)
    pub fn clients(&self) -> &[Xid] {
        &self.clients
    }

    /// Clients in focus order (most recent first)
    pub fn stack(&self) -> &[Xid] {
        &self.stack
    }
}

// Identical outputs (mirrored displays) are treated as a single monitor
fn unique_outputs(outputs: Vec<Rect>) -> Vec<Rect> {
    let mut unique: Vec<Rect> = Vec::with_capacity(outputs.len());
    for r in outputs {
        if !unique.contains(&r) {
            unique.push(r);
        }
    }

    unique
}

impl State {
    /// Bring the set of monitors in line with the given outputs.
    ///
    /// Monitors are created for new outputs and updated in place for changed ones.
    /// Monitors past the end of the output list are torn down and their clients moved to
    /// the first monitor. Without any output information the whole screen is treated as a
    /// single monitor. Returns whether anything changed.
    pub fn reconcile_monitors(&mut self, outputs: Option<Vec<Rect>>) -> bool {
        let bh = self.config.bar_height;
        let mut dirty = false;

        let outputs = match outputs.map(unique_outputs) {
            Some(o) if !o.is_empty() => o,
            _ => vec![self.screen],
        };

        let n = self.monitors.len();
        let nn = outputs.len();

        for (i, r) in outputs.into_iter().enumerate() {
            if i >= n {
                debug!(i, ?r, "adding monitor");
                self.monitors.push(Monitor::new(r, &self.config));
                dirty = true;
            } else if self.monitors[i].r != r {
                debug!(i, ?r, "updating monitor geometry");
                self.monitors[i].set_geometry(r, bh);
                dirty = true;
            }
        }

        while self.monitors.len() > nn {
            let m = self.monitors.len() - 1;
            self.remove_monitor(m);
            dirty = true;
        }

        dirty
    }

    // Migrate the clients of the last monitor onto the first, preserving their order
    fn remove_monitor(&mut self, m: usize) {
        let removed = match self.monitors.pop() {
            Some(removed) => removed,
            None => return,
        };
        debug!(m, n_clients = removed.clients.len(), "removing monitor");

        for &id in removed.clients.iter().rev() {
            if let Some(c) = self.clients.get_mut(&id) {
                c.mon = 0;
            }
            self.monitors[0].clients.insert(0, id);
        }
        for &id in removed.stack.iter().rev() {
            self.monitors[0].stack.insert(0, id);
        }

        if self.selmon >= self.monitors.len() {
            self.selmon = 0;
        }
        if self.motion_mon == Some(m) {
            self.motion_mon = None;
        }
    }

    /// The monitor with the largest overlap with `r`, falling back to the selected monitor.
    pub fn rect_to_mon(&self, r: &Rect) -> usize {
        let mut best = self.selmon;
        let mut area = 0;

        for (i, m) in self.monitors.iter().enumerate() {
            let a = m.wr.intersect_area(r);
            if a > area {
                area = a;
                best = i;
            }
        }

        best
    }

    /// The next (positive `dir`) or previous monitor, wrapping around.
    pub fn dir_to_mon(&self, dir: i32) -> usize {
        let n = self.monitors.len();
        if dir > 0 {
            (self.selmon + 1) % n
        } else {
            (self.selmon + n - 1) % n
        }
    }

    pub(crate) fn point_to_mon(&self, p: Point) -> usize {
        self.rect_to_mon(&Rect::new(p.x, p.y, 1, 1))
    }

    /// The monitor a window belongs to: the pointer position for the root window, the
    /// owning monitor for clients and the selected monitor otherwise.
    pub(crate) fn win_to_mon<X: XConn>(&self, x: &X, id: Xid) -> Result<usize> {
        if id == self.root {
            if let Some(p) = x.cursor_position()? {
                return Ok(self.point_to_mon(p));
            }
        }

        Ok(self.clients.get(&id).map(|c| c.mon).unwrap_or(self.selmon))
    }

    /// Query the current outputs and reconcile the monitors against them.
    ///
    /// When anything changed the selected monitor follows the pointer.
    pub(crate) fn update_geometry<X: XConn>(&mut self, x: &X) -> Result<bool> {
        let outputs = x.outputs()?;
        let dirty = self.reconcile_monitors(outputs);

        if dirty {
            self.selmon = 0;
            self.selmon = self.win_to_mon(x, self.root)?;
            info!(n_monitors = self.monitors.len(), selmon = self.selmon, "monitors updated");
        }

        Ok(dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::Client;
    use simple_test_case::test_case;

    const SCREEN: Rect = Rect::new(0, 0, 2560, 800);
    const LEFT: Rect = Rect::new(0, 0, 1280, 800);
    const RIGHT: Rect = Rect::new(1280, 0, 1280, 800);

    fn state() -> State {
        State::new(Config::default(), Xid(1), SCREEN)
    }

    fn add_client(s: &mut State, id: u32, mon: usize) {
        let id = Xid(id);
        s.clients
            .insert(id, Client::new(id, Rect::new(0, 0, 10, 10), 0, mon, 1));
        s.monitors[mon].clients.insert(0, id);
        s.monitors[mon].stack.insert(0, id);
    }

    #[test]
    fn no_outputs_tracks_the_screen() {
        let mut s = state();
        s.reconcile_monitors(Some(vec![LEFT, RIGHT]));

        assert!(s.reconcile_monitors(None));
        assert_eq!(s.monitors.len(), 1);
        assert_eq!(s.monitors[0].r, SCREEN);
        assert!(!s.reconcile_monitors(None));
    }

    #[test]
    fn empty_outputs_are_treated_as_none() {
        let mut s = state();

        assert!(!s.reconcile_monitors(Some(vec![])));
        assert_eq!(s.monitors.len(), 1);
        assert_eq!(s.monitors[0].r, SCREEN);
    }

    #[test]
    fn duplicate_outputs_are_coalesced() {
        let mut s = state();
        s.reconcile_monitors(Some(vec![LEFT, LEFT, RIGHT]));

        assert_eq!(s.monitors.len(), 2);
    }

    #[test]
    fn removing_a_monitor_migrates_its_clients() {
        let mut s = state();
        s.reconcile_monitors(Some(vec![LEFT, RIGHT]));
        add_client(&mut s, 10, 0);
        add_client(&mut s, 20, 1);
        add_client(&mut s, 21, 1);
        s.selmon = 1;

        assert!(s.reconcile_monitors(Some(vec![LEFT])));

        assert_eq!(s.monitors.len(), 1);
        assert_eq!(s.selmon, 0);
        assert_eq!(s.monitors[0].clients, vec![Xid(21), Xid(20), Xid(10)]);
        assert_eq!(s.monitors[0].stack, vec![Xid(21), Xid(20), Xid(10)]);
        assert!(s.clients.values().all(|c| c.mon == 0));
    }

    #[test]
    fn usable_area_excludes_the_bar() {
        let mut s = State::new(
            Config {
                bar_height: 20,
                ..Default::default()
            },
            Xid(1),
            SCREEN,
        );
        s.reconcile_monitors(Some(vec![LEFT]));

        assert_eq!(s.monitors[0].wr, Rect::new(0, 20, 1280, 780));
    }

    #[test_case(Rect::new(10, 10, 10, 10), 0; "left")]
    #[test_case(Rect::new(1300, 10, 10, 10), 1; "right")]
    #[test_case(Rect::new(1200, 10, 200, 10), 1; "mostly right")]
    #[test_case(Rect::new(5000, 10, 10, 10), 0; "nowhere falls back to selmon")]
    #[test]
    fn rect_to_mon(r: Rect, expected: usize) {
        let mut s = state();
        s.reconcile_monitors(Some(vec![LEFT, RIGHT]));

        assert_eq!(s.rect_to_mon(&r), expected);
    }

    #[test_case(1, 1; "forward")]
    #[test_case(-1, 1; "backward wraps")]
    #[test]
    fn dir_to_mon(dir: i32, expected: usize) {
        let mut s = state();
        s.reconcile_monitors(Some(vec![LEFT, RIGHT]));

        assert_eq!(s.dir_to_mon(dir), expected);
    }
}
