//! Managed client windows
use crate::{
    core::monitor::Monitor,
    pure::{apply_constraints, geometry::Rect, Bounds, SizeHints},
    Xid,
};

/// A managed application window and the window manager's view of its state.
#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    pub(crate) id: Xid,
    pub(crate) title: String,
    pub(crate) r: Rect,
    pub(crate) old_r: Rect,
    pub(crate) border: u32,
    pub(crate) old_border: u32,
    pub(crate) hints: SizeHints,
    pub(crate) is_fixed: bool,
    pub(crate) is_floating: bool,
    pub(crate) old_floating: bool,
    pub(crate) is_urgent: bool,
    pub(crate) never_focus: bool,
    pub(crate) is_fullscreen: bool,
    pub(crate) tags: u32,
    pub(crate) mon: usize,
}

impl Client {
    pub(crate) fn new(id: Xid, r: Rect, border: u32, mon: usize, tags: u32) -> Self {
        Self {
            id,
            title: String::new(),
            r,
            old_r: r,
            border,
            old_border: border,
            hints: SizeHints::default(),
            is_fixed: false,
            is_floating: false,
            old_floating: false,
            is_urgent: false,
            never_focus: false,
            is_fullscreen: false,
            tags,
            mon,
        }
    }

    /// The X window ID of this client
    pub fn id(&self) -> Xid {
        self.id
    }

    /// The last known title of this client
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The current geometry of this client, excluding its border
    pub fn r(&self) -> Rect {
        self.r
    }

    /// The current border width of this client
    pub fn border(&self) -> u32 {
        self.border
    }

    /// The tags this client is assigned to
    pub fn tags(&self) -> u32 {
        self.tags
    }

    /// The index of the monitor this client belongs to
    pub fn mon(&self) -> usize {
        self.mon
    }

    /// Whether this client is excluded from layout
    pub fn is_floating(&self) -> bool {
        self.is_floating
    }

    /// Whether this client currently covers its whole monitor
    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    /// Whether this client has requested attention
    pub fn is_urgent(&self) -> bool {
        self.is_urgent
    }

    /// Whether this client has a fixed size
    pub fn is_fixed(&self) -> bool {
        self.is_fixed
    }

    /// Width including the border on both sides
    pub fn outer_width(&self) -> u32 {
        self.r.w + 2 * self.border
    }

    /// Height including the border on both sides
    pub fn outer_height(&self) -> u32 {
        self.r.h + 2 * self.border
    }

    /// Whether this client is shown on the given monitor's current view
    pub fn is_visible_on(&self, m: &Monitor) -> bool {
        self.tags & m.active_tags() != 0
    }

    /// Whether this client takes part in the layout of its monitor
    pub(crate) fn is_tiled(&self) -> bool {
        !self.is_floating && !self.is_fullscreen
    }

    pub(crate) fn set_size_hints(&mut self, hints: SizeHints) {
        self.is_fixed = hints.is_fixed();
        self.hints = hints;
    }

    /// Constrain a proposed geometry for this client. Size hints only apply if the client
    /// is floating or its monitor is not arranging clients.
    pub fn apply_constraints(
        &self,
        proposed: Rect,
        bounds: &Bounds,
        arranged: bool,
        interact: bool,
    ) -> (Rect, bool) {
        let respect_hints = self.is_floating || !arranged;

        apply_constraints(
            &self.hints,
            self.r,
            self.border,
            respect_hints,
            proposed,
            bounds,
            interact,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_hints() -> SizeHints {
        SizeHints {
            min_w: 300,
            min_h: 200,
            max_w: 300,
            max_h: 200,
            ..Default::default()
        }
    }

    fn bounds() -> Bounds {
        let r = Rect::new(0, 0, 1280, 800);

        Bounds {
            screen: r,
            usable: r,
            bar_height: 0,
        }
    }

    #[test]
    fn hints_only_apply_when_floating_or_unarranged() {
        let mut c = Client::new(Xid(1), Rect::new(0, 0, 300, 200), 0, 0, 1);
        c.set_size_hints(fixed_hints());
        let proposed = Rect::new(0, 0, 640, 800);

        assert!(c.is_fixed());
        assert_eq!(c.apply_constraints(proposed, &bounds(), true, false).0, proposed);
        assert_eq!(
            c.apply_constraints(proposed, &bounds(), false, false).0,
            Rect::new(0, 0, 300, 200)
        );

        c.is_floating = true;
        assert_eq!(
            c.apply_constraints(proposed, &bounds(), true, false).0,
            Rect::new(0, 0, 300, 200)
        );
    }

    #[test]
    fn outer_size_includes_the_border() {
        let c = Client::new(Xid(1), Rect::new(0, 0, 300, 200), 4, 0, 1);

        assert_eq!((c.outer_width(), c.outer_height()), (308, 208));
    }
}
