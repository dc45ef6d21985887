//! Constraining client geometry to ICCCM size hints and the visible screen area.
use crate::pure::geometry::Rect;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The size bounds a client has requested through WM_NORMAL_HINTS.
///
/// A value of zero means "not set" for every field.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SizeHints {
    /// Base width
    pub base_w: u32,
    /// Base height
    pub base_h: u32,
    /// Width resize increment
    pub inc_w: u32,
    /// Height resize increment
    pub inc_h: u32,
    /// Maximum width
    pub max_w: u32,
    /// Maximum height
    pub max_h: u32,
    /// Minimum width
    pub min_w: u32,
    /// Minimum height
    pub min_h: u32,
    /// Minimum aspect ratio expressed as h / w
    pub min_aspect: f32,
    /// Maximum aspect ratio expressed as w / h
    pub max_aspect: f32,
}

impl SizeHints {
    /// A client with a maximum size equal to its minimum size can not be resized.
    /// ```
    /// # use tessera::pure::SizeHints;
    /// let fixed = SizeHints { min_w: 300, min_h: 200, max_w: 300, max_h: 200, ..Default::default() };
    /// let sized = SizeHints { min_w: 300, min_h: 200, ..Default::default() };
    ///
    /// assert!(fixed.is_fixed());
    /// assert!(!sized.is_fixed());
    /// ```
    pub fn is_fixed(&self) -> bool {
        self.max_w > 0 && self.max_h > 0 && self.max_w == self.min_w && self.max_h == self.min_h
    }
}

/// The regions a client's geometry is clamped against.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// The full X screen
    pub screen: Rect,
    /// The usable area of the client's monitor
    pub usable: Rect,
    /// The height reserved for a bar: no client may be smaller than this
    pub bar_height: u32,
}

/// Constrain a proposed geometry for a client.
///
/// `current` is the client's recorded geometry and `border` its border width. Size hints
/// are only honoured when `respect_hints` is set (floating clients or monitors without
/// an active layout). Interactive moves are clamped against the whole screen, everything
/// else against the usable area of the monitor, so that some part of the client always
/// remains on screen.
///
/// The returned flag is `true` if the resulting geometry differs from `current`.
pub fn apply_constraints(
    hints: &SizeHints,
    current: Rect,
    border: u32,
    respect_hints: bool,
    proposed: Rect,
    bounds: &Bounds,
    interact: bool,
) -> (Rect, bool) {
    let mut w = (proposed.w as i32).max(1);
    let mut h = (proposed.h as i32).max(1);

    let bh = bounds.bar_height as i32;
    h = h.max(bh);
    w = w.max(bh);

    if respect_hints {
        (w, h) = constrain_to_hints(hints, w, h);
    }
    let (w, h) = (w.max(1), h.max(1));

    let (mut x, mut y) = (proposed.x, proposed.y);
    let bw2 = 2 * border as i32;
    let outer_w = current.w as i32 + bw2;
    let outer_h = current.h as i32 + bw2;

    if interact {
        let s = bounds.screen;
        if x > s.right() {
            x = s.right() - outer_w;
        }
        if y > s.bottom() {
            y = s.bottom() - outer_h;
        }
        if x + w + bw2 < s.x {
            x = s.x;
        }
        if y + h + bw2 < s.y {
            y = s.y;
        }
    } else {
        let m = bounds.usable;
        if x >= m.right() {
            x = m.right() - outer_w;
        }
        if y >= m.bottom() {
            y = m.bottom() - outer_h;
        }
        if x + w + bw2 <= m.x {
            x = m.x;
        }
        if y + h + bw2 <= m.y {
            y = m.y;
        }
    }

    let r = Rect::new(x, y, w as u32, h as u32);

    (r, r != current)
}

// ICCCM 4.1.2.3
fn constrain_to_hints(hints: &SizeHints, mut w: i32, mut h: i32) -> (i32, i32) {
    let (base_w, base_h) = (hints.base_w as i32, hints.base_h as i32);
    let base_is_min = hints.base_w == hints.min_w && hints.base_h == hints.min_h;

    // base is removed before applying aspect ratio bounds unless it doubles as the minimum
    if !base_is_min {
        w -= base_w;
        h -= base_h;
    }

    if hints.min_aspect > 0.0 && hints.max_aspect > 0.0 && w > 0 && h > 0 {
        if hints.max_aspect < w as f32 / h as f32 {
            w = (h as f32 * hints.max_aspect + 0.5) as i32;
        } else if hints.min_aspect < h as f32 / w as f32 {
            h = (w as f32 * hints.min_aspect + 0.5) as i32;
        }
    }

    if base_is_min {
        w -= base_w;
        h -= base_h;
    }

    if hints.inc_w > 0 {
        w -= w % hints.inc_w as i32;
    }
    if hints.inc_h > 0 {
        h -= h % hints.inc_h as i32;
    }

    w = (w + base_w).max(hints.min_w as i32);
    h = (h + base_h).max(hints.min_h as i32);

    if hints.max_w > 0 {
        w = w.min(hints.max_w as i32);
    }
    if hints.max_h > 0 {
        h = h.min(hints.max_h as i32);
    }

    (w, h)
}
