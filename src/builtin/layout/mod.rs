//! Layout algorithms for arranging the tiled clients of a monitor.
//!
//! Every algorithm is a pure function from the usable area of a monitor, the master
//! fraction and the number of tiled clients to the outer rectangle (border included)
//! for each client, in client list order.
use crate::pure::geometry::Rect;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};


/// The available layouts
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(AsRefStr, EnumIter, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// A master area next to a stack on wide monitors, above it on tall ones
    Tile,
    /// A master area above a stack of full width rows
    BottomStack,
    /// Every client covers the whole usable area
    Monocle,
    /// No arrangement: clients keep their own geometry
    Floating,
}

impl LayoutKind {
    /// The short symbol used when displaying the layout
    pub fn symbol(&self) -> &'static str {
        match self {
            LayoutKind::Tile => "[]=",
            LayoutKind::BottomStack => "TTT",
            LayoutKind::Monocle => "[M]",
            LayoutKind::Floating => "><>",
        }
    }

    /// Whether this layout positions clients at all
    pub fn is_arranged(&self) -> bool {
        !matches!(self, LayoutKind::Floating)
    }

    /// Compute the outer rectangles for `n` tiled clients in the usable area `r`.
    ///
    /// [LayoutKind::Floating] positions nothing and so returns an empty Vec.
    /// ```
    /// # use tessera::{builtin::layout::LayoutKind, pure::geometry::Rect};
    /// let r = Rect::new(0, 0, 1280, 800);
    /// let rects = LayoutKind::Tile.arrange(r, 0.6, 3);
    ///
    /// assert_eq!(
    ///     rects,
    ///     vec![
    ///         Rect::new(0, 0, 768, 800),
    ///         Rect::new(768, 0, 512, 400),
    ///         Rect::new(768, 400, 512, 400),
    ///     ]
    /// );
    /// ```
    pub fn arrange(&self, r: Rect, mfact: f32, n: usize) -> Vec<Rect> {
        match (self, n) {
            (LayoutKind::Floating, _) | (_, 0) => vec![],
            (_, 1) => monocle(r, 1),
            (LayoutKind::Tile, _) if r.w > r.h => side_stack(r, mfact, n),
            (LayoutKind::Tile | LayoutKind::BottomStack, _) => bottom_stack(r, mfact, n),
            (LayoutKind::Monocle, _) => monocle(r, n),
        }
    }
}

fn monocle(r: Rect, n: usize) -> Vec<Rect> {
    vec![r; n]
}

// Master on the left, remaining clients split the right hand column. Each stack client
// takes an equal share of the space left over by the clients above it so that the
// final client absorbs any rounding.
fn side_stack(r: Rect, mfact: f32, n: usize) -> Vec<Rect> {
    let mw = (r.w as f32 * mfact) as u32;
    let mut rects = Vec::with_capacity(n);
    rects.push(Rect::new(r.x, r.y, mw, r.h));

    let mut ty = 0;
    for i in 1..n {
        let h = (r.h - ty) / (n - i) as u32;
        rects.push(Rect::new(r.x + mw as i32, r.y + ty as i32, r.w - mw, h));
        ty += h;
    }

    rects
}

// Master on top, remaining clients split the space below into full width rows.
fn bottom_stack(r: Rect, mfact: f32, n: usize) -> Vec<Rect> {
    let mh = (r.h as f32 * mfact) as u32;
    let mut rects = Vec::with_capacity(n);
    rects.push(Rect::new(r.x, r.y, r.w, mh));

    let sh = r.h - mh;
    let mut ty = 0;
    for i in 1..n {
        let h = (sh - ty) / (n - i) as u32;
        rects.push(Rect::new(r.x, r.y + (mh + ty) as i32, r.w, h));
        ty += h;
    }

    rects
}
