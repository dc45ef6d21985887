//! Geometry primitives
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An x,y coordinate pair
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Point {
    /// An absolute x coordinate relative to the root window
    pub x: i32,
    /// An absolute y coordinate relative to the root window
    pub y: i32,
}

impl Point {
    /// Create a new Point.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from(raw: (i32, i32)) -> Self {
        let (x, y) = raw;

        Self { x, y }
    }
}

// A Rect converts to its top left corner
impl From<Rect> for Point {
    fn from(r: Rect) -> Self {
        let Rect { x, y, .. } = r;

        Self { x, y }
    }
}

/// An X window / screen position: top left corner + extent
///
/// The origin is signed: hidden clients are parked to the left of the screen.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Rect {
    /// The x-coordinate of the top left corner of this rect
    pub x: i32,
    /// The y-coordinate of the top left corner of this rect
    pub y: i32,
    /// The width of this rect
    pub w: u32,
    /// The height of this rect
    pub h: u32,
}

impl Rect {
    /// Create a new Rect.
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Rect {
        Rect { x, y, w, h }
    }

    /// The x-coordinate one past the right hand edge of this rect.
    pub fn right(&self) -> i32 {
        self.x + self.w as i32
    }

    /// The y-coordinate one past the bottom edge of this rect.
    pub fn bottom(&self) -> i32 {
        self.y + self.h as i32
    }

    /// The midpoint of this rectangle.
    ///
    /// Odd side lengths will lead to a truncated point towards the top left corner
    /// in order to maintain integer coordinates.
    /// ```
    /// # use tessera::pure::geometry::{Rect, Point};
    /// let r = Rect::new(0, 0, 100, 200);
    ///
    /// assert_eq!(r.midpoint(), Point { x: 50, y: 100 });
    /// ```
    pub fn midpoint(&self) -> Point {
        Point {
            x: self.x + (self.w / 2) as i32,
            y: self.y + (self.h / 2) as i32,
        }
    }

    /// Shrink width and height by the given pixel border, maintaining the current x and y
    /// coordinates. The resulting `Rect` will always have a minimum width and height of 1.
    /// ```
    /// # use tessera::pure::geometry::Rect;
    /// let r = Rect::new(0, 0, 100, 200);
    ///
    /// assert_eq!(r.shrink_in(10), Rect::new(0, 0, 80, 180));
    /// assert_eq!(r.shrink_in(50), Rect::new(0, 0, 1, 100));
    /// assert_eq!(r.shrink_in(100), Rect::new(0, 0, 1, 1));
    /// ```
    pub fn shrink_in(&self, border: u32) -> Self {
        let w = if self.w <= 2 * border {
            1
        } else {
            self.w - 2 * border
        };
        let h = if self.h <= 2 * border {
            1
        } else {
            self.h - 2 * border
        };

        Self { w, h, ..*self }
    }

    /// Check whether this Rect contains `p`
    pub fn contains_point<P>(&self, p: P) -> bool
    where
        P: Into<Point>,
    {
        let p = p.into();

        (self.x..self.right()).contains(&p.x) && (self.y..self.bottom()).contains(&p.y)
    }

    /// The area of the overlap between this Rect and `other` (zero if they are disjoint).
    /// ```
    /// # use tessera::pure::geometry::Rect;
    /// let r = Rect::new(0, 0, 100, 100);
    ///
    /// assert_eq!(r.intersect_area(&Rect::new(50, 50, 100, 100)), 2500);
    /// assert_eq!(r.intersect_area(&Rect::new(100, 0, 100, 100)), 0);
    /// ```
    pub fn intersect_area(&self, other: &Rect) -> u64 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);

        if w <= 0 || h <= 0 {
            0
        } else {
            w as u64 * h as u64
        }
    }

    /// Center a `w` x `h` region horizontally and vertically inside of this Rect.
    ///
    /// Regions larger than this Rect overhang it equally on both sides.
    pub fn center(&self, w: u32, h: u32) -> Point {
        Point {
            x: self.x + (self.w / 2) as i32 - (w / 2) as i32,
            y: self.y + (self.h / 2) as i32 - (h / 2) as i32,
        }
    }

    /// Remove `h` pixels from the top of this Rect, keeping at least one row.
    /// ```
    /// # use tessera::pure::geometry::Rect;
    /// let r = Rect::new(0, 0, 1280, 800);
    ///
    /// assert_eq!(r.without_top(20), Rect::new(0, 20, 1280, 780));
    /// assert_eq!(r.without_top(0), r);
    /// ```
    pub fn without_top(&self, h: u32) -> Self {
        let h = h.min(self.h.saturating_sub(1));

        Self {
            y: self.y + h as i32,
            h: self.h - h,
            ..*self
        }
    }
}
