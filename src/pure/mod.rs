//! Side effect free geometry and size hint handling
pub mod geometry;
pub mod hints;

#[doc(inline)]
pub use geometry::{Point, Rect};
#[doc(inline)]
pub use hints::{apply_constraints, Bounds, SizeHints};
