//! Data types for working with X window properties
use crate::{
    pure::{geometry::Rect, SizeHints},
    Error, Result, Xid,
};
use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Known property types that should be returnable by XConn impls when they check
/// window properties.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Clone)]
pub enum Prop {
    /// One or more X Atoms
    Atom(Vec<String>),
    /// Raw bytes for when the prop type is non-standard
    Bytes(Vec<u32>),
    /// Cardinal numbers
    Cardinal(Vec<u32>),
    /// UTF-8 encoded string data
    UTF8String(Vec<String>),
    /// X window IDs
    Window(Vec<Xid>),
    /// The WmHints properties for this window
    WmHints(WmHints),
    /// The WmNormalHints properties for this window
    WmNormalHints(WmNormalHints),
}

bitflags! {
    /// Possible flags that can be set in a WmHints client property
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WmHintsFlags: u32 {
        /// Input hint is set
        const INPUT_HINT         = 0b0000000001;
        /// State hint is set
        const STATE_HINT         = 0b0000000010;
        /// Icon pixmap hint is set
        const ICON_PIXMAP_HINT   = 0b0000000100;
        /// Icon window hint is set
        const ICON_WINDOW_HINT   = 0b0000001000;
        /// Icon position hint is set
        const ICON_POSITION_HINT = 0b0000010000;
        /// Icon mask hint is set
        const ICON_MASK_HINT     = 0b0000100000;
        /// Window group hint is set
        const WINDOW_GROUP_HINT  = 0b0001000000;
        // unused                  0b0010000000;
        /// Urgency hint is set
        const URGENCY_HINT       = 0b0100000000;
    }
}

bitflags! {
    /// Possible flags that can be set in a WmNormalHints client property
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WmNormalHintsFlags: u32 {
        /// User-specified x, y
        const U_POSITION    = 0b0000000001;
        /// User-specified width, height
        const U_SIZE        = 0b0000000010;
        /// Program-specified position
        const P_POSITION    = 0b0000000100;
        /// Program-specified size
        const P_SIZE        = 0b0000001000;
        /// Program-specified minimum size
        const P_MIN_SIZE    = 0b0000010000;
        /// Program-specified maximum size
        const P_MAX_SIZE    = 0b0000100000;
        /// Program-specified resize increments
        const P_RESIZE_INC  = 0b0001000000;
        /// Program-specified min and max aspect ratios
        const P_ASPECT      = 0b0010000000;
        /// Program-specified base size
        const P_BASE_SIZE   = 0b0100000000;
        /// Program-specified window gravity
        const P_WIN_GRAVITY = 0b1000000000;
    }
}

/// Possible valid values for the `WM_STATE` property on a client.
///
/// See the [ICCCM docs][1] for more information.
///
/// [1]: https://tronche.com/gui/x/icccm/sec-4.html#s-4.1.3.1
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum WmState {
    /// Window is not visible
    Withdrawn,
    /// Window is visible
    Normal,
    /// Window is iconified
    Iconic,
}

impl WmState {
    /// The value written to the `WM_STATE` property
    pub fn as_u32(&self) -> u32 {
        match self {
            WmState::Withdrawn => 0,
            WmState::Normal => 1,
            WmState::Iconic => 3,
        }
    }

    /// Parse a raw `WM_STATE` value
    pub fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(WmState::Withdrawn),
            1 => Some(WmState::Normal),
            3 => Some(WmState::Iconic),
            _ => None,
        }
    }
}

/// The mapping states a window can be in
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum MapState {
    /// The window is unmapped
    Unmapped,
    /// The window is never viewable
    UnViewable,
    /// The window is currently viewable
    Viewable,
}

/// Window attributes honoured by tessera.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct WindowAttributes {
    /// Whether the window has asked to bypass window management
    pub override_redirect: bool,
    /// The current mapping state of the window
    pub map_state: MapState,
    /// The window geometry, excluding the border
    pub r: Rect,
    /// The window border width
    pub border: u32,
}

/// Client requested hints about information other than window geometry.
///
/// See the ICCCM [spec][1] for further details.
///
/// [1]: https://www.x.org/releases/X11R7.6/doc/xorg-docs/specs/ICCCM/icccm.html#wm_hints_property
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct WmHints {
    pub(crate) flags: WmHintsFlags,
    pub(crate) input: u32,
    pub(crate) rest: [u32; 7],
}

impl WmHints {
    /// Try to construct a [WmHints] instance from raw bytes.
    ///
    /// This method expects a slice of up to 9 u32s corresponding to the C struct layout
    /// shown below. Older clients omit trailing fields: missing values are zero.
    ///
    /// ```C
    /// typedef struct {
    ///     long flags;          /* marks which fields in this structure are defined */
    ///     Bool input;          /* does this application rely on the window manager to
    ///                             get keyboard input? */
    ///     int initial_state;   /* see below */
    ///     Pixmap icon_pixmap;  /* pixmap to be used as icon */
    ///     Window icon_window;  /* window to be used as icon */
    ///     int icon_x, icon_y;  /* initial position of icon */
    ///     Pixmap icon_mask;    /* pixmap to be used as mask for icon_pixmap */
    ///     XID window_group;    /* id of related window group */
    ///     /* this structure may be extended in the future */
    /// } XWMHints;
    /// ```
    pub fn try_from_bytes(raw: &[u32]) -> Result<Self> {
        if raw.is_empty() || raw.len() > 9 {
            return Err(Error::InvalidHints {
                reason: format!(
                    "raw bytes should be [u32; 9] for WmHints, got [u32; {}]",
                    raw.len()
                ),
            });
        }

        let mut padded = [0; 9];
        padded[..raw.len()].copy_from_slice(raw);

        let mut rest = [0; 7];
        rest.copy_from_slice(&padded[2..]);

        Ok(Self {
            flags: WmHintsFlags::from_bits_retain(padded[0]),
            input: padded[1],
            rest,
        })
    }

    /// The raw property data for writing back to the X server
    pub fn to_bytes(&self) -> Vec<u32> {
        let mut raw = vec![self.flags.bits(), self.input];
        raw.extend_from_slice(&self.rest);

        raw
    }

    /// Whether or not the urgency flag is set
    pub fn is_urgent(&self) -> bool {
        self.flags.contains(WmHintsFlags::URGENCY_HINT)
    }

    /// Set or clear the urgency flag
    pub fn set_urgent(&mut self, urgent: bool) {
        self.flags.set(WmHintsFlags::URGENCY_HINT, urgent);
    }

    /// Whether the client has explicitly declined keyboard input.
    ///
    /// A client that does not set the input hint accepts focus.
    pub fn never_focus(&self) -> bool {
        self.flags.contains(WmHintsFlags::INPUT_HINT) && self.input == 0
    }
}

/// Client requested hints about window geometry.
///
/// See the ICCCM [spec][1] for further details or the [Xlib manual][2] for more details of the
/// data format. Gravity is not honoured.
///
/// [1]: https://www.x.org/releases/X11R7.6/doc/xorg-docs/specs/ICCCM/icccm.html#wm_normal_hints_property
/// [2]: https://tronche.com/gui/x/xlib/ICC/client-to-window-manager/wm-normal-hints.html
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
pub struct WmNormalHints {
    pub(crate) flags: WmNormalHintsFlags,
    pub(crate) min: (u32, u32),
    pub(crate) max: (u32, u32),
    pub(crate) inc: (u32, u32),
    pub(crate) min_aspect: (u32, u32),
    pub(crate) max_aspect: (u32, u32),
    pub(crate) base: (u32, u32),
}

impl WmNormalHints {
    /// Try to construct a [WmNormalHints] instance from raw bytes.
    ///
    /// This method expects a slice of at least 15 u32s corresponding to the C struct layout
    /// shown below. Pre-ICCCM clients omit the base size and gravity.
    ///
    /// ```C
    /// typedef struct {
    ///     long flags;                /* marks which fields in this structure are defined */
    ///     int x, y;                  /* Obsolete */
    ///     int width, height;         /* Obsolete */
    ///     int min_width, min_height;
    ///     int max_width, max_height;
    ///     int width_inc, height_inc;
    ///     struct {
    ///            int x;              /* numerator */
    ///            int y;              /* denominator */
    ///     } min_aspect, max_aspect;
    ///     int base_width, base_height;
    ///     int win_gravity;
    ///     /* this structure may be extended in the future */
    /// } XSizeHints;
    /// ```
    pub fn try_from_bytes(raw: &[u32]) -> Result<Self> {
        if raw.len() < 15 {
            return Err(Error::InvalidHints {
                reason: format!(
                    "raw bytes should be [u32; 18] for WmNormalHints, got [u32; {}]",
                    raw.len()
                ),
            });
        }

        let pair = |i: usize| (raw[i], raw[i + 1]);
        let base = if raw.len() >= 17 { pair(15) } else { (0, 0) };

        Ok(Self {
            flags: WmNormalHintsFlags::from_bits_retain(raw[0]),
            min: pair(5),
            max: pair(7),
            inc: pair(9),
            min_aspect: pair(11),
            max_aspect: pair(13),
            base,
        })
    }

    /// Build hints from their component parts, setting the flags for each field given.
    pub fn new(
        min: Option<(u32, u32)>,
        max: Option<(u32, u32)>,
        inc: Option<(u32, u32)>,
        base: Option<(u32, u32)>,
    ) -> Self {
        let mut flags = WmNormalHintsFlags::empty();
        flags.set(WmNormalHintsFlags::P_MIN_SIZE, min.is_some());
        flags.set(WmNormalHintsFlags::P_MAX_SIZE, max.is_some());
        flags.set(WmNormalHintsFlags::P_RESIZE_INC, inc.is_some());
        flags.set(WmNormalHintsFlags::P_BASE_SIZE, base.is_some());

        Self {
            flags,
            min: min.unwrap_or_default(),
            max: max.unwrap_or_default(),
            inc: inc.unwrap_or_default(),
            base: base.unwrap_or_default(),
            ..Default::default()
        }
    }

    /// The raw property data for writing back to the X server. Obsolete fields and
    /// gravity are written as zero.
    pub fn to_bytes(&self) -> Vec<u32> {
        let mut raw = vec![0; 18];
        raw[0] = self.flags.bits();
        for (i, (a, b)) in [
            (5, self.min),
            (7, self.max),
            (9, self.inc),
            (11, self.min_aspect),
            (13, self.max_aspect),
            (15, self.base),
        ] {
            raw[i] = a;
            raw[i + 1] = b;
        }

        raw
    }
}

impl From<&WmNormalHints> for SizeHints {
    fn from(h: &WmNormalHints) -> Self {
        use WmNormalHintsFlags as F;

        let has = |f| h.flags.contains(f);
        let mut s = SizeHints::default();

        if has(F::P_BASE_SIZE) {
            (s.base_w, s.base_h) = h.base;
        } else if has(F::P_MIN_SIZE) {
            (s.base_w, s.base_h) = h.min;
        }

        if has(F::P_RESIZE_INC) {
            (s.inc_w, s.inc_h) = h.inc;
        }

        if has(F::P_MAX_SIZE) {
            (s.max_w, s.max_h) = h.max;
        }

        if has(F::P_MIN_SIZE) {
            (s.min_w, s.min_h) = h.min;
        } else if has(F::P_BASE_SIZE) {
            (s.min_w, s.min_h) = h.base;
        }

        if has(F::P_ASPECT) && h.min_aspect.0 > 0 && h.max_aspect.1 > 0 {
            s.min_aspect = h.min_aspect.1 as f32 / h.min_aspect.0 as f32;
            s.max_aspect = h.max_aspect.0 as f32 / h.max_aspect.1 as f32;
        }

        s
    }
}
