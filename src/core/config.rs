//! User facing configuration of the window manager
use crate::{
    builtin::layout::LayoutKind,
    core::{
        bindings::{KeyBinding, Keysym, ModifierKey::*},
        command::{tag, Command},
    },
    Error, Result,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// A simple RGB based color
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(u32);

impl Color {
    /// Create a new Color from a packed 0xRRGGBB value
    pub const fn new_from_hex(rgb: u32) -> Self {
        Self(rgb & 0xffffff)
    }

    /// The packed 0xRRGGBB value of this color
    pub fn rgb_u32(&self) -> u32 {
        self.0
    }
}

impl TryFrom<&str> for Color {
    type Error = Error;

    /// Parse `#rrggbb`. The leading `#` is optional.
    fn try_from(s: &str) -> Result<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        let err = || Error::InvalidHexColor { hex: s.to_owned() };

        if hex.len() != 6 {
            return Err(err());
        }

        u32::from_str_radix(hex, 16)
            .map(Self::new_from_hex)
            .map_err(|_| err())
    }
}

/// Placement rules for new clients, matched against WM_CLASS and the window title.
///
/// Each field that is set must be a substring of the corresponding client value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Substring of the WM_CLASS class
    pub class: Option<String>,
    /// Substring of the WM_CLASS instance
    pub instance: Option<String>,
    /// Substring of the title
    pub title: Option<String>,
    /// Tags to add to the client
    pub tags: u32,
    /// Whether the client should float
    pub floating: bool,
    /// Index of the monitor to place the client on
    pub monitor: Option<usize>,
}

impl Rule {
    /// Check this rule against a client's class, instance and title
    pub fn matches(&self, class: &str, instance: &str, title: &str) -> bool {
        let m = |pat: &Option<String>, s: &str| pat.as_ref().map_or(true, |p| s.contains(p));

        m(&self.title, title) && m(&self.class, class) && m(&self.instance, instance)
    }
}

/// The user specified config options for how the window manager should run
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The names of the tags, one bit of a client's tag mask each
    pub tags: Vec<String>,
    /// The layouts available to each monitor: the first is the default
    pub layouts: Vec<LayoutKind>,
    /// The initial fraction of the screen given to the master area
    pub mfact: f32,
    /// The width of window borders in pixels
    pub border_px: u32,
    /// Space reserved at the top of each monitor for an external bar
    pub bar_height: u32,
    /// The border color of unfocused clients
    pub normal_border: Color,
    /// The border color of the focused client
    pub selected_border: Color,
    /// Placement rules for new clients
    pub rules: Vec<Rule>,
    /// Key bindings that are grabbed on the root window
    pub key_bindings: Vec<KeyBinding>,
    /// Where the command pipe is created
    pub command_pipe: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tags: (1..=4).map(|n| n.to_string()).collect(),
            layouts: vec![LayoutKind::Tile, LayoutKind::Monocle],
            mfact: 0.6,
            border_px: 4,
            bar_height: 0,
            normal_border: Color::new_from_hex(0x444444),
            selected_border: Color::new_from_hex(0x005577),
            rules: vec![],
            key_bindings: default_key_bindings(),
            command_pipe: PathBuf::from("/tmp/tessera.fifo"),
        }
    }
}

fn default_key_bindings() -> Vec<KeyBinding> {
    use Command::*;

    let mut bindings = vec![
        KeyBinding::new(&[Meta], Keysym::e, FocusStack(1)),
        KeyBinding::new(&[Meta], Keysym::o, FocusStack(-1)),
        KeyBinding::new(&[Meta, Ctrl], Keysym::e, CycleLayout(1)),
        KeyBinding::new(&[Meta, Ctrl], Keysym::o, CycleLayout(-1)),
        KeyBinding::new(&[Meta], Keysym::i, SetMfact(-0.1)),
        KeyBinding::new(&[Meta], Keysym::a, SetMfact(0.1)),
        KeyBinding::new(&[Meta], Keysym::Return, Zoom),
        KeyBinding::new(&[Meta], Keysym::Tab, View(0)),
        KeyBinding::new(&[Meta, Shift], Keysym::q, KillClient),
        KeyBinding::new(&[Meta, Shift], Keysym::f, ToggleFloating),
        KeyBinding::new(&[Meta], Keysym::comma, FocusMon(-1)),
        KeyBinding::new(&[Meta], Keysym::period, FocusMon(1)),
        KeyBinding::new(&[Meta, Shift], Keysym::comma, TagMon(-1)),
        KeyBinding::new(&[Meta, Shift], Keysym::period, TagMon(1)),
        KeyBinding::new(&[Meta, Ctrl, Shift], Keysym::q, Quit),
    ];

    let tag_keys = [Keysym::w, Keysym::u, Keysym::v, Keysym::semicolon];
    for (i, keysym) in tag_keys.into_iter().enumerate() {
        let t = tag(i as u32);
        bindings.extend([
            KeyBinding::new(&[Meta], keysym, View(t)),
            KeyBinding::new(&[Meta, Ctrl], keysym, ToggleView(t)),
            KeyBinding::new(&[Meta, Shift], keysym, Tag(t)),
            KeyBinding::new(&[Meta, Ctrl, Shift], keysym, ToggleTag(t)),
        ]);
    }

    bindings
}

impl Config {
    /// Check that this config can be used to run the window manager.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(Error::InvalidConfig {
                reason: reason.to_owned(),
            })
        };

        if self.tags.is_empty() {
            return invalid("at least one tag is required");
        }
        if self.tags.len() > 31 {
            return invalid("at most 31 tags are supported");
        }
        if self.layouts.is_empty() {
            return invalid("at least one layout is required");
        }
        if !(0.1..=0.9).contains(&self.mfact) {
            return invalid("mfact must be in the range 0.1..=0.9");
        }

        Ok(())
    }

    /// The mask covering every configured tag
    pub fn tag_mask(&self) -> u32 {
        (1 << self.tags.len()) - 1
    }

    /// Override values from an X resource database.
    ///
    /// `get` is called with the resource name (`tessera.borderpx` etc) and returns the
    /// stored string value if there is one. Unparseable values are logged and skipped.
    pub fn apply_resources<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(px) = lookup(&get, "tessera.borderpx", |s| s.parse().ok()) {
            self.border_px = px;
        }

        let workspaces = |s: &str| s.parse::<usize>().ok().filter(|n| (1..=31).contains(n));
        if let Some(n) = lookup(&get, "tessera.workspaces", workspaces) {
            self.tags = (1..=n).map(|i| i.to_string()).collect();
        }

        if let Some(bh) = lookup(&get, "tessera.bh", |s| s.parse().ok()) {
            self.bar_height = bh;
        }

        if let Some(c) = lookup(&get, "tessera.col_sel", |s| Color::try_from(s).ok()) {
            self.selected_border = c;
        }

        if let Some(c) = lookup(&get, "tessera.col_norm", |s| Color::try_from(s).ok()) {
            self.normal_border = c;
        }

        let mfact = |s: &str| s.parse::<f32>().ok().filter(|f| (0.1..=0.9).contains(f));
        if let Some(f) = lookup(&get, "tessera.mfact", mfact) {
            self.mfact = f;
        }
    }
}

fn lookup<F, T, P>(get: &F, name: &str, parse: P) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    let raw = get(name)?;
    let val = parse(raw.trim());
    if val.is_none() {
        warn!(resource = name, %raw, "ignoring invalid X resource");
    }

    val
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;
    use std::collections::HashMap;

    #[test_case("#005577", Some(0x005577); "with hash")]
    #[test_case("ffffff", Some(0xffffff); "without hash")]
    #[test_case("#fff", None; "short form")]
    #[test_case("#gg0000", None; "not hex")]
    #[test]
    fn color_parsing(s: &str, expected: Option<u32>) {
        assert_eq!(Color::try_from(s).ok().map(|c| c.rgb_u32()), expected);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test_case(Config { tags: vec![], ..Default::default() }; "no tags")]
    #[test_case(Config { tags: vec!["x".to_owned(); 32], ..Default::default() }; "too many tags")]
    #[test_case(Config { layouts: vec![], ..Default::default() }; "no layouts")]
    #[test_case(Config { mfact: 0.95, ..Default::default() }; "mfact too large")]
    #[test]
    fn invalid_configs_are_rejected(c: Config) {
        assert!(c.validate().is_err());
    }

    #[test]
    fn tag_mask_covers_all_tags() {
        assert_eq!(Config::default().tag_mask(), 0b1111);
    }

    #[test]
    fn resources_override_defaults() {
        let db: HashMap<&str, &str> = [
            ("tessera.borderpx", "2"),
            ("tessera.workspaces", "6"),
            ("tessera.bh", "18"),
            ("tessera.col_sel", "#ff0000"),
            ("tessera.col_norm", "nonsense"),
            ("tessera.mfact", "0.5"),
        ]
        .into_iter()
        .collect();

        let mut c = Config::default();
        c.apply_resources(|k| db.get(k).map(|s| s.to_string()));

        assert_eq!(c.border_px, 2);
        assert_eq!(c.tags.len(), 6);
        assert_eq!(c.bar_height, 18);
        assert_eq!(c.selected_border, Color::new_from_hex(0xff0000));
        assert_eq!(c.normal_border, Color::new_from_hex(0x444444));
        assert_eq!(c.mfact, 0.5);
    }

    #[test]
    fn rules_match_on_substrings() {
        let r = Rule {
            class: Some("Fire".to_owned()),
            title: Some("Private".to_owned()),
            ..Default::default()
        };

        assert!(r.matches("Firefox", "Navigator", "Private Browsing"));
        assert!(!r.matches("Firefox", "Navigator", "Home"));
        assert!(!r.matches("Chromium", "Navigator", "Private Browsing"));
    }
}
