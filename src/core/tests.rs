//! End to end tests of the window manager state machine against a recording XConn
use super::*;
use crate::{
    core::{
        bindings::{mask, KeyCode, Keysym},
        command::tag,
        config::Rule,
    },
    pure::geometry::Point,
    x::{
        event::{ConfigureEvent, ConfigureRequest, PointerChange, PropertyEvent, UnmapEvent},
        mock::{Call, MockXConn, CHECK_WINDOW, ROOT},
        property::{WmHints, WmHintsFlags, WmNormalHints},
        ClientConfig, ClientMessage, WmState, XConnExt,
    },
    Error,
};
use pretty_assertions::assert_eq;
use quickcheck_macros::quickcheck;

const SCREEN: Rect = Rect::new(0, 0, 1280, 800);
const WIDE: Rect = Rect::new(0, 0, 2560, 800);
const LEFT: Rect = Rect::new(0, 0, 1280, 800);
const RIGHT: Rect = Rect::new(1280, 0, 1280, 800);

type Wm = WindowManager<MockXConn>;

fn wm_with(config: Config, screen: Rect, outputs: Option<Vec<Rect>>) -> Wm {
    let x = MockXConn::new(screen, outputs);
    let mut wm = WindowManager::new(config, x).expect("valid config");
    wm.init().expect("init");
    wm.x.take_calls();

    wm
}

fn wm() -> Wm {
    wm_with(Config::default(), SCREEN, None)
}

fn dual_head() -> Wm {
    wm_with(Config::default(), WIDE, Some(vec![LEFT, RIGHT]))
}

fn map_window(wm: &mut Wm, id: u32) -> Xid {
    let id = Xid(id);
    wm.x.add_window(id, Rect::new(0, 0, 100, 100));
    wm.handle_xevent(XEvent::MapRequest(id)).expect("map request");

    id
}

fn r(wm: &Wm, id: Xid) -> Rect {
    wm.state.client(id).expect("managed client").r()
}

fn assert_invariants(s: &State) {
    let mask = s.config.tag_mask();
    assert!(s.selmon < s.monitors.len());

    for (i, m) in s.monitors.iter().enumerate() {
        let mut clients = m.clients.clone();
        let mut stack = m.stack.clone();
        clients.sort();
        stack.sort();
        assert_eq!(clients, stack, "client list and stack differ on monitor {i}");
        assert_ne!(m.active_tags(), 0);

        for id in m.clients.iter() {
            let c = s.client(*id).expect("known client");
            assert_eq!(c.mon(), i);
            assert_ne!(c.tags(), 0);
            assert_eq!(c.tags() & !mask, 0);
        }

        if let Some(sel) = m.sel {
            assert!(m.stack.contains(&sel));
            assert!(s.is_visible(sel));
        }
    }

    let n: usize = s.monitors.iter().map(|m| m.clients.len()).sum();
    assert_eq!(n, s.clients.len());
}

fn positions_sent(calls: &[Call]) -> Vec<(Xid, Rect)> {
    calls
        .iter()
        .flat_map(|c| match c {
            Call::SetConfig(id, data) => data
                .iter()
                .filter_map(|d| match d {
                    ClientConfig::Position(r) => Some((*id, *r)),
                    _ => None,
                })
                .collect(),
            _ => vec![],
        })
        .collect()
}

#[test]
fn init_advertises_ewmh_support_and_grabs_keys() {
    let x = MockXConn::new(SCREEN, None);
    let mut wm = WindowManager::new(Config::default(), x).expect("valid config");
    wm.init().expect("init");

    let calls = wm.x.take_calls();
    let keys = wm.key_bindings.keys();

    assert!(calls.contains(&Call::CreateCheckWindow(CHECK_WINDOW)));
    assert!(calls.contains(&Call::GrabKeys(keys)));
    assert!(calls.contains(&Call::DeleteProp(ROOT, "_NET_CLIENT_LIST".into())));
    assert_eq!(
        wm.x.prop(ROOT, "_NET_SUPPORTING_WM_CHECK"),
        Some(Prop::Window(vec![CHECK_WINDOW]))
    );
    assert_eq!(
        wm.x.prop(CHECK_WINDOW, "_NET_WM_NAME"),
        Some(Prop::UTF8String(vec!["tessera".into()]))
    );
    assert!(matches!(wm.x.prop(ROOT, "_NET_SUPPORTED"), Some(Prop::Atom(atoms)) if atoms.contains(&"_NET_WM_STATE_FULLSCREEN".to_string())));
}

#[test]
fn init_adopts_existing_windows() {
    let x = MockXConn::new(SCREEN, None);
    x.add_window(Xid(10), Rect::new(0, 0, 100, 100));
    x.add_window(Xid(11), Rect::new(0, 0, 100, 100));
    x.put_prop(Xid(11), "WM_TRANSIENT_FOR", Prop::Window(vec![Xid(10)]));

    let mut wm = WindowManager::new(Config::default(), x).expect("valid config");
    wm.init().expect("init");

    let s = wm.state();
    assert_eq!(s.monitors[0].clients, vec![Xid(11), Xid(10)]);
    assert!(s.client(Xid(11)).expect("managed").is_floating());
    assert_invariants(s);
}

#[test]
fn a_single_client_fills_the_monitor_inside_its_border() {
    let mut wm = wm();
    let id = map_window(&mut wm, 10);

    assert_eq!(r(&wm, id), Rect::new(0, 0, 1272, 792));
    assert_eq!(wm.state.focused_client(), Some(id));
    assert_eq!(wm.x.focused(), Some(id));
    assert_eq!(
        wm.x.prop(ROOT, "_NET_CLIENT_LIST"),
        Some(Prop::Window(vec![id]))
    );
}

#[test]
fn three_clients_tile_with_the_newest_as_master() {
    let mut wm = wm();
    for id in 10..13 {
        map_window(&mut wm, id);
    }

    assert_eq!(wm.state.monitors[0].clients, vec![Xid(12), Xid(11), Xid(10)]);
    assert_eq!(r(&wm, Xid(12)), Rect::new(0, 0, 760, 792));
    assert_eq!(r(&wm, Xid(11)), Rect::new(768, 0, 504, 392));
    assert_eq!(r(&wm, Xid(10)), Rect::new(768, 400, 504, 392));
    assert_eq!(wm.state.focused_client(), Some(Xid(12)));
    assert_invariants(&wm.state);
}

#[test]
fn focus_stack_wraps_in_both_directions() {
    let mut wm = wm();
    for id in 10..13 {
        map_window(&mut wm, id);
    }

    let mut seen = vec![];
    for _ in 0..3 {
        wm.handle_command(Command::FocusStack(1));
        seen.push(wm.state.focused_client());
    }

    assert_eq!(seen, vec![Some(Xid(11)), Some(Xid(10)), Some(Xid(12))]);

    wm.handle_command(Command::FocusStack(-1));
    assert_eq!(wm.state.focused_client(), Some(Xid(10)));
    assert_eq!(wm.x.focused(), Some(Xid(10)));
    assert_invariants(&wm.state);
}

#[test]
fn fixed_size_clients_float_at_their_hinted_size() {
    let mut wm = wm();
    let tiled = map_window(&mut wm, 10);

    let fixed = Xid(11);
    let hints = WmNormalHints::new(Some((300, 200)), Some((300, 200)), None, None);
    wm.x.put_prop(fixed, "WM_NORMAL_HINTS", Prop::WmNormalHints(hints));
    map_window(&mut wm, 11);

    let c = wm.state.client(fixed).expect("managed");
    assert!(c.is_fixed());
    assert!(c.is_floating());
    assert_eq!(c.r(), Rect::new(0, 0, 300, 200));
    assert_eq!(r(&wm, tiled), Rect::new(0, 0, 1272, 792));
}

#[test]
fn hidden_clients_are_moved_offscreen_and_nothing_is_tiled() {
    let mut wm = wm();
    let id = map_window(&mut wm, 10);
    wm.x.take_calls();

    wm.handle_command(Command::View(tag(1)));
    let calls = wm.x.take_calls();

    assert!(calls.contains(&Call::SetConfig(
        id,
        vec![ClientConfig::Move(Point::new(-2560, 0))]
    )));
    assert_eq!(positions_sent(&calls), vec![]);
    assert_eq!(wm.state.focused_client(), None);
    assert_eq!(wm.x.focused(), Some(ROOT));
}

#[test]
fn view_and_tag_commands() {
    let mut wm = wm();
    let a = map_window(&mut wm, 10);
    let b = map_window(&mut wm, 11);

    // move the focused client to the second tag
    wm.handle_command(Command::Tag(tag(1)));
    assert_eq!(wm.state.client(b).expect("managed").tags(), tag(1));
    assert_eq!(wm.state.focused_client(), Some(a));
    assert_eq!(r(&wm, a), Rect::new(0, 0, 1272, 792));
    assert_invariants(&wm.state);

    wm.handle_command(Command::View(tag(1)));
    assert_eq!(wm.state.monitors[0].active_tags(), tag(1));
    assert_eq!(wm.state.focused_client(), Some(b));

    // view(0) swaps back to the previous view
    wm.handle_command(Command::View(0));
    assert_eq!(wm.state.monitors[0].active_tags(), tag(0));
    assert_eq!(wm.state.focused_client(), Some(a));

    wm.handle_command(Command::ToggleView(tag(1)));
    assert_eq!(wm.state.monitors[0].active_tags(), tag(0) | tag(1));
    assert_eq!(wm.state.tiled_clients(0).len(), 2);

    // the view can not be emptied
    wm.handle_command(Command::ToggleView(tag(0) | tag(1)));
    assert_eq!(wm.state.monitors[0].active_tags(), tag(0) | tag(1));

    // and neither can the tags of a client
    let sel = wm.state.focused_client().expect("focused client");
    let before = wm.state.client(sel).expect("managed").tags();
    wm.handle_command(Command::ToggleTag(before));
    assert_eq!(wm.state.client(sel).expect("managed").tags(), before);

    wm.handle_command(Command::ToggleTag(tag(3)));
    assert_eq!(
        wm.state.client(sel).expect("managed").tags(),
        before | tag(3)
    );
    assert_invariants(&wm.state);
}

#[test]
fn tags_outside_of_the_configured_set_are_ignored() {
    let mut wm = wm();
    let id = map_window(&mut wm, 10);

    wm.handle_command(Command::Tag(tag(10)));

    assert_eq!(wm.state.client(id).expect("managed").tags(), tag(0));
}

#[quickcheck]
fn mfact_is_kept_in_bounds(deltas: Vec<i8>) -> bool {
    let mut wm = wm();
    map_window(&mut wm, 10);

    for d in deltas {
        wm.handle_command(Command::SetMfact(d as f32 / 20.0));
    }

    (0.1..=0.9).contains(&wm.state.monitors[0].mfact)
}

#[test]
fn set_mfact_resizes_the_master_area() {
    let mut wm = wm();
    map_window(&mut wm, 10);
    let master = map_window(&mut wm, 11);

    wm.handle_command(Command::SetMfact(-0.1));

    assert_eq!(r(&wm, master), Rect::new(0, 0, 632, 792));
}

#[test]
fn cycling_layouts_wraps_around() {
    let mut wm = wm();
    let a = map_window(&mut wm, 10);
    let b = map_window(&mut wm, 11);

    wm.handle_command(Command::CycleLayout(1));
    assert_eq!(wm.state.monitors[0].layout, LayoutKind::Monocle);
    assert_eq!(r(&wm, a), Rect::new(0, 0, 1272, 792));
    assert_eq!(r(&wm, b), Rect::new(0, 0, 1272, 792));

    wm.handle_command(Command::CycleLayout(1));
    assert_eq!(wm.state.monitors[0].layout, LayoutKind::Tile);

    wm.handle_command(Command::CycleLayout(-1));
    assert_eq!(wm.state.monitors[0].layout, LayoutKind::Monocle);
}

#[test]
fn cycling_from_an_unlisted_layout_reenters_at_either_end() {
    let mut wm = wm();
    map_window(&mut wm, 10);

    wm.handle_command(Command::SetLayout(LayoutKind::BottomStack));
    wm.handle_command(Command::CycleLayout(-1));
    assert_eq!(wm.state.monitors[0].layout, LayoutKind::Monocle);

    wm.handle_command(Command::SetLayout(LayoutKind::BottomStack));
    wm.handle_command(Command::CycleLayout(1));
    assert_eq!(wm.state.monitors[0].layout, LayoutKind::Tile);
}

#[test]
fn floating_layout_leaves_clients_where_they_are() {
    let mut wm = wm();
    let a = map_window(&mut wm, 10);
    map_window(&mut wm, 11);
    let before = r(&wm, a);
    wm.x.take_calls();

    wm.handle_command(Command::SetLayout(LayoutKind::Floating));

    assert_eq!(r(&wm, a), before);
    assert_eq!(positions_sent(&wm.x.take_calls()), vec![]);
}

#[test]
fn zoom_promotes_the_focused_client_or_the_next_in_line() {
    let mut wm = wm();
    for id in 10..13 {
        map_window(&mut wm, id);
    }

    // the master is focused so the next client is promoted
    wm.handle_command(Command::Zoom);
    assert_eq!(wm.state.monitors[0].clients, vec![Xid(11), Xid(12), Xid(10)]);
    assert_eq!(wm.state.focused_client(), Some(Xid(11)));

    wm.handle_command(Command::FocusStack(-1));
    wm.handle_command(Command::Zoom);
    assert_eq!(wm.state.monitors[0].clients, vec![Xid(10), Xid(11), Xid(12)]);
    assert_eq!(r(&wm, Xid(10)), Rect::new(0, 0, 760, 792));
}

#[test]
fn toggling_floating_removes_a_client_from_the_layout() {
    let mut wm = wm();
    let a = map_window(&mut wm, 10);
    let b = map_window(&mut wm, 11);

    wm.handle_command(Command::ToggleFloating);

    assert!(wm.state.client(b).expect("managed").is_floating());
    assert_eq!(r(&wm, a), Rect::new(0, 0, 1272, 792));

    wm.handle_command(Command::ToggleFloating);

    assert!(!wm.state.client(b).expect("managed").is_floating());
    assert_eq!(r(&wm, b), Rect::new(0, 0, 760, 792));
}

#[test]
fn unmanage_is_idempotent() {
    let mut wm = wm();
    let a = map_window(&mut wm, 10);
    let b = map_window(&mut wm, 11);

    wm.x.remove_window(b);
    wm.handle_xevent(XEvent::Destroy(b)).expect("destroy");
    wm.x.take_calls();
    wm.handle_xevent(XEvent::Destroy(b)).expect("destroy");

    assert_eq!(wm.x.take_calls(), vec![]);
    assert_eq!(wm.state.monitors[0].clients, vec![a]);
    assert_eq!(wm.state.focused_client(), Some(a));
    assert_invariants(&wm.state);
}

#[test]
fn destroying_the_focused_client_focuses_the_previously_focused_one() {
    let mut wm = wm();
    for id in 10..13 {
        map_window(&mut wm, id);
    }
    wm.handle_command(Command::FocusStack(1));
    assert_eq!(wm.state.focused_client(), Some(Xid(11)));

    wm.handle_xevent(XEvent::Destroy(Xid(11))).expect("destroy");

    assert_eq!(wm.state.focused_client(), Some(Xid(12)));
    assert_eq!(wm.x.focused(), Some(Xid(12)));
    assert_eq!(
        wm.x.prop(ROOT, "_NET_CLIENT_LIST"),
        Some(Prop::Window(vec![Xid(12), Xid(10)]))
    );
}

#[test]
fn unmapped_clients_are_withdrawn_with_their_border_restored() {
    let mut wm = wm();
    let id = map_window(&mut wm, 10);
    wm.x.take_calls();

    let evt = UnmapEvent {
        id,
        synthetic: false,
    };
    wm.handle_xevent(XEvent::UnmapNotify(evt)).expect("unmap");

    let calls = wm.x.take_calls();
    assert!(calls.contains(&Call::SetConfig(id, vec![ClientConfig::BorderPx(0)])));
    assert!(calls.contains(&Call::SetWmState(id, WmState::Withdrawn)));
    assert!(wm.state.client(id).is_none());
}

#[test]
fn synthetic_unmaps_only_set_the_wm_state() {
    let mut wm = wm();
    let id = map_window(&mut wm, 10);
    wm.x.take_calls();

    let evt = UnmapEvent {
        id,
        synthetic: true,
    };
    wm.handle_xevent(XEvent::UnmapNotify(evt)).expect("unmap");

    assert_eq!(
        wm.x.take_calls(),
        vec![Call::SetWmState(id, WmState::Withdrawn)]
    );
    assert!(wm.state.client(id).is_some());
}

#[test]
fn fullscreen_requests_cover_the_monitor_and_restore_afterwards() {
    let mut wm = wm();
    let id = map_window(&mut wm, 10);
    let fullscreen = *wm.x.intern_atom("_NET_WM_STATE_FULLSCREEN").expect("atom");

    let msg = ClientMessage::new(id, "_NET_WM_STATE", [1, fullscreen, 0, 0, 0]);
    wm.handle_xevent(XEvent::ClientMessage(msg)).expect("message");

    let c = wm.state.client(id).expect("managed");
    assert!(c.is_fullscreen());
    assert!(c.is_floating());
    assert_eq!(c.border(), 0);
    assert_eq!(c.r(), SCREEN);
    assert_eq!(
        wm.x.prop(id, "_NET_WM_STATE"),
        Some(Prop::Atom(vec!["_NET_WM_STATE_FULLSCREEN".into()]))
    );

    // toggle back out again
    let msg = ClientMessage::new(id, "_NET_WM_STATE", [2, 0, fullscreen, 0, 0]);
    wm.handle_xevent(XEvent::ClientMessage(msg)).expect("message");

    let c = wm.state.client(id).expect("managed");
    assert!(!c.is_fullscreen());
    assert!(!c.is_floating());
    assert_eq!(c.border(), 4);
    assert_eq!(c.r(), Rect::new(0, 0, 1272, 792));
}

#[test]
fn activation_requests_mark_unfocused_clients_urgent() {
    let mut wm = wm();
    let a = map_window(&mut wm, 10);
    map_window(&mut wm, 11);

    let msg = ClientMessage::new(a, "_NET_ACTIVE_WINDOW", [0; 5]);
    wm.handle_xevent(XEvent::ClientMessage(msg)).expect("message");

    assert!(wm.state.client(a).expect("managed").is_urgent());
}

#[test]
fn urgency_is_cleared_on_focus() {
    let mut wm = wm();
    let a = map_window(&mut wm, 10);
    map_window(&mut wm, 11);

    let hints = WmHints::try_from_bytes(&[WmHintsFlags::URGENCY_HINT.bits()]).expect("valid");
    wm.x.put_prop(a, "WM_HINTS", Prop::WmHints(hints));
    let evt = PropertyEvent {
        id: a,
        atom: "WM_HINTS".into(),
        is_root: false,
        deleted: false,
    };
    wm.handle_xevent(XEvent::PropertyNotify(evt)).expect("property");
    assert!(wm.state.client(a).expect("managed").is_urgent());

    wm.handle_command(Command::FocusStack(1));

    assert!(!wm.state.client(a).expect("managed").is_urgent());
    match wm.x.prop(a, "WM_HINTS") {
        Some(Prop::WmHints(h)) => assert!(!h.is_urgent()),
        other => panic!("unexpected WM_HINTS: {other:?}"),
    }
}

#[test]
fn title_changes_are_tracked() {
    let mut wm = wm();
    let id = map_window(&mut wm, 10);

    wm.x.put_prop(id, "_NET_WM_NAME", Prop::UTF8String(vec!["new title".into()]));
    let evt = PropertyEvent {
        id,
        atom: "_NET_WM_NAME".into(),
        is_root: false,
        deleted: false,
    };
    wm.handle_xevent(XEvent::PropertyNotify(evt)).expect("property");

    assert_eq!(wm.state.client(id).expect("managed").title(), "new title");
}

#[test]
fn tiled_configure_requests_are_answered_with_the_current_geometry() {
    let mut wm = wm();
    let id = map_window(&mut wm, 10);
    wm.x.take_calls();

    let req = ConfigureRequest {
        id,
        x: Some(5),
        w: Some(50),
        ..Default::default()
    };
    wm.handle_xevent(XEvent::ConfigureRequest(req)).expect("configure");

    assert_eq!(
        wm.x.take_calls(),
        vec![Call::ConfigureNotify(id, Rect::new(0, 0, 1272, 792), 4)]
    );
}

#[test]
fn floating_configure_requests_are_honoured() {
    let mut wm = wm();
    let id = Xid(10);
    let hints = WmNormalHints::new(Some((300, 200)), Some((300, 200)), None, None);
    wm.x.put_prop(id, "WM_NORMAL_HINTS", Prop::WmNormalHints(hints));
    map_window(&mut wm, 10);
    wm.x.take_calls();

    let req = ConfigureRequest {
        id,
        x: Some(50),
        y: Some(60),
        ..Default::default()
    };
    wm.handle_xevent(XEvent::ConfigureRequest(req)).expect("configure");

    let expected = Rect::new(50, 60, 300, 200);
    assert_eq!(
        wm.x.take_calls(),
        vec![
            Call::ConfigureNotify(id, expected, 4),
            Call::SetConfig(id, vec![ClientConfig::Position(expected)]),
        ]
    );
}

#[test]
fn unmanaged_configure_requests_are_forwarded() {
    let mut wm = wm();
    let id = Xid(99);

    let req = ConfigureRequest {
        id,
        y: Some(7),
        h: Some(30),
        ..Default::default()
    };
    wm.handle_xevent(XEvent::ConfigureRequest(req)).expect("configure");

    assert_eq!(
        wm.x.take_calls(),
        vec![Call::SetConfig(
            id,
            vec![ClientConfig::Y(7), ClientConfig::Height(30)]
        )]
    );
}

#[test]
fn kill_client_prefers_wm_delete_window() {
    let mut wm = wm();
    let polite = Xid(10);
    wm.x.put_prop(polite, "WM_PROTOCOLS", Prop::Atom(vec!["WM_DELETE_WINDOW".into()]));
    map_window(&mut wm, 10);
    wm.x.take_calls();

    wm.handle_command(Command::KillClient);

    let calls = wm.x.take_calls();
    let delete = *wm.x.intern_atom("WM_DELETE_WINDOW").expect("atom");
    assert_eq!(
        calls,
        vec![Call::ClientMessage(ClientMessage::new(
            polite,
            "WM_PROTOCOLS",
            [delete, 0, 0, 0, 0]
        ))]
    );

    let rude = map_window(&mut wm, 11);
    wm.x.take_calls();
    wm.handle_command(Command::KillClient);

    assert_eq!(wm.x.take_calls(), vec![Call::Kill(rude)]);
}

#[test]
fn rules_set_tags_and_floating() {
    let config = Config {
        rules: vec![Rule {
            class: Some("Gimp".into()),
            tags: tag(2),
            floating: true,
            ..Default::default()
        }],
        ..Default::default()
    };
    let mut wm = wm_with(config, SCREEN, None);
    let id = Xid(10);
    wm.x.put_prop(id, "WM_CLASS", Prop::UTF8String(vec!["gimp".into(), "Gimp".into()]));
    map_window(&mut wm, 10);

    let c = wm.state.client(id).expect("managed");
    assert_eq!(c.tags(), tag(2));
    assert!(c.is_floating());
    assert_eq!(wm.state.focused_client(), None);
    assert_invariants(&wm.state);
}

#[test]
fn transient_windows_follow_their_parent() {
    let mut wm = wm();
    let parent = map_window(&mut wm, 10);
    wm.handle_command(Command::Tag(tag(1)));
    wm.handle_command(Command::View(tag(1)));

    let child = Xid(11);
    wm.x.put_prop(child, "WM_TRANSIENT_FOR", Prop::Window(vec![parent]));
    map_window(&mut wm, 11);

    let c = wm.state.client(child).expect("managed");
    assert!(c.is_floating());
    assert_eq!(c.tags(), tag(1));
    assert_eq!(wm.state.focused_client(), Some(child));
}

#[test]
fn key_presses_run_their_bound_command() {
    let mut wm = wm();
    map_window(&mut wm, 10);
    map_window(&mut wm, 11);

    let key = KeyCode {
        mask: mask::MOD4 | mask::LOCK,
        code: Keysym::e.raw() as u8,
    };
    wm.handle_xevent(XEvent::KeyPress(key)).expect("key press");

    assert_eq!(wm.state.focused_client(), Some(Xid(10)));
}

#[test]
fn unbound_key_presses_are_ignored() {
    let mut wm = wm();
    map_window(&mut wm, 10);
    wm.x.take_calls();

    let key = KeyCode {
        mask: mask::MOD1,
        code: Keysym::e.raw() as u8,
    };
    wm.handle_xevent(XEvent::KeyPress(key)).expect("key press");

    assert_eq!(wm.x.take_calls(), vec![]);
}

#[test]
fn quit_stops_the_main_loop() {
    let mut wm = wm();
    wm.handle_command(Command::Quit);

    assert!(!wm.state.is_running());
}

#[test]
fn clients_are_placed_on_the_selected_monitor() {
    let mut wm = dual_head();
    let a = map_window(&mut wm, 10);
    wm.handle_command(Command::FocusMon(1));
    let b = map_window(&mut wm, 20);

    assert_eq!(wm.state.selmon, 1);
    assert_eq!(wm.state.client(a).expect("managed").mon(), 0);
    assert_eq!(wm.state.client(b).expect("managed").mon(), 1);
    assert_eq!(r(&wm, b), Rect::new(1280, 0, 1272, 792));
    assert_invariants(&wm.state);
}

#[test]
fn tag_mon_moves_the_focused_client() {
    let mut wm = dual_head();
    let a = map_window(&mut wm, 10);

    wm.handle_command(Command::TagMon(1));

    assert_eq!(wm.state.client(a).expect("managed").mon(), 1);
    assert_eq!(wm.state.monitors[1].clients, vec![a]);
    assert_eq!(r(&wm, a), Rect::new(1280, 0, 1272, 792));
    assert_invariants(&wm.state);
}

#[test]
fn losing_an_output_migrates_clients_to_the_first_monitor() {
    let mut wm = dual_head();
    let a = map_window(&mut wm, 10);
    wm.handle_command(Command::FocusMon(1));
    let b = map_window(&mut wm, 20);

    wm.x.outputs.replace(Some(vec![LEFT]));
    let evt = ConfigureEvent {
        id: ROOT,
        r: WIDE,
        is_root: true,
    };
    wm.handle_xevent(XEvent::ConfigureNotify(evt)).expect("configure");

    assert_eq!(wm.state.monitors.len(), 1);
    assert_eq!(wm.state.selmon, 0);
    assert_eq!(wm.state.monitors[0].clients, vec![b, a]);
    assert_eq!(r(&wm, b), Rect::new(0, 0, 760, 792));
    assert_eq!(r(&wm, a), Rect::new(768, 0, 504, 792));
    assert_invariants(&wm.state);
}

#[test]
fn entering_a_client_on_another_monitor_selects_it() {
    let mut wm = dual_head();
    wm.handle_command(Command::FocusMon(1));
    let b = map_window(&mut wm, 20);
    wm.handle_command(Command::FocusMon(1));
    assert_eq!(wm.state.selmon, 0);

    let p = PointerChange {
        id: b,
        abs: Point::new(1300, 10),
        normal: true,
    };
    wm.handle_xevent(XEvent::Enter(p)).expect("enter");

    assert_eq!(wm.state.selmon, 1);
    assert_eq!(wm.state.focused_client(), Some(b));
}

#[test]
fn pointer_motion_across_monitors_moves_the_selection() {
    let mut wm = dual_head();
    let motion = |x, y| {
        XEvent::Motion(PointerChange {
            id: ROOT,
            abs: Point::new(x, y),
            normal: true,
        })
    };

    // the first motion event only records the pointer position
    wm.handle_xevent(motion(1300, 10)).expect("motion");
    assert_eq!(wm.state.selmon, 0);

    wm.handle_xevent(motion(1400, 10)).expect("motion");
    assert_eq!(wm.state.selmon, 0);

    wm.handle_xevent(motion(10, 10)).expect("motion");
    assert_eq!(wm.state.selmon, 0);

    wm.handle_xevent(motion(1300, 10)).expect("motion");
    assert_eq!(wm.state.selmon, 1);
}

#[test]
fn focus_stealing_is_reverted() {
    let mut wm = wm();
    let a = map_window(&mut wm, 10);
    let b = map_window(&mut wm, 11);
    wm.x.take_calls();

    wm.handle_xevent(XEvent::FocusIn(a)).expect("focus in");

    assert_eq!(wm.x.focused(), Some(b));
}

#[test]
fn cleanup_releases_every_client() {
    let mut wm = wm();
    let a = map_window(&mut wm, 10);
    map_window(&mut wm, 11);
    wm.handle_command(Command::Tag(tag(1)));
    wm.x.take_calls();

    wm.cleanup().expect("cleanup");
    let calls = wm.x.take_calls();

    assert!(wm.state.clients.is_empty());
    assert!(calls.contains(&Call::SetWmState(a, WmState::Withdrawn)));
    assert!(calls.contains(&Call::SetWmState(Xid(11), WmState::Withdrawn)));
    assert!(calls.contains(&Call::UngrabKeys));
    assert!(calls.contains(&Call::DestroyWindow(CHECK_WINDOW)));
    assert!(calls.contains(&Call::FocusPointerRoot));
    assert_eq!(wm.x.prop(ROOT, "_NET_ACTIVE_WINDOW"), None);
}

#[test]
fn rules_targeting_another_monitor_keep_focus_visible() {
    let config = Config {
        rules: vec![Rule {
            class: Some("Gimp".into()),
            tags: tag(2),
            monitor: Some(1),
            ..Default::default()
        }],
        ..Default::default()
    };
    let mut wm = wm_with(config, WIDE, Some(vec![LEFT, RIGHT]));
    let id = Xid(10);
    wm.x.put_prop(id, "WM_CLASS", Prop::UTF8String(vec!["gimp".into(), "Gimp".into()]));
    map_window(&mut wm, 10);

    let c = wm.state.client(id).expect("managed");
    assert_eq!(c.mon(), 1);
    assert_eq!(c.tags(), tag(2));
    assert_eq!(wm.state.selmon, 0);
    assert_eq!(wm.state.monitors[1].sel, None);
    assert_invariants(&wm.state);

    wm.handle_command(Command::FocusMon(1));
    wm.handle_command(Command::View(tag(2)));

    assert_eq!(wm.state.focused_client(), Some(id));
    assert_invariants(&wm.state);
}

#[test]
fn rules_targeting_another_monitor_select_visible_clients_there() {
    let config = Config {
        rules: vec![Rule {
            class: Some("Gimp".into()),
            monitor: Some(1),
            ..Default::default()
        }],
        ..Default::default()
    };
    let mut wm = wm_with(config, WIDE, Some(vec![LEFT, RIGHT]));
    let a = map_window(&mut wm, 10);
    let id = Xid(20);
    wm.x.put_prop(id, "WM_CLASS", Prop::UTF8String(vec!["gimp".into(), "Gimp".into()]));
    map_window(&mut wm, 20);

    assert_eq!(wm.state.selmon, 0);
    assert_eq!(wm.state.focused_client(), Some(a));
    assert_eq!(wm.state.monitors[1].sel, Some(id));
    assert_invariants(&wm.state);
}

#[test]
fn reading_properties_of_a_destroyed_window_does_not_abort_unmanage() {
    let mut wm = wm();
    let a = map_window(&mut wm, 10);
    let b = map_window(&mut wm, 11);
    assert_eq!(wm.state.focused_client(), Some(b));

    // a is gone on the server but its DestroyNotify has not been processed yet
    wm.x.destroy_on_server(a);
    wm.x.remove_window(b);
    wm.handle_xevent(XEvent::Destroy(b)).expect("destroy");

    assert_eq!(
        wm.x.prop(ROOT, "_NET_CLIENT_LIST"),
        Some(Prop::Window(vec![a]))
    );
    assert_eq!(r(&wm, a), Rect::new(0, 0, 1272, 792));
    assert_eq!(wm.state.focused_client(), Some(a));
    assert_invariants(&wm.state);
}

#[test]
fn property_reads_treat_destroyed_windows_as_unset() {
    let x = MockXConn::new(SCREEN, None);
    let id = Xid(10);
    x.put_prop(id, "WM_PROTOCOLS", Prop::Atom(vec!["WM_TAKE_FOCUS".into()]));
    x.destroy_on_server(id);

    assert!(x.get_prop(id, "WM_PROTOCOLS").is_err());
    assert_eq!(x.client_prop(id, "WM_PROTOCOLS").expect("best effort read"), None);
    assert!(!x.send_protocol(id, Atom::WmTakeFocus).expect("best effort read"));
}

fn quit_key() -> XEvent {
    XEvent::KeyPress(KeyCode {
        mask: mask::MOD4 | mask::CONTROL | mask::SHIFT,
        code: Keysym::q.raw() as u8,
    })
}

#[test]
fn recoverable_errors_reading_events_do_not_stop_the_main_loop() {
    let x = MockXConn::new(SCREEN, None);
    x.push_poll_error(Error::InvalidClientMessageData { format: 7 });
    x.push_poll_error(Error::DestroyedWindow {
        request_code: 20,
        error_code: 3,
    });
    x.push_event(quit_key());
    let wm = WindowManager::new(Config::default(), x).expect("valid config");

    assert!(wm.run().is_ok());
}

#[test]
fn fatal_errors_reading_events_stop_the_main_loop() {
    let x = MockXConn::new(SCREEN, None);
    x.push_poll_error(Error::UnhandledXError {
        request_code: 12,
        error_code: 2,
    });
    x.push_event(quit_key());
    let wm = WindowManager::new(Config::default(), x).expect("valid config");

    assert!(matches!(wm.run(), Err(Error::UnhandledXError { .. })));
}
