//! Core data structures and user facing functionality for the window manager
use crate::{
    builtin::layout::LayoutKind,
    core::{bindings::KeyBindings, client::Client, config::Config, fifo::CommandPipe, monitor::Monitor},
    pure::geometry::Rect,
    x::{atom::EWMH_SUPPORTED_ATOMS, Atom, ClientAttr, Prop, XConn, XEvent},
    Result, Xid,
};
use nix::{
    errno::Errno,
    poll::{poll, PollFd, PollFlags},
    sys::signal::{signal, SigHandler, Signal},
};
use std::{collections::HashMap, os::unix::io::AsRawFd};
use tracing::{debug, error, info, span, trace, Level};

mod actions;
mod arrange;
pub mod bindings;
pub mod client;
pub mod command;
pub mod config;
pub mod fifo;
mod focus;
mod handle;
mod manage;
pub mod monitor;

#[cfg(test)]
mod tests;

#[doc(inline)]
pub use command::Command;

/// Mutable internal state for the window manager
#[derive(Debug)]
pub struct State {
    pub(crate) config: Config,
    pub(crate) clients: HashMap<Xid, Client>,
    pub(crate) monitors: Vec<Monitor>,
    pub(crate) selmon: usize,
    pub(crate) root: Xid,
    pub(crate) screen: Rect,
    pub(crate) check_win: Option<Xid>,
    pub(crate) motion_mon: Option<usize>,
    pub(crate) running: bool,
}

impl State {
    /// Create a new State with a single monitor covering the whole screen.
    pub fn new(config: Config, root: Xid, screen: Rect) -> Self {
        let monitors = vec![Monitor::new(screen, &config)];

        Self {
            config,
            clients: HashMap::new(),
            monitors,
            selmon: 0,
            root,
            screen,
            check_win: None,
            motion_mon: None,
            running: true,
        }
    }

    /// The config the window manager is running with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Look up a managed client by ID
    pub fn client(&self, id: Xid) -> Option<&Client> {
        self.clients.get(&id)
    }

    /// All current monitors in output order
    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    /// The index of the selected monitor
    pub fn selmon(&self) -> usize {
        self.selmon
    }

    /// The focused client on the selected monitor, if there is one
    pub fn focused_client(&self) -> Option<Xid> {
        self.monitors[self.selmon].sel
    }

    /// Whether the main loop should keep running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether a client is shown on its monitor's current view.
    pub fn is_visible(&self, id: Xid) -> bool {
        self.clients
            .get(&id)
            .map(|c| c.is_visible_on(&self.monitors[c.mon]))
            .unwrap_or(false)
    }

    fn is_tiled(&self, id: Xid) -> bool {
        self.clients.get(&id).map(|c| c.is_tiled()).unwrap_or(false)
    }

    /// Visible, tiled clients on a monitor in client list order.
    pub(crate) fn tiled_clients(&self, m: usize) -> Vec<Xid> {
        self.monitors[m]
            .clients
            .iter()
            .copied()
            .filter(|&id| self.is_visible(id) && self.is_tiled(id))
            .collect()
    }

    pub(crate) fn first_visible_in_stack(&self, m: usize) -> Option<Xid> {
        self.monitors[m]
            .stack
            .iter()
            .copied()
            .find(|&id| self.is_visible(id))
    }

    pub(crate) fn attach(&mut self, id: Xid) {
        if let Some(c) = self.clients.get(&id) {
            self.monitors[c.mon].clients.insert(0, id);
        }
    }

    pub(crate) fn attach_stack(&mut self, id: Xid) {
        if let Some(c) = self.clients.get(&id) {
            self.monitors[c.mon].stack.insert(0, id);
        }
    }

    pub(crate) fn detach(&mut self, id: Xid) {
        if let Some(c) = self.clients.get(&id) {
            self.monitors[c.mon].clients.retain(|&other| other != id);
        }
    }

    /// Remove a client from its monitor's stack. If it was the selected client then the
    /// selection moves to the next visible client in focus order.
    pub(crate) fn detach_stack(&mut self, id: Xid) {
        let m = match self.clients.get(&id) {
            Some(c) => c.mon,
            None => return,
        };

        self.monitors[m].stack.retain(|&other| other != id);

        if self.monitors[m].sel == Some(id) {
            self.monitors[m].sel = self.first_visible_in_stack(m);
        }
    }

    pub(crate) fn update_client_list<X: XConn>(&self, x: &X) -> Result<()> {
        let ids = self
            .monitors
            .iter()
            .flat_map(|m| m.clients.iter().copied())
            .collect();

        x.set_prop(self.root, Atom::NetClientList.as_ref(), Prop::Window(ids))
    }
}

/// A top level struct holding all of the state required to run as an X11 window manager.
///
/// Events from the X server and commands from the command pipe are handled one at a time
/// to completion in the order they arrive.
#[derive(Debug)]
pub struct WindowManager<X>
where
    X: XConn,
{
    x: X,
    state: State,
    key_bindings: KeyBindings,
    pipe: Option<CommandPipe>,
}

impl<X> WindowManager<X>
where
    X: XConn,
{
    /// Construct a new [WindowManager] with the provided config and X connection.
    ///
    /// The config is validated before anything is sent to the X server.
    pub fn new(config: Config, x: X) -> Result<Self> {
        config.validate()?;

        let key_bindings = KeyBindings::new(&config.key_bindings);
        let state = State::new(config, x.root(), x.screen_size());

        Ok(Self {
            x,
            state,
            key_bindings,
            pipe: None,
        })
    }

    /// Create the command pipe at the path given in the config and read commands from it
    /// alongside X events.
    pub fn with_command_pipe(mut self) -> Result<Self> {
        self.pipe = Some(CommandPipe::new(&self.state.config.command_pipe)?);

        Ok(self)
    }

    /// The current window manager state
    pub fn state(&self) -> &State {
        &self.state
    }

    /// The X connection being used
    pub fn x(&self) -> &X {
        &self.x
    }

    /// Set up monitors, EWMH support and key grabs before adopting any existing windows.
    pub fn init(&mut self) -> Result<()> {
        let (x, state) = (&self.x, &mut self.state);

        info!("initialising tessera");
        state.update_geometry(x)?;

        let root = state.root;
        let check = x.create_check_window()?;
        x.set_prop(check, Atom::NetSupportingWmCheck.as_ref(), Prop::Window(vec![check]))?;
        x.set_prop(check, Atom::NetWmName.as_ref(), Prop::UTF8String(vec!["tessera".into()]))?;
        x.set_prop(root, Atom::NetSupportingWmCheck.as_ref(), Prop::Window(vec![check]))?;
        state.check_win = Some(check);

        let supported = EWMH_SUPPORTED_ATOMS
            .iter()
            .map(|a| a.as_ref().to_owned())
            .collect();
        x.set_prop(root, Atom::NetSupported.as_ref(), Prop::Atom(supported))?;
        x.delete_prop(root, Atom::NetClientList.as_ref())?;

        x.set_client_attributes(root, &[ClientAttr::RootEventMask])?;
        debug!("grabbing key bindings");
        x.grab_keys(&self.key_bindings.keys())?;

        state.focus(x, None)?;
        state.scan(x)?;
        x.flush();

        Ok(())
    }

    /// Process a single event from the X server.
    pub fn handle_xevent(&mut self, event: XEvent) -> Result<()> {
        let (x, state, key_bindings) = (&self.x, &mut self.state, &self.key_bindings);

        let span = span!(Level::TRACE, "handle_xevent", ?event);
        let _enter = span.enter();
        trace!("handling event");

        match event {
            XEvent::ClientMessage(m) => handle::client_message(m, state, x),
            XEvent::ConfigureNotify(e) => handle::configure_notify(e, state, x),
            XEvent::ConfigureRequest(e) => handle::configure_request(e, state, x),
            XEvent::Destroy(id) => handle::destroy(id, state, x),
            XEvent::Enter(p) => handle::enter(p, state, x),
            XEvent::FocusIn(id) => handle::focus_in(id, state, x),
            XEvent::KeyPress(code) => handle::keypress(code, key_bindings, state, x),
            XEvent::MappingNotify => handle::mapping_notify(key_bindings, x),
            XEvent::MapRequest(id) => handle::map_request(id, state, x),
            XEvent::Motion(p) => handle::motion(p, state, x),
            XEvent::PropertyNotify(e) => handle::property_notify(e, state, x),
            XEvent::UnmapNotify(e) => handle::unmap_notify(e, state, x),
        }
    }

    /// Run a user command. Failures are logged rather than returned.
    pub fn handle_command(&mut self, cmd: Command) {
        if let Err(error) = self.state.run_command(&self.x, cmd) {
            error!(%error, ?cmd, "error running command");
        }
    }

    /// Release everything the window manager holds on the X server: every client is
    /// made visible and unmanaged, key grabs are dropped and focus returns to the pointer root.
    pub fn cleanup(&mut self) -> Result<()> {
        let (x, state) = (&self.x, &mut self.state);

        info!("cleaning up");
        let all = state.config.tag_mask();
        state.view(x, all)?;
        state.monitors[state.selmon].layout = LayoutKind::Floating;

        for m in 0..state.monitors.len() {
            while let Some(&id) = state.monitors[m].stack.first() {
                state.unmanage(x, id, false)?;
            }
        }

        x.ungrab_keys()?;
        if let Some(check) = state.check_win.take() {
            x.destroy_window(check)?;
        }
        x.sync()?;
        x.focus_pointer_root()?;
        x.delete_prop(state.root, Atom::NetActiveWindow.as_ref())?;
        x.flush();

        Ok(())
    }

    fn handle_or_log(&mut self, event: XEvent) -> Result<()> {
        match self.handle_xevent(event) {
            Err(e) if e.is_fatal() => Err(e),
            Err(error) => {
                error!(%error, "error handling event");
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }
}

impl<X> WindowManager<X>
where
    X: XConn + AsRawFd,
{
    /// Start the window manager and run it until [Command::Quit] is received or a fatal
    /// error occurs.
    ///
    /// Queued X events are processed before blocking in `poll(2)` on the X connection and,
    /// if one has been created, the command pipe.
    pub fn run(mut self) -> Result<()> {
        // child processes are reaped by init
        debug!("ignoring SIGCHLD");
        unsafe { signal(Signal::SIGCHLD, SigHandler::SigIgn) }?;

        self.init()?;
        let x_fd = self.x.as_raw_fd();

        info!("entering main event loop");
        while self.state.running {
            loop {
                match self.x.poll_event() {
                    Ok(Some(event)) => self.handle_or_log(event)?,
                    Ok(None) => break,
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(error) => error!(%error, "error reading event"),
                }

                if !self.state.running {
                    break;
                }
            }
            self.x.flush();

            if !self.state.running {
                break;
            }

            let mut fds = vec![PollFd::new(x_fd, PollFlags::POLLIN)];
            if let Some(pipe) = &self.pipe {
                fds.push(PollFd::new(pipe.as_raw_fd(), PollFlags::POLLIN));
            }

            match poll(&mut fds, -1) {
                Ok(_) => (),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }

            let pipe_ready = fds
                .get(1)
                .and_then(|fd| fd.revents())
                .map(|r| r.contains(PollFlags::POLLIN))
                .unwrap_or(false);

            if pipe_ready {
                let cmds = match &mut self.pipe {
                    Some(pipe) => pipe.read_commands()?,
                    None => vec![],
                };

                for cmd in cmds {
                    self.handle_command(cmd);
                }
                self.x.flush();
            }
        }

        self.cleanup()
    }
}
