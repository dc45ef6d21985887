//! tessera :: a dynamic tiling window manager for X11 in the style of dwm
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default: info).
use std::env;
use tessera::{
    util::die,
    x11rb::X11rbConnection,
    Config, Error, WindowManager,
};
use tracing::error;
use tracing_subscriber::{self, prelude::*, EnvFilter};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    match args.as_slice() {
        [] => (),
        [flag] if flag == "-v" => die(concat!("tessera-", env!("CARGO_PKG_VERSION"))),
        _ => die("usage: tessera [-v]"),
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
        .init();

    let conn = match X11rbConnection::connect() {
        Ok(conn) => conn,
        Err(Error::OtherWmRunning) => die("tessera: another window manager is already running"),
        Err(error) => {
            error!(%error, "unable to connect to the X server");
            die("tessera: cannot open display")
        }
    };

    let mut config = Config::default();
    if let Err(error) = conn.load_resources(&mut config) {
        error!(%error, "unable to load X resources, using defaults");
    }

    let res = WindowManager::new(config, conn)
        .and_then(|wm| wm.with_command_pipe())
        .and_then(|wm| wm.run());

    if let Err(error) = res {
        error!(%error, "exiting");
        die(&format!("tessera: {error}"));
    }
}
