//! A named pipe for driving the window manager from scripts.
//!
//! Each byte written to the pipe is decoded with [Command::from_pipe_byte]. Bytes that do not
//! map to a command (including newlines) are ignored so `echo w > /tmp/tessera.fifo` works.
use crate::{core::Command, Result};
use nix::{errno::Errno, fcntl::OFlag, sys::stat::Mode, unistd::mkfifo};
use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Read},
    os::unix::{
        fs::OpenOptionsExt,
        io::{AsRawFd, RawFd},
    },
    path::{Path, PathBuf},
};
use tracing::{debug, trace, warn};

/// The read end of the command pipe. The pipe is removed again when this is dropped.
#[derive(Debug)]
pub struct CommandPipe {
    path: PathBuf,
    file: File,
}

impl CommandPipe {
    /// Create (or reuse) a FIFO at `path` and open it for non-blocking reads.
    ///
    /// The pipe is also opened for writing so that it never reports EOF when the last
    /// external writer goes away.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        match mkfifo(&path, Mode::S_IRWXU) {
            Ok(()) | Err(Errno::EEXIST) => (),
            Err(e) => return Err(e.into()),
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(OFlag::O_NONBLOCK.bits())
            .open(&path)?;

        debug!(path = %path.display(), "opened command pipe");

        Ok(Self { path, file })
    }

    /// The location of the pipe on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain everything currently buffered in the pipe.
    pub fn read_commands(&mut self) -> Result<Vec<Command>> {
        let mut buf = [0u8; 64];
        let mut cmds = Vec::new();

        loop {
            match self.file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => cmds.extend(buf[..n].iter().filter_map(|&b| Command::from_pipe_byte(b))),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        trace!(?cmds, "read from command pipe");

        Ok(cmds)
    }
}

impl AsRawFd for CommandPipe {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl Drop for CommandPipe {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_file(&self.path) {
            warn!(%error, path = %self.path.display(), "unable to remove command pipe");
        }
    }
}
