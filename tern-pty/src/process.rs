//! Child process on a pseudoterminal
//!
//! The child gets the slave side as its controlling terminal and runs in its
//! own session, so its process id doubles as the process group id that
//! receives SIGHUP when the window closes.

use std::ffi::CString;
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};

use log::{debug, warn};
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::pty::openpty;
use nix::sys::signal::{killpg, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{dup2, execvp, fork, setsid, ForkResult, Pid};

use crate::error::{Error, Result};
use crate::winsize::WindowSize;

/// How long a blocked write waits for the master to drain before retrying
const WRITE_WAIT_MS: u16 = 100;

/// What to run on the pseudoterminal
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    pub program: String,
    pub args: Vec<String>,
    /// Value exported as TERM
    pub term: String,
    pub size: WindowSize,
}

impl SpawnOptions {
    /// Run the user's shell: `$SHELL`, falling back to `/bin/sh`
    pub fn shell(term: &str, size: WindowSize) -> Self {
        let program = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
        Self {
            program,
            args: Vec::new(),
            term: term.to_string(),
            size,
        }
    }
}

/// Outcome of a nonblocking read from the master
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// This many bytes were read
    Data(usize),
    /// Nothing available right now
    WouldBlock,
    /// The child closed its side (exited)
    Closed,
}

/// Master side of a pseudoterminal with a running child
pub struct Pty {
    master: File,
    pid: Pid,
}

impl Pty {
    /// Open a PTY pair and start the child on it
    pub fn spawn(opts: &SpawnOptions) -> Result<Self> {
        let winsize = opts.size.as_winsize();
        let pair = openpty(Some(&winsize), None).map_err(Error::Open)?;

        let program = CString::new(opts.program.as_bytes())
            .map_err(|e| Error::InvalidCommand(e.to_string()))?;
        let mut argv = vec![program.clone()];
        for arg in &opts.args {
            argv.push(CString::new(arg.as_bytes()).map_err(|e| Error::InvalidCommand(e.to_string()))?);
        }

        match unsafe { fork() }.map_err(Error::Fork)? {
            ForkResult::Child => {
                drop(pair.master);
                exec_child(pair.slave, &program, &argv, &opts.term)
            }
            ForkResult::Parent { child } => {
                drop(pair.slave);
                let master = File::from(pair.master);
                set_nonblocking(&master)?;
                debug!("Spawned {} as pid {}", opts.program, child);
                Ok(Self { master, pid: child })
            }
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Read whatever is available without blocking
    pub fn read(&mut self, buf: &mut [u8]) -> Result<ReadStatus> {
        match self.master.read(buf) {
            Ok(0) => Ok(ReadStatus::Closed),
            Ok(n) => Ok(ReadStatus::Data(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(ReadStatus::WouldBlock),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(ReadStatus::WouldBlock),
            // Linux reports a hung-up slave as EIO
            Err(e) if e.raw_os_error() == Some(libc::EIO) => Ok(ReadStatus::Closed),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Write all of `bytes`, waiting for the master to drain when it is full
    pub fn write_all(&mut self, mut bytes: &[u8]) -> Result<()> {
        while !bytes.is_empty() {
            match self.master.write(bytes) {
                Ok(n) => bytes = &bytes[n..],
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    let mut fds = [PollFd::new(self.master.as_fd(), PollFlags::POLLOUT)];
                    poll(&mut fds, PollTimeout::from(WRITE_WAIT_MS))?;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(())
    }

    /// Report a new window size to the child (delivers SIGWINCH)
    pub fn resize(&self, size: WindowSize) -> Result<()> {
        let ws = size.as_winsize();
        let result = unsafe {
            libc::ioctl(
                self.master.as_raw_fd(),
                libc::TIOCSWINSZ as libc::c_ulong,
                &ws,
            )
        };
        if result == -1 {
            return Err(Error::WindowSize(io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Send SIGHUP to the child's process group
    pub fn hangup(&self) -> Result<()> {
        killpg(self.pid, Signal::SIGHUP)?;
        Ok(())
    }

    /// Exit status if the child has already terminated
    pub fn try_wait(&self) -> Option<i32> {
        match waitpid(self.pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(_, code)) => Some(code),
            Ok(WaitStatus::Signaled(_, signal, _)) => Some(128 + signal as i32),
            _ => None,
        }
    }
}

impl AsFd for Pty {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.master.as_fd()
    }
}

impl AsRawFd for Pty {
    fn as_raw_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }
}

impl Drop for Pty {
    fn drop(&mut self) {
        if self.try_wait().is_none() {
            if let Err(e) = self.hangup() {
                debug!("Hangup on drop failed: {}", e);
            }
        }
    }
}

fn set_nonblocking(file: &File) -> Result<()> {
    let fd = file.as_raw_fd();
    let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
    fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
    Ok(())
}

/// Runs in the forked child; never returns
fn exec_child(slave: OwnedFd, program: &CString, argv: &[CString], term: &str) -> ! {
    if setsid().is_err() {
        std::process::exit(1);
    }
    let fd = slave.as_raw_fd();
    unsafe {
        if libc::ioctl(fd, libc::TIOCSCTTY as libc::c_ulong, 0) < 0 {
            std::process::exit(1);
        }
    }
    for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        if dup2(fd, target).is_err() {
            std::process::exit(1);
        }
    }
    if fd > 2 {
        drop(slave);
    }

    std::env::set_var("TERM", term);
    std::env::remove_var("COLUMNS");
    std::env::remove_var("LINES");

    if let Err(e) = execvp(program, argv) {
        warn!("execvp {:?} failed: {}", program, e);
    }
    std::process::exit(127);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    fn run(program: &str, args: &[&str]) -> Pty {
        let opts = SpawnOptions {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            term: "xterm-256color".to_string(),
            size: WindowSize::default(),
        };
        Pty::spawn(&opts).unwrap()
    }

    fn read_until_closed(pty: &mut Pty) -> String {
        let mut out = Vec::new();
        let mut buf = [0u8; 1024];
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            match pty.read(&mut buf).unwrap() {
                ReadStatus::Data(n) => out.extend_from_slice(&buf[..n]),
                ReadStatus::WouldBlock => thread::sleep(Duration::from_millis(10)),
                ReadStatus::Closed => break,
            }
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    #[test]
    fn test_spawn_echo_reports_closed() {
        let mut pty = run("/bin/echo", &["hello"]);
        let output = read_until_closed(&mut pty);
        assert!(output.contains("hello"));
    }

    #[test]
    fn test_term_is_exported() {
        let mut pty = run("/bin/sh", &["-c", "echo $TERM"]);
        let output = read_until_closed(&mut pty);
        assert!(output.contains("xterm-256color"));
    }

    #[test]
    fn test_resize_reaches_child() {
        let mut pty = run("/bin/sh", &["-c", "sleep 0.2; stty size"]);
        pty.resize(WindowSize::new(100, 30, 0, 0)).unwrap();
        let output = read_until_closed(&mut pty);
        assert!(output.contains("30 100"), "got: {}", output);
    }

    #[test]
    fn test_write_is_echoed() {
        let mut pty = run("/bin/cat", &[]);
        pty.write_all(b"ping\n").unwrap();
        let mut seen = String::new();
        let mut buf = [0u8; 256];
        let deadline = Instant::now() + Duration::from_secs(5);
        while !seen.contains("ping") && Instant::now() < deadline {
            match pty.read(&mut buf).unwrap() {
                ReadStatus::Data(n) => seen.push_str(&String::from_utf8_lossy(&buf[..n])),
                _ => thread::sleep(Duration::from_millis(10)),
            }
        }
        assert!(seen.contains("ping"));
        pty.hangup().unwrap();
    }
}
