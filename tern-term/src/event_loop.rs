//! Main loop
//!
//! One thread waits on two descriptors: the PTY master and the display
//! connection. Each pass reads one chunk of child output into the model,
//! dispatches display events, fires due timers and draws if the frame pacer
//! allows it.
//! The wait is bounded by the earliest timer so blinking and key repeat
//! keep running while both descriptors are idle.

use std::cell::RefCell;
use std::os::fd::{AsFd, BorrowedFd};
use std::rc::Rc;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use tern_pty::{Pty, ReadStatus, WindowSize};

use crate::app::{App, Tty};
use crate::error::Result;
use crate::event::DisplayEventSink;
use crate::font::Face;
use crate::model::TermModel;
use crate::render::Canvas;

/// Bytes read from the child per call
const READ_CHUNK: usize = 64 * 1024;

/// A display connection the loop can wait on
pub trait Display {
    /// Readable when events are pending
    fn fd(&self) -> BorrowedFd<'_>;

    /// Inner size of the window in pixels
    fn size(&self) -> (u32, u32);

    /// Deliver everything queued; false once the connection is gone
    fn dispatch(&mut self, sink: &mut dyn DisplayEventSink) -> Result<bool>;
}

impl<T: Tty> Tty for Rc<RefCell<T>> {
    fn write_all(&mut self, bytes: &[u8]) -> tern_pty::Result<()> {
        self.borrow_mut().write_all(bytes)
    }

    fn resize(&mut self, size: WindowSize) -> tern_pty::Result<()> {
        self.borrow_mut().resize(size)
    }

    fn hangup(&mut self) -> tern_pty::Result<()> {
        self.borrow_mut().hangup()
    }
}

/// Round up so the loop never wakes just before a timer is due
fn poll_timeout(timeout: Option<Duration>) -> PollTimeout {
    match timeout {
        None => PollTimeout::NONE,
        Some(d) => {
            let ms = (d.as_micros() + 999) / 1000;
            i32::try_from(ms)
                .ok()
                .and_then(|ms| PollTimeout::try_from(ms).ok())
                .unwrap_or(PollTimeout::MAX)
        }
    }
}

/// Read at most one chunk so a chatty child cannot starve the display.
/// Returns false once the child side is closed.
fn read_child<M, F, C>(app: &mut App<M, F, C>, pty: &RefCell<Pty>, buf: &mut [u8]) -> Result<bool>
where
    M: TermModel,
    F: Face,
    C: Canvas<F>,
{
    // The borrow must end before feed() writes replies back
    let status = pty.borrow_mut().read(buf)?;
    match status {
        ReadStatus::Data(n) => app.feed(&buf[..n]),
        ReadStatus::WouldBlock => {}
        ReadStatus::Closed => return Ok(false),
    }
    Ok(true)
}

/// Run until the child exits, the window closes or a fatal error occurs
pub fn run<M, F, C, D>(app: &mut App<M, F, C>, pty: &RefCell<Pty>, display: &mut D) -> Result<()>
where
    M: TermModel,
    F: Face,
    C: Canvas<F>,
    D: Display,
{
    let mut buf = vec![0u8; READ_CHUNK];

    let (width, height) = display.size();
    app.on_resize(width, height);
    app.redraw();

    loop {
        let timeout = poll_timeout(app.timeout(Instant::now()));
        let child_ready = {
            let pty_ref = pty.borrow();
            let mut fds = [
                PollFd::new(pty_ref.as_fd(), PollFlags::POLLIN),
                PollFd::new(display.fd(), PollFlags::POLLIN),
            ];
            match poll(&mut fds, timeout) {
                Ok(_) => {}
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }
            fds[0].revents().is_some_and(|r| {
                r.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR)
            })
        };

        if child_ready && !read_child(app, pty, &mut buf)? {
            match pty.borrow().try_wait() {
                Some(code) => log::info!("Child exited with status {}", code),
                None => log::info!("Child closed the terminal"),
            }
            return Ok(());
        }

        // Toolkits may queue events without the descriptor turning readable
        if !display.dispatch(app)? {
            log::info!("Display connection closed");
            return Ok(());
        }

        if let Some(e) = app.take_error() {
            return Err(e);
        }
        if app.is_closing() {
            return Ok(());
        }

        app.tick(Instant::now());
        app.redraw();
    }
}
