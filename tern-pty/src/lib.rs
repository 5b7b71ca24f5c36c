//! Tern PTY - pseudoterminal plumbing
//!
//! Spawns the child program on a fresh pseudoterminal and exposes the master
//! side for the front end's readiness wait:
//! - PTY pair creation (`openpty`) and controlling-terminal setup
//! - Nonblocking reads that distinguish "nothing yet" from "child gone"
//! - Window size updates (TIOCSWINSZ)
//! - Hang-up delivery to the child's process group on shutdown

mod error;
mod process;
mod winsize;

pub use error::{Error, Result};
pub use process::{Pty, ReadStatus, SpawnOptions};
pub use winsize::WindowSize;
