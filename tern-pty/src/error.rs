//! Error types for PTY operations

use std::io;
use thiserror::Error;

/// PTY error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error on the master side
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// openpty failed
    #[error("Failed to open pseudoterminal: {0}")]
    Open(nix::Error),

    /// fork failed
    #[error("Failed to fork child: {0}")]
    Fork(nix::Error),

    /// Program or argument contained an interior NUL
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// TIOCSWINSZ failed
    #[error("Failed to set window size: {0}")]
    WindowSize(io::Error),

    /// Other system call failure
    #[error("System error: {0}")]
    Nix(#[from] nix::Error),
}

/// Result type for PTY operations
pub type Result<T> = std::result::Result<T, Error>;
