//! Error types for the front end

use thiserror::Error;

/// Front end error type
#[derive(Error, Debug)]
pub enum Error {
    /// A configured font could not be found or parsed
    #[error("Failed to load font {family}: {reason}")]
    Font { family: String, reason: String },

    /// The display connection or window could not be created
    #[error("Display error: {0}")]
    Display(String),

    /// Presenting pixels to the window surface failed
    #[error("Surface error: {0}")]
    Surface(String),

    /// The readiness wait failed
    #[error("Poll failed: {0}")]
    Poll(#[from] nix::Error),

    /// Reading from or writing to the child failed
    #[error("PTY error: {0}")]
    Pty(#[from] tern_pty::Error),
}

impl From<softbuffer::SoftBufferError> for Error {
    fn from(e: softbuffer::SoftBufferError) -> Self {
        Error::Surface(e.to_string())
    }
}

impl From<winit::error::EventLoopError> for Error {
    fn from(e: winit::error::EventLoopError) -> Self {
        Error::Display(e.to_string())
    }
}

impl From<winit::error::OsError> for Error {
    fn from(e: winit::error::OsError) -> Self {
        Error::Display(e.to_string())
    }
}

/// Result type for front end operations
pub type Result<T> = std::result::Result<T, Error>;
