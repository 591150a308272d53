//! Crate error type.

use std::error;
use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by generator construction and the audio sink boundary.
#[derive(Debug)]
pub enum Error {
    /// A construction-time invariant was violated (e.g. non-positive
    /// sample rate). Fatal to startup.
    InvalidConfiguration(String),
    /// No default output device exists on the host.
    DeviceUnavailable,
    /// The driver rejected the requested output stream configuration.
    StreamOpen(cpal::BuildStreamError),
    /// The stream could not be started.
    StreamStart(cpal::PlayStreamError),
    /// The stream could not be stopped.
    StreamStop(cpal::PauseStreamError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfiguration(reason) => {
                write!(f, "invalid configuration: {reason}")
            }
            Error::DeviceUnavailable => write!(f, "no default output device available"),
            Error::StreamOpen(err) => write!(f, "failed to open output stream: {err}"),
            Error::StreamStart(err) => write!(f, "failed to start output stream: {err}"),
            Error::StreamStop(err) => write!(f, "failed to stop output stream: {err}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::InvalidConfiguration(_) | Error::DeviceUnavailable => None,
            Error::StreamOpen(err) => Some(err),
            Error::StreamStart(err) => Some(err),
            Error::StreamStop(err) => Some(err),
        }
    }
}
