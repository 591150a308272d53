//! Control-surface vocabulary.
//!
//! The interactive loop itself lives in the caller (see
//! `demos/play_interactive.rs`); this module defines what it speaks:
//! keystroke commands and the cooperative shutdown handle. Nothing here
//! may be called from the real-time audio thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::generator::Waveform;

/// Frequency step applied by [`Command::IncreaseFrequency`] and
/// [`Command::DecreaseFrequency`], in Hz.
pub const FREQUENCY_STEP_HZ: f64 = 50.0;

/// A parsed operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    SelectWaveform(Waveform),
    IncreaseFrequency,
    DecreaseFrequency,
}

impl Command {
    /// Parses a single keystroke into a command.
    ///
    /// Key map: `q` quit, `s` sine, `w` square, `a` sawtooth, `t` triangle,
    /// `+`/`-` frequency step. Returns `None` for unrecognized input; the
    /// caller reports it and keeps prompting.
    pub fn parse(key: char) -> Option<Self> {
        match key {
            'q' => Some(Command::Quit),
            's' => Some(Command::SelectWaveform(Waveform::Sine)),
            'w' => Some(Command::SelectWaveform(Waveform::Square)),
            'a' => Some(Command::SelectWaveform(Waveform::Saw)),
            't' => Some(Command::SelectWaveform(Waveform::Triangle)),
            '+' => Some(Command::IncreaseFrequency),
            '-' => Some(Command::DecreaseFrequency),
            _ => None,
        }
    }
}

/// Cloneable handle for requesting cooperative shutdown.
///
/// The control loop observes the token between input-read iterations;
/// any holder (an interrupt handler, another thread) may request shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    flag: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Requests shutdown. Idempotent.
    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has been requested on this token or any clone.
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(Command::parse('q'), Some(Command::Quit));
        assert_eq!(
            Command::parse('s'),
            Some(Command::SelectWaveform(Waveform::Sine))
        );
        assert_eq!(
            Command::parse('w'),
            Some(Command::SelectWaveform(Waveform::Square))
        );
        assert_eq!(
            Command::parse('a'),
            Some(Command::SelectWaveform(Waveform::Saw))
        );
        assert_eq!(
            Command::parse('t'),
            Some(Command::SelectWaveform(Waveform::Triangle))
        );
        assert_eq!(Command::parse('+'), Some(Command::IncreaseFrequency));
        assert_eq!(Command::parse('-'), Some(Command::DecreaseFrequency));
    }

    #[test]
    fn test_parse_unknown_input() {
        assert_eq!(Command::parse('x'), None);
        assert_eq!(Command::parse('Q'), None);
        assert_eq!(Command::parse(' '), None);
        assert_eq!(Command::parse('1'), None);
    }

    #[test]
    fn test_shutdown_token_starts_clear() {
        let token = ShutdownToken::new();
        assert!(!token.is_requested());
    }

    #[test]
    fn test_shutdown_token_request() {
        let token = ShutdownToken::new();
        token.request();
        assert!(token.is_requested());
        // Idempotent
        token.request();
        assert!(token.is_requested());
    }

    #[test]
    fn test_shutdown_token_clones_share_state() {
        let token = ShutdownToken::new();
        let clone = token.clone();
        clone.request();
        assert!(token.is_requested());
    }
}
