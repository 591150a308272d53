//! Real-time audio output boundary.
//!
//! [`AudioSink`] owns the output stream and the handoff between the control
//! thread and the driver's real-time callback thread. The two sides share
//! exactly one piece of state: the current fill function, behind a mutex
//! that both hold only long enough to read the reference and run the fill.

use std::sync::{Arc, Mutex, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// The buffer-fill behavior installed on the sink.
///
/// Invoked on the real-time thread with the output buffer for one callback
/// period; the slice length is the requested frame count (mono stream).
/// Must not block, allocate, or perform I/O.
pub type FillFn = Box<dyn FnMut(&mut [f32]) + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Uninitialized,
    Initialized,
    Streaming,
    Stopped,
}

/// A single-channel, low-latency output sink over the default audio device.
///
/// Lifecycle: `Uninitialized -> Initialized -> Streaming -> Stopped`, with
/// restart from `Stopped` allowed. `start_stream` initializes lazily with
/// the current defaults if `initialize` was never called.
pub struct AudioSink {
    stream: Option<cpal::Stream>,
    state: SinkState,
    sample_rate: u32,
    frames_per_buffer: u32,
    fill: Arc<Mutex<Option<FillFn>>>,
}

impl AudioSink {
    /// Creates a sink with default configuration (44100 Hz, 256 frames).
    ///
    /// No device work happens until [`initialize`](Self::initialize) or
    /// [`start_stream`](Self::start_stream).
    pub fn new() -> Self {
        Self {
            stream: None,
            state: SinkState::Uninitialized,
            sample_rate: 44100,
            frames_per_buffer: 256,
            fill: Arc::new(Mutex::new(None)),
        }
    }

    /// Opens the output stream on the default device.
    ///
    /// Requests a mono `f32` stream at `sample_rate` with a fixed buffer of
    /// `frames_per_buffer` frames and registers the real-time callback.
    /// Calling this again after a successful open is a no-op returning `Ok`.
    ///
    /// # Errors
    ///
    /// [`Error::DeviceUnavailable`] if the host has no default output
    /// device; [`Error::StreamOpen`] if the driver rejects the stream.
    pub fn initialize(&mut self, sample_rate: u32, frames_per_buffer: u32) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(Error::DeviceUnavailable)?;

        self.sample_rate = sample_rate;
        self.frames_per_buffer = frames_per_buffer;

        let config = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Fixed(frames_per_buffer),
        };

        let fill = Arc::clone(&self.fill);
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    fill_buffer(&fill, data);
                },
                |err| warn!("output stream error: {err}"),
                None,
            )
            .map_err(Error::StreamOpen)?;

        self.stream = Some(stream);
        self.state = SinkState::Initialized;
        debug!(sample_rate, frames_per_buffer, "output stream opened");
        Ok(())
    }

    /// Starts (or restarts) the stream, initializing lazily if needed.
    ///
    /// # Errors
    ///
    /// Propagates [`initialize`](Self::initialize) failures, or returns
    /// [`Error::StreamStart`] if the driver refuses to start.
    pub fn start_stream(&mut self) -> Result<()> {
        if self.stream.is_none() {
            self.initialize(self.sample_rate, self.frames_per_buffer)?;
        }
        if let Some(stream) = &self.stream {
            stream.play().map_err(Error::StreamStart)?;
            self.state = SinkState::Streaming;
            debug!("output stream started");
        }
        Ok(())
    }

    /// Stops the stream. Succeeds as a no-op if never initialized.
    ///
    /// # Errors
    ///
    /// [`Error::StreamStop`] if the driver refuses to stop.
    pub fn stop_stream(&mut self) -> Result<()> {
        let Some(stream) = &self.stream else {
            return Ok(());
        };
        stream.pause().map_err(Error::StreamStop)?;
        self.state = SinkState::Stopped;
        debug!("output stream stopped");
        Ok(())
    }

    /// Installs the fill function, replacing any previous one.
    ///
    /// Takes effect on the next callback invocation after the lock is
    /// released. May be called at any time, including while streaming.
    pub fn set_fill_function(&self, fill: FillFn) {
        let mut slot = self
            .fill
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(fill);
    }

    /// Removes the fill function; the sink emits silence until a new one
    /// is installed.
    pub fn clear_fill_function(&self) {
        let mut slot = self
            .fill
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// Gets the configured sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Gets the configured frames per buffer.
    pub fn frames_per_buffer(&self) -> u32 {
        self.frames_per_buffer
    }
}

impl Default for AudioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AudioSink {
    fn drop(&mut self) {
        // Best-effort: stop before the stream handle (and with it the
        // device connection) is dropped. Never panics out of teardown.
        if self.state == SinkState::Streaming
            && let Err(err) = self.stop_stream()
        {
            warn!("failed to stop stream during teardown: {err}");
        }
    }
}

/// Runs one callback period: invoke the installed fill function, or write
/// silence when none is installed. A poisoned lock is recovered rather than
/// propagated so the audio thread keeps running.
fn fill_buffer(fill: &Mutex<Option<FillFn>>, data: &mut [f32]) {
    let mut slot = fill.lock().unwrap_or_else(PoisonError::into_inner);
    match slot.as_mut() {
        Some(fill) => fill(data),
        None => data.fill(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sink_defaults() {
        let sink = AudioSink::new();
        assert_eq!(sink.sample_rate(), 44100);
        assert_eq!(sink.frames_per_buffer(), 256);
        assert_eq!(sink.state, SinkState::Uninitialized);
    }

    #[test]
    fn test_stop_before_initialize_is_ok() {
        let mut sink = AudioSink::new();
        assert!(sink.stop_stream().is_ok());
        assert_eq!(sink.state, SinkState::Uninitialized);
    }

    #[test]
    fn test_silence_without_fill_function() {
        let fill: Mutex<Option<FillFn>> = Mutex::new(None);
        let mut buffer = vec![1.0_f32; 64];
        fill_buffer(&fill, &mut buffer);
        assert!(buffer.iter().all(|&sample| sample == 0.0));
    }

    #[test]
    fn test_fill_function_is_invoked() {
        let fill: Mutex<Option<FillFn>> = Mutex::new(Some(Box::new(|buffer| {
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = i as f32;
            }
        })));
        let mut buffer = vec![0.0_f32; 4];
        fill_buffer(&fill, &mut buffer);
        assert_eq!(buffer, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_set_fill_function_replaces_previous() {
        let sink = AudioSink::new();
        sink.set_fill_function(Box::new(|buffer| buffer.fill(0.25)));
        sink.set_fill_function(Box::new(|buffer| buffer.fill(0.75)));

        let mut buffer = vec![0.0_f32; 8];
        fill_buffer(&sink.fill, &mut buffer);
        assert!(buffer.iter().all(|&sample| sample == 0.75));
    }

    #[test]
    fn test_clear_fill_function_restores_silence() {
        let sink = AudioSink::new();
        sink.set_fill_function(Box::new(|buffer| buffer.fill(0.5)));
        sink.clear_fill_function();

        let mut buffer = vec![1.0_f32; 8];
        fill_buffer(&sink.fill, &mut buffer);
        assert!(buffer.iter().all(|&sample| sample == 0.0));
    }

    #[test]
    fn test_fill_function_keeps_state_across_calls() {
        let sink = AudioSink::new();
        let mut counter = 0.0_f32;
        sink.set_fill_function(Box::new(move |buffer| {
            counter += 1.0;
            buffer.fill(counter);
        }));

        let mut buffer = vec![0.0_f32; 4];
        fill_buffer(&sink.fill, &mut buffer);
        assert!(buffer.iter().all(|&sample| sample == 1.0));
        fill_buffer(&sink.fill, &mut buffer);
        assert!(buffer.iter().all(|&sample| sample == 2.0));
    }

    #[test]
    fn test_poisoned_lock_still_fills() {
        let fill: Arc<Mutex<Option<FillFn>>> =
            Arc::new(Mutex::new(Some(Box::new(|buffer: &mut [f32]| {
                buffer.fill(0.5);
            }))));

        // Poison the mutex by panicking while holding the guard
        let poisoner = Arc::clone(&fill);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();

        let mut buffer = vec![0.0_f32; 8];
        fill_buffer(&fill, &mut buffer);
        assert!(buffer.iter().all(|&sample| sample == 0.5));
    }
}
