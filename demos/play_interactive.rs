//! Interactive tone synthesizer.
//!
//! Keys: `s` sine, `w` square, `a` sawtooth, `t` triangle,
//! `+`/`-` step the frequency by 50 Hz, `q` or Ctrl+C to quit.

use std::io::{Write, stdout};
use std::panic;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use tonebox::{
    AudioSink, Command, FREQUENCY_STEP_HZ, ShutdownToken, Signal, SignalGenerator, Waveform,
};

const SAMPLE_RATE: u32 = 44100;
const FRAMES_PER_BUFFER: u32 = 256;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let mut sink = AudioSink::new();
    sink.initialize(SAMPLE_RATE, FRAMES_PER_BUFFER)?;

    let mut generator = SignalGenerator::new(f64::from(sink.sample_rate()))?;
    generator.set_waveform(Waveform::Sine);
    generator.set_frequency(440.0); // A4 note
    generator.set_amplitude(0.3);
    let generator = Arc::new(Mutex::new(generator));

    let callback_generator = Arc::clone(&generator);
    sink.set_fill_function(Box::new(move |buffer| {
        let mut generator = callback_generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for slot in buffer.iter_mut() {
            *slot = generator.next_sample() as f32;
        }
    }));

    sink.start_stream()?;

    // Terminal setup; mirrored by cleanup_terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(crossterm::cursor::Hide)?;

    // Restore the terminal even if the event loop panics
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        cleanup_terminal();
        original_hook(panic_info);
    }));

    let shutdown = ShutdownToken::new();
    let result = run_event_loop(&generator, &shutdown);

    cleanup_terminal();
    sink.stop_stream()?;
    result
}

fn run_event_loop(
    generator: &Arc<Mutex<SignalGenerator>>,
    shutdown: &ShutdownToken,
) -> Result<()> {
    {
        let generator = generator.lock().unwrap_or_else(PoisonError::into_inner);
        draw_ui(generator.waveform(), generator.frequency(), "")?;
    }

    while !shutdown.is_requested() {
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key_event) = event::read()?
        {
            handle_key(generator, shutdown, &key_event)?;
        }
    }
    Ok(())
}

fn handle_key(
    generator: &Arc<Mutex<SignalGenerator>>,
    shutdown: &ShutdownToken,
    key_event: &KeyEvent,
) -> Result<()> {
    // Under raw mode Ctrl+C arrives as a key event, not a signal
    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c') {
        shutdown.request();
        return Ok(());
    }

    let KeyCode::Char(key) = key_event.code else {
        return Ok(());
    };

    let mut generator = generator.lock().unwrap_or_else(PoisonError::into_inner);
    let status = match Command::parse(key) {
        Some(Command::Quit) => {
            shutdown.request();
            return Ok(());
        }
        Some(Command::SelectWaveform(waveform)) => {
            generator.set_waveform(waveform);
            format!("Waveform: {}", waveform.name())
        }
        Some(Command::IncreaseFrequency) => {
            let frequency = generator.increase_frequency(FREQUENCY_STEP_HZ);
            format!("Frequency: {frequency} Hz")
        }
        Some(Command::DecreaseFrequency) => {
            let frequency = generator.decrease_frequency(FREQUENCY_STEP_HZ);
            format!("Frequency: {frequency} Hz")
        }
        None => "Invalid choice. Try again.".to_string(),
    };
    let waveform = generator.waveform();
    let frequency = generator.frequency();
    drop(generator);

    draw_ui(waveform, frequency, &status)
}

fn draw_ui(waveform: Waveform, frequency: f64, status: &str) -> Result<()> {
    let mut stdout = stdout();
    stdout.execute(crossterm::terminal::Clear(
        crossterm::terminal::ClearType::All,
    ))?;
    stdout.execute(crossterm::cursor::MoveTo(0, 0))?;
    write!(
        stdout,
        "Playing: {} @ {frequency:.0}Hz | s/w/a/t=waveform +/-=frequency q=quit",
        waveform.name()
    )?;
    if !status.is_empty() {
        stdout.execute(crossterm::cursor::MoveTo(0, 1))?;
        write!(stdout, "{status}")?;
    }
    stdout.flush()?;
    Ok(())
}

/// Cleans up terminal state (cursor, alternate screen, raw mode).
fn cleanup_terminal() {
    let _ = stdout().execute(crossterm::cursor::Show);
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = disable_raw_mode();
}
