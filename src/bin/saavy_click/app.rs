//! ClickApp - owns the metronome and runs the terminal event loop

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;

use saavy_click::{
    clock::{Clock, StreamClock},
    output::CpalOutput,
    scheduler::IntervalTrigger,
    Metronome, MetronomeConfig,
};

use super::ui::{self, TransportView};

const VOLUME_STEP: f32 = 0.05;

type DeviceMetronome = Metronome<StreamClock, CpalOutput, IntervalTrigger>;

/// Terminal metronome application
pub struct ClickApp {
    metronome: DeviceMetronome,
    should_quit: bool,
}

impl ClickApp {
    /// Open the default output device and build a stopped metronome.
    pub fn new(config: MetronomeConfig) -> EyreResult<Self> {
        let volume = config.volume;
        let output = CpalOutput::new();
        let clock = output.clock();
        let metronome = Metronome::new(config, clock, output, IntervalTrigger::new())?;

        // Acquire the device up front so the clock is running before the first start.
        metronome.set_volume(volume);

        Ok(Self {
            metronome,
            should_quit: false,
        })
    }

    /// Run the UI event loop until the user quits
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            let view = self.view();
            terminal.draw(|frame| ui::render(frame, &view))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        self.metronome.stop();
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        let m = &mut self.metronome;
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => {
                if m.is_running() {
                    m.stop();
                } else {
                    m.start();
                }
            }
            KeyCode::Char('a') => {
                // Join the device timeline's own beat grid, counted from t = 0.
                let beat = m.seconds_per_beat();
                let now = m.clock().now();
                let offset = now % beat;
                let index = (now / beat).floor() as i64;
                if let Err(e) = m.start_aligned(offset, beat, index, None) {
                    log::warn!("aligned start rejected: {e}");
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => m.set_tempo_bpm(m.tempo_bpm().round() + 1.0),
            KeyCode::Char('-') => m.set_tempo_bpm(m.tempo_bpm().round() - 1.0),
            KeyCode::Char(']') => m.set_beats_per_measure(i64::from(m.beats_per_measure()) + 1),
            KeyCode::Char('[') => m.set_beats_per_measure(i64::from(m.beats_per_measure()) - 1),
            KeyCode::Up => m.set_volume(m.volume() + VOLUME_STEP),
            KeyCode::Down => m.set_volume(m.volume() - VOLUME_STEP),
            KeyCode::Char('c') => m.click_once(),
            _ => {}
        }
    }

    fn view(&self) -> TransportView {
        let m = &self.metronome;
        let (sample_rate, dropped) = m.with_output(|o| (o.sample_rate(), o.dropped()));
        TransportView {
            bpm: m.tempo_bpm(),
            seconds_per_beat: m.seconds_per_beat(),
            beats_per_measure: m.beats_per_measure(),
            volume: m.volume(),
            now: m.clock().now(),
            cursor: m.snapshot(),
            sample_rate,
            dropped,
        }
    }
}
