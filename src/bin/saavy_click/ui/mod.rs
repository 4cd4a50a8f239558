//! TUI rendering for saavy-click
//!
//! The app builds a [`TransportView`] snapshot each frame; widgets only read it.

mod measure;
mod transport;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use saavy_click::sequencing::SchedulerState;

use measure::render_measure;
use transport::render_transport;

/// Everything the UI shows, captured once per frame
#[derive(Debug, Clone, Copy)]
pub struct TransportView {
    pub bpm: f64,
    pub seconds_per_beat: f64,
    pub beats_per_measure: u32,
    pub volume: f32,
    /// Clock reading when the view was taken
    pub now: f64,
    /// Look-ahead cursor (None when stopped)
    pub cursor: Option<SchedulerState>,
    pub sample_rate: Option<u32>,
    pub dropped: u64,
}

impl TransportView {
    pub fn is_running(&self) -> bool {
        self.cursor.is_some()
    }

    /// Beat of the measure that is sounding at `now`.
    ///
    /// The cursor is already up to a horizon ahead of the clock, so count back
    /// from it by whole beats.
    pub fn current_beat(&self) -> Option<u32> {
        let cursor = self.cursor?;
        let meter = i64::from(self.beats_per_measure.max(1));
        let ahead = ((cursor.next_event_time - self.now) / self.seconds_per_beat).ceil() as i64;
        if ahead < 1 {
            return None;
        }
        Some((i64::from(cursor.beat_index) - ahead).rem_euclid(meter) as u32)
    }
}

/// Render the whole UI
pub fn render(frame: &mut Frame, view: &TransportView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Transport bar
            Constraint::Min(5),    // Measure strip
            Constraint::Length(1), // Help bar
        ])
        .split(frame.area());

    render_transport(frame, chunks[0], view);
    render_measure(frame, chunks[1], view);

    let help = Paragraph::new(
        " [Space] Start/Stop  [A] Align  [+/-] Tempo  [[/]] Meter  [Up/Down] Volume  [C] Click  [Q] Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[2]);
}
