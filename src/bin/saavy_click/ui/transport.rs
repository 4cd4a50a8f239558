//! Transport bar widget - shows tempo, meter, volume, state and device info

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::TransportView;

/// Render the transport bar
pub fn render_transport(frame: &mut Frame, area: Rect, view: &TransportView) {
    let block = Block::default().title(" saavy-click ").borders(Borders::ALL);

    let play_symbol = if view.is_running() { "▶" } else { "■" };
    let play_state_str = if view.is_running() { "Running" } else { "Stopped" };

    let device = match view.sample_rate {
        Some(rate) => format!("{:.1}kHz  ", rate as f32 / 1000.0),
        None => "no device  ".to_string(),
    };

    let mut spans = vec![
        Span::styled(
            format!(" BPM: {:.1}  ", view.bpm),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("{} beats  ", view.beats_per_measure),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{} {}  ", play_symbol, play_state_str),
            Style::default().fg(if view.is_running() {
                Color::Green
            } else {
                Color::Yellow
            }),
        ),
        Span::styled(
            format!("Vol: {:>3.0}%  ", view.volume * 100.0),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!("t={:.3}s  ", view.now),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(device, Style::default().fg(Color::DarkGray)),
    ];

    if let Some(cursor) = view.cursor {
        spans.push(Span::styled(
            format!("next: beat {} @ {:.3}s  ", cursor.beat_index + 1, cursor.next_event_time),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if view.dropped > 0 {
        spans.push(Span::styled(
            format!("dropped: {}", view.dropped),
            Style::default().fg(Color::Red),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}
