//! Measure strip - one cell per beat, the sounding beat highlighted

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::TransportView;

/// Cells wider than this stop being readable; larger meters share the width
const MAX_CELLS: u32 = 16;

/// Render the measure strip
pub fn render_measure(frame: &mut Frame, area: Rect, view: &TransportView) {
    let block = Block::default().title(" Measure ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let beats = view.beats_per_measure.clamp(1, MAX_CELLS);
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints((0..beats).map(|_| Constraint::Ratio(1, beats)))
        .split(inner);

    let current = view.current_beat();

    for (beat, cell) in (0..beats).zip(cells.iter()) {
        let accent = beat == 0;
        let lit = current == Some(beat);

        let style = match (lit, accent) {
            (true, true) => Style::default()
                .fg(Color::Black)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
            (true, false) => Style::default().fg(Color::Black).bg(Color::Green),
            (false, true) => Style::default().fg(Color::Red),
            (false, false) => Style::default().fg(Color::DarkGray),
        };

        let label = Paragraph::new(format!("{}", beat + 1))
            .style(style)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(label, *cell);
    }
}
