use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use authflow_core::flow::FlowState;

use crate::tui::app::App;

mod bottom;
mod dashboard;
mod forms;
mod overlays;
pub mod util;

const SUBTITLE: &str = "Access the secure platform (Frontend Simulation).";

pub fn render_app(frame: &mut Frame, app: &App) {
    let frame_size = frame.size();
    let card = util::centered_rect(72, 22, frame_size);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(6),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .split(card);

    render_header(frame, layout[0], app);
    if app.snapshot().state == FlowState::Authenticated {
        dashboard::render(frame, layout[1], app);
    } else {
        forms::render(frame, layout[1], app);
    }
    bottom::render_messages(frame, layout[2], app);
    bottom::render_hints(frame, layout[3], app);

    overlays::render(frame, card, app);
}

fn render_header(frame: &mut Frame, area: ratatui::layout::Rect, app: &App) {
    let state = app.snapshot().state;
    let title_style = if state == FlowState::Authenticated {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::White)
    };
    let lines = vec![
        Line::styled(state.label(), title_style.add_modifier(Modifier::BOLD)),
        Line::styled(SUBTITLE, Style::default().fg(Color::LightBlue)),
    ];
    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(widget, area);
}
