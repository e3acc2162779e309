use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::tui::app::App;
use crate::tui::view::util::centered_rect;

pub fn render(frame: &mut Frame, base_area: Rect, app: &App) {
    if app.show_help_overlay() {
        render_help(frame, base_area);
    }
}

fn render_help(frame: &mut Frame, area: Rect) {
    let overlay_width = area.width.min(64).max(40);
    let overlay_height = area.height.min(14).max(7);
    let overlay_area = centered_rect(overlay_width, overlay_height, area);
    let lines = vec![
        Line::from("Forms:"),
        Line::from("  tab/shift+tab or arrows  move between fields"),
        Line::from("  enter  submit the current form"),
        Line::from("Navigation:"),
        Line::from("  ctrl+n register   ctrl+f forgot password"),
        Line::from("  esc back to sign in (quits from sign in)"),
        Line::from("Verification and session:"),
        Line::from("  ctrl+r resend code   ctrl+l sign out"),
        Line::from("  ctrl+c exit at any time"),
        Line::from("Close help with F1 or Esc"),
    ];
    let widget = Paragraph::new(lines)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(Clear, overlay_area);
    frame.render_widget(widget, overlay_area);
}
