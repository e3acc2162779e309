use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use authflow_core::flow::FlowState;

use crate::tui::app::App;

pub fn render_messages(frame: &mut Frame, area: Rect, app: &App) {
    let snapshot = app.snapshot();
    let mut lines = Vec::new();
    if snapshot.pending {
        lines.push(Line::styled(
            format!("Processing... {}", app.spinner_frame()),
            Style::default().fg(Color::LightBlue),
        ));
    }
    if let Some(status) = snapshot.status.as_deref() {
        lines.push(Line::styled(status.to_string(), Style::default().fg(Color::Cyan)));
    }
    if let Some(error) = snapshot.error.as_deref() {
        lines.push(Line::styled(error.to_string(), Style::default().fg(Color::Red)));
    }
    if let Some(notice) = app.notice() {
        lines.push(Line::styled(notice.to_string(), Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

pub fn render_hints(frame: &mut Frame, area: Rect, app: &App) {
    let hints = match app.snapshot().state {
        FlowState::LoggedOut => "Enter sign in  Ctrl+n register  Ctrl+f forgot password  Esc quit",
        FlowState::Registering => "Enter register  Esc back to sign in",
        FlowState::ResettingPassword => "Enter send reset link  Esc cancel",
        FlowState::AwaitingSecondFactor => "Enter verify  Ctrl+r resend code",
        FlowState::Authenticated => "Enter or Ctrl+l sign out  q quit",
    };
    let widget = Paragraph::new(format!("{hints}  F1 help"))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(widget, area);
}
