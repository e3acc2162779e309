use chrono::Local;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::tui::app::App;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let session = app.snapshot().session.as_ref();
    let identity = session.map(|s| s.identity.as_str()).unwrap_or("N/A");
    let status = session
        .map(|s| s.profile.status.as_str())
        .unwrap_or("Loading...");
    let email = session
        .map(|s| s.profile.email.as_str())
        .unwrap_or("Loading...");
    let last_login = session
        .map(|s| {
            s.profile
                .last_login
                .with_timezone(&Local)
                .format("%H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| "-".into());

    let lines = vec![
        Line::from("You have completed the multi-factor authentication flow."),
        Line::from(""),
        detail("Application ID", app.app_id()),
        detail("Authenticated User ID", identity),
        detail("Status", status),
        detail("Email", email),
        detail("Last login", &last_login),
    ];
    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .title("User Details (Simulated Session Data)")
                .borders(Borders::ALL),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}

fn detail(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
        Span::styled(value.to_string(), Style::default().fg(Color::LightBlue)),
    ])
}
