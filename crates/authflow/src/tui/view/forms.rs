use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use authflow_core::flow::FlowState;

use crate::tui::app::App;
use crate::tui::view::util::masked;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let fields = app.fields();
    let mut constraints = vec![Constraint::Length(2)];
    constraints.extend(fields.iter().map(|_| Constraint::Length(3)));
    constraints.push(Constraint::Min(0));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let intro = Paragraph::new(intro_text(app))
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });
    frame.render_widget(intro, chunks[0]);

    for (index, (field, value, focused)) in fields.into_iter().enumerate() {
        let shown = if field.is_secret() {
            masked(value)
        } else {
            value.to_string()
        };
        let border_style = if focused {
            Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let cursor = if focused { "_" } else { "" };
        let widget = Paragraph::new(Line::from(format!("{shown}{cursor}"))).block(
            Block::default()
                .title(field.label())
                .borders(Borders::ALL)
                .border_style(border_style),
        );
        frame.render_widget(widget, chunks[index + 1]);
    }
}

fn intro_text(app: &App) -> String {
    match app.snapshot().state {
        FlowState::LoggedOut => "Sign in to continue to multi-factor verification.".into(),
        FlowState::Registering => {
            "Create an account, then sign in with the new credentials.".into()
        }
        FlowState::ResettingPassword => {
            "Enter your registered email address to receive a secure password reset link.".into()
        }
        FlowState::AwaitingSecondFactor => format!(
            "A {}-digit code has been sent to your registered device (Simulated).",
            app.code_length()
        ),
        FlowState::Authenticated => String::new(),
    }
}
