use std::io;
use std::time::Duration;

use anyhow::Result;
use authflow_core::flow::{AuthFlowController, FlowState, Intent};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;

use crate::tui::app::App;
use crate::tui::view::render_app;

pub fn run(controller: AuthFlowController, app_id: &str) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(&mut stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!(app_id, "starting interactive session");
    let mut app = App::new(controller, app_id);
    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render_app(frame, app))?;

        if event::poll(Duration::from_millis(120))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let modifiers = key.modifiers;
                if modifiers.contains(KeyModifiers::CONTROL) {
                    match key.code {
                        KeyCode::Char('c') => break,
                        KeyCode::Char('n') => app.dispatch(Intent::NavigateRegister),
                        KeyCode::Char('f') => app.dispatch(Intent::NavigateReset),
                        KeyCode::Char('r') => app.dispatch(Intent::ResendCode),
                        KeyCode::Char('l') => app.dispatch(Intent::SignOut),
                        _ => {}
                    }
                    continue;
                }

                if app.show_help_overlay() {
                    if matches!(key.code, KeyCode::F(1) | KeyCode::Esc) {
                        app.toggle_help_overlay();
                    }
                    continue;
                }

                match key.code {
                    KeyCode::F(1) => app.toggle_help_overlay(),
                    KeyCode::Esc => {
                        if app.snapshot().state == FlowState::LoggedOut {
                            break;
                        }
                        app.dispatch(Intent::NavigateLogin);
                    }
                    KeyCode::Enter => app.submit(),
                    KeyCode::Tab | KeyCode::Down => app.move_focus(1),
                    KeyCode::BackTab | KeyCode::Up => app.move_focus(-1),
                    KeyCode::Backspace => app.pop_char(),
                    KeyCode::Char('q') if !app.has_fields() => break,
                    KeyCode::Char(c) => app.push_char(c),
                    _ => {}
                }
            }
        }

        app.poll_pending();
    }
    info!("interactive session closed");
    Ok(())
}
