use std::{io, time::Duration};

use color_eyre::Result;
use crossterm::{
    event::{self, DisableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use devboard_core::tasks::{Task, TaskStatus};
use devboard_task::views::{self, DueState};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph},
    Terminal,
};

use crate::tasks::Presenter;

/// Read-only three-column board. Press `q` or `Esc` to exit.
pub fn launch(tasks: &[Task], presenter: &Presenter) -> Result<()> {
    // Guard restores the terminal even if we early-return.
    let _guard = TerminalGuard::enter()?;
    let mut terminal = _guard.terminal()?;
    let columns: Vec<(TaskStatus, Vec<Task>)> = TaskStatus::ALL
        .into_iter()
        .map(|status| (status, views::column(tasks, status)))
        .collect();
    let blocked = views::blocked(tasks).len();
    let sprint = views::sprint(tasks).len();

    loop {
        terminal.draw(|frame| {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(3),
                ])
                .split(frame.area());

            let header = Paragraph::new(Line::from(vec![
                Span::styled(
                    "Devboard",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    "  {} tasks, {blocked} blocked, {sprint} in sprint",
                    tasks.len()
                )),
            ]))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded),
            );
            frame.render_widget(header, rows[0]);

            let cells = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Ratio(1, 3),
                    Constraint::Ratio(1, 3),
                    Constraint::Ratio(1, 3),
                ])
                .split(rows[1]);

            for (cell, (status, column)) in cells.iter().zip(&columns) {
                let items: Vec<ListItem> = column
                    .iter()
                    .map(|task| card(task, presenter))
                    .collect();
                let list = List::new(items).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(Span::styled(
                            format!("{} ({})", status.as_str(), column.len()),
                            Style::default()
                                .fg(status_color(*status))
                                .add_modifier(Modifier::BOLD),
                        )),
                );
                frame.render_widget(list, *cell);
            }

            let footer = Paragraph::new(Line::from(vec![
                Span::raw("Press "),
                Span::styled("q", Style::default().fg(Color::Cyan)),
                Span::raw(" or "),
                Span::styled("Esc", Style::default().fg(Color::Cyan)),
                Span::raw(" to quit. Use `devboard --help` to change tasks."),
            ]))
            .block(Block::default().borders(Borders::ALL).title("Controls"));
            frame.render_widget(footer, rows[2]);
        })?;

        if event::poll(Duration::from_millis(150))? {
            if let Event::Key(key) = event::read()? {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn card<'a>(task: &'a Task, presenter: &Presenter) -> ListItem<'a> {
    let mut spans = vec![
        Span::styled(format!("#{} ", task.id), Style::default().fg(Color::DarkGray)),
        Span::styled(&task.title, Style::default().add_modifier(Modifier::BOLD)),
    ];
    if let Some(due) = &task.due_date {
        let color = match views::due_state(task, presenter.today, presenter.due_soon_days) {
            Some(DueState::Overdue) => Color::Red,
            Some(DueState::DueSoon) => Color::Yellow,
            _ => Color::Gray,
        };
        spans.push(Span::styled(format!(" {due}"), Style::default().fg(color)));
    }
    let (done, total) = task.subtask_progress();
    if total > 0 {
        spans.push(Span::raw(format!(" {done}/{total}")));
    }
    if task.in_sprint {
        spans.push(Span::styled(" ★", Style::default().fg(Color::Magenta)));
    }
    if task.blocked {
        spans.push(Span::styled(
            " blocked",
            Style::default().fg(Color::Red).add_modifier(Modifier::ITALIC),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Todo => Color::Yellow,
        TaskStatus::InProgress => Color::Cyan,
        TaskStatus::Done => Color::Green,
    }
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        // Enter alternate screen to avoid polluting the shell buffer.
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }

    fn terminal(&self) -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
        let backend = CrosstermBackend::new(io::stdout());
        Ok(Terminal::new(backend)?)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Errors are reported but not propagated from Drop.
        if let Err(err) = disable_raw_mode() {
            eprintln!("failed to disable raw mode: {err}");
        }
        if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture) {
            eprintln!("failed to restore terminal: {err}");
        }
    }
}
