use ratatui::{
    layout::Alignment,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, EntryKind, RoomEntry};

/// Main entry point for drawing the TUI. Dispatches to individual pane drawers.
pub fn draw(f: &mut Frame, app: &App) {
    let vertical_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3), // Header
                Constraint::Min(5),    // Room log
                Constraint::Length(3), // Input
                Constraint::Length(3), // Status
            ]
            .as_ref(),
        )
        .split(f.area());

    let header = Paragraph::new(format!("memegen-chat  #{}", app.room.name))
        .style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta)),
        )
        .alignment(Alignment::Center);
    f.render_widget(header, vertical_chunks[0]);

    draw_log_pane(f, app, vertical_chunks[1]);
    draw_input_pane(f, app, vertical_chunks[2]);
    draw_status_pane(f, app, vertical_chunks[3]);
}

/// Renders the room log, pinned to the bottom unless scrolled up.
fn draw_log_pane(f: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = if app.entries.is_empty() {
        vec![Line::from(Span::styled(
            "Type /help to see what you can do.",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))]
    } else {
        app.entries.iter().flat_map(entry_lines).collect()
    };

    let visible = area.height.saturating_sub(2);
    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let bottom = total.saturating_sub(visible);
    let offset = bottom.saturating_sub(app.scroll);

    let log = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Room ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .scroll((offset, 0));

    f.render_widget(log, area);
}

fn entry_lines(entry: &RoomEntry) -> Vec<Line<'_>> {
    let (author_style, text_style) = match entry.kind {
        EntryKind::Message => (
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            Style::default(),
        ),
        EntryKind::Notice => (
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Yellow),
        ),
        EntryKind::System => (
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::DarkGray),
        ),
        EntryKind::Error => (
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Red),
        ),
    };

    let mut lines = Vec::new();
    for (i, text) in entry.text.lines().enumerate() {
        let prefix = if i == 0 {
            Span::styled(format!("{}: ", entry.author), author_style)
        } else {
            Span::raw(" ".repeat(entry.author.chars().count() + 2))
        };
        lines.push(Line::from(vec![prefix, Span::styled(text, text_style)]));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(format!("{}:", entry.author), author_style)));
    }
    lines
}

/// Renders the input line.
fn draw_input_pane(f: &mut Frame, app: &App, area: Rect) {
    let input = Paragraph::new(app.input.as_str())
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(" Message ", Style::default().fg(Color::Cyan)))
                .border_style(Style::default().fg(Color::Cyan)),
        );
    f.render_widget(input, area);

    let cursor_x = area.x + 1 + u16::try_from(app.input.chars().count()).unwrap_or(u16::MAX);
    f.set_cursor_position((cursor_x.min(area.right().saturating_sub(2)), area.y + 1));
}

/// Renders the status bar with room, user and any error.
fn draw_status_pane(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        app.status_line(),
        Style::default().fg(Color::White),
    )];
    if let Some(error) = &app.error {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("Error: {error}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(
        "  [Enter] send  [Up/Down] history  [PgUp/PgDn] scroll  [Esc] quit",
        Style::default().fg(Color::DarkGray),
    ));

    let status = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(status, area);
}
