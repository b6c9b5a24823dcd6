use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Padding, Paragraph, Wrap},
    Frame,
};

use crate::chat::{Message, Role};
use crate::terminal::App;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(0),    // Terminal body
        ])
        .split(f.area());

    render_title_bar(f, app, chunks[0]);

    let body = Block::default().padding(Padding::horizontal(1));
    let inner = body.inner(chunks[1]);
    f.render_widget(body, chunks[1]);

    let body_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Transcript
            Constraint::Length(1), // Input line
        ])
        .split(inner);

    render_transcript(f, app, body_chunks[0]);
    render_input(f, app, body_chunks[1]);
}

fn render_title_bar(f: &mut Frame, app: &App, area: Rect) {
    let bar = Style::default().bg(Color::DarkGray);
    let lights = Line::from(vec![
        Span::raw(" "),
        Span::styled("●", Style::default().fg(Color::Red)),
        Span::raw(" "),
        Span::styled("●", Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled("●", Style::default().fg(Color::Green)),
    ]);
    f.render_widget(Paragraph::new(lights).style(bar), area);

    let title = Paragraph::new(Span::styled(
        app.title.as_str(),
        Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    f.render_widget(title, area);
}

fn message_lines(msg: &Message) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    match msg.role {
        Role::User => {
            for (i, text) in msg.content.lines().enumerate() {
                let marker = if i == 0 { "> " } else { "  " };
                lines.push(Line::from(vec![
                    Span::styled(marker, Style::default().fg(Color::Green)),
                    Span::raw(text),
                ]));
            }
        }
        // The preamble is never part of the transcript, so only replies land here.
        Role::Assistant | Role::System => {
            lines.extend(msg.content.lines().map(Line::from));
        }
    }
    lines.push(Line::default());
    lines
}

fn render_transcript(f: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line<'_>> = app
        .session
        .transcript()
        .iter()
        .flat_map(message_lines)
        .collect();

    if app.session.is_awaiting_reply() {
        lines.push(Line::from(Span::styled(
            "...",
            Style::default().add_modifier(Modifier::SLOW_BLINK),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: false });

    // Keep the newest message in view.
    let total = paragraph.line_count(area.width);
    let scroll = total.saturating_sub(area.height as usize);
    let scroll = u16::try_from(scroll).unwrap_or(u16::MAX);

    f.render_widget(paragraph.scroll((scroll, 0)), area);
}

fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let input = app.session.input();
    let prompt = Span::raw(format!("{} ", app.prompt));
    let prompt_width = prompt.width();

    let entry = if input.is_empty() {
        Span::styled(app.placeholder.text(), Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(input, Style::default().fg(Color::White))
    };

    // Scroll sideways so the cursor cell after the draft stays inside the pane.
    let typed_width = if input.is_empty() { 0 } else { entry.width() };
    let cursor = prompt_width + typed_width;
    let offset = (cursor + 1).saturating_sub(area.width as usize);
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);

    let line = Paragraph::new(Line::from(vec![prompt, entry])).scroll((0, offset));
    f.render_widget(line, area);

    let column = u16::try_from(cursor)
        .unwrap_or(u16::MAX)
        .saturating_sub(offset);
    let x = area.x.saturating_add(column);
    f.set_cursor_position(Position::new(x.min(area.right().saturating_sub(1)), area.y));
}
