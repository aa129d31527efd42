use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{App, MessageKind};

pub fn draw_ui(f: &mut ratatui::Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // Messages
            Constraint::Length(5), // Input
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_messages(f, app, chunks[1]);
    render_input_area(f, app, chunks[2]);

    if app.show_mode_picker {
        render_mode_picker(f, app, f.area());
    }
    if app.show_info {
        render_info_modal(f, app, f.area());
    }
}

fn render_header(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let mode_name = app.mode_name(&app.selected_mode);
    let header = Line::from(vec![
        Span::styled(
            "ragline",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  Mode: "),
        Span::styled(mode_name, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(
            "  (Ctrl+M modes, F1 info, Esc quit)",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(header)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

fn render_messages(f: &mut ratatui::Frame, app: &mut App, area: Rect) {
    if app.messages.is_empty() && !app.loading {
        render_welcome(f, area);
        return;
    }

    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let mut lines = Vec::new();

    for msg in &app.messages {
        let (label, label_style) = match (msg.kind, msg.error) {
            (MessageKind::User, _) => (
                "You",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            (MessageKind::Bot, false) => (
                "Bot",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            (MessageKind::Bot, true) => (
                "Error",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
        };

        lines.push(Line::from(vec![
            Span::styled(format!("[{}] ", msg.timestamp), Style::default().fg(Color::DarkGray)),
            Span::styled(label, label_style),
        ]));

        let content_style = if msg.error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::White)
        };

        for raw_line in sanitize(&msg.text).split('\n') {
            if raw_line.is_empty() {
                lines.push(Line::from(""));
                continue;
            }
            for piece in textwrap::wrap(raw_line, inner_width) {
                lines.push(Line::from(Span::styled(piece.into_owned(), content_style)));
            }
        }

        if let Some(mode) = &msg.mode {
            lines.push(Line::from(Span::styled(
                format!("mode: {}", app.mode_name(mode)),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        lines.push(Line::from("")); // Spacing between messages
    }

    // The three-dot indicator is only shown between submission and the
    // first revealed word.
    if app.loading && !app.typing {
        lines.push(loading_line());
    }

    let inner_height = area.height.saturating_sub(2);
    let total = lines.len() as u16;
    app.max_scroll = total.saturating_sub(inner_height);
    if app.follow {
        app.scroll_offset = app.max_scroll;
    } else {
        app.scroll_offset = app.scroll_offset.min(app.max_scroll);
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Conversation"))
        .scroll((app.scroll_offset, 0));
    f.render_widget(paragraph, area);
}

fn loading_line() -> Line<'static> {
    // Cycle the bright dot on wall-clock time; redraw cadence comes from the
    // event loop's poll interval.
    let phase = (chrono::Local::now().timestamp_millis() / 300) % 3;
    let mut spans = Vec::new();
    for i in 0..3 {
        let style = if i == phase {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled("● ", style));
    }
    Line::from(spans)
}

fn render_welcome(f: &mut ratatui::Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Welcome to ragline",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Type a question below and press Enter to ask the backend."),
        Line::from("Ctrl+M picks a query mode, F1 shows details."),
    ];

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Conversation"))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_input_area(f: &mut ratatui::Frame, app: &mut App, area: Rect) {
    let title = if app.typing {
        "Question (Bot is typing...)"
    } else {
        "Question (Enter to send, Shift+Enter for new line)"
    };

    app.textarea.set_block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(if app.typing {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Green)
            }),
    );

    f.render_widget(&app.textarea, area);
}

fn render_mode_picker(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let popup_area = centered_rect(50, 50, area);
    f.render_widget(Clear, popup_area);

    let mut lines = Vec::new();
    if app.modes.is_empty() {
        lines.push(Line::from(Span::styled(
            "No modes available (backend unreachable at startup?)",
            Style::default().fg(Color::DarkGray),
        )));
    }

    for (i, mode) in app.modes.iter().enumerate() {
        let marker = if mode.id == app.selected_mode { "* " } else { "  " };
        let style = if i == app.mode_cursor {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(Span::styled(
            format!("{}{}", marker, mode.name),
            style,
        )));
        if let Some(desc) = &mode.description {
            lines.push(Line::from(Span::styled(
                format!("    {desc}"),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Query Mode (Up/Down, Enter to select, Esc to close)"),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, popup_area);
}

fn render_info_modal(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    f.render_widget(Clear, popup_area);

    let mut lines = vec![
        Line::from(Span::styled(
            "ragline - RAG backend chat",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Backend: {}", app.backend().base_url())),
        Line::from(""),
        Line::from(Span::styled(
            "Keys:",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from("  Enter - Send question"),
        Line::from("  Shift+Enter - New line in input"),
        Line::from("  Ctrl+M - Choose query mode"),
        Line::from("  PageUp/PageDown - Scroll messages"),
        Line::from("  F1 - This screen"),
        Line::from("  Esc / Ctrl+C - Quit"),
        Line::from(""),
    ];

    if !app.modes.is_empty() {
        lines.push(Line::from(Span::styled(
            "Modes:",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        for mode in &app.modes {
            let desc = mode.description.as_deref().unwrap_or("");
            lines.push(Line::from(format!("  {} - {}", mode.name, desc)));
        }
        lines.push(Line::from(""));
    }

    lines.push(Line::from("Press Esc or F1 to close"));

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Info"))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup_area);
}

// Replace control characters that would corrupt the terminal.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_control() && c != '\n' && c != '\t' {
                '?'
            } else {
                c
            }
        })
        .collect()
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_control_characters() {
        assert_eq!(sanitize("a\x07b"), "a?b");
        assert_eq!(sanitize("line\nnext\ttab"), "line\nnext\ttab");
    }

    #[test]
    fn centered_rect_fits_inside_parent() {
        let parent = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(60, 50, parent);
        assert!(popup.width <= parent.width);
        assert!(popup.height <= parent.height);
        assert!(popup.x >= parent.x && popup.y >= parent.y);
    }
}
