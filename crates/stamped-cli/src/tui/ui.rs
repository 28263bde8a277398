//! UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use stamped_core::{Content, Grid, SaveStatus, Session};

use super::app::{App, View};
use crate::output::human_size;

/// Width of one grid column on screen
const CELL_WIDTH: u16 = 24;

/// Width of the row number gutter
const GUTTER_WIDTH: u16 = 5;

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App) {
    // Create vertical layout for status bar at the bottom
    let outer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    match &app.view {
        View::Landing => draw_landing(frame, app, outer_chunks[0]),
        View::Document(session) => draw_document(frame, session, outer_chunks[0]),
    }

    draw_status_bar(frame, app, outer_chunks[1]);

    if app.show_help {
        draw_help_overlay(frame, app);
    }

    if let Some(error) = &app.error {
        draw_error_popup(frame, error);
    }
}

// ==================== Landing view ====================

fn draw_landing(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(3)])
        .split(area);

    let intro = vec![
        Line::from(Span::styled(
            "STAMPED",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Easily create timestamped notes.",
            Style::default().add_modifier(Modifier::DIM),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "How it works",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  1. Start the timer (Ctrl+T)"),
        Line::from("  2. Type your notes"),
        Line::from(format!(
            "  3. Every '{}' adds the elapsed time, like [00:01:23]",
            app.terminator()
        )),
        Line::from("  4. Download them as stamped.csv (Ctrl+E)"),
    ];

    let intro_block = Block::default().borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(intro)
            .block(intro_block)
            .wrap(Wrap { trim: false }),
        chunks[0],
    );

    let block = Block::default()
        .title(" Documents ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    if app.documents.is_empty() {
        let empty = Paragraph::new("No documents yet. Press n to start one.")
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(empty, chunks[1]);
        return;
    }

    let items: Vec<ListItem> = app
        .documents
        .iter()
        .map(|doc| {
            let modified = doc
                .modified
                .map(|m| {
                    m.with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M")
                        .to_string()
                })
                .unwrap_or_else(|| "-".to_string());

            ListItem::new(Line::from(vec![
                Span::raw(doc.id.to_string()),
                Span::styled(
                    format!("  {}  {}", modified, human_size(doc.size)),
                    Style::default().add_modifier(Modifier::DIM),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    state.select(Some(app.doc_index));

    frame.render_stateful_widget(list, chunks[1], &mut state);
}

// ==================== Document view ====================

fn draw_document(frame: &mut Frame, session: &Session, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    draw_controls(frame, session, chunks[0]);

    match &session.snapshot().content {
        Content::Grid(grid) => draw_grid(frame, session, grid, chunks[1]),
        Content::Text(_) => draw_text(frame, session, chunks[1]),
    }
}

/// Timer, reset, save and download controls
fn draw_controls(frame: &mut Frame, session: &Session, area: Rect) {
    let key_style = Style::default().add_modifier(Modifier::DIM);

    let timer_style = if session.stopwatch().is_running() {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let save_style = match session.save_status() {
        SaveStatus::Idle => Style::default(),
        SaveStatus::Saved { .. } => Style::default().fg(Color::Green),
        SaveStatus::Failed(_) => Style::default().fg(Color::Red),
    };

    let line = Line::from(vec![
        Span::styled(format!("⏱ {}", session.stopwatch().label()), timer_style),
        Span::styled(" ^T", key_style),
        Span::raw("   Reset Timer"),
        Span::styled(" ^R", key_style),
        Span::raw("   "),
        Span::styled(session.save_status().label(), save_style),
        Span::styled(" ^S", key_style),
        Span::raw("   Download"),
        Span::styled(" ^E", key_style),
        Span::raw("   Home"),
        Span::styled(" Esc", key_style),
    ]);

    let block = Block::default()
        .title(" Stamped ")
        .borders(Borders::ALL);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_grid(frame: &mut Frame, session: &Session, grid: &Grid, area: Rect) {
    let (row, column) = session.position();

    let block = Block::default()
        .title(format!(" {}{} ", column_label(column), row + 1))
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width <= GUTTER_WIDTH || inner.height < 2 {
        return;
    }

    let cell_width = CELL_WIDTH.min(inner.width - GUTTER_WIDTH - 1) as usize;
    let visible_columns = ((inner.width - GUTTER_WIDTH) as usize / (cell_width + 1)).max(1);
    let visible_rows = (inner.height - 1) as usize;

    let first_row = window_start(row, visible_rows);
    let first_column = window_start(column, visible_columns);
    let last_row = (first_row + visible_rows).min(grid.row_count());
    let last_column = (first_column + visible_columns).min(grid.column_count());

    let header_style = Style::default().add_modifier(Modifier::DIM);
    let mut header = vec![Span::raw(" ".repeat(GUTTER_WIDTH as usize))];
    for c in first_column..last_column {
        header.push(Span::styled(
            format!(" {:<width$}", column_label(c), width = cell_width),
            header_style,
        ));
    }

    let mut lines = vec![Line::from(header)];
    let mut caret = None;

    for r in first_row..last_row {
        let mut spans = vec![Span::styled(
            format!("{:>width$}", r + 1, width = GUTTER_WIDTH as usize),
            header_style,
        )];

        for c in first_column..last_column {
            let (text, style) = if (r, c) == (row, column) {
                let buffer = session.buffer();
                let (visible, caret_column) =
                    visible_window(buffer.text(), buffer.cursor(), cell_width);
                caret = Some((c - first_column, r - first_row, caret_column));
                (visible, Style::default().add_modifier(Modifier::REVERSED))
            } else {
                let text = grid.cell(r, c).unwrap_or_default();
                (text.chars().take(cell_width).collect(), Style::default())
            };

            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                format!("{:<width$}", text, width = cell_width),
                style,
            ));
        }

        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);

    if let Some((col_offset, row_offset, caret_column)) = caret {
        let x = inner.x
            + GUTTER_WIDTH
            + 1
            + (col_offset * (cell_width + 1)) as u16
            + caret_column as u16;
        let y = inner.y + 1 + row_offset as u16;
        frame.set_cursor_position((x.min(inner.right().saturating_sub(1)), y));
    }
}

fn draw_text(frame: &mut Frame, session: &Session, area: Rect) {
    let block = Block::default()
        .title(" Notes ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let buffer = session.buffer();
    let (caret_line, caret_column) = line_and_column(buffer.text(), buffer.cursor());
    let first_line = window_start(caret_line, inner.height as usize);
    let width = inner.width as usize;

    let lines: Vec<Line> = buffer
        .text()
        .split('\n')
        .enumerate()
        .skip(first_line)
        .take(inner.height as usize)
        .map(|(i, line)| {
            if i == caret_line {
                Line::from(visible_window(line, caret_column, width).0)
            } else {
                Line::from(line.chars().take(width).collect::<String>())
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);

    let (_, x) = visible_window(
        buffer.text().split('\n').nth(caret_line).unwrap_or_default(),
        caret_column,
        width,
    );
    frame.set_cursor_position((
        inner.x + x as u16,
        inner.y + (caret_line - first_line) as u16,
    ));
}

// ==================== Chrome ====================

/// Draw the status bar at the bottom
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let content = if let Some(msg) = &app.status_message {
        msg.clone()
    } else {
        let hints = match app.view {
            View::Landing => "enter:open  n:new  d:del  ?:help  q:quit",
            View::Document(_) => "^T:timer  ^R:reset  ^S:save  ^E:download  esc:home  F1:help  ^Q:quit",
        };
        format!("{}  {}", app.route(), hints)
    };

    let paragraph = Paragraph::new(content).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Rect of the given size centered in the frame
fn centered(frame: &Frame, width: u16, height: u16) -> Rect {
    let area = frame.area();
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

/// Draw help overlay
fn draw_help_overlay(frame: &mut Frame, app: &App) {
    let popup_area = centered(frame, 54, 22);

    // Clear the popup area
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Documents:"),
        Line::from("  j/k, ↑/↓    Move up/down"),
        Line::from("  Enter       Open document"),
        Line::from("  n           New document"),
        Line::from("  d           Delete document"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from("Editing:"),
        Line::from(format!(
            "  {}           Stamp the elapsed time",
            app.terminator()
        )),
        Line::from("  ←/→         Move caret"),
        Line::from("  ↑/↓, Tab    Change cell"),
        Line::from("  Ctrl+T      Start/stop timer"),
        Line::from("  Ctrl+R      Reset timer"),
        Line::from("  Ctrl+S      Save"),
        Line::from("  Ctrl+E      Download stamped.csv"),
        Line::from("  Esc         Back to documents"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, popup_area);
}

/// Draw error modal
fn draw_error_popup(frame: &mut Frame, error: &str) {
    let popup_area = centered(frame, 60, 7);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = vec![
        Line::from(error.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        popup_area,
    );
}

// ==================== Layout helpers ====================

/// Spreadsheet-style column name: A..Z, AA, AB, ...
fn column_label(mut index: usize) -> String {
    let mut label = Vec::new();
    loop {
        label.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    label.iter().rev().collect()
}

/// First index to show so that `active` is inside a window of `visible` items
fn window_start(active: usize, visible: usize) -> usize {
    active.saturating_sub(visible.saturating_sub(1))
}

/// Slice of `text` at most `width` chars wide that keeps the caret in view
///
/// Returns the slice and the caret's column within it.
fn visible_window(text: &str, cursor: usize, width: usize) -> (String, usize) {
    if width == 0 {
        return (String::new(), 0);
    }
    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());
    let start = window_start(cursor, width);
    let end = (start + width).min(chars.len());
    (chars[start..end].iter().collect(), cursor - start)
}

/// Line index and column of a char offset
fn line_and_column(text: &str, cursor: usize) -> (usize, usize) {
    let mut line = 0;
    let mut column = 0;
    for c in text.chars().take(cursor) {
        if c == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_label() {
        assert_eq!(column_label(0), "A");
        assert_eq!(column_label(24), "Y");
        assert_eq!(column_label(25), "Z");
        assert_eq!(column_label(26), "AA");
        assert_eq!(column_label(27), "AB");
        assert_eq!(column_label(52), "BA");
    }

    #[test]
    fn test_window_start() {
        assert_eq!(window_start(0, 10), 0);
        assert_eq!(window_start(9, 10), 0);
        assert_eq!(window_start(10, 10), 1);
        assert_eq!(window_start(99, 20), 80);
        assert_eq!(window_start(3, 0), 3);
    }

    #[test]
    fn test_visible_window_short_text() {
        assert_eq!(visible_window("abc", 1, 10), ("abc".to_string(), 1));
        assert_eq!(visible_window("", 0, 10), (String::new(), 0));
    }

    #[test]
    fn test_visible_window_follows_caret() {
        let text = "Hello. [00:00:05] world";
        let (shown, caret) = visible_window(text, text.chars().count(), 10);
        assert_eq!(shown, "05] world");
        assert_eq!(caret, 9);

        let (shown, caret) = visible_window(text, 0, 10);
        assert_eq!(shown, "Hello. [00");
        assert_eq!(caret, 0);
    }

    #[test]
    fn test_line_and_column() {
        assert_eq!(line_and_column("ab\ncd", 0), (0, 0));
        assert_eq!(line_and_column("ab\ncd", 2), (0, 2));
        assert_eq!(line_and_column("ab\ncd", 3), (1, 0));
        assert_eq!(line_and_column("ab\ncd", 5), (1, 2));
    }
}
