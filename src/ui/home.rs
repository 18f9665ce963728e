use super::{card_line, status_line};
use crate::app::{App, InputMode};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use unicode_width::UnicodeWidthStr;

pub fn render(app: &App, frame: &mut Frame) {
    let area = frame.area();

    // Layout: header(3) + search(3) + list(min) + status(1)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    let rows = app.rows();

    // ── Header ──
    let header_text = format!(
        " Movie Explorer   [{} titles, {} favorites]",
        rows.len(),
        app.ctx.store.len()
    );
    let header = Paragraph::new(header_text)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(header, chunks[0]);

    // ── Search bar ──
    let search_style = match app.input_mode {
        InputMode::Editing => Style::default().fg(Color::Yellow),
        InputMode::Normal => Style::default().fg(Color::DarkGray),
    };
    let search_label = if app.input_mode == InputMode::Editing {
        " 🔍 Search movies, shows (Enter/Esc to finish): "
    } else {
        " 🔍 Search (/): "
    };
    let search_bar = Paragraph::new(format!("{}{}", search_label, app.query))
        .style(search_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(search_style)
                .title(" Search "),
        );
    frame.render_widget(search_bar, chunks[1]);

    if app.input_mode == InputMode::Editing {
        let cursor_x = chunks[1].x + search_label.width() as u16 + app.query.width() as u16;
        let cursor_y = chunks[1].y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    // ── Cards ──
    let width = area.width as usize;
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| ListItem::new(card_line(&row.card, row.section, width)))
        .collect();

    let position = format!(
        " {} of {} ",
        if rows.is_empty() { 0 } else { app.selected + 1 },
        rows.len()
    );
    let list_widget = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Discover ")
                .title_bottom(Line::from(position).alignment(Alignment::Right)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    let mut list_state = ListState::default();
    list_state.select(Some(app.selected));
    frame.render_stateful_widget(list_widget, chunks[2], &mut list_state);

    // ── Status bar ──
    let status = status_line(
        &[
            ("↑↓", "Navigate"),
            ("/", "Search"),
            ("Enter", "Detail"),
            ("f", "Favorite"),
            ("v", "Favorites"),
            ("?", "Help"),
            ("q", "Quit"),
        ],
        &app.status_msg,
    );
    frame.render_widget(Paragraph::new(status), chunks[3]);
}
