use super::{card_line, status_line};
use crate::app::App;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

pub fn render(app: &App, frame: &mut Frame) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    let rows = app.rows();

    let header = Paragraph::new(" My Favorites")
        .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(header, chunks[0]);

    let width = area.width as usize;
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| ListItem::new(card_line(&row.card, &row.card.item.media_type.to_string(), width)))
        .collect();

    let list_widget = if items.is_empty() {
        List::new(vec![ListItem::new(" Nothing saved yet. Press f on any title to add it.")])
    } else {
        List::new(items)
    }
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Favorites ")
            .title_bottom(Line::from(format!(" {} saved ", rows.len())).alignment(Alignment::Right)),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▸ ");

    let mut list_state = ListState::default();
    if !rows.is_empty() {
        list_state.select(Some(app.selected));
    }
    frame.render_stateful_widget(list_widget, chunks[1], &mut list_state);

    let status = status_line(
        &[
            ("↑↓", "Navigate"),
            ("Enter", "Detail"),
            ("d", "Remove"),
            ("Esc", "Home"),
        ],
        &app.status_msg,
    );
    frame.render_widget(Paragraph::new(status), chunks[2]);
}
