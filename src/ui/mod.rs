mod detail;
mod favorites;
mod help;
mod home;

use crate::app::{App, View};
use crate::dom::{Card, CardStyle};
use crate::render::{heart_glyph, rating_percent};
use chrono::NaiveDate;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Top-level render dispatch.
pub fn render(app: &App, frame: &mut Frame) {
    match app.view {
        View::Home => home::render(app, frame),
        View::Detail => detail::render(app, frame),
        View::Favorites => favorites::render(app, frame),
    }

    if app.show_help {
        help::render(frame);
    }
}

/// Truncate to `max_width` display columns, adding "…" if truncated.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        used += w;
        result.push(c);
    }
    result.push('…');
    result
}

/// "Oct 15, 1999" for ISO dates, the input unchanged otherwise.
pub fn display_date(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

/// One-line rendition of a card for list views.
pub fn card_line(card: &Card, section: &str, width: usize) -> Line<'static> {
    let item = &card.item;
    let detail = match card.style {
        CardStyle::Listing => format!(
            "{}  ⭐ {}%",
            item.release_or_air_date
                .as_deref()
                .map(display_date)
                .unwrap_or_else(|| "N/A".to_string()),
            rating_percent(item.vote_average)
        ),
        CardStyle::Search => format!("Type: {}", item.media_type),
    };
    let title_width = width.saturating_sub(detail.width() + 28);
    let mut spans = vec![
        Span::raw(format!("{} ", heart_glyph(card.favorite))),
        Span::styled(
            format!("{:<16} ", truncate_str(section, 16)),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            truncate_str(&item.title, title_width),
            Style::default().fg(Color::White),
        ),
        Span::styled(format!("  {}", detail), Style::default().fg(Color::Yellow)),
    ];
    if card.classes.iter().any(|c| c == crate::navigation::HIGHLIGHT_CLASS) {
        spans.push(Span::styled("  ◂ last viewed", Style::default().fg(Color::Magenta)));
    }
    Line::from(spans)
}

/// Status bar hints: `(key, action)` pairs followed by the status message.
pub fn status_line<'a>(hints: &[(&'a str, &'a str)], status: &'a str) -> Line<'a> {
    let mut spans = Vec::new();
    for (key, action) in hints {
        spans.push(Span::styled(
            format!(" {}", key),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {} ", action)));
    }
    spans.push(Span::styled(status, Style::default().fg(Color::DarkGray)));
    Line::from(spans)
}

/// Create a centered rectangle using percentage of parent area.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_columns() {
        assert_eq!(truncate_str("Fight Club", 20), "Fight Club");
        assert_eq!(truncate_str("Fight Club", 6), "Fight…");
        assert_eq!(truncate_str("千と千尋の神隠し", 7), "千と千…");
    }

    #[test]
    fn test_display_date() {
        assert_eq!(display_date("1999-10-15"), "Oct 15, 1999");
        assert_eq!(display_date("2025"), "2025");
    }
}
