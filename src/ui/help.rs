use super::centered_rect;
use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Global",
        &[
            ("?", "Toggle this help"),
            ("q", "Quit application"),
            ("Esc", "Back / cancel"),
        ],
    ),
    (
        "Home",
        &[
            ("↑/k ↓/j", "Navigate cards"),
            ("PgUp/PgDn", "Jump a page"),
            ("Enter", "Open movie or show"),
            ("/", "Search (type at least 2 characters)"),
            ("f", "Add or remove favorite"),
            ("v", "Show favorites"),
            ("r", "Reload lists"),
        ],
    ),
    (
        "Detail",
        &[
            ("↑/↓", "Scroll content"),
            ("Tab", "Switch between Info/Cast"),
            ("f", "Add or remove favorite"),
            ("t", "Play trailer"),
            ("o", "Open trailer in browser"),
        ],
    ),
    (
        "Favorites",
        &[("Enter", "Open detail"), ("d", "Remove from favorites")],
    ),
];

pub fn render(frame: &mut Frame) {
    let area = centered_rect(70, 70, frame.area());

    // Clear the area behind the popup
    frame.render_widget(Clear, area);

    let mut help_text = vec![Line::from("")];
    for (title, keys) in SECTIONS {
        help_text.push(Line::from(Span::styled(
            format!("  {}", title),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        for (key, action) in *keys {
            help_text.push(Line::from(vec![
                Span::styled(format!("    {:<12}", key), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ]));
        }
        help_text.push(Line::from(""));
    }

    let help = Paragraph::new(help_text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help: Keybindings ")
                .title_bottom(Line::from(" Press ? or Esc to close ").style(Style::default().fg(Color::DarkGray))),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(help, area);
}
