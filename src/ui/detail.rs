use super::{centered_rect, display_date, status_line};
use crate::app::{App, DetailTab};
use crate::detail::{HEART, MOVIE_CREDITS, MOVIE_INFO, TRAILER, TV_CREDITS, TV_INFO, TV_TITLE};
use crate::dom::{self, Document, InfoPanel, Node};
use crate::model::MediaType;
use crate::render::heart_glyph;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
};

fn children<'a>(doc: &'a Document, id: &str) -> &'a [Node] {
    doc.container(id).map(|c| c.children.as_slice()).unwrap_or(&[])
}

fn panel<'a>(doc: &'a Document, id: &str) -> Option<&'a InfoPanel> {
    children(doc, id).iter().find_map(|n| match n {
        Node::Panel(p) => Some(p),
        _ => None,
    })
}

fn info_lines(panel: &InfoPanel, has_trailer: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for field in &panel.fields {
        let value = if field.label.ends_with("Date") {
            display_date(&field.value)
        } else {
            field.value.clone()
        };
        let value_style = if field.href.is_some() {
            Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {}: ", field.label), Style::default().fg(Color::DarkGray)),
            Span::styled(field.href.clone().unwrap_or(value), value_style),
        ]));
    }
    if let Some(networks) = &panel.networks {
        let names: Vec<&str> = networks.iter().map(|n| n.name.as_str()).collect();
        lines.push(Line::from(vec![
            Span::styled(" Networks: ", Style::default().fg(Color::DarkGray)),
            Span::raw(if names.is_empty() { "N/A".to_string() } else { names.join(", ") }),
        ]));
    }
    if let Some(seasons) = &panel.seasons {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            " Seasons",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        if seasons.is_empty() {
            lines.push(Line::from(" No seasons info available."));
        }
        for season in seasons {
            lines.push(Line::from(vec![
                Span::styled(format!("  {}", season.name), Style::default().fg(Color::White)),
                Span::styled(
                    format!("  {}  {} episodes", display_date(&season.air_date), season.episode_count),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }
    }
    if has_trailer {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            " ▶ Trailer available (t to play)",
            Style::default().fg(Color::Green),
        )));
    }
    lines
}

fn cast_lines(nodes: &[Node]) -> Vec<Line<'static>> {
    nodes
        .iter()
        .filter_map(|node| match node {
            Node::Credit(credit) => Some(Line::from(vec![
                Span::styled(format!(" {:<28}", credit.name), Style::default().fg(Color::White)),
                Span::styled(credit.role.clone(), Style::default().fg(Color::DarkGray)),
            ])),
            Node::Text(text) => Some(Line::from(format!(" {}", text))),
            _ => None,
        })
        .collect()
}

pub fn render(app: &App, frame: &mut Frame) {
    let area = frame.area();
    let page = match &app.detail {
        Some(p) => p,
        None => return,
    };
    let doc = dom::lock(&page.document);
    let is_movie = page.key.media_type == MediaType::Movie;
    let (info_id, credits_id) = if is_movie {
        (MOVIE_INFO, MOVIE_CREDITS)
    } else {
        (TV_INFO, TV_CREDITS)
    };

    // Layout: header(3) + tabs(3) + content(min) + status(1)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    // ── Title and heart ──
    let title = if is_movie {
        panel(&doc, MOVIE_INFO).and_then(|p| p.title.clone())
    } else {
        children(&doc, TV_TITLE).iter().find_map(|n| match n {
            Node::Text(t) => Some(t.clone()),
            _ => None,
        })
    };
    let title = title.unwrap_or_else(|| page.key.to_string());
    let heart = children(&doc, HEART).iter().find_map(|n| match n {
        Node::Heart(h) => Some(heart_glyph(h.on)),
        _ => None,
    });

    let mut header_spans = vec![Span::styled(
        format!(" {} ", title),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];
    if let Some(glyph) = heart {
        header_spans.push(Span::raw(glyph));
    }
    let header = Paragraph::new(Line::from(header_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(if is_movie { " Movie " } else { " TV Show " }),
    );
    frame.render_widget(header, chunks[0]);

    // ── Tab strip ──
    let tab_titles: Vec<Line> = DetailTab::ALL
        .iter()
        .map(|t| {
            let style = if *t == app.detail_tab {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Line::from(Span::styled(t.label(), style))
        })
        .collect();
    let tab_index = DetailTab::ALL
        .iter()
        .position(|t| *t == app.detail_tab)
        .unwrap_or(0);
    let tabs = Tabs::new(tab_titles).select(tab_index).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" [Tab] "),
    );
    frame.render_widget(tabs, chunks[1]);

    // ── Content ──
    let has_trailer = children(&doc, TRAILER)
        .iter()
        .any(|n| matches!(n, Node::TrailerButton(_)));
    let lines = match app.detail_tab {
        DetailTab::Info => match panel(&doc, info_id) {
            Some(p) => info_lines(p, has_trailer),
            None => vec![Line::from(" Details unavailable.")],
        },
        DetailTab::Cast => {
            let lines = cast_lines(children(&doc, credits_id));
            if lines.is_empty() {
                vec![Line::from(" Cast unavailable.")]
            } else {
                lines
            }
        }
    };
    let content = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" {} ", app.detail_tab.label()))
                .title_bottom(
                    Line::from(format!(" scroll: {} ", app.detail_scroll)).alignment(Alignment::Right),
                ),
        );
    frame.render_widget(content, chunks[2]);

    // ── Status bar ──
    let mut hints = vec![("↑↓", "Scroll"), ("Tab", "Switch"), ("f", "Favorite")];
    if has_trailer {
        hints.push(("t", "Trailer"));
    }
    hints.push(("Esc", "Back"));
    frame.render_widget(Paragraph::new(status_line(&hints, &app.status_msg)), chunks[3]);

    // ── Trailer modal ──
    if let Some(src) = doc.modal() {
        let popup = centered_rect(60, 20, area);
        frame.render_widget(Clear, popup);
        let modal = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(format!(" {}", src), Style::default().fg(Color::Blue))),
        ])
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" ▶ Trailer ")
                .title_bottom(
                    Line::from(" o open in browser · Esc close ").style(Style::default().fg(Color::DarkGray)),
                ),
        );
        frame.render_widget(modal, popup);
    }
}
