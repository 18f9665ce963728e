//! Turns API payloads into document nodes and nodes into HTML fragments.

use crate::dom::{
    Card, CardStyle, CreditCard, Field, Heart, InfoPanel, NetworkBadge, Node, SeasonCard,
};
use crate::model::{Credits, MediaItem, MovieDetail, TvDetail};

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
pub const HEART_ON: &str = "❤️";
pub const HEART_OFF: &str = "🤍";
pub const NO_IMAGE: &str = "<div>No Image</div>";
pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_CAST: &str = "No cast data available.";
pub const CARD_CLASS: &str = "movie-card";

const CARD_LINK_STYLE: &str = "text-decoration: none; color: inherit;";
const PROFILE_PLACEHOLDER: &str = "<div style=\"width:100%;height:0;padding-bottom:100%;background:#ccc;border-radius:50%;\"></div>";

/// Width variants served by the image CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageWidth {
    W92,
    W185,
    W500,
}

impl ImageWidth {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::W92 => "w92",
            Self::W185 => "w185",
            Self::W500 => "w500",
        }
    }
}

pub fn image_url(width: ImageWidth, path: &str) -> String {
    format!("{}/{}{}", IMAGE_BASE, width.as_str(), path)
}

fn optional_image(width: ImageWidth, path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty()).map(|p| image_url(width, p))
}

/// `round(vote_average * 10)`, kept within 0..=100.
pub fn rating_percent(vote_average: f64) -> u32 {
    if !vote_average.is_finite() {
        return 0;
    }
    (vote_average * 10.0).round().clamp(0.0, 100.0) as u32
}

pub fn heart_glyph(on: bool) -> &'static str {
    if on { HEART_ON } else { HEART_OFF }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Whole US dollars with thousands separators: `$63,000,000`.
pub fn format_usd(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn trailer_embed_url(key: &str) -> String {
    format!("https://www.youtube.com/embed/{}?autoplay=1", key)
}

/// Where a card sits on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardContext {
    pub id_prefix: String,
    pub style: CardStyle,
}

impl CardContext {
    pub fn listing(id_prefix: &str) -> Self {
        Self {
            id_prefix: id_prefix.to_string(),
            style: CardStyle::Listing,
        }
    }

    pub fn search(id_prefix: &str) -> Self {
        Self {
            id_prefix: id_prefix.to_string(),
            style: CardStyle::Search,
        }
    }
}

pub fn render_card(item: &MediaItem, context: &CardContext, favorite: bool) -> Card {
    Card {
        id: format!("{}-{}", context.id_prefix, item.id),
        item: item.clone(),
        href: item
            .media_type
            .detail_route(item.id)
            .unwrap_or_else(|| "#".to_string()),
        favorite,
        classes: vec![CARD_CLASS.to_string()],
        style: context.style,
    }
}

fn poster_html(url: Option<&str>, alt: &str, extra: &str) -> String {
    match url {
        Some(src) => format!(
            "<img src=\"{}\" alt=\"{}\"{}>",
            escape_html(src),
            escape_html(alt),
            extra
        ),
        None => NO_IMAGE.to_string(),
    }
}

pub fn card_html(card: &Card) -> String {
    let item = &card.item;
    let image = match card.style {
        CardStyle::Listing => item.poster_path.as_deref(),
        CardStyle::Search => item.image_path(),
    };
    let poster = poster_html(
        optional_image(ImageWidth::W500, image).as_deref(),
        &item.title,
        "",
    );
    let caption = match card.style {
        CardStyle::Listing => format!(
            "<p>{}</p>\n<p>⭐ {}%</p>",
            escape_html(item.release_or_air_date.as_deref().unwrap_or(NOT_AVAILABLE)),
            rating_percent(item.vote_average)
        ),
        CardStyle::Search => format!("<p>Type: {}</p>", item.media_type),
    };

    format!(
        "<div class=\"{}\" id=\"{}\" data-id=\"{}\" data-type=\"{}\">\n\
         <span class=\"favorite-heart\">{}</span>\n\
         <a href=\"{}\" style=\"{}\">\n{}\n<h3>{}</h3>\n{}\n</a>\n</div>",
        escape_html(&card.classes.join(" ")),
        escape_html(&card.id),
        item.id,
        item.media_type,
        heart_glyph(card.favorite),
        escape_html(&card.href),
        CARD_LINK_STYLE,
        poster,
        escape_html(&item.title),
        caption
    )
}

fn heart_html(heart: &Heart) -> String {
    format!(
        "<span class=\"favorite-heart\" data-id=\"{}\" data-type=\"{}\">{}</span>",
        heart.key.id,
        heart.key.media_type,
        heart_glyph(heart.on)
    )
}

fn field_html(field: &Field) -> String {
    let value = match &field.href {
        Some(href) => format!(
            "<a href=\"{}\" target=\"_blank\">{}</a>",
            escape_html(href),
            escape_html(&field.value)
        ),
        None => escape_html(&field.value),
    };
    format!("<p><strong>{}:</strong> {}</p>", field.label, value)
}

fn network_html(network: &NetworkBadge) -> String {
    let logo = match &network.logo_url {
        Some(url) => format!(
            "<img src=\"{}\" alt=\"{}\" style=\"height: 20px;\">",
            escape_html(url),
            escape_html(&network.name)
        ),
        None => escape_html(&network.name),
    };
    format!(
        "<div style=\"display: flex; align-items: center; gap: 0.5rem;\">{}<span>{}</span></div>",
        logo,
        escape_html(&network.name)
    )
}

fn season_html(season: &SeasonCard) -> String {
    let poster = match &season.poster_url {
        Some(url) => format!(
            "<img src=\"{}\" alt=\"{}\" class=\"season-poster\">",
            escape_html(url),
            escape_html(&season.name)
        ),
        None => "<div class=\"season-poster-placeholder\"></div>".to_string(),
    };
    format!(
        "<div class=\"season-card\">\n{}\n<div>\n<h4>{}</h4>\n\
         <p><strong>Air Date:</strong> {}</p>\n<p><strong>Episodes:</strong> {}</p>\n<p>{}</p>\n</div>\n</div>",
        poster,
        escape_html(&season.name),
        escape_html(&season.air_date),
        season.episode_count,
        escape_html(&season.overview)
    )
}

fn panel_html(panel: &InfoPanel) -> String {
    let mut out = String::new();
    if let Some(title) = &panel.title {
        out.push_str(&format!("<h2>{}</h2>\n", escape_html(title)));
    }
    out.push_str(&poster_html(
        panel.poster_url.as_deref(),
        &panel.alt,
        " style=\"max-width: 300px; border-radius: 8px;\"",
    ));
    out.push('\n');
    for field in &panel.fields {
        out.push_str(&field_html(field));
        out.push('\n');
    }
    if let Some(networks) = &panel.networks {
        let badges = if networks.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            networks.iter().map(network_html).collect::<String>()
        };
        out.push_str(&format!("<p><strong>Networks:</strong><br/> {}</p>\n", badges));
    }
    if let Some(seasons) = &panel.seasons {
        out.push_str("<hr/>\n<h3>Seasons</h3>\n");
        if seasons.is_empty() {
            out.push_str("<p>No seasons info available.</p>\n");
        }
        for season in seasons {
            out.push_str(&season_html(season));
            out.push('\n');
        }
    }
    out
}

fn credit_html(credit: &CreditCard) -> String {
    let profile = match &credit.profile_url {
        Some(url) => format!(
            "<img src=\"{}\" alt=\"{}\">",
            escape_html(url),
            escape_html(&credit.name)
        ),
        None => PROFILE_PLACEHOLDER.to_string(),
    };
    format!(
        "<div class=\"credit-card\">\n{}\n<strong>{}</strong><br>\n<span>{}</span>\n</div>",
        profile,
        escape_html(&credit.name),
        escape_html(&credit.role)
    )
}

pub fn node_html(node: &Node) -> String {
    match node {
        Node::Card(card) => card_html(card),
        Node::Heart(heart) => heart_html(heart),
        Node::Panel(panel) => panel_html(panel),
        Node::Credit(credit) => credit_html(credit),
        Node::TrailerButton(key) => format!(
            "<button class=\"trailer-button\" data-key=\"{}\" style=\"margin: 1rem 0\">▶ Play Trailer</button>",
            escape_html(key)
        ),
        Node::Text(text) => format!("<p>{}</p>", escape_html(text)),
    }
}

// ── Detail panels ──

fn text_or_na(value: Option<&str>) -> String {
    value
        .filter(|s| !s.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

fn join_or_na<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let joined: Vec<&str> = values.filter(|s| !s.is_empty()).collect();
    if joined.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        joined.join(", ")
    }
}

fn field(label: &'static str, value: String) -> Field {
    Field {
        label,
        value,
        href: None,
    }
}

fn link_field(label: &'static str, text: Option<&str>, href: impl Fn(&str) -> String) -> Field {
    match text.filter(|s| !s.is_empty()) {
        Some(text) => Field {
            label,
            value: text.to_string(),
            href: Some(href(text)),
        },
        None => field(label, NOT_AVAILABLE.to_string()),
    }
}

fn money(amount: Option<u64>) -> String {
    match amount {
        Some(n) if n > 0 => format_usd(n),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn rating_text(vote_average: f64, vote_count: u64) -> String {
    format!("⭐ {}% ({} votes)", rating_percent(vote_average), vote_count)
}

pub fn movie_panel(detail: &MovieDetail) -> InfoPanel {
    InfoPanel {
        title: Some(detail.title.clone()),
        poster_url: optional_image(ImageWidth::W500, detail.poster_path.as_deref()),
        alt: detail.title.clone(),
        fields: vec![
            field("Status", text_or_na(detail.status.as_deref())),
            field("Release Date", text_or_na(detail.release_date.as_deref())),
            field("Genres", join_or_na(detail.genres.iter().map(|g| g.name.as_str()))),
            field("Overview", text_or_na(detail.overview.as_deref())),
            field("Rating", rating_text(detail.vote_average, detail.vote_count)),
            field(
                "Runtime",
                detail
                    .runtime
                    .map(|m| format!("{} minutes", m))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
            field("Budget", money(detail.budget)),
            field("Revenue", money(detail.revenue)),
            link_field("Homepage", detail.homepage.as_deref(), str::to_string),
            link_field("IMDb", detail.imdb_id.as_deref(), |id| {
                format!("https://www.imdb.com/title/{}", id)
            }),
            field("Original Language", text_or_na(detail.original_language.as_deref())),
            field(
                "Spoken Languages",
                join_or_na(detail.spoken_languages.iter().map(|l| l.english_name.as_str())),
            ),
            field(
                "Production Countries",
                join_or_na(detail.production_countries.iter().map(|c| c.name.as_str())),
            ),
        ],
        networks: None,
        seasons: None,
    }
}

pub fn tv_panel(detail: &TvDetail) -> InfoPanel {
    let count = |n: Option<u32>| {
        n.map(|n| n.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };
    InfoPanel {
        title: None,
        poster_url: optional_image(ImageWidth::W500, detail.poster_path.as_deref()),
        alt: detail.name.clone(),
        fields: vec![
            field("Status", text_or_na(detail.status.as_deref())),
            field("First Air Date", text_or_na(detail.first_air_date.as_deref())),
            field("Genres", join_or_na(detail.genres.iter().map(|g| g.name.as_str()))),
            field("Overview", text_or_na(detail.overview.as_deref())),
            field("Seasons", count(detail.number_of_seasons)),
            field("Total Episodes", count(detail.number_of_episodes)),
            field("Rating", rating_text(detail.vote_average, detail.vote_count)),
            field("Original Language", text_or_na(detail.original_language.as_deref())),
            link_field("Homepage", detail.homepage.as_deref(), str::to_string),
            field(
                "Origin Country",
                join_or_na(detail.origin_country.iter().map(String::as_str)),
            ),
        ],
        networks: Some(
            detail
                .networks
                .iter()
                .map(|n| NetworkBadge {
                    name: n.name.clone(),
                    logo_url: optional_image(ImageWidth::W92, n.logo_path.as_deref()),
                })
                .collect(),
        ),
        seasons: Some(
            detail
                .seasons
                .iter()
                .map(|s| SeasonCard {
                    name: s.name.clone(),
                    air_date: text_or_na(s.air_date.as_deref()),
                    episode_count: s.episode_count,
                    overview: s.overview.clone().unwrap_or_default(),
                    poster_url: optional_image(ImageWidth::W185, s.poster_path.as_deref()),
                })
                .collect(),
        ),
    }
}

/// Credit cards for the first `limit` cast members, or the empty-cast note.
pub fn credit_nodes(credits: &Credits, limit: usize) -> Vec<Node> {
    if credits.cast.is_empty() || limit == 0 {
        return vec![Node::Text(NO_CAST.to_string())];
    }
    credits
        .cast
        .iter()
        .take(limit)
        .map(|person| {
            Node::Credit(CreditCard {
                name: person.name.clone(),
                role: person.role().to_string(),
                profile_url: optional_image(ImageWidth::W185, person.profile_path.as_deref()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CastMember, Genre, MediaType, Network};
    use proptest::prelude::*;

    fn movie(poster: Option<&str>) -> MediaItem {
        MediaItem {
            id: 550,
            media_type: MediaType::Movie,
            title: "Fight Club".to_string(),
            poster_path: poster.map(str::to_string),
            profile_path: None,
            release_or_air_date: Some("1999-10-15".to_string()),
            vote_average: 8.438,
        }
    }

    #[test]
    fn test_render_card_binds_identity() {
        let card = render_card(&movie(None), &CardContext::listing("movie-popular"), false);
        assert_eq!(card.id, "movie-popular-550");
        assert_eq!(card.href, "/movie/550");
        assert!(card.has_class(CARD_CLASS));
    }

    #[test]
    fn test_card_html_listing() {
        let card = render_card(
            &movie(Some("/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg")),
            &CardContext::listing("movie"),
            true,
        );
        let html = card_html(&card);
        assert!(html.contains("id=\"movie-550\""));
        assert!(html.contains("data-id=\"550\" data-type=\"movie\""));
        assert!(html.contains(
            "<img src=\"https://image.tmdb.org/t/p/w500/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg\" alt=\"Fight Club\">"
        ));
        assert!(html.contains("<p>⭐ 84%</p>"));
        assert!(html.contains(HEART_ON));
        assert!(html.contains("href=\"/movie/550\""));
    }

    #[test]
    fn test_card_html_search_uses_profile_and_type() {
        let item = MediaItem {
            media_type: MediaType::Tv,
            profile_path: Some("/profile.jpg".to_string()),
            ..movie(None)
        };
        let html = card_html(&render_card(&item, &CardContext::search("search"), false));
        assert!(html.contains("w500/profile.jpg"));
        assert!(html.contains("<p>Type: tv</p>"));
        assert!(!html.contains('⭐'));
    }

    #[test]
    fn test_card_html_escapes_title() {
        let item = MediaItem {
            title: "<script>alert(1)</script>".to_string(),
            ..movie(None)
        };
        let html = card_html(&render_card(&item, &CardContext::listing("movie"), false));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_rating_percent_edges() {
        assert_eq!(rating_percent(0.0), 0);
        assert_eq!(rating_percent(10.0), 100);
        assert_eq!(rating_percent(7.25), 73);
        assert_eq!(rating_percent(-1.0), 0);
        assert_eq!(rating_percent(f64::NAN), 0);
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0), "$0");
        assert_eq!(format_usd(999), "$999");
        assert_eq!(format_usd(1000), "$1,000");
        assert_eq!(format_usd(63_000_000), "$63,000,000");
    }

    #[test]
    fn test_movie_panel_fields() {
        let detail = MovieDetail {
            id: 550,
            title: "Fight Club".to_string(),
            genres: vec![
                Genre { id: 18, name: "Drama".to_string() },
                Genre { id: 53, name: "Thriller".to_string() },
            ],
            budget: Some(63_000_000),
            revenue: Some(0),
            imdb_id: Some("tt0137523".to_string()),
            runtime: Some(139),
            vote_average: 8.4,
            vote_count: 26280,
            ..Default::default()
        };
        let panel = movie_panel(&detail);
        assert_eq!(panel.field("Genres").unwrap().value, "Drama, Thriller");
        assert_eq!(panel.field("Budget").unwrap().value, "$63,000,000");
        assert_eq!(panel.field("Revenue").unwrap().value, NOT_AVAILABLE);
        assert_eq!(panel.field("Runtime").unwrap().value, "139 minutes");
        assert_eq!(panel.field("Rating").unwrap().value, "⭐ 84% (26280 votes)");
        assert_eq!(
            panel.field("IMDb").unwrap().href.as_deref(),
            Some("https://www.imdb.com/title/tt0137523")
        );
        assert_eq!(panel.field("Homepage").unwrap().value, NOT_AVAILABLE);
        assert!(node_html(&Node::Panel(panel)).contains(NO_IMAGE));
    }

    #[test]
    fn test_tv_panel_networks_and_seasons() {
        let detail = TvDetail {
            id: 1399,
            name: "Game of Thrones".to_string(),
            networks: vec![Network {
                name: "HBO".to_string(),
                logo_path: Some("/hbo.png".to_string()),
            }],
            ..Default::default()
        };
        let panel = tv_panel(&detail);
        let html = node_html(&Node::Panel(panel.clone()));
        assert!(panel.title.is_none());
        assert!(html.contains("https://image.tmdb.org/t/p/w92/hbo.png"));
        assert!(html.contains("No seasons info available."));
    }

    #[test]
    fn test_credit_nodes_limit_and_placeholder() {
        let credits = Credits {
            cast: (0..30)
                .map(|i| CastMember {
                    name: format!("Actor {}", i),
                    character: Some(format!("Role {}", i)),
                    ..Default::default()
                })
                .collect(),
        };
        let nodes = credit_nodes(&credits, 20);
        assert_eq!(nodes.len(), 20);
        assert!(node_html(&nodes[0]).contains("padding-bottom:100%"));

        let empty = credit_nodes(&Credits::default(), 20);
        assert_eq!(empty, vec![Node::Text(NO_CAST.to_string())]);
    }

    proptest! {
        #[test]
        fn prop_rating_matches_rounding(vote in 0.0f64..=10.0) {
            let percent = rating_percent(vote);
            prop_assert_eq!(percent, (vote * 10.0).round() as u32);
            prop_assert!(percent <= 100);
        }

        #[test]
        fn prop_missing_poster_renders_placeholder(title in ".*", id in 1u64..10_000_000) {
            let item = MediaItem { id, title, ..movie(None) };
            let html = card_html(&render_card(&item, &CardContext::listing("movie"), false));
            prop_assert!(html.contains(NO_IMAGE));
            prop_assert!(!html.contains("<img"));
        }
    }
}
