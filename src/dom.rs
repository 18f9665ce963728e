//! In-memory page document: containers addressed by element id holding the
//! nodes the renderers produce.

use crate::model::{FavoriteKey, MediaItem};
use crate::render;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Document shared between concurrently completing fetches.
pub type SharedDocument = Arc<Mutex<Document>>;

pub fn shared(document: Document) -> SharedDocument {
    Arc::new(Mutex::new(document))
}

/// Lock a shared document. A panic while holding the lock leaves the
/// document in its last written state, which is still renderable.
pub fn lock(document: &SharedDocument) -> MutexGuard<'_, Document> {
    document.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How a card lays out its caption lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStyle {
    /// Title, date and rating.
    Listing,
    /// Title and media type.
    Search,
}

/// A media card bound to one favorite key.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Element id, `{prefix}-{tmdb id}`.
    pub id: String,
    pub item: MediaItem,
    pub href: String,
    pub favorite: bool,
    pub classes: Vec<String>,
    pub style: CardStyle,
}

impl Card {
    pub fn key(&self) -> FavoriteKey {
        self.item.key()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Standalone favorite toggle on a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heart {
    pub key: FavoriteKey,
    pub on: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkBadge {
    pub name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonCard {
    pub name: String,
    pub air_date: String,
    pub episode_count: u32,
    pub overview: String,
    pub poster_url: Option<String>,
}

/// The static information block of a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoPanel {
    pub title: Option<String>,
    pub poster_url: Option<String>,
    pub alt: String,
    pub fields: Vec<Field>,
    pub networks: Option<Vec<NetworkBadge>>,
    pub seasons: Option<Vec<SeasonCard>>,
}

impl InfoPanel {
    pub fn field(&self, label: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.label == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditCard {
    pub name: String,
    pub role: String,
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Card(Card),
    Heart(Heart),
    Panel(InfoPanel),
    Credit(CreditCard),
    /// Play button for a YouTube trailer key.
    TrailerButton(String),
    /// Paragraph of plain text.
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub id: String,
    pub children: Vec<Node>,
}

impl Container {
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.children.iter().filter_map(|n| match n {
            Node::Card(card) => Some(card),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    containers: Vec<Container>,
    scroll_y: u64,
    /// iframe source of the open trailer modal.
    modal: Option<String>,
}

impl Document {
    pub fn new(container_ids: &[&str]) -> Self {
        Self {
            containers: container_ids
                .iter()
                .map(|id| Container {
                    id: (*id).to_string(),
                    children: Vec::new(),
                })
                .collect(),
            scroll_y: 0,
            modal: None,
        }
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.id == id)
    }

    fn container_mut(&mut self, id: &str) -> Option<&mut Container> {
        self.containers.iter_mut().find(|c| c.id == id)
    }

    /// Replace a container's children. Returns false if the page has no
    /// such container.
    pub fn replace_children(&mut self, id: &str, children: Vec<Node>) -> bool {
        match self.container_mut(id) {
            Some(container) => {
                container.children = children;
                true
            }
            None => {
                tracing::warn!(container = id, "No such container");
                false
            }
        }
    }

    pub fn append(&mut self, id: &str, node: Node) -> bool {
        match self.container_mut(id) {
            Some(container) => {
                container.children.push(node);
                true
            }
            None => {
                tracing::warn!(container = id, "No such container");
                false
            }
        }
    }

    pub fn clear(&mut self, id: &str) -> bool {
        self.replace_children(id, Vec::new())
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.containers.iter().flat_map(Container::cards)
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards().find(|c| c.id == card_id)
    }

    pub fn remove_card(&mut self, card_id: &str) -> Option<Card> {
        for container in &mut self.containers {
            let position = container
                .children
                .iter()
                .position(|n| matches!(n, Node::Card(c) if c.id == card_id));
            if let Some(index) = position {
                if let Node::Card(card) = container.children.remove(index) {
                    return Some(card);
                }
            }
        }
        None
    }

    /// Set the heart of every card and detail toggle bound to `key`.
    pub fn set_heart(&mut self, key: FavoriteKey, on: bool) {
        self.update_hearts(|k| if k == key { Some(on) } else { None });
    }

    /// Recompute every heart from a membership test.
    pub fn sync_hearts(&mut self, is_favorite: impl Fn(FavoriteKey) -> bool) {
        self.update_hearts(|k| Some(is_favorite(k)));
    }

    fn update_hearts(&mut self, state: impl Fn(FavoriteKey) -> Option<bool>) {
        for node in self.containers.iter_mut().flat_map(|c| c.children.iter_mut()) {
            match node {
                Node::Card(card) => {
                    if let Some(on) = state(card.key()) {
                        card.favorite = on;
                    }
                }
                Node::Heart(heart) => {
                    if let Some(on) = state(heart.key) {
                        heart.on = on;
                    }
                }
                _ => {}
            }
        }
    }

    /// Add a class to the element with the given id. Containers and cards
    /// are addressable; only cards carry classes.
    pub fn add_class(&mut self, element_id: &str, class: &str) -> bool {
        for node in self.containers.iter_mut().flat_map(|c| c.children.iter_mut()) {
            if let Node::Card(card) = node {
                if card.id == element_id {
                    if !card.has_class(class) {
                        card.classes.push(class.to_string());
                    }
                    return true;
                }
            }
        }
        false
    }

    /// Strip a class from every card that carries it.
    pub fn remove_class_everywhere(&mut self, class: &str) -> usize {
        let mut removed = 0;
        for node in self.containers.iter_mut().flat_map(|c| c.children.iter_mut()) {
            if let Node::Card(card) = node {
                let before = card.classes.len();
                card.classes.retain(|c| c != class);
                removed += before - card.classes.len();
            }
        }
        removed
    }

    pub fn scroll_to(&mut self, y: u64) {
        self.scroll_y = y;
    }

    pub fn scroll_y(&self) -> u64 {
        self.scroll_y
    }

    pub fn open_modal(&mut self, src: String) {
        self.modal = Some(src);
    }

    /// Closing blanks the frame source, which stops playback.
    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    pub fn modal(&self) -> Option<&str> {
        self.modal.as_deref()
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for container in &self.containers {
            out.push_str(&format!("<div id=\"{}\">\n", render::escape_html(&container.id)));
            for node in &container.children {
                out.push_str(&render::node_html(node));
                out.push('\n');
            }
            out.push_str("</div>\n");
        }
        if let Some(src) = &self.modal {
            out.push_str(&format!(
                "<div id=\"trailer-modal\" style=\"display: flex;\"><iframe id=\"trailer-frame\" src=\"{}\"></iframe></div>\n",
                render::escape_html(src)
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MediaType;

    fn card(id: &str, media_type: MediaType, tmdb_id: u64) -> Node {
        Node::Card(Card {
            id: id.to_string(),
            item: MediaItem {
                id: tmdb_id,
                media_type,
                title: format!("Title {}", tmdb_id),
                poster_path: None,
                profile_path: None,
                release_or_air_date: None,
                vote_average: 7.0,
            },
            href: format!("/{}/{}", media_type, tmdb_id),
            favorite: false,
            classes: vec!["movie-card".to_string()],
            style: CardStyle::Listing,
        })
    }

    #[test]
    fn test_set_heart_touches_every_card_with_key() {
        let mut doc = Document::new(&["movies-container", "movies-popular"]);
        doc.append("movies-container", card("movie-550", MediaType::Movie, 550));
        doc.append("movies-popular", card("movie-popular-550", MediaType::Movie, 550));
        doc.append("movies-popular", card("movie-popular-13", MediaType::Movie, 13));

        doc.set_heart(FavoriteKey::new(MediaType::Movie, 550), true);

        assert!(doc.card("movie-550").unwrap().favorite);
        assert!(doc.card("movie-popular-550").unwrap().favorite);
        assert!(!doc.card("movie-popular-13").unwrap().favorite);
    }

    #[test]
    fn test_same_id_different_type_is_a_different_key() {
        let mut doc = Document::new(&["tv-container"]);
        doc.append("tv-container", card("tv-550", MediaType::Tv, 550));
        doc.set_heart(FavoriteKey::new(MediaType::Movie, 550), true);
        assert!(!doc.card("tv-550").unwrap().favorite);
    }

    #[test]
    fn test_remove_card() {
        let mut doc = Document::new(&["favorites-container"]);
        doc.append("favorites-container", card("favorite-movie-550", MediaType::Movie, 550));
        assert!(doc.remove_card("favorite-movie-550").is_some());
        assert!(doc.remove_card("favorite-movie-550").is_none());
        assert_eq!(doc.cards().count(), 0);
    }

    #[test]
    fn test_add_class_is_idempotent() {
        let mut doc = Document::new(&["movies-container"]);
        doc.append("movies-container", card("movie-550", MediaType::Movie, 550));
        assert!(doc.add_class("movie-550", "highlighted-card"));
        assert!(doc.add_class("movie-550", "highlighted-card"));
        assert!(!doc.add_class("movie-551", "highlighted-card"));
        assert_eq!(doc.card("movie-550").unwrap().classes.len(), 2);
    }

    #[test]
    fn test_unknown_container_is_reported() {
        let mut doc = Document::new(&["movies-container"]);
        assert!(!doc.replace_children("tv-container", Vec::new()));
        assert!(doc.container("tv-container").is_none());
    }
}
