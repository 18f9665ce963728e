use crate::detail::{self, DetailReport};
use crate::dom::{self, Card, SharedDocument};
use crate::lists::section_by_container;
use crate::model::{FavoriteKey, MediaType};
use crate::navigation::{MemoryStorage, NavigationMemory};
use crate::pages::{self, PageContext};
use crate::search::{self, SearchController};

/// Which view is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Detail,
    Favorites,
}

/// Which tab is selected in the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailTab {
    Info,
    Cast,
}

impl DetailTab {
    pub fn next(self) -> Self {
        match self {
            Self::Info => Self::Cast,
            Self::Cast => Self::Info,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Cast => "Cast",
        }
    }

    pub const ALL: [DetailTab; 2] = [Self::Info, Self::Cast];
}

/// Input mode for the search bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// A selectable card and the section it sits in.
#[derive(Debug, Clone)]
pub struct CardRow {
    pub section: &'static str,
    pub card: Card,
}

/// The detail page currently on screen.
pub struct DetailPage {
    pub key: FavoriteKey,
    pub document: SharedDocument,
    pub report: DetailReport,
}

pub const LIST_OVERHEAD: u16 = 9;

/// Main application state.
pub struct App {
    pub ctx: PageContext,
    pub session: MemoryStorage,
    pub should_quit: bool,
    pub view: View,
    /// Where Esc on a detail page goes.
    pub return_to: View,
    pub show_help: bool,

    pub home: SharedDocument,
    pub favorites: SharedDocument,
    pub detail: Option<DetailPage>,
    pub search: SearchController,

    pub query: String,
    pub input_mode: InputMode,

    // List state, shared by home and favorites
    pub selected: usize,
    pub page_size: usize,

    pub detail_tab: DetailTab,
    pub detail_scroll: u16,

    pub status_msg: String,
}

impl App {
    pub fn new(ctx: PageContext) -> Self {
        let home = dom::shared(pages::home_document());
        let search = ctx.search(home.clone());
        Self {
            ctx,
            session: MemoryStorage::new(),
            should_quit: false,
            view: View::Home,
            return_to: View::Home,
            show_help: false,

            home,
            favorites: dom::shared(pages::favorites_document()),
            detail: None,
            search,

            query: String::new(),
            input_mode: InputMode::Normal,

            selected: 0,
            page_size: 20,

            detail_tab: DetailTab::Info,
            detail_scroll: 0,

            status_msg: "Loading...".to_string(),
        }
    }

    /// Initial data load.
    pub async fn init(&mut self) {
        let report = pages::load_home(&self.ctx, &self.home).await;
        self.status_msg = if report.failed.is_empty() {
            format!("{} lists loaded", report.loaded.len())
        } else {
            format!(
                "{} lists loaded, failed: {}",
                report.loaded.len(),
                report.failed.join(", ")
            )
        };
        if !report.favorites_loaded {
            self.status_msg.push_str(" (favorites unavailable)");
        }
    }

    /// Update page size based on terminal height.
    pub fn update_page_size(&mut self, terminal_height: u16) {
        let new_size = terminal_height.saturating_sub(LIST_OVERHEAD) as usize;
        self.page_size = new_size.max(1);
    }

    /// Cards of the active list view in page order.
    pub fn rows(&self) -> Vec<CardRow> {
        let document = match self.view {
            View::Home => &self.home,
            View::Favorites => &self.favorites,
            View::Detail => return Vec::new(),
        };
        let doc = dom::lock(document);
        doc.containers()
            .iter()
            .flat_map(|container| {
                let section = if container.id == search::RESULTS_CONTAINER {
                    "Search"
                } else if container.id == pages::FAVORITES_CONTAINER {
                    "Favorites"
                } else {
                    section_by_container(&container.id).map_or("", |s| s.title)
                };
                container.cards().map(move |card| CardRow {
                    section,
                    card: card.clone(),
                })
            })
            .collect()
    }

    fn selected_card(&self) -> Option<Card> {
        self.rows().into_iter().nth(self.selected).map(|r| r.card)
    }

    fn clamp_selection(&mut self) {
        let len = self.rows().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn list_next(&mut self) {
        if self.selected + 1 < self.rows().len() {
            self.selected += 1;
        }
    }

    pub fn list_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn list_page_down(&mut self) {
        self.selected += self.page_size;
        self.clamp_selection();
    }

    pub fn list_page_up(&mut self) {
        self.selected = self.selected.saturating_sub(self.page_size);
    }

    /// Open the detail page of the selected card, remembering the position
    /// on the home page.
    pub async fn open_selected(&mut self) {
        let Some(card) = self.selected_card() else {
            return;
        };
        if card.item.media_type == MediaType::Person {
            self.status_msg = "People have no detail page".to_string();
            return;
        }
        if self.view == View::Home {
            let mut doc = dom::lock(&self.home);
            doc.scroll_to(self.selected as u64);
            if let Err(e) = pages::click_card(&mut self.session, &doc, &card.id) {
                self.status_msg = e.user_message();
                return;
            }
        }
        self.return_to = self.view;
        self.open_detail(card.key()).await;
    }

    pub async fn open_detail(&mut self, key: FavoriteKey) {
        let document = dom::shared(pages::detail_document(key.media_type));
        match pages::load_detail(&self.ctx, &document, key).await {
            Ok(report) => {
                let failures = report.failures(key.media_type);
                self.status_msg = if failures.is_empty() {
                    format!("Loaded {}", key)
                } else {
                    format!("Could not load {}", failures.join(", "))
                };
                self.detail = Some(DetailPage {
                    key,
                    document,
                    report,
                });
                self.detail_tab = DetailTab::Info;
                self.detail_scroll = 0;
                self.view = View::Detail;
            }
            Err(e) => self.status_msg = e.user_message(),
        }
    }

    /// Leave the detail page the way its back link does.
    pub async fn close_detail(&mut self) {
        self.detail = None;
        self.view = self.return_to;
        match self.view {
            View::Home => {
                if let Err(e) = NavigationMemory::set_restore_to_top(&mut self.session, false) {
                    tracing::warn!(error = %e, "Could not save navigation state");
                }
                let restored = {
                    let mut doc = dom::lock(&self.home);
                    self.ctx.store.sync_hearts(&mut doc);
                    NavigationMemory::restore(&mut self.session, &mut doc)
                };
                match restored {
                    Ok(restored) => {
                        if let Some(y) = restored.scrolled_to {
                            self.selected = y as usize;
                        }
                        self.clamp_selection();
                    }
                    Err(e) => self.status_msg = e.user_message(),
                }
            }
            View::Favorites => self.show_favorites().await,
            View::Detail => {}
        }
    }

    pub async fn show_favorites(&mut self) {
        self.view = View::Favorites;
        self.selected = 0;
        self.status_msg = match pages::load_favorites_page(&self.ctx, &self.favorites).await {
            Ok(count) => format!("{} favorites", count),
            Err(e) => e.user_message(),
        };
    }

    pub fn show_home(&mut self) {
        self.view = View::Home;
        self.selected = 0;
        self.ctx.store.sync_hearts(&mut dom::lock(&self.home));
    }

    /// Heart action for whatever is focused.
    pub async fn toggle_favorite(&mut self) {
        let result = match self.view {
            View::Home => match self.selected_card() {
                Some(card) => pages::toggle_card(&self.ctx, &self.home, &card.id).await,
                None => return,
            },
            View::Favorites => match self.selected_card() {
                Some(card) => pages::remove_favorite_card(&self.ctx, &self.favorites, &card.id)
                    .await
                    .map(|()| false),
                None => return,
            },
            View::Detail => match &self.detail {
                Some(page) => pages::toggle_key(&self.ctx, &page.document, page.key).await,
                None => return,
            },
        };
        match result {
            Ok(true) => self.status_msg = "Added to favorites".to_string(),
            Ok(false) => {
                self.status_msg = "Removed from favorites".to_string();
                self.clamp_selection();
            }
            Err(e) => self.status_msg = e.user_message(),
        }
    }

    /// Debounced search for the current query. Runs in the background so
    /// typing is never blocked; results land in the home document.
    pub fn search_changed(&mut self) {
        let controller = self.search.clone();
        let query = self.query.clone();
        self.selected = 0;
        tokio::spawn(async move {
            controller.input(&query).await;
        });
    }

    pub fn clear_search(&mut self) {
        self.query.clear();
        self.search.clear();
        self.selected = 0;
    }

    pub fn play_trailer(&mut self) {
        let Some(page) = &self.detail else {
            return;
        };
        let mut doc = dom::lock(&page.document);
        if detail::play_trailer(&mut doc) {
            self.status_msg = "Playing trailer (o to open in browser)".to_string();
        } else {
            self.status_msg = "No trailer available".to_string();
        }
    }

    /// Close the trailer modal. Returns false when none was open.
    pub fn close_trailer(&mut self) -> bool {
        let Some(page) = &self.detail else {
            return false;
        };
        let mut doc = dom::lock(&page.document);
        if doc.modal().is_none() {
            return false;
        }
        detail::close_trailer(&mut doc);
        true
    }

    pub fn trailer_url(&self) -> Option<String> {
        self.detail
            .as_ref()
            .and_then(|page| dom::lock(&page.document).modal().map(str::to_string))
    }

    pub fn scroll_down(&mut self) {
        self.detail_scroll = self.detail_scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.detail_scroll = self.detail_scroll.saturating_sub(1);
    }

    pub fn scroll_page_down(&mut self) {
        self.detail_scroll = self.detail_scroll.saturating_add(20);
    }

    pub fn scroll_page_up(&mut self) {
        self.detail_scroll = self.detail_scroll.saturating_sub(20);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockBackend;
    use crate::api::{Api, Method};
    use crate::config::Config;
    use crate::lists::HOME_SECTIONS;
    use crate::navigation::HIGHLIGHT_CLASS;
    use serde_json::json;
    use std::sync::Arc;

    fn backend() -> MockBackend {
        let mut backend = MockBackend::new().on(Method::Get, "/api/v1/favorites", json!([]));
        for section in HOME_SECTIONS {
            let path = section.source.endpoint(&Default::default()).path();
            backend = backend.on(Method::Get, &path, json!([]));
        }
        backend
            .on(
                Method::Get,
                "/api/v1/trending/tv",
                json!([
                    {"id": 1399, "name": "Game of Thrones", "poster_path": "/got.jpg", "vote_average": 8.4},
                    {"id": 66732, "name": "Stranger Things", "poster_path": "/st.jpg", "vote_average": 8.6}
                ]),
            )
            .on(Method::Get, "/api/v1/tv/66732", json!({"id": 66732, "name": "Stranger Things"}))
            .on(Method::Get, "/api/v1/tv/66732/credits", json!({"cast": []}))
            .on(Method::Get, "/api/v1/tv/1399", json!({"id": 1399, "name": "Game of Thrones"}))
            .on(Method::Get, "/api/v1/tv/1399/credits", json!({"cast": []}))
    }

    fn highlighted(app: &App) -> Vec<String> {
        dom::lock(&app.home)
            .cards()
            .filter(|c| c.has_class(HIGHLIGHT_CLASS))
            .map(|c| c.id.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_back_from_detail_restores_position() {
        let ctx = PageContext::new(Api::new(Arc::new(backend())), Config::default());
        let mut app = App::new(ctx);
        app.init().await;

        assert_eq!(app.rows().len(), 2);
        app.list_next();
        app.open_selected().await;
        assert_eq!(app.view, View::Detail);

        app.selected = 0;
        app.close_detail().await;

        assert_eq!(app.view, View::Home);
        assert_eq!(app.selected, 1);
        assert_eq!(highlighted(&app), ["tv-66732"]);

        app.list_prev();
        app.open_selected().await;
        app.close_detail().await;

        assert_eq!(app.selected, 0);
        assert_eq!(highlighted(&app), ["tv-1399"]);
    }

    #[tokio::test]
    async fn test_heart_on_detail_page_reaches_home_cards() {
        let backend = backend().on(Method::Post, "/api/v1/favorites", json!({"success": true}));
        let ctx = PageContext::new(Api::new(Arc::new(backend)), Config::default());
        let mut app = App::new(ctx);
        app.init().await;

        app.list_next();
        app.open_selected().await;
        app.toggle_favorite().await;
        assert_eq!(app.status_msg, "Added to favorites");
        app.close_detail().await;

        let doc = dom::lock(&app.home);
        assert!(doc.card("tv-66732").unwrap().favorite);
        assert!(!doc.card("tv-1399").unwrap().favorite);
    }
}
