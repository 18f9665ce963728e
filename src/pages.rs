//! Page-level flows: building each page's document and the actions a user
//! takes on it.

use crate::api::Api;
use crate::config::Config;
use crate::detail::{self, DetailAssembler, DetailReport};
use crate::dom::{self, Document, Node, SharedDocument};
use crate::error::{AppError, Result};
use crate::favorites::FavoritesStore;
use crate::lists::{HOME_SECTIONS, ListFetcher};
use crate::model::{FavoriteKey, MediaItem, MediaType};
use crate::navigation::{NavigationMemory, SessionStorage};
use crate::render::{CardContext, render_card};
use crate::search::{self, SearchController};
use futures_util::future::join_all;

pub const FAVORITES_CONTAINER: &str = "favorites-container";

/// Shared handles every page needs.
#[derive(Clone)]
pub struct PageContext {
    pub api: Api,
    pub store: FavoritesStore,
    pub config: Config,
}

impl PageContext {
    pub fn new(api: Api, config: Config) -> Self {
        Self {
            api,
            store: FavoritesStore::new(),
            config,
        }
    }

    pub fn fetcher(&self) -> ListFetcher {
        ListFetcher::new(self.api.clone(), self.store.clone())
    }

    pub fn assembler(&self) -> DetailAssembler {
        DetailAssembler::new(self.api.clone(), self.store.clone(), self.config.cast_limit)
    }

    pub fn search(&self, document: SharedDocument) -> SearchController {
        SearchController::new(self.api.clone(), self.store.clone(), document, &self.config)
    }
}

pub fn home_document() -> Document {
    let mut ids = vec![search::RESULTS_CONTAINER];
    ids.extend(HOME_SECTIONS.iter().map(|s| s.container_id));
    Document::new(&ids)
}

pub fn favorites_document() -> Document {
    Document::new(&[FAVORITES_CONTAINER])
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomeReport {
    pub loaded: Vec<&'static str>,
    pub failed: Vec<&'static str>,
    pub favorites_loaded: bool,
}

/// Fetch every section and the favorites list together. Each result is
/// written to the document as soon as it arrives; hearts are re-synced when
/// the favorites land.
pub async fn load_home(ctx: &PageContext, document: &SharedDocument) -> HomeReport {
    let fetcher = ctx.fetcher();
    let sections = join_all(HOME_SECTIONS.iter().map(|section| {
        let fetcher = &fetcher;
        async move { (section.container_id, fetcher.load_section(document, section).await) }
    }));
    let favorites = async {
        match ctx.store.load(&ctx.api).await {
            Ok(_) => {
                ctx.store.sync_hearts(&mut dom::lock(document));
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load favorites");
                false
            }
        }
    };

    let (results, favorites_loaded) = tokio::join!(sections, favorites);

    let mut report = HomeReport {
        favorites_loaded,
        ..Default::default()
    };
    for (container, result) in results {
        match result {
            Ok(_) => report.loaded.push(container),
            Err(_) => report.failed.push(container),
        }
    }
    report
}

/// Toggle `key` and reflect the confirmed state on every heart for it.
pub async fn toggle_key(ctx: &PageContext, document: &SharedDocument, key: FavoriteKey) -> Result<bool> {
    let on = ctx.store.toggle(&ctx.api, key).await?;
    dom::lock(document).set_heart(key, on);
    Ok(on)
}

/// Heart click on a card.
pub async fn toggle_card(ctx: &PageContext, document: &SharedDocument, card_id: &str) -> Result<bool> {
    let key = card_key(document, card_id)?;
    toggle_key(ctx, document, key).await
}

fn card_key(document: &SharedDocument, card_id: &str) -> Result<FavoriteKey> {
    dom::lock(document)
        .card(card_id)
        .map(|c| c.key())
        .ok_or_else(|| AppError::UnknownElement(card_id.to_string()))
}

/// Follow a card's link, remembering where the user was.
pub fn click_card(storage: &mut dyn SessionStorage, document: &Document, card_id: &str) -> Result<String> {
    let card = document
        .card(card_id)
        .ok_or_else(|| AppError::UnknownElement(card_id.to_string()))?;
    NavigationMemory::record_click(storage, document.scroll_y(), card_id)?;
    Ok(card.href.clone())
}

/// Fill a detail page for `key`.
pub async fn load_detail(ctx: &PageContext, document: &SharedDocument, key: FavoriteKey) -> Result<DetailReport> {
    let assembler = ctx.assembler();
    match key.media_type {
        MediaType::Movie => Ok(assembler.assemble_movie(document, key.id).await),
        MediaType::Tv => Ok(assembler.assemble_tv(document, key.id).await),
        MediaType::Person => Err(AppError::Configuration(
            "people have no detail page".to_string(),
        )),
    }
}

pub fn detail_document(media_type: MediaType) -> Document {
    match media_type {
        MediaType::Tv => detail::tv_document(),
        _ => detail::movie_document(),
    }
}

fn favorite_prefix(key: FavoriteKey) -> String {
    format!("favorite-{}", key.media_type)
}

pub fn favorite_card_id(key: FavoriteKey) -> String {
    format!("{}-{}", favorite_prefix(key), key.id)
}

/// Look up the title and poster for one favorite. A failed lookup leaves
/// a card titled with the key alone.
async fn favorite_item(api: &Api, key: FavoriteKey) -> MediaItem {
    let mut item = MediaItem {
        id: key.id,
        media_type: key.media_type,
        title: key.to_string(),
        poster_path: None,
        profile_path: None,
        release_or_air_date: None,
        vote_average: 0.0,
    };
    let fetched = match key.media_type {
        MediaType::Movie => api.movie(key.id).await.map(|d| {
            (d.title, d.poster_path, d.release_date, d.vote_average)
        }),
        MediaType::Tv => api.tv(key.id).await.map(|d| {
            (d.name, d.poster_path, d.first_air_date, d.vote_average)
        }),
        MediaType::Person => return item,
    };
    match fetched {
        Ok((title, poster_path, date, vote_average)) => {
            if !title.is_empty() {
                item.title = title;
            }
            item.poster_path = poster_path.filter(|p| !p.is_empty());
            item.release_or_air_date = date.filter(|d| !d.is_empty());
            item.vote_average = vote_average;
        }
        Err(e) => tracing::warn!(%key, error = %e, "Failed to load favorite details"),
    }
    item
}

/// Render every favorite as a card, details fetched concurrently.
pub async fn load_favorites_page(ctx: &PageContext, document: &SharedDocument) -> Result<usize> {
    ctx.store.load(&ctx.api).await?;
    let keys = ctx.store.keys();
    let items = join_all(keys.iter().map(|key| favorite_item(&ctx.api, *key))).await;

    let cards: Vec<Node> = items
        .iter()
        .map(|item| {
            let context = CardContext::listing(&favorite_prefix(item.key()));
            Node::Card(render_card(item, &context, true))
        })
        .collect();
    let count = cards.len();
    dom::lock(document).replace_children(FAVORITES_CONTAINER, cards);
    tracing::info!(count, "Favorites page rendered");
    Ok(count)
}

/// Remove a favorite from the favorites page. The card goes only once the
/// server confirms the deletion.
pub async fn remove_favorite_card(ctx: &PageContext, document: &SharedDocument, card_id: &str) -> Result<()> {
    let key = card_key(document, card_id)?;
    if !ctx.store.is_favorite(key) {
        return Err(AppError::Rejected(format!("{} is not a favorite", key)));
    }
    match ctx.store.toggle(&ctx.api, key).await {
        Ok(false) => {
            dom::lock(document).remove_card(card_id);
            tracing::info!(%key, "Favorite removed");
            Ok(())
        }
        Ok(true) => Err(AppError::Rejected(format!("{} was added instead of removed", key))),
        Err(e) => {
            tracing::error!(%key, error = %e, "Failed to remove favorite");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::api::mock::MockBackend;
    use crate::navigation::MemoryStorage;
    use crate::render::{HEART_ON, card_html};
    use serde_json::json;
    use std::sync::Arc;

    fn context(backend: Arc<MockBackend>) -> PageContext {
        PageContext::new(Api::new(backend), Config::default())
    }

    fn home_backend() -> MockBackend {
        let mut backend = MockBackend::new().on(
            Method::Get,
            "/api/v1/favorites",
            json!([{"tmdb_id": 550, "media_type": "movie"}]),
        );
        for section in HOME_SECTIONS {
            let path = section
                .source
                .endpoint(&Default::default())
                .path();
            backend = backend.on(Method::Get, &path, json!([]));
        }
        backend.on(
            Method::Get,
            "/api/v1/trending/movies",
            json!([
                {"id": 550, "title": "Fight Club", "poster_path": "/fc.jpg", "release_date": "1999-10-15", "vote_average": 8.4},
                {"id": 13, "title": "Forrest Gump", "poster_path": "/fg.jpg", "release_date": "1994-06-23", "vote_average": 8.5}
            ]),
        )
    }

    #[tokio::test]
    async fn test_loaded_favorite_shows_filled_heart() {
        let ctx = context(Arc::new(home_backend()));
        let document = dom::shared(home_document());

        let report = load_home(&ctx, &document).await;
        assert!(report.favorites_loaded);
        assert!(report.failed.is_empty());
        assert_eq!(report.loaded.len(), HOME_SECTIONS.len());

        let doc = dom::lock(&document);
        let card = doc.card("movie-550").unwrap();
        assert!(card.favorite);
        assert!(card_html(card).contains(HEART_ON));
        assert!(!doc.card("movie-13").unwrap().favorite);
    }

    #[tokio::test]
    async fn test_failed_section_does_not_block_others() {
        let backend = home_backend().on_fail(Method::Get, "/api/v1/discover/horror", 500);
        let ctx = context(Arc::new(backend));
        let document = dom::shared(home_document());

        let report = load_home(&ctx, &document).await;
        assert_eq!(report.failed, ["movies-horror"]);
        assert!(dom::lock(&document).card("movie-550").is_some());
    }

    #[tokio::test]
    async fn test_toggle_card_updates_every_heart_for_key() {
        let backend = home_backend()
            .on(
                Method::Get,
                "/api/v1/discover/popular",
                json!([{"id": 13, "title": "Forrest Gump", "poster_path": "/fg.jpg", "vote_average": 8.5}]),
            )
            .on(Method::Post, "/api/v1/favorites", json!({"success": true}));
        let ctx = context(Arc::new(backend));
        let document = dom::shared(home_document());
        load_home(&ctx, &document).await;

        assert!(toggle_card(&ctx, &document, "movie-13").await.unwrap());

        let doc = dom::lock(&document);
        assert!(doc.card("movie-13").unwrap().favorite);
        assert!(doc.card("movie-popular-13").unwrap().favorite);
    }

    #[tokio::test]
    async fn test_toggle_unknown_card() {
        let ctx = context(Arc::new(MockBackend::new()));
        let document = dom::shared(home_document());
        assert!(matches!(
            toggle_card(&ctx, &document, "movie-1").await,
            Err(AppError::UnknownElement(_))
        ));
    }

    #[tokio::test]
    async fn test_click_card_records_navigation() {
        let ctx = context(Arc::new(home_backend()));
        let document = dom::shared(home_document());
        load_home(&ctx, &document).await;

        let mut storage = MemoryStorage::new();
        let href = {
            let mut doc = dom::lock(&document);
            doc.scroll_to(1200);
            click_card(&mut storage, &doc, "movie-550").unwrap()
        };
        assert_eq!(href, "/movie/550");
        let memory = NavigationMemory::read(&storage);
        assert_eq!(memory.scroll_position, Some(1200));
        assert_eq!(memory.clicked_card_id.as_deref(), Some("movie-550"));
    }

    fn favorites_backend() -> MockBackend {
        MockBackend::new()
            .on(
                Method::Get,
                "/api/v1/favorites",
                json!([{"tmdb_id": 550, "media_type": "movie"}, {"tmdb_id": 1399, "media_type": "tv"}]),
            )
            .on(
                Method::Get,
                "/api/v1/movie/550",
                json!({"id": 550, "title": "Fight Club", "poster_path": "/fc.jpg"}),
            )
            .on_fail(Method::Get, "/api/v1/tv/1399", 404)
    }

    #[tokio::test]
    async fn test_favorites_page_fills_details() {
        let ctx = context(Arc::new(favorites_backend()));
        let document = dom::shared(favorites_document());

        assert_eq!(load_favorites_page(&ctx, &document).await.unwrap(), 2);

        let doc = dom::lock(&document);
        let movie = doc.card("favorite-movie-550").unwrap();
        assert_eq!(movie.item.title, "Fight Club");
        assert!(movie.favorite);
        let show = doc.card("favorite-tv-1399").unwrap();
        assert_eq!(show.item.title, "tv:1399");
        assert_eq!(show.item.poster_path, None);
    }

    #[tokio::test]
    async fn test_rejected_delete_keeps_card() {
        let backend = favorites_backend().on(
            Method::Delete,
            "/api/v1/favorites",
            json!({"success": false, "message": "Item not found in favorites."}),
        );
        let ctx = context(Arc::new(backend));
        let document = dom::shared(favorites_document());
        load_favorites_page(&ctx, &document).await.unwrap();

        let result = remove_favorite_card(&ctx, &document, "favorite-movie-550").await;

        assert!(matches!(result, Err(AppError::Rejected(_))));
        assert!(dom::lock(&document).card("favorite-movie-550").is_some());
        assert!(ctx.store.is_favorite(FavoriteKey::new(MediaType::Movie, 550)));
    }

    #[tokio::test]
    async fn test_confirmed_delete_removes_card() {
        let backend = favorites_backend().on(
            Method::Delete,
            "/api/v1/favorites",
            json!({"success": true, "message": "Item removed from favorites."}),
        );
        let ctx = context(Arc::new(backend));
        let document = dom::shared(favorites_document());
        load_favorites_page(&ctx, &document).await.unwrap();

        remove_favorite_card(&ctx, &document, "favorite-movie-550").await.unwrap();

        let doc = dom::lock(&document);
        assert!(doc.card("favorite-movie-550").is_none());
        assert!(doc.card("favorite-tv-1399").is_some());
    }
}
