//! Debounced search over `/api/v1/search` feeding the `search-results`
//! container.
//!
//! Every request gets a sequence number. Clearing the container counts as
//! applying that number, and a response is only rendered when no newer
//! request has been applied since, so a slow response can never overwrite
//! the results of a later query.

use crate::api::Api;
use crate::config::Config;
use crate::dom::{self, Node, SharedDocument};
use crate::favorites::FavoritesStore;
use crate::model::{MediaItem, MediaType};
use crate::render::{CardContext, render_card};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub const RESULTS_CONTAINER: &str = "search-results";
pub const CARD_PREFIX: &str = "search";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A newer keystroke arrived during the debounce interval.
    Debounced,
    /// Query too short; results cleared without a request.
    Cleared,
    Rendered(usize),
    /// Response arrived after a newer request had been applied.
    Stale,
    Failed,
}

#[derive(Debug, Default)]
struct SearchState {
    input_generation: u64,
    next_seq: u64,
    applied_seq: u64,
}

#[derive(Clone)]
pub struct SearchController {
    api: Api,
    store: FavoritesStore,
    document: SharedDocument,
    debounce: Duration,
    min_len: usize,
    state: Arc<Mutex<SearchState>>,
}

/// Drop people and entries with no picture at all.
pub fn filter_results(items: Vec<MediaItem>) -> Vec<MediaItem> {
    items
        .into_iter()
        .filter(|item| item.media_type != MediaType::Person && item.image_path().is_some())
        .collect()
}

impl SearchController {
    pub fn new(api: Api, store: FavoritesStore, document: SharedDocument, config: &Config) -> Self {
        Self {
            api,
            store,
            document,
            debounce: config.debounce(),
            min_len: config.min_query_len,
            state: Arc::new(Mutex::new(SearchState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, SearchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle a keystroke: wait out the debounce interval, then search
    /// unless another keystroke superseded this one.
    pub async fn input(&self, raw: &str) -> SearchOutcome {
        let generation = {
            let mut state = self.state();
            state.input_generation += 1;
            state.input_generation
        };

        tokio::time::sleep(self.debounce).await;

        if self.state().input_generation != generation {
            tracing::trace!(query = raw, "Search input superseded");
            return SearchOutcome::Debounced;
        }
        self.run(raw).await
    }

    /// Empty the results now and cancel any keystroke still waiting out
    /// its debounce interval.
    pub fn clear(&self) -> SearchOutcome {
        let seq = {
            let mut state = self.state();
            state.input_generation += 1;
            state.next_seq += 1;
            state.next_seq
        };
        if self.apply(seq, Vec::new()) {
            SearchOutcome::Cleared
        } else {
            SearchOutcome::Stale
        }
    }

    /// Search immediately, bypassing the debounce.
    pub async fn run(&self, raw: &str) -> SearchOutcome {
        let query = raw.trim();
        let seq = {
            let mut state = self.state();
            state.next_seq += 1;
            state.next_seq
        };

        if query.chars().count() < self.min_len {
            return if self.apply(seq, Vec::new()) {
                SearchOutcome::Cleared
            } else {
                SearchOutcome::Stale
            };
        }

        self.apply(seq, Vec::new());
        tracing::debug!(query, seq, "Searching");

        let items = match self.api.search(query).await {
            Ok(items) => filter_results(items),
            Err(e) => {
                tracing::error!(query, error = %e, "Search failed");
                return SearchOutcome::Failed;
            }
        };

        let context = CardContext::search(CARD_PREFIX);
        let cards: Vec<Node> = items
            .iter()
            .map(|item| Node::Card(render_card(item, &context, self.store.is_favorite(item.key()))))
            .collect();
        let count = cards.len();

        if self.apply(seq, cards) {
            tracing::info!(query, count, "Search results rendered");
            SearchOutcome::Rendered(count)
        } else {
            tracing::debug!(query, seq, "Discarding stale search response");
            SearchOutcome::Stale
        }
    }

    /// Replace the results if `seq` is not older than the last applied
    /// request. Both locks are held together so the check and the write
    /// cannot interleave with another response.
    fn apply(&self, seq: u64, cards: Vec<Node>) -> bool {
        let mut state = self.state();
        if seq < state.applied_seq {
            return false;
        }
        state.applied_seq = seq;
        dom::lock(&self.document).replace_children(RESULTS_CONTAINER, cards);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::api::mock::MockBackend;
    use crate::dom::Document;
    use serde_json::json;

    fn controller(backend: Arc<MockBackend>) -> (SearchController, SharedDocument) {
        let document = dom::shared(Document::new(&[RESULTS_CONTAINER]));
        let controller = SearchController::new(
            Api::new(backend),
            FavoritesStore::new(),
            document.clone(),
            &Config::default(),
        );
        (controller, document)
    }

    fn result_ids(document: &SharedDocument) -> Vec<String> {
        dom::lock(document)
            .container(RESULTS_CONTAINER)
            .unwrap()
            .cards()
            .map(|c| c.id.clone())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_issues_no_request() {
        let backend = Arc::new(MockBackend::new());
        let (controller, _) = controller(backend.clone());

        assert_eq!(controller.input("a").await, SearchOutcome::Cleared);
        assert_eq!(controller.input("   x  ").await, SearchOutcome::Cleared);
        assert_eq!(controller.input("").await, SearchOutcome::Cleared);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_keeps_last_keystroke() {
        let backend = Arc::new(MockBackend::new().on(
            Method::Get,
            "/api/v1/search?query=fight",
            json!([{"id": 550, "media_type": "movie", "title": "Fight Club", "poster_path": "/fc.jpg"}]),
        ));
        let (controller, document) = controller(backend.clone());

        let (first, second) = tokio::join!(controller.input("fi"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            controller.input("fight").await
        });

        assert_eq!(first, SearchOutcome::Debounced);
        assert_eq!(second, SearchOutcome::Rendered(1));
        assert_eq!(backend.calls().len(), 1);
        assert_eq!(result_ids(&document), ["search-550"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_response_does_not_overwrite_newer_results() {
        let backend = Arc::new(
            MockBackend::new()
                .on_delayed(
                    Method::Get,
                    "/api/v1/search?query=alpha",
                    json!([{"id": 1, "media_type": "movie", "title": "Alpha", "poster_path": "/a.jpg"}]),
                    Duration::from_millis(200),
                )
                .on(
                    Method::Get,
                    "/api/v1/search?query=beta",
                    json!([{"id": 2, "media_type": "tv", "name": "Beta", "poster_path": "/b.jpg"}]),
                ),
        );
        let (controller, document) = controller(backend);

        let (alpha, beta) = tokio::join!(controller.run("alpha"), controller.run("beta"));

        assert_eq!(beta, SearchOutcome::Rendered(1));
        assert_eq!(alpha, SearchOutcome::Stale);
        assert_eq!(result_ids(&document), ["search-2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_pending_keystroke() {
        let backend = Arc::new(MockBackend::new().on(
            Method::Get,
            "/api/v1/search?query=fight",
            json!([{"id": 550, "media_type": "movie", "title": "Fight Club", "poster_path": "/fc.jpg"}]),
        ));
        let (controller, document) = controller(backend.clone());

        let (typed, cleared) = tokio::join!(controller.input("fight"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            controller.clear()
        });

        assert_eq!(cleared, SearchOutcome::Cleared);
        assert_eq!(typed, SearchOutcome::Debounced);
        assert!(backend.calls().is_empty());
        assert!(result_ids(&document).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_discards_in_flight_response() {
        let backend = Arc::new(MockBackend::new().on_delayed(
            Method::Get,
            "/api/v1/search?query=fight",
            json!([{"id": 550, "media_type": "movie", "title": "Fight Club", "poster_path": "/fc.jpg"}]),
            Duration::from_millis(200),
        ));
        let (controller, document) = controller(backend);

        let (searched, _) = tokio::join!(controller.run("fight"), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            controller.clear()
        });

        assert_eq!(searched, SearchOutcome::Stale);
        assert!(result_ids(&document).is_empty());
    }

    #[tokio::test]
    async fn test_people_and_imageless_results_are_dropped() {
        let backend = Arc::new(MockBackend::new().on(
            Method::Get,
            "/api/v1/search?query=nolan",
            json!([
                {"id": 525, "media_type": "person", "name": "Christopher Nolan", "profile_path": "/cn.jpg"},
                {"id": 27205, "media_type": "movie", "title": "Inception", "poster_path": "/inc.jpg"},
                {"id": 9999, "media_type": "movie", "title": "Obscure", "poster_path": null},
                {"id": 77, "media_type": "tv", "name": "Profiled", "profile_path": "/p.jpg"}
            ]),
        ));
        let (controller, document) = controller(backend);

        assert_eq!(controller.run("nolan").await, SearchOutcome::Rendered(2));
        assert_eq!(result_ids(&document), ["search-27205", "search-77"]);
    }

    #[tokio::test]
    async fn test_failure_leaves_results_cleared() {
        let backend = Arc::new(
            MockBackend::new()
                .on(
                    Method::Get,
                    "/api/v1/search?query=ok",
                    json!([{"id": 3, "media_type": "movie", "title": "Ok", "poster_path": "/ok.jpg"}]),
                )
                .on_fail(Method::Get, "/api/v1/search?query=boom", 502),
        );
        let (controller, document) = controller(backend);

        controller.run("ok").await;
        assert_eq!(result_ids(&document).len(), 1);
        assert_eq!(controller.run("boom").await, SearchOutcome::Failed);
        assert!(result_ids(&document).is_empty());
    }
}
