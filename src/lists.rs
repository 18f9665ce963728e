use crate::api::{Api, DiscoverCategory, DiscoverFilters, Endpoint, TrendingKind};
use crate::dom::{self, Node, SharedDocument};
use crate::error::Result;
use crate::favorites::FavoritesStore;
use crate::render::{CardContext, render_card};

/// Backend list feeding a home section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSource {
    Trending(TrendingKind),
    Discover(DiscoverCategory),
}

impl ListSource {
    pub fn endpoint(self, filters: &DiscoverFilters) -> Endpoint {
        match self {
            Self::Trending(kind) => Endpoint::Trending(kind),
            Self::Discover(category) => Endpoint::Discover(category, filters.clone()),
        }
    }
}

/// A titled row of cards on the home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub title: &'static str,
    pub source: ListSource,
    pub container_id: &'static str,
    pub card_prefix: &'static str,
}

pub const HOME_SECTIONS: &[Section] = &[
    Section {
        title: "Trending Movies",
        source: ListSource::Trending(TrendingKind::Movies),
        container_id: "movies-container",
        card_prefix: "movie",
    },
    Section {
        title: "Trending TV Shows",
        source: ListSource::Trending(TrendingKind::Tv),
        container_id: "tv-container",
        card_prefix: "tv",
    },
    Section {
        title: "Upcoming",
        source: ListSource::Discover(DiscoverCategory::Upcoming),
        container_id: "movies-upcoming",
        card_prefix: "movie-upcoming",
    },
    Section {
        title: "Popular",
        source: ListSource::Discover(DiscoverCategory::Popular),
        container_id: "movies-popular",
        card_prefix: "movie-popular",
    },
    Section {
        title: "Top Rated",
        source: ListSource::Discover(DiscoverCategory::TopRated),
        container_id: "movies-top-rated",
        card_prefix: "movie-top-rated",
    },
    Section {
        title: "Horror",
        source: ListSource::Discover(DiscoverCategory::Horror),
        container_id: "movies-horror",
        card_prefix: "movie-horror",
    },
    Section {
        title: "Family & Animation",
        source: ListSource::Discover(DiscoverCategory::FamilyAnimation),
        container_id: "movies-family-animation",
        card_prefix: "movie-family-animation",
    },
    Section {
        title: "Adults",
        source: ListSource::Discover(DiscoverCategory::Adults),
        container_id: "movies-adults",
        card_prefix: "movie-adults",
    },
];

pub fn section_for(category: DiscoverCategory) -> Option<&'static Section> {
    HOME_SECTIONS
        .iter()
        .find(|s| s.source == ListSource::Discover(category))
}

pub fn section_by_container(container_id: &str) -> Option<&'static Section> {
    HOME_SECTIONS.iter().find(|s| s.container_id == container_id)
}

/// Fills a container with one card per list entry.
#[derive(Clone)]
pub struct ListFetcher {
    api: Api,
    store: FavoritesStore,
}

impl ListFetcher {
    pub fn new(api: Api, store: FavoritesStore) -> Self {
        Self { api, store }
    }

    /// Replace the section's cards with the endpoint's entries in response
    /// order. On failure the container keeps its previous cards.
    pub async fn fetch_into(
        &self,
        document: &SharedDocument,
        section: &Section,
        endpoint: &Endpoint,
    ) -> Result<usize> {
        let items = self.api.list(endpoint).await.inspect_err(|e| {
            tracing::error!(endpoint = %endpoint.path(), error = %e, "Failed to fetch list");
        })?;

        let context = CardContext::listing(section.card_prefix);
        let cards: Vec<Node> = items
            .iter()
            .map(|item| Node::Card(render_card(item, &context, self.store.is_favorite(item.key()))))
            .collect();
        let count = cards.len();

        dom::lock(document).replace_children(section.container_id, cards);
        tracing::info!(container = section.container_id, count, "List rendered");
        Ok(count)
    }

    /// Unfiltered load of a home section.
    pub async fn load_section(&self, document: &SharedDocument, section: &Section) -> Result<usize> {
        let endpoint = section.source.endpoint(&DiscoverFilters::default());
        self.fetch_into(document, section, &endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::api::mock::MockBackend;
    use crate::dom::Document;
    use crate::model::{FavoriteKey, MediaType};
    use serde_json::json;
    use std::sync::Arc;

    fn home_document() -> SharedDocument {
        let ids: Vec<&str> = HOME_SECTIONS.iter().map(|s| s.container_id).collect();
        dom::shared(Document::new(&ids))
    }

    #[tokio::test]
    async fn test_fetch_into_keeps_response_order() {
        let backend = Arc::new(MockBackend::new().on(
            Method::Get,
            "/api/v1/discover/horror",
            json!([
                {"id": 694, "title": "The Shining", "poster_path": "/shining.jpg", "release_date": "1980-05-23", "vote_average": 8.2},
                {"id": 539, "title": "Psycho", "poster_path": null, "release_date": "1960-06-22", "vote_average": 8.4}
            ]),
        ));
        let store = FavoritesStore::new();
        store.replace_all([FavoriteKey::new(MediaType::Movie, 539)]);
        let fetcher = ListFetcher::new(Api::new(backend), store);
        let doc = home_document();

        let section = section_for(DiscoverCategory::Horror).unwrap();
        assert_eq!(fetcher.load_section(&doc, section).await.unwrap(), 2);

        let doc = dom::lock(&doc);
        let ids: Vec<&str> = doc
            .container("movies-horror")
            .unwrap()
            .cards()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, ["movie-horror-694", "movie-horror-539"]);
        assert!(!doc.card("movie-horror-694").unwrap().favorite);
        assert!(doc.card("movie-horror-539").unwrap().favorite);
    }

    #[tokio::test]
    async fn test_failure_leaves_container_untouched() {
        let backend = Arc::new(MockBackend::new().on(
            Method::Get,
            "/api/v1/trending/movies",
            json!([{"id": 550, "title": "Fight Club", "vote_average": 8.4}]),
        ));
        let fetcher = ListFetcher::new(Api::new(backend), FavoritesStore::new());
        let doc = home_document();
        let section = &HOME_SECTIONS[0];

        fetcher.load_section(&doc, section).await.unwrap();
        let failing = ListFetcher::new(
            Api::new(Arc::new(MockBackend::new().on_fail(Method::Get, "/api/v1/trending/movies", 500))),
            FavoritesStore::new(),
        );
        assert!(failing.load_section(&doc, section).await.is_err());

        let doc = dom::lock(&doc);
        assert!(doc.card("movie-550").is_some());
    }

    #[test]
    fn test_sections_are_unique() {
        for (i, a) in HOME_SECTIONS.iter().enumerate() {
            for b in &HOME_SECTIONS[i + 1..] {
                assert_ne!(a.container_id, b.container_id);
                assert_ne!(a.card_prefix, b.card_prefix);
            }
        }
        assert_eq!(
            section_by_container("movies-top-rated").unwrap().source,
            ListSource::Discover(DiscoverCategory::TopRated)
        );
    }
}
