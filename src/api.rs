//! REST client for the `/api/v1` routes the page consumes.
//!
//! Requests go through the [`Backend`] seam so components can be driven by a
//! scripted backend in tests; [`HttpBackend`] is the reqwest implementation.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::model::{
    ApiItem, Credits, FavoriteKey, FavoriteRecord, FavoriteResponse, Genre, GenreList, Language,
    MediaItem, MediaType, MovieDetail, Region, TvDetail, Video,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// Which trending list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendingKind {
    Movies,
    Tv,
}

impl TrendingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movies => "movies",
            Self::Tv => "tv",
        }
    }

    pub fn media_type(self) -> MediaType {
        match self {
            Self::Movies => MediaType::Movie,
            Self::Tv => MediaType::Tv,
        }
    }
}

/// Curated movie lists served under `/discover`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverCategory {
    Popular,
    TopRated,
    Upcoming,
    Horror,
    FamilyAnimation,
    Adults,
}

impl DiscoverCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Popular => "popular",
            Self::TopRated => "top_rated",
            Self::Upcoming => "upcoming",
            Self::Horror => "horror",
            Self::FamilyAnimation => "family_animation",
            Self::Adults => "adults",
        }
    }

    /// Only these two honour the filter parameters server-side.
    pub fn supports_filters(self) -> bool {
        matches!(self, Self::Popular | Self::TopRated)
    }
}

/// Discover query parameters. Multi-values are sent pipe-delimited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverFilters {
    pub genres: Vec<u32>,
    pub languages: Vec<String>,
    pub regions: Vec<String>,
    pub year: Option<u16>,
}

impl DiscoverFilters {
    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
            && self.languages.is_empty()
            && self.regions.is_empty()
            && self.year.is_none()
    }

    /// Query pairs, omitting empty parameters.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if !self.genres.is_empty() {
            let genres: Vec<String> = self.genres.iter().map(u32::to_string).collect();
            pairs.push(("with_genres".to_string(), genres.join("|")));
        }
        if !self.languages.is_empty() {
            pairs.push(("language".to_string(), self.languages.join("|")));
        }
        if !self.regions.is_empty() {
            pairs.push(("region".to_string(), self.regions.join("|")));
        }
        if let Some(year) = self.year {
            pairs.push(("year".to_string(), year.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    Trending(TrendingKind),
    Discover(DiscoverCategory, DiscoverFilters),
    Search(String),
    Detail(MediaType, u64),
    Credits(MediaType, u64),
    Videos(u64),
    Genres,
    Languages,
    Regions,
    Favorites,
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Self::Trending(kind) => format!("{}/trending/{}", API_PREFIX, kind.as_str()),
            Self::Discover(category, _) => {
                format!("{}/discover/{}", API_PREFIX, category.as_str())
            }
            Self::Search(_) => format!("{}/search", API_PREFIX),
            Self::Detail(kind, id) => format!("{}/{}/{}", API_PREFIX, kind, id),
            Self::Credits(kind, id) => format!("{}/{}/{}/credits", API_PREFIX, kind, id),
            Self::Videos(id) => format!("{}/movie/{}/videos", API_PREFIX, id),
            Self::Genres => format!("{}/genres", API_PREFIX),
            Self::Languages => format!("{}/languages", API_PREFIX),
            Self::Regions => format!("{}/regions", API_PREFIX),
            Self::Favorites => format!("{}/favorites", API_PREFIX),
        }
    }

    pub fn query(&self) -> Vec<(String, String)> {
        match self {
            Self::Discover(_, filters) => filters.query_pairs(),
            Self::Search(query) => vec![("query".to_string(), query.clone())],
            _ => Vec::new(),
        }
    }

    /// Type assumed for list entries that carry no `media_type`.
    pub fn context_type(&self) -> Option<MediaType> {
        match self {
            Self::Trending(kind) => Some(kind.media_type()),
            Self::Discover(..) => Some(MediaType::Movie),
            _ => None,
        }
    }
}

/// A single call against the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(endpoint: &Endpoint) -> Self {
        Self {
            method: Method::Get,
            path: endpoint.path(),
            query: endpoint.query(),
            body: None,
        }
    }

    pub fn with_body(method: Method, endpoint: &Endpoint, body: Value) -> Self {
        Self {
            method,
            path: endpoint.path(),
            query: endpoint.query(),
            body: Some(body),
        }
    }

    /// Path plus url-encoded query string.
    pub fn target(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish();
        format!("{}?{}", self.path, query)
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Perform the request and return the decoded JSON body.
    async fn execute(&self, request: ApiRequest) -> Result<Value>;
}

/// Backend speaking HTTP to the page's origin.
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let base = Url::parse(&config.api_base_url)?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base,
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn execute(&self, request: ApiRequest) -> Result<Value> {
        let url = self.base.join(&request.target())?;
        tracing::debug!(method = ?request.method, url = %url, "API request");

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(AppError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|source| AppError::Decode {
            endpoint: request.path.clone(),
            source,
        })
    }
}

/// Typed access to the routes.
#[derive(Clone)]
pub struct Api {
    backend: Arc<dyn Backend>,
}

impl Api {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn http(config: &Config) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpBackend::new(config)?)))
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let path = request.path.clone();
        let value = self.backend.execute(request).await?;
        serde_json::from_value(value).map_err(|source| AppError::Decode {
            endpoint: path,
            source,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T> {
        self.call(ApiRequest::get(endpoint)).await
    }

    /// Fetch any list endpoint, decoded in response order.
    pub async fn list(&self, endpoint: &Endpoint) -> Result<Vec<MediaItem>> {
        let raw: Vec<ApiItem> = self.fetch(endpoint).await?;
        let context = endpoint.context_type();
        Ok(raw
            .into_iter()
            .filter_map(|item| MediaItem::from_api(item, context))
            .collect())
    }

    pub async fn search(&self, query: &str) -> Result<Vec<MediaItem>> {
        self.list(&Endpoint::Search(query.to_string())).await
    }

    pub async fn movie(&self, id: u64) -> Result<MovieDetail> {
        self.fetch(&Endpoint::Detail(MediaType::Movie, id)).await
    }

    pub async fn tv(&self, id: u64) -> Result<TvDetail> {
        self.fetch(&Endpoint::Detail(MediaType::Tv, id)).await
    }

    pub async fn credits(&self, media_type: MediaType, id: u64) -> Result<Credits> {
        self.fetch(&Endpoint::Credits(media_type, id)).await
    }

    pub async fn videos(&self, id: u64) -> Result<Vec<Video>> {
        self.fetch(&Endpoint::Videos(id)).await
    }

    pub async fn genres(&self) -> Result<Vec<Genre>> {
        let list: GenreList = self.fetch(&Endpoint::Genres).await?;
        Ok(list.genres)
    }

    pub async fn languages(&self) -> Result<Vec<Language>> {
        self.fetch(&Endpoint::Languages).await
    }

    pub async fn regions(&self) -> Result<Vec<Region>> {
        self.fetch(&Endpoint::Regions).await
    }

    pub async fn favorites(&self) -> Result<Vec<FavoriteRecord>> {
        self.fetch(&Endpoint::Favorites).await
    }

    pub async fn add_favorite(&self, key: FavoriteKey) -> Result<FavoriteResponse> {
        self.change_favorite(Method::Post, key).await
    }

    pub async fn remove_favorite(&self, key: FavoriteKey) -> Result<FavoriteResponse> {
        self.change_favorite(Method::Delete, key).await
    }

    async fn change_favorite(&self, method: Method, key: FavoriteKey) -> Result<FavoriteResponse> {
        let body = serde_json::to_value(FavoriteRecord::from(key))?;
        self.call(ApiRequest::with_body(method, &Endpoint::Favorites, body))
            .await
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockBackend;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(
            Endpoint::Trending(TrendingKind::Movies).path(),
            "/api/v1/trending/movies"
        );
        assert_eq!(
            Endpoint::Discover(DiscoverCategory::FamilyAnimation, DiscoverFilters::default()).path(),
            "/api/v1/discover/family_animation"
        );
        assert_eq!(
            Endpoint::Credits(MediaType::Tv, 1399).path(),
            "/api/v1/tv/1399/credits"
        );
        assert_eq!(Endpoint::Videos(550).path(), "/api/v1/movie/550/videos");
    }

    #[test]
    fn test_discover_filters_are_pipe_joined() {
        let filters = DiscoverFilters {
            genres: vec![28, 12],
            languages: vec!["en".to_string(), "fr".to_string()],
            regions: Vec::new(),
            year: Some(2019),
        };
        let request = ApiRequest::get(&Endpoint::Discover(DiscoverCategory::Popular, filters));
        assert_eq!(
            request.target(),
            "/api/v1/discover/popular?with_genres=28%7C12&language=en%7Cfr&year=2019"
        );
    }

    #[test]
    fn test_search_target_is_encoded() {
        let request = ApiRequest::get(&Endpoint::Search("fight club".to_string()));
        assert_eq!(request.target(), "/api/v1/search?query=fight+club");
        let bare = ApiRequest::get(&Endpoint::Favorites);
        assert_eq!(bare.target(), "/api/v1/favorites");
    }

    #[tokio::test]
    async fn test_list_applies_context_type() {
        let backend = Arc::new(MockBackend::new().on(
            Method::Get,
            "/api/v1/trending/tv",
            json!([
                {"id": 1399, "name": "Game of Thrones", "vote_average": 8.4},
                {"id": 66732, "name": "Stranger Things", "vote_average": 8.6}
            ]),
        ));
        let api = Api::new(backend.clone());

        let items = api.list(&Endpoint::Trending(TrendingKind::Tv)).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.media_type == MediaType::Tv));
        assert_eq!(items[1].title, "Stranger Things");
    }

    #[tokio::test]
    async fn test_change_favorite_sends_record_body() {
        let backend = Arc::new(MockBackend::new().on(
            Method::Post,
            "/api/v1/favorites",
            json!({"success": true, "favorite": {"tmdb_id": 550, "media_type": "movie"}}),
        ));
        let api = Api::new(backend.clone());

        let response = api
            .add_favorite(FavoriteKey::new(MediaType::Movie, 550))
            .await
            .unwrap();
        assert!(response.success);

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].body,
            Some(json!({"tmdb_id": 550, "media_type": "movie"}))
        );
    }

    #[tokio::test]
    async fn test_decode_error_names_endpoint() {
        let backend = Arc::new(MockBackend::new().on(
            Method::Get,
            "/api/v1/genres",
            json!({"genres": "not a list"}),
        ));
        let api = Api::new(backend);

        match api.genres().await {
            Err(AppError::Decode { endpoint, .. }) => assert_eq!(endpoint, "/api/v1/genres"),
            other => panic!("expected decode error, got {:?}", other.map(|g| g.len())),
        }
    }
}
