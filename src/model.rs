use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of entity the catalogue serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
    Person,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::Person => "person",
        }
    }

    /// Route of the detail page, if the type has one.
    pub fn detail_route(self, id: u64) -> Option<String> {
        match self {
            Self::Movie => Some(format!("/movie/{}", id)),
            Self::Tv => Some(format!("/tv/{}", id)),
            Self::Person => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Self::Movie),
            "tv" => Ok(Self::Tv),
            "person" => Ok(Self::Person),
            other => Err(format!("unknown media type: {}", other)),
        }
    }
}

/// A list entry as the page shows it. Read-only once decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub profile_path: Option<String>,
    pub release_or_air_date: Option<String>,
    pub vote_average: f64,
}

impl MediaItem {
    pub fn key(&self) -> FavoriteKey {
        FavoriteKey::new(self.media_type, self.id)
    }

    /// Poster first, then profile picture (people).
    pub fn image_path(&self) -> Option<&str> {
        self.poster_path.as_deref().or(self.profile_path.as_deref())
    }

    /// Build from a raw API entry. `context` supplies the type for lists
    /// that do not tag their entries (trending, discover).
    pub fn from_api(raw: ApiItem, context: Option<MediaType>) -> Option<Self> {
        let media_type = match raw.media_type.as_deref() {
            Some(s) => s.parse().ok()?,
            None => context?,
        };
        Some(Self {
            id: raw.id,
            media_type,
            title: raw.title.or(raw.name).unwrap_or_default(),
            poster_path: non_empty(raw.poster_path),
            profile_path: non_empty(raw.profile_path),
            release_or_air_date: non_empty(raw.release_date.or(raw.first_air_date)),
            vote_average: raw.vote_average.unwrap_or(0.0),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Loosely typed list entry: movies carry `title`/`release_date`, shows
/// carry `name`/`first_air_date`, people carry `profile_path`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiItem {
    pub id: u64,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

/// Identity of a favorite: `"movie:550"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FavoriteKey {
    pub media_type: MediaType,
    pub id: u64,
}

impl FavoriteKey {
    pub fn new(media_type: MediaType, id: u64) -> Self {
        Self { media_type, id }
    }
}

impl fmt::Display for FavoriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.media_type, self.id)
    }
}

impl FromStr for FavoriteKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <type>:<id>, got {}", s))?;
        let id = id.parse().map_err(|_| format!("invalid id in {}", s))?;
        Ok(Self::new(kind.parse()?, id))
    }
}

/// Server-side favorite row, also the POST/DELETE body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    #[serde(deserialize_with = "de_id")]
    pub tmdb_id: u64,
    pub media_type: MediaType,
}

impl FavoriteRecord {
    pub fn key(&self) -> FavoriteKey {
        FavoriteKey::new(self.media_type, self.tmdb_id)
    }
}

impl From<FavoriteKey> for FavoriteRecord {
    fn from(key: FavoriteKey) -> Self {
        Self {
            tmdb_id: key.id,
            media_type: key.media_type,
        }
    }
}

/// Body of a POST/DELETE on the favorites endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FavoriteResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Ids arrive as numbers from the database but as strings when they were
/// posted from a page's data attributes.
fn de_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Number(n) => Ok(n),
        Repr::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

// ── Detail payloads ──

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenreList {
    #[serde(default)]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Language {
    pub iso_639_1: String,
    #[serde(default)]
    pub english_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Region {
    pub iso_3166_1: String,
    #[serde(default)]
    pub english_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductionCountry {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MovieDetail {
    pub id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    pub status: Option<String>,
    pub release_date: Option<String>,
    pub genres: Vec<Genre>,
    pub overview: Option<String>,
    pub vote_average: f64,
    pub vote_count: u64,
    pub runtime: Option<u32>,
    pub budget: Option<u64>,
    pub revenue: Option<u64>,
    pub homepage: Option<String>,
    pub imdb_id: Option<String>,
    pub original_language: Option<String>,
    pub spoken_languages: Vec<Language>,
    pub production_countries: Vec<ProductionCountry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Network {
    pub name: String,
    pub logo_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Season {
    pub name: String,
    pub air_date: Option<String>,
    pub episode_count: u32,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TvDetail {
    pub id: u64,
    pub name: String,
    pub poster_path: Option<String>,
    pub status: Option<String>,
    pub first_air_date: Option<String>,
    pub genres: Vec<Genre>,
    pub overview: Option<String>,
    pub number_of_seasons: Option<u32>,
    pub number_of_episodes: Option<u32>,
    pub vote_average: f64,
    pub vote_count: u64,
    pub original_language: Option<String>,
    pub networks: Vec<Network>,
    pub homepage: Option<String>,
    pub origin_country: Vec<String>,
    pub seasons: Vec<Season>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CastMember {
    pub name: String,
    pub profile_path: Option<String>,
    pub character: Option<String>,
    pub job: Option<String>,
}

impl CastMember {
    /// Character for actors, job for crew, empty otherwise.
    pub fn role(&self) -> &str {
        self.character
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.job.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credits {
    pub cast: Vec<CastMember>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

impl Video {
    pub fn is_youtube_trailer(&self) -> bool {
        self.kind == "Trailer" && self.site == "YouTube"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_media_item_from_movie_entry() {
        let raw: ApiItem = serde_json::from_value(json!({
            "id": 550,
            "title": "Fight Club",
            "poster_path": "/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg",
            "release_date": "1999-10-15",
            "vote_average": 8.4
        }))
        .unwrap();

        let item = MediaItem::from_api(raw, Some(MediaType::Movie)).unwrap();
        assert_eq!(item.media_type, MediaType::Movie);
        assert_eq!(item.title, "Fight Club");
        assert_eq!(item.release_or_air_date.as_deref(), Some("1999-10-15"));
        assert_eq!(item.key().to_string(), "movie:550");
    }

    #[test]
    fn test_media_item_from_tv_entry_uses_name() {
        let raw: ApiItem = serde_json::from_value(json!({
            "id": 1399,
            "media_type": "tv",
            "name": "Game of Thrones",
            "first_air_date": "2011-04-17",
            "poster_path": ""
        }))
        .unwrap();

        let item = MediaItem::from_api(raw, Some(MediaType::Movie)).unwrap();
        assert_eq!(item.media_type, MediaType::Tv);
        assert_eq!(item.title, "Game of Thrones");
        assert_eq!(item.poster_path, None);
        assert_eq!(item.vote_average, 0.0);
    }

    #[test]
    fn test_media_item_unknown_type_is_skipped() {
        let raw = ApiItem {
            id: 1,
            media_type: Some("collection".to_string()),
            ..Default::default()
        };
        assert!(MediaItem::from_api(raw.clone(), Some(MediaType::Movie)).is_none());

        let untagged = ApiItem { id: 2, ..Default::default() };
        assert!(MediaItem::from_api(untagged, None).is_none());
    }

    #[test]
    fn test_favorite_key_round_trip() {
        let key: FavoriteKey = "tv:1399".parse().unwrap();
        assert_eq!(key, FavoriteKey::new(MediaType::Tv, 1399));
        assert!("movie".parse::<FavoriteKey>().is_err());
        assert!("film:1".parse::<FavoriteKey>().is_err());
    }

    #[test]
    fn test_favorite_record_accepts_string_ids() {
        let records: Vec<FavoriteRecord> = serde_json::from_value(json!([
            {"tmdb_id": 550, "media_type": "movie"},
            {"tmdb_id": "1399", "media_type": "tv"}
        ]))
        .unwrap();
        assert_eq!(records[0].key(), FavoriteKey::new(MediaType::Movie, 550));
        assert_eq!(records[1].key(), FavoriteKey::new(MediaType::Tv, 1399));
    }

    #[test]
    fn test_favorite_response_defaults_to_failure() {
        let response: FavoriteResponse =
            serde_json::from_value(json!({"message": "Item already in favorites."})).unwrap();
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("Item already in favorites."));
    }

    #[test]
    fn test_cast_member_role() {
        let actor = CastMember {
            name: "Edward Norton".to_string(),
            character: Some("The Narrator".to_string()),
            ..Default::default()
        };
        assert_eq!(actor.role(), "The Narrator");

        let crew = CastMember {
            name: "David Fincher".to_string(),
            character: Some(String::new()),
            job: Some("Director".to_string()),
            ..Default::default()
        };
        assert_eq!(crew.role(), "Director");
    }
}
