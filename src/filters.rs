//! Filter options for the popular and top-rated sections, and applying a
//! selection to them.

use crate::api::{Api, DiscoverCategory, DiscoverFilters, Endpoint};
use crate::dom::SharedDocument;
use crate::error::{AppError, Result};
use crate::lists::{ListFetcher, section_for};
use regex::Regex;
use std::sync::LazyLock;

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

/// Choices offered by the three multi-selects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Server order.
    pub genres: Vec<FilterOption>,
    /// Sorted by label.
    pub languages: Vec<FilterOption>,
    /// Sorted by label.
    pub regions: Vec<FilterOption>,
}

fn sorted(mut options: Vec<FilterOption>) -> Vec<FilterOption> {
    options.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.value.cmp(&b.value)));
    options
}

impl FilterOptions {
    /// Fetch genres, then languages, then regions. The first failure stops
    /// the sequence; lists fetched before it are kept.
    pub async fn load(api: &Api) -> Self {
        let mut options = Self::default();
        if let Err(e) = options.fill(api).await {
            tracing::error!(error = %e, "Failed to load filter options");
        }
        options
    }

    async fn fill(&mut self, api: &Api) -> Result<()> {
        self.genres = api
            .genres()
            .await?
            .into_iter()
            .map(|g| FilterOption {
                value: g.id.to_string(),
                label: g.name,
            })
            .collect();

        self.languages = sorted(
            api.languages()
                .await?
                .into_iter()
                .map(|l| FilterOption {
                    value: l.iso_639_1,
                    label: l.english_name,
                })
                .collect(),
        );

        self.regions = sorted(
            api.regions()
                .await?
                .into_iter()
                .map(|r| FilterOption {
                    value: r.iso_3166_1,
                    label: r.english_name,
                })
                .collect(),
        );

        tracing::info!(
            genres = self.genres.len(),
            languages = self.languages.len(),
            regions = self.regions.len(),
            "Filter options loaded"
        );
        Ok(())
    }
}

/// What the user picked for one section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub genres: Vec<u32>,
    pub languages: Vec<String>,
    pub regions: Vec<String>,
    /// Raw year input.
    pub year: Option<String>,
}

impl FilterSelection {
    pub fn to_discover(&self) -> DiscoverFilters {
        let year = self
            .year
            .as_deref()
            .map(str::trim)
            .filter(|y| !y.is_empty())
            .and_then(|y| {
                let parsed = YEAR_RE.is_match(y).then(|| y.parse::<u16>().ok()).flatten();
                if parsed.is_none() {
                    tracing::warn!(year = y, "Ignoring invalid year filter");
                }
                parsed
            });

        DiscoverFilters {
            genres: self.genres.clone(),
            languages: non_blank(&self.languages),
            regions: non_blank(&self.regions),
            year,
        }
    }
}

fn non_blank(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Re-fetch a filterable section with the selection applied.
pub async fn apply(
    fetcher: &ListFetcher,
    document: &SharedDocument,
    category: DiscoverCategory,
    selection: &FilterSelection,
) -> Result<usize> {
    if !category.supports_filters() {
        return Err(AppError::Configuration(format!(
            "the {} list cannot be filtered",
            category.as_str()
        )));
    }
    let section = section_for(category).ok_or_else(|| {
        AppError::Configuration(format!("no home section for {}", category.as_str()))
    })?;
    let filters = selection.to_discover();
    tracing::debug!(category = category.as_str(), ?filters, "Applying filters");
    fetcher
        .fetch_into(document, section, &Endpoint::Discover(category, filters))
        .await
}
