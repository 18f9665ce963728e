//! Movie and TV detail pages.
//!
//! Each page is filled by independent requests issued together. A part that
//! fails is logged and leaves only its own container empty.

use crate::api::Api;
use crate::dom::{self, Document, Heart, Node, SharedDocument};
use crate::error::Result;
use crate::favorites::FavoritesStore;
use crate::model::{FavoriteKey, MediaType};
use crate::render;

pub const MOVIE_INFO: &str = "movie-detail";
pub const MOVIE_CREDITS: &str = "credits-container";
pub const TRAILER: &str = "trailer-container";
pub const TV_TITLE: &str = "tv-title";
pub const TV_INFO: &str = "tv-info-container";
pub const TV_CREDITS: &str = "tv-credits-container";
pub const HEART: &str = "favorite-heart";

pub fn movie_document() -> Document {
    Document::new(&[HEART, MOVIE_INFO, TRAILER, MOVIE_CREDITS])
}

pub fn tv_document() -> Document {
    Document::new(&[TV_TITLE, HEART, TV_INFO, TV_CREDITS])
}

/// Which parts of a page rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetailReport {
    pub info: bool,
    pub credits: bool,
    /// Always false on TV pages.
    pub trailer: bool,
    pub heart: bool,
}

impl DetailReport {
    pub fn failures(&self, media_type: MediaType) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if !self.info {
            failed.push("details");
        }
        if !self.credits {
            failed.push("credits");
        }
        if media_type == MediaType::Movie && !self.trailer {
            failed.push("trailer");
        }
        if !self.heart {
            failed.push("favorites");
        }
        failed
    }
}

fn settle(part: &'static str, key: FavoriteKey, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(%key, part, error = %e, "Failed to load detail part");
            false
        }
    }
}

#[derive(Clone)]
pub struct DetailAssembler {
    api: Api,
    store: FavoritesStore,
    cast_limit: usize,
}

impl DetailAssembler {
    pub fn new(api: Api, store: FavoritesStore, cast_limit: usize) -> Self {
        Self {
            api,
            store,
            cast_limit,
        }
    }

    pub async fn assemble_movie(&self, document: &SharedDocument, id: u64) -> DetailReport {
        let key = FavoriteKey::new(MediaType::Movie, id);
        let (info, credits, trailer, heart) = tokio::join!(
            self.movie_info(document, id),
            self.credits(document, key, MOVIE_CREDITS),
            self.trailer(document, id),
            self.heart(document, key),
        );
        let report = DetailReport {
            info: settle("details", key, info),
            credits: settle("credits", key, credits),
            trailer: settle("trailer", key, trailer),
            heart: settle("favorites", key, heart),
        };
        tracing::info!(%key, ?report, "Detail page assembled");
        report
    }

    pub async fn assemble_tv(&self, document: &SharedDocument, id: u64) -> DetailReport {
        let key = FavoriteKey::new(MediaType::Tv, id);
        let (info, credits, heart) = tokio::join!(
            self.tv_info(document, id),
            self.credits(document, key, TV_CREDITS),
            self.heart(document, key),
        );
        let report = DetailReport {
            info: settle("details", key, info),
            credits: settle("credits", key, credits),
            trailer: false,
            heart: settle("favorites", key, heart),
        };
        tracing::info!(%key, ?report, "Detail page assembled");
        report
    }

    async fn movie_info(&self, document: &SharedDocument, id: u64) -> Result<()> {
        let detail = self.api.movie(id).await?;
        let panel = render::movie_panel(&detail);
        dom::lock(document).replace_children(MOVIE_INFO, vec![Node::Panel(panel)]);
        Ok(())
    }

    async fn tv_info(&self, document: &SharedDocument, id: u64) -> Result<()> {
        let detail = self.api.tv(id).await?;
        let panel = render::tv_panel(&detail);
        let mut doc = dom::lock(document);
        doc.replace_children(TV_TITLE, vec![Node::Text(detail.name.clone())]);
        doc.replace_children(TV_INFO, vec![Node::Panel(panel)]);
        Ok(())
    }

    async fn credits(&self, document: &SharedDocument, key: FavoriteKey, container: &str) -> Result<()> {
        let credits = self.api.credits(key.media_type, key.id).await?;
        let nodes = render::credit_nodes(&credits, self.cast_limit);
        dom::lock(document).replace_children(container, nodes);
        Ok(())
    }

    /// Button for the first YouTube trailer; nothing when there is none.
    async fn trailer(&self, document: &SharedDocument, id: u64) -> Result<()> {
        let videos = self.api.videos(id).await?;
        let nodes = videos
            .iter()
            .find(|v| v.is_youtube_trailer())
            .map(|v| Node::TrailerButton(v.key.clone()))
            .into_iter()
            .collect();
        dom::lock(document).replace_children(TRAILER, nodes);
        Ok(())
    }

    async fn heart(&self, document: &SharedDocument, key: FavoriteKey) -> Result<()> {
        self.store.load(&self.api).await?;
        let on = self.store.is_favorite(key);
        dom::lock(document).replace_children(HEART, vec![Node::Heart(Heart { key, on })]);
        Ok(())
    }
}

/// Open the trailer modal for the page's trailer button, if any.
pub fn play_trailer(document: &mut Document) -> bool {
    let key = document
        .container(TRAILER)
        .and_then(|c| {
            c.children.iter().find_map(|n| match n {
                Node::TrailerButton(key) => Some(key.clone()),
                _ => None,
            })
        });
    match key {
        Some(key) => {
            document.open_modal(render::trailer_embed_url(&key));
            true
        }
        None => false,
    }
}

pub fn close_trailer(document: &mut Document) {
    document.close_modal();
}
