//! Session-scoped memory of where the user was on the home page, so
//! returning from a detail page can put them back.

use crate::dom::Document;
use crate::error::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const SCROLL_POSITION: &str = "scrollPosition";
pub const RESTORE_TO_TOP: &str = "restoreToTop";
pub const CLICKED_CARD_ID: &str = "clickedCardId";
pub const HIGHLIGHT_CLASS: &str = "highlighted-card";

/// String key/value store living as long as the browsing session.
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

/// Storage for a single process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// Storage persisted as a JSON object so separate CLI invocations share a
/// session. Every write is flushed to disk.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open `path`, starting empty if it does not exist yet. A file that
    /// does not parse is treated as an expired session.
    pub fn open(path: &Path) -> Result<Self> {
        let items = if path.exists() {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable session file");
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            items,
        })
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.items)?)?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        if self.items.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// What the storage holds for the next home page load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationMemory {
    pub scroll_position: Option<u64>,
    pub clicked_card_id: Option<String>,
    pub restore_to_top: Option<String>,
}

/// What a restore did to the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restored {
    pub scrolled_to: Option<u64>,
    pub highlighted: Option<String>,
}

impl NavigationMemory {
    pub fn read(storage: &dyn SessionStorage) -> Self {
        Self {
            scroll_position: storage
                .get_item(SCROLL_POSITION)
                .and_then(|s| s.trim().parse().ok()),
            clicked_card_id: storage.get_item(CLICKED_CARD_ID).filter(|s| !s.is_empty()),
            restore_to_top: storage.get_item(RESTORE_TO_TOP),
        }
    }

    /// Remember the scroll offset and the card being followed.
    pub fn record_click(storage: &mut dyn SessionStorage, scroll_y: u64, card_id: &str) -> Result<()> {
        storage.set_item(SCROLL_POSITION, &scroll_y.to_string())?;
        storage.set_item(CLICKED_CARD_ID, card_id)?;
        tracing::debug!(scroll_y, card_id, "Recorded card click");
        Ok(())
    }

    /// Leaving a detail page through its back link writes `false`, which
    /// asks the home page to return to the saved offset.
    pub fn set_restore_to_top(storage: &mut dyn SessionStorage, to_top: bool) -> Result<()> {
        storage.set_item(RESTORE_TO_TOP, if to_top { "true" } else { "false" })
    }

    /// Apply the saved state to a loaded home page, then forget it.
    pub fn restore(storage: &mut dyn SessionStorage, document: &mut Document) -> Result<Restored> {
        let memory = Self::read(storage);
        let mut restored = Restored::default();

        if let Some(y) = memory.scroll_position {
            if memory.restore_to_top.as_deref() == Some("false") {
                document.scroll_to(y);
                restored.scrolled_to = Some(y);
            }
        }

        // A reused page still carries the previous highlight.
        document.remove_class_everywhere(HIGHLIGHT_CLASS);
        if let Some(card_id) = memory.clicked_card_id {
            if document.add_class(&card_id, HIGHLIGHT_CLASS) {
                restored.highlighted = Some(card_id);
            } else {
                tracing::debug!(card_id, "Clicked card is no longer on the page");
            }
        }

        for key in [SCROLL_POSITION, RESTORE_TO_TOP, CLICKED_CARD_ID] {
            storage.remove_item(key)?;
        }
        tracing::info!(?restored, "Navigation restored");
        Ok(restored)
    }
}
