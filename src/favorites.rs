//! Client-side mirror of the server's favorites list.
//!
//! Membership changes only after the server confirms it with
//! `success: true`. A key with a toggle in flight rejects further toggles
//! until that request completes.

use crate::api::Api;
use crate::dom::Document;
use crate::error::{AppError, Result};
use crate::model::{FavoriteKey, FavoriteResponse};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct State {
    keys: HashSet<FavoriteKey>,
    in_flight: HashSet<FavoriteKey>,
}

/// Page-lifetime favorites set. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct FavoritesStore {
    state: Arc<Mutex<State>>,
}

/// Releases the in-flight mark when the toggle finishes or is dropped.
struct InFlightGuard {
    state: Arc<Mutex<State>>,
    key: FavoriteKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight
            .remove(&self.key);
    }
}

impl FavoritesStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_favorite(&self, key: FavoriteKey) -> bool {
        self.state().keys.contains(&key)
    }

    pub fn is_pending(&self, key: FavoriteKey) -> bool {
        self.state().in_flight.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.state().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted snapshot of the set.
    pub fn keys(&self) -> Vec<FavoriteKey> {
        let mut keys: Vec<FavoriteKey> = self.state().keys.iter().copied().collect();
        keys.sort();
        keys
    }

    pub fn replace_all(&self, keys: impl IntoIterator<Item = FavoriteKey>) {
        self.state().keys = keys.into_iter().collect();
    }

    /// Rebuild the set from the server list.
    pub async fn load(&self, api: &Api) -> Result<usize> {
        let records = api.favorites().await?;
        self.replace_all(records.iter().map(|r| r.key()));
        let count = self.len();
        tracing::info!(count, "Favorites loaded");
        Ok(count)
    }

    /// Add or remove `key` on the server and return the new membership.
    ///
    /// Fails with [`AppError::InFlight`] if a toggle for the same key has
    /// not completed, and with [`AppError::Rejected`] if the server answers
    /// without `success: true` and a fresh favorites list does not already
    /// show the requested state. On a transport failure the set is unchanged.
    pub async fn toggle(&self, api: &Api, key: FavoriteKey) -> Result<bool> {
        let (was_favorite, _guard) = {
            let mut state = self.state();
            if !state.in_flight.insert(key) {
                return Err(AppError::InFlight(key));
            }
            let guard = InFlightGuard {
                state: Arc::clone(&self.state),
                key,
            };
            (state.keys.contains(&key), guard)
        };

        let outcome = if was_favorite {
            api.remove_favorite(key).await
        } else {
            api.add_favorite(key).await
        };
        let response: FavoriteResponse =
            outcome.inspect_err(|e| tracing::error!(%key, error = %e, "Favorite request failed"))?;

        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| "server did not confirm the change".to_string());
            tracing::warn!(%key, %message, "Favorite change rejected");
            // The server may already hold the requested state ("Item already
            // in favorites."), so take its list as the truth.
            match self.load(api).await {
                Ok(_) if self.is_favorite(key) != was_favorite => return Ok(!was_favorite),
                Ok(_) => {}
                Err(e) => tracing::warn!(%key, error = %e, "Could not resync favorites"),
            }
            return Err(AppError::Rejected(message));
        }

        let mut state = self.state();
        if was_favorite {
            state.keys.remove(&key);
        } else {
            state.keys.insert(key);
        }
        tracing::debug!(%key, favorite = !was_favorite, "Favorite toggled");
        Ok(!was_favorite)
    }

    /// Set every heart in `document` from the current set.
    pub fn sync_hearts(&self, document: &mut Document) {
        let keys = self.state().keys.clone();
        document.sync_hearts(|key| keys.contains(&key));
    }
}
