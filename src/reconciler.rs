//! Saved-movie bookkeeping against the remote store.
//!
//! Every remote failure here is absorbed somewhere: `is_saved` fails open as
//! "not saved", the optimistic helpers keep the user's intent in local state,
//! and callers of `list_saved` substitute mock data. Each absorption is
//! logged with a `fallback` field and counted in [`Diagnostics`].
//!
//! `save` checks for an existing record and then creates one. The two calls
//! are independent, so concurrent saves for the same user and movie can
//! both create a record.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::diagnostics::{Diagnostics, Fallback};
use crate::models::{Movie, SavedMovieRecord};
use crate::store::{Document, Query, RemoteStore};

/// Saved flag as seen by a screen. `local` is what the user asked for and
/// what the UI shows; `confirmed` is the last answer the store gave, `None`
/// when it has not answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SavedState {
    pub local: bool,
    pub confirmed: Option<bool>,
}

impl SavedState {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn confirmed(saved: bool) -> Self {
        Self {
            local: saved,
            confirmed: Some(saved),
        }
    }

    pub fn is_diverged(&self) -> bool {
        match self.confirmed {
            Some(confirmed) => confirmed != self.local,
            None => self.local,
        }
    }
}

pub struct SaveReconciler {
    store: Arc<dyn RemoteStore>,
    collection: String,
    diagnostics: Arc<Diagnostics>,
}

impl SaveReconciler {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        collection: impl Into<String>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            diagnostics,
        }
    }

    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    async fn find(&self, movie_id: i64, user_id: &str) -> Result<Vec<Document>> {
        self.store
            .list_documents(
                &self.collection,
                &[
                    Query::equal("movieId", movie_id),
                    Query::equal("userId", user_id),
                ],
            )
            .await
    }

    /// Like [`SaveReconciler::is_saved`] but keeps store failures visible.
    pub async fn check_saved(&self, movie_id: i64, user_id: &str) -> Result<bool> {
        Ok(!self.find(movie_id, user_id).await?.is_empty())
    }

    pub async fn is_saved(&self, movie_id: i64, user_id: &str) -> bool {
        self.saved_state(movie_id, user_id).await.local
    }

    /// Initial state for a screen: the store's answer when it gives one,
    /// otherwise "not saved" with nothing confirmed.
    pub async fn saved_state(&self, movie_id: i64, user_id: &str) -> SavedState {
        match self.check_saved(movie_id, user_id).await {
            Ok(saved) => SavedState::confirmed(saved),
            Err(e) => {
                warn!(
                    movie_id,
                    user_id,
                    fallback = Fallback::NotSaved.as_str(),
                    "Saved-status check failed, reporting not saved: {:#}",
                    e
                );
                self.diagnostics.record(Fallback::NotSaved);
                SavedState::unknown()
            }
        }
    }

    /// Returns the existing record for this user and movie, or creates one.
    pub async fn save(&self, movie: &Movie, user_id: &str) -> Result<SavedMovieRecord> {
        let existing = self
            .find(movie.id, user_id)
            .await
            .context("checking for an existing saved movie")?;
        if let Some(doc) = existing.first() {
            debug!(movie_id = movie.id, record_id = %doc.id, "Movie already saved");
            return doc.decode();
        }

        let mut fields = Map::new();
        fields.insert("movieId".to_string(), Value::from(movie.id));
        fields.insert("title".to_string(), Value::from(movie.title.clone()));
        fields.insert(
            "posterPath".to_string(),
            Value::from(movie.poster_path.clone()),
        );
        fields.insert("userId".to_string(), Value::from(user_id));
        fields.insert(
            "createdAt".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        let doc = self
            .store
            .create_document(&self.collection, None, fields)
            .await
            .context("creating saved movie")?;
        info!(movie_id = movie.id, record_id = %doc.id, "Saved movie '{}'", movie.title);
        doc.decode()
    }

    pub async fn unsave(&self, record_id: &str) -> Result<()> {
        if let Err(e) = self
            .store
            .delete_document(&self.collection, record_id)
            .await
        {
            error!(record_id, "Failed to remove saved movie: {:#}", e);
            return Err(e.context("removing saved movie"));
        }
        info!(record_id, "Removed saved movie");
        Ok(())
    }

    /// Newest first.
    pub async fn list_saved(&self, user_id: &str) -> Result<Vec<SavedMovieRecord>> {
        let docs = self
            .store
            .list_documents(
                &self.collection,
                &[Query::equal("userId", user_id), Query::order_desc("createdAt")],
            )
            .await
            .context("listing saved movies")?;
        docs.iter().map(Document::decode::<SavedMovieRecord>).collect()
    }

    /// Records the intent to save before calling the store. The local flag
    /// stays set when the store fails; only `confirmed` tracks the outcome.
    pub async fn save_optimistic(
        &self,
        state: &mut SavedState,
        movie: &Movie,
        user_id: &str,
    ) -> Option<SavedMovieRecord> {
        state.local = true;
        match self.save(movie, user_id).await {
            Ok(record) => {
                state.confirmed = Some(true);
                Some(record)
            }
            Err(e) => {
                warn!(
                    movie_id = movie.id,
                    user_id,
                    fallback = Fallback::OptimisticSave.as_str(),
                    "Save failed, keeping movie marked as saved: {:#}",
                    e
                );
                self.diagnostics.record(Fallback::OptimisticSave);
                None
            }
        }
    }

    /// Returns whether the store confirmed the removal.
    pub async fn unsave_optimistic(&self, state: &mut SavedState, record_id: &str) -> bool {
        state.local = false;
        match self.unsave(record_id).await {
            Ok(()) => {
                state.confirmed = Some(false);
                true
            }
            Err(_) => {
                warn!(
                    record_id,
                    fallback = Fallback::OptimisticUnsave.as_str(),
                    "Keeping movie removed locally after failed delete"
                );
                self.diagnostics.record(Fallback::OptimisticUnsave);
                false
            }
        }
    }

    /// Refreshes `confirmed` from the store. Never touches `local` and never
    /// replays a write. Returns whether the store answered.
    pub async fn reconcile(&self, state: &mut SavedState, movie_id: i64, user_id: &str) -> bool {
        match self.check_saved(movie_id, user_id).await {
            Ok(saved) => {
                state.confirmed = Some(saved);
                if state.is_diverged() {
                    warn!(
                        movie_id,
                        user_id,
                        local = state.local,
                        confirmed = saved,
                        "Local saved state differs from the store"
                    );
                }
                true
            }
            Err(e) => {
                debug!(movie_id, "Reconcile pass could not reach the store: {:#}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divergence_covers_unknown_and_mismatched_states() {
        assert!(!SavedState::unknown().is_diverged());
        assert!(!SavedState::confirmed(true).is_diverged());
        assert!(SavedState {
            local: true,
            confirmed: None
        }
        .is_diverged());
        assert!(SavedState {
            local: false,
            confirmed: Some(true)
        }
        .is_diverged());
    }
}
