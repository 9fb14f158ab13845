use super::{load_saved_list, DataSource, ScreenDeps, ScreenError, ScreenScope};
use crate::models::SavedMovieRecord;
use crate::reconciler::SavedState;

pub struct SavedScreen {
    deps: ScreenDeps,
    scope: ScreenScope,
    user_id: String,
    movies: Vec<SavedMovieRecord>,
    source: Option<DataSource>,
    unconfirmed_removals: Vec<String>,
}

impl SavedScreen {
    pub fn new(deps: ScreenDeps, scope: ScreenScope, user_id: impl Into<String>) -> Self {
        Self {
            deps,
            scope,
            user_id: user_id.into(),
            movies: Vec::new(),
            source: None,
            unconfirmed_removals: Vec::new(),
        }
    }

    pub fn movies(&self) -> &[SavedMovieRecord] {
        &self.movies
    }

    pub fn source(&self) -> Option<DataSource> {
        self.source
    }

    pub fn is_loading(&self) -> bool {
        self.source.is_none()
    }

    /// Removals shown locally that the store did not acknowledge.
    pub fn unconfirmed_removals(&self) -> &[String] {
        &self.unconfirmed_removals
    }

    pub async fn load(&mut self) -> Result<(), ScreenError> {
        let (movies, source) = load_saved_list(&self.deps, &self.scope, &self.user_id).await?;
        self.movies = movies;
        self.source = Some(source);
        Ok(())
    }

    /// Drops the card locally whatever the store says; the record may come
    /// from mock data the store has never seen.
    pub async fn remove(&mut self, record_id: &str) -> Result<(), ScreenError> {
        let mut state = SavedState::confirmed(true);
        let confirmed = self
            .scope
            .run(self.deps.reconciler.unsave_optimistic(&mut state, record_id))
            .await?;
        if !confirmed {
            self.unconfirmed_removals.push(record_id.to_string());
        }
        self.movies.retain(|m| m.id != record_id);
        Ok(())
    }
}
