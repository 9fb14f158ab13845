use tracing::{debug, warn};

use super::{DataSource, ScreenDeps, ScreenError, ScreenScope};
use crate::diagnostics::Fallback;
use crate::mock::{get_movie_details, get_movie_details_for};
use crate::models::{MovieDetails, SavedMovieRecord};
use crate::reconciler::SavedState;
use crate::tmdb::parse_tmdb_id;

pub struct DetailsScreen {
    deps: ScreenDeps,
    scope: ScreenScope,
    user_id: String,
    movie: Option<MovieDetails>,
    saved: SavedState,
    source: Option<DataSource>,
}

impl DetailsScreen {
    pub fn new(deps: ScreenDeps, scope: ScreenScope, user_id: impl Into<String>) -> Self {
        Self {
            deps,
            scope,
            user_id: user_id.into(),
            movie: None,
            saved: SavedState::unknown(),
            source: None,
        }
    }

    pub fn movie(&self) -> Option<&MovieDetails> {
        self.movie.as_ref()
    }

    pub fn saved(&self) -> SavedState {
        self.saved
    }

    pub fn source(&self) -> Option<DataSource> {
        self.source
    }

    pub async fn load(&mut self, id: Option<&str>) -> Result<(), ScreenError> {
        let Some(raw) = id.map(str::trim).filter(|s| !s.is_empty()) else {
            self.show_mock(get_movie_details(None));
            return Ok(());
        };

        if self.deps.config.use_mock_details {
            debug!(movie = raw, "Mock movie details enabled");
        } else {
            match parse_tmdb_id(raw) {
                Some(movie_id) => {
                    match self
                        .scope
                        .run(self.deps.metadata.fetch_movie_details(movie_id))
                        .await?
                    {
                        Ok(details) => {
                            let saved = self
                                .scope
                                .run(self.deps.reconciler.saved_state(movie_id, &self.user_id))
                                .await?;
                            self.movie = Some(details);
                            self.saved = saved;
                            self.source = Some(DataSource::Remote);
                            return Ok(());
                        }
                        Err(e) => self.note_fallback(raw, &format!("{e:#}")),
                    }
                }
                None => self.note_fallback(raw, "id is not numeric"),
            }
        }

        self.scope.delay(self.deps.config.mock_latency).await?;
        self.show_mock(get_movie_details_for(Some(raw)));
        Ok(())
    }

    fn note_fallback(&self, raw: &str, reason: &str) {
        warn!(
            movie = raw,
            fallback = Fallback::MockDetails.as_str(),
            "Falling back to mock movie details: {}",
            reason
        );
        self.deps
            .reconciler
            .diagnostics()
            .record(Fallback::MockDetails);
    }

    fn show_mock(&mut self, details: MovieDetails) {
        self.movie = Some(details);
        self.saved = SavedState::unknown();
        self.source = Some(DataSource::Mock);
    }

    /// Marks the movie saved locally even when the store rejects the write.
    /// Does nothing before a movie is loaded or once it is saved.
    pub async fn save(&mut self) -> Result<Option<SavedMovieRecord>, ScreenError> {
        let Some(details) = &self.movie else {
            return Ok(None);
        };
        if self.saved.local {
            return Ok(None);
        }
        let movie = details.to_movie();
        let mut state = self.saved;
        let record = self
            .scope
            .run(
                self.deps
                    .reconciler
                    .save_optimistic(&mut state, &movie, &self.user_id),
            )
            .await?;
        self.saved = state;
        Ok(record)
    }

    /// Refreshes the confirmed half of the saved state from the store.
    /// Mock details are never reconciled: their id is not the requested one.
    pub async fn reconcile(&mut self) -> Result<bool, ScreenError> {
        if self.source == Some(DataSource::Mock) {
            return Ok(false);
        }
        let Some(details) = &self.movie else {
            return Ok(false);
        };
        let movie_id = details.movie.id;
        let mut state = self.saved;
        let answered = self
            .scope
            .run(
                self.deps
                    .reconciler
                    .reconcile(&mut state, movie_id, &self.user_id),
            )
            .await?;
        self.saved = state;
        Ok(answered)
    }
}
