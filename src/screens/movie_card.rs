use tracing::error;

use super::{ScreenDeps, ScreenError, ScreenScope};
use crate::models::Movie;

/// Save toggle on a listing card. The saved copy is built from the list item
/// alone, without a vote count or genres, and a failed save leaves the card
/// unsaved.
pub struct MovieCardModel {
    deps: ScreenDeps,
    scope: ScreenScope,
    user_id: String,
    movie: Movie,
    saved: bool,
}

impl MovieCardModel {
    pub fn new(
        deps: ScreenDeps,
        scope: ScreenScope,
        user_id: impl Into<String>,
        movie: Movie,
    ) -> Self {
        Self {
            deps,
            scope,
            user_id: user_id.into(),
            movie,
            saved: false,
        }
    }

    pub fn movie(&self) -> &Movie {
        &self.movie
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub async fn check(&mut self) -> Result<(), ScreenError> {
        self.saved = self
            .scope
            .run(self.deps.reconciler.is_saved(self.movie.id, &self.user_id))
            .await?;
        Ok(())
    }

    pub async fn save(&mut self) -> Result<(), ScreenError> {
        if self.saved {
            return Ok(());
        }
        let movie = Movie {
            vote_count: 0,
            genre_ids: Vec::new(),
            ..self.movie.clone()
        };
        let result = self
            .scope
            .run(self.deps.reconciler.save(&movie, &self.user_id))
            .await?;
        match result {
            Ok(_) => self.saved = true,
            Err(e) => error!(movie_id = movie.id, "Error saving movie: {:#}", e),
        }
        Ok(())
    }
}
