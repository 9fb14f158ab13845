use tracing::error;

use super::{ScreenDeps, ScreenError, ScreenScope};
use crate::models::{strip_image_base, Movie, SearchCountRecord};

/// Save toggle on a trending card. Unlike the details screen, a failed save
/// leaves the card unsaved.
pub struct TrendingCardModel {
    deps: ScreenDeps,
    scope: ScreenScope,
    user_id: String,
    record: SearchCountRecord,
    saved: bool,
}

impl TrendingCardModel {
    pub fn new(
        deps: ScreenDeps,
        scope: ScreenScope,
        user_id: impl Into<String>,
        record: SearchCountRecord,
    ) -> Self {
        Self {
            deps,
            scope,
            user_id: user_id.into(),
            record,
            saved: false,
        }
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub async fn check(&mut self) -> Result<(), ScreenError> {
        self.saved = self
            .scope
            .run(
                self.deps
                    .reconciler
                    .is_saved(self.record.movie_id, &self.user_id),
            )
            .await?;
        Ok(())
    }

    pub async fn save(&mut self) -> Result<(), ScreenError> {
        if self.saved {
            return Ok(());
        }
        let saved = self.scope.run(self.save_remote()).await?;
        if saved {
            self.saved = true;
        }
        Ok(())
    }

    async fn save_remote(&self) -> bool {
        let details = match self
            .deps
            .metadata
            .fetch_movie_details(self.record.movie_id)
            .await
        {
            Ok(details) => details,
            Err(e) => {
                error!(movie_id = self.record.movie_id, "Error saving movie: {:#}", e);
                return false;
            }
        };
        let movie = Movie {
            id: self.record.movie_id,
            title: self.record.title.clone(),
            poster_path: strip_image_base(&self.record.poster_url),
            genre_ids: details.genres.iter().map(|g| g.id).collect(),
            ..details.movie
        };
        match self.deps.reconciler.save(&movie, &self.user_id).await {
            Ok(_) => true,
            Err(e) => {
                error!(movie_id = movie.id, "Error saving movie: {:#}", e);
                false
            }
        }
    }
}
