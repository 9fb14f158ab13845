//! Per-mount state holders behind each view. A screen owns its state; nothing
//! is shared between screens except through the remote store.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ScreenConfig;
use crate::diagnostics::Fallback;
use crate::mock::generate_saved_movies;
use crate::models::SavedMovieRecord;
use crate::reconciler::SaveReconciler;
use crate::tmdb::MovieMetadata;

mod details;
mod movie_card;
mod profile;
mod saved;
mod trending_card;

pub use details::DetailsScreen;
pub use movie_card::MovieCardModel;
pub use profile::{ProfileScreen, ProfileSummary};
pub use saved::SavedScreen;
pub use trending_card::TrendingCardModel;

/// How many mock cards the list screens show.
pub const SCREEN_MOCK_COUNT: usize = 6;
pub const PROFILE_RECENT_COUNT: usize = 3;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScreenError {
    #[error("screen was disposed while a call was pending")]
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Remote,
    Mock,
}

/// Lifetime of one screen mount. Calls run through [`ScreenScope::run`]
/// resolve to [`ScreenError::Disposed`] once the scope is disposed, and
/// screens only write state after a call resolved successfully.
#[derive(Debug, Clone, Default)]
pub struct ScreenScope {
    token: CancellationToken,
}

impl ScreenScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispose(&self) {
        self.token.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, ScreenError> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ScreenError::Disposed),
            out = fut => Ok(out),
        }
    }

    pub async fn delay(&self, duration: Duration) -> Result<(), ScreenError> {
        self.run(tokio::time::sleep(duration)).await
    }
}

/// Collaborators every screen needs.
#[derive(Clone)]
pub struct ScreenDeps {
    pub reconciler: Arc<SaveReconciler>,
    pub metadata: Arc<dyn MovieMetadata>,
    pub config: ScreenConfig,
}

/// Saved list shared by the saved and profile tabs: the remote list when
/// enabled and reachable, the mock catalog otherwise.
pub(crate) async fn load_saved_list(
    deps: &ScreenDeps,
    scope: &ScreenScope,
    user_id: &str,
) -> Result<(Vec<SavedMovieRecord>, DataSource), ScreenError> {
    if deps.config.use_mock_saved {
        debug!(user_id, "Mock saved list enabled");
    } else {
        match scope.run(deps.reconciler.list_saved(user_id)).await? {
            Ok(movies) => return Ok((movies, DataSource::Remote)),
            Err(e) => {
                warn!(
                    user_id,
                    fallback = Fallback::MockSavedList.as_str(),
                    "Falling back to mock saved movies: {:#}",
                    e
                );
                deps.reconciler
                    .diagnostics()
                    .record(Fallback::MockSavedList);
            }
        }
    }
    scope.delay(deps.config.mock_latency).await?;
    Ok((generate_saved_movies(SCREEN_MOCK_COUNT), DataSource::Mock))
}
