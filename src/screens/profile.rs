use chrono::{NaiveDate, Utc};
use serde::Serialize;

use super::{load_saved_list, DataSource, ScreenDeps, ScreenError, ScreenScope, PROFILE_RECENT_COUNT};
use crate::config::Identity;
use crate::models::SavedMovieRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub user_id: String,
    pub display_name: String,
    pub join_date: String,
    pub days_since_joined: Option<i64>,
    pub total_saved: usize,
    pub recent: Vec<SavedMovieRecord>,
    pub source: DataSource,
}

pub struct ProfileScreen {
    deps: ScreenDeps,
    scope: ScreenScope,
    identity: Identity,
    summary: Option<ProfileSummary>,
}

impl ProfileScreen {
    pub fn new(deps: ScreenDeps, scope: ScreenScope, identity: Identity) -> Self {
        Self {
            deps,
            scope,
            identity,
            summary: None,
        }
    }

    pub fn summary(&self) -> Option<&ProfileSummary> {
        self.summary.as_ref()
    }

    pub async fn load(&mut self) -> Result<(), ScreenError> {
        let (movies, source) =
            load_saved_list(&self.deps, &self.scope, &self.identity.user_id).await?;
        self.summary = Some(ProfileSummary {
            user_id: self.identity.user_id.clone(),
            display_name: self.identity.display_name.clone(),
            join_date: self.identity.join_date.clone(),
            days_since_joined: days_since(&self.identity.join_date, Utc::now().date_naive()),
            total_saved: movies.len(),
            recent: movies.into_iter().take(PROFILE_RECENT_COUNT).collect(),
            source,
        });
        Ok(())
    }
}

fn days_since(join_date: &str, today: NaiveDate) -> Option<i64> {
    let joined = NaiveDate::parse_from_str(join_date.trim(), "%Y-%m-%d").ok()?;
    Some((today - joined).num_days())
}
