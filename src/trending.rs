use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::diagnostics::{Diagnostics, Fallback};
use crate::models::{Movie, SearchCountRecord, IMAGE_BASE};
use crate::store::{Document, Query, RemoteStore};

const TRENDING_LIMIT: u32 = 5;

/// Per-term search counters used to rank popular movies. The lookup and the
/// increment are separate calls, so concurrent searches for one term can
/// lose an increment or create a second counter.
pub struct TrendingService {
    store: Arc<dyn RemoteStore>,
    collection: String,
    diagnostics: Arc<Diagnostics>,
}

impl TrendingService {
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

    pub async fn record_search(&self, query: &str, movie: &Movie) -> Result<()> {
        let result = self.bump(query, movie).await;
        if let Err(e) = &result {
            error!(search_term = query, "Error updating search count: {:#}", e);
        }
        result
    }

    async fn bump(&self, query: &str, movie: &Movie) -> Result<()> {
        let existing = self
            .store
            .list_documents(&self.collection, &[Query::equal("searchTerm", query)])
            .await
            .context("looking up search term")?;

        if let Some(doc) = existing.first() {
            let record: SearchCountRecord = doc.decode()?;
            let mut fields = Map::new();
            fields.insert("count".to_string(), Value::from(record.count + 1));
            self.store
                .update_document(&self.collection, &doc.id, fields)
                .await
                .context("incrementing search count")?;
            info!(
                search_term = query,
                count = record.count + 1,
                "Incremented search count"
            );
        } else {
            let mut fields = Map::new();
            fields.insert("searchTerm".to_string(), Value::from(query));
            fields.insert("movie_id".to_string(), Value::from(movie.id));
            fields.insert("title".to_string(), Value::from(movie.title.clone()));
            fields.insert("count".to_string(), Value::from(1));
            fields.insert(
                "poster_url".to_string(),
                Value::from(format!("{IMAGE_BASE}{}", movie.poster_path)),
            );
            self.store
                .create_document(&self.collection, None, fields)
                .await
                .context("creating search count")?;
            info!(search_term = query, movie_id = movie.id, "Recorded new search term");
        }
        Ok(())
    }

    /// The counter that points at `movie_id`, if any search led to it.
    pub async fn find_by_movie(&self, movie_id: i64) -> Result<Option<SearchCountRecord>> {
        let docs = self
            .store
            .list_documents(
                &self.collection,
                &[Query::equal("movie_id", movie_id), Query::limit(1)],
            )
            .await
            .context("looking up trending movie")?;
        docs.first().map(Document::decode::<SearchCountRecord>).transpose()
    }

    /// Most searched terms first; `None` when the store is unavailable.
    pub async fn trending(&self) -> Option<Vec<SearchCountRecord>> {
        let docs = self
            .store
            .list_documents(
                &self.collection,
                &[Query::limit(TRENDING_LIMIT), Query::order_desc("count")],
            )
            .await
            .and_then(|docs| {
                docs.iter()
                    .map(Document::decode::<SearchCountRecord>)
                    .collect::<Result<Vec<_>>>()
            });
        match docs {
            Ok(records) => Some(records),
            Err(e) => {
                warn!(
                    fallback = Fallback::TrendingUnavailable.as_str(),
                    "Trending lookup failed: {:#}",
                    e
                );
                self.diagnostics.record(Fallback::TrendingUnavailable);
                None
            }
        }
    }
}
