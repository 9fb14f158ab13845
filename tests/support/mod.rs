#![allow(dead_code)]

use anyhow::{anyhow, Result};
use cineshelf::config::{AppConfig, Identity, ScreenConfig, StoreConfig};
use cineshelf::diagnostics::Diagnostics;
use cineshelf::models::{Genre, Movie, MovieDetails, ProductionCompany};
use cineshelf::reconciler::SaveReconciler;
use cineshelf::screens::ScreenDeps;
use cineshelf::store::{Document, Query, RemoteStore};
use cineshelf::tmdb::MovieMetadata;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SAVED: &str = "saved_movies";
pub const SEARCHES: &str = "search_counts";
pub const USER: &str = "user-42";

/// In-memory document store. `set_unreachable(true)` makes every call fail
/// the way a dropped connection would.
#[derive(Default)]
pub struct FakeStore {
    pub docs: Mutex<HashMap<String, Vec<Document>>>,
    pub queries: Mutex<Vec<(String, Vec<Query>)>>,
    unreachable: AtomicBool,
    next_id: AtomicU64,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn unreachable() -> Arc<Self> {
        let store = Self::new();
        store.set_unreachable(true);
        store
    }

    pub fn set_unreachable(&self, value: bool) {
        self.unreachable.store(value, AtomicOrdering::SeqCst);
    }

    pub fn seed(&self, collection: &str, id: &str, fields: Value) {
        let Value::Object(fields) = fields else {
            panic!("seed fields must be an object");
        };
        self.docs
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.to_string(),
                fields,
            });
    }

    pub fn count(&self, collection: &str) -> usize {
        self.docs
            .lock()
            .unwrap()
            .get(collection)
            .map(|d| d.len())
            .unwrap_or(0)
    }

    pub fn all(&self, collection: &str) -> Vec<Document> {
        self.docs
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn check(&self) -> Result<()> {
        if self.unreachable.load(AtomicOrdering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }
        Ok(())
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[async_trait::async_trait]
impl RemoteStore for FakeStore {
    async fn list_documents(&self, collection: &str, queries: &[Query]) -> Result<Vec<Document>> {
        self.queries
            .lock()
            .unwrap()
            .push((collection.to_string(), queries.to_vec()));
        self.check()?;
        let mut docs: Vec<Document> = self.all(collection);
        let mut limit = None;
        for q in queries {
            match q {
                Query::Equal(attr, value) => docs.retain(|d| d.fields.get(attr) == Some(value)),
                Query::OrderDesc(attr) => {
                    docs.sort_by(|a, b| compare(b.fields.get(attr), a.fields.get(attr)))
                }
                Query::Limit(n) => limit = Some(*n as usize),
            }
        }
        if let Some(n) = limit {
            docs.truncate(n);
        }
        Ok(docs)
    }

    async fn create_document(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<Document> {
        self.check()?;
        let id = match id {
            Some(id) => id.to_string(),
            None => format!("doc-{}", self.next_id.fetch_add(1, AtomicOrdering::SeqCst) + 1),
        };
        let doc = Document { id, fields };
        self.docs
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document> {
        self.check()?;
        let mut docs = self.docs.lock().unwrap();
        let doc = docs
            .get_mut(collection)
            .and_then(|d| d.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| anyhow!("document {} not found", id))?;
        doc.fields.extend(fields);
        Ok(doc.clone())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        self.check()?;
        let mut docs = self.docs.lock().unwrap();
        let list = docs.entry(collection.to_string()).or_default();
        let before = list.len();
        list.retain(|d| d.id != id);
        if list.len() == before {
            return Err(anyhow!("document {} not found", id));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMetadata {
    pub details: HashMap<i64, MovieDetails>,
    pub listing: Vec<Movie>,
    pub unreachable: bool,
}

impl FakeMetadata {
    pub fn with(details: Vec<MovieDetails>) -> Arc<Self> {
        Arc::new(Self {
            listing: details.iter().map(|d| d.movie.clone()).collect(),
            details: details.into_iter().map(|d| (d.movie.id, d)).collect(),
            unreachable: false,
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            unreachable: true,
            ..Self::default()
        })
    }
}

#[async_trait::async_trait]
impl MovieMetadata for FakeMetadata {
    async fn fetch_movie_details(&self, id: i64) -> Result<MovieDetails> {
        if self.unreachable {
            return Err(anyhow!("metadata provider unreachable"));
        }
        self.details
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow!("no movie {}", id))
    }

    async fn fetch_movies(&self, query: Option<&str>) -> Result<Vec<Movie>> {
        if self.unreachable {
            return Err(anyhow!("metadata provider unreachable"));
        }
        Ok(match query {
            Some(q) => self
                .listing
                .iter()
                .filter(|m| m.title.to_lowercase().contains(&q.to_lowercase()))
                .cloned()
                .collect(),
            None => self.listing.clone(),
        })
    }
}

pub fn movie(id: i64, title: &str) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        overview: format!("{title} overview"),
        poster_path: format!("/{id}.jpg"),
        backdrop_path: format!("/{id}-backdrop.jpg"),
        release_date: "2024-06-01".to_string(),
        vote_average: 7.2,
        vote_count: 321,
        genre_ids: vec![18],
    }
}

pub fn details(id: i64, title: &str) -> MovieDetails {
    MovieDetails {
        movie: Movie {
            genre_ids: Vec::new(),
            ..movie(id, title)
        },
        genres: vec![
            Genre {
                id: 18,
                name: "Drama".to_string(),
            },
            Genre {
                id: 53,
                name: "Thriller".to_string(),
            },
        ],
        runtime: Some(111),
        status: "Released".to_string(),
        tagline: String::new(),
        budget: 0,
        revenue: 0,
        production_companies: vec![ProductionCompany {
            id: 3,
            name: "Studio Three".to_string(),
            logo_path: None,
        }],
    }
}

pub fn saved_doc(movie_id: i64, user_id: &str, created_at: &str) -> Value {
    json!({
        "movieId": movie_id,
        "title": format!("Movie {movie_id}"),
        "posterPath": format!("/{movie_id}.jpg"),
        "userId": user_id,
        "createdAt": created_at,
    })
}

pub fn screen_config(use_mock_saved: bool) -> ScreenConfig {
    ScreenConfig {
        use_mock_saved,
        use_mock_details: false,
        mock_latency: Duration::ZERO,
    }
}

pub fn reconciler(store: Arc<FakeStore>) -> Arc<SaveReconciler> {
    Arc::new(SaveReconciler::new(
        store,
        SAVED,
        Arc::new(Diagnostics::default()),
    ))
}

pub fn deps(
    store: Arc<FakeStore>,
    metadata: Arc<FakeMetadata>,
    use_mock_saved: bool,
) -> ScreenDeps {
    ScreenDeps {
        reconciler: reconciler(store),
        metadata,
        config: screen_config(use_mock_saved),
    }
}

pub fn app_config(use_mock_saved: bool, demo_user: Option<&str>) -> AppConfig {
    AppConfig {
        store: StoreConfig {
            endpoint: "http://store.invalid/v1".to_string(),
            project_id: "project".to_string(),
            database_id: "db".to_string(),
            api_key: None,
            search_collection_id: SEARCHES.to_string(),
            saved_collection_id: SAVED.to_string(),
        },
        screens: screen_config(use_mock_saved),
        demo_user: demo_user.map(|id| Identity {
            user_id: id.to_string(),
            display_name: "Demo User".to_string(),
            join_date: "2025-03-12".to_string(),
        }),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
    }
}
