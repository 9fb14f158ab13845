mod support;

use anyhow::Result;
use cineshelf::diagnostics::{Diagnostics, Fallback};
use cineshelf::reconciler::{SaveReconciler, SavedState};
use cineshelf::store::{Document, Query, RemoteStore};
use cineshelf::trending::TrendingService;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use support::{movie, reconciler, saved_doc, FakeStore, SAVED, SEARCHES, USER};
use tokio::sync::Barrier;

#[tokio::test]
async fn is_saved_reflects_matching_records() {
    let store = FakeStore::new();
    store.seed(SAVED, "a", saved_doc(10, USER, "2024-05-01T00:00:00.000Z"));
    store.seed(SAVED, "b", saved_doc(11, "someone-else", "2024-05-01T00:00:00.000Z"));
    let rec = reconciler(store.clone());

    assert!(rec.is_saved(10, USER).await);
    assert!(!rec.is_saved(11, USER).await);
    assert!(!rec.is_saved(12, USER).await);

    let (_, queries) = store.queries.lock().unwrap()[0].clone();
    assert_eq!(
        queries,
        vec![Query::equal("movieId", 10), Query::equal("userId", USER)]
    );
}

#[tokio::test]
async fn is_saved_fails_open_when_the_store_is_down() {
    let store = FakeStore::unreachable();
    let rec = reconciler(store);

    assert!(!rec.is_saved(10, USER).await);
    assert!(rec.check_saved(10, USER).await.is_err());
    assert_eq!(rec.diagnostics().count(Fallback::NotSaved), 1);
}

#[tokio::test]
async fn saving_twice_in_sequence_keeps_one_record() {
    let store = FakeStore::new();
    let rec = reconciler(store.clone());
    let m = movie(447365, "Guardians of the Galaxy Vol. 3");

    let first = rec.save(&m, USER).await.expect("first save");
    let second = rec.save(&m, USER).await.expect("second save");

    assert_eq!(store.count(SAVED), 1);
    assert_eq!(first, second);
    assert_eq!(first.movie_id, 447365);
    assert_eq!(first.poster_path, "/447365.jpg");
    assert_eq!(first.user_id, USER);
    assert!(rec.is_saved(447365, USER).await);
}

#[tokio::test]
async fn save_returns_an_existing_record_unchanged() {
    let store = FakeStore::new();
    store.seed(SAVED, "existing", saved_doc(5, USER, "2023-01-01T00:00:00.000Z"));
    let rec = reconciler(store.clone());

    let record = rec.save(&movie(5, "Renamed Title"), USER).await.expect("save");
    assert_eq!(record.id, "existing");
    assert_eq!(record.title, "Movie 5");
    assert_eq!(record.created_at.to_rfc3339(), "2023-01-01T00:00:00+00:00");
    assert_eq!(store.count(SAVED), 1);
}

#[tokio::test]
async fn save_propagates_store_failures() {
    let rec = reconciler(FakeStore::unreachable());
    assert!(rec.save(&movie(1, "Any"), USER).await.is_err());
}

#[tokio::test]
async fn unsave_then_is_saved_reports_false() {
    let store = FakeStore::new();
    let rec = reconciler(store.clone());
    let record = rec.save(&movie(7, "Seven"), USER).await.expect("save");

    rec.unsave(&record.id).await.expect("unsave");
    assert!(!rec.is_saved(7, USER).await);
    assert_eq!(store.count(SAVED), 0);
}

#[tokio::test]
async fn unsave_reports_store_failures() {
    let rec = reconciler(FakeStore::unreachable());
    assert!(rec.unsave("doc-1").await.is_err());
}

#[tokio::test]
async fn list_saved_is_newest_first_for_one_user() {
    let store = FakeStore::new();
    store.seed(SAVED, "old", saved_doc(1, USER, "2024-01-01T00:00:00.000Z"));
    store.seed(SAVED, "new", saved_doc(2, USER, "2024-03-01T00:00:00.000Z"));
    store.seed(SAVED, "mid", saved_doc(3, USER, "2024-02-01T00:00:00.000Z"));
    store.seed(SAVED, "other", saved_doc(4, "other", "2024-04-01T00:00:00.000Z"));
    let rec = reconciler(store);

    let ids: Vec<String> = rec
        .list_saved(USER)
        .await
        .expect("list")
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
}

#[tokio::test]
async fn list_saved_propagates_store_failures() {
    let rec = reconciler(FakeStore::unreachable());
    assert!(rec.list_saved(USER).await.is_err());
}

#[tokio::test]
async fn failed_optimistic_save_keeps_local_intent() {
    let store = FakeStore::unreachable();
    let rec = reconciler(store.clone());
    let m = movie(99, "Offline");
    let mut state = SavedState::unknown();

    let record = rec.save_optimistic(&mut state, &m, USER).await;
    assert!(record.is_none());
    assert_eq!(
        state,
        SavedState {
            local: true,
            confirmed: None
        }
    );
    assert!(state.is_diverged());
    assert_eq!(rec.diagnostics().count(Fallback::OptimisticSave), 1);

    // The store still has nothing, so the divergence is visible from both sides.
    assert!(!rec.is_saved(99, USER).await);

    // Once the store is back the pass confirms what it holds and nothing more.
    store.set_unreachable(false);
    assert!(rec.reconcile(&mut state, 99, USER).await);
    assert_eq!(state.confirmed, Some(false));
    assert!(state.local);
    assert!(state.is_diverged());
    assert_eq!(store.count(SAVED), 0);
}

#[tokio::test]
async fn optimistic_save_and_unsave_confirm_on_success() {
    let store = FakeStore::new();
    let rec = reconciler(store.clone());
    let mut state = SavedState::unknown();

    let record = rec
        .save_optimistic(&mut state, &movie(3, "Three"), USER)
        .await
        .expect("record");
    assert_eq!(state, SavedState::confirmed(true));

    assert!(rec.unsave_optimistic(&mut state, &record.id).await);
    assert_eq!(state, SavedState::confirmed(false));
}

#[tokio::test]
async fn reconcile_leaves_state_alone_when_store_is_down() {
    let rec = reconciler(FakeStore::unreachable());
    let mut state = SavedState {
        local: true,
        confirmed: Some(true),
    };
    assert!(!rec.reconcile(&mut state, 1, USER).await);
    assert_eq!(
        state,
        SavedState {
            local: true,
            confirmed: Some(true)
        }
    );
}

/// Holds every list call until two callers are waiting, so both existence
/// checks complete before either create.
struct GatedStore {
    inner: Arc<FakeStore>,
    gate: Barrier,
}

#[async_trait::async_trait]
impl RemoteStore for GatedStore {
    async fn list_documents(&self, collection: &str, queries: &[Query]) -> Result<Vec<Document>> {
        let out = self.inner.list_documents(collection, queries).await;
        self.gate.wait().await;
        out
    }

    async fn create_document(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<Document> {
        self.inner.create_document(collection, id, fields).await
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document> {
        self.inner.update_document(collection, id, fields).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        self.inner.delete_document(collection, id).await
    }
}

#[tokio::test]
async fn concurrent_saves_can_create_duplicates() {
    let inner = FakeStore::new();
    let store = Arc::new(GatedStore {
        inner: inner.clone(),
        gate: Barrier::new(2),
    });
    let rec = SaveReconciler::new(store, SAVED, Arc::new(Diagnostics::default()));
    let m = movie(42, "Race");

    let (a, b) = tokio::join!(rec.save(&m, USER), rec.save(&m, USER));
    let (a, b) = (a.expect("first"), b.expect("second"));

    assert_ne!(a.id, b.id);
    assert_eq!(inner.count(SAVED), 2);
}

fn trending_service(store: Arc<FakeStore>) -> TrendingService {
    TrendingService::new(store, SEARCHES, Arc::new(Diagnostics::default()))
}

#[tokio::test]
async fn record_search_creates_then_increments() {
    let store = FakeStore::new();
    let trending = trending_service(store.clone());
    let m = movie(569094, "Spider-Man: Across the Spider-Verse");

    trending.record_search("spider", &m).await.expect("first");
    trending.record_search("spider", &m).await.expect("second");

    let docs = store.all(SEARCHES);
    assert_eq!(docs.len(), 1);
    let fields = &docs[0].fields;
    assert_eq!(fields.get("count"), Some(&json!(2)));
    assert_eq!(fields.get("movie_id"), Some(&json!(569094)));
    assert_eq!(
        fields.get("poster_url"),
        Some(&json!("https://image.tmdb.org/t/p/w500/569094.jpg"))
    );
}

#[tokio::test]
async fn trending_returns_top_five_by_count() {
    let store = FakeStore::new();
    for (i, count) in [3, 9, 1, 7, 5, 8, 2].into_iter().enumerate() {
        store.seed(
            SEARCHES,
            &format!("t{i}"),
            json!({
                "searchTerm": format!("term {i}"),
                "movie_id": i,
                "title": format!("Movie {i}"),
                "poster_url": "https://image.tmdb.org/t/p/w500/x.jpg",
                "count": count,
            }),
        );
    }
    let trending = trending_service(store.clone());

    let counts: Vec<i64> = trending
        .trending()
        .await
        .expect("trending")
        .into_iter()
        .map(|r| r.count)
        .collect();
    assert_eq!(counts, vec![9, 8, 7, 5, 3]);

    let (_, queries) = store.queries.lock().unwrap()[0].clone();
    assert_eq!(queries, vec![Query::limit(5), Query::order_desc("count")]);
}

#[tokio::test]
async fn trending_is_none_when_the_store_is_down() {
    let diagnostics = Arc::new(Diagnostics::default());
    let trending = TrendingService::new(FakeStore::unreachable(), SEARCHES, diagnostics.clone());
    assert!(trending.trending().await.is_none());
    assert_eq!(diagnostics.count(Fallback::TrendingUnavailable), 1);
    assert!(trending
        .record_search("q", &movie(1, "One"))
        .await
        .is_err());
}

#[tokio::test]
async fn list_saved_tolerates_records_without_a_poster() {
    let store = FakeStore::new();
    store.seed(SAVED, "a", saved_doc(1, USER, "2024-01-01T00:00:00.000Z"));
    let mut no_poster = saved_doc(2, USER, "2024-02-01T00:00:00.000Z");
    no_poster["posterPath"] = Value::Null;
    store.seed(SAVED, "b", no_poster);
    let rec = reconciler(store);

    let records = rec.list_saved(USER).await.expect("list");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "b");
    assert_eq!(records[0].poster_path, "");
    assert_eq!(records[1].poster_path, "/1.jpg");
}

#[tokio::test]
async fn find_by_movie_returns_the_matching_counter() {
    let store = FakeStore::new();
    let trending = trending_service(store.clone());
    trending
        .record_search("fast", &movie(385687, "Fast X"))
        .await
        .expect("record");

    let record = trending
        .find_by_movie(385687)
        .await
        .expect("lookup")
        .expect("record");
    assert_eq!(record.search_term, "fast");
    assert_eq!(record.count, 1);
    assert!(trending.find_by_movie(1).await.expect("lookup").is_none());

    store.set_unreachable(true);
    assert!(trending.find_by_movie(385687).await.is_err());
}
