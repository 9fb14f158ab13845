use crate::config::{AppConfig, Identity, ScreenConfig};
use crate::diagnostics::{Diagnostics, Fallback};
use crate::models::{poster_url, Movie, MovieDetails, SavedMovieRecord};
use crate::reconciler::{SaveReconciler, SavedState};
use crate::screens::{
    DataSource, DetailsScreen, MovieCardModel, ProfileScreen, SavedScreen, ScreenDeps,
    ScreenError, ScreenScope, TrendingCardModel,
};
use crate::store::{AppwriteClient, RemoteStore};
use crate::tmdb::{MovieMetadata, TmdbClient};
use crate::trending::TrendingService;
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};

const MAX_BODY_BYTES: usize = 64 * 1024;
pub const USER_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<SaveReconciler>,
    pub trending: Arc<TrendingService>,
    pub metadata: Arc<dyn MovieMetadata>,
    pub diagnostics: Arc<Diagnostics>,
    pub screens: ScreenConfig,
    pub demo_user: Option<Identity>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        metadata: Arc<dyn MovieMetadata>,
        config: &AppConfig,
    ) -> Self {
        let diagnostics = Arc::new(Diagnostics::default());
        Self {
            reconciler: Arc::new(SaveReconciler::new(
                store.clone(),
                config.store.saved_collection_id.clone(),
                diagnostics.clone(),
            )),
            trending: Arc::new(TrendingService::new(
                store,
                config.store.search_collection_id.clone(),
                diagnostics.clone(),
            )),
            metadata,
            diagnostics,
            screens: config.screens.clone(),
            demo_user: config.demo_user.clone(),
        }
    }

    fn deps(&self) -> ScreenDeps {
        ScreenDeps {
            reconciler: self.reconciler.clone(),
            metadata: self.metadata.clone(),
            config: self.screens.clone(),
        }
    }
}

pub async fn run_server(config: AppConfig) -> Result<()> {
    let store: Arc<dyn RemoteStore> = Arc::new(AppwriteClient::new(&config.store)?);
    let metadata: Arc<dyn MovieMetadata> = Arc::new(TmdbClient::from_env()?);
    match &config.demo_user {
        Some(user) => info!("Requests without {} act as '{}'", USER_HEADER, user.user_id),
        None => warn!("DEMO_USER_ID not set; requests must send {}", USER_HEADER),
    }
    info!(
        mock_saved = config.screens.use_mock_saved,
        mock_details = config.screens.use_mock_details,
        "Screen data sources configured"
    );

    let state = AppState::new(store, metadata, &config);
    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/diagnostics", get(diagnostics))
        .route("/movies", get(list_movies))
        .route("/search", post(search))
        .route("/cards/save", post(save_movie_card))
        .route("/movies/:id", get(movie_details))
        .route("/movies/:id/save", post(save_movie))
        .route("/movies/:id/reconcile", post(reconcile_movie))
        .route("/saved", get(saved_movies))
        .route("/saved/:record_id", delete(remove_saved))
        .route("/profile", get(profile))
        .route("/trending", get(trending))
        .route("/trending/:movie_id/saved", get(trending_card_saved))
        .route("/trending/:movie_id/save", post(save_trending_card))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct DetailsView {
    movie: Option<MovieDetails>,
    saved: SavedState,
    source: Option<DataSource>,
}

#[derive(Debug, Serialize)]
struct SaveView {
    movie_id: Option<i64>,
    saved: SavedState,
    record: Option<SavedMovieRecord>,
}

#[derive(Debug, Serialize)]
struct SavedCardView {
    #[serde(flatten)]
    record: SavedMovieRecord,
    poster_url: String,
}

#[derive(Debug, Serialize)]
struct SavedView {
    movies: Vec<SavedCardView>,
    source: Option<DataSource>,
}

#[derive(Debug, Serialize)]
struct MovieCardView {
    #[serde(flatten)]
    movie: Movie,
    poster_url: String,
    saved: bool,
}

#[derive(Debug, Serialize)]
struct CardSavedView {
    movie_id: i64,
    saved: bool,
}

#[derive(Deserialize)]
struct MoviesQuery {
    query: Option<String>,
}

#[derive(Deserialize)]
struct SearchBody {
    query: String,
}

impl IntoResponse for ScreenError {
    fn into_response(self) -> Response {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "message": self.to_string() })),
        )
            .into_response()
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "status": "error", "message": message.into() })),
    )
        .into_response()
}

/// Caller identity from the request header, else the configured demo user.
fn identity(state: &AppState, headers: &HeaderMap) -> Option<Identity> {
    let from_header = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    match (from_header, &state.demo_user) {
        (Some(id), Some(demo)) if demo.user_id == id => Some(demo.clone()),
        (Some(id), _) => Some(Identity::new(id)),
        (None, demo) => demo.clone(),
    }
}

fn require_identity(state: &AppState, headers: &HeaderMap) -> Result<Identity, Response> {
    identity(state, headers).ok_or_else(|| {
        error_response(
            StatusCode::UNAUTHORIZED,
            format!("missing {USER_HEADER} header"),
        )
    })
}

async fn health() -> &'static str {
    "OK"
}

async fn diagnostics(State(state): State<AppState>) -> Response {
    Json(state.diagnostics.snapshot()).into_response()
}

/// Listing cards, each with the saved flag its card checks on mount.
async fn list_movies(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<MoviesQuery>,
) -> Response {
    let user = match require_identity(&state, &headers) {
        Ok(user) => user,
        Err(res) => return res,
    };
    let movies = match state.metadata.fetch_movies(params.query.as_deref()).await {
        Ok(movies) => movies,
        Err(e) => {
            warn!("Movie listing failed: {:#}", e);
            return error_response(StatusCode::BAD_GATEWAY, "movie listing unavailable");
        }
    };
    let scope = ScreenScope::new();
    let mut cards = Vec::with_capacity(movies.len());
    for movie in movies {
        let mut card = MovieCardModel::new(state.deps(), scope.clone(), &user.user_id, movie);
        if let Err(e) = card.check().await {
            return e.into_response();
        }
        cards.push(MovieCardView {
            poster_url: poster_url(&card.movie().poster_path),
            saved: card.is_saved(),
            movie: card.movie().clone(),
        });
    }
    Json(cards).into_response()
}

async fn save_movie_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(movie): Json<Movie>,
) -> Response {
    let user = match require_identity(&state, &headers) {
        Ok(user) => user,
        Err(res) => return res,
    };
    let mut card = MovieCardModel::new(state.deps(), ScreenScope::new(), user.user_id, movie);
    if let Err(e) = card.check().await {
        return e.into_response();
    }
    if let Err(e) = card.save().await {
        return e.into_response();
    }
    Json(CardSavedView {
        movie_id: card.movie().id,
        saved: card.is_saved(),
    })
    .into_response()
}

async fn search(State(state): State<AppState>, Json(body): Json<SearchBody>) -> Response {
    let query = body.query.trim();
    if query.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "query must not be empty");
    }
    let movies = match state.metadata.fetch_movies(Some(query)).await {
        Ok(movies) => movies,
        Err(e) => {
            warn!(search_term = query, "Movie search failed: {:#}", e);
            return error_response(StatusCode::BAD_GATEWAY, "movie search unavailable");
        }
    };
    if let Some(first) = movies.first() {
        // Failures are logged inside; the search result is still returned.
        let _ = state.trending.record_search(query, first).await;
    }
    Json(movies).into_response()
}

async fn load_details(
    state: &AppState,
    headers: &HeaderMap,
    id: &str,
) -> Result<DetailsScreen, Response> {
    let user = require_identity(state, headers)?;
    let mut screen = DetailsScreen::new(state.deps(), ScreenScope::new(), user.user_id);
    screen
        .load(Some(id))
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(screen)
}

fn details_view(screen: &DetailsScreen) -> DetailsView {
    DetailsView {
        movie: screen.movie().cloned(),
        saved: screen.saved(),
        source: screen.source(),
    }
}

async fn movie_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    match load_details(&state, &headers, &id).await {
        Ok(screen) => Json(details_view(&screen)).into_response(),
        Err(res) => res,
    }
}

async fn save_movie(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut screen = match load_details(&state, &headers, &id).await {
        Ok(screen) => screen,
        Err(res) => return res,
    };
    let record = match screen.save().await {
        Ok(record) => record,
        Err(e) => return e.into_response(),
    };
    Json(SaveView {
        movie_id: screen.movie().map(|m| m.movie.id),
        saved: screen.saved(),
        record,
    })
    .into_response()
}

async fn reconcile_movie(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut screen = match load_details(&state, &headers, &id).await {
        Ok(screen) => screen,
        Err(res) => return res,
    };
    if let Err(e) = screen.reconcile().await {
        return e.into_response();
    }
    Json(details_view(&screen)).into_response()
}

async fn saved_movies(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match require_identity(&state, &headers) {
        Ok(user) => user,
        Err(res) => return res,
    };
    let mut screen = SavedScreen::new(state.deps(), ScreenScope::new(), user.user_id);
    if let Err(e) = screen.load().await {
        return e.into_response();
    }
    let movies = screen
        .movies()
        .iter()
        .map(|record| SavedCardView {
            poster_url: poster_url(&record.poster_path),
            record: record.clone(),
        })
        .collect();
    Json(SavedView {
        movies,
        source: screen.source(),
    })
    .into_response()
}

async fn remove_saved(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(record_id): Path<String>,
) -> Response {
    let user = match require_identity(&state, &headers) {
        Ok(user) => user,
        Err(res) => return res,
    };
    let mut screen = SavedScreen::new(state.deps(), ScreenScope::new(), user.user_id);
    match screen.remove(&record_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn profile(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match require_identity(&state, &headers) {
        Ok(user) => user,
        Err(res) => return res,
    };
    let mut screen = ProfileScreen::new(state.deps(), ScreenScope::new(), user);
    if let Err(e) = screen.load().await {
        return e.into_response();
    }
    Json(screen.summary().cloned()).into_response()
}

async fn trending(State(state): State<AppState>) -> Response {
    Json(state.trending.trending().await.unwrap_or_default()).into_response()
}

/// Mounts the card for a trending movie. A failed lookup shows the card
/// unsaved; an unknown movie is a 404.
async fn trending_card(
    state: &AppState,
    headers: &HeaderMap,
    movie_id: i64,
) -> Result<Option<TrendingCardModel>, Response> {
    let user = require_identity(state, headers)?;
    match state.trending.find_by_movie(movie_id).await {
        Ok(Some(record)) => {
            let mut card =
                TrendingCardModel::new(state.deps(), ScreenScope::new(), user.user_id, record);
            card.check().await.map_err(IntoResponse::into_response)?;
            Ok(Some(card))
        }
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("movie {movie_id} is not trending"),
        )),
        Err(e) => {
            warn!(
                movie_id,
                fallback = Fallback::TrendingUnavailable.as_str(),
                "Trending card lookup failed: {:#}",
                e
            );
            state.diagnostics.record(Fallback::TrendingUnavailable);
            Ok(None)
        }
    }
}

fn card_saved_view(movie_id: i64, card: Option<&TrendingCardModel>) -> Response {
    Json(CardSavedView {
        movie_id,
        saved: card.is_some_and(TrendingCardModel::is_saved),
    })
    .into_response()
}

async fn trending_card_saved(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(movie_id): Path<i64>,
) -> Response {
    match trending_card(&state, &headers, movie_id).await {
        Ok(card) => card_saved_view(movie_id, card.as_ref()),
        Err(res) => res,
    }
}

async fn save_trending_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(movie_id): Path<i64>,
) -> Response {
    let mut card = match trending_card(&state, &headers, movie_id).await {
        Ok(card) => card,
        Err(res) => return res,
    };
    if let Some(card) = card.as_mut() {
        if let Err(e) = card.save().await {
            return e.into_response();
        }
    }
    card_saved_view(movie_id, card.as_ref())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
