use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::models::{Movie, MovieDetails};

const TMDB_BASE: &str = "https://api.themoviedb.org/3";

#[async_trait]
pub trait MovieMetadata: Send + Sync {
    async fn fetch_movie_details(&self, id: i64) -> Result<MovieDetails>;
    /// Search results for `query`, or the popularity listing when absent.
    async fn fetch_movies(&self, query: Option<&str>) -> Result<Vec<Movie>>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    token: String,
    base: String,
}

impl TmdbClient {
    pub fn from_env() -> Result<Self> {
        let token = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        Self::new(token, TMDB_BASE)
    }

    pub fn new(token: impl Into<String>, base: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            token: token.into(),
            base: base.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header("accept", "application/json")
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {} {}", url, status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl MovieMetadata for TmdbClient {
    async fn fetch_movie_details(&self, id: i64) -> Result<MovieDetails> {
        let url = format!("{}/movie/{id}?language=en-US", self.base);
        self.get_json(&url)
            .await
            .with_context(|| format!("fetching TMDB movie {id}"))
    }

    async fn fetch_movies(&self, query: Option<&str>) -> Result<Vec<Movie>> {
        #[derive(Deserialize)]
        struct ListResponse {
            results: Vec<Movie>,
        }

        let url = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => format!(
                "{}/search/movie?query={}&language=en-US",
                self.base,
                urlencoding::encode(q)
            ),
            None => format!("{}/discover/movie?sort_by=popularity.desc", self.base),
        };
        let data: ListResponse = self.get_json(&url).await?;
        Ok(data.results)
    }
}

pub fn parse_tmdb_id(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed.parse().ok();
    }
    None
}
