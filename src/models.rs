use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
pub const POSTER_PLACEHOLDER: &str = "https://placehold.co/600x400/1a1a1a/FFFFFF.png";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub poster_path: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub backdrop_path: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProductionCompany {
    pub id: i64,
    pub name: String,
    pub logo_path: Option<String>,
}

/// Full detail payload for a single movie. TMDB omits `genre_ids` here and
/// sends `genres` instead, so the flattened base tolerates an empty list.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub runtime: Option<i64>,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tagline: String,
    #[serde(default)]
    pub budget: i64,
    #[serde(default)]
    pub revenue: i64,
    #[serde(default)]
    pub production_companies: Vec<ProductionCompany>,
}

impl MovieDetails {
    /// Base movie used when saving, with `genre_ids` rebuilt from `genres`.
    pub fn to_movie(&self) -> Movie {
        Movie {
            genre_ids: self.genres.iter().map(|g| g.id).collect(),
            ..self.movie.clone()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedMovieRecord {
    pub id: String,
    pub movie_id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub poster_path: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchCountRecord {
    pub id: String,
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    pub movie_id: i64,
    pub title: String,
    pub poster_url: String,
    pub count: i64,
}

pub fn poster_url(path: &str) -> String {
    if path.is_empty() {
        POSTER_PLACEHOLDER.to_string()
    } else {
        format!("{IMAGE_BASE}{path}")
    }
}

/// Inverse of [`poster_url`] for records that only kept the absolute URL.
pub fn strip_image_base(url: &str) -> String {
    url.strip_prefix(IMAGE_BASE).unwrap_or(url).to_string()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
