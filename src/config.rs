use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://cloud.appwrite.io/v1";
const DEFAULT_BIND: &str = "0.0.0.0:3146";
const DEFAULT_MOCK_LATENCY_MS: u64 = 1000;

pub const REQUIRED_VARS: [&str; 5] = [
    "APPWRITE_PROJECT_ID",
    "APPWRITE_DATABASE_ID",
    "APPWRITE_COLLECTION_ID",
    "APPWRITE_SAVED_MOVIES_COLLECTION_ID",
    "TMDB_API_KEY",
];

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub api_key: Option<String>,
    pub search_collection_id: String,
    pub saved_collection_id: String,
}

/// Who the screens act on behalf of. There is no session system behind this
/// yet, so the default comes from the environment and requests may override it.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: String,
    pub display_name: String,
    pub join_date: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            display_name: user_id.clone(),
            user_id,
            join_date: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScreenConfig {
    pub use_mock_saved: bool,
    pub use_mock_details: bool,
    pub mock_latency: Duration,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            use_mock_saved: true,
            use_mock_details: false,
            mock_latency: Duration::from_millis(DEFAULT_MOCK_LATENCY_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub screens: ScreenConfig,
    pub demo_user: Option<Identity>,
    pub bind_addr: SocketAddr,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            endpoint: optional("APPWRITE_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            project_id: required("APPWRITE_PROJECT_ID")?,
            database_id: required("APPWRITE_DATABASE_ID")?,
            api_key: optional("APPWRITE_API_KEY"),
            search_collection_id: required("APPWRITE_COLLECTION_ID")?,
            saved_collection_id: required("APPWRITE_SAVED_MOVIES_COLLECTION_ID")?,
        })
    }
}

impl ScreenConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let mock_latency = match optional("MOCK_LATENCY_MS") {
            Some(raw) => Duration::from_millis(
                raw.parse()
                    .with_context(|| format!("MOCK_LATENCY_MS is not a number: {raw}"))?,
            ),
            None => defaults.mock_latency,
        };
        Ok(Self {
            use_mock_saved: flag("USE_MOCK_SAVED")?.unwrap_or(defaults.use_mock_saved),
            use_mock_details: flag("USE_MOCK_DETAILS")?.unwrap_or(defaults.use_mock_details),
            mock_latency,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let demo_user = optional("DEMO_USER_ID").map(|user_id| Identity {
            display_name: optional("DEMO_USER_NAME").unwrap_or_else(|| user_id.clone()),
            join_date: optional("DEMO_USER_JOIN_DATE").unwrap_or_default(),
            user_id,
        });
        let bind = optional("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind
            .parse()
            .with_context(|| format!("BIND_ADDR is not a socket address: {bind}"))?;
        Ok(Self {
            store: StoreConfig::from_env()?,
            screens: ScreenConfig::from_env()?,
            demo_user,
            bind_addr,
        })
    }
}

fn required(key: &str) -> Result<String> {
    optional(key).with_context(|| format!("{key} not set"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn flag(key: &str) -> Result<Option<bool>> {
    optional(key).map(|raw| parse_flag(&raw)).transpose()
}

pub fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("not a boolean flag: {other}"),
    }
}
