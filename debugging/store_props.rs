//! List the saved-movie documents for one user and print each as pretty JSON.
//! Uses the APPWRITE_* variables from the environment (.env supported).
//! Usage: store_props <user-id>

use anyhow::{Context, Result};
use cineshelf::config::StoreConfig;
use cineshelf::store::{AppwriteClient, Query, RemoteStore};
use dotenvy::dotenv;
use serde_json::Value;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present for local runs.
    dotenv().ok();

    let user_id = env::args()
        .nth(1)
        .context("Usage: store_props <user-id>")?;
    let config = StoreConfig::from_env()?;
    let store = AppwriteClient::new(&config)?;

    let docs = store
        .list_documents(
            &config.saved_collection_id,
            &[Query::equal("userId", user_id.as_str()), Query::order_desc("createdAt")],
        )
        .await
        .context("Failed to list saved movies")?;

    println!("{} saved movies for {}", docs.len(), user_id);
    for doc in docs {
        let mut fields = doc.fields;
        fields.insert("$id".to_string(), Value::String(doc.id));
        println!("{}", serde_json::to_string_pretty(&Value::Object(fields))?);
    }

    Ok(())
}
