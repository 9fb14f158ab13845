use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::config::StoreConfig;

/// Sentinel asking the store to generate the document id.
pub const UNIQUE_ID: &str = "unique()";

/// The query subset the movie flows need.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal(String, Value),
    OrderDesc(String),
    Limit(u32),
}

impl Query {
    pub fn equal(attribute: &str, value: impl Into<Value>) -> Self {
        Query::Equal(attribute.to_string(), value.into())
    }

    pub fn order_desc(attribute: &str) -> Self {
        Query::OrderDesc(attribute.to_string())
    }

    pub fn limit(n: u32) -> Self {
        Query::Limit(n)
    }

    /// Wire form understood by the document API (`queries[]` entries).
    pub fn to_param(&self) -> String {
        let value = match self {
            Query::Equal(attribute, v) => {
                json!({ "method": "equal", "attribute": attribute, "values": [v] })
            }
            Query::OrderDesc(attribute) => json!({ "method": "orderDesc", "attribute": attribute }),
            Query::Limit(n) => json!({ "method": "limit", "values": [n] }),
        };
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Decodes the document into a record type, exposing the store id as `id`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
            .with_context(|| format!("document {} has unexpected shape", self.id))
    }

    /// Splits a raw API document into its `$id` and user attributes; all
    /// `$`-prefixed system attributes are dropped.
    fn from_raw(raw: Value) -> Result<Self> {
        let Value::Object(map) = raw else {
            return Err(anyhow!("document is not an object"));
        };
        let id = map
            .get("$id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("document has no $id"))?
            .to_string();
        let fields = map.into_iter().filter(|(k, _)| !k.starts_with('$')).collect();
        Ok(Self { id, fields })
    }
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_documents(&self, collection: &str, queries: &[Query]) -> Result<Vec<Document>>;
    /// `id` of `None` delegates id generation to the store.
    async fn create_document(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<Document>;
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document>;
    async fn delete_document(&self, collection: &str, id: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct AppwriteClient {
    client: Client,
    endpoint: String,
    project_id: String,
    database_id: String,
    api_key: Option<String>,
}

impl AppwriteClient {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let user_agent = format!("cineshelf/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build document store HTTP client")?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            database_id: config.database_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, collection
        )
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req.header("X-Appwrite-Project", &self.project_id);
        match &self.api_key {
            Some(key) => req.header("X-Appwrite-Key", key),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<String> {
        let res = self
            .authorize(req)
            .send()
            .await
            .with_context(|| format!("{what} request failed"))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("reading {what} body failed"))?;
        if !status.is_success() {
            return Err(anyhow!("{what} failed (status {}): {}", status, text));
        }
        Ok(text)
    }

    async fn send_document(&self, req: RequestBuilder, what: &str) -> Result<Document> {
        let text = self.send(req, what).await?;
        let raw: Value = serde_json::from_str(&text).context("JSON parse failed")?;
        Document::from_raw(raw)
    }
}

#[async_trait]
impl RemoteStore for AppwriteClient {
    async fn list_documents(&self, collection: &str, queries: &[Query]) -> Result<Vec<Document>> {
        #[derive(Deserialize)]
        struct ListResponse {
            documents: Vec<Value>,
        }

        let params: Vec<(&str, String)> =
            queries.iter().map(|q| ("queries[]", q.to_param())).collect();
        let req = self.client.get(self.documents_url(collection)).query(&params);
        let text = self.send(req, "list documents").await?;
        let data: ListResponse = serde_json::from_str(&text).context("JSON parse failed")?;
        data.documents.into_iter().map(Document::from_raw).collect()
    }

    async fn create_document(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<Document> {
        let body = json!({
            "documentId": id.unwrap_or(UNIQUE_ID),
            "data": fields,
        });
        let req = self.client.post(self.documents_url(collection)).json(&body);
        self.send_document(req, "create document").await
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        let req = self.client.patch(url).json(&json!({ "data": fields }));
        self.send_document(req, "update document").await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        self.send(self.client.delete(url), "delete document").await?;
        Ok(())
    }
}
