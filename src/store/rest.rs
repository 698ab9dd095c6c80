use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use url::Url;

use super::{DataStore, Query, Resolution};
use crate::error::{Error, Result};

/// Error body returned by the store when it rejects a request.
#[derive(Debug, Clone, Deserialize)]
struct StoreErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: Url,
    anon_key: String,
    access_token: Option<String>,
}

impl RestStore {
    pub fn new(store_url: &str, anon_key: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let mut base_url = Url::parse(store_url)
            .map_err(|e| Error::Config(format!("Invalid STORE_URL {}: {}", store_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        tracing::info!("Data store client configured for {}", base_url);

        Ok(Self {
            client,
            base_url,
            anon_key,
            access_token: None,
        })
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        self.base_url
            .join(&format!("rest/v1/{}", table))
            .map_err(|e| Error::Internal(format!("Invalid table path {}: {}", table, e)))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        req.header("apikey", &self.anon_key)
            .bearer_auth(bearer)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn read_rows(response: Response) -> Result<Vec<JsonValue>> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(store_error(status.as_u16(), &text));
        }

        // 204 and `return=minimal` answers carry no body.
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<JsonValue>(&text)? {
            JsonValue::Array(rows) => Ok(rows),
            JsonValue::Null => Ok(Vec::new()),
            row => Ok(vec![row]),
        }
    }
}

fn store_error(status: u16, text: &str) -> Error {
    match serde_json::from_str::<StoreErrorBody>(text) {
        Ok(body) => {
            let mut message = body.message.unwrap_or_else(|| "request rejected".to_string());
            if let Some(details) = body.details.filter(|d| !d.is_empty()) {
                message = format!("{} ({})", message, details);
            }
            if let Some(hint) = body.hint.filter(|h| !h.is_empty()) {
                message = format!("{}; hint: {}", message, hint);
            }
            Error::Store {
                status,
                code: body.code,
                message,
            }
        }
        Err(_) => Error::Store {
            status,
            code: None,
            message: if text.is_empty() {
                "request rejected".to_string()
            } else {
                text.to_string()
            },
        },
    }
}

#[async_trait]
impl DataStore for RestStore {
    async fn select(&self, query: &Query) -> Result<Vec<JsonValue>> {
        let url = self.table_url(query.table_name())?;
        tracing::debug!(table = query.table_name(), "select");
        let response = self
            .authorize(self.client.get(url))
            .query(&query.to_params())
            .send()
            .await?;
        Self::read_rows(response).await
    }

    async fn upsert(
        &self,
        table: &str,
        row: JsonValue,
        on_conflict: &[&'static str],
        resolution: Resolution,
    ) -> Result<Vec<JsonValue>> {
        let url = self.table_url(table)?;
        let prefer = match resolution {
            Resolution::Merge => "resolution=merge-duplicates,return=representation",
            Resolution::Ignore => "resolution=ignore-duplicates,return=representation",
        };
        tracing::debug!(table, ?resolution, "upsert");
        let response = self
            .authorize(self.client.post(url))
            .query(&[("on_conflict", on_conflict.join(","))])
            .header("Prefer", prefer)
            .json(&row)
            .send()
            .await?;
        Self::read_rows(response).await
    }

    async fn update(&self, query: &Query, patch: JsonValue) -> Result<Vec<JsonValue>> {
        if query.filters().is_empty() {
            return Err(Error::Internal(format!(
                "Refusing unfiltered update on {}",
                query.table_name()
            )));
        }
        let url = self.table_url(query.table_name())?;
        tracing::debug!(table = query.table_name(), "update");
        let response = self
            .authorize(self.client.patch(url))
            .query(&query.filter_params())
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        Self::read_rows(response).await
    }

    fn scoped(&self, access_token: &str) -> Arc<dyn DataStore> {
        Arc::new(Self {
            access_token: Some(access_token.to_string()),
            ..self.clone()
        })
    }
}
