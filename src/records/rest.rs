//! PostgREST-style HTTP backend
//!
//! Translates the options object into the hosted backend's query-string
//! dialect (`field=eq.v`, `field=in.(a,b)`, `order=`, `limit=`, `select=`)
//! and maps every non-success response to a `Backend` error carrying the
//! backend's message. Attempt-once; timeout behavior is whatever the HTTP
//! client defaults to.

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;

use crate::config::AppConfig;
use crate::error::{OpsdeskError, Result};
use crate::records::backend::BackendClient;
use crate::records::options::{Filter, FilterValue, QueryOptions};

/// HTTP adapter for the hosted backend's REST surface
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Per-user access token; falls back to the public key when absent
    access_token: parking_lot::RwLock<Option<String>>,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: parking_lot::RwLock::new(None),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.backend_url.clone(), config.api_key.clone())
    }

    /// Attach or clear the signed-in user's access token. Requests carry
    /// it as the bearer credential so row-level security applies.
    pub fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write() = token;
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let bearer = self
            .access_token
            .read()
            .clone()
            .unwrap_or_else(|| self.api_key.clone());
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    async fn check(&self, response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body).unwrap_or(body);
        error!(%status, context, "backend request failed: {}", message);
        Err(OpsdeskError::Backend(format!("{} ({})", message, status)))
    }
}

#[async_trait]
impl BackendClient for RestBackend {
    async fn select(&self, collection: &str, options: &QueryOptions) -> Result<Vec<Value>> {
        // An empty IN list can match nothing; skip the round trip.
        if options.filter.as_ref().map_or(false, Filter::is_vacuous) {
            return Ok(Vec::new());
        }

        let mut query = query_params(options);
        if options.select.is_none() {
            query.push(("select".to_string(), "*".to_string()));
        }

        let request = self.client.get(self.collection_url(collection)).query(&query);
        let response = self.authorize(request).send().await?;
        let response = self.check(response, collection).await?;
        Ok(response.json().await?)
    }

    async fn select_by_id(
        &self,
        collection: &str,
        id: &str,
        select: Option<&str>,
    ) -> Result<Option<Value>> {
        let query = vec![
            ("select".to_string(), select.unwrap_or("*").to_string()),
            ("id".to_string(), format!("eq.{}", id)),
            ("limit".to_string(), "1".to_string()),
        ];

        let request = self.client.get(self.collection_url(collection)).query(&query);
        let response = self.authorize(request).send().await?;
        let response = self.check(response, collection).await?;
        let mut rows: Vec<Value> = response.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn insert(&self, collection: &str, row: Value) -> Result<Value> {
        let request = self
            .client
            .post(self.collection_url(collection))
            .header("Prefer", "return=representation")
            .json(&row);
        let response = self.authorize(request).send().await?;
        let response = self.check(response, collection).await?;
        let mut rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            return Err(OpsdeskError::Backend(format!(
                "insert returned no representation: {}",
                collection
            )));
        }
        Ok(rows.remove(0))
    }

    async fn update(&self, collection: &str, id: &str, changes: Value) -> Result<Value> {
        let request = self
            .client
            .patch(self.collection_url(collection))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&changes);
        let response = self.authorize(request).send().await?;
        let response = self.check(response, collection).await?;
        let mut rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            // PostgREST reports a zero-row patch as an empty representation
            return Err(OpsdeskError::Backend(format!(
                "no row matched update: {}/{}",
                collection, id
            )));
        }
        Ok(rows.remove(0))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.collection_url(collection))
            .query(&[("id", format!("eq.{}", id))]);
        let response = self.authorize(request).send().await?;
        self.check(response, collection).await?;
        Ok(())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        if filter.is_vacuous() {
            return Ok(0);
        }

        let options = QueryOptions::new().filter(filter.clone());
        let mut query = query_params(&options);
        query.push(("select".to_string(), "id".to_string()));
        query.push(("limit".to_string(), "1".to_string()));

        let request = self
            .client
            .get(self.collection_url(collection))
            .query(&query)
            .header("Prefer", "count=exact");
        let response = self.authorize(request).send().await?;
        let response = self.check(response, collection).await?;

        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| {
                OpsdeskError::Backend("count response missing Content-Range total".to_string())
            })?;
        Ok(total)
    }
}

/// Build PostgREST query parameters from the options object
fn query_params(options: &QueryOptions) -> Vec<(String, String)> {
    let mut query = Vec::new();

    if let Some(projection) = &options.select {
        query.push(("select".to_string(), projection.clone()));
    }

    if let Some(filter) = &options.filter {
        for (field, clause) in filter.clauses() {
            let operand = match clause {
                FilterValue::Eq(value) => format!("eq.{}", literal(value)),
                FilterValue::In(values) => format!(
                    "in.({})",
                    values.iter().map(literal).collect::<Vec<_>>().join(",")
                ),
            };
            query.push((field.clone(), operand));
        }
    }

    if let Some(order) = &options.order_by {
        let direction = if order.ascending { "asc" } else { "desc" };
        query.push(("order".to_string(), format!("{}.{}", order.field, direction)));
    }

    if let Some(limit) = options.limit {
        query.push(("limit".to_string(), limit.to_string()));
    }

    query
}

/// Render a JSON scalar as a PostgREST literal. Strings containing
/// reserved characters are double-quoted.
fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => {
            if s.contains([',', '(', ')', '"']) {
                format!("\"{}\"", s.replace('"', "\\\""))
            } else {
                s.clone()
            }
        }
        other => other.to_string(),
    }
}

/// `Content-Range: 0-24/3573` — the total follows the slash
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

fn extract_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    parsed
        .get("message")
        .or_else(|| parsed.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
