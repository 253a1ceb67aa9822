//! Binary object storage
//!
//! Adapter over the hosted backend's bucket API: upload, public URL,
//! delete, list. Content hashes are SHA-256; the in-memory store backs
//! tests and demos.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::error;

use crate::config::AppConfig;
use crate::error::{OpsdeskError, Result};

/// A stored object, as returned by `upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    /// Key within the bucket
    pub key: String,
    /// Public URL
    pub url: String,
    pub content_type: String,
    pub size: usize,
    /// SHA-256 content hash
    pub hash: String,
}

/// Listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub key: String,
    pub size: usize,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

/// Binary object storage over the backend collaborator
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes under a key; overwrites an existing object
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<StoredObject>;

    /// Public URL for an object
    fn public_url(&self, bucket: &str, key: &str) -> String;

    /// Delete an object; absent keys succeed
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;

    /// List objects under a prefix
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>>;
}

/// Compute SHA-256 hash of data
fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Detect content type from file extension
pub fn content_type_from_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" | "md" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Object storage over the hosted backend's HTTP bucket API
pub struct RestObjectStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestObjectStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.backend_url.clone(), config.api_key.clone())
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, key)
    }

    async fn check(&self, response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!(%status, context, "storage request failed: {}", body);
        Err(OpsdeskError::Backend(format!("{} ({})", body, status)))
    }
}

#[async_trait]
impl ObjectStore for RestObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<StoredObject> {
        let response = self
            .client
            .post(self.object_url(bucket, key))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(data.to_vec())
            .send()
            .await?;
        self.check(response, bucket).await?;

        Ok(StoredObject {
            key: key.to_string(),
            url: self.public_url(bucket, key),
            content_type: content_type.to_string(),
            size: data.len(),
            hash: compute_hash(data),
        })
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, key)
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.object_url(bucket, key))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;
        // Missing objects delete successfully
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        self.check(response, bucket).await?;
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        #[derive(Deserialize)]
        struct Entry {
            name: String,
            #[serde(default)]
            metadata: Option<EntryMetadata>,
            created_at: Option<DateTime<Utc>>,
        }
        #[derive(Deserialize)]
        struct EntryMetadata {
            #[serde(default)]
            size: usize,
            #[serde(rename = "mimetype", default)]
            mime_type: Option<String>,
        }

        let response = self
            .client
            .post(format!("{}/storage/v1/object/list/{}", self.base_url, bucket))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({ "prefix": prefix }))
            .send()
            .await?;
        let response = self.check(response, bucket).await?;
        let entries: Vec<Entry> = response.json().await?;

        Ok(entries
            .into_iter()
            .map(|e| ObjectInfo {
                key: e.name,
                size: e.metadata.as_ref().map(|m| m.size).unwrap_or(0),
                content_type: e
                    .metadata
                    .and_then(|m| m.mime_type)
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                created_at: e.created_at.unwrap_or_else(Utc::now),
            })
            .collect())
    }
}

/// In-memory object store for tests and demos
#[derive(Default)]
pub struct MemoryObjectStore {
    // bucket -> key -> (data, content_type, created_at)
    buckets: RwLock<HashMap<String, HashMap<String, (Vec<u8>, String, DateTime<Utc>)>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.buckets
            .read()
            .get(bucket)
            .and_then(|b| b.get(key))
            .map(|(data, _, _)| data.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<StoredObject> {
        self.buckets
            .write()
            .entry(bucket.to_string())
            .or_default()
            .insert(
                key.to_string(),
                (data.to_vec(), content_type.to_string(), Utc::now()),
            );

        Ok(StoredObject {
            key: key.to_string(),
            url: self.public_url(bucket, key),
            content_type: content_type.to_string(),
            size: data.len(),
            hash: compute_hash(data),
        })
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("memory://{}/{}", bucket, key)
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        if let Some(objects) = self.buckets.write().get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let buckets = self.buckets.read();
        let mut infos: Vec<ObjectInfo> = buckets
            .get(bucket)
            .map(|objects| {
                objects
                    .iter()
                    .filter(|(key, _)| key.starts_with(prefix))
                    .map(|(key, (data, content_type, created_at))| ObjectInfo {
                        key: key.clone(),
                        size: data.len(),
                        content_type: content_type.clone(),
                        created_at: *created_at,
                    })
                    .collect()
            })
            .unwrap_or_default();
        infos.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(infos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_and_list() {
        let store = MemoryObjectStore::new();
        let uploaded = store
            .upload("contracts", "2026/msa.pdf", b"pdf bytes", "application/pdf")
            .await
            .unwrap();
        assert_eq!(uploaded.size, 9);
        assert_eq!(uploaded.hash, compute_hash(b"pdf bytes"));

        let listed = store.list("contracts", "2026/").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "2026/msa.pdf");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryObjectStore::new();
        store
            .upload("brand", "logo.svg", b"<svg/>", "image/svg+xml")
            .await
            .unwrap();
        store.delete("brand", "logo.svg").await.unwrap();
        store.delete("brand", "logo.svg").await.unwrap();
        assert!(store.get("brand", "logo.svg").is_none());
    }

    #[test]
    fn test_content_type_lookup() {
        assert_eq!(content_type_from_extension("PNG"), "image/png");
        assert_eq!(content_type_from_extension("pdf"), "application/pdf");
        assert_eq!(content_type_from_extension("xyz"), "application/octet-stream");
    }
}
