//! Search index collaborator
//!
//! The index itself is an external system; the target only needs to save
//! object batches and push settings. The trait keeps the sink testable
//! with an in-memory fake.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::TargetConfig;
use crate::error::TargetError;

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Upsert a batch of objects (each must carry `objectID`).
    async fn save_objects(&self, index: &str, objects: &[Value]) -> Result<(), TargetError>;

    /// Replace the index settings.
    async fn set_settings(&self, index: &str, settings: &Value) -> Result<(), TargetError>;
}

/// Algolia-style REST implementation
pub struct HttpSearchIndex {
    client: reqwest::Client,
    base_url: String,
    app_id: String,
    api_key: String,
}

impl HttpSearchIndex {
    pub fn new(config: &TargetConfig, timeout: Duration) -> Result<Self, TargetError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}.algolia.net", config.app_id.to_lowercase()));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TargetError::Index(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            app_id: config.app_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<(), TargetError> {
        let response = request
            .header("X-Algolia-Application-Id", &self.app_id)
            .header("X-Algolia-API-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| TargetError::Index(format!("{}: {}", context, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TargetError::Index(format!(
                "{} returned {}: {}",
                context, status, body
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn save_objects(&self, index: &str, objects: &[Value]) -> Result<(), TargetError> {
        let requests: Vec<Value> = objects
            .iter()
            .map(|body| json!({"action": "addObject", "body": body}))
            .collect();
        let url = format!("{}/1/indexes/{}/batch", self.base_url, index);
        self.send(
            self.client.post(&url).json(&json!({"requests": requests})),
            &url,
        )
        .await
    }

    async fn set_settings(&self, index: &str, settings: &Value) -> Result<(), TargetError> {
        let url = format!("{}/1/indexes/{}/settings", self.base_url, index);
        self.send(self.client.put(&url).json(settings), &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url_derives_from_app_id() {
        let config = TargetConfig {
            app_id: "APP123".to_string(),
            api_key: "key".to_string(),
            index_mapping_file: "indexes.toml".into(),
            base_url: None,
        };
        let index = HttpSearchIndex::new(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(index.base_url, "https://app123.algolia.net");
    }

    #[test]
    fn test_base_url_override() {
        let config = TargetConfig {
            app_id: "APP123".to_string(),
            api_key: "key".to_string(),
            index_mapping_file: "indexes.toml".into(),
            base_url: Some("http://localhost:8080".to_string()),
        };
        let index = HttpSearchIndex::new(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(index.base_url, "http://localhost:8080");
    }
}
