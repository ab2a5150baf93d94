/// HTTP client for the review server
///
/// Wraps the pipeline's review endpoints (item list, item detail, state
/// patch, re-run) and plain asset downloads using [`reqwest`].

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::state::data::{
    ItemDetail, ItemState, ItemSummary, ItemsEnvelope, RerunRequest, RerunResponse, StateEnvelope,
    StatePatch,
};

/// Errors from the review API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, timeout, ...).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("review server error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The body was not the JSON we expected.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ReviewApi {
    client: reqwest::Client,
    base_url: String,
}

impl ReviewApi {
    /// * `base_url` - server root, e.g. `http://127.0.0.1:8000`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a server-relative URL (`/api/public/...`) against the base.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }

    /// `GET /api/items`
    pub async fn list_items(&self) -> Result<Vec<ItemSummary>, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/items", self.base_url))
            .send()
            .await?;

        let envelope: ItemsEnvelope = Self::parse_response(response).await?;
        Ok(envelope.into_items())
    }

    /// `GET /api/item/{id}`
    pub async fn get_item(&self, id: &str) -> Result<ItemDetail, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/item/{}", self.base_url, id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// `POST /api/item/{id}/state` with a partial patch. Returns the
    /// updated state as persisted.
    pub async fn update_state(&self, id: &str, patch: &StatePatch) -> Result<ItemState, ApiError> {
        let response = self
            .client
            .post(format!("{}/api/item/{}/state", self.base_url, id))
            .json(patch)
            .send()
            .await?;

        let envelope: StateEnvelope = Self::parse_response(response).await?;
        Ok(envelope.into_state())
    }

    /// `POST /api/item/{id}/rerun`
    pub async fn rerun(&self, id: &str, refine_bbox: bool) -> Result<RerunResponse, ApiError> {
        let response = self
            .client
            .post(format!("{}/api/item/{}/rerun", self.base_url, id))
            .json(&RerunRequest { refine_bbox })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Download an asset (photo, preview raster, SVG).
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.client.get(self.resolve(url)).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Decode a successful JSON body. Decoding goes through serde_json
    /// directly so shape mismatches are reported as [`ApiError::Decode`].
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> ReviewApi {
        ReviewApi::new("http://127.0.0.1:8000/", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_base_url_is_trimmed() {
        assert_eq!(api().base_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn test_resolve() {
        let api = api();
        assert_eq!(
            api.resolve("/api/public/screens/kit.svg"),
            "http://127.0.0.1:8000/api/public/screens/kit.svg"
        );
        assert_eq!(
            api.resolve("api/public/x.png"),
            "http://127.0.0.1:8000/api/public/x.png"
        );
        assert_eq!(
            api.resolve("https://cdn.example.com/x.png"),
            "https://cdn.example.com/x.png"
        );
    }

    #[test]
    fn test_status_error_message() {
        let error = ApiError::Status {
            status: 404,
            body: "{\"detail\":\"Item not found\"}".into(),
        };
        assert_eq!(
            error.to_string(),
            "review server error (404): {\"detail\":\"Item not found\"}"
        );
    }
}
