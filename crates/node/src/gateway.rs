//! HTTP client for the blob storage gateway.

use crate::NodeError;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Result of uploading a blob: the gateway computes the commitment and signs
/// the storage credential the chain expects alongside `addFile`.
#[derive(Clone, Debug, Deserialize)]
pub struct PutObjectResponse {
    /// Hex of the blob's KZG commitment.
    pub commit: String,
    /// Stored size in bytes.
    pub size: i64,
    /// Storage term start, unix seconds.
    pub start: i64,
    /// Storage term end, unix seconds.
    pub end: i64,
    /// Credential signature over (from, commit, size, start, end).
    pub signature: String,
    /// Gateway-side blob id, used for later retrieval.
    pub mid: String,
}

/// Client for the storage gateway's object API.
#[derive(Clone, Debug)]
pub struct GatewayClient {
    base: String,
    token: Option<String>,
    inner: Client,
}

impl GatewayClient {
    /// Binds the client to a gateway base url, with an optional access token.
    pub fn new(base: impl Into<String>, token: Option<String>) -> Result<Self, NodeError> {
        let inner = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| NodeError::Fatal(format!("gateway client: {e}")))?;
        Ok(Self {
            base: base.into(),
            token,
            inner,
        })
    }

    fn request(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Fetches raw blob bytes by id.
    pub async fn get_object(&self, id: &str) -> Result<Vec<u8>, NodeError> {
        let url = format!("{}/getObject", self.base);
        let res = self
            .request(self.inner.get(url).query(&[("id", id)]))
            .send()
            .await
            .map_err(|e| NodeError::Gateway(e.to_string()))?;

        let status = res.status();
        let body = res
            .bytes()
            .await
            .map_err(|e| NodeError::Gateway(e.to_string()))?;
        if !status.is_success() {
            return Err(NodeError::Gateway(format!(
                "getObject returned {status}: {}",
                String::from_utf8_lossy(&body)
            )));
        }
        Ok(body.to_vec())
    }

    /// Uploads a blob on behalf of `from`.
    pub async fn put_object(
        &self,
        data: &[u8],
        from: &str,
    ) -> Result<PutObjectResponse, NodeError> {
        let url = format!("{}/putObject", self.base);
        let payload = serde_json::json!({
            "data": alloy_primitives::hex::encode(data),
            "from": from,
        });
        let res = self
            .request(self.inner.post(url).json(&payload))
            .send()
            .await
            .map_err(|e| NodeError::Gateway(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(NodeError::Gateway(format!(
                "putObject returned {status}: {body}"
            )));
        }
        res.json()
            .await
            .map_err(|e| NodeError::Gateway(format!("putObject response: {e}")))
    }

    /// Makes sure the gateway's backing bucket exists.
    pub async fn warmup(&self) -> Result<(), NodeError> {
        let url = format!("{}/warmup", self.base);
        let res = self
            .request(self.inner.get(url))
            .send()
            .await
            .map_err(|e| NodeError::Gateway(e.to_string()))?;
        if !res.status().is_success() {
            return Err(NodeError::Gateway(format!(
                "warmup returned {}",
                res.status()
            )));
        }
        Ok(())
    }
}
