//! HTTP pinning-service image store.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{ImageFile, LedgerError};
use crate::ports::ImageStore;

/// Pinning-service reply. Different services name the content id differently.
#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(alias = "IpfsHash", alias = "Hash")]
    cid: String,
}

/// Uploads image bytes to a pinning endpoint and returns `ipfs://<cid>`.
pub struct HttpImageStore {
    client: Client,
    endpoint: String,
}

impl HttpImageStore {
    /// Create a store posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .build()
            .map_err(|e| LedgerError::Network(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

fn ipfs_uri(reply: &str) -> Result<String, LedgerError> {
    let pin: PinResponse = serde_json::from_str(reply)
        .map_err(|e| LedgerError::Network(format!("invalid pinning response: {e}")))?;
    if pin.cid.is_empty() {
        return Err(LedgerError::Network("pinning service returned an empty cid".into()));
    }
    Ok(format!("ipfs://{}", pin.cid))
}

#[async_trait]
impl ImageStore for HttpImageStore {
    async fn upload(&self, image: &ImageFile) -> Result<String, LedgerError> {
        debug!(
            "[ledger] Uploading {} ({} bytes)",
            image.file_name,
            image.bytes.len()
        );
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, image.content_type.as_str())
            .header("X-File-Name", image.file_name.as_str())
            .body(image.bytes.clone())
            .send()
            .await
            .map_err(|e| LedgerError::Network(format!("image upload failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LedgerError::Network(format!("image upload failed: {e}")))?;
        if !status.is_success() {
            warn!("[ledger] Pinning service answered {}", status);
            return Err(LedgerError::Network(format!(
                "image upload rejected with status {status}"
            )));
        }
        ipfs_uri(&body)
    }
}
