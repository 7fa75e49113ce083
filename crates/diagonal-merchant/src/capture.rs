//! Submitting a signed charge back to Diagonal.

use std::time::Duration;

use reqwest::StatusCode;

use crate::constants::DEFAULT_API_BASE_URL;
use crate::signer::ChargeSignature;
use crate::DiagonalError;

/// Forwards a charge signature to the party that executes the charge.
pub trait ChargeCapture: Send + Sync {
    fn capture(
        &self,
        charge_id: &str,
        signature: &ChargeSignature,
    ) -> impl std::future::Future<Output = Result<(), DiagonalError>> + Send;
}

/// `PUT {base}/v1/charges/{id}/capture` against the Diagonal API.
#[derive(Clone)]
pub struct HttpCaptureClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl std::fmt::Debug for HttpCaptureClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCaptureClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl HttpCaptureClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_API_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn capture_url(&self, charge_id: &str) -> Result<String, DiagonalError> {
        let valid = !charge_id.is_empty()
            && charge_id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if !valid {
            return Err(DiagonalError::InvalidPayload(format!(
                "charge id '{charge_id}' is not URL safe"
            )));
        }
        Ok(format!("{}/v1/charges/{charge_id}/capture", self.base_url))
    }
}

impl ChargeCapture for HttpCaptureClient {
    async fn capture(
        &self,
        charge_id: &str,
        signature: &ChargeSignature,
    ) -> Result<(), DiagonalError> {
        let url = self.capture_url(charge_id)?;
        let body = serde_json::json!({ "signature": signature });

        let resp = self
            .client
            .put(&url)
            .header("x-api-key", &self.api_key)
            .header("Idempotency-Key", charge_id)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DiagonalError::CaptureFailed(format!("capture request failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            tracing::info!(charge_id, "charge captured");
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(charge_id, status = status.as_u16(), "capture not accepted");
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Err(DiagonalError::CaptureFailed(format!(
                "capture returned {status}"
            )))
        } else {
            Err(DiagonalError::CaptureRejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}
