use alloy::providers::RootProvider;
use diagonal::{ChargeAuthorizer, HttpCaptureClient, OnChainNonceSource, WebhookVerifier};

/// Authorizer type used by the server: nonces read over plain HTTP JSON-RPC.
pub type Authorizer = ChargeAuthorizer<OnChainNonceSource<RootProvider>>;

/// Shared application state for the webhook receiver.
pub struct AppState {
    pub verifier: WebhookVerifier,
    pub authorizer: Authorizer,
    pub capture: HttpCaptureClient,
    /// Lowercased name of the header carrying the webhook signature.
    pub signature_header_key: String,
    /// Bearer token for /metrics. None keeps the endpoint closed.
    pub metrics_token: Option<Vec<u8>>,
}
