//! Build the shared [`AppState`] from a validated [`ServerConfig`].

use alloy::providers::RootProvider;
use diagonal::{
    ChargeAuthorizer, ChargeSigner, DiagonalError, HttpCaptureClient, OnChainNonceSource,
    OrgContract, Token, TokenRegistry, WebhookVerifier,
};

use crate::config::ServerConfig;
use crate::state::AppState;

/// Construct every component the webhook receiver needs.
///
/// Fails on a malformed endpoint secret or signing key, and when the chain ID
/// has to be read from the RPC and that read fails.
pub async fn build_state(config: &ServerConfig) -> Result<AppState, DiagonalError> {
    let verifier = WebhookVerifier::new(&config.endpoint_secret)?;
    let signer =
        ChargeSigner::from_private_key(&config.signing_private_key, TokenRegistry::default())?;

    let provider: RootProvider = RootProvider::new_http(config.rpc_url.clone());
    let nonce_source = OnChainNonceSource::new(provider);

    let chain_id = match config.chain_id {
        Some(id) => id,
        None => nonce_source.chain_id().await?,
    };
    for token in [Token::Dai, Token::Usdc] {
        if signer.tokens().address(token, chain_id).is_err() {
            tracing::warn!(
                %token,
                chain_id,
                "no deployment registered, charges in this token will be rejected"
            );
        }
    }

    let contract = OrgContract::new(config.org_contract_address, chain_id);
    tracing::info!(
        signer = %signer.address(),
        contract = %contract.address,
        chain_id,
        "charge signer ready"
    );

    let authorizer = ChargeAuthorizer::new(signer, nonce_source, contract);
    let capture =
        HttpCaptureClient::with_base_url(config.api_base_url.as_str(), config.api_key.clone());

    Ok(AppState {
        verifier,
        authorizer,
        capture,
        signature_header_key: config.signature_header_key.clone(),
        metrics_token: config.metrics_token.clone().map(String::into_bytes),
    })
}
