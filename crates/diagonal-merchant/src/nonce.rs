//! Source of the per-source charge nonce.
//!
//! The organization contract tracks one nonce per charge source and only
//! accepts a charge signature over the current value, so it is read fresh
//! for every signing.

use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::providers::Provider;

use crate::{DiagonalError, DiagonalOrg};

/// Reads the nonce the organization contract expects for a charge source.
pub trait NonceSource: Send + Sync {
    fn charge_nonce(
        &self,
        source: Address,
        contract: Address,
    ) -> impl std::future::Future<Output = Result<U256, DiagonalError>> + Send;
}

/// [`NonceSource`] backed by `chargeNonces(address)` over JSON-RPC.
pub struct OnChainNonceSource<P> {
    provider: P,
    timeout: Duration,
}

impl<P> OnChainNonceSource<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(10),
        }
    }

    /// Bound on each RPC call. A read that exceeds it fails with a retryable
    /// [`DiagonalError::ChainError`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Check RPC connectivity by fetching the latest block number.
    pub async fn health_check(&self) -> Result<u64, DiagonalError>
    where
        P: Provider + Send + Sync,
    {
        tokio::time::timeout(self.timeout, self.provider.get_block_number())
            .await
            .map_err(|_| DiagonalError::ChainError("health check timed out".to_string()))?
            .map_err(|e| DiagonalError::ChainError(format!("health check failed: {e}")))
    }

    /// Chain ID reported by the RPC endpoint.
    pub async fn chain_id(&self) -> Result<u64, DiagonalError>
    where
        P: Provider + Send + Sync,
    {
        tokio::time::timeout(self.timeout, self.provider.get_chain_id())
            .await
            .map_err(|_| DiagonalError::ChainError("eth_chainId timed out".to_string()))?
            .map_err(|e| DiagonalError::ChainError(format!("eth_chainId failed: {e}")))
    }
}

impl<P> NonceSource for OnChainNonceSource<P>
where
    P: Provider + Send + Sync,
{
    async fn charge_nonce(&self, source: Address, contract: Address) -> Result<U256, DiagonalError> {
        let org = DiagonalOrg::new(contract, &self.provider);
        let call = org.chargeNonces(source);
        let nonce = tokio::time::timeout(self.timeout, call.call())
            .await
            .map_err(|_| {
                DiagonalError::ChainError(format!(
                    "chargeNonces timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| DiagonalError::ChainError(format!("chargeNonces failed: {e}")))?;
        tracing::debug!(%source, %contract, %nonce, "fetched charge nonce");
        Ok(nonce)
    }
}
