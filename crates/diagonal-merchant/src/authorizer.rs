use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::eip712::OrgContract;
use crate::nonce::NonceSource;
use crate::signer::{ChargeRequest, ChargeSigner, SignedPayload};
use crate::tokens::TokenRegistry;
use crate::DiagonalError;

/// Fetches the current nonce for a charge source and signs the charge with it.
///
/// Fetch-then-sign is not atomic with respect to the contract's nonce counter,
/// so it runs under a per-source mutex. Charges for different sources proceed
/// in parallel.
pub struct ChargeAuthorizer<N> {
    signer: ChargeSigner,
    nonce_source: N,
    contract: OrgContract,
    source_locks: Arc<DashMap<Address, Arc<Mutex<()>>>>,
}

impl<N> ChargeAuthorizer<N> {
    /// Upper bound on tracked sources. The check is not atomic with the
    /// insert, so it can be overshot by the number of concurrent callers.
    const MAX_SOURCE_LOCKS: usize = 100_000;

    pub fn new(signer: ChargeSigner, nonce_source: N, contract: OrgContract) -> Self {
        Self {
            signer,
            nonce_source,
            contract,
            source_locks: Arc::new(DashMap::new()),
        }
    }

    pub fn signer(&self) -> &ChargeSigner {
        &self.signer
    }

    pub fn nonce_source(&self) -> &N {
        &self.nonce_source
    }

    pub fn contract(&self) -> &OrgContract {
        &self.contract
    }

    pub fn tokens(&self) -> &TokenRegistry {
        self.signer.tokens()
    }

    /// Number of sources that currently have a lock entry.
    pub fn tracked_sources(&self) -> usize {
        self.source_locks.len()
    }

    fn source_lock(&self, source: Address) -> Result<Arc<Mutex<()>>, DiagonalError> {
        if self.source_locks.len() >= Self::MAX_SOURCE_LOCKS
            && !self.source_locks.contains_key(&source)
        {
            return Err(DiagonalError::TooManySources);
        }
        Ok(self
            .source_locks
            .entry(source)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// Drop lock entries nobody holds or waits on. Returns how many were removed.
    pub fn purge_idle_locks(&self) -> usize {
        purge_idle(&self.source_locks)
    }

    /// Spawn a task that purges idle source locks every `period`.
    pub fn start_lock_cleanup(&self, period: Duration) {
        let source_locks = Arc::clone(&self.source_locks);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let removed = purge_idle(&source_locks);
                if removed > 0 {
                    tracing::info!(removed, "cleaned up idle source locks");
                }
            }
        });
    }
}

// An entry is removable only when the map holds the sole Arc and the mutex is
// free; checking both keeps a concurrent source_lock() clone from ending up on
// a different mutex than a later caller.
fn purge_idle(locks: &DashMap<Address, Arc<Mutex<()>>>) -> usize {
    let before = locks.len();
    locks.retain(|_, lock| Arc::strong_count(lock) > 1 || lock.try_lock().is_err());
    before.saturating_sub(locks.len())
}

impl<N: NonceSource> ChargeAuthorizer<N> {
    /// Sign `request` with the nonce the contract currently expects for its
    /// source.
    pub async fn authorize_charge(
        &self,
        request: &ChargeRequest,
    ) -> Result<SignedPayload, DiagonalError> {
        let lock = self.source_lock(request.source)?;
        let _guard = lock.lock().await;

        let nonce = self
            .nonce_source
            .charge_nonce(request.source, self.contract.address)
            .await?;
        let signed = self.signer.sign_charge(request, &self.contract, nonce)?;

        tracing::info!(
            charge_id = %request.id,
            source = %request.source,
            nonce = %nonce,
            "charge authorized"
        );
        Ok(signed)
    }
}
