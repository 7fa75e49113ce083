//! Charge, batch and withdrawal signing.
//!
//! Every request goes through the same pipeline: hash the string ID, convert
//! decimal amounts with the token's precision, build the typed-data digest for
//! the organization contract, and sign it with deterministic ECDSA (RFC 6979).
//! Nothing is returned unless every step succeeds.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, Signature, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use serde::{Deserialize, Serialize};

use crate::amount::parse_units;
use crate::eip712::{
    charge_batch_digest, charge_digest, charge_id_hash, withdrawal_digest, ChargeBatch,
    OrgContract,
};
use crate::tokens::TokenRegistry;
use crate::{Charge, DiagonalError, Withdrawal};

/// Parse a `0x`-prefixed (or bare) hex address.
pub fn parse_address(raw: &str) -> Result<Address, DiagonalError> {
    Address::from_str(raw.trim()).map_err(|_| DiagonalError::InvalidAddressFormat(raw.to_string()))
}

/// A single charge to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    /// Diagonal's string charge ID, e.g. `chg_...`.
    pub id: String,
    pub source: Address,
    pub token: Address,
    /// Decimal amount in whole token units.
    pub amount: String,
}

impl ChargeRequest {
    /// Build a request from untyped fields, validating both addresses.
    pub fn parse(
        id: impl Into<String>,
        source: &str,
        token: &str,
        amount: impl Into<String>,
    ) -> Result<Self, DiagonalError> {
        Ok(Self {
            id: id.into(),
            source: parse_address(source)?,
            token: parse_address(token)?,
            amount: amount.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub source: Address,
    pub token: Address,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeBatchRequest {
    pub id: String,
    pub entries: Vec<BatchEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRequest {
    pub id: String,
    pub token: Address,
    pub amount: String,
    pub fee: String,
}

/// Recoverable ECDSA signature in the `{ v, r, s }` form the capture API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeSignature {
    /// 27 or 28.
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

impl ChargeSignature {
    /// 65-byte `r || s || v` form.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(self.r.as_slice());
        out[32..64].copy_from_slice(self.s.as_slice());
        out[64] = self.v;
        out
    }

    pub fn to_signature(&self) -> Result<Signature, DiagonalError> {
        Signature::from_raw(&self.to_bytes())
            .map_err(|e| DiagonalError::InvalidPayload(format!("invalid signature: {e}")))
    }
}

impl From<Signature> for ChargeSignature {
    fn from(sig: Signature) -> Self {
        Self {
            v: 27 + u8::from(sig.v()),
            r: B256::from(sig.r().to_be_bytes::<32>()),
            s: B256::from(sig.s().to_be_bytes::<32>()),
        }
    }
}

/// A digest together with its signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignedPayload {
    pub digest: B256,
    pub signature: ChargeSignature,
}

/// Recover the signing address from a digest and signature.
pub fn recover_signer(digest: &B256, signature: &ChargeSignature) -> Result<Address, DiagonalError> {
    signature
        .to_signature()?
        .recover_address_from_prehash(digest)
        .map_err(|e| DiagonalError::InvalidPayload(format!("recovery failed: {e}")))
}

/// Holds the service's signing key and the token table used for amount conversion.
#[derive(Clone)]
pub struct ChargeSigner {
    key: PrivateKeySigner,
    tokens: TokenRegistry,
}

impl fmt::Debug for ChargeSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChargeSigner")
            .field("address", &self.key.address())
            .finish_non_exhaustive()
    }
}

impl ChargeSigner {
    pub fn new(key: PrivateKeySigner, tokens: TokenRegistry) -> Self {
        Self { key, tokens }
    }

    /// Load a hex-encoded secp256k1 private key.
    pub fn from_private_key(hex_key: &str, tokens: TokenRegistry) -> Result<Self, DiagonalError> {
        if hex_key.trim().is_empty() {
            return Err(DiagonalError::SigningKeyUnavailable(
                "no private key configured".to_string(),
            ));
        }
        let key = PrivateKeySigner::from_str(hex_key.trim()).map_err(|_| {
            DiagonalError::SigningKeyUnavailable("private key is not valid secp256k1 hex".to_string())
        })?;
        Ok(Self::new(key, tokens))
    }

    pub fn address(&self) -> Address {
        self.key.address()
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    fn to_units(&self, amount: &str, token: Address, chain_id: u64) -> Result<U256, DiagonalError> {
        let decimals = self.tokens.decimals(token, chain_id)?;
        parse_units(amount, decimals)
    }

    /// Sign a 32-byte digest directly.
    pub fn sign_digest(&self, digest: &B256) -> Result<ChargeSignature, DiagonalError> {
        self.key
            .sign_hash_sync(digest)
            .map(ChargeSignature::from)
            .map_err(|e| DiagonalError::SigningKeyUnavailable(format!("signing failed: {e}")))
    }

    /// Build the typed `Charge` struct for `request` at `nonce`.
    pub fn charge_struct(
        &self,
        request: &ChargeRequest,
        contract: &OrgContract,
        nonce: U256,
    ) -> Result<Charge, DiagonalError> {
        Ok(Charge {
            id: charge_id_hash(&request.id),
            source: request.source,
            token: request.token,
            amount: self.to_units(&request.amount, request.token, contract.chain_id)?,
            nonce,
        })
    }

    /// Sign a charge. `nonce` must be the value the contract currently expects
    /// for `request.source`; fetch it fresh for every call.
    pub fn sign_charge(
        &self,
        request: &ChargeRequest,
        contract: &OrgContract,
        nonce: U256,
    ) -> Result<SignedPayload, DiagonalError> {
        let charge = self.charge_struct(request, contract, nonce)?;
        let digest = charge_digest(&charge, contract);
        let signature = self.sign_digest(&digest)?;
        tracing::debug!(
            charge_id = %request.id,
            source = %request.source,
            amount = %charge.amount,
            nonce = %nonce,
            chain_id = contract.chain_id,
            "charge signed"
        );
        Ok(SignedPayload { digest, signature })
    }

    pub fn sign_charge_batch(
        &self,
        request: &ChargeBatchRequest,
        contract: &OrgContract,
        nonce: U256,
    ) -> Result<SignedPayload, DiagonalError> {
        if request.entries.is_empty() {
            return Err(DiagonalError::InvalidBatch("batch has no entries".to_string()));
        }

        let mut batch = ChargeBatch {
            id: charge_id_hash(&request.id),
            sources: Vec::with_capacity(request.entries.len()),
            tokens: Vec::with_capacity(request.entries.len()),
            amounts: Vec::with_capacity(request.entries.len()),
            nonce,
        };
        for entry in &request.entries {
            batch.sources.push(entry.source);
            batch.tokens.push(entry.token);
            batch
                .amounts
                .push(self.to_units(&entry.amount, entry.token, contract.chain_id)?);
        }

        let digest = charge_batch_digest(&batch, contract);
        let signature = self.sign_digest(&digest)?;
        tracing::debug!(
            batch_id = %request.id,
            entries = request.entries.len(),
            nonce = %nonce,
            "charge batch signed"
        );
        Ok(SignedPayload { digest, signature })
    }

    pub fn sign_withdrawal(
        &self,
        request: &WithdrawalRequest,
        contract: &OrgContract,
        nonce: U256,
    ) -> Result<SignedPayload, DiagonalError> {
        let withdrawal = Withdrawal {
            id: charge_id_hash(&request.id),
            token: request.token,
            amount: self.to_units(&request.amount, request.token, contract.chain_id)?,
            fee: self.to_units(&request.fee, request.token, contract.chain_id)?,
            nonce,
        };
        let digest = withdrawal_digest(&withdrawal, contract);
        let signature = self.sign_digest(&digest)?;
        tracing::debug!(withdrawal_id = %request.id, nonce = %nonce, "withdrawal signed");
        Ok(SignedPayload { digest, signature })
    }
}
