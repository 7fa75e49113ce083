//! EIP-712 typed-data hashing for the organization contract.
//!
//! - Domain: `DiagonalOrg` / `1` bound to a chain ID and contract address ([`OrgContract`])
//! - Charge and withdrawal structs go through the `sol!`-derived [`SolStruct`] impls
//! - Charge batches are hashed over the plain ABI encoding of their arrays, which
//!   is what the verifying contract does ([`charge_batch_struct_hash`])

use std::borrow::Cow;

use alloy::primitives::{keccak256, Address, B256, U256};
use alloy::sol_types::{Eip712Domain, SolStruct, SolValue};

use crate::constants::{CHARGE_BATCH_TYPE, DOMAIN_NAME, DOMAIN_VERSION};
use crate::{Charge, Withdrawal};

/// A deployed organization contract on a specific chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrgContract {
    pub address: Address,
    pub chain_id: u64,
}

impl OrgContract {
    pub fn new(address: Address, chain_id: u64) -> Self {
        Self { address, chain_id }
    }

    /// Build the EIP-712 domain. Recomputed on every call; a domain is never
    /// shared between chain/contract pairs.
    pub fn domain(&self) -> Eip712Domain {
        Eip712Domain {
            name: Some(Cow::Borrowed(DOMAIN_NAME)),
            version: Some(Cow::Borrowed(DOMAIN_VERSION)),
            chain_id: Some(U256::from(self.chain_id)),
            verifying_contract: Some(self.address),
            salt: None,
        }
    }

    pub fn domain_separator(&self) -> B256 {
        self.domain().separator()
    }
}

/// Charges are identified on-chain by the keccak-256 of their string ID.
pub fn charge_id_hash(id: &str) -> B256 {
    keccak256(id.as_bytes())
}

/// `keccak256("\x19\x01" || domainSeparator || structHash)`.
pub fn typed_data_digest(domain_separator: B256, struct_hash: B256) -> B256 {
    let mut buf = [0u8; 66];
    buf[0] = 0x19;
    buf[1] = 0x01;
    buf[2..34].copy_from_slice(domain_separator.as_slice());
    buf[34..].copy_from_slice(struct_hash.as_slice());
    keccak256(buf)
}

pub fn charge_struct_hash(charge: &Charge) -> B256 {
    charge.eip712_hash_struct()
}

pub fn charge_digest(charge: &Charge, contract: &OrgContract) -> B256 {
    charge.eip712_signing_hash(&contract.domain())
}

pub fn withdrawal_struct_hash(withdrawal: &Withdrawal) -> B256 {
    withdrawal.eip712_hash_struct()
}

pub fn withdrawal_digest(withdrawal: &Withdrawal, contract: &OrgContract) -> B256 {
    withdrawal.eip712_signing_hash(&contract.domain())
}

/// Typed-data payload for charging several sources in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeBatch {
    pub id: B256,
    pub sources: Vec<Address>,
    pub tokens: Vec<Address>,
    pub amounts: Vec<U256>,
    pub nonce: U256,
}

pub fn charge_batch_type_hash() -> B256 {
    keccak256(CHARGE_BATCH_TYPE.as_bytes())
}

pub fn charge_batch_struct_hash(batch: &ChargeBatch) -> B256 {
    let encoded = (
        charge_batch_type_hash(),
        batch.id,
        batch.sources.clone(),
        batch.tokens.clone(),
        batch.amounts.clone(),
        batch.nonce,
    )
        .abi_encode_params();
    keccak256(encoded)
}

pub fn charge_batch_digest(batch: &ChargeBatch, contract: &OrgContract) -> B256 {
    typed_data_digest(contract.domain_separator(), charge_batch_struct_hash(batch))
}
