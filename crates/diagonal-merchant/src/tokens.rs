use std::collections::HashMap;

use alloy::primitives::Address;

use crate::constants::{
    DAI_ETHEREUM, DAI_GOERLI, ETHEREUM_CHAIN_ID, GOERLI_CHAIN_ID, USDC_ETHEREUM, USDC_GOERLI,
};
use crate::event::Token;
use crate::DiagonalError;

/// A token deployment on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfo {
    pub token: Token,
    pub address: Address,
    pub decimals: u8,
}

/// Static `(token, chain) -> (address, decimals)` table.
///
/// Lookups fail closed: an unlisted pair is an error, never a default
/// precision.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    by_address: HashMap<(u64, Address), TokenInfo>,
    by_symbol: HashMap<(u64, Token), Address>,
}

impl TokenRegistry {
    pub fn empty() -> Self {
        Self {
            by_address: HashMap::new(),
            by_symbol: HashMap::new(),
        }
    }

    /// Register (or replace) a token deployment on `chain_id`.
    pub fn with_token(mut self, chain_id: u64, info: TokenInfo) -> Self {
        self.insert(chain_id, info);
        self
    }

    pub fn insert(&mut self, chain_id: u64, info: TokenInfo) {
        if let Some(existing) = self.by_address.get(&(chain_id, info.address)) {
            if existing.token != info.token {
                self.by_symbol.remove(&(chain_id, existing.token));
            }
        }
        if let Some(previous) = self.by_symbol.insert((chain_id, info.token), info.address) {
            self.by_address.remove(&(chain_id, previous));
        }
        self.by_address.insert((chain_id, info.address), info);
    }

    /// Look up a deployment by contract address.
    pub fn get(&self, token: Address, chain_id: u64) -> Result<&TokenInfo, DiagonalError> {
        self.by_address
            .get(&(chain_id, token))
            .ok_or_else(|| DiagonalError::UnknownTokenForChain {
                token: token.to_string(),
                chain_id,
            })
    }

    pub fn decimals(&self, token: Address, chain_id: u64) -> Result<u8, DiagonalError> {
        self.get(token, chain_id).map(|info| info.decimals)
    }

    /// Resolve a token symbol to its contract address on `chain_id`.
    pub fn address(&self, token: Token, chain_id: u64) -> Result<Address, DiagonalError> {
        self.by_symbol
            .get(&(chain_id, token))
            .copied()
            .ok_or_else(|| DiagonalError::UnknownTokenForChain {
                token: token.to_string(),
                chain_id,
            })
    }
}

impl Default for TokenRegistry {
    /// DAI and USDC on Ethereum mainnet and Goerli.
    fn default() -> Self {
        let dai = |address| TokenInfo {
            token: Token::Dai,
            address,
            decimals: 18,
        };
        let usdc = |address| TokenInfo {
            token: Token::Usdc,
            address,
            decimals: 6,
        };
        Self::empty()
            .with_token(GOERLI_CHAIN_ID, dai(DAI_GOERLI))
            .with_token(GOERLI_CHAIN_ID, usdc(USDC_GOERLI))
            .with_token(ETHEREUM_CHAIN_ID, dai(DAI_ETHEREUM))
            .with_token(ETHEREUM_CHAIN_ID, usdc(USDC_ETHEREUM))
    }
}
