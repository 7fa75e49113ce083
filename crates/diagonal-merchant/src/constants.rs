use alloy::primitives::{address, Address};

/// Header carrying the `t=<timestamp>,v0=<signature>` webhook signature.
pub const SIGNATURE_HEADER_KEY: &str = "diagonal-signature";

/// Maximum age of a signed webhook before it is rejected (5 minutes).
pub const REPLAY_WINDOW_MS: u64 = 5 * 60 * 1000;

/// How far a webhook timestamp may run ahead of the local clock.
pub const MAX_FUTURE_SKEW_MS: u64 = 5 * 60 * 1000;

/// Webhook endpoint secrets are issued with a fixed length.
pub const ENDPOINT_SECRET_LEN: usize = 40;

/// Unix milliseconds rendered in decimal.
pub const HEADER_TIMESTAMP_LEN: usize = 13;

/// Hex-encoded HMAC-SHA256 tag.
pub const HEADER_SIGNATURE_LEN: usize = 64;

/// EIP-712 domain name of the organization contract.
pub const DOMAIN_NAME: &str = "DiagonalOrg";

/// EIP-712 domain version of the organization contract.
pub const DOMAIN_VERSION: &str = "1";

pub const CHARGE_TYPE: &str =
    "Charge(bytes32 id,address source,address token,uint256 amount,uint256 nonce)";

/// The organization contract reuses the `Charge` type name for batches.
pub const CHARGE_BATCH_TYPE: &str =
    "Charge(bytes32 id,address[] sources,address[] tokens,uint256[] amounts,uint256 nonce)";

pub const WITHDRAWAL_TYPE: &str =
    "Withdrawal(bytes32 id,address token,uint256 amount,uint256 fee,uint256 nonce)";

/// Ethereum mainnet chain ID.
pub const ETHEREUM_CHAIN_ID: u64 = 1;

/// Goerli testnet chain ID.
pub const GOERLI_CHAIN_ID: u64 = 5;

/// Diagonal API used when no base URL is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://api.test.diagonal.finance";

pub const DAI_GOERLI: Address = address!("11fe4b6ae13d2a6055c8d9cf65c55bac32b5d844");
pub const DAI_ETHEREUM: Address = address!("6b175474e89094c44da98b954eedeac495271d0f");
pub const USDC_GOERLI: Address = address!("07865c6e87b9f70255377e024ace6630c1eaa37f");
pub const USDC_ETHEREUM: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
