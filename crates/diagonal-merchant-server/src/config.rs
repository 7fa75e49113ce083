use alloy::primitives::Address;
use url::Url;

use diagonal::constants::{DEFAULT_API_BASE_URL, SIGNATURE_HEADER_KEY};

const DEFAULT_PORT: u16 = 3000;

#[derive(Clone)]
pub struct ServerConfig {
    /// Webhook endpoint secret issued by Diagonal (40 characters)
    pub endpoint_secret: String,
    /// Hex secp256k1 key that signs charges for the organization
    pub signing_private_key: String,
    /// Organization contract that verifies charge signatures
    pub org_contract_address: Address,
    /// JSON-RPC endpoint for nonce reads
    pub rpc_url: Url,
    pub api_key: String,
    pub api_base_url: Url,
    /// Header carrying the webhook signature
    pub signature_header_key: String,
    /// Chain ID override; read from the RPC when unset
    pub chain_id: Option<u64>,
    pub port: u16,
    /// Bearer token required for /metrics (None = metrics disabled)
    pub metrics_token: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("endpoint_secret", &"[REDACTED]")
            .field("signing_private_key", &"[REDACTED]")
            .field("org_contract_address", &self.org_contract_address)
            .field("rpc_url", &self.rpc_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("signature_header_key", &self.signature_header_key)
            .field("chain_id", &self.chain_id)
            .field("port", &self.port)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::MissingRequired(key));

        let endpoint_secret = required("DIAGONAL_WEBHOOK_ENDPOINT_SECRET")?;

        let signing_private_key = get("DIAGONAL_SIGNING_PRIVATE_KEY")
            .or_else(|| get("SIGNER_PRIVATE_KEY"))
            .ok_or(ConfigError::MissingRequired("DIAGONAL_SIGNING_PRIVATE_KEY"))?;

        let org_contract = required("ORG_CONTRACT_ADDRESS")?;
        let org_contract_address: Address = org_contract
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(org_contract))?;

        let rpc_url = parse_url(&required("RPC_PROVIDER_URL")?)?;
        let api_key = required("DIAGONAL_API_KEY")?;
        let api_base_url = parse_url(
            &get("DIAGONAL_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        )?;

        let signature_header_key = get("DIAGONAL_SIGNATURE_HEADER_KEY")
            .unwrap_or_else(|| SIGNATURE_HEADER_KEY.to_string())
            .to_ascii_lowercase();

        let chain_id = get("CHAIN_ID")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidNumber("CHAIN_ID", raw))
            })
            .transpose()?;

        let port = get("PORT")
            .map(|raw| {
                raw.trim()
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidNumber("PORT", raw))
            })
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        let metrics_token = get("METRICS_TOKEN");
        if metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set; /metrics is disabled");
        }

        Ok(Self {
            endpoint_secret,
            signing_private_key,
            org_contract_address,
            rpc_url,
            api_key,
            api_base_url,
            signature_header_key,
            chain_id,
            port,
            metrics_token,
        })
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::InvalidUrl(raw.to_string())),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid number for {0}: {1}")]
    InvalidNumber(&'static str, String),
}
