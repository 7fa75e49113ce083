use thiserror::Error;

/// Coarse classification used by callers to decide between failing fast,
/// rejecting a single request, and retrying with backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad secret, key or settings. Fatal at startup.
    Configuration,
    /// The inbound webhook cannot be trusted. Reject, never retry.
    Authentication,
    /// The signing request cannot be encoded. Reject the single request.
    Encoding,
    /// RPC or network failure. Retryable by the caller.
    Transient,
}

/// Errors returned by webhook verification and charge signing.
#[derive(Debug, Error)]
pub enum DiagonalError {
    #[error("invalid endpoint secret: expected {expected} characters, got {actual}")]
    InvalidSecretConfiguration { expected: usize, actual: usize },

    #[error("signing key unavailable: {0}")]
    SigningKeyUnavailable(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("malformed signature header: {0}")]
    MalformedSignatureHeader(&'static str),

    #[error("signature too old: {age_ms}ms exceeds the {window_ms}ms replay window")]
    StaleSignature { age_ms: u64, window_ms: u64 },

    #[error("signature timestamp is {ahead_ms}ms in the future (max skew {max_skew_ms}ms)")]
    FutureSignature { ahead_ms: u64, max_skew_ms: u64 },

    #[error("invalid signature")]
    InvalidSignature,

    #[error("unknown token {token} for chain {chain_id}")]
    UnknownTokenForChain { token: String, chain_id: u64 },

    #[error("invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    #[error("{0} data does not match the known schema")]
    InvalidEventData(String),

    #[error("chain error: {0}")]
    ChainError(String),

    #[error("too many concurrent charge sources, try again later")]
    TooManySources,

    #[error("capture failed: {0}")]
    CaptureFailed(String),

    #[error("capture rejected with status {status}: {body}")]
    CaptureRejected { status: u16, body: String },
}

impl DiagonalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSecretConfiguration { .. }
            | Self::SigningKeyUnavailable(_)
            | Self::ConfigError(_) => ErrorKind::Configuration,

            Self::InvalidPayload(_)
            | Self::MalformedSignatureHeader(_)
            | Self::StaleSignature { .. }
            | Self::FutureSignature { .. }
            | Self::InvalidSignature => ErrorKind::Authentication,

            Self::UnknownTokenForChain { .. }
            | Self::InvalidAddressFormat(_)
            | Self::InvalidAmount(_)
            | Self::InvalidBatch(_)
            | Self::InvalidEventData(_)
            | Self::CaptureRejected { .. } => ErrorKind::Encoding,

            Self::ChainError(_) | Self::TooManySources | Self::CaptureFailed(_) => {
                ErrorKind::Transient
            }
        }
    }

    /// Whether the caller may retry the same operation with backoff.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// Short label for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidSecretConfiguration { .. } => "invalid_secret",
            Self::SigningKeyUnavailable(_) => "signing_key_unavailable",
            Self::ConfigError(_) => "config",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::MalformedSignatureHeader(_) => "malformed_header",
            Self::StaleSignature { .. } => "stale",
            Self::FutureSignature { .. } => "future",
            Self::InvalidSignature => "invalid_signature",
            Self::UnknownTokenForChain { .. } => "unknown_token",
            Self::InvalidAddressFormat(_) => "invalid_address",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidBatch(_) => "invalid_batch",
            Self::InvalidEventData(_) => "invalid_event_data",
            Self::ChainError(_) => "chain",
            Self::TooManySources => "too_many_sources",
            Self::CaptureFailed(_) => "capture_failed",
            Self::CaptureRejected { .. } => "capture_rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_errors_are_not_retryable() {
        assert_eq!(DiagonalError::InvalidSignature.kind(), ErrorKind::Authentication);
        assert!(!DiagonalError::InvalidSignature.is_retryable());
        assert!(!DiagonalError::MalformedSignatureHeader("order").is_retryable());
    }

    #[test]
    fn rpc_failures_are_retryable() {
        assert!(DiagonalError::ChainError("timeout".into()).is_retryable());
        assert!(DiagonalError::CaptureFailed("reset".into()).is_retryable());
    }

    #[test]
    fn unknown_token_is_an_encoding_error() {
        let err = DiagonalError::UnknownTokenForChain {
            token: "0xdead".into(),
            chain_id: 5,
        };
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert_eq!(err.to_string(), "unknown token 0xdead for chain 5");
    }

    #[test]
    fn untyped_event_data_is_rejected_not_retried() {
        let err = DiagonalError::InvalidEventData("charge.signature_request".into());
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert!(!err.is_retryable());
        assert_eq!(err.reason(), "invalid_event_data");
    }
}
