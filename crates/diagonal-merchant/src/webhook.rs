//! Webhook authentication.
//!
//! Diagonal signs each delivery with `HMAC-SHA256(secret, body || timestamp)`
//! and sends `t=<unix ms>,v0=<hex tag>` in the [`SIGNATURE_HEADER_KEY`] header.
//! Verification runs over the exact bytes received, never over a
//! re-serialization of the parsed body.
//!
//! [`SIGNATURE_HEADER_KEY`]: crate::constants::SIGNATURE_HEADER_KEY

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::constants::{
    ENDPOINT_SECRET_LEN, HEADER_SIGNATURE_LEN, HEADER_TIMESTAMP_LEN, MAX_FUTURE_SKEW_MS,
    REPLAY_WINDOW_MS,
};
use crate::event::WebhookEvent;
use crate::hmac::{compute_hmac, verify_hmac};
use crate::DiagonalError;

/// Parsed `t=<timestamp>,v0=<signature>` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    timestamp: String,
    signature: String,
}

impl SignatureHeader {
    /// Decimal Unix milliseconds, exactly 13 digits.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn timestamp_ms(&self) -> u64 {
        // Exactly 13 ASCII digits always fits in u64.
        self.timestamp.parse().unwrap_or(u64::MAX)
    }

    /// Hex-encoded HMAC-SHA256 tag, exactly 64 characters.
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

fn field<'a>(part: &'a str, key: &str) -> Result<&'a str, DiagonalError> {
    let (k, v) = part
        .split_once('=')
        .ok_or(DiagonalError::MalformedSignatureHeader("field without '='"))?;
    if k != key {
        return Err(DiagonalError::MalformedSignatureHeader("unexpected field order"));
    }
    if v.contains('=') {
        return Err(DiagonalError::MalformedSignatureHeader("field with extra '='"));
    }
    Ok(v)
}

impl FromStr for SignatureHeader {
    type Err = DiagonalError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.split(',');
        let (Some(t), Some(v0), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(DiagonalError::MalformedSignatureHeader(
                "expected exactly two fields",
            ));
        };

        let timestamp = field(t, "t")?;
        let signature = field(v0, "v0")?;

        if timestamp.len() != HEADER_TIMESTAMP_LEN
            || !timestamp.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(DiagonalError::MalformedSignatureHeader(
                "timestamp must be 13 digits",
            ));
        }
        if signature.len() != HEADER_SIGNATURE_LEN
            || !signature.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(DiagonalError::MalformedSignatureHeader(
                "signature must be 64 hex characters",
            ));
        }

        Ok(Self {
            timestamp: timestamp.to_string(),
            signature: signature.to_string(),
        })
    }
}

impl fmt::Display for SignatureHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={},v0={}", self.timestamp, self.signature)
    }
}

/// Webhook endpoint secret, validated on construction.
#[derive(Clone)]
pub struct EndpointSecret(String);

impl EndpointSecret {
    pub fn new(secret: impl Into<String>) -> Result<Self, DiagonalError> {
        let secret = secret.into();
        let actual = secret.chars().count();
        if actual != ENDPOINT_SECRET_LEN {
            return Err(DiagonalError::InvalidSecretConfiguration {
                expected: ENDPOINT_SECRET_LEN,
                actual,
            });
        }
        Ok(Self(secret))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for EndpointSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EndpointSecret([REDACTED])")
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn unix_now_ms() -> Result<u64, DiagonalError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| DiagonalError::ConfigError(format!("system time error: {e}")))?;
    Ok(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

fn parse_payload(payload: &[u8]) -> Result<Value, DiagonalError> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| DiagonalError::InvalidPayload(format!("not JSON: {e}")))?;
    if !value.is_object() {
        return Err(DiagonalError::InvalidPayload(
            "payload must be a JSON object".to_string(),
        ));
    }
    Ok(value)
}

/// Stateless verifier for inbound webhook deliveries.
///
/// Safe to share across threads and to call concurrently.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: EndpointSecret,
    replay_window_ms: u64,
    max_future_skew_ms: u64,
}

impl WebhookVerifier {
    /// Fails with [`DiagonalError::InvalidSecretConfiguration`] for a malformed secret,
    /// so misconfiguration surfaces at startup rather than per request.
    pub fn new(endpoint_secret: &str) -> Result<Self, DiagonalError> {
        Ok(Self::with_secret(EndpointSecret::new(endpoint_secret)?))
    }

    pub fn with_secret(secret: EndpointSecret) -> Self {
        Self {
            secret,
            replay_window_ms: REPLAY_WINDOW_MS,
            max_future_skew_ms: MAX_FUTURE_SKEW_MS,
        }
    }

    pub fn with_replay_window(mut self, window_ms: u64) -> Self {
        self.replay_window_ms = window_ms;
        self
    }

    pub fn with_max_future_skew(mut self, skew_ms: u64) -> Self {
        self.max_future_skew_ms = skew_ms;
        self
    }

    /// Verify a delivery against the wall clock.
    pub fn verify(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent, DiagonalError> {
        self.verify_at(payload, signature_header, unix_now_ms()?)
    }

    /// Verify a delivery as of `now_ms`.
    ///
    /// Checks run in order: payload shape, header format, timestamp freshness,
    /// HMAC. The event is built only once every check has passed.
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now_ms: u64,
    ) -> Result<WebhookEvent, DiagonalError> {
        let value = parse_payload(payload)?;
        self.authenticate(payload, signature_header, now_ms)?;
        WebhookEvent::from_authenticated(value)
    }

    fn authenticate(
        &self,
        payload: &[u8],
        signature_header: &str,
        now_ms: u64,
    ) -> Result<(), DiagonalError> {
        let header: SignatureHeader = signature_header.parse()?;
        self.check_freshness(header.timestamp_ms(), now_ms)?;

        let message: [&[u8]; 2] = [payload, header.timestamp().as_bytes()];
        if !verify_hmac(self.secret.as_bytes(), &message, header.signature()) {
            tracing::warn!(timestamp = header.timestamp(), "webhook signature mismatch");
            return Err(DiagonalError::InvalidSignature);
        }
        Ok(())
    }

    fn check_freshness(&self, timestamp_ms: u64, now_ms: u64) -> Result<(), DiagonalError> {
        if now_ms >= timestamp_ms {
            let age_ms = now_ms - timestamp_ms;
            if age_ms > self.replay_window_ms {
                tracing::warn!(age_ms, "stale webhook signature rejected");
                return Err(DiagonalError::StaleSignature {
                    age_ms,
                    window_ms: self.replay_window_ms,
                });
            }
        } else {
            let ahead_ms = timestamp_ms - now_ms;
            if ahead_ms > self.max_future_skew_ms {
                tracing::warn!(ahead_ms, "future-dated webhook signature rejected");
                return Err(DiagonalError::FutureSignature {
                    ahead_ms,
                    max_skew_ms: self.max_future_skew_ms,
                });
            }
        }
        Ok(())
    }
}

/// Verify an inbound webhook and return the authenticated event.
///
/// `payload` must be the raw request body. Checks run in order: payload shape,
/// endpoint secret, header format, timestamp freshness, HMAC.
pub fn verify_webhook(
    payload: &[u8],
    signature_header: &str,
    endpoint_secret: &str,
) -> Result<WebhookEvent, DiagonalError> {
    let value = parse_payload(payload)?;
    let verifier = WebhookVerifier::new(endpoint_secret)?;
    verifier.authenticate(payload, signature_header, unix_now_ms()?)?;
    WebhookEvent::from_authenticated(value)
}

/// Produce the signature header value for `payload` signed at `timestamp_ms`.
pub fn sign_webhook(payload: &[u8], secret: &EndpointSecret, timestamp_ms: u64) -> String {
    let timestamp = format!("{timestamp_ms:013}");
    let signature = compute_hmac(secret.as_bytes(), &[payload, timestamp.as_bytes()]);
    SignatureHeader {
        timestamp,
        signature,
    }
    .to_string()
}
