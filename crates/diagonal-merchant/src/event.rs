//! Typed webhook events.
//!
//! A [`WebhookEvent`] is only ever produced by [`crate::webhook::WebhookVerifier`]
//! after the payload has been authenticated. Its fields are read-only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::DiagonalError;

/// Event types delivered by Diagonal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    ChargeCreated,
    ChargeConfirmed,
    ChargeFinalised,
    ChargeFailed,
    ChargeSignatureRequest,
    SubscriptionCreated,
    SubscriptionActive,
    SubscriptionUpdated,
    SubscriptionCanceled,
    SubscriptionUpdateApplied,
    SubscriptionUpdateFailed,
    /// Authenticated but not recognized by this build.
    Unknown(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ChargeCreated => "charge.created",
            Self::ChargeConfirmed => "charge.confirmed",
            Self::ChargeFinalised => "charge.finalised",
            Self::ChargeFailed => "charge.failed",
            Self::ChargeSignatureRequest => "charge.signature_request",
            Self::SubscriptionCreated => "subscription.created",
            Self::SubscriptionActive => "subscription.active",
            Self::SubscriptionUpdated => "subscription.updated",
            Self::SubscriptionCanceled => "subscription.canceled",
            Self::SubscriptionUpdateApplied => "subscription.update_applied",
            Self::SubscriptionUpdateFailed => "subscription.update_failed",
            Self::Unknown(other) => other,
        }
    }

    pub fn is_charge(&self) -> bool {
        matches!(
            self,
            Self::ChargeCreated
                | Self::ChargeConfirmed
                | Self::ChargeFinalised
                | Self::ChargeFailed
                | Self::ChargeSignatureRequest
        )
    }

    pub fn is_subscription(&self) -> bool {
        matches!(
            self,
            Self::SubscriptionCreated
                | Self::SubscriptionActive
                | Self::SubscriptionUpdated
                | Self::SubscriptionCanceled
                | Self::SubscriptionUpdateApplied
                | Self::SubscriptionUpdateFailed
        )
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        match s {
            "charge.created" => Self::ChargeCreated,
            "charge.confirmed" => Self::ChargeConfirmed,
            "charge.finalised" => Self::ChargeFinalised,
            "charge.failed" => Self::ChargeFailed,
            "charge.signature_request" => Self::ChargeSignatureRequest,
            "subscription.created" => Self::SubscriptionCreated,
            "subscription.active" => Self::SubscriptionActive,
            "subscription.updated" => Self::SubscriptionUpdated,
            "subscription.canceled" => Self::SubscriptionCanceled,
            "subscription.update_applied" => Self::SubscriptionUpdateApplied,
            "subscription.update_failed" => Self::SubscriptionUpdateFailed,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<EventType> for String {
    fn from(t: EventType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stablecoins accepted for subscription payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Token {
    Dai,
    Usdc,
}

impl Token {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dai => "dai",
            Self::Usdc => "usdc",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Token {
    type Err = DiagonalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dai" => Ok(Self::Dai),
            "usdc" => Ok(Self::Usdc),
            _ => Err(DiagonalError::InvalidPayload(format!("unknown token '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    Created,
    Requested,
    Signed,
    Processing,
    Failed,
    Confirmed,
    Finalized,
}

/// Why an on-chain charge execution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    InsufficientAllowance,
    InsufficientBalance,
    CustomerBlacklisted,
    ContractPaused,
    InvalidOwnerAddress,
    InvalidPermitSignature,
    ExpiredPermit,
    InvalidNonce,
    InvalidChargeSignature,
    NotDiagonalBot,
    Unknown,
    TransactionNotExists,
    FinalizationRetryLimitReached,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeData {
    pub id: String,
    pub status: ChargeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub source_address: String,
    /// Human-readable token amount, e.g. `"10"` or `"9.99"`.
    pub amount: String,
    pub token: Token,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Incomplete,
    Active,
    PastDue,
    Canceled,
    Canceling,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringInterval {
    Month,
    Year,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionBalance {
    pub amount: String,
    pub updated_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPayment {
    pub amount: String,
    pub at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionBilling {
    pub amount: String,
    pub interval: RecurringInterval,
    pub interval_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInformation {
    pub address: String,
    pub token: Token,
    pub chain: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionData {
    pub id: String,
    pub status: SubscriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub past_due_since: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canceled_at: Option<u64>,
    pub balance: SubscriptionBalance,
    pub next_payment: SubscriptionPayment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_payment: Option<SubscriptionPayment>,
    pub billing: SubscriptionBilling,
    pub payment_information: PaymentInformation,
}

/// A request to sign a charge before Diagonal executes it on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SignatureRequestRepr")]
pub struct SignatureRequestData {
    pub charge: ChargeData,
}

// Deliveries carry the charge either wrapped or as the bare object.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignatureRequestRepr {
    Wrapped { charge: ChargeData },
    Bare(ChargeData),
}

impl From<SignatureRequestRepr> for SignatureRequestData {
    fn from(repr: SignatureRequestRepr) -> Self {
        match repr {
            SignatureRequestRepr::Wrapped { charge } | SignatureRequestRepr::Bare(charge) => {
                Self { charge }
            }
        }
    }
}

/// Event payload, shaped by the event type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventData {
    Charge(ChargeData),
    Subscription(SubscriptionData),
    SignatureRequest(SignatureRequestData),
    Other(Value),
}

impl EventData {
    /// Type the payload by its event type. Data that does not match the
    /// known schema is kept raw so an authentic delivery still verifies.
    fn parse(event_type: &EventType, data: Value) -> Self {
        let typed = match event_type {
            EventType::ChargeSignatureRequest => {
                serde_json::from_value(data.clone()).map(Self::SignatureRequest)
            }
            t if t.is_charge() => serde_json::from_value(data.clone()).map(Self::Charge),
            t if t.is_subscription() => {
                serde_json::from_value(data.clone()).map(Self::Subscription)
            }
            _ => return Self::Other(data),
        };
        typed.unwrap_or_else(|e| {
            tracing::warn!(
                event_type = %event_type,
                error = %e,
                "event data did not match the known schema"
            );
            Self::Other(data)
        })
    }
}

/// An authenticated webhook event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookEvent {
    id: String,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    created_at: Option<Value>,
    #[serde(rename = "type")]
    event_type: EventType,
    data: EventData,
}

#[derive(Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "createdAt", default)]
    created_at: Option<Value>,
    #[serde(rename = "type")]
    event_type: EventType,
    #[serde(default)]
    data: Value,
}

impl WebhookEvent {
    /// Build the typed event from an already-authenticated JSON object.
    pub(crate) fn from_authenticated(value: Value) -> Result<Self, DiagonalError> {
        let raw: RawEvent = serde_json::from_value(value)
            .map_err(|e| DiagonalError::InvalidPayload(e.to_string()))?;
        let data = EventData::parse(&raw.event_type, raw.data);
        Ok(Self {
            id: raw.id,
            created_at: raw.created_at,
            event_type: raw.event_type,
            data,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Creation time as delivered (ISO-8601 string or epoch number).
    pub fn created_at(&self) -> Option<&Value> {
        self.created_at.as_ref()
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }

    pub fn charge(&self) -> Option<&ChargeData> {
        match &self.data {
            EventData::Charge(charge) => Some(charge),
            EventData::SignatureRequest(request) => Some(&request.charge),
            _ => None,
        }
    }

    pub fn subscription(&self) -> Option<&SubscriptionData> {
        match &self.data {
            EventData::Subscription(subscription) => Some(subscription),
            _ => None,
        }
    }

    pub fn signature_request(&self) -> Option<&SignatureRequestData> {
        match &self.data {
            EventData::SignatureRequest(request) => Some(request),
            _ => None,
        }
    }
}
