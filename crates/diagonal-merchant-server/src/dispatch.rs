//! Routing of authenticated events.
//!
//! Only `charge.signature_request` requires work: the charge is signed with the
//! current on-chain nonce and the signature is captured through the Diagonal
//! API. Every other known event is logged and acknowledged.

use std::time::Instant;

use diagonal::capture::ChargeCapture;
use diagonal::event::ChargeData;
use diagonal::signer::parse_address;
use diagonal::{
    ChargeAuthorizer, ChargeRequest, DiagonalError, EventData, EventType, NonceSource,
    WebhookEvent,
};

use crate::metrics;

/// What the dispatcher did with an authenticated event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The charge was signed and captured.
    Handled,
    /// A known event that needs no action.
    Ignored(EventType),
    /// Authentic, but of a type this build does not know.
    Unrecognized(String),
}

pub async fn dispatch<N, C>(
    event: &WebhookEvent,
    authorizer: &ChargeAuthorizer<N>,
    capture: &C,
) -> Result<Outcome, DiagonalError>
where
    N: NonceSource,
    C: ChargeCapture,
{
    match (event.event_type(), event.data()) {
        (EventType::ChargeSignatureRequest, EventData::SignatureRequest(request)) => {
            sign_and_capture(&request.charge, authorizer, capture).await?;
            Ok(Outcome::Handled)
        }
        (EventType::ChargeSignatureRequest, _) => {
            let err = DiagonalError::InvalidEventData(event.event_type().to_string());
            metrics::CHARGE_SIGNATURES
                .with_label_values(&[err.reason()])
                .inc();
            Err(err)
        }
        (EventType::Unknown(kind), _) => {
            tracing::warn!(event_id = event.id(), event_type = %kind, "unrecognized event type");
            Ok(Outcome::Unrecognized(kind.clone()))
        }
        (kind, EventData::Charge(charge)) => {
            if *kind == EventType::ChargeFailed {
                tracing::warn!(
                    event_id = event.id(),
                    charge_id = %charge.id,
                    reason = ?charge.failure_reason,
                    "charge failed"
                );
            } else {
                tracing::info!(
                    event_id = event.id(),
                    event_type = %kind,
                    charge_id = %charge.id,
                    status = ?charge.status,
                    "charge event"
                );
            }
            Ok(Outcome::Ignored(kind.clone()))
        }
        (kind, EventData::Subscription(subscription)) => {
            tracing::info!(
                event_id = event.id(),
                event_type = %kind,
                subscription_id = %subscription.id,
                status = ?subscription.status,
                "subscription event"
            );
            Ok(Outcome::Ignored(kind.clone()))
        }
        (kind, _) => {
            tracing::info!(event_id = event.id(), event_type = %kind, "event acknowledged");
            Ok(Outcome::Ignored(kind.clone()))
        }
    }
}

async fn sign_and_capture<N, C>(
    charge: &ChargeData,
    authorizer: &ChargeAuthorizer<N>,
    capture: &C,
) -> Result<(), DiagonalError>
where
    N: NonceSource,
    C: ChargeCapture,
{
    let authorized = match charge_request(charge, authorizer) {
        Ok(request) => authorizer.authorize_charge(&request).await,
        Err(e) => Err(e),
    };
    let signed = match authorized {
        Ok(signed) => {
            metrics::CHARGE_SIGNATURES.with_label_values(&["success"]).inc();
            signed
        }
        Err(e) => {
            metrics::CHARGE_SIGNATURES
                .with_label_values(&[e.reason()])
                .inc();
            return Err(e);
        }
    };

    let start = Instant::now();
    let result = capture.capture(&charge.id, &signed.signature).await;
    let label = if result.is_ok() { "success" } else { "error" };
    metrics::CAPTURE_LATENCY
        .with_label_values(&[label])
        .observe(start.elapsed().as_secs_f64());
    result
}

fn charge_request<N: NonceSource>(
    charge: &ChargeData,
    authorizer: &ChargeAuthorizer<N>,
) -> Result<ChargeRequest, DiagonalError> {
    let chain_id = authorizer.contract().chain_id;
    Ok(ChargeRequest {
        id: charge.id.clone(),
        source: parse_address(&charge.source_address)?,
        token: authorizer.tokens().address(charge.token, chain_id)?,
        amount: charge.amount.clone(),
    })
}
