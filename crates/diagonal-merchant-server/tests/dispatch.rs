//! End to end without a network: verify a signed delivery, dispatch it with an
//! in-memory nonce source and capture client, and check what gets captured.

use std::sync::Mutex;

use alloy::primitives::{address, b256, Address, U256};
use serde_json::json;

use diagonal::webhook::sign_webhook;
use diagonal::{
    ChargeAuthorizer, ChargeCapture, ChargeSignature, ChargeSigner, DiagonalError,
    EndpointSecret, EventType, NonceSource, OrgContract, TokenRegistry, WebhookVerifier,
};
use diagonal_server::dispatch::{dispatch, Outcome};
use diagonal_server::metrics::CHARGE_SIGNATURES;

const SECRET: &str = "wsecret_0123456789abcdef0123456789abcdef";
const NOW: u64 = 1_700_000_000_000;

struct FixedNonce(u64);

impl NonceSource for FixedNonce {
    async fn charge_nonce(&self, _: Address, _: Address) -> Result<U256, DiagonalError> {
        Ok(U256::from(self.0))
    }
}

#[derive(Default)]
struct Recording {
    captured: Mutex<Vec<(String, ChargeSignature)>>,
    fail: bool,
}

impl ChargeCapture for Recording {
    async fn capture(
        &self,
        charge_id: &str,
        signature: &ChargeSignature,
    ) -> Result<(), DiagonalError> {
        if self.fail {
            return Err(DiagonalError::CaptureFailed("connection reset".into()));
        }
        self.captured
            .lock()
            .unwrap()
            .push((charge_id.to_string(), *signature));
        Ok(())
    }
}

fn authorizer() -> ChargeAuthorizer<FixedNonce> {
    let signer = ChargeSigner::from_private_key(
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        TokenRegistry::default(),
    )
    .unwrap();
    ChargeAuthorizer::new(
        signer,
        FixedNonce(3),
        OrgContract::new(address!("1111111111111111111111111111111111111111"), 5),
    )
}

fn verified(body: serde_json::Value) -> diagonal::WebhookEvent {
    let bytes = serde_json::to_vec(&body).unwrap();
    let header = sign_webhook(&bytes, &EndpointSecret::new(SECRET).unwrap(), NOW);
    WebhookVerifier::new(SECRET)
        .unwrap()
        .verify_at(&bytes, &header, NOW)
        .unwrap()
}

fn signature_request(amount: &str, source: &str) -> serde_json::Value {
    json!({
        "id": "evt_sig",
        "type": "charge.signature_request",
        "data": {
            "id": "chg_123",
            "status": "requested",
            "subscription_id": "sub_1",
            "source_address": source,
            "amount": amount,
            "token": "usdc"
        }
    })
}

#[tokio::test]
async fn signature_request_is_signed_and_captured() {
    let event = verified(signature_request(
        "10",
        "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd",
    ));
    let capture = Recording::default();

    let outcome = dispatch(&event, &authorizer(), &capture).await.unwrap();
    assert_eq!(outcome, Outcome::Handled);

    let captured = capture.captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    let (id, signature) = &captured[0];
    assert_eq!(id, "chg_123");
    assert_eq!(signature.v, 28);
    assert_eq!(
        signature.r,
        b256!("eb51df504891785ca184ab52b15f171289a20f6ca3c775f2914ad68ece8944ab")
    );
    assert_eq!(
        signature.s,
        b256!("1344db51a9fcd197bb792d38497daa6558a7c3cdb33d84ca7bcc4fd1d734e583")
    );
}

#[tokio::test]
async fn malformed_source_is_not_captured() {
    let event = verified(signature_request("10", "0xnot-an-address"));
    let capture = Recording::default();
    let rejected = CHARGE_SIGNATURES.with_label_values(&["invalid_address"]);
    let before = rejected.get();

    let err = dispatch(&event, &authorizer(), &capture).await.unwrap_err();
    assert!(matches!(err, DiagonalError::InvalidAddressFormat(_)));
    assert!(!err.is_retryable());
    assert!(capture.captured.lock().unwrap().is_empty());
    assert!(rejected.get() > before);
}

#[tokio::test]
async fn unsupported_token_is_counted_and_not_captured() {
    let signer = ChargeSigner::from_private_key(
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        TokenRegistry::default(),
    )
    .unwrap();
    let authorizer = ChargeAuthorizer::new(
        signer,
        FixedNonce(3),
        OrgContract::new(address!("1111111111111111111111111111111111111111"), 137),
    );
    let event = verified(signature_request(
        "10",
        "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd",
    ));
    let capture = Recording::default();
    let rejected = CHARGE_SIGNATURES.with_label_values(&["unknown_token"]);
    let before = rejected.get();

    let err = dispatch(&event, &authorizer, &capture).await.unwrap_err();
    assert!(matches!(err, DiagonalError::UnknownTokenForChain { .. }));
    assert!(capture.captured.lock().unwrap().is_empty());
    assert!(rejected.get() > before);
}

#[tokio::test]
async fn untyped_signature_request_is_rejected_without_signing() {
    let mut body = signature_request("10", "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd");
    body["data"]["token"] = json!("usdt");
    let event = verified(body);
    let capture = Recording::default();
    let rejected = CHARGE_SIGNATURES.with_label_values(&["invalid_event_data"]);
    let before = rejected.get();

    let err = dispatch(&event, &authorizer(), &capture).await.unwrap_err();
    assert!(matches!(err, DiagonalError::InvalidEventData(_)));
    assert!(!err.is_retryable());
    assert!(capture.captured.lock().unwrap().is_empty());
    assert!(rejected.get() > before);
}

#[tokio::test]
async fn excess_precision_is_not_captured() {
    let event = verified(signature_request(
        "0.0000001",
        "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd",
    ));
    let capture = Recording::default();

    let err = dispatch(&event, &authorizer(), &capture).await.unwrap_err();
    assert!(matches!(err, DiagonalError::InvalidAmount(_)));
    assert!(capture.captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn capture_failure_is_retryable() {
    let event = verified(signature_request(
        "10",
        "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd",
    ));
    let capture = Recording {
        fail: true,
        ..Default::default()
    };

    let err = dispatch(&event, &authorizer(), &capture).await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn other_events_are_acknowledged_without_signing() {
    let event = verified(json!({
        "id": "evt_fail",
        "type": "charge.failed",
        "data": {
            "id": "chg_9",
            "status": "failed",
            "source_address": "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd",
            "amount": "10",
            "token": "dai",
            "failure_reason": "insufficient_balance"
        }
    }));
    let capture = Recording::default();

    let outcome = dispatch(&event, &authorizer(), &capture).await.unwrap();
    assert_eq!(outcome, Outcome::Ignored(EventType::ChargeFailed));
    assert!(capture.captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_events_are_unrecognized() {
    let event = verified(json!({ "id": "evt_x", "type": "payout.sent", "data": {} }));
    let outcome = dispatch(&event, &authorizer(), &Recording::default())
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Unrecognized("payout.sent".to_string()));
}
