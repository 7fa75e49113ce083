//! Webhook authentication and charge signing for Diagonal merchants.
//!
//! Diagonal delivers billing events to a merchant endpoint and, for
//! `charge.signature_request` events, expects the merchant to sign the charge
//! with its organization key and capture it through the Diagonal API.
//!
//! - **Inbound** ([`WebhookVerifier`]): checks the `diagonal-signature` HMAC
//!   header and the replay window before any payload field is trusted
//! - **Signing** ([`ChargeSigner`]): EIP-712 digests for charges, batches and
//!   withdrawals against the organization contract
//! - **Authorizing** ([`ChargeAuthorizer`]): fetches the on-chain nonce and signs,
//!   serialized per charge source
//! - **Capture** ([`HttpCaptureClient`]): submits the signature back to Diagonal
//!
//! # Verifying a delivery
//!
//! ```no_run
//! use diagonal::WebhookVerifier;
//!
//! # fn handle(body: &[u8], header: &str) -> Result<(), diagonal::DiagonalError> {
//! let verifier = WebhookVerifier::new("wsecret_0123456789abcdef0123456789abcdef")?;
//! let event = verifier.verify(body, header)?;
//! println!("{} {}", event.id(), event.event_type());
//! # Ok(())
//! # }
//! ```

// Core types
pub mod constants;
pub mod error;
pub mod event;
pub mod hmac;
pub mod security;

// Inbound
pub mod webhook;

// Signing
pub mod amount;
pub mod eip712;
pub mod signer;
pub mod tokens;

// On-chain and API integration
pub mod authorizer;
pub mod capture;
pub mod nonce;

use alloy::sol;

// EIP-712 structs verified by the organization contract.
sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct Charge {
        bytes32 id;
        address source;
        address token;
        uint256 amount;
        uint256 nonce;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Withdrawal {
        bytes32 id;
        address token;
        uint256 amount;
        uint256 fee;
        uint256 nonce;
    }
}

// Organization contract view used to read the per-source charge nonce.
sol! {
    #[sol(rpc)]
    interface DiagonalOrg {
        function chargeNonces(address source) external view returns (uint256);
    }
}

// Re-exports
pub use authorizer::ChargeAuthorizer;
pub use capture::{ChargeCapture, HttpCaptureClient};
pub use eip712::OrgContract;
pub use error::{DiagonalError, ErrorKind};
pub use event::{EventData, EventType, Token, WebhookEvent};
pub use nonce::{NonceSource, OnChainNonceSource};
pub use signer::{ChargeRequest, ChargeSignature, ChargeSigner, SignedPayload};
pub use tokens::TokenRegistry;
pub use webhook::{verify_webhook, EndpointSecret, SignatureHeader, WebhookVerifier};
