use actix_web::{get, post, web, HttpRequest, HttpResponse};
use diagonal::{ErrorKind, WebhookEvent};

use crate::dispatch::{dispatch, Outcome};
use crate::metrics;
use crate::state::AppState;

/// Authenticate the raw body against the configured signature header.
/// Returns a 400 response on any failure.
fn authenticate(
    req: &HttpRequest,
    body: &[u8],
    state: &AppState,
) -> Result<WebhookEvent, HttpResponse> {
    let header_value = req
        .headers()
        .get(state.signature_header_key.as_str())
        .and_then(|v| v.to_str().ok());

    let Some(signature) = header_value else {
        tracing::warn!(header = %state.signature_header_key, "webhook signature header missing");
        metrics::AUTH_FAILURES.with_label_values(&["missing"]).inc();
        return Err(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "missing signature header"
        })));
    };

    state.verifier.verify(body, signature).map_err(|e| {
        tracing::warn!(error = %e, "webhook rejected");
        metrics::AUTH_FAILURES.with_label_values(&[e.reason()]).inc();
        HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string()
        }))
    })
}

#[post("/webhook")]
pub async fn webhook(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> HttpResponse {
    let event = match authenticate(&req, &body, &state) {
        Ok(event) => event,
        Err(resp) => {
            metrics::WEBHOOK_REQUESTS
                .with_label_values(&["rejected"])
                .inc();
            return resp;
        }
    };

    match dispatch(&event, &state.authorizer, &state.capture).await {
        Ok(Outcome::Handled) => {
            metrics::WEBHOOK_REQUESTS.with_label_values(&["handled"]).inc();
            HttpResponse::Ok().json(serde_json::json!({ "received": true }))
        }
        Ok(Outcome::Ignored(_)) => {
            metrics::WEBHOOK_REQUESTS.with_label_values(&["ignored"]).inc();
            HttpResponse::Ok().json(serde_json::json!({ "received": true }))
        }
        Ok(Outcome::Unrecognized(kind)) => {
            metrics::WEBHOOK_REQUESTS
                .with_label_values(&["unrecognized"])
                .inc();
            HttpResponse::NotFound().json(serde_json::json!({
                "error": format!("unrecognized event type: {kind}")
            }))
        }
        Err(e) if e.kind() == ErrorKind::Transient => {
            // Non-2xx makes Diagonal redeliver.
            tracing::error!(
                event_id = event.id(),
                error = %e,
                "event processing failed, awaiting redelivery"
            );
            metrics::WEBHOOK_REQUESTS.with_label_values(&["retry"]).inc();
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "temporarily unable to process event"
            }))
        }
        Err(e) => {
            tracing::error!(
                event_id = event.id(),
                error = %e,
                kind = ?e.kind(),
                "event processing failed"
            );
            metrics::WEBHOOK_REQUESTS.with_label_values(&["failed"]).inc();
            HttpResponse::Ok().json(serde_json::json!({ "received": true }))
        }
    }
}

#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.authorizer.nonce_source().health_check().await {
        Ok(block) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "diagonal-merchant-server",
            "latestBlock": block.to_string(),
        })),
        Err(_) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "degraded",
            "service": "diagonal-merchant-server",
            "error": "RPC unreachable",
        })),
    }
}

#[get("/metrics")]
pub async fn metrics_endpoint(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let Some(token) = &state.metrics_token else {
        return HttpResponse::Forbidden().json(serde_json::json!({
            "error": "forbidden",
            "message": "Set METRICS_TOKEN to access /metrics"
        }));
    };

    let authorized = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| diagonal::security::constant_time_eq(t.as_bytes(), token))
        .unwrap_or(false);

    if !authorized {
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "unauthorized",
            "message": "Valid Bearer token required for /metrics"
        }));
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::metrics_output())
}
