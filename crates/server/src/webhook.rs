//! Telegram webhook ingress.
//!
//! Endpoints:
//! - `POST /telegram/webhook` — receive one Bot API update
//!
//! Telegram retries any update it could not deliver, so once a request
//! authenticates the answer is always `200 {"ok": true}`. Decode and
//! delivery failures are logged and swallowed rather than bounced back
//! as 5xx, which would only replay the same broken update.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::json;
use tracing::warn;
use vendebot_telegram::{decode_update, Update};

use crate::auth;
use crate::bootstrap::Dispatcher;

#[derive(Clone)]
pub struct WebhookState {
    dispatcher: Arc<Dispatcher>,
    webhook_secret: Option<SecretString>,
}

impl WebhookState {
    pub fn new(dispatcher: Arc<Dispatcher>, webhook_secret: Option<SecretString>) -> Self {
        Self { dispatcher, webhook_secret }
    }
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route("/telegram/webhook", post(receive_update)).with_state(state)
}

pub async fn receive_update(
    State(state): State<WebhookState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> (StatusCode, Json<serde_json::Value>) {
    if !auth::is_authentic(&headers, peer.ip(), state.webhook_secret.as_ref()) {
        warn!(
            event_name = "ingress.telegram.unauthorized_source",
            peer = %peer.ip(),
            "webhook call failed authentication"
        );
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"ok": false, "description": "unauthorized"})),
        );
    }

    match decode_update(update) {
        Ok(Some(event)) => {
            if let Err(error) = state.dispatcher.dispatch(event).await {
                warn!(
                    event_name = "egress.telegram.delivery_failed",
                    error = %error,
                    "reply delivery failed"
                );
            }
        }
        Ok(None) => {}
        Err(error) => {
            warn!(
                event_name = "ingress.telegram.update_rejected",
                error = %error,
                "update could not be decoded"
            );
        }
    }

    (StatusCode::OK, Json(json!({"ok": true})))
}
