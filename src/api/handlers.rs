use axum::{
    Json,
    body::Bytes,
    extract::{ConnectInfo, Path, Query, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use std::net::SocketAddr;

use crate::analytics::Event;
use crate::messenger::{self, WebhookPayload};
use crate::search::{REGISTRIES, Registry};

use super::AppState;
use super::models::{QueryPairs, SearchEnvelope, SearchParams, VerifyParams};

pub async fn index_handler() -> Json<Value> {
    let mut endpoints = serde_json::Map::new();
    endpoints.insert("/".into(), json!({"methods": ["GET"]}));
    endpoints.insert("/health".into(), json!({"methods": ["GET"]}));
    endpoints.insert("/webhook".into(), json!({"methods": ["GET", "POST"]}));
    for registry in REGISTRIES {
        endpoints.insert(
            registry.search_path(),
            json!({"methods": ["GET"], "args": {"q": {"required": true}}}),
        );
    }

    Json(json!({
        "name": "API to the Kenyan health registries",
        "authentication": [],
        "endpoints": endpoints,
    }))
}

pub async fn health_handler() -> &'static str {
    "ok"
}

pub async fn verify_handler(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<String, (StatusCode, &'static str)> {
    let params = VerifyParams::from_pairs(&pairs);
    match params.accepted_challenge(&state.verify_token) {
        Some(challenge) => {
            tracing::info!("webhook verified");
            Ok(challenge.to_string())
        }
        None => {
            tracing::warn!(mode = ?params.mode, "webhook verification rejected");
            Err((StatusCode::FORBIDDEN, "Invalid verification token"))
        }
    }
}

/// Always answers `ok`. Malformed payloads and send failures are logged only.
pub async fn webhook_handler(State(state): State<AppState>, body: Bytes) -> &'static str {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(error = %e, "malformed webhook payload");
            return "ok";
        }
    };

    let delivered = messenger::relay(state.sender.as_ref(), &payload).await;
    tracing::debug!(object = ?payload.object, delivered, "webhook handled");
    "ok"
}

pub async fn search_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(pairs): Query<QueryPairs>,
    client: Option<ConnectInfo<SocketAddr>>,
) -> Result<Json<SearchEnvelope>, (StatusCode, Json<Value>)> {
    let params = SearchParams::from_pairs(&pairs);
    let registry = Registry::by_slug(&slug).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"status": "error", "message": format!("Unknown registry: {slug}")})),
        )
    })?;

    let query = match params.q.as_deref() {
        Some(q) if !q.is_empty() => q,
        _ => return Ok(Json(SearchEnvelope::missing_query(registry.data_key))),
    };

    let docs = match state.index.lookup(registry.index, query).await {
        Ok(docs) => docs,
        Err(e) => {
            tracing::error!(registry = registry.slug, query, error = %e, "search failed");
            return Ok(Json(SearchEnvelope::failed(registry.data_key, e.to_string())));
        }
    };

    state.analytics.track(Event {
        category: registry.label.to_string(),
        action: "search".to_string(),
        label: Some(query.to_string()),
        value: Some(docs.len()),
        client_ip: client.map(|ConnectInfo(addr)| addr.ip()),
    });

    Ok(Json(SearchEnvelope::found(
        registry.data_key,
        docs,
        registry.not_found,
    )))
}
