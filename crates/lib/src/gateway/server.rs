//! Gateway HTTP server: one POST turns a website-chat message into an AI reply
//! plus an optional WhatsApp alert. Providers degrade independently: a missing
//! key or failed call never takes down the response to the visitor.

use crate::alerts::{AlertDispatcher, AlertOutcome, AlertRequest};
use crate::channels::{AlertChannel, WhatsAppChannel};
use crate::config::{self, Config};
use crate::gateway::protocol::{
    parse_chat_request, parse_lead_request, ChatResponse, ErrorResponse, HealthResponse,
    LeadRequest, LeadResponse,
};
use crate::llm::OpenAiClient;
use crate::reply::{ReplyGenerator, PLACEHOLDER_REPLY};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Shared state for the gateway (config, reply generator, alert dispatcher).
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub generator: Arc<ReplyGenerator>,
    pub alerts: Arc<AlertDispatcher>,
}

/// Build gateway state from config. Provider clients are constructed only when
/// their credentials resolve; each missing provider logs once and degrades its
/// own path for the lifetime of the process.
pub fn build_state(config: Config) -> GatewayState {
    let client = match config::resolve_ai_key(&config) {
        Some(key) => Some(OpenAiClient::new(key, config.ai.base_url.clone())),
        None => {
            log::warn!("completion api key is not set, ai replies will be skipped");
            None
        }
    };
    let model = config::resolve_ai_model(&config);
    if client.is_some() {
        log::info!("ai replies enabled (model {})", model);
    }
    let generator = ReplyGenerator::new(client, model);

    let channel: Option<Arc<dyn AlertChannel>> =
        match config::resolve_whatsapp_credentials(&config) {
            Some(creds) => {
                log::info!("whatsapp alerts enabled (to {})", creds.to);
                Some(Arc::new(WhatsAppChannel::new(
                    creds,
                    config.alerts.base_url.clone(),
                )))
            }
            None => {
                log::warn!("whatsapp credentials are incomplete, alerts will be skipped");
                None
            }
        };
    let alerts = AlertDispatcher::new(channel);

    GatewayState {
        config: Arc::new(config),
        generator: Arc::new(generator),
        alerts: Arc::new(alerts),
    }
}

/// Create the relay router with CORS applied.
pub fn build_router(state: GatewayState) -> Router {
    let cors = cors_layer(config::resolve_allowed_origins(&state.config));
    Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/api/leads", post(handle_lead))
        .route("/health", get(handle_health))
        .with_state(state)
        .layer(cors)
}

/// Exact-match origin allow-list. An empty list allows any origin. Requests
/// without an Origin header are not subject to CORS at all.
fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}

fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// POST /api/chat — validate, generate a reply, dispatch the alert, respond.
/// Generation and dispatch failures both degrade: the visitor always gets a reply.
async fn handle_chat(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    let req = parse_chat_request(&body).map_err(|error| {
        (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
    })?;
    let request_id = uuid::Uuid::new_v4();
    log::info!("chat {}: message received ({} chars)", request_id, req.message.len());

    let reply = match state
        .generator
        .generate_reply(&req.message, &req.context)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            log::warn!("chat {}: reply generation failed: {}", request_id, e);
            PLACEHOLDER_REPLY.to_string()
        }
    };

    let alert = AlertRequest {
        message: &req.message,
        reply: &reply,
        context: &req.context,
        lead_info: req.lead_info.as_ref(),
    };
    let outcome = match state.alerts.send_alert(&alert).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("chat {}: alert dispatch failed: {}", request_id, e);
            AlertOutcome {
                sent: false,
                sid: None,
            }
        }
    };

    Ok(Json(ChatResponse {
        reply,
        sent_alert: outcome.sent,
        sid: outcome.sid,
        timestamp: iso_timestamp(),
    }))
}

/// Deterministic acknowledgement for a captured lead; no completion call involved.
fn lead_ack_reply(req: &LeadRequest) -> String {
    format!(
        "Gracias {}. Hemos recibido tu consulta sobre {}. Un especialista de ITAI te contactará pronto al email {} para brindarte una propuesta personalizada.",
        req.name.as_deref().unwrap_or("por contactarnos"),
        req.interest.as_deref().unwrap_or("nuestros servicios"),
        req.email
    )
}

/// POST /api/leads — validate, synthesize the acknowledgement, dispatch the alert.
/// The lead is already captured in the response, so a failed alert is tolerated.
async fn handle_lead(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Result<Json<LeadResponse>, (StatusCode, Json<ErrorResponse>)> {
    let req = parse_lead_request(&body).map_err(|error| {
        (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
    })?;
    let request_id = uuid::Uuid::new_v4();
    log::info!("leads {}: lead captured for {}", request_id, req.email);

    let reply = lead_ack_reply(&req);
    let lead_info = req.lead_info();
    let message = format!("LEAD CAPTURADO: {}", req.message);
    let context = json!({ "source": "lead_form", "timestamp": iso_timestamp() });

    let alert = AlertRequest {
        message: &message,
        reply: &reply,
        context: &context,
        lead_info: Some(&lead_info),
    };
    let outcome = match state.alerts.send_alert(&alert).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("leads {}: alert dispatch failed: {}", request_id, e);
            AlertOutcome {
                sent: false,
                sid: None,
            }
        }
    };

    Ok(Json(LeadResponse {
        success: true,
        message: "Lead capturado exitosamente".to_string(),
        sent_alert: outcome.sent,
        sid: outcome.sid,
    }))
}

/// GET /health — liveness probe.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        timestamp: iso_timestamp(),
    })
}

/// Run the relay server; binds to config.server.bind:config.server.port.
/// Blocks until shutdown (Ctrl+C or SIGTERM).
pub async fn run_gateway(config: Config) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.bind.trim(), config.server.port);
    let state = build_state(config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("relay listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("relay server exited")?;
    log::info!("relay stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(name: Option<&str>, interest: Option<&str>) -> LeadRequest {
        LeadRequest {
            name: name.map(|s| s.to_string()),
            email: "a@b.com".to_string(),
            phone: None,
            company: None,
            interest: interest.map(|s| s.to_string()),
            message: "Interesado".to_string(),
        }
    }

    #[test]
    fn lead_ack_uses_name_and_interest() {
        let reply = lead_ack_reply(&lead(Some("Ana"), Some("Web con chat IA")));
        assert!(reply.starts_with("Gracias Ana."));
        assert!(reply.contains("tu consulta sobre Web con chat IA"));
        assert!(reply.contains("al email a@b.com"));
    }

    #[test]
    fn lead_ack_falls_back_for_missing_fields() {
        let reply = lead_ack_reply(&lead(None, None));
        assert!(reply.starts_with("Gracias por contactarnos."));
        assert!(reply.contains("tu consulta sobre nuestros servicios"));
    }

    #[test]
    fn unconfigured_state_degrades_both_providers() {
        let state = build_state(Config::default());
        assert!(!state.generator.is_configured());
        assert!(!state.alerts.is_configured());
    }
}
