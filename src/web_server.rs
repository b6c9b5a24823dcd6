use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    serve, Json, Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::chat::{ChatReply, ChatRequest};
use crate::completion::CompletionClient;
use crate::constants::CHAT_ENDPOINT;
use crate::persona::{self, Profile};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    completion: Arc<CompletionClient>,
    fallback: Arc<str>,
    quota: Arc<str>,
}

impl AppState {
    pub fn new(completion: CompletionClient, profile: &Profile) -> Self {
        Self {
            completion: Arc::new(completion),
            fallback: persona::fallback_message(profile).into(),
            quota: persona::quota_message(profile).into(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(CHAT_ENDPOINT, post(chat_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

async fn health_handler() -> &'static str {
    "ok"
}

// Always answers 200; failures are carried in the reply text.
async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ChatReply> {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Rejected chat request body: {}", rejection);
            return reply(&state.fallback);
        }
    };

    info!(messages = request.messages.len(), "Relaying chat request");

    match state.completion.complete(&request.messages).await {
        Ok(text) => Json(ChatReply { message: text }),
        Err(e) if e.is_quota_exceeded() => {
            error!("Completion quota exhausted: {}", e);
            reply(&state.quota)
        }
        Err(e) => {
            error!("Completion failed: {}", e);
            reply(&state.fallback)
        }
    }
}

fn reply(text: &str) -> Json<ChatReply> {
    Json(ChatReply {
        message: text.to_string(),
    })
}

pub async fn start_web_server(port: u16, state: AppState) -> Result<()> {
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Relay listening on http://{}", addr);

    // Bind using tokio::net::TcpListener
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
