use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post},
};
use risk_flow::{ChatMessage, Domain, DomainSchema, FlowError, FlowRunner, Phase, Session};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub runner: FlowRunner,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub replies: Vec<ChatMessage>,
    pub phase: Phase,
    pub mode: Option<Domain>,
}

/// Initialize tracing; `LOG_FORMAT=pretty` for development, JSON otherwise
pub fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "risk_assistant_service=debug,risk_chat=debug,risk_flow=debug,tower_http=debug".into()
    });

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    // A hyphenated UUID is always a valid header value
    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/chat", post(chat))
        .route("/session/{id}", get(get_session).delete(close_session))
        .route("/schema/{domain}", get(get_schema))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status_for(e: &FlowError) -> StatusCode {
    match e {
        FlowError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        FlowError::EmptyInput => StatusCode::BAD_REQUEST,
        FlowError::Dispatch(_) => StatusCode::BAD_GATEWAY,
        FlowError::MissingRequired { .. }
        | FlowError::UnknownField { .. }
        | FlowError::Config(_)
        | FlowError::Storage(_)
        | FlowError::TurnAborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, StatusCode> {
    info!(
        session_id = ?request.session_id,
        content_length = %request.content.len(),
        "Processing chat request"
    );

    let mut replies = Vec::new();
    let session_id = match request.session_id {
        Some(id) => {
            if Uuid::parse_str(&id).is_err() {
                warn!(session_id = %id, "Invalid session ID format");
                return Err(StatusCode::BAD_REQUEST);
            }
            id
        }
        None => {
            let session = state.runner.open().await.map_err(|e| {
                error!(error = %e, "Failed to open session");
                status_for(&e)
            })?;
            // The greeting is part of the opening exchange
            replies.extend(session.transcript.iter().cloned());
            if request.content.trim().is_empty() {
                return Ok(Json(ChatResponse {
                    session_id: session.id,
                    replies,
                    phase: session.dialogue.phase,
                    mode: session.dialogue.mode,
                }));
            }
            session.id
        }
    };

    match state.runner.send(&session_id, &request.content).await {
        Ok(mut produced) => replies.append(&mut produced),
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Chat request rejected");
            return Err(status_for(&e));
        }
    }

    let session = state.runner.session(&session_id).await.map_err(|e| {
        error!(session_id = %session_id, error = %e, "Failed to reload session");
        status_for(&e)
    })?;

    info!(
        session_id = %session_id,
        phase = ?session.dialogue.phase,
        replies = replies.len(),
        "Request completed successfully"
    );

    Ok(Json(ChatResponse {
        session_id,
        replies,
        phase: session.dialogue.phase,
        mode: session.dialogue.mode,
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, StatusCode> {
    info!(session_id = %session_id, "Getting session");

    state.runner.session(&session_id).await.map(Json).map_err(|e| {
        info!(session_id = %session_id, error = %e, "Session lookup failed");
        status_for(&e)
    })
}

async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    if let Err(e) = state.runner.session(&session_id).await {
        return Err(status_for(&e));
    }
    state.runner.close(&session_id).await.map_err(|e| {
        error!(session_id = %session_id, error = %e, "Failed to close session");
        status_for(&e)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_schema(Path(domain): Path<String>) -> Result<Json<DomainSchema>, StatusCode> {
    domain
        .parse::<Domain>()
        .map(|domain| Json(domain.schema()))
        .map_err(|_| StatusCode::NOT_FOUND)
}
