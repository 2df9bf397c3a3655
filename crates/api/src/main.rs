mod openai;

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::Sse;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use backend_core::Role;
use reasoning_pipe::{
    ChannelEmitter, EventEmitter, LoggingEmitter, PipeError, PipeEvent, ReasoningPipe,
};
use serde::Serialize;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::openai::{ChatCompletionRequest, ChatCompletionResponse, ChunkFactory, ModelList};

/// Events buffered between a running pipe and its SSE response.
const EVENT_BUFFER: usize = 64;

#[derive(Clone)]
struct AppState {
    api_token: Option<String>,
    pipe: Arc<ReasoningPipe>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = env::var("PIPE_API_ADDR").unwrap_or_else(|_| "127.0.0.1:8788".to_string());
    let api_token = env::var("PIPE_API_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty());

    let pipe = ReasoningPipe::from_env()?;
    for descriptor in pipe.pipes() {
        info!(pipe = %descriptor.name, "Serving pipe");
    }

    let state = AppState {
        api_token,
        pipe: Arc::new(pipe),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/v1/models", get(list_models))
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(state);

    let addr: SocketAddr = addr.parse()?;
    info!(%addr, "CodeMaster API listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

async fn list_models(State(state): State<AppState>) -> Json<ModelList> {
    Json(ModelList::from_pipes(state.pipe.pipes()))
}

async fn chat_completions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChatCompletionRequest>,
) -> Result<Response, ApiError> {
    authorize(&state, &headers)?;

    let model = if payload.model.is_empty() {
        state
            .pipe
            .pipes()
            .into_iter()
            .next()
            .map(|p| p.id)
            .unwrap_or_default()
    } else {
        payload.model.clone()
    };
    let stream = payload.stream;
    let request = payload.into_pipe_request();

    debug!(
        model = %model,
        stream,
        messages = request.messages.len(),
        task = request.task.as_deref().unwrap_or("-"),
        "Chat completion request"
    );

    if !stream {
        let answer = state.pipe.run(request, &LoggingEmitter).await?;
        return Ok(Json(ChatCompletionResponse::new(model, answer)).into_response());
    }

    let (emitter, rx) = ChannelEmitter::new(EVENT_BUFFER);
    let pipe = state.pipe.clone();
    let is_task = request.task.is_some();

    tokio::spawn(async move {
        match pipe.run(request, &emitter).await {
            // Task answers are returned, not streamed; forward them as one message.
            Ok(answer) if is_task => {
                let _ = emitter.emit(PipeEvent::message(answer, Role::Assistant)).await;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Pipe run aborted"),
        }
    });

    let chunks = ChunkFactory::new(model);
    let tail = chunks.clone();
    let events = tokio_stream::once(chunks.start())
        .chain(ReceiverStream::new(rx).map(move |event| chunks.event(event)))
        .chain(tokio_stream::iter([
            tail.stop(),
            Ok(axum::response::sse::Event::default().data("[DONE]")),
        ]));

    Ok(Sse::new(events).into_response())
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    check_bearer(state.api_token.as_deref(), headers)
}

fn check_bearer(expected: Option<&str>, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(ApiError::Unauthorized);
    };

    let Ok(value) = value.to_str() else {
        return Err(ApiError::Unauthorized);
    };

    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    if token != expected {
        return Err(ApiError::Unauthorized);
    }

    Ok(())
}

#[derive(Debug)]
enum ApiError {
    Unauthorized,
    Pipe(PipeError),
}

impl From<PipeError> for ApiError {
    fn from(err: PipeError) -> Self {
        ApiError::Pipe(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => {
                warn!("Unauthorized request");
                let body = serde_json::json!({
                    "error": {
                        "message": "Unauthorized",
                        "type": "auth_error"
                    }
                });
                (StatusCode::UNAUTHORIZED, Json(body)).into_response()
            }
            ApiError::Pipe(err) => {
                warn!(error = %err, "Pipe run failed");
                let body = serde_json::json!({
                    "error": {
                        "message": err.to_string(),
                        "type": "pipe_error"
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_no_token_allows_all() {
        assert!(check_bearer(None, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_bearer_token_checked() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            check_bearer(Some("secret"), &headers),
            Err(ApiError::Unauthorized)
        ));

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer wrong"),
        );
        assert!(check_bearer(Some("secret"), &headers).is_err());

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer secret"),
        );
        assert!(check_bearer(Some("secret"), &headers).is_ok());
    }

    #[test]
    fn test_pipe_error_is_server_error() {
        let response = ApiError::from(PipeError::Emit("gone".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
