use crate::channel::ObserverSession;
use crate::errors::AppError;
use crate::models::{LifecycleResponse, StatusResponse};
use crate::origin::Resource;
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use futures::{future, SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

pub const PUSH_BODY: &str = "Pushed!";

#[derive(Debug, Deserialize)]
pub struct RemoteQuery {
    pub url: String,
}

pub async fn root_redirect(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.config.base_path)
}

pub async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    serve_local(&state, "index.html").await
}

/// Everything under the base path that no other route claims.
pub async fn resource(State(state): State<AppState>, uri: Uri) -> Result<Response, AppError> {
    let Some(path) = uri.path().strip_prefix(state.config.base_path.as_str()) else {
        return Err(AppError::not_found(format!("not found: {}", uri.path())));
    };
    let path = if path.is_empty() || path.ends_with('/') {
        format!("{path}index.html")
    } else {
        path.to_string()
    };
    serve_local(&state, &path).await
}

pub async fn remote_resource(
    State(state): State<AppState>,
    Query(query): Query<RemoteQuery>,
) -> Result<Response, AppError> {
    let lifecycle = &state.lifecycle;
    if !lifecycle.manifest().is_remote(&query.url) {
        return Err(AppError::not_found(format!("{} is not a cached resource", query.url)));
    }

    let deployment = lifecycle.active();
    if let Some(resource) = deployment.cache.get(&query.url) {
        return Ok(respond(resource.clone()));
    }
    warn!(url = %query.url, cache = %deployment.cache.name(), "cache miss, fetching from network");
    let resource = lifecycle.origin().fetch_remote(&query.url).await?;
    Ok(respond(resource))
}

async fn serve_local(state: &AppState, path: &str) -> Result<Response, AppError> {
    let lifecycle = &state.lifecycle;
    let deployment = lifecycle.active();
    if let Some(resource) = deployment.cache.get(path) {
        return Ok(respond(resource.clone()));
    }

    if lifecycle.manifest().local.iter().any(|entry| entry == path) {
        warn!(path, cache = %deployment.cache.name(), "cache miss, fetching from network");
    } else {
        debug!(path, "not cached, fetching from network");
    }
    let resource = lifecycle.origin().fetch_local(path).await?;
    Ok(respond(resource))
}

fn respond(resource: Resource) -> Response {
    ([(header::CONTENT_TYPE, resource.content_type)], resource.body).into_response()
}

pub async fn observer_socket(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_socket(state, socket))
}

async fn run_socket(state: AppState, socket: WebSocket) {
    let (sink, stream) = socket.split();
    let inbound = stream
        .take_while(|frame| future::ready(frame.is_ok()))
        .filter_map(|frame| {
            future::ready(match frame {
                Ok(Message::Text(text)) => Some(text),
                _ => None,
            })
        });
    let outbound = sink.with(|text: String| future::ready(Ok::<_, axum::Error>(Message::Text(text))));

    ObserverSession::new(state.lifecycle.clone())
        .run(inbound, outbound)
        .await;
}

pub async fn get_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    Ok(Json(state.status().await?))
}

pub async fn get_lifecycle(State(state): State<AppState>) -> Json<LifecycleResponse> {
    Json(state.lifecycle.snapshot())
}

pub async fn post_update(State(state): State<AppState>) -> Result<Json<LifecycleResponse>, AppError> {
    let installed = state.lifecycle.check_for_update().await?;
    info!(installed, "update check requested");
    Ok(Json(state.lifecycle.snapshot()))
}

pub async fn post_skip_waiting(
    State(state): State<AppState>,
) -> Result<Json<LifecycleResponse>, AppError> {
    let version = state.lifecycle.skip_waiting().await?;
    info!(%version, "handover requested over http");
    Ok(Json(state.lifecycle.snapshot()))
}

pub async fn post_push(State(state): State<AppState>) -> StatusCode {
    state.push(PUSH_BODY);
    StatusCode::NO_CONTENT
}
