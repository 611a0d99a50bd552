mod friends;
mod posts;

use crate::config::SpongebookConfig;
use crate::database::Database;
use crate::error::ServiceError;
use crate::remote::RemotePostClient;
use crate::visibility::Viewer;
use anyhow::Result;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Header carrying the identity resolved by the authentication layer in
/// front of this service. Requests without it are anonymous.
pub const VIEWER_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub config: SpongebookConfig,
    pub database: Database,
    pub remote: RemotePostClient,
}

impl AppState {
    pub fn new(config: SpongebookConfig, database: Database) -> Result<Self> {
        let remote = RemotePostClient::new(&config.remote)?;
        Ok(Self {
            config,
            database,
            remote,
        })
    }
}

pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(anyhow::Error),
}

impl ApiError {
    fn into_response_parts(self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse { message: msg }),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorResponse { message: msg })
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorResponse { message: msg }),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse { message: msg }),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse { message: msg }),
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        message: "internal server error".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_response_parts();
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => ApiError::BadRequest(msg),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Forbidden(msg) => ApiError::Forbidden(msg),
            ServiceError::Internal(err) => ApiError::Internal(err),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(VIEWER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Ok(Viewer::from_optional(user))
    }
}

/// Signed-in identity or a 401.
pub(crate) fn require_user(viewer: &Viewer) -> Result<&str, ApiError> {
    viewer
        .user_id()
        .ok_or_else(|| ApiError::Unauthorized("authentication required".into()))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    api_port: u16,
    remote_nodes: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        api_port: state.config.api_port,
        remote_nodes: state.remote.nodes().len(),
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/friendrequest",
            get(friends::list_friend_requests).post(friends::create_friend_request),
        )
        .route(
            "/friendrequest/:id",
            get(friends::get_friend_request).delete(friends::delete_friend_request),
        )
        .route("/friendrequest/:id/accept", put(friends::accept_friend_request))
        .route("/friendrequest/:id/reject", put(friends::reject_friend_request))
        .route("/users/:user_id/friends", get(friends::list_user_friends))
        .route("/users/:user_id/followers", get(friends::list_user_followers))
        .route(
            "/users/:user_id/friendrequests",
            get(friends::list_user_friend_requests),
        )
        .route("/users/:user_id/visibleposts", get(posts::list_user_visible_posts))
        .route("/posts", get(posts::list_public_posts).post(posts::create_post))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/visibleposts", get(posts::list_visible_posts))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Tries to bind to the given port, or finds the next available port
async fn find_available_port(start_port: u16) -> Result<(TcpListener, u16)> {
    const MAX_PORT_ATTEMPTS: u16 = 100;

    for offset in 0..MAX_PORT_ATTEMPTS {
        let port = start_port.saturating_add(offset);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => {
                if offset == 0 {
                    tracing::debug!(port, error = %e, "Port in use, trying next port");
                }
                continue;
            }
        }
    }

    anyhow::bail!(
        "Could not find available port in range {}-{}",
        start_port,
        start_port.saturating_add(MAX_PORT_ATTEMPTS - 1)
    )
}

pub async fn serve_http(config: SpongebookConfig, database: Database) -> Result<()> {
    let state = AppState::new(config.clone(), database)?;
    let (listener, actual_port) = find_available_port(config.api_port).await?;
    if actual_port != config.api_port {
        tracing::warn!(
            requested_port = config.api_port,
            actual_port = actual_port,
            "Configured port was in use, bound to next available port"
        );
    }
    serve_on(listener, state).await
}

/// Serves the API on an already bound listener until the task is dropped.
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(?addr, "HTTP server listening");
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}
