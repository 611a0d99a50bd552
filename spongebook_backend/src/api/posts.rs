use super::{require_user, ApiError, ApiResult, AppState};
use crate::posts::{CreatePostInput, PostService, PostView, UpdatePostInput};
use crate::visibility::Viewer;
use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

/// Listed public posts of this node followed by those of the configured
/// remote nodes.
pub(crate) async fn list_public_posts(State(state): State<AppState>) -> ApiResult<Vec<Value>> {
    let service = PostService::new(state.database.clone());
    let local = service.list_public()?;
    let mut listing = Vec::with_capacity(local.len());
    for post in local {
        listing.push(serde_json::to_value(post).context("failed to encode post")?);
    }
    listing.extend(state.remote.fetch_public_posts().await);
    Ok(Json(listing))
}

pub(crate) async fn create_post(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(payload): Json<CreatePostInput>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let author = require_user(&viewer)?;
    let service = PostService::new(state.database.clone());
    let post = service.create_post(author, payload)?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub(crate) async fn get_post(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> ApiResult<PostView> {
    let service = PostService::new(state.database.clone());
    Ok(Json(service.get_post(&viewer, &id)?))
}

pub(crate) async fn update_post(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePostInput>,
) -> ApiResult<PostView> {
    let actor = require_user(&viewer)?;
    let service = PostService::new(state.database.clone());
    Ok(Json(service.update_post(actor, &id, payload)?))
}

pub(crate) async fn delete_post(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let actor = require_user(&viewer)?;
    let service = PostService::new(state.database.clone());
    service.delete_post(actor, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_visible_posts(
    State(state): State<AppState>,
    viewer: Viewer,
) -> ApiResult<Vec<PostView>> {
    let service = PostService::new(state.database.clone());
    Ok(Json(service.list_visible(&viewer)?))
}

pub(crate) async fn list_user_visible_posts(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<PostView>> {
    let service = PostService::new(state.database.clone());
    Ok(Json(service.list_visible_by_author(&viewer, &user_id)?))
}
