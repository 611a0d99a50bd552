use super::{require_user, ApiError, ApiResult, AppState};
use crate::friends::{FriendService, FriendView};
use crate::visibility::Viewer;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct FollowRequest {
    /// Defaults to the signed-in viewer.
    #[serde(default)]
    follower: Option<String>,
    followee: String,
}

pub(crate) async fn list_friend_requests(
    State(state): State<AppState>,
) -> ApiResult<Vec<FriendView>> {
    let service = FriendService::new(state.database.clone());
    Ok(Json(service.list_all()?))
}

pub(crate) async fn create_friend_request(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(payload): Json<FollowRequest>,
) -> Result<(StatusCode, Json<FriendView>), ApiError> {
    let follower = match payload.follower {
        Some(follower) => follower,
        None => require_user(&viewer)?.to_string(),
    };
    let service = FriendService::new(state.database.clone());
    let edge = service.follow(&follower, &payload.followee)?;
    Ok((StatusCode::CREATED, Json(edge)))
}

pub(crate) async fn get_friend_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<FriendView> {
    let service = FriendService::new(state.database.clone());
    Ok(Json(service.get(id)?))
}

pub(crate) async fn delete_friend_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let service = FriendService::new(state.database.clone());
    service.unfollow(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn accept_friend_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<FriendView> {
    let service = FriendService::new(state.database.clone());
    Ok(Json(service.accept(id)?))
}

pub(crate) async fn reject_friend_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<FriendView> {
    let service = FriendService::new(state.database.clone());
    Ok(Json(service.reject(id)?))
}

pub(crate) async fn list_user_friends(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<FriendView>> {
    let service = FriendService::new(state.database.clone());
    Ok(Json(service.friends_of(&user_id)?))
}

pub(crate) async fn list_user_followers(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<FriendView>> {
    let service = FriendService::new(state.database.clone());
    Ok(Json(service.followers_of(&user_id)?))
}

pub(crate) async fn list_user_friend_requests(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<FriendView>> {
    let service = FriendService::new(state.database.clone());
    Ok(Json(service.pending_requests_of(&user_id)?))
}
