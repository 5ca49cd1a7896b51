//! Posts, comments, likes and friendships.
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use matchday_common::requests::{
    CreateCommentRequest, CreatePostRequest, FriendRequestBody, RespondFriendRequest,
};
use matchday_common::{Comment, Friendship, MatchId, Post, PublicUser};
use serde::Deserialize;
use uuid::Uuid;

use super::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::{social, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilter {
    pub match_id: Option<MatchId>,
}

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Query(filter): Query<PostFilter>,
) -> Result<Json<Vec<Post>>, AppError> {
    Ok(Json(
        social::list_posts(state.storage.as_ref(), filter.match_id).await?,
    ))
}

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(request): ApiJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let post = social::create_post(
        state.storage.as_ref(),
        &state.registry,
        &current.user,
        request,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Post>, AppError> {
    Ok(Json(
        social::toggle_like(state.storage.as_ref(), post_id, current.user.id).await?,
    ))
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, AppError> {
    Ok(Json(
        social::list_comments(state.storage.as_ref(), post_id).await?,
    ))
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(post_id): Path<Uuid>,
    ApiJson(request): ApiJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let comment =
        social::add_comment(state.storage.as_ref(), &current.user, post_id, request).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn friends(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    Ok(Json(
        social::friends_of(state.storage.as_ref(), current.user.id).await?,
    ))
}

pub async fn friend_requests(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<Vec<Friendship>>, AppError> {
    Ok(Json(
        social::incoming_requests(state.storage.as_ref(), current.user.id).await?,
    ))
}

pub async fn send_friend_request(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(request): ApiJson<FriendRequestBody>,
) -> Result<(StatusCode, Json<Friendship>), AppError> {
    let friendship =
        social::send_friend_request(state.storage.as_ref(), &current.user, request.addressee_id)
            .await?;
    Ok((StatusCode::CREATED, Json(friendship)))
}

pub async fn respond_friend_request(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(friendship_id): Path<Uuid>,
    ApiJson(request): ApiJson<RespondFriendRequest>,
) -> Result<Json<Friendship>, AppError> {
    Ok(Json(
        social::respond_friend_request(
            state.storage.as_ref(),
            &current.user,
            friendship_id,
            request.status,
        )
        .await?,
    ))
}
