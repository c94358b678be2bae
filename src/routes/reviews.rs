use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    auth::CurrentUser,
    entities::{comment, review, user},
    error::{AppError, AppResult},
    now_sec,
    pagination::{Page, PageParams, paginate},
    routes::users::UserPublic,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/titles/{id}/reviews", get(list_reviews).post(create_review))
        .route("/reviews/{id}", get(get_review).put(update_review).delete(delete_review))
        .route("/reviews/{id}/comments", get(list_comments).post(create_comment))
        .route("/comments/{id}", delete(delete_comment))
}

#[derive(Debug, Serialize)]
struct ReviewResponse {
    id: i32,
    title_id: i32,
    author: Option<UserPublic>,
    headline: Option<String>,
    body: String,
    contains_spoilers: bool,
    created_at: i64,
    updated_at: i64,
}

impl ReviewResponse {
    fn from_parts(review: review::Model, author: Option<user::Model>) -> Self {
        Self {
            id: review.id,
            title_id: review.title_id,
            author: author.map(UserPublic::from),
            headline: review.headline,
            body: review.body,
            contains_spoilers: review.contains_spoilers,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateReviewRequest {
    headline: Option<String>,
    body: String,
    #[serde(default)]
    contains_spoilers: bool,
}

async fn create_review(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(title_id): Path<i32>,
    Json(req): Json<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ReviewResponse>)> {
    super::titles::find_title(&state, title_id).await?;

    if req.body.trim().is_empty() {
        return Err(AppError::Validation("review body is required".to_string()));
    }

    let now = now_sec();
    let created = review::ActiveModel {
        title_id: Set(title_id),
        user_id: Set(current.id),
        headline: Set(req.headline),
        body: Set(req.body),
        contains_spoilers: Set(req.contains_spoilers),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|err| match AppError::from(err) {
        AppError::Conflict(_) => {
            AppError::Conflict("you have already reviewed this title".to_string())
        }
        other => other,
    })?;

    let author = user::Entity::find_by_id(current.id).one(&state.db).await?;
    Ok((StatusCode::CREATED, Json(ReviewResponse::from_parts(created, author))))
}

async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(title_id): Path<i32>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<ReviewResponse>>> {
    super::titles::find_title(&state, title_id).await?;

    let select = review::Entity::find()
        .filter(review::Column::TitleId.eq(title_id))
        .find_also_related(user::Entity)
        .order_by_desc(review::Column::CreatedAt);

    let page = paginate(&state.db, select, &params).await?;
    Ok(Json(page.map(|(review, author)| ReviewResponse::from_parts(review, author))))
}

async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<ReviewResponse>> {
    let (review, author) = review::Entity::find_by_id(id)
        .find_also_related(user::Entity)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("review"))?;
    Ok(Json(ReviewResponse::from_parts(review, author)))
}

#[derive(Debug, Deserialize)]
struct UpdateReviewRequest {
    headline: Option<String>,
    body: Option<String>,
    contains_spoilers: Option<bool>,
}

async fn update_review(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Json(req): Json<UpdateReviewRequest>,
) -> AppResult<Json<ReviewResponse>> {
    let review = review::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("review"))?;

    if review.user_id != current.id {
        return Err(AppError::Forbidden("only the author can edit a review"));
    }

    let mut active: review::ActiveModel = review.into();
    if let Some(headline) = req.headline {
        let trimmed = headline.trim().to_string();
        active.headline = Set((!trimmed.is_empty()).then_some(trimmed));
    }
    if let Some(body) = req.body {
        if body.trim().is_empty() {
            return Err(AppError::Validation("review body is required".to_string()));
        }
        active.body = Set(body);
    }
    if let Some(spoilers) = req.contains_spoilers {
        active.contains_spoilers = Set(spoilers);
    }
    active.updated_at = Set(now_sec());

    let updated = active.update(&state.db).await?;
    let author = user::Entity::find_by_id(current.id).one(&state.db).await?;
    Ok(Json(ReviewResponse::from_parts(updated, author)))
}

async fn delete_review(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let review = review::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("review"))?;

    if review.user_id != current.id {
        return Err(AppError::Forbidden("only the author can delete a review"));
    }

    review::Entity::delete_by_id(id).exec(&state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct CommentResponse {
    id: i32,
    review_id: i32,
    author: Option<UserPublic>,
    body: String,
    created_at: i64,
}

impl CommentResponse {
    fn from_parts(comment: comment::Model, author: Option<user::Model>) -> Self {
        Self {
            id: comment.id,
            review_id: comment.review_id,
            author: author.map(UserPublic::from),
            body: comment.body,
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateCommentRequest {
    body: String,
}

async fn create_comment(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(review_id): Path<i32>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<CommentResponse>)> {
    review::Entity::find_by_id(review_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("review"))?;

    if req.body.trim().is_empty() {
        return Err(AppError::Validation("comment body is required".to_string()));
    }

    let created = comment::ActiveModel {
        review_id: Set(review_id),
        user_id: Set(current.id),
        body: Set(req.body),
        created_at: Set(now_sec()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    let author = user::Entity::find_by_id(current.id).one(&state.db).await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from_parts(created, author))))
}

async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<i32>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<CommentResponse>>> {
    review::Entity::find_by_id(review_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("review"))?;

    let select = comment::Entity::find()
        .filter(comment::Column::ReviewId.eq(review_id))
        .find_also_related(user::Entity)
        .order_by_asc(comment::Column::CreatedAt);

    let page = paginate(&state.db, select, &params).await?;
    Ok(Json(page.map(|(comment, author)| CommentResponse::from_parts(comment, author))))
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let comment = comment::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("comment"))?;

    if comment.user_id != current.id {
        return Err(AppError::Forbidden("only the author can delete a comment"));
    }

    comment::Entity::delete_by_id(id).exec(&state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}
