use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, sea_query::OnConflict,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    auth::CurrentUser,
    entities::rating,
    error::{AppError, AppResult},
    now_sec,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/titles/{id}/rating", get(get_rating).put(set_rating).delete(delete_rating))
}

#[derive(Debug, Serialize)]
struct RatingResponse {
    title_id: i32,
    score: i16,
    created_at: i64,
    updated_at: i64,
}

impl From<rating::Model> for RatingResponse {
    fn from(m: rating::Model) -> Self {
        Self {
            title_id: m.title_id,
            score: m.score,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SetRatingRequest {
    score: i16,
}

/// Upsert on the (user, title) unique key.
async fn set_rating(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(title_id): Path<i32>,
    Json(req): Json<SetRatingRequest>,
) -> AppResult<Json<RatingResponse>> {
    if !(0..=10).contains(&req.score) {
        return Err(AppError::Unprocessable("score must be between 0 and 10".to_string()));
    }

    super::titles::find_title(&state, title_id).await?;

    let now = now_sec();
    let model = rating::ActiveModel {
        title_id: Set(title_id),
        user_id: Set(current.id),
        score: Set(req.score),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    rating::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([rating::Column::UserId, rating::Column::TitleId])
                .update_columns([rating::Column::Score, rating::Column::UpdatedAt])
                .to_owned(),
        )
        .exec(&state.db)
        .await?;

    let stored = find_own(&state, current.id, title_id).await?;
    Ok(Json(stored.into()))
}

async fn get_rating(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(title_id): Path<i32>,
) -> AppResult<Json<RatingResponse>> {
    super::titles::find_title(&state, title_id).await?;
    let stored = find_own(&state, current.id, title_id).await?;
    Ok(Json(stored.into()))
}

async fn delete_rating(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(title_id): Path<i32>,
) -> AppResult<StatusCode> {
    let result = rating::Entity::delete_many()
        .filter(rating::Column::UserId.eq(current.id))
        .filter(rating::Column::TitleId.eq(title_id))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("rating"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn find_own(state: &Arc<AppState>, user_id: i32, title_id: i32) -> AppResult<rating::Model> {
    rating::Entity::find()
        .filter(rating::Column::UserId.eq(user_id))
        .filter(rating::Column::TitleId.eq(title_id))
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("rating"))
}

/// Count and mean score for a title, computed from the fetched rows.
pub(crate) async fn rating_stats(
    state: &Arc<AppState>,
    title_id: i32,
) -> AppResult<(u64, Option<f64>)> {
    let scores: Vec<i16> = rating::Entity::find()
        .filter(rating::Column::TitleId.eq(title_id))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|r| r.score)
        .collect();

    if scores.is_empty() {
        return Ok((0, None));
    }

    let count = scores.len() as u64;
    let avg = scores.iter().map(|s| f64::from(*s)).sum::<f64>() / count as f64;
    Ok((count, Some(avg)))
}
