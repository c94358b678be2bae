use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::Deserialize;

use crate::{
    AppState,
    auth::CurrentUser,
    entities::genre,
    error::{AppError, AppResult},
    pagination::{Page, PageParams, paginate},
    routes::slugify,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/genres", get(list_genres).post(create_genre))
        .route("/genres/{id}", get(get_genre).put(update_genre).delete(delete_genre))
}

async fn list_genres(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<genre::Model>>> {
    let select = genre::Entity::find().order_by_asc(genre::Column::Name);
    let page = paginate(&state.db, select, &params).await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
struct GenreRequest {
    name: String,
}

async fn create_genre(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(req): Json<GenreRequest>,
) -> AppResult<(StatusCode, Json<genre::Model>)> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let created = genre::ActiveModel {
        slug: Set(slugify(&name)),
        name: Set(name),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_genre(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<genre::Model>> {
    let genre =
        genre::Entity::find_by_id(id).one(&state.db).await?.ok_or(AppError::NotFound("genre"))?;
    Ok(Json(genre))
}

async fn update_genre(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
    Json(req): Json<GenreRequest>,
) -> AppResult<Json<genre::Model>> {
    let genre =
        genre::Entity::find_by_id(id).one(&state.db).await?.ok_or(AppError::NotFound("genre"))?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let mut active: genre::ActiveModel = genre.into();
    active.slug = Set(slugify(&name));
    active.name = Set(name);
    let updated = active.update(&state.db).await?;
    Ok(Json(updated))
}

async fn delete_genre(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let result = genre::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("genre"));
    }
    Ok(StatusCode::NO_CONTENT)
}
