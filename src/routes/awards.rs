use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;

use crate::{
    AppState,
    auth::CurrentUser,
    entities::{award, person},
    error::{AppError, AppResult},
    now_sec,
    pagination::{Page, PageParams, paginate},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/awards", post(create_award))
        .route("/awards/{id}", get(get_award).put(update_award).delete(delete_award))
        .route("/titles/{id}/awards", get(title_awards))
        .route("/people/{id}/awards", get(person_awards))
}

#[derive(Debug, Deserialize)]
struct CreateAwardRequest {
    title_id: i32,
    person_id: Option<i32>,
    name: String,
    category: String,
    year: i32,
    #[serde(default)]
    won: bool,
}

async fn create_award(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(req): Json<CreateAwardRequest>,
) -> AppResult<(StatusCode, Json<award::Model>)> {
    if req.name.trim().is_empty() || req.category.trim().is_empty() {
        return Err(AppError::Validation("name and category are required".to_string()));
    }

    super::titles::find_title(&state, req.title_id).await?;
    if let Some(person_id) = req.person_id {
        person::Entity::find_by_id(person_id)
            .one(&state.db)
            .await?
            .ok_or(AppError::NotFound("person"))?;
    }

    let created = award::ActiveModel {
        title_id: Set(req.title_id),
        person_id: Set(req.person_id),
        name: Set(req.name.trim().to_string()),
        category: Set(req.category.trim().to_string()),
        year: Set(req.year),
        won: Set(req.won),
        created_at: Set(now_sec()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_award(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<award::Model>> {
    let award =
        award::Entity::find_by_id(id).one(&state.db).await?.ok_or(AppError::NotFound("award"))?;
    Ok(Json(award))
}

#[derive(Debug, Deserialize)]
struct UpdateAwardRequest {
    name: Option<String>,
    category: Option<String>,
    year: Option<i32>,
    won: Option<bool>,
}

async fn update_award(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
    Json(req): Json<UpdateAwardRequest>,
) -> AppResult<Json<award::Model>> {
    let award =
        award::Entity::find_by_id(id).one(&state.db).await?.ok_or(AppError::NotFound("award"))?;

    let mut active: award::ActiveModel = award.into();
    if let Some(name) = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        active.name = Set(name.to_string());
    }
    if let Some(category) = req.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        active.category = Set(category.to_string());
    }
    if let Some(year) = req.year {
        active.year = Set(year);
    }
    if let Some(won) = req.won {
        active.won = Set(won);
    }
    let updated = active.update(&state.db).await?;
    Ok(Json(updated))
}

async fn delete_award(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let result = award::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("award"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn title_awards(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<award::Model>>> {
    super::titles::find_title(&state, id).await?;

    let select = award::Entity::find()
        .filter(award::Column::TitleId.eq(id))
        .order_by_desc(award::Column::Year);
    let page = paginate(&state.db, select, &params).await?;
    Ok(Json(page))
}

async fn person_awards(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<award::Model>>> {
    person::Entity::find_by_id(id).one(&state.db).await?.ok_or(AppError::NotFound("person"))?;

    let select = award::Entity::find()
        .filter(award::Column::PersonId.eq(id))
        .order_by_desc(award::Column::Year);
    let page = paginate(&state.db, select, &params).await?;
    Ok(Json(page))
}
