use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;

use crate::{
    AppState,
    auth::CurrentUser,
    entities::production_company,
    error::{AppError, AppResult},
    pagination::{Page, PageParams, paginate},
    routes::slugify,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/companies", get(list_companies).post(create_company))
        .route("/companies/{id}", get(get_company).put(update_company).delete(delete_company))
}

#[derive(Debug, Deserialize)]
struct CompanyListQuery {
    q: Option<String>,
}

async fn list_companies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CompanyListQuery>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<production_company::Model>>> {
    let mut select =
        production_company::Entity::find().order_by_asc(production_company::Column::Name);
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        select = select.filter(production_company::Column::Name.contains(q));
    }
    let page = paginate(&state.db, select, &params).await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
struct CompanyRequest {
    name: String,
    country: Option<String>,
}

async fn create_company(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(req): Json<CompanyRequest>,
) -> AppResult<(StatusCode, Json<production_company::Model>)> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let created = production_company::ActiveModel {
        slug: Set(slugify(&name)),
        name: Set(name),
        country: Set(req.country.map(|c| c.trim().to_uppercase())),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<production_company::Model>> {
    let company = production_company::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("production company"))?;
    Ok(Json(company))
}

async fn update_company(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
    Json(req): Json<CompanyRequest>,
) -> AppResult<Json<production_company::Model>> {
    let company = production_company::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("production company"))?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let mut active: production_company::ActiveModel = company.into();
    active.slug = Set(slugify(&name));
    active.name = Set(name);
    if let Some(country) = req.country {
        active.country = Set(Some(country.trim().to_uppercase()));
    }
    let updated = active.update(&state.db).await?;
    Ok(Json(updated))
}

async fn delete_company(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let result = production_company::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("production company"));
    }
    Ok(StatusCode::NO_CONTENT)
}
