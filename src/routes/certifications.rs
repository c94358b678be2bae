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
    entities::certification,
    error::{AppError, AppResult},
    pagination::{Page, PageParams, paginate},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/certifications", get(list_certifications).post(create_certification))
        .route(
            "/certifications/{id}",
            get(get_certification).put(update_certification).delete(delete_certification),
        )
}

#[derive(Debug, Deserialize)]
struct CertificationListQuery {
    country: Option<String>,
}

async fn list_certifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CertificationListQuery>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<certification::Model>>> {
    let mut select = certification::Entity::find()
        .order_by_asc(certification::Column::Country)
        .order_by_asc(certification::Column::Code);
    if let Some(country) = query.country.as_deref() {
        select = select.filter(certification::Column::Country.eq(country.to_uppercase()));
    }
    let page = paginate(&state.db, select, &params).await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
struct CreateCertificationRequest {
    code: String,
    country: String,
    description: Option<String>,
}

/// (code, country) is unique at the schema level; a duplicate insert comes
/// back as a 409 through the DbErr translation.
async fn create_certification(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(req): Json<CreateCertificationRequest>,
) -> AppResult<(StatusCode, Json<certification::Model>)> {
    let code = req.code.trim().to_string();
    let country = req.country.trim().to_uppercase();

    if code.is_empty() {
        return Err(AppError::Validation("code is required".to_string()));
    }
    if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::Validation("country must be a 2-letter code".to_string()));
    }

    let created = certification::ActiveModel {
        code: Set(code),
        country: Set(country),
        description: Set(req.description),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_certification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<certification::Model>> {
    let certification = certification::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("certification"))?;
    Ok(Json(certification))
}

#[derive(Debug, Deserialize)]
struct UpdateCertificationRequest {
    code: Option<String>,
    description: Option<String>,
}

async fn update_certification(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
    Json(req): Json<UpdateCertificationRequest>,
) -> AppResult<Json<certification::Model>> {
    let certification = certification::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("certification"))?;

    let mut active: certification::ActiveModel = certification.into();
    if let Some(code) = req.code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        active.code = Set(code.to_string());
    }
    if let Some(description) = req.description {
        active.description = Set(Some(description));
    }
    let updated = active.update(&state.db).await?;
    Ok(Json(updated))
}

async fn delete_certification(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let result = certification::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("certification"));
    }
    Ok(StatusCode::NO_CONTENT)
}
