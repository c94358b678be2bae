use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    auth::CurrentUser,
    entities::{cast_member, crew_member, person, title},
    error::{AppError, AppResult},
    now_sec,
    pagination::{Page, PageParams, paginate},
    routes::slugify,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/people", get(list_people).post(create_person))
        .route("/people/{id}", get(get_person).put(update_person).delete(delete_person))
        .route("/people/{id}/credits", get(credits))
}

#[derive(Debug, Deserialize)]
struct PersonListQuery {
    q: Option<String>,
}

async fn list_people(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PersonListQuery>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<person::Model>>> {
    let mut select = person::Entity::find().order_by_asc(person::Column::Name);
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        select = select.filter(person::Column::Name.contains(q));
    }
    let page = paginate(&state.db, select, &params).await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
struct CreatePersonRequest {
    name: String,
    biography: Option<String>,
    birth_date: Option<String>,
    photo_path: Option<String>,
}

async fn create_person(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(req): Json<CreatePersonRequest>,
) -> AppResult<(StatusCode, Json<person::Model>)> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let now = now_sec();
    let created = person::ActiveModel {
        slug: Set(slugify(&name)),
        name: Set(name),
        biography: Set(req.biography),
        birth_date: Set(req.birth_date),
        photo_path: Set(req.photo_path),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_person(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<person::Model>> {
    let person = find_person(&state, id).await?;
    Ok(Json(person))
}

#[derive(Debug, Deserialize)]
struct UpdatePersonRequest {
    name: Option<String>,
    biography: Option<String>,
    birth_date: Option<String>,
    photo_path: Option<String>,
}

async fn update_person(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
    Json(req): Json<UpdatePersonRequest>,
) -> AppResult<Json<person::Model>> {
    let person = find_person(&state, id).await?;

    let mut active: person::ActiveModel = person.into();
    if let Some(name) = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        active.slug = Set(slugify(name));
        active.name = Set(name.to_string());
    }
    if let Some(biography) = req.biography {
        active.biography = Set(Some(biography));
    }
    if let Some(birth_date) = req.birth_date {
        active.birth_date = Set(Some(birth_date));
    }
    if let Some(photo_path) = req.photo_path {
        active.photo_path = Set(Some(photo_path));
    }
    active.updated_at = Set(now_sec());

    let updated = active.update(&state.db).await?;
    Ok(Json(updated))
}

async fn delete_person(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let result = person::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("person"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct TitleSummary {
    id: i32,
    slug: String,
    name: String,
    release_year: Option<i32>,
}

impl From<title::Model> for TitleSummary {
    fn from(m: title::Model) -> Self {
        Self { id: m.id, slug: m.slug, name: m.name, release_year: m.release_year }
    }
}

#[derive(Debug, Serialize)]
struct PersonCastCredit {
    title: TitleSummary,
    character: String,
    billing_order: i32,
}

#[derive(Debug, Serialize)]
struct PersonCrewCredit {
    title: TitleSummary,
    job: String,
    department: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreditsResponse {
    cast: Vec<PersonCastCredit>,
    crew: Vec<PersonCrewCredit>,
}

async fn credits(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<CreditsResponse>> {
    find_person(&state, id).await?;

    let cast_rows = cast_member::Entity::find()
        .filter(cast_member::Column::PersonId.eq(id))
        .find_also_related(title::Entity)
        .all(&state.db)
        .await?;

    let crew_rows = crew_member::Entity::find()
        .filter(crew_member::Column::PersonId.eq(id))
        .find_also_related(title::Entity)
        .all(&state.db)
        .await?;

    let cast = cast_rows
        .into_iter()
        .filter_map(|(credit, title)| {
            title.map(|t| PersonCastCredit {
                title: t.into(),
                character: credit.character,
                billing_order: credit.billing_order,
            })
        })
        .collect();

    let crew = crew_rows
        .into_iter()
        .filter_map(|(credit, title)| {
            title.map(|t| PersonCrewCredit {
                title: t.into(),
                job: credit.job,
                department: credit.department,
            })
        })
        .collect();

    Ok(Json(CreditsResponse { cast, crew }))
}

async fn find_person(state: &Arc<AppState>, id: i32) -> AppResult<person::Model> {
    person::Entity::find_by_id(id).one(&state.db).await?.ok_or(AppError::NotFound("person"))
}
