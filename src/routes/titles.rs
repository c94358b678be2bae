use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    auth::CurrentUser,
    entities::{
        cast_member, certification, crew_member, genre, person, production_company, title,
        title_company, title_genre,
        title::TitleKind,
    },
    error::{AppError, AppResult},
    now_sec,
    pagination::{Page, PageParams, paginate},
    routes::slugify,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/titles", get(list_titles).post(create_title))
        .route("/titles/{id}", get(get_title).put(update_title).delete(delete_title))
        .route("/titles/{id}/genres", put(set_genres))
        .route("/titles/{id}/companies", put(set_companies))
        .route("/titles/{id}/cast", get(list_cast).post(add_cast))
        .route("/titles/{id}/cast/{credit_id}", delete(remove_cast))
        .route("/titles/{id}/crew", get(list_crew).post(add_crew))
        .route("/titles/{id}/crew/{credit_id}", delete(remove_crew))
}

#[derive(Debug, Deserialize)]
struct CreateTitleRequest {
    name: String,
    kind: TitleKind,
    overview: Option<String>,
    release_year: Option<i32>,
    runtime_minutes: Option<i32>,
    poster_path: Option<String>,
    certification_id: Option<i32>,
    #[serde(default)]
    genre_ids: Vec<i32>,
    #[serde(default)]
    company_ids: Vec<i32>,
}

#[derive(Debug, Deserialize)]
struct UpdateTitleRequest {
    name: Option<String>,
    kind: Option<TitleKind>,
    overview: Option<String>,
    release_year: Option<i32>,
    runtime_minutes: Option<i32>,
    poster_path: Option<String>,
    certification_id: Option<i32>,
}

#[derive(Debug, Serialize)]
struct TitleDetail {
    #[serde(flatten)]
    title: title::Model,
    genres: Vec<genre::Model>,
    companies: Vec<production_company::Model>,
    certification: Option<certification::Model>,
    ratings_count: u64,
    ratings_avg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TitleListQuery {
    kind: Option<TitleKind>,
    genre: Option<String>,
    company: Option<String>,
    year: Option<i32>,
    q: Option<String>,
}

async fn list_titles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TitleListQuery>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<title::Model>>> {
    let mut select = title::Entity::find().order_by_asc(title::Column::Name);

    if let Some(kind) = query.kind {
        select = select.filter(title::Column::Kind.eq(kind));
    }
    if let Some(year) = query.year {
        select = select.filter(title::Column::ReleaseYear.eq(year));
    }
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        select = select.filter(title::Column::Name.contains(q));
    }

    if let Some(slug) = query.genre.as_deref() {
        let genre = genre::Entity::find()
            .filter(genre::Column::Slug.eq(slug))
            .one(&state.db)
            .await?
            .ok_or(AppError::NotFound("genre"))?;
        let ids: Vec<i32> = title_genre::Entity::find()
            .filter(title_genre::Column::GenreId.eq(genre.id))
            .all(&state.db)
            .await?
            .into_iter()
            .map(|tg| tg.title_id)
            .collect();
        select = select.filter(title::Column::Id.is_in(ids));
    }

    if let Some(slug) = query.company.as_deref() {
        let company = production_company::Entity::find()
            .filter(production_company::Column::Slug.eq(slug))
            .one(&state.db)
            .await?
            .ok_or(AppError::NotFound("production company"))?;
        let ids: Vec<i32> = title_company::Entity::find()
            .filter(title_company::Column::CompanyId.eq(company.id))
            .all(&state.db)
            .await?
            .into_iter()
            .map(|tc| tc.title_id)
            .collect();
        select = select.filter(title::Column::Id.is_in(ids));
    }

    let page = paginate(&state.db, select, &params).await?;
    Ok(Json(page))
}

async fn create_title(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(req): Json<CreateTitleRequest>,
) -> AppResult<(StatusCode, Json<TitleDetail>)> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    if let Some(minutes) = req.runtime_minutes {
        if minutes <= 0 {
            return Err(AppError::Validation("runtime_minutes must be positive".to_string()));
        }
    }

    let slug = title_slug(&name, req.release_year);
    let now = now_sec();

    let txn = state.db.begin().await?;

    let created = title::ActiveModel {
        slug: Set(slug),
        name: Set(name),
        kind: Set(req.kind),
        overview: Set(req.overview),
        release_year: Set(req.release_year),
        runtime_minutes: Set(req.runtime_minutes),
        poster_path: Set(req.poster_path),
        certification_id: Set(req.certification_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    replace_genres(&txn, created.id, &req.genre_ids).await?;
    replace_companies(&txn, created.id, &req.company_ids).await?;

    txn.commit().await?;

    tracing::info!(title_id = created.id, slug = %created.slug, "created title");
    let detail = load_detail(&state, created).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_title(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<TitleDetail>> {
    let model = find_title(&state, id).await?;
    let detail = load_detail(&state, model).await?;
    Ok(Json(detail))
}

async fn update_title(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
    Json(req): Json<UpdateTitleRequest>,
) -> AppResult<Json<TitleDetail>> {
    let model = find_title(&state, id).await?;

    let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let year = req.release_year.or(model.release_year);
    let slug = match name {
        Some(name) => Some(title_slug(name, year)),
        None if req.release_year.is_some() => Some(title_slug(&model.name, year)),
        None => None,
    };

    let mut active: title::ActiveModel = model.into();
    if let Some(name) = name {
        active.name = Set(name.to_string());
    }
    if let Some(slug) = slug {
        active.slug = Set(slug);
    }
    if let Some(kind) = req.kind {
        active.kind = Set(kind);
    }
    if let Some(overview) = req.overview {
        active.overview = Set(Some(overview));
    }
    if let Some(year) = req.release_year {
        active.release_year = Set(Some(year));
    }
    if let Some(minutes) = req.runtime_minutes {
        if minutes <= 0 {
            return Err(AppError::Validation("runtime_minutes must be positive".to_string()));
        }
        active.runtime_minutes = Set(Some(minutes));
    }
    if let Some(poster) = req.poster_path {
        active.poster_path = Set(Some(poster));
    }
    if let Some(certification_id) = req.certification_id {
        active.certification_id = Set(Some(certification_id));
    }
    active.updated_at = Set(now_sec());

    let updated = active.update(&state.db).await?;
    let detail = load_detail(&state, updated).await?;
    Ok(Json(detail))
}

async fn delete_title(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let result = title::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("title"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct SetGenresRequest {
    genre_ids: Vec<i32>,
}

async fn set_genres(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
    Json(req): Json<SetGenresRequest>,
) -> AppResult<Json<Vec<genre::Model>>> {
    find_title(&state, id).await?;

    let txn = state.db.begin().await?;
    title_genre::Entity::delete_many()
        .filter(title_genre::Column::TitleId.eq(id))
        .exec(&txn)
        .await?;
    replace_genres(&txn, id, &req.genre_ids).await?;
    txn.commit().await?;

    let genres = genres_for(&state, id).await?;
    Ok(Json(genres))
}

#[derive(Debug, Deserialize)]
struct SetCompaniesRequest {
    company_ids: Vec<i32>,
}

async fn set_companies(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
    Json(req): Json<SetCompaniesRequest>,
) -> AppResult<Json<Vec<production_company::Model>>> {
    find_title(&state, id).await?;

    let txn = state.db.begin().await?;
    title_company::Entity::delete_many()
        .filter(title_company::Column::TitleId.eq(id))
        .exec(&txn)
        .await?;
    replace_companies(&txn, id, &req.company_ids).await?;
    txn.commit().await?;

    let companies = companies_for(&state, id).await?;
    Ok(Json(companies))
}

#[derive(Debug, Serialize)]
pub struct CastCredit {
    pub id: i32,
    pub person: PersonSummary,
    pub character: String,
    pub billing_order: i32,
}

#[derive(Debug, Serialize)]
pub struct CrewCredit {
    pub id: i32,
    pub person: PersonSummary,
    pub job: String,
    pub department: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PersonSummary {
    pub id: i32,
    pub slug: String,
    pub name: String,
}

impl From<person::Model> for PersonSummary {
    fn from(m: person::Model) -> Self {
        Self { id: m.id, slug: m.slug, name: m.name }
    }
}

async fn list_cast(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<CastCredit>>> {
    find_title(&state, id).await?;

    let rows = cast_member::Entity::find()
        .filter(cast_member::Column::TitleId.eq(id))
        .find_also_related(person::Entity)
        .order_by_asc(cast_member::Column::BillingOrder)
        .all(&state.db)
        .await?;

    let credits = rows
        .into_iter()
        .filter_map(|(credit, person)| {
            person.map(|p| CastCredit {
                id: credit.id,
                person: p.into(),
                character: credit.character,
                billing_order: credit.billing_order,
            })
        })
        .collect();

    Ok(Json(credits))
}

#[derive(Debug, Deserialize)]
struct AddCastRequest {
    person_id: i32,
    character: String,
    billing_order: Option<i32>,
}

async fn add_cast(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
    Json(req): Json<AddCastRequest>,
) -> AppResult<(StatusCode, Json<CastCredit>)> {
    find_title(&state, id).await?;
    let person = person::Entity::find_by_id(req.person_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("person"))?;

    let billing_order = match req.billing_order {
        Some(order) => order,
        None => {
            let count = cast_member::Entity::find()
                .filter(cast_member::Column::TitleId.eq(id))
                .all(&state.db)
                .await?
                .len();
            count as i32
        }
    };

    let created = cast_member::ActiveModel {
        title_id: Set(id),
        person_id: Set(req.person_id),
        character: Set(req.character),
        billing_order: Set(billing_order),
        created_at: Set(now_sec()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    let credit = CastCredit {
        id: created.id,
        person: person.into(),
        character: created.character,
        billing_order: created.billing_order,
    };
    Ok((StatusCode::CREATED, Json(credit)))
}

async fn remove_cast(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path((id, credit_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    let result = cast_member::Entity::delete_many()
        .filter(cast_member::Column::Id.eq(credit_id))
        .filter(cast_member::Column::TitleId.eq(id))
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("cast credit"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_crew(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<CrewCredit>>> {
    find_title(&state, id).await?;

    let rows = crew_member::Entity::find()
        .filter(crew_member::Column::TitleId.eq(id))
        .find_also_related(person::Entity)
        .order_by_asc(crew_member::Column::Id)
        .all(&state.db)
        .await?;

    let credits = rows
        .into_iter()
        .filter_map(|(credit, person)| {
            person.map(|p| CrewCredit {
                id: credit.id,
                person: p.into(),
                job: credit.job,
                department: credit.department,
            })
        })
        .collect();

    Ok(Json(credits))
}

#[derive(Debug, Deserialize)]
struct AddCrewRequest {
    person_id: i32,
    job: String,
    department: Option<String>,
}

async fn add_crew(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
    Json(req): Json<AddCrewRequest>,
) -> AppResult<(StatusCode, Json<CrewCredit>)> {
    find_title(&state, id).await?;
    let person = person::Entity::find_by_id(req.person_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("person"))?;

    let created = crew_member::ActiveModel {
        title_id: Set(id),
        person_id: Set(req.person_id),
        job: Set(req.job),
        department: Set(req.department),
        created_at: Set(now_sec()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    let credit = CrewCredit {
        id: created.id,
        person: person.into(),
        job: created.job,
        department: created.department,
    };
    Ok((StatusCode::CREATED, Json(credit)))
}

async fn remove_crew(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path((id, credit_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    let result = crew_member::Entity::delete_many()
        .filter(crew_member::Column::Id.eq(credit_id))
        .filter(crew_member::Column::TitleId.eq(id))
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("crew credit"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_title(state: &Arc<AppState>, id: i32) -> AppResult<title::Model> {
    title::Entity::find_by_id(id).one(&state.db).await?.ok_or(AppError::NotFound("title"))
}

fn title_slug(name: &str, year: Option<i32>) -> String {
    match year {
        Some(year) => format!("{}-{year}", slugify(name)),
        None => slugify(name),
    }
}

async fn genres_for(state: &Arc<AppState>, title_id: i32) -> AppResult<Vec<genre::Model>> {
    let ids: Vec<i32> = title_genre::Entity::find()
        .filter(title_genre::Column::TitleId.eq(title_id))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|tg| tg.genre_id)
        .collect();
    Ok(genre::Entity::find()
        .filter(genre::Column::Id.is_in(ids))
        .order_by_asc(genre::Column::Name)
        .all(&state.db)
        .await?)
}

async fn companies_for(
    state: &Arc<AppState>,
    title_id: i32,
) -> AppResult<Vec<production_company::Model>> {
    let ids: Vec<i32> = title_company::Entity::find()
        .filter(title_company::Column::TitleId.eq(title_id))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|tc| tc.company_id)
        .collect();
    Ok(production_company::Entity::find()
        .filter(production_company::Column::Id.is_in(ids))
        .order_by_asc(production_company::Column::Name)
        .all(&state.db)
        .await?)
}

async fn load_detail(state: &Arc<AppState>, model: title::Model) -> AppResult<TitleDetail> {
    let genres = genres_for(state, model.id).await?;
    let companies = companies_for(state, model.id).await?;

    let certification = match model.certification_id {
        Some(id) => certification::Entity::find_by_id(id).one(&state.db).await?,
        None => None,
    };

    let (ratings_count, ratings_avg) = super::ratings::rating_stats(state, model.id).await?;

    Ok(TitleDetail { title: model, genres, companies, certification, ratings_count, ratings_avg })
}

async fn replace_genres<C: sea_orm::ConnectionTrait>(
    db: &C,
    title_id: i32,
    genre_ids: &[i32],
) -> AppResult<()> {
    for genre_id in genre_ids {
        title_genre::ActiveModel {
            title_id: Set(title_id),
            genre_id: Set(*genre_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

async fn replace_companies<C: sea_orm::ConnectionTrait>(
    db: &C,
    title_id: i32,
    company_ids: &[i32],
) -> AppResult<()> {
    for company_id in company_ids {
        title_company::ActiveModel {
            title_id: Set(title_id),
            company_id: Set(*company_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}
