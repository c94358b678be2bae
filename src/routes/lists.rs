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
    entities::{list, list_item, title},
    error::{AppError, AppResult},
    now_sec,
    pagination::{Page, PageParams, paginate},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/lists", get(list_lists).post(create_list))
        .route("/lists/{id}", get(get_list).put(update_list).delete(delete_list))
        .route("/lists/{id}/items", put(reorder_items).post(add_item))
        .route("/lists/{id}/items/{title_id}", delete(remove_item))
}

#[derive(Debug, Serialize)]
struct ListSummary {
    id: i32,
    user_id: i32,
    name: String,
    description: Option<String>,
    is_public: bool,
    created_at: i64,
    updated_at: i64,
}

impl From<list::Model> for ListSummary {
    fn from(m: list::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            name: m.name,
            description: m.description,
            is_public: m.is_public,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct ListItemResponse {
    title_id: i32,
    position: i32,
    name: String,
    slug: String,
    release_year: Option<i32>,
}

#[derive(Debug, Serialize)]
struct ListDetail {
    #[serde(flatten)]
    summary: ListSummary,
    items: Vec<ListItemResponse>,
}

#[derive(Debug, Deserialize)]
struct CreateListRequest {
    name: String,
    description: Option<String>,
    #[serde(default = "default_public")]
    is_public: bool,
}

fn default_public() -> bool {
    true
}

async fn create_list(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<CreateListRequest>,
) -> AppResult<(StatusCode, Json<ListSummary>)> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let now = now_sec();
    let created = list::ActiveModel {
        user_id: Set(current.id),
        name: Set(name),
        description: Set(req.description),
        is_public: Set(req.is_public),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

#[derive(Debug, Deserialize)]
struct ListListQuery {
    user_id: Option<i32>,
}

/// Own lists by default; another user's id shows only their public lists.
async fn list_lists(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(query): Query<ListListQuery>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<ListSummary>>> {
    let owner = query.user_id.unwrap_or(current.id);

    let mut select = list::Entity::find()
        .filter(list::Column::UserId.eq(owner))
        .order_by_desc(list::Column::UpdatedAt);
    if owner != current.id {
        select = select.filter(list::Column::IsPublic.eq(true));
    }

    let page = paginate(&state.db, select, &params).await?;
    Ok(Json(page.map(ListSummary::from)))
}

async fn get_list(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ListDetail>> {
    let list = find_visible(&state, current.id, id).await?;

    let rows = list_item::Entity::find()
        .filter(list_item::Column::ListId.eq(id))
        .find_also_related(title::Entity)
        .order_by_asc(list_item::Column::Position)
        .all(&state.db)
        .await?;

    let items = rows
        .into_iter()
        .filter_map(|(item, title)| {
            title.map(|t| ListItemResponse {
                title_id: item.title_id,
                position: item.position,
                name: t.name,
                slug: t.slug,
                release_year: t.release_year,
            })
        })
        .collect();

    Ok(Json(ListDetail { summary: list.into(), items }))
}

#[derive(Debug, Deserialize)]
struct UpdateListRequest {
    name: Option<String>,
    description: Option<String>,
    is_public: Option<bool>,
}

async fn update_list(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Json(req): Json<UpdateListRequest>,
) -> AppResult<Json<ListSummary>> {
    let list = find_owned(&state, current.id, id).await?;

    let mut active: list::ActiveModel = list.into();
    if let Some(name) = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        active.name = Set(name.to_string());
    }
    if let Some(description) = req.description {
        active.description = Set(Some(description));
    }
    if let Some(is_public) = req.is_public {
        active.is_public = Set(is_public);
    }
    active.updated_at = Set(now_sec());

    let updated = active.update(&state.db).await?;
    Ok(Json(updated.into()))
}

async fn delete_list(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    find_owned(&state, current.id, id).await?;
    list::Entity::delete_by_id(id).exec(&state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct AddItemRequest {
    title_id: i32,
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Json(req): Json<AddItemRequest>,
) -> AppResult<(StatusCode, Json<ListItemResponse>)> {
    find_owned(&state, current.id, id).await?;
    let title = super::titles::find_title(&state, req.title_id).await?;

    let next_position = list_item::Entity::find()
        .filter(list_item::Column::ListId.eq(id))
        .order_by_desc(list_item::Column::Position)
        .one(&state.db)
        .await?
        .map(|item| item.position + 1)
        .unwrap_or(0);

    let created = list_item::ActiveModel {
        list_id: Set(id),
        title_id: Set(req.title_id),
        position: Set(next_position),
        created_at: Set(now_sec()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|err| match AppError::from(err) {
        AppError::Conflict(_) => AppError::Conflict("title is already on this list".to_string()),
        other => other,
    })?;

    let item = ListItemResponse {
        title_id: created.title_id,
        position: created.position,
        name: title.name,
        slug: title.slug,
        release_year: title.release_year,
    };
    Ok((StatusCode::CREATED, Json(item)))
}

async fn remove_item(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path((id, title_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    find_owned(&state, current.id, id).await?;

    let result = list_item::Entity::delete_many()
        .filter(list_item::Column::ListId.eq(id))
        .filter(list_item::Column::TitleId.eq(title_id))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("list item"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct ReorderRequest {
    title_ids: Vec<i32>,
}

/// Replaces the ordering; the ids must be exactly the current members.
async fn reorder_items(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Json(req): Json<ReorderRequest>,
) -> AppResult<StatusCode> {
    find_owned(&state, current.id, id).await?;

    let items = list_item::Entity::find()
        .filter(list_item::Column::ListId.eq(id))
        .all(&state.db)
        .await?;

    let mut current_ids: Vec<i32> = items.iter().map(|i| i.title_id).collect();
    let mut requested = req.title_ids.clone();
    current_ids.sort_unstable();
    requested.sort_unstable();
    if current_ids != requested {
        return Err(AppError::Validation(
            "title_ids must be a permutation of the current list items".to_string(),
        ));
    }

    let txn = state.db.begin().await?;
    for (position, title_id) in req.title_ids.iter().enumerate() {
        let item = items.iter().find(|i| i.title_id == *title_id).cloned();
        if let Some(item) = item {
            let mut active: list_item::ActiveModel = item.into();
            active.position = Set(position as i32);
            active.update(&txn).await?;
        }
    }
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_owned(state: &Arc<AppState>, user_id: i32, id: i32) -> AppResult<list::Model> {
    let list = find_visible(state, user_id, id).await?;
    if list.user_id != user_id {
        return Err(AppError::Forbidden("only the owner can modify a list"));
    }
    Ok(list)
}

/// Private lists are invisible to everyone but their owner.
async fn find_visible(state: &Arc<AppState>, user_id: i32, id: i32) -> AppResult<list::Model> {
    let list =
        list::Entity::find_by_id(id).one(&state.db).await?.ok_or(AppError::NotFound("list"))?;
    if !list.is_public && list.user_id != user_id {
        return Err(AppError::NotFound("list"));
    }
    Ok(list)
}
