use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait, sea_query::OnConflict,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    auth::CurrentUser,
    entities::{title, watch_history, watchlist_entry},
    error::{AppError, AppResult},
    now_sec,
    pagination::{Page, PageParams, paginate},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/watchlist", get(list_watchlist))
        .route("/watchlist/{title_id}", put(add_to_watchlist).delete(remove_from_watchlist))
        .route("/history", get(list_history).post(log_watch))
        .route("/history/{id}", delete(delete_history_entry))
}

#[derive(Debug, Serialize)]
struct WatchlistItem {
    title_id: i32,
    name: String,
    slug: String,
    release_year: Option<i32>,
    added_at: i64,
}

/// Idempotent: re-adding an existing entry is a no-op.
async fn add_to_watchlist(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(title_id): Path<i32>,
) -> AppResult<StatusCode> {
    super::titles::find_title(&state, title_id).await?;

    let model = watchlist_entry::ActiveModel {
        user_id: Set(current.id),
        title_id: Set(title_id),
        added_at: Set(now_sec()),
        ..Default::default()
    };

    let result = watchlist_entry::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([
                watchlist_entry::Column::UserId,
                watchlist_entry::Column::TitleId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec(&state.db)
        .await;

    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(StatusCode::NO_CONTENT),
        Err(err) => Err(err.into()),
    }
}

async fn remove_from_watchlist(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(title_id): Path<i32>,
) -> AppResult<StatusCode> {
    let result = watchlist_entry::Entity::delete_many()
        .filter(watchlist_entry::Column::UserId.eq(current.id))
        .filter(watchlist_entry::Column::TitleId.eq(title_id))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("watchlist entry"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_watchlist(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<WatchlistItem>>> {
    let select = watchlist_entry::Entity::find()
        .filter(watchlist_entry::Column::UserId.eq(current.id))
        .find_also_related(title::Entity)
        .order_by_desc(watchlist_entry::Column::AddedAt);

    let page = paginate(&state.db, select, &params).await?;
    let page = page.map(|(entry, title)| {
        let (name, slug, release_year) = match title {
            Some(t) => (t.name, t.slug, t.release_year),
            None => (String::new(), String::new(), None),
        };
        WatchlistItem { title_id: entry.title_id, name, slug, release_year, added_at: entry.added_at }
    });
    Ok(Json(page))
}

#[derive(Debug, Serialize)]
struct HistoryEntry {
    id: i32,
    title_id: i32,
    name: String,
    slug: String,
    watched_at: i64,
}

#[derive(Debug, Deserialize)]
struct LogWatchRequest {
    title_id: i32,
    watched_at: Option<i64>,
}

/// Logging a watch also clears the title from the watchlist.
async fn log_watch(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<LogWatchRequest>,
) -> AppResult<(StatusCode, Json<HistoryEntry>)> {
    let title = super::titles::find_title(&state, req.title_id).await?;

    let now = now_sec();
    let watched_at = req.watched_at.unwrap_or(now);
    if watched_at > now {
        return Err(AppError::Validation("watched_at cannot be in the future".to_string()));
    }

    let txn = state.db.begin().await?;
    let created = watch_history::ActiveModel {
        user_id: Set(current.id),
        title_id: Set(req.title_id),
        watched_at: Set(watched_at),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    watchlist_entry::Entity::delete_many()
        .filter(watchlist_entry::Column::UserId.eq(current.id))
        .filter(watchlist_entry::Column::TitleId.eq(req.title_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    let entry = HistoryEntry {
        id: created.id,
        title_id: created.title_id,
        name: title.name,
        slug: title.slug,
        watched_at: created.watched_at,
    };
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn list_history(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<HistoryEntry>>> {
    let select = watch_history::Entity::find()
        .filter(watch_history::Column::UserId.eq(current.id))
        .find_also_related(title::Entity)
        .order_by_desc(watch_history::Column::WatchedAt);

    let page = paginate(&state.db, select, &params).await?;
    let page = page.map(|(entry, title)| {
        let (name, slug) = match title {
            Some(t) => (t.name, t.slug),
            None => (String::new(), String::new()),
        };
        HistoryEntry {
            id: entry.id,
            title_id: entry.title_id,
            name,
            slug,
            watched_at: entry.watched_at,
        }
    });
    Ok(Json(page))
}

async fn delete_history_entry(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let entry = watch_history::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("history entry"))?;

    if entry.user_id != current.id {
        return Err(AppError::Forbidden("only the owner can delete a history entry"));
    }

    watch_history::Entity::delete_by_id(id).exec(&state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}
