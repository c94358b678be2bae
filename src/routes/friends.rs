use std::{collections::HashMap, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    auth::CurrentUser,
    entities::{
        friend_request::{self, RequestStatus},
        user,
    },
    error::{AppError, AppResult},
    now_sec,
    pagination::{Page, PageParams, paginate},
    routes::users::UserPublic,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/friends", get(list_friends))
        .route("/friends/{user_id}", delete(unfriend))
        .route("/friends/requests", post(send_request).get(list_requests))
        .route("/friends/requests/{id}/accept", post(accept_request))
        .route("/friends/requests/{id}/decline", post(decline_request))
}

#[derive(Debug, Serialize)]
struct FriendRequestResponse {
    id: i32,
    requester_id: i32,
    recipient_id: i32,
    status: RequestStatus,
    created_at: i64,
    responded_at: Option<i64>,
}

impl From<friend_request::Model> for FriendRequestResponse {
    fn from(m: friend_request::Model) -> Self {
        Self {
            id: m.id,
            requester_id: m.requester_id,
            recipient_id: m.recipient_id,
            status: m.status,
            created_at: m.created_at,
            responded_at: m.responded_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendRequest {
    recipient_id: i32,
}

async fn send_request(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<SendRequest>,
) -> AppResult<(StatusCode, Json<FriendRequestResponse>)> {
    if req.recipient_id == current.id {
        return Err(AppError::Validation("cannot friend yourself".to_string()));
    }

    user::Entity::find_by_id(req.recipient_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    let existing = friend_request::Entity::find()
        .filter(pair_condition(current.id, req.recipient_id))
        .one(&state.db)
        .await?;

    let now = now_sec();

    if let Some(existing) = existing {
        match existing.status {
            RequestStatus::Pending => {
                return Err(AppError::Conflict("a pending request already exists".to_string()));
            }
            RequestStatus::Accepted => {
                return Err(AppError::Conflict("already friends".to_string()));
            }
            // A declined request can be retried; reuse the row when the
            // direction matches, otherwise replace it.
            RequestStatus::Declined if existing.requester_id == current.id => {
                let mut active: friend_request::ActiveModel = existing.into();
                active.status = Set(RequestStatus::Pending);
                active.created_at = Set(now);
                active.responded_at = Set(None);
                let updated = active.update(&state.db).await?;
                return Ok((StatusCode::CREATED, Json(updated.into())));
            }
            RequestStatus::Declined => {
                friend_request::Entity::delete_by_id(existing.id).exec(&state.db).await?;
            }
        }
    }

    let created = friend_request::ActiveModel {
        requester_id: Set(current.id),
        recipient_id: Set(req.recipient_id),
        status: Set(RequestStatus::Pending),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Direction {
    Incoming,
    Outgoing,
}

#[derive(Debug, Deserialize)]
struct RequestListQuery {
    direction: Option<Direction>,
}

async fn list_requests(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(query): Query<RequestListQuery>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<FriendRequestResponse>>> {
    let select = match query.direction.unwrap_or(Direction::Incoming) {
        Direction::Incoming => friend_request::Entity::find()
            .filter(friend_request::Column::RecipientId.eq(current.id)),
        Direction::Outgoing => friend_request::Entity::find()
            .filter(friend_request::Column::RequesterId.eq(current.id)),
    }
    .filter(friend_request::Column::Status.eq(RequestStatus::Pending))
    .order_by_desc(friend_request::Column::CreatedAt);

    let page = paginate(&state.db, select, &params).await?;
    Ok(Json(page.map(FriendRequestResponse::from)))
}

async fn accept_request(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<FriendRequestResponse>> {
    respond(&state, current, id, RequestStatus::Accepted).await
}

async fn decline_request(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<FriendRequestResponse>> {
    respond(&state, current, id, RequestStatus::Declined).await
}

async fn respond(
    state: &Arc<AppState>,
    current: CurrentUser,
    id: i32,
    status: RequestStatus,
) -> AppResult<Json<FriendRequestResponse>> {
    let request = friend_request::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("friend request"))?;

    if request.recipient_id != current.id {
        return Err(AppError::Forbidden("only the recipient can respond"));
    }
    if request.status != RequestStatus::Pending {
        return Err(AppError::Conflict("request was already handled".to_string()));
    }

    let mut active: friend_request::ActiveModel = request.into();
    active.status = Set(status);
    active.responded_at = Set(Some(now_sec()));
    let updated = active.update(&state.db).await?;

    Ok(Json(updated.into()))
}

async fn list_friends(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<UserPublic>>> {
    let select = friend_request::Entity::find()
        .filter(
            Condition::any()
                .add(friend_request::Column::RequesterId.eq(current.id))
                .add(friend_request::Column::RecipientId.eq(current.id)),
        )
        .filter(friend_request::Column::Status.eq(RequestStatus::Accepted))
        .order_by_desc(friend_request::Column::RespondedAt);

    let page = paginate(&state.db, select, &params).await?;

    let friend_ids: Vec<i32> = page
        .items
        .iter()
        .map(|r| if r.requester_id == current.id { r.recipient_id } else { r.requester_id })
        .collect();

    let users: HashMap<i32, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(friend_ids.clone()))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let items: Vec<UserPublic> =
        friend_ids.into_iter().filter_map(|id| users.get(&id).cloned().map(UserPublic::from)).collect();

    Ok(Json(Page {
        items,
        page: page.page,
        per_page: page.per_page,
        total_items: page.total_items,
        total_pages: page.total_pages,
    }))
}

async fn unfriend(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(user_id): Path<i32>,
) -> AppResult<StatusCode> {
    let result = friend_request::Entity::delete_many()
        .filter(pair_condition(current.id, user_id))
        .filter(friend_request::Column::Status.eq(RequestStatus::Accepted))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("friendship"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Matches the request row between two users regardless of direction.
fn pair_condition(a: i32, b: i32) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(friend_request::Column::RequesterId.eq(a))
                .add(friend_request::Column::RecipientId.eq(b)),
        )
        .add(
            Condition::all()
                .add(friend_request::Column::RequesterId.eq(b))
                .add(friend_request::Column::RecipientId.eq(a)),
        )
}
