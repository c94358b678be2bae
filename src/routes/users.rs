use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    auth::CurrentUser,
    entities::user,
    error::{AppError, AppResult},
    now_sec,
    pagination::{Page, PageParams, paginate},
    routes::auth::AccountResponse,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(me).put(update_me))
        .route("/users/{id}", get(get_user))
}

/// What other users get to see.
#[derive(Debug, Serialize)]
pub struct UserPublic {
    pub id: i32,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: i64,
}

impl From<user::Model> for UserPublic {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            display_name: m.display_name,
            bio: m.bio,
            avatar_url: m.avatar_url,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserListQuery {
    q: Option<String>,
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(query): Query<UserListQuery>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<UserPublic>>> {
    let mut select = user::Entity::find().order_by_asc(user::Column::Username);
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        select = select.filter(user::Column::Username.contains(q));
    }

    let page = paginate(&state.db, select, &params).await?;
    Ok(Json(page.map(UserPublic::from)))
}

async fn me(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> AppResult<Json<AccountResponse>> {
    let user = user::Entity::find_by_id(current.id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    display_name: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<AccountResponse>> {
    let user = user::Entity::find_by_id(current.id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    let mut active: user::ActiveModel = user.into();
    if let Some(display_name) = req.display_name {
        active.display_name = Set(non_empty(display_name));
    }
    if let Some(bio) = req.bio {
        active.bio = Set(non_empty(bio));
    }
    if let Some(avatar_url) = req.avatar_url {
        active.avatar_url = Set(non_empty(avatar_url));
    }
    active.updated_at = Set(now_sec());

    let updated = active.update(&state.db).await?;
    Ok(Json(updated.into()))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<UserPublic>> {
    let user = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(Json(user.into()))
}

/// Empty strings clear the field.
fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
