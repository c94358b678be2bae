use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AppState,
    auth::{self, new_refresh_token, refresh_digest},
    entities::{session, user},
    error::{AppError, AppResult},
    now_sec,
};

const REFRESH_COOKIE: &str = "cinelog_refresh";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
    pub created_at: i64,
}

impl From<user::Model> for AccountResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            username: m.username,
            display_name: m.display_name,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub refresh_token: String,
    pub user: AccountResponse,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AccountResponse>)> {
    let email = req.email.trim().to_lowercase();
    let username = req.username.trim().to_string();

    if !email.contains('@') {
        return Err(AppError::Validation("email is not valid".to_string()));
    }
    if username.len() < 3
        || username.len() > 32
        || !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "username must be 3-32 characters of letters, digits or underscores".to_string(),
        ));
    }
    if req.password.len() < 8 {
        return Err(AppError::Validation("password must be at least 8 characters".to_string()));
    }

    let now = now_sec();
    let created = user::ActiveModel {
        email: Set(email),
        username: Set(username),
        password_hash: Set(auth::hash_password(&req.password)?),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|err| match AppError::from(err) {
        AppError::Conflict(_) => {
            AppError::Conflict("email or username is already taken".to_string())
        }
        other => other,
    })?;

    tracing::info!(user_id = created.id, "registered user");
    Ok((StatusCode::CREATED, Json(created.into())))
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let email = req.email.trim().to_lowercase();

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .ok_or(AppError::Unauthorized("invalid credentials"))?;

    if !auth::verify_password(&req.password, &user.password_hash) {
        return Err(AppError::Unauthorized("invalid credentials"));
    }

    let family = Uuid::new_v4().to_string();
    issue_pair(&state, jar, user, family).await
}

/// Rotates the presented refresh token: the old session row is revoked and a
/// replacement is issued in the same family. Presenting an already-revoked
/// token burns the whole family.
async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let raw = presented_token(&jar, body.as_deref())
        .ok_or(AppError::Unauthorized("missing refresh token"))?;

    let session = session::Entity::find()
        .filter(session::Column::TokenSha256.eq(refresh_digest(&raw)))
        .one(&state.db)
        .await?
        .ok_or(AppError::Unauthorized("invalid refresh token"))?;

    let now = now_sec();

    if session.revoked_at.is_some() {
        tracing::warn!(user_id = session.user_id, family = %session.family, "refresh token reuse, revoking family");
        session::Entity::update_many()
            .col_expr(session::Column::RevokedAt, sea_orm::sea_query::Expr::value(now))
            .filter(session::Column::Family.eq(session.family.clone()))
            .filter(session::Column::RevokedAt.is_null())
            .exec(&state.db)
            .await?;
        return Err(AppError::Unauthorized("invalid refresh token"));
    }

    if session.expires_at <= now {
        return Err(AppError::Unauthorized("refresh token expired"));
    }

    let user = user::Entity::find_by_id(session.user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::Unauthorized("invalid refresh token"))?;

    let family = session.family.clone();
    let mut revoked: session::ActiveModel = session.into();
    revoked.revoked_at = Set(Some(now));
    revoked.update(&state.db).await?;

    issue_pair(&state, jar, user, family).await
}

async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> AppResult<(CookieJar, StatusCode)> {
    let raw = presented_token(&jar, body.as_deref())
        .ok_or(AppError::Unauthorized("missing refresh token"))?;

    let session = session::Entity::find()
        .filter(session::Column::TokenSha256.eq(refresh_digest(&raw)))
        .one(&state.db)
        .await?;

    if let Some(session) = session {
        if session.revoked_at.is_none() {
            let mut active: session::ActiveModel = session.into();
            active.revoked_at = Set(Some(now_sec()));
            active.update(&state.db).await?;
        }
    }

    let jar = jar.remove(Cookie::build(REFRESH_COOKIE).path("/api/v1/auth"));
    Ok((jar, StatusCode::NO_CONTENT))
}

fn presented_token(jar: &CookieJar, body: Option<&RefreshRequest>) -> Option<String> {
    body.and_then(|b| b.refresh_token.clone())
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
}

async fn issue_pair(
    state: &Arc<AppState>,
    jar: CookieJar,
    user: user::Model,
    family: String,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let now = now_sec();
    let refresh = new_refresh_token();
    let refresh_ttl = state.config.refresh_ttl_days * 86_400;

    session::ActiveModel {
        user_id: Set(user.id),
        family: Set(family),
        token_sha256: Set(refresh.sha256.clone()),
        expires_at: Set(now + refresh_ttl),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    let access_token = state.jwt.issue(user.id, &user.username)?;

    let cookie = Cookie::build((REFRESH_COOKIE, refresh.raw.clone()))
        .path("/api/v1/auth")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(state.config.refresh_ttl_days))
        .build();

    let body = TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.config.access_ttl_minutes * 60,
        refresh_token: refresh.raw,
        user: user.into(),
    };

    Ok((jar.add(cookie), Json(body)))
}
