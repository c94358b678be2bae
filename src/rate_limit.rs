use std::{num::NonZeroU32, sync::Arc, time::Duration};

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
};

use crate::{AppState, auth::bearer_token, error::AppError};

/// Limiter key: one bucket per caller per route path.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct LimitKey {
    caller: String,
    path: String,
}

pub type ApiLimiter = RateLimiter<LimitKey, DefaultKeyedStateStore<LimitKey>, DefaultClock>;

pub fn new_limiter(per_minute: u32) -> ApiLimiter {
    let quota = Quota::per_minute(NonZeroU32::new(per_minute.max(1)).unwrap());
    RateLimiter::keyed(quota)
}

pub async fn limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = LimitKey {
        caller: caller_id(&state, request.headers()),
        path: request.uri().path().to_string(),
    };

    match state.limiter.check_key(&key) {
        Ok(()) => Ok(next.run(request).await),
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            tracing::debug!(caller = %key.caller, path = %key.path, "rate limited");
            Err(AppError::RateLimited { retry_after_secs: wait.as_secs().max(1) })
        }
    }
}

/// Authenticated callers are keyed by user id, everyone else by client address.
fn caller_id(state: &AppState, headers: &HeaderMap) -> String {
    let user_id = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .and_then(|token| state.jwt.verify(token).ok())
        .map(|claims| claims.sub);

    if let Some(id) = user_id {
        return format!("user:{id}");
    }

    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|addr| format!("addr:{}", addr.trim()))
        .unwrap_or_else(|| "anon".to_string())
}

/// The keyed store grows with distinct callers; sweep idle buckets so it
/// cannot grow without bound.
pub fn spawn_retention(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            state.limiter.retain_recent();
        }
    });
}
