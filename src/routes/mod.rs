pub mod auth;
pub mod awards;
pub mod certifications;
pub mod companies;
pub mod friends;
pub mod genres;
pub mod lists;
pub mod people;
pub mod ratings;
pub mod recommendations;
pub mod reviews;
pub mod titles;
pub mod users;
pub mod watchlist;

use std::sync::Arc;

use axum::{Json, Router};
use serde_json::{Value, json};

use crate::AppState;

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(friends::router())
        .merge(titles::router())
        .merge(people::router())
        .merge(genres::router())
        .merge(certifications::router())
        .merge(companies::router())
        .merge(awards::router())
        .merge(reviews::router())
        .merge(ratings::router())
        .merge(lists::router())
        .merge(watchlist::router())
        .merge(recommendations::router())
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Lowercased alphanumeric runs joined by hyphens.
pub(crate) fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("The Matrix"), "the-matrix");
        assert_eq!(slugify("  Spirited   Away!! "), "spirited-away");
        assert_eq!(slugify("Se7en"), "se7en");
        assert_eq!(slugify("---"), "");
    }
}
