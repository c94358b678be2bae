use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};

use cinelog::{AppState, app, config::Config, db};

async fn test_server_with_limit(rate_limit_per_minute: u32) -> TestServer {
    let config = Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        access_ttl_minutes: 15,
        refresh_ttl_days: 30,
        rate_limit_per_minute,
    };
    let conn = db::connect_and_migrate(&config.database_url).await.unwrap();
    let state = Arc::new(AppState::new(config, conn));
    TestServer::new(app(state)).unwrap()
}

async fn test_server() -> TestServer {
    test_server_with_limit(10_000).await
}

async fn register_and_login(server: &TestServer, email: &str, username: &str) -> (String, i64) {
    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({ "email": email, "username": username, "password": "hunter2hunter2" }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": email, "password": "hunter2hunter2" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    (
        body["access_token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_i64().unwrap(),
    )
}

async fn create_genre(server: &TestServer, token: &str, name: &str) -> i64 {
    let response = server
        .post("/api/v1/genres")
        .authorization_bearer(token)
        .json(&json!({ "name": name }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["id"].as_i64().unwrap()
}

async fn create_title(server: &TestServer, token: &str, body: Value) -> Value {
    let response = server.post("/api/v1/titles").authorization_bearer(token).json(&body).await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn health_check() {
    let server = test_server().await;
    server.get("/health").await.assert_status_ok();
}

#[tokio::test]
async fn register_login_and_me() {
    let server = test_server().await;
    let (token, user_id) = register_and_login(&server, "ada@example.com", "ada").await;

    let response = server.get("/api/v1/users/me").authorization_bearer(&token).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["id"].as_i64().unwrap(), user_id);
    assert_eq!(body["username"], "ada");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let server = test_server().await;
    register_and_login(&server, "ada@example.com", "ada").await;

    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "ada@example.com", "username": "ada2", "password": "hunter2hunter2" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_rejects_weak_input() {
    let server = test_server().await;

    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "bob@example.com", "username": "bob", "password": "short" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "not-an-email", "username": "bob", "password": "hunter2hunter2" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let server = test_server().await;
    server.get("/api/v1/users/me").await.assert_status(StatusCode::UNAUTHORIZED);
    server
        .get("/api/v1/users/me")
        .authorization_bearer("not-a-jwt")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_rotation_burns_reused_tokens() {
    let server = test_server().await;
    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "eve@example.com", "username": "eve", "password": "hunter2hunter2" }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let login: Value = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "eve@example.com", "password": "hunter2hunter2" }))
        .await
        .json();
    let first_refresh = login["refresh_token"].as_str().unwrap().to_string();

    // Rotation hands out a new refresh token.
    let response = server
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refresh_token": first_refresh }))
        .await;
    response.assert_status_ok();
    let rotated: Value = response.json();
    let second_refresh = rotated["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(first_refresh, second_refresh);

    // Replaying the old token revokes the whole family.
    server
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refresh_token": first_refresh }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refresh_token": second_refresh }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn title_crud_builds_slugs_and_rejects_duplicates() {
    let server = test_server().await;
    let (token, _) = register_and_login(&server, "ada@example.com", "ada").await;
    let scifi = create_genre(&server, &token, "Science Fiction").await;

    let created = create_title(
        &server,
        &token,
        json!({
            "name": "The Matrix",
            "kind": "movie",
            "release_year": 1999,
            "runtime_minutes": 136,
            "genre_ids": [scifi]
        }),
    )
    .await;
    assert_eq!(created["slug"], "the-matrix-1999");
    assert_eq!(created["genres"][0]["name"], "Science Fiction");
    assert_eq!(created["ratings_count"], 0);

    let id = created["id"].as_i64().unwrap();
    let response = server.get(&format!("/api/v1/titles/{id}")).await;
    response.assert_status_ok();

    // Same name and year produces the same slug.
    let response = server
        .post("/api/v1/titles")
        .authorization_bearer(&token)
        .json(&json!({ "name": "The Matrix", "kind": "movie", "release_year": 1999 }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = server
        .put(&format!("/api/v1/titles/{id}"))
        .authorization_bearer(&token)
        .json(&json!({ "name": "The Matrix Reloaded", "release_year": 2003 }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["slug"], "the-matrix-reloaded-2003");

    server
        .delete(&format!("/api/v1/titles/{id}"))
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server.get(&format!("/api/v1/titles/{id}")).await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rating_is_an_upsert_with_range_validation() {
    let server = test_server().await;
    let (token, _) = register_and_login(&server, "ada@example.com", "ada").await;
    let title = create_title(&server, &token, json!({ "name": "Heat", "kind": "movie" })).await;
    let id = title["id"].as_i64().unwrap();

    let response = server
        .put(&format!("/api/v1/titles/{id}/rating"))
        .authorization_bearer(&token)
        .json(&json!({ "score": 8 }))
        .await;
    response.assert_status_ok();

    let response = server
        .put(&format!("/api/v1/titles/{id}/rating"))
        .authorization_bearer(&token)
        .json(&json!({ "score": 9 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["score"], 9);

    // Still a single rating row.
    let detail: Value = server.get(&format!("/api/v1/titles/{id}")).await.json();
    assert_eq!(detail["ratings_count"], 1);
    assert_eq!(detail["ratings_avg"], 9.0);

    let response = server
        .put(&format!("/api/v1/titles/{id}/rating"))
        .authorization_bearer(&token)
        .json(&json!({ "score": 11 }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn reviews_are_unique_per_user_and_owner_edited() {
    let server = test_server().await;
    let (ada, _) = register_and_login(&server, "ada@example.com", "ada").await;
    let (bob, _) = register_and_login(&server, "bob@example.com", "bob").await;
    let title = create_title(&server, &ada, json!({ "name": "Alien", "kind": "movie" })).await;
    let id = title["id"].as_i64().unwrap();

    let response = server
        .post(&format!("/api/v1/titles/{id}/reviews"))
        .authorization_bearer(&ada)
        .json(&json!({ "headline": "Scary", "body": "In space no one can hear you scream." }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let review: Value = response.json();
    let review_id = review["id"].as_i64().unwrap();
    assert_eq!(review["author"]["username"], "ada");

    // One review per user per title.
    server
        .post(&format!("/api/v1/titles/{id}/reviews"))
        .authorization_bearer(&ada)
        .json(&json!({ "body": "Second thoughts." }))
        .await
        .assert_status(StatusCode::CONFLICT);

    // Only the author can edit or delete.
    server
        .put(&format!("/api/v1/reviews/{review_id}"))
        .authorization_bearer(&bob)
        .json(&json!({ "body": "Hijacked." }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = server
        .post(&format!("/api/v1/reviews/{review_id}/comments"))
        .authorization_bearer(&bob)
        .json(&json!({ "body": "Agreed." }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let comment: Value = response.json();
    let comment_id = comment["id"].as_i64().unwrap();

    server
        .delete(&format!("/api/v1/comments/{comment_id}"))
        .authorization_bearer(&ada)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    server
        .delete(&format!("/api/v1/comments/{comment_id}"))
        .authorization_bearer(&bob)
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn private_lists_are_invisible_to_others() {
    let server = test_server().await;
    let (ada, _) = register_and_login(&server, "ada@example.com", "ada").await;
    let (bob, _) = register_and_login(&server, "bob@example.com", "bob").await;

    let response = server
        .post("/api/v1/lists")
        .authorization_bearer(&ada)
        .json(&json!({ "name": "Guilty pleasures", "is_public": false }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let list: Value = response.json();
    let id = list["id"].as_i64().unwrap();

    server
        .get(&format!("/api/v1/lists/{id}"))
        .authorization_bearer(&ada)
        .await
        .assert_status_ok();
    server
        .get(&format!("/api/v1/lists/{id}"))
        .authorization_bearer(&bob)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_items_append_and_reorder() {
    let server = test_server().await;
    let (token, _) = register_and_login(&server, "ada@example.com", "ada").await;

    let a = create_title(&server, &token, json!({ "name": "Seven", "kind": "movie" })).await;
    let b = create_title(&server, &token, json!({ "name": "Zodiac", "kind": "movie" })).await;
    let a_id = a["id"].as_i64().unwrap();
    let b_id = b["id"].as_i64().unwrap();

    let list: Value = server
        .post("/api/v1/lists")
        .authorization_bearer(&token)
        .json(&json!({ "name": "Fincher" }))
        .await
        .json();
    let id = list["id"].as_i64().unwrap();

    for title_id in [a_id, b_id] {
        let response = server
            .post(&format!("/api/v1/lists/{id}/items"))
            .authorization_bearer(&token)
            .json(&json!({ "title_id": title_id }))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    // Duplicate membership is a conflict.
    server
        .post(&format!("/api/v1/lists/{id}/items"))
        .authorization_bearer(&token)
        .json(&json!({ "title_id": a_id }))
        .await
        .assert_status(StatusCode::CONFLICT);

    // Reordering must cover exactly the current members.
    server
        .put(&format!("/api/v1/lists/{id}/items"))
        .authorization_bearer(&token)
        .json(&json!({ "title_ids": [b_id] }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .put(&format!("/api/v1/lists/{id}/items"))
        .authorization_bearer(&token)
        .json(&json!({ "title_ids": [b_id, a_id] }))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let detail: Value = server
        .get(&format!("/api/v1/lists/{id}"))
        .authorization_bearer(&token)
        .await
        .json();
    let items = detail["items"].as_array().unwrap();
    assert_eq!(items[0]["title_id"].as_i64().unwrap(), b_id);
    assert_eq!(items[1]["title_id"].as_i64().unwrap(), a_id);
}

#[tokio::test]
async fn watchlist_is_idempotent_and_cleared_by_history() {
    let server = test_server().await;
    let (token, _) = register_and_login(&server, "ada@example.com", "ada").await;
    let title = create_title(&server, &token, json!({ "name": "Dune", "kind": "movie" })).await;
    let id = title["id"].as_i64().unwrap();

    for _ in 0..2 {
        server
            .put(&format!("/api/v1/watchlist/{id}"))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    let page: Value = server.get("/api/v1/watchlist").authorization_bearer(&token).await.json();
    assert_eq!(page["total_items"], 1);

    // Logging a watch removes the watchlist entry.
    let response = server
        .post("/api/v1/history")
        .authorization_bearer(&token)
        .json(&json!({ "title_id": id }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let page: Value = server.get("/api/v1/watchlist").authorization_bearer(&token).await.json();
    assert_eq!(page["total_items"], 0);

    let history: Value = server.get("/api/v1/history").authorization_bearer(&token).await.json();
    assert_eq!(history["total_items"], 1);
    assert_eq!(history["items"][0]["title_id"].as_i64().unwrap(), id);
}

#[tokio::test]
async fn friendship_lifecycle() {
    let server = test_server().await;
    let (ada, ada_id) = register_and_login(&server, "ada@example.com", "ada").await;
    let (bob, bob_id) = register_and_login(&server, "bob@example.com", "bob").await;

    let response = server
        .post("/api/v1/friends/requests")
        .authorization_bearer(&ada)
        .json(&json!({ "recipient_id": bob_id }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let request: Value = response.json();
    let request_id = request["id"].as_i64().unwrap();

    // Duplicate request, either direction, conflicts.
    server
        .post("/api/v1/friends/requests")
        .authorization_bearer(&bob)
        .json(&json!({ "recipient_id": ada_id }))
        .await
        .assert_status(StatusCode::CONFLICT);

    // Only the recipient can accept.
    server
        .post(&format!("/api/v1/friends/requests/{request_id}/accept"))
        .authorization_bearer(&ada)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    server
        .post(&format!("/api/v1/friends/requests/{request_id}/accept"))
        .authorization_bearer(&bob)
        .await
        .assert_status_ok();

    let friends: Value = server.get("/api/v1/friends").authorization_bearer(&ada).await.json();
    assert_eq!(friends["items"][0]["username"], "bob");

    server
        .delete(&format!("/api/v1/friends/{bob_id}"))
        .authorization_bearer(&ada)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .delete(&format!("/api/v1/friends/{bob_id}"))
        .authorization_bearer(&ada)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn self_friend_request_is_rejected() {
    let server = test_server().await;
    let (ada, ada_id) = register_and_login(&server, "ada@example.com", "ada").await;

    server
        .post("/api/v1/friends/requests")
        .authorization_bearer(&ada)
        .json(&json!({ "recipient_id": ada_id }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn similar_titles_prefer_shared_genres_and_close_years() {
    let server = test_server().await;
    let (token, _) = register_and_login(&server, "ada@example.com", "ada").await;
    let scifi = create_genre(&server, &token, "Science Fiction").await;
    let drama = create_genre(&server, &token, "Drama").await;

    let seed = create_title(
        &server,
        &token,
        json!({ "name": "Arrival", "kind": "movie", "release_year": 2016, "genre_ids": [scifi] }),
    )
    .await;
    let close = create_title(
        &server,
        &token,
        json!({ "name": "Interstellar", "kind": "movie", "release_year": 2014, "genre_ids": [scifi] }),
    )
    .await;
    let far = create_title(
        &server,
        &token,
        json!({ "name": "Solaris", "kind": "movie", "release_year": 1972, "genre_ids": [scifi] }),
    )
    .await;
    let unrelated = create_title(
        &server,
        &token,
        json!({ "name": "Marriage Story", "kind": "movie", "release_year": 2019, "genre_ids": [drama] }),
    )
    .await;

    let seed_id = seed["id"].as_i64().unwrap();
    let response = server.get(&format!("/api/v1/titles/{seed_id}/similar")).await;
    response.assert_status_ok();
    let results: Vec<Value> = response.json();

    let ids: Vec<i64> = results.iter().map(|r| r["title_id"].as_i64().unwrap()).collect();
    assert_eq!(ids[0], close["id"].as_i64().unwrap());
    assert!(ids.contains(&far["id"].as_i64().unwrap()));
    assert!(!ids.contains(&unrelated["id"].as_i64().unwrap()));
    assert!(!ids.contains(&seed_id));
}

#[tokio::test]
async fn recommendations_seed_from_high_ratings() {
    let server = test_server().await;
    let (token, _) = register_and_login(&server, "ada@example.com", "ada").await;
    let scifi = create_genre(&server, &token, "Science Fiction").await;

    let loved = create_title(
        &server,
        &token,
        json!({ "name": "Blade Runner", "kind": "movie", "release_year": 1982, "genre_ids": [scifi] }),
    )
    .await;
    let candidate = create_title(
        &server,
        &token,
        json!({ "name": "Blade Runner 2049", "kind": "movie", "release_year": 2017, "genre_ids": [scifi] }),
    )
    .await;
    let loved_id = loved["id"].as_i64().unwrap();

    server
        .put(&format!("/api/v1/titles/{loved_id}/rating"))
        .authorization_bearer(&token)
        .json(&json!({ "score": 9 }))
        .await
        .assert_status_ok();

    let response = server.get("/api/v1/recommendations").authorization_bearer(&token).await;
    response.assert_status_ok();
    let results: Vec<Value> = response.json();
    let ids: Vec<i64> = results.iter().map(|r| r["title_id"].as_i64().unwrap()).collect();

    // The rated seed never comes back; the same-genre candidate does.
    assert!(ids.contains(&candidate["id"].as_i64().unwrap()));
    assert!(!ids.contains(&loved_id));
}

#[tokio::test]
async fn bursts_past_the_quota_get_a_429() {
    let server = test_server_with_limit(2).await;

    server.get("/api/v1/titles").await.assert_status_ok();
    server.get("/api/v1/titles").await.assert_status_ok();

    let response = server.get("/api/v1/titles").await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
}

#[tokio::test]
async fn pagination_clamps_and_reports_totals() {
    let server = test_server().await;
    let (token, _) = register_and_login(&server, "ada@example.com", "ada").await;

    for i in 0..3 {
        create_title(&server, &token, json!({ "name": format!("Movie {i}"), "kind": "movie" }))
            .await;
    }

    let page: Value = server
        .get("/api/v1/titles")
        .add_query_param("page", 2)
        .add_query_param("per_page", 2)
        .await
        .json();
    assert_eq!(page["page"], 2);
    assert_eq!(page["per_page"], 2);
    assert_eq!(page["total_items"], 3);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);

    // per_page is clamped to 100.
    let page: Value = server.get("/api/v1/titles").add_query_param("per_page", 1000).await.json();
    assert_eq!(page["per_page"], 100);
}
