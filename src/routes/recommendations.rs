use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    auth::CurrentUser,
    entities::{rating, title, title_company, title_genre, watch_history},
    error::{AppError, AppResult},
    recommend::{self, TitleFeatures},
};

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 50;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/titles/{id}/similar", get(similar_titles))
        .route("/recommendations", get(recommendations))
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

impl LimitQuery {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Debug, Serialize)]
struct Recommendation {
    title_id: i32,
    name: String,
    slug: String,
    release_year: Option<i32>,
    score: f64,
}

async fn similar_titles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<Recommendation>>> {
    super::titles::find_title(&state, id).await?;

    let catalog = load_catalog(&state).await?;
    let seed = catalog
        .features
        .iter()
        .find(|f| f.id == id)
        .cloned()
        .ok_or(AppError::NotFound("title"))?;

    let ranked = recommend::rank(&seed, &catalog.features, query.limit());
    Ok(Json(to_responses(ranked, &catalog.names)))
}

/// Seeds are the caller's own ratings of 7 or above; anything already rated
/// or watched is excluded from the results.
async fn recommendations(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let (own_ratings, watched) = futures::try_join!(
        rating::Entity::find()
            .filter(rating::Column::UserId.eq(current.id))
            .all(&state.db),
        watch_history::Entity::find()
            .filter(watch_history::Column::UserId.eq(current.id))
            .all(&state.db),
    )?;

    let seed_ids: HashSet<i32> =
        own_ratings.iter().filter(|r| r.score >= 7).map(|r| r.title_id).collect();

    let mut exclude: HashSet<i32> = own_ratings.iter().map(|r| r.title_id).collect();
    exclude.extend(watched.iter().map(|w| w.title_id));

    let catalog = load_catalog(&state).await?;
    let seeds: Vec<TitleFeatures> =
        catalog.features.iter().filter(|f| seed_ids.contains(&f.id)).cloned().collect();

    let ranked = recommend::rank_for_seeds(&seeds, &catalog.features, &exclude, query.limit());
    Ok(Json(to_responses(ranked, &catalog.names)))
}

struct Catalog {
    features: Vec<TitleFeatures>,
    names: HashMap<i32, (String, String, Option<i32>)>,
}

/// Bulk-loads every title's feature vector in four queries.
async fn load_catalog(state: &Arc<AppState>) -> AppResult<Catalog> {
    let (titles, genre_rows, company_rows, rating_rows) = futures::try_join!(
        title::Entity::find().all(&state.db),
        title_genre::Entity::find().all(&state.db),
        title_company::Entity::find().all(&state.db),
        rating::Entity::find().all(&state.db),
    )?;

    let mut genres: HashMap<i32, HashSet<i32>> = HashMap::new();
    for row in genre_rows {
        genres.entry(row.title_id).or_default().insert(row.genre_id);
    }

    let mut companies: HashMap<i32, HashSet<i32>> = HashMap::new();
    for row in company_rows {
        companies.entry(row.title_id).or_default().insert(row.company_id);
    }

    let mut score_sums: HashMap<i32, (i64, u32)> = HashMap::new();
    for row in rating_rows {
        let entry = score_sums.entry(row.title_id).or_insert((0, 0));
        entry.0 += i64::from(row.score);
        entry.1 += 1;
    }

    let mut features = Vec::with_capacity(titles.len());
    let mut names = HashMap::with_capacity(titles.len());
    for t in titles {
        let rating_avg =
            score_sums.get(&t.id).map(|(sum, count)| *sum as f64 / f64::from(*count));
        features.push(TitleFeatures {
            id: t.id,
            genres: genres.remove(&t.id).unwrap_or_default(),
            companies: companies.remove(&t.id).unwrap_or_default(),
            release_year: t.release_year,
            runtime_minutes: t.runtime_minutes,
            rating_avg,
        });
        names.insert(t.id, (t.name, t.slug, t.release_year));
    }

    Ok(Catalog { features, names })
}

fn to_responses(
    ranked: Vec<recommend::Scored>,
    names: &HashMap<i32, (String, String, Option<i32>)>,
) -> Vec<Recommendation> {
    ranked
        .into_iter()
        .filter_map(|s| {
            names.get(&s.title_id).map(|(name, slug, year)| Recommendation {
                title_id: s.title_id,
                name: name.clone(),
                slug: slug.clone(),
                release_year: *year,
                score: s.score,
            })
        })
        .collect()
}
