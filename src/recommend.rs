use std::collections::HashSet;

/// Feature vector for the content-similarity scorer. Built once per request
/// from bulk queries, so scoring itself never touches the database.
#[derive(Clone, Debug, Default)]
pub struct TitleFeatures {
    pub id: i32,
    pub genres: HashSet<i32>,
    pub companies: HashSet<i32>,
    pub release_year: Option<i32>,
    pub runtime_minutes: Option<i32>,
    pub rating_avg: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scored {
    pub title_id: i32,
    pub score: f64,
}

/// Weighted sum of bounded contributions:
/// genre Jaccard overlap x 40, release-year proximity (20 max, -2/year),
/// average-rating delta (20 max, -4/point), runtime delta (10 max, -2.5 per
/// 15 minutes), flat 10 for a shared production company.
pub fn similarity(a: &TitleFeatures, b: &TitleFeatures) -> f64 {
    let mut score = 0.0;

    let union = a.genres.union(&b.genres).count();
    if union > 0 {
        let overlap = a.genres.intersection(&b.genres).count();
        score += overlap as f64 / union as f64 * 40.0;
    }

    if let (Some(ya), Some(yb)) = (a.release_year, b.release_year) {
        score += (20.0 - 2.0 * f64::from((ya - yb).abs())).max(0.0);
    }

    if let (Some(ra), Some(rb)) = (a.rating_avg, b.rating_avg) {
        score += (20.0 - 4.0 * (ra - rb).abs()).max(0.0);
    }

    if let (Some(ma), Some(mb)) = (a.runtime_minutes, b.runtime_minutes) {
        score += (10.0 - 2.5 * f64::from((ma - mb).abs()) / 15.0).max(0.0);
    }

    if a.companies.intersection(&b.companies).next().is_some() {
        score += 10.0;
    }

    score
}

/// Top-`limit` candidates by similarity to `seed`, descending. Zero-score
/// candidates and the seed itself are dropped; ties break on ascending id.
pub fn rank(seed: &TitleFeatures, candidates: &[TitleFeatures], limit: usize) -> Vec<Scored> {
    let mut scored: Vec<Scored> = candidates
        .iter()
        .filter(|c| c.id != seed.id)
        .map(|c| Scored { title_id: c.id, score: similarity(seed, c) })
        .filter(|s| s.score > 0.0)
        .collect();

    sort_and_truncate(&mut scored, limit);
    scored
}

/// Per-user ranking: candidate scores are summed across all seed titles.
pub fn rank_for_seeds(
    seeds: &[TitleFeatures],
    candidates: &[TitleFeatures],
    exclude: &HashSet<i32>,
    limit: usize,
) -> Vec<Scored> {
    let seed_ids: HashSet<i32> = seeds.iter().map(|s| s.id).collect();

    let mut scored: Vec<Scored> = candidates
        .iter()
        .filter(|c| !seed_ids.contains(&c.id) && !exclude.contains(&c.id))
        .map(|c| Scored {
            title_id: c.id,
            score: seeds.iter().map(|s| similarity(s, c)).sum(),
        })
        .filter(|s| s.score > 0.0)
        .collect();

    sort_and_truncate(&mut scored, limit);
    scored
}

fn sort_and_truncate(scored: &mut Vec<Scored>, limit: usize) {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.title_id.cmp(&b.title_id))
    });
    scored.truncate(limit);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(id: i32) -> TitleFeatures {
        TitleFeatures { id, ..Default::default() }
    }

    #[test]
    fn identical_feature_sets_hit_the_cap() {
        let a = TitleFeatures {
            id: 1,
            genres: HashSet::from([1, 2]),
            companies: HashSet::from([5]),
            release_year: Some(2010),
            runtime_minutes: Some(120),
            rating_avg: Some(8.0),
        };
        let mut b = a.clone();
        b.id = 2;
        // 40 + 20 + 20 + 10 + 10
        assert_eq!(similarity(&a, &b), 100.0);
    }

    #[test]
    fn genre_overlap_is_jaccard_scaled() {
        let a = TitleFeatures { id: 1, genres: HashSet::from([1, 2, 3]), ..Default::default() };
        let b = TitleFeatures { id: 2, genres: HashSet::from([2, 3, 4]), ..Default::default() };
        // overlap 2, union 4
        assert!((similarity(&a, &b) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn year_bonus_decays_two_points_per_year() {
        let a = TitleFeatures { id: 1, release_year: Some(2000), ..Default::default() };
        let b = TitleFeatures { id: 2, release_year: Some(2007), ..Default::default() };
        assert!((similarity(&a, &b) - 6.0).abs() < 1e-9);

        let c = TitleFeatures { id: 3, release_year: Some(2030), ..Default::default() };
        assert_eq!(similarity(&a, &c), 0.0);
    }

    #[test]
    fn rating_bonus_decays_four_points_per_point() {
        let a = TitleFeatures { id: 1, rating_avg: Some(8.0), ..Default::default() };
        let b = TitleFeatures { id: 2, rating_avg: Some(5.5), ..Default::default() };
        assert!((similarity(&a, &b) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn runtime_bonus_zeroes_at_an_hour() {
        let a = TitleFeatures { id: 1, runtime_minutes: Some(90), ..Default::default() };
        let b = TitleFeatures { id: 2, runtime_minutes: Some(120), ..Default::default() };
        assert!((similarity(&a, &b) - 5.0).abs() < 1e-9);

        let c = TitleFeatures { id: 3, runtime_minutes: Some(150), ..Default::default() };
        assert_eq!(similarity(&a, &c), 0.0);
    }

    #[test]
    fn missing_fields_contribute_nothing() {
        let a = features(1);
        let b = features(2);
        assert_eq!(similarity(&a, &b), 0.0);
    }

    #[test]
    fn rank_drops_seed_and_zero_scores() {
        let seed = TitleFeatures { id: 1, genres: HashSet::from([1]), ..Default::default() };
        let candidates = vec![
            seed.clone(),
            TitleFeatures { id: 2, genres: HashSet::from([1]), ..Default::default() },
            features(3),
        ];
        let ranked = rank(&seed, &candidates, 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].title_id, 2);
    }

    #[test]
    fn rank_orders_descending_with_id_tiebreak() {
        let seed = TitleFeatures {
            id: 1,
            genres: HashSet::from([1, 2]),
            release_year: Some(2000),
            ..Default::default()
        };
        let close = TitleFeatures {
            id: 9,
            genres: HashSet::from([1, 2]),
            release_year: Some(2001),
            ..Default::default()
        };
        let tie_a = TitleFeatures { id: 5, genres: HashSet::from([1, 2]), ..Default::default() };
        let tie_b = TitleFeatures { id: 3, genres: HashSet::from([1, 2]), ..Default::default() };

        let ranked = rank(&seed, &[tie_a, close, tie_b], 10);
        assert_eq!(ranked.iter().map(|s| s.title_id).collect::<Vec<_>>(), vec![9, 3, 5]);
    }

    #[test]
    fn seed_sum_prefers_candidates_near_multiple_seeds() {
        let seed_a = TitleFeatures { id: 1, genres: HashSet::from([1]), ..Default::default() };
        let seed_b = TitleFeatures { id: 2, genres: HashSet::from([2]), ..Default::default() };
        let both = TitleFeatures { id: 10, genres: HashSet::from([1, 2]), ..Default::default() };
        let one = TitleFeatures { id: 11, genres: HashSet::from([1]), ..Default::default() };

        let ranked = rank_for_seeds(
            &[seed_a, seed_b],
            &[one.clone(), both.clone()],
            &HashSet::new(),
            10,
        );
        assert_eq!(ranked[0].title_id, 10);
        assert_eq!(ranked[1].title_id, 11);
    }

    #[test]
    fn excluded_titles_never_surface() {
        let seed = TitleFeatures { id: 1, genres: HashSet::from([1]), ..Default::default() };
        let candidate = TitleFeatures { id: 2, genres: HashSet::from([1]), ..Default::default() };
        let ranked = rank_for_seeds(&[seed], &[candidate], &HashSet::from([2]), 10);
        assert!(ranked.is_empty());
    }
}
