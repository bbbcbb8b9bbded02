use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use lotofacil_db::models::Candidate;

use crate::config::SelectionConfig;
use crate::symbols::SymbolSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// Glouton : score moins pénalités de ressemblance avec les grilles déjà retenues.
    #[default]
    Diversity,
    /// Tirage au hasard dans le meilleur quart du pool.
    TopQuartile,
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionPolicy::Diversity => write!(f, "diversity"),
            SelectionPolicy::TopQuartile => write!(f, "top-quartile"),
        }
    }
}

/// Pénalité pour `shared` numéros en commun : le palier le plus sévère atteint.
fn penalty(shared: usize, tiers: &[(usize, i32)]) -> i32 {
    tiers
        .iter()
        .filter(|(min_shared, _)| shared >= *min_shared)
        .map(|(_, p)| *p)
        .max()
        .unwrap_or(0)
}

/// Choisit `count` grilles dans un pool trié par score décroissant.
pub fn select<R: Rng + ?Sized>(
    pool: &[Candidate],
    count: usize,
    config: &SelectionConfig,
    rng: &mut R,
) -> Vec<Candidate> {
    if count == 0 || pool.is_empty() {
        return Vec::new();
    }
    if count > config.large_output_threshold {
        return pool.iter().take(count).cloned().collect();
    }
    match config.policy {
        SelectionPolicy::Diversity => select_diverse(pool, count, &config.penalty_tiers),
        SelectionPolicy::TopQuartile => select_top_quartile(pool, count, rng),
    }
}

pub fn select_diverse(pool: &[Candidate], count: usize, tiers: &[(usize, i32)]) -> Vec<Candidate> {
    // Doublons exacts ramenés à leur première occurrence (la mieux notée)
    let mut seen = HashSet::new();
    let mut remaining: Vec<(SymbolSet, &Candidate, i32)> = pool
        .iter()
        .filter_map(|c| {
            let set: SymbolSet = c.numbers.iter().copied().collect();
            seen.insert(set).then_some((set, c, 0))
        })
        .collect();

    let adjusted = |entry: &(SymbolSet, &Candidate, i32)| entry.1.score - entry.2;
    let mut selected = Vec::with_capacity(count.min(remaining.len()));
    while selected.len() < count && !remaining.is_empty() {
        let mut best = 0;
        for i in 1..remaining.len() {
            if adjusted(&remaining[i]) > adjusted(&remaining[best]) {
                best = i;
            }
        }
        let (chosen, candidate, _) = remaining.remove(best);
        for entry in remaining.iter_mut() {
            entry.2 += penalty(entry.0.intersection_count(&chosen), tiers);
        }
        selected.push(candidate.clone());
    }
    selected
}

pub fn select_top_quartile<R: Rng + ?Sized>(pool: &[Candidate], count: usize, rng: &mut R) -> Vec<Candidate> {
    let top = (pool.len() / 4).max(count).min(pool.len());
    let amount = count.min(top);
    let mut indices = rand::seq::index::sample(rng, top, amount).into_vec();
    // pool trié : l'ordre des index est l'ordre des scores
    indices.sort_unstable();
    indices.into_iter().map(|i| pool[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotofacil_db::models::{BalanceMetrics, RepairReport};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn candidate(numbers: Vec<u8>, score: i32) -> Candidate {
        Candidate {
            numbers,
            score,
            metrics: BalanceMetrics::default(),
            confidence: 0.0,
            repair: RepairReport::default(),
        }
    }

    fn run(start: u8) -> Vec<u8> {
        (start..start + 15).collect()
    }

    #[test]
    fn test_penalty_tiers() {
        let tiers = SelectionConfig::default().penalty_tiers;
        assert_eq!(penalty(15, &tiers), 50);
        assert_eq!(penalty(13, &tiers), 50);
        assert_eq!(penalty(12, &tiers), 20);
        assert_eq!(penalty(11, &tiers), 20);
        assert_eq!(penalty(10, &tiers), 10);
        assert_eq!(penalty(9, &tiers), 0);
    }

    #[test]
    fn test_identical_sets_lose_to_distinct() {
        // Deux grilles identiques à 10, une distincte à 8
        let pool = vec![
            candidate(run(1), 10),
            candidate(run(1), 10),
            candidate(run(11), 8),
        ];
        let selected = select(&pool, 2, &SelectionConfig::default(), &mut StdRng::seed_from_u64(0));
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].numbers, run(1));
        assert_eq!(selected[1].numbers, run(11));
    }

    #[test]
    fn test_near_duplicate_penalized() {
        // run(2) partage 14 numéros avec run(1) : 10 - 50 < 8
        let pool = vec![
            candidate(run(1), 10),
            candidate(run(2), 10),
            candidate(run(11), 8),
        ];
        let selected = select_diverse(&pool, 2, &SelectionConfig::default().penalty_tiers);
        assert_eq!(selected[1].numbers, run(11));

        // 10 communs (pénalité 10) : 12 - 10 = 2 ne bat pas 8 - 0
        let mut ten_shared: Vec<u8> = (1..=10).collect();
        ten_shared.extend(21..=25);
        let pool = vec![
            candidate(run(1), 12),
            candidate(ten_shared.clone(), 12),
            candidate(run(11), 8),
        ];
        let selected = select_diverse(&pool, 3, &SelectionConfig::default().penalty_tiers);
        assert_eq!(selected[1].numbers, run(11));
        assert_eq!(selected[2].numbers, ten_shared);
    }

    #[test]
    fn test_ties_keep_pool_order() {
        let pool = vec![
            candidate(run(1), 5),
            candidate(run(11), 5),
            candidate(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 21, 22, 23, 24, 25], 5),
        ];
        let selected = select_diverse(&pool, 1, &[]);
        assert_eq!(selected[0].numbers, run(1));
        let selected = select_diverse(&pool, 3, &[]);
        let order: Vec<Vec<u8>> = selected.into_iter().map(|c| c.numbers).collect();
        assert_eq!(order, vec![run(1), run(11), pool[2].numbers.clone()]);
    }

    #[test]
    fn test_fewer_unique_than_requested() {
        let pool = vec![candidate(run(1), 10), candidate(run(1), 9)];
        let selected = select_diverse(&pool, 5, &SelectionConfig::default().penalty_tiers);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_large_request_takes_top_verbatim() {
        let pool: Vec<Candidate> = (0..300).map(|i| candidate(run(1), 300 - i)).collect();
        let selected = select(&pool, 150, &SelectionConfig::default(), &mut StdRng::seed_from_u64(0));
        assert_eq!(selected.len(), 150);
        assert_eq!(selected[0].score, 300);
        assert_eq!(selected[149].score, 151);
    }

    #[test]
    fn test_top_quartile_within_best_quarter() {
        let pool: Vec<Candidate> = (0..400).map(|i| candidate(run(1 + (i % 11) as u8), 400 - i)).collect();
        let config = SelectionConfig { policy: SelectionPolicy::TopQuartile, ..SelectionConfig::default() };
        let selected = select(&pool, 10, &config, &mut StdRng::seed_from_u64(3));
        assert_eq!(selected.len(), 10);
        assert!(selected.iter().all(|c| c.score > 300), "hors du premier quart");
        assert!(selected.windows(2).all(|w| w[0].score > w[1].score));
    }

    #[test]
    fn test_top_quartile_small_pool() {
        let pool = vec![candidate(run(1), 3), candidate(run(2), 2), candidate(run(3), 1)];
        let selected = select_top_quartile(&pool, 2, &mut StdRng::seed_from_u64(5));
        assert_eq!(selected.len(), 2);
        assert!(selected[0].score > selected[1].score);
    }

    #[test]
    fn test_policy_display_matches_cli_value() {
        assert_eq!(SelectionPolicy::TopQuartile.to_string(), "top-quartile");
        let json = serde_json::to_string(&SelectionPolicy::TopQuartile).unwrap();
        assert_eq!(json, "\"top-quartile\"");
    }
}
