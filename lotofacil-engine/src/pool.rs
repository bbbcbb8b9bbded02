use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use lotofacil_db::models::{Candidate, Draw};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::guard::UniquenessGuard;
use crate::repair::RepairLoop;
use crate::rubric::BalanceRubric;
use crate::sampler::{CandidateSampler, SamplerArgs};
use crate::symbols::SymbolSet;

/// Taille du pool pour `requested_count` grilles demandées.
pub fn pool_size(requested_count: usize, config: &EngineConfig) -> usize {
    requested_count
        .saturating_mul(config.pool.oversample)
        .max(config.pool.min_pool_size)
}

/// Indice de confiance affiché : somme des probabilités d'origine des numéros
/// retenus, ramenée sur 100.
fn confidence(sampler: &CandidateSampler, candidate: &SymbolSet) -> f64 {
    let mass: f64 = candidate.iter().map(|n| sampler.original_probability(n)).sum();
    (mass * 20.0 * 100.0 / sampler.target_size() as f64).min(100.0)
}

/// Génère, répare et note un pool de grilles, trié par score décroissant.
///
/// Chaque grille reçoit son propre `StdRng`, semé depuis `rng` avant la
/// répartition sur rayon : le résultat ne dépend que de la graine.
pub fn build_pool<R: Rng + ?Sized>(
    requested_count: usize,
    args: &SamplerArgs,
    history: &[Draw],
    reference: Option<&Draw>,
    config: &EngineConfig,
    rng: &mut R,
) -> Result<Vec<Candidate>> {
    if requested_count == 0 {
        return Err(EngineError::invalid("au moins une grille doit être demandée"));
    }
    let size = pool_size(requested_count, config);
    if size > config.pool.max_pool_size {
        return Err(EngineError::PoolTooLarge { requested: size, cap: config.pool.max_pool_size });
    }

    let sampler = CandidateSampler::new(args, &config.sampler)?;
    let guard = UniquenessGuard::new(history);
    let rubric = BalanceRubric::new(args.universe, args.target_size, config.rubric.clone());
    let reference = reference
        .map(|draw| SymbolSet::from_numbers(&draw.numbers, &args.universe))
        .transpose()?;
    let repair = RepairLoop::new(&sampler, &guard, &rubric, reference, config.repair.max_attempts);

    let seeds: Vec<u64> = (0..size).map(|_| rng.random()).collect();
    let deadline = config.pool.deadline_ms;
    let start = Instant::now();

    let mut pool: Vec<Candidate> = seeds
        .par_iter()
        .map(|&seed| {
            if let Some(limit) = deadline {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                if elapsed_ms >= limit {
                    return Err(EngineError::DeadlineExceeded { elapsed_ms, pool_size: size });
                }
            }
            let mut local = StdRng::seed_from_u64(seed);
            let (set, report) = repair.generate_valid(&mut local);
            let (score, metrics) = rubric.score(&set, reference.as_ref())?;
            Ok(Candidate {
                numbers: set.to_vec(),
                score,
                metrics,
                confidence: confidence(&sampler, &set),
                repair: report,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // sort_by est stable : les ex aequo gardent l'ordre de génération
    pool.sort_by(|a, b| b.score.cmp(&a.score));

    let non_compliant = pool.iter().filter(|c| !c.repair.is_compliant()).count();
    if non_compliant > 0 {
        log::warn!(
            "{}/{} grilles hors règles après {} réparations",
            non_compliant,
            size,
            config.repair.max_attempts
        );
    }
    log::info!(
        "Pool de {} grilles en {} ms (meilleur score {})",
        size,
        start.elapsed().as_millis(),
        pool.first().map(|c| c.score).unwrap_or(0)
    );

    Ok(pool)
}
