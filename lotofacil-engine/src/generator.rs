use chrono::Datelike;
use rand::Rng;

use lotofacil_db::models::{Candidate, DRAW_SIZE, Draw};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::pool::build_pool;
use crate::sampler::SamplerArgs;
use crate::selector::select;
use crate::symbols::Universe;

/// Génère un seed déterministe basé sur la date du jour (YYYYMMDD).
pub fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    today.year() as u64 * 10_000 + today.month() as u64 * 100 + today.day() as u64
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub requested_count: usize,
    pub universe: Universe,
    pub target_size: usize,
    pub forced: Vec<u8>,
    pub excluded: Vec<u8>,
}

impl GenerationRequest {
    pub fn new(requested_count: usize) -> Self {
        Self {
            requested_count,
            universe: Universe::lotofacil(),
            target_size: DRAW_SIZE,
            forced: Vec::new(),
            excluded: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Generation {
    pub pool_size: usize,
    pub selected: Vec<Candidate>,
}

/// Chaîne complète : pool réparé et noté, puis sélection.
/// La référence de répétition est le tirage le plus récent de `history`.
pub fn generate<R: Rng + ?Sized>(
    request: &GenerationRequest,
    probabilities: &[f64],
    history: &[Draw],
    config: &EngineConfig,
    rng: &mut R,
) -> Result<Generation> {
    if request.requested_count == 0 {
        return Err(EngineError::invalid("au moins une grille doit être demandée"));
    }

    let args = SamplerArgs {
        probabilities: probabilities.to_vec(),
        universe: request.universe,
        target_size: request.target_size,
        forced: request.forced.clone(),
        excluded: request.excluded.clone(),
    };
    let pool = build_pool(request.requested_count, &args, history, history.last(), config, rng)?;
    let selected = select(&pool, request.requested_count, &config.selection, rng);

    Ok(Generation { pool_size: pool.len(), selected })
}
