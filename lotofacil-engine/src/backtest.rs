use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use lotofacil_db::models::{DRAW_SIZE, Draw};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::generator::{GenerationRequest, generate};
use crate::signals::fuse;
use crate::symbols::{SymbolSet, Universe};

/// Prix d'une grille simple.
pub const TICKET_COST: f64 = 3.50;

/// Gains estimés par nombre de numéros trouvés (11 à 15).
pub const PRIZES: [(u8, f64); 5] = [
    (11, 7.00),
    (12, 14.00),
    (13, 35.00),
    (14, 1_500.00),
    (15, 2_000_000.00),
];

pub fn prize_for(hits: u8) -> f64 {
    PRIZES
        .iter()
        .find(|(h, _)| *h == hits)
        .map(|(_, p)| *p)
        .unwrap_or(0.0)
}

fn hits(numbers: &[u8], draw: &Draw) -> u8 {
    numbers.iter().filter(|n| draw.numbers.contains(n)).count() as u8
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickBacktest {
    pub draws_tested: usize,
    /// Nombre de tirages passés à 11, 12, 13, 14 et 15 numéros.
    pub tier_counts: [u32; 5],
    pub total_prize: f64,
    pub total_cost: f64,
    pub roi: f64,
}

/// Rejoue une grille de 15 numéros contre tout l'historique.
pub fn quick_backtest(history: &[Draw], numbers: &[u8]) -> Result<QuickBacktest> {
    if numbers.len() != DRAW_SIZE {
        return Err(EngineError::InvalidCandidateSize { expected: DRAW_SIZE, actual: numbers.len() });
    }
    SymbolSet::from_numbers(numbers, &Universe::lotofacil())?;

    let mut tier_counts = [0u32; 5];
    let mut total_prize = 0.0;
    for draw in history {
        let h = hits(numbers, draw);
        if h >= 11 {
            tier_counts[(h - 11) as usize] += 1;
            total_prize += prize_for(h);
        }
    }

    let total_cost = history.len() as f64 * TICKET_COST;
    let roi = if total_cost > 0.0 {
        (total_prize - total_cost) / total_cost * 100.0
    } else {
        0.0
    };

    Ok(QuickBacktest { draws_tested: history.len(), tier_counts, total_prize, total_cost, roi })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationRow {
    pub contest: u32,
    pub engine_numbers: Vec<u8>,
    pub engine_hits: u8,
    pub random_hits: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub tests: usize,
    pub engine_mean_hits: f64,
    pub random_mean_hits: f64,
    pub engine_best: u8,
    pub engine_prize: f64,
    pub random_prize: f64,
    pub cost: f64,
    pub engine_profit: f64,
}

/// Nombre de concours rejouables : il faut au moins un tirage antérieur.
pub fn simulation_range(history: &[Draw], tests: usize) -> std::ops::Range<usize> {
    let tests = tests.min(history.len().saturating_sub(1));
    history.len() - tests..history.len()
}

/// Rejoue le concours `index` : signaux et génération sur les tirages
/// strictement antérieurs, puis comparaison avec une grille au hasard.
pub fn simulate_contest(history: &[Draw], index: usize, config: &EngineConfig, seed: u64) -> Result<SimulationRow> {
    if index == 0 || index >= history.len() {
        return Err(EngineError::invalid(format!(
            "concours d'index {} hors de 1-{}",
            index,
            history.len().saturating_sub(1)
        )));
    }
    let past = &history[..index];
    let actual = &history[index];
    let universe = Universe::lotofacil();

    let probabilities = fuse(past, universe.size(), &config.signals);
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
    let generation = generate(&GenerationRequest::new(1), &probabilities, past, config, &mut rng)?;
    let engine_numbers = generation
        .selected
        .into_iter()
        .next()
        .map(|c| c.numbers)
        .ok_or_else(|| EngineError::invalid("aucune grille générée"))?;

    let random_numbers: Vec<u8> = rand::seq::index::sample(&mut rng, universe.size() as usize, DRAW_SIZE)
        .into_iter()
        .map(|i| (i + 1) as u8)
        .collect();

    Ok(SimulationRow {
        contest: actual.contest,
        engine_hits: hits(&engine_numbers, actual),
        random_hits: hits(&random_numbers, actual),
        engine_numbers,
    })
}

pub fn summarize(rows: &[SimulationRow]) -> SimulationSummary {
    let n = rows.len();
    let mean = |f: fn(&SimulationRow) -> u8| {
        if n == 0 {
            0.0
        } else {
            rows.iter().map(|r| f(r) as f64).sum::<f64>() / n as f64
        }
    };
    let engine_prize: f64 = rows.iter().map(|r| prize_for(r.engine_hits)).sum();
    let random_prize: f64 = rows.iter().map(|r| prize_for(r.random_hits)).sum();
    let cost = n as f64 * TICKET_COST;

    SimulationSummary {
        tests: n,
        engine_mean_hits: mean(|r| r.engine_hits),
        random_mean_hits: mean(|r| r.random_hits),
        engine_best: rows.iter().map(|r| r.engine_hits).max().unwrap_or(0),
        engine_prize,
        random_prize,
        cost,
        engine_profit: engine_prize - cost,
    }
}

/// Simulation glissante sur les `tests` derniers concours.
pub fn simulate(
    history: &[Draw],
    tests: usize,
    config: &EngineConfig,
    seed: u64,
) -> Result<(Vec<SimulationRow>, SimulationSummary)> {
    let rows = simulation_range(history, tests)
        .map(|index| simulate_contest(history, index, config, seed))
        .collect::<Result<Vec<_>>>()?;
    let summary = summarize(&rows);
    Ok((rows, summary))
}
