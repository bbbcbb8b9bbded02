use serde::Serialize;

use lotofacil_db::models::{Draw, NumberStats};

use crate::error::{EngineError, Result};
use crate::symbols::{SymbolSet, Universe};

fn draw_set(draw: &Draw) -> SymbolSet {
    draw.numbers.iter().copied().collect()
}

/// Les `window` derniers tirages, au moins un tant que l'historique n'est pas vide.
pub fn recent_window(history: &[Draw], window: usize) -> &[Draw] {
    let size = window.max(1).min(history.len());
    &history[history.len() - size..]
}

/// Fréquence et écart courant de chaque numéro (écart 0 = sorti au dernier tirage).
pub fn compute_stats(history: &[Draw], universe: &Universe) -> Vec<NumberStats> {
    universe
        .all()
        .iter()
        .map(|n| {
            let frequency = history.iter().filter(|d| d.numbers.contains(&n)).count() as u32;
            let gap = history
                .iter()
                .rev()
                .position(|d| d.numbers.contains(&n))
                .unwrap_or(history.len()) as u32;
            NumberStats { number: n, frequency, gap }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleState {
    /// Tirages depuis la fermeture du dernier cycle.
    pub draws_in_cycle: usize,
    pub missing: Vec<u8>,
    pub progress: f64,
    pub completed_cycles: usize,
}

/// Un cycle se ferme quand tous les numéros de l'univers sont sortis au moins une fois.
pub fn cycle_state(history: &[Draw], universe: &Universe) -> CycleState {
    let all = universe.all();
    let mut seen = SymbolSet::empty();
    let mut draws_in_cycle = 0;
    let mut completed_cycles = 0;

    for draw in history {
        seen = seen.union(&draw_set(draw));
        draws_in_cycle += 1;
        if all.is_subset(&seen) {
            seen = SymbolSet::empty();
            draws_in_cycle = 0;
            completed_cycles += 1;
        }
    }

    CycleState {
        draws_in_cycle,
        missing: all.difference(&seen).to_vec(),
        progress: seen.len() as f64 / all.len() as f64 * 100.0,
        completed_cycles,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Affinity {
    pub number: u8,
    pub count: u32,
    pub percent: f64,
}

/// Numéros qui sortent le plus souvent avec la sélection (1 à 4 numéros) :
/// les 3 meilleurs, parmi les tirages contenant toute la sélection.
pub fn affinities(history: &[Draw], universe: &Universe, selected: &[u8]) -> Result<Vec<Affinity>> {
    if selected.is_empty() || selected.len() > 4 {
        return Err(EngineError::invalid(format!(
            "{} numéros sélectionnés, 1 à 4 attendus",
            selected.len()
        )));
    }
    let wanted = SymbolSet::from_numbers(selected, universe)?;

    let matching: Vec<SymbolSet> = history
        .iter()
        .map(draw_set)
        .filter(|set| wanted.is_subset(set))
        .collect();
    if matching.is_empty() {
        return Ok(Vec::new());
    }

    let mut counts: Vec<(u8, u32)> = universe
        .all()
        .difference(&wanted)
        .iter()
        .map(|n| (n, matching.iter().filter(|set| set.contains(n)).count() as u32))
        .filter(|&(_, c)| c > 0)
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    Ok(counts
        .into_iter()
        .take(3)
        .map(|(number, count)| Affinity {
            number,
            count,
            percent: count as f64 / matching.len() as f64 * 100.0,
        })
        .collect())
}
