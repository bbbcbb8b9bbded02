use lotofacil_db::models::Draw;

use crate::config::SignalConfig;

fn uniform(size: usize) -> Vec<f64> {
    vec![1.0 / size as f64; size]
}

/// Fréquence d'apparition sur les `window` derniers tirages (historique du
/// plus ancien au plus récent).
pub fn recent_frequency(history: &[Draw], universe_size: u8, window: usize) -> Vec<f64> {
    let size = universe_size as usize;
    let start = history.len().saturating_sub(window);
    let recent = &history[start..];
    if recent.is_empty() {
        return vec![0.0; size];
    }

    let mut counts = vec![0u32; size];
    for draw in recent {
        for &n in &draw.numbers {
            if let Some(c) = counts.get_mut((n as usize).wrapping_sub(1)) {
                *c += 1;
            }
        }
    }
    counts.iter().map(|&c| c as f64 / recent.len() as f64).collect()
}

/// Poids de retard : concours écoulés depuis la dernière sortie × `step`,
/// plafonné à `cap`. Un numéro jamais sorti reçoit le plafond.
pub fn overdue(history: &[Draw], universe_size: u8, step: f64, cap: f64) -> Vec<f64> {
    let size = universe_size as usize;
    let Some(last) = history.last() else {
        return vec![cap; size];
    };

    let mut last_seen: Vec<Option<u32>> = vec![None; size];
    for draw in history {
        for &n in &draw.numbers {
            if let Some(slot) = last_seen.get_mut((n as usize).wrapping_sub(1)) {
                *slot = Some(draw.contest);
            }
        }
    }

    last_seen
        .iter()
        .map(|seen| match seen {
            Some(contest) => (last.contest.saturating_sub(*contest) as f64 * step).min(cap),
            None => cap,
        })
        .collect()
}

/// Vecteur de probabilités normalisé : fréquence récente et retard pondérés.
pub fn fuse(history: &[Draw], universe_size: u8, config: &SignalConfig) -> Vec<f64> {
    let size = universe_size as usize;
    let frequency = recent_frequency(history, universe_size, config.frequency_window);
    let delay = overdue(history, universe_size, config.overdue_step, config.overdue_cap);

    let scores: Vec<f64> = frequency
        .iter()
        .zip(&delay)
        .map(|(f, d)| config.frequency_weight * f + config.overdue_weight * d)
        .collect();

    let total: f64 = scores.iter().sum();
    if total > 0.0 && total.is_finite() {
        scores.iter().map(|s| s / total).collect()
    } else {
        log::debug!("signaux nuls, probabilités uniformes");
        uniform(size)
    }
}
