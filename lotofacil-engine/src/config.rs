use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::selector::SelectionPolicy;

/// Critère de la grille d'évaluation : une plage « pleine » et une plage
/// « partielle » plus large, chacune avec ses points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub full: (u32, u32),
    pub full_points: i32,
    pub partial: (u32, u32),
    pub partial_points: i32,
}

impl Band {
    pub const fn new(full: (u32, u32), full_points: i32, partial: (u32, u32), partial_points: i32) -> Self {
        Self { full, full_points, partial, partial_points }
    }

    pub fn in_full(&self, value: u32) -> bool {
        self.full.0 <= value && value <= self.full.1
    }

    pub fn points(&self, value: u32) -> i32 {
        if self.in_full(value) {
            self.full_points
        } else if self.partial.0 <= value && value <= self.partial.1 {
            self.partial_points
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RubricConfig {
    pub odd: Band,
    pub prime: Band,
    pub frame: Band,
    pub fibonacci: Band,
    pub sum: Band,
    /// Recouvrement avec le dernier tirage. La plage pleine sert aussi de
    /// règle dure pour la boucle de réparation.
    pub overlap: Band,
}

impl Default for RubricConfig {
    fn default() -> Self {
        Self {
            odd: Band::new((7, 9), 2, (6, 10), 1),
            prime: Band::new((4, 6), 2, (3, 7), 1),
            frame: Band::new((9, 10), 2, (8, 11), 1),
            fibonacci: Band::new((4, 4), 2, (3, 5), 1),
            sum: Band::new((180, 220), 2, (170, 230), 1),
            overlap: Band::new((8, 10), 3, (7, 11), 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Tirages pondérés tentés avant le remplissage déterministe.
    pub max_draw_attempts: u32,
    /// Poids des numéros imposés (« toujours en premier »).
    pub forced_weight: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_draw_attempts: 100,
            forced_weight: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    pub max_attempts: u32,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self { max_attempts: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub oversample: usize,
    pub min_pool_size: usize,
    pub max_pool_size: usize,
    pub deadline_ms: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            oversample: 50,
            min_pool_size: 500,
            max_pool_size: 250_000,
            deadline_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub policy: SelectionPolicy,
    /// Au-delà de ce nombre de grilles demandées, on renvoie le haut du pool tel quel.
    pub large_output_threshold: usize,
    /// Paliers (numéros communs minimum, pénalité), du plus sévère au plus léger.
    pub penalty_tiers: Vec<(usize, i32)>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::Diversity,
            large_output_threshold: 100,
            penalty_tiers: vec![(13, 50), (11, 20), (10, 10)],
        }
    }
}

/// Fusion des signaux historiques en vecteur de probabilités.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Nombre de tirages récents pour la fréquence.
    pub frequency_window: usize,
    pub frequency_weight: f64,
    pub overdue_weight: f64,
    /// Gain par concours de retard, plafonné à `overdue_cap`.
    pub overdue_step: f64,
    pub overdue_cap: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            frequency_window: 10,
            frequency_weight: 0.6,
            overdue_weight: 0.4,
            overdue_step: 0.02,
            overdue_cap: 0.2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub signals: SignalConfig,
    pub rubric: RubricConfig,
    pub sampler: SamplerConfig,
    pub repair: RepairConfig,
    pub pool: PoolConfig,
    pub selection: SelectionConfig,
}

pub fn save_config(config: &EngineConfig, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossible d'écrire {}", path.display()))?;
    Ok(())
}

pub fn load_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&json)
        .with_context(|| format!("Configuration invalide dans {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_points() {
        let band = Band::new((7, 9), 2, (6, 10), 1);
        assert_eq!(band.points(5), 0);
        assert_eq!(band.points(6), 1);
        assert_eq!(band.points(7), 2);
        assert_eq!(band.points(9), 2);
        assert_eq!(band.points(10), 1);
        assert_eq!(band.points(11), 0);
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.repair.max_attempts, 10);
        assert_eq!(config.sampler.max_draw_attempts, 100);
        assert_eq!(config.pool.oversample, 50);
        assert_eq!(config.pool.min_pool_size, 500);
        assert_eq!(config.rubric.overlap.full, (8, 10));
        assert_eq!(config.rubric.overlap.full_points, 3);
        assert_eq!(config.selection.policy, SelectionPolicy::Diversity);
        assert_eq!(config.signals.frequency_window, 10);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let mut config = EngineConfig::default();
        config.pool.deadline_ms = Some(2_000);
        config.rubric.sum = Band::new((190, 205), 2, (180, 215), 1);
        let json = serde_json::to_string(&config).unwrap();
        let restored: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let restored: EngineConfig = serde_json::from_str(r#"{"repair": {"max_attempts": 3}}"#).unwrap();
        assert_eq!(restored.repair.max_attempts, 3);
        assert_eq!(restored.pool, PoolConfig::default());
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let restored: EngineConfig = serde_json::from_str(
            r#"{"pool": {"deadline_ms": 500}, "signals": {"frequency_window": 25}, "selection": {"policy": "top-quartile"}}"#,
        )
        .unwrap();
        assert_eq!(restored.pool.deadline_ms, Some(500));
        assert_eq!(restored.pool.min_pool_size, 500);
        assert_eq!(restored.signals.frequency_window, 25);
        assert_eq!(restored.signals.overdue_cap, 0.2);
        assert_eq!(restored.selection.policy, SelectionPolicy::TopQuartile);
        assert_eq!(restored.selection.large_output_threshold, 100);
        assert_eq!(restored.sampler, SamplerConfig::default());
    }
}
