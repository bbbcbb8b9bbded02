use rand::Rng;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;

use crate::config::SamplerConfig;
use crate::error::{EngineError, Result};
use crate::symbols::{SymbolSet, Universe};

/// Paramètres d'échantillonnage d'une requête.
#[derive(Debug, Clone)]
pub struct SamplerArgs {
    /// Un poids par numéro, index 0 = numéro 1.
    pub probabilities: Vec<f64>,
    pub universe: Universe,
    pub target_size: usize,
    /// Numéros imposés, dans l'ordre de l'appelant (utilisé pour la troncature).
    pub forced: Vec<u8>,
    pub excluded: Vec<u8>,
}

/// Échantillonneur pondéré sans remise, préparé une fois par requête.
#[derive(Debug, Clone)]
pub struct CandidateSampler {
    universe: Universe,
    target_size: usize,
    forced: SymbolSet,
    seed: SymbolSet,
    excluded: SymbolSet,
    /// Poids ajustés normalisés (exclus à 0, imposés au poids fort).
    weights: Vec<f64>,
    /// Probabilités d'origine normalisées, pour l'indice de confiance.
    original: Vec<f64>,
    dist: WeightedIndex<f64>,
    max_draw_attempts: u32,
}

impl CandidateSampler {
    pub fn new(args: &SamplerArgs, config: &SamplerConfig) -> Result<Self> {
        let universe = args.universe;
        let size = universe.size() as usize;

        if args.probabilities.len() != size {
            return Err(EngineError::invalid(format!(
                "{} probabilités pour un univers de {}",
                args.probabilities.len(),
                size
            )));
        }
        if let Some(p) = args.probabilities.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(EngineError::invalid(format!("probabilité invalide : {}", p)));
        }
        if args.target_size == 0 || args.target_size > size {
            return Err(EngineError::invalid(format!(
                "taille de grille {} hors de 1-{}",
                args.target_size, size
            )));
        }

        let forced = SymbolSet::from_numbers(&args.forced, &universe)?;
        let excluded = SymbolSet::from_numbers(&args.excluded, &universe)?;
        if !forced.is_disjoint(&excluded) {
            return Err(EngineError::unsatisfiable(format!(
                "numéros à la fois imposés et exclus : {:?}",
                forced.intersection(&excluded).to_vec()
            )));
        }
        let available = universe.all().difference(&excluded).len();
        if available < args.target_size {
            return Err(EngineError::unsatisfiable(format!(
                "{} numéros disponibles pour des grilles de {}",
                available, args.target_size
            )));
        }

        let seed: SymbolSet = args.forced.iter().copied().take(args.target_size).collect();

        let mut adjusted: Vec<f64> = args.probabilities.clone();
        for n in excluded.iter() {
            adjusted[(n - 1) as usize] = 0.0;
        }
        for n in forced.iter() {
            adjusted[(n - 1) as usize] = config.forced_weight;
        }

        if adjusted.iter().sum::<f64>() <= 0.0 {
            log::debug!("poids ajustés nuls, repli sur la distribution uniforme");
            adjusted = (1..=universe.size())
                .map(|n| if excluded.contains(n) { 0.0 } else { 1.0 })
                .collect();
        }
        let total: f64 = adjusted.iter().sum();
        if total <= 0.0 {
            return Err(EngineError::unsatisfiable("tous les numéros sont exclus"));
        }
        let weights: Vec<f64> = adjusted.iter().map(|w| w / total).collect();

        let dist = WeightedIndex::new(&weights)
            .map_err(|e| EngineError::unsatisfiable(format!("distribution invalide : {}", e)))?;

        let original_total: f64 = args.probabilities.iter().sum();
        let original = if original_total > 0.0 {
            args.probabilities.iter().map(|p| p / original_total).collect()
        } else {
            vec![1.0 / size as f64; size]
        };

        Ok(Self {
            universe,
            target_size: args.target_size,
            forced,
            seed,
            excluded,
            weights,
            original,
            dist,
            max_draw_attempts: config.max_draw_attempts,
        })
    }

    pub fn universe(&self) -> Universe {
        self.universe
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn forced(&self) -> SymbolSet {
        self.forced
    }

    pub fn excluded(&self) -> SymbolSet {
        self.excluded
    }

    /// Poids ajusté normalisé du numéro `n`.
    pub fn weight(&self, n: u8) -> f64 {
        self.weights[(n - 1) as usize]
    }

    pub fn original_probability(&self, n: u8) -> f64 {
        self.original[(n - 1) as usize]
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SymbolSet {
        let mut chosen = self.seed;

        let mut tries = 0;
        while chosen.len() < self.target_size && tries < self.max_draw_attempts {
            let n = (self.dist.sample(rng) + 1) as u8;
            if !self.excluded.contains(n) {
                chosen.insert(n);
            }
            tries += 1;
        }

        // Repli déterministe : la disponibilité a été vérifiée à la construction.
        if chosen.len() < self.target_size {
            log::debug!(
                "grille incomplète après {} tirages ({} / {}), remplissage déterministe",
                tries,
                chosen.len(),
                self.target_size
            );
            let remaining = self.universe.all().difference(&chosen).difference(&self.excluded);
            for n in remaining.iter().take(self.target_size - chosen.len()) {
                chosen.insert(n);
            }
        }

        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn args(forced: Vec<u8>, excluded: Vec<u8>) -> SamplerArgs {
        SamplerArgs {
            probabilities: vec![1.0 / 25.0; 25],
            universe: Universe::lotofacil(),
            target_size: 15,
            forced,
            excluded,
        }
    }

    #[test]
    fn test_sample_size_and_constraints() {
        let sampler = CandidateSampler::new(&args(vec![1, 2], vec![24, 25]), &SamplerConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let set = sampler.sample(&mut rng);
            assert_eq!(set.len(), 15);
            assert!(set.contains(1) && set.contains(2));
            assert!(!set.contains(24) && !set.contains(25));
        }
    }

    #[test]
    fn test_zero_weights_fall_back_to_uniform() {
        let mut a = args(vec![], vec![3]);
        a.probabilities = vec![0.0; 25];
        let sampler = CandidateSampler::new(&a, &SamplerConfig::default()).unwrap();
        assert_eq!(sampler.weight(3), 0.0);
        assert!((sampler.weight(1) - 1.0 / 24.0).abs() < 1e-12);
        assert!((sampler.original_probability(1) - 1.0 / 25.0).abs() < 1e-12);

        let set = sampler.sample(&mut StdRng::seed_from_u64(7));
        assert_eq!(set.len(), 15);
        assert!(!set.contains(3));
    }

    #[test]
    fn test_zero_weight_symbols_only_used_by_fill() {
        // Seuls 1..=5 ont un poids : le reste vient du remplissage déterministe.
        let mut a = args(vec![], vec![]);
        a.probabilities = (1..=25).map(|n| if n <= 5 { 1.0 } else { 0.0 }).collect();
        let sampler = CandidateSampler::new(&a, &SamplerConfig::default()).unwrap();
        let set = sampler.sample(&mut StdRng::seed_from_u64(1));
        assert_eq!(set.to_vec(), (1..=15).collect::<Vec<u8>>());
    }

    #[test]
    fn test_forced_truncated_in_caller_order() {
        let mut a = args((10..=25).rev().collect(), vec![]);
        a.target_size = 3;
        let sampler = CandidateSampler::new(&a, &SamplerConfig::default()).unwrap();
        let set = sampler.sample(&mut StdRng::seed_from_u64(3));
        assert_eq!(set.to_vec(), vec![23, 24, 25]);
    }

    #[test]
    fn test_too_many_exclusions() {
        let a = args(vec![], (1..=11).collect());
        let err = CandidateSampler::new(&a, &SamplerConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::ConstraintUnsatisfiable { .. }));

        // 10 exclus laissent exactement 15 numéros
        let a = args(vec![], (1..=10).collect());
        let sampler = CandidateSampler::new(&a, &SamplerConfig::default()).unwrap();
        let set = sampler.sample(&mut StdRng::seed_from_u64(5));
        assert_eq!(set.to_vec(), (11..=25).collect::<Vec<u8>>());
    }

    #[test]
    fn test_forced_and_excluded_overlap_rejected() {
        let err = CandidateSampler::new(&args(vec![5], vec![5]), &SamplerConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::ConstraintUnsatisfiable { .. }));
    }

    #[test]
    fn test_invalid_inputs() {
        let mut a = args(vec![], vec![]);
        a.probabilities.pop();
        assert!(matches!(
            CandidateSampler::new(&a, &SamplerConfig::default()),
            Err(EngineError::InvalidRequest { .. })
        ));

        let mut a = args(vec![], vec![]);
        a.probabilities[0] = f64::NAN;
        assert!(CandidateSampler::new(&a, &SamplerConfig::default()).is_err());

        let mut a = args(vec![], vec![]);
        a.target_size = 26;
        assert!(CandidateSampler::new(&a, &SamplerConfig::default()).is_err());

        assert!(matches!(
            CandidateSampler::new(&args(vec![26], vec![]), &SamplerConfig::default()),
            Err(EngineError::SymbolOutOfRange { symbol: 26, .. })
        ));
    }

    #[test]
    fn test_weighted_sampling_prefers_heavy_symbols() {
        let mut a = args(vec![], vec![]);
        a.target_size = 5;
        a.probabilities = (1..=25).map(|n| if n <= 5 { 10.0 } else { 0.1 }).collect();
        let sampler = CandidateSampler::new(&a, &SamplerConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let heavy: usize = (0..200)
            .map(|_| sampler.sample(&mut rng).iter().filter(|&n| n <= 5).count())
            .sum();
        assert!(heavy > 600, "les numéros lourds devraient dominer : {heavy}/1000");
    }
}
