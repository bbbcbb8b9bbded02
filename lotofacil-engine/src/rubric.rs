use lotofacil_db::models::BalanceMetrics;

use crate::config::RubricConfig;
use crate::error::{EngineError, Result};
use crate::symbols::{SymbolSet, Universe};

/// Grille d'évaluation de l'équilibre d'une grille (pairs/impairs, premiers,
/// moldura, Fibonacci, somme, répétition du dernier tirage).
///
/// Les ensembles d'appartenance sont calculés une seule fois à la construction.
#[derive(Debug, Clone)]
pub struct BalanceRubric {
    universe: Universe,
    target_size: usize,
    primes: SymbolSet,
    frame: SymbolSet,
    fibonacci: SymbolSet,
    config: RubricConfig,
}

impl BalanceRubric {
    pub fn new(universe: Universe, target_size: usize, config: RubricConfig) -> Self {
        Self {
            universe,
            target_size,
            primes: universe.primes(),
            frame: universe.frame(),
            fibonacci: universe.fibonacci(),
            config,
        }
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn config(&self) -> &RubricConfig {
        &self.config
    }

    /// Métriques brutes, sans vérification de taille.
    pub fn metrics(&self, candidate: &SymbolSet, reference: Option<&SymbolSet>) -> BalanceMetrics {
        BalanceMetrics {
            odd_count: candidate.iter().filter(|n| n % 2 == 1).count() as u8,
            prime_count: candidate.intersection_count(&self.primes) as u8,
            frame_count: candidate.intersection_count(&self.frame) as u8,
            fibonacci_count: candidate.intersection_count(&self.fibonacci) as u8,
            sum: candidate.sum(),
            overlap_with_reference: reference.map(|r| candidate.intersection_count(r) as u8),
        }
    }

    pub fn score(&self, candidate: &SymbolSet, reference: Option<&SymbolSet>) -> Result<(i32, BalanceMetrics)> {
        if candidate.len() != self.target_size {
            return Err(EngineError::InvalidCandidateSize {
                expected: self.target_size,
                actual: candidate.len(),
            });
        }
        if let Some(n) = candidate.iter().find(|&n| n > self.universe.size()) {
            return Err(EngineError::SymbolOutOfRange { symbol: n, universe: self.universe.size() });
        }

        let m = self.metrics(candidate, reference);
        let c = &self.config;
        let mut score = c.odd.points(m.odd_count.into())
            + c.prime.points(m.prime_count.into())
            + c.frame.points(m.frame_count.into())
            + c.fibonacci.points(m.fibonacci_count.into())
            + c.sum.points(m.sum);
        if let Some(overlap) = m.overlap_with_reference {
            score += c.overlap.points(overlap.into());
        }
        Ok((score, m))
    }

    /// Variante sur une liste brute (grille saisie par l'utilisateur).
    pub fn score_numbers(&self, numbers: &[u8], reference: Option<&[u8]>) -> Result<(i32, BalanceMetrics)> {
        let candidate = SymbolSet::from_numbers(numbers, &self.universe)?;
        let reference = reference
            .map(|r| SymbolSet::from_numbers(r, &self.universe))
            .transpose()?;
        self.score(&candidate, reference.as_ref())
    }

    pub fn overlap_in_band(&self, candidate: &SymbolSet, reference: &SymbolSet) -> bool {
        self.config.overlap.in_full(candidate.intersection_count(reference) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rubric() -> BalanceRubric {
        BalanceRubric::new(Universe::lotofacil(), 15, RubricConfig::default())
    }

    fn set(numbers: &[u8]) -> SymbolSet {
        numbers.iter().copied().collect()
    }

    #[test]
    fn test_metrics_first_fifteen() {
        let (_, m) = rubric().score(&set(&(1..=15).collect::<Vec<u8>>()), None).unwrap();
        assert_eq!(m.odd_count, 8);
        assert_eq!(m.prime_count, 6);
        assert_eq!(m.frame_count, 9);
        assert_eq!(m.fibonacci_count, 6);
        assert_eq!(m.sum, 120);
        assert_eq!(m.overlap_with_reference, None);
    }

    #[test]
    fn test_score_first_fifteen() {
        // impairs 8 → +2, premiers 6 → +2, moldura 9 → +2, fibo 6 → 0, somme 120 → 0
        let (score, _) = rubric().score(&set(&(1..=15).collect::<Vec<u8>>()), None).unwrap();
        assert_eq!(score, 6);
    }

    #[test]
    fn test_score_with_reference_overlap() {
        let candidate = set(&(1..=15).collect::<Vec<u8>>());
        let reference = set(&(7..=21).collect::<Vec<u8>>());
        let (score, m) = rubric().score(&candidate, Some(&reference)).unwrap();
        assert_eq!(m.overlap_with_reference, Some(9));
        assert_eq!(score, 6 + 3);
    }

    #[test]
    fn test_parity_band_boundaries() {
        let r = rubric();
        let odd_points = |odd: u32| r.config().odd.points(odd);
        assert_eq!(odd_points(7), 2);
        assert_eq!(odd_points(8), 2);
        assert_eq!(odd_points(9), 2);
        assert_eq!(odd_points(6), 1);
        assert_eq!(odd_points(10), 1);
        assert_eq!(odd_points(5), 0);
        assert_eq!(odd_points(11), 0);
    }

    #[test]
    fn test_parity_counts_on_real_grids() {
        let r = rubric();
        let evens: Vec<u8> = (1..=25).filter(|n| n % 2 == 0).collect();
        let odds: Vec<u8> = (1..=25).filter(|n| n % 2 == 1).collect();

        let mut five_odd = odds[..5].to_vec();
        five_odd.extend(&evens[..10]);
        let (_, m) = r.score(&set(&five_odd), None).unwrap();
        assert_eq!(m.odd_count, 5);

        let mut eight_odd = odds[..8].to_vec();
        eight_odd.extend(&evens[..7]);
        let (_, m) = r.score(&set(&eight_odd), None).unwrap();
        assert_eq!(m.odd_count, 8);
        assert_eq!(r.config().odd.points(m.odd_count.into()), 2);
    }

    #[test]
    fn test_score_is_deterministic() {
        let r = rubric();
        let candidate = set(&[1, 2, 4, 5, 7, 9, 10, 11, 13, 15, 18, 20, 22, 24, 25]);
        let reference = set(&[2, 3, 4, 6, 7, 9, 11, 12, 13, 16, 18, 20, 21, 23, 25]);
        let first = r.score(&candidate, Some(&reference)).unwrap();
        let second = r.score(&candidate, Some(&reference)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_score_mixed_bands() {
        let candidate = set(&[1, 2, 3, 4, 5, 7, 8, 10, 15, 16, 17, 19, 20, 22, 25]);
        let r = rubric();
        let m = r.metrics(&candidate, None);
        assert_eq!((m.odd_count, m.prime_count, m.frame_count, m.fibonacci_count), (8, 6, 11, 5));
        let reference = set(&[1, 2, 3, 4, 5, 7, 8, 10, 15, 6, 9, 11, 12, 13, 14]);
        let (score, m) = r.score(&candidate, Some(&reference)).unwrap();
        assert_eq!(m.sum, 174);
        assert_eq!(m.overlap_with_reference, Some(9));
        // moldura 11, fibo 5 et somme 174 tombent en plage partielle
        assert_eq!(score, 2 + 2 + 1 + 1 + 1 + 3);
    }

    #[test]
    fn test_invalid_size_rejected() {
        let err = rubric().score(&set(&[1, 2, 3]), None).unwrap_err();
        assert_eq!(err, EngineError::InvalidCandidateSize { expected: 15, actual: 3 });
    }

    #[test]
    fn test_score_numbers_out_of_range() {
        let mut numbers: Vec<u8> = (1..=14).collect();
        numbers.push(30);
        assert!(matches!(
            rubric().score_numbers(&numbers, None),
            Err(EngineError::SymbolOutOfRange { symbol: 30, .. })
        ));
    }
}
