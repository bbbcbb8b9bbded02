use rand::Rng;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::seq::IndexedRandom;

use lotofacil_db::models::RepairReport;

use crate::guard::{Novelty, UniquenessGuard};
use crate::rubric::BalanceRubric;
use crate::sampler::CandidateSampler;
use crate::symbols::SymbolSet;

/// Boucle de réparation locale : remplace un numéro non imposé à la fois
/// jusqu'à satisfaire l'inédit et la répétition du dernier tirage, ou épuiser
/// le budget.
pub struct RepairLoop<'a> {
    sampler: &'a CandidateSampler,
    guard: &'a UniquenessGuard,
    rubric: &'a BalanceRubric,
    reference: Option<SymbolSet>,
    max_attempts: u32,
}

impl<'a> RepairLoop<'a> {
    pub fn new(
        sampler: &'a CandidateSampler,
        guard: &'a UniquenessGuard,
        rubric: &'a BalanceRubric,
        reference: Option<SymbolSet>,
        max_attempts: u32,
    ) -> Self {
        Self {
            sampler,
            guard,
            rubric,
            reference,
            max_attempts,
        }
    }

    fn evaluate(&self, candidate: &SymbolSet) -> (bool, bool) {
        let novel = !matches!(self.guard.check(candidate), Novelty::SeenIn(_));
        // sans référence, la règle de répétition ne s'applique pas
        let in_band = self
            .reference
            .as_ref()
            .is_none_or(|reference| self.rubric.overlap_in_band(candidate, reference));
        (novel, in_band)
    }

    /// Échantillonne une grille puis la répare. Ne renvoie jamais d'erreur :
    /// un rapport non conforme signale un budget épuisé.
    pub fn generate_valid<R: Rng + ?Sized>(&self, rng: &mut R) -> (SymbolSet, RepairReport) {
        let candidate = self.sampler.sample(rng);
        self.repair(candidate, rng)
    }

    pub fn repair<R: Rng + ?Sized>(&self, mut candidate: SymbolSet, rng: &mut R) -> (SymbolSet, RepairReport) {
        let forced = self.sampler.forced();
        let excluded = self.sampler.excluded();
        let all = self.sampler.universe().all();

        let (mut novel, mut in_band) = self.evaluate(&candidate);
        let mut attempts = 0;

        while !(novel && in_band) && attempts < self.max_attempts {
            let removable = candidate.difference(&forced).to_vec();
            let Some(&victim) = removable.choose(rng) else {
                break;
            };
            candidate.remove(victim);

            let alive = all.difference(&candidate).difference(&excluded).to_vec();
            if let Some(replacement) = self.pick_replacement(&alive, rng) {
                candidate.insert(replacement);
            }

            (novel, in_band) = self.evaluate(&candidate);
            attempts += 1;
        }

        (candidate, RepairReport { attempts, novel, overlap_in_band: in_band })
    }

    /// Tirage proportionnel aux poids ajustés parmi les numéros vivants,
    /// uniforme si aucun n'a de poids.
    fn pick_replacement<R: Rng + ?Sized>(&self, alive: &[u8], rng: &mut R) -> Option<u8> {
        let weights: Vec<f64> = alive.iter().map(|&n| self.sampler.weight(n)).collect();
        if weights.iter().sum::<f64>() > 0.0 {
            if let Ok(dist) = WeightedIndex::new(&weights) {
                return Some(alive[dist.sample(rng)]);
            }
        }
        alive.choose(rng).copied()
    }
}
