use std::collections::HashMap;

use lotofacil_db::models::{DRAW_SIZE, Draw};

use crate::error::{EngineError, Result};
use crate::symbols::{SymbolSet, Universe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Novelty {
    /// La grille n'a pas la taille d'un tirage : la règle ne s'applique pas encore.
    NotApplicable,
    Novel,
    /// Déjà sortie au concours indiqué.
    SeenIn(u32),
}

/// Index des combinaisons déjà tirées, construit une fois par lot de vérifications.
#[derive(Debug, Clone, Default)]
pub struct UniquenessGuard {
    seen: HashMap<SymbolSet, u32>,
}

impl UniquenessGuard {
    pub fn new(history: &[Draw]) -> Self {
        let mut seen = HashMap::with_capacity(history.len());
        for draw in history {
            let set: SymbolSet = draw.numbers.iter().copied().collect();
            seen.entry(set).or_insert(draw.contest);
        }
        Self { seen }
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn check(&self, candidate: &SymbolSet) -> Novelty {
        if candidate.len() != DRAW_SIZE {
            return Novelty::NotApplicable;
        }
        match self.seen.get(candidate) {
            Some(&contest) => Novelty::SeenIn(contest),
            None => Novelty::Novel,
        }
    }

    pub fn is_novel(&self, candidate: &SymbolSet) -> Result<bool> {
        match self.check(candidate) {
            Novelty::NotApplicable => Err(EngineError::InvalidCandidateSize {
                expected: DRAW_SIZE,
                actual: candidate.len(),
            }),
            Novelty::Novel => Ok(true),
            Novelty::SeenIn(_) => Ok(false),
        }
    }
}

/// Parcours complet de l'historique, sans index.
pub fn is_novel(history: &[Draw], candidate: &[u8]) -> Result<bool> {
    if candidate.len() != DRAW_SIZE {
        return Err(EngineError::InvalidCandidateSize { expected: DRAW_SIZE, actual: candidate.len() });
    }
    let wanted = SymbolSet::from_numbers(candidate, &Universe::lotofacil())?;
    Ok(!history.iter().any(|draw| draw.numbers.iter().copied().collect::<SymbolSet>() == wanted))
}
