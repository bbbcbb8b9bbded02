use thiserror::Error;

/// Erreurs du moteur de génération. Toutes sont fatales pour la requête en
/// cours : aucun pool partiel n'est renvoyé.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Grille de {actual} numéros, {expected} attendus")]
    InvalidCandidateSize {
        expected: usize,
        actual: usize,
    },

    #[error("Contraintes insatisfaisables : {reason}")]
    ConstraintUnsatisfiable {
        reason: String,
    },

    #[error("Numéro {symbol} hors de l'univers 1-{universe}")]
    SymbolOutOfRange {
        symbol: u8,
        universe: u8,
    },

    #[error("Requête invalide : {reason}")]
    InvalidRequest {
        reason: String,
    },

    #[error("Pool de {requested} grilles au-delà de la limite ({cap})")]
    PoolTooLarge {
        requested: usize,
        cap: usize,
    },

    #[error("Délai dépassé après {elapsed_ms} ms ({pool_size} grilles demandées)")]
    DeadlineExceeded {
        elapsed_ms: u64,
        pool_size: usize,
    },
}

impl EngineError {
    pub(crate) fn unsatisfiable(reason: impl Into<String>) -> Self {
        EngineError::ConstraintUnsatisfiable { reason: reason.into() }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        EngineError::InvalidRequest { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
