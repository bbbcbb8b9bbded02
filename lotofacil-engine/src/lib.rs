pub mod backtest;
pub mod config;
pub mod error;
pub mod generator;
pub mod guard;
pub mod pool;
pub mod repair;
pub mod risk;
pub mod rubric;
pub mod sampler;
pub mod selector;
pub mod signals;
pub mod stats;
pub mod symbols;
pub mod wheel;

pub use error::{EngineError, Result};

/// Historique synthétique pour les tests : fenêtres glissantes de 15 numéros
/// sur 1..=25, du plus ancien au plus récent.
#[cfg(test)]
pub(crate) fn make_test_history(n: usize) -> Vec<lotofacil_db::models::Draw> {
    use lotofacil_db::models::Draw;

    (0..n)
        .map(|i| {
            let start = (i * 7) % 25;
            let mut numbers = [0u8; 15];
            for (k, slot) in numbers.iter_mut().enumerate() {
                *slot = ((start + k) % 25 + 1) as u8;
            }
            Draw::new(
                (i + 1) as u32,
                format!("2024-{:02}-{:02}", (i / 28) % 12 + 1, (i % 28) + 1),
                numbers,
            )
        })
        .collect()
}
