use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{EngineError, Result};
use crate::symbols::{SymbolSet, Universe};

/// Développe une base de numéros en grilles de `size` numéros.
///
/// Avec `size` ou `size + 1` numéros de base, toutes les combinaisons sont
/// renvoyées (dans l'ordre lexicographique) et `count` est ignoré. Au-delà,
/// chaque grille prend les `size` numéros les moins utilisés jusque-là, les
/// égalités étant départagées au hasard.
pub fn wheel<R: Rng + ?Sized>(
    base: &[u8],
    size: usize,
    count: usize,
    universe: &Universe,
    rng: &mut R,
) -> Result<Vec<SymbolSet>> {
    let base_set = SymbolSet::from_numbers(base, universe)?;
    if size == 0 || base_set.len() < size {
        return Err(EngineError::invalid(format!(
            "base de {} numéros insuffisante pour des grilles de {}",
            base_set.len(),
            size
        )));
    }
    if base_set.len() == size {
        return Ok(vec![base_set]);
    }
    if base_set.len() == size + 1 {
        // retirer le plus grand d'abord donne l'ordre lexicographique
        let grids = base_set
            .to_vec()
            .into_iter()
            .rev()
            .map(|left_out| {
                let mut grid = base_set;
                grid.remove(left_out);
                grid
            })
            .collect();
        return Ok(grids);
    }
    if count == 0 {
        return Err(EngineError::invalid("au moins une grille doit être demandée"));
    }

    let mut usage: Vec<(u8, u32)> = base_set.iter().map(|n| (n, 0)).collect();
    let mut grids = Vec::with_capacity(count);
    for _ in 0..count {
        usage.shuffle(rng);
        // tri stable : le mélange départage les ex aequo
        usage.sort_by_key(|&(_, used)| used);
        let grid: SymbolSet = usage[..size].iter().map(|&(n, _)| n).collect();
        for (_, used) in usage.iter_mut().take(size) {
            *used += 1;
        }
        grids.push(grid);
    }
    log::debug!("{} grilles développées depuis {} numéros", grids.len(), base_set.len());
    Ok(grids)
}

/// Numéros de la base absents de toutes les grilles.
pub fn uncovered(base: &SymbolSet, grids: &[SymbolSet]) -> SymbolSet {
    let used = grids.iter().fold(SymbolSet::empty(), |acc, g| acc.union(g));
    base.difference(&used)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn run(base: &[u8], count: usize, seed: u64) -> Result<Vec<SymbolSet>> {
        wheel(base, 15, count, &Universe::lotofacil(), &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_sixteen_numbers_enumerates_all() {
        let base: Vec<u8> = (1..=16).collect();
        let grids = run(&base, 3, 1).unwrap();
        assert_eq!(grids.len(), 16);
        assert_eq!(grids[0].to_vec(), (1..=15).collect::<Vec<u8>>());
        assert_eq!(grids[15].to_vec(), (2..=16).collect::<Vec<u8>>());
        let base_set: SymbolSet = base.iter().copied().collect();
        for g in &grids {
            assert_eq!(g.len(), 15);
            assert!(g.is_subset(&base_set));
        }
        let mut distinct = grids.clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), 16);
    }

    #[test]
    fn test_fifteen_numbers_single_grid() {
        let base: Vec<u8> = (5..=19).collect();
        let grids = run(&base, 10, 1).unwrap();
        assert_eq!(grids, vec![base.iter().copied().collect::<SymbolSet>()]);
    }

    #[test]
    fn test_base_too_small() {
        let base: Vec<u8> = (1..=14).collect();
        assert!(matches!(run(&base, 5, 1), Err(EngineError::InvalidRequest { .. })));
    }

    #[test]
    fn test_invalid_base_rejected() {
        let mut base: Vec<u8> = (1..=16).collect();
        base.push(1);
        assert!(run(&base, 5, 1).is_err());
        assert!(matches!(
            run(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 30], 5, 1),
            Err(EngineError::SymbolOutOfRange { symbol: 30, .. })
        ));
    }

    #[test]
    fn test_rotation_balances_usage() {
        // 8 grilles × 15 = 120 = 20 numéros × 6
        let base: Vec<u8> = (1..=20).collect();
        let grids = run(&base, 8, 42).unwrap();
        assert_eq!(grids.len(), 8);
        for n in 1..=20u8 {
            let used = grids.iter().filter(|g| g.contains(n)).count();
            assert_eq!(used, 6, "numéro {} utilisé {} fois", n, used);
        }
    }

    #[test]
    fn test_two_grids_cover_twenty_numbers() {
        let base: Vec<u8> = (3..=22).collect();
        let grids = run(&base, 2, 9).unwrap();
        let base_set: SymbolSet = base.iter().copied().collect();
        assert!(uncovered(&base_set, &grids).is_empty());
        assert_eq!(uncovered(&base_set, &grids[..1]).len(), 5);
    }

    #[test]
    fn test_rotation_deterministic_for_seed() {
        let base: Vec<u8> = (1..=18).collect();
        assert_eq!(run(&base, 6, 3).unwrap(), run(&base, 6, 3).unwrap());
    }

    #[test]
    fn test_zero_count_rejected_for_large_base() {
        let base: Vec<u8> = (1..=18).collect();
        assert!(run(&base, 0, 1).is_err());
    }
}
