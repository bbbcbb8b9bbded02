use std::fmt;

use crate::symbols::{SymbolSet, Universe};

/// Suite de numéros consécutifs à partir de laquelle on alerte.
pub const RUN_WARNING: usize = 5;
/// Suite considérée comme quasi impossible.
pub const RUN_SEVERE: usize = 6;
pub const LATEST_START: u8 = 6;
pub const EARLIEST_FINISH: u8 = 20;
pub const MAX_ODD: usize = 11;
pub const MIN_ODD: usize = 4;
pub const MIN_SUM: u32 = 165;
pub const MAX_SUM: u32 = 235;
pub const MAX_EMPTY_ROWS: usize = 2;

/// Anomalie statistique extrême d'une grille. Contrairement au barème, ces
/// alertes ne modifient pas le score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Risk {
    /// Au moins `RUN_SEVERE` numéros consécutifs.
    VeryLongRun(usize),
    LongRun(usize),
    LateStart(u8),
    EarlyFinish(u8),
    TooManyOdd(usize),
    /// Nombre de pairs.
    TooManyEven(usize),
    LowSum(u32),
    HighSum(u32),
    EmptyRows(usize),
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Risk::VeryLongRun(n) => write!(f, "Suite très longue ({n} numéros consécutifs), rarissime"),
            Risk::LongRun(n) => write!(f, "Suite dangereuse ({n} numéros consécutifs)"),
            Risk::LateStart(n) => write!(f, "Grille qui commence trop tard (numéro {n})"),
            Risk::EarlyFinish(n) => write!(f, "Grille qui finit trop tôt (numéro {n})"),
            Risk::TooManyOdd(n) => write!(f, "Trop d'impairs ({n}), la norme est 7 à 9"),
            Risk::TooManyEven(n) => write!(f, "Trop de pairs ({n}), la norme est 6 à 8"),
            Risk::LowSum(s) => write!(f, "Somme trop basse ({s}), grille concentrée au début"),
            Risk::HighSum(s) => write!(f, "Somme trop haute ({s}), grille concentrée à la fin"),
            Risk::EmptyRows(n) => write!(f, "{n} lignes entières vides sur le volant"),
        }
    }
}

fn longest_run(candidate: &SymbolSet) -> usize {
    let mut best = 0;
    let mut current = 0;
    let mut previous: Option<u8> = None;
    for n in candidate.iter() {
        current = if previous == Some(n - 1) { current + 1 } else { 1 };
        best = best.max(current);
        previous = Some(n);
    }
    best
}

/// Alertes de la grille, dans l'ordre : suites, bornes, parité, somme, lignes vides.
pub fn risks(candidate: &SymbolSet, universe: &Universe) -> Vec<Risk> {
    let (Some(first), Some(last)) = (candidate.iter().next(), candidate.iter().last()) else {
        return Vec::new();
    };
    let mut found = Vec::new();

    let run = longest_run(candidate);
    if run >= RUN_SEVERE {
        found.push(Risk::VeryLongRun(run));
    } else if run >= RUN_WARNING {
        found.push(Risk::LongRun(run));
    }

    if first > LATEST_START {
        found.push(Risk::LateStart(first));
    }
    if last < EARLIEST_FINISH {
        found.push(Risk::EarlyFinish(last));
    }

    let odd = candidate.iter().filter(|n| n % 2 == 1).count();
    if odd >= MAX_ODD {
        found.push(Risk::TooManyOdd(odd));
    } else if odd <= MIN_ODD {
        found.push(Risk::TooManyEven(candidate.len() - odd));
    }

    let sum = candidate.sum();
    if sum < MIN_SUM {
        found.push(Risk::LowSum(sum));
    } else if sum > MAX_SUM {
        found.push(Risk::HighSum(sum));
    }

    let empty_rows = universe
        .rows()
        .iter()
        .filter(|row| row.is_disjoint(candidate))
        .count();
    if empty_rows >= MAX_EMPTY_ROWS {
        found.push(Risk::EmptyRows(empty_rows));
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(numbers: &[u8]) -> Vec<Risk> {
        let universe = Universe::lotofacil();
        let set = SymbolSet::from_numbers(numbers, &universe).unwrap();
        risks(&set, &universe)
    }

    #[test]
    fn test_balanced_grid_has_no_risk() {
        // 6 impairs, somme 186, une case par ligne au moins
        assert!(check(&[1, 2, 4, 5, 7, 8, 10, 12, 14, 16, 18, 20, 21, 23, 25]).is_empty());
    }

    #[test]
    fn test_low_block() {
        let numbers: Vec<u8> = (1..=15).collect();
        assert_eq!(
            check(&numbers),
            vec![Risk::VeryLongRun(15), Risk::EarlyFinish(15), Risk::LowSum(120), Risk::EmptyRows(2)]
        );
    }

    #[test]
    fn test_high_block() {
        let numbers: Vec<u8> = (11..=25).collect();
        assert_eq!(
            check(&numbers),
            vec![Risk::VeryLongRun(15), Risk::LateStart(11), Risk::HighSum(270), Risk::EmptyRows(2)]
        );
    }

    #[test]
    fn test_run_of_five_is_warning() {
        let risks = check(&[1, 2, 3, 4, 5, 7, 9, 11, 13, 15, 17, 19, 21, 23, 25]);
        assert!(risks.contains(&Risk::LongRun(5)));
        assert!(!risks.iter().any(|r| matches!(r, Risk::VeryLongRun(_))));
    }

    #[test]
    fn test_run_of_six_is_severe() {
        let risks = check(&[1, 2, 3, 4, 5, 6, 8, 10, 12, 14, 16, 18, 20, 22, 24]);
        assert!(risks.contains(&Risk::VeryLongRun(6)));
        assert!(!risks.iter().any(|r| matches!(r, Risk::LongRun(_))));
    }

    #[test]
    fn test_late_start_boundary() {
        let ok = check(&[6, 7, 9, 10, 11, 13, 14, 16, 17, 19, 20, 21, 23, 24, 25]);
        assert!(!ok.iter().any(|r| matches!(r, Risk::LateStart(_))));
        let late = check(&[7, 8, 9, 10, 11, 13, 14, 16, 17, 19, 20, 21, 23, 24, 25]);
        assert!(late.contains(&Risk::LateStart(7)));
    }

    #[test]
    fn test_too_many_odd() {
        assert_eq!(
            check(&[1, 3, 5, 7, 9, 10, 11, 13, 15, 16, 17, 19, 21, 23, 25]),
            vec![Risk::TooManyOdd(13)]
        );
    }

    #[test]
    fn test_too_many_even() {
        assert_eq!(
            check(&[1, 2, 4, 6, 8, 10, 12, 13, 14, 16, 18, 20, 22, 24, 25]),
            vec![Risk::TooManyEven(12)]
        );
    }

    #[test]
    fn test_single_empty_row_tolerated() {
        // ligne 6-10 vide, les autres remplies
        let risks = check(&[1, 2, 4, 5, 11, 12, 14, 15, 16, 18, 19, 20, 22, 23, 25]);
        assert!(!risks.iter().any(|r| matches!(r, Risk::EmptyRows(_))));
    }

    #[test]
    fn test_empty_set() {
        assert!(risks(&SymbolSet::empty(), &Universe::lotofacil()).is_empty());
    }

    #[test]
    fn test_display_is_french() {
        assert_eq!(Risk::LowSum(120).to_string(), "Somme trop basse (120), grille concentrée au début");
    }
}
