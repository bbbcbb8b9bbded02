use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Nombre de numéros dans l'univers Lotofácil (1-25).
pub const UNIVERSE_SIZE: u8 = 25;
/// Nombre de numéros tirés par concours.
pub const DRAW_SIZE: usize = 15;
/// Largeur de la grille du volant (5×5, ligne par ligne).
pub const GRID_WIDTH: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draw {
    pub contest: u32,
    pub date: String,
    pub numbers: [u8; DRAW_SIZE],
}

impl Draw {
    pub fn new(contest: u32, date: impl Into<String>, mut numbers: [u8; DRAW_SIZE]) -> Self {
        numbers.sort();
        Self {
            contest,
            date: date.into(),
            numbers,
        }
    }
}

/// Métriques d'équilibre d'une grille. `overlap_with_reference` n'existe
/// que si un tirage de référence a été fourni.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceMetrics {
    pub odd_count: u8,
    pub prime_count: u8,
    pub frame_count: u8,
    pub fibonacci_count: u8,
    pub sum: u32,
    pub overlap_with_reference: Option<u8>,
}

/// État des deux règles dures après la boucle de réparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub attempts: u32,
    pub novel: bool,
    pub overlap_in_band: bool,
}

impl RepairReport {
    pub fn is_compliant(&self) -> bool {
        self.novel && self.overlap_in_band
    }
}

impl Default for RepairReport {
    fn default() -> Self {
        Self {
            attempts: 0,
            novel: true,
            overlap_in_band: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub numbers: Vec<u8>,
    pub score: i32,
    pub metrics: BalanceMetrics,
    /// Indice heuristique 0-100 destiné à l'affichage, pas une probabilité.
    pub confidence: f64,
    pub repair: RepairReport,
}

/// Grille enregistrée pour un concours futur.
#[derive(Debug, Clone)]
pub struct GuessRecord {
    pub id: i64,
    pub created_at: String,
    pub target_contest: u32,
    pub candidate: Candidate,
    pub hits: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct NumberStats {
    pub number: u8,
    pub frequency: u32,
    pub gap: u32,
}

/// Vérifie une grille : taille attendue, numéros dans 1-25, pas de doublons.
pub fn validate_numbers(numbers: &[u8], expected_len: usize) -> Result<()> {
    if numbers.len() != expected_len {
        bail!("Attendu {} numéros, reçu {}", expected_len, numbers.len());
    }
    for &n in numbers {
        if n < 1 || n > UNIVERSE_SIZE {
            bail!("Numéro {} hors limites (1-{})", n, UNIVERSE_SIZE);
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Numéro en double : {}", numbers[i]);
            }
        }
    }
    Ok(())
}

pub fn validate_draw(numbers: &[u8]) -> Result<()> {
    validate_numbers(numbers, DRAW_SIZE)
}

/// Convertit une liste validée de 15 numéros en tableau trié.
pub fn to_draw_numbers(numbers: &[u8]) -> Result<[u8; DRAW_SIZE]> {
    validate_draw(numbers)?;
    let mut arr = [0u8; DRAW_SIZE];
    arr.copy_from_slice(numbers);
    arr.sort();
    Ok(arr)
}

/// Format d'affichage et de stockage : "01 02 03 ...".
pub fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:02}", n))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_numbers(s: &str) -> Result<Vec<u8>> {
    s.split(|c: char| c.is_whitespace() || c == ',' || c == '-')
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<u8>()
                .map_err(|e| anyhow::anyhow!("Numéro invalide '{}': {}", t, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_draw_ok() {
        assert!(validate_draw(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]).is_ok());
        assert!(validate_draw(&[25, 24, 23, 22, 21, 20, 19, 18, 17, 16, 15, 14, 13, 12, 11]).is_ok());
    }

    #[test]
    fn test_validate_draw_out_of_range() {
        assert!(validate_draw(&[0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]).is_err());
        assert!(validate_draw(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 26]).is_err());
    }

    #[test]
    fn test_validate_draw_duplicate() {
        assert!(validate_draw(&[1, 1, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]).is_err());
    }

    #[test]
    fn test_validate_draw_wrong_size() {
        assert!(validate_draw(&[1, 2, 3]).is_err());
        assert!(validate_numbers(&[1, 2, 3], 3).is_ok());
    }

    #[test]
    fn test_to_draw_numbers_sorted() {
        let arr = to_draw_numbers(&[15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1]).unwrap();
        assert_eq!(arr, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn test_format_and_parse_numbers() {
        assert_eq!(format_numbers(&[1, 12, 25]), "01 12 25");
        assert_eq!(parse_numbers("01 12 25").unwrap(), vec![1, 12, 25]);
        assert_eq!(parse_numbers("3,4-5").unwrap(), vec![3, 4, 5]);
        assert!(parse_numbers("3 x").is_err());
    }

    #[test]
    fn test_repair_report_compliance() {
        assert!(RepairReport::default().is_compliant());
        let report = RepairReport { attempts: 10, novel: true, overlap_in_band: false };
        assert!(!report.is_compliant());
    }
}
