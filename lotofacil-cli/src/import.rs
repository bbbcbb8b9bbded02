use anyhow::{Context, Result, bail};
use lotofacil_db::rusqlite::Connection;
use serde::Deserialize;
use std::path::Path;

use lotofacil_db::db::insert_draw;
use lotofacil_db::models::{DRAW_SIZE, Draw, to_draw_numbers};

/// Format JSON historique : `[{"rodada": 1, "data": "2003-09-29", "numeros": [...]}]`.
#[derive(Debug, Deserialize)]
struct RawDraw {
    rodada: u32,
    data: String,
    numeros: Vec<u8>,
}

fn parse_raw(raw: RawDraw) -> Result<Draw> {
    let date = parse_date(&raw.data)?;
    let numbers = to_draw_numbers(&raw.numeros)
        .with_context(|| format!("Concours {} invalide", raw.rodada))?;
    Ok(Draw::new(raw.rodada, date, numbers))
}

fn parse_record(record: &csv::StringRecord) -> Result<Draw> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let contest_str = get(0)?;
    let contest: u32 = contest_str
        .parse()
        .with_context(|| format!("Numéro de concours invalide: '{}'", contest_str))?;
    let date = parse_date(&get(1)?)?;

    let mut numbers = Vec::with_capacity(DRAW_SIZE);
    for idx in 2..2 + DRAW_SIZE {
        let s = get(idx)?;
        let n = s
            .parse::<u8>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))?;
        numbers.push(n);
    }

    Ok(Draw::new(contest, date, to_draw_numbers(&numbers)?))
}

/// Accepte `JJ/MM/AAAA` ou `AAAA-MM-JJ`, renvoie toujours `AAAA-MM-JJ`.
fn parse_date(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.contains('-') {
        let parts: Vec<&str> = raw.split('-').collect();
        if parts.len() == 3 && parts[0].len() == 4 {
            return Ok(raw.to_string());
        }
        bail!("Format de date invalide: '{}'", raw);
    }
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 {
        bail!("Format de date invalide: '{}'", raw);
    }
    Ok(format!("{}-{}-{}", parts[2], parts[1], parts[0]))
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

impl ImportResult {
    fn record(&mut self, conn: &Connection, parsed: Result<Draw>) {
        self.total_records += 1;
        match parsed {
            Ok(draw) => match insert_draw(conn, &draw) {
                Ok(true) => self.inserted += 1,
                Ok(false) => self.skipped += 1,
                Err(e) => {
                    log::warn!("Erreur insertion tirage {}: {}", draw.contest, e);
                    self.errors += 1;
                }
            },
            Err(e) => {
                log::warn!("Ligne {} ignorée: {:#}", self.total_records, e);
                self.errors += 1;
            }
        }
    }
}

/// Importe un fichier `.json` ou un CSV séparé par `;`.
pub fn import_file(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json { import_json(conn, path) } else { import_csv(conn, path) }
}

pub fn import_json(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    let raws: Vec<RawDraw> = serde_json::from_str(&json)
        .with_context(|| format!("JSON invalide dans {:?}", path))?;

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();
    for raw in raws {
        result.record(&tx, parse_raw(raw));
    }

    tx.commit().context("Échec du commit")?;
    log::info!("{} tirages importés depuis {:?}", result.inserted, path);
    Ok(result)
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();
    for record_result in reader.records() {
        let parsed = record_result
            .context("Erreur de lecture")
            .and_then(|record| parse_record(&record));
        result.record(&tx, parsed);
    }

    tx.commit().context("Échec du commit")?;
    log::info!("{} tirages importés depuis {:?}", result.inserted, path);
    Ok(result)
}
