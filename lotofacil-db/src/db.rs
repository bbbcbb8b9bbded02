use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::models::{Candidate, Draw, GuessRecord, format_numbers, parse_numbers, to_draw_numbers};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    contest   INTEGER PRIMARY KEY,
    date      TEXT NOT NULL,
    numbers   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS guesses (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at      TEXT NOT NULL,
    target_contest  INTEGER NOT NULL,
    numbers         TEXT NOT NULL,
    score           INTEGER NOT NULL,
    confidence      REAL NOT NULL,
    metrics         TEXT NOT NULL,
    repair          TEXT NOT NULL,
    hits            INTEGER
);

CREATE INDEX IF NOT EXISTS idx_guesses_contest ON guesses (target_contest);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lotofacil.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    log::debug!("schéma vérifié");
    Ok(())
}

pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (contest, date, numbers) VALUES (?1, ?2, ?3)",
        rusqlite::params![draw.contest, draw.date, format_numbers(&draw.numbers)],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

fn row_to_draw(contest: u32, date: String, numbers: String) -> rusqlite::Result<Draw> {
    let parsed = parse_numbers(&numbers)
        .and_then(|v| to_draw_numbers(&v))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            e.into(),
        ))?;
    Ok(Draw { contest, date, numbers: parsed })
}

/// Derniers tirages, du plus récent au plus ancien.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(
        "SELECT contest, date, numbers FROM draws ORDER BY contest DESC LIMIT ?1"
    )?;
    let draws = stmt.query_map([limit], |row| {
        row_to_draw(row.get(0)?, row.get(1)?, row.get(2)?)
    })?.collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

/// Historique complet, du plus ancien au plus récent (ordre attendu par le moteur).
pub fn fetch_history(conn: &Connection) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(
        "SELECT contest, date, numbers FROM draws ORDER BY contest ASC"
    )?;
    let draws = stmt.query_map([], |row| {
        row_to_draw(row.get(0)?, row.get(1)?, row.get(2)?)
    })?.collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn fetch_draw(conn: &Connection, contest: u32) -> Result<Option<Draw>> {
    let draw = conn.query_row(
        "SELECT contest, date, numbers FROM draws WHERE contest = ?1",
        [contest],
        |row| row_to_draw(row.get(0)?, row.get(1)?, row.get(2)?),
    ).optional()?;
    Ok(draw)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

pub fn last_contest(conn: &Connection) -> Result<Option<u32>> {
    let last: Option<u32> = conn.query_row("SELECT MAX(contest) FROM draws", [], |row| row.get(0))?;
    Ok(last)
}

pub fn insert_guess(conn: &Connection, target_contest: u32, candidate: &Candidate) -> Result<i64> {
    let metrics = serde_json::to_string(&candidate.metrics)?;
    let repair = serde_json::to_string(&candidate.repair)?;
    conn.execute(
        "INSERT INTO guesses (created_at, target_contest, numbers, score, confidence, metrics, repair)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            chrono::Local::now().to_rfc3339(),
            target_contest,
            format_numbers(&candidate.numbers),
            candidate.score,
            candidate.confidence,
            metrics,
            repair,
        ],
    ).context("Échec de l'enregistrement de la grille")?;
    Ok(conn.last_insert_rowid())
}

struct GuessRow {
    id: i64,
    created_at: String,
    target_contest: u32,
    numbers: String,
    score: i32,
    confidence: f64,
    metrics: String,
    repair: String,
    hits: Option<u8>,
}

impl GuessRow {
    fn into_record(self) -> Result<GuessRecord> {
        let numbers = parse_numbers(&self.numbers)
            .with_context(|| format!("Grille {} illisible", self.id))?;
        let metrics = serde_json::from_str(&self.metrics)
            .with_context(|| format!("Métriques de la grille {} illisibles", self.id))?;
        let repair = serde_json::from_str(&self.repair)
            .with_context(|| format!("Rapport de réparation de la grille {} illisible", self.id))?;
        Ok(GuessRecord {
            id: self.id,
            created_at: self.created_at,
            target_contest: self.target_contest,
            candidate: Candidate {
                numbers,
                score: self.score,
                metrics,
                confidence: self.confidence,
                repair,
            },
            hits: self.hits,
        })
    }
}

fn query_guesses(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<GuessRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok(GuessRow {
            id: row.get(0)?,
            created_at: row.get(1)?,
            target_contest: row.get(2)?,
            numbers: row.get(3)?,
            score: row.get(4)?,
            confidence: row.get(5)?,
            metrics: row.get(6)?,
            repair: row.get(7)?,
            hits: row.get(8)?,
        })
    })?.collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(GuessRow::into_record).collect()
}

const GUESS_COLUMNS: &str =
    "id, created_at, target_contest, numbers, score, confidence, metrics, repair, hits";

pub fn fetch_guesses(conn: &Connection, target_contest: u32) -> Result<Vec<GuessRecord>> {
    let sql = format!("SELECT {GUESS_COLUMNS} FROM guesses WHERE target_contest = ?1 ORDER BY id");
    query_guesses(conn, &sql, [target_contest])
}

/// Grilles dont le résultat n'a pas encore été vérifié.
pub fn fetch_pending_guesses(conn: &Connection) -> Result<Vec<GuessRecord>> {
    let sql = format!("SELECT {GUESS_COLUMNS} FROM guesses WHERE hits IS NULL ORDER BY target_contest, id");
    query_guesses(conn, &sql, rusqlite::params![])
}

pub fn record_hits(conn: &Connection, guess_id: i64, hits: u8) -> Result<()> {
    conn.execute(
        "UPDATE guesses SET hits = ?1 WHERE id = ?2",
        rusqlite::params![hits, guess_id],
    ).context("Échec de la mise à jour des résultats")?;
    Ok(())
}
