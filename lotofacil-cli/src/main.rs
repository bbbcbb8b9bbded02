mod display;
mod import;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;

use lotofacil_db::db::{
    count_draws, db_path, fetch_draw, fetch_guesses, fetch_history, fetch_last_draws, fetch_pending_guesses, insert_draw,
    insert_guess, last_contest, migrate, open_db, record_hits,
};
use lotofacil_db::models::{DRAW_SIZE, Draw, parse_numbers, to_draw_numbers, validate_draw};
use lotofacil_db::rusqlite::Connection;
use lotofacil_engine::backtest::{quick_backtest, simulate_contest, simulation_range, summarize};
use lotofacil_engine::config::{EngineConfig, load_config, save_config};
use lotofacil_engine::generator::{GenerationRequest, date_seed, generate};
use lotofacil_engine::guard::UniquenessGuard;
use lotofacil_engine::risk::risks;
use lotofacil_engine::rubric::BalanceRubric;
use lotofacil_engine::selector::SelectionPolicy;
use lotofacil_engine::signals::fuse;
use lotofacil_engine::stats::{affinities, compute_stats, cycle_state, recent_window};
use lotofacil_engine::symbols::{SymbolSet, Universe};
use lotofacil_engine::wheel::{uncovered, wheel};
use crate::display::{
    display_affinities, display_candidates, display_check, display_draws, display_guesses,
    display_import_summary, display_simulation, display_stats, display_wheel,
};

#[derive(Parser)]
#[command(name = "lotofacil", about = "Générateur de grilles Lotofácil équilibrées")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages (JSON ou CSV séparé par ';')
    Import {
        /// Chemin vers le fichier de tirages
        #[arg(short, long, default_value = "data/rodadas.json")]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Afficher les statistiques (fréquences, retards, cycle)
    Stats {
        /// Fenêtre d'analyse (nombre de tirages)
        #[arg(short, long, default_value = "100")]
        window: u32,

        /// Numéros (1 à 4) dont on veut les affinités, ex: "5,13"
        #[arg(long)]
        with: Option<String>,
    },

    /// Générer des grilles
    Generate {
        /// Nombre de grilles
        #[arg(short, long, default_value = "10")]
        count: usize,

        /// Taille des grilles
        #[arg(short, long, default_value = "15")]
        size: usize,

        /// Numéros imposés, ex: "1,2"
        #[arg(long)]
        forced: Option<String>,

        /// Numéros exclus, ex: "24,25"
        #[arg(long)]
        excluded: Option<String>,

        /// Seed pour la reproductibilité (défaut : date du jour)
        #[arg(long)]
        seed: Option<u64>,

        /// Politique de sélection
        #[arg(short, long)]
        policy: Option<SelectionPolicy>,

        /// Fenêtre de fréquence récente
        #[arg(short, long)]
        window: Option<usize>,

        /// Fichier de configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Enregistrer les grilles pour le prochain concours
        #[arg(long)]
        save: bool,
    },

    /// Analyser une grille de 15 numéros
    Check {
        /// Les 15 numéros
        #[arg(num_args = 15, required = true)]
        numbers: Vec<u8>,
    },

    /// Développer une base de 16 numéros ou plus en grilles de 15
    Wheel {
        /// Numéros de base, ex: "1,2,3,...,18"
        numbers: String,

        /// Nombre de grilles (ignoré pour 16 numéros : toutes les combinaisons)
        #[arg(short, long, default_value = "10")]
        count: usize,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Simulation glissante sur les derniers concours
    Backtest {
        /// Nombre de concours rejoués
        #[arg(short, long, default_value = "20")]
        tests: usize,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Vérifier les grilles enregistrées dont le tirage est connu
    Verify {
        /// Afficher toutes les grilles d'un concours plutôt que les seules nouvelles vérifiées
        #[arg(short, long)]
        contest: Option<u32>,
    },

    /// Écrire la configuration par défaut
    Config {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ajouter un tirage manuellement
    Add,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Stats { window, with } => cmd_stats(&conn, window, with.as_deref()),
        Command::Generate {
            count,
            size,
            forced,
            excluded,
            seed,
            policy,
            window,
            config,
            save,
        } => {
            let mut engine_config = resolve_config(config.as_deref())?;
            if let Some(policy) = policy {
                engine_config.selection.policy = policy;
            }
            if let Some(window) = window {
                engine_config.signals.frequency_window = window;
            }
            let mut request = GenerationRequest::new(count);
            request.target_size = size;
            request.forced = parse_optional(forced.as_deref())?;
            request.excluded = parse_optional(excluded.as_deref())?;
            cmd_generate(&conn, &request, &engine_config, seed, save)
        }
        Command::Check { numbers } => cmd_check(&conn, &numbers),
        Command::Wheel { numbers, count, seed } => cmd_wheel(&conn, &numbers, count, seed),
        Command::Backtest { tests, seed, config } => {
            let engine_config = resolve_config(config.as_deref())?;
            cmd_backtest(&conn, tests, &engine_config, seed)
        }
        Command::Verify { contest } => cmd_verify(&conn, contest),
        Command::Config { output } => {
            let output = output.unwrap_or_else(default_config_path);
            save_config(&EngineConfig::default(), &output)?;
            println!("Configuration par défaut écrite dans {}", output.display());
            Ok(())
        }
        Command::Add => cmd_add(&conn),
    }
}

fn default_config_path() -> PathBuf {
    db_path().with_file_name("engine.json")
}

/// Fichier explicite, sinon `data/engine.json` s'il existe, sinon les valeurs par défaut.
fn resolve_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => load_config(p),
        None => {
            let default = default_config_path();
            if default.exists() {
                load_config(&default)
            } else {
                Ok(EngineConfig::default())
            }
        }
    }
}

fn parse_optional(raw: Option<&str>) -> Result<Vec<u8>> {
    raw.map(parse_numbers).transpose().map(Option::unwrap_or_default)
}

/// Historique complet, ou `None` (avec message) si la base est vide.
fn load_history(conn: &Connection) -> Result<Option<Vec<Draw>>> {
    if count_draws(conn)? == 0 {
        println!("Base vide. Lancez d'abord : lotofacil import");
        return Ok(None);
    }
    Ok(Some(fetch_history(conn)?))
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    let result = import::import_file(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    let n = count_draws(conn)?;
    if n == 0 {
        println!("Base vide. Lancez d'abord : lotofacil import");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_stats(conn: &Connection, window: u32, with: Option<&str>) -> Result<()> {
    let Some(history) = load_history(conn)? else {
        return Ok(());
    };
    let universe = Universe::lotofacil();
    let recent = recent_window(&history, window as usize);

    let stats = compute_stats(recent, &universe);
    let cycle = cycle_state(&history, &universe);
    display_stats(&stats, recent.len() as u32, &cycle);

    if let Some(raw) = with {
        let selected = parse_numbers(raw)?;
        let top = affinities(&history, &universe, &selected)?;
        display_affinities(&selected, &top);
    }
    Ok(())
}

fn cmd_generate(
    conn: &Connection,
    request: &GenerationRequest,
    config: &EngineConfig,
    seed: Option<u64>,
    save: bool,
) -> Result<()> {
    let Some(history) = load_history(conn)? else {
        return Ok(());
    };

    let seed = seed.unwrap_or_else(date_seed);
    let probabilities = fuse(&history, request.universe.size(), &config.signals);
    let mut rng = StdRng::seed_from_u64(seed);
    let generation = generate(request, &probabilities, &history, config, &mut rng)?;

    display_candidates(&generation.selected, &request.universe, generation.pool_size, seed);

    if save {
        let target = last_contest(conn)?.map_or(1, |c| c + 1);
        for candidate in &generation.selected {
            insert_guess(conn, target, candidate)?;
        }
        println!("{} grilles enregistrées pour le concours {}.", generation.selected.len(), target);
    }
    Ok(())
}

fn cmd_check(conn: &Connection, numbers: &[u8]) -> Result<()> {
    validate_draw(numbers)?;
    let mut sorted = numbers.to_vec();
    sorted.sort();

    let history = fetch_history(conn)?;
    let universe = Universe::lotofacil();
    let config = resolve_config(None)?;
    let rubric = BalanceRubric::new(universe, sorted.len(), config.rubric);
    let reference = history.last().map(|d| d.numbers.as_slice());
    let (score, metrics) = rubric.score_numbers(&sorted, reference)?;

    let set = SymbolSet::from_numbers(&sorted, &universe)?;
    let novelty = UniquenessGuard::new(&history).check(&set);
    let found = risks(&set, &universe);
    let backtest = quick_backtest(&history, &sorted)?;

    display_check(&sorted, score, &metrics, novelty, &found, &backtest);
    Ok(())
}

fn cmd_wheel(conn: &Connection, raw: &str, count: usize, seed: Option<u64>) -> Result<()> {
    let base = parse_numbers(raw)?;
    let universe = Universe::lotofacil();
    let seed = seed.unwrap_or_else(date_seed);
    let grids = wheel(&base, DRAW_SIZE, count, &universe, &mut StdRng::seed_from_u64(seed))?;

    let history = fetch_history(conn)?;
    let reference = history
        .last()
        .map(|d| SymbolSet::from_numbers(&d.numbers, &universe))
        .transpose()?;
    let rubric = BalanceRubric::new(universe, DRAW_SIZE, resolve_config(None)?.rubric);

    let mut rows = Vec::with_capacity(grids.len());
    for grid in &grids {
        let (score, _) = rubric.score(grid, reference.as_ref())?;
        rows.push((*grid, score, risks(grid, &universe)));
    }

    let base_set = SymbolSet::from_numbers(&base, &universe)?;
    display_wheel(&base_set, &rows, &uncovered(&base_set, &grids));
    Ok(())
}

fn cmd_backtest(conn: &Connection, tests: usize, config: &EngineConfig, seed: Option<u64>) -> Result<()> {
    let Some(history) = load_history(conn)? else {
        return Ok(());
    };
    let seed = seed.unwrap_or_else(date_seed);
    let range = simulation_range(&history, tests);

    println!("Simulation sur {} concours (seed {})...", range.len(), seed);

    let pb = ProgressBar::new(range.len() as u64);
    pb.set_style(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
        .progress_chars("=> "));

    let mut rows = Vec::with_capacity(range.len());
    for index in range {
        pb.set_message(format!("concours {}", history[index].contest));
        rows.push(simulate_contest(&history, index, config, seed)?);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let summary = summarize(&rows);
    display_simulation(&rows, &summary);
    Ok(())
}

fn cmd_verify(conn: &Connection, contest: Option<u32>) -> Result<()> {
    let pending = fetch_pending_guesses(conn)?;
    let mut verified = Vec::new();

    for mut guess in pending {
        let Some(draw) = fetch_draw(conn, guess.target_contest)? else {
            continue;
        };
        let hits = guess
            .candidate
            .numbers
            .iter()
            .filter(|n| draw.numbers.contains(n))
            .count() as u8;
        record_hits(conn, guess.id, hits)?;
        guess.hits = Some(hits);
        verified.push(guess);
    }

    match contest {
        Some(contest) => display_guesses(&fetch_guesses(conn, contest)?),
        None => display_guesses(&verified),
    }
    Ok(())
}

fn cmd_add(conn: &Connection) -> Result<()> {
    println!("Ajout d'un tirage manuellement\n");

    let contest: u32 = prompt("Numéro du concours (ex: 3200) : ")?
        .parse()
        .context("Numéro de concours invalide")?;
    let raw_date = prompt("Date (JJ/MM/AAAA) : ")?;

    let date_parts: Vec<&str> = raw_date.split('/').collect();
    if date_parts.len() != 3 {
        bail!("Format de date invalide");
    }
    let date = format!("{}-{}-{}", date_parts[2], date_parts[1], date_parts[0]);

    let numbers = prompt_numbers()?;
    let draw = Draw::new(contest, date, numbers);

    println!("\nTirage à insérer :");
    display_draws(std::slice::from_ref(&draw));

    let confirm = prompt("\nConfirmer l'insertion ? (o/n) : ")?;
    if confirm.trim().to_lowercase() == "o" {
        let inserted = insert_draw(conn, &draw)?;
        if inserted {
            println!("Tirage inséré avec succès.");
        } else {
            println!("Ce tirage existe déjà (doublon ignoré).");
        }
    } else {
        println!("Insertion annulée.");
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    Ok(input.trim().to_string())
}

fn prompt_numbers() -> Result<[u8; 15]> {
    loop {
        let input = prompt("15 numéros (séparés par des espaces, 1-25) : ")?;
        match parse_numbers(&input).and_then(|v| to_draw_numbers(&v)) {
            Ok(numbers) => return Ok(numbers),
            Err(e) => println!("{e}. Réessayez."),
        }
    }
}
