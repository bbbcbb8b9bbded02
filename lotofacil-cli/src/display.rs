use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};

use crate::import::ImportResult;
use lotofacil_db::models::{BalanceMetrics, Candidate, Draw, GuessRecord, NumberStats, format_numbers};
use lotofacil_engine::backtest::{PRIZES, QuickBacktest, SimulationRow, SimulationSummary, TICKET_COST};
use lotofacil_engine::guard::Novelty;
use lotofacil_engine::risk::{Risk, risks};
use lotofacil_engine::stats::{Affinity, CycleState};
use lotofacil_engine::symbols::{SymbolSet, Universe};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn yes_no(ok: bool) -> Cell {
    if ok {
        Cell::new("oui").fg(Color::Green)
    } else {
        Cell::new("non").fg(Color::Red)
    }
}

fn overlap_str(metrics: &BalanceMetrics) -> String {
    metrics
        .overlap_with_reference
        .map(|o| o.to_string())
        .unwrap_or_else(|| "—".to_string())
}

fn risk_cell(found: &[Risk]) -> Cell {
    if found.is_empty() {
        Cell::new("0").fg(Color::Green)
    } else {
        Cell::new(found.len()).fg(Color::Red)
    }
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Concours", "Date", "Numéros"]);
    for draw in draws {
        table.add_row(vec![
            &draw.contest.to_string(),
            &draw.date,
            &format_numbers(&draw.numbers),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

pub fn display_stats(stats: &[NumberStats], window: u32, cycle: &CycleState) {
    println!("\n📊 Statistiques sur les {} derniers tirages\n", window);

    let mut table = new_table(vec!["Numéro", "Fréquence", "Retard"]);
    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency));

    for stat in &sorted {
        table.add_row(vec![
            &format!("{:2}", stat.number),
            &stat.frequency.to_string(),
            &stat.gap.to_string(),
        ]);
    }
    println!("{table}");

    println!("\n── Cycle en cours ──");
    println!("  Cycles complets   : {}", cycle.completed_cycles);
    println!("  Tirages du cycle  : {}", cycle.draws_in_cycle);
    println!("  Progression       : {:.0}%", cycle.progress);
    if cycle.missing.is_empty() {
        println!("  Manquants         : aucun");
    } else {
        println!("  Manquants         : {}", format_numbers(&cycle.missing));
    }
}

pub fn display_affinities(selected: &[u8], affinities: &[Affinity]) {
    println!("\n🔗 Affinités de {}\n", format_numbers(selected));
    if affinities.is_empty() {
        println!("Aucun tirage ne contient cette sélection.");
        return;
    }
    let mut table = new_table(vec!["Numéro", "Tirages communs", "%"]);
    for a in affinities {
        table.add_row(vec![
            format!("{:2}", a.number),
            a.count.to_string(),
            format!("{:.1}%", a.percent),
        ]);
    }
    println!("{table}");
}

pub fn display_candidates(candidates: &[Candidate], universe: &Universe, pool_size: usize, seed: u64) {
    println!(
        "\n🎲 {} grilles retenues sur un pool de {} (seed {})\n",
        candidates.len(),
        pool_size,
        seed
    );

    let mut table = new_table(vec![
        "#", "Numéros", "Score", "Impairs", "Premiers", "Moldura", "Fibo", "Somme", "Répétés", "Confiance", "Conforme",
        "Alertes",
    ]);

    for (i, c) in candidates.iter().enumerate() {
        let m = &c.metrics;
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format_numbers(&c.numbers)),
            Cell::new(c.score),
            Cell::new(m.odd_count),
            Cell::new(m.prime_count),
            Cell::new(m.frame_count),
            Cell::new(m.fibonacci_count),
            Cell::new(m.sum),
            Cell::new(overlap_str(m)),
            Cell::new(format!("{:.1}%", c.confidence)),
            yes_no(c.repair.is_compliant()),
            risk_cell(&risks(&c.numbers.iter().copied().collect::<SymbolSet>(), universe)),
        ]);
    }
    println!("{table}");
}

pub fn display_check(
    numbers: &[u8],
    score: i32,
    metrics: &BalanceMetrics,
    novelty: Novelty,
    found: &[Risk],
    backtest: &QuickBacktest,
) {
    println!("\n🔍 Analyse de la grille {}\n", format_numbers(numbers));

    let mut table = new_table(vec!["Critère", "Valeur"]);
    table.add_row(vec![Cell::new("Score"), Cell::new(score)]);
    table.add_row(vec![Cell::new("Impairs"), Cell::new(metrics.odd_count)]);
    table.add_row(vec![Cell::new("Premiers"), Cell::new(metrics.prime_count)]);
    table.add_row(vec![Cell::new("Moldura"), Cell::new(metrics.frame_count)]);
    table.add_row(vec![Cell::new("Fibonacci"), Cell::new(metrics.fibonacci_count)]);
    table.add_row(vec![Cell::new("Somme"), Cell::new(metrics.sum)]);
    table.add_row(vec![Cell::new("Répétés du dernier tirage"), Cell::new(overlap_str(metrics))]);
    let novelty_cell = match novelty {
        Novelty::SeenIn(contest) => Cell::new(format!("déjà sortie (concours {contest})")).fg(Color::Red),
        Novelty::Novel => Cell::new("inédite").fg(Color::Green),
        Novelty::NotApplicable => Cell::new("—"),
    };
    table.add_row(vec![Cell::new("Historique"), novelty_cell]);
    println!("{table}");

    if found.is_empty() {
        println!("\nAucune anomalie extrême détectée.");
    } else {
        println!("\n── Alertes ──");
        for risk in found {
            println!("  ⚠️  {risk}");
        }
    }

    println!("\n── Rejeu sur {} tirages ──", backtest.draws_tested);
    let mut table = new_table(vec!["Points", "Tirages", "Gain unitaire"]);
    for ((hits, prize), count) in PRIZES.iter().zip(backtest.tier_counts) {
        table.add_row(vec![hits.to_string(), count.to_string(), format!("R$ {:.2}", prize)]);
    }
    println!("{table}");
    println!("  Gains estimés : R$ {:.2}", backtest.total_prize);
    println!("  Coût          : R$ {:.2}", backtest.total_cost);
    let color = if backtest.roi >= 0.0 { Color::Green } else { Color::Red };
    let mut roi = Table::new();
    roi.load_preset(UTF8_FULL)
        .add_row(vec![Cell::new("ROI"), Cell::new(format!("{:+.1}%", backtest.roi)).fg(color)]);
    println!("{roi}");
}

pub fn display_simulation(rows: &[SimulationRow], summary: &SimulationSummary) {
    if rows.is_empty() {
        println!("Pas assez de tirages pour une simulation.");
        return;
    }

    let mut table = new_table(vec!["Concours", "Grille moteur", "Points moteur", "Points hasard"]);
    for row in rows {
        let color = if row.engine_hits >= 11 { Color::Green } else { Color::White };
        table.add_row(vec![
            Cell::new(row.contest),
            Cell::new(format_numbers(&row.engine_numbers)),
            Cell::new(row.engine_hits).fg(color),
            Cell::new(row.random_hits),
        ]);
    }
    println!("{table}");

    println!("\n── Bilan sur {} concours ──", summary.tests);
    println!("  Moyenne moteur  : {:.2} points", summary.engine_mean_hits);
    println!("  Moyenne hasard  : {:.2} points", summary.random_mean_hits);
    println!("  Meilleur moteur : {} points", summary.engine_best);
    println!("  Gains moteur    : R$ {:.2}", summary.engine_prize);
    println!("  Gains hasard    : R$ {:.2}", summary.random_prize);
    println!("  Coût            : R$ {:.2}", summary.cost);
    println!("  Bilan moteur    : R$ {:+.2}", summary.engine_profit);
}

pub fn display_guesses(guesses: &[GuessRecord]) {
    if guesses.is_empty() {
        println!("Aucune grille vérifiée.");
        return;
    }

    let mut table = new_table(vec!["Concours", "Grille", "Score", "Points"]);
    for g in guesses {
        let hits = g.hits.map(|h| h.to_string()).unwrap_or_else(|| "en attente".to_string());
        table.add_row(vec![
            Cell::new(g.target_contest),
            Cell::new(format_numbers(&g.candidate.numbers)),
            Cell::new(g.candidate.score),
            Cell::new(hits),
        ]);
    }
    println!("{table}");
}

pub fn display_wheel(base: &SymbolSet, grids: &[(SymbolSet, i32, Vec<Risk>)], uncovered: &SymbolSet) {
    println!(
        "\n🔢 {} grilles développées depuis {} numéros ({})\n",
        grids.len(),
        base.len(),
        format_numbers(&base.to_vec())
    );

    let mut table = new_table(vec!["#", "Numéros", "Score", "Alertes"]);
    for (i, (grid, score, found)) in grids.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format_numbers(&grid.to_vec())),
            Cell::new(score),
            risk_cell(found),
        ]);
    }
    println!("{table}");

    println!("  Coût total : R$ {:.2}", grids.len() as f64 * TICKET_COST);
    if uncovered.is_empty() {
        println!("  Tous les numéros de la base sont couverts.");
    } else {
        println!(
            "  Numéros jamais joués : {} (augmentez le nombre de grilles)",
            format_numbers(&uncovered.to_vec())
        );
    }
}
