// ============================================================
//  display.rs - Output vizual în consolă (Modern CLI UX)
// ============================================================
//
//  Concepte Rust demonstrate aici:
//  - Funcții libere (nu sunt metode ale unui struct)
//  - Trăsătura Display implementată prin crate-ul `colored`
//  - Specificatori de format cu lățime: `{:<10}`, `{:>9.2}`
// ============================================================

use crate::cache::ResolveStats;
use crate::model::{Report, CLASS_NAMES};
use chrono::Local;
use colored::{ColoredString, Colorize};

// Lățimea separatorului orizontal (în caractere)
const SEPARATOR_WIDTH: usize = 70;

const BANNER_LINES: [&str; 2] = [
    "CYBER THREAT ANALYZER  v0.1.0",
    "Syslog  |  AbuseIPDB  |  Decision Tree",
];

pub fn print_banner() {
    let inner = SEPARATOR_WIDTH - 2;
    println!();
    println!("{}", format!("╔{}╗", "═".repeat(inner)).bold().cyan());
    for line in BANNER_LINES {
        println!("{}", format!("║{:^inner$}║", line).bold().cyan());
    }
    println!("{}", format!("╚{}╝", "═".repeat(inner)).bold().cyan());
    println!();
}

pub fn print_separator() {
    println!("{}", "─".repeat(SEPARATOR_WIDTH).dimmed());
}

// Toate mesajele de stare au aceeași formă: [timestamp] ETICHETĂ mesaj
fn status_line(tag: ColoredString, msg: ColoredString) -> String {
    format!("{} {} {}", timestamp().bold().white(), tag, msg)
}

pub fn log_info(msg: &str) {
    println!("{}", status_line(" INFO ".on_green().black().bold(), msg.white()));
}

/// Situații degradate din care rularea își revine (export eșuat, model neantrenat)
pub fn log_warn(msg: &str) {
    println!("{}", status_line(" WARN ".on_yellow().black().bold(), msg.yellow()));
}

/// Eroarea fatală cu care se oprește rularea; merge pe stderr, cu tot lanțul
/// de context formatat de `{:#}` în main.
pub fn log_error(msg: &str) {
    eprintln!("{}", status_line(" FATAL ".on_red().white().bold(), msg.red().bold()));
}

/// Rezumatul rezolvării cache-ului: hit-uri, interogări noi, eșecuri
pub fn log_cache_summary(stats: &ResolveStats, cache_size: usize) {
    let ts = timestamp();
    println!(
        "{} {} {} din cache, {} interogate, {} eșuate (sentinelă) | {} intrări în cache",
        ts.dimmed(),
        "[CACHE]".cyan(),
        format!("{}", stats.hits).bold().cyan(),
        format!("{}", stats.queried).bold().cyan(),
        if stats.failed > 0 {
            format!("{}", stats.failed).bold().yellow()
        } else {
            format!("{}", stats.failed).bold().cyan()
        },
        cache_size
    );
}

// ---------------------------------------------------------------------------
// Raportul final: metrici per clasă + matricea de confuzie lizibilă
// ---------------------------------------------------------------------------
pub fn print_report(model_name: &str, report: &Report) {
    println!();
    println!("{}", "═".repeat(SEPARATOR_WIDTH).bold().cyan());
    println!("{}", " RAPORT FINAL DE SEMNAL ".on_cyan().black().bold());
    println!(
        "Modelul '{}' evaluat pe {} rânduri de test.",
        model_name.bold(),
        report.total
    );
    println!();

    println!(
        "{:<14} {:>10} {:>10} {:>10} {:>10}",
        "", "precision", "recall", "f1-score", "support"
    );
    for (name, m) in CLASS_NAMES.iter().zip(report.classes.iter()) {
        println!(
            "{:<14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
            name, m.precision, m.recall, m.f1, m.support
        );
    }
    println!();
    println!(
        "{:<14} {:>10} {:>10} {:>10.2} {:>10}",
        "accuracy", "", "", report.accuracy, report.total
    );

    let cm = &report.confusion;
    println!();
    println!("{}", "--- Matricea de confuzie ---".bold());
    println!("                    PREZIS");
    println!("                    Noise (0)   Signal (1)");
    println!("REAL Noise (0)      {:<10}  {:<10}", cm[0][0], cm[0][1]);
    println!(
        "REAL Signal (1)     {:<10}  {:<10}",
        cm[1][0],
        format!("{}", cm[1][1]).green().bold()
    );
    println!("{}", "═".repeat(SEPARATOR_WIDTH).bold().cyan());
    println!();
}

fn timestamp() -> String {
    Local::now().format("[%Y-%m-%d %H:%M:%S]").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_keeps_tag_and_message() {
        colored::control::set_override(false);
        let line = status_line(" FATAL ".red(), "cache corupt".normal());

        assert!(line.starts_with('['));
        assert!(line.ends_with(" FATAL  cache corupt"));
    }
}
