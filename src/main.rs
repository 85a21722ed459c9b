// ============================================================
//  main.rs - Punctul de intrare al Cyber Threat Analyzer (CTA)
// ============================================================
//
//  Secvența unei rulări:
//    1. config.toml + cheia API (din .env / mediu)
//    2. citirea fișierului de log
//    3. pipeline: parse -> IP-uri -> cache de reputație -> feature-uri
//    4. (opțional) export JSON al tabelului îmbogățit
//    5. antrenarea și evaluarea arborelui de decizie
//
//  Concepte Rust demonstrate:
//  - `#[tokio::main]` : runtime-ul async, necesar lookup-urilor HTTP
//  - `Arc<dyn Trait>` : serviciul de reputație partajat între task-uri
//  - `anyhow::Result` în `main`: o eroare fatală oprește rularea cu mesaj clar
// ============================================================

use cta::cache::JsonFileStore;
use cta::config::Config;
use cta::intel::abuseipdb::AbuseIpDbClient;
use cta::intel::ReputationLookup;
use cta::model::{self, Classifier, DecisionTree};
use cta::parser::syslog::SyslogParser;
use cta::{display, pipeline};

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        display::log_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // `RUST_LOG=debug cargo run` activează nivel debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cta=info".parse().context("Directivă de log invalidă")?),
        )
        .without_time() // Gestionăm manual timestamp-urile în display.rs
        .compact()
        .init();

    display::print_banner();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("Eroare fatală: nu s-a putut încărca {}", config_path))?;

    // -----------------------------------------------------------------------
    // 1. Cheia API - fără ea nu pornim
    // -----------------------------------------------------------------------
    let api_key = config.api_key()?;
    display::log_info("Cheia API a fost încărcată.");

    // -----------------------------------------------------------------------
    // 2. Log-urile
    // -----------------------------------------------------------------------
    let input = pipeline::read_input(&config.input.log_path)?;
    display::log_info(&format!(
        "Fișier de log: {}",
        config.input.log_path.display()
    ));

    // -----------------------------------------------------------------------
    // 3. Pipeline-ul de îmbogățire
    // -----------------------------------------------------------------------
    let parser = SyslogParser::new();
    let store = JsonFileStore::new(config.cache.path.clone());
    let lookup: Arc<dyn ReputationLookup> =
        Arc::new(AbuseIpDbClient::new(api_key, &config.threat_intel)?);

    let output = pipeline::run(
        &input,
        &parser,
        &store,
        lookup,
        config.threat_intel.max_concurrent_lookups,
    )
    .await?;

    display::log_info(&format!(
        "{} intrări parsate din {} linii.",
        output.features.len(),
        output.total_lines
    ));
    display::log_info(&format!(
        "{} IP-uri unice găsite pentru îmbogățire.",
        output.unique_ips
    ));
    display::log_cache_summary(&output.stats, output.cache.len());
    display::log_info(&format!(
        "Feature engineering complet. {} amenințări potențiale, {} coloane.",
        output.features.threat_count(),
        output.features.columns().len()
    ));

    // -----------------------------------------------------------------------
    // 4. Export opțional; un export eșuat nu anulează rularea
    // -----------------------------------------------------------------------
    if let Some(path) = &config.output.features_path {
        let written = File::create(path)
            .with_context(|| format!("Nu s-a putut crea '{}'", path.display()))
            .and_then(|f| output.features.write_json(BufWriter::new(f)));

        match written {
            Ok(()) => display::log_info(&format!("Feature-uri exportate în {}", path.display())),
            Err(e) => display::log_warn(&format!("Exportul feature-urilor a eșuat: {:#}", e)),
        }
    }

    // -----------------------------------------------------------------------
    // 5. Modelul de bază
    // -----------------------------------------------------------------------
    display::print_separator();
    let mut classifier = DecisionTree::new(config.model.max_depth);

    match model::train_and_evaluate(&mut classifier, &output.features, &config.model)? {
        Some(report) => display::print_report(classifier.name(), &report),
        None => display::log_warn(
            "Modelul nu a fost antrenat: setul are nevoie de rânduri din ambele clase.",
        ),
    }

    display::log_info("Rulare completă.");
    Ok(())
}
