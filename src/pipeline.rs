// ============================================================
//  pipeline.rs - Fluxul complet de îmbogățire
// ============================================================
//
//   linii brute
//     -> parse (liniile nepotrivite sunt ignorate)
//     -> extract_ip pe fiecare mesaj
//     -> ThreatCache: load -> resolve (lookup doar pentru adrese noi) -> flush
//     -> features::build (îmbinare + etichete + one-hot)
//
//  Rezolvarea cache-ului se termină complet înainte ca vreun rând să
//  ajungă în FeatureBuilder.
// ============================================================

use crate::cache::{resolve_with_store, CacheStore, ResolveStats, ThreatCache};
use crate::extractor::extract_ip;
use crate::features::{self, AddressedRecord, FeatureSet};
use crate::intel::ReputationLookup;
use crate::parser::{parse_lines, LogParser};
use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub struct PipelineOutput {
    pub features:    FeatureSet,
    pub cache:       ThreatCache,
    pub stats:       ResolveStats,
    pub unique_ips:  usize,
    pub total_lines: usize,
}

/// Citește fișierul de log. Lipsa lui oprește rularea; o linie care nu e
/// UTF-8 valid este doar exclusă, ca orice altă linie malformată.
pub fn read_input(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| {
        format!(
            "Nu s-a putut citi fișierul de log '{}'. Verificați [input] log_path din config.toml",
            path.display()
        )
    })?;

    let mut skipped = 0usize;
    let lines: Vec<&str> = bytes
        .split(|&b| b == b'\n')
        .filter_map(|raw| match std::str::from_utf8(raw) {
            Ok(line) => Some(line),
            Err(_) => {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        warn!(skipped, file = %path.display(), "linii cu UTF-8 invalid ignorate");
    }
    Ok(lines.join("\n"))
}

pub async fn run(
    input: &str,
    parser: &dyn LogParser,
    store: &dyn CacheStore,
    lookup: Arc<dyn ReputationLookup>,
    max_concurrent: usize,
) -> Result<PipelineOutput> {
    let total_lines = input.lines().count();
    let records = parse_lines(parser, input.lines());

    // Un rezultat gol nu e o eroare a parser-ului, dar o matrice goală
    // trimisă mai departe ar ascunde problema.
    if records.is_empty() {
        bail!(
            "Nicio intrare din {} linii nu respectă formatul {}. Verificați fișierul de log.",
            total_lines,
            parser.name()
        );
    }
    info!(parsed = records.len(), total_lines, "log-uri parsate");

    let addressed: Vec<AddressedRecord> = records
        .into_iter()
        .map(|record| {
            let ip_address = extract_ip(record.message());
            AddressedRecord { record, ip_address }
        })
        .collect();

    let unique: BTreeSet<String> = addressed
        .iter()
        .filter_map(|r| r.ip_address.clone())
        .collect();
    info!(unique_ips = unique.len(), "adrese publice de îmbogățit");

    let (cache, stats) = resolve_with_store(store, &unique, lookup, max_concurrent).await;

    let features = features::build(&addressed, &cache.snapshot());
    info!(
        rows = features.len(),
        threats = features.threat_count(),
        columns = features.columns().len(),
        "feature-uri generate"
    );

    Ok(PipelineOutput {
        features,
        cache,
        stats,
        unique_ips: unique.len(),
        total_lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::intel::testing::StaticLookup;
    use crate::intel::ReputationRecord;
    use crate::parser::syslog::SyslogParser;

    const SSHD_LINE: &str = "Jan  5 10:00:00 host sshd: Failed password for root from 8.8.8.8 port 22";

    fn google_lookup() -> Arc<StaticLookup> {
        Arc::new(StaticLookup::new().with("8.8.8.8", ReputationRecord::new(75, "US", "google.com")))
    }

    #[tokio::test]
    async fn failed_password_line_end_to_end() {
        let parser = SyslogParser::with_year(2026);
        let store = MemoryStore::new();
        let lookup = google_lookup();

        let out = run(SSHD_LINE, &parser, &store, lookup.clone(), 4).await.unwrap();

        assert_eq!(out.features.len(), 1);
        let row = &out.features.records()[0];
        assert_eq!(row.process, "sshd");
        assert_eq!(row.hour_of_day, 10);
        assert_eq!(row.log_level, "INFO");
        assert_eq!(row.ip_address.as_deref(), Some("8.8.8.8"));
        assert_eq!(row.abuse_score, 75);
        assert_eq!(row.country, "US");
        assert_eq!(row.is_threat, 1);
        assert_eq!(out.features.matrix()[0][..2], [10.0, 75.0]);
        assert_eq!(out.unique_ips, 1);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn unparseable_lines_are_excluded_everywhere() {
        let parser = SyslogParser::with_year(2026);
        let input = format!("\nJan  5 10:00:00 host no process field 9.9.9.9\n{}\n", SSHD_LINE);
        let lookup = google_lookup();

        let out = run(&input, &parser, &MemoryStore::new(), lookup.clone(), 4).await.unwrap();

        assert_eq!(out.total_lines, 3);
        assert_eq!(out.features.len(), 1);
        assert_eq!(out.features.labels().len(), 1);
        assert_eq!(out.features.matrix().len(), 1);
        // 9.9.9.9 venea doar din linia ignorată
        assert_eq!(out.unique_ips, 1);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn zero_matching_lines_is_reported() {
        let parser = SyslogParser::with_year(2026);
        let err = run("\n\nnot syslog\n", &parser, &MemoryStore::new(), google_lookup(), 4)
            .await
            .err()
            .expect("empty result must be an error");

        assert!(err.to_string().contains("Nicio intrare"));
    }

    #[tokio::test]
    async fn repeated_runs_share_the_store() {
        let parser = SyslogParser::with_year(2026);
        let store = MemoryStore::new();
        let lookup = google_lookup();

        let first = run(SSHD_LINE, &parser, &store, lookup.clone(), 4).await.unwrap();
        let second = run(SSHD_LINE, &parser, &store, lookup.clone(), 4).await.unwrap();

        assert_eq!(lookup.calls(), 1);
        assert_eq!(second.stats.hits, 1);
        assert_eq!(first.features.records(), second.features.records());
    }

    #[tokio::test]
    async fn private_addresses_are_never_looked_up() {
        let parser = SyslogParser::with_year(2026);
        let input = "Jan  5 10:00:00 host sshd: Accepted password for bob from 10.0.0.5\n\
                     Jan  5 10:00:01 host sshd: Accepted password for bob from 192.168.1.1\n\
                     Jan  5 10:00:02 host sshd: [WARNING] connection from 127.0.0.1\n";
        let lookup = Arc::new(StaticLookup::new());

        let out = run(input, &parser, &MemoryStore::new(), lookup.clone(), 4).await.unwrap();

        assert_eq!(lookup.calls(), 0);
        assert_eq!(out.unique_ips, 0);
        assert!(out.features.records().iter().all(|r| r.ip_address.is_none()));
        assert_eq!(out.features.threat_count(), 0);
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_hide_valid_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system.log");
        let mut bytes = SSHD_LINE.as_bytes().to_vec();
        bytes.extend_from_slice(b"\nJan  5 10:00:01 host sshd: user \xff\xfe from 9.9.9.9\n");
        fs::write(&path, bytes).unwrap();

        let input = read_input(&path).unwrap();
        assert_eq!(input.lines().count(), 1);

        let parser = SyslogParser::with_year(2026);
        let out = run(&input, &parser, &MemoryStore::new(), google_lookup(), 4).await.unwrap();
        assert_eq!(out.features.len(), 1);
        assert_eq!(out.features.records()[0].ip_address.as_deref(), Some("8.8.8.8"));
    }

    #[test]
    fn missing_input_file_is_fatal() {
        let err = read_input(Path::new("/definitely/not/here/system.log")).unwrap_err();
        assert!(format!("{:#}", err).contains("system.log"));
    }
}
