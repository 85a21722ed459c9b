// ============================================================
//  features.rs - Îmbinarea log-urilor cu reputația și matricea X/y
// ============================================================
//
//  Pentru fiecare LogRecord:
//    - abuse_score / country vin din cache (lipsă => 0 / "N/A", la fel ca
//      sentinela: absența și eșecul sunt identice mai departe)
//    - is_threat = 1 dacă mesajul conține "Failed password" SAU
//      abuse_score > 50 (euristică fixă, nu adevăr de referință)
//    - log_level este codificat one-hot
//
//  Coloanele matricei, în ordine fixă:
//    [hour_of_day, abuse_score, log_level_<L>...]   (L sortat alfabetic)
//
//  INFO, ERROR și WARNING au MEREU coloană, chiar dacă nu apar în lot,
//  ca schema să rămână compatibilă cu un model antrenat pe alt lot.
// ============================================================

use crate::cache::CacheSnapshot;
use crate::intel::NOT_AVAILABLE;
use crate::parser::LogRecord;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;

pub const FAILED_PASSWORD_MARKER: &str = "Failed password";
pub const THREAT_SCORE_THRESHOLD: u8 = 50;

/// Nivelurile care au coloană one-hot indiferent de conținutul lotului.
pub const BASELINE_LEVELS: [&str; 3] = ["INFO", "ERROR", "WARNING"];

const LEVEL_COLUMN_PREFIX: &str = "log_level_";

/// Un LogRecord împreună cu adresa publică extrasă din mesaj (dacă există).
#[derive(Debug, Clone)]
pub struct AddressedRecord {
    pub record:     LogRecord,
    pub ip_address: Option<String>,
}

/// Rândul din tabelul îmbogățit (corespondență 1:1 cu rândul din matrice).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    pub hostname:    String,
    pub process:     String,
    pub message:     String,
    pub timestamp:   NaiveDateTime,
    pub hour_of_day: u32,
    pub log_level:   String,
    pub ip_address:  Option<String>,
    pub abuse_score: u8,
    pub country:     String,
    pub is_threat:   u8,
}

#[derive(Debug, Clone)]
pub struct FeatureSet {
    columns: Vec<String>,
    records: Vec<EnrichedRecord>,
    matrix:  Vec<Vec<f64>>,
    labels:  Vec<u8>,
}

#[derive(Serialize)]
struct ExportRow<'a> {
    #[serde(flatten)]
    record:   &'a EnrichedRecord,
    features: &'a [f64],
}

#[derive(Serialize)]
struct Export<'a> {
    columns: &'a [String],
    rows:    Vec<ExportRow<'a>>,
}

/// Regula de etichetare.
pub fn is_threat(message: &str, abuse_score: u8) -> bool {
    message.contains(FAILED_PASSWORD_MARKER) || abuse_score > THREAT_SCORE_THRESHOLD
}

/// Vocabularul one-hot: nivelurile de bază plus cele observate, sortate.
pub fn level_vocabulary<'a, I>(observed: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let vocab: BTreeSet<String> = BASELINE_LEVELS
        .iter()
        .map(|l| l.to_string())
        .chain(observed.into_iter().map(str::to_string))
        .collect();
    vocab.into_iter().collect()
}

pub fn build(records: &[AddressedRecord], cache: &CacheSnapshot) -> FeatureSet {
    let levels = level_vocabulary(records.iter().map(|r| r.record.log_level()));

    let mut columns = vec!["hour_of_day".to_string(), "abuse_score".to_string()];
    columns.extend(levels.iter().map(|l| format!("{}{}", LEVEL_COLUMN_PREFIX, l)));

    let mut enriched = Vec::with_capacity(records.len());
    let mut matrix = Vec::with_capacity(records.len());
    let mut labels = Vec::with_capacity(records.len());

    for AddressedRecord { record, ip_address } in records {
        let intel = ip_address.as_deref().and_then(|ip| cache.get(ip));
        let abuse_score = intel.map_or(0, |r| r.abuse_score);
        let country = intel.map_or_else(|| NOT_AVAILABLE.to_string(), |r| r.country.clone());

        let label = u8::from(is_threat(record.message(), abuse_score));

        let mut row = Vec::with_capacity(columns.len());
        row.push(f64::from(record.hour_of_day()));
        row.push(f64::from(abuse_score));
        row.extend(
            levels
                .iter()
                .map(|l| if l == record.log_level() { 1.0 } else { 0.0 }),
        );

        enriched.push(EnrichedRecord {
            hostname:    record.hostname().to_string(),
            process:     record.process().to_string(),
            message:     record.message().to_string(),
            timestamp:   record.timestamp(),
            hour_of_day: record.hour_of_day(),
            log_level:   record.log_level().to_string(),
            ip_address:  ip_address.clone(),
            abuse_score,
            country,
            is_threat:   label,
        });
        matrix.push(row);
        labels.push(label);
    }

    FeatureSet {
        columns,
        records: enriched,
        matrix,
        labels,
    }
}

impl FeatureSet {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[EnrichedRecord] {
        &self.records
    }

    pub fn matrix(&self) -> &[Vec<f64>] {
        &self.matrix
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Numărul de rânduri etichetate ca amenințare.
    pub fn threat_count(&self) -> usize {
        self.labels.iter().filter(|&&y| y == 1).count()
    }

    /// Scrie tabelul îmbogățit ca JSON: `{ "columns": [...], "rows": [...] }`.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        let export = Export {
            columns: &self.columns,
            rows: self
                .records
                .iter()
                .zip(&self.matrix)
                .map(|(record, features)| ExportRow { record, features })
                .collect(),
        };

        serde_json::to_writer_pretty(writer, &export).context("Exportul feature-urilor a eșuat")
    }
}
