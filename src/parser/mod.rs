// ============================================================
//  parser/mod.rs - Trait-ul LogParser și tipul LogRecord
// ============================================================
//
//  Concepte Rust demonstrate aici:
//  - `trait` : contractul pe care un parser de log-uri îl respectă
//  - Câmpuri private + getter-e: invarianții unui tip nu pot fi încălcați
//    din afara modulului
//  - `Option<T>` : o linie care nu se potrivește NU este o eroare
// ============================================================

pub mod syslog;

use chrono::{NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Nivelul implicit când mesajul nu conține un token `[LEVEL]`.
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

// Primul token între paranteze pătrate din mesaj, ex: "[ERROR]"
static LEVEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\w+)\]").expect("LEVEL_REGEX invalid"));

// ---------------------------------------------------------------------------
// O linie de log parsată.
//
// Câmpurile sunt private: `hour_of_day` se calculează O SINGURĂ DATĂ din
// `timestamp` în constructor și nu poate fi setat separat. După creare,
// înregistrarea nu mai poate fi modificată (nu există metode `&mut self`).
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    hostname:    String,
    process:     String,
    message:     String,
    timestamp:   NaiveDateTime,
    hour_of_day: u32,
    log_level:   String,
}

impl LogRecord {
    /// Construiește înregistrarea; nivelul de log și ora sunt derivate aici.
    pub fn new(hostname: &str, process: &str, message: &str, timestamp: NaiveDateTime) -> Self {
        LogRecord {
            hostname:    hostname.to_string(),
            process:     process.to_string(),
            message:     message.to_string(),
            hour_of_day: timestamp.hour(),
            log_level:   extract_log_level(message),
            timestamp,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn process(&self) -> &str {
        &self.process
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Ora din zi (0-23), mereu egală cu `timestamp().hour()`
    pub fn hour_of_day(&self) -> u32 {
        self.hour_of_day
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Caută primul `[LEVEL]` din mesaj; lipsa lui înseamnă "INFO".
pub fn extract_log_level(message: &str) -> String {
    LEVEL_REGEX
        .captures(message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

// ---------------------------------------------------------------------------
// Trăsătura LogParser - "interfața" unui parser de linii.
//
// Contractul este deliberat tolerant: `parse` întoarce `None` pentru orice
// linie care nu respectă formatul (goală, fără câmpul `proces:`, dată
// invalidă). Parser-ul filtrează zgomotul, nu validează strict.
// ---------------------------------------------------------------------------
pub trait LogParser: Send + Sync {
    fn parse(&self, line: &str) -> Option<LogRecord>;

    /// Numele parser-ului (pentru logging și diagnostice)
    fn name(&self) -> &str;
}

/// Parsează toate liniile, în ordinea de intrare.
///
/// Liniile care nu se potrivesc sunt sărite (doar un mesaj `debug!`).
/// Rezultatul gol este valid; apelantul decide dacă e o problemă.
pub fn parse_lines<'a, I>(parser: &dyn LogParser, lines: I) -> Vec<LogRecord>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for line in lines {
        match parser.parse(line) {
            Some(record) => records.push(record),
            None => {
                skipped += 1;
                debug!(parser = parser.name(), line, "linie ignorată (nu respectă formatul)");
            }
        }
    }

    debug!(parsed = records.len(), skipped, "parsare terminată");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn hour_of_day_follows_timestamp() {
        let rec = LogRecord::new("host", "sshd", "hello", ts(23));
        assert_eq!(rec.hour_of_day(), 23);
        assert_eq!(rec.timestamp(), ts(23));
    }

    #[test]
    fn level_is_first_bracketed_token() {
        assert_eq!(extract_log_level("[ERROR] disk full [WARNING]"), "ERROR");
        assert_eq!(extract_log_level("kernel: [WARNING] temp high"), "WARNING");
    }

    #[test]
    fn level_defaults_to_info() {
        assert_eq!(extract_log_level("Accepted publickey for bob"), "INFO");
        assert_eq!(extract_log_level("[] empty brackets"), "INFO");
    }
}
