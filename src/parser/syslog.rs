// ============================================================
//  parser/syslog.rs - Parser pentru linii syslog clasice (BSD)
// ============================================================
//
//  Format log exemplu:
//  Jan  5 10:00:00 host sshd: Failed password for root from 8.8.8.8 port 22
//
//  Câmpuri extrase:
//    - Timestamp : "Jan  5 10:00:00" (exact 15 caractere, fără an)
//    - Hostname  : "host"
//    - Proces    : "sshd" (tot ce e înainte de primul ':')
//    - Mesaj     : restul liniei
//
//  Anul lipsește din syslog, deci îl completăm cu anul curent.
//  Limitare cunoscută: log-urile care traversează Revelionul primesc
//  toate același an.
// ============================================================

use super::{LogParser, LogRecord};
use chrono::{Datelike, Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

// Explicația pattern-ului:
//   ^(.{15})          -> timestamp-ul de lungime fixă
//   \s+([\w\d\.-]+)   -> hostname
//   \s+([^:]+):       -> procesul/tag-ul, terminat de ':'
//   \s+(.*)$          -> mesajul liber
static SYSLOG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.{15})\s+([\w\d\.-]+)\s+([^:]+):\s+(.*)$")
        .expect("SYSLOG_REGEX: pattern invalid - eroare de programare!")
});

const TIMESTAMP_FORMAT: &str = "%Y %b %d %H:%M:%S";

pub struct SyslogParser {
    year: i32,
}

impl SyslogParser {
    /// Parser care completează timestamp-urile cu anul calendaristic curent.
    pub fn new() -> Self {
        SyslogParser {
            year: Local::now().year(),
        }
    }

    /// Parser cu an fix (folosit de teste pentru rezultate deterministe).
    pub fn with_year(year: i32) -> Self {
        SyslogParser { year }
    }

    // "Jan  5 10:00:00" are două spații pentru zilele dintr-o cifră;
    // normalizăm spațiile înainte de a aplica formatul.
    fn parse_timestamp(&self, raw: &str) -> Option<NaiveDateTime> {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let with_year = format!("{} {}", self.year, normalized);
        NaiveDateTime::parse_from_str(&with_year, TIMESTAMP_FORMAT).ok()
    }
}

impl Default for SyslogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogParser for SyslogParser {
    fn name(&self) -> &str {
        "BSD syslog"
    }

    fn parse(&self, line: &str) -> Option<LogRecord> {
        let caps = SYSLOG_REGEX.captures(line)?;

        // O dată invalidă (ex: "Feb 30") e tratată ca orice linie nepotrivită
        let timestamp = self.parse_timestamp(caps.get(1)?.as_str())?;
        let hostname = caps.get(2)?.as_str();
        let process = caps.get(3)?.as_str().trim();
        let message = caps.get(4)?.as_str().trim();

        Some(LogRecord::new(hostname, process, message, timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_lines;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn parses_sshd_failed_password_line() {
        let parser = SyslogParser::with_year(2026);
        let rec = parser
            .parse("Jan  5 10:00:00 host sshd: Failed password for root from 8.8.8.8 port 22")
            .expect("line should match");

        assert_eq!(rec.hostname(), "host");
        assert_eq!(rec.process(), "sshd");
        assert_eq!(rec.message(), "Failed password for root from 8.8.8.8 port 22");
        assert_eq!(rec.hour_of_day(), 10);
        assert_eq!(rec.log_level(), "INFO");
        assert_eq!(
            rec.timestamp(),
            NaiveDate::from_ymd_opt(2026, 1, 5)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn keeps_pid_in_process_and_extracts_level() {
        let parser = SyslogParser::with_year(2026);
        let rec = parser
            .parse("Mar 12 23:59:01 web-01.local nginx[812]: [ERROR] upstream timed out")
            .unwrap();

        assert_eq!(rec.hostname(), "web-01.local");
        assert_eq!(rec.process(), "nginx[812]");
        assert_eq!(rec.log_level(), "ERROR");
        assert_eq!(rec.hour_of_day(), 23);
        assert_eq!(rec.timestamp().second(), 1);
    }

    #[test]
    fn default_parser_uses_current_year() {
        // Anul poate trece între cele două citiri ale ceasului (31 dec, 23:59:59)
        let before = Local::now().year();
        let rec = SyslogParser::new()
            .parse("Jul 14 08:30:00 host cron: job started")
            .unwrap();
        let after = Local::now().year();

        assert!((before..=after).contains(&rec.timestamp().year()));
    }

    #[test]
    fn rejects_lines_without_process_field() {
        let parser = SyslogParser::with_year(2026);
        assert!(parser.parse("").is_none());
        assert!(parser.parse("Jan  5 10:00:00 host no colon here").is_none());
        assert!(parser.parse("garbage").is_none());
    }

    #[test]
    fn rejects_impossible_dates() {
        let parser = SyslogParser::with_year(2026);
        assert!(parser.parse("Feb 30 10:00:00 host sshd: hello").is_none());
        assert!(parser.parse("Foo  5 10:00:00 host sshd: hello").is_none());
    }

    #[test]
    fn parse_lines_keeps_input_order_and_drops_noise() {
        let parser = SyslogParser::with_year(2026);
        let input = "Jan  5 10:00:00 a sshd: first\n\
                     \n\
                     not a syslog line\n\
                     Jan  5 11:00:00 b cron: second\n";

        let records = parse_lines(&parser, input.lines());
        let hosts: Vec<_> = records.iter().map(|r| r.hostname()).collect();
        assert_eq!(hosts, vec!["a", "b"]);
    }

    #[test]
    fn parse_lines_on_empty_input_is_empty() {
        let parser = SyslogParser::with_year(2026);
        assert!(parse_lines(&parser, std::iter::empty()).is_empty());
    }
}
