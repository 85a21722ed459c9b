// ============================================================
//  extractor.rs - Extragerea adresei IPv4 publice dintr-un mesaj
// ============================================================
//
//  Funcție pură: mesaj -> Option<String>.
//
//  Limitări cunoscute, păstrate intenționat:
//  - pattern-ul acceptă orice 1-3 cifre per octet (ex: "999.1.1.1")
//  - filtrăm doar 10.*, 192.168.* și 127.0.0.1; 172.16.0.0/12 și IPv6
//    NU sunt filtrate
// ============================================================

use once_cell::sync::Lazy;
use regex::Regex;

static IPV4_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})").expect("IPV4_REGEX invalid")
});

// Prefixe interne/loopback care nu merită interogate la API
const INTERNAL_PREFIXES: [&str; 3] = ["192.168.", "10.", "127.0.0.1"];

/// Returnează prima adresă IPv4 din mesaj, dacă aceasta nu e internă.
///
/// Se evaluează DOAR prima potrivire: dacă ea e privată, rezultatul e
/// `None` chiar dacă mai târziu în mesaj apare o adresă publică.
pub fn extract_ip(message: &str) -> Option<String> {
    let ip = IPV4_REGEX.find(message)?.as_str();

    if is_internal(ip) {
        return None;
    }
    Some(ip.to_string())
}

fn is_internal(ip: &str) -> bool {
    INTERNAL_PREFIXES.iter().any(|prefix| ip.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_address_is_returned() {
        assert_eq!(
            extract_ip("Failed password for root from 8.8.8.8 port 22").as_deref(),
            Some("8.8.8.8")
        );
    }

    #[test]
    fn private_and_loopback_are_filtered() {
        for msg in [
            "connection from 10.0.0.5",
            "connection from 192.168.1.1",
            "connection from 127.0.0.1",
        ] {
            assert_eq!(extract_ip(msg), None, "{msg}");
        }
    }

    #[test]
    fn only_first_match_is_considered() {
        assert_eq!(extract_ip("from 10.0.0.5 via 8.8.8.8"), None);
        assert_eq!(
            extract_ip("from 1.2.3.4 via 5.6.7.8").as_deref(),
            Some("1.2.3.4")
        );
    }

    #[test]
    fn known_gaps_are_preserved() {
        // 172.16/12 nu este filtrat
        assert_eq!(extract_ip("from 172.16.4.2").as_deref(), Some("172.16.4.2"));
        // octeți > 255 sunt acceptați de pattern
        assert_eq!(extract_ip("from 300.1.1.1").as_deref(), Some("300.1.1.1"));
    }

    #[test]
    fn message_without_address_yields_none() {
        assert_eq!(extract_ip("session opened for user root"), None);
    }
}
