// ============================================================
//  intel/mod.rs - Datele de reputație și trait-ul ReputationLookup
// ============================================================
//
//  Concepte Rust demonstrate:
//  - `#[async_trait]` : metode async într-un trait folosit ca
//    `Arc<dyn ReputationLookup>` (dynamic dispatch între task-uri tokio)
//  - Serde derive: aceeași structură se scrie/citește în cache-ul JSON
// ============================================================

pub mod abuseipdb;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// Valoarea folosită pentru țară/domeniu necunoscute.
pub const NOT_AVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// Reputația unei adrese IP, așa cum o raportează serviciul extern.
//
// Numele câmpurilor sunt și cheile din fișierul de cache
// (`abuse_score`, `country`, `domain`). Fișierele mai vechi pot conține
// `null` sau câmpuri lipsă: la citire devin 0 / "N/A".
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationRecord {
    /// Scor de abuz 0-100
    #[serde(default, deserialize_with = "score_or_zero")]
    pub abuse_score: u8,

    /// Cod ISO de țară sau "N/A"
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub country: String,

    /// Domeniul asociat sau "N/A"
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub domain: String,
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

fn text_or_not_available<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(not_available))
}

fn score_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let score = Option::<u64>::deserialize(deserializer)?.unwrap_or(0);
    Ok(score.min(100) as u8)
}

impl ReputationRecord {
    pub fn new(abuse_score: u8, country: &str, domain: &str) -> Self {
        ReputationRecord {
            abuse_score: abuse_score.min(100),
            country:     country.to_string(),
            domain:      domain.to_string(),
        }
    }

    /// Înregistrarea stocată după un lookup eșuat: scor 0, țară și domeniu "N/A".
    /// Odată scrisă în cache, adresa nu mai este interogată niciodată.
    pub fn sentinel() -> Self {
        Self::new(0, NOT_AVAILABLE, NOT_AVAILABLE)
    }
}

// ---------------------------------------------------------------------------
// Capabilitatea externă de interogare a reputației.
//
// Orice `Err` (rețea, timeout, status HTTP, JSON invalid) este tratat de
// cache la fel: adresa primește înregistrarea sentinelă. Politica de
// timeout/retry aparține implementării, nu cache-ului.
// ---------------------------------------------------------------------------
#[async_trait]
pub trait ReputationLookup: Send + Sync {
    async fn lookup(&self, ip: &str) -> anyhow::Result<ReputationRecord>;

    /// Numele serviciului (pentru logging)
    fn name(&self) -> &str;
}
