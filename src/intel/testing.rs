// Implementări de test pentru ReputationLookup (fără rețea).

use super::{ReputationLookup, ReputationRecord};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Răspunde din tabel; adresele necunoscute eșuează. Numără apelurile și
/// concurența maximă observată.
#[derive(Default)]
pub struct StaticLookup {
    answers:       HashMap<String, ReputationRecord>,
    delay:         Option<Duration>,
    calls:         AtomicUsize,
    in_flight:     AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, ip: &str, record: ReputationRecord) -> Self {
        self.answers.insert(ip.to_string(), record);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReputationLookup for StaticLookup {
    fn name(&self) -> &str {
        "static"
    }

    async fn lookup(&self, ip: &str) -> Result<ReputationRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.answers
            .get(ip)
            .cloned()
            .ok_or_else(|| anyhow!("simulated failure for {}", ip))
    }
}
