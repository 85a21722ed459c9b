// ============================================================
//  intel/abuseipdb.rs - Clientul HTTP pentru AbuseIPDB
// ============================================================
//
//  Endpoint: GET /api/v2/check?ipAddress=..&maxAgeInDays=..&verbose=true
//  Headere:  Key: <cheia API>, Accept: application/json
//
//  Răspuns (câmpurile folosite):
//  { "data": { "abuseConfidenceScore": 75, "countryCode": "US",
//              "domain": "google.com", ... } }
//
//  Planul gratuit are o limită de cereri, deci cererile trec printr-un
//  RateLimiter comun tuturor task-urilor.
// ============================================================

use super::{ReputationLookup, ReputationRecord, NOT_AVAILABLE};
use crate::config::ThreatIntelConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CheckResponse {
    data: Option<CheckData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckData {
    abuse_confidence_score: Option<u32>,
    country_code:           Option<String>,
    domain:                 Option<String>,
}

// ---------------------------------------------------------------------------
// Limitator simplu: fiecare cerere rezervă următorul "slot" liber, sloturile
// fiind distanțate cu 60s / requests_per_minute. Mutex-ul ține doar
// rezervarea, așteptarea se face în afara lui.
// ---------------------------------------------------------------------------
pub struct RateLimiter {
    interval:  Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    pub fn per_minute(requests: u32) -> Self {
        RateLimiter {
            interval:  Duration::from_secs(60) / requests.max(1),
            next_slot: Mutex::new(Instant::now()),
        }
    }

    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let slot = (*next).max(Instant::now());
            *next = slot + self.interval;
            slot
        };
        sleep_until(slot).await;
    }
}

pub struct AbuseIpDbClient {
    http:         reqwest::Client,
    api_url:      String,
    api_key:      String,
    max_age_days: u32,
    limiter:      RateLimiter,
}

impl AbuseIpDbClient {
    pub fn new(api_key: String, config: &ThreatIntelConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Nu s-a putut construi clientul HTTP")?;

        Ok(AbuseIpDbClient {
            http,
            api_url: config.api_url.clone(),
            api_key,
            max_age_days: config.max_age_days,
            limiter: RateLimiter::per_minute(config.requests_per_minute),
        })
    }
}

#[async_trait]
impl ReputationLookup for AbuseIpDbClient {
    fn name(&self) -> &str {
        "AbuseIPDB"
    }

    async fn lookup(&self, ip: &str) -> Result<ReputationRecord> {
        self.limiter.acquire().await;
        debug!(ip, "interogare AbuseIPDB");

        let params = [
            ("ipAddress", ip.to_string()),
            ("maxAgeInDays", self.max_age_days.to_string()),
            ("verbose", "true".to_string()),
        ];

        // Timeout-ul, status-urile non-2xx și JSON-ul invalid devin toate `Err`
        let response: CheckResponse = self
            .http
            .get(&self.api_url)
            .query(&params)
            .header("Key", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Cererea pentru {} a eșuat", ip))?
            .error_for_status()
            .with_context(|| format!("AbuseIPDB a răspuns cu eroare pentru {}", ip))?
            .json()
            .await
            .with_context(|| format!("Răspuns JSON invalid pentru {}", ip))?;

        record_from_response(response)
    }
}

fn record_from_response(response: CheckResponse) -> Result<ReputationRecord> {
    let data = response
        .data
        .ok_or_else(|| anyhow!("Răspunsul nu conține câmpul 'data'"))?;

    let score = data.abuse_confidence_score.unwrap_or(0).min(100) as u8;
    let country = data.country_code.unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let domain = data.domain.unwrap_or_else(|| NOT_AVAILABLE.to_string());

    Ok(ReputationRecord::new(score, &country, &domain))
}
