// ============================================================
//  cache.rs - Cache-ul durabil de reputație IP (ThreatCache)
// ============================================================
//
//  Concepte Rust demonstrate:
//  - `Arc<DashMap<K, V>>` : task-urile de lookup scriu concurent în
//    același map, fără un Mutex global
//  - `tokio::task::JoinSet` + `Semaphore` : paralelism limitat
//  - `trait CacheStore` : stocarea e o valoare explicită, injectabilă;
//    testele folosesc `MemoryStore` și nu ating disk-ul
//
//  Ciclul de viață într-o rulare:
//    load (o dată) -> resolve (lookup doar pentru cache miss) -> flush (o dată)
//
//  Invarianți:
//  - o adresă prezentă în cache NU mai este interogată niciodată
//  - un lookup eșuat lasă în cache înregistrarea sentinelă (0, "N/A", "N/A")
//  - flush suprascrie complet conținutul anterior al stocării
//  - două rulări concurente pe aceeași stocare nu se coordonează:
//    ultimul care scrie câștigă
// ============================================================

use crate::intel::{ReputationLookup, ReputationRecord};
use anyhow::{Context, Result};
use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Snapshot complet al cache-ului, ordonat după IP (diff-uri stabile pe disc).
pub type CacheSnapshot = BTreeMap<String, ReputationRecord>;

// ---------------------------------------------------------------------------
// Stocarea durabilă a cache-ului: se citește și se scrie ca snapshot complet.
// ---------------------------------------------------------------------------
pub trait CacheStore: Send + Sync {
    /// Lipsa stocării (prima rulare) NU este o eroare: întoarce map gol.
    fn load(&self) -> Result<HashMap<String, ReputationRecord>>;

    fn save(&self, snapshot: &CacheSnapshot) -> Result<()>;

    fn describe(&self) -> String;
}

// Decodare intrare cu intrare: o singură înregistrare ilizibilă este
// ignorată (și re-interogată), restul cache-ului rămâne valabil. Doar un
// document JSON invalid în ansamblu este o eroare.
fn decode_snapshot(raw: &str) -> Result<HashMap<String, ReputationRecord>> {
    let entries: HashMap<String, serde_json::Value> = serde_json::from_str(raw)?;
    let mut decoded = HashMap::with_capacity(entries.len());

    for (ip, value) in entries {
        match serde_json::from_value::<ReputationRecord>(value) {
            Ok(record) => {
                decoded.insert(ip, record);
            }
            Err(e) => warn!(%ip, error = %e, "intrare de cache ilizibilă, ignorată"),
        }
    }

    Ok(decoded)
}

/// Fișier JSON: `{ "8.8.8.8": { "abuse_score": 0, "country": "US", "domain": "google.com" } }`
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for JsonFileStore {
    fn load(&self) -> Result<HashMap<String, ReputationRecord>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Nu s-a putut citi cache-ul '{}'", self.path.display()))?;

        decode_snapshot(&content)
            .with_context(|| format!("Cache-ul '{}' este corupt", self.path.display()))
    }

    // Scriem într-un fișier temporar alăturat și apoi facem rename, ca un
    // crash în timpul scrierii să nu lase un JSON trunchiat.
    fn save(&self, snapshot: &CacheSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Nu s-a putut crea directorul '{}'", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(snapshot).context("Serializarea cache-ului a eșuat")?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)
            .with_context(|| format!("Nu s-a putut scrie '{}'", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Nu s-a putut înlocui '{}'", self.path.display()))?;

        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ---------------------------------------------------------------------------
// Stocare în memorie. Păstrează snapshot-ul serializat JSON, deci trece
// prin exact același drum de (de)serializare ca fișierul. Clonele partajează
// aceeași stocare (Arc), ca două rulări pe același "fișier".
// ---------------------------------------------------------------------------
#[derive(Clone, Default)]
pub struct MemoryStore {
    json: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stocare pre-populată cu conținut brut (ex: JSON corupt în teste).
    pub fn with_raw(raw: &str) -> Self {
        MemoryStore {
            json: Arc::new(Mutex::new(Some(raw.to_string()))),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.json.lock().ok().and_then(|guard| guard.clone())
    }
}

impl CacheStore for MemoryStore {
    fn load(&self) -> Result<HashMap<String, ReputationRecord>> {
        match self.raw() {
            None => Ok(HashMap::new()),
            Some(raw) => decode_snapshot(&raw).context("Cache-ul din memorie este corupt"),
        }
    }

    fn save(&self, snapshot: &CacheSnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;
        let mut guard = self
            .json
            .lock()
            .map_err(|_| anyhow::anyhow!("MemoryStore mutex otrăvit"))?;
        *guard = Some(json);
        Ok(())
    }

    fn describe(&self) -> String {
        "memorie".to_string()
    }
}

/// Statistici pentru o rezolvare: câte adrese au venit din cache, câte au
/// fost interogate și câte dintre acestea au eșuat (sentinelă).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub hits:    usize,
    pub queried: usize,
    pub failed:  usize,
}

// ---------------------------------------------------------------------------
// Cache-ul propriu-zis. `Clone` clonează doar Arc-ul, nu datele.
// ---------------------------------------------------------------------------
#[derive(Clone, Default)]
pub struct ThreatCache {
    entries: Arc<DashMap<String, ReputationRecord>>,
}

impl ThreatCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Încarcă starea anterioară. O stocare ilizibilă sau coruptă produce un
    /// avertisment și un cache gol, nu o eroare: pipeline-ul merge mai departe.
    pub fn load(store: &dyn CacheStore) -> Self {
        let cache = ThreatCache::new();

        match store.load() {
            Ok(entries) => {
                for (ip, record) in entries {
                    cache.entries.insert(ip, record);
                }
                debug!(store = %store.describe(), entries = cache.len(), "cache încărcat");
            }
            Err(e) => {
                warn!(store = %store.describe(), error = %format!("{:#}", e), "cache ilizibil, pornim cu cache gol");
            }
        }

        cache
    }

    pub fn get(&self, ip: &str) -> Option<ReputationRecord> {
        self.entries.get(ip).map(|r| r.value().clone())
    }

    pub fn contains(&self, ip: &str) -> bool {
        self.entries.contains_key(ip)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Rezolvă toate adresele: cele din cache sunt servite local, restul sunt
    // interogate în paralel (cel mult `max_concurrent` simultan).
    //
    // La ieșire FIECARE adresă primită are o înregistrare în cache.
    // -----------------------------------------------------------------------
    pub async fn resolve(
        &self,
        addresses: &BTreeSet<String>,
        lookup: Arc<dyn ReputationLookup>,
        max_concurrent: usize,
    ) -> ResolveStats {
        let misses: Vec<String> = addresses
            .iter()
            .filter(|ip| !self.contains(ip))
            .cloned()
            .collect();

        let mut stats = ResolveStats {
            hits:    addresses.len() - misses.len(),
            queried: misses.len(),
            failed:  0,
        };

        if misses.is_empty() {
            return stats;
        }

        info!(misses = misses.len(), hits = stats.hits, service = lookup.name(), "interogare adrese noi");

        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let mut tasks = JoinSet::new();

        for ip in misses.iter().cloned() {
            let entries = Arc::clone(&self.entries);
            let lookup = Arc::clone(&lookup);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                // Semaforul nu este închis niciodată, deci acquire nu eșuează
                let _permit = semaphore.acquire_owned().await.ok();

                debug!(%ip, "cache miss");
                match lookup.lookup(&ip).await {
                    Ok(record) => {
                        entries.insert(ip, record);
                        false
                    }
                    Err(e) => {
                        warn!(%ip, error = %format!("{:#}", e), "lookup eșuat, se stochează sentinela");
                        entries.insert(ip, ReputationRecord::sentinel());
                        true
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => stats.failed += 1,
                Ok(false) => {}
                Err(e) => warn!(error = %e, "task de lookup terminat anormal"),
            }
        }

        // Un task care a dat panic nu a apucat să scrie nimic: și acea
        // adresă primește sentinela.
        for ip in misses {
            if !self.contains(&ip) {
                self.entries.insert(ip, ReputationRecord::sentinel());
                stats.failed += 1;
            }
        }

        stats
    }

    /// Scrie snapshot-ul complet (vechi + nou) peste conținutul stocării.
    pub fn flush(&self, store: &dyn CacheStore) -> Result<()> {
        store
            .save(&self.snapshot())
            .with_context(|| format!("Flush-ul cache-ului în '{}' a eșuat", store.describe()))
    }
}

/// Un ciclu complet: load -> resolve -> flush.
///
/// Un flush eșuat este doar un avertisment: reputațiile tocmai obținute sunt
/// folosite în rularea curentă, doar că nu vor fi reutilizate data viitoare.
pub async fn resolve_with_store(
    store: &dyn CacheStore,
    addresses: &BTreeSet<String>,
    lookup: Arc<dyn ReputationLookup>,
    max_concurrent: usize,
) -> (ThreatCache, ResolveStats) {
    let cache = ThreatCache::load(store);
    let stats = cache.resolve(addresses, lookup, max_concurrent).await;

    if let Err(e) = cache.flush(store) {
        warn!(error = %format!("{:#}", e), "cache-ul nu a fost salvat; rularea continuă fără el");
    }

    (cache, stats)
}
