// ============================================================
//  config.rs - Structurile de configurare și încărcarea TOML
// ============================================================
//
//  Concepte Rust demonstrate aici:
//  - #[derive(...)] : generare automată de implementări de trait-uri
//  - serde::Deserialize : conversie automată TOML -> struct
//  - `#[serde(default = "...")]` : valori implicite pentru câmpuri lipsă
//  - anyhow::Result : un Result cu tipul de eroare dinamic
// ============================================================

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub input: InputConfig,

    #[serde(default)]
    pub threat_intel: ThreatIntelConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct InputConfig {
    /// Fișierul de log syslog de analizat
    pub log_path: PathBuf,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ThreatIntelConfig {
    /// Endpoint-ul "check" al AbuseIPDB
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Variabila de mediu (sau cheia din .env) care conține cheia API
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Câte zile de rapoarte cerem de la API
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,

    /// Timeout per cerere HTTP, în secunde
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Câte lookup-uri pot fi în zbor simultan
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_lookups: usize,

    /// Limita de cereri pe minut impusă de planul API
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CacheConfig {
    /// Fișierul JSON cu reputațiile deja interogate
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ModelConfig {
    /// Fracțiunea de rânduri rezervată pentru test
    #[serde(default = "default_test_ratio")]
    pub test_ratio: f64,

    /// Seed pentru împărțirea train/test reproductibilă
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Adâncimea maximă a arborelui de decizie (None = nelimitat)
    #[serde(default)]
    pub max_depth: Option<usize>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct OutputConfig {
    /// Dacă e setat, tabelul de feature-uri se scrie aici ca JSON
    #[serde(default)]
    pub features_path: Option<PathBuf>,
}

fn default_api_url() -> String {
    "https://api.abuseipdb.com/api/v2/check".to_string()
}

fn default_api_key_env() -> String {
    "ABUSEIPDB_KEY".to_string()
}

fn default_max_age_days() -> u32 {
    90
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_concurrent() -> usize {
    4
}

fn default_requests_per_minute() -> u32 {
    60
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("ip_threat_cache.json")
}

fn default_test_ratio() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

impl Default for ThreatIntelConfig {
    fn default() -> Self {
        ThreatIntelConfig {
            api_url:                default_api_url(),
            api_key_env:            default_api_key_env(),
            max_age_days:           default_max_age_days(),
            timeout_secs:           default_timeout_secs(),
            max_concurrent_lookups: default_max_concurrent(),
            requests_per_minute:    default_requests_per_minute(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig { path: default_cache_path() }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            test_ratio: default_test_ratio(),
            seed:       default_seed(),
            max_depth:  None,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Nu s-a putut citi fișierul de configurare: '{}'", path))?;

        Self::from_toml(&content).with_context(|| format!("Eroare la parsarea TOML din '{}'", path))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let ratio = self.model.test_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            bail!("model.test_ratio trebuie să fie în intervalul (0, 1), găsit {}", ratio);
        }
        if self.threat_intel.max_concurrent_lookups == 0 {
            bail!("threat_intel.max_concurrent_lookups trebuie să fie cel puțin 1");
        }
        if self.threat_intel.requests_per_minute == 0 {
            bail!("threat_intel.requests_per_minute trebuie să fie cel puțin 1");
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Cheia API a serviciului de reputație.
    //
    // Întâi încărcăm `.env` (dacă există - lipsa lui nu e o eroare), apoi
    // citim variabila numită în `threat_intel.api_key_env`. Fără cheie,
    // pipeline-ul nu pornește.
    // ---------------------------------------------------------------------------
    pub fn api_key(&self) -> Result<String> {
        if let Some(e) = env_file_problem(dotenvy::dotenv()) {
            warn!(error = %e, "fișierul .env nu a putut fi citit complet");
        }

        let var = &self.threat_intel.api_key_env;
        match env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => bail!(
                "{} nu a fost găsit. Creați un fișier .env în rădăcina proiectului cu linia {}=<cheia voastră>",
                var,
                var
            ),
        }
    }
}

/// Un `.env` absent e normal; orice altă eroare (ex: linie malformată)
/// merită semnalată, altfel apare doar ca "cheie negăsită".
fn env_file_problem<T>(result: Result<T, dotenvy::Error>) -> Option<dotenvy::Error> {
    match result {
        Ok(_) => None,
        Err(e) if e.not_found() => None,
        Err(e) => Some(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::from_toml("[input]\nlog_path = \"data/system.log\"\n").unwrap();

        assert_eq!(config.input.log_path, PathBuf::from("data/system.log"));
        assert_eq!(config.threat_intel.api_key_env, "ABUSEIPDB_KEY");
        assert_eq!(config.threat_intel.max_age_days, 90);
        assert_eq!(config.cache.path, PathBuf::from("ip_threat_cache.json"));
        assert_eq!(config.model.seed, 42);
        assert!(config.output.features_path.is_none());
    }

    #[test]
    fn overrides_are_read() {
        let toml = r#"
            [input]
            log_path = "x.log"

            [threat_intel]
            max_concurrent_lookups = 1
            requests_per_minute = 30

            [model]
            test_ratio = 0.25
            max_depth = 4

            [output]
            features_path = "features.json"
        "#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.threat_intel.max_concurrent_lookups, 1);
        assert_eq!(config.threat_intel.requests_per_minute, 30);
        assert_eq!(config.model.max_depth, Some(4));
        assert_eq!(config.output.features_path, Some(PathBuf::from("features.json")));
    }

    #[test]
    fn missing_input_section_is_an_error() {
        assert!(Config::from_toml("[cache]\npath = \"c.json\"\n").is_err());
    }

    #[test]
    fn bad_test_ratio_is_rejected() {
        let toml = "[input]\nlog_path = \"x\"\n[model]\ntest_ratio = 1.5\n";
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let mut config = Config::from_toml("[input]\nlog_path = \"x\"\n").unwrap();
        config.threat_intel.api_key_env = "CTA_TEST_KEY_THAT_IS_NEVER_SET".to_string();

        let err = config.api_key().unwrap_err().to_string();
        assert!(err.contains("CTA_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn absent_env_file_is_not_a_problem() {
        let dir = tempfile::tempdir().unwrap();
        let result = dotenvy::from_path(dir.path().join(".env"));
        assert!(env_file_problem(result).is_none());
    }

    #[test]
    fn malformed_env_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "CTA_TEST_BROKEN_LINE='fără ghilimea de închidere\n").unwrap();

        let problem = env_file_problem(dotenvy::from_path(&path));
        assert!(problem.is_some());
        assert!(!problem.unwrap().not_found());
    }
}
