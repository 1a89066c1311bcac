use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://pokeapi.co/api/v2";
/// Highest creature id a round may draw (Gen 1 through the first Gen 2 entries).
pub const DEFAULT_TOTAL: u32 = 173;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const MAX_TOTAL: u32 = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base: String,
    pub total: u32,
    pub catalog_limit: u32,
    /// Zero disables the request timeout.
    pub http_timeout_secs: u64,
    pub seed: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            total: DEFAULT_TOTAL,
            catalog_limit: DEFAULT_TOTAL,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            seed: None,
            log_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base = lookup("POKEGUESS_API_BASE")
            .map(|val| val.trim().trim_end_matches('/').to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let total = lookup("POKEGUESS_TOTAL")
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_TOTAL)
            .clamp(1, MAX_TOTAL);
        let catalog_limit = lookup("POKEGUESS_CATALOG_LIMIT")
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(total)
            .clamp(1, MAX_TOTAL);
        let http_timeout_secs = lookup("POKEGUESS_HTTP_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
            .min(300);
        let seed = lookup("POKEGUESS_SEED").and_then(|val| val.trim().parse::<u64>().ok());
        let log_file = lookup("POKEGUESS_LOG_FILE")
            .filter(|val| !val.trim().is_empty())
            .map(PathBuf::from);

        Self {
            api_base,
            total,
            catalog_limit,
            http_timeout_secs,
            seed,
            log_file,
        }
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        if self.http_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.http_timeout_secs))
        }
    }
}

pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}
