use anyhow::Result;
use std::env;
use std::path::PathBuf;

use crate::db::Database;

pub const DEFAULT_API_HOST: &str = "indeed-jobs-api.p.rapidapi.com";

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub api_host: String,
    pub base_url: String,
}

impl SearchConfig {
    pub fn from_env() -> Self {
        let api_key = env::var("RAPID_API_KEY").unwrap_or_default();
        let api_host = env::var("RAPID_API_HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_HOST.to_string());
        let base_url = env::var("JOBTRACK_SEARCH_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| format!("https://{}", api_host));
        Self {
            api_key,
            api_host,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub search: SearchConfig,
}

impl Config {
    /// `--db` wins over `JOBTRACK_DB`, which wins over the platform data dir.
    pub fn load(db_override: Option<PathBuf>) -> Result<Self> {
        let db_path = db_override
            .or_else(|| env::var_os("JOBTRACK_DB").map(PathBuf::from))
            .unwrap_or_else(Database::default_path);
        Ok(Self {
            db_path,
            search: SearchConfig::from_env(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_db_path_wins() {
        let config = Config::load(Some(PathBuf::from("/tmp/elsewhere.db"))).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/elsewhere.db"));
        assert!(!config.search.base_url.ends_with('/'));
    }
}
