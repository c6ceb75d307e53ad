// ⚙️ Config - runtime settings from the environment
//
// A `.env` file in the working directory is loaded first; variables already
// set in the process environment win.

use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DB_PATH: &str = "data/database.db";
pub const DEFAULT_RAW_EXPORT: &str = "data/raw_sales_data.xlsx";
pub const DEFAULT_CLEAN_EXPORT: &str = "data/clean_sales_data.xlsx";

/// First month the portal has data for
pub const DEFAULT_START_YEAR: i32 = 2023;
pub const DEFAULT_START_MONTH: u32 = 11;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub login_url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub login_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub start_year: i32,
    pub start_month: u32,
    pub raw_export_path: PathBuf,
    pub clean_export_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            login_url: None,
            username: None,
            password: None,
            start_year: DEFAULT_START_YEAR,
            start_month: DEFAULT_START_MONTH,
            raw_export_path: PathBuf::from(DEFAULT_RAW_EXPORT),
            clean_export_path: PathBuf::from(DEFAULT_CLEAN_EXPORT),
        }
    }
}

impl Config {
    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Config::default();

        Ok(Config {
            db_path: get("LAUNDRY_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            login_url: get("LOGIN_URL"),
            username: get("USERNAME"),
            password: get("PASSWORD"),
            start_year: parse_var("COLLECT_START_YEAR", get("COLLECT_START_YEAR"))?
                .unwrap_or(defaults.start_year),
            start_month: parse_var("COLLECT_START_MONTH", get("COLLECT_START_MONTH"))?
                .unwrap_or(defaults.start_month),
            raw_export_path: get("RAW_EXPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.raw_export_path),
            clean_export_path: get("CLEAN_EXPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.clean_export_path),
        })
    }

    /// Portal credentials; only the live collector needs them
    pub fn credentials(&self) -> Result<Credentials> {
        let missing = |key: &str| anyhow!("{} is not set (environment or .env)", key);

        Ok(Credentials {
            login_url: self.login_url.clone().ok_or_else(|| missing("LOGIN_URL"))?,
            username: self.username.clone().ok_or_else(|| missing("USERNAME"))?,
            password: self.password.clone().ok_or_else(|| missing("PASSWORD"))?,
        })
    }
}

fn parse_var<T>(key: &str, value: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.start_year, 2023);
        assert_eq!(config.start_month, 11);
        assert!(config.credentials().is_err());
    }

    #[test]
    fn test_overrides_and_credentials() {
        let config = Config::from_lookup(lookup_from(&[
            ("LAUNDRY_DB_PATH", "/tmp/sales.db"),
            ("LOGIN_URL", "https://portal.example/login"),
            ("USERNAME", "owner"),
            ("PASSWORD", "secret"),
            ("COLLECT_START_YEAR", "2024"),
            ("COLLECT_START_MONTH", " 3 "),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/sales.db"));
        assert_eq!((config.start_year, config.start_month), (2024, 3));

        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.username, "owner");
        assert_eq!(credentials.login_url, "https://portal.example/login");
    }

    #[test]
    fn test_empty_value_counts_as_unset() {
        let config = Config::from_lookup(lookup_from(&[("USERNAME", "  ")])).unwrap();
        assert!(config.username.is_none());
    }

    #[test]
    fn test_malformed_number_names_variable() {
        let err = Config::from_lookup(lookup_from(&[("COLLECT_START_MONTH", "nov")])).unwrap_err();
        assert!(err.to_string().contains("COLLECT_START_MONTH"));
    }
}
