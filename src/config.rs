use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use snafu::{ensure, ResultExt};
use url::Url;

use crate::error::{ApplicationError, ConfigLoadSnafu, NoAccountsSnafu};

pub fn load() -> Result<Config, ApplicationError> {
    let config = envy::from_env::<Config>().context(ConfigLoadSnafu)?;
    validate(config)
}

fn validate(config: Config) -> Result<Config, ApplicationError> {
    ensure!(!config.accounts().is_empty(), NoAccountsSnafu);
    Ok(config)
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Slack incoming-webhook URL. Missing or unparseable is fatal.
    pub slack_webhook: Url,

    /// Comma-separated account handles, checked in the order given.
    #[serde(default)]
    pub accounts: String,

    #[serde(default = "default_threshold")]
    pub threshold: u64,

    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Base URL of the scraper sidecar that talks the platform protocol.
    #[serde(default = "default_scraper_url")]
    pub scraper_url: Url,

    #[serde(default = "default_account_delay")]
    pub account_delay_secs: u64,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Config {
    pub fn accounts(&self) -> Vec<&str> {
        self.accounts
            .split(',')
            .map(str::trim)
            .filter(|handle| !handle.is_empty())
            .collect()
    }

    pub fn account_delay(&self) -> Duration {
        Duration::from_secs(self.account_delay_secs)
    }
}

fn default_threshold() -> u64 {
    10_000
}

fn default_database() -> PathBuf {
    PathBuf::from("monitor_state.db")
}

fn default_scraper_url() -> Url {
    Url::parse("http://127.0.0.1:5000").expect("static url is valid")
}

fn default_account_delay() -> u64 {
    2
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> Result<Config, envy::Error> {
        let iter = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()));
        envy::from_iter::<_, Config>(iter)
    }

    #[test]
    fn defaults_apply() {
        let config = from_vars(&[
            ("SLACK_WEBHOOK", "https://hooks.slack.com/services/T/B/X"),
            ("ACCOUNTS", "alice,bob"),
        ])
        .unwrap();

        assert_eq!(config.threshold, 10_000);
        assert_eq!(config.database, PathBuf::from("monitor_state.db"));
        assert_eq!(config.account_delay(), Duration::from_secs(2));
    }

    #[test]
    fn accounts_are_trimmed_and_ordered() {
        let config = from_vars(&[
            ("SLACK_WEBHOOK", "https://hooks.slack.com/services/T/B/X"),
            ("ACCOUNTS", " alice, bob ,,charlie"),
        ])
        .unwrap();

        assert_eq!(config.accounts(), vec!["alice", "bob", "charlie"]);
    }

    #[test]
    fn missing_webhook_is_an_error() {
        let result = from_vars(&[("ACCOUNTS", "alice")]);
        assert!(result.is_err());
    }

    #[test]
    fn empty_webhook_is_an_error() {
        let result = from_vars(&[("SLACK_WEBHOOK", ""), ("ACCOUNTS", "alice")]);
        assert!(result.is_err());
    }

    #[test]
    fn empty_account_list_is_fatal() {
        let config = from_vars(&[
            ("SLACK_WEBHOOK", "https://hooks.slack.com/services/T/B/X"),
            ("ACCOUNTS", " , "),
        ])
        .unwrap();

        assert!(validate(config).is_err());
    }

    #[test]
    fn custom_threshold_is_parsed() {
        let config = from_vars(&[
            ("SLACK_WEBHOOK", "https://hooks.slack.com/services/T/B/X"),
            ("ACCOUNTS", "alice"),
            ("THRESHOLD", "500"),
        ])
        .unwrap();

        assert_eq!(config.threshold, 500);
    }
}
