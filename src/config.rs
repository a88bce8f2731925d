use std::path::PathBuf;

use eyre::Context;

use crate::{Backpressure, Config, Level};

pub const LEVEL_VAR: &str = "FANLOG_LEVEL";
pub const FORMAT_VAR: &str = "FANLOG_FORMAT";
pub const FILE_VAR: &str = "FANLOG_FILE";
pub const CAPACITY_VAR: &str = "FANLOG_FILE_CAPACITY";
pub const BACKPRESSURE_VAR: &str = "FANLOG_BACKPRESSURE";

impl Config {
    /// Defaults overridden by the `FANLOG_*` environment variables.
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading variables through
    /// `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> eyre::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Config::new();

        if let Some(level) = get(LEVEL_VAR) {
            config.threshold = level
                .parse::<Level>()
                .with_context(|| format!("Invalid value for {}", LEVEL_VAR))?;
        }

        if let Some(format) = get(FORMAT_VAR) {
            config.long_format = match format.trim().to_ascii_lowercase().as_str() {
                "short" => false,
                "long" => true,
                other => {
                    return Err(eyre::eyre!(
                        "Invalid value for {}: '{}', expected short or long",
                        FORMAT_VAR,
                        other
                    ))
                }
            };
        }

        if let Some(file) = get(FILE_VAR) {
            config.file = Some(PathBuf::from(file));
        }

        if let Some(capacity) = get(CAPACITY_VAR) {
            config.file_options.capacity = capacity
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid value for {}", CAPACITY_VAR))?;
        }

        if let Some(policy) = get(BACKPRESSURE_VAR) {
            config.file_options.backpressure = policy
                .parse::<Backpressure>()
                .with_context(|| format!("Invalid value for {}", BACKPRESSURE_VAR))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.threshold, Level::All);
        assert!(!config.long_format);
        assert!(config.file.is_none());
        assert_eq!(config.file_options.capacity, 0);
        assert_eq!(config.file_options.backpressure, Backpressure::Block);
    }

    #[test]
    fn every_variable_is_applied() {
        let config = Config::from_lookup(lookup(&[
            (LEVEL_VAR, "warn"),
            (FORMAT_VAR, "LONG"),
            (FILE_VAR, "/var/log/app.log"),
            (CAPACITY_VAR, "128"),
            (BACKPRESSURE_VAR, "timeout:50"),
        ]))
        .unwrap();

        assert_eq!(config.threshold, Level::Warn);
        assert!(config.long_format);
        assert_eq!(config.file, Some(PathBuf::from("/var/log/app.log")));
        assert_eq!(config.file_options.capacity, 128);
        assert_eq!(
            config.file_options.backpressure,
            Backpressure::Timeout(Duration::from_millis(50))
        );
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = Config::from_lookup(lookup(&[(LEVEL_VAR, "  "), (FILE_VAR, "")])).unwrap();

        assert_eq!(config.threshold, Level::All);
        assert!(config.file.is_none());
    }

    #[test]
    fn errors_name_the_variable() {
        let err = Config::from_lookup(lookup(&[(CAPACITY_VAR, "lots")])).unwrap_err();
        assert!(err.to_string().contains(CAPACITY_VAR), "{err}");

        let err = Config::from_lookup(lookup(&[(FORMAT_VAR, "json")])).unwrap_err();
        assert!(err.to_string().contains(FORMAT_VAR), "{err}");

        let err = Config::from_lookup(lookup(&[(LEVEL_VAR, "loud")])).unwrap_err();
        assert!(err.to_string().contains(LEVEL_VAR), "{err}");
    }
}
