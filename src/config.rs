use anyhow::Context;
use log::info;
use serde::Deserialize;
use std::{fs::File, io::ErrorKind, path::PathBuf, time::Duration};

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted location list and settings
    pub data_dir: PathBuf,
    pub geocoding_host: String,
    /// Maximum number of candidates requested per search
    pub result_count: u32,
    pub language: String,
    pub request_timeout_secs: u64,
}

impl Config {
    const PATH: &'static str = "./config.json";

    /// Load config from the working directory. A missing file isn't an error,
    /// we just use the defaults
    pub fn load() -> anyhow::Result<Self> {
        info!("Loading config from `{}`", Self::PATH);
        let file = match File::open(Self::PATH) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("No config file at `{}`, using defaults", Self::PATH);
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).context(format!(
                    "Error opening config file {}",
                    Self::PATH
                ))
            }
        };
        serde_json::from_reader(file)
            .context(format!("Error parsing config file {}", Self::PATH))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "./data".into(),
            geocoding_host: "https://geocoding-api.open-meteo.com".into(),
            result_count: 10,
            language: "en".into(),
            request_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config() {
        let config: Config =
            serde_json::from_str(r#"{"data_dir": "/tmp/clocks", "result_count": 5}"#)
                .unwrap();
        assert_eq!(
            config,
            Config {
                data_dir: "/tmp/clocks".into(),
                result_count: 5,
                ..Config::default()
            }
        );
    }
}
