use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::pipeline::ExportFormat;

pub const DEFAULT_DB_PATH: &str = "data/reports.sqlite";
pub const DEFAULT_EXPORT_DIR: &str = "exports";
const CONFIG_FILE: &str = "agent_reports.toml";
const ENV_PREFIX: &str = "REPORTS";

/// Runtime settings: `agent_reports.toml` (optional), then `REPORTS_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: PathBuf,
    pub export_dir: PathBuf,
    /// `html` or `txt`
    pub default_format: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::build(Path::new(CONFIG_FILE), Environment::with_prefix(ENV_PREFIX))
    }

    fn build(file: &Path, env: Environment) -> Result<Self> {
        Config::builder()
            .set_default("db_path", DEFAULT_DB_PATH)?
            .set_default("export_dir", DEFAULT_EXPORT_DIR)?
            .set_default("default_format", "html")?
            .add_source(File::from(file).required(false))
            .add_source(env)
            .build()
            .context("reading settings")?
            .try_deserialize()
            .context("invalid settings")
    }

    pub fn export_format(&self) -> Result<ExportFormat> {
        Ok(self.default_format.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn defaults_without_file_or_env() {
        let s = Settings::build(Path::new("does/not/exist.toml"), env(&[])).unwrap();
        assert_eq!(s.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(s.export_dir, PathBuf::from(DEFAULT_EXPORT_DIR));
        assert_eq!(s.export_format().unwrap(), ExportFormat::Html);
    }

    #[test]
    fn env_overrides() {
        let s = Settings::build(
            Path::new("does/not/exist.toml"),
            env(&[("REPORTS_DB_PATH", "/tmp/x.sqlite"), ("REPORTS_DEFAULT_FORMAT", "txt")]),
        )
        .unwrap();
        assert_eq!(s.db_path, PathBuf::from("/tmp/x.sqlite"));
        assert_eq!(s.export_format().unwrap(), ExportFormat::Text);
    }

    #[test]
    fn bad_format_is_an_error() {
        let s = Settings::build(
            Path::new("does/not/exist.toml"),
            env(&[("REPORTS_DEFAULT_FORMAT", "pdf")]),
        )
        .unwrap();
        assert!(s.export_format().is_err());
    }
}
