use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::domain::{ByteOrder, VariableName};
use crate::error::PiomasError;
use crate::psc::DEFAULT_BASE_URL;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub dest_dir: String,
    #[serde(default)]
    pub output: Option<String>,
    pub variables: VariablesEntry,
    pub years: Vec<i32>,
    #[serde(default)]
    pub byte_order: Option<ByteOrder>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Either the literal string `"all"` or an explicit list of short names.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum VariablesEntry {
    Shorthand(String),
    Listed(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub dest_dir: Utf8PathBuf,
    pub output: Option<Utf8PathBuf>,
    pub variables: Vec<VariableName>,
    pub years: Vec<i32>,
    pub byte_order: ByteOrder,
    pub base_url: String,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, PiomasError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("piomas.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Err(PiomasError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| PiomasError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| PiomasError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, PiomasError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let variables = match config.variables {
            VariablesEntry::Shorthand(value) if value == "all" => catalog::supported_names()
                .map(|name| name.parse())
                .collect::<Result<Vec<_>, PiomasError>>()?,
            VariablesEntry::Shorthand(value) => vec![value.parse()?],
            VariablesEntry::Listed(values) => values
                .iter()
                .map(|value| value.parse())
                .collect::<Result<Vec<_>, PiomasError>>()?,
        };

        Ok(ResolvedConfig {
            schema_version,
            dest_dir: Utf8PathBuf::from(config.dest_dir),
            output: config.output.map(Utf8PathBuf::from),
            variables,
            years: config.years,
            byte_order: config.byte_order.unwrap_or_default(),
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }
}
