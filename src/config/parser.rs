use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Settings given on the command line, applied on top of the file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub section_id: Option<u32>,
    pub pages: Option<u32>,
    pub workers: Option<u32>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copies every set field into `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(section_id) = self.section_id {
            config.forum.section_id = section_id;
        }
        if let Some(pages) = self.pages {
            config.forum.pages = pages;
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
    }
}

/// Reads, parses and validates a talkscan TOML file
///
/// ```no_run
/// use std::path::Path;
/// use talkscan::config::load_config;
///
/// let config = load_config(Path::new("talkscan.toml")).unwrap();
/// println!("Pages to scan: {}", config.forum.pages);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    validate(&config)?;
    Ok(config)
}

fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Hex SHA-256 of the raw file, logged so a report can be tied to its settings
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&content)))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    load_config_with_overrides(path, &ConfigOverrides::default())
}

/// Loads the file, applies command-line overrides and validates the result
///
/// The file is validated on its own first, so an error names the file
/// rather than a flag when both are wrong. The hash covers the file only.
pub fn load_config_with_overrides(
    path: &Path,
    overrides: &ConfigOverrides,
) -> Result<(Config, String), ConfigError> {
    let mut config = load_config(path)?;
    let hash = compute_config_hash(path)?;

    if !overrides.is_empty() {
        overrides.apply(&mut config);
        validate(&config).map_err(|e| match e {
            ConfigError::Validation(msg) => {
                ConfigError::Validation(format!("command-line override: {}", msg))
            }
            other => other,
        })?;
    }

    Ok((config, hash))
}
