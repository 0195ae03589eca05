//! Settings file and environment.
//!
//! The settings file is YAML with everything below a top-level `settings:`
//! key. Secrets never live in it; they come from the environment, which may
//! be seeded from a `.env` file.

use serde::Deserialize;
use shopsync_adapters::{CatalogSettings, CcvSettings, MappingSettings};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default settings file, relative to the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = "settings.yaml";

/// Environment variable names.
pub mod env {
    /// Public API key.
    pub const PUBLIC_KEY: &str = "CCVSHOP_PUBLIC_KEY";
    /// Secret API key.
    pub const SECRET_KEY: &str = "CCVSHOP_SECRET_KEY";
    /// Shop base URL, overriding `ccv_shop.url`.
    pub const URL: &str = "CCVSHOP_URL";
    /// Settings file path.
    pub const SETTINGS_PATH: &str = "SETTINGS_PATH";
}

/// Errors raised while reading settings or the environment.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid YAML or has the wrong layout.
    #[error("invalid settings file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A setting is missing or invalid.
    #[error("invalid settings: {0}")]
    Invalid(String),

    /// A required environment variable is not set.
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    /// The `.env` file could not be loaded.
    #[error("cannot load env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

/// Worker and failure settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Concurrent per-product load jobs.
    pub workers: usize,
    /// Keep syncing past per-entity failures.
    pub continue_on_failure: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            workers: 10,
            continue_on_failure: false,
        }
    }
}

/// Everything below the `settings:` key.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Destination shop.
    pub ccv_shop: CcvSettings,
    /// Value mappings.
    pub mapping: MappingSettings,
    /// Catalog source.
    pub catalog: CatalogSettings,
    /// Run behaviour.
    pub sync: SyncSettings,
}

#[derive(Deserialize)]
struct SettingsFile {
    settings: Settings,
}

impl Settings {
    /// Parses and validates settings YAML.
    pub fn from_yaml(text: &str) -> Result<Self, SettingsError> {
        let file: SettingsFile = serde_yaml::from_str(text)?;
        file.settings.validate()?;
        Ok(file.settings)
    }

    /// Reads a settings file.
    ///
    /// A relative catalog path is resolved against the directory of the
    /// settings file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::from_yaml(&text)?;
        if settings.catalog.path.is_relative() {
            if let Some(dir) = path.parent() {
                settings.catalog.path = dir.join(&settings.catalog.path);
            }
        }
        Ok(settings)
    }

    /// Checks the settings the run cannot do without.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.ccv_shop
            .validate()
            .map_err(|e| SettingsError::Invalid(e.to_string()))?;
        for (name, value) in [
            ("ccv_shop.color_category", &self.ccv_shop.color_category),
            ("ccv_shop.sizing_category", &self.ccv_shop.sizing_category),
        ] {
            if value.trim().is_empty() {
                return Err(SettingsError::Invalid(format!("{name} is required")));
            }
        }
        if self.sync.workers == 0 {
            return Err(SettingsError::Invalid("sync.workers must be positive".into()));
        }
        Ok(())
    }
}

/// API credentials and endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Shop base URL.
    pub url: String,
    /// Public key.
    pub public_key: String,
    /// Secret key.
    pub secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("public_key", &self.public_key)
            .field("secret_key", &"***")
            .finish()
    }
}

impl Credentials {
    /// Reads credentials from the process environment.
    pub fn from_env(settings: &Settings) -> Result<Self, SettingsError> {
        Self::from_lookup(settings, |name| std::env::var(name).ok())
    }

    /// Reads credentials through `lookup`; empty values count as unset.
    pub fn from_lookup(
        settings: &Settings,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        let get = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
        let url = get(env::URL)
            .or_else(|| settings.ccv_shop.url.clone())
            .ok_or(SettingsError::MissingEnv(env::URL))?;
        Ok(Self {
            url,
            public_key: get(env::PUBLIC_KEY).ok_or(SettingsError::MissingEnv(env::PUBLIC_KEY))?,
            secret_key: get(env::SECRET_KEY).ok_or(SettingsError::MissingEnv(env::SECRET_KEY))?,
        })
    }
}

/// Seeds the environment from `path`, or from `./.env` if it exists.
///
/// Variables already set win over the file.
pub fn load_env_file(path: Option<&Path>) -> Result<(), SettingsError> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}

/// Settings file path from `SETTINGS_PATH`, or the default.
pub fn settings_path() -> PathBuf {
    std::env::var_os(env::SETTINGS_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const YAML: &str = r#"
settings:
  ccv_shop:
    root_category: Werkkleding
    color_category: Kleur
    sizing_category: Maat
    brand: Tricorp
    additional_categories: [Nieuw binnen]
    url: https://shop.example.com
  mapping:
    color:
      nvy: Navy
      blk: Zwart
    size:
      XXL: 2XL
    category:
      Jackets: Jassen
  catalog:
    path: catalog.json
    excluded_product_types: [Sokken]
  sync:
    workers: 4
"#;

    #[test]
    fn parses_the_settings_key() {
        let settings = Settings::from_yaml(YAML).unwrap();
        assert_eq!(settings.ccv_shop.root_category, "Werkkleding");
        assert_eq!(settings.mapping.color_reference(), ["navy", "zwart"]);
        assert_eq!(settings.mapping.size.get("XXL"), Some("2XL"));
        assert_eq!(settings.sync.workers, 4);
        assert!(!settings.sync.continue_on_failure);
        assert!(settings.catalog.is_excluded("SOKKEN"));
    }

    #[test]
    fn missing_root_category_is_invalid() {
        let yaml = YAML.replace("root_category: Werkkleding", "root_category: ''");
        let err = Settings::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn settings_without_top_level_key_are_rejected() {
        let err = Settings::from_yaml("ccv_shop:\n  root_category: X\n").unwrap_err();
        assert!(matches!(err, SettingsError::Yaml(_)));
    }

    #[test]
    fn catalog_path_is_relative_to_the_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, YAML).unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.catalog.path, dir.path().join("catalog.json"));

        let err = Settings::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn credentials_from_lookup() {
        let settings = Settings::from_yaml(YAML).unwrap();
        let vars: HashMap<&str, &str> =
            HashMap::from([(env::PUBLIC_KEY, "pub"), (env::SECRET_KEY, "secret")]);
        let creds =
            Credentials::from_lookup(&settings, |k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(creds.url, "https://shop.example.com");
        assert!(!format!("{creds:?}").contains("secret\""));

        let vars: HashMap<&str, &str> = HashMap::from([
            (env::PUBLIC_KEY, "pub"),
            (env::SECRET_KEY, " "),
            (env::URL, "https://other.example.com"),
        ]);
        let err = Credentials::from_lookup(&settings, |k| vars.get(k).map(|v| v.to_string()))
            .unwrap_err();
        assert!(matches!(err, SettingsError::MissingEnv(env::SECRET_KEY)));
    }
}
