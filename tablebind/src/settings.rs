use crate::error::AppError;
use crate::storage::query::DEFAULT_PAGE_SIZE;
use config::{Config, Environment, File};
use serde::Deserialize;

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub storage: StorageSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub connection_string: String,
    #[serde(default = "default_page_size")]
    pub query_page_size: usize,
}

impl AppConfig {
    /// Loads `path` (any format the `config` crate recognizes by extension) with `TABLEBIND__` env overrides,
    /// e.g. `TABLEBIND__STORAGE__CONNECTION_STRING`.
    pub fn new(path: &str) -> Result<Self, AppError> {
        let builder =
            Config::builder()
                .add_source(File::with_name(path).required(true))
                .add_source(Environment::with_prefix("TABLEBIND").try_parsing(true).separator("__"));
        Ok(builder.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(name: &str, contents: &str) -> String {
        let dir = std::env::temp_dir().join("tablebind").join(format!("{}_{}", name, rand::random::<u64>()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn loads_storage_settings_from_file() {
        let path = write_config("settings_full", "[storage]\nconnection_string = \"AccountName=shop;DataDir=/tmp/shop\"\nquery_page_size = 50\n");
        let config = AppConfig::new(&path).unwrap();
        assert_eq!(config.storage.connection_string, "AccountName=shop;DataDir=/tmp/shop");
        assert_eq!(config.storage.query_page_size, 50);
    }

    #[test]
    fn page_size_defaults_when_omitted() {
        let path = write_config("settings_default", "[storage]\nconnection_string = \"UseDevelopmentStorage=true\"\n");
        assert_eq!(AppConfig::new(&path).unwrap().storage.query_page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let err = AppConfig::new("/nonexistent/tablebind/settings.toml").unwrap_err();
        assert_eq!(err.class(), crate::ErrorClass::Configuration);
    }
}
