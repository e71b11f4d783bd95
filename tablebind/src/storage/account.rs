use crate::error::AppError;
use crate::storage::client::TableClient;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEVELOPMENT_ACCOUNT_NAME: &str = "devstoreaccount1";

const ACCOUNT_NAME: &str = "AccountName";
const DATA_DIR: &str = "DataDir";
const CACHE_SIZE_MB: &str = "CacheSizeMb";
const USE_DEVELOPMENT_STORAGE: &str = "UseDevelopmentStorage";
const BYTES_PER_MB: usize = 1024 * 1024;

/// Table storage account resolved from a connection string.
///
/// An account is a single redb file `<DataDir>/<AccountName>.redb` holding all of its tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageAccount {
    name: String,
    data_dir: PathBuf,
    cache_size_mb: Option<usize>,
}

impl StorageAccount {
    pub fn new(name: &str, data_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        validate_account_name(name)?;
        let data_dir = data_dir.into();
        if data_dir.as_os_str().is_empty() {
            return Err(invalid(format!("{} must not be empty", DATA_DIR)));
        }
        Ok(StorageAccount { name: name.to_string(), data_dir, cache_size_mb: None })
    }

    /// Local development account living under the system temp dir.
    pub fn development() -> Self {
        StorageAccount {
            name: DEVELOPMENT_ACCOUNT_NAME.to_string(),
            data_dir: env::temp_dir().join("tablebind").join(DEVELOPMENT_ACCOUNT_NAME),
            cache_size_mb: None,
        }
    }

    /// Fails if the size in bytes does not fit in `usize`.
    pub fn with_cache_size_mb(mut self, cache_size_mb: usize) -> Result<Self, AppError> {
        if cache_size_mb.checked_mul(BYTES_PER_MB).is_none() {
            return Err(invalid(format!("{} {} overflows the addressable cache size", CACHE_SIZE_MB, cache_size_mb)));
        }
        self.cache_size_mb = Some(cache_size_mb);
        Ok(self)
    }

    /// Parses `Key=Value` pairs separated by `;`, e.g. `AccountName=orders;DataDir=/var/lib/tables`.
    pub fn parse(connection_string: &str) -> Result<Self, AppError> {
        let settings = parse_settings(connection_string)?;

        if let Some(dev) = settings.get(USE_DEVELOPMENT_STORAGE) {
            if !dev.eq_ignore_ascii_case("true") {
                return Err(invalid(format!("{} must be 'true', got '{}'", USE_DEVELOPMENT_STORAGE, dev)));
            }
            if settings.len() > 1 {
                return Err(invalid(format!("{} cannot be combined with other settings", USE_DEVELOPMENT_STORAGE)));
            }
            return Ok(StorageAccount::development());
        }

        let name = settings.get(ACCOUNT_NAME).ok_or_else(|| invalid(format!("missing {}", ACCOUNT_NAME)))?;
        let data_dir = settings.get(DATA_DIR).ok_or_else(|| invalid(format!("missing {}", DATA_DIR)))?;
        let mut account = StorageAccount::new(name, data_dir.as_str())?;
        if let Some(cache) = settings.get(CACHE_SIZE_MB) {
            let mb = cache
                .parse::<usize>()
                .map_err(|e| invalid(format!("{} '{}' is not a number: {}", CACHE_SIZE_MB, cache, e)))?;
            account = account.with_cache_size_mb(mb)?;
        }
        Ok(account)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache_size_mb(&self) -> Option<usize> {
        self.cache_size_mb
    }

    pub fn cache_size_bytes(&self) -> Option<usize> {
        self.cache_size_mb.and_then(|mb| mb.checked_mul(BYTES_PER_MB))
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.redb", self.name))
    }

    pub fn create_table_client(&self) -> Result<TableClient, AppError> {
        TableClient::open(self)
    }
}

impl FromStr for StorageAccount {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StorageAccount::parse(s)
    }
}

impl fmt::Display for StorageAccount {
    /// Renders a connection string that parses back into an equal account.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={};{}={}", ACCOUNT_NAME, self.name, DATA_DIR, self.data_dir.display())?;
        if let Some(mb) = self.cache_size_mb {
            write!(f, ";{}={}", CACHE_SIZE_MB, mb)?;
        }
        Ok(())
    }
}

fn invalid(message: String) -> AppError {
    AppError::InvalidConnectionString(message)
}

fn parse_settings(connection_string: &str) -> Result<HashMap<String, String>, AppError> {
    if connection_string.trim().is_empty() {
        return Err(invalid("connection string is empty".to_string()));
    }
    let mut settings = HashMap::new();
    for segment in connection_string.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let (key, value) = segment
            .split_once('=')
            .ok_or_else(|| invalid(format!("settings must be of the form 'name=value', got '{}'", segment)))?;
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() {
            return Err(invalid(format!("empty setting name in '{}'", segment)));
        }
        if value.is_empty() {
            return Err(invalid(format!("setting '{}' has an empty value", key)));
        }
        if ![ACCOUNT_NAME, DATA_DIR, CACHE_SIZE_MB, USE_DEVELOPMENT_STORAGE].contains(&key) {
            return Err(invalid(format!("unknown setting '{}'", key)));
        }
        if settings.insert(key.to_string(), value.to_string()).is_some() {
            return Err(invalid(format!("duplicate setting '{}'", key)));
        }
    }
    Ok(settings)
}

fn validate_account_name(name: &str) -> Result<(), AppError> {
    let valid_len = (3..=24).contains(&name.len());
    let valid_chars = name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if valid_len && valid_chars {
        Ok(())
    } else {
        Err(invalid(format!(
            "account name '{}' must be 3-24 lowercase letters or digits",
            name
        )))
    }
}
