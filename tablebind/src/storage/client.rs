use crate::error::AppError;
use crate::info;
use crate::storage::account::StorageAccount;
use crate::storage::table::CloudTable;
use once_cell::sync::Lazy;
use redb::{Database, TableHandle};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, Weak};

/// A redb file may only be opened once per process, so clients of the same account share one handle.
/// Entries are weak; the database closes when the last client, table or query referencing it is dropped.
static OPEN_DATABASES: Lazy<Mutex<HashMap<PathBuf, Weak<Database>>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn open_database(account: &StorageAccount) -> Result<Arc<Database>, AppError> {
    let db_path = account.db_path();
    let mut builder = Database::builder();
    if let Some(bytes) = account.cache_size_bytes() {
        builder.set_cache_size(bytes);
    }
    let mut open = OPEN_DATABASES.lock()?;
    if let Some(db) = open.get(&db_path).and_then(Weak::upgrade) {
        return Ok(db);
    }
    fs::create_dir_all(account.data_dir())?;
    info!("Opening table storage account '{}' at {:?}", account.name(), db_path);
    let db = Arc::new(builder.create(&db_path)?);
    open.retain(|_, weak| weak.strong_count() > 0);
    open.insert(db_path, Arc::downgrade(&db));
    Ok(db)
}

/// Entry point to the tables of one storage account.
#[derive(Clone)]
pub struct TableClient {
    account_name: String,
    db: Arc<Database>,
}

impl TableClient {
    pub fn open(account: &StorageAccount) -> Result<Self, AppError> {
        let db = open_database(account)?;
        Ok(TableClient { account_name: account.name().to_string(), db })
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Returns a reference to `table_name`; the table itself may not exist yet.
    pub fn get_table_reference(&self, table_name: &str) -> Result<CloudTable, AppError> {
        validate_table_name(table_name)?;
        Ok(CloudTable::new(table_name, self.db.clone()))
    }

    pub fn list_tables(&self) -> Result<Vec<String>, AppError> {
        let tx = self.db.begin_read()?;
        let mut names: Vec<String> = tx.list_tables()?.map(|handle| handle.name().to_string()).collect();
        names.sort();
        Ok(names)
    }
}

/// Table names follow the usual table-storage rule: a letter followed by 2-62 letters or digits.
pub fn validate_table_name(table_name: &str) -> Result<(), AppError> {
    let mut chars = table_name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_alphanumeric = chars.all(|c| c.is_ascii_alphanumeric());
    if starts_with_letter && rest_alphanumeric && (3..=63).contains(&table_name.len()) {
        Ok(())
    } else {
        Err(AppError::InvalidTableName(format!(
            "'{}' must start with a letter and contain 3-63 letters or digits",
            table_name
        )))
    }
}
