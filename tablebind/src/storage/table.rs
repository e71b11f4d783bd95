use crate::entity::{EntityProperties, TableEntity};
use crate::error::AppError;
use crate::info;
use chrono::{DateTime, SecondsFormat, Utc};
use redb::{Database, ReadOnlyTable, ReadableTable, TableDefinition, TableError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Bound;
use std::sync::Arc;

/// Rows are keyed by `(partition_key, row_key)`.
pub type EntityKey = (&'static str, &'static str);

/// Persisted form of one row; keys live in the redb key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub timestamp: DateTime<Utc>,
    pub etag: String,
    pub properties: EntityProperties,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub partition_key: String,
    pub row_key: String,
    pub record: StoredRecord,
}

impl StoredRow {
    /// Builds `T` the way table clients do: parameterless instance, system properties, then the rest.
    pub fn materialize<T: TableEntity + Default>(self) -> Result<T, AppError> {
        let mut entity = T::default();
        entity.set_partition_key(self.partition_key);
        entity.set_row_key(self.row_key);
        entity.set_timestamp(Some(self.record.timestamp));
        entity.set_etag(Some(self.record.etag));
        entity.read_entity(&self.record.properties)?;
        Ok(entity)
    }
}

/// Position right after the last row returned by a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationToken {
    partition_key: String,
    row_key: String,
}

impl ContinuationToken {
    pub fn after(partition_key: &str, row_key: &str) -> Self {
        ContinuationToken { partition_key: partition_key.to_string(), row_key: row_key.to_string() }
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    pub fn row_key(&self) -> &str {
        &self.row_key
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    partition_key: Option<String>,
}

impl QueryFilter {
    pub fn all() -> Self {
        QueryFilter::default()
    }

    pub fn partition(partition_key: &str) -> Self {
        QueryFilter { partition_key: Some(partition_key.to_string()) }
    }

    pub fn partition_key(&self) -> Option<&str> {
        self.partition_key.as_deref()
    }
}

/// One page of a query. `continuation` is set only if more matching rows exist.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySegment {
    pub rows: Vec<StoredRow>,
    pub continuation: Option<ContinuationToken>,
}

fn etag_for(timestamp: &DateTime<Utc>) -> String {
    format!("W/\"datetime'{}'\"", timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Reference to a named table of an account. Holding one does not imply the table exists.
#[derive(Clone)]
pub struct CloudTable {
    name: String,
    db: Arc<Database>,
}

impl CloudTable {
    pub(crate) fn new(name: &str, db: Arc<Database>) -> Self {
        CloudTable { name: name.to_string(), db }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn definition(&self) -> TableDefinition<'_, EntityKey, &'static [u8]> {
        TableDefinition::new(&self.name)
    }

    fn open_existing(&self) -> Result<ReadOnlyTable<EntityKey, &'static [u8]>, AppError> {
        let tx = self.db.begin_read()?;
        match tx.open_table(self.definition()) {
            Ok(table) => Ok(table),
            Err(TableError::TableDoesNotExist(_)) => Err(AppError::NotFound(format!("table '{}' does not exist", self.name))),
            Err(e) => Err(e.into()),
        }
    }

    pub fn exists(&self) -> Result<bool, AppError> {
        let tx = self.db.begin_read()?;
        match tx.open_table(self.definition()) {
            Ok(_) => Ok(true),
            Err(TableError::TableDoesNotExist(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns `true` if the table was created by this call.
    pub fn create_if_not_exists(&self) -> Result<bool, AppError> {
        if self.exists()? {
            return Ok(false);
        }
        let tx = self.db.begin_write()?;
        tx.open_table(self.definition())?;
        tx.commit()?;
        info!("Created table '{}'", self.name);
        Ok(true)
    }

    /// Returns `true` if the table existed and was deleted.
    pub fn delete_if_exists(&self) -> Result<bool, AppError> {
        let tx = self.db.begin_write()?;
        let deleted = tx.delete_table(self.definition())?;
        tx.commit()?;
        if deleted {
            info!("Deleted table '{}'", self.name);
        }
        Ok(deleted)
    }

    /// Stores `entity` under its keys, replacing any previous row, and returns the new etag.
    pub fn insert_or_replace<T: TableEntity>(&self, entity: &T) -> Result<String, AppError> {
        if !self.exists()? {
            return Err(AppError::NotFound(format!("table '{}' does not exist", self.name)));
        }
        let timestamp = Utc::now();
        let etag = etag_for(&timestamp);
        let record = StoredRecord { timestamp, etag: etag.clone(), properties: entity.write_entity()? };
        let bytes = serde_json::to_vec(&record)?;

        let tx = self.db.begin_write()?;
        {
            let mut table = tx.open_table(self.definition())?;
            table.insert((entity.partition_key(), entity.row_key()), bytes.as_slice())?;
        }
        tx.commit()?;
        Ok(etag)
    }

    /// Point lookup by keys; `NotFound` if the table is missing, `None` if the row is.
    pub fn retrieve<T: TableEntity + Default>(&self, partition_key: &str, row_key: &str) -> Result<Option<T>, AppError> {
        let table = self.open_existing()?;
        match table.get((partition_key, row_key))? {
            Some(guard) => {
                let record: StoredRecord = serde_json::from_slice(guard.value())?;
                let row = StoredRow { partition_key: partition_key.to_string(), row_key: row_key.to_string(), record };
                Ok(Some(row.materialize()?))
            }
            None => Ok(None),
        }
    }

    /// Reads up to `take` rows matching `filter`, starting after `continuation`, in key order.
    pub fn execute_query_segment(
        &self,
        filter: &QueryFilter,
        continuation: Option<&ContinuationToken>,
        take: usize,
    ) -> Result<QuerySegment, AppError> {
        let take = take.max(1);
        let table = self.open_existing()?;
        let lower: Bound<(&str, &str)> = match (continuation, filter.partition_key()) {
            (Some(token), _) => Bound::Excluded((token.partition_key(), token.row_key())),
            (None, Some(partition_key)) => Bound::Included((partition_key, "")),
            (None, None) => Bound::Unbounded,
        };

        let mut rows: Vec<StoredRow> = Vec::with_capacity(take.min(1024));
        let mut next = None;
        for entry in table.range((lower, Bound::Unbounded))? {
            let (key, value) = entry?;
            let (partition_key, row_key) = key.value();
            if filter.partition_key().is_some_and(|wanted| wanted != partition_key) {
                break;
            }
            if rows.len() == take {
                next = rows.last().map(|last| ContinuationToken::after(&last.partition_key, &last.row_key));
                break;
            }
            let record: StoredRecord = serde_json::from_slice(value.value())?;
            rows.push(StoredRow { partition_key: partition_key.to_string(), row_key: row_key.to_string(), record });
        }
        Ok(QuerySegment { rows, continuation: next })
    }
}

impl fmt::Debug for CloudTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudTable").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{order, temp_account, Order};

    fn orders_table(prefix: &str) -> CloudTable {
        let client = temp_account(prefix).create_table_client().unwrap();
        client.get_table_reference("Orders").unwrap()
    }

    #[test]
    fn existence_follows_create_and_delete() {
        let table = orders_table("table_exists");
        assert!(!table.exists().unwrap());
        assert!(table.create_if_not_exists().unwrap());
        assert!(!table.create_if_not_exists().unwrap(), "second create is a no-op");
        assert!(table.exists().unwrap());
        assert!(table.delete_if_exists().unwrap());
        assert!(!table.exists().unwrap());
        assert!(!table.delete_if_exists().unwrap());
    }

    #[test]
    fn insert_into_missing_table_is_not_found() {
        let table = orders_table("table_insert_missing");
        let err = table.insert_or_replace(&order("alice", "1", 10)).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!table.exists().unwrap(), "insert must not create the table");
    }

    #[test]
    fn insert_or_replace_overwrites_and_stamps_system_properties() {
        let table = orders_table("table_replace");
        table.create_if_not_exists().unwrap();
        table.insert_or_replace(&order("alice", "1", 10)).unwrap();
        let etag = table.insert_or_replace(&order("alice", "1", 25)).unwrap();

        let stored: Order = table.retrieve("alice", "1").unwrap().expect("row");
        assert_eq!(stored.total, 25);
        assert_eq!(stored.etag.as_deref(), Some(etag.as_str()));
        assert!(stored.timestamp.is_some());
        assert!(table.retrieve::<Order>("alice", "2").unwrap().is_none());
    }

    #[test]
    fn segments_resume_from_continuation_without_gaps() {
        let table = orders_table("table_segments");
        table.create_if_not_exists().unwrap();
        for (customer, id) in [("bob", "1"), ("alice", "2"), ("alice", "1"), ("carol", "1"), ("bob", "2")] {
            table.insert_or_replace(&order(customer, id, 1)).unwrap();
        }

        let mut seen = Vec::new();
        let mut token = None;
        let mut pages = 0;
        loop {
            let segment = table.execute_query_segment(&QueryFilter::all(), token.as_ref(), 2).unwrap();
            pages += 1;
            seen.extend(segment.rows.into_iter().map(|r| format!("{}/{}", r.partition_key, r.row_key)));
            match segment.continuation {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        assert_eq!(pages, 3);
        assert_eq!(seen, vec!["alice/1", "alice/2", "bob/1", "bob/2", "carol/1"]);
    }

    #[test]
    fn exact_page_boundary_has_no_continuation() {
        let table = orders_table("table_boundary");
        table.create_if_not_exists().unwrap();
        table.insert_or_replace(&order("alice", "1", 1)).unwrap();
        table.insert_or_replace(&order("alice", "2", 1)).unwrap();
        let segment = table.execute_query_segment(&QueryFilter::all(), None, 2).unwrap();
        assert_eq!(segment.rows.len(), 2);
        assert!(segment.continuation.is_none());
    }

    #[test]
    fn partition_filter_stays_within_partition() {
        let table = orders_table("table_partition");
        table.create_if_not_exists().unwrap();
        for (customer, id) in [("alice", "1"), ("bob", "1"), ("bob", "2"), ("bobby", "1")] {
            table.insert_or_replace(&order(customer, id, 1)).unwrap();
        }
        let segment = table.execute_query_segment(&QueryFilter::partition("bob"), None, 10).unwrap();
        let keys: Vec<_> = segment.rows.iter().map(|r| r.row_key.as_str()).collect();
        assert_eq!(keys, vec!["1", "2"]);
        assert!(segment.rows.iter().all(|r| r.partition_key == "bob"));
    }

    #[test]
    fn querying_missing_table_is_not_found() {
        let table = orders_table("table_query_missing");
        let err = table.execute_query_segment(&QueryFilter::all(), None, 10).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
