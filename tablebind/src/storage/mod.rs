//! Table storage client backed by one redb database per account.

pub mod account;
pub mod client;
pub mod query;
pub mod table;

pub use account::StorageAccount;
pub use client::TableClient;
pub use query::TableQuery;
pub use table::{CloudTable, ContinuationToken, QueryFilter, QuerySegment, StoredRecord, StoredRow};
