use crate::entity::TableEntity;
use crate::error::AppError;
use crate::queryable::EntityProducer;
use crate::storage::table::{CloudTable, ContinuationToken, QueryFilter};
use std::marker::PhantomData;

pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Live, paginated query over every entity of a table, optionally narrowed to one partition.
///
/// Nothing is read until the first page is requested; each page is one read transaction.
pub struct TableQuery<T> {
    table: CloudTable,
    filter: QueryFilter,
    page_size: usize,
    continuation: Option<ContinuationToken>,
    exhausted: bool,
    requests: usize,
    _entity: PhantomData<fn() -> T>,
}

impl<T: TableEntity + Default> TableQuery<T> {
    pub fn new(table: CloudTable) -> Self {
        TableQuery {
            table,
            filter: QueryFilter::all(),
            page_size: DEFAULT_PAGE_SIZE,
            continuation: None,
            exhausted: false,
            requests: 0,
            _entity: PhantomData,
        }
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn partition(mut self, partition_key: &str) -> Self {
        self.filter = QueryFilter::partition(partition_key);
        self
    }
}

impl<T: TableEntity + Default> EntityProducer<T> for TableQuery<T> {
    fn next_page(&mut self) -> Result<Option<Vec<T>>, AppError> {
        if self.exhausted {
            return Ok(None);
        }
        self.requests += 1;
        let segment = self.table.execute_query_segment(&self.filter, self.continuation.as_ref(), self.page_size)?;
        self.exhausted = segment.continuation.is_none();
        self.continuation = segment.continuation;
        let entities = segment.rows.into_iter().map(|row| row.materialize()).collect::<Result<Vec<T>, AppError>>()?;
        Ok(Some(entities))
    }

    fn requests_issued(&self) -> usize {
        self.requests
    }

    fn restrict_to_partition(&mut self, partition_key: &str) {
        if self.requests == 0 {
            self.filter = QueryFilter::partition(partition_key);
        }
    }

    fn source_table(&self) -> Option<&str> {
        Some(self.table.name())
    }
}
