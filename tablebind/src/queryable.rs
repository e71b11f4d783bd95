use crate::error::AppError;
use futures::stream::{self, Stream};
use std::collections::VecDeque;

/// Source of entity pages behind a [`Queryable`].
pub trait EntityProducer<T>: Send {
    /// Fetches the next page; `Ok(None)` once no more pages exist.
    fn next_page(&mut self) -> Result<Option<Vec<T>>, AppError>;
    fn requests_issued(&self) -> usize;
    /// Narrows pages not yet fetched to one partition.
    fn restrict_to_partition(&mut self, partition_key: &str);
    fn source_table(&self) -> Option<&str> {
        None
    }
}

/// Producer for tables that do not exist: no pages, no requests.
pub struct EmptyProducer;

impl<T> EntityProducer<T> for EmptyProducer {
    fn next_page(&mut self) -> Result<Option<Vec<T>>, AppError> {
        Ok(None)
    }

    fn requests_issued(&self) -> usize {
        0
    }

    fn restrict_to_partition(&mut self, _partition_key: &str) {}
}

/// Lazily evaluated, read-only sequence of table entities.
///
/// Enumeration pulls pages from the producer on demand and blocks the calling thread for each of them.
/// After the first error the sequence ends.
pub struct Queryable<T> {
    producer: Box<dyn EntityProducer<T>>,
    buffered: VecDeque<T>,
    finished: bool,
}

impl<T: Send + 'static> Queryable<T> {
    pub fn empty() -> Self {
        Queryable::from_producer(EmptyProducer)
    }

    pub fn from_producer(producer: impl EntityProducer<T> + 'static) -> Self {
        Queryable { producer: Box::new(producer), buffered: VecDeque::new(), finished: false }
    }

    pub fn where_partition(mut self, partition_key: &str) -> Self {
        self.producer.restrict_to_partition(partition_key);
        self
    }

    pub fn requests_issued(&self) -> usize {
        self.producer.requests_issued()
    }

    /// Name of the table a live query reads from, `None` for an empty sequence.
    pub fn source_table(&self) -> Option<&str> {
        self.producer.source_table()
    }

    /// Async view of the same sequence; page fetches run on the blocking pool.
    pub fn into_stream(self) -> impl Stream<Item = Result<T, AppError>> + Send {
        stream::unfold(Some(self), |state| async move {
            let mut queryable = state?;
            if let Some(entity) = queryable.buffered.pop_front() {
                return Some((Ok(entity), Some(queryable)));
            }
            match tokio::task::spawn_blocking(move || {
                let item = queryable.next();
                (item, queryable)
            })
            .await
            {
                Ok((Some(item), queryable)) => Some((item, Some(queryable))),
                Ok((None, _)) => None,
                Err(join_error) => Some((Err(AppError::from(join_error)), None)),
            }
        })
    }
}

impl<T> Iterator for Queryable<T> {
    type Item = Result<T, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entity) = self.buffered.pop_front() {
                return Some(Ok(entity));
            }
            if self.finished {
                return None;
            }
            match self.producer.next_page() {
                Ok(Some(page)) => self.buffered.extend(page),
                Ok(None) => self.finished = true,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
