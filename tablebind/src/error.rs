use std::sync::PoisonError;
use thiserror::Error;
use tokio::task::JoinError;

/// Coarse category of an [`AppError`], used by the invocation pipeline to decide
/// whether a failure is a setup mistake or a runtime storage problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Detected while resolving binders; the declared parameter can never bind.
    Configuration,
    /// Detected while binding or enumerating; depends on the storage account.
    Resource,
    /// Broken internal invariant.
    Internal,
}

#[derive(Debug, Error)]
pub enum AppError {

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serde error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Join: {0}")]
    JoinError(#[from] JoinError),

    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl AppError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AppError::Configuration(_) | AppError::Config(_) => ErrorClass::Configuration,
            AppError::Invariant(_) | AppError::JoinError(_) | AppError::Custom(_) => ErrorClass::Internal,
            _                                                                    => ErrorClass::Resource,
        }
    }
}

impl<T> From<PoisonError<T>> for AppError
{
    fn from(e: PoisonError<T>) -> Self {
        AppError::Custom(format!("Poison error: {:?}", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_classified_by_origin() {
        assert_eq!(AppError::Configuration("x".into()).class(), ErrorClass::Configuration);
        assert_eq!(AppError::InvalidConnectionString("x".into()).class(), ErrorClass::Resource);
        assert_eq!(AppError::InvalidTableName("x".into()).class(), ErrorClass::Resource);
        assert_eq!(AppError::NotFound("x".into()).class(), ErrorClass::Resource);
        assert_eq!(AppError::Invariant("x".into()).class(), ErrorClass::Internal);
        let io = AppError::from(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(io.class(), ErrorClass::Resource);
    }
}
