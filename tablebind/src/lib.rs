//! tablebind binds declared function parameters to table storage at invocation time.
//!
//! A parameter declared as [`Queryable<T>`] is resolved by [`QueryableTableBinderProvider`] for any `T` deriving
//! [`TableEntity`] with a parameterless constructor. Binding yields a lazy sequence over the named table, or an
//! empty one if the table does not exist yet. Tables live in [Redb](https://github.com/cberner/redb), one database
//! file per storage account.
//!

extern crate self as tablebind;

pub mod binding;
pub mod descriptor;
pub mod entity;
pub mod error;
pub mod logger;
pub mod queryable;
pub mod settings;
pub mod storage;

pub use binding::{
    BindResult, BindingContext, CloudTableBinderProvider, CompositeTableBinderProvider, QueryableTableBinderProvider,
    TableBinder, TableBinderProvider,
};
pub use chrono;
pub use descriptor::{Describe, GenericDefinition, TypeDescriptor};
pub use entity::{EntityInfo, EntityProperties, EntityRegistry, TableEntity};
pub use error::{AppError, ErrorClass};
pub use inventory;
pub use macros::TableEntity;
pub use queryable::{EmptyProducer, EntityProducer, Queryable};
pub use serde_json;
pub use settings::{AppConfig, StorageSettings};
pub use storage::{CloudTable, StorageAccount, TableClient, TableQuery};
