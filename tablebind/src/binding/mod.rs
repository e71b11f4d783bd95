//! Binders turn a declared parameter type plus a table name into a runtime value.

pub mod cloud_table;
pub mod queryable;

use crate::descriptor::TypeDescriptor;
use crate::entity::EntityRegistry;
use crate::error::AppError;
use crate::settings::AppConfig;
use crate::storage::query::DEFAULT_PAGE_SIZE;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

pub use cloud_table::CloudTableBinderProvider;
pub use queryable::QueryableTableBinderProvider;

/// Per-invocation input supplied by the invocation pipeline.
#[derive(Debug, Clone)]
pub struct BindingContext {
    account_connection_string: Option<String>,
    query_page_size: usize,
}

impl BindingContext {
    pub fn new(account_connection_string: impl Into<String>) -> Self {
        BindingContext { account_connection_string: Some(account_connection_string.into()), query_page_size: DEFAULT_PAGE_SIZE }
    }

    /// Context without a storage account; binding through it fails with a resource error.
    pub fn without_account() -> Self {
        BindingContext { account_connection_string: None, query_page_size: DEFAULT_PAGE_SIZE }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        BindingContext::new(config.storage.connection_string.clone()).with_query_page_size(config.storage.query_page_size)
    }

    pub fn with_query_page_size(mut self, query_page_size: usize) -> Self {
        self.query_page_size = query_page_size.max(1);
        self
    }

    pub fn account_connection_string(&self) -> Result<&str, AppError> {
        self.account_connection_string
            .as_deref()
            .ok_or_else(|| AppError::InvalidConnectionString("no storage account connection string configured".to_string()))
    }

    pub fn query_page_size(&self) -> usize {
        self.query_page_size
    }
}

/// Envelope carrying a bound value to the invocation pipeline.
pub struct BindResult {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl BindResult {
    pub fn new<V: Any + Send>(value: V) -> Self {
        BindResult { value: Box::new(value), type_name: type_name::<V>() }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<V: Any>(&self) -> bool {
        self.value.is::<V>()
    }

    pub fn downcast<V: Any>(self) -> Result<V, AppError> {
        let type_name = self.type_name;
        self.value.downcast::<V>().map(|boxed| *boxed).map_err(|_| {
            AppError::Invariant(format!("bound value is {}, not {}", type_name, std::any::type_name::<V>()))
        })
    }
}

impl fmt::Debug for BindResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindResult").field("type_name", &self.type_name).finish()
    }
}

/// Immutable, reusable binder for one declared parameter type.
pub trait TableBinder: Send + Sync {
    fn bind(&self, context: &BindingContext, target_type: &TypeDescriptor, table_name: &str) -> Result<BindResult, AppError>;

    /// Read-only hint received at resolution time.
    fn is_read_only(&self) -> bool {
        true
    }
}

/// Decides whether it can bind a declared type.
///
/// `Ok(None)` means "not my type" and lets the next provider try; errors stop resolution.
pub trait TableBinderProvider: Send + Sync {
    fn try_get_binder(&self, target_type: &TypeDescriptor, is_read_only: bool) -> Result<Option<Arc<dyn TableBinder>>, AppError>;
}

/// Tries providers in order and returns the first binder produced.
pub struct CompositeTableBinderProvider {
    providers: Vec<Box<dyn TableBinderProvider>>,
}

impl CompositeTableBinderProvider {
    pub fn new(providers: Vec<Box<dyn TableBinderProvider>>) -> Self {
        CompositeTableBinderProvider { providers }
    }

    pub fn with_defaults(registry: Arc<EntityRegistry>) -> Self {
        CompositeTableBinderProvider::new(vec![
            Box::new(QueryableTableBinderProvider::new(registry)),
            Box::new(CloudTableBinderProvider),
        ])
    }
}

impl TableBinderProvider for CompositeTableBinderProvider {
    fn try_get_binder(&self, target_type: &TypeDescriptor, is_read_only: bool) -> Result<Option<Arc<dyn TableBinder>>, AppError> {
        for provider in &self.providers {
            if let Some(binder) = provider.try_get_binder(target_type, is_read_only)? {
                return Ok(Some(binder));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queryable::Queryable;
    use crate::storage::CloudTable;
    use crate::test_utils::{temp_connection_string, Order};

    #[test]
    fn bind_result_downcasts_to_bound_type_only() {
        let result = BindResult::new(vec![1u8, 2, 3]);
        assert!(result.is::<Vec<u8>>());
        assert!(!result.is::<String>());
        assert!(result.type_name().contains("Vec<u8>"));
        assert_eq!(result.downcast::<Vec<u8>>().unwrap(), vec![1, 2, 3]);

        let err = BindResult::new(7u32).downcast::<String>().unwrap_err();
        assert_eq!(err.class(), crate::ErrorClass::Internal);
    }

    #[test]
    fn missing_connection_string_is_resource_error() {
        let err = BindingContext::without_account().account_connection_string().unwrap_err();
        assert!(matches!(err, AppError::InvalidConnectionString(_)));
    }

    #[test]
    fn page_size_is_at_least_one() {
        assert_eq!(BindingContext::new("x").with_query_page_size(0).query_page_size(), 1);
        assert_eq!(BindingContext::new("x").query_page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn composite_dispatches_by_shape() {
        let composite = CompositeTableBinderProvider::with_defaults(Arc::new(EntityRegistry::from_inventory()));
        let context = BindingContext::new(temp_connection_string("composite"));

        let queryable = composite.try_get_binder(&TypeDescriptor::of::<Queryable<Order>>(), true).unwrap().expect("queryable binder");
        let bound = queryable.bind(&context, &TypeDescriptor::of::<Queryable<Order>>(), "Orders").unwrap();
        assert!(bound.is::<Queryable<Order>>());

        let table = composite.try_get_binder(&TypeDescriptor::of::<CloudTable>(), false).unwrap().expect("table binder");
        let bound = table.bind(&context, &TypeDescriptor::of::<CloudTable>(), "Orders").unwrap();
        assert_eq!(bound.downcast::<CloudTable>().unwrap().name(), "Orders");

        assert!(composite.try_get_binder(&TypeDescriptor::of::<Vec<Order>>(), true).unwrap().is_none());
    }

    #[test]
    fn composite_stops_on_first_error() {
        struct Failing;
        impl TableBinderProvider for Failing {
            fn try_get_binder(&self, _: &TypeDescriptor, _: bool) -> Result<Option<Arc<dyn TableBinder>>, AppError> {
                Err(AppError::Configuration("broken".to_string()))
            }
        }
        let composite = CompositeTableBinderProvider::new(vec![Box::new(Failing), Box::new(CloudTableBinderProvider)]);
        let err = composite.try_get_binder(&TypeDescriptor::of::<CloudTable>(), true).err().expect("error");
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
