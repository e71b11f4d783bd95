use crate::binding::{BindResult, BindingContext, TableBinder, TableBinderProvider};
use crate::descriptor::{GenericDefinition, TypeDescriptor};
use crate::entity::{EntityRegistry, TableEntity};
use crate::error::AppError;
use crate::info;
use crate::queryable::Queryable;
use crate::storage::{CloudTable, StorageAccount, TableQuery};
use std::marker::PhantomData;
use std::sync::Arc;

/// Resolves `Queryable<T>` parameters for table entity types.
pub struct QueryableTableBinderProvider {
    registry: Arc<EntityRegistry>,
}

impl QueryableTableBinderProvider {
    pub fn new(registry: Arc<EntityRegistry>) -> Self {
        QueryableTableBinderProvider { registry }
    }

    /// Runtime bridge from a type handle to a binder statically specialized for it.
    fn try_get_binder_generic(&self, entity_type: &TypeDescriptor, is_read_only: bool) -> Result<Arc<dyn TableBinder>, AppError> {
        let factory = self.registry.binder_factory(entity_type).ok_or_else(|| {
            AppError::Invariant(format!("no binder factory registered for entity type {}", entity_type))
        })?;
        Ok(factory(is_read_only))
    }
}

fn queryable_item_type(queryable_type: &TypeDescriptor) -> Result<&TypeDescriptor, AppError> {
    match queryable_type.generic_arguments() {
        [item_type] => Ok(item_type),
        other => Err(AppError::Invariant(format!(
            "{} must have exactly one type argument, found {}",
            queryable_type,
            other.len()
        ))),
    }
}

impl TableBinderProvider for QueryableTableBinderProvider {
    fn try_get_binder(&self, target_type: &TypeDescriptor, is_read_only: bool) -> Result<Option<Arc<dyn TableBinder>>, AppError> {
        if target_type.generic_definition() != Some(GenericDefinition::Queryable) {
            return Ok(None);
        }
        let entity_type = queryable_item_type(target_type)?;
        if !self.registry.implements_table_entity(entity_type) {
            return Err(AppError::Configuration(format!(
                "Queryable is only supported on types that implement TableEntity. \
                 '{}' is not registered as one; derive TableEntity or call EntityRegistry::register_entity.",
                entity_type.name()
            )));
        }
        self.registry.verify_default_constructor(entity_type)?;
        let binder = self.try_get_binder_generic(entity_type, is_read_only)?;
        info!("Resolved queryable binder for {}", entity_type.short_name());
        Ok(Some(binder))
    }
}

/// Entry in the registry's dispatch table, monomorphized per entity type at registration.
pub(crate) fn create_binder<T: TableEntity + Default>(is_read_only: bool) -> Arc<dyn TableBinder> {
    Arc::new(QueryableTableBinder::<T> { is_read_only, _entity: PhantomData })
}

pub struct QueryableTableBinder<T> {
    is_read_only: bool,
    _entity: PhantomData<fn() -> T>,
}

impl<T: TableEntity + Default> QueryableTableBinder<T> {
    fn create_queryable(table: CloudTable, context: &BindingContext) -> Result<Queryable<T>, AppError> {
        if !table.exists()? {
            info!("Table '{}' does not exist, binding an empty sequence", table.name());
            return Ok(Queryable::empty());
        }
        Ok(Queryable::from_producer(TableQuery::<T>::new(table).page_size(context.query_page_size())))
    }
}

impl<T: TableEntity + Default> TableBinder for QueryableTableBinder<T> {
    fn bind(&self, context: &BindingContext, _target_type: &TypeDescriptor, table_name: &str) -> Result<BindResult, AppError> {
        let account = StorageAccount::parse(context.account_connection_string()?)?;
        let client = account.create_table_client()?;
        let table = client.get_table_reference(table_name)?;
        let queryable = Self::create_queryable(table, context)?;
        Ok(BindResult::new(queryable))
    }

    fn is_read_only(&self) -> bool {
        self.is_read_only
    }
}
