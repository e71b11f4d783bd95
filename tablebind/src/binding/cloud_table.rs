use crate::binding::{BindResult, BindingContext, TableBinder, TableBinderProvider};
use crate::descriptor::TypeDescriptor;
use crate::error::AppError;
use crate::storage::{CloudTable, StorageAccount};
use std::sync::Arc;

/// Binds parameters declared as [`CloudTable`] to a plain table reference.
pub struct CloudTableBinderProvider;

impl TableBinderProvider for CloudTableBinderProvider {
    fn try_get_binder(&self, target_type: &TypeDescriptor, is_read_only: bool) -> Result<Option<Arc<dyn TableBinder>>, AppError> {
        if target_type.is::<CloudTable>() {
            Ok(Some(Arc::new(CloudTableBinder { is_read_only })))
        } else {
            Ok(None)
        }
    }
}

struct CloudTableBinder {
    is_read_only: bool,
}

impl TableBinder for CloudTableBinder {
    /// The reference is returned as-is; whether the table exists is left to the caller.
    fn bind(&self, context: &BindingContext, _target_type: &TypeDescriptor, table_name: &str) -> Result<BindResult, AppError> {
        let account = StorageAccount::parse(context.account_connection_string()?)?;
        let table = account.create_table_client()?.get_table_reference(table_name)?;
        Ok(BindResult::new(table))
    }

    fn is_read_only(&self) -> bool {
        self.is_read_only
    }
}
