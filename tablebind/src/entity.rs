use crate::binding::queryable::create_binder;
use crate::binding::TableBinder;
use crate::descriptor::TypeDescriptor;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use std::any::{type_name, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Non-key entity properties as stored in a table row.
pub type EntityProperties = BTreeMap<String, serde_json::Value>;

/// Capability set a type needs to be stored as a table row.
///
/// Usually derived with `#[derive(TableEntity)]`. Materialization starts from a parameterless instance, assigns
/// the system properties through the setters and finally calls [`TableEntity::read_entity`].
///
/// Binders only see types through an [`EntityRegistry`]. The derive registers itself; a hand-written impl must be
/// added with [`EntityRegistry::register_entity`] before `Queryable<T>` can be resolved.
pub trait TableEntity: Send + 'static {
    fn partition_key(&self) -> &str;
    fn set_partition_key(&mut self, partition_key: String);
    fn row_key(&self) -> &str;
    fn set_row_key(&mut self, row_key: String);
    fn timestamp(&self) -> Option<DateTime<Utc>>;
    fn set_timestamp(&mut self, timestamp: Option<DateTime<Utc>>);
    fn etag(&self) -> Option<&str>;
    fn set_etag(&mut self, etag: Option<String>);
    /// Assigns non-key properties; properties missing from `properties` keep their current value.
    fn read_entity(&mut self, properties: &EntityProperties) -> Result<(), AppError>;
    fn write_entity(&self) -> Result<EntityProperties, AppError>;
}

/// Static registration record submitted by `#[derive(TableEntity)]`.
pub struct EntityInfo {
    pub name: &'static str,
    pub register: fn(&mut EntityRegistry),
}

inventory::collect!(EntityInfo);

type BinderFactory = fn(bool) -> Arc<dyn TableBinder>;

struct Registration {
    name: &'static str,
    table_entity: bool,
    parameterless: bool,
    binder_factory: Option<BinderFactory>,
}

/// Dispatch table keyed by `TypeId`, filled at registration time with functions monomorphized for each entity.
///
/// It answers capability questions about types known only through a [`TypeDescriptor`] and yields the
/// type-specialized binder factory for them.
#[derive(Default)]
pub struct EntityRegistry {
    by_type: HashMap<TypeId, Registration>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every entity submitted by `#[derive(TableEntity)]` in the final binary.
    pub fn from_inventory() -> Self {
        let mut registry = EntityRegistry::new();
        for info in inventory::iter::<EntityInfo> {
            (info.register)(&mut registry);
        }
        registry
    }

    pub fn register_entity<T: TableEntity + Default>(&mut self) -> &mut Self {
        self.by_type.insert(TypeId::of::<T>(), Registration {
            name: type_name::<T>(),
            table_entity: true,
            parameterless: true,
            binder_factory: Some(create_binder::<T>),
        });
        self
    }

    pub fn register_entity_without_default<T: TableEntity>(&mut self) -> &mut Self {
        self.by_type.insert(TypeId::of::<T>(), Registration {
            name: type_name::<T>(),
            table_entity: true,
            parameterless: false,
            binder_factory: None,
        });
        self
    }

    /// Records a type that is known to the binding layer but is not a table entity.
    pub fn register_plain<T: Default + Send + 'static>(&mut self) -> &mut Self {
        self.by_type.insert(TypeId::of::<T>(), Registration {
            name: type_name::<T>(),
            table_entity: false,
            parameterless: true,
            binder_factory: None,
        });
        self
    }

    pub fn implements_table_entity(&self, descriptor: &TypeDescriptor) -> bool {
        self.by_type.get(&descriptor.type_id()).is_some_and(|r| r.table_entity)
    }

    pub fn has_parameterless_constructor(&self, descriptor: &TypeDescriptor) -> bool {
        self.by_type.get(&descriptor.type_id()).is_some_and(|r| r.parameterless)
    }

    pub fn verify_default_constructor(&self, descriptor: &TypeDescriptor) -> Result<(), AppError> {
        if self.has_parameterless_constructor(descriptor) {
            Ok(())
        } else {
            Err(AppError::Configuration(format!(
                "Type '{}' must have a parameterless constructor (implement Default) to be bound as a table entity.",
                descriptor.name()
            )))
        }
    }

    pub fn binder_factory(&self, descriptor: &TypeDescriptor) -> Option<BinderFactory> {
        self.by_type.get(&descriptor.type_id()).and_then(|r| r.binder_factory)
    }

    pub fn entity_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> =
            self.by_type.values().filter(|r| r.table_entity).map(|r| r.name).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Ledger, Order};
    use crate::TableEntity;

    #[test]
    fn derived_entities_are_collected_from_inventory() {
        let registry = EntityRegistry::from_inventory();
        let order = TypeDescriptor::of::<Order>();
        assert!(registry.implements_table_entity(&order));
        assert!(registry.has_parameterless_constructor(&order));
        assert!(registry.binder_factory(&order).is_some());

        let ledger = TypeDescriptor::of::<Ledger>();
        assert!(registry.implements_table_entity(&ledger), "no_default entities still carry the capability");
        assert!(!registry.has_parameterless_constructor(&ledger));
        assert!(registry.binder_factory(&ledger).is_none());
    }

    #[test]
    fn unknown_and_plain_types_lack_entity_capability() {
        let mut registry = EntityRegistry::new();
        registry.register_plain::<String>();
        assert!(!registry.implements_table_entity(&TypeDescriptor::of::<String>()));
        assert!(registry.has_parameterless_constructor(&TypeDescriptor::of::<String>()));
        assert!(!registry.implements_table_entity(&TypeDescriptor::of::<u64>()));
        assert!(registry.entity_names().is_empty());
    }

    #[test]
    fn missing_constructor_names_the_requirement() {
        let mut registry = EntityRegistry::new();
        registry.register_entity_without_default::<Ledger>();
        let err = registry.verify_default_constructor(&TypeDescriptor::of::<Ledger>()).unwrap_err();
        assert_eq!(err.class(), crate::ErrorClass::Configuration);
        let message = err.to_string();
        assert!(message.contains("parameterless constructor"), "{}", message);
        assert!(message.contains("Ledger"), "{}", message);
    }

    #[test]
    fn manual_registration_records_every_capability() {
        let mut registry = EntityRegistry::new();
        assert!(!registry.implements_table_entity(&TypeDescriptor::of::<Order>()));
        registry.register_entity::<Order>();
        let order = TypeDescriptor::of::<Order>();
        assert!(registry.implements_table_entity(&order));
        assert!(registry.verify_default_constructor(&order).is_ok());
        assert!(registry.binder_factory(&order).is_some());
        assert_eq!(registry.entity_names().len(), 1);
    }

    #[test]
    fn derived_entity_reads_properties_and_keeps_missing_defaults() {
        let mut order = Order::default();
        let mut properties = EntityProperties::new();
        properties.insert("total".to_string(), serde_json::json!(42));
        order.read_entity(&properties).unwrap();
        assert_eq!(order.total, 42);
        assert_eq!(order.item, "");

        let written = order.write_entity().unwrap();
        assert_eq!(written.get("total"), Some(&serde_json::json!(42)));
        assert!(!written.contains_key("customer"), "partition key is not a property");
        assert!(!written.contains_key("etag"), "etag is not a property");
        assert!(!written.contains_key("note"), "transient fields are not persisted");
    }

    #[test]
    fn derived_entity_rejects_mistyped_property() {
        let mut order = Order::default();
        let mut properties = EntityProperties::new();
        properties.insert("total".to_string(), serde_json::json!("not a number"));
        let err = order.read_entity(&properties).unwrap_err();
        assert!(matches!(err, AppError::SerdeError(_)));
    }
}
