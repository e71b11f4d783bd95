//! Runtime descriptions of declared parameter types.
//!
//! A binder provider only sees a [`TypeDescriptor`], never the static type, so everything it needs to decide
//! (generic shape, type arguments, identity) is captured here.

use crate::queryable::Queryable;
use crate::storage::CloudTable;
use std::any::{type_name, TypeId};
use std::fmt;

/// Generic type constructors a binder provider can recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericDefinition {
    /// `Queryable<T>`: lazy read-only sequence of table entities.
    Queryable,
    Vec,
    Option,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TypeShape {
    Plain,
    Generic {
        definition: GenericDefinition,
        arguments: Vec<TypeDescriptor>,
    },
}

#[derive(Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    name: &'static str,
    type_id: TypeId,
    shape: TypeShape,
}

impl TypeDescriptor {
    pub fn of<T: Describe>() -> Self {
        T::describe()
    }

    /// Describes a non-generic type.
    pub fn plain<T: 'static + ?Sized>() -> Self {
        TypeDescriptor { name: type_name::<T>(), type_id: TypeId::of::<T>(), shape: TypeShape::Plain }
    }

    /// Describes `T` as an instantiation of `definition` with the given arguments.
    /// Arity is not validated here.
    pub fn generic<T: 'static + ?Sized>(definition: GenericDefinition, arguments: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor {
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            shape: TypeShape::Generic { definition, arguments },
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, generic arguments included.
    pub fn short_name(&self) -> &'static str {
        let head = self.name.split('<').next().unwrap_or(self.name);
        match head.rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn is_generic(&self) -> bool {
        matches!(self.shape, TypeShape::Generic { .. })
    }

    pub fn generic_definition(&self) -> Option<GenericDefinition> {
        match &self.shape {
            TypeShape::Generic { definition, .. } => Some(*definition),
            TypeShape::Plain => None,
        }
    }

    pub fn generic_arguments(&self) -> &[TypeDescriptor] {
        match &self.shape {
            TypeShape::Generic { arguments, .. } => arguments,
            TypeShape::Plain => &[],
        }
    }

    pub fn is<T: 'static + ?Sized>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Types that can describe themselves at runtime.
///
/// Implemented for common std types, [`Queryable`], [`CloudTable`] and every `#[derive(TableEntity)]` type.
pub trait Describe: 'static {
    fn describe() -> TypeDescriptor;
}

macro_rules! impl_describe_for_plain {
    ($($t:ty),*) => {
        $(
            impl Describe for $t {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::plain::<$t>()
                }
            }
        )*
    };
}

impl_describe_for_plain!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64, bool, char, String);

impl Describe for CloudTable {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::plain::<CloudTable>()
    }
}

impl<T: Describe> Describe for Queryable<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::generic::<Queryable<T>>(GenericDefinition::Queryable, vec![T::describe()])
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::generic::<Vec<T>>(GenericDefinition::Vec, vec![T::describe()])
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::generic::<Option<T>>(GenericDefinition::Option, vec![T::describe()])
    }
}
