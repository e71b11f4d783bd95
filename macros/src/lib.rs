extern crate proc_macro;
mod entity;
mod field_parser;
mod macro_utils;

use proc_macro::TokenStream;
use proc_macro_error::proc_macro_error;
use syn::{parse_macro_input, ItemStruct};

/// Implements `TableEntity` and `Describe`, and registers the type with the `EntityRegistry` inventory.
///
/// Field attributes: `#[partition_key]`, `#[row_key]` (both `String`, required), `#[timestamp]`
/// (`Option<DateTime<Utc>>`), `#[etag]` (`Option<String>`) and `#[transient]`. Remaining fields are stored as
/// JSON properties named after the field. `#[table_entity(no_default)]` registers a type that has no `Default`.
#[proc_macro_derive(TableEntity, attributes(partition_key, row_key, timestamp, etag, transient, table_entity))]
#[proc_macro_error]
pub fn derive_table_entity(input: TokenStream) -> TokenStream {
    let item_struct = parse_macro_input!(input as ItemStruct);
    let stream = match entity::new(&item_struct) {
        Ok(stream) => stream,
        Err(e) => return e.to_compile_error().into(),
    };
    macro_utils::submit_struct_to_stream(stream, "entity", &item_struct.ident, "_derive.rs")
}
