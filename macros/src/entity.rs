use crate::field_parser::{self, EntityAttrs, FieldDefs};
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::ItemStruct;

pub fn new(item_struct: &ItemStruct) -> Result<TokenStream, syn::Error> {
    if !item_struct.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&item_struct.generics, "`#[derive(TableEntity)]` does not support generic structs"));
    }
    let attrs = field_parser::parse_entity_attrs(item_struct)?;
    let field_defs = field_parser::get_field_defs(item_struct)?;
    let struct_ident = &item_struct.ident;

    let table_entity_impl = table_entity_impl(struct_ident, &field_defs);
    let registration = registration(struct_ident, &attrs);
    Ok(quote! {
        #table_entity_impl

        impl ::tablebind::Describe for #struct_ident {
            fn describe() -> ::tablebind::TypeDescriptor {
                ::tablebind::TypeDescriptor::plain::<#struct_ident>()
            }
        }

        #registration
    })
}

fn table_entity_impl(struct_ident: &syn::Ident, defs: &FieldDefs) -> TokenStream {
    let partition_key = &defs.partition_key.name;
    let row_key = &defs.row_key.name;

    let (timestamp_get, timestamp_set) = match &defs.timestamp {
        Some(f) => {
            let name = &f.name;
            (quote! { self.#name }, quote! { self.#name = timestamp; })
        }
        None => (quote! { None }, quote! { let _ = timestamp; }),
    };
    let (etag_get, etag_set) = match &defs.etag {
        Some(f) => {
            let name = &f.name;
            (quote! { self.#name.as_deref() }, quote! { self.#name = etag; })
        }
        None => (quote! { None }, quote! { let _ = etag; }),
    };

    let reads = defs.properties.iter().map(|f| {
        let name = &f.name;
        let key = name.unraw().to_string();
        quote! {
            if let Some(value) = properties.get(#key) {
                self.#name = ::tablebind::serde_json::from_value(value.clone())?;
            }
        }
    });
    let writes = defs.properties.iter().map(|f| {
        let name = &f.name;
        let key = name.unraw().to_string();
        quote! {
            properties.insert(#key.to_string(), ::tablebind::serde_json::to_value(&self.#name)?);
        }
    });

    quote! {
        impl ::tablebind::TableEntity for #struct_ident {
            fn partition_key(&self) -> &str {
                &self.#partition_key
            }
            fn set_partition_key(&mut self, partition_key: String) {
                self.#partition_key = partition_key;
            }
            fn row_key(&self) -> &str {
                &self.#row_key
            }
            fn set_row_key(&mut self, row_key: String) {
                self.#row_key = row_key;
            }
            fn timestamp(&self) -> Option<::tablebind::chrono::DateTime<::tablebind::chrono::Utc>> {
                #timestamp_get
            }
            fn set_timestamp(&mut self, timestamp: Option<::tablebind::chrono::DateTime<::tablebind::chrono::Utc>>) {
                #timestamp_set
            }
            fn etag(&self) -> Option<&str> {
                #etag_get
            }
            fn set_etag(&mut self, etag: Option<String>) {
                #etag_set
            }
            #[allow(unused_variables)]
            fn read_entity(&mut self, properties: &::tablebind::EntityProperties) -> Result<(), ::tablebind::AppError> {
                #(#reads)*
                Ok(())
            }
            #[allow(unused_mut)]
            fn write_entity(&self) -> Result<::tablebind::EntityProperties, ::tablebind::AppError> {
                let mut properties = ::tablebind::EntityProperties::new();
                #(#writes)*
                Ok(properties)
            }
        }
    }
}

fn registration(struct_ident: &syn::Ident, attrs: &EntityAttrs) -> TokenStream {
    let register_call = if attrs.no_default {
        quote! { registry.register_entity_without_default::<#struct_ident>(); }
    } else {
        quote! { registry.register_entity::<#struct_ident>(); }
    };
    quote! {
        const _: () = {
            fn register(registry: &mut ::tablebind::EntityRegistry) {
                #register_call
            }
            ::tablebind::inventory::submit! {
                ::tablebind::EntityInfo {
                    name: stringify!(#struct_ident),
                    register,
                }
            }
        };
    }
}
