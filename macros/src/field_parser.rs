use crate::macro_utils;
use proc_macro2::Ident;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::token::Comma;
use syn::{Fields, ItemStruct, Type};

const KEY_ATTRS: [&str; 5] = ["partition_key", "row_key", "timestamp", "etag", "transient"];

pub enum ParsingResult {
    PartitionKey(FieldDef),
    RowKey(FieldDef),
    Timestamp(FieldDef),
    ETag(FieldDef),
    Property(FieldDef),
    Transient,
}

#[derive(Clone)]
pub struct FieldDef {
    pub name: Ident,
    pub tpe: Type,
}

pub struct FieldDefs {
    pub partition_key: FieldDef,
    pub row_key: FieldDef,
    pub timestamp: Option<FieldDef>,
    pub etag: Option<FieldDef>,
    pub properties: Vec<FieldDef>,
}

#[derive(Default)]
pub struct EntityAttrs {
    pub no_default: bool,
}

pub fn get_named_fields(ast: &ItemStruct) -> Result<Punctuated<syn::Field, Comma>, syn::Error> {
    match &ast.fields {
        Fields::Named(fields_named) => Ok(fields_named.named.clone()),
        _ => Err(syn::Error::new(ast.span(), "`#[derive(TableEntity)]` only supports structs with named fields.")),
    }
}

pub fn parse_entity_attrs(ast: &ItemStruct) -> Result<EntityAttrs, syn::Error> {
    let mut attrs = EntityAttrs::default();
    for attr in ast.attrs.iter().filter(|a| a.path().is_ident("table_entity")) {
        attr.parse_nested_meta(|nested| {
            if nested.path.is_ident("no_default") {
                attrs.no_default = true;
                Ok(())
            } else {
                Err(nested.error("unsupported table_entity option, expected `no_default`"))
            }
        })?;
    }
    Ok(attrs)
}

fn parse_entity_field(field: &syn::Field) -> Result<ParsingResult, syn::Error> {
    let name = field.ident.clone().ok_or_else(|| syn::Error::new(field.span(), "Unnamed fields not supported"))?;
    let field_def = FieldDef { name, tpe: field.ty.clone() };

    let markers: Vec<&syn::Attribute> =
        field.attrs.iter().filter(|a| KEY_ATTRS.iter().any(|k| a.path().is_ident(k))).collect();
    let attr = match markers.as_slice() {
        [] => return Ok(ParsingResult::Property(field_def)),
        [attr] => *attr,
        [_, second, ..] => return Err(syn::Error::new(second.span(), "A field can carry only one table entity attribute")),
    };

    if attr.path().is_ident("partition_key") || attr.path().is_ident("row_key") {
        if !macro_utils::is_string(&field_def.tpe) {
            return Err(syn::Error::new(field_def.tpe.span(), "Partition and row keys must be of type `String`"));
        }
        if attr.path().is_ident("partition_key") {
            Ok(ParsingResult::PartitionKey(field_def))
        } else {
            Ok(ParsingResult::RowKey(field_def))
        }
    } else if attr.path().is_ident("timestamp") {
        if !macro_utils::is_option_of(&field_def.tpe, macro_utils::is_datetime_utc) {
            return Err(syn::Error::new(field_def.tpe.span(), "#[timestamp] field must be of type `Option<DateTime<Utc>>`"));
        }
        Ok(ParsingResult::Timestamp(field_def))
    } else if attr.path().is_ident("etag") {
        if !macro_utils::is_option_of(&field_def.tpe, macro_utils::is_string) {
            return Err(syn::Error::new(field_def.tpe.span(), "#[etag] field must be of type `Option<String>`"));
        }
        Ok(ParsingResult::ETag(field_def))
    } else {
        Ok(ParsingResult::Transient)
    }
}

fn set_once(slot: &mut Option<FieldDef>, field: FieldDef, attr: &str) -> Result<(), syn::Error> {
    if slot.is_some() {
        return Err(syn::Error::new(field.name.span(), format!("Multiple `#[{}]` fields found, only one is allowed", attr)));
    }
    *slot = Some(field);
    Ok(())
}

pub fn get_field_defs(ast: &ItemStruct) -> Result<FieldDefs, syn::Error> {
    let mut partition_key = None;
    let mut row_key = None;
    let mut timestamp = None;
    let mut etag = None;
    let mut properties = Vec::new();

    for field in get_named_fields(ast)?.iter() {
        match parse_entity_field(field)? {
            ParsingResult::PartitionKey(f) => set_once(&mut partition_key, f, "partition_key")?,
            ParsingResult::RowKey(f) => set_once(&mut row_key, f, "row_key")?,
            ParsingResult::Timestamp(f) => set_once(&mut timestamp, f, "timestamp")?,
            ParsingResult::ETag(f) => set_once(&mut etag, f, "etag")?,
            ParsingResult::Property(f) => properties.push(f),
            ParsingResult::Transient => {}
        }
    }

    let partition_key =
        partition_key.ok_or_else(|| syn::Error::new(ast.ident.span(), "`#[partition_key]` field is missing"))?;
    let row_key = row_key.ok_or_else(|| syn::Error::new(ast.ident.span(), "`#[row_key]` field is missing"))?;
    Ok(FieldDefs { partition_key, row_key, timestamp, etag, properties })
}
