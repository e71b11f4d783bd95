use proc_macro::TokenStream;
use proc_macro2::Ident;
use quote::quote;
use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use syn::{GenericArgument, PathArguments, Type};

/// Set to any value to dump every expansion under `target/macros/`.
const EXPAND_ENV: &str = "TABLEBIND_MACRO_EXPAND";

pub fn is_string(ty: &Type) -> bool {
    matches!(ty, Type::Path(tp) if tp.path.is_ident("String"))
}

pub fn is_datetime_utc(ty: &Type) -> bool {
    if let Type::Path(tp) = ty {
        if let Some(last) = tp.path.segments.last() {
            if last.ident == "DateTime" {
                if let PathArguments::AngleBracketed(gen_args) = &last.arguments {
                    return gen_args.args.iter().any(|arg| {
                        matches!(arg, GenericArgument::Type(Type::Path(p)) if p.path.segments.last().is_some_and(|seg| seg.ident == "Utc"))
                    });
                }
            }
        }
    }
    false
}

/// `Option<X>` where `X` satisfies `inner`.
pub fn is_option_of(ty: &Type, inner: fn(&Type) -> bool) -> bool {
    if let Type::Path(tp) = ty {
        if let Some(last) = tp.path.segments.last() {
            if last.ident == "Option" {
                if let PathArguments::AngleBracketed(args) = &last.arguments {
                    return matches!(args.args.first(), Some(GenericArgument::Type(t)) if inner(t));
                }
            }
        }
    }
    false
}

pub fn write_to_local_file(lines: Vec<String>, dir_name: &str, file_name: &str) {
    let dir_path = match env::current_dir() {
        Ok(dir) => dir.join("target").join("macros").join(dir_name),
        Err(e) => {
            eprintln!("Current dir inaccessible: {}", e);
            return;
        }
    };
    if let Err(e) = std::fs::create_dir_all(&dir_path) {
        eprintln!("Failed to create directory {:?}: {}", dir_path, e);
        return;
    }
    let full_path = dir_path.join(file_name);

    if let Err(e) = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&full_path)
        .and_then(|mut file| file.write_all(lines.join("\n").as_bytes()))
    {
        eprintln!("Failed to write to {:?}: {}", full_path, e);
    }
}

pub fn submit_struct_to_stream(stream: proc_macro2::TokenStream, dir: &str, struct_ident: &Ident, suffix: &str) -> TokenStream {
    if env::var_os(EXPAND_ENV).is_some() {
        let formatted_token_stream =
            match syn::parse2::<syn::File>(stream.clone()) {
                Ok(ast) => prettyplease::unparse(&ast),
                Err(_) => stream.to_string(),
            };
        write_to_local_file(vec![formatted_token_stream], dir, &format!("{}{}", struct_ident, suffix));
    }

    quote! {
        #stream
    }.into()
}
