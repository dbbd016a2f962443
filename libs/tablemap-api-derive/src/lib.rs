use proc_macro::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{
    Data, DeriveInput, ExprPath, Fields, GenericArgument, LitStr, PathArguments, Type,
    parse_macro_input,
};

/// Derive macro for table row mapping.
///
/// Implements `tablemap_api::TableRecord` for a struct with named fields. The
/// field descriptor table is built on first use and cached for the life of
/// the process.
///
/// Each field becomes one column named after the field. The column's storage
/// representation follows from the field's declared type:
///
/// - `bool`, integers, floats, `String`, `char`, `Uuid`, `DateTime<_>`, `Blob`
///   and `Option`s of those are stored natively
/// - collections (`Vec`, maps, sets, arrays, tuples) and any other type are
///   stored as JSON text and must implement serde's `Serialize` and
///   `Deserialize`
///
/// # Attributes
///
/// - `#[table(factory = "path::to::fn")]` on the struct: constructor used to
///   create blank records when decoding. Defaults to `Default::default`.
/// - `#[table(rename = "UserId")]`: column name.
/// - `#[table(skip)]`: not stored; keeps the factory value on decode.
/// - `#[table(complex)]`: always store as JSON text.
///
/// # Example
///
/// ```ignore
/// #[derive(TableRecord, Default)]
/// pub struct Customer {
///     #[table(rename = "Id")]
///     pub id: String,
///     pub age: i32,
///     pub tags: Vec<String>,
/// }
/// ```
#[proc_macro_derive(TableRecord, attributes(table))]
pub fn derive_table_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens,
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;
    let name_str = name.to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "TableRecord does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "TableRecord only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "TableRecord only supports structs",
            ))
        }
    };

    // Struct-level #[table(factory = "...")].
    let mut factory: Option<ExprPath> = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("table") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("factory") {
                let value: LitStr = meta.value()?.parse()?;
                factory = Some(value.parse()?);
                Ok(())
            } else {
                Err(meta.error("unknown table attribute (expected 'factory')"))
            }
        })?;
    }
    let factory_expr = match factory {
        Some(path) => quote! { #path },
        None => quote! { <#name as ::core::default::Default>::default },
    };

    let mut field_tokens = Vec::new();
    let mut columns: Vec<String> = Vec::new();

    for field in fields {
        let field_name = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;
        let field_ty = &field.ty;

        // Parse #[table(...)] attribute.
        let mut rename: Option<String> = None;
        let mut skip = false;
        let mut complex = false;

        for attr in &field.attrs {
            if !attr.path().is_ident("table") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    rename = Some(value.value());
                } else if meta.path.is_ident("skip") {
                    skip = true;
                } else if meta.path.is_ident("complex") {
                    complex = true;
                } else {
                    return Err(meta.error(
                        "unknown table attribute (expected 'rename', 'skip' or 'complex')",
                    ));
                }
                Ok(())
            })?;
        }

        if skip {
            continue;
        }

        let column = rename.unwrap_or_else(|| field_name.unraw().to_string());
        if columns.contains(&column) {
            return Err(syn::Error::new_spanned(
                field_name,
                format!("duplicate column '{column}'"),
            ));
        }
        columns.push(column.clone());

        let descriptor = if complex {
            let ty_name = type_label(field_ty);
            quote! { ::tablemap_api::schema::TypeDescriptor::Record(#ty_name) }
        } else {
            describe(field_ty)
        };

        field_tokens.push(quote! {
            .field::<#field_ty>(
                #column,
                #descriptor,
                |r| &r.#field_name,
                |r, v| r.#field_name = v,
            )
        });
    }

    let expanded = quote! {
        #[automatically_derived]
        impl ::tablemap_api::schema::TableRecord for #name {
            fn schema() -> &'static ::tablemap_api::schema::RecordSchema<Self> {
                static SCHEMA: ::tablemap_api::__private::OnceLock<
                    ::tablemap_api::schema::RecordSchema<#name>,
                > = ::tablemap_api::__private::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    ::tablemap_api::schema::RecordSchema::<#name>::builder(#name_str, #factory_expr)
                        #(#field_tokens)*
                        .build()
                })
            }
        }
    };

    Ok(TokenStream::from(expanded))
}

/// Collection type names (last path segment).
const COLLECTIONS: &[&str] = &[
    "Vec", "VecDeque", "LinkedList", "BinaryHeap", "HashSet", "BTreeSet", "HashMap", "BTreeMap",
];

/// Build a `TypeDescriptor` expression for a field type.
fn describe(ty: &Type) -> proc_macro2::TokenStream {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => {
            let Some(segment) = type_path.path.segments.last() else {
                return record(ty);
            };
            let ident = segment.ident.to_string();

            if ident == "Option" {
                if let Some(inner) = first_type_argument(&segment.arguments) {
                    let inner = describe(inner);
                    return quote! {
                        ::tablemap_api::schema::TypeDescriptor::nullable(#inner)
                    };
                }
            }
            if let Some(kind) = primitive_kind(&ident) {
                let kind = syn::Ident::new(kind, proc_macro2::Span::call_site());
                return quote! {
                    ::tablemap_api::schema::TypeDescriptor::Primitive(
                        ::tablemap_api::value::CellKind::#kind
                    )
                };
            }
            if COLLECTIONS.contains(&ident.as_str()) {
                return quote! { ::tablemap_api::schema::TypeDescriptor::Collection(#ident) };
            }
            record(ty)
        }
        Type::Array(_) | Type::Slice(_) | Type::Tuple(_) => {
            let label = type_label(ty);
            quote! { ::tablemap_api::schema::TypeDescriptor::Collection(#label) }
        }
        Type::Group(group) => describe(&group.elem),
        Type::Paren(paren) => describe(&paren.elem),
        _ => record(ty),
    }
}

fn record(ty: &Type) -> proc_macro2::TokenStream {
    let label = type_label(ty);
    quote! { ::tablemap_api::schema::TypeDescriptor::Record(#label) }
}

/// Cell kind variant for a primitive type name.
fn primitive_kind(ident: &str) -> Option<&'static str> {
    let kind = match ident {
        "bool" => "Boolean",
        "i8" | "i16" | "i32" | "u8" | "u16" => "Int32",
        "i64" | "u32" | "u64" | "isize" | "usize" => "Int64",
        "f32" | "f64" => "Double",
        "String" | "char" => "String",
        "Uuid" => "Guid",
        "DateTime" => "DateTime",
        "Blob" => "Binary",
        _ => return None,
    };
    Some(kind)
}

fn first_type_argument(arguments: &PathArguments) -> Option<&Type> {
    match arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        }),
        _ => None,
    }
}

/// Human-readable type name for descriptors (e.g. `Address`, `[u8 ; 4]`).
fn type_label(ty: &Type) -> String {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident.to_string();
        }
    }
    quote!(#ty).to_string()
}
