//! Derive macro for typed querycraft table definitions.
//!
//! `#[derive(Table)]` turns a plain struct into a table definition whose
//! row has one typed column expression per field, so selectors can use
//! field names instead of tuple positions.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, Meta, Type};

/// Derives a table definition for a struct.
///
/// # Attributes
///
/// - `#[table(name = "table_name")]` - SQL table name (optional, defaults to
///   the snake_case struct name)
///
/// # Field Attributes
///
/// - `#[column(name = "ColumnName")]` - SQL column name (optional, defaults
///   to the field name)
/// - `#[column(primary_key)]` - Marks the primary key column
///
/// Nullability follows the field type: `Option<T>` fields are nullable.
///
/// # Generated Items
///
/// For a struct `Customer`, this macro generates:
///
/// - `CustomerTable` - implements `querycraft_core::schema::Table`, with
///   `NAME`, `COLUMNS` and `PRIMARY_KEY` constants
/// - `CustomerRow` - the row handed to selectors, one `Expr<T>` per field
/// - `Customer::table()` returning `CustomerTable`
#[proc_macro_derive(Table, attributes(table, column))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_table_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_table_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let vis = &input.vis;
    let table_name = get_table_name(&input.attrs, struct_name)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Table derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Table derive only supports structs",
            ));
        }
    };

    let mut columns: Vec<ColumnInfo> = Vec::new();
    for field in fields {
        let field_name = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let attrs = parse_column_attrs(&field.attrs)?;
        columns.push(ColumnInfo {
            column_name: attrs.name.unwrap_or_else(|| field_name.to_string()),
            field_name,
            field_type: field.ty.clone(),
            is_primary_key: attrs.primary_key,
        });
    }

    let table_struct = format_ident!("{}Table", struct_name);
    let row_struct = format_ident!("{}Row", struct_name);

    let column_names: Vec<&str> = columns.iter().map(|c| c.column_name.as_str()).collect();
    let primary_key = match columns.iter().find(|c| c.is_primary_key) {
        Some(pk) => {
            let name = &pk.column_name;
            quote! { Some(#name) }
        }
        None => quote! { None },
    };

    let row_fields = columns.iter().map(|c| {
        let field = &c.field_name;
        let ty = &c.field_type;
        let doc = format!("Column `{}`.", c.column_name);
        quote! {
            #[doc = #doc]
            pub #field: ::querycraft_core::expr::Expr<#ty>
        }
    });

    let column_defs = columns.iter().enumerate().map(|(position, c)| {
        let ty = &c.field_type;
        let name = &c.column_name;
        quote! { ::querycraft_core::schema::ColumnDef::of::<#ty>(#position, #name) }
    });

    let row_init = columns.iter().map(|c| {
        let field = &c.field_name;
        let name = &c.column_name;
        quote! { #field: ::querycraft_core::expr::Expr::column(qualifier, #name) }
    });

    let collect = columns.iter().map(|c| {
        let field = &c.field_name;
        quote! { ::querycraft_core::symbolic::Row::collect(&self.#field, out); }
    });

    let map_columns = columns.iter().map(|c| {
        let field = &c.field_name;
        quote! { #field: ::querycraft_core::symbolic::Row::map_columns(&self.#field, f) }
    });

    let table_doc = format!("Definition of table `{table_name}`.");
    let row_doc = format!("A row of `{table_name}` as typed column expressions.");

    Ok(quote! {
        #[doc = #table_doc]
        #[derive(Debug, Clone, Copy, Default)]
        #vis struct #table_struct;

        impl #table_struct {
            /// SQL table name.
            pub const NAME: &'static str = #table_name;
            /// Column names in declaration order.
            pub const COLUMNS: &'static [&'static str] = &[#(#column_names),*];
            /// Primary key column, if declared.
            pub const PRIMARY_KEY: ::core::option::Option<&'static str> = #primary_key;
        }

        impl ::querycraft_core::schema::Table for #table_struct {
            type Row = #row_struct;

            fn name(&self) -> &str {
                Self::NAME
            }

            fn columns(&self) -> ::std::vec::Vec<::querycraft_core::schema::ColumnDef> {
                ::std::vec![#(#column_defs),*]
            }

            fn row(&self, qualifier: &str) -> #row_struct {
                #row_struct {
                    #(#row_init),*
                }
            }
        }

        #[doc = #row_doc]
        #[derive(Debug, Clone)]
        #vis struct #row_struct {
            #(#row_fields),*
        }

        impl ::querycraft_core::symbolic::Row for #row_struct {
            fn collect(
                &self,
                out: &mut ::std::vec::Vec<::querycraft_core::symbolic::Projected>,
            ) {
                #(#collect)*
            }

            fn map_columns(
                &self,
                f: &mut dyn FnMut(
                    &::querycraft_core::symbolic::Projected,
                ) -> ::querycraft_core::expr::ExprNode,
            ) -> Self {
                Self {
                    #(#map_columns),*
                }
            }
        }

        impl #struct_name {
            /// Returns the table definition.
            #[must_use]
            pub const fn table() -> #table_struct {
                #table_struct
            }
        }
    })
}

struct ColumnInfo {
    field_name: Ident,
    field_type: Type,
    column_name: String,
    is_primary_key: bool,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    primary_key: bool,
}

fn get_table_name(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("table") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    table_name = Some(string_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported table attribute"))
                }
            })?;
            if let Some(name) = table_name {
                return Ok(name);
            }
        }
    }
    Ok(to_snake_case(&struct_name.to_string()))
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("column") {
            // `#[column]` alone carries nothing
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("primary_key") {
                    result.primary_key = true;
                    Ok(())
                } else if meta.path.is_ident("name") {
                    result.name = Some(string_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported column attribute"))
                }
            })?;
        }
    }

    Ok(result)
}

fn string_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    match value {
        Expr::Lit(syn::ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("Customer"), "customer");
        assert_eq!(to_snake_case("OrderLine"), "order_line");
    }

    #[test]
    fn test_expands_table_and_row() {
        let input: DeriveInput = syn::parse_quote! {
            #[table(name = "customers")]
            pub struct Customer {
                #[column(name = "Id", primary_key)]
                id: i64,
                #[column(name = "Name")]
                name: String,
            }
        };
        let expanded = derive_table_impl(&input).unwrap().to_string();
        assert!(expanded.contains("struct CustomerTable"));
        assert!(expanded.contains("struct CustomerRow"));
        assert!(expanded.contains("\"customers\""));
        assert!(expanded.contains("Some (\"Id\")"));
    }

    #[test]
    fn test_rejects_tuple_structs() {
        let input: DeriveInput = syn::parse_quote! {
            struct Pair(i64, i64);
        };
        assert!(derive_table_impl(&input).is_err());
    }

    #[test]
    fn test_rejects_unknown_column_attribute() {
        let input: DeriveInput = syn::parse_quote! {
            struct Customer {
                #[column(unique)]
                id: i64,
            }
        };
        assert!(derive_table_impl(&input).is_err());
    }
}
