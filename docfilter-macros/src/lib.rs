//! Procedural macros for the docfilter project.
//!
//! `#[derive(Filterable)]` builds the schema descriptor of a struct from its fields, so filter
//! tokens can be validated against it. Field names follow the struct's serde representation:
//! `#[serde(rename = "...")]`, `#[serde(rename_all = "...")]` and `#[serde(skip)]` are honored.
//! The `#[filter(...)]` attribute overrides them:
//!
//! - `#[filter(rename = "name")]` sets the field name used in filter paths;
//! - `#[filter(skip)]` excludes the field from filtering.
//!
//! ```ignore
//! #[derive(Serialize, Deserialize, Filterable)]
//! #[serde(rename_all = "camelCase")]
//! pub struct Booking {
//!     pub room: i32,
//!     pub check_in: bson::DateTime, // filtered as `checkIn`
//!     pub guest: Guest,             // Guest also derives Filterable
//!     #[filter(skip)]
//!     pub notes: String,
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docfilter_macros;

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Fields, LitStr, Token,
    ext::IdentExt,
    meta::ParseNestedMeta,
    parse_macro_input,
    spanned::Spanned,
};

#[proc_macro_derive(Filterable, attributes(filter))]
pub fn derive_filterable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_filterable(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_filterable(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "Filterable cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Filterable can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Filterable can only be derived for structs",
            ));
        }
    };

    let ident = &input.ident;
    let container = ContainerAttrs::parse(&input.attrs)?;
    let schema_name = container
        .rename
        .unwrap_or_else(|| ident.unraw().to_string());

    let mut entries = Vec::with_capacity(fields.len());
    for field in fields {
        let attrs = FieldAttrs::parse(&field.attrs)?;
        if attrs.skip {
            continue;
        }

        let name = match attrs.rename {
            Some(name) => name,
            None => {
                let raw = field
                    .ident
                    .as_ref()
                    .map(|ident| ident.unraw().to_string())
                    .unwrap_or_default();
                match &container.rename_all {
                    Some(rule) => rule.apply(&raw),
                    None => raw,
                }
            }
        };

        let ty = &field.ty;
        entries.push(quote! {
            .field(#name, <#ty as ::docfilter::schema::SchemaField>::field_type())
        });
    }

    Ok(quote! {
        impl ::docfilter::schema::Filterable for #ident {
            fn schema() -> &'static ::docfilter::schema::SchemaDescriptor {
                static SCHEMA: ::std::sync::OnceLock<::docfilter::schema::SchemaDescriptor> =
                    ::std::sync::OnceLock::new();

                SCHEMA.get_or_init(|| {
                    ::docfilter::schema::SchemaDescriptor::builder(#schema_name)
                        #(#entries)*
                        .build()
                })
            }
        }

        impl ::docfilter::schema::SchemaField for #ident {
            fn field_type() -> ::docfilter::schema::FieldType {
                ::docfilter::schema::FieldType::Nested(::docfilter::schema::SchemaRef::Static(
                    <#ident as ::docfilter::schema::Filterable>::schema,
                ))
            }
        }
    })
}

/// Case conversions matching serde's `rename_all` rules.
enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn from_lit(lit: &LitStr) -> syn::Result<Self> {
        Ok(match lit.value().as_str() {
            "lowercase" => RenameRule::Lower,
            "UPPERCASE" => RenameRule::Upper,
            "PascalCase" => RenameRule::Pascal,
            "camelCase" => RenameRule::Camel,
            "snake_case" => RenameRule::Snake,
            "SCREAMING_SNAKE_CASE" => RenameRule::ScreamingSnake,
            "kebab-case" => RenameRule::Kebab,
            "SCREAMING-KEBAB-CASE" => RenameRule::ScreamingKebab,
            other => {
                return Err(syn::Error::new_spanned(
                    lit,
                    format!("unknown rename rule `{other}`"),
                ));
            }
        })
    }

    /// Converts a snake_case field name.
    fn apply(&self, field: &str) -> String {
        match self {
            RenameRule::Lower | RenameRule::Snake => field.to_string(),
            RenameRule::Upper | RenameRule::ScreamingSnake => field.to_ascii_uppercase(),
            RenameRule::Kebab => field.replace('_', "-"),
            RenameRule::ScreamingKebab => field.replace('_', "-").to_ascii_uppercase(),
            RenameRule::Pascal | RenameRule::Camel => {
                let mut renamed = String::with_capacity(field.len());
                let mut capitalize = matches!(self, RenameRule::Pascal);

                for ch in field.chars() {
                    if ch == '_' {
                        capitalize = true;
                    } else if capitalize {
                        renamed.push(ch.to_ascii_uppercase());
                        capitalize = false;
                    } else {
                        renamed.push(ch);
                    }
                }

                renamed
            }
        }
    }
}

#[derive(Default)]
struct ContainerAttrs {
    rename: Option<String>,
    rename_all: Option<RenameRule>,
}

impl ContainerAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = ContainerAttrs::default();

        for attr in attrs {
            if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename_all") && meta.input.peek(Token![=]) {
                        let lit: LitStr = meta.value()?.parse()?;
                        parsed.rename_all = Some(RenameRule::from_lit(&lit)?);
                        Ok(())
                    } else {
                        skip_meta(&meta)
                    }
                })?;
            } else if attr.path().is_ident("filter") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        parsed.rename = Some(meta.value()?.parse::<LitStr>()?.value());
                        Ok(())
                    } else {
                        Err(meta.error("expected `rename`"))
                    }
                })?;
            }
        }

        Ok(parsed)
    }
}

#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    skip: bool,
}

impl FieldAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut serde_rename = None;
        let mut parsed = FieldAttrs::default();

        for attr in attrs {
            if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                        serde_rename = Some(meta.value()?.parse::<LitStr>()?.value());
                        Ok(())
                    } else if meta.path.is_ident("skip") {
                        parsed.skip = true;
                        Ok(())
                    } else {
                        skip_meta(&meta)
                    }
                })?;
            } else if attr.path().is_ident("filter") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        parsed.rename = Some(meta.value()?.parse::<LitStr>()?.value());
                        Ok(())
                    } else if meta.path.is_ident("skip") {
                        parsed.skip = true;
                        Ok(())
                    } else {
                        Err(meta.error("expected `rename` or `skip`"))
                    }
                })?;
            }
        }

        parsed.rename = parsed.rename.or(serde_rename);
        Ok(parsed)
    }
}

/// Consumes a serde option this macro has no use for.
fn skip_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_meta(&inner))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_rules() {
        assert_eq!(RenameRule::Camel.apply("check_in_date"), "checkInDate");
        assert_eq!(RenameRule::Pascal.apply("check_in"), "CheckIn");
        assert_eq!(RenameRule::ScreamingSnake.apply("check_in"), "CHECK_IN");
        assert_eq!(RenameRule::Kebab.apply("check_in"), "check-in");
        assert_eq!(RenameRule::Camel.apply("room"), "room");
    }

    #[test]
    fn test_expand_honors_serde_and_filter_attributes() {
        let input: DeriveInput = syn::parse_quote! {
            #[serde(rename_all = "camelCase", deny_unknown_fields)]
            struct Booking {
                check_in: bson::DateTime,
                #[serde(rename = "guestName", default)]
                name: String,
                #[filter(rename = "roomNumber")]
                room: i32,
                #[serde(skip)]
                cache: String,
                #[filter(skip)]
                notes: String,
            }
        };

        let expanded = expand_filterable(&input).unwrap().to_string();

        assert!(expanded.contains("\"checkIn\""));
        assert!(expanded.contains("\"guestName\""));
        assert!(expanded.contains("\"roomNumber\""));
        assert!(!expanded.contains("\"cache\""));
        assert!(!expanded.contains("\"notes\""));
    }

    #[test]
    fn test_expand_rejects_enums_and_generics() {
        let enumeration: DeriveInput = syn::parse_quote! {
            enum Status { Confirmed, Pending }
        };
        assert!(expand_filterable(&enumeration).is_err());

        let generic: DeriveInput = syn::parse_quote! {
            struct Wrapper<T> { inner: T }
        };
        assert!(expand_filterable(&generic).is_err());

        let tuple: DeriveInput = syn::parse_quote! {
            struct Room(i32);
        };
        assert!(expand_filterable(&tuple).is_err());
    }
}
