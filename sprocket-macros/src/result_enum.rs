use proc_macro2::{Ident, Span, TokenStream};
use quote::{ToTokens, quote};
use syn::{Fields, ItemEnum, LitStr, parse::ParseBuffer};

const REPRS: &[&str] = &["i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64"];

/// Integral representation declared with `#[repr(..)]`, `i32` when absent.
fn decode_repr(item: &ItemEnum) -> Ident {
    let mut result = Ident::new("i32", Span::call_site());
    for attr in &item.attrs {
        if !attr.path().is_ident("repr") {
            continue;
        }
        let _ = attr.parse_nested_meta(|arg| {
            if let Some(ident) = arg.path.get_ident() {
                if REPRS.iter().any(|v| ident == v) {
                    result = ident.clone();
                }
            }
            Ok(())
        });
    }
    result
}

fn decode_variant_name(variant: &syn::Variant) -> String {
    let mut name = variant.ident.to_string();
    for attr in &variant.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("sprocket") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `sprocket`, use it like: `#[sprocket(name = \"Value\")]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("name") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!(
                        "Error while parsing `name`, use it like: `#[sprocket(name = \"Value\")]`"
                    );
                };
                name = v.value();
            } else {
                panic!(
                    "Unknown attribute `{}` inside sprocket macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    name
}

pub(crate) fn result_enum(item: &ItemEnum) -> TokenStream {
    let name = &item.ident;
    let type_name = name.to_string();
    let repr = decode_repr(item);
    let variants: Vec<_> = item
        .variants
        .iter()
        .map(|v| {
            if !matches!(v.fields, Fields::Unit) {
                panic!(
                    "Variant `{}::{}` has fields, ResultEnum supports only fieldless enums",
                    type_name, v.ident
                );
            }
            (&v.ident, decode_variant_name(v))
        })
        .collect();
    let empty = item
        .variants
        .iter()
        .find(|v| v.attrs.iter().any(|a| a.path().is_ident("default")))
        .or_else(|| item.variants.first())
        .map(|v| &v.ident)
        .unwrap_or_else(|| panic!("ResultEnum `{type_name}` must have at least one variant"));
    let names = variants.iter().map(|(ident, name_str)| {
        quote!((#name_str, #name::#ident as i64))
    });
    let from_bits = variants.iter().map(|(ident, _)| {
        quote! {
            if bits == #name::#ident as i64 {
                return Some(#name::#ident);
            }
        }
    });
    quote! {
        impl ::sprocket::ResultEnum for #name {
            const NAME: &'static str = #type_name;

            fn underlying() -> ::sprocket::Value {
                <#repr as ::sprocket::AsValue>::as_empty_value()
            }

            fn variants() -> &'static [(&'static str, i64)] {
                const VARIANTS: &[(&str, i64)] = &[#(#names),*];
                VARIANTS
            }

            fn from_bits(bits: i64) -> Option<Self> {
                #(#from_bits)*
                None
            }

            fn bits(self) -> i64 {
                self as i64
            }

            fn empty() -> Self {
                #name::#empty
            }
        }

        ::sprocket::impl_enum_value!(#name);
    }
}
