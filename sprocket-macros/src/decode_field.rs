use proc_macro2::TokenStream;
use quote::ToTokens;
use std::fmt::Debug;
use syn::{
    Field, GenericArgument, Ident, LitInt, LitStr, Path, PathArguments, Type, ext::IdentExt,
    parse::ParseBuffer,
};

pub(crate) struct TransformMetadata {
    pub(crate) path: Path,
    pub(crate) order: i32,
}

pub(crate) struct ChildrenMetadata {
    pub(crate) child: Type,
    pub(crate) key: Option<String>,
    pub(crate) foreign_key: String,
}

pub(crate) enum FieldKind {
    Column,
    Children(ChildrenMetadata),
    Skip,
}

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    /// Property name.
    pub(crate) name: String,
    /// Explicit column name.
    pub(crate) column: Option<String>,
    pub(crate) optional: bool,
    pub(crate) key: bool,
    pub(crate) transformers: Vec<TransformMetadata>,
    pub(crate) tags: Vec<String>,
    pub(crate) kind: FieldKind,
}

impl Debug for FieldMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldMetadata")
            .field("ident", &self.ident)
            .field("ty", &"..")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("optional", &self.optional)
            .field("key", &self.key)
            .field("transformers", &self.transformers.len())
            .field("tags", &self.tags)
            .finish()
    }
}

/// `Child` out of `Vec<Child>`.
fn vec_element(ty: &Type) -> Option<Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Vec" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|v| match v {
        GenericArgument::Type(ty) => Some(ty.clone()),
        _ => None,
    })
}

fn decode_transform(arg: &syn::meta::ParseNestedMeta, declared: &mut Vec<TransformMetadata>) {
    let mut path = None;
    let mut order = 0;
    let result = arg.parse_nested_meta(|inner| {
        if inner.path.is_ident("order") {
            let Ok(v) = inner
                .value()
                .and_then(ParseBuffer::parse::<LitInt>)
                .and_then(|v| v.base10_parse::<i32>())
            else {
                panic!(
                    "Error while parsing `order`, use it like: `#[sprocket(transform(TrimString, order = 1))]`"
                );
            };
            order = v;
        } else if path.is_none() {
            path = Some(inner.path.clone());
        } else {
            panic!(
                "A `transform` declares exactly one transformer, use it like: `#[sprocket(transform(TrimString, order = 1))]`"
            );
        }
        Ok(())
    });
    let (Ok(()), Some(path)) = (result, path) else {
        panic!(
            "Error while parsing `transform`, use it like: `#[sprocket(transform(TrimString, order = 1))]`"
        );
    };
    declared.push(TransformMetadata { path, order });
}

fn decode_children(arg: &syn::meta::ParseNestedMeta, field: &Field) -> ChildrenMetadata {
    let Some(child) = vec_element(&field.ty) else {
        panic!(
            "Field `{}` has `children` but it is not a `Vec<Child>`",
            field.ty.to_token_stream()
        );
    };
    let mut key = None;
    let mut foreign_key = None;
    let result = arg.parse_nested_meta(|inner| {
        let Ok(v) = inner.value().and_then(ParseBuffer::parse::<LitStr>) else {
            panic!(
                "Error while parsing `children`, use it like: `#[sprocket(children(foreign_key = \"order_id\", key = \"id\"))]`"
            );
        };
        if inner.path.is_ident("foreign_key") {
            foreign_key = Some(v.value());
        } else if inner.path.is_ident("key") {
            key = Some(v.value());
        } else {
            panic!(
                "Unknown attribute `{}` inside `children`, expected `foreign_key` or `key`",
                inner.path.to_token_stream()
            );
        }
        Ok(())
    });
    let (Ok(()), Some(foreign_key)) = (result, foreign_key) else {
        panic!(
            "`children` requires the foreign key, use it like: `#[sprocket(children(foreign_key = \"order_id\"))]`"
        );
    };
    ChildrenMetadata {
        child,
        key,
        foreign_key,
    }
}

pub fn decode_field(field: &Field) -> FieldMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Record fields are expected to have a name");
    let mut metadata = FieldMetadata {
        name: ident.unraw().to_string(),
        ident,
        ty: field.ty.clone(),
        column: None,
        optional: false,
        key: false,
        transformers: Vec::new(),
        tags: Vec::new(),
        kind: FieldKind::Column,
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("sprocket") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!(
                "Error while parsing `sprocket`, use it like: `#[sprocket(attribute = value, ...)]`"
            );
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("name") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!(
                        "Error while parsing `name`, use it like: `#[sprocket(name = \"MyColumn\")]`"
                    );
                };
                metadata.column = Some(v.value());
            } else if arg.path.is_ident("optional") {
                let Err(..) = arg.value() else {
                    // value() is Err for Meta::Path
                    panic!("Error while parsing `optional`, use it like: `#[sprocket(optional)]`");
                };
                metadata.optional = true;
            } else if arg.path.is_ident("skip") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `skip`, use it like: `#[sprocket(skip)]`");
                };
                metadata.kind = FieldKind::Skip;
            } else if arg.path.is_ident("key") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `key`, use it like: `#[sprocket(key)]`");
                };
                metadata.key = true;
            } else if arg.path.is_ident("tag") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `tag`, use it like: `#[sprocket(tag = \"utc\")]`");
                };
                metadata.tags.push(v.value());
            } else if arg.path.is_ident("transform") {
                decode_transform(&arg, &mut metadata.transformers);
            } else if arg.path.is_ident("children") {
                metadata.kind = FieldKind::Children(decode_children(&arg, field));
            } else {
                panic!(
                    "Unknown attribute `{}` inside sprocket macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    metadata
}

impl ToTokens for TransformMetadata {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let path = &self.path;
        let order = self.order;
        tokens.extend(quote::quote! {
            ::sprocket::PropertyTransformer::new(#order, &#path)
        });
    }
}
