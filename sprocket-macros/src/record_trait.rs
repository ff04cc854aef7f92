use crate::{decode_field::FieldKind, decode_record::RecordMetadata};
use proc_macro2::TokenStream;
use quote::quote;

pub(crate) fn record_trait(record: &RecordMetadata) -> TokenStream {
    let item = &record.item;
    let name = &item.ident;
    let type_name = name.to_string();
    if !item.generics.params.is_empty() {
        panic!("Record `{type_name}` cannot be generic");
    }
    let field_defs = record.columns().map(|f| {
        let property = &f.name;
        let column = record.column(f);
        let optional = f.optional;
        let ty = &f.ty;
        let transformers = &f.transformers;
        let tags = &f.tags;
        quote! {
            ::sprocket::FieldDef {
                name: #property,
                column: #column,
                optional: #optional,
                nullable: <#ty as ::sprocket::AsValue>::NULLABLE,
                target: <#ty as ::sprocket::AsValue>::target(),
                transformers: ::sprocket::PropertyTransformer::sorted(vec![#(#transformers),*]),
                tags: &[#(#tags),*],
            }
        }
    });
    let set_field = record.columns().enumerate().map(|(i, f)| {
        let ident = &f.ident;
        let ty = &f.ty;
        quote! {
            #i => self.#ident = <#ty as ::sprocket::AsValue>::try_from_value(value)?,
        }
    });
    let field_value = record.columns().enumerate().map(|(i, f)| {
        let ident = &f.ident;
        quote! {
            #i => Some(::sprocket::AsValue::as_value(::std::clone::Clone::clone(&self.#ident))),
        }
    });
    let relations = record.fields.iter().filter_map(|f| {
        let FieldKind::Children(children) = &f.kind else {
            return None;
        };
        let ident = &f.ident;
        let property = &f.name;
        let child = &children.child;
        let foreign_key = &children.foreign_key;
        let key = match &children.key {
            Some(key) => key.clone(),
            None => match record.default_key() {
                Some(key) => key.name.clone(),
                None => panic!(
                    "Relation `{property}` of `{type_name}` has no key, name it like: `#[sprocket(children(foreign_key = \"{foreign_key}\", key = \"id\"))]` or mark the key field with `#[sprocket(key)]`"
                ),
            },
        };
        Some(quote! {
            ::sprocket::Relation::new::<#child>(
                #property,
                #key,
                #foreign_key,
                |parent: &mut Self, children: Vec<#child>| parent.#ident = children,
            )
        })
    });
    let relations: Vec<_> = relations.collect();
    let relations = if relations.is_empty() {
        TokenStream::new()
    } else {
        quote! {
            fn relations() -> Vec<::sprocket::Relation<Self>> {
                vec![#(#relations),*]
            }
        }
    };
    quote! {
        impl ::sprocket::Record for #name {
            const NAME: &'static str = #type_name;

            fn fields() -> &'static [::sprocket::FieldDef] {
                static RESULT: ::std::sync::LazyLock<Box<[::sprocket::FieldDef]>> =
                    ::std::sync::LazyLock::new(|| vec![#(#field_defs),*].into_boxed_slice());
                &RESULT
            }

            fn set_field(
                &mut self,
                index: usize,
                value: ::sprocket::Value,
            ) -> ::sprocket::Result<()> {
                match index {
                    #(#set_field)*
                    _ => {
                        return Err(::sprocket::Error::msg(format!(
                            "`{}` has no property at index {}",
                            #type_name, index
                        )));
                    }
                }
                Ok(())
            }

            fn field_value(&self, name: &str) -> Option<::sprocket::Value> {
                match <Self as ::sprocket::Record>::field_index(name)? {
                    #(#field_value)*
                    _ => None,
                }
            }

            #relations
        }

        impl ::sprocket::ResultShape for #name {
            fn row_factory(
                config: &::sprocket::Config,
            ) -> ::sprocket::Result<::std::sync::Arc<dyn ::sprocket::RowFactory<Self>>> {
                ::sprocket::record_factory::<Self>(config)
            }
        }
    }
}
