use crate::decode_field::{FieldKind, FieldMetadata, decode_field};
use convert_case::{Case, Casing};
use quote::ToTokens;
use syn::{ItemStruct, LitStr, parse::ParseBuffer};

pub(crate) struct RecordMetadata {
    pub(crate) item: ItemStruct,
    pub(crate) fields: Vec<FieldMetadata>,
    pub(crate) rename_all: Option<String>,
}

impl RecordMetadata {
    /// Column a field is read from.
    pub(crate) fn column(&self, field: &FieldMetadata) -> String {
        match (&field.column, &self.rename_all) {
            (Some(column), _) => column.clone(),
            (None, Some(rule)) => rename(&field.name, rule),
            (None, None) => field.name.clone(),
        }
    }

    pub(crate) fn columns(&self) -> impl Iterator<Item = &FieldMetadata> {
        self.fields
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Column))
    }

    /// Parent key of the relations not naming one: the field marked `key`, otherwise
    /// the field named `id`.
    pub(crate) fn default_key(&self) -> Option<&FieldMetadata> {
        self.columns()
            .find(|f| f.key)
            .or_else(|| self.columns().find(|f| f.name.eq_ignore_ascii_case("id")))
    }
}

fn rename(name: &str, rule: &str) -> String {
    match rule {
        "PascalCase" => name.to_case(Case::Pascal),
        "camelCase" => name.to_case(Case::Camel),
        "snake_case" => name.to_case(Case::Snake),
        "SCREAMING_SNAKE_CASE" => name.to_case(Case::UpperSnake),
        "kebab-case" => name.to_case(Case::Kebab),
        "lowercase" => name.to_case(Case::Flat),
        "UPPERCASE" => name.to_case(Case::UpperFlat),
        _ => panic!(
            "Unknown case `{rule}` in `rename_all`, expected one of: PascalCase, camelCase, snake_case, SCREAMING_SNAKE_CASE, kebab-case, lowercase, UPPERCASE"
        ),
    }
}

pub fn decode_record(item: ItemStruct) -> RecordMetadata {
    let fields = item.fields.iter().map(decode_field).collect();
    let mut rename_all = None;
    for attr in &item.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("sprocket") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!(
                "Error while parsing `sprocket`, use it like: `#[sprocket(attribute = value, ..)]`"
            );
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("rename_all") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!(
                        "Error while parsing `rename_all`, use it like: `#[sprocket(rename_all = \"PascalCase\")]`"
                    );
                };
                let value = value.value();
                rename("", &value);
                rename_all = Some(value);
            } else {
                panic!(
                    "Unknown attribute `{}` inside sprocket macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    RecordMetadata {
        item,
        fields,
        rename_all,
    }
}
