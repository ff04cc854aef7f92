mod decode_field;
mod decode_record;
mod record_trait;
mod result_enum;

use decode_record::decode_record;
use proc_macro::TokenStream;
use record_trait::record_trait;
use result_enum::result_enum;
use syn::{ItemEnum, ItemStruct, parse_macro_input};

/// Implements `Record` and `ResultShape` for a struct with named fields.
///
/// Container attributes: `#[sprocket(rename_all = "PascalCase")]`.
/// Field attributes: `name = "Column"`, `optional`, `skip`, `key`, `tag = "..."`,
/// `transform(Transformer, order = N)` and `children(foreign_key = "..", key = "..")`
/// on a `Vec<Child>` field.
#[proc_macro_derive(Record, attributes(sprocket))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let record = decode_record(item);
    record_trait(&record).into()
}

/// Implements `ResultEnum`, `AsValue` and `ResultShape` for a fieldless enum, read
/// from its `#[repr]` integer (`i32` by default) or from its variant names.
/// Variants can be renamed with `#[sprocket(name = "...")]`.
#[proc_macro_derive(ResultEnum, attributes(sprocket))]
pub fn derive_result_enum(input: TokenStream) -> TokenStream {
    let item: ItemEnum = parse_macro_input!(input as ItemEnum);
    result_enum(&item).into()
}
