mod decode_field;
mod decode_model;
mod model_trait;

use decode_model::decode_model;
use model_trait::model_trait;
use proc_macro::TokenStream;
use syn::{ItemStruct, parse_macro_input};

/// Implements `dray::Model` for a struct with named fields.
///
/// * `#[dray(table = "...")]` on the struct names the table, the snake_case
///   struct name otherwise.
/// * `#[dray(name = "...")]` on a field renames its column.
/// * `#[dray(skip)]` on a field keeps it out of every statement.
///
/// The struct must implement `Default` and have an `id: i64` field.
#[proc_macro_derive(Model, attributes(dray))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemStruct);
    match decode_model(item) {
        Ok(model) => model_trait(&model).into(),
        Err(error) => error.into_compile_error().into(),
    }
}
