use crate::decode_field::{FieldMetadata, decode_field};
use convert_case::{Case, Casing};
use dray_core::IDENTITY;
use syn::{Error, Fields, ItemStruct, LitStr, Result, parse::ParseBuffer};

pub(crate) struct ModelMetadata {
    pub(crate) item: ItemStruct,
    pub(crate) table: String,
    pub(crate) fields: Vec<FieldMetadata>,
}

impl ModelMetadata {
    pub(crate) fn identity(&self) -> &FieldMetadata {
        // decode_model guarantees its presence
        &self.fields[self
            .fields
            .iter()
            .position(|f| f.identity)
            .unwrap_or_default()]
    }
}

pub(crate) fn decode_model(item: ItemStruct) -> Result<ModelMetadata> {
    if !item.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &item.generics,
            "Model cannot be derived for generic structs",
        ));
    }
    let Fields::Named(named) = &item.fields else {
        return Err(Error::new_spanned(
            &item.ident,
            "Model can only be derived for structs with named fields",
        ));
    };
    let fields = named
        .named
        .iter()
        .filter_map(|f| decode_field(f).transpose())
        .collect::<Result<Vec<_>>>()?;
    let mut table = item.ident.to_string().to_case(Case::Snake);
    if table.starts_with('_') {
        table.remove(0);
    }
    for attr in item.attrs.iter().filter(|v| v.path().is_ident("dray")) {
        attr.parse_nested_meta(|arg| {
            if arg.path.is_ident("table") {
                let value = arg.value().and_then(ParseBuffer::parse::<LitStr>).map_err(|_| {
                    arg.error("Error while parsing `table`, use it like: `#[dray(table = \"my_table\")]`")
                })?;
                table = value.value();
                Ok(())
            } else {
                Err(arg.error("Unknown attribute inside dray macro, expected `table`"))
            }
        })?;
    }
    for (i, field) in fields.iter().enumerate() {
        if fields[..i].iter().any(|f| f.name == field.name) {
            return Err(Error::new(
                field.ident.span(),
                format!("Column `{}` is declared more than once", field.name),
            ));
        }
    }
    if !fields.iter().any(|f| f.identity) {
        return Err(Error::new_spanned(
            &item.ident,
            format!("A model requires an identity field `{}: i64`", IDENTITY),
        ));
    }
    Ok(ModelMetadata {
        item,
        table,
        fields,
    })
}
