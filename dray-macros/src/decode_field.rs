use dray_core::{IDENTITY, TypeDecoded, Value, decode_type};
use syn::{Error, Field, Ident, LitStr, Result, Type, ext::IdentExt, parse::ParseBuffer};

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) value: Value,
    pub(crate) nullable: bool,
    pub(crate) identity: bool,
}

/// `None` for fields marked `#[dray(skip)]`.
pub(crate) fn decode_field(field: &Field) -> Result<Option<FieldMetadata>> {
    let Some(ident) = field.ident.clone() else {
        return Err(Error::new_spanned(
            field,
            "Model can only be derived for structs with named fields",
        ));
    };
    let TypeDecoded { value, nullable } = decode_type(&field.ty);
    let mut name = ident.unraw().to_string();
    if name.starts_with('_') {
        name.remove(0);
    }
    let mut skip = false;
    for attr in field.attrs.iter().filter(|v| v.path().is_ident("dray")) {
        attr.parse_nested_meta(|arg| {
            if arg.path.is_ident("name") {
                let value = arg.value().and_then(ParseBuffer::parse::<LitStr>).map_err(|_| {
                    arg.error("Error while parsing `name`, use it like: `#[dray(name = \"my_column\")]`")
                })?;
                name = value.value();
                Ok(())
            } else if arg.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(arg.error("Unknown attribute inside dray macro, expected `name` or `skip`"))
            }
        })?;
    }
    if skip {
        return Ok(None);
    }
    let identity = name == IDENTITY;
    if identity && (value != Value::Int64(None) || nullable) {
        return Err(Error::new_spanned(
            &field.ty,
            "The identity field `id` must have type `i64`",
        ));
    }
    Ok(Some(FieldMetadata {
        ident,
        ty: field.ty.clone(),
        name,
        value,
        nullable,
        identity,
    }))
}
