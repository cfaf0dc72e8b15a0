use crate::{Value, matches_path};
use std::mem;
use syn::{GenericArgument, PathArguments, Type, TypePath, TypeReference};

/// Column description inferred from a Rust field type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecoded {
    /// Typed NULL, `Value::Null` when the type is not recognized.
    pub value: Value,
    pub nullable: bool,
}

/// Infer the column type of a field from its syntax. Only the last path
/// segments are compared, so both `Uuid` and `uuid::Uuid` are recognized.
pub fn decode_type(ty: &Type) -> TypeDecoded {
    let mut nullable = false;
    let value = 'value: {
        let path = match ty {
            Type::Path(TypePath { path, .. }) => path,
            Type::Reference(TypeReference { elem, .. }) => {
                return decode_type(elem);
            }
            Type::Group(group) => return decode_type(&group.elem),
            Type::Paren(paren) => return decode_type(&paren.elem),
            _ => break 'value Value::Null,
        };
        if let Some(ident) = path.get_ident() {
            break 'value match ident.to_string().as_str() {
                "bool" => Value::Boolean(None),
                "i8" => Value::Int8(None),
                "i16" => Value::Int16(None),
                "i32" => Value::Int32(None),
                "i64" => Value::Int64(None),
                "isize" if mem::size_of::<isize>() == mem::size_of::<i32>() => Value::Int32(None),
                "isize" => Value::Int64(None),
                "u8" => Value::UInt8(None),
                "u16" => Value::UInt16(None),
                "u32" => Value::UInt32(None),
                "u64" => Value::UInt64(None),
                "usize" if mem::size_of::<usize>() == mem::size_of::<u32>() => {
                    Value::UInt32(None)
                }
                "usize" => Value::UInt64(None),
                "f32" => Value::Float32(None),
                "f64" => Value::Float64(None),
                "str" | "String" => Value::Varchar(None),
                "Decimal" => Value::Decimal(None),
                "Date" => Value::Date(None),
                "Time" => Value::Time(None),
                "PrimitiveDateTime" => Value::Timestamp(None),
                "Uuid" => Value::Uuid(None),
                _ => Value::Null,
            };
        }
        if matches_path(path, &["std", "string", "String"]) {
            Value::Varchar(None)
        } else if matches_path(path, &["rust_decimal", "Decimal"]) {
            Value::Decimal(None)
        } else if matches_path(path, &["time", "Date"]) {
            Value::Date(None)
        } else if matches_path(path, &["time", "Time"]) {
            Value::Time(None)
        } else if matches_path(path, &["time", "PrimitiveDateTime"]) {
            Value::Timestamp(None)
        } else if matches_path(path, &["uuid", "Uuid"]) {
            Value::Uuid(None)
        } else if let Some(inner) = first_generic(path, &["std", "option", "Option"]) {
            nullable = true;
            decode_type(inner).value
        } else if let Some(inner) = first_generic(path, &["std", "vec", "Vec"]) {
            match decode_type(inner).value {
                Value::UInt8(..) => Value::Blob(None),
                _ => Value::Null,
            }
        } else if let Some(inner) = first_generic(path, &["std", "boxed", "Box"]) {
            let inner = decode_type(inner);
            nullable = inner.nullable;
            inner.value
        } else {
            Value::Null
        }
    };
    TypeDecoded { value, nullable }
}

fn first_generic<'a>(path: &'a syn::Path, expect: &[&str]) -> Option<&'a Type> {
    if !matches_path(path, expect) {
        return None;
    }
    let PathArguments::AngleBracketed(arguments) = &path.segments.last()?.arguments else {
        return None;
    };
    arguments.args.iter().find_map(|v| match v {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::decode_type;
    use crate::Value;
    use syn::parse_quote;

    #[test]
    fn scalars() {
        let decoded = decode_type(&parse_quote!(i64));
        assert_eq!(decoded.value, Value::Int64(None));
        assert!(!decoded.nullable);
        assert_eq!(decode_type(&parse_quote!(String)).value, Value::Varchar(None));
        assert_eq!(
            decode_type(&parse_quote!(rust_decimal::Decimal)).value,
            Value::Decimal(None)
        );
        assert_eq!(
            decode_type(&parse_quote!(::time::PrimitiveDateTime)).value,
            Value::Timestamp(None)
        );
    }

    #[test]
    fn wrappers() {
        let decoded = decode_type(&parse_quote!(Option<u32>));
        assert_eq!(decoded.value, Value::UInt32(None));
        assert!(decoded.nullable);
        assert_eq!(decode_type(&parse_quote!(Vec<u8>)).value, Value::Blob(None));
        assert_eq!(
            decode_type(&parse_quote!(Box<Option<String>>)),
            super::TypeDecoded {
                value: Value::Varchar(None),
                nullable: true
            }
        );
        assert_eq!(decode_type(&parse_quote!(Vec<String>)).value, Value::Null);
        assert_eq!(decode_type(&parse_quote!(MyEnum)).value, Value::Null);
    }
}
