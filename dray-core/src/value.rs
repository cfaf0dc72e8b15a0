use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use rust_decimal::Decimal;
use std::mem;
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed scalar moved between entities, statements and drivers.
///
/// Every typed variant carries an `Option`: `None` is the typed SQL NULL, used
/// both for absent values and to describe the semantic type of a field.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    Uuid(Option<Uuid>),
}

impl Value {
    /// True for `Null` and for any typed variant holding `None`.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null
            | Value::Boolean(None)
            | Value::Int8(None)
            | Value::Int16(None)
            | Value::Int32(None)
            | Value::Int64(None)
            | Value::UInt8(None)
            | Value::UInt16(None)
            | Value::UInt32(None)
            | Value::UInt64(None)
            | Value::Float32(None)
            | Value::Float64(None)
            | Value::Decimal(None)
            | Value::Varchar(None)
            | Value::Blob(None)
            | Value::Date(None)
            | Value::Time(None)
            | Value::Timestamp(None)
            | Value::Uuid(None) => true,
            _ => false,
        }
    }

    pub fn same_type(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    /// Integer content of any integer variant, when it fits an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Boolean(Some(v)) => Some(v as i64),
            Value::Int8(Some(v)) => Some(v as i64),
            Value::Int16(Some(v)) => Some(v as i64),
            Value::Int32(Some(v)) => Some(v as i64),
            Value::Int64(Some(v)) => Some(v),
            Value::UInt8(Some(v)) => Some(v as i64),
            Value::UInt16(Some(v)) => Some(v as i64),
            Value::UInt32(Some(v)) => Some(v as i64),
            Value::UInt64(Some(v)) => i64::try_from(v).ok(),
            Value::Varchar(Some(ref v)) => v.trim().parse().ok(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::UInt8(l), Self::UInt8(r)) => l == r,
            (Self::UInt16(l), Self::UInt16(r)) => l == r,
            (Self::UInt32(l), Self::UInt32(r)) => l == r,
            (Self::UInt64(l), Self::UInt64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            _ => self.same_type(other),
        }
    }
}

impl ToTokens for Value {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(match self {
            Value::Null => quote!(::dray::Value::Null),
            Value::Boolean(..) => quote!(::dray::Value::Boolean(None)),
            Value::Int8(..) => quote!(::dray::Value::Int8(None)),
            Value::Int16(..) => quote!(::dray::Value::Int16(None)),
            Value::Int32(..) => quote!(::dray::Value::Int32(None)),
            Value::Int64(..) => quote!(::dray::Value::Int64(None)),
            Value::UInt8(..) => quote!(::dray::Value::UInt8(None)),
            Value::UInt16(..) => quote!(::dray::Value::UInt16(None)),
            Value::UInt32(..) => quote!(::dray::Value::UInt32(None)),
            Value::UInt64(..) => quote!(::dray::Value::UInt64(None)),
            Value::Float32(..) => quote!(::dray::Value::Float32(None)),
            Value::Float64(..) => quote!(::dray::Value::Float64(None)),
            Value::Decimal(..) => quote!(::dray::Value::Decimal(None)),
            Value::Varchar(..) => quote!(::dray::Value::Varchar(None)),
            Value::Blob(..) => quote!(::dray::Value::Blob(None)),
            Value::Date(..) => quote!(::dray::Value::Date(None)),
            Value::Time(..) => quote!(::dray::Value::Time(None)),
            Value::Timestamp(..) => quote!(::dray::Value::Timestamp(None)),
            Value::Uuid(..) => quote!(::dray::Value::Uuid(None)),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::Value;

    #[test]
    fn typed_nulls() {
        assert!(Value::Null.is_null());
        assert!(Value::Varchar(None).is_null());
        assert!(!Value::Varchar(Some("NULL".into())).is_null());
        assert_eq!(Value::Int32(None), Value::Int32(None));
        assert_ne!(Value::Int32(None), Value::Int64(None));
    }

    #[test]
    fn integer_content() {
        assert_eq!(Value::UInt16(Some(7)).as_i64(), Some(7));
        assert_eq!(Value::Varchar(Some(" 42 ".into())).as_i64(), Some(42));
        assert_eq!(Value::UInt64(Some(u64::MAX)).as_i64(), None);
        assert_eq!(Value::Float64(Some(1.0)).as_i64(), None);
    }
}
