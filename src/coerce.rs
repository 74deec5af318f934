//! Scalar coercion of raw column values into primitive-like targets.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::ser::{Serialize, Serializer};

use crate::error::SqlPagerError;
use crate::lob;
use crate::types::RowValues;

/// Target types a single column can be coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Text,
    Byte,
    Short,
    Integer,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
    /// Generic number; parsed exactly like `BigDecimal`.
    Number,
    Boolean,
    /// Anything else: the value is handed back untouched.
    Other,
}

impl ScalarType {
    /// Whether a record request for this type should be answered as a scalar.
    #[must_use]
    pub fn is_primitive_like(self) -> bool {
        !matches!(self, ScalarType::Other)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Text => "string",
            ScalarType::Byte => "byte",
            ScalarType::Short => "short",
            ScalarType::Integer => "integer",
            ScalarType::Long => "long",
            ScalarType::BigInteger => "big-integer",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
            ScalarType::BigDecimal => "big-decimal",
            ScalarType::Number => "number",
            ScalarType::Boolean => "boolean",
            ScalarType::Other => "other",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarType {
    type Err = SqlPagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.to_ascii_lowercase().as_str() {
            "string" | "text" => ScalarType::Text,
            "byte" => ScalarType::Byte,
            "short" => ScalarType::Short,
            "int" | "integer" => ScalarType::Integer,
            "long" => ScalarType::Long,
            "bigint" | "big-integer" | "biginteger" => ScalarType::BigInteger,
            "float" => ScalarType::Float,
            "double" => ScalarType::Double,
            "decimal" | "big-decimal" | "bigdecimal" => ScalarType::BigDecimal,
            "number" => ScalarType::Number,
            "bool" | "boolean" => ScalarType::Boolean,
            "other" | "raw" => ScalarType::Other,
            unknown => {
                return Err(SqlPagerError::ParameterError(format!(
                    "unknown scalar type: {unknown}"
                )));
            }
        };
        Ok(ty)
    }
}

/// The result of coercing one column value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Text(String),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    BigInteger(i128),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Boolean(bool),
    /// The normalised source value, returned when no coercion applies.
    Unchanged(RowValues),
}

impl ScalarValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null | ScalarValue::Unchanged(RowValues::Null))
    }

    /// Integral view of the value, if it holds an integer of any width.
    #[must_use]
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            ScalarValue::Byte(v) => Some(i128::from(*v)),
            ScalarValue::Short(v) => Some(i128::from(*v)),
            ScalarValue::Integer(v) => Some(i128::from(*v)),
            ScalarValue::Long(v) => Some(i128::from(*v)),
            ScalarValue::BigInteger(v) => Some(*v),
            ScalarValue::Unchanged(RowValues::Int(v)) => Some(i128::from(*v)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Float(v) => Some(f64::from(*v)),
            ScalarValue::Double(v) => Some(*v),
            ScalarValue::Unchanged(RowValues::Float(v)) => Some(*v),
            #[allow(clippy::cast_precision_loss)]
            other => other.as_i128().map(|v| v as f64),
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Boolean(b) | ScalarValue::Unchanged(RowValues::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => f.write_str("null"),
            ScalarValue::Text(s) => f.write_str(s),
            ScalarValue::Byte(v) => write!(f, "{v}"),
            ScalarValue::Short(v) => write!(f, "{v}"),
            ScalarValue::Integer(v) => write!(f, "{v}"),
            ScalarValue::Long(v) => write!(f, "{v}"),
            ScalarValue::BigInteger(v) => write!(f, "{v}"),
            ScalarValue::Float(v) => write!(f, "{v}"),
            ScalarValue::Double(v) => write!(f, "{v}"),
            ScalarValue::Decimal(v) => write!(f, "{v}"),
            ScalarValue::Boolean(v) => write!(f, "{v}"),
            ScalarValue::Unchanged(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScalarValue::Null => serializer.serialize_none(),
            ScalarValue::Text(s) => serializer.serialize_str(s),
            ScalarValue::Byte(v) => serializer.serialize_i8(*v),
            ScalarValue::Short(v) => serializer.serialize_i16(*v),
            ScalarValue::Integer(v) => serializer.serialize_i32(*v),
            ScalarValue::Long(v) => serializer.serialize_i64(*v),
            ScalarValue::BigInteger(v) => serializer.serialize_i128(*v),
            ScalarValue::Float(v) => serializer.serialize_f32(*v),
            ScalarValue::Double(v) => serializer.serialize_f64(*v),
            ScalarValue::Decimal(v) => serializer.serialize_str(&v.to_string()),
            ScalarValue::Boolean(v) => serializer.serialize_bool(*v),
            ScalarValue::Unchanged(v) => v.serialize(serializer),
        }
    }
}

/// Coerce a raw column value into `target`.
///
/// Large objects are materialised first. Numeric targets parse the value's text with all
/// whitespace removed; integer targets accept `0x`, `0X` and `#` hex literals with an
/// optional leading `-`. Boolean text that matches no known token yields `Null`.
///
/// ```rust
/// use sql_pager::prelude::*;
///
/// let v = coerce(RowValues::Text("0x1F".into()), ScalarType::Integer).unwrap();
/// assert_eq!(v, ScalarValue::Integer(31));
/// ```
///
/// # Errors
/// Returns `SqlPagerError::CoercionError` when the text cannot be parsed as the numeric target.
pub fn coerce(value: RowValues, target: ScalarType) -> Result<ScalarValue, SqlPagerError> {
    let value = lob::normalize(value);
    match target {
        ScalarType::Text => {
            return Ok(match value {
                RowValues::Null => ScalarValue::Null,
                RowValues::Text(s) => ScalarValue::Text(s),
                other => ScalarValue::Unchanged(other),
            });
        }
        ScalarType::Other => {
            return Ok(match value {
                RowValues::Null => ScalarValue::Null,
                other => ScalarValue::Unchanged(other),
            });
        }
        _ => {}
    }

    let Some(raw) = value.text_form() else {
        return Ok(ScalarValue::Null);
    };
    let trimmed = strip_whitespace(&raw);
    let fail = |reason: String| SqlPagerError::CoercionError {
        raw: raw.clone(),
        target: target.name().to_string(),
        reason,
    };

    match target {
        ScalarType::Byte => parse_integral::<i8>(&trimmed).map(ScalarValue::Byte).map_err(fail),
        ScalarType::Short => parse_integral::<i16>(&trimmed).map(ScalarValue::Short).map_err(fail),
        ScalarType::Integer => {
            parse_integral::<i32>(&trimmed).map(ScalarValue::Integer).map_err(fail)
        }
        ScalarType::Long => parse_integral::<i64>(&trimmed).map(ScalarValue::Long).map_err(fail),
        ScalarType::BigInteger => parse_integral::<i128>(&trimmed)
            .map(ScalarValue::BigInteger)
            .map_err(fail),
        ScalarType::Float => trimmed
            .parse::<f32>()
            .map(ScalarValue::Float)
            .map_err(|e| fail(e.to_string())),
        ScalarType::Double => trimmed
            .parse::<f64>()
            .map(ScalarValue::Double)
            .map_err(|e| fail(e.to_string())),
        ScalarType::BigDecimal | ScalarType::Number => parse_decimal(&trimmed)
            .map(ScalarValue::Decimal)
            .map_err(fail),
        ScalarType::Boolean => Ok(parse_bool_token(&trimmed).map_or(ScalarValue::Null, ScalarValue::Boolean)),
        ScalarType::Text | ScalarType::Other => Ok(ScalarValue::Unchanged(value)),
    }
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_hex_literal(text: &str) -> bool {
    let body = text.strip_prefix('-').unwrap_or(text);
    body.starts_with("0x") || body.starts_with("0X") || body.starts_with('#')
}

fn parse_integral<T>(text: &str) -> Result<T, String>
where
    T: TryFrom<i128> + FromStr,
    <T as FromStr>::Err: fmt::Display,
{
    if !is_hex_literal(text) {
        return text.parse::<T>().map_err(|e| e.to_string());
    }
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let digits = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
        .or_else(|| body.strip_prefix('#'))
        .unwrap_or(body);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("invalid hexadecimal literal".to_string());
    }
    let magnitude = u128::from_str_radix(digits, 16).map_err(|e| e.to_string())?;
    let signed = i128::try_from(magnitude).map_err(|_| "number too large".to_string())?;
    let signed = if negative { -signed } else { signed };
    T::try_from(signed).map_err(|_| "number out of range for target type".to_string())
}

fn parse_decimal(text: &str) -> Result<Decimal, String> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|e| e.to_string())
}

/// Case-insensitive token table; anything unlisted is unknown.
fn parse_bool_token(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "y" | "t" | "on" | "yes" | "true" => Some(true),
        "n" | "f" | "no" | "off" | "false" => Some(false),
        _ => None,
    }
}

/// Conversion from a coerced column value into a concrete field type.
pub trait FromScalar: Sized {
    /// # Errors
    /// Returns `SqlPagerError::BindingError` when the value has an incompatible shape.
    fn from_scalar(value: ScalarValue) -> Result<Self, SqlPagerError>;
}

fn mismatch(value: &ScalarValue, wanted: &str) -> SqlPagerError {
    SqlPagerError::BindingError(format!("cannot assign {value:?} to a {wanted} field"))
}

macro_rules! impl_from_scalar_int {
    ($($ty:ty),*) => {
        $(
            impl FromScalar for $ty {
                fn from_scalar(value: ScalarValue) -> Result<Self, SqlPagerError> {
                    value
                        .as_i128()
                        .and_then(|v| <$ty>::try_from(v).ok())
                        .ok_or_else(|| mismatch(&value, stringify!($ty)))
                }
            }
        )*
    };
}

impl_from_scalar_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64, usize);

impl FromScalar for f64 {
    fn from_scalar(value: ScalarValue) -> Result<Self, SqlPagerError> {
        value.as_f64().ok_or_else(|| mismatch(&value, "f64"))
    }
}

impl FromScalar for f32 {
    fn from_scalar(value: ScalarValue) -> Result<Self, SqlPagerError> {
        match value {
            ScalarValue::Float(v) => Ok(v),
            #[allow(clippy::cast_possible_truncation)]
            other => other.as_f64().map(|v| v as f32).ok_or_else(|| mismatch(&other, "f32")),
        }
    }
}

impl FromScalar for Decimal {
    fn from_scalar(value: ScalarValue) -> Result<Self, SqlPagerError> {
        match value {
            ScalarValue::Decimal(d) => Ok(d),
            other => match other.as_i128() {
                Some(i) => Ok(Decimal::from_i128_with_scale(i, 0)),
                None => Err(mismatch(&other, "decimal")),
            },
        }
    }
}

impl FromScalar for bool {
    fn from_scalar(value: ScalarValue) -> Result<Self, SqlPagerError> {
        value.as_bool().ok_or_else(|| mismatch(&value, "bool"))
    }
}

impl FromScalar for String {
    fn from_scalar(value: ScalarValue) -> Result<Self, SqlPagerError> {
        match value {
            ScalarValue::Null | ScalarValue::Unchanged(RowValues::Null) => {
                Err(mismatch(&value, "String"))
            }
            ScalarValue::Text(s) | ScalarValue::Unchanged(RowValues::Text(s)) => Ok(s),
            other => Ok(other.to_string()),
        }
    }
}

impl FromScalar for Vec<u8> {
    fn from_scalar(value: ScalarValue) -> Result<Self, SqlPagerError> {
        match value {
            ScalarValue::Unchanged(RowValues::Blob(bytes)) => Ok(bytes),
            ScalarValue::Text(s) | ScalarValue::Unchanged(RowValues::Text(s)) => Ok(s.into_bytes()),
            other => Err(mismatch(&other, "Vec<u8>")),
        }
    }
}

impl FromScalar for RowValues {
    fn from_scalar(value: ScalarValue) -> Result<Self, SqlPagerError> {
        Ok(match value {
            ScalarValue::Null => RowValues::Null,
            ScalarValue::Unchanged(v) => v,
            ScalarValue::Text(s) => RowValues::Text(s),
            ScalarValue::Boolean(b) => RowValues::Bool(b),
            ScalarValue::Float(f) => RowValues::Float(f64::from(f)),
            ScalarValue::Double(f) => RowValues::Float(f),
            other => match other.as_i128().and_then(|i| i64::try_from(i).ok()) {
                Some(i) => RowValues::Int(i),
                None => RowValues::Text(other.to_string()),
            },
        })
    }
}

impl<T: FromScalar> FromScalar for Option<T> {
    fn from_scalar(value: ScalarValue) -> Result<Self, SqlPagerError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_scalar(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RowValues {
        RowValues::Text(s.to_string())
    }

    #[test]
    fn integer_targets_accept_hex_and_padding() {
        assert_eq!(coerce(text("0x1F"), ScalarType::Integer).unwrap(), ScalarValue::Integer(31));
        assert_eq!(coerce(text("#ff"), ScalarType::Short).unwrap(), ScalarValue::Short(255));
        assert_eq!(coerce(text("-0X80"), ScalarType::Byte).unwrap(), ScalarValue::Byte(-128));
        assert_eq!(coerce(text(" 42 "), ScalarType::Long).unwrap(), ScalarValue::Long(42));
        assert_eq!(coerce(text("1 000"), ScalarType::Integer).unwrap(), ScalarValue::Integer(1000));
        assert_eq!(
            coerce(RowValues::Int(9), ScalarType::BigInteger).unwrap(),
            ScalarValue::BigInteger(9)
        );
    }

    #[test]
    fn unparsable_numbers_fail() {
        let err = coerce(text("abc"), ScalarType::Integer).unwrap_err();
        match err {
            SqlPagerError::CoercionError { raw, target, .. } => {
                assert_eq!(raw, "abc");
                assert_eq!(target, "integer");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(coerce(text("0x"), ScalarType::Long).is_err());
        assert!(coerce(text("300"), ScalarType::Byte).is_err());
        assert!(coerce(text("0x1F"), ScalarType::Double).is_err());
    }

    #[test]
    fn floating_and_decimal_targets() {
        assert_eq!(coerce(text("2.5"), ScalarType::Double).unwrap(), ScalarValue::Double(2.5));
        assert_eq!(coerce(text(" 1.25"), ScalarType::Float).unwrap(), ScalarValue::Float(1.25));
        assert_eq!(
            coerce(text("10.50"), ScalarType::BigDecimal).unwrap(),
            ScalarValue::Decimal(Decimal::new(1050, 2))
        );
        assert_eq!(
            coerce(RowValues::Int(3), ScalarType::Number).unwrap(),
            ScalarValue::Decimal(Decimal::new(3, 0))
        );
    }

    #[test]
    fn boolean_token_table() {
        for token in ["y", "T", "on", "YES", "true", "True"] {
            assert_eq!(coerce(text(token), ScalarType::Boolean).unwrap(), ScalarValue::Boolean(true));
        }
        for token in ["n", "F", "no", "off", "OFF", "false"] {
            assert_eq!(coerce(text(token), ScalarType::Boolean).unwrap(), ScalarValue::Boolean(false));
        }
        for token in ["maybe", "1", "0", "", "falsy", "tru"] {
            assert_eq!(coerce(text(token), ScalarType::Boolean).unwrap(), ScalarValue::Null);
        }
        assert_eq!(coerce(RowValues::Null, ScalarType::Boolean).unwrap(), ScalarValue::Null);
    }

    #[test]
    fn text_and_other_targets_leave_values_alone() {
        assert_eq!(coerce(text(" a b "), ScalarType::Text).unwrap(), ScalarValue::Text(" a b ".into()));
        assert_eq!(
            coerce(RowValues::Int(5), ScalarType::Text).unwrap(),
            ScalarValue::Unchanged(RowValues::Int(5))
        );
        assert_eq!(
            coerce(RowValues::Blob(vec![1]), ScalarType::Other).unwrap(),
            ScalarValue::Unchanged(RowValues::Blob(vec![1]))
        );
    }

    #[test]
    fn null_never_fails() {
        for ty in [ScalarType::Integer, ScalarType::Double, ScalarType::BigDecimal, ScalarType::Text] {
            assert_eq!(coerce(RowValues::Null, ty).unwrap(), ScalarValue::Null);
        }
    }

    #[test]
    fn field_conversions() {
        assert_eq!(i64::from_scalar(ScalarValue::Integer(4)).unwrap(), 4);
        assert!(u8::from_scalar(ScalarValue::Long(-1)).is_err());
        assert_eq!(Option::<i32>::from_scalar(ScalarValue::Null).unwrap(), None);
        assert_eq!(String::from_scalar(ScalarValue::Long(12)).unwrap(), "12");
        assert!(bool::from_scalar(ScalarValue::Boolean(true)).unwrap());
    }

    #[test]
    fn type_names_parse() {
        assert_eq!("Long".parse::<ScalarType>().unwrap(), ScalarType::Long);
        assert_eq!("big-decimal".parse::<ScalarType>().unwrap(), ScalarType::BigDecimal);
        assert!("uuid".parse::<ScalarType>().is_err());
    }
}
