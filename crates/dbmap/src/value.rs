//! Driver-neutral values.
//!
//! Everything dbmap binds as a statement parameter, and everything it decodes from a
//! result row, passes through [`Value`]. Record fields convert in and out of it via
//! [`ToValue`] and [`FromValue`]; the derive macro generates those calls per field.

use std::fmt;

/// A single SQL value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the variant, used in decode error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "'{v}'"),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

/// Conversion of a Rust value into a bound parameter.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Conversion of a decoded column value back into a Rust value.
///
/// The error is a human-readable message; callers attach the column name.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, String>;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, String> {
        Ok(value)
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

fn mismatch(expected: &str, value: &Value) -> String {
    format!("cannot decode {} value as {expected}", value.kind())
}

/// Integer range of `i64` as `f64` bounds: `[-2^63, 2^63)`.
const I64_FLOAT_RANGE: std::ops::Range<f64> = -9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0;

fn float_to_i64(f: f64) -> Result<i64, String> {
    if f.fract() == 0.0 && I64_FLOAT_RANGE.contains(&f) {
        Ok(f as i64)
    } else {
        Err(format!("{f} is not an integer in i64 range"))
    }
}

macro_rules! impl_int_to_value {
    ($($ty:ty),*) => {$(
        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::Int(i64::from(*self))
            }
        }
    )*};
}

impl_int_to_value!(i8, i16, i32, i64, u8, u16, u32);

// Pointer-sized integers; anything outside i64 travels as text like large u64.
macro_rules! impl_wide_int_to_value {
    ($($ty:ty),*) => {$(
        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                match i64::try_from(*self) {
                    Ok(v) => Value::Int(v),
                    Err(_) => Value::Text(self.to_string()),
                }
            }
        }
    )*};
}

impl_wide_int_to_value!(isize, usize);

macro_rules! impl_int {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, String> {
                let wide: i64 = match &value {
                    Value::Int(v) => *v,
                    Value::Bool(b) => i64::from(*b),
                    Value::Float(f) => float_to_i64(*f)?,
                    Value::Text(s) => s
                        .trim()
                        .parse::<i64>()
                        .map_err(|e| format!("cannot parse '{s}' as integer: {e}"))?,
                    _ => return Err(mismatch(stringify!($ty), &value)),
                };
                <$ty>::try_from(wide)
                    .map_err(|_| format!("{wide} is out of range for {}", stringify!($ty)))
            }
        }
    )*};
}

impl_int!(i8, i16, i32, i64, isize, u8, u16, u32, usize);

impl ToValue for u64 {
    fn to_value(&self) -> Value {
        // Values above i64::MAX cannot be bound losslessly; they travel as text.
        match i64::try_from(*self) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Text(self.to_string()),
        }
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self, String> {
        match &value {
            Value::Int(v) => u64::try_from(*v).map_err(|_| format!("{v} is out of range for u64")),
            Value::Bool(b) => Ok(u64::from(*b)),
            Value::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("cannot parse '{s}' as u64: {e}")),
            _ => Err(mismatch("u64", &value)),
        }
    }
}

macro_rules! impl_float {
    ($($ty:ty),*) => {$(
        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::Float(*self as f64)
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, String> {
                match &value {
                    Value::Float(v) => Ok(*v as $ty),
                    Value::Int(v) => Ok(*v as $ty),
                    Value::Text(s) => s
                        .trim()
                        .parse::<$ty>()
                        .map_err(|e| format!("cannot parse '{s}' as float: {e}")),
                    _ => Err(mismatch(stringify!($ty), &value)),
                }
            }
        }
    )*};
}

impl_float!(f32, f64);

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, String> {
        match &value {
            Value::Bool(b) => Ok(*b),
            Value::Int(v) => Ok(*v != 0),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(true),
                "false" | "f" | "0" => Ok(false),
                _ => Err(format!("cannot parse '{s}' as bool")),
            },
            _ => Err(mismatch("bool", &value)),
        }
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s),
            // sqlite column affinity can hand back numbers for text-typed fields
            Value::Int(v) => Ok(v.to_string()),
            Value::Float(v) => Ok(v.to_string()),
            Value::Bool(v) => Ok(v.to_string()),
            Value::Bytes(b) => String::from_utf8(b).map_err(|e| e.to_string()),
            Value::Null => Err(mismatch("String", &Value::Null)),
        }
    }
}

impl ToValue for [u8] {
    fn to_value(&self) -> Value {
        Value::Bytes(self.to_vec())
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

impl ToValue for chrono::NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::Text(self.format(DATETIME_FORMAT).to_string())
    }
}

impl FromValue for chrono::NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, String> {
        match &value {
            Value::Text(s) => chrono::NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                .map_err(|e| format!("cannot parse '{s}' as datetime: {e}")),
            Value::Int(secs) => chrono::DateTime::from_timestamp(*secs, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| format!("{secs} is not a valid unix timestamp")),
            _ => Err(mismatch("NaiveDateTime", &value)),
        }
    }
}

impl ToValue for chrono::NaiveDate {
    fn to_value(&self) -> Value {
        Value::Text(self.format(DATE_FORMAT).to_string())
    }
}

impl FromValue for chrono::NaiveDate {
    fn from_value(value: Value) -> Result<Self, String> {
        match &value {
            Value::Text(s) => chrono::NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map_err(|e| format!("cannot parse '{s}' as date: {e}")),
            _ => Err(mismatch("NaiveDate", &value)),
        }
    }
}

impl ToValue for chrono::NaiveTime {
    fn to_value(&self) -> Value {
        Value::Text(self.format(TIME_FORMAT).to_string())
    }
}

impl FromValue for chrono::NaiveTime {
    fn from_value(value: Value) -> Result<Self, String> {
        match &value {
            Value::Text(s) => chrono::NaiveTime::parse_from_str(s, TIME_FORMAT)
                .map_err(|e| format!("cannot parse '{s}' as time: {e}")),
            _ => Err(mismatch("NaiveTime", &value)),
        }
    }
}

impl ToValue for chrono::DateTime<chrono::Utc> {
    fn to_value(&self) -> Value {
        Value::Text(self.to_rfc3339())
    }
}

impl FromValue for chrono::DateTime<chrono::Utc> {
    fn from_value(value: Value) -> Result<Self, String> {
        match &value {
            Value::Text(s) => chrono::DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .or_else(|_| {
                    chrono::NaiveDateTime::from_value(value.clone()).map(|dt| dt.and_utc())
                })
                .map_err(|e| format!("cannot parse '{s}' as timestamp: {e}")),
            Value::Int(secs) => chrono::DateTime::from_timestamp(*secs, 0)
                .ok_or_else(|| format!("{secs} is not a valid unix timestamp")),
            _ => Err(mismatch("DateTime<Utc>", &value)),
        }
    }
}

impl ToValue for uuid::Uuid {
    fn to_value(&self) -> Value {
        Value::Text(self.hyphenated().to_string())
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: Value) -> Result<Self, String> {
        match &value {
            Value::Text(s) => uuid::Uuid::parse_str(s).map_err(|e| e.to_string()),
            Value::Bytes(b) => uuid::Uuid::from_slice(b).map_err(|e| e.to_string()),
            _ => Err(mismatch("Uuid", &value)),
        }
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, String> {
        match &value {
            Value::Text(s) => serde_json::from_str(s).map_err(|e| e.to_string()),
            Value::Null => Ok(serde_json::Value::Null),
            _ => Err(mismatch("JSON", &value)),
        }
    }
}

/// Positional arguments for a `?`-placeholder predicate.
///
/// Implemented for `()`, arrays, slices and vectors of one value type, and tuples of up to
/// eight mixed value types:
///
/// ```ignore
/// db.table("user").count("userid=?", ["A"]).await?;
/// db.table("user").count("userid=? AND nickname=?", ("A", "eschao")).await?;
/// ```
pub trait IntoParams {
    fn into_params(self) -> Vec<Value>;
}

impl IntoParams for () {
    fn into_params(self) -> Vec<Value> {
        Vec::new()
    }
}

impl<T: ToValue> IntoParams for Vec<T> {
    fn into_params(self) -> Vec<Value> {
        self.iter().map(ToValue::to_value).collect()
    }
}

impl<T: ToValue> IntoParams for &[T] {
    fn into_params(self) -> Vec<Value> {
        self.iter().map(ToValue::to_value).collect()
    }
}

impl<T: ToValue, const N: usize> IntoParams for [T; N] {
    fn into_params(self) -> Vec<Value> {
        self.iter().map(ToValue::to_value).collect()
    }
}

macro_rules! impl_into_params_tuple {
    ($($name:ident),+) => {
        impl<$($name: ToValue),+> IntoParams for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_params(self) -> Vec<Value> {
                let ($($name,)+) = self;
                vec![$($name.to_value()),+]
            }
        }
    };
}

impl_into_params_tuple!(A);
impl_into_params_tuple!(A, B);
impl_into_params_tuple!(A, B, C);
impl_into_params_tuple!(A, B, C, D);
impl_into_params_tuple!(A, B, C, D, E);
impl_into_params_tuple!(A, B, C, D, E, F);
impl_into_params_tuple!(A, B, C, D, E, F, G);
impl_into_params_tuple!(A, B, C, D, E, F, G, H);

/// Build a `Vec<Value>` from heterogeneous expressions.
///
/// ```ignore
/// let args = dbmap::params!["A", 42_i64, None::<String>];
/// ```
#[macro_export]
macro_rules! params {
    () => { ::std::vec::Vec::<$crate::Value>::new() };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::ToValue::to_value(&$value)),+]
    };
}
