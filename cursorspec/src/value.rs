use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;
use uuid::Uuid;

/// A column value at the current row. Absence is its own variant, independent
/// of the column's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// Storage class of a [`Value`], also used to describe a column's field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Integer,
    Real,
    Text,
    Blob,
}

impl ValueKind {
    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::Null => "NULL",
            ValueKind::Integer => "INTEGER",
            ValueKind::Real => "REAL",
            ValueKind::Text => "TEXT",
            ValueKind::Blob => "BLOB",
        }
    }

    /// Column affinity for a declared type, following SQLite's rules in
    /// order: INT, then CHAR/CLOB/TEXT, then BLOB or no type, then
    /// REAL/FLOA/DOUB. Everything else is numeric and surfaces as real.
    pub fn from_declared_type(decl: &str) -> ValueKind {
        let decl = decl.to_ascii_uppercase();
        if decl.contains("INT") {
            ValueKind::Integer
        } else if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("TEXT") {
            ValueKind::Text
        } else if decl.contains("BLOB") || decl.trim().is_empty() {
            ValueKind::Blob
        } else {
            ValueKind::Real
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Integer(_) => ValueKind::Integer,
            Value::Real(_) => ValueKind::Real,
            Value::Text(_) => ValueKind::Text,
            Value::Blob(_) => ValueKind::Blob,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r:?}"),
            Value::Text(s) => f.write_str(s),
            Value::Blob(bytes) => write!(f, "X'{}'", hex::encode_upper(bytes)),
        }
    }
}

/// Marker for an absent value. It is the only typed target a null converts
/// to, and it refuses every present value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DbNull;

/// Conversion from a column value to a Rust type.
///
/// The set of implementors is closed: it is the typed-access surface every
/// connector is checked against.
pub trait FromValue: Sealed {
    /// Rust-facing name of the target, used in mismatch errors.
    const TYPE_NAME: &'static str;

    fn from_sql(val: Value) -> Result<Self>
    where
        Self: Sized;
}

impl FromValue for Value {
    const TYPE_NAME: &'static str = "Value";

    fn from_sql(val: Value) -> Result<Self> {
        Ok(val)
    }
}
impl Sealed for Value {}

impl FromValue for DbNull {
    const TYPE_NAME: &'static str = "DbNull";

    fn from_sql(val: Value) -> Result<Self> {
        match val {
            Value::Null => Ok(DbNull),
            other => Err(Error::mismatch(Self::TYPE_NAME, other.kind())),
        }
    }
}
impl Sealed for DbNull {}

macro_rules! impl_int_from_value {
    ($ty:ty) => {
        impl FromValue for $ty {
            const TYPE_NAME: &'static str = stringify!($ty);

            fn from_sql(val: Value) -> Result<Self> {
                match val {
                    Value::Integer(i) => <$ty>::try_from(i).map_err(|_| Error::Overflow {
                        expected: Self::TYPE_NAME,
                        value: i.to_string(),
                    }),
                    other => Err(Error::mismatch(Self::TYPE_NAME, other.kind())),
                }
            }
        }

        impl Sealed for $ty {}
    };
}

impl_int_from_value!(u8);
impl_int_from_value!(i16);
impl_int_from_value!(i32);
impl_int_from_value!(i64);

impl FromValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_sql(val: Value) -> Result<Self> {
        match val {
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            Value::Integer(i) => Err(Error::Overflow {
                expected: Self::TYPE_NAME,
                value: i.to_string(),
            }),
            other => Err(Error::mismatch(Self::TYPE_NAME, other.kind())),
        }
    }
}
impl Sealed for bool {}

impl FromValue for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_sql(val: Value) -> Result<Self> {
        match val {
            Value::Real(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(Error::mismatch(Self::TYPE_NAME, other.kind())),
        }
    }
}
impl Sealed for f64 {}

impl FromValue for f32 {
    const TYPE_NAME: &'static str = "f32";

    fn from_sql(val: Value) -> Result<Self> {
        match val {
            Value::Real(f) => Ok(f as f32),
            Value::Integer(i) => Ok(i as f32),
            other => Err(Error::mismatch(Self::TYPE_NAME, other.kind())),
        }
    }
}
impl Sealed for f32 {}

impl FromValue for String {
    const TYPE_NAME: &'static str = "String";

    fn from_sql(val: Value) -> Result<Self> {
        match val {
            Value::Text(s) => Ok(s),
            other => Err(Error::mismatch(Self::TYPE_NAME, other.kind())),
        }
    }
}
impl Sealed for String {}

impl FromValue for Vec<u8> {
    const TYPE_NAME: &'static str = "Vec<u8>";

    fn from_sql(val: Value) -> Result<Self> {
        match val {
            Value::Blob(blob) => Ok(blob),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(Error::mismatch(Self::TYPE_NAME, other.kind())),
        }
    }
}
impl Sealed for Vec<u8> {}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

impl FromValue for NaiveDateTime {
    const TYPE_NAME: &'static str = "NaiveDateTime";

    fn from_sql(val: Value) -> Result<Self> {
        match val {
            Value::Text(s) => parse_date_time(&s).ok_or_else(|| Error::Overflow {
                expected: Self::TYPE_NAME,
                value: format!("'{s}'"),
            }),
            Value::Integer(secs) => DateTime::from_timestamp(secs, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| Error::Overflow {
                    expected: Self::TYPE_NAME,
                    value: secs.to_string(),
                }),
            other => Err(Error::mismatch(Self::TYPE_NAME, other.kind())),
        }
    }
}
impl Sealed for NaiveDateTime {}

fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

impl FromValue for Uuid {
    const TYPE_NAME: &'static str = "Uuid";

    /// Blobs use the mixed-endian field layout of Microsoft GUIDs: the first
    /// three fields are little-endian.
    fn from_sql(val: Value) -> Result<Self> {
        match val {
            Value::Blob(bytes) => Uuid::from_slice_le(&bytes).map_err(|_| Error::Overflow {
                expected: Self::TYPE_NAME,
                value: format!("{}-byte blob", bytes.len()),
            }),
            Value::Text(s) => Uuid::parse_str(s.trim()).map_err(|_| Error::Overflow {
                expected: Self::TYPE_NAME,
                value: format!("'{s}'"),
            }),
            other => Err(Error::mismatch(Self::TYPE_NAME, other.kind())),
        }
    }
}
impl Sealed for Uuid {}

mod sealed {
    pub trait Sealed {}
}
use sealed::Sealed;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_null_only_converts_to_db_null_or_value() {
        assert_eq!(DbNull::from_sql(Value::Null).unwrap(), DbNull);
        assert_eq!(Value::from_sql(Value::Null).unwrap(), Value::Null);
        assert_eq!(
            i64::from_sql(Value::Null).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(
            String::from_sql(Value::Null).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(
            Vec::<u8>::from_sql(Value::Null).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
    }

    #[test]
    fn test_db_null_rejects_present_values() {
        let err = DbNull::from_sql(Value::Integer(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(err.to_string(), "cannot read INTEGER value as DbNull");
    }

    #[test]
    fn test_narrow_integers_are_range_checked() {
        assert_eq!(u8::from_sql(Value::Integer(255)).unwrap(), 255);
        assert_eq!(
            u8::from_sql(Value::Integer(256)).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(
            u8::from_sql(Value::Integer(-1)).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(i16::from_sql(Value::Integer(-32768)).unwrap(), i16::MIN);
        assert!(i32::from_sql(Value::Integer(i64::MAX)).is_err());
    }

    #[test]
    fn test_bool_accepts_only_zero_and_one() {
        assert!(bool::from_sql(Value::Integer(1)).unwrap());
        assert!(!bool::from_sql(Value::Integer(0)).unwrap());
        assert!(bool::from_sql(Value::Integer(2)).is_err());
        assert!(bool::from_sql(Value::Text("true".into())).is_err());
    }

    #[test]
    fn test_floats_widen_integers() {
        assert_eq!(f64::from_sql(Value::Integer(3)).unwrap(), 3.0);
        assert_eq!(f32::from_sql(Value::Real(1.5)).unwrap(), 1.5);
        assert!(f64::from_sql(Value::Text("3".into())).is_err());
    }

    #[test]
    fn test_date_time_formats() {
        let expected = NaiveDate::from_ymd_opt(2014, 4, 15)
            .unwrap()
            .and_hms_opt(10, 47, 16)
            .unwrap();
        for text in ["2014-04-15 10:47:16", "2014-04-15T10:47:16", "2014-04-15 10:47:16.000"] {
            assert_eq!(
                NaiveDateTime::from_sql(Value::Text(text.into())).unwrap(),
                expected
            );
        }
        assert_eq!(
            NaiveDateTime::from_sql(Value::Integer(expected.and_utc().timestamp())).unwrap(),
            expected
        );
        assert!(NaiveDateTime::from_sql(Value::Text("yesterday".into())).is_err());
    }

    #[test]
    fn test_uuid_blob_uses_little_endian_fields() {
        let blob = hex::decode("0E7E0DDC5D364849AB9B8CA8056BF93A").unwrap();
        let expected = Uuid::parse_str("dc0d7e0e-365d-4948-ab9b-8ca8056bf93a").unwrap();
        assert_eq!(Uuid::from_sql(Value::Blob(blob)).unwrap(), expected);
        assert_eq!(
            Uuid::from_sql(Value::Text(
                "dc0d7e0e-365d-4948-ab9b-8ca8056bf93a".into()
            ))
            .unwrap(),
            expected
        );
        assert!(Uuid::from_sql(Value::Blob(vec![1, 2, 3])).is_err());
    }

    #[test]
    fn test_declared_type_affinity() {
        assert_eq!(ValueKind::from_declared_type("BIGINT"), ValueKind::Integer);
        assert_eq!(ValueKind::from_declared_type("varchar(20)"), ValueKind::Text);
        assert_eq!(ValueKind::from_declared_type(""), ValueKind::Blob);
        assert_eq!(ValueKind::from_declared_type("DOUBLE"), ValueKind::Real);
        assert_eq!(ValueKind::from_declared_type("DECIMAL(10,5)"), ValueKind::Real);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Blob(vec![0x7e, 0x57]).to_string(), "X'7E57'");
        assert_eq!(Value::Text("Ḁ".into()).to_string(), "Ḁ");
        assert_eq!(Value::Real(3.0).to_string(), "3.0");
        assert_eq!(Value::Null.to_string(), "NULL");
    }
}
