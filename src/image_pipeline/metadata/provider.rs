use std::fmt;

use crate::image_pipeline::common::error::{DevelopError, Result};

/// A single metadata value as stored by a [`MetadataProvider`].
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<MetadataValue>),
}

impl MetadataValue {
    /// Descends through lists to their first element.
    fn first(&self) -> Option<&MetadataValue> {
        match self {
            MetadataValue::List(items) => items.first().and_then(MetadataValue::first),
            other => Some(other),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.first()? {
            MetadataValue::Int(v) => Some(*v),
            MetadataValue::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            MetadataValue::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .map(|v| v.trunc() as i64)
                })
            }
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.first()? {
            MetadataValue::Int(v) => Some(*v as f64),
            MetadataValue::Float(v) => Some(*v),
            MetadataValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self.first()? {
            MetadataValue::Int(v) => Some(v.to_string()),
            MetadataValue::Float(v) => Some(v.to_string()),
            MetadataValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Raw bytes, from `Bytes`, the UTF-8 of `Text`, or a list of integers in `0..=255`.
    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        match self {
            MetadataValue::Bytes(b) => Some(b.clone()),
            MetadataValue::Text(s) => Some(s.as_bytes().to_vec()),
            MetadataValue::List(items) => items
                .iter()
                .map(|item| match item {
                    MetadataValue::Int(v) => u8::try_from(*v).ok(),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Int(v) => write!(f, "{v}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Text(s) => write!(f, "{s:?}"),
            MetadataValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            MetadataValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for MetadataValue {
            fn from(v: $t) -> Self {
                MetadataValue::Int(v as i64)
            }
        })*
    };
}

impl_from_int!(i32, i64, u8, u16, u32);

impl From<usize> for MetadataValue {
    fn from(v: usize) -> Self {
        MetadataValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f32> for MetadataValue {
    fn from(v: f32) -> Self {
        MetadataValue::Float(v as f64)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::Text(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::Text(v)
    }
}

impl From<Vec<u8>> for MetadataValue {
    fn from(v: Vec<u8>) -> Self {
        MetadataValue::Bytes(v)
    }
}

impl From<Vec<MetadataValue>> for MetadataValue {
    fn from(v: Vec<MetadataValue>) -> Self {
        MetadataValue::List(v)
    }
}

/// Keyed access to the metadata embedded in a capture.
///
/// Implementors only supply [`lookup`](Self::lookup); the typed accessors are
/// provided and share one set of coercion rules:
///
/// * `Int` and `Float` convert into each other, floats truncating toward zero.
/// * `Text` is parsed when a number is requested.
/// * A `List` answers every scalar accessor with its **first** element. Keys
///   such as `Raw.BlackLevel` are often stored as one value per channel and
///   callers reading them as a scalar get channel 0.
/// * `Bytes` is only readable through [`get_bytes`](Self::get_bytes).
///
/// An absent key is [`DevelopError::MetadataKeyMissing`]; a present value that
/// cannot be coerced is [`DevelopError::MetadataTypeMismatch`].
pub trait MetadataProvider {
    fn lookup(&self, key: &str) -> Option<MetadataValue>;

    fn has_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.lookup(key).ok_or_else(|| DevelopError::missing(key))?;
        value.as_int().ok_or_else(|| mismatch(key, "integer"))
    }

    fn get_float(&self, key: &str) -> Result<f64> {
        let value = self.lookup(key).ok_or_else(|| DevelopError::missing(key))?;
        value.as_float().ok_or_else(|| mismatch(key, "float"))
    }

    fn get_string(&self, key: &str) -> Result<String> {
        let value = self.lookup(key).ok_or_else(|| DevelopError::missing(key))?;
        value.as_text().ok_or_else(|| mismatch(key, "string"))
    }

    fn get_bytes(&self, key: &str) -> Result<Vec<u8>> {
        let value = self.lookup(key).ok_or_else(|| DevelopError::missing(key))?;
        value.as_bytes().ok_or_else(|| mismatch(key, "bytes"))
    }

    /// Like [`get_int`](Self::get_int) but returns `default` when the key is
    /// absent. A present value of the wrong type is still an error.
    fn get_int_or(&self, key: &str, default: i64) -> Result<i64> {
        match self.get_int(key) {
            Err(DevelopError::MetadataKeyMissing { .. }) => Ok(default),
            other => other,
        }
    }

    fn get_float_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.get_float(key) {
            Err(DevelopError::MetadataKeyMissing { .. }) => Ok(default),
            other => other,
        }
    }

    fn get_string_opt(&self, key: &str) -> Result<Option<String>> {
        match self.get_string(key) {
            Err(DevelopError::MetadataKeyMissing { .. }) => Ok(None),
            other => other.map(Some),
        }
    }
}

impl<M: MetadataProvider + ?Sized> MetadataProvider for &M {
    fn lookup(&self, key: &str) -> Option<MetadataValue> {
        (**self).lookup(key)
    }
}

fn mismatch(key: &str, expected: &'static str) -> DevelopError {
    DevelopError::MetadataTypeMismatch {
        key: key.to_string(),
        expected,
    }
}
