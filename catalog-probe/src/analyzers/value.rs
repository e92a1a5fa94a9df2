//! Scalar sample values and row samples.
//!
//! Rows fetched from the catalog arrive as loosely-typed JSON. They are turned
//! into [`SampleValue`], a closed set of variants that the analyzers can match
//! on exhaustively, and grouped into a [`Sample`] aligned to a column list.

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single scalar taken from a sampled row.
#[derive(Debug, Clone, Default)]
pub enum SampleValue {
    /// SQL/JSON null
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integral number that fits into an `i64`
    Integer(i64),
    /// Any other JSON number
    Float(f64),
    /// Text value
    Text(String),
    /// Arrays, objects and anything else the catalog returns
    Other(serde_json::Value),
}

impl SampleValue {
    /// Returns true for [`SampleValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, SampleValue::Null)
    }

    /// Best-effort numeric coercion.
    ///
    /// Native numbers pass through, text is trimmed and parsed as `f64`.
    /// Booleans, nested values, unparsable text and non-finite results yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            SampleValue::Integer(i) => *i as f64,
            SampleValue::Float(f) => *f,
            SampleValue::Text(s) => s.trim().parse::<f64>().ok()?,
            SampleValue::Null | SampleValue::Boolean(_) | SampleValue::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// String form used for deterministic ordering of equal-count entries.
    pub fn display_form(&self) -> Cow<'_, str> {
        match self {
            SampleValue::Null => Cow::Borrowed("null"),
            SampleValue::Boolean(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            SampleValue::Integer(i) => Cow::Owned(i.to_string()),
            SampleValue::Float(f) => Cow::Owned(f.to_string()),
            SampleValue::Text(s) => Cow::Borrowed(s.as_str()),
            SampleValue::Other(v) => Cow::Owned(v.to_string()),
        }
    }

    /// Stable rank of the variant, used when two values share a display form.
    pub(crate) fn variant_rank(&self) -> u8 {
        match self {
            SampleValue::Null => 0,
            SampleValue::Boolean(_) => 1,
            SampleValue::Integer(_) => 2,
            SampleValue::Float(_) => 3,
            SampleValue::Text(_) => 4,
            SampleValue::Other(_) => 5,
        }
    }

    /// Float bits with `-0.0` folded into `0.0` and a single NaN pattern.
    fn float_key(f: f64) -> u64 {
        if f == 0.0 {
            0.0f64.to_bits()
        } else if f.is_nan() {
            f64::NAN.to_bits()
        } else {
            f.to_bits()
        }
    }
}

impl PartialEq for SampleValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SampleValue::Null, SampleValue::Null) => true,
            (SampleValue::Boolean(a), SampleValue::Boolean(b)) => a == b,
            (SampleValue::Integer(a), SampleValue::Integer(b)) => a == b,
            (SampleValue::Float(a), SampleValue::Float(b)) => {
                Self::float_key(*a) == Self::float_key(*b)
            }
            (SampleValue::Text(a), SampleValue::Text(b)) => a == b,
            (SampleValue::Other(a), SampleValue::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for SampleValue {}

impl Hash for SampleValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variant_rank().hash(state);
        match self {
            SampleValue::Null => {}
            SampleValue::Boolean(b) => b.hash(state),
            SampleValue::Integer(i) => i.hash(state),
            SampleValue::Float(f) => Self::float_key(*f).hash(state),
            SampleValue::Text(s) => s.hash(state),
            // serde_json::Value has no Hash impl; its canonical text does.
            SampleValue::Other(v) => v.to_string().hash(state),
        }
    }
}

impl From<serde_json::Value> for SampleValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => SampleValue::Null,
            serde_json::Value::Bool(b) => SampleValue::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => SampleValue::Integer(i),
                None => match n.as_f64() {
                    Some(f) => SampleValue::Float(f),
                    None => SampleValue::Other(serde_json::Value::Number(n)),
                },
            },
            serde_json::Value::String(s) => SampleValue::Text(s),
            other => SampleValue::Other(other),
        }
    }
}

impl From<&str> for SampleValue {
    fn from(value: &str) -> Self {
        SampleValue::Text(value.to_string())
    }
}

impl From<String> for SampleValue {
    fn from(value: String) -> Self {
        SampleValue::Text(value)
    }
}

impl From<i64> for SampleValue {
    fn from(value: i64) -> Self {
        SampleValue::Integer(value)
    }
}

impl From<f64> for SampleValue {
    fn from(value: f64) -> Self {
        SampleValue::Float(value)
    }
}

impl From<bool> for SampleValue {
    fn from(value: bool) -> Self {
        SampleValue::Boolean(value)
    }
}

impl<T: Into<SampleValue>> From<Option<T>> for SampleValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SampleValue::Null, Into::into)
    }
}

impl Serialize for SampleValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SampleValue::Null => serializer.serialize_unit(),
            SampleValue::Boolean(b) => serializer.serialize_bool(*b),
            SampleValue::Integer(i) => serializer.serialize_i64(*i),
            SampleValue::Float(f) => serializer.serialize_f64(*f),
            SampleValue::Text(s) => serializer.serialize_str(s),
            SampleValue::Other(v) => v.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for SampleValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(SampleValue::from)
    }
}

/// A bounded set of rows aligned to a column list.
///
/// Rows may be shorter than `columns`; trailing positions that are missing are
/// absent for that row rather than null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SampleValue>>,
    /// More rows existed beyond the row cap used to fetch this sample.
    #[serde(default)]
    pub truncated: bool,
}

impl Sample {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SampleValue>>) -> Self {
        Self {
            columns,
            rows,
            truncated: false,
        }
    }

    pub fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }

    /// Single-column sample, one row per value.
    pub fn single_column(
        name: impl Into<String>,
        values: impl IntoIterator<Item = SampleValue>,
    ) -> Self {
        Self::new(
            vec![name.into()],
            values.into_iter().map(|v| vec![v]).collect(),
        )
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when there is nothing to analyze: no columns or no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    /// Position of a column, matching exactly first and then ignoring ASCII case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
    }

    /// Values of one column in row order, skipping rows too short to hold it.
    pub fn column_values(&self, index: usize) -> Vec<&SampleValue> {
        self.rows.iter().filter_map(|row| row.get(index)).collect()
    }

    /// Keeps the first `cap` rows and flags truncation if anything was dropped.
    pub fn truncate_rows(&mut self, cap: usize) {
        if self.rows.len() > cap {
            self.rows.truncate(cap);
            self.truncated = true;
        }
    }
}
