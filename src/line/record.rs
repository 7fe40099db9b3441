//! Line-protocol records and their text encoding.

use std::fmt;

/// Escape a tag value: backslash, comma, space and equals sign each get a
/// leading backslash. Backslash is handled first so escapes are not doubled.
pub fn escape_tag_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ',' | ' ' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Quote a string field value, escaping backslash, double quote and newline.
pub fn quote_field_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

/// Coerce a raw device value to a number.
///
/// Missing values, the empty string, `nan`, non-finite results and anything
/// that does not parse are all absent rather than zero.
pub fn parse_number(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() || raw == "nan" {
        return None;
    }
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Parsed telemetry reading
    Float(f64),
    /// Constant flag or counter. Written without the `i` suffix, so InfluxDB
    /// stores it as a float alongside the parsed readings.
    Integer(i64),
    /// Quoted string value
    Text(String),
}

impl FieldValue {
    /// Numeric field from a raw device value.
    pub fn number(raw: Option<&str>) -> Option<Self> {
        parse_number(raw).map(FieldValue::Float)
    }

    /// String field; the empty string is absent.
    pub fn text(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            None
        } else {
            Some(FieldValue::Text(raw.to_string()))
        }
    }

    /// `1` when the flag is set, `0` otherwise.
    pub fn flag(set: bool) -> Self {
        FieldValue::Integer(i64::from(set))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Float(value) => write!(f, "{value}"),
            FieldValue::Integer(value) => write!(f, "{value}"),
            FieldValue::Text(value) => f.write_str(&quote_field_string(value)),
        }
    }
}

/// One line-protocol record: `measurement[,tags] fields timestamp`.
///
/// Tags and fields keep insertion order. Blank tags and absent fields are
/// dropped as they are added, so a built record only holds what will be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub measurement: String,
    pub tags: Vec<(String, String)>,
    pub fields: Vec<(String, FieldValue)>,
    /// Unix timestamp in whole seconds
    pub timestamp: i64,
}

impl Record {
    pub fn new(measurement: impl Into<String>, timestamp: i64) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Vec::new(),
            fields: Vec::new(),
            timestamp,
        }
    }

    /// Add a tag unless its value is empty or only whitespace.
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        if !value.trim().is_empty() {
            self.tags.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Add a field if it is present.
    pub fn with_field(mut self, key: &str, value: Option<FieldValue>) -> Self {
        if let Some(value) = value {
            self.fields.push((key.to_string(), value));
        }
        self
    }

    /// Add every present field from an ordered list of candidates.
    pub fn with_fields<'a, I>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<FieldValue>)>,
    {
        fields
            .into_iter()
            .fold(self, |record, (key, value)| record.with_field(key, value))
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// A record without fields is not valid line protocol and must not be sent.
    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Render the record as one line of line protocol.
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.measurement)?;
        for (key, value) in &self.tags {
            write!(f, ",{}={}", key, escape_tag_value(value))?;
        }
        f.write_str(" ")?;
        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
        }
        write!(f, " {}", self.timestamp)
    }
}
