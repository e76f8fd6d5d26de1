//! Eager JSON parsing.
//!
//! The whole input is read into memory and parsed as one JSON value. Supported documents:
//!
//! - An array: `[{"a":1}, {"a":2}]`: one record per element, ids assigned by the store.
//! - An object: `{"x": {"a":1}, "y": 2}`: nested objects are written to the id named by their
//!   key; any other value becomes a single-field record `{"y": 2}` with a store-assigned id.
//!   An empty object yields one empty record.
//!
//! Anything else is an [`EagerParseError`]; the importer then retries the input with the
//! streaming parser in [`super::json_stream`].

use std::fmt;
use std::io::{self, Read};
use std::string::FromUtf8Error;

use serde_json::Value;
use thiserror::Error;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{Fields, Record};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// The input could not be handled by the eager parser.
///
/// Every variant except [`EagerParseError::Io`] means "not a single well-formed array or object"
/// and is recoverable by falling back to streaming.
#[derive(Debug, Error)]
pub enum EagerParseError {
    /// Reading the input failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The input is not UTF-8 text.
    #[error("input is not valid utf-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// The input is not one well-formed JSON value.
    #[error("json syntax error: {0}")]
    Syntax(#[from] serde_json::Error),

    /// The input is valid JSON but neither an array nor an object.
    #[error("top-level json value is {0}, expected an array or object")]
    NotAContainer(&'static str),
}

impl EagerParseError {
    /// Returns `true` if the streaming parser should be tried next.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Top-level shape of an eagerly parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    Array,
    Object,
}

/// Records produced lazily from an eagerly parsed document.
pub struct EagerRecords {
    shape: DocumentShape,
    entries: usize,
    inner: Inner,
}

enum Inner {
    Array {
        items: std::vec::IntoIter<Value>,
        index: usize,
    },
    Object(serde_json::map::IntoIter),
    EmptyObject(Option<Record>),
}

impl fmt::Debug for EagerRecords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EagerRecords")
            .field("shape", &self.shape)
            .field("entries", &self.entries)
            .finish()
    }
}

impl EagerRecords {
    /// Shape of the parsed document.
    pub fn shape(&self) -> DocumentShape {
        self.shape
    }

    /// Number of array elements or object keys in the document.
    pub fn entries(&self) -> usize {
        self.entries
    }
}

impl Iterator for EagerRecords {
    type Item = IngestionResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            Inner::Array { items, index } => {
                let item = items.next()?;
                let at = *index;
                *index += 1;
                Some(match item {
                    Value::Object(fields) => Ok(Record::new(fields)),
                    other => Err(IngestionError::InvalidDocument {
                        message: format!(
                            "array element {at} is {}, expected an object",
                            kind_of(&other)
                        ),
                    }),
                })
            }
            Inner::Object(entries) => {
                let (key, value) = entries.next()?;
                Some(Ok(match value {
                    Value::Object(fields) => Record::with_id(key, fields),
                    scalar => {
                        let mut fields = Fields::new();
                        fields.insert(key, scalar);
                        Record::new(fields)
                    }
                }))
            }
            Inner::EmptyObject(record) => record.take().map(Ok),
        }
    }
}

/// Read all of `input` and parse it as one JSON array or object.
pub fn parse_document<R: Read>(mut input: R) -> Result<EagerRecords, EagerParseError> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    let text = String::from_utf8(bytes)?;
    records_from_str(&text)
}

/// Parse an in-memory string as one JSON array or object.
pub fn records_from_str(text: &str) -> Result<EagerRecords, EagerParseError> {
    let value: Value = serde_json::from_str(text)?;
    records_from_value(value)
}

/// Turn an already parsed JSON value into records.
pub fn records_from_value(value: Value) -> Result<EagerRecords, EagerParseError> {
    match value {
        Value::Array(items) => Ok(EagerRecords {
            shape: DocumentShape::Array,
            entries: items.len(),
            inner: Inner::Array {
                items: items.into_iter(),
                index: 0,
            },
        }),
        Value::Object(map) if map.is_empty() => Ok(EagerRecords {
            shape: DocumentShape::Object,
            entries: 0,
            inner: Inner::EmptyObject(Some(Record::default())),
        }),
        Value::Object(map) => Ok(EagerRecords {
            shape: DocumentShape::Object,
            entries: map.len(),
            inner: Inner::Object(map.into_iter()),
        }),
        other => Err(EagerParseError::NotAContainer(kind_of(&other))),
    }
}

pub(crate) fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DocumentShape, EagerParseError, parse_document, records_from_str};
    use crate::error::IngestionError;
    use crate::types::Record;

    fn collect(text: &str) -> Vec<Record> {
        records_from_str(text)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn array_elements_get_generated_ids() {
        let records = collect(r#"[{"a":1},{"a":2},{"a":3}]"#);
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.id.is_none()));
        assert_eq!(records[2].get("a"), Some(&json!(3)));
    }

    #[test]
    fn object_keys_split_by_value_kind() {
        let mut records = collect(r#"{"a": {"x": 1}, "b": 2}"#);
        records.sort_by_key(|r| r.id.is_none());
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].id.as_deref(), Some("a"));
        assert_eq!(records[0].fields, json!({"x": 1}).as_object().cloned().unwrap());

        assert_eq!(records[1].id, None);
        assert_eq!(records[1].fields, json!({"b": 2}).as_object().cloned().unwrap());
    }

    #[test]
    fn arrays_and_nulls_under_keys_are_treated_as_scalars() {
        let records = collect(r#"{"list": [1, 2], "nothing": null}"#);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.id.is_none()));
        assert!(records.iter().any(|r| r.get("list") == Some(&json!([1, 2]))));
    }

    #[test]
    fn empty_object_yields_one_empty_record() {
        let parsed = records_from_str("{}").unwrap();
        assert_eq!(parsed.shape(), DocumentShape::Object);
        let records: Vec<_> = parsed.collect::<Result<_, _>>().unwrap();
        assert_eq!(records, vec![Record::default()]);
    }

    #[test]
    fn empty_array_yields_nothing() {
        assert!(collect("[]").is_empty());
    }

    #[test]
    fn scalar_documents_are_recoverable_errors() {
        let err = records_from_str("42").unwrap_err();
        assert!(matches!(err, EagerParseError::NotAContainer("a number")));
        assert!(err.is_recoverable());
    }

    #[test]
    fn syntax_errors_are_recoverable() {
        let err = records_from_str(r#"[{"a":1}] trailing"#).unwrap_err();
        assert!(matches!(err, EagerParseError::Syntax(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn bom_is_ignored_and_invalid_utf8_is_recoverable() {
        let with_bom = b"\xEF\xBB\xBF[{\"a\":1}]";
        assert_eq!(parse_document(&with_bom[..]).unwrap().entries(), 1);

        let err = parse_document(&b"[\"\xff\"]"[..]).unwrap_err();
        assert!(matches!(err, EagerParseError::Utf8(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn non_object_array_element_is_invalid_document() {
        let mut records = records_from_str(r#"[{"a":1}, 5]"#).unwrap();
        assert!(records.next().unwrap().is_ok());
        let err = records.next().unwrap().unwrap_err();
        match err {
            IngestionError::InvalidDocument { message } => {
                assert!(message.contains("element 1 is a number"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
