//! Streaming JSON array parsing.
//!
//! [`stream_array`] drives a [`serde_json::Deserializer`] over the input and visits the top-level
//! array one element at a time. Each element is handed to the caller's callback as soon as it is
//! deserialized, and the next element is not read until the callback returns, so memory use is
//! bounded by the largest element rather than the whole document.
//!
//! Bytes after the closing `]` of the top-level array are ignored.

use std::fmt;
use std::io::{BufRead, BufReader, Read};

use serde::de::{self, Deserializer as _, SeqAccess, Visitor};
use serde_json::Value;
use serde_json::error::Category;
use tracing::debug;

use crate::error::{IngestionError, IngestionResult};
use crate::types::Record;

use super::json::kind_of;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Stream the top-level JSON array in `input`, calling `on_record` once per element.
///
/// Returns the number of elements visited. Elements must be JSON objects; any other element is
/// an [`IngestionError::InvalidDocument`]. Malformed input is an
/// [`IngestionError::StreamingParse`]. An error returned by `on_record` stops the stream and is
/// returned unchanged.
pub fn stream_array<R, F>(input: R, mut on_record: F) -> IngestionResult<usize>
where
    R: Read,
    F: FnMut(Record) -> IngestionResult<()>,
{
    let mut input = BufReader::new(input);
    if input.fill_buf()?.starts_with(UTF8_BOM) {
        input.consume(UTF8_BOM.len());
    }

    let mut de = serde_json::Deserializer::from_reader(input);
    let mut aborted = None;
    let visitor = ArrayVisitor {
        on_record: &mut on_record,
        aborted: &mut aborted,
    };

    let elements = match (&mut de).deserialize_seq(visitor) {
        Ok(elements) => elements,
        Err(e) => return Err(aborted.unwrap_or_else(|| streaming_error(e))),
    };

    if de.end().is_err() {
        debug!(elements, "ignoring trailing bytes after top-level json array");
    }
    Ok(elements)
}

fn streaming_error(e: serde_json::Error) -> IngestionError {
    match e.classify() {
        Category::Io => IngestionError::Io(e.into()),
        _ => IngestionError::StreamingParse {
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        },
    }
}

// Hands each element to the callback. Callback failures are parked in `aborted` and surfaced
// to serde as a custom error so the deserializer unwinds.
struct ArrayVisitor<'a, F> {
    on_record: &'a mut F,
    aborted: &'a mut Option<IngestionError>,
}

impl<'de, F> Visitor<'de> for ArrayVisitor<'_, F>
where
    F: FnMut(Record) -> IngestionResult<()>,
{
    type Value = usize;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a json array of objects")
    }

    fn visit_seq<A>(mut self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut elements = 0usize;
        while let Some(value) = seq.next_element::<Value>()? {
            let index = elements;
            elements += 1;

            let outcome = match value {
                Value::Object(fields) => (self.on_record)(Record::new(fields)),
                other => Err(IngestionError::InvalidDocument {
                    message: format!(
                        "array element {index} is {}, expected an object",
                        kind_of(&other)
                    ),
                }),
            };
            if let Err(e) = outcome {
                *self.aborted = Some(e);
                return Err(de::Error::custom(format!("stopped at array element {index}")));
            }
        }
        Ok(elements)
    }
}
