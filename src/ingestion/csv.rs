//! CSV record source.
//!
//! Rows are streamed one at a time from the underlying reader; only the current row is held in
//! memory.

use std::io::Read;

use csv::StringRecord;

use crate::error::IngestionResult;
use crate::types::{Fields, Record};

use super::coerce::coerce_scalar;

/// Streaming iterator of [`Record`]s parsed from CSV text.
///
/// Rules:
///
/// - The first row is the header row.
/// - Columns whose header is blank are dropped.
/// - Each cell is typed with [`coerce_scalar`].
/// - Rows may be ragged: missing cells are omitted, cells past the last header are ignored.
pub struct CsvRecords<R> {
    reader: csv::Reader<R>,
    headers: Vec<Option<String>>,
    row: StringRecord,
    rows_read: usize,
}

impl<R: Read> CsvRecords<R> {
    /// Start reading CSV from `input`. Reads the header row immediately.
    pub fn new(input: R) -> IngestionResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let headers = reader
            .headers()?
            .iter()
            .map(|h| (!h.trim().is_empty()).then(|| h.to_owned()))
            .collect();

        Ok(Self {
            reader,
            headers,
            row: StringRecord::new(),
            rows_read: 0,
        })
    }

    /// Number of data rows read so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }
}

impl<R: Read> Iterator for CsvRecords<R> {
    type Item = IngestionResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.row) {
            Ok(true) => {
                self.rows_read += 1;
                Some(Ok(Record::new(typed_fields(&self.headers, &self.row))))
            }
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}

fn typed_fields(headers: &[Option<String>], row: &StringRecord) -> Fields {
    let mut fields = Fields::new();
    for (header, raw) in headers.iter().zip(row.iter()) {
        if let Some(name) = header {
            fields.insert(name.clone(), coerce_scalar(raw));
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::CsvRecords;
    use crate::error::IngestionError;
    use crate::types::Record;

    fn parse(input: &str) -> Vec<Record> {
        CsvRecords::new(input.as_bytes())
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn rows_become_typed_records() {
        let records = parse("id,name,score,active,note\n1,Ada,98.5,TRUE,\n");
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.id, None);
        assert_eq!(r.get("id"), Some(&json!(1)));
        assert_eq!(r.get("name"), Some(&json!("Ada")));
        assert_eq!(r.get("score"), Some(&json!(98.5)));
        assert_eq!(r.get("active"), Some(&json!(true)));
        assert_eq!(r.get("note"), Some(&Value::Null));
    }

    #[test]
    fn blank_headers_are_dropped() {
        let records = parse("id, ,name\n1,ignored,Ada\n");
        assert_eq!(records[0].field_count(), 2);
        assert!(records[0].get(" ").is_none());
    }

    #[test]
    fn ragged_rows_are_tolerated() {
        let records = parse("a,b\n1\n2,3,4\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].field_count(), 1);
        assert_eq!(records[0].get("a"), Some(&json!(1)));
        assert_eq!(records[1].field_count(), 2);
        assert_eq!(records[1].get("b"), Some(&json!(3)));
    }

    #[test]
    fn header_only_input_yields_no_records() {
        assert!(parse("a,b\n").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn invalid_utf8_is_a_csv_error() {
        let input: &[u8] = b"a\n\xff\xfe\n";
        let mut records = CsvRecords::new(input).unwrap();
        let err = records.next().unwrap().unwrap_err();
        assert!(matches!(err, IngestionError::Csv(_)));
    }
}
