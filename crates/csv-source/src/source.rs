//! Streaming CSV reader implementing [`RecordSource`].

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use tracing::debug;
use trade_ingest_core::{FieldValue, Record, RecordSource, SourceReadError};

/// Options for opening a CSV file.
#[derive(Debug, Clone)]
pub struct CsvSourceOptions {
    /// Whether the first row is a header row (default: true).
    pub has_headers: bool,
    /// Field delimiter (default: `,`).
    pub delimiter: u8,
    /// Explicit column names. Required for headerless files; overrides the
    /// header row when both are present.
    pub column_names: Option<Vec<String>>,
}

impl Default for CsvSourceOptions {
    fn default() -> Self {
        Self {
            has_headers: true,
            delimiter: b',',
            column_names: None,
        }
    }
}

/// Record source backed by one local CSV file.
pub struct CsvRecordSource {
    records: csv::StringRecordsIntoIter<File>,
    headers: Vec<String>,
    row: u64,
}

impl CsvRecordSource {
    /// Open a CSV file for streaming.
    ///
    /// Fails if the file cannot be opened, the header row is unreadable, or
    /// the file is headerless and no column names were given.
    pub fn open(path: impl AsRef<Path>, options: CsvSourceOptions) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(options.has_headers)
            .delimiter(options.delimiter)
            // Column counts are validated per row so one bad row does not
            // poison the reader.
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("failed to open CSV file {}", path.display()))?;

        let headers = match options.column_names {
            Some(names) => names,
            None if options.has_headers => reader
                .headers()
                .context("failed to read CSV header row")?
                .iter()
                .map(str::to_string)
                .collect(),
            None => anyhow::bail!("headerless CSV requires explicit column names"),
        };
        debug!(path = %path.display(), columns = headers.len(), "opened CSV source");

        Ok(Self {
            records: reader.into_records(),
            headers,
            row: 0,
        })
    }

    /// Column names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl RecordSource for CsvRecordSource {
    fn next_record(&mut self) -> Result<Option<Record>, SourceReadError> {
        let Some(result) = self.records.next() else {
            return Ok(None);
        };
        let row = self.row;
        self.row += 1;

        let record = result.map_err(|e| SourceReadError {
            row,
            message: e.to_string(),
        })?;
        if record.len() != self.headers.len() {
            return Err(SourceReadError {
                row,
                message: format!(
                    "expected {} columns, found {}",
                    self.headers.len(),
                    record.len()
                ),
            });
        }

        let fields = self
            .headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.clone(), infer_field(value)))
            .collect();
        Ok(Some(Record::new(row, fields)))
    }
}

/// Best-effort scalar inference for one cell: integer, float, boolean, then
/// text; empty cells are null.
fn infer_field(value: &str) -> FieldValue {
    if value.is_empty() {
        return FieldValue::Null;
    }
    if let Ok(i) = value.parse::<i64>() {
        return FieldValue::Int(i);
    }
    if let Ok(f) = value.parse::<f64>() {
        return FieldValue::Float(f);
    }
    match value.to_lowercase().as_str() {
        "true" => FieldValue::Bool(true),
        "false" => FieldValue::Bool(false),
        _ => FieldValue::Text(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_reads_rows_in_order_with_inference() {
        let file = write_csv(
            "id,symbol,price,active,note\n\
             1,BTC/USD,64021.5,true,\n\
             2,ETH/USD,3211.0,false,limit\n",
        );
        let mut source = CsvRecordSource::open(file.path(), CsvSourceOptions::default()).unwrap();
        assert_eq!(source.headers(), ["id", "symbol", "price", "active", "note"]);

        let first = source.next_record().unwrap().unwrap();
        assert_eq!(first.row(), 0);
        assert_eq!(first.get("id"), Some(&FieldValue::Int(1)));
        assert_eq!(
            first.get("symbol"),
            Some(&FieldValue::Text("BTC/USD".to_string()))
        );
        assert_eq!(first.get("price"), Some(&FieldValue::Float(64021.5)));
        assert_eq!(first.get("active"), Some(&FieldValue::Bool(true)));
        assert_eq!(first.get("note"), Some(&FieldValue::Null));

        let second = source.next_record().unwrap().unwrap();
        assert_eq!(second.row(), 1);
        assert_eq!(second.get("note"), Some(&FieldValue::Text("limit".to_string())));

        assert!(source.next_record().unwrap().is_none());
    }

    #[test]
    fn test_malformed_row_does_not_poison_the_source() {
        let file = write_csv(
            "id,price\n\
             1,10.0\n\
             2,20.0,extra\n\
             3,30.0\n",
        );
        let mut source = CsvRecordSource::open(file.path(), CsvSourceOptions::default()).unwrap();

        assert!(source.next_record().unwrap().is_some());

        let err = source.next_record().unwrap_err();
        assert_eq!(err.row, 1);
        assert!(err.message.contains("3"));

        let third = source.next_record().unwrap().unwrap();
        assert_eq!(third.get("id"), Some(&FieldValue::Int(3)));
        assert!(source.next_record().unwrap().is_none());
    }

    #[test]
    fn test_headerless_requires_column_names() {
        let file = write_csv("1,9.5\n2,10.5\n");
        let options = CsvSourceOptions {
            has_headers: false,
            ..Default::default()
        };
        assert!(CsvRecordSource::open(file.path(), options).is_err());

        let options = CsvSourceOptions {
            has_headers: false,
            column_names: Some(vec!["id".to_string(), "price".to_string()]),
            ..Default::default()
        };
        let mut source = CsvRecordSource::open(file.path(), options).unwrap();
        let first = source.next_record().unwrap().unwrap();
        assert_eq!(first.get("id"), Some(&FieldValue::Int(1)));
        assert_eq!(first.get("price"), Some(&FieldValue::Float(9.5)));
    }

    #[test]
    fn test_custom_delimiter() {
        let file = write_csv("id;symbol\n7;DOT/USD\n");
        let options = CsvSourceOptions {
            delimiter: b';',
            ..Default::default()
        };
        let mut source = CsvRecordSource::open(file.path(), options).unwrap();
        let record = source.next_record().unwrap().unwrap();
        assert_eq!(record.get("id"), Some(&FieldValue::Int(7)));
    }
}
