// ============================================================
// TABLE LOADER
// ============================================================
// Parse uploaded CSV bytes into a typed table

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::domain::error::AppError;
use crate::domain::table::Table;

/// Tokens read as null, following the usual data-frame defaults
pub const DEFAULT_NULL_VALUES: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

const QUOTE: u8 = b'"';

/// CSV loader producing a [`Table`]
pub struct TableLoader {
    /// Delimiter character (default: comma)
    delimiter: u8,

    /// Field values treated as null
    null_values: HashSet<String>,
}

impl Default for TableLoader {
    fn default() -> Self {
        Self {
            delimiter: b',',
            null_values: DEFAULT_NULL_VALUES.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl TableLoader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Replace the set of null tokens. The empty string is always null.
    pub fn with_null_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_values = values.into_iter().map(Into::into).collect();
        self.null_values.insert(String::new());
        self
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Parse raw bytes into a table.
    ///
    /// The first record is the header. Short rows are padded with nulls,
    /// rows wider than the header are rejected.
    pub fn load(&self, bytes: &[u8]) -> Result<Table, AppError> {
        let content = decode(bytes);

        if content.trim().is_empty() {
            return Err(AppError::ParseError(
                "No columns to parse from file".to_string(),
            ));
        }

        if let Some(line) = find_unterminated_quote(&content, self.delimiter) {
            return Err(AppError::ParseError(format!(
                "Unterminated quoted field starting on line {}",
                line
            )));
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .quote(QUOTE)
            .trim(Trim::None)
            .flexible(true) // Width is checked per row below
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();
        let columns = normalize_headers(&headers);

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;
            rows.push(self.parse_row(index, &columns, &record)?);
        }

        Ok(Table::from_fields(columns, rows))
    }

    fn parse_row(
        &self,
        index: usize,
        columns: &[String],
        record: &StringRecord,
    ) -> Result<Vec<Option<String>>, AppError> {
        if record.len() > columns.len() {
            // Header sits on line 1 when the reader cannot tell us
            let line = record
                .position()
                .map(|position| position.line())
                .unwrap_or(index as u64 + 2);
            return Err(AppError::ParseError(format!(
                "Expected {} fields in line {}, saw {}",
                columns.len(),
                line,
                record.len()
            )));
        }

        Ok((0..columns.len())
            .map(|idx| {
                record
                    .get(idx)
                    .filter(|value| !self.null_values.contains(*value))
                    .map(str::to_string)
            })
            .collect())
    }
}

/// Decode upload bytes. UTF-8 (with or without BOM) is used as-is; anything
/// else is read as Windows-1252, which maps every byte.
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(content) => Cow::Borrowed(content),
        Err(err) => {
            tracing::warn!(
                valid_up_to = err.valid_up_to(),
                "Upload is not valid UTF-8, decoding as Windows-1252"
            );
            let (content, _had_errors) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
            content
        }
    }
}

/// Blank header cells become `Unnamed: <index>`, repeated names get a
/// `.1`, `.2`, ... suffix.
///
/// Each base name remembers its next suffix, so a header of one name
/// repeated many times is renamed in linear time.
fn normalize_headers(headers: &StringRecord) -> Vec<String> {
    let mut taken = HashSet::with_capacity(headers.len());
    let mut next_suffix: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::with_capacity(headers.len());

    for (index, name) in headers.iter().enumerate() {
        let base = if name.is_empty() {
            format!("Unnamed: {}", index)
        } else {
            name.to_string()
        };

        let mut candidate = base.clone();
        if taken.contains(&candidate) {
            let suffix = next_suffix.entry(base.clone()).or_insert(1);
            loop {
                candidate = format!("{}.{}", base, suffix);
                *suffix += 1;
                if !taken.contains(&candidate) {
                    break;
                }
            }
        }

        taken.insert(candidate.clone());
        columns.push(candidate);
    }

    columns
}

/// Returns the line on which a quoted field opens without ever closing.
///
/// Mirrors the reader's quoting rules: a quote only opens a field at the
/// start of that field, and a doubled quote inside a quoted field is an
/// escaped quote.
fn find_unterminated_quote(content: &str, delimiter: u8) -> Option<usize> {
    let bytes = content.as_bytes();
    let mut line = 1;
    let mut opened_on = 0;
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if in_quotes {
            if byte == QUOTE {
                if bytes.get(i + 1) == Some(&QUOTE) {
                    i += 1;
                } else {
                    in_quotes = false;
                }
            } else if byte == b'\n' {
                line += 1;
            }
            at_field_start = false;
        } else if byte == QUOTE && at_field_start {
            in_quotes = true;
            opened_on = line;
            at_field_start = false;
        } else {
            if byte == b'\n' {
                line += 1;
            }
            at_field_start = byte == delimiter || byte == b'\n' || byte == b'\r';
        }
        i += 1;
    }

    in_quotes.then_some(opened_on)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::{CellValue, ColumnType};
    use std::time::{Duration, Instant};

    #[test]
    fn test_parse_simple_csv() {
        let content = "name,age,city\nAlice,30,NYC\nBob,25,LA";
        let table = TableLoader::new().load(content.as_bytes()).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.columns(), &["name", "age", "city"]);
        assert_eq!(table.rows()[0][0], CellValue::Text("Alice".to_string()));
        assert_eq!(
            table.column_types(),
            &[ColumnType::Text, ColumnType::Number, ColumnType::Text]
        );
    }

    #[test]
    fn test_short_rows_are_padded_with_nulls() {
        let table = TableLoader::new().load(b"x,y,z\na,1\nb\n").unwrap();

        assert_eq!(table.rows()[0].len(), 3);
        assert!(table.rows()[0][2].is_null());
        assert!(table.rows()[1][1].is_null());
        assert!(table.rows()[1][2].is_null());
    }

    #[test]
    fn test_long_rows_are_rejected() {
        let err = TableLoader::new().load(b"x,y\na,1\nb,2,3\n").unwrap_err();
        match err {
            AppError::ParseError(msg) => assert_eq!(msg, "Expected 2 fields in line 3, saw 3"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_is_a_parse_error() {
        assert!(matches!(
            TableLoader::new().load(b""),
            Err(AppError::ParseError(_))
        ));
        assert!(matches!(
            TableLoader::new().load(b"  \n\n"),
            Err(AppError::ParseError(_))
        ));
    }

    #[test]
    fn test_unterminated_quote_is_a_parse_error() {
        let err = TableLoader::new()
            .load(b"x,y\na,\"open\nb,2\n")
            .unwrap_err();
        match err {
            AppError::ParseError(msg) => {
                assert_eq!(msg, "Unterminated quoted field starting on line 2")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_quoted_fields_with_escapes_and_newlines() {
        let table = TableLoader::new()
            .load(b"x,y\n\"a,b\",\"say \"\"hi\"\"\"\n\"multi\nline\",2\n")
            .unwrap();

        assert_eq!(
            table.source_rows(),
            vec![
                vec!["a,b".to_string(), "say \"hi\"".to_string()],
                vec!["multi\nline".to_string(), "2".to_string()],
            ]
        );
    }

    #[test]
    fn test_header_only_input() {
        let table = TableLoader::new().load(b"x,y\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns(), &["x", "y"]);
    }

    #[test]
    fn test_null_tokens() {
        let table = TableLoader::new().load(b"x,y\nNA,\nnull,N/A\n").unwrap();
        assert!(table.rows().iter().flatten().all(CellValue::is_null));

        let custom = TableLoader::new()
            .with_null_values(["-"])
            .load(b"x\n-\nNA\n")
            .unwrap();
        assert!(custom.rows()[0][0].is_null());
        assert_eq!(custom.rows()[1][0], CellValue::Text("NA".to_string()));
    }

    #[test]
    fn test_fields_are_not_trimmed() {
        let table = TableLoader::new().load(b"x\n a \na\n").unwrap();
        assert_eq!(table.rows()[0][0], CellValue::Text(" a ".to_string()));
        assert_ne!(table.rows()[0][0], table.rows()[1][0]);
    }

    #[test]
    fn test_header_normalization() {
        let table = TableLoader::new().load(b"a,a,,a\n1,2,3,4\n").unwrap();
        assert_eq!(table.columns(), &["a", "a.1", "Unnamed: 2", "a.2"]);

        // An explicit `a.1` pushes the generated suffix past it
        let table = TableLoader::new().load(b"a,a.1,a,a\n1,2,3,4\n").unwrap();
        assert_eq!(table.columns(), &["a", "a.1", "a.2", "a.3"]);
    }

    #[test]
    fn test_many_repeated_header_names_load_quickly() {
        let header = vec!["a"; 50_000].join(",") + "\n";

        let started = Instant::now();
        let table = TableLoader::new().load(header.as_bytes()).unwrap();
        let elapsed = started.elapsed();

        assert_eq!(table.columns().len(), 50_000);
        assert_eq!(table.columns()[1], "a.1");
        assert_eq!(table.columns()[49_999], "a.49999");
        assert!(elapsed < Duration::from_secs(10), "took {:?}", elapsed);
    }

    #[test]
    fn test_blank_lines_between_rows_are_skipped() {
        let table = TableLoader::new().load(b"x\na\n\na\n").unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.source_rows(),
            vec![vec!["a".to_string()], vec!["a".to_string()]]
        );

        let table = TableLoader::new().load(b"x,y\na,1\n\r\n\nb,2\n").unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_bom_is_stripped() {
        let table = TableLoader::new().load(b"\xEF\xBB\xBFid\n1\n").unwrap();
        assert_eq!(table.columns(), &["id"]);
    }

    #[test]
    fn test_non_utf8_falls_back_to_windows_1252() {
        let table = TableLoader::new().load(b"name\ncaf\xE9\n").unwrap();
        assert_eq!(table.rows()[0][0], CellValue::Text("café".to_string()));
    }

    #[test]
    fn test_custom_delimiter() {
        let table = TableLoader::new()
            .with_delimiter(b';')
            .load(b"x;y\na;1\n")
            .unwrap();
        assert_eq!(table.columns(), &["x", "y"]);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_find_unterminated_quote() {
        assert_eq!(find_unterminated_quote("a,\"b\"\n", b','), None);
        assert_eq!(find_unterminated_quote("a,b\"c\n", b','), None);
        assert_eq!(find_unterminated_quote("a,\"b\"\"\n", b','), Some(1));
        assert_eq!(find_unterminated_quote("a\n\"b\n", b','), Some(2));
    }
}
