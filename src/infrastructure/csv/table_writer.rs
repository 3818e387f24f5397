// ============================================================
// TABLE WRITER
// ============================================================
// Serialize a table back to CSV bytes for download

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::domain::error::AppError;
use crate::domain::table::{CellValue, Table};

/// CSV writer whose output the [`super::TableLoader`] reads back unchanged
pub struct TableWriter {
    delimiter: u8,
}

impl Default for TableWriter {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl TableWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Header first, then every row. Nulls become empty fields; numbers and
    /// text are written with their source text.
    pub fn write(&self, table: &Table) -> Result<Vec<u8>, AppError> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer
            .write_record(table.columns())
            .map_err(|e| AppError::Serialization(format!("Failed to write CSV header: {}", e)))?;

        for (index, row) in table.rows().iter().enumerate() {
            writer
                .write_record(row.iter().map(CellValue::source_text))
                .map_err(|e| {
                    AppError::Serialization(format!("Failed to write CSV row {}: {}", index + 1, e))
                })?;
        }

        writer
            .into_inner()
            .map_err(|e| AppError::Serialization(format!("Failed to flush CSV output: {}", e)))
    }
}
