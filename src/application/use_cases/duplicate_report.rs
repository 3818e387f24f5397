// ============================================================
// DUPLICATE REPORT USE CASE
// ============================================================
// Orchestrate upload → load → detect, and the CSV download

use std::sync::Arc;
use std::time::Instant;

use crate::application::use_cases::duplicate_finder::find_duplicates;
use crate::domain::error::{AppError, Result};
use crate::domain::table::{DuplicateSet, Table};
use crate::infrastructure::csv::{TableLoader, TableWriter};

/// Suggested filename for the duplicate download
pub const DOWNLOAD_FILENAME: &str = "duplicates.csv";

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Result of processing one upload
#[derive(Debug, Clone)]
pub struct DuplicateReport {
    /// Full uploaded table
    pub table: Arc<Table>,

    /// Rows that occur more than once
    pub duplicates: Arc<DuplicateSet>,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl DuplicateReport {
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

/// CSV bytes ready to be sent as an attachment
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub struct DuplicateReportUseCase {
    loader: TableLoader,
    writer: TableWriter,
    max_upload_bytes: usize,
}

impl DuplicateReportUseCase {
    pub fn new(loader: TableLoader, writer: TableWriter, max_upload_bytes: usize) -> Self {
        Self {
            loader,
            writer,
            max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Load the uploaded bytes and find duplicate rows.
    pub fn analyze(&self, bytes: &[u8]) -> Result<DuplicateReport> {
        let start = Instant::now();

        ensure_within_limit(bytes.len(), self.max_upload_bytes)?;

        let table = self.loader.load(bytes)?;
        let duplicates = find_duplicates(&table);

        let processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            rows = table.row_count(),
            columns = table.columns().len(),
            duplicate_rows = duplicates.len(),
            duplicate_groups = duplicates.group_count(),
            processing_time_ms,
            "Duplicate scan finished"
        );

        Ok(DuplicateReport {
            table: Arc::new(table),
            duplicates: Arc::new(duplicates),
            processing_time_ms,
        })
    }

    /// Serialize a previously computed duplicate set.
    ///
    /// `None` (nothing uploaded yet) and an empty set both yield
    /// [`AppError::NotAvailable`].
    pub fn export(&self, duplicates: Option<&DuplicateSet>) -> Result<CsvExport> {
        let duplicates = match duplicates {
            Some(set) if !set.is_empty() => set,
            _ => return Err(AppError::NotAvailable),
        };

        let bytes = self.writer.write(duplicates.table())?;
        tracing::info!(
            rows = duplicates.len(),
            bytes = bytes.len(),
            "Duplicate rows exported"
        );

        Ok(CsvExport {
            filename: DOWNLOAD_FILENAME,
            content_type: CSV_CONTENT_TYPE,
            bytes,
        })
    }
}

/// Reject inputs above `limit` bytes before they reach the loader.
pub fn ensure_within_limit(received: usize, limit: usize) -> Result<()> {
    if received > limit {
        return Err(AppError::TooLarge { limit, received });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn use_case() -> DuplicateReportUseCase {
        DuplicateReportUseCase::new(TableLoader::new(), TableWriter::new(), 1024)
    }

    #[test]
    fn test_analyze_finds_duplicates() {
        let report = use_case().analyze(b"x,y\na,1\nb,2\na,1\nc,3\n").unwrap();

        assert!(report.has_duplicates());
        assert_eq!(report.table.row_count(), 4);
        assert_eq!(report.duplicates.positions(), &[0, 2]);
    }

    #[test]
    fn test_analyze_without_duplicates() {
        let report = use_case().analyze(b"x,y\na,1\nb,2\n").unwrap();
        assert!(!report.has_duplicates());
    }

    #[test]
    fn test_analyze_header_only() {
        let report = use_case().analyze(b"x,y\n").unwrap();
        assert!(report.table.is_empty());
        assert!(!report.has_duplicates());
    }

    #[test]
    fn test_analyze_rejects_oversized_input() {
        let use_case = DuplicateReportUseCase::new(TableLoader::new(), TableWriter::new(), 4);
        let err = use_case.analyze(b"x,y\na,1\n").unwrap_err();
        assert!(matches!(err, AppError::TooLarge { limit: 4, received: 8 }));
    }

    #[test]
    fn test_analyze_surfaces_parse_errors() {
        assert!(matches!(
            use_case().analyze(b""),
            Err(AppError::ParseError(_))
        ));
    }

    #[test]
    fn test_export_round_trip() {
        let use_case = use_case();
        let report = use_case.analyze(b"x,y\na,1\nb,2\na,1\nc,3\n").unwrap();
        let export = use_case.export(Some(report.duplicates.as_ref())).unwrap();

        assert_eq!(export.filename, "duplicates.csv");
        assert_eq!(String::from_utf8(export.bytes).unwrap(), "x,y\na,1\na,1\n");
    }

    #[test]
    fn test_export_not_available() {
        let use_case = use_case();
        assert!(matches!(use_case.export(None), Err(AppError::NotAvailable)));

        let report = use_case.analyze(b"x\na\nb\n").unwrap();
        assert!(matches!(
            use_case.export(Some(report.duplicates.as_ref())),
            Err(AppError::NotAvailable)
        ));
    }

    #[test]
    fn test_ensure_within_limit() {
        assert!(ensure_within_limit(10, 10).is_ok());
        assert!(ensure_within_limit(11, 10).is_err());
    }
}
