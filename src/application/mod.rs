pub mod use_cases;

pub use use_cases::duplicate_report::{CsvExport, DuplicateReport, DuplicateReportUseCase};
