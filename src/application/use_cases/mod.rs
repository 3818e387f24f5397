pub mod duplicate_finder;
pub mod duplicate_report;
