// ============================================================
// TABLE DOMAIN LAYER
// ============================================================
// In-memory form of an uploaded CSV file and its duplicate subset
// No I/O, no async

mod cell_value;
mod duplicate_set;
mod table;

pub use cell_value::{CellValue, ColumnType, NumericValue};
pub use duplicate_set::DuplicateSet;
pub use table::{Row, Table};
