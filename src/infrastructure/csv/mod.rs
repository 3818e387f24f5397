// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV loading with encoding fallback, and CSV export

mod table_loader;
mod table_writer;

pub use table_loader::{TableLoader, DEFAULT_NULL_VALUES};
pub use table_writer::TableWriter;
