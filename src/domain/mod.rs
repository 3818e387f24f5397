pub mod error;

// Uploaded table and duplicate subset
pub mod table;
