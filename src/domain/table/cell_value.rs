// ============================================================
// CELL VALUES
// ============================================================
// Typed column values with explicit equality rules

use std::hash::{Hash, Hasher};

/// Inferred type of a whole column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Every non-null value parses as a finite number
    Number,

    /// At least one non-null value is not numeric
    Text,

    /// The column holds only nulls (or the table has no rows)
    Empty,
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Number)
    }
}

/// Parsed numeric payload of a cell
#[derive(Debug, Clone, Copy)]
pub enum NumericValue {
    Int(i64),
    Float(f64),
}

/// Canonical form used for equality and hashing.
/// Integers that survive a trip through `f64` share the float key so
/// that `1` and `1.0` compare equal.
#[derive(Debug, PartialEq, Eq, Hash)]
enum NumericKey {
    Exact(i64),
    Float(u64),
}

impl NumericValue {
    /// Parse a numeric token. Non-finite values (`inf`, `NaN`) are rejected.
    pub fn parse(text: &str) -> Option<Self> {
        if let Ok(value) = text.parse::<i64>() {
            return Some(NumericValue::Int(value));
        }
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(NumericValue::Float(value)),
            _ => None,
        }
    }

    fn key(&self) -> NumericKey {
        match *self {
            NumericValue::Int(value) => {
                let as_float = value as f64;
                // 2^63 is the first float past i64::MAX
                if as_float < 9_223_372_036_854_775_808.0 && as_float as i64 == value {
                    NumericKey::Float((as_float + 0.0).to_bits())
                } else {
                    NumericKey::Exact(value)
                }
            }
            // Adding 0.0 folds -0.0 into 0.0
            NumericValue::Float(value) => NumericKey::Float((value + 0.0).to_bits()),
        }
    }
}

impl PartialEq for NumericValue {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for NumericValue {}

impl Hash for NumericValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// A single cell of a loaded table
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Missing field or recognised null token
    Null,

    /// Numeric cell; `raw` keeps the source text for display and export
    Number { value: NumericValue, raw: String },

    /// Anything else, compared byte for byte
    Text(String),
}

impl CellValue {
    /// Build a cell for a column of the given type.
    /// Falls back to text if a value in a numeric column does not parse.
    pub fn typed(raw: Option<String>, column_type: ColumnType) -> Self {
        let Some(raw) = raw else {
            return CellValue::Null;
        };

        if column_type.is_numeric() {
            if let Some(value) = NumericValue::parse(&raw) {
                return CellValue::Number { value, raw };
            }
        }

        CellValue::Text(raw)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text as it appeared in the source file; empty for nulls.
    pub fn source_text(&self) -> &str {
        match self {
            CellValue::Null => "",
            CellValue::Number { raw, .. } => raw,
            CellValue::Text(text) => text,
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Number { value: a, .. }, CellValue::Number { value: b, .. }) => a == b,
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Null => {}
            CellValue::Number { value, .. } => value.hash(state),
            CellValue::Text(text) => text.hash(state),
        }
    }
}
