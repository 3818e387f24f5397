// ============================================================
// TABLE
// ============================================================
// Ordered rows aligned to an ordered set of named columns

use super::{CellValue, ColumnType, NumericValue};

/// One data row; always exactly one value per column
pub type Row = Vec<CellValue>;

/// Immutable table built once per upload
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    column_types: Vec<ColumnType>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table from untyped fields, inferring one type per column.
    ///
    /// `None` marks a null field. Each row must already have one entry per
    /// column; padding and rejection of ragged rows is the loader's job.
    pub fn from_fields(columns: Vec<String>, fields: Vec<Vec<Option<String>>>) -> Self {
        let column_types = infer_column_types(columns.len(), &fields);

        let rows = fields
            .into_iter()
            .map(|row| {
                debug_assert_eq!(row.len(), columns.len());
                row.into_iter()
                    .zip(column_types.iter())
                    .map(|(raw, column_type)| CellValue::typed(raw, *column_type))
                    .collect()
            })
            .collect();

        Self {
            columns,
            column_types,
            rows,
        }
    }

    /// Assemble a table from rows that are already typed.
    pub(crate) fn from_typed_rows(
        columns: Vec<String>,
        column_types: Vec<ColumnType>,
        rows: Vec<Row>,
    ) -> Self {
        debug_assert_eq!(columns.len(), column_types.len());
        debug_assert!(rows.iter().all(|row| row.len() == columns.len()));
        Self {
            columns,
            column_types,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_types(&self) -> &[ColumnType] {
        &self.column_types
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows rendered back to their source text, mostly for assertions.
    pub fn source_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.source_text().to_string()).collect())
            .collect()
    }
}

/// A column is numeric when every non-null value parses as a finite number.
fn infer_column_types(width: usize, fields: &[Vec<Option<String>>]) -> Vec<ColumnType> {
    (0..width)
        .map(|col| {
            let mut saw_value = false;
            for row in fields {
                if let Some(Some(raw)) = row.get(col) {
                    saw_value = true;
                    if NumericValue::parse(raw).is_none() {
                        return ColumnType::Text;
                    }
                }
            }
            if saw_value {
                ColumnType::Number
            } else {
                ColumnType::Empty
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn test_infers_column_types() {
        let table = Table::from_fields(
            vec!["name".into(), "age".into(), "note".into()],
            vec![
                vec![field("Alice"), field("30"), None],
                vec![field("Bob"), field("25.5"), None],
            ],
        );

        assert_eq!(
            table.column_types(),
            &[ColumnType::Text, ColumnType::Number, ColumnType::Empty]
        );
        assert!(matches!(table.rows()[0][1], CellValue::Number { .. }));
        assert!(table.rows()[0][2].is_null());
    }

    #[test]
    fn test_single_text_value_makes_column_text() {
        let table = Table::from_fields(
            vec!["code".into()],
            vec![vec![field("1")], vec![field("x")], vec![field("2")]],
        );

        assert_eq!(table.column_types(), &[ColumnType::Text]);
        assert_eq!(table.rows()[0][0], CellValue::Text("1".into()));
    }

    #[test]
    fn test_header_only_table() {
        let table = Table::from_fields(vec!["x".into(), "y".into()], Vec::new());

        assert!(table.is_empty());
        assert_eq!(table.columns(), &["x".to_string(), "y".to_string()]);
        assert_eq!(table.column_types(), &[ColumnType::Empty, ColumnType::Empty]);
    }

    #[test]
    fn test_source_rows() {
        let table = Table::from_fields(
            vec!["x".into(), "y".into()],
            vec![vec![field("a"), None]],
        );

        assert_eq!(table.source_rows(), vec![vec!["a".to_string(), String::new()]]);
    }
}
