// ============================================================
// DUPLICATE SET
// ============================================================
// Rows of a table whose full value-tuple occurs more than once

use super::{Row, Table};

/// Ordered subsequence of a table's duplicated rows.
///
/// Keeps the source header, the duplicated rows in source order, and the
/// 0-based position of each row in the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateSet {
    table: Table,
    positions: Vec<usize>,
    group_count: usize,
}

impl DuplicateSet {
    /// Select `positions` (ascending) out of `source`.
    pub fn select(source: &Table, positions: Vec<usize>, group_count: usize) -> Self {
        debug_assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

        let rows: Vec<Row> = positions
            .iter()
            .map(|&position| source.rows()[position].clone())
            .collect();

        let table = Table::from_typed_rows(
            source.columns().to_vec(),
            source.column_types().to_vec(),
            rows,
        );

        Self {
            table,
            positions,
            group_count,
        }
    }

    /// Duplicate rows under the source header
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        self.table.columns()
    }

    pub fn rows(&self) -> &[Row] {
        self.table.rows()
    }

    /// Position of each duplicate row in the source table
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Number of distinct value-tuples that repeat
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_keeps_header_and_order() {
        let source = Table::from_fields(
            vec!["x".into()],
            vec![
                vec![Some("a".into())],
                vec![Some("b".into())],
                vec![Some("a".into())],
            ],
        );

        let set = DuplicateSet::select(&source, vec![0, 2], 1);

        assert_eq!(set.columns(), source.columns());
        assert_eq!(set.positions(), &[0, 2]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.group_count(), 1);
        assert_eq!(
            set.table().source_rows(),
            vec![vec!["a".to_string()], vec!["a".to_string()]]
        );
    }

    #[test]
    fn test_empty_selection() {
        let source = Table::from_fields(vec!["x".into()], Vec::new());
        let set = DuplicateSet::select(&source, Vec::new(), 0);
        assert!(set.is_empty());
        assert_eq!(set.columns(), &["x".to_string()]);
    }
}
