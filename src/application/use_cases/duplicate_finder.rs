// ============================================================
// DUPLICATE FINDER
// ============================================================
// Exact full-row duplicate detection in one pass

use std::collections::HashMap;

use crate::domain::table::{CellValue, DuplicateSet, Table};

/// Every row whose value-tuple occurs at least twice, in source order.
///
/// Each row's own cells are the map key, so the scan is linear in the
/// number of rows. All occurrences are kept, not only the repeats.
pub fn find_duplicates(table: &Table) -> DuplicateSet {
    let mut positions_by_key: HashMap<&[CellValue], Vec<usize>> = HashMap::new();

    for (position, row) in table.rows().iter().enumerate() {
        positions_by_key
            .entry(row.as_slice())
            .or_default()
            .push(position);
    }

    let group_count = positions_by_key
        .values()
        .filter(|positions| positions.len() > 1)
        .count();

    let duplicate_positions = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            positions_by_key
                .get(row.as_slice())
                .map(|positions| positions.len() > 1)
                .unwrap_or(false)
        })
        .map(|(position, _)| position)
        .collect();

    DuplicateSet::select(table, duplicate_positions, group_count)
}
