//! Flow identifiers for decoded tables.
//!
//! Rows are stably sorted by their metadata tuple and each maximal run of
//! equal tuples becomes one flow. Ids start at 1 and increase along the
//! sorted order.

use std::cmp::Ordering;

/// Row permutation plus the flow id of each row in the permuted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowAssignment {
    /// `order[i]` is the source row placed at position `i`.
    pub order: Vec<usize>,
    pub ids: Vec<i64>,
}

impl FlowAssignment {
    /// Number of distinct flows.
    pub fn flow_count(&self) -> usize {
        self.ids.last().map_or(0, |last| usize::try_from(*last).unwrap_or(0))
    }
}

/// Sort key for one cell: nulls first, then numbers, then text.
#[derive(Debug, Clone, PartialEq)]
enum CellKey<'a> {
    Null,
    Number(f64, &'a str),
    Text(&'a str),
}

impl<'a> CellKey<'a> {
    fn from_cell(cell: Option<&'a str>) -> Self {
        match cell {
            None => CellKey::Null,
            Some(text) => match text.trim().parse::<f64>() {
                Ok(v) if !v.is_nan() => CellKey::Number(v, text),
                _ => CellKey::Text(text),
            },
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CellKey::Null => 0,
            CellKey::Number(..) => 1,
            CellKey::Text(_) => 2,
        }
    }

    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellKey::Number(a, at), CellKey::Number(b, bt)) => {
                a.total_cmp(b).then_with(|| at.cmp(bt))
            }
            (CellKey::Text(a), CellKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Assigns flow ids from per-field metadata cells.
///
/// `keys` holds one column per metadata field, each with one cell per row.
/// With no metadata columns every row belongs to flow 1.
pub fn assign_flow_ids(keys: &[Vec<Option<String>>], rows: usize) -> FlowAssignment {
    let tuples: Vec<Vec<CellKey<'_>>> = (0..rows).map(|row| row_key(keys, row)).collect();
    let mut order: Vec<usize> = (0..rows).collect();
    order.sort_by(|&a, &b| compare_tuples(&tuples[a], &tuples[b]));

    let mut ids = Vec::with_capacity(rows);
    let mut current = 0i64;
    let mut previous: Option<usize> = None;
    for &row in &order {
        let is_new = previous.is_none_or(|prev| compare_tuples(&tuples[prev], &tuples[row]).is_ne());
        if is_new {
            current += 1;
        }
        ids.push(current);
        previous = Some(row);
    }

    FlowAssignment { order, ids }
}

fn row_key(keys: &[Vec<Option<String>>], row: usize) -> Vec<CellKey<'_>> {
    keys.iter()
        .map(|column| CellKey::from_cell(column.get(row).and_then(Option::as_deref)))
        .collect()
}

fn compare_tuples(a: &[CellKey<'_>], b: &[CellKey<'_>]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}
