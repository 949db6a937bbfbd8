//! Query result model.
//!
//! A [`CellSet`] is what `execute` hands back: axes of positions (tuples
//! of members) plus a sparse cell map keyed by flattened ordinal. Cell
//! ordinals are row-major with axis 0 varying fastest, matching the wire
//! convention.

use std::collections::HashMap;
use std::sync::Arc;

use xmlarepr::Datum;

use crate::model::{Cube, Hierarchy, Member};

/// One position on an axis: an ordered combination of one member per
/// hierarchy.
#[derive(Clone)]
pub struct Position {
    pub members: Vec<Arc<dyn Member>>,
}

impl Position {
    pub fn new(members: Vec<Arc<dyn Member>>) -> Position {
        Position { members }
    }
}

/// One axis of a multidimensional result.
#[derive(Clone)]
pub struct CellSetAxis {
    /// Hierarchies spanning the axis, in tuple order. Carried explicitly
    /// so an axis with zero positions still describes itself.
    pub hierarchies: Vec<Arc<dyn Hierarchy>>,
    pub positions: Vec<Position>,
}

impl CellSetAxis {
    pub fn empty() -> CellSetAxis {
        CellSetAxis {
            hierarchies: Vec::new(),
            positions: Vec::new(),
        }
    }
}

/// A single data cell.
#[derive(Clone)]
pub struct Cell {
    pub value: Datum,
    pub formatted_value: Option<String>,
    /// Additional cell properties requested by the statement, in
    /// declaration order.
    pub properties: Vec<(String, Datum)>,
}

/// Result of a multidimensional query.
#[derive(Clone)]
pub struct CellSet {
    pub cube: Arc<dyn Cube>,
    /// Query axes (COLUMNS, ROWS, ...) in axis order.
    pub axes: Vec<CellSetAxis>,
    /// The WHERE-clause axis. Always present; may have zero positions.
    pub filter_axis: CellSetAxis,
    /// Non-null cells keyed by flattened ordinal.
    pub cells: HashMap<usize, Cell>,
}

impl CellSet {
    /// Total cell count: the product of axis lengths.
    pub fn cell_count(&self) -> usize {
        self.axes.iter().map(|a| a.positions.len()).product()
    }

    pub fn cell(&self, ordinal: usize) -> Option<&Cell> {
        self.cells.get(&ordinal)
    }

    /// Flattened ordinal for per-axis coordinates, axis 0 fastest.
    pub fn ordinal_of(&self, coords: &[usize]) -> usize {
        debug_assert_eq!(coords.len(), self.axes.len());
        let mut ordinal = 0;
        let mut stride = 1;
        for (axis, coord) in self.axes.iter().zip(coords) {
            ordinal += coord * stride;
            stride *= axis.positions.len();
        }
        ordinal
    }
}

/// Column descriptor of a flat (drillthrough) result.
#[derive(Debug, Clone)]
pub struct SqlColumn {
    pub name: String,
    pub xsd_type: xmlarepr::XsdType,
    pub nullable: bool,
}

/// Flat rows from a drillthrough query.
#[derive(Clone, Default)]
pub struct SqlRows {
    pub columns: Vec<SqlColumn>,
    pub rows: Vec<Vec<Datum>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::fixtures;

    #[test]
    fn ordinal_is_row_major_axis0_fastest() {
        let cs = fixtures::sales_cellset_2x2();
        // 2 columns x 2 rows: (col, row) -> col + row * 2.
        assert_eq!(cs.ordinal_of(&[0, 0]), 0);
        assert_eq!(cs.ordinal_of(&[1, 0]), 1);
        assert_eq!(cs.ordinal_of(&[0, 1]), 2);
        assert_eq!(cs.ordinal_of(&[1, 1]), 3);
    }
}
