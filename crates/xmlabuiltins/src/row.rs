//! Row accumulator for rowset populators.

use std::cmp::Ordering;

use xmlarepr::Datum;

use crate::column::ColumnDef;

/// One cell value in a rowset row.
#[derive(Debug, Clone)]
pub enum RowValue {
    Datum(Datum),
    /// Array-valued column: each element repeats on the wire.
    StrList(Vec<String>),
    /// Nested rowset column.
    Nested(Vec<Row>),
}

impl RowValue {
    /// String used for sorting and restriction matching. Arrays and
    /// nested rowsets never participate in either.
    fn sort_key(&self) -> Option<String> {
        match self {
            RowValue::Datum(d) => Some(d.to_string()),
            RowValue::StrList(_) | RowValue::Nested(_) => None,
        }
    }
}

impl From<Datum> for RowValue {
    fn from(d: Datum) -> RowValue {
        RowValue::Datum(d)
    }
}

impl From<&str> for RowValue {
    fn from(s: &str) -> RowValue {
        RowValue::Datum(Datum::Text(s.to_string()))
    }
}

impl From<String> for RowValue {
    fn from(s: String) -> RowValue {
        RowValue::Datum(Datum::Text(s))
    }
}

impl From<bool> for RowValue {
    fn from(b: bool) -> RowValue {
        RowValue::Datum(Datum::Bool(b))
    }
}

impl From<i32> for RowValue {
    fn from(i: i32) -> RowValue {
        RowValue::Datum(Datum::Int32(i))
    }
}

impl From<i64> for RowValue {
    fn from(i: i64) -> RowValue {
        RowValue::Datum(Datum::Int64(i))
    }
}

#[derive(Debug, Clone)]
enum Slot {
    /// Never set: the column is omitted from the serialized row.
    Unset,
    /// Explicitly null: serialized per the column's nullability.
    Null,
    Set(RowValue),
}

/// One row of a rowset, cells addressed by column name.
///
/// Cells distinguish never-set from set-to-null; serializers omit the
/// former and emit the latter as an empty element.
#[derive(Debug, Clone)]
pub struct Row {
    columns: &'static [ColumnDef],
    slots: Vec<Slot>,
}

impl Row {
    pub fn new(columns: &'static [ColumnDef]) -> Row {
        Row {
            columns,
            slots: vec![Slot::Unset; columns.len()],
        }
    }

    fn index_of(&self, column: &str) -> usize {
        match self.columns.iter().position(|c| c.name == column) {
            Some(idx) => idx,
            // Populators address columns by literal name against their
            // own rowset definition; a miss is a registry bug.
            None => panic!("no column named '{column}' in this rowset"),
        }
    }

    pub fn set(&mut self, column: &str, value: impl Into<RowValue>) {
        let idx = self.index_of(column);
        self.slots[idx] = Slot::Set(value.into());
    }

    pub fn set_null(&mut self, column: &str) {
        let idx = self.index_of(column);
        self.slots[idx] = Slot::Null;
    }

    /// Set when `value` is Some, leave unset otherwise.
    pub fn set_opt(&mut self, column: &str, value: Option<impl Into<RowValue>>) {
        if let Some(v) = value {
            self.set(column, v);
        }
    }

    pub fn get(&self, column: &str) -> Option<&RowValue> {
        match &self.slots[self.index_of(column)] {
            Slot::Set(v) => Some(v),
            Slot::Unset | Slot::Null => None,
        }
    }

    pub fn is_set(&self, column: &str) -> bool {
        !matches!(self.slots[self.index_of(column)], Slot::Unset)
    }

    pub fn columns(&self) -> &'static [ColumnDef] {
        self.columns
    }

    /// Iterate cells in column order: (column, None) for set-to-null,
    /// skipping never-set cells entirely.
    pub fn cells(&self) -> impl Iterator<Item = (&'static ColumnDef, Option<&RowValue>)> {
        self.columns
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(col, slot)| match slot {
                Slot::Unset => None,
                Slot::Null => Some((col, None)),
                Slot::Set(v) => Some((col, Some(v))),
            })
    }

    fn sort_key(&self, column: &str) -> Option<String> {
        match &self.slots[self.index_of(column)] {
            Slot::Set(v) => v.sort_key(),
            Slot::Unset | Slot::Null => None,
        }
    }
}

/// Stable sort by the given columns: nulls first, case-insensitive,
/// later columns break ties.
pub fn sort_rows(rows: &mut [Row], sort: &[&str]) {
    if sort.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for column in sort {
            let ka = a.sort_key(column);
            let kb = b.sort_key(column);
            let ord = match (ka, kb) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(ka), Some(kb)) => ka.to_lowercase().cmp(&kb.to_lowercase()),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;
    use once_cell::sync::Lazy;

    static COLS: Lazy<Vec<ColumnDef>> = Lazy::new(|| {
        vec![
            ColumnDef::new("NAME", ColumnType::String, true, false, ""),
            ColumnDef::new("KIND", ColumnType::String, false, true, ""),
            ColumnDef::new("ORDINAL", ColumnType::Integer, false, true, ""),
        ]
    });

    fn row(name: Option<&str>, kind: Option<&str>) -> Row {
        let mut r = Row::new(&COLS);
        match name {
            Some(n) => r.set("NAME", n),
            None => r.set_null("NAME"),
        }
        if let Some(k) = kind {
            r.set("KIND", k);
        }
        r
    }

    #[test]
    fn tri_state_cells() {
        let mut r = Row::new(&COLS);
        r.set("NAME", "abc");
        r.set_null("KIND");
        let cells: Vec<_> = r.cells().collect();
        // ORDINAL never set, so only two cells come back.
        assert_eq!(cells.len(), 2);
        assert!(cells[0].1.is_some());
        assert!(cells[1].1.is_none());
        assert!(!r.is_set("ORDINAL"));
    }

    #[test]
    #[should_panic(expected = "no column named")]
    fn unknown_column_panics() {
        let mut r = Row::new(&COLS);
        r.set("NOPE", "x");
    }

    #[test]
    fn sort_is_case_insensitive_nulls_first() {
        let mut rows = vec![
            row(Some("beta"), None),
            row(Some("Alpha"), None),
            row(None, None),
            row(Some("alpha"), Some("z")),
        ];
        sort_rows(&mut rows, &["NAME", "KIND"]);
        assert_eq!(rows[0].get("NAME").map(|_| ()), None);
        // "Alpha" vs "alpha" tie on NAME; unset KIND sorts before "z".
        assert!(rows[1].get("KIND").is_none());
        match rows[3].get("NAME") {
            Some(RowValue::Datum(Datum::Text(s))) => assert_eq!(s, "beta"),
            other => panic!("unexpected cell: {other:?}"),
        }
    }
}
