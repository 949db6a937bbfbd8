//! Flattened (tabular) dataset serialization.
//!
//! Every non-COLUMNS axis is folded into member columns, one per level
//! actually used on that axis plus one per declared member property of
//! those levels. Each COLUMNS-axis position becomes a value column. One
//! row is emitted per cross product of the non-COLUMNS axis positions.

use std::collections::HashMap;
use std::sync::Arc;

use xmlarepr::{Datum, TypeHint, ValueInfo, XsdType};

use olapmeta::{CellSet, Hierarchy, Level, Member, SqlRows};

use crate::errors::{Result, SrvError};
use crate::xsd::TabularColumn;
use xmlaio::XmlaSink;

fn meta(e: olapmeta::MetaError) -> SrvError {
    SrvError::Execute(e)
}

/// A fully flattened cell set: columns plus materialized row values,
/// ready to serialize in either encoding.
pub struct TabularDataset {
    columns: Vec<TabularColumn>,
    rows: Vec<Vec<Option<Datum>>>,
}

impl TabularDataset {
    pub fn from_cellset(cs: &CellSet) -> Result<TabularDataset> {
        Flattener::new(cs)?.run()
    }

    pub fn columns(&self) -> &[TabularColumn] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Emit the `row` elements. Null and absent values are omitted,
    /// matching their `minOccurs="0"` schema declarations.
    pub fn write_rows(&self, sink: &mut dyn XmlaSink) -> Result<()> {
        sink.start_sequence("row")?;
        for row in &self.rows {
            sink.start_element("row", &[])?;
            for (column, value) in self.columns.iter().zip(row) {
                if let Some(value) = value {
                    sink.text_element(column.encoded_name.as_str(), &[], &value.to_string())?;
                }
            }
            sink.end_element("row")?;
        }
        sink.end_sequence("row")?;
        Ok(())
    }
}

/// One member column of the flattened output: a level on a non-COLUMNS
/// axis, optionally narrowed to one of its member properties.
struct MemberColumn {
    axis: usize,
    tuple_ordinal: usize,
    depth: u32,
    property: Option<String>,
}

struct Flattener<'a> {
    cs: &'a CellSet,
    columns: Vec<TabularColumn>,
    member_columns: Vec<MemberColumn>,
    /// Coordinates of value columns on the COLUMNS axis.
    value_positions: Vec<usize>,
}

impl<'a> Flattener<'a> {
    fn new(cs: &'a CellSet) -> Result<Flattener<'a>> {
        let mut f = Flattener {
            cs,
            columns: Vec::new(),
            member_columns: Vec::new(),
            value_positions: Vec::new(),
        };
        f.plan_member_columns()?;
        f.plan_value_columns()?;
        Ok(f)
    }

    fn plan_member_columns(&mut self) -> Result<()> {
        for (axis_idx, axis) in self.cs.axes.iter().enumerate().skip(1) {
            for (tuple_ordinal, hierarchy) in axis.hierarchies.iter().enumerate() {
                let max_depth = axis
                    .positions
                    .iter()
                    .filter_map(|p| p.members.get(tuple_ordinal))
                    .map(|m| m.level_number())
                    .max()
                    .unwrap_or(0);
                for level in hierarchy.levels().map_err(meta)? {
                    if level.is_all() || level.depth() > max_depth {
                        continue;
                    }
                    let caption = format!("{}.{}", hierarchy.name(), level.name());
                    self.columns
                        .push(TabularColumn::new(caption.clone(), XsdType::String));
                    self.member_columns.push(MemberColumn {
                        axis: axis_idx,
                        tuple_ordinal,
                        depth: level.depth(),
                        property: None,
                    });
                    for prop in level.member_properties() {
                        self.columns.push(TabularColumn::new(
                            format!("{caption}.{}", prop.name),
                            prop.data_type,
                        ));
                        self.member_columns.push(MemberColumn {
                            axis: axis_idx,
                            tuple_ordinal,
                            depth: level.depth(),
                            property: Some(prop.name.clone()),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn plan_value_columns(&mut self) -> Result<()> {
        let Some(columns_axis) = self.cs.axes.first() else {
            return Ok(());
        };
        for (pos_idx, position) in columns_axis.positions.iter().enumerate() {
            let caption = position
                .members
                .iter()
                .map(|m| m.caption().to_string())
                .collect::<Vec<_>>()
                .join(" ");
            let xsd_type = self.value_column_type(pos_idx);
            self.columns.push(TabularColumn::new(caption, xsd_type));
            self.value_positions.push(pos_idx);
        }
        Ok(())
    }

    /// Column type of a value column: the canonical type of the first
    /// populated cell in that column, string when the column is empty.
    fn value_column_type(&self, pos_idx: usize) -> XsdType {
        let mut coords = vec![0usize; self.cs.axes.len()];
        coords[0] = pos_idx;
        loop {
            let ordinal = self.cs.ordinal_of(&coords);
            if let Some(cell) = self.cs.cell(ordinal) {
                if !matches!(cell.value, Datum::Null) {
                    return ValueInfo::new(None::<TypeHint>, cell.value.clone()).xsd_type;
                }
            }
            if !advance(&mut coords[1..], &self.cs.axes[1..]) {
                return XsdType::String;
            }
        }
    }

    fn run(self) -> Result<TabularDataset> {
        let mut rows = Vec::new();
        if self.cs.axes.iter().all(|a| a.positions.is_empty()) {
            // The entire axis set is empty: no rows at all.
            return Ok(TabularDataset {
                columns: self.columns,
                rows,
            });
        }
        if self.cs.axes[1..].iter().any(|a| a.positions.is_empty()) {
            return Ok(TabularDataset {
                columns: self.columns,
                rows,
            });
        }

        let mut coords = vec![0usize; self.cs.axes.len()];
        loop {
            rows.push(self.build_row(&coords)?);
            if !advance(&mut coords[1..], &self.cs.axes[1..]) {
                break;
            }
        }
        Ok(TabularDataset {
            columns: self.columns,
            rows,
        })
    }

    fn build_row(&self, coords: &[usize]) -> Result<Vec<Option<Datum>>> {
        let mut row = Vec::with_capacity(self.columns.len());
        let mut ancestor_cache: HashMap<(usize, usize), HashMap<u32, Arc<dyn Member>>> =
            HashMap::new();

        for column in &self.member_columns {
            let axis = &self.cs.axes[column.axis];
            let member = axis.positions[coords[column.axis]]
                .members
                .get(column.tuple_ordinal);
            let Some(member) = member else {
                row.push(None);
                continue;
            };
            let key = (column.axis, column.tuple_ordinal);
            if !ancestor_cache.contains_key(&key) {
                ancestor_cache.insert(key, ancestors_by_depth(member)?);
            }
            let at_depth = ancestor_cache[&key].get(&column.depth);
            row.push(match (at_depth, &column.property) {
                (Some(m), None) => Some(Datum::Text(m.caption().to_string())),
                (Some(m), Some(prop)) => m.property_value(prop),
                (None, _) => None,
            });
        }

        for &pos_idx in &self.value_positions {
            let mut cell_coords = coords.to_vec();
            cell_coords[0] = pos_idx;
            let ordinal = self.cs.ordinal_of(&cell_coords);
            let value = self
                .cs
                .cell(ordinal)
                .map(|c| c.value.clone())
                .filter(|v| !matches!(v, Datum::Null));
            row.push(value);
        }
        Ok(row)
    }
}

/// Self-and-ancestors of a member keyed by level depth.
fn ancestors_by_depth(member: &Arc<dyn Member>) -> Result<HashMap<u32, Arc<dyn Member>>> {
    let mut map = HashMap::new();
    map.insert(member.level_number(), member.clone());
    let mut cursor = member.parent().map_err(meta)?;
    while let Some(m) = cursor {
        cursor = m.parent().map_err(meta)?;
        map.insert(m.level_number(), m);
    }
    Ok(map)
}

/// Odometer step over the non-COLUMNS coordinates; false when exhausted.
fn advance(coords: &mut [usize], axes: &[olapmeta::CellSetAxis]) -> bool {
    for (coord, axis) in coords.iter_mut().zip(axes) {
        *coord += 1;
        if *coord < axis.positions.len() {
            return true;
        }
        *coord = 0;
    }
    false
}

/// Column descriptors for a drillthrough result.
pub fn sql_columns(rows: &SqlRows) -> Vec<TabularColumn> {
    rows.columns
        .iter()
        .map(|c| TabularColumn::new(c.name.clone(), c.xsd_type))
        .collect()
}

/// Emit the `row` elements of a drillthrough result. Null cells are
/// omitted from their row.
pub fn write_sql_rows(sink: &mut dyn XmlaSink, rows: &SqlRows) -> Result<()> {
    let columns = sql_columns(rows);
    sink.start_sequence("row")?;
    for row in &rows.rows {
        sink.start_element("row", &[])?;
        for (column, value) in columns.iter().zip(row) {
            if matches!(value, Datum::Null) {
                continue;
            }
            sink.text_element(column.encoded_name.as_str(), &[], &value.to_string())?;
        }
        sink.end_element("row")?;
    }
    sink.end_sequence("row")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use olapmeta::memory::fixtures;
    use olapmeta::{CellSetAxis, SqlColumn};
    use xmlaio::XmlSink;

    #[test]
    fn flattening_produces_row_per_rows_axis_position() {
        let cs = fixtures::sales_cellset_2x2();
        let ds = TabularDataset::from_cellset(&cs).unwrap();
        // Two Geo region rows, columns: Geo.Region + F + M.
        assert_eq!(ds.row_count(), 2);
        let captions: Vec<&str> = ds.columns().iter().map(|c| c.caption.as_str()).collect();
        assert_eq!(captions, vec!["Geo.Region", "F", "M"]);
        // Value columns pick up the canonical type of their cells.
        assert_eq!(ds.columns()[1].xsd_type, XsdType::Long);
    }

    #[test]
    fn flattened_rows_carry_member_captions_and_values() {
        let cs = fixtures::sales_cellset_2x2();
        let ds = TabularDataset::from_cellset(&cs).unwrap();
        let mut buf = Vec::new();
        {
            let mut sink = XmlSink::new(&mut buf);
            sink.start_element("root", &[]).unwrap();
            ds.write_rows(&mut sink).unwrap();
            sink.end_element("root").unwrap();
            sink.flush().unwrap();
        }
        let xml = String::from_utf8(buf).unwrap();
        assert!(xml.contains("<Geo.Region>North</Geo.Region>"));
        assert!(xml.contains("<F>131558</F>"));
        // The (M, South) cell is absent, so the second row has no M element.
        let south_row = xml.find("South").unwrap();
        assert!(!xml[south_row..].contains("<M>"));
    }

    #[test]
    fn empty_axis_set_yields_zero_rows() {
        let mut cs = fixtures::sales_cellset_2x2();
        for axis in &mut cs.axes {
            axis.positions.clear();
        }
        cs.cells.clear();
        let ds = TabularDataset::from_cellset(&cs).unwrap();
        assert_eq!(ds.row_count(), 0);
    }

    #[test]
    fn empty_rows_axis_yields_zero_rows_but_keeps_value_columns() {
        let mut cs = fixtures::sales_cellset_2x2();
        cs.axes[1] = CellSetAxis::empty();
        cs.cells.clear();
        let ds = TabularDataset::from_cellset(&cs).unwrap();
        assert_eq!(ds.row_count(), 0);
        assert_eq!(ds.columns().len(), 2);
    }

    #[test]
    fn drillthrough_rows_skip_nulls() {
        let rows = SqlRows {
            columns: vec![
                SqlColumn {
                    name: "customer id".into(),
                    xsd_type: XsdType::Int,
                    nullable: false,
                },
                SqlColumn {
                    name: "unit sales".into(),
                    xsd_type: XsdType::Double,
                    nullable: true,
                },
            ],
            rows: vec![
                vec![Datum::Int32(7), Datum::Float64(1.5)],
                vec![Datum::Int32(8), Datum::Null],
            ],
        };
        let mut buf = Vec::new();
        {
            let mut sink = XmlSink::new(&mut buf);
            sink.start_element("root", &[]).unwrap();
            write_sql_rows(&mut sink, &rows).unwrap();
            sink.end_element("root").unwrap();
            sink.flush().unwrap();
        }
        let xml = String::from_utf8(buf).unwrap();
        assert!(xml.contains("<customer_x0020_id>7</customer_x0020_id>"));
        assert!(xml.contains("<unit_x0020_sales>1.5</unit_x0020_sales>"));
        let second = xml.rfind("<customer_x0020_id>8").unwrap();
        assert!(!xml[second..].contains("unit_x0020_sales"));
    }
}
