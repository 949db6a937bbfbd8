//! Multidimensional dataset serialization: OlapInfo, Axes, CellData.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;
use xmlarepr::{Datum, ValueInfo};

use olapmeta::{CellSet, CellSetAxis, Cube, Hierarchy, Level, Member};

use crate::errors::{Result, SrvError};
use crate::xsd::encode_element_name;
use xmlaio::XmlaSink;

fn meta(e: olapmeta::MetaError) -> SrvError {
    SrvError::Execute(e)
}

/// The slicer axis as serialized: the participating hierarchies plus
/// zero or one tuple of members.
struct Slicer {
    hierarchies: Vec<Arc<dyn Hierarchy>>,
    /// `None` means zero positions; `Some` is a single (possibly empty)
    /// tuple. The distinction survives into the output.
    tuple: Option<Vec<Arc<dyn Member>>>,
}

/// Serialize a cell set as an MDDataSet body (inside an open `root`
/// element). `expand_default_slicer` adds the default members of every
/// hierarchy not already on an axis to the slicer tuple.
pub fn write_dataset(
    sink: &mut dyn XmlaSink,
    cs: &CellSet,
    expand_default_slicer: bool,
) -> Result<()> {
    let slicer = build_slicer(cs, expand_default_slicer)?;
    write_olap_info(sink, cs, &slicer)?;
    write_axes(sink, cs, &slicer)?;
    write_cell_data(sink, cs)?;
    Ok(())
}

fn build_slicer(cs: &CellSet, expand: bool) -> Result<Slicer> {
    if !expand {
        // Serialize the filter axis as-is: an empty tuple position is
        // preserved, zero positions stay zero.
        let tuple = cs
            .filter_axis
            .positions
            .first()
            .map(|p| p.members.clone());
        return Ok(Slicer {
            hierarchies: cs.filter_axis.hierarchies.clone(),
            tuple,
        });
    }

    let mut on_axes: HashSet<String> = HashSet::new();
    for axis in &cs.axes {
        for hierarchy in &axis.hierarchies {
            on_axes.insert(hierarchy.unique_name().to_string());
        }
    }

    let supplied: Vec<Arc<dyn Member>> = cs
        .filter_axis
        .positions
        .first()
        .map(|p| p.members.clone())
        .unwrap_or_default();

    let mut hierarchies = Vec::new();
    let mut tuple = Vec::new();
    for dimension in cs.cube.dimensions().map_err(meta)? {
        for hierarchy in dimension.hierarchies().map_err(meta)? {
            if on_axes.contains(hierarchy.unique_name()) {
                continue;
            }
            let member = supplied
                .iter()
                .find(|m| m.hierarchy_unique_name() == hierarchy.unique_name())
                .cloned();
            let member = match member {
                Some(m) => Some(m),
                None => hierarchy.default_member().map_err(meta)?,
            };
            match member {
                Some(m) => {
                    hierarchies.push(hierarchy);
                    tuple.push(m);
                }
                None => {
                    // Non-fatal: the hierarchy just stays off the slicer.
                    warn!(
                        hierarchy = hierarchy.unique_name(),
                        "no default member for slicer, skipping hierarchy"
                    );
                }
            }
        }
    }
    Ok(Slicer {
        hierarchies,
        tuple: Some(tuple),
    })
}

fn write_olap_info(sink: &mut dyn XmlaSink, cs: &CellSet, slicer: &Slicer) -> Result<()> {
    sink.start_element("OlapInfo", &[])?;

    sink.start_element("CubeInfo", &[])?;
    sink.start_element("Cube", &[])?;
    sink.text_element("CubeName", &[], cs.cube.name())?;
    sink.end_element("Cube")?;
    sink.end_element("CubeInfo")?;

    sink.start_element("AxesInfo", &[])?;
    sink.start_sequence("AxisInfo")?;
    for (i, axis) in cs.axes.iter().enumerate() {
        let name = format!("Axis{i}");
        write_axis_info(sink, &name, &axis.hierarchies)?;
    }
    write_axis_info(sink, "SlicerAxis", &slicer.hierarchies)?;
    sink.end_sequence("AxisInfo")?;
    sink.end_element("AxesInfo")?;

    sink.start_element("CellInfo", &[])?;
    sink.text_element("Value", &[("name", "VALUE")], "")?;
    sink.text_element("FmtValue", &[("name", "FORMATTED_VALUE")], "")?;
    sink.end_element("CellInfo")?;

    sink.end_element("OlapInfo")?;
    Ok(())
}

fn write_axis_info(
    sink: &mut dyn XmlaSink,
    axis_name: &str,
    hierarchies: &[Arc<dyn Hierarchy>],
) -> Result<()> {
    sink.start_element("AxisInfo", &[("name", axis_name)])?;
    sink.start_sequence("HierarchyInfo")?;
    for hierarchy in hierarchies {
        let hname = hierarchy.name().to_string();
        sink.start_element("HierarchyInfo", &[("name", hname.as_str())])?;
        for prop in ["UName", "Caption", "LName", "LNum", "DisplayInfo"] {
            let long_name = format!("{}.[{}]", hierarchy.unique_name(), wire_property(prop));
            sink.text_element(prop, &[("name", long_name.as_str())], "")?;
        }
        for level in hierarchy.levels().map_err(meta)? {
            for prop in level.member_properties() {
                let element = encode_element_name(&prop.name);
                let long_name = format!("{}.[{}]", hierarchy.unique_name(), prop.name);
                sink.text_element(element.as_str(), &[("name", long_name.as_str())], "")?;
            }
        }
        sink.end_element("HierarchyInfo")?;
    }
    sink.end_sequence("HierarchyInfo")?;
    sink.end_element("AxisInfo")?;
    Ok(())
}

/// Intrinsic property name as clients address it.
fn wire_property(short: &str) -> &'static str {
    match short {
        "UName" => "MEMBER_UNIQUE_NAME",
        "Caption" => "MEMBER_CAPTION",
        "LName" => "LEVEL_UNIQUE_NAME",
        "LNum" => "LEVEL_NUMBER",
        _ => "DISPLAY_INFO",
    }
}

fn write_axes(sink: &mut dyn XmlaSink, cs: &CellSet, slicer: &Slicer) -> Result<()> {
    sink.start_element("Axes", &[])?;
    sink.start_sequence("Axis")?;
    for (i, axis) in cs.axes.iter().enumerate() {
        let name = format!("Axis{i}");
        write_axis(sink, &name, axis, &cs.cube)?;
    }
    write_slicer_axis(sink, slicer, &cs.cube)?;
    sink.end_sequence("Axis")?;
    sink.end_element("Axes")?;
    Ok(())
}

fn write_axis(
    sink: &mut dyn XmlaSink,
    name: &str,
    axis: &CellSetAxis,
    cube: &Arc<dyn Cube>,
) -> Result<()> {
    sink.start_element("Axis", &[("name", name)])?;
    sink.start_element("Tuples", &[])?;
    sink.start_sequence("Tuple")?;
    for (pos_idx, position) in axis.positions.iter().enumerate() {
        sink.start_element("Tuple", &[])?;
        sink.start_sequence("Member")?;
        for (member_idx, member) in position.members.iter().enumerate() {
            let prev = pos_idx
                .checked_sub(1)
                .and_then(|p| axis.positions.get(p))
                .and_then(|p| p.members.get(member_idx));
            let next = axis
                .positions
                .get(pos_idx + 1)
                .and_then(|p| p.members.get(member_idx));
            write_member(sink, member, prev, next, cube)?;
        }
        sink.end_sequence("Member")?;
        sink.end_element("Tuple")?;
    }
    sink.end_sequence("Tuple")?;
    sink.end_element("Tuples")?;
    sink.end_element("Axis")?;
    Ok(())
}

fn write_slicer_axis(
    sink: &mut dyn XmlaSink,
    slicer: &Slicer,
    cube: &Arc<dyn Cube>,
) -> Result<()> {
    sink.start_element("Axis", &[("name", "SlicerAxis")])?;
    sink.start_element("Tuples", &[])?;
    sink.start_sequence("Tuple")?;
    if let Some(tuple) = &slicer.tuple {
        sink.start_element("Tuple", &[])?;
        sink.start_sequence("Member")?;
        for member in tuple {
            write_member(sink, member, None, None, cube)?;
        }
        sink.end_sequence("Member")?;
        sink.end_element("Tuple")?;
    }
    sink.end_sequence("Tuple")?;
    sink.end_element("Tuples")?;
    sink.end_element("Axis")?;
    Ok(())
}

fn write_member(
    sink: &mut dyn XmlaSink,
    member: &Arc<dyn Member>,
    prev: Option<&Arc<dyn Member>>,
    next: Option<&Arc<dyn Member>>,
    cube: &Arc<dyn Cube>,
) -> Result<()> {
    let hierarchy = member.hierarchy_unique_name().to_string();
    sink.start_element("Member", &[("Hierarchy", hierarchy.as_str())])?;
    sink.text_element("UName", &[], member.unique_name())?;
    sink.text_element("Caption", &[], member.caption())?;
    sink.text_element("LName", &[], member.level_unique_name())?;
    sink.text_element("LNum", &[], &member.level_number().to_string())?;
    let info = display_info(member, prev, next)?;
    sink.text_element("DisplayInfo", &[], &info.to_string())?;
    // Declared member properties that are actually set on this member.
    if let Some(level) = cube.lookup_level(member.level_unique_name()).map_err(meta)? {
        for prop in level.member_properties() {
            if let Some(value) = member.property_value(&prop.name) {
                let element = encode_element_name(&prop.name);
                sink.text_element(element.as_str(), &[], &value.to_string())?;
            }
        }
    }
    sink.end_element("Member")?;
    Ok(())
}

/// DisplayInfo bit-packing: low 16 bits are the children cardinality;
/// 0x10000 marks a member the next position drills into; 0x20000 marks a
/// member whose predecessor at the same tuple ordinal shares its parent.
/// Both comparisons use unique names.
pub fn display_info(
    member: &Arc<dyn Member>,
    prev: Option<&Arc<dyn Member>>,
    next: Option<&Arc<dyn Member>>,
) -> Result<u32> {
    let mut info = (member.child_count() as u32) & 0xFFFF;

    if let Some(next) = next {
        let next_parent = next.parent().map_err(meta)?;
        if next_parent
            .map(|p| p.unique_name() == member.unique_name())
            .unwrap_or(false)
        {
            info |= 0x10000;
        }
    }

    if let Some(prev) = prev {
        let my_parent = member
            .parent()
            .map_err(meta)?
            .map(|p| p.unique_name().to_string());
        let prev_parent = prev
            .parent()
            .map_err(meta)?
            .map(|p| p.unique_name().to_string());
        // Two root members (both parentless) count as same-branch.
        if my_parent == prev_parent {
            info |= 0x20000;
        }
    }
    Ok(info)
}

fn write_cell_data(sink: &mut dyn XmlaSink, cs: &CellSet) -> Result<()> {
    sink.start_element("CellData", &[])?;
    sink.start_sequence("Cell")?;
    for ordinal in 0..cs.cell_count() {
        let Some(cell) = cs.cell(ordinal) else {
            continue;
        };
        let ordinal_text = ordinal.to_string();
        sink.start_element("Cell", &[("CellOrdinal", ordinal_text.as_str())])?;
        if !matches!(cell.value, Datum::Null) {
            let info = ValueInfo::new(None, cell.value.clone());
            sink.text_element(
                "Value",
                &[("xsi:type", info.xsd_type.as_str())],
                &info.value.to_string(),
            )?;
        }
        if let Some(fmt) = &cell.formatted_value {
            sink.text_element("FmtValue", &[], fmt)?;
        }
        for (name, value) in &cell.properties {
            let element = encode_element_name(name);
            sink.text_element(element.as_str(), &[], &value.to_string())?;
        }
        sink.end_element("Cell")?;
    }
    sink.end_sequence("Cell")?;
    sink.end_element("CellData")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use olapmeta::memory::fixtures;
    use olapmeta::{Catalog, OlapConnection, Schema};
    use xmlaio::XmlSink;

    fn serialize(cs: &CellSet, expand: bool) -> String {
        let mut buf = Vec::new();
        {
            let mut sink = XmlSink::new(&mut buf);
            sink.start_element("root", &[]).unwrap();
            write_dataset(&mut sink, cs, expand).unwrap();
            sink.end_element("root").unwrap();
            sink.flush().unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    fn members_of(unique_names: &[&str]) -> Vec<Arc<dyn Member>> {
        let conn = fixtures::sales_connection();
        let catalogs = conn.catalogs().unwrap();
        let cube = catalogs[0].schemas().unwrap()[0]
            .cubes()
            .unwrap()
            .remove(0);
        let members = unique_names
            .iter()
            .map(|n| cube.lookup_member(n).unwrap().unwrap())
            .collect();
        // Keep the connection (the strong owner of the member tree)
        // alive so the members' weak parent links stay upgradable.
        std::mem::forget(conn);
        members
    }

    #[test]
    fn display_info_drill_and_branch_bits() {
        // Three consecutive positions: South is drilled into by SE, and
        // North (root-level sibling) precedes it under the same parent.
        let members = members_of(&["[Geo].[North]", "[Geo].[South]", "[Geo].[South].[SE]"]);
        let info = display_info(&members[1], Some(&members[0]), Some(&members[2])).unwrap();
        assert_ne!(info & 0x10000, 0, "next position drills into this member");
        assert_ne!(info & 0x20000, 0, "same parent as predecessor");
        assert_eq!(info & 0xFFFF, 2, "children cardinality in low bits");

        // NE follows North at the same ordinal: different parents, no
        // drill from NE into North.
        let members = members_of(&["[Geo].[North].[NE]", "[Geo].[South]"]);
        let info = display_info(&members[1], Some(&members[0]), None).unwrap();
        assert_eq!(info & 0x10000, 0);
        assert_eq!(info & 0x20000, 0);
    }

    #[test]
    fn dataset_contains_axes_and_sparse_cells() {
        let cs = fixtures::sales_cellset_2x2();
        let xml = serialize(&cs, false);
        assert!(xml.contains("<CubeName>SalesGeo</CubeName>"));
        assert!(xml.contains(r#"<Axis name="Axis0">"#));
        assert!(xml.contains(r#"<Axis name="Axis1">"#));
        assert!(xml.contains(r#"CellOrdinal="0""#));
        assert!(xml.contains(r#"CellOrdinal="2""#));
        // The null cell at ordinal 3 is omitted entirely.
        assert!(!xml.contains(r#"CellOrdinal="3""#));
        assert!(xml.contains(r#"xsi:type="xsd:long""#));
    }

    #[test]
    fn empty_filter_axis_still_yields_wellformed_slicer() {
        let cs = fixtures::sales_cellset_2x2();
        let xml = serialize(&cs, false);
        assert!(xml.contains(r#"<Axis name="SlicerAxis">"#));
        // Zero positions: a Tuples element with no Tuple children.
        let slicer_at = xml.find(r#"<Axis name="SlicerAxis">"#).unwrap();
        let tail = &xml[slicer_at..];
        let axis_end = tail.find("</Axis>").unwrap();
        assert!(!tail[..axis_end].contains("<Tuple>"));
    }

    #[test]
    fn expanded_slicer_picks_default_members() {
        let mut cs = fixtures::sales_cellset_2x2();
        // Drop the Gender axis: its hierarchy is now unaddressed and the
        // slicer must carry its default member.
        cs.axes.remove(0);
        let xml = serialize(&cs, true);
        let slicer_at = xml.find(r#"<Axis name="SlicerAxis">"#).unwrap();
        let tail = &xml[slicer_at..];
        let axis_end = tail.find("</Axis>").unwrap();
        assert!(
            tail[..axis_end].contains("<UName>[Gender].[All Gender]</UName>"),
            "{xml}"
        );
    }

    #[test]
    fn fully_addressed_axes_leave_an_empty_slicer_tuple() {
        let cs = fixtures::sales_cellset_2x2();
        let xml = serialize(&cs, true);
        let slicer_at = xml.find(r#"<Axis name="SlicerAxis">"#).unwrap();
        let tail = &xml[slicer_at..];
        let axis_end = tail.find("</Axis>").unwrap();
        // The tuple position exists but holds no members.
        assert!(tail[..axis_end].contains("<Tuple></Tuple>"), "{xml}");
    }
}
