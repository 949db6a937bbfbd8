//! Populators for the MDSCHEMA_* rowsets: the multidimensional view of
//! the metadata model. These all follow the pruned traversal pattern:
//! catalogs, then schemas, then cubes (with the shared-dimension
//! pseudo-cube where applicable), then down the dimension tree, testing
//! restrictions at each step so a pruned node's children are never
//! materialized.

use std::sync::Arc;

use tracing::debug;
use xmlarepr::XsdType;

use olapmeta::{Cube, Member};

use crate::enums::tree_op;
use crate::errors::Result;
use crate::row::Row;
use crate::rowset::{DiscoverContext, RowsetDef};

use super::{CubeScope, catalogs_for, cube_scopes, finish};

// Member type codes for MDSCHEMA_MEMBERS.MEMBER_TYPE.
const MDMEMBER_TYPE_REGULAR: i32 = 1;
const MDMEMBER_TYPE_ALL: i32 = 2;
const MDMEMBER_TYPE_FORMULA: i32 = 4;

// Level type codes for MDSCHEMA_LEVELS.LEVEL_TYPE.
const MDLEVEL_TYPE_REGULAR: i32 = 0;
const MDLEVEL_TYPE_ALL: i32 = 1;

/// OLE DB type code for a property or measure data type.
fn dbtype(xsd: XsdType) -> i32 {
    match xsd {
        XsdType::Boolean => 11,
        XsdType::Byte | XsdType::UnsignedByte => 17,
        XsdType::Short => 2,
        XsdType::UnsignedShort => 18,
        XsdType::Int | XsdType::Integer => 3,
        XsdType::UnsignedInt => 19,
        XsdType::Long => 20,
        XsdType::UnsignedLong => 21,
        XsdType::Float => 4,
        XsdType::Double | XsdType::Decimal => 5,
        XsdType::DateTime => 7,
        XsdType::String => 130,
    }
}

pub fn actions(_def: &'static RowsetDef, _cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    // No actions are defined; the rowset exists so clients can probe it.
    Ok(Vec::new())
}

pub fn cubes(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for catalog in catalogs_for(cx, "CATALOG_NAME")? {
        for schema in catalog.schemas()? {
            if !cx.restrictions.passes("SCHEMA_NAME", schema.name()) {
                continue;
            }
            for cube in schema.cubes()? {
                if !cx.restrictions.passes("CUBE_NAME", cube.name())
                    || !cx.restrictions.passes("CUBE_TYPE", "CUBE")
                {
                    continue;
                }
                let mut row = def.new_row();
                row.set("CATALOG_NAME", catalog.name());
                row.set("SCHEMA_NAME", schema.name());
                row.set("CUBE_NAME", cube.name());
                row.set("CUBE_TYPE", "CUBE");
                if let Some(modified) = cube.last_modified() {
                    row.set(
                        "LAST_SCHEMA_UPDATE",
                        xmlarepr::Datum::DateTime(modified),
                    );
                }
                row.set("IS_DRILLTHROUGH_ENABLED", true);
                row.set("IS_WRITE_ENABLED", false);
                row.set("IS_LINKABLE", false);
                row.set("IS_SQL_ENABLED", false);
                row.set("CUBE_CAPTION", cube.caption());
                row.set_opt("DESCRIPTION", cube.description());
                if cx.properties.deep() {
                    embed_cube_detail(def, &mut row, &cube)?;
                }
                rows.push(row);
            }
        }
    }
    finish(def, rows)
}

/// Deep expansion: nest the cube's dimensions (down to levels), sets and
/// measures inside the cube row. Depth is capped by the nested column
/// schema itself; nothing recurses past cube, dimension, hierarchy,
/// level.
fn embed_cube_detail(def: &'static RowsetDef, row: &mut Row, cube: &Arc<dyn Cube>) -> Result<()> {
    use crate::row::RowValue;

    let dims_cols = def.column("DIMENSIONS").map(|c| c.nested.as_slice()).unwrap_or(&[]);
    let hier_cols = dims_cols
        .iter()
        .find(|c| c.name == "HIERARCHIES")
        .map(|c| c.nested.as_slice())
        .unwrap_or(&[]);
    let level_cols = hier_cols
        .iter()
        .find(|c| c.name == "LEVELS")
        .map(|c| c.nested.as_slice())
        .unwrap_or(&[]);
    let sets_cols = def.column("SETS").map(|c| c.nested.as_slice()).unwrap_or(&[]);
    let measures_cols = def.column("MEASURES").map(|c| c.nested.as_slice()).unwrap_or(&[]);

    let mut dim_rows = Vec::new();
    for dimension in cube.dimensions()? {
        let mut dim_row = Row::new(dims_cols);
        dim_row.set("DIMENSION_NAME", dimension.name());
        dim_row.set("DIMENSION_UNIQUE_NAME", dimension.unique_name());
        dim_row.set("DIMENSION_ORDINAL", dimension.ordinal() as i32);
        dim_row.set("DIMENSION_TYPE", dimension.dimension_type().xmla_ordinal());
        let mut hier_rows = Vec::new();
        for hierarchy in dimension.hierarchies()? {
            let mut hier_row = Row::new(hier_cols);
            hier_row.set("HIERARCHY_NAME", hierarchy.name());
            hier_row.set("HIERARCHY_UNIQUE_NAME", hierarchy.unique_name());
            let level_rows: Vec<Row> = hierarchy
                .levels()?
                .iter()
                .map(|level| {
                    let mut level_row = Row::new(level_cols);
                    level_row.set("LEVEL_NAME", level.name());
                    level_row.set("LEVEL_UNIQUE_NAME", level.unique_name());
                    level_row.set("LEVEL_NUMBER", level.depth() as i32);
                    level_row
                })
                .collect();
            if !level_rows.is_empty() {
                hier_row.set("LEVELS", RowValue::Nested(level_rows));
            }
            hier_rows.push(hier_row);
        }
        if !hier_rows.is_empty() {
            dim_row.set("HIERARCHIES", RowValue::Nested(hier_rows));
        }
        dim_rows.push(dim_row);
    }
    if !dim_rows.is_empty() {
        row.set("DIMENSIONS", RowValue::Nested(dim_rows));
    }

    let set_rows: Vec<Row> = cube
        .named_sets()?
        .iter()
        .map(|set| {
            let mut set_row = Row::new(sets_cols);
            set_row.set("SET_NAME", set.name());
            set_row.set("SCOPE", 1);
            set_row
        })
        .collect();
    if !set_rows.is_empty() {
        row.set("SETS", RowValue::Nested(set_rows));
    }

    let measure_rows: Vec<Row> = cube
        .measures()?
        .iter()
        .map(|measure| {
            let mut m_row = Row::new(measures_cols);
            m_row.set("MEASURE_NAME", measure.name());
            m_row.set(
                "MEASURE_UNIQUE_NAME",
                format!("[Measures].[{}]", measure.name()),
            );
            m_row.set("MEASURE_AGGREGATOR", measure.aggregator().xmla_ordinal());
            m_row
        })
        .collect();
    if !measure_rows.is_empty() {
        row.set("MEASURES", RowValue::Nested(measure_rows));
    }
    Ok(())
}

pub fn dimensions(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for catalog in catalogs_for(cx, "CATALOG_NAME")? {
        for schema in catalog.schemas()? {
            if !cx.restrictions.passes("SCHEMA_NAME", schema.name()) {
                continue;
            }
            for scope in cube_scopes(cx, &schema, true)? {
                for dimension in scope.dimensions()? {
                    if !cx.restrictions.passes("DIMENSION_NAME", dimension.name())
                        || !cx
                            .restrictions
                            .passes("DIMENSION_UNIQUE_NAME", dimension.unique_name())
                    {
                        continue;
                    }
                    let mut cardinality = 0usize;
                    let mut default_hierarchy = None;
                    for hierarchy in dimension.hierarchies()? {
                        if default_hierarchy.is_none() {
                            default_hierarchy = Some(hierarchy.unique_name().to_string());
                        }
                        if let Some(leaf) = hierarchy.levels()?.last() {
                            cardinality += leaf.cardinality();
                        }
                    }
                    let mut row = def.new_row();
                    row.set("CATALOG_NAME", catalog.name());
                    row.set("SCHEMA_NAME", schema.name());
                    row.set("CUBE_NAME", scope.name());
                    row.set("DIMENSION_NAME", dimension.name());
                    row.set("DIMENSION_UNIQUE_NAME", dimension.unique_name());
                    row.set("DIMENSION_CAPTION", dimension.caption());
                    row.set("DIMENSION_ORDINAL", dimension.ordinal() as i32);
                    row.set("DIMENSION_TYPE", dimension.dimension_type().xmla_ordinal());
                    row.set("DIMENSION_CARDINALITY", cardinality as i32);
                    row.set_opt("DEFAULT_HIERARCHY", default_hierarchy);
                    row.set_opt("DESCRIPTION", dimension.description());
                    row.set("IS_VIRTUAL", false);
                    row.set("IS_READWRITE", false);
                    row.set("DIMENSION_UNIQUE_SETTINGS", 1);
                    row.set("DIMENSION_IS_VISIBLE", dimension.is_visible());
                    rows.push(row);
                }
            }
        }
    }
    finish(def, rows)
}

struct FunctionDef {
    name: &'static str,
    description: &'static str,
    parameter_list: &'static str,
    return_type: i32,
    origin: i32,
}

const fn func(
    name: &'static str,
    description: &'static str,
    parameter_list: &'static str,
    return_type: i32,
) -> FunctionDef {
    FunctionDef {
        name,
        description,
        parameter_list,
        return_type,
        origin: 1,
    }
}

static FUNCTIONS: &[FunctionDef] = &[
    func("Aggregate", "Returns a calculated value using the appropriate aggregate function.", "Set, Numeric Expression", 12),
    func("Avg", "Returns the average value of a numeric expression evaluated over a set.", "Set, Numeric Expression", 12),
    func("Children", "Returns the children of a member.", "Member", 9),
    func("Count", "Returns the number of tuples in a set, empty cells included unless the optional EXCLUDEEMPTY flag is used.", "Set", 3),
    func("CrossJoin", "Returns the cross product of two sets.", "Set1, Set2", 9),
    func("Descendants", "Returns the set of descendants of a member at a specified level.", "Member, Level", 9),
    func("Filter", "Returns the set resulting from filtering a set based on a search condition.", "Set, Logical Expression", 9),
    func("Max", "Returns the maximum value of a numeric expression evaluated over a set.", "Set, Numeric Expression", 12),
    func("Members", "Returns the set of members in a dimension, level, or hierarchy.", "Hierarchy", 9),
    func("Min", "Returns the minimum value of a numeric expression evaluated over a set.", "Set, Numeric Expression", 12),
    func("Sum", "Returns the sum of a numeric expression evaluated over a set.", "Set, Numeric Expression", 12),
    func("TopCount", "Returns a specified number of items from the topmost members of a specified set, optionally ordering the set first.", "Set, Count, Numeric Expression", 9),
];

pub fn functions(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for f in FUNCTIONS {
        if !cx.restrictions.passes("FUNCTION_NAME", f.name)
            || !cx.restrictions.passes("ORIGIN", &f.origin.to_string())
        {
            continue;
        }
        let mut row = def.new_row();
        row.set("FUNCTION_NAME", f.name);
        row.set("DESCRIPTION", f.description);
        row.set("PARAMETER_LIST", f.parameter_list);
        row.set("RETURN_TYPE", f.return_type);
        row.set("ORIGIN", f.origin);
        row.set_null("INTERFACE_NAME");
        row.set_null("LIBRARY_NAME");
        row.set("CAPTION", f.name);
        rows.push(row);
    }
    finish(def, rows)
}

pub fn hierarchies(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for catalog in catalogs_for(cx, "CATALOG_NAME")? {
        for schema in catalog.schemas()? {
            if !cx.restrictions.passes("SCHEMA_NAME", schema.name()) {
                continue;
            }
            for scope in cube_scopes(cx, &schema, true)? {
                let mut ordinal = 0u32;
                for dimension in scope.dimensions()? {
                    if !cx
                        .restrictions
                        .passes("DIMENSION_UNIQUE_NAME", dimension.unique_name())
                    {
                        continue;
                    }
                    for hierarchy in dimension.hierarchies()? {
                        ordinal += 1;
                        if !cx.restrictions.passes("HIERARCHY_NAME", hierarchy.name())
                            || !cx
                                .restrictions
                                .passes("HIERARCHY_UNIQUE_NAME", hierarchy.unique_name())
                        {
                            continue;
                        }
                        let mut cardinality = 0usize;
                        for level in hierarchy.levels()? {
                            cardinality += level.cardinality();
                        }
                        let mut row = def.new_row();
                        row.set("CATALOG_NAME", catalog.name());
                        row.set("SCHEMA_NAME", schema.name());
                        row.set("CUBE_NAME", scope.name());
                        row.set("DIMENSION_UNIQUE_NAME", dimension.unique_name());
                        row.set("HIERARCHY_NAME", hierarchy.name());
                        row.set("HIERARCHY_UNIQUE_NAME", hierarchy.unique_name());
                        row.set("HIERARCHY_CAPTION", hierarchy.caption());
                        row.set("DIMENSION_TYPE", dimension.dimension_type().xmla_ordinal());
                        row.set("HIERARCHY_CARDINALITY", cardinality as i32);
                        let default_member = hierarchy.default_member()?;
                        row.set_opt(
                            "DEFAULT_MEMBER",
                            default_member.as_ref().map(|m| m.unique_name().to_string()),
                        );
                        if hierarchy.has_all() {
                            if let Some(root) = hierarchy.root_members()?.first() {
                                row.set("ALL_MEMBER", root.unique_name());
                            }
                        }
                        row.set_opt("DESCRIPTION", hierarchy.description());
                        row.set("STRUCTURE", 0);
                        row.set("IS_VIRTUAL", false);
                        row.set("IS_READWRITE", false);
                        row.set("DIMENSION_UNIQUE_SETTINGS", 1);
                        row.set("DIMENSION_IS_VISIBLE", dimension.is_visible());
                        row.set("HIERARCHY_IS_VISIBLE", hierarchy.is_visible());
                        row.set("HIERARCHY_ORDINAL", ordinal as i32 - 1);
                        row.set("DIMENSION_IS_SHARED", true);
                        row.set("PARENT_CHILD", false);
                        rows.push(row);
                    }
                }
            }
        }
    }
    finish(def, rows)
}

pub fn levels(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for catalog in catalogs_for(cx, "CATALOG_NAME")? {
        for schema in catalog.schemas()? {
            if !cx.restrictions.passes("SCHEMA_NAME", schema.name()) {
                continue;
            }
            for scope in cube_scopes(cx, &schema, true)? {
                // A unique-name restriction with exactly one value skips
                // the traversal entirely.
                let level_restr = cx.restrictions.get("LEVEL_UNIQUE_NAME");
                if !level_restr.is_absent() {
                    let Some(unique_name) = level_restr.exactly_one() else {
                        debug!(rowset = def.name, "unique-name restriction with bad cardinality");
                        continue;
                    };
                    if let Some(cube) = scope.cube() {
                        if let Some(level) = cube.lookup_level(unique_name)? {
                            rows.push(level_row(def, catalog.name(), schema.name(), scope.name(), &level));
                        }
                    }
                    continue;
                }
                for dimension in scope.dimensions()? {
                    if !cx
                        .restrictions
                        .passes("DIMENSION_UNIQUE_NAME", dimension.unique_name())
                    {
                        continue;
                    }
                    for hierarchy in dimension.hierarchies()? {
                        if !cx
                            .restrictions
                            .passes("HIERARCHY_UNIQUE_NAME", hierarchy.unique_name())
                        {
                            continue;
                        }
                        for level in hierarchy.levels()? {
                            if !cx.restrictions.passes("LEVEL_NAME", level.name()) {
                                continue;
                            }
                            rows.push(level_row(def, catalog.name(), schema.name(), scope.name(), &level));
                        }
                    }
                }
            }
        }
    }
    finish(def, rows)
}

fn level_row(
    def: &'static RowsetDef,
    catalog: &str,
    schema: &str,
    cube: &str,
    level: &Arc<dyn olapmeta::Level>,
) -> Row {
    let mut row = def.new_row();
    row.set("CATALOG_NAME", catalog);
    row.set("SCHEMA_NAME", schema);
    row.set("CUBE_NAME", cube);
    row.set("DIMENSION_UNIQUE_NAME", level.dimension_unique_name());
    row.set("HIERARCHY_UNIQUE_NAME", level.hierarchy_unique_name());
    row.set("LEVEL_NAME", level.name());
    row.set("LEVEL_UNIQUE_NAME", level.unique_name());
    row.set("LEVEL_CAPTION", level.caption());
    row.set("LEVEL_NUMBER", level.depth() as i32);
    row.set("LEVEL_CARDINALITY", level.cardinality() as i32);
    row.set(
        "LEVEL_TYPE",
        if level.is_all() {
            MDLEVEL_TYPE_ALL
        } else {
            MDLEVEL_TYPE_REGULAR
        },
    );
    row.set("CUSTOM_ROLLUP_SETTINGS", 0);
    row.set("LEVEL_UNIQUE_SETTINGS", if level.is_all() { 3 } else { 0 });
    row.set("LEVEL_IS_VISIBLE", true);
    row.set_opt("DESCRIPTION", level.description());
    row
}

pub fn measures(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    let emit_invisible = cx.properties.emit_invisible_members();
    for catalog in catalogs_for(cx, "CATALOG_NAME")? {
        for schema in catalog.schemas()? {
            if !cx.restrictions.passes("SCHEMA_NAME", schema.name()) {
                continue;
            }
            for cube in schema.cubes()? {
                if !cx.restrictions.passes("CUBE_NAME", cube.name()) {
                    continue;
                }
                for measure in cube.measures()? {
                    if !measure.is_visible() && !emit_invisible {
                        continue;
                    }
                    let unique_name = format!("[Measures].[{}]", measure.name());
                    if !cx.restrictions.passes("MEASURE_NAME", measure.name())
                        || !cx.restrictions.passes("MEASURE_UNIQUE_NAME", &unique_name)
                    {
                        continue;
                    }
                    let mut row = def.new_row();
                    row.set("CATALOG_NAME", catalog.name());
                    row.set("SCHEMA_NAME", schema.name());
                    row.set("CUBE_NAME", cube.name());
                    row.set("MEASURE_NAME", measure.name());
                    row.set("MEASURE_UNIQUE_NAME", unique_name);
                    row.set("MEASURE_CAPTION", measure.caption());
                    row.set("MEASURE_AGGREGATOR", measure.aggregator().xmla_ordinal());
                    let xsd = match measure.data_type_name() {
                        Some("Integer") => XsdType::Int,
                        _ => XsdType::Double,
                    };
                    row.set("DATA_TYPE", dbtype(xsd));
                    row.set("MEASURE_IS_VISIBLE", measure.is_visible());
                    // Stored measures carry their backing levels;
                    // calculated measures leave the column null.
                    match measure.levels_list() {
                        Some(levels) if !measure.is_calculated() => {
                            row.set("LEVELS_LIST", levels.join(","));
                        }
                        _ => row.set_null("LEVELS_LIST"),
                    }
                    row.set_opt("DESCRIPTION", measure.description());
                    rows.push(row);
                }
            }
        }
    }
    finish(def, rows)
}

pub fn members(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    let emit_invisible = cx.properties.emit_invisible_members();
    for catalog in catalogs_for(cx, "CATALOG_NAME")? {
        for schema in catalog.schemas()? {
            if !cx.restrictions.passes("SCHEMA_NAME", schema.name()) {
                continue;
            }
            for scope in cube_scopes(cx, &schema, false)? {
                let Some(cube) = scope.cube() else { continue };
                let names = Names {
                    catalog: catalog.name(),
                    schema: schema.name(),
                    cube: cube.name(),
                };

                let member_restr = cx.restrictions.get("MEMBER_UNIQUE_NAME");
                if !member_restr.is_absent() {
                    // Direct lookup; the TREE_OP restriction only applies
                    // to this form.
                    let Some(unique_name) = member_restr.exactly_one() else {
                        debug!(rowset = def.name, "unique-name restriction with bad cardinality");
                        continue;
                    };
                    let Some(member) = cube.lookup_member(unique_name)? else {
                        continue;
                    };
                    let ops = cx
                        .restrictions
                        .get("TREE_OP")
                        .exactly_one()
                        .and_then(|v| v.parse::<i32>().ok())
                        .unwrap_or(tree_op::SELF);
                    expand_relatives(def, &names, cube, &member, ops, emit_invisible, &mut rows)?;
                    continue;
                }

                let level_restr = cx.restrictions.get("LEVEL_UNIQUE_NAME");
                if !level_restr.is_absent() {
                    let Some(unique_name) = level_restr.exactly_one() else {
                        debug!(rowset = def.name, "unique-name restriction with bad cardinality");
                        continue;
                    };
                    let Some(level) = cube.lookup_level(unique_name)? else {
                        continue;
                    };
                    for member in level.members()? {
                        emit_member(def, &names, &member, emit_invisible, cx, &mut rows);
                    }
                    continue;
                }

                for dimension in cube.dimensions()? {
                    if !cx
                        .restrictions
                        .passes("DIMENSION_UNIQUE_NAME", dimension.unique_name())
                    {
                        continue;
                    }
                    for hierarchy in dimension.hierarchies()? {
                        if !cx
                            .restrictions
                            .passes("HIERARCHY_UNIQUE_NAME", hierarchy.unique_name())
                        {
                            continue;
                        }
                        for level in hierarchy.levels()? {
                            if !cx
                                .restrictions
                                .passes("LEVEL_NUMBER", &level.depth().to_string())
                            {
                                continue;
                            }
                            for member in level.members()? {
                                emit_member(def, &names, &member, emit_invisible, cx, &mut rows);
                            }
                        }
                    }
                }
            }
        }
    }
    finish(def, rows)
}

struct Names<'a> {
    catalog: &'a str,
    schema: &'a str,
    cube: &'a str,
}

fn emit_member(
    def: &'static RowsetDef,
    names: &Names<'_>,
    member: &Arc<dyn Member>,
    emit_invisible: bool,
    cx: &DiscoverContext<'_>,
    rows: &mut Vec<Row>,
) {
    if !member.is_visible() && !emit_invisible {
        return;
    }
    if !cx.restrictions.passes("MEMBER_NAME", member.name())
        || !cx.restrictions.passes("MEMBER_CAPTION", member.caption())
    {
        return;
    }
    rows.push(member_row(def, names, member));
}

fn member_row(def: &'static RowsetDef, names: &Names<'_>, member: &Arc<dyn Member>) -> Row {
    let mut row = def.new_row();
    row.set("CATALOG_NAME", names.catalog);
    row.set("SCHEMA_NAME", names.schema);
    row.set("CUBE_NAME", names.cube);
    row.set("DIMENSION_UNIQUE_NAME", member.dimension_unique_name());
    row.set("HIERARCHY_UNIQUE_NAME", member.hierarchy_unique_name());
    row.set("LEVEL_UNIQUE_NAME", member.level_unique_name());
    row.set("LEVEL_NUMBER", member.level_number() as i32);
    row.set("MEMBER_ORDINAL", member.ordinal() as i32);
    row.set("MEMBER_NAME", member.name());
    row.set("MEMBER_UNIQUE_NAME", member.unique_name());
    let member_type = if member.is_all() {
        MDMEMBER_TYPE_ALL
    } else if member.is_calculated() {
        MDMEMBER_TYPE_FORMULA
    } else {
        MDMEMBER_TYPE_REGULAR
    };
    row.set("MEMBER_TYPE", member_type);
    row.set("MEMBER_CAPTION", member.caption());
    row.set("CHILDREN_CARDINALITY", member.child_count() as i32);
    // Pinned estimate; clients only use this to decide whether a member
    // is expandable.
    row.set("CHILDREN_CARDINALITY", 100);
    let parent = member.parent().ok().flatten();
    match &parent {
        Some(p) => {
            row.set("PARENT_LEVEL", p.level_number() as i32);
            row.set("PARENT_UNIQUE_NAME", p.unique_name());
            row.set("PARENT_COUNT", 1);
        }
        None => {
            row.set("PARENT_LEVEL", 0);
            row.set_null("PARENT_UNIQUE_NAME");
            row.set("PARENT_COUNT", 0);
        }
    }
    row.set("DEPTH", member.level_number() as i32);
    row
}

/// TREE_OP expansion rooted at one member. ANCESTORS wins over PARENT,
/// DESCENDANTS over CHILDREN; SIBLINGS emits the other children of the
/// member's parent without recursing.
fn expand_relatives(
    def: &'static RowsetDef,
    names: &Names<'_>,
    cube: &Arc<dyn Cube>,
    member: &Arc<dyn Member>,
    ops: i32,
    emit_invisible: bool,
    rows: &mut Vec<Row>,
) -> Result<()> {
    let visible = |m: &Arc<dyn Member>| m.is_visible() || emit_invisible;

    if ops & tree_op::ANCESTORS != 0 {
        let mut cursor = member.parent()?;
        while let Some(ancestor) = cursor {
            if visible(&ancestor) {
                rows.push(member_row(def, names, &ancestor));
            }
            cursor = ancestor.parent()?;
        }
    } else if ops & tree_op::PARENT != 0 {
        if let Some(parent) = member.parent()? {
            if visible(&parent) {
                rows.push(member_row(def, names, &parent));
            }
        }
    }

    if ops & tree_op::SIBLINGS != 0 {
        let siblings = match member.parent()? {
            Some(parent) => parent.children()?,
            // Root member: its siblings are the other roots.
            None => match cube.lookup_hierarchy(member.hierarchy_unique_name())? {
                Some(hierarchy) => hierarchy.root_members()?,
                None => Vec::new(),
            },
        };
        for sibling in siblings {
            if sibling.unique_name() != member.unique_name() && visible(&sibling) {
                rows.push(member_row(def, names, &sibling));
            }
        }
    }

    if ops & tree_op::SELF != 0 && visible(member) {
        rows.push(member_row(def, names, member));
    }

    if ops & tree_op::DESCENDANTS != 0 {
        emit_descendants(def, names, member, emit_invisible, rows)?;
    } else if ops & tree_op::CHILDREN != 0 {
        for child in member.children()? {
            if visible(&child) {
                rows.push(member_row(def, names, &child));
            }
        }
    }
    Ok(())
}

fn emit_descendants(
    def: &'static RowsetDef,
    names: &Names<'_>,
    member: &Arc<dyn Member>,
    emit_invisible: bool,
    rows: &mut Vec<Row>,
) -> Result<()> {
    for child in member.children()? {
        if child.is_visible() || emit_invisible {
            rows.push(member_row(def, names, &child));
        }
        emit_descendants(def, names, &child, emit_invisible, rows)?;
    }
    Ok(())
}

pub fn properties(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for catalog in catalogs_for(cx, "CATALOG_NAME")? {
        for schema in catalog.schemas()? {
            if !cx.restrictions.passes("SCHEMA_NAME", schema.name()) {
                continue;
            }
            for scope in cube_scopes(cx, &schema, true)? {
                for dimension in scope.dimensions()? {
                    if !cx
                        .restrictions
                        .passes("DIMENSION_UNIQUE_NAME", dimension.unique_name())
                    {
                        continue;
                    }
                    for hierarchy in dimension.hierarchies()? {
                        if !cx
                            .restrictions
                            .passes("HIERARCHY_UNIQUE_NAME", hierarchy.unique_name())
                        {
                            continue;
                        }
                        for level in hierarchy.levels()? {
                            if !cx
                                .restrictions
                                .passes("LEVEL_UNIQUE_NAME", level.unique_name())
                            {
                                continue;
                            }
                            for prop in level.member_properties() {
                                if !cx.restrictions.passes("PROPERTY_NAME", &prop.name) {
                                    continue;
                                }
                                let mut row = def.new_row();
                                row.set("CATALOG_NAME", catalog.name());
                                row.set("SCHEMA_NAME", schema.name());
                                row.set("CUBE_NAME", scope.name());
                                row.set("DIMENSION_UNIQUE_NAME", dimension.unique_name());
                                row.set("HIERARCHY_UNIQUE_NAME", hierarchy.unique_name());
                                row.set("LEVEL_UNIQUE_NAME", level.unique_name());
                                row.set_null("MEMBER_UNIQUE_NAME");
                                row.set("PROPERTY_NAME", prop.name.as_str());
                                // MDPROP_MEMBER.
                                row.set("PROPERTY_TYPE", 1);
                                row.set("PROPERTY_CAPTION", prop.caption.as_str());
                                row.set("DATA_TYPE", dbtype(prop.data_type));
                                row.set("PROPERTY_CONTENT_TYPE", 0);
                                row.set_opt("DESCRIPTION", prop.description.as_deref());
                                rows.push(row);
                            }
                        }
                    }
                }
            }
        }
    }
    finish(def, rows)
}

pub fn sets(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for catalog in catalogs_for(cx, "CATALOG_NAME")? {
        for schema in catalog.schemas()? {
            if !cx.restrictions.passes("SCHEMA_NAME", schema.name()) {
                continue;
            }
            for cube in schema.cubes()? {
                if !cx.restrictions.passes("CUBE_NAME", cube.name()) {
                    continue;
                }
                for set in cube.named_sets()? {
                    if !cx.restrictions.passes("SET_NAME", set.name())
                        || !cx.restrictions.passes("SCOPE", "1")
                    {
                        continue;
                    }
                    let mut row = def.new_row();
                    row.set("CATALOG_NAME", catalog.name());
                    row.set("SCHEMA_NAME", schema.name());
                    row.set("CUBE_NAME", cube.name());
                    row.set("SET_NAME", set.name());
                    row.set("SCOPE", 1);
                    row.set_opt("DESCRIPTION", set.description());
                    row.set("EXPRESSION", set.expression());
                    rows.push(row);
                }
            }
        }
    }
    finish(def, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restrict::{RequestProperties, Restrictions};
    use crate::row::RowValue;
    use crate::rowset::rowset_lookup;
    use olapmeta::memory::fixtures;
    use xmlarepr::Datum;

    fn discover(name: &str, restrictions: Restrictions, props: RequestProperties) -> Vec<Row> {
        let conn = fixtures::sales_connection();
        let def = rowset_lookup(name).unwrap();
        let cx = DiscoverContext {
            conn: &*conn,
            restrictions: &restrictions,
            properties: &props,
        };
        (def.populate)(def, &cx).unwrap()
    }

    fn text(row: &Row, column: &str) -> String {
        match row.get(column) {
            Some(RowValue::Datum(Datum::Text(s))) => s.clone(),
            other => panic!("{column}: unexpected {other:?}"),
        }
    }

    fn members_with_tree_op(start: &str, ops: i32) -> Vec<String> {
        let mut r = Restrictions::new();
        r.set("CUBE_NAME", "SalesGeo");
        r.set("MEMBER_UNIQUE_NAME", start);
        r.set("TREE_OP", ops.to_string());
        let rows = discover("MDSCHEMA_MEMBERS", r, RequestProperties::new());
        rows.iter().map(|row| text(row, "MEMBER_UNIQUE_NAME")).collect()
    }

    #[test]
    fn descendants_and_self_on_root_is_whole_tree() {
        let names =
            members_with_tree_op("[Geo].[All Geos]", tree_op::DESCENDANTS | tree_op::SELF);
        assert_eq!(names.len(), 7);
        assert!(names.contains(&"[Geo].[All Geos]".to_string()));
        assert!(names.contains(&"[Geo].[North].[NE]".to_string()));
    }

    #[test]
    fn siblings_excludes_self() {
        let names = members_with_tree_op("[Geo].[North]", tree_op::SIBLINGS);
        assert_eq!(names, vec!["[Geo].[South]".to_string()]);
    }

    #[test]
    fn ancestors_and_self_on_grandchild() {
        let names =
            members_with_tree_op("[Geo].[North].[NE]", tree_op::ANCESTORS | tree_op::SELF);
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"[Geo].[North]".to_string()));
        assert!(names.contains(&"[Geo].[All Geos]".to_string()));
        assert!(names.contains(&"[Geo].[North].[NE]".to_string()));
    }

    #[test]
    fn ancestors_wins_over_parent() {
        let with_both = members_with_tree_op(
            "[Geo].[North].[NE]",
            tree_op::ANCESTORS | tree_op::PARENT,
        );
        assert_eq!(with_both.len(), 2);
    }

    #[test]
    fn malformed_member_restriction_yields_zero_rows() {
        let mut r = Restrictions::new();
        r.set_list(
            "MEMBER_UNIQUE_NAME",
            vec!["[Geo].[North]".into(), "[Geo].[South]".into()],
        );
        let rows = discover("MDSCHEMA_MEMBERS", r, RequestProperties::new());
        assert!(rows.is_empty());
    }

    #[test]
    fn children_cardinality_is_pinned() {
        let mut r = Restrictions::new();
        r.set("MEMBER_UNIQUE_NAME", "[Geo].[All Geos]");
        let rows = discover("MDSCHEMA_MEMBERS", r, RequestProperties::new());
        assert_eq!(rows.len(), 1);
        match rows[0].get("CHILDREN_CARDINALITY") {
            Some(RowValue::Datum(Datum::Int32(100))) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn level_unique_name_shortcut() {
        let mut r = Restrictions::new();
        r.set("LEVEL_UNIQUE_NAME", "[Geo].[Region]");
        let rows = discover("MDSCHEMA_MEMBERS", r, RequestProperties::new());
        let names: Vec<String> = rows.iter().map(|row| text(row, "MEMBER_UNIQUE_NAME")).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"[Geo].[North]".to_string()));
    }

    #[test]
    fn invisible_members_are_gated() {
        use olapmeta::memory::{
            MemCatalog, MemConnection, MemCube, MemDimension, MemHierarchy, MemLevel, MemMember,
            MemSchema,
        };

        let conn = MemConnection::new(Some("Test"));
        let catalog = MemCatalog::new("Test");
        let schema = MemSchema::new("Test");
        let cube = MemCube::new("Tiny");
        let dim = MemDimension::new("D", olapmeta::DimensionType::Standard, 0);
        let hier = MemHierarchy::new("D", &dim, false);
        let level = MemLevel::new("L", &hier, 0, false);
        hier.add_level(&level);
        dim.add_hierarchy(&hier);
        cube.add_dimension(&dim);
        let shown = MemMember::new("Shown", "[D].[Shown]", 0, &level);
        let hidden = MemMember::new("Hidden", "[D].[Hidden]", 1, &level);
        hidden.set_visible(false);
        level.add_member(&shown);
        level.add_member(&hidden);
        schema.add_cube(&cube);
        catalog.add_schema(&schema);
        conn.add_catalog(&catalog);

        let def = rowset_lookup("MDSCHEMA_MEMBERS").unwrap();
        let restrictions = Restrictions::new();

        let props = RequestProperties::new();
        let cx = DiscoverContext {
            conn: conn.as_ref(),
            restrictions: &restrictions,
            properties: &props,
        };
        let visible = (def.populate)(def, &cx).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(text(&visible[0], "MEMBER_NAME"), "Shown");

        let mut props = RequestProperties::new();
        props.insert("EmitInvisibleMembers", "true");
        let cx = DiscoverContext {
            conn: conn.as_ref(),
            restrictions: &restrictions,
            properties: &props,
        };
        let all = (def.populate)(def, &cx).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn measures_levels_list_only_for_stored() {
        let rows = discover(
            "MDSCHEMA_MEASURES",
            Restrictions::new(),
            RequestProperties::new(),
        );
        assert_eq!(rows.len(), 3);
        for row in &rows {
            let name = text(row, "MEASURE_NAME");
            let has_levels = row.get("LEVELS_LIST").is_some();
            if name == "Profit" {
                assert!(!has_levels, "calculated measure must not carry LEVELS_LIST");
            } else {
                assert!(has_levels, "stored measure {name} should carry LEVELS_LIST");
            }
        }
    }

    #[test]
    fn dimensions_include_shared_pseudo_cube_rows() {
        let rows = discover(
            "MDSCHEMA_DIMENSIONS",
            Restrictions::new(),
            RequestProperties::new(),
        );
        // The sales fixture has no shared dimensions, so every row is a
        // real cube row.
        assert!(rows.iter().all(|r| text(r, "CUBE_NAME") == "SalesGeo"));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn deep_cubes_embed_dimension_tree() {
        let mut props = RequestProperties::new();
        props.insert("Deep", "true");
        let rows = discover("MDSCHEMA_CUBES", Restrictions::new(), props);
        assert_eq!(rows.len(), 1);
        let dims = match rows[0].get("DIMENSIONS") {
            Some(RowValue::Nested(dims)) => dims,
            other => panic!("expected nested dimensions, got {other:?}"),
        };
        assert_eq!(dims.len(), 2);
        let hiers = match dims[0].get("HIERARCHIES") {
            Some(RowValue::Nested(h)) => h,
            other => panic!("expected nested hierarchies, got {other:?}"),
        };
        match hiers[0].get("LEVELS") {
            Some(RowValue::Nested(levels)) => assert_eq!(levels.len(), 3),
            other => panic!("expected nested levels, got {other:?}"),
        }
        assert!(rows[0].get("SETS").is_some());
        assert!(rows[0].get("MEASURES").is_some());
    }

    #[test]
    fn shallow_cubes_do_not_embed() {
        let rows = discover(
            "MDSCHEMA_CUBES",
            Restrictions::new(),
            RequestProperties::new(),
        );
        assert!(rows[0].get("DIMENSIONS").is_none());
    }

    #[test]
    fn sets_rowset_lists_named_sets() {
        let rows = discover(
            "MDSCHEMA_SETS",
            Restrictions::new(),
            RequestProperties::new(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(text(&rows[0], "SET_NAME"), "Top Regions");
    }

    #[test]
    fn properties_rowset_lists_level_properties() {
        let rows = discover(
            "MDSCHEMA_PROPERTIES",
            Restrictions::new(),
            RequestProperties::new(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(text(&rows[0], "PROPERTY_NAME"), "Population");
        assert_eq!(text(&rows[0], "LEVEL_UNIQUE_NAME"), "[Geo].[Area]");
    }

    #[test]
    fn actions_is_always_empty() {
        let rows = discover(
            "MDSCHEMA_ACTIONS",
            Restrictions::new(),
            RequestProperties::new(),
        );
        assert!(rows.is_empty());
    }
}
