//! Populators for the DBSCHEMA_* rowsets, which expose cubes and
//! dimensions through a relational lens.

use xmlarepr::Datum;

use crate::errors::Result;
use crate::row::Row;
use crate::rowset::{DiscoverContext, RowsetDef};

use super::{catalogs_for, finish};

// OLE DB DBTYPE codes used in DATA_TYPE columns.
const DBTYPE_R8: i32 = 5;
const DBTYPE_BOOL: i32 = 11;
const DBTYPE_I2: i32 = 2;
const DBTYPE_I4: i32 = 3;
const DBTYPE_I8: i32 = 20;
const DBTYPE_WSTR: i32 = 130;

pub fn catalogs(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for catalog in catalogs_for(cx, "CATALOG_NAME")? {
        let mut row = def.new_row();
        row.set("CATALOG_NAME", catalog.name());
        row.set_null("DESCRIPTION");
        match cx.properties.get("Roles") {
            Some(roles) if !roles.is_empty() => row.set("ROLES", roles),
            _ => row.set_null("ROLES"),
        }
        rows.push(row);
    }
    finish(def, rows)
}

pub fn columns(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for catalog in catalogs_for(cx, "TABLE_CATALOG")? {
        for schema in catalog.schemas()? {
            if !cx.restrictions.passes("TABLE_SCHEMA", schema.name()) {
                continue;
            }
            for cube in schema.cubes()? {
                if !cx.restrictions.passes("TABLE_NAME", cube.name()) {
                    continue;
                }
                let mut ordinal = 0u32;
                for dimension in cube.dimensions()? {
                    for hierarchy in dimension.hierarchies()? {
                        for level in hierarchy.levels()? {
                            if level.is_all() {
                                continue;
                            }
                            ordinal += 1;
                            let column_name =
                                format!("{}:{}", hierarchy.name(), level.name());
                            if !cx.restrictions.passes("COLUMN_NAME", &column_name) {
                                continue;
                            }
                            let mut row = def.new_row();
                            row.set("TABLE_CATALOG", catalog.name());
                            row.set("TABLE_SCHEMA", schema.name());
                            row.set("TABLE_NAME", cube.name());
                            row.set("COLUMN_NAME", column_name);
                            row.set("ORDINAL_POSITION", ordinal as i32);
                            row.set("COLUMN_HAS_DEFAULT", false);
                            row.set("COLUMN_FLAGS", 0);
                            row.set("IS_NULLABLE", false);
                            row.set("DATA_TYPE", DBTYPE_WSTR);
                            row.set("CHARACTER_MAXIMUM_LENGTH", 0);
                            row.set("CHARACTER_OCTET_LENGTH", 0);
                            rows.push(row);
                        }
                    }
                }
                for measure in cube.measures()? {
                    if !measure.is_visible() && !cx.properties.emit_invisible_members() {
                        continue;
                    }
                    ordinal += 1;
                    let column_name = format!("Measures:{}", measure.name());
                    if !cx.restrictions.passes("COLUMN_NAME", &column_name) {
                        continue;
                    }
                    let mut row = def.new_row();
                    row.set("TABLE_CATALOG", catalog.name());
                    row.set("TABLE_SCHEMA", schema.name());
                    row.set("TABLE_NAME", cube.name());
                    row.set("COLUMN_NAME", column_name);
                    row.set("ORDINAL_POSITION", ordinal as i32);
                    row.set("COLUMN_HAS_DEFAULT", false);
                    row.set("COLUMN_FLAGS", 0);
                    row.set("IS_NULLABLE", false);
                    row.set("DATA_TYPE", DBTYPE_R8);
                    // Per the OLE DB spec: precision of a double, scale
                    // marker for "not applicable".
                    row.set("NUMERIC_PRECISION", 16);
                    row.set("NUMERIC_SCALE", 255);
                    rows.push(row);
                }
            }
        }
    }
    finish(def, rows)
}

struct ProviderType {
    name: &'static str,
    data_type: i32,
    column_size: i32,
    unsigned: Option<bool>,
    fixed_prec_scale: bool,
}

static PROVIDER_TYPES: &[ProviderType] = &[
    ProviderType { name: "I2", data_type: DBTYPE_I2, column_size: 5, unsigned: Some(false), fixed_prec_scale: false },
    ProviderType { name: "I4", data_type: DBTYPE_I4, column_size: 10, unsigned: Some(false), fixed_prec_scale: false },
    ProviderType { name: "R8", data_type: DBTYPE_R8, column_size: 17, unsigned: Some(false), fixed_prec_scale: false },
    ProviderType { name: "BOOL", data_type: DBTYPE_BOOL, column_size: 1, unsigned: None, fixed_prec_scale: false },
    ProviderType { name: "I8", data_type: DBTYPE_I8, column_size: 20, unsigned: Some(false), fixed_prec_scale: false },
    ProviderType { name: "WSTR", data_type: DBTYPE_WSTR, column_size: 255, unsigned: None, fixed_prec_scale: false },
];

pub fn provider_types(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for pt in PROVIDER_TYPES {
        if !cx
            .restrictions
            .passes("DATA_TYPE", &pt.data_type.to_string())
        {
            continue;
        }
        if !cx.restrictions.passes("BEST_MATCH", "true") {
            continue;
        }
        let mut row = def.new_row();
        row.set("TYPE_NAME", pt.name);
        row.set("DATA_TYPE", pt.data_type);
        row.set("COLUMN_SIZE", pt.column_size);
        row.set_null("LITERAL_PREFIX");
        row.set_null("LITERAL_SUFFIX");
        row.set("IS_NULLABLE", true);
        row.set("CASE_SENSITIVE", pt.data_type == DBTYPE_WSTR);
        row.set("SEARCHABLE", 0);
        match pt.unsigned {
            Some(u) => row.set("UNSIGNED_ATTRIBUTE", u),
            None => row.set_null("UNSIGNED_ATTRIBUTE"),
        }
        row.set("FIXED_PREC_SCALE", pt.fixed_prec_scale);
        row.set("AUTO_UNIQUE_VALUE", false);
        row.set("BEST_MATCH", true);
        rows.push(row);
    }
    finish(def, rows)
}

pub fn schemata(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for catalog in catalogs_for(cx, "CATALOG_NAME")? {
        for schema in catalog.schemas()? {
            if !cx.restrictions.passes("SCHEMA_NAME", schema.name()) {
                continue;
            }
            let mut row = def.new_row();
            row.set("CATALOG_NAME", catalog.name());
            row.set("SCHEMA_NAME", schema.name());
            row.set_null("SCHEMA_OWNER");
            rows.push(row);
        }
    }
    finish(def, rows)
}

pub fn tables(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for catalog in catalogs_for(cx, "TABLE_CATALOG")? {
        for schema in catalog.schemas()? {
            if !cx.restrictions.passes("TABLE_SCHEMA", schema.name()) {
                continue;
            }
            for cube in schema.cubes()? {
                if cx.restrictions.passes("TABLE_NAME", cube.name())
                    && cx.restrictions.passes("TABLE_TYPE", "TABLE")
                {
                    let mut row = def.new_row();
                    row.set("TABLE_CATALOG", catalog.name());
                    row.set("TABLE_SCHEMA", schema.name());
                    row.set("TABLE_NAME", cube.name());
                    row.set("TABLE_TYPE", "TABLE");
                    row.set(
                        "DESCRIPTION",
                        format!("{} - {} Cube", catalog.name(), cube.name()),
                    );
                    if let Some(modified) = cube.last_modified() {
                        row.set("DATE_MODIFIED", Datum::DateTime(modified));
                    }
                    rows.push(row);
                }
                if !cx.restrictions.passes("TABLE_TYPE", "SYSTEM TABLE") {
                    continue;
                }
                for dimension in cube.dimensions()? {
                    for hierarchy in dimension.hierarchies()? {
                        for level in hierarchy.levels()? {
                            if level.is_all() {
                                continue;
                            }
                            let table_name = format!(
                                "{}:{}:{}",
                                cube.name(),
                                hierarchy.name(),
                                level.name()
                            );
                            if !cx.restrictions.passes("TABLE_NAME", &table_name) {
                                continue;
                            }
                            let mut row = def.new_row();
                            row.set("TABLE_CATALOG", catalog.name());
                            row.set("TABLE_SCHEMA", schema.name());
                            row.set("TABLE_NAME", table_name);
                            row.set("TABLE_TYPE", "SYSTEM TABLE");
                            row.set(
                                "DESCRIPTION",
                                format!(
                                    "{} - {} Cube - {} Level",
                                    catalog.name(),
                                    cube.name(),
                                    level.name()
                                ),
                            );
                            if let Some(modified) = cube.last_modified() {
                                row.set("DATE_MODIFIED", Datum::DateTime(modified));
                            }
                            rows.push(row);
                        }
                    }
                }
            }
        }
    }
    finish(def, rows)
}

pub fn tables_info(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for catalog in catalogs_for(cx, "TABLE_CATALOG")? {
        for schema in catalog.schemas()? {
            if !cx.restrictions.passes("TABLE_SCHEMA", schema.name()) {
                continue;
            }
            for cube in schema.cubes()? {
                if !cx.restrictions.passes("TABLE_NAME", cube.name())
                    || !cx.restrictions.passes("TABLE_TYPE", "TABLE")
                {
                    continue;
                }
                // Cardinality estimate: sum of leaf-level cardinalities.
                let mut cardinality = 0usize;
                for dimension in cube.dimensions()? {
                    for hierarchy in dimension.hierarchies()? {
                        if let Some(leaf) = hierarchy.levels()?.last() {
                            cardinality += leaf.cardinality();
                        }
                    }
                }
                let mut row = def.new_row();
                row.set("TABLE_CATALOG", catalog.name());
                row.set("TABLE_SCHEMA", schema.name());
                row.set("TABLE_NAME", cube.name());
                row.set("TABLE_TYPE", "TABLE");
                row.set("BOOKMARKS", false);
                row.set("CARDINALITY", cardinality as i64);
                row.set_null("DESCRIPTION");
                row.set_null("TABLE_PROPID");
                rows.push(row);
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

    fn discover(name: &str, restrictions: Restrictions) -> Vec<Row> {
        let conn = fixtures::sales_connection();
        let def = rowset_lookup(name).unwrap();
        let props = RequestProperties::new();
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

    #[test]
    fn catalogs_lists_foodmart() {
        let rows = discover("DBSCHEMA_CATALOGS", Restrictions::new());
        assert_eq!(rows.len(), 1);
        assert_eq!(text(&rows[0], "CATALOG_NAME"), "FoodMart");
    }

    #[test]
    fn tables_split_cubes_and_levels_by_type() {
        let mut r = Restrictions::new();
        r.set("TABLE_TYPE", "TABLE");
        let cube_rows = discover("DBSCHEMA_TABLES", r);
        assert!(cube_rows.iter().all(|t| text(t, "TABLE_TYPE") == "TABLE"));
        assert_eq!(cube_rows.len(), 1);

        let mut r = Restrictions::new();
        r.set("TABLE_TYPE", "SYSTEM TABLE");
        let level_rows = discover("DBSCHEMA_TABLES", r);
        assert!(!level_rows.is_empty());
        assert!(
            level_rows
                .iter()
                .all(|t| text(t, "TABLE_TYPE") == "SYSTEM TABLE")
        );
    }

    #[test]
    fn columns_cover_levels_and_measures() {
        let rows = discover("DBSCHEMA_COLUMNS", Restrictions::new());
        let names: Vec<String> = rows.iter().map(|r| text(r, "COLUMN_NAME")).collect();
        assert!(names.iter().any(|n| n.starts_with("Measures:")));
        assert!(names.iter().any(|n| n.contains(':') && !n.starts_with("Measures:")));
    }

    #[test]
    fn provider_types_restrictable_by_data_type() {
        let mut r = Restrictions::new();
        r.set("DATA_TYPE", DBTYPE_R8.to_string());
        let rows = discover("DBSCHEMA_PROVIDER_TYPES", r);
        assert_eq!(rows.len(), 1);
        assert_eq!(text(&rows[0], "TYPE_NAME"), "R8");
    }
}
