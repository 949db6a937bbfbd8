//! Populators for the DISCOVER_* rowsets. These answer from the static
//! registries; only DISCOVER_DATASOURCES touches the connection.

use crate::enums::Enumeration;
use crate::errors::Result;
use crate::properties::property_defs;
use crate::row::{Row, RowValue};
use crate::rowset::{DiscoverContext, RowsetDef, rowset_defs};

use super::finish;

pub fn datasources(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for catalog in cx.conn.catalogs()? {
        if !cx.restrictions.passes("DataSourceName", catalog.name()) {
            continue;
        }
        let mut row = def.new_row();
        row.set("DataSourceName", catalog.name());
        row.set(
            "DataSourceDescription",
            format!("{} data source on this server", catalog.name()),
        );
        row.set("URL", "xmla");
        row.set(
            "DataSourceInfo",
            format!("Provider=Cuboid;DataSource={}", catalog.name()),
        );
        row.set("ProviderName", "Cuboid");
        row.set("ProviderType", RowValue::StrList(vec!["MDP".to_string()]));
        row.set("AuthenticationMode", "Unauthenticated");
        rows.push(row);
    }
    finish(def, rows)
}

pub fn schema_rowsets(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let nested = def
        .column("Restrictions")
        .map(|c| c.nested.as_slice())
        .unwrap_or(&[]);
    let mut rows = Vec::new();
    for rowset in rowset_defs() {
        if !cx.restrictions.passes("SchemaName", rowset.name) {
            continue;
        }
        let mut row = def.new_row();
        row.set("SchemaName", rowset.name);
        let restrictions: Vec<Row> = rowset
            .restriction_columns()
            .map(|c| {
                let mut r = Row::new(nested);
                r.set("Name", c.name);
                r.set(
                    "Type",
                    c.ty.xsd_type()
                        .map(|t| t.as_str())
                        .unwrap_or("xsd:string"),
                );
                r
            })
            .collect();
        if !restrictions.is_empty() {
            row.set("Restrictions", RowValue::Nested(restrictions));
        }
        row.set("Description", rowset.description);
        rows.push(row);
    }
    finish(def, rows)
}

pub fn enumerators(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for e in Enumeration::all() {
        if !cx.restrictions.passes("EnumName", e.name) {
            continue;
        }
        for v in e.values {
            let mut row = def.new_row();
            row.set("EnumName", e.name);
            row.set("EnumDescription", e.description);
            row.set("EnumType", e.value_type);
            row.set("ElementName", v.name);
            row.set_opt("ElementDescription", v.description);
            row.set("ElementValue", v.ordinal.to_string());
            rows.push(row);
        }
    }
    finish(def, rows)
}

pub fn properties(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for prop in property_defs() {
        if !cx.restrictions.passes("PropertyName", prop.name) {
            continue;
        }
        let mut row = def.new_row();
        row.set("PropertyName", prop.name);
        row.set("PropertyDescription", prop.description);
        row.set(
            "PropertyType",
            prop.ty.xsd_type().map(|t| t.as_str()).unwrap_or("xsd:string"),
        );
        row.set("PropertyAccessType", prop.access.as_str());
        row.set("IsRequired", false);
        // Request-supplied value wins over the catalog default.
        let value = cx.properties.get(prop.name).unwrap_or(prop.value);
        if !value.is_empty() {
            row.set("Value", value);
        }
        rows.push(row);
    }
    finish(def, rows)
}

/// Words reserved by the MDX grammar.
const KEYWORDS: &[&str] = &[
    "AND", "AS", "ASC", "AXIS", "CASE", "CELL", "CHAPTERS", "COLUMNS", "CREATE", "CROSSJOIN",
    "DESC", "DIMENSION", "DISTINCT", "DRILLTHROUGH", "ELSE", "EMPTY", "END", "FILTER", "FIRST",
    "FROM", "HIERARCHY", "IN", "IS", "LAST", "MAXROWS", "MEMBER", "MEMBERS", "NON", "NOT",
    "NULL", "ON", "OR", "PAGES", "PARENT", "PROPERTIES", "RETURN", "ROWS", "SECTIONS", "SELECT",
    "SET", "THEN", "WHEN", "WHERE", "WITH", "XOR",
];

pub fn keywords(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for kw in KEYWORDS {
        if !cx.restrictions.passes("Keyword", kw) {
            continue;
        }
        let mut row = def.new_row();
        row.set("Keyword", *kw);
        rows.push(row);
    }
    finish(def, rows)
}

struct Literal {
    name: &'static str,
    value: Option<&'static str>,
    invalid_chars: Option<&'static str>,
    invalid_starting_chars: Option<&'static str>,
    max_length: i32,
}

const fn lit(name: &'static str, max_length: i32) -> Literal {
    Literal {
        name,
        value: None,
        invalid_chars: Some("."),
        invalid_starting_chars: None,
        max_length,
    }
}

static LITERALS: &[Literal] = &[
    lit("DBLITERAL_CATALOG_NAME", 24),
    Literal {
        name: "DBLITERAL_CATALOG_SEPARATOR",
        value: Some("."),
        invalid_chars: None,
        invalid_starting_chars: None,
        max_length: 0,
    },
    lit("DBLITERAL_COLUMN_ALIAS", -1),
    lit("DBLITERAL_COLUMN_NAME", -1),
    lit("DBLITERAL_CORRELATION_NAME", -1),
    lit("DBLITERAL_CUBE_NAME", -1),
    lit("DBLITERAL_DIMENSION_NAME", -1),
    lit("DBLITERAL_HIERARCHY_NAME", -1),
    lit("DBLITERAL_LEVEL_NAME", -1),
    lit("DBLITERAL_MEMBER_NAME", -1),
    lit("DBLITERAL_PROCEDURE_NAME", -1),
    lit("DBLITERAL_PROPERTY_NAME", -1),
    Literal {
        name: "DBLITERAL_QUOTE_PREFIX",
        value: Some("["),
        invalid_chars: None,
        invalid_starting_chars: None,
        max_length: -1,
    },
    Literal {
        name: "DBLITERAL_QUOTE_SUFFIX",
        value: Some("]"),
        invalid_chars: None,
        invalid_starting_chars: None,
        max_length: -1,
    },
    lit("DBLITERAL_TABLE_NAME", -1),
    Literal {
        name: "DBLITERAL_TEXT_COMMAND",
        value: None,
        invalid_chars: None,
        invalid_starting_chars: None,
        max_length: -1,
    },
    lit("DBLITERAL_USER_NAME", 0),
];

pub fn literals(def: &'static RowsetDef, cx: &DiscoverContext<'_>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for l in LITERALS {
        if !cx.restrictions.passes("LiteralName", l.name) {
            continue;
        }
        let mut row = def.new_row();
        row.set("LiteralName", l.name);
        row.set_opt("LiteralValue", l.value);
        row.set_opt("LiteralInvalidChars", l.invalid_chars);
        row.set_opt("LiteralInvalidStartingChars", l.invalid_starting_chars);
        row.set("LiteralMaxLength", l.max_length);
        rows.push(row);
    }
    finish(def, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restrict::{RequestProperties, Restrictions};
    use crate::rowset::rowset_lookup;
    use olapmeta::memory::fixtures;

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

    #[test]
    fn properties_rowset_returns_catalog_with_is_required_false() {
        let rows = discover(
            "DISCOVER_PROPERTIES",
            Restrictions::new(),
            RequestProperties::new(),
        );
        assert_eq!(rows.len(), property_defs().len());
        for row in &rows {
            match row.get("IsRequired") {
                Some(RowValue::Datum(xmlarepr::Datum::Bool(false))) => {}
                other => panic!("IsRequired should be false, got {other:?}"),
            }
        }
    }

    #[test]
    fn properties_rowset_honors_restriction() {
        let mut r = Restrictions::new();
        r.set("PropertyName", "Format");
        let rows = discover("DISCOVER_PROPERTIES", r, RequestProperties::new());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn schema_rowsets_nest_restriction_columns() {
        let mut r = Restrictions::new();
        r.set("SchemaName", "MDSCHEMA_MEMBERS");
        let rows = discover("DISCOVER_SCHEMA_ROWSETS", r, RequestProperties::new());
        assert_eq!(rows.len(), 1);
        match rows[0].get("Restrictions") {
            Some(RowValue::Nested(nested)) => {
                let members = rowset_lookup("MDSCHEMA_MEMBERS").unwrap();
                assert_eq!(nested.len(), members.restriction_columns().count());
            }
            other => panic!("expected nested restrictions, got {other:?}"),
        }
    }

    #[test]
    fn enumerators_cover_tree_op() {
        let mut r = Restrictions::new();
        r.set("EnumName", "TreeOp");
        let rows = discover("DISCOVER_ENUMERATORS", r, RequestProperties::new());
        assert_eq!(rows.len(), 6);
    }

    #[test]
    fn datasources_sorted_by_name() {
        let rows = discover(
            "DISCOVER_DATASOURCES",
            Restrictions::new(),
            RequestProperties::new(),
        );
        assert!(!rows.is_empty());
        let names: Vec<String> = rows
            .iter()
            .map(|r| match r.get("DataSourceName") {
                Some(RowValue::Datum(xmlarepr::Datum::Text(s))) => s.clone(),
                other => panic!("unexpected: {other:?}"),
            })
            .collect();
        let mut sorted = names.clone();
        sorted.sort_by_key(|n| n.to_lowercase());
        assert_eq!(names, sorted);
    }
}
