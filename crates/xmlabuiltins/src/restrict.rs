//! DISCOVER restrictions and the request property bag.

use std::collections::BTreeMap;

/// Restriction on one rowset column. Multiple values use IN semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restriction {
    Absent,
    Eq(String),
    In(Vec<String>),
}

impl Restriction {
    /// Whether a candidate column value passes this restriction. An
    /// absent restriction passes everything.
    pub fn passes(&self, value: &str) -> bool {
        match self {
            Restriction::Absent => true,
            Restriction::Eq(v) => v == value,
            Restriction::In(vs) => vs.iter().any(|v| v == value),
        }
    }

    /// The single restriction value, when exactly one was supplied.
    /// Used by populators that treat a unique-name restriction as a
    /// direct lookup; any other cardinality falls back to traversal.
    pub fn exactly_one(&self) -> Option<&str> {
        match self {
            Restriction::Eq(v) => Some(v),
            Restriction::In(vs) if vs.len() == 1 => Some(&vs[0]),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Restriction::Absent)
    }
}

/// Restrictions keyed by column name, as parsed from the request.
#[derive(Debug, Clone, Default)]
pub struct Restrictions {
    map: BTreeMap<String, Restriction>,
}

impl Restrictions {
    pub fn new() -> Restrictions {
        Restrictions::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, restriction: Restriction) {
        self.map.insert(column.into(), restriction);
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.insert(column, Restriction::Eq(value.into()));
    }

    pub fn set_list(&mut self, column: impl Into<String>, values: Vec<String>) {
        // A single-element list behaves like Eq; keep the distinction
        // out of the populators.
        let restriction = match values.len() {
            1 => Restriction::Eq(values.into_iter().next().unwrap_or_default()),
            _ => Restriction::In(values),
        };
        self.insert(column, restriction);
    }

    pub fn get(&self, column: &str) -> &Restriction {
        self.map.get(column).unwrap_or(&Restriction::Absent)
    }

    pub fn passes(&self, column: &str, value: &str) -> bool {
        self.get(column).passes(value)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(|k| k.as_str())
    }
}

/// Request properties keyed by name, with typed accessors for the
/// properties the populators consult.
#[derive(Debug, Clone, Default)]
pub struct RequestProperties {
    map: BTreeMap<String, String>,
}

impl RequestProperties {
    pub fn new() -> RequestProperties {
        RequestProperties::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.map.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(|v| v.as_str())
    }

    fn bool_prop(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    pub fn catalog(&self) -> Option<&str> {
        self.get("Catalog").filter(|v| !v.is_empty())
    }

    pub fn deep(&self) -> bool {
        self.bool_prop("Deep")
    }

    pub fn emit_invisible_members(&self) -> bool {
        self.bool_prop("EmitInvisibleMembers")
    }

    pub fn show_hidden_cubes(&self) -> bool {
        self.bool_prop("ShowHiddenCubes")
    }

    pub fn advanced_flag(&self) -> bool {
        self.bool_prop("AdvancedFlag")
    }

    pub fn table_fields(&self) -> Option<&str> {
        self.get("TableFields").filter(|v| !v.is_empty())
    }

    pub fn maximum_rows(&self) -> Option<usize> {
        self.get("MaximumRows").and_then(|v| v.parse().ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_semantics() {
        let r = Restriction::In(vec!["A".into(), "B".into()]);
        assert!(r.passes("A"));
        assert!(r.passes("B"));
        assert!(!r.passes("C"));
        assert!(Restriction::Absent.passes("anything"));
    }

    #[test]
    fn exactly_one_cardinality() {
        assert_eq!(Restriction::Eq("X".into()).exactly_one(), Some("X"));
        assert_eq!(
            Restriction::In(vec!["X".into()]).exactly_one(),
            Some("X")
        );
        assert_eq!(
            Restriction::In(vec!["X".into(), "Y".into()]).exactly_one(),
            None
        );
        assert_eq!(Restriction::Absent.exactly_one(), None);
    }

    #[test]
    fn single_element_list_collapses_to_eq() {
        let mut rs = Restrictions::new();
        rs.set_list("CUBE_NAME", vec!["Sales".into()]);
        assert_eq!(rs.get("CUBE_NAME"), &Restriction::Eq("Sales".into()));
    }

    #[test]
    fn absent_columns_pass() {
        let rs = Restrictions::new();
        assert!(rs.passes("CATALOG_NAME", "FoodMart"));
    }

    #[test]
    fn typed_property_accessors() {
        let mut props = RequestProperties::new();
        props.insert("Deep", "True");
        props.insert("Catalog", "");
        props.insert("MaximumRows", "100");
        assert!(props.deep());
        assert!(!props.emit_invisible_members());
        assert_eq!(props.catalog(), None);
        assert_eq!(props.maximum_rows(), Some(100));
    }
}
