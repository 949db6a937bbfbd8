//! The XMLA connection/command property catalog.
//!
//! Consulted when validating incoming request properties and when
//! answering DISCOVER_PROPERTIES. Built once; read-only afterwards.

use once_cell::sync::Lazy;

use crate::column::{ColumnType, validate_description};
use crate::enums::{ACCESS, Enumeration, VISUAL_MODE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Read => "Read",
            Access::Write => "Write",
            Access::ReadWrite => "ReadWrite",
        }
    }
}

/// Set of protocol methods a property applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSet(u8);

impl MethodSet {
    pub const DISCOVER: MethodSet = MethodSet(1);
    pub const EXECUTE: MethodSet = MethodSet(2);
    pub const BOTH: MethodSet = MethodSet(3);

    pub fn contains(&self, other: MethodSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn as_str(&self) -> &'static str {
        match self.0 {
            1 => "Discover",
            2 => "Execute",
            _ => "Discover, Execute",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub enumeration: Option<&'static Enumeration>,
    pub access: Access,
    pub methods: MethodSet,
    /// Default value; current value when the request does not set it.
    pub value: &'static str,
    pub description: &'static str,
}

const fn prop(
    name: &'static str,
    ty: ColumnType,
    access: Access,
    methods: MethodSet,
    value: &'static str,
    description: &'static str,
) -> PropertyDef {
    PropertyDef {
        name,
        ty,
        enumeration: None,
        access,
        methods,
        value,
        description,
    }
}

static PROPERTY_DEFS: Lazy<Vec<PropertyDef>> = Lazy::new(|| {
    use Access::*;
    use ColumnType::*;

    let defs = vec![
        prop(
            "AdvancedFlag",
            Boolean,
            ReadWrite,
            MethodSet::BOTH,
            "false",
            "Indicates that drill through should return a leading total-count row",
        ),
        prop(
            "AxisFormat",
            String,
            Write,
            MethodSet::EXECUTE,
            "",
            "Determines the format used within an MDDataSet result set to describe the axes of the multidimensional dataset",
        ),
        prop(
            "BeginRange",
            Integer,
            Write,
            MethodSet::EXECUTE,
            "-1",
            "Together with the EndRange property, forms a range of cells to be returned",
        ),
        prop(
            "Catalog",
            String,
            ReadWrite,
            MethodSet::BOTH,
            "",
            "Specifies the initial catalog or database on which to operate",
        ),
        prop(
            "Content",
            EnumString,
            Write,
            MethodSet::BOTH,
            "SchemaData",
            "An enumerator that specifies what type of data is returned in the result set",
        ),
        prop(
            "Cube",
            String,
            ReadWrite,
            MethodSet::BOTH,
            "",
            "The cube context for the Command parameter",
        ),
        prop(
            "DataSourceInfo",
            String,
            ReadWrite,
            MethodSet::BOTH,
            "",
            "A string containing provider specific information, required to access the data source",
        ),
        prop(
            "Deep",
            Boolean,
            Write,
            MethodSet::DISCOVER,
            "",
            "Expands a cube row with nested dimension, hierarchy and level rowsets",
        ),
        prop(
            "EmitInvisibleMembers",
            Boolean,
            Write,
            MethodSet::DISCOVER,
            "",
            "Set to true to include members and measures marked invisible in schema rowsets",
        ),
        prop(
            "EndRange",
            Integer,
            Write,
            MethodSet::EXECUTE,
            "-1",
            "Together with the BeginRange property, forms a range of cells to be returned",
        ),
        prop(
            "Format",
            EnumString,
            Write,
            MethodSet::BOTH,
            "Native",
            "Enumerator that determines the format of the returned result set",
        ),
        prop(
            "LocaleIdentifier",
            UnsignedInteger,
            ReadWrite,
            MethodSet::BOTH,
            "None",
            "Use this to read or set the numeric locale identifier for this request",
        ),
        prop(
            "MdxSupport",
            EnumString,
            Read,
            MethodSet::BOTH,
            "Core",
            "Enumeration that describes the degree of MDX support",
        ),
        prop(
            "Password",
            String,
            ReadWrite,
            MethodSet::BOTH,
            "",
            "This property is ignored",
        ),
        prop(
            "ProviderName",
            String,
            Read,
            MethodSet::BOTH,
            "Cuboid XML for Analysis Provider",
            "The XML for Analysis provider name",
        ),
        prop(
            "ProviderVersion",
            String,
            Read,
            MethodSet::BOTH,
            env!("CARGO_PKG_VERSION"),
            "The version of the XML for Analysis provider",
        ),
        prop(
            "ResponseMimeType",
            String,
            ReadWrite,
            MethodSet::BOTH,
            "None",
            "Accepted mime type for RPC response; accepted are 'text/xml' (default), 'application/xml' and 'application/json'",
        ),
        prop(
            "SafetyOptions",
            String,
            ReadWrite,
            MethodSet::BOTH,
            "",
            "Determines whether unsafe libraries can be registered and loaded by clients",
        ),
        prop(
            "StateSupport",
            EnumString,
            Read,
            MethodSet::BOTH,
            "None",
            "Property that specifies the degree of support in the provider for state",
        ),
        prop(
            "TableFields",
            String,
            ReadWrite,
            MethodSet::BOTH,
            "",
            "List of fields to return for drill through; default is to return all fields",
        ),
        prop(
            "Timeout",
            UnsignedInteger,
            ReadWrite,
            MethodSet::BOTH,
            "Undefined",
            "A numeric time-out specifying in seconds the amount of time to wait for a request to be successful",
        ),
        prop(
            "UserName",
            String,
            Read,
            MethodSet::BOTH,
            "",
            "Returns the UserName the server associates with the command",
        ),
        prop(
            "DBMSVersion",
            String,
            Read,
            MethodSet::BOTH,
            env!("CARGO_PKG_VERSION"),
            "The version of the database serving the data",
        ),
        prop(
            "ProviderType",
            EnumString,
            Read,
            MethodSet::DISCOVER,
            "MDP",
            "The types of data supported by the provider",
        ),
        prop(
            "ShowHiddenCubes",
            Boolean,
            Write,
            MethodSet::DISCOVER,
            "false",
            "Set to true to get private cubes listed in schema rowsets",
        ),
        prop(
            "SqlSupport",
            Integer,
            Read,
            MethodSet::BOTH,
            "0",
            "A bitmask detailing the SQL capabilities of the provider",
        ),
        prop(
            "TransactionDDL",
            Integer,
            Read,
            MethodSet::BOTH,
            "0",
            "Indicates whether the provider supports data definition statements within transactions",
        ),
        prop(
            "MaximumRows",
            UnsignedInteger,
            Write,
            MethodSet::EXECUTE,
            "",
            "Limits the number of rows returned by a drill through statement",
        ),
        prop(
            "Roles",
            String,
            ReadWrite,
            MethodSet::BOTH,
            "",
            "A comma delimited list of roles to which the current user belongs",
        ),
        prop(
            "EffectiveRoles",
            String,
            Write,
            MethodSet::BOTH,
            "",
            "A comma delimited list of roles the request executes under",
        ),
        prop(
            "EffectiveUserName",
            String,
            Write,
            MethodSet::BOTH,
            "",
            "The user name the request executes under when impersonation is in effect",
        ),
        prop(
            "MdpropMdxSubqueries",
            Integer,
            ReadWrite,
            MethodSet::BOTH,
            "15",
            "A bitmask detailing the level of support for subqueries in MDX",
        ),
        prop(
            "JsonRequest",
            Boolean,
            Write,
            MethodSet::BOTH,
            "false",
            "Set to true when the request body was delivered as JSON rather than XML",
        ),
    ];

    let mut defs = defs;
    defs.push(PropertyDef {
        name: "VisualMode",
        ty: ColumnType::Enumeration,
        enumeration: Some(&VISUAL_MODE),
        access: Access::Write,
        methods: MethodSet::BOTH,
        value: "0",
        description: "This property determines the default behavior for visual totals",
    });

    for def in &defs {
        if let Err(e) = validate_description(def.description) {
            panic!("property {}: {}", def.name, e);
        }
        if let Err(e) = validate_description(def.value) {
            panic!("property {} default: {}", def.name, e);
        }
    }
    // ACCESS backs the PropertyAccessType column; keep it reachable from
    // the catalog so DISCOVER_ENUMERATORS always lists it.
    debug_assert!(ACCESS.value_of("ReadWrite").is_some());
    defs
});

pub fn property_defs() -> &'static [PropertyDef] {
    &PROPERTY_DEFS
}

pub fn property_lookup(name: &str) -> Option<&'static PropertyDef> {
    PROPERTY_DEFS.iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_populated() {
        assert!(property_defs().len() >= 30);
        assert!(property_lookup("Format").is_some());
        assert!(property_lookup("format").is_none());
    }

    #[test]
    fn defaults_are_cr_free() {
        for def in property_defs() {
            assert!(!def.value.contains('\r'), "{}", def.name);
            assert!(!def.description.contains('\r'), "{}", def.name);
        }
    }

    #[test]
    fn method_sets() {
        assert!(MethodSet::BOTH.contains(MethodSet::DISCOVER));
        assert!(MethodSet::BOTH.contains(MethodSet::EXECUTE));
        assert!(!MethodSet::DISCOVER.contains(MethodSet::EXECUTE));
        assert_eq!(MethodSet::EXECUTE.as_str(), "Execute");
    }
}
