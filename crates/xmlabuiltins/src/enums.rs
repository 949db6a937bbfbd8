//! Fixed enumerations backing enum-typed columns and properties.
//!
//! These answer DISCOVER_ENUMERATORS and validate incoming restriction
//! and property values.

#[derive(Debug, Clone, Copy)]
pub struct EnumValue {
    pub name: &'static str,
    pub ordinal: i32,
    pub description: Option<&'static str>,
}

const fn val(name: &'static str, ordinal: i32) -> EnumValue {
    EnumValue {
        name,
        ordinal,
        description: None,
    }
}

#[derive(Debug)]
pub struct Enumeration {
    pub name: &'static str,
    pub description: &'static str,
    /// Wire type of the element values.
    pub value_type: &'static str,
    pub values: &'static [EnumValue],
}

impl Enumeration {
    pub fn value_of(&self, name: &str) -> Option<&'static EnumValue> {
        self.values.iter().find(|v| v.name == name)
    }

    pub fn ordinal_of(&self, name: &str) -> Option<i32> {
        self.value_of(name).map(|v| v.ordinal)
    }

    pub fn all() -> [&'static Enumeration; 6] {
        [
            &TREE_OP,
            &VISUAL_MODE,
            &METHODS,
            &ACCESS,
            &AUTHENTICATION_MODE,
            &PROVIDER_TYPE,
        ]
    }
}

/// Bitmask selecting which relatives of a member to return.
pub static TREE_OP: Enumeration = Enumeration {
    name: "TreeOp",
    description: "Bitmap which controls which relatives of a member are returned",
    value_type: "integer",
    values: &[
        val("MDTREEOP_CHILDREN", 1),
        val("MDTREEOP_SIBLINGS", 2),
        val("MDTREEOP_PARENT", 4),
        val("MDTREEOP_SELF", 8),
        val("MDTREEOP_DESCENDANTS", 16),
        val("MDTREEOP_ANCESTORS", 32),
    ],
};

pub mod tree_op {
    pub const CHILDREN: i32 = 1;
    pub const SIBLINGS: i32 = 2;
    pub const PARENT: i32 = 4;
    pub const SELF: i32 = 8;
    pub const DESCENDANTS: i32 = 16;
    pub const ANCESTORS: i32 = 32;
}

pub static VISUAL_MODE: Enumeration = Enumeration {
    name: "VisualMode",
    description: "This property determines the default behavior for visual totals",
    value_type: "integer",
    values: &[
        val("DBPROPVAL_VISUAL_MODE_DEFAULT", 0),
        val("DBPROPVAL_VISUAL_MODE_VISUAL", 1),
        val("DBPROPVAL_VISUAL_MODE_ORIGINAL", 2),
    ],
};

pub static METHODS: Enumeration = Enumeration {
    name: "Methods",
    description: "Set of methods for which a property is applicable",
    value_type: "string",
    values: &[val("Discover", 1), val("Execute", 2)],
};

pub static ACCESS: Enumeration = Enumeration {
    name: "Access",
    description: "The read/write behavior of a property",
    value_type: "string",
    values: &[val("Read", 1), val("Write", 2), val("ReadWrite", 3)],
};

pub static AUTHENTICATION_MODE: Enumeration = Enumeration {
    name: "AuthenticationMode",
    description: "Specification of what type of security mode the data source uses",
    value_type: "string",
    values: &[
        val("Unauthenticated", 0),
        val("Authenticated", 1),
        val("Integrated", 2),
    ],
};

pub static PROVIDER_TYPE: Enumeration = Enumeration {
    name: "ProviderType",
    description: "The types of data supported by the provider",
    value_type: "string",
    values: &[
        val("TDP", 1),
        val("MDP", 2),
        val("DMP", 3),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_op_values() {
        assert_eq!(TREE_OP.ordinal_of("MDTREEOP_ANCESTORS"), Some(32));
        assert_eq!(TREE_OP.ordinal_of("MDTREEOP_NOPE"), None);
    }

    #[test]
    fn all_enumerations_have_values() {
        for e in Enumeration::all() {
            assert!(!e.values.is_empty(), "{} is empty", e.name);
        }
    }
}
