//! Column schemas for rowset definitions.

use xmlarepr::XsdType;

use crate::enums::Enumeration;
use crate::errors::{BuiltinError, Result};

/// Semantic type of a rowset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    StringArray,
    Array,
    Enumeration,
    EnumerationArray,
    EnumString,
    Boolean,
    Integer,
    UnsignedInteger,
    Double,
    DateTime,
    NestedRowset,
    Short,
    Uuid,
    UnsignedShort,
    Long,
    UnsignedLong,
}

impl ColumnType {
    /// Whether values of this type reference an [`Enumeration`].
    pub fn is_enum(&self) -> bool {
        matches!(
            self,
            ColumnType::Enumeration | ColumnType::EnumerationArray | ColumnType::EnumString
        )
    }

    /// XSD type used in schema declarations. Nested rowsets have no
    /// scalar type; their schema is derived from the nested column list.
    pub fn xsd_type(&self) -> Option<XsdType> {
        match self {
            ColumnType::String
            | ColumnType::StringArray
            | ColumnType::Array
            | ColumnType::Enumeration
            | ColumnType::EnumerationArray
            | ColumnType::EnumString
            | ColumnType::Uuid => Some(XsdType::String),
            ColumnType::Boolean => Some(XsdType::Boolean),
            ColumnType::Integer => Some(XsdType::Int),
            ColumnType::UnsignedInteger => Some(XsdType::UnsignedInt),
            ColumnType::Double => Some(XsdType::Double),
            ColumnType::DateTime => Some(XsdType::DateTime),
            ColumnType::Short => Some(XsdType::Short),
            ColumnType::UnsignedShort => Some(XsdType::UnsignedShort),
            ColumnType::Long => Some(XsdType::Long),
            ColumnType::UnsignedLong => Some(XsdType::UnsignedLong),
            ColumnType::NestedRowset => None,
        }
    }
}

/// Immutable schema of one rowset column.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub enumeration: Option<&'static Enumeration>,
    /// May appear as a DISCOVER restriction.
    pub restriction: bool,
    pub nullable: bool,
    /// Array-valued: may repeat in the output.
    pub unbounded: bool,
    pub description: &'static str,
    /// Element columns of a [`ColumnType::NestedRowset`] column.
    pub nested: Vec<ColumnDef>,
}

/// Descriptions go out on the wire verbatim; carriage returns would leak
/// platform line endings into the response.
pub fn validate_description(text: &str) -> Result<()> {
    if text.contains('\r') {
        return Err(BuiltinError::CarriageReturn(text.to_string()));
    }
    Ok(())
}

impl ColumnDef {
    /// Panics when the description contains a carriage return; the
    /// registries are built once at startup and a bad description is a
    /// bug, not a runtime condition.
    pub fn new(
        name: &'static str,
        ty: ColumnType,
        restriction: bool,
        nullable: bool,
        description: &'static str,
    ) -> ColumnDef {
        if let Err(e) = validate_description(description) {
            panic!("column {}: {}", name, e);
        }
        debug_assert!(!ty.is_enum(), "enum-typed column {} needs with_enum", name);
        ColumnDef {
            name,
            ty,
            enumeration: None,
            restriction,
            nullable,
            unbounded: false,
            description,
            nested: Vec::new(),
        }
    }

    pub fn new_enum(
        name: &'static str,
        ty: ColumnType,
        enumeration: &'static Enumeration,
        restriction: bool,
        nullable: bool,
        description: &'static str,
    ) -> ColumnDef {
        if let Err(e) = validate_description(description) {
            panic!("column {}: {}", name, e);
        }
        debug_assert!(ty.is_enum());
        ColumnDef {
            name,
            ty,
            enumeration: Some(enumeration),
            restriction,
            nullable,
            unbounded: false,
            description,
            nested: Vec::new(),
        }
    }

    pub fn unbounded(mut self) -> ColumnDef {
        self.unbounded = true;
        self
    }

    pub fn with_nested(mut self, nested: Vec<ColumnDef>) -> ColumnDef {
        debug_assert_eq!(self.ty, ColumnType::NestedRowset);
        self.nested = nested;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptions_reject_carriage_returns() {
        assert!(validate_description("plain text\nwith newline").is_ok());
        assert!(validate_description("bad\r\nline ending").is_err());
        assert!(validate_description("trailing\r").is_err());
        assert!(validate_description("").is_ok());
    }

    #[test]
    fn random_descriptions_validate_iff_cr_free() {
        use rand::Rng;
        let mut rng = rand::rng();
        for _ in 0..200 {
            let len = rng.random_range(0..40);
            let s: String = (0..len)
                .map(|_| {
                    // Bias toward control characters to hit '\r' often.
                    let c = rng.random_range(0x09u32..0x7f);
                    char::from_u32(if c == 0x0b { 0x0d } else { c }).unwrap()
                })
                .collect();
            assert_eq!(validate_description(&s).is_ok(), !s.contains('\r'));
        }
    }

    #[test]
    fn constructor_panics_on_carriage_return() {
        let result = std::panic::catch_unwind(|| {
            ColumnDef::new("X", ColumnType::String, false, true, "bad\rdescription")
        });
        assert!(result.is_err());
    }
}
