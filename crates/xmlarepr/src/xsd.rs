/// XML Schema types a cell or column value can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XsdType {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    /// Unbounded integer; used when a value does not fit 64 bits.
    Integer,
    UnsignedByte,
    UnsignedShort,
    UnsignedInt,
    UnsignedLong,
    Float,
    Double,
    Decimal,
    String,
    DateTime,
}

impl XsdType {
    /// The `xsd:`-qualified name used in `xsi:type` attributes and schema
    /// declarations.
    pub fn as_str(&self) -> &'static str {
        match self {
            XsdType::Boolean => "xsd:boolean",
            XsdType::Byte => "xsd:byte",
            XsdType::Short => "xsd:short",
            XsdType::Int => "xsd:int",
            XsdType::Long => "xsd:long",
            XsdType::Integer => "xsd:integer",
            XsdType::UnsignedByte => "xsd:unsignedByte",
            XsdType::UnsignedShort => "xsd:unsignedShort",
            XsdType::UnsignedInt => "xsd:unsignedInt",
            XsdType::UnsignedLong => "xsd:unsignedLong",
            XsdType::Float => "xsd:float",
            XsdType::Double => "xsd:double",
            XsdType::Decimal => "xsd:decimal",
            XsdType::String => "xsd:string",
            XsdType::DateTime => "xsd:dateTime",
        }
    }
}

impl std::fmt::Display for XsdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
