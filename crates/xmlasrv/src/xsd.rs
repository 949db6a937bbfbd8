//! XML Schema generation.
//!
//! Both flavors are pure structural transforms of schema objects: the
//! rowset schema is derived from the column definitions, the dataset
//! schemas from axis metadata. Neither looks at row data, so a response
//! with zero rows still carries a complete schema.

use xmlabuiltins::{ColumnDef, ColumnType, RowsetDef};
use xmlaio::XmlaSink;

use crate::errors::Result;

pub const ROWSET_XMLNS: &str = "urn:schemas-microsoft-com:xml-analysis:rowset";
pub const MDDATASET_XMLNS: &str = "urn:schemas-microsoft-com:xml-analysis:mddataset";

const XSD_XMLNS: &str = "http://www.w3.org/2001/XMLSchema";
const SQL_XMLNS: &str = "urn:schemas-microsoft-com:xml-sql";

/// Encode a name so it is a valid XML element name. Invalid characters
/// become `_xNNNN_` with the four-digit hex code point, the escape form
/// clients already understand from SSAS.
pub fn encode_element_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        let valid = c == '_'
            || c.is_ascii_alphabetic()
            || (i > 0 && (c.is_ascii_digit() || c == '-' || c == '.'));
        if valid {
            out.push(c);
        } else {
            out.push_str(&format!("_x{:04x}_", c as u32));
        }
    }
    out
}

fn xsd_type_name(ty: ColumnType) -> &'static str {
    ty.xsd_type().map(|t| t.as_str()).unwrap_or("xsd:string")
}

/// Write the schema for a rowset response: a `root` element of unbounded
/// `row` children, one element declaration per column.
pub fn write_rowset_schema(sink: &mut dyn XmlaSink, def: &RowsetDef) -> Result<()> {
    sink.start_element(
        "xsd:schema",
        &[
            ("xmlns:xsd", XSD_XMLNS),
            ("targetNamespace", ROWSET_XMLNS),
            ("xmlns", ROWSET_XMLNS),
            ("xmlns:sql", SQL_XMLNS),
            ("elementFormDefault", "qualified"),
        ],
    )?;

    sink.start_element("xsd:element", &[("name", "root")])?;
    sink.start_element("xsd:complexType", &[])?;
    sink.start_element("xsd:sequence", &[])?;
    sink.text_element(
        "xsd:element",
        &[
            ("maxOccurs", "unbounded"),
            ("minOccurs", "0"),
            ("name", "row"),
            ("type", "row"),
        ],
        "",
    )?;
    sink.end_element("xsd:sequence")?;
    sink.end_element("xsd:complexType")?;
    sink.end_element("xsd:element")?;

    sink.start_element("xsd:complexType", &[("name", "row")])?;
    sink.start_element("xsd:sequence", &[])?;
    for column in &def.columns {
        write_column_element(sink, column)?;
    }
    sink.end_element("xsd:sequence")?;
    sink.end_element("xsd:complexType")?;

    sink.end_element("xsd:schema")?;
    Ok(())
}

fn write_column_element(sink: &mut dyn XmlaSink, column: &ColumnDef) -> Result<()> {
    let name = encode_element_name(column.name);
    if column.ty == ColumnType::NestedRowset {
        // Nested rowsets get an inline complex type built from their own
        // column list.
        sink.start_element(
            "xsd:element",
            &[
                ("sql:field", column.name),
                ("name", name.as_str()),
                ("minOccurs", "0"),
                ("maxOccurs", "unbounded"),
            ],
        )?;
        sink.start_element("xsd:complexType", &[])?;
        sink.start_element("xsd:sequence", &[])?;
        for nested in &column.nested {
            write_column_element(sink, nested)?;
        }
        sink.end_element("xsd:sequence")?;
        sink.end_element("xsd:complexType")?;
        sink.end_element("xsd:element")?;
        return Ok(());
    }

    let ty = xsd_type_name(column.ty);
    let mut attrs: Vec<(&str, &str)> = vec![
        ("sql:field", column.name),
        ("name", name.as_str()),
        ("type", ty),
    ];
    if column.nullable {
        attrs.push(("minOccurs", "0"));
    }
    if column.unbounded {
        attrs.push(("maxOccurs", "unbounded"));
    }
    sink.text_element("xsd:element", &attrs, "")?;
    Ok(())
}

/// Structural schema of the multidimensional dataset body. Entirely
/// data-independent, so it is kept pre-rendered and spliced in verbatim.
const MDDATASET_SCHEMA: &str = r###"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:schemas-microsoft-com:xml-analysis:mddataset" xmlns="urn:schemas-microsoft-com:xml-analysis:mddataset" elementFormDefault="qualified">
  <xsd:complexType name="MemberType">
    <xsd:sequence>
      <xsd:any namespace="##targetNamespace" minOccurs="0" maxOccurs="unbounded" processContents="skip"/>
    </xsd:sequence>
    <xsd:attribute name="Hierarchy" type="xsd:string"/>
  </xsd:complexType>
  <xsd:complexType name="TupleType">
    <xsd:sequence maxOccurs="unbounded">
      <xsd:element name="Member" type="MemberType"/>
    </xsd:sequence>
  </xsd:complexType>
  <xsd:complexType name="TuplesType">
    <xsd:sequence maxOccurs="unbounded" minOccurs="0">
      <xsd:element name="Tuple" type="TupleType"/>
    </xsd:sequence>
  </xsd:complexType>
  <xsd:complexType name="AxisType">
    <xsd:sequence>
      <xsd:element name="Tuples" type="TuplesType" minOccurs="0"/>
    </xsd:sequence>
    <xsd:attribute name="name" type="xsd:string"/>
  </xsd:complexType>
  <xsd:complexType name="AxesType">
    <xsd:sequence maxOccurs="unbounded">
      <xsd:element name="Axis" type="AxisType"/>
    </xsd:sequence>
  </xsd:complexType>
  <xsd:complexType name="CellType">
    <xsd:sequence>
      <xsd:element name="Value" minOccurs="0"/>
      <xsd:element name="FmtValue" type="xsd:string" minOccurs="0"/>
    </xsd:sequence>
    <xsd:attribute name="CellOrdinal" type="xsd:unsignedInt" use="required"/>
  </xsd:complexType>
  <xsd:complexType name="CellDataType">
    <xsd:sequence minOccurs="0" maxOccurs="unbounded">
      <xsd:element name="Cell" type="CellType"/>
    </xsd:sequence>
  </xsd:complexType>
  <xsd:element name="root">
    <xsd:complexType>
      <xsd:sequence>
        <xsd:element name="OlapInfo" minOccurs="0"/>
        <xsd:element name="Axes" type="AxesType" minOccurs="0"/>
        <xsd:element name="CellData" type="CellDataType" minOccurs="0"/>
      </xsd:sequence>
    </xsd:complexType>
  </xsd:element>
</xsd:schema>"###;

pub fn write_mddataset_schema(sink: &mut dyn XmlaSink) -> Result<()> {
    sink.verbatim(MDDATASET_SCHEMA)?;
    Ok(())
}

/// Schema for a flattened (tabular) dataset: one element per derived
/// column, all string-or-value typed, nullable.
pub fn write_tabular_schema(sink: &mut dyn XmlaSink, columns: &[TabularColumn]) -> Result<()> {
    sink.start_element(
        "xsd:schema",
        &[
            ("xmlns:xsd", XSD_XMLNS),
            ("targetNamespace", ROWSET_XMLNS),
            ("xmlns", ROWSET_XMLNS),
            ("xmlns:sql", SQL_XMLNS),
            ("elementFormDefault", "qualified"),
        ],
    )?;
    sink.start_element("xsd:element", &[("name", "root")])?;
    sink.start_element("xsd:complexType", &[])?;
    sink.start_element("xsd:sequence", &[])?;
    sink.text_element(
        "xsd:element",
        &[
            ("maxOccurs", "unbounded"),
            ("minOccurs", "0"),
            ("name", "row"),
            ("type", "row"),
        ],
        "",
    )?;
    sink.end_element("xsd:sequence")?;
    sink.end_element("xsd:complexType")?;
    sink.end_element("xsd:element")?;

    sink.start_element("xsd:complexType", &[("name", "row")])?;
    sink.start_element("xsd:sequence", &[])?;
    for column in columns {
        sink.text_element(
            "xsd:element",
            &[
                ("sql:field", column.caption.as_str()),
                ("name", column.encoded_name.as_str()),
                ("type", column.xsd_type.as_str()),
                ("minOccurs", "0"),
            ],
            "",
        )?;
    }
    sink.end_element("xsd:sequence")?;
    sink.end_element("xsd:complexType")?;
    sink.end_element("xsd:schema")?;
    Ok(())
}

/// Column descriptor of a flattened dataset or drillthrough result.
pub struct TabularColumn {
    pub caption: String,
    pub encoded_name: String,
    pub xsd_type: xmlarepr::XsdType,
}

impl TabularColumn {
    pub fn new(caption: impl Into<String>, xsd_type: xmlarepr::XsdType) -> TabularColumn {
        let caption = caption.into();
        TabularColumn {
            encoded_name: encode_element_name(&caption),
            caption,
            xsd_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmlaio::{SinkEncoding, XmlSink};

    #[test]
    fn element_name_encoding() {
        assert_eq!(encode_element_name("MEMBER_NAME"), "MEMBER_NAME");
        assert_eq!(
            encode_element_name("Unit Sales"),
            "Unit_x0020_Sales"
        );
        assert_eq!(encode_element_name("[Geo]"), "_x005b_Geo_x005d_");
        // A leading digit is invalid even though later digits are fine.
        assert_eq!(encode_element_name("1a"), "_x0031_a");
    }

    #[test]
    fn rowset_schema_derivable_with_zero_rows() {
        let def = xmlabuiltins::rowset_lookup("DISCOVER_PROPERTIES").unwrap();
        let mut buf = Vec::new();
        {
            let mut sink = XmlSink::new(&mut buf);
            write_rowset_schema(&mut sink, def).unwrap();
            assert_eq!(sink.encoding(), SinkEncoding::Xml);
        }
        let xml = String::from_utf8(buf).unwrap();
        assert!(xml.contains("xsd:schema"));
        assert!(xml.contains("PropertyName"));
        assert!(xml.contains("urn:schemas-microsoft-com:xml-analysis:rowset"));
    }

    #[test]
    fn mddataset_schema_is_wellformed_fragment() {
        assert!(MDDATASET_SCHEMA.starts_with("<xsd:schema"));
        assert!(MDDATASET_SCHEMA.ends_with("</xsd:schema>"));
        assert_eq!(
            MDDATASET_SCHEMA.matches("<xsd:complexType").count(),
            MDDATASET_SCHEMA.matches("</xsd:complexType>").count()
        );
    }
}
