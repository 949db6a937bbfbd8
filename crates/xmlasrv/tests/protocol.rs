//! End-to-end dispatcher tests over the in-memory metadata model.

use std::sync::Arc;

use olapmeta::memory::{MemConnection, fixtures};
use olapmeta::{SqlColumn, SqlRows};
use xmlaio::{JsonSink, XmlSink, XmlaSink};
use xmlarepr::{Datum, XsdType};
use xmlasrv::{Request, handle};

fn run_xml(conn: &Arc<MemConnection>, request: &Request) -> String {
    let mut buf = Vec::new();
    {
        let mut sink = XmlSink::new(&mut buf);
        handle(&**conn, request, &mut sink).unwrap();
    }
    String::from_utf8(buf).unwrap()
}

fn run_json(conn: &Arc<MemConnection>, request: &Request) -> serde_json::Value {
    let mut buf = Vec::new();
    {
        let mut sink = JsonSink::new(&mut buf);
        handle(&**conn, request, &mut sink).unwrap();
    }
    serde_json::from_slice(&buf).unwrap()
}

#[test]
fn discover_datasources_end_to_end() {
    let conn = fixtures::sales_connection();
    let request = Request::discover("DISCOVER_DATASOURCES");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains("<xsd:schema"));
    assert!(xml.contains("<DataSourceName>FoodMart</DataSourceName>"));
    assert!(xml.contains("urn:schemas-microsoft-com:xml-analysis:rowset"));
    assert!(conn.is_closed(), "connection released after the request");
}

#[test]
fn discover_content_gating() {
    let conn = fixtures::sales_connection();
    let request = Request::discover("DISCOVER_DATASOURCES").property("Content", "Schema");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains("<xsd:schema"));
    assert!(!xml.contains("<DataSourceName>"));

    let conn = fixtures::sales_connection();
    let request = Request::discover("DISCOVER_DATASOURCES").property("Content", "Data");
    let xml = run_xml(&conn, &request);
    assert!(!xml.contains("<xsd:schema"));
    assert!(xml.contains("<DataSourceName>FoodMart</DataSourceName>"));

    let conn = fixtures::sales_connection();
    let request = Request::discover("DISCOVER_DATASOURCES").property("Content", "None");
    let xml = run_xml(&conn, &request);
    assert!(!xml.contains("<xsd:schema"));
    assert!(!xml.contains("<row>"));
}

#[test]
fn discover_rejects_multidimensional_format() {
    let conn = fixtures::sales_connection();
    let request =
        Request::discover("DISCOVER_DATASOURCES").property("Format", "Multidimensional");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains("<faultcode>XMLA:Client.UDF</faultcode>"), "{xml}");
    assert!(conn.is_closed(), "connection released on the fault path too");
}

#[test]
fn unknown_rowset_is_a_client_fault() {
    let conn = fixtures::sales_connection();
    let request = Request::discover("DISCOVER_FLIGHTS");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains("<faultcode>XMLA:Client.USM</faultcode>"), "{xml}");
    assert!(xml.contains("Error occurred in the XMLA engine: "));
}

#[test]
fn invalid_restriction_column_is_a_client_fault() {
    let conn = fixtures::sales_connection();
    // Value is a column of DISCOVER_PROPERTIES but not a restrictable one.
    let request = Request::discover("DISCOVER_PROPERTIES").restrict("Value", "x");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains("<faultcode>XMLA:Client.MRC</faultcode>"), "{xml}");
}

#[test]
fn unknown_mime_type_is_a_client_fault() {
    let conn = fixtures::sales_connection();
    let request =
        Request::discover("DISCOVER_DATASOURCES").property("ResponseMimeType", "text/html");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains("<faultcode>XMLA:Client.UDP</faultcode>"), "{xml}");
}

#[test]
fn execute_defaults_to_multidimensional() {
    let conn = fixtures::sales_connection();
    conn.register_statement("SELECT ON 0, ON 1 FROM [SalesGeo]", fixtures::sales_cellset_2x2());
    let request = Request::execute("SELECT ON 0, ON 1 FROM [SalesGeo]");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains("urn:schemas-microsoft-com:xml-analysis:mddataset"));
    assert!(xml.contains("<CubeName>SalesGeo</CubeName>"));
    assert!(xml.contains(r#"<Axis name="Axis0">"#));
    assert!(xml.contains(r#"<Axis name="SlicerAxis">"#));
    assert!(xml.contains(r#"<Cell CellOrdinal="0">"#));
    assert!(xml.contains("<UName>[Gender].[F]</UName>"));
}

#[test]
fn content_controls_default_slicer_synthesis() {
    // One axis only: the Gender hierarchy is unaddressed, so the default
    // content pads the slicer with its default member.
    let mut cs = fixtures::sales_cellset_2x2();
    cs.axes.remove(0);
    let conn = fixtures::sales_connection();
    conn.register_statement("q", cs);
    let request = Request::execute("q");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains("<UName>[Gender].[All Gender]</UName>"), "{xml}");

    // DataOmitDefaultSlicer serializes the filter axis as-is: here it
    // has zero positions, so the slicer carries no tuple at all.
    let mut cs = fixtures::sales_cellset_2x2();
    cs.axes.remove(0);
    let conn = fixtures::sales_connection();
    conn.register_statement("q", cs);
    let request = Request::execute("q").property("Content", "DataOmitDefaultSlicer");
    let xml = run_xml(&conn, &request);
    assert!(!xml.contains("[Gender].[All Gender]"), "{xml}");
    let slicer_at = xml.find(r#"<Axis name="SlicerAxis">"#).unwrap();
    let tail = &xml[slicer_at..];
    let axis_end = tail.find("</Axis>").unwrap();
    assert!(!tail[..axis_end].contains("<Tuple>"), "{xml}");
}

#[test]
fn execute_tabular_flattens_the_grid() {
    let conn = fixtures::sales_connection();
    conn.register_statement("q", fixtures::sales_cellset_2x2());
    let request = Request::execute("q").property("Format", "Tabular");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains("urn:schemas-microsoft-com:xml-analysis:rowset"));
    assert!(xml.contains("<Geo.Region>North</Geo.Region>"));
    assert!(xml.contains("<F>131558</F>"));
}

#[test]
fn execute_native_format_is_rejected() {
    let conn = fixtures::sales_connection();
    conn.register_statement("q", fixtures::sales_cellset_2x2());
    let request = Request::execute("q").property("Format", "Native");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains("<faultcode>XMLA:Client.UDF</faultcode>"), "{xml}");
}

#[test]
fn execute_unknown_statement_is_a_server_fault() {
    let conn = fixtures::sales_connection();
    let request = Request::execute("SELECT FROM [Nowhere]");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains("<faultcode>XMLA:Server.CXE</faultcode>"), "{xml}");
    assert!(xml.contains("unknown statement"));
}

#[test]
fn axis_format_other_than_tuples_is_rejected() {
    let conn = fixtures::sales_connection();
    conn.register_statement("q", fixtures::sales_cellset_2x2());
    let request = Request::execute("q").property("AxisFormat", "ClusterFormat");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains("<faultcode>XMLA:Client.UDF</faultcode>"), "{xml}");
}

fn drill_rows() -> SqlRows {
    SqlRows {
        columns: vec![
            SqlColumn {
                name: "customer id".into(),
                xsd_type: XsdType::Int,
                nullable: false,
            },
            SqlColumn {
                name: "unit sales".into(),
                xsd_type: XsdType::Double,
                nullable: true,
            },
        ],
        rows: (0..5)
            .map(|i| vec![Datum::Int32(i), Datum::Float64(i as f64 + 0.5)])
            .collect(),
    }
}

#[test]
fn drillthrough_with_field_allowlist() {
    let conn = fixtures::sales_connection();
    conn.register_drill_statement("drill", drill_rows());
    let request = Request::execute("drill")
        .drillthrough(true)
        .property("TableFields", "customer id");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains("<customer_x0020_id>0</customer_x0020_id>"));
    assert!(!xml.contains("unit_x0020_sales"));
}

#[test]
fn drillthrough_row_counting_prepends_total() {
    let conn = fixtures::sales_connection();
    conn.register_drill_statement("drill", drill_rows());
    let request = Request::execute("drill")
        .drillthrough(true)
        .property("AdvancedFlag", "true")
        .property("MaximumRows", "2");
    let xml = run_xml(&conn, &request);
    // The leading row carries the pre-cutoff total; data is cut to 2.
    assert!(xml.contains("<Total_x0020_Count>5</Total_x0020_Count>"), "{xml}");
    assert!(xml.contains("<customer_x0020_id>1</customer_x0020_id>"));
    assert!(!xml.contains("<customer_x0020_id>2</customer_x0020_id>"));
}

#[test]
fn drillthrough_rejects_multidimensional_format() {
    let conn = fixtures::sales_connection();
    conn.register_drill_statement("drill", drill_rows());
    let request = Request::execute("drill")
        .drillthrough(true)
        .property("Format", "Multidimensional");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains("<faultcode>XMLA:Client.UDF</faultcode>"), "{xml}");
}

#[test]
fn discover_rows_in_json_encoding() {
    let conn = fixtures::sales_connection();
    let request = Request::discover("DISCOVER_DATASOURCES").property("Content", "Data");
    let doc = run_json(&conn, &request);
    let rows = &doc["root"]["row"];
    assert!(rows.is_array(), "{doc}");
    assert_eq!(rows[0]["DataSourceName"], "FoodMart");
}

#[test]
fn properties_rowset_honors_request_overrides() {
    let conn = fixtures::sales_connection();
    let request = Request::discover("DISCOVER_PROPERTIES")
        .restrict("PropertyName", "Catalog")
        .property("Catalog", "FoodMart");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains("<PropertyName>Catalog</PropertyName>"));
    assert!(xml.contains("<Value>FoodMart</Value>"));
    assert!(xml.contains("<IsRequired>false</IsRequired>"));
}

#[test]
fn members_rowset_tree_expansion_over_the_wire() {
    let conn = fixtures::sales_connection();
    // DESCENDANTS | SELF on the root of the geography hierarchy.
    let request = Request::discover("MDSCHEMA_MEMBERS")
        .restrict("CUBE_NAME", "SalesGeo")
        .restrict("MEMBER_UNIQUE_NAME", "[Geo].[All Geos]")
        .restrict("TREE_OP", "24");
    let xml = run_xml(&conn, &request);
    assert_eq!(xml.matches("<MEMBER_UNIQUE_NAME>").count(), 7);
    assert!(xml.contains("<CHILDREN_CARDINALITY>100</CHILDREN_CARDINALITY>"));
}

#[test]
fn empty_slicer_stays_wellformed_in_both_encodings() {
    let conn = fixtures::sales_connection();
    let mut cs = fixtures::sales_cellset_2x2();
    cs.filter_axis.positions.clear();
    conn.register_statement("q", cs);
    let request = Request::execute("q");
    let xml = run_xml(&conn, &request);
    assert!(xml.contains(r#"<Axis name="SlicerAxis">"#));

    let conn = fixtures::sales_connection();
    conn.register_statement("q", fixtures::sales_cellset_2x2());
    let request = Request::execute("q");
    let doc = run_json(&conn, &request);
    let axes = doc["root"]["Axes"]["Axis"].as_array().unwrap();
    assert_eq!(axes.last().unwrap()["@name"], "SlicerAxis");
}

#[test]
fn sink_trait_object_is_usable_across_encodings() {
    let conn = fixtures::sales_connection();
    let request = Request::discover("DISCOVER_ENUMERATORS").property("Content", "Data");
    let mut buf = Vec::new();
    {
        let mut sink = XmlSink::new(&mut buf);
        let sink: &mut dyn XmlaSink = &mut sink;
        handle(&*conn, &request, sink).unwrap();
    }
    let xml = String::from_utf8(buf).unwrap();
    assert!(xml.contains("<EnumName>TreeOp</EnumName>"));
}
