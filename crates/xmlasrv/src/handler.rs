//! Protocol dispatcher.
//!
//! The single entry point of the engine: validates format and content
//! properties, routes DISCOVER to the rowset catalog and EXECUTE to the
//! query layer, and converts every failure into a structured fault. No
//! raw error ever reaches the transport.

use std::str::FromStr;

use tracing::{debug, error};
use xmlarepr::{Datum, XsdType};

use olapmeta::{MetaError, OlapConnection, SqlRows};
use xmlabuiltins::{DiscoverContext, Row, RowValue, rowset_lookup};
use xmlaio::XmlaSink;

use crate::errors::{Result, SrvError};
use crate::mdd;
use crate::request::{Content, Format, Method, XmlaRequest, negotiate_mime};
use crate::tabular::{self, TabularDataset};
use crate::xsd::{
    MDDATASET_XMLNS, ROWSET_XMLNS, TabularColumn, encode_element_name, write_mddataset_schema,
    write_rowset_schema, write_tabular_schema,
};

const XSI_XMLNS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD_XMLNS: &str = "http://www.w3.org/2001/XMLSchema";

/// Serve one request. The connection is released on every exit path;
/// any engine error is written to the sink as a fault body. The only
/// error this returns is a sink failure while writing the fault itself,
/// which the transport cannot do anything about beyond dropping the
/// connection.
pub fn handle(
    conn: &dyn OlapConnection,
    request: &dyn XmlaRequest,
    sink: &mut dyn XmlaSink,
) -> xmlaio::Result<()> {
    let outcome = process(conn, request, sink);
    conn.close();
    match outcome {
        Ok(()) => Ok(()),
        Err(err) => {
            error!(error = %err, code = err.fault_code(), "request failed");
            let fault = err.into_fault();
            // Terminate whatever partial body was already emitted so the
            // fault lands at top level of a well-formed document.
            sink.finish()?;
            fault.write(sink)
        }
    }
}

fn process(
    conn: &dyn OlapConnection,
    request: &dyn XmlaRequest,
    sink: &mut dyn XmlaSink,
) -> Result<()> {
    validate_mime(request)?;
    let content = parse_content(request)?;
    match request.method() {
        Method::Discover => discover(conn, request, sink, content),
        Method::Execute => execute(conn, request, sink, content),
    }
}

/// A ResponseMimeType property, when present, must name an encoding we
/// can produce. The actual encoding choice happened at sink
/// construction; this only rejects values outside the table.
fn validate_mime(request: &dyn XmlaRequest) -> Result<()> {
    if let Some(mime) = request.properties().get("ResponseMimeType") {
        negotiate_mime(mime)?;
    }
    Ok(())
}

fn parse_content(request: &dyn XmlaRequest) -> Result<Content> {
    match request.properties().get("Content") {
        Some(value) => Content::from_str(value),
        None => Ok(Content::DEFAULT),
    }
}

/// Format for an operation that only supports the tabular form.
fn require_tabular(request: &dyn XmlaRequest, operation: &'static str) -> Result<()> {
    if let Some(value) = request.properties().get("Format") {
        let format = Format::from_str(value)?;
        if format != Format::Tabular {
            return Err(SrvError::UnsupportedFormat {
                operation,
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_axis_format(request: &dyn XmlaRequest) -> Result<()> {
    if let Some(value) = request.properties().get("AxisFormat") {
        crate::request::AxisFormat::from_str(value)?;
    }
    Ok(())
}

fn discover(
    conn: &dyn OlapConnection,
    request: &dyn XmlaRequest,
    sink: &mut dyn XmlaSink,
    content: Content,
) -> Result<()> {
    require_tabular(request, "discover")?;

    let Some(rowset_name) = request.request_type() else {
        return Err(SrvError::UnsupportedMethod(
            "Discover request carries no RequestType".to_string(),
        ));
    };
    let def = rowset_lookup(rowset_name)?;
    def.validate_restrictions(request.restrictions())?;
    debug!(rowset = def.name, "discover");

    sink.start_element(
        "root",
        &[
            ("xmlns", ROWSET_XMLNS),
            ("xmlns:xsi", XSI_XMLNS),
            ("xmlns:xsd", XSD_XMLNS),
        ],
    )?;
    if content.includes_schema() {
        write_rowset_schema(sink, def)?;
    }
    if content.includes_data() {
        let cx = DiscoverContext {
            conn,
            restrictions: request.restrictions(),
            properties: request.properties(),
        };
        let rows = (def.populate)(def, &cx)?;
        sink.start_sequence("row")?;
        for row in &rows {
            write_row(sink, row)?;
        }
        sink.end_sequence("row")?;
    }
    sink.end_element("root")?;
    sink.flush()?;
    Ok(())
}

/// Serialize one rowset row. Never-set cells are omitted, set-to-null
/// cells become empty elements.
fn write_row(sink: &mut dyn XmlaSink, row: &Row) -> Result<()> {
    sink.start_element("row", &[])?;
    for (column, value) in row.cells() {
        let name = encode_element_name(column.name);
        match value {
            None => sink.text_element(name.as_str(), &[], "")?,
            Some(RowValue::Datum(d)) => sink.text_element(name.as_str(), &[], &d.to_string())?,
            Some(RowValue::StrList(items)) => {
                for item in items {
                    sink.text_element(name.as_str(), &[], item)?;
                }
            }
            Some(RowValue::Nested(rows)) => {
                sink.start_sequence(name.as_str())?;
                for nested in rows {
                    write_nested_row(sink, name.as_str(), nested)?;
                }
                sink.end_sequence(name.as_str())?;
            }
        }
    }
    sink.end_element("row")?;
    Ok(())
}

fn write_nested_row(sink: &mut dyn XmlaSink, name: &str, row: &Row) -> Result<()> {
    sink.start_element(name, &[])?;
    for (column, value) in row.cells() {
        let child = encode_element_name(column.name);
        match value {
            None => sink.text_element(child.as_str(), &[], "")?,
            Some(RowValue::Datum(d)) => sink.text_element(child.as_str(), &[], &d.to_string())?,
            Some(RowValue::StrList(items)) => {
                for item in items {
                    sink.text_element(child.as_str(), &[], item)?;
                }
            }
            Some(RowValue::Nested(rows)) => {
                sink.start_sequence(child.as_str())?;
                for nested in rows {
                    write_nested_row(sink, child.as_str(), nested)?;
                }
                sink.end_sequence(child.as_str())?;
            }
        }
    }
    sink.end_element(name)?;
    Ok(())
}

fn execute(
    conn: &dyn OlapConnection,
    request: &dyn XmlaRequest,
    sink: &mut dyn XmlaSink,
    content: Content,
) -> Result<()> {
    let Some(statement) = request.statement() else {
        return Err(SrvError::UnsupportedMethod(
            "Execute request carries no statement".to_string(),
        ));
    };

    if request.is_drillthrough() {
        require_tabular(request, "drillthrough")?;
        return drillthrough(conn, request, sink, content, statement);
    }

    validate_axis_format(request)?;
    let format = match request.properties().get("Format") {
        None => Format::Multidimensional,
        Some(value) => match Format::from_str(value)? {
            Format::Native => {
                return Err(SrvError::UnsupportedFormat {
                    operation: "execute",
                    value: value.to_string(),
                });
            }
            f => f,
        },
    };

    debug!(format = ?format, "execute");
    let cs = conn.execute(statement).map_err(classify_execute)?;

    match format {
        Format::Multidimensional => {
            sink.start_element(
                "root",
                &[
                    ("xmlns", MDDATASET_XMLNS),
                    ("xmlns:xsi", XSI_XMLNS),
                    ("xmlns:xsd", XSD_XMLNS),
                ],
            )?;
            if content.includes_schema() {
                write_mddataset_schema(sink)?;
            }
            if content.includes_data() {
                mdd::write_dataset(sink, &cs, !content.omits_default_slicer())?;
            }
        }
        Format::Tabular => {
            let ds = TabularDataset::from_cellset(&cs)?;
            sink.start_element(
                "root",
                &[
                    ("xmlns", ROWSET_XMLNS),
                    ("xmlns:xsi", XSI_XMLNS),
                    ("xmlns:xsd", XSD_XMLNS),
                ],
            )?;
            if content.includes_schema() {
                write_tabular_schema(sink, ds.columns())?;
            }
            if content.includes_data() {
                ds.write_rows(sink)?;
            }
        }
        Format::Native => unreachable!("rejected above"),
    }
    sink.end_element("root")?;
    sink.flush()?;
    Ok(())
}

/// Caption of the synthetic leading row carrying the pre-cutoff total.
const TOTAL_COUNT: &str = "Total Count";

fn drillthrough(
    conn: &dyn OlapConnection,
    request: &dyn XmlaRequest,
    sink: &mut dyn XmlaSink,
    content: Content,
    statement: &str,
) -> Result<()> {
    let properties = request.properties();
    let fields: Vec<String> = properties
        .table_fields()
        .map(|spec| {
            spec.split(',')
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let max_rows = properties.maximum_rows();
    let count_rows = properties.advanced_flag();

    // Row counting needs the full result; the cutoff is applied locally
    // so the total reflects the uncut row count.
    let fetch_limit = if count_rows { None } else { max_rows };
    let mut rows = conn
        .execute_drillthrough(statement, fetch_limit, &fields)
        .map_err(classify_drillthrough)?;
    let total = rows.rows.len();
    if count_rows {
        if let Some(limit) = max_rows {
            rows.rows.truncate(limit);
        }
    }
    debug!(rows = rows.rows.len(), total, "drillthrough");

    let mut columns = Vec::new();
    if count_rows {
        columns.push(TabularColumn::new(TOTAL_COUNT, XsdType::Long));
    }
    columns.extend(tabular::sql_columns(&rows));

    sink.start_element(
        "root",
        &[
            ("xmlns", ROWSET_XMLNS),
            ("xmlns:xsi", XSI_XMLNS),
            ("xmlns:xsd", XSD_XMLNS),
        ],
    )?;
    if content.includes_schema() {
        write_tabular_schema(sink, &columns)?;
    }
    if content.includes_data() {
        if count_rows {
            write_counted_rows(sink, &columns, &rows, total)?;
        } else {
            tabular::write_sql_rows(sink, &rows)?;
        }
    }
    sink.end_element("root")?;
    sink.flush()?;
    Ok(())
}

/// Drillthrough body with a leading total-count row. The count column is
/// only populated on that first row; data rows skip it.
fn write_counted_rows(
    sink: &mut dyn XmlaSink,
    columns: &[TabularColumn],
    rows: &SqlRows,
    total: usize,
) -> Result<()> {
    sink.start_sequence("row")?;
    sink.start_element("row", &[])?;
    sink.text_element(columns[0].encoded_name.as_str(), &[], &total.to_string())?;
    sink.end_element("row")?;
    for row in &rows.rows {
        sink.start_element("row", &[])?;
        for (column, value) in columns[1..].iter().zip(row) {
            if matches!(value, Datum::Null) {
                continue;
            }
            sink.text_element(column.encoded_name.as_str(), &[], &value.to_string())?;
        }
        sink.end_element("row")?;
    }
    sink.end_sequence("row")?;
    Ok(())
}

fn classify_execute(e: MetaError) -> SrvError {
    match e {
        MetaError::AccessDenied(_) => SrvError::AccessDenied(e),
        MetaError::Connection(_) => SrvError::Connection(e),
        MetaError::Prepare(_) => SrvError::Prepare(e),
        _ => SrvError::Execute(e),
    }
}

fn classify_drillthrough(e: MetaError) -> SrvError {
    match e {
        MetaError::AccessDenied(_) => SrvError::AccessDenied(e),
        MetaError::Connection(_) => SrvError::Connection(e),
        MetaError::Prepare(_) => SrvError::Prepare(e),
        _ => SrvError::DrillThrough(e),
    }
}
