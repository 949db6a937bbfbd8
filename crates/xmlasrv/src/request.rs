//! Request surface: what the transport layer hands the dispatcher.

use std::str::FromStr;

use xmlabuiltins::{RequestProperties, Restrictions};
use xmlaio::SinkEncoding;

use crate::errors::{Result, SrvError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Discover,
    Execute,
}

impl FromStr for Method {
    type Err = SrvError;

    fn from_str(s: &str) -> Result<Method> {
        match s {
            "Discover" => Ok(Method::Discover),
            "Execute" => Ok(Method::Execute),
            other => Err(SrvError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// A parsed XMLA request, as consumed by the dispatcher. The transport
/// glue (SOAP unmarshalling) lives elsewhere; embedders and tests build
/// a [`Request`] directly.
pub trait XmlaRequest: Send + Sync {
    fn method(&self) -> Method;
    /// Rowset name of a DISCOVER request.
    fn request_type(&self) -> Option<&str>;
    fn restrictions(&self) -> &Restrictions;
    fn properties(&self) -> &RequestProperties;
    /// Command text of an EXECUTE request.
    fn statement(&self) -> Option<&str>;
    fn is_drillthrough(&self) -> bool;
    fn session_id(&self) -> Option<&str>;
    fn username(&self) -> Option<&str>;
    fn role_name(&self) -> Option<&str>;
}

/// Concrete request value with builder-style setters.
#[derive(Default)]
pub struct Request {
    method: Option<Method>,
    request_type: Option<String>,
    restrictions: Restrictions,
    properties: RequestProperties,
    statement: Option<String>,
    drillthrough: bool,
    session_id: Option<String>,
    username: Option<String>,
    role_name: Option<String>,
}

impl Request {
    pub fn discover(request_type: impl Into<String>) -> Request {
        Request {
            method: Some(Method::Discover),
            request_type: Some(request_type.into()),
            ..Default::default()
        }
    }

    pub fn execute(statement: impl Into<String>) -> Request {
        Request {
            method: Some(Method::Execute),
            statement: Some(statement.into()),
            ..Default::default()
        }
    }

    pub fn drillthrough(mut self, yes: bool) -> Request {
        self.drillthrough = yes;
        self
    }

    pub fn restrict(mut self, column: impl Into<String>, value: impl Into<String>) -> Request {
        self.restrictions.set(column, value);
        self
    }

    pub fn restrict_list(mut self, column: impl Into<String>, values: Vec<String>) -> Request {
        self.restrictions.set_list(column, values);
        self
    }

    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Request {
        self.properties.insert(name, value);
        self
    }

    pub fn session(mut self, id: impl Into<String>) -> Request {
        self.session_id = Some(id.into());
        self
    }

    pub fn user(mut self, name: impl Into<String>) -> Request {
        self.username = Some(name.into());
        self
    }

    pub fn role(mut self, name: impl Into<String>) -> Request {
        self.role_name = Some(name.into());
        self
    }
}

impl XmlaRequest for Request {
    fn method(&self) -> Method {
        // A Request is only constructible through discover()/execute().
        self.method.unwrap_or(Method::Discover)
    }

    fn request_type(&self) -> Option<&str> {
        self.request_type.as_deref()
    }

    fn restrictions(&self) -> &Restrictions {
        &self.restrictions
    }

    fn properties(&self) -> &RequestProperties {
        &self.properties
    }

    fn statement(&self) -> Option<&str> {
        self.statement.as_deref()
    }

    fn is_drillthrough(&self) -> bool {
        self.drillthrough
    }

    fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn role_name(&self) -> Option<&str> {
        self.role_name.as_deref()
    }
}

/// The Content property: which halves of a response to emit. The two
/// `Data*Slicer` values behave like `Data` and additionally control
/// whether the multidimensional slicer axis is padded out with default
/// members or serialized exactly as the query left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Content {
    None,
    Schema,
    Data,
    SchemaData,
    DataOmitDefaultSlicer,
    DataIncludeDefaultSlicer,
}

impl Content {
    pub const DEFAULT: Content = Content::SchemaData;

    pub fn includes_schema(&self) -> bool {
        matches!(self, Content::Schema | Content::SchemaData)
    }

    pub fn includes_data(&self) -> bool {
        matches!(
            self,
            Content::Data
                | Content::SchemaData
                | Content::DataOmitDefaultSlicer
                | Content::DataIncludeDefaultSlicer
        )
    }

    /// Serialize the filter axis as-is instead of synthesizing default
    /// members for unaddressed hierarchies.
    pub fn omits_default_slicer(&self) -> bool {
        matches!(self, Content::DataOmitDefaultSlicer)
    }
}

impl FromStr for Content {
    type Err = SrvError;

    fn from_str(s: &str) -> Result<Content> {
        match s {
            "None" => Ok(Content::None),
            "Schema" => Ok(Content::Schema),
            "Data" => Ok(Content::Data),
            "SchemaData" => Ok(Content::SchemaData),
            "DataOmitDefaultSlicer" => Ok(Content::DataOmitDefaultSlicer),
            "DataIncludeDefaultSlicer" => Ok(Content::DataIncludeDefaultSlicer),
            other => Err(SrvError::UnsupportedProperty {
                property: "Content",
                value: other.to_string(),
            }),
        }
    }
}

/// The Format property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Tabular,
    Multidimensional,
    Native,
}

impl FromStr for Format {
    type Err = SrvError;

    fn from_str(s: &str) -> Result<Format> {
        match s {
            "Tabular" => Ok(Format::Tabular),
            "Multidimensional" => Ok(Format::Multidimensional),
            "Native" => Ok(Format::Native),
            other => Err(SrvError::UnsupportedProperty {
                property: "Format",
                value: other.to_string(),
            }),
        }
    }
}

/// The AxisFormat property. Only the tuple form is supported; the
/// cluster and custom forms are a client fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisFormat {
    TupleFormat,
}

impl FromStr for AxisFormat {
    type Err = SrvError;

    fn from_str(s: &str) -> Result<AxisFormat> {
        match s {
            "TupleFormat" => Ok(AxisFormat::TupleFormat),
            other => Err(SrvError::UnsupportedFormat {
                operation: "axis",
                value: other.to_string(),
            }),
        }
    }
}

/// Map a ResponseMimeType property value onto a sink encoding.
pub fn negotiate_mime(mime: &str) -> Result<SinkEncoding> {
    match mime {
        "text/xml" | "application/xml" | "application/soap+xml" | "*/*" => Ok(SinkEncoding::Xml),
        "application/json" => Ok(SinkEncoding::Json),
        other => Err(SrvError::UnsupportedMimeType(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_method_is_an_error() {
        assert!("Discover".parse::<Method>().is_ok());
        assert!("Subscribe".parse::<Method>().is_err());
    }

    #[test]
    fn mime_negotiation_table() {
        assert_eq!(negotiate_mime("text/xml").unwrap(), SinkEncoding::Xml);
        assert_eq!(negotiate_mime("application/xml").unwrap(), SinkEncoding::Xml);
        assert_eq!(
            negotiate_mime("application/soap+xml").unwrap(),
            SinkEncoding::Xml
        );
        assert_eq!(negotiate_mime("*/*").unwrap(), SinkEncoding::Xml);
        assert_eq!(
            negotiate_mime("application/json").unwrap(),
            SinkEncoding::Json
        );
        assert!(negotiate_mime("text/html").is_err());
    }

    #[test]
    fn content_parsing_and_gating() {
        let c: Content = "Schema".parse().unwrap();
        assert!(c.includes_schema());
        assert!(!c.includes_data());
        assert!("Everything".parse::<Content>().is_err());

        let c: Content = "DataOmitDefaultSlicer".parse().unwrap();
        assert!(!c.includes_schema());
        assert!(c.includes_data());
        assert!(c.omits_default_slicer());
        let c: Content = "DataIncludeDefaultSlicer".parse().unwrap();
        assert!(c.includes_data());
        assert!(!c.omits_default_slicer());
        assert!(!Content::DEFAULT.omits_default_slicer());
    }

    #[test]
    fn axis_format_only_supports_tuples() {
        assert!("TupleFormat".parse::<AxisFormat>().is_ok());
        assert!("ClusterFormat".parse::<AxisFormat>().is_err());
    }
}
