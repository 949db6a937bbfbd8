//! Structured output sinks for the XMLA wire format.
//!
//! The protocol engine emits responses through the [`XmlaSink`] trait:
//! nested named elements with attributes and text, homogeneous sequences,
//! and verbatim pre-rendered fragments. Two encodings are provided: XML
//! (the SOAP body payload) and JSON.

pub mod errors;
pub mod json;
pub mod sink;
pub mod xml;

pub use errors::{Result, SinkError};
pub use json::JsonSink;
pub use sink::{SinkEncoding, XmlaSink};
pub use xml::XmlSink;
