//! XMLA protocol engine: request dispatch, rowset discovery, query
//! execution, and dataset serialization over a structured output sink.

pub mod errors;
pub mod fault;
pub mod handler;
pub mod mdd;
pub mod request;
pub mod tabular;
pub mod xsd;

pub use errors::{Result, SrvError};
pub use fault::{XmlaFault, fault_detail};
pub use handler::handle;
pub use request::{AxisFormat, Content, Format, Method, Request, XmlaRequest, negotiate_mime};
pub use tabular::TabularDataset;
pub use xsd::{MDDATASET_XMLNS, ROWSET_XMLNS, TabularColumn, encode_element_name};
