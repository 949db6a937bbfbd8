//! Scalar representation for the XMLA wire format.
//!
//! This crate is the bottom of the stack: it knows nothing about rowsets,
//! cell sets or the protocol. It defines the [`Datum`] scalar carried by
//! cells and member properties, a 128-bit [`Decimal`] for values that do
//! not fit the machine floats exactly, and the canonicalization logic
//! ([`ValueInfo`]) that assigns every scalar an XML Schema type without
//! losing precision.

pub mod datum;
pub mod decimal;
pub mod error;
pub mod value;
pub mod xsd;

pub use datum::Datum;
pub use decimal::Decimal;
pub use error::{ReprError, Result};
pub use value::{is_valid_xsd_int, TypeHint, ValueInfo};
pub use xsd::XsdType;
