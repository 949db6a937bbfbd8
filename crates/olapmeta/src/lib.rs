//! Read-only capability surface over an OLAP metadata model.
//!
//! The protocol engine never talks to a backing store directly; it walks
//! catalogs, cubes, dimensions, hierarchies, levels and members through
//! the traits defined here, and receives query results as [`CellSet`]s.
//! The [`memory`] module provides a complete in-memory implementation
//! used by tests and by embedders that assemble models programmatically.

pub mod errors;
pub mod memory;
pub mod model;
pub mod result;

pub use errors::{MetaError, Result};
pub use model::{
    Catalog, Cube, Dimension, DimensionType, Hierarchy, Level, Measure, MeasureAggregator, Member,
    MemberPropertyDef, NamedSet, OlapConnection, Schema,
};
pub use result::{Cell, CellSet, CellSetAxis, Position, SqlColumn, SqlRows};
