//! Builtin XMLA metadata catalogs.
//!
//! Fixed, process-lifetime registries for everything a DISCOVER request
//! can ask about: the rowset definitions with their typed column schemas,
//! the connection/command property catalog, and the enumerations backing
//! enum-typed columns. The populators in [`populate`] turn a live
//! metadata model into rows for each rowset.

pub mod column;
pub mod enums;
pub mod errors;
pub mod populate;
pub mod properties;
pub mod restrict;
pub mod row;
pub mod rowset;

pub use column::{ColumnDef, ColumnType};
pub use enums::Enumeration;
pub use errors::{BuiltinError, Result};
pub use properties::{Access, MethodSet, PropertyDef, property_defs, property_lookup};
pub use restrict::{RequestProperties, Restriction, Restrictions};
pub use row::{Row, RowValue, sort_rows};
pub use rowset::{DiscoverContext, RowsetDef, rowset_defs, rowset_lookup};
