//! Traits describing the metadata model.
//!
//! All of these are request-scoped, read-only views. Implementations may
//! lazily fault data in from a backing store, which is why most accessors
//! that materialize children are fallible.

use std::sync::Arc;

use chrono::NaiveDateTime;
use xmlarepr::{Datum, XsdType};

use crate::errors::Result;
use crate::result::{CellSet, SqlRows};

/// A live, request-scoped connection to the OLAP engine.
pub trait OlapConnection: Send + Sync {
    /// Catalog the connection was opened against, if any.
    fn default_catalog_name(&self) -> Option<String>;

    fn catalogs(&self) -> Result<Vec<Arc<dyn Catalog>>>;

    fn catalog(&self, name: &str) -> Result<Option<Arc<dyn Catalog>>> {
        Ok(self
            .catalogs()?
            .into_iter()
            .find(|c| c.name() == name))
    }

    /// Execute an MDX statement, producing a multidimensional result.
    fn execute(&self, statement: &str) -> Result<CellSet>;

    /// Execute a drillthrough statement, producing flat detail rows.
    /// `fields` restricts the output columns when non-empty; `max_rows`
    /// cuts the row count when set.
    fn execute_drillthrough(
        &self,
        statement: &str,
        max_rows: Option<usize>,
        fields: &[String],
    ) -> Result<SqlRows>;

    /// Release the connection. Must be idempotent; called on every exit
    /// path of a request, including faulting ones.
    fn close(&self);
}

pub trait Catalog: Send + Sync {
    fn name(&self) -> &str;
    fn schemas(&self) -> Result<Vec<Arc<dyn Schema>>>;
}

pub trait Schema: Send + Sync {
    fn name(&self) -> &str;
    fn cubes(&self) -> Result<Vec<Arc<dyn Cube>>>;
    /// Dimensions shared between cubes of this schema. Surfaced as a
    /// pseudo-cube by the dimension/hierarchy/level rowsets.
    fn shared_dimensions(&self) -> Result<Vec<Arc<dyn Dimension>>>;
}

pub trait Cube: Send + Sync {
    fn name(&self) -> &str;
    fn caption(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn last_modified(&self) -> Option<NaiveDateTime>;
    fn dimensions(&self) -> Result<Vec<Arc<dyn Dimension>>>;
    fn measures(&self) -> Result<Vec<Arc<dyn Measure>>>;
    fn named_sets(&self) -> Result<Vec<Arc<dyn NamedSet>>>;

    /// Direct lookups used by unique-name restrictions to skip the full
    /// traversal.
    fn lookup_member(&self, unique_name: &str) -> Result<Option<Arc<dyn Member>>>;
    fn lookup_level(&self, unique_name: &str) -> Result<Option<Arc<dyn Level>>>;
    fn lookup_hierarchy(&self, unique_name: &str) -> Result<Option<Arc<dyn Hierarchy>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionType {
    Standard,
    Time,
    Measures,
}

impl DimensionType {
    /// MDSCHEMA_DIMENSIONS wire code.
    pub fn xmla_ordinal(&self) -> i32 {
        match self {
            DimensionType::Standard => 3,
            DimensionType::Time => 1,
            DimensionType::Measures => 2,
        }
    }
}

pub trait Dimension: Send + Sync {
    fn name(&self) -> &str;
    fn unique_name(&self) -> &str;
    fn caption(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn dimension_type(&self) -> DimensionType;
    /// Zero-based position within its cube.
    fn ordinal(&self) -> usize;
    fn is_visible(&self) -> bool;
    fn hierarchies(&self) -> Result<Vec<Arc<dyn Hierarchy>>>;
}

pub trait Hierarchy: Send + Sync {
    fn name(&self) -> &str;
    fn unique_name(&self) -> &str;
    fn caption(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn dimension_unique_name(&self) -> &str;
    fn has_all(&self) -> bool;
    fn is_visible(&self) -> bool;
    fn levels(&self) -> Result<Vec<Arc<dyn Level>>>;
    fn default_member(&self) -> Result<Option<Arc<dyn Member>>>;
    /// Members of the topmost level.
    fn root_members(&self) -> Result<Vec<Arc<dyn Member>>>;
}

/// Declaration of a member property carried by a level.
#[derive(Debug, Clone)]
pub struct MemberPropertyDef {
    pub name: String,
    pub caption: String,
    pub data_type: XsdType,
    pub description: Option<String>,
}

pub trait Level: Send + Sync {
    fn name(&self) -> &str;
    fn unique_name(&self) -> &str;
    fn caption(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn hierarchy_unique_name(&self) -> &str;
    fn dimension_unique_name(&self) -> &str;
    /// Zero-based depth; the `(All)` level, when present, is depth 0.
    fn depth(&self) -> u32;
    fn is_all(&self) -> bool;
    /// Estimated member count, for LEVEL_CARDINALITY.
    fn cardinality(&self) -> usize;
    fn member_properties(&self) -> Vec<MemberPropertyDef>;
    fn members(&self) -> Result<Vec<Arc<dyn Member>>>;
}

pub trait Member: Send + Sync {
    fn name(&self) -> &str;
    fn unique_name(&self) -> &str;
    fn caption(&self) -> &str;
    fn ordinal(&self) -> i64;
    fn level_number(&self) -> u32;
    fn level_unique_name(&self) -> &str;
    fn hierarchy_unique_name(&self) -> &str;
    fn dimension_unique_name(&self) -> &str;
    fn is_all(&self) -> bool;
    fn is_calculated(&self) -> bool;
    /// Defaults to true when the backing visibility property is absent.
    fn is_visible(&self) -> bool;
    fn parent(&self) -> Result<Option<Arc<dyn Member>>>;
    fn children(&self) -> Result<Vec<Arc<dyn Member>>>;
    fn child_count(&self) -> usize;
    /// A member property value; `None` when the property is not set.
    fn property_value(&self, name: &str) -> Option<Datum>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureAggregator {
    Sum,
    Count,
    Min,
    Max,
    Avg,
    DistinctCount,
    Calculated,
    Unknown,
}

impl MeasureAggregator {
    /// MDSCHEMA_MEASURES wire code.
    pub fn xmla_ordinal(&self) -> i32 {
        match self {
            MeasureAggregator::Sum => 1,
            MeasureAggregator::Count => 2,
            MeasureAggregator::Min => 3,
            MeasureAggregator::Max => 4,
            MeasureAggregator::Avg => 5,
            MeasureAggregator::DistinctCount => 8,
            // Calculated and anything unrecognized.
            MeasureAggregator::Calculated | MeasureAggregator::Unknown => 127,
        }
    }
}

pub trait Measure: Send + Sync {
    fn name(&self) -> &str;
    fn unique_name(&self) -> &str;
    fn caption(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn aggregator(&self) -> MeasureAggregator;
    fn is_visible(&self) -> bool;
    fn is_calculated(&self) -> bool;
    /// Internal type name; feeds the canonicalization hint.
    fn data_type_name(&self) -> Option<&str>;
    /// Unique names of the levels the measure depends on. Populated for
    /// stored measures only; calculated measures have none.
    fn levels_list(&self) -> Option<Vec<String>>;
}

pub trait NamedSet: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn expression(&self) -> &str;
}
