//! Rowset populators.
//!
//! One populate function per rowset definition. All follow the same
//! contract: walk the metadata model under the request's restriction
//! predicates, pruning as early as possible, emit one `Row` per entity,
//! then sort per the definition's sort columns.

pub mod dbschema;
pub mod discover;
pub mod mdschema;

use std::sync::Arc;

use olapmeta::{Catalog, Cube, Dimension, Schema};

use crate::errors::Result;
use crate::row::{Row, sort_rows};
use crate::rowset::{DiscoverContext, RowsetDef};

/// Sort and return. Every populator funnels through here so the sort
/// contract holds regardless of traversal order.
fn finish(def: &RowsetDef, mut rows: Vec<Row>) -> Result<Vec<Row>> {
    sort_rows(&mut rows, def.sort);
    Ok(rows)
}

/// Catalogs passing both the named restriction column and the Catalog
/// request property.
fn catalogs_for(cx: &DiscoverContext<'_>, column: &str) -> Result<Vec<Arc<dyn Catalog>>> {
    let mut out = Vec::new();
    for catalog in cx.conn.catalogs()? {
        if !cx.restrictions.passes(column, catalog.name()) {
            continue;
        }
        if let Some(wanted) = cx.properties.catalog() {
            if catalog.name() != wanted {
                continue;
            }
        }
        out.push(catalog);
    }
    Ok(out)
}

/// A cube or the pseudo-cube that surfaces a schema's shared dimensions
/// through the dimension/hierarchy/level rowsets. The pseudo-cube is
/// named after its schema.
enum CubeScope {
    Cube(Arc<dyn Cube>),
    Shared {
        name: String,
        dimensions: Vec<Arc<dyn Dimension>>,
    },
}

impl CubeScope {
    fn name(&self) -> &str {
        match self {
            CubeScope::Cube(c) => c.name(),
            CubeScope::Shared { name, .. } => name,
        }
    }

    fn dimensions(&self) -> Result<Vec<Arc<dyn Dimension>>> {
        match self {
            CubeScope::Cube(c) => Ok(c.dimensions()?),
            CubeScope::Shared { dimensions, .. } => Ok(dimensions.clone()),
        }
    }

    fn cube(&self) -> Option<&Arc<dyn Cube>> {
        match self {
            CubeScope::Cube(c) => Some(c),
            CubeScope::Shared { .. } => None,
        }
    }
}

/// Cubes of a schema passing the CUBE_NAME restriction, optionally
/// preceded by the shared-dimensions pseudo-cube.
fn cube_scopes(
    cx: &DiscoverContext<'_>,
    schema: &Arc<dyn Schema>,
    with_shared: bool,
) -> Result<Vec<CubeScope>> {
    let mut out = Vec::new();
    if with_shared {
        let shared = schema.shared_dimensions()?;
        if !shared.is_empty() && cx.restrictions.passes("CUBE_NAME", schema.name()) {
            out.push(CubeScope::Shared {
                name: schema.name().to_string(),
                dimensions: shared,
            });
        }
    }
    for cube in schema.cubes()? {
        if cx.restrictions.passes("CUBE_NAME", cube.name()) {
            out.push(CubeScope::Cube(cube));
        }
    }
    Ok(out)
}
