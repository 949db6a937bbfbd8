//! In-memory metadata model.
//!
//! A complete implementation of the model traits backed by plain structs.
//! Link fields sit behind `RwLock`s so a model can be wired up
//! incrementally; once built it is only ever read. Query execution is
//! canned: statements registered with [`MemConnection::register_statement`]
//! return their pre-built cell sets.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, Weak};

use chrono::NaiveDateTime;
use xmlarepr::Datum;

use crate::errors::{MetaError, Result};
use crate::model::{
    Catalog, Cube, Dimension, DimensionType, Hierarchy, Level, Measure, MeasureAggregator, Member,
    MemberPropertyDef, NamedSet, OlapConnection, Schema,
};
use crate::result::{CellSet, SqlRows};

pub struct MemMember {
    name: String,
    unique_name: String,
    caption: String,
    ordinal: i64,
    level_number: u32,
    level_unique_name: String,
    hierarchy_unique_name: String,
    dimension_unique_name: String,
    all: bool,
    calculated: bool,
    /// `None` means the visibility property is absent, which reads as
    /// visible.
    visible: RwLock<Option<bool>>,
    properties: RwLock<HashMap<String, Datum>>,
    parent: RwLock<Weak<MemMember>>,
    children: RwLock<Vec<Arc<MemMember>>>,
}

impl MemMember {
    pub fn new(name: &str, unique_name: &str, ordinal: i64, level: &MemLevel) -> Arc<MemMember> {
        Arc::new(MemMember {
            name: name.to_string(),
            unique_name: unique_name.to_string(),
            caption: name.to_string(),
            ordinal,
            level_number: level.depth,
            level_unique_name: level.unique_name.clone(),
            hierarchy_unique_name: level.hierarchy_unique_name.clone(),
            dimension_unique_name: level.dimension_unique_name.clone(),
            all: level.all,
            calculated: false,
            visible: RwLock::new(None),
            properties: RwLock::new(HashMap::new()),
            parent: RwLock::new(Weak::new()),
            children: RwLock::new(Vec::new()),
        })
    }

    /// Set the visibility property. An absent property reads as visible;
    /// setting keeps "absent" distinguishable from "false".
    pub fn set_visible(&self, visible: bool) {
        *self.visible.write().unwrap() = Some(visible);
    }

    pub fn set_property(&self, name: &str, value: Datum) {
        self.properties
            .write()
            .unwrap()
            .insert(name.to_string(), value);
    }

    /// Attach `child` under `parent`, maintaining both link directions.
    pub fn add_child(parent: &Arc<MemMember>, child: &Arc<MemMember>) {
        *child.parent.write().unwrap() = Arc::downgrade(parent);
        parent.children.write().unwrap().push(child.clone());
    }
}

impl Member for MemMember {
    fn name(&self) -> &str {
        &self.name
    }
    fn unique_name(&self) -> &str {
        &self.unique_name
    }
    fn caption(&self) -> &str {
        &self.caption
    }
    fn ordinal(&self) -> i64 {
        self.ordinal
    }
    fn level_number(&self) -> u32 {
        self.level_number
    }
    fn level_unique_name(&self) -> &str {
        &self.level_unique_name
    }
    fn hierarchy_unique_name(&self) -> &str {
        &self.hierarchy_unique_name
    }
    fn dimension_unique_name(&self) -> &str {
        &self.dimension_unique_name
    }
    fn is_all(&self) -> bool {
        self.all
    }
    fn is_calculated(&self) -> bool {
        self.calculated
    }
    fn is_visible(&self) -> bool {
        self.visible.read().unwrap().unwrap_or(true)
    }
    fn parent(&self) -> Result<Option<Arc<dyn Member>>> {
        Ok(self
            .parent
            .read()
            .unwrap()
            .upgrade()
            .map(|m| m as Arc<dyn Member>))
    }
    fn children(&self) -> Result<Vec<Arc<dyn Member>>> {
        Ok(self
            .children
            .read()
            .unwrap()
            .iter()
            .map(|m| m.clone() as Arc<dyn Member>)
            .collect())
    }
    fn child_count(&self) -> usize {
        self.children.read().unwrap().len()
    }
    fn property_value(&self, name: &str) -> Option<Datum> {
        self.properties.read().unwrap().get(name).cloned()
    }
}

pub struct MemLevel {
    name: String,
    unique_name: String,
    caption: String,
    description: Option<String>,
    hierarchy_unique_name: String,
    dimension_unique_name: String,
    depth: u32,
    all: bool,
    member_properties: RwLock<Vec<MemberPropertyDef>>,
    members: RwLock<Vec<Arc<MemMember>>>,
}

impl MemLevel {
    pub fn new(name: &str, hierarchy: &MemHierarchy, depth: u32, all: bool) -> Arc<MemLevel> {
        Arc::new(MemLevel {
            name: name.to_string(),
            unique_name: format!("{}.[{}]", hierarchy.unique_name, name),
            caption: name.to_string(),
            description: None,
            hierarchy_unique_name: hierarchy.unique_name.clone(),
            dimension_unique_name: hierarchy.dimension_unique_name.clone(),
            depth,
            all,
            member_properties: RwLock::new(Vec::new()),
            members: RwLock::new(Vec::new()),
        })
    }

    pub fn add_member(&self, member: &Arc<MemMember>) {
        self.members.write().unwrap().push(member.clone());
    }

    pub fn set_member_properties(&self, props: Vec<MemberPropertyDef>) {
        *self.member_properties.write().unwrap() = props;
    }
}

impl Level for MemLevel {
    fn name(&self) -> &str {
        &self.name
    }
    fn unique_name(&self) -> &str {
        &self.unique_name
    }
    fn caption(&self) -> &str {
        &self.caption
    }
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    fn hierarchy_unique_name(&self) -> &str {
        &self.hierarchy_unique_name
    }
    fn dimension_unique_name(&self) -> &str {
        &self.dimension_unique_name
    }
    fn depth(&self) -> u32 {
        self.depth
    }
    fn is_all(&self) -> bool {
        self.all
    }
    fn cardinality(&self) -> usize {
        self.members.read().unwrap().len()
    }
    fn member_properties(&self) -> Vec<MemberPropertyDef> {
        self.member_properties.read().unwrap().clone()
    }
    fn members(&self) -> Result<Vec<Arc<dyn Member>>> {
        Ok(self
            .members
            .read()
            .unwrap()
            .iter()
            .map(|m| m.clone() as Arc<dyn Member>)
            .collect())
    }
}

pub struct MemHierarchy {
    name: String,
    unique_name: String,
    caption: String,
    description: Option<String>,
    dimension_unique_name: String,
    has_all: bool,
    visible: bool,
    levels: RwLock<Vec<Arc<MemLevel>>>,
    default_member: RwLock<Option<Arc<MemMember>>>,
}

impl MemHierarchy {
    pub fn new(name: &str, dimension: &MemDimension, has_all: bool) -> Arc<MemHierarchy> {
        Arc::new(MemHierarchy {
            name: name.to_string(),
            unique_name: format!("[{}]", name),
            caption: name.to_string(),
            description: None,
            dimension_unique_name: dimension.unique_name.clone(),
            has_all,
            visible: true,
            levels: RwLock::new(Vec::new()),
            default_member: RwLock::new(None),
        })
    }

    pub fn add_level(&self, level: &Arc<MemLevel>) {
        self.levels.write().unwrap().push(level.clone());
    }

    pub fn set_default_member(&self, member: &Arc<MemMember>) {
        *self.default_member.write().unwrap() = Some(member.clone());
    }
}

impl Hierarchy for MemHierarchy {
    fn name(&self) -> &str {
        &self.name
    }
    fn unique_name(&self) -> &str {
        &self.unique_name
    }
    fn caption(&self) -> &str {
        &self.caption
    }
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    fn dimension_unique_name(&self) -> &str {
        &self.dimension_unique_name
    }
    fn has_all(&self) -> bool {
        self.has_all
    }
    fn is_visible(&self) -> bool {
        self.visible
    }
    fn levels(&self) -> Result<Vec<Arc<dyn Level>>> {
        Ok(self
            .levels
            .read()
            .unwrap()
            .iter()
            .map(|l| l.clone() as Arc<dyn Level>)
            .collect())
    }
    fn default_member(&self) -> Result<Option<Arc<dyn Member>>> {
        Ok(self
            .default_member
            .read()
            .unwrap()
            .clone()
            .map(|m| m as Arc<dyn Member>))
    }
    fn root_members(&self) -> Result<Vec<Arc<dyn Member>>> {
        let levels = self.levels.read().unwrap();
        match levels.first() {
            Some(level) => level.members(),
            None => Ok(Vec::new()),
        }
    }
}

pub struct MemDimension {
    name: String,
    unique_name: String,
    caption: String,
    description: Option<String>,
    dimension_type: DimensionType,
    ordinal: usize,
    visible: bool,
    hierarchies: RwLock<Vec<Arc<MemHierarchy>>>,
}

impl MemDimension {
    pub fn new(name: &str, dimension_type: DimensionType, ordinal: usize) -> Arc<MemDimension> {
        Arc::new(MemDimension {
            name: name.to_string(),
            unique_name: format!("[{}]", name),
            caption: name.to_string(),
            description: None,
            dimension_type,
            ordinal,
            visible: true,
            hierarchies: RwLock::new(Vec::new()),
        })
    }

    pub fn add_hierarchy(&self, hierarchy: &Arc<MemHierarchy>) {
        self.hierarchies.write().unwrap().push(hierarchy.clone());
    }
}

impl Dimension for MemDimension {
    fn name(&self) -> &str {
        &self.name
    }
    fn unique_name(&self) -> &str {
        &self.unique_name
    }
    fn caption(&self) -> &str {
        &self.caption
    }
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    fn dimension_type(&self) -> DimensionType {
        self.dimension_type
    }
    fn ordinal(&self) -> usize {
        self.ordinal
    }
    fn is_visible(&self) -> bool {
        self.visible
    }
    fn hierarchies(&self) -> Result<Vec<Arc<dyn Hierarchy>>> {
        Ok(self
            .hierarchies
            .read()
            .unwrap()
            .iter()
            .map(|h| h.clone() as Arc<dyn Hierarchy>)
            .collect())
    }
}

pub struct MemMeasure {
    pub name: String,
    pub unique_name: String,
    pub caption: String,
    pub description: Option<String>,
    pub aggregator: MeasureAggregator,
    pub visible: bool,
    pub calculated: bool,
    pub data_type_name: Option<String>,
    pub levels_list: Option<Vec<String>>,
}

impl MemMeasure {
    pub fn new(name: &str, aggregator: MeasureAggregator) -> MemMeasure {
        MemMeasure {
            name: name.to_string(),
            unique_name: format!("[Measures].[{}]", name),
            caption: name.to_string(),
            description: None,
            aggregator,
            visible: true,
            calculated: matches!(aggregator, MeasureAggregator::Calculated),
            data_type_name: None,
            levels_list: None,
        }
    }
}

impl Measure for MemMeasure {
    fn name(&self) -> &str {
        &self.name
    }
    fn unique_name(&self) -> &str {
        &self.unique_name
    }
    fn caption(&self) -> &str {
        &self.caption
    }
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    fn aggregator(&self) -> MeasureAggregator {
        self.aggregator
    }
    fn is_visible(&self) -> bool {
        self.visible
    }
    fn is_calculated(&self) -> bool {
        self.calculated
    }
    fn data_type_name(&self) -> Option<&str> {
        self.data_type_name.as_deref()
    }
    fn levels_list(&self) -> Option<Vec<String>> {
        self.levels_list.clone()
    }
}

pub struct MemNamedSet {
    pub name: String,
    pub description: Option<String>,
    pub expression: String,
}

impl NamedSet for MemNamedSet {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    fn expression(&self) -> &str {
        &self.expression
    }
}

pub struct MemCube {
    name: String,
    caption: String,
    description: Option<String>,
    last_modified: Option<NaiveDateTime>,
    dimensions: RwLock<Vec<Arc<MemDimension>>>,
    measures: RwLock<Vec<Arc<MemMeasure>>>,
    named_sets: RwLock<Vec<Arc<MemNamedSet>>>,
}

impl MemCube {
    pub fn new(name: &str) -> Arc<MemCube> {
        Arc::new(MemCube {
            name: name.to_string(),
            caption: name.to_string(),
            description: None,
            last_modified: None,
            dimensions: RwLock::new(Vec::new()),
            measures: RwLock::new(Vec::new()),
            named_sets: RwLock::new(Vec::new()),
        })
    }

    pub fn add_dimension(&self, dimension: &Arc<MemDimension>) {
        self.dimensions.write().unwrap().push(dimension.clone());
    }

    pub fn add_measure(&self, measure: MemMeasure) {
        self.measures.write().unwrap().push(Arc::new(measure));
    }

    pub fn add_named_set(&self, set: MemNamedSet) {
        self.named_sets.write().unwrap().push(Arc::new(set));
    }
}

fn find_member_in(member: &Arc<MemMember>, unique_name: &str) -> Option<Arc<MemMember>> {
    if member.unique_name == unique_name {
        return Some(member.clone());
    }
    for child in member.children.read().unwrap().iter() {
        if let Some(found) = find_member_in(child, unique_name) {
            return Some(found);
        }
    }
    None
}

impl Cube for MemCube {
    fn name(&self) -> &str {
        &self.name
    }
    fn caption(&self) -> &str {
        &self.caption
    }
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    fn last_modified(&self) -> Option<NaiveDateTime> {
        self.last_modified
    }
    fn dimensions(&self) -> Result<Vec<Arc<dyn Dimension>>> {
        Ok(self
            .dimensions
            .read()
            .unwrap()
            .iter()
            .map(|d| d.clone() as Arc<dyn Dimension>)
            .collect())
    }
    fn measures(&self) -> Result<Vec<Arc<dyn Measure>>> {
        Ok(self
            .measures
            .read()
            .unwrap()
            .iter()
            .map(|m| m.clone() as Arc<dyn Measure>)
            .collect())
    }
    fn named_sets(&self) -> Result<Vec<Arc<dyn NamedSet>>> {
        Ok(self
            .named_sets
            .read()
            .unwrap()
            .iter()
            .map(|s| s.clone() as Arc<dyn NamedSet>)
            .collect())
    }

    fn lookup_member(&self, unique_name: &str) -> Result<Option<Arc<dyn Member>>> {
        for dim in self.dimensions.read().unwrap().iter() {
            for hier in dim.hierarchies.read().unwrap().iter() {
                for level in hier.levels.read().unwrap().iter() {
                    for member in level.members.read().unwrap().iter() {
                        if let Some(found) = find_member_in(member, unique_name) {
                            return Ok(Some(found as Arc<dyn Member>));
                        }
                    }
                }
            }
        }
        Ok(None)
    }

    fn lookup_level(&self, unique_name: &str) -> Result<Option<Arc<dyn Level>>> {
        for dim in self.dimensions.read().unwrap().iter() {
            for hier in dim.hierarchies.read().unwrap().iter() {
                for level in hier.levels.read().unwrap().iter() {
                    if level.unique_name == unique_name {
                        return Ok(Some(level.clone() as Arc<dyn Level>));
                    }
                }
            }
        }
        Ok(None)
    }

    fn lookup_hierarchy(&self, unique_name: &str) -> Result<Option<Arc<dyn Hierarchy>>> {
        for dim in self.dimensions.read().unwrap().iter() {
            for hier in dim.hierarchies.read().unwrap().iter() {
                if hier.unique_name == unique_name {
                    return Ok(Some(hier.clone() as Arc<dyn Hierarchy>));
                }
            }
        }
        Ok(None)
    }
}

pub struct MemSchema {
    name: String,
    cubes: RwLock<Vec<Arc<MemCube>>>,
    shared_dimensions: RwLock<Vec<Arc<MemDimension>>>,
}

impl MemSchema {
    pub fn new(name: &str) -> Arc<MemSchema> {
        Arc::new(MemSchema {
            name: name.to_string(),
            cubes: RwLock::new(Vec::new()),
            shared_dimensions: RwLock::new(Vec::new()),
        })
    }

    pub fn add_cube(&self, cube: &Arc<MemCube>) {
        self.cubes.write().unwrap().push(cube.clone());
    }

    pub fn add_shared_dimension(&self, dimension: &Arc<MemDimension>) {
        self.shared_dimensions.write().unwrap().push(dimension.clone());
    }
}

impl Schema for MemSchema {
    fn name(&self) -> &str {
        &self.name
    }
    fn cubes(&self) -> Result<Vec<Arc<dyn Cube>>> {
        Ok(self
            .cubes
            .read()
            .unwrap()
            .iter()
            .map(|c| c.clone() as Arc<dyn Cube>)
            .collect())
    }
    fn shared_dimensions(&self) -> Result<Vec<Arc<dyn Dimension>>> {
        Ok(self
            .shared_dimensions
            .read()
            .unwrap()
            .iter()
            .map(|d| d.clone() as Arc<dyn Dimension>)
            .collect())
    }
}

pub struct MemCatalog {
    name: String,
    schemas: RwLock<Vec<Arc<MemSchema>>>,
}

impl MemCatalog {
    pub fn new(name: &str) -> Arc<MemCatalog> {
        Arc::new(MemCatalog {
            name: name.to_string(),
            schemas: RwLock::new(Vec::new()),
        })
    }

    pub fn add_schema(&self, schema: &Arc<MemSchema>) {
        self.schemas.write().unwrap().push(schema.clone());
    }
}

impl Catalog for MemCatalog {
    fn name(&self) -> &str {
        &self.name
    }
    fn schemas(&self) -> Result<Vec<Arc<dyn Schema>>> {
        Ok(self
            .schemas
            .read()
            .unwrap()
            .iter()
            .map(|s| s.clone() as Arc<dyn Schema>)
            .collect())
    }
}

/// Connection over an in-memory model with canned query results.
pub struct MemConnection {
    catalogs: RwLock<Vec<Arc<MemCatalog>>>,
    default_catalog: Option<String>,
    statements: RwLock<HashMap<String, CellSet>>,
    drill_statements: RwLock<HashMap<String, SqlRows>>,
    closed: AtomicBool,
}

impl MemConnection {
    pub fn new(default_catalog: Option<&str>) -> Arc<MemConnection> {
        Arc::new(MemConnection {
            catalogs: RwLock::new(Vec::new()),
            default_catalog: default_catalog.map(|s| s.to_string()),
            statements: RwLock::new(HashMap::new()),
            drill_statements: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn add_catalog(&self, catalog: &Arc<MemCatalog>) {
        self.catalogs.write().unwrap().push(catalog.clone());
    }

    pub fn register_statement(&self, statement: &str, result: CellSet) {
        self.statements
            .write()
            .unwrap()
            .insert(statement.to_string(), result);
    }

    pub fn register_drill_statement(&self, statement: &str, rows: SqlRows) {
        self.drill_statements
            .write()
            .unwrap()
            .insert(statement.to_string(), rows);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl OlapConnection for MemConnection {
    fn default_catalog_name(&self) -> Option<String> {
        self.default_catalog.clone()
    }

    fn catalogs(&self) -> Result<Vec<Arc<dyn Catalog>>> {
        Ok(self
            .catalogs
            .read()
            .unwrap()
            .iter()
            .map(|c| c.clone() as Arc<dyn Catalog>)
            .collect())
    }

    fn execute(&self, statement: &str) -> Result<CellSet> {
        self.statements
            .read()
            .unwrap()
            .get(statement)
            .cloned()
            .ok_or_else(|| MetaError::Execute(format!("unknown statement: {}", statement)))
    }

    fn execute_drillthrough(
        &self,
        statement: &str,
        max_rows: Option<usize>,
        fields: &[String],
    ) -> Result<SqlRows> {
        let rows = self
            .drill_statements
            .read()
            .unwrap()
            .get(statement)
            .cloned()
            .ok_or_else(|| MetaError::DrillThrough(format!("unknown statement: {}", statement)))?;

        let mut result = if fields.is_empty() {
            rows
        } else {
            let keep: Vec<usize> = rows
                .columns
                .iter()
                .enumerate()
                .filter(|(_, c)| fields.iter().any(|f| f.eq_ignore_ascii_case(&c.name)))
                .map(|(i, _)| i)
                .collect();
            SqlRows {
                columns: keep.iter().map(|&i| rows.columns[i].clone()).collect(),
                rows: rows
                    .rows
                    .iter()
                    .map(|r| keep.iter().map(|&i| r[i].clone()).collect())
                    .collect(),
            }
        };
        if let Some(max) = max_rows {
            result.rows.truncate(max);
        }
        Ok(result)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Canned models shared by the workspace's test suites.
pub mod fixtures {
    use super::*;
    use crate::result::{Cell, CellSetAxis, Position};

    /// Cube with a three-level geography hierarchy: one root, two
    /// children, four grandchildren.
    ///
    /// ```text
    /// [Geo].[All Geos]
    ///   [Geo].[North]    [Geo].[South]
    ///     [NE] [NW]        [SE] [SW]
    /// ```
    pub fn geo_cube() -> Arc<MemCube> {
        let cube = MemCube::new("SalesGeo");
        let dim = MemDimension::new("Geo", DimensionType::Standard, 0);
        let hier = MemHierarchy::new("Geo", &dim, true);
        let all_level = MemLevel::new("(All)", &hier, 0, true);
        let region_level = MemLevel::new("Region", &hier, 1, false);
        let area_level = MemLevel::new("Area", &hier, 2, false);
        area_level.set_member_properties(vec![MemberPropertyDef {
            name: "Population".to_string(),
            caption: "Population".to_string(),
            data_type: xmlarepr::XsdType::Int,
            description: None,
        }]);
        hier.add_level(&all_level);
        hier.add_level(&region_level);
        hier.add_level(&area_level);
        dim.add_hierarchy(&hier);
        cube.add_dimension(&dim);

        let root = MemMember::new("All Geos", "[Geo].[All Geos]", 0, &all_level);
        all_level.add_member(&root);
        hier.set_default_member(&root);

        let mut ordinal = 1;
        for (region, areas) in [("North", ["NE", "NW"]), ("South", ["SE", "SW"])] {
            let region_member = MemMember::new(
                region,
                &format!("[Geo].[{}]", region),
                ordinal,
                &region_level,
            );
            ordinal += 1;
            region_level.add_member(&region_member);
            MemMember::add_child(&root, &region_member);
            for area in areas {
                let area_member = MemMember::new(
                    area,
                    &format!("[Geo].[{}].[{}]", region, area),
                    ordinal,
                    &area_level,
                );
                ordinal += 1;
                area_level.add_member(&area_member);
                MemMember::add_child(&region_member, &area_member);
            }
        }
        cube
    }

    /// A small sales model: one catalog, one schema, the geo cube plus a
    /// gender hierarchy and three measures.
    pub fn sales_connection() -> Arc<MemConnection> {
        let conn = MemConnection::new(Some("FoodMart"));
        let catalog = MemCatalog::new("FoodMart");
        let schema = MemSchema::new("FoodMart");
        let cube = geo_cube();

        let gender = MemDimension::new("Gender", DimensionType::Standard, 1);
        let gender_hier = MemHierarchy::new("Gender", &gender, true);
        let gender_all_level = MemLevel::new("(All)", &gender_hier, 0, true);
        let gender_level = MemLevel::new("Gender", &gender_hier, 1, false);
        gender_hier.add_level(&gender_all_level);
        gender_hier.add_level(&gender_level);
        gender.add_hierarchy(&gender_hier);
        cube.add_dimension(&gender);

        let all_gender = MemMember::new("All Gender", "[Gender].[All Gender]", 0, &gender_all_level);
        gender_all_level.add_member(&all_gender);
        gender_hier.set_default_member(&all_gender);
        for (i, g) in ["F", "M"].iter().enumerate() {
            let m = MemMember::new(g, &format!("[Gender].[{}]", g), i as i64 + 1, &gender_level);
            gender_level.add_member(&m);
            MemMember::add_child(&all_gender, &m);
        }

        let mut unit_sales = MemMeasure::new("Unit Sales", MeasureAggregator::Sum);
        unit_sales.data_type_name = Some("Integer".to_string());
        unit_sales.levels_list = Some(vec!["[Geo].[Geo].[Area]".to_string()]);
        cube.add_measure(unit_sales);

        let mut store_sales = MemMeasure::new("Store Sales", MeasureAggregator::Sum);
        store_sales.data_type_name = Some("Numeric".to_string());
        store_sales.levels_list = Some(vec!["[Geo].[Geo].[Area]".to_string()]);
        cube.add_measure(store_sales);

        cube.add_measure(MemMeasure::new("Profit", MeasureAggregator::Calculated));

        cube.add_named_set(MemNamedSet {
            name: "Top Regions".to_string(),
            description: None,
            expression: "TopCount([Geo].[Region].Members, 2, [Measures].[Unit Sales])".to_string(),
        });

        schema.add_cube(&cube);
        catalog.add_schema(&schema);
        conn.add_catalog(&catalog);
        conn
    }

    /// 2x2 cell set over the sales model: genders on columns, regions on
    /// rows. Cell (1, 1) is left null to exercise sparse cell output.
    pub fn sales_cellset_2x2() -> CellSet {
        let conn = sales_connection();
        let catalogs = conn.catalogs().unwrap();
        let schemas = catalogs[0].schemas().unwrap();
        let cube = schemas[0].cubes().unwrap().into_iter().next().unwrap();

        let gender_hier = cube.lookup_hierarchy("[Gender]").unwrap().unwrap();
        let geo_hier = cube.lookup_hierarchy("[Geo]").unwrap().unwrap();

        let f = cube.lookup_member("[Gender].[F]").unwrap().unwrap();
        let m = cube.lookup_member("[Gender].[M]").unwrap().unwrap();
        let north = cube.lookup_member("[Geo].[North]").unwrap().unwrap();
        let south = cube.lookup_member("[Geo].[South]").unwrap().unwrap();

        let columns = CellSetAxis {
            hierarchies: vec![gender_hier],
            positions: vec![Position::new(vec![f]), Position::new(vec![m])],
        };
        let rows = CellSetAxis {
            hierarchies: vec![geo_hier],
            positions: vec![Position::new(vec![north]), Position::new(vec![south])],
        };

        let mut cells = HashMap::new();
        for (ordinal, value) in [(0, 131558i64), (1, 135215), (2, 78664)] {
            cells.insert(
                ordinal as usize,
                Cell {
                    value: Datum::Int64(value),
                    formatted_value: Some(format!("{}", value)),
                    properties: Vec::new(),
                },
            );
        }

        CellSet {
            cube,
            axes: vec![columns, rows],
            filter_axis: CellSetAxis::empty(),
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;

    #[test]
    fn geo_cube_has_seven_members() {
        let cube = fixtures::geo_cube();
        let root = cube.lookup_member("[Geo].[All Geos]").unwrap().unwrap();
        assert_eq!(root.child_count(), 2);
        let mut count = 0;
        fn walk(m: &Arc<dyn Member>, count: &mut usize) {
            *count += 1;
            for c in m.children().unwrap() {
                walk(&c, count);
            }
        }
        walk(&root, &mut count);
        assert_eq!(count, 7);
    }

    #[test]
    fn lookup_shortcuts() {
        let cube = fixtures::geo_cube();
        assert!(cube.lookup_member("[Geo].[North].[NE]").unwrap().is_some());
        assert!(cube.lookup_member("[Geo].[Nowhere]").unwrap().is_none());
        assert!(cube.lookup_level("[Geo].[Region]").unwrap().is_some());
        assert!(cube.lookup_hierarchy("[Geo]").unwrap().is_some());
    }

    #[test]
    fn close_is_idempotent() {
        let conn = fixtures::sales_connection();
        conn.close();
        conn.close();
        assert!(conn.is_closed());
    }

    #[test]
    fn drillthrough_applies_fields_and_max_rows() {
        use crate::result::{SqlColumn, SqlRows};
        use xmlarepr::XsdType;

        let conn = fixtures::sales_connection();
        conn.register_drill_statement(
            "DRILLTHROUGH SELECT",
            SqlRows {
                columns: vec![
                    SqlColumn {
                        name: "customer".to_string(),
                        xsd_type: XsdType::String,
                        nullable: false,
                    },
                    SqlColumn {
                        name: "amount".to_string(),
                        xsd_type: XsdType::Double,
                        nullable: true,
                    },
                ],
                rows: vec![
                    vec![Datum::Text("a".into()), Datum::Float64(1.5)],
                    vec![Datum::Text("b".into()), Datum::Float64(2.5)],
                    vec![Datum::Text("c".into()), Datum::Float64(3.5)],
                ],
            },
        );

        let out = conn
            .execute_drillthrough("DRILLTHROUGH SELECT", Some(2), &["amount".to_string()])
            .unwrap();
        assert_eq!(out.columns.len(), 1);
        assert_eq!(out.columns[0].name, "amount");
        assert_eq!(out.rows.len(), 2);
    }
}
