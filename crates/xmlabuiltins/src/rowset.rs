//! The rowset definition registry.
//!
//! One `RowsetDef` per well-known DISCOVER rowset, carrying the column
//! schema, the default sort order and the populate function. Built once
//! at startup; the ordinals are protocol-assigned and stable.

use once_cell::sync::Lazy;

use olapmeta::OlapConnection;

use crate::column::{ColumnDef, ColumnType};
use crate::enums::{ACCESS, AUTHENTICATION_MODE, PROVIDER_TYPE, TREE_OP};
use crate::errors::{BuiltinError, Result};
use crate::populate;
use crate::restrict::{RequestProperties, Restrictions};
use crate::row::Row;

/// Everything a populator needs from the request besides the rowset
/// definition itself.
pub struct DiscoverContext<'a> {
    pub conn: &'a dyn OlapConnection,
    pub restrictions: &'a Restrictions,
    pub properties: &'a RequestProperties,
}

pub type PopulateFn = fn(&'static RowsetDef, &DiscoverContext<'_>) -> Result<Vec<Row>>;

pub struct RowsetDef {
    pub name: &'static str,
    /// Protocol-assigned; never reordered.
    pub ordinal: i32,
    pub description: &'static str,
    pub columns: Vec<ColumnDef>,
    /// Default sort columns; empty means traversal insertion order.
    pub sort: &'static [&'static str],
    pub populate: PopulateFn,
}

impl RowsetDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn restriction_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.restriction)
    }

    /// Reject restrictions naming columns that are not restrictable.
    pub fn validate_restrictions(&self, restrictions: &Restrictions) -> Result<()> {
        for column in restrictions.columns() {
            match self.column(column) {
                Some(def) if def.restriction => {}
                _ => {
                    return Err(BuiltinError::NotRestrictable {
                        rowset: self.name.to_string(),
                        column: column.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn new_row(&'static self) -> Row {
        Row::new(&self.columns)
    }
}

fn col(
    name: &'static str,
    ty: ColumnType,
    restriction: bool,
    nullable: bool,
    description: &'static str,
) -> ColumnDef {
    ColumnDef::new(name, ty, restriction, nullable, description)
}

static ROWSET_DEFS: Lazy<Vec<RowsetDef>> = Lazy::new(|| {
    use ColumnType::*;

    vec![
        RowsetDef {
            name: "DISCOVER_DATASOURCES",
            ordinal: 1,
            description: "Returns a list of XML for Analysis data sources available on the server or Web Service.",
            columns: vec![
                col("DataSourceName", String, true, false, "The name of the data source, such as FoodMart 2000."),
                col("DataSourceDescription", String, false, true, "A description of the data source, as entered by the publisher."),
                col("URL", String, true, true, "The unique path that shows where to invoke the XML for Analysis methods for that data source."),
                col("DataSourceInfo", String, false, true, "A string containing any additional information required to connect to the data source."),
                col("ProviderName", String, true, true, "The name of the provider behind the data source."),
                ColumnDef::new_enum("ProviderType", EnumerationArray, &PROVIDER_TYPE, true, false, "The types of data supported by the provider.").unbounded(),
                ColumnDef::new_enum("AuthenticationMode", EnumString, &AUTHENTICATION_MODE, true, false, "Specification of what type of security mode the data source uses."),
            ],
            sort: &["DataSourceName"],
            populate: populate::discover::datasources,
        },
        RowsetDef {
            name: "DISCOVER_SCHEMA_ROWSETS",
            ordinal: 2,
            description: "Returns the names, values, and other information of all supported RequestType enumeration values.",
            columns: vec![
                col("SchemaName", String, true, false, "The name of the schema/request. This returns the values in the RequestTypes enumeration, plus any additional types supported by the provider."),
                col("SchemaGuid", Uuid, false, true, "The GUID of the schema."),
                col("Restrictions", NestedRowset, false, true, "An array of restrictions supported by provider.").with_nested(vec![
                    col("Name", String, false, false, "The name of the restriction."),
                    col("Type", String, false, false, "The XML data type of the restriction."),
                ]),
                col("Description", String, false, true, "A localizable description of the schema."),
                col("RestrictionsMask", UnsignedLong, false, true, "A bitmask of the restriction columns."),
            ],
            sort: &["SchemaName"],
            populate: populate::discover::schema_rowsets,
        },
        RowsetDef {
            name: "DISCOVER_ENUMERATORS",
            ordinal: 3,
            description: "Returns a list of names, data types, and enumeration values for enumerators supported by the provider of a specific data source.",
            columns: vec![
                col("EnumName", String, true, false, "The name of the enumerator that contains a set of values."),
                col("EnumDescription", String, false, true, "A localizable description of the enumerator."),
                col("EnumType", String, false, false, "The data type of the Enum values."),
                col("ElementName", String, false, false, "The name of one of the value elements in the enumerator set."),
                col("ElementDescription", String, false, true, "A localizable description of the element."),
                col("ElementValue", String, false, true, "The value of the element."),
            ],
            sort: &["EnumName"],
            populate: populate::discover::enumerators,
        },
        RowsetDef {
            name: "DISCOVER_PROPERTIES",
            ordinal: 4,
            description: "Returns a list of information and values about the requested properties that are supported by the specified data source provider.",
            columns: vec![
                col("PropertyName", String, true, false, "The name of the property."),
                col("PropertyDescription", String, false, true, "A localizable text description of the property."),
                col("PropertyType", String, false, true, "The XML data type of the property."),
                ColumnDef::new_enum("PropertyAccessType", EnumString, &ACCESS, false, false, "Access for the property."),
                col("IsRequired", Boolean, false, true, "True if a property is required, false if it is not required."),
                col("Value", String, false, true, "The current value of the property."),
            ],
            sort: &["PropertyName"],
            populate: populate::discover::properties,
        },
        RowsetDef {
            name: "DISCOVER_KEYWORDS",
            ordinal: 5,
            description: "Returns an XML list of keywords reserved by the provider.",
            columns: vec![
                col("Keyword", String, true, false, "A list of all the keywords reserved by a provider."),
            ],
            sort: &[],
            populate: populate::discover::keywords,
        },
        RowsetDef {
            name: "DISCOVER_LITERALS",
            ordinal: 6,
            description: "Returns information about literals supported by the provider.",
            columns: vec![
                col("LiteralName", String, true, false, "The name of the literal described in the row."),
                col("LiteralValue", String, false, true, "Contains the actual literal value."),
                col("LiteralInvalidChars", String, false, true, "The characters invalid in the literal."),
                col("LiteralInvalidStartingChars", String, false, true, "The characters invalid as the first character of the literal."),
                col("LiteralMaxLength", Integer, false, true, "The maximum number of characters in the literal. If there is no maximum or the maximum is unknown, the value is -1."),
            ],
            sort: &[],
            populate: populate::discover::literals,
        },
        RowsetDef {
            name: "DBSCHEMA_CATALOGS",
            ordinal: 7,
            description: "Identifies the physical attributes associated with catalogs accessible from the provider.",
            columns: vec![
                col("CATALOG_NAME", String, true, false, "Catalog name. Cannot be NULL."),
                col("DESCRIPTION", String, false, true, "Human-readable description of the catalog."),
                col("ROLES", String, false, true, "A comma delimited list of roles to which the current user belongs."),
                col("DATE_MODIFIED", DateTime, false, true, "The date that the catalog was last modified."),
            ],
            sort: &["CATALOG_NAME"],
            populate: populate::dbschema::catalogs,
        },
        RowsetDef {
            name: "DBSCHEMA_COLUMNS",
            ordinal: 8,
            description: "Returns a rowset with one row per measure and per level column of each cube.",
            columns: vec![
                col("TABLE_CATALOG", String, true, false, "The name of the Database."),
                col("TABLE_SCHEMA", String, true, true, "The name of the schema."),
                col("TABLE_NAME", String, true, false, "The name of the cube."),
                col("COLUMN_NAME", String, true, false, "The name of the attribute hierarchy or measure."),
                col("ORDINAL_POSITION", UnsignedInteger, false, false, "The position of the column, beginning with 1."),
                col("COLUMN_HAS_DEFAULT", Boolean, false, true, "A boolean that indicates whether the column has a default value."),
                col("COLUMN_FLAGS", UnsignedInteger, false, false, "A DBCOLUMNFLAGS bitmask indicating column properties."),
                col("IS_NULLABLE", Boolean, false, false, "Always returns false."),
                col("DATA_TYPE", UnsignedShort, false, false, "The data type of the column."),
                col("CHARACTER_MAXIMUM_LENGTH", UnsignedInteger, false, true, "The maximum possible length of a value within the column."),
                col("CHARACTER_OCTET_LENGTH", UnsignedInteger, false, true, "The maximum possible length of a value within the column, in bytes."),
                col("NUMERIC_PRECISION", UnsignedShort, false, true, "The maximum precision of the column for numeric data types."),
                col("NUMERIC_SCALE", Short, false, true, "The number of digits to the right of the decimal point."),
            ],
            sort: &["TABLE_CATALOG", "TABLE_SCHEMA", "TABLE_NAME"],
            populate: populate::dbschema::columns,
        },
        RowsetDef {
            name: "DBSCHEMA_PROVIDER_TYPES",
            ordinal: 9,
            description: "Identifies the (base) data types supported by the data provider.",
            columns: vec![
                col("TYPE_NAME", String, false, false, "The provider-specific data type name."),
                col("DATA_TYPE", UnsignedShort, true, false, "The indicator of the data type."),
                col("COLUMN_SIZE", UnsignedInteger, false, false, "The length of a non-numeric column or parameter that refers to either the maximum or the length defined for this type by the provider."),
                col("LITERAL_PREFIX", String, false, true, "The character or characters used to prefix a literal of this type in a text command."),
                col("LITERAL_SUFFIX", String, false, true, "The character or characters used to suffix a literal of this type in a text command."),
                col("IS_NULLABLE", Boolean, false, true, "A Boolean that indicates whether the data type is nullable."),
                col("CASE_SENSITIVE", Boolean, false, true, "A Boolean that indicates whether the data type is a characters type and case-sensitive."),
                col("SEARCHABLE", UnsignedInteger, false, true, "An integer indicating how the data type can be used in searches if the provider supports ICommandText."),
                col("UNSIGNED_ATTRIBUTE", Boolean, false, true, "A Boolean that indicates whether the data type is unsigned."),
                col("FIXED_PREC_SCALE", Boolean, false, true, "A Boolean that indicates whether the data type has a fixed precision and scale."),
                col("AUTO_UNIQUE_VALUE", Boolean, false, true, "A Boolean that indicates whether the data type is autoincrementing."),
                col("BEST_MATCH", Boolean, true, true, "A Boolean that indicates whether the data type is a best match."),
            ],
            sort: &["DATA_TYPE"],
            populate: populate::dbschema::provider_types,
        },
        RowsetDef {
            name: "DBSCHEMA_SCHEMATA",
            ordinal: 10,
            description: "Returns a rowset with one row per schema of each catalog.",
            columns: vec![
                col("CATALOG_NAME", String, true, false, "The name of the catalog."),
                col("SCHEMA_NAME", String, true, false, "The name of the schema."),
                col("SCHEMA_OWNER", String, true, true, "The owner of the schema."),
            ],
            sort: &["CATALOG_NAME", "SCHEMA_NAME"],
            populate: populate::dbschema::schemata,
        },
        RowsetDef {
            name: "DBSCHEMA_TABLES",
            ordinal: 11,
            description: "Returns the dimensions, measure groups, or schema rowsets exposed as tables.",
            columns: vec![
                col("TABLE_CATALOG", String, true, false, "The name of the catalog to which this object belongs."),
                col("TABLE_SCHEMA", String, true, true, "The name of the cube to which this object belongs."),
                col("TABLE_NAME", String, true, false, "The name of the object, if TABLE_TYPE is TABLE."),
                col("TABLE_TYPE", String, true, false, "The type of the table. TABLE indicates the object is a measure group. SYSTEM TABLE indicates the object is a dimension."),
                col("TABLE_GUID", Uuid, false, true, "Not supported."),
                col("DESCRIPTION", String, false, true, "A human-readable description of the object."),
                col("TABLE_PROPID", UnsignedInteger, false, true, "Not supported."),
                col("DATE_CREATED", DateTime, false, true, "Not supported."),
                col("DATE_MODIFIED", DateTime, false, true, "The date the object was last modified."),
            ],
            sort: &["TABLE_CATALOG", "TABLE_SCHEMA", "TABLE_NAME"],
            populate: populate::dbschema::tables,
        },
        RowsetDef {
            name: "DBSCHEMA_TABLES_INFO",
            ordinal: 12,
            description: "Returns similar information to the DBSCHEMA_TABLES rowset, with cardinality estimates.",
            columns: vec![
                col("TABLE_CATALOG", String, true, true, "Catalog name. NULL if the provider does not support catalogs."),
                col("TABLE_SCHEMA", String, true, true, "Unqualified schema name. NULL if the provider does not support schemas."),
                col("TABLE_NAME", String, true, false, "Table name."),
                col("TABLE_TYPE", String, true, true, "Table type. One of the following or a provider-specific value: ALIAS, TABLE, SYNONYM, SYSTEM TABLE, VIEW, GLOBAL TEMPORARY, LOCAL TEMPORARY, EXTERNAL TABLE, SYSTEM VIEW."),
                col("BOOKMARKS", Boolean, false, false, "Whether this table supports bookmarks. Always is false."),
                col("TABLE_VERSION", Long, false, true, "Version number for this table or NULL if the provider does not support returning table version information."),
                col("CARDINALITY", UnsignedLong, false, false, "Cardinality (number of rows) of the table."),
                col("DESCRIPTION", String, false, true, "Human-readable description of the table."),
                col("TABLE_PROPID", UnsignedInteger, false, true, "Property ID of the table. Return null."),
            ],
            sort: &[],
            populate: populate::dbschema::tables_info,
        },
        RowsetDef {
            name: "MDSCHEMA_ACTIONS",
            ordinal: 13,
            description: "Returns information about the actions available and is always empty here.",
            columns: vec![
                col("CATALOG_NAME", String, true, true, "The name of the catalog to which this action belongs."),
                col("SCHEMA_NAME", String, true, true, "The name of the schema to which this action belongs."),
                col("CUBE_NAME", String, true, false, "The name of the cube to which this action belongs."),
                col("ACTION_NAME", String, true, false, "The name of the action."),
                col("COORDINATE", String, false, false, "An MDX expression that specifies the object or coordinate the action applies to."),
                col("COORDINATE_TYPE", Integer, false, false, "A bitmap that specifies how the coordinate restriction column is treated."),
            ],
            sort: &[],
            populate: populate::mdschema::actions,
        },
        RowsetDef {
            name: "MDSCHEMA_CUBES",
            ordinal: 14,
            description: "Describes the structure of cubes within a database. Each cube takes one row.",
            columns: vec![
                col("CATALOG_NAME", String, true, false, "The name of the catalog to which this cube belongs."),
                col("SCHEMA_NAME", String, true, true, "The name of the schema to which this cube belongs."),
                col("CUBE_NAME", String, true, false, "Name of the cube."),
                col("CUBE_TYPE", String, true, false, "Cube type."),
                col("CUBE_GUID", Uuid, false, true, "Cube type."),
                col("CREATED_ON", DateTime, false, true, "Date and time of cube creation."),
                col("LAST_SCHEMA_UPDATE", DateTime, false, true, "Date and time of last schema update."),
                col("SCHEMA_UPDATED_BY", String, false, true, "User ID of the person who last updated the schema."),
                col("LAST_DATA_UPDATE", DateTime, false, true, "Date and time of last data update."),
                col("DATA_UPDATED_BY", String, false, true, "User ID of the person who last updated the data."),
                col("IS_DRILLTHROUGH_ENABLED", Boolean, false, false, "Describes whether DRILLTHROUGH can be performed on the members of a cube."),
                col("IS_WRITE_ENABLED", Boolean, false, false, "Describes whether a cube is write-enabled."),
                col("IS_LINKABLE", Boolean, false, false, "Describes whether a cube can be used in a linked cube."),
                col("IS_SQL_ENABLED", Boolean, false, false, "Describes whether or not SQL can be used on the cube."),
                col("CUBE_CAPTION", String, false, true, "The caption of the cube."),
                col("DESCRIPTION", String, false, true, "A user-friendly description of the cube."),
                col("DIMENSIONS", NestedRowset, false, true, "Dimensions in this cube.").with_nested(vec![
                    col("DIMENSION_NAME", String, false, false, "The name of the dimension."),
                    col("DIMENSION_UNIQUE_NAME", String, false, false, "The unique name of the dimension."),
                    col("DIMENSION_ORDINAL", UnsignedInteger, false, false, "The position of the dimension within the cube."),
                    col("DIMENSION_TYPE", Short, false, false, "The type of the dimension."),
                    col("HIERARCHIES", NestedRowset, false, true, "Hierarchies in this dimension.").with_nested(vec![
                        col("HIERARCHY_NAME", String, false, false, "The name of the hierarchy."),
                        col("HIERARCHY_UNIQUE_NAME", String, false, false, "The unique name of the hierarchy."),
                        col("LEVELS", NestedRowset, false, true, "Levels in this hierarchy.").with_nested(vec![
                            col("LEVEL_NAME", String, false, false, "The name of the level."),
                            col("LEVEL_UNIQUE_NAME", String, false, false, "The unique name of the level."),
                            col("LEVEL_NUMBER", UnsignedInteger, false, false, "The distance of the level from the root. Root is zero."),
                        ]),
                    ]),
                ]),
                col("SETS", NestedRowset, false, true, "Named sets in this cube.").with_nested(vec![
                    col("SET_NAME", String, false, false, "The name of the set."),
                    col("SCOPE", Integer, false, false, "The scope of the set."),
                ]),
                col("MEASURES", NestedRowset, false, true, "Measures in this cube.").with_nested(vec![
                    col("MEASURE_NAME", String, false, false, "The name of the measure."),
                    col("MEASURE_UNIQUE_NAME", String, false, false, "The unique name of the measure."),
                    col("MEASURE_AGGREGATOR", Integer, false, false, "How the measure was derived."),
                ]),
            ],
            sort: &["CATALOG_NAME", "SCHEMA_NAME", "CUBE_NAME"],
            populate: populate::mdschema::cubes,
        },
        RowsetDef {
            name: "MDSCHEMA_DIMENSIONS",
            ordinal: 15,
            description: "Returns information about the dimensions in a given cube. Each dimension takes one row.",
            columns: vec![
                col("CATALOG_NAME", String, true, true, "The name of the database."),
                col("SCHEMA_NAME", String, true, true, "Not supported."),
                col("CUBE_NAME", String, true, false, "The name of the cube."),
                col("DIMENSION_NAME", String, true, false, "The name of the dimension."),
                col("DIMENSION_UNIQUE_NAME", String, true, false, "The unique name of the dimension."),
                col("DIMENSION_GUID", Uuid, false, true, "Not supported."),
                col("DIMENSION_CAPTION", String, false, false, "The caption of the dimension."),
                col("DIMENSION_ORDINAL", UnsignedInteger, false, false, "The position of the dimension within the cube."),
                col("DIMENSION_TYPE", Short, false, false, "The type of the dimension."),
                col("DIMENSION_CARDINALITY", UnsignedInteger, false, false, "The number of members in the key attribute."),
                col("DEFAULT_HIERARCHY", String, false, true, "A hierarchy from the dimension. Preserved for backwards compatibility."),
                col("DESCRIPTION", String, false, true, "A user-friendly description of the dimension."),
                col("IS_VIRTUAL", Boolean, false, true, "Always false."),
                col("IS_READWRITE", Boolean, false, true, "A Boolean that indicates whether the dimension is write-enabled."),
                col("DIMENSION_UNIQUE_SETTINGS", Integer, false, true, "A bitmap that specifies which columns contain unique values if the dimension contains only members with unique names."),
                col("DIMENSION_MASTER_UNIQUE_NAME", String, false, true, "Always NULL."),
                col("DIMENSION_IS_VISIBLE", Boolean, false, true, "Always true."),
            ],
            sort: &["CATALOG_NAME", "SCHEMA_NAME", "CUBE_NAME", "DIMENSION_NAME"],
            populate: populate::mdschema::dimensions,
        },
        RowsetDef {
            name: "MDSCHEMA_FUNCTIONS",
            ordinal: 16,
            description: "Returns information about the functions that are currently available for use in the DAX and MDX languages.",
            columns: vec![
                col("FUNCTION_NAME", String, true, false, "The name of the function."),
                col("DESCRIPTION", String, false, true, "A description of the function."),
                col("PARAMETER_LIST", String, false, true, "A comma delimited list of parameters."),
                col("RETURN_TYPE", Integer, false, false, "The VARTYPE of the return data type of the function."),
                col("ORIGIN", Integer, true, false, "The origin of the function: 1 for MDX functions, 2 for user-defined functions."),
                col("INTERFACE_NAME", String, true, false, "The name of the interface for user-defined functions."),
                col("LIBRARY_NAME", String, true, true, "The name of the type library for user-defined functions. NULL for MDX functions."),
                col("CAPTION", String, false, true, "The display caption for the function."),
            ],
            sort: &["LIBRARY_NAME", "INTERFACE_NAME", "FUNCTION_NAME", "ORIGIN"],
            populate: populate::mdschema::functions,
        },
        RowsetDef {
            name: "MDSCHEMA_HIERARCHIES",
            ordinal: 17,
            description: "Returns information about hierarchies available in a dimension. Each hierarchy takes one row.",
            columns: vec![
                col("CATALOG_NAME", String, true, true, "The name of the catalog to which this hierarchy belongs."),
                col("SCHEMA_NAME", String, true, true, "Not supported."),
                col("CUBE_NAME", String, true, false, "The name of the cube to which this hierarchy belongs."),
                col("DIMENSION_UNIQUE_NAME", String, true, false, "The unique name of the dimension to which this hierarchy belongs."),
                col("HIERARCHY_NAME", String, true, false, "The name of the hierarchy. Blank if there is only a single hierarchy in the dimension."),
                col("HIERARCHY_UNIQUE_NAME", String, true, false, "The unique name of the hierarchy."),
                col("HIERARCHY_GUID", Uuid, false, true, "Hierarchy GUID."),
                col("HIERARCHY_CAPTION", String, false, false, "A label or a caption associated with the hierarchy."),
                col("DIMENSION_TYPE", Short, false, false, "The type of the dimension."),
                col("HIERARCHY_CARDINALITY", UnsignedInteger, false, false, "The number of members in the hierarchy."),
                col("DEFAULT_MEMBER", String, false, true, "The default member for this hierarchy."),
                col("ALL_MEMBER", String, false, true, "The member at the highest level of rollup in the hierarchy."),
                col("DESCRIPTION", String, false, true, "A human-readable description of the hierarchy. NULL if no description exists."),
                col("STRUCTURE", Short, false, false, "The structure of the hierarchy."),
                col("IS_VIRTUAL", Boolean, false, false, "Always returns false."),
                col("IS_READWRITE", Boolean, false, false, "A Boolean that indicates whether the Write Back to dimension column is enabled."),
                col("DIMENSION_UNIQUE_SETTINGS", Integer, false, false, "Always returns MDDIMENSIONS_MEMBER_KEY_UNIQUE (1)."),
                col("DIMENSION_IS_VISIBLE", Boolean, false, false, "Always returns true."),
                col("HIERARCHY_IS_VISIBLE", Boolean, false, false, "A Boolean that indicates whether the hierarchy is visible."),
                col("HIERARCHY_ORDINAL", UnsignedInteger, false, false, "The ordinal number of the hierarchy across all hierarchies of the cube."),
                col("DIMENSION_IS_SHARED", Boolean, false, false, "Always returns true."),
                col("PARENT_CHILD", Boolean, false, true, "Is hierarchy a parent."),
            ],
            sort: &["CATALOG_NAME", "SCHEMA_NAME", "CUBE_NAME", "DIMENSION_UNIQUE_NAME", "HIERARCHY_NAME"],
            populate: populate::mdschema::hierarchies,
        },
        RowsetDef {
            name: "MDSCHEMA_LEVELS",
            ordinal: 18,
            description: "Returns rowset contains information about the levels available in a dimension. Each level takes one row.",
            columns: vec![
                col("CATALOG_NAME", String, true, true, "The name of the catalog to which this level belongs."),
                col("SCHEMA_NAME", String, true, true, "Not supported."),
                col("CUBE_NAME", String, true, false, "The name of the cube to which this level belongs."),
                col("DIMENSION_UNIQUE_NAME", String, true, false, "The unique name of the dimension to which this level belongs."),
                col("HIERARCHY_UNIQUE_NAME", String, true, false, "The unique name of the hierarchy."),
                col("LEVEL_NAME", String, true, false, "The name of the level."),
                col("LEVEL_UNIQUE_NAME", String, true, false, "The properly escaped unique name of the level."),
                col("LEVEL_GUID", Uuid, false, true, "Level GUID."),
                col("LEVEL_CAPTION", String, false, false, "A label or caption associated with the hierarchy."),
                col("LEVEL_NUMBER", UnsignedInteger, false, false, "The distance of the level from the root of the hierarchy. Root level is zero."),
                col("LEVEL_CARDINALITY", UnsignedInteger, false, false, "The number of members in the level. This value can be an approximation of the real cardinality."),
                col("LEVEL_TYPE", Integer, false, false, "Type of the level."),
                col("CUSTOM_ROLLUP_SETTINGS", Integer, false, false, "A bitmap that specifies the custom rollup options."),
                col("LEVEL_UNIQUE_SETTINGS", Integer, false, false, "A bitmap that specifies which columns contain unique values, if the level only has members with unique names or keys."),
                col("LEVEL_IS_VISIBLE", Boolean, false, false, "A Boolean that indicates whether the level is visible."),
                col("DESCRIPTION", String, false, true, "A human-readable description of the level. NULL if no description exists."),
            ],
            sort: &["CATALOG_NAME", "SCHEMA_NAME", "CUBE_NAME", "DIMENSION_UNIQUE_NAME", "HIERARCHY_UNIQUE_NAME", "LEVEL_NUMBER"],
            populate: populate::mdschema::levels,
        },
        RowsetDef {
            name: "MDSCHEMA_MEASURES",
            ordinal: 19,
            description: "Returns information about the available measures. Each measure takes one row.",
            columns: vec![
                col("CATALOG_NAME", String, true, true, "The name of the catalog to which this measure belongs."),
                col("SCHEMA_NAME", String, true, true, "The name of the schema to which this measure belongs."),
                col("CUBE_NAME", String, true, false, "The name of the cube to which this measure belongs."),
                col("MEASURE_NAME", String, true, false, "The name of the measure."),
                col("MEASURE_UNIQUE_NAME", String, true, false, "The Unique name of the measure."),
                col("MEASURE_CAPTION", String, false, false, "A label or caption associated with the measure."),
                col("MEASURE_GUID", Uuid, false, true, "Measure GUID."),
                col("MEASURE_AGGREGATOR", Integer, false, false, "How a measure was derived."),
                col("DATA_TYPE", UnsignedShort, false, false, "Data type of the measure."),
                col("MEASURE_IS_VISIBLE", Boolean, false, false, "A Boolean that always returns True. If the measure is not visible, it will not be included in the schema rowset."),
                col("LEVELS_LIST", String, false, true, "A string that always returns NULL except for measures of stored type."),
                col("DESCRIPTION", String, false, true, "A human-readable description of the measure."),
                col("DEFAULT_FORMAT_STRING", String, false, true, "The default format string for the measure."),
            ],
            sort: &["CATALOG_NAME", "SCHEMA_NAME", "CUBE_NAME", "MEASURE_NAME"],
            populate: populate::mdschema::measures,
        },
        RowsetDef {
            name: "MDSCHEMA_MEMBERS",
            ordinal: 20,
            description: "Returns information about the members available in a dimension. Each member takes one row.",
            columns: vec![
                col("CATALOG_NAME", String, true, true, "The name of the catalog to which this member belongs."),
                col("SCHEMA_NAME", String, true, true, "The name of the schema to which this member belongs."),
                col("CUBE_NAME", String, true, false, "Name of the cube to which this member belongs."),
                col("DIMENSION_UNIQUE_NAME", String, true, false, "Unique name of the dimension to which this member belongs."),
                col("HIERARCHY_UNIQUE_NAME", String, true, false, "Unique name of the hierarchy. If the member belongs to more than one hierarchy, there is one row for each hierarchy to which it belongs."),
                col("LEVEL_UNIQUE_NAME", String, true, false, "Unique name of the level to which the member belongs."),
                col("LEVEL_NUMBER", UnsignedInteger, true, false, "The distance of the member from the root of the hierarchy."),
                col("MEMBER_ORDINAL", UnsignedInteger, false, false, "Ordinal number of the member. Sort rank of the member when members of this dimension are sorted in their natural sort order."),
                col("MEMBER_NAME", String, true, false, "Name of the member."),
                col("MEMBER_UNIQUE_NAME", String, true, false, "Unique name of the member."),
                col("MEMBER_TYPE", Integer, true, false, "Type of the member."),
                col("MEMBER_GUID", Uuid, false, true, "Memeber GUID."),
                col("MEMBER_CAPTION", String, true, false, "A label or caption associated with the member."),
                col("CHILDREN_CARDINALITY", UnsignedInteger, false, false, "Number of children that the member has. This can be an estimate."),
                col("PARENT_LEVEL", UnsignedInteger, false, false, "The distance of the member's parent from the root level of the hierarchy."),
                col("PARENT_UNIQUE_NAME", String, false, true, "Unique name of the member's parent. NULL is returned for any members at the root level."),
                col("PARENT_COUNT", UnsignedInteger, false, false, "Number of parents that this member has."),
                ColumnDef::new_enum("TREE_OP", Enumeration, &TREE_OP, true, true, "Tree Operation. Only applies to a single member."),
                col("DEPTH", Integer, false, true, "Depth of the member in the hierarchy."),
            ],
            sort: &["CATALOG_NAME", "SCHEMA_NAME", "CUBE_NAME", "DIMENSION_UNIQUE_NAME", "HIERARCHY_UNIQUE_NAME", "LEVEL_UNIQUE_NAME", "LEVEL_NUMBER", "MEMBER_ORDINAL"],
            populate: populate::mdschema::members,
        },
        RowsetDef {
            name: "MDSCHEMA_PROPERTIES",
            ordinal: 21,
            description: "Returns information about the properties available for each level of the dimension.",
            columns: vec![
                col("CATALOG_NAME", String, true, true, "The name of the database."),
                col("SCHEMA_NAME", String, true, true, "The name of the schema to which this property belongs."),
                col("CUBE_NAME", String, true, false, "The name of the cube."),
                col("DIMENSION_UNIQUE_NAME", String, true, true, "The unique name of the dimension."),
                col("HIERARCHY_UNIQUE_NAME", String, true, true, "The unique name of the hierarchy."),
                col("LEVEL_UNIQUE_NAME", String, true, true, "The unique name of the level to which this property belongs."),
                col("MEMBER_UNIQUE_NAME", String, true, true, "The unique name of the member to which the property belongs."),
                col("PROPERTY_NAME", String, true, false, "Name of the property."),
                col("PROPERTY_TYPE", Short, true, false, "A bitmap that specifies the type of the property."),
                col("PROPERTY_CAPTION", String, false, false, "A label or caption associated with the property, used primarily for display purposes."),
                col("DATA_TYPE", UnsignedShort, false, false, "Data type of the property."),
                col("PROPERTY_CONTENT_TYPE", Short, true, true, "The type of the property."),
                col("DESCRIPTION", String, false, true, "A human-readable description of the measure."),
            ],
            sort: &[],
            populate: populate::mdschema::properties,
        },
        RowsetDef {
            name: "MDSCHEMA_SETS",
            ordinal: 22,
            description: "Returns information about the sets that are currently defined in a database, including session-scoped sets.",
            columns: vec![
                col("CATALOG_NAME", String, true, true, "The name of the catalog to which this set belongs."),
                col("SCHEMA_NAME", String, true, true, "The name of the schema to which this set belongs."),
                col("CUBE_NAME", String, true, false, "The name of the cube to which this set belongs."),
                col("SET_NAME", String, true, false, "The name of the set, as specified in the CREATE SET statement."),
                col("SCOPE", Integer, true, false, "The scope of the set: 1 for global, 2 for session."),
                col("DESCRIPTION", String, false, true, "A human-readable description of the set."),
                col("EXPRESSION", String, false, true, "The expression for the set."),
                col("DIMENSIONS", String, false, true, "A comma delimited list of hierarchies included in the set."),
            ],
            sort: &["CATALOG_NAME", "SCHEMA_NAME", "CUBE_NAME"],
            populate: populate::mdschema::sets,
        },
    ]
});

pub fn rowset_defs() -> &'static [RowsetDef] {
    &ROWSET_DEFS
}

pub fn rowset_lookup(name: &str) -> Result<&'static RowsetDef> {
    ROWSET_DEFS
        .iter()
        .find(|def| def.name == name)
        .ok_or_else(|| BuiltinError::UnknownRowset(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restrict::Restriction;

    #[test]
    fn registry_has_all_rowsets_in_ordinal_order() {
        let defs = rowset_defs();
        assert_eq!(defs.len(), 22);
        for (i, def) in defs.iter().enumerate() {
            assert_eq!(def.ordinal, i as i32 + 1, "{}", def.name);
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(rowset_lookup("MDSCHEMA_CUBES").unwrap().ordinal, 14);
        assert!(matches!(
            rowset_lookup("MDSCHEMA_NOPE"),
            Err(BuiltinError::UnknownRowset(_))
        ));
    }

    #[test]
    fn restriction_validation() {
        let def = rowset_lookup("MDSCHEMA_MEMBERS").unwrap();
        let mut ok = Restrictions::new();
        ok.set("CUBE_NAME", "Sales");
        ok.insert("TREE_OP", Restriction::Eq("8".into()));
        assert!(def.validate_restrictions(&ok).is_ok());

        let mut bad = Restrictions::new();
        bad.set("PARENT_UNIQUE_NAME", "x");
        assert!(matches!(
            def.validate_restrictions(&bad),
            Err(BuiltinError::NotRestrictable { .. })
        ));
    }

    #[test]
    fn enum_columns_carry_enumerations() {
        for def in rowset_defs() {
            for c in &def.columns {
                assert_eq!(c.ty.is_enum(), c.enumeration.is_some(), "{}.{}", def.name, c.name);
            }
        }
    }

    #[test]
    fn nested_columns_cap_at_fixed_depth() {
        fn depth(c: &ColumnDef) -> usize {
            1 + c.nested.iter().map(depth).max().unwrap_or(0)
        }
        for def in rowset_defs() {
            for c in &def.columns {
                assert!(depth(c) <= 4, "{}.{}", def.name, c.name);
            }
        }
    }
}
