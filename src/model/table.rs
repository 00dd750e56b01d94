use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{CatalogError, CatalogResult};
use crate::model::{
    fqn, EntityHeader, EntityKind, EntityReference, EntityType, ScalarColumns, ServiceType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TableType {
    #[default]
    Regular,
    External,
    Dynamic,
    View,
    SecureView,
    MaterializedView,
    Iceberg,
    Local,
    Partitioned,
    Foreign,
    Transient,
}

/// Column data types recognised by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnDataType {
    Number,
    Tinyint,
    Smallint,
    Int,
    Bigint,
    Byteint,
    Bytes,
    Float,
    Double,
    Decimal,
    Numeric,
    Timestamp,
    Timestampz,
    Time,
    Date,
    Datetime,
    Interval,
    String,
    Mediumtext,
    Text,
    Char,
    Long,
    Varchar,
    Boolean,
    Binary,
    Varbinary,
    Array,
    Blob,
    Longblob,
    Mediumblob,
    Map,
    Struct,
    Union,
    Set,
    Geography,
    Enum,
    Json,
    Uuid,
    Variant,
    Geometry,
    Bytea,
    Aggregatefunction,
    Error,
    Fixed,
    Record,
    Null,
    Super,
    Hllsketch,
    PgLsn,
    PgSnapshot,
    Tsquery,
    TxidSnapshot,
    Xml,
    Macaddr,
    Tsvector,
    Unknown,
    Cidr,
    Inet,
    Clob,
    Rowid,
    Lowcardinality,
    Year,
    Point,
    Polygon,
    Tuple,
    Spatial,
    Table,
    Ntext,
    Image,
    Ipv4,
    Ipv6,
    Datetimerange,
    Hll,
    Largeint,
    QuantileState,
    AggState,
    Bitmap,
    Uint,
    Bit,
    Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnConstraint {
    Null,
    NotNull,
    Unique,
    PrimaryKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintType {
    Unique,
    PrimaryKey,
    ForeignKey,
    SortKey,
    DistKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    /// Always `table FQN + "." + name`; recomputed on every write.
    #[serde(default)]
    pub fully_qualified_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data_type: ColumnDataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_data_type: Option<ColumnDataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_length: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type_display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<ColumnConstraint>,
    /// 1-based position; defaults to the column's place in the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal_position: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConstraint {
    pub constraint_type: ConstraintType,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<RelationshipType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(flatten)]
    pub header: EntityHeader,
    pub service_type: ServiceType,
    pub service: EntityReference,
    pub database: EntityReference,
    pub database_schema: EntityReference,
    #[serde(default)]
    pub table_type: TableType,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub table_constraints: Vec<TableConstraint>,
}

impl EntityKind for Table {
    const ENTITY_TYPE: EntityType = EntityType::Table;

    fn header(&self) -> &EntityHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EntityHeader {
        &mut self.header
    }

    fn columns(&self) -> ScalarColumns {
        ScalarColumns {
            service_type: Some(self.service_type.to_string()),
            ..ScalarColumns::default()
        }
    }

    fn normalize(&mut self) -> CatalogResult<()> {
        let table_fqn = self.header.fully_qualified_name.clone();
        let mut seen = HashSet::new();

        for (index, column) in self.columns.iter_mut().enumerate() {
            if column.name.trim().is_empty() {
                return Err(CatalogError::InvalidPayload(format!(
                    "column {} has a blank name",
                    index + 1
                )));
            }
            if !seen.insert(column.name.clone()) {
                return Err(CatalogError::InvalidPayload(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
            column.fully_qualified_name = fqn::build(&table_fqn, &column.name);
            if column.ordinal_position.is_none() {
                column.ordinal_position = Some(index as i32 + 1);
            }
        }

        for constraint in &self.table_constraints {
            validate_constraint(constraint, &seen)?;
        }

        Ok(())
    }
}

fn validate_constraint(constraint: &TableConstraint, columns: &HashSet<String>) -> CatalogResult<()> {
    if constraint.columns.is_empty() {
        return Err(CatalogError::InvalidPayload(format!(
            "{:?} constraint must name at least one column",
            constraint.constraint_type
        )));
    }
    if let Some(missing) = constraint.columns.iter().find(|c| !columns.contains(*c)) {
        return Err(CatalogError::InvalidPayload(format!(
            "constraint refers to unknown column '{}'",
            missing
        )));
    }
    let has_referred = constraint
        .referred_columns
        .as_ref()
        .is_some_and(|referred| !referred.is_empty());
    if constraint.constraint_type == ConstraintType::ForeignKey && !has_referred {
        return Err(CatalogError::InvalidPayload(
            "FOREIGN_KEY constraint requires referredColumns".to_string(),
        ));
    }
    Ok(())
}

/// Input model for creating a table; `databaseSchema` is the schema FQN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTable {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub database_schema: String,
    #[serde(default)]
    pub table_type: TableType,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub table_constraints: Vec<TableConstraint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::generate_id;

    fn reference(entity_type: EntityType, name: &str, fqn: &str) -> EntityReference {
        EntityReference {
            id: generate_id(),
            entity_type,
            name: name.to_string(),
            fully_qualified_name: fqn.to_string(),
            display_name: None,
            description: None,
            deleted: false,
        }
    }

    fn table_with(columns: serde_json::Value, constraints: serde_json::Value) -> Table {
        Table {
            header: EntityHeader::new(
                generate_id(),
                "orders".to_string(),
                "pg1.sales.public.orders".to_string(),
                None,
                None,
            ),
            service_type: ServiceType::Postgres,
            service: reference(EntityType::DatabaseService, "pg1", "pg1"),
            database: reference(EntityType::Database, "sales", "pg1.sales"),
            database_schema: reference(EntityType::DatabaseSchema, "public", "pg1.sales.public"),
            table_type: TableType::Regular,
            columns: serde_json::from_value(columns).unwrap(),
            table_constraints: serde_json::from_value(constraints).unwrap(),
        }
    }

    #[test]
    fn test_column_data_type_names() {
        let cases = [
            ("\"PG_LSN\"", ColumnDataType::PgLsn),
            ("\"TIMESTAMPZ\"", ColumnDataType::Timestampz),
            ("\"QUANTILE_STATE\"", ColumnDataType::QuantileState),
            ("\"IPV4\"", ColumnDataType::Ipv4),
            ("\"AGGREGATEFUNCTION\"", ColumnDataType::Aggregatefunction),
            ("\"TXID_SNAPSHOT\"", ColumnDataType::TxidSnapshot),
        ];
        for (json, expected) in cases {
            assert_eq!(serde_json::from_str::<ColumnDataType>(json).unwrap(), expected);
        }
        assert!(serde_json::from_str::<ColumnDataType>("\"VARCHAR2\"").is_err());
    }

    #[test]
    fn test_normalize_derives_column_fqn_and_position() {
        let mut table = table_with(
            serde_json::json!([
                {"name": "id", "dataType": "BIGINT", "constraint": "PRIMARY_KEY"},
                {"name": "amount", "dataType": "NUMERIC", "fullyQualifiedName": "wrong"}
            ]),
            serde_json::json!([{"constraintType": "PRIMARY_KEY", "columns": ["id"]}]),
        );

        table.normalize().unwrap();
        assert_eq!(table.columns[0].fully_qualified_name, "pg1.sales.public.orders.id");
        assert_eq!(table.columns[1].fully_qualified_name, "pg1.sales.public.orders.amount");
        assert_eq!(table.columns[0].ordinal_position, Some(1));
        assert_eq!(table.columns[1].ordinal_position, Some(2));

        let once = table.clone();
        table.normalize().unwrap();
        assert_eq!(table, once);
    }

    #[test]
    fn test_normalize_rejects_bad_columns_and_constraints() {
        let mut duplicate = table_with(
            serde_json::json!([
                {"name": "id", "dataType": "INT"},
                {"name": "id", "dataType": "INT"}
            ]),
            serde_json::json!([]),
        );
        assert!(matches!(duplicate.normalize(), Err(CatalogError::InvalidPayload(_))));

        let mut unknown_column = table_with(
            serde_json::json!([{"name": "id", "dataType": "INT"}]),
            serde_json::json!([{"constraintType": "UNIQUE", "columns": ["email"]}]),
        );
        assert!(matches!(unknown_column.normalize(), Err(CatalogError::InvalidPayload(_))));

        let mut foreign_key = table_with(
            serde_json::json!([{"name": "customer_id", "dataType": "INT"}]),
            serde_json::json!([{"constraintType": "FOREIGN_KEY", "columns": ["customer_id"]}]),
        );
        assert!(matches!(foreign_key.normalize(), Err(CatalogError::InvalidPayload(_))));
    }
}
