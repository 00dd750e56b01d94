use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type Id = String;

pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}

/// Milliseconds since the Unix epoch, used for every `updatedAt` field.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Every kind of entity the catalog persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityType {
    DatabaseService,
    Database,
    DatabaseSchema,
    Table,
    StoredProcedure,
    Workflow,
    TestConnectionDefinition,
}

impl EntityType {
    /// Number of FQN segments for kinds that live in the service hierarchy.
    pub fn depth(&self) -> Option<usize> {
        match self {
            EntityType::DatabaseService => Some(1),
            EntityType::Database => Some(2),
            EntityType::DatabaseSchema => Some(3),
            EntityType::Table | EntityType::StoredProcedure => Some(4),
            EntityType::Workflow | EntityType::TestConnectionDefinition => None,
        }
    }

    /// Backing table in the entity store.
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityType::DatabaseService => "dbservice_entity",
            EntityType::Database => "database_entity",
            EntityType::DatabaseSchema => "database_schema_entity",
            EntityType::Table => "table_entity",
            EntityType::StoredProcedure => "stored_procedure_entity",
            EntityType::Workflow => "automations_workflow",
            EntityType::TestConnectionDefinition => "test_connection_definition",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::DatabaseService => "databaseService",
            EntityType::Database => "database",
            EntityType::DatabaseSchema => "databaseSchema",
            EntityType::Table => "table",
            EntityType::StoredProcedure => "storedProcedure",
            EntityType::Workflow => "workflow",
            EntityType::TestConnectionDefinition => "testConnectionDefinition",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shared by every entity document. Flattened into each document so
/// that `/id`, `/name` and friends stay top-level JSON pointers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityHeader {
    pub id: Id,
    pub name: String,
    pub fully_qualified_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub updated_by: String,
}

impl EntityHeader {
    pub fn new(
        id: Id,
        name: String,
        fully_qualified_name: String,
        display_name: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            fully_qualified_name,
            display_name,
            description,
            deleted: false,
            updated_at: 0,
            updated_by: String::new(),
        }
    }
}

/// Denormalized snapshot of another entity, embedded in descendants.
///
/// This is a weak pointer: it is copied at write time and goes stale if the
/// referenced entity changes later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityReference {
    pub id: Id,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub name: String,
    pub fully_qualified_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl EntityReference {
    pub fn from_header(entity_type: EntityType, header: &EntityHeader) -> Self {
        Self {
            id: header.id.clone(),
            entity_type,
            name: header.name.clone(),
            fully_qualified_name: header.fully_qualified_name.clone(),
            display_name: header.display_name.clone(),
            description: header.description.clone(),
            deleted: header.deleted,
        }
    }
}

/// Paging window for list operations. A negative limit means "everything".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paging {
    pub limit: i64,
    pub offset: i64,
}

impl Paging {
    pub const DEFAULT_LIMIT: i64 = 10;

    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: match limit {
                None | Some(0) => Self::DEFAULT_LIMIT,
                Some(limit) => limit,
            },
            offset: offset.unwrap_or(0).max(0),
        }
    }

    pub fn all() -> Self {
        Self { limit: -1, offset: 0 }
    }

    pub fn is_unbounded(&self) -> bool {
        self.limit < 0
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self::new(None, None)
    }
}
