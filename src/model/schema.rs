use serde::{Deserialize, Serialize};

use crate::model::{EntityHeader, EntityKind, EntityReference, EntityType, ScalarColumns, ServiceType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSchema {
    #[serde(flatten)]
    pub header: EntityHeader,
    pub service_type: ServiceType,
    pub service: EntityReference,
    pub database: EntityReference,
}

impl EntityKind for DatabaseSchema {
    const ENTITY_TYPE: EntityType = EntityType::DatabaseSchema;

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
}

/// Input model for creating a schema; `database` is the database FQN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatabaseSchema {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub database: String,
}
