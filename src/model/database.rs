use serde::{Deserialize, Serialize};

use crate::model::{EntityHeader, EntityKind, EntityReference, EntityType, ScalarColumns, ServiceType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(flatten)]
    pub header: EntityHeader,
    pub service_type: ServiceType,
    pub service: EntityReference,
}

impl EntityKind for Database {
    const ENTITY_TYPE: EntityType = EntityType::Database;

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

/// Input model for creating a database; `service` is the service FQN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatabase {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub service: String,
}
