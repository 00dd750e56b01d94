use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{CatalogError, CatalogResult};
use crate::logic::connection;
use crate::model::{EntityHeader, EntityKind, EntityType, ScalarColumns, TestConnectionResult};

/// Database engines a service can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    Postgres,
    #[serde(rename = "MySQL")]
    MySql,
}

impl ServiceType {
    pub const ALL: [ServiceType; 2] = [ServiceType::Postgres, ServiceType::MySql];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Postgres => "Postgres",
            ServiceType::MySql => "MySQL",
        }
    }
}

impl FromStr for ServiceType {
    type Err = CatalogError;

    fn from_str(s: &str) -> CatalogResult<Self> {
        ServiceType::ALL
            .into_iter()
            .find(|service_type| service_type.as_str() == s)
            .ok_or_else(|| CatalogError::UnsupportedServiceType(s.to_string()))
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open connection configuration. Its concrete shape depends on the service
/// type and is normalized in place by the connection validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConnection {
    #[serde(default)]
    pub config: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseService {
    #[serde(flatten)]
    pub header: EntityHeader,
    pub service_type: ServiceType,
    pub connection: DatabaseConnection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_connection_result: Option<TestConnectionResult>,
}

impl EntityKind for DatabaseService {
    const ENTITY_TYPE: EntityType = EntityType::DatabaseService;

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
        connection::normalize_connection(self.service_type, &mut self.connection.config)
    }
}

/// Input model for creating a database service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatabaseService {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub service_type: String,
    pub connection: DatabaseConnection,
}
