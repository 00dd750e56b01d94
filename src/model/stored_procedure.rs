use serde::{Deserialize, Serialize};

use crate::model::{EntityHeader, EntityKind, EntityReference, EntityType, ScalarColumns, ServiceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredProcedureLanguage {
    #[serde(rename = "SQL")]
    Sql,
    Java,
    JavaScript,
    Python,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StoredProcedureType {
    #[default]
    StoredProcedure,
    #[serde(rename = "UDF")]
    Udf,
    StoredPackage,
    Function,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProcedureCode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<StoredProcedureLanguage>,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProcedure {
    #[serde(flatten)]
    pub header: EntityHeader,
    pub service_type: ServiceType,
    pub service: EntityReference,
    pub database: EntityReference,
    pub database_schema: EntityReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_procedure_code: Option<StoredProcedureCode>,
    #[serde(default)]
    pub stored_procedure_type: StoredProcedureType,
}

impl EntityKind for StoredProcedure {
    const ENTITY_TYPE: EntityType = EntityType::StoredProcedure;

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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoredProcedure {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub database_schema: String,
    #[serde(default)]
    pub stored_procedure_code: Option<StoredProcedureCode>,
    #[serde(default)]
    pub stored_procedure_type: StoredProcedureType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_payload_defaults() {
        let payload: CreateStoredProcedure = serde_json::from_value(serde_json::json!({
            "name": "refresh_totals",
            "databaseSchema": "pg1.sales.public",
            "storedProcedureCode": {"language": "SQL", "code": "BEGIN END"}
        }))
        .unwrap();

        assert_eq!(payload.stored_procedure_type, StoredProcedureType::StoredProcedure);
        let code = payload.stored_procedure_code.unwrap();
        assert_eq!(code.language, Some(StoredProcedureLanguage::Sql));

        assert_eq!(
            serde_json::to_value(StoredProcedureType::Udf).unwrap(),
            serde_json::json!("UDF")
        );
    }
}
