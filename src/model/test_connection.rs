use serde::{Deserialize, Serialize};

use crate::model::{fqn, EntityHeader, EntityKind, EntityType};

/// Suffix appended to a connector name to form a definition's FQN.
pub const DEFINITION_SUFFIX: &str = "testConnectionDefinition";

pub fn definition_fqn(connector: &str) -> String {
    fqn::build(connector, DEFINITION_SUFFIX)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionStep {
    pub name: String,
    pub description: String,
    pub error_message: String,
    pub mandatory: bool,
    #[serde(default)]
    pub short_circuit: bool,
}

/// Checklist a connector runs when its connection is tested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionDefinition {
    #[serde(flatten)]
    pub header: EntityHeader,
    #[serde(default)]
    pub steps: Vec<TestConnectionStep>,
}

impl EntityKind for TestConnectionDefinition {
    const ENTITY_TYPE: EntityType = EntityType::TestConnectionDefinition;

    fn header(&self) -> &EntityHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EntityHeader {
        &mut self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_fqn() {
        assert_eq!(definition_fqn("Postgres"), "Postgres.testConnectionDefinition");
        assert_eq!(definition_fqn("MySQL"), "MySQL.testConnectionDefinition");
    }
}
