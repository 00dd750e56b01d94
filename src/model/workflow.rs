use serde::{Deserialize, Serialize};

use crate::model::{DatabaseConnection, EntityHeader, EntityKind, EntityType, ScalarColumns};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowType {
    TestConnection,
}

impl WorkflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowType::TestConnection => "TEST_CONNECTION",
        }
    }
}

/// `Pending -> Running -> {Successful, Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStatus {
    Pending,
    Running,
    Successful,
    Failed,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Pending => "Pending",
            WorkflowStatus::Running => "Running",
            WorkflowStatus::Successful => "Successful",
            WorkflowStatus::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Successful | WorkflowStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestConnectionStatus {
    Successful,
    Failed,
    Running,
}

/// What to probe: a connection type plus its (possibly unnormalized) config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestServiceConnection {
    /// Service category, e.g. `Database`.
    pub service_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    /// Connector, e.g. `Postgres` or `MySQL`.
    pub connection_type: String,
    pub connection: DatabaseConnection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionStepResult {
    pub name: String,
    pub mandatory: bool,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_log: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionResult {
    pub last_updated_at: i64,
    pub status: TestConnectionStatus,
    #[serde(default)]
    pub steps: Vec<TestConnectionStepResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    #[serde(flatten)]
    pub header: EntityHeader,
    pub workflow_type: WorkflowType,
    pub status: WorkflowStatus,
    pub request: TestServiceConnection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<TestConnectionResult>,
}

impl EntityKind for Workflow {
    const ENTITY_TYPE: EntityType = EntityType::Workflow;

    fn header(&self) -> &EntityHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EntityHeader {
        &mut self.header
    }

    fn columns(&self) -> ScalarColumns {
        ScalarColumns {
            workflow_type: Some(self.workflow_type.as_str().to_string()),
            status: Some(self.status.as_str().to_string()),
            ..ScalarColumns::default()
        }
    }
}

/// Input model for creating a workflow. A supplied `status` is accepted for
/// compatibility but ignored: new workflows always start `Pending`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflow {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub workflow_type: WorkflowType,
    #[serde(default)]
    pub status: Option<WorkflowStatus>,
    pub request: TestServiceConnection,
    #[serde(default)]
    pub response: Option<TestConnectionResult>,
}
