use crate::error::CatalogResult;
use crate::logic::catalog::Catalog;
use crate::logic::probe::{ConnectionProber, ProbeOutcome};
use crate::model::{
    now_millis, touch, DatabaseService, EntityRow, TestConnectionResult, TestConnectionStatus,
    TestConnectionStepResult, UserContext, Workflow, WorkflowStatus,
};
use crate::store::{EntityStore, Store};

/// Name of the single mandatory step every test-connection run reports.
pub const CHECK_ACCESS_STEP: &str = "CheckAccess";

pub fn connection_result(outcome: &ProbeOutcome) -> TestConnectionResult {
    TestConnectionResult {
        last_updated_at: now_millis(),
        status: if outcome.passed {
            TestConnectionStatus::Successful
        } else {
            TestConnectionStatus::Failed
        },
        steps: vec![TestConnectionStepResult {
            name: CHECK_ACCESS_STEP.to_string(),
            mandatory: true,
            passed: outcome.passed,
            message: Some(outcome.message.clone()),
            error_log: outcome.error_log.clone(),
        }],
    }
}

pub struct WorkflowRunner;

impl WorkflowRunner {
    /// Run the test-connection probe of workflow `id` and record the result.
    ///
    /// The workflow is persisted as `Running` before the probe and as
    /// `Successful` or `Failed` after it. Probe failures are results, not
    /// errors; only a missing workflow or a failure to store it surfaces
    /// here. Copying the result onto the named service is best effort.
    pub async fn trigger<S, P>(
        store: &S,
        prober: &P,
        id: &str,
        user: &UserContext,
    ) -> CatalogResult<Workflow>
    where
        S: Store,
        P: ConnectionProber + ?Sized,
    {
        let mut row = Catalog::get_row::<S, Workflow>(store, id).await?;
        log::info!(
            "Triggering workflow '{}' ({})",
            row.fully_qualified_name(),
            row.json.request.connection_type
        );

        row.json.status = WorkflowStatus::Running;
        row.json.response = Some(TestConnectionResult {
            last_updated_at: now_millis(),
            status: TestConnectionStatus::Running,
            steps: Vec::new(),
        });
        Self::store_workflow(store, &mut row, user).await?;

        let request = row.json.request.clone();
        let outcome = prober
            .probe(&request.connection_type, &request.connection.config)
            .await;
        let result = connection_result(&outcome);

        row.json.status = if outcome.passed {
            WorkflowStatus::Successful
        } else {
            WorkflowStatus::Failed
        };
        row.json.response = Some(result.clone());
        Self::store_workflow(store, &mut row, user).await?;
        log::info!(
            "Workflow '{}' finished: {}",
            row.fully_qualified_name(),
            row.json.status.as_str()
        );

        // The run is already stored; a service that cannot take the result
        // does not undo it.
        if let Some(service_name) = &request.service_name {
            if let Err(e) = Self::record_on_service(store, service_name, result, user).await {
                log::warn!(
                    "Failed to record test result on service '{}': {}",
                    service_name,
                    e
                );
            }
        }

        Ok(row.into_entity())
    }

    async fn store_workflow<S: Store>(
        store: &S,
        row: &mut EntityRow<Workflow>,
        user: &UserContext,
    ) -> CatalogResult<()> {
        touch(&mut row.json, user.audit_name());
        row.refresh();
        Catalog::save(store, row).await
    }

    async fn record_on_service<S: Store>(
        store: &S,
        service_name: &str,
        result: TestConnectionResult,
        user: &UserContext,
    ) -> CatalogResult<()> {
        let Some(mut service) =
            EntityStore::<DatabaseService>::get_by_fqn(store, service_name).await?
        else {
            log::debug!("No service '{}' to record the test result on", service_name);
            return Ok(());
        };

        service.json.test_connection_result = Some(result);
        touch(&mut service.json, user.audit_name());
        service.refresh();
        Catalog::save(store, &service).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::probe::SqlxProber;
    use crate::model::{CreateWorkflow, EntityType, PatchOperation};
    use crate::store::MemoryStore;
    use crate::test_support::{self, RecordingStore};
    use parking_lot::Mutex;
    use serde_json::{json, Map, Value};
    use std::time::Duration;

    /// Returns a fixed outcome and remembers the workflow status it saw.
    struct FixedProber<'a> {
        outcome: ProbeOutcome,
        store: &'a MemoryStore,
        workflow_id: Mutex<Option<String>>,
        seen_status: Mutex<Option<WorkflowStatus>>,
    }

    #[async_trait::async_trait]
    impl ConnectionProber for FixedProber<'_> {
        async fn probe(&self, _connection_type: &str, _config: &Map<String, Value>) -> ProbeOutcome {
            let id = self.workflow_id.lock().clone();
            if let Some(id) = id {
                let workflow: Workflow = Catalog::get(self.store, &id).await.unwrap();
                *self.seen_status.lock() = Some(workflow.status);
            }
            self.outcome.clone()
        }
    }

    fn create_workflow(host_port: &str, service_name: Option<&str>) -> CreateWorkflow {
        serde_json::from_value(json!({
            "name": format!("test-connection-{}", host_port),
            "workflowType": "TEST_CONNECTION",
            "status": "Successful",
            "request": {
                "serviceType": "Database",
                "serviceName": service_name,
                "connectionType": "Postgres",
                "connection": {"config": {
                    "username": "postgres",
                    "authType": {"password": "secret"},
                    "hostPort": host_port,
                    "database": "postgres"
                }}
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_created_workflow_is_pending() {
        let store = MemoryStore::new();
        let workflow = Catalog::create(&store, &create_workflow("db:5432", None), &UserContext::default())
            .await
            .unwrap();
        assert_eq!(workflow.status, WorkflowStatus::Pending);
        assert!(workflow.response.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_failed() {
        let store = MemoryStore::new();
        let user = UserContext::default();
        let workflow = Catalog::create(&store, &create_workflow("127.0.0.1:1", None), &user)
            .await
            .unwrap();

        let prober = SqlxProber::new(Duration::from_secs(5));
        let finished = WorkflowRunner::trigger(&store, &prober, &workflow.header.id, &user)
            .await
            .unwrap();

        assert_eq!(finished.status, WorkflowStatus::Failed);
        let response = finished.response.unwrap();
        assert_eq!(response.status, TestConnectionStatus::Failed);
        assert_eq!(response.steps.len(), 1);
        assert_eq!(response.steps[0].name, CHECK_ACCESS_STEP);
        assert!(response.steps[0].mandatory);
        assert!(!response.steps[0].passed);
        assert!(response.steps[0].error_log.is_some());

        let row = EntityStore::<Workflow>::get_by_id(&store, &workflow.header.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status.as_deref(), Some("Failed"));
    }

    #[tokio::test]
    async fn test_trigger_persists_running_then_result() {
        let store = MemoryStore::new();
        test_support::seed_hierarchy(&store).await;
        let user = UserContext::default();
        let workflow = Catalog::create(&store, &create_workflow("db:5432", Some("pg1")), &user)
            .await
            .unwrap();

        let prober = FixedProber {
            outcome: ProbeOutcome::success("Connection succeeded"),
            store: &store,
            workflow_id: Mutex::new(Some(workflow.header.id.clone())),
            seen_status: Mutex::new(None),
        };
        let finished = WorkflowRunner::trigger(&store, &prober, &workflow.header.id, &user)
            .await
            .unwrap();

        assert_eq!(*prober.seen_status.lock(), Some(WorkflowStatus::Running));
        assert_eq!(finished.status, WorkflowStatus::Successful);

        let service: DatabaseService = Catalog::get_by_name(&store, "pg1").await.unwrap();
        let recorded = service.test_connection_result.unwrap();
        assert_eq!(recorded.status, TestConnectionStatus::Successful);
        assert_eq!(Some(recorded), finished.response);
    }

    #[tokio::test]
    async fn test_service_update_failure_keeps_result() {
        let store = RecordingStore::failing_updates(EntityType::DatabaseService);
        test_support::seed_hierarchy(&store.inner).await;
        let user = UserContext::default();
        let workflow = Catalog::create(&store, &create_workflow("db:5432", Some("pg1")), &user)
            .await
            .unwrap();

        let prober = FixedProber {
            outcome: ProbeOutcome::success("Connection succeeded"),
            store: &store.inner,
            workflow_id: Mutex::new(None),
            seen_status: Mutex::new(None),
        };
        let finished = WorkflowRunner::trigger(&store, &prober, &workflow.header.id, &user)
            .await
            .unwrap();
        assert_eq!(finished.status, WorkflowStatus::Successful);

        let stored: Workflow = Catalog::get(&store, &workflow.header.id).await.unwrap();
        assert_eq!(stored.status, WorkflowStatus::Successful);
        let service: DatabaseService = Catalog::get_by_name(&store, "pg1").await.unwrap();
        assert!(service.test_connection_result.is_none());
    }

    #[tokio::test]
    async fn test_retrigger_and_missing_workflow() {
        let store = MemoryStore::new();
        let user = UserContext::default();
        let workflow = Catalog::create(&store, &create_workflow("db:5432", Some("ghost")), &user)
            .await
            .unwrap();

        let failing = FixedProber {
            outcome: ProbeOutcome::failure("Connection failed", "refused"),
            store: &store,
            workflow_id: Mutex::new(None),
            seen_status: Mutex::new(None),
        };
        let first = WorkflowRunner::trigger(&store, &failing, &workflow.header.id, &user)
            .await
            .unwrap();
        assert_eq!(first.status, WorkflowStatus::Failed);

        let passing = FixedProber {
            outcome: ProbeOutcome::success("Connection succeeded"),
            ..failing
        };
        let second = WorkflowRunner::trigger(&store, &passing, &workflow.header.id, &user)
            .await
            .unwrap();
        assert_eq!(second.header.id, first.header.id);
        assert_eq!(second.status, WorkflowStatus::Successful);

        let err = WorkflowRunner::trigger(&store, &passing, "missing", &user)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_patch_status_updates_column() {
        let store = MemoryStore::new();
        let user = UserContext::default();
        let workflow = Catalog::create(&store, &create_workflow("db:5432", None), &user)
            .await
            .unwrap();

        let ops = vec![PatchOperation::replace("/status", json!("Successful"))];
        let patched: Workflow = Catalog::patch(&store, &workflow.header.id, &ops, &user)
            .await
            .unwrap();
        assert_eq!(patched.status, WorkflowStatus::Successful);
        let row = EntityStore::<Workflow>::get_by_id(&store, &workflow.header.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status.as_deref(), Some("Successful"));

        let ops = vec![
            PatchOperation::replace("/status", json!("Failed")),
            PatchOperation::test("/status", json!("Running")),
        ];
        let err = Catalog::patch::<_, Workflow>(&store, &workflow.header.id, &ops, &user)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::CatalogError::PatchFailed(_)));
        let row = EntityStore::<Workflow>::get_by_id(&store, &workflow.header.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status.as_deref(), Some("Successful"));
        assert_eq!(row.json.status, WorkflowStatus::Successful);
    }
}
