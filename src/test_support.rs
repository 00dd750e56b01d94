//! Fixtures shared by the unit tests.

use parking_lot::Mutex;
use serde_json::json;

use crate::logic::Catalog;
use crate::model::{
    fqn, generate_id, CreateDatabase, CreateDatabaseSchema, CreateDatabaseService, Database,
    DatabaseConnection, EntityHeader, EntityKind, EntityReference, EntityRow, EntityType, Paging,
    ServiceType, UserContext,
};
use crate::store::{EntityStore, MemoryStore, Store};

/// Forwards to a MemoryStore, records every FQN lookup and rejects updates
/// of the kind named in `failing_updates`.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    pub lookups: Mutex<Vec<String>>,
    pub failing_updates: Option<EntityType>,
}

impl RecordingStore {
    pub fn failing_updates(entity_type: EntityType) -> Self {
        Self {
            failing_updates: Some(entity_type),
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl<E: EntityKind> EntityStore<E> for RecordingStore
where
    MemoryStore: EntityStore<E>,
{
    async fn get_by_id(&self, id: &str) -> anyhow::Result<Option<EntityRow<E>>> {
        EntityStore::<E>::get_by_id(&self.inner, id).await
    }
    async fn get_by_fqn(&self, fqn: &str) -> anyhow::Result<Option<EntityRow<E>>> {
        self.lookups.lock().push(fqn.to_string());
        EntityStore::<E>::get_by_fqn(&self.inner, fqn).await
    }
    async fn list(&self, parent: Option<&str>, paging: Paging) -> anyhow::Result<Vec<EntityRow<E>>> {
        EntityStore::<E>::list(&self.inner, parent, paging).await
    }
    async fn count(&self, parent: Option<&str>) -> anyhow::Result<i64> {
        EntityStore::<E>::count(&self.inner, parent).await
    }
    async fn insert(&self, row: &EntityRow<E>) -> anyhow::Result<()> {
        EntityStore::<E>::insert(&self.inner, row).await
    }
    async fn update(&self, row: &EntityRow<E>) -> anyhow::Result<bool> {
        if self.failing_updates == Some(E::ENTITY_TYPE) {
            anyhow::bail!("{} store is read-only", E::ENTITY_TYPE);
        }
        EntityStore::<E>::update(&self.inner, row).await
    }
    async fn delete_by_id(&self, id: &str) -> anyhow::Result<bool> {
        EntityStore::<E>::delete_by_id(&self.inner, id).await
    }
    async fn delete_by_fqn(&self, fqn: &str) -> anyhow::Result<bool> {
        EntityStore::<E>::delete_by_fqn(&self.inner, fqn).await
    }
}

pub fn create_postgres_service(name: &str) -> CreateDatabaseService {
    CreateDatabaseService {
        name: name.to_string(),
        display_name: None,
        description: None,
        service_type: "Postgres".to_string(),
        connection: serde_json::from_value::<DatabaseConnection>(json!({
            "config": {
                "username": "postgres",
                "authType": {"password": "secret"},
                "hostPort": "localhost:5432",
                "database": "sales"
            }
        }))
        .unwrap(),
    }
}

/// Creates `pg1`, `pg1.sales` and `pg1.sales.public`.
pub async fn seed_hierarchy<S: Store>(store: &S) {
    let user = UserContext::system();
    Catalog::create(store, &create_postgres_service("pg1"), &user)
        .await
        .unwrap();
    Catalog::create(
        store,
        &CreateDatabase {
            name: "sales".to_string(),
            display_name: None,
            description: None,
            service: "pg1".to_string(),
        },
        &user,
    )
    .await
    .unwrap();
    Catalog::create(
        store,
        &CreateDatabaseSchema {
            name: "public".to_string(),
            display_name: None,
            description: None,
            database: "pg1.sales".to_string(),
        },
        &user,
    )
    .await
    .unwrap();
}

/// A database row whose service reference is made up; no lookups involved.
pub fn database_row(service: &str, name: &str) -> EntityRow<Database> {
    let service_header = EntityHeader::new(
        generate_id(),
        service.to_string(),
        service.to_string(),
        None,
        None,
    );
    EntityRow::from_entity(Database {
        header: EntityHeader::new(
            generate_id(),
            name.to_string(),
            fqn::build(service, name),
            None,
            None,
        ),
        service_type: ServiceType::Postgres,
        service: EntityReference::from_header(EntityType::DatabaseService, &service_header),
    })
}
