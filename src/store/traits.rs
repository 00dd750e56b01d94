use crate::model::{
    Database, DatabaseSchema, DatabaseService, EntityKind, EntityRow, Paging, StoredProcedure,
    Table, TestConnectionDefinition, Workflow,
};
use anyhow::Result;

/// Row storage for one entity kind.
///
/// `parent_fqn` filters a listing to rows whose FQN starts with
/// `parent_fqn + "."`.
#[async_trait::async_trait]
pub trait EntityStore<E: EntityKind>: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Option<EntityRow<E>>>;
    async fn get_by_fqn(&self, fqn: &str) -> Result<Option<EntityRow<E>>>;
    /// Rows ordered by name, then id.
    async fn list(&self, parent_fqn: Option<&str>, paging: Paging) -> Result<Vec<EntityRow<E>>>;
    async fn count(&self, parent_fqn: Option<&str>) -> Result<i64>;
    async fn insert(&self, row: &EntityRow<E>) -> Result<()>;
    /// Overwrite the row with the same id. Returns false if there is none.
    async fn update(&self, row: &EntityRow<E>) -> Result<bool>;
    async fn delete_by_id(&self, id: &str) -> Result<bool>;
    async fn delete_by_fqn(&self, fqn: &str) -> Result<bool>;
}

pub trait Store:
    EntityStore<DatabaseService>
    + EntityStore<Database>
    + EntityStore<DatabaseSchema>
    + EntityStore<Table>
    + EntityStore<StoredProcedure>
    + EntityStore<Workflow>
    + EntityStore<TestConnectionDefinition>
    + Send
    + Sync
    + 'static
{
}

impl<T> Store for T where
    T: EntityStore<DatabaseService>
        + EntityStore<Database>
        + EntityStore<DatabaseSchema>
        + EntityStore<Table>
        + EntityStore<StoredProcedure>
        + EntityStore<Workflow>
        + EntityStore<TestConnectionDefinition>
        + Send
        + Sync
        + 'static
{
}
