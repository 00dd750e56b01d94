use anyhow::{anyhow, Context, Result};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

use crate::model::{fqn, EntityKind, EntityRow, EntityType, Id, Paging};
use crate::store::EntityStore;

/// A row as held in memory: scalar columns plus the JSON document.
#[derive(Debug, Clone)]
struct StoredRow {
    id: Id,
    name: String,
    fully_qualified_name: String,
    fqn_hash: String,
    service_type: Option<String>,
    workflow_type: Option<String>,
    status: Option<String>,
    json: Value,
    updated_at: i64,
    updated_by: String,
    deleted: bool,
}

impl StoredRow {
    fn from_row<E: EntityKind>(row: &EntityRow<E>) -> Result<Self> {
        Ok(Self {
            id: row.id.clone(),
            name: row.name.clone(),
            fully_qualified_name: row.fully_qualified_name().to_string(),
            fqn_hash: row.fqn_hash.clone(),
            service_type: row.service_type.clone(),
            workflow_type: row.workflow_type.clone(),
            status: row.status.clone(),
            json: serde_json::to_value(&row.json)
                .with_context(|| format!("Failed to serialize {} '{}'", E::ENTITY_TYPE, row.id))?,
            updated_at: row.updated_at,
            updated_by: row.updated_by.clone(),
            deleted: row.deleted,
        })
    }

    fn to_row<E: EntityKind>(&self) -> Result<EntityRow<E>> {
        let json: E = serde_json::from_value(self.json.clone())
            .with_context(|| format!("Failed to deserialize {} '{}'", E::ENTITY_TYPE, self.id))?;
        Ok(EntityRow {
            id: self.id.clone(),
            name: self.name.clone(),
            fqn_hash: self.fqn_hash.clone(),
            service_type: self.service_type.clone(),
            workflow_type: self.workflow_type.clone(),
            status: self.status.clone(),
            json,
            updated_at: self.updated_at,
            updated_by: self.updated_by.clone(),
            deleted: self.deleted,
        })
    }

    fn is_under(&self, parent_fqn: Option<&str>) -> bool {
        match parent_fqn {
            None => true,
            Some(parent) => self
                .fully_qualified_name
                .strip_prefix(parent)
                .is_some_and(|rest| rest.starts_with(fqn::SEPARATOR)),
        }
    }
}

/// In-process entity store with the same row semantics as `PostgresStore`:
/// unique ids and FQN hashes per kind, listings ordered by name then id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<EntityType, Vec<StoredRow>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find<E: EntityKind>(&self, pred: impl Fn(&StoredRow) -> bool) -> Result<Option<EntityRow<E>>> {
        let tables = self.tables.read();
        tables
            .get(&E::ENTITY_TYPE)
            .and_then(|rows| rows.iter().find(|row| pred(row)))
            .map(|row| row.to_row())
            .transpose()
    }

    fn remove(&self, entity_type: EntityType, pred: impl Fn(&StoredRow) -> bool) -> bool {
        let mut tables = self.tables.write();
        match tables.get_mut(&entity_type) {
            Some(rows) => {
                let before = rows.len();
                rows.retain(|row| !pred(row));
                rows.len() != before
            }
            None => false,
        }
    }
}

#[async_trait::async_trait]
impl<E: EntityKind> EntityStore<E> for MemoryStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<EntityRow<E>>> {
        self.find(|row| row.id == id)
    }

    async fn get_by_fqn(&self, fqn: &str) -> Result<Option<EntityRow<E>>> {
        let hash = fqn::hash(fqn);
        self.find(|row| row.fqn_hash == hash)
    }

    async fn list(&self, parent_fqn: Option<&str>, paging: Paging) -> Result<Vec<EntityRow<E>>> {
        let tables = self.tables.read();
        let Some(rows) = tables.get(&E::ENTITY_TYPE) else {
            return Ok(Vec::new());
        };

        let mut matching: Vec<&StoredRow> = rows.iter().filter(|row| row.is_under(parent_fqn)).collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let skipped = matching.into_iter().skip(paging.offset as usize);
        let page: Vec<&StoredRow> = if paging.is_unbounded() {
            skipped.collect()
        } else {
            skipped.take(paging.limit as usize).collect()
        };

        page.into_iter().map(|row| row.to_row()).collect()
    }

    async fn count(&self, parent_fqn: Option<&str>) -> Result<i64> {
        let tables = self.tables.read();
        let count = tables
            .get(&E::ENTITY_TYPE)
            .map(|rows| rows.iter().filter(|row| row.is_under(parent_fqn)).count())
            .unwrap_or(0);
        Ok(count as i64)
    }

    async fn insert(&self, row: &EntityRow<E>) -> Result<()> {
        let stored = StoredRow::from_row(row)?;
        let mut tables = self.tables.write();
        let rows = tables.entry(E::ENTITY_TYPE).or_default();

        if rows
            .iter()
            .any(|existing| existing.id == stored.id || existing.fqn_hash == stored.fqn_hash)
        {
            return Err(anyhow!(
                "duplicate key on {}: id '{}' or fqn '{}'",
                E::ENTITY_TYPE.table_name(),
                stored.id,
                stored.fully_qualified_name
            ));
        }
        rows.push(stored);
        Ok(())
    }

    async fn update(&self, row: &EntityRow<E>) -> Result<bool> {
        let stored = StoredRow::from_row(row)?;
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(&E::ENTITY_TYPE) else {
            return Ok(false);
        };

        if rows
            .iter()
            .any(|existing| existing.id != stored.id && existing.fqn_hash == stored.fqn_hash)
        {
            return Err(anyhow!(
                "duplicate key on {}: fqn '{}'",
                E::ENTITY_TYPE.table_name(),
                stored.fully_qualified_name
            ));
        }

        match rows.iter_mut().find(|existing| existing.id == stored.id) {
            Some(existing) => {
                *existing = stored;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        Ok(self.remove(E::ENTITY_TYPE, |row| row.id == id))
    }

    async fn delete_by_fqn(&self, fqn: &str) -> Result<bool> {
        let hash = fqn::hash(fqn);
        Ok(self.remove(E::ENTITY_TYPE, |row| row.fqn_hash == hash))
    }
}
