use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, types::Json, PgPool, Row};

use crate::model::{EntityKind, EntityRow, Paging};
use crate::store::traits::EntityStore;

const ROW_COLUMNS: &str =
    "id, name, fqn_hash, service_type, workflow_type, status, json, updated_at, updated_by, deleted";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run the embedded migrations under `migrations/`
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        log::info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode_row<E: EntityKind>(row: PgRow) -> Result<EntityRow<E>> {
    let Json(json): Json<E> = row
        .try_get("json")
        .with_context(|| format!("Failed to decode {} document", E::ENTITY_TYPE))?;

    Ok(EntityRow {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        fqn_hash: row.try_get("fqn_hash")?,
        service_type: row.try_get("service_type")?,
        workflow_type: row.try_get("workflow_type")?,
        status: row.try_get("status")?,
        json,
        updated_at: row.try_get("updated_at")?,
        updated_by: row.try_get("updated_by")?,
        deleted: row.try_get("deleted")?,
    })
}

/// `Some("pg1")` becomes the prefix `"pg1."`; `None` matches every row.
fn child_prefix(parent_fqn: Option<&str>) -> Option<String> {
    parent_fqn.map(|parent| format!("{}.", parent))
}

#[async_trait::async_trait]
impl<E: EntityKind> EntityStore<E> for PostgresStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<EntityRow<E>>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            ROW_COLUMNS,
            E::ENTITY_TYPE.table_name()
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to fetch {} by id", E::ENTITY_TYPE))?;

        row.map(decode_row).transpose()
    }

    async fn get_by_fqn(&self, fqn: &str) -> Result<Option<EntityRow<E>>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE fqn_hash = $1",
            ROW_COLUMNS,
            E::ENTITY_TYPE.table_name()
        );
        let row = sqlx::query(&sql)
            .bind(crate::model::fqn::hash(fqn))
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to fetch {} by name", E::ENTITY_TYPE))?;

        row.map(decode_row).transpose()
    }

    async fn list(&self, parent_fqn: Option<&str>, paging: Paging) -> Result<Vec<EntityRow<E>>> {
        let sql = format!(
            r#"
            SELECT {} FROM {}
            WHERE ($1::TEXT IS NULL OR starts_with(json->>'fullyQualifiedName', $1))
            ORDER BY name, id
            LIMIT $2 OFFSET $3
            "#,
            ROW_COLUMNS,
            E::ENTITY_TYPE.table_name()
        );
        let limit = (!paging.is_unbounded()).then_some(paging.limit);

        let rows = sqlx::query(&sql)
            .bind(child_prefix(parent_fqn))
            .bind(limit)
            .bind(paging.offset)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to list {}", E::ENTITY_TYPE))?;

        rows.into_iter().map(decode_row).collect()
    }

    async fn count(&self, parent_fqn: Option<&str>) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) AS total FROM {} WHERE ($1::TEXT IS NULL OR starts_with(json->>'fullyQualifiedName', $1))",
            E::ENTITY_TYPE.table_name()
        );
        let row = sqlx::query(&sql)
            .bind(child_prefix(parent_fqn))
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count {}", E::ENTITY_TYPE))?;

        Ok(row.try_get("total")?)
    }

    async fn insert(&self, row: &EntityRow<E>) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            E::ENTITY_TYPE.table_name(),
            ROW_COLUMNS
        );
        sqlx::query(&sql)
            .bind(&row.id)
            .bind(&row.name)
            .bind(&row.fqn_hash)
            .bind(&row.service_type)
            .bind(&row.workflow_type)
            .bind(&row.status)
            .bind(Json(&row.json))
            .bind(row.updated_at)
            .bind(&row.updated_by)
            .bind(row.deleted)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to insert {} '{}'", E::ENTITY_TYPE, row.id))?;

        Ok(())
    }

    async fn update(&self, row: &EntityRow<E>) -> Result<bool> {
        let sql = format!(
            r#"
            UPDATE {} SET
                name = $2,
                fqn_hash = $3,
                service_type = $4,
                workflow_type = $5,
                status = $6,
                json = $7,
                updated_at = $8,
                updated_by = $9,
                deleted = $10
            WHERE id = $1
            "#,
            E::ENTITY_TYPE.table_name()
        );
        let result = sqlx::query(&sql)
            .bind(&row.id)
            .bind(&row.name)
            .bind(&row.fqn_hash)
            .bind(&row.service_type)
            .bind(&row.workflow_type)
            .bind(&row.status)
            .bind(Json(&row.json))
            .bind(row.updated_at)
            .bind(&row.updated_by)
            .bind(row.deleted)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to update {} '{}'", E::ENTITY_TYPE, row.id))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", E::ENTITY_TYPE.table_name());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete {}", E::ENTITY_TYPE))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_fqn(&self, fqn: &str) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE fqn_hash = $1",
            E::ENTITY_TYPE.table_name()
        );
        let result = sqlx::query(&sql)
            .bind(crate::model::fqn::hash(fqn))
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete {} by name", E::ENTITY_TYPE))?;

        Ok(result.rows_affected() > 0)
    }
}
