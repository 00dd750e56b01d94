use crate::error::{CatalogError, CatalogResult};
use crate::model::{
    fqn, Database, DatabaseSchema, DatabaseService, EntityKind, EntityReference, EntityType,
};
use crate::store::{EntityStore, Store};

/// Ancestors of an entity, resolved from its FQN.
#[derive(Debug, Clone, Default)]
pub struct Ancestors {
    pub service: Option<DatabaseService>,
    pub database: Option<Database>,
    pub schema: Option<DatabaseSchema>,
}

impl Ancestors {
    pub fn service(&self) -> CatalogResult<&DatabaseService> {
        self.service
            .as_ref()
            .ok_or_else(|| missing(EntityType::DatabaseService))
    }

    pub fn database(&self) -> CatalogResult<&Database> {
        self.database
            .as_ref()
            .ok_or_else(|| missing(EntityType::Database))
    }

    pub fn schema(&self) -> CatalogResult<&DatabaseSchema> {
        self.schema
            .as_ref()
            .ok_or_else(|| missing(EntityType::DatabaseSchema))
    }

    /// References to every resolved ancestor, service first.
    pub fn references(&self) -> Vec<EntityReference> {
        let mut refs = Vec::new();
        if let Some(service) = &self.service {
            refs.push(service.to_reference());
        }
        if let Some(database) = &self.database {
            refs.push(database.to_reference());
        }
        if let Some(schema) = &self.schema {
            refs.push(schema.to_reference());
        }
        refs
    }
}

fn missing(entity: EntityType) -> CatalogError {
    CatalogError::InvalidPath {
        path: String::new(),
        reason: format!("no {} in resolved ancestors", entity),
    }
}

pub struct Resolver;

impl Resolver {
    /// Check that `full_name` has exactly `kind.depth()` non-blank segments.
    pub fn check_path(full_name: &str, kind: EntityType) -> CatalogResult<Vec<&str>> {
        let depth = kind.depth().ok_or_else(|| {
            CatalogError::invalid_path(full_name, format!("{} is not hierarchical", kind))
        })?;

        let segments = fqn::split(full_name);
        if segments.len() != depth {
            return Err(CatalogError::invalid_path(
                full_name,
                format!(
                    "a {} path has {} segments, got {}",
                    kind,
                    depth,
                    segments.len()
                ),
            ));
        }
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(CatalogError::invalid_path(full_name, "blank path segment"));
        }
        Ok(segments)
    }

    /// Resolve the ancestors of the `kind` entity named by `full_name`.
    ///
    /// The path is checked before any lookup. Ancestors are fetched by FQN
    /// in order service, database, schema; the first missing one fails with
    /// `NotFound`.
    pub async fn resolve_ancestors<S: Store>(
        store: &S,
        full_name: &str,
        kind: EntityType,
    ) -> CatalogResult<Ancestors> {
        Self::check_path(full_name, kind)?;

        let mut ancestors = Ancestors::default();
        for (level, prefix) in fqn::ancestor_prefixes(full_name).into_iter().enumerate() {
            log::debug!("Resolving ancestor '{}' of {} '{}'", prefix, kind, full_name);
            match level {
                0 => {
                    let row = EntityStore::<DatabaseService>::get_by_fqn(store, &prefix)
                        .await?
                        .ok_or_else(|| CatalogError::not_found(EntityType::DatabaseService, &prefix))?;
                    ancestors.service = Some(row.into_entity());
                }
                1 => {
                    let row = EntityStore::<Database>::get_by_fqn(store, &prefix)
                        .await?
                        .ok_or_else(|| CatalogError::not_found(EntityType::Database, &prefix))?;
                    ancestors.database = Some(row.into_entity());
                }
                _ => {
                    let row = EntityStore::<DatabaseSchema>::get_by_fqn(store, &prefix)
                        .await?
                        .ok_or_else(|| CatalogError::not_found(EntityType::DatabaseSchema, &prefix))?;
                    ancestors.schema = Some(row.into_entity());
                }
            }
        }

        Ok(ancestors)
    }
}
