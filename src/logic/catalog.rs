//! Create, upsert, read, list, patch and delete for every entity kind.

use crate::error::{CatalogError, CatalogResult};
use crate::logic::patch::patch_entity;
use crate::logic::resolve::Resolver;
use crate::model::{
    fqn, touch, CreateDatabase, CreateDatabaseSchema, CreateDatabaseService,
    CreateStoredProcedure, CreateTable, CreateWorkflow, Database, DatabaseSchema, DatabaseService,
    EntityHeader, EntityKind, EntityRow, EntityType, Id, Paging, PagingInfo, PatchOperation,
    ResultList, ServiceType, StoredProcedure, Table, UserContext, Workflow, WorkflowStatus,
};
use crate::store::{EntityStore, Store};

/// A create payload that can be turned into a full entity document.
#[async_trait::async_trait]
pub trait CreatePayload: Send + Sync {
    type Entity: EntityKind;

    /// FQN the created entity will have. Checks the local name.
    fn fully_qualified_name(&self) -> CatalogResult<String>;

    /// Build the document under `id`, resolving ancestors as needed.
    async fn build<S: Store>(&self, store: &S, id: Id) -> CatalogResult<Self::Entity>;
}

fn header(
    id: Id,
    name: &str,
    full_name: String,
    display_name: &Option<String>,
    description: &Option<String>,
) -> EntityHeader {
    EntityHeader::new(
        id,
        name.to_string(),
        full_name,
        display_name.clone(),
        description.clone(),
    )
}

#[async_trait::async_trait]
impl CreatePayload for CreateDatabaseService {
    type Entity = DatabaseService;

    fn fully_qualified_name(&self) -> CatalogResult<String> {
        fqn::validate_name(&self.name)?;
        Ok(self.name.clone())
    }

    async fn build<S: Store>(&self, _store: &S, id: Id) -> CatalogResult<DatabaseService> {
        let service_type: ServiceType = self.service_type.parse()?;
        Ok(DatabaseService {
            header: header(
                id,
                &self.name,
                self.fully_qualified_name()?,
                &self.display_name,
                &self.description,
            ),
            service_type,
            connection: self.connection.clone(),
            test_connection_result: None,
        })
    }
}

#[async_trait::async_trait]
impl CreatePayload for CreateDatabase {
    type Entity = Database;

    fn fully_qualified_name(&self) -> CatalogResult<String> {
        fqn::validate_name(&self.name)?;
        Ok(fqn::build(&self.service, &self.name))
    }

    async fn build<S: Store>(&self, store: &S, id: Id) -> CatalogResult<Database> {
        let full_name = self.fully_qualified_name()?;
        let ancestors = Resolver::resolve_ancestors(store, &full_name, EntityType::Database).await?;
        let service = ancestors.service()?;

        Ok(Database {
            header: header(id, &self.name, full_name, &self.display_name, &self.description),
            service_type: service.service_type,
            service: service.to_reference(),
        })
    }
}

#[async_trait::async_trait]
impl CreatePayload for CreateDatabaseSchema {
    type Entity = DatabaseSchema;

    fn fully_qualified_name(&self) -> CatalogResult<String> {
        fqn::validate_name(&self.name)?;
        Ok(fqn::build(&self.database, &self.name))
    }

    async fn build<S: Store>(&self, store: &S, id: Id) -> CatalogResult<DatabaseSchema> {
        let full_name = self.fully_qualified_name()?;
        let ancestors =
            Resolver::resolve_ancestors(store, &full_name, EntityType::DatabaseSchema).await?;
        let service = ancestors.service()?;

        Ok(DatabaseSchema {
            header: header(id, &self.name, full_name, &self.display_name, &self.description),
            service_type: service.service_type,
            service: service.to_reference(),
            database: ancestors.database()?.to_reference(),
        })
    }
}

#[async_trait::async_trait]
impl CreatePayload for CreateTable {
    type Entity = Table;

    fn fully_qualified_name(&self) -> CatalogResult<String> {
        fqn::validate_name(&self.name)?;
        Ok(fqn::build(&self.database_schema, &self.name))
    }

    async fn build<S: Store>(&self, store: &S, id: Id) -> CatalogResult<Table> {
        let full_name = self.fully_qualified_name()?;
        let ancestors = Resolver::resolve_ancestors(store, &full_name, EntityType::Table).await?;
        let service = ancestors.service()?;

        Ok(Table {
            header: header(id, &self.name, full_name, &self.display_name, &self.description),
            service_type: service.service_type,
            service: service.to_reference(),
            database: ancestors.database()?.to_reference(),
            database_schema: ancestors.schema()?.to_reference(),
            table_type: self.table_type,
            columns: self.columns.clone(),
            table_constraints: self.table_constraints.clone(),
        })
    }
}

#[async_trait::async_trait]
impl CreatePayload for CreateStoredProcedure {
    type Entity = StoredProcedure;

    fn fully_qualified_name(&self) -> CatalogResult<String> {
        fqn::validate_name(&self.name)?;
        Ok(fqn::build(&self.database_schema, &self.name))
    }

    async fn build<S: Store>(&self, store: &S, id: Id) -> CatalogResult<StoredProcedure> {
        let full_name = self.fully_qualified_name()?;
        let ancestors =
            Resolver::resolve_ancestors(store, &full_name, EntityType::StoredProcedure).await?;
        let service = ancestors.service()?;

        Ok(StoredProcedure {
            header: header(id, &self.name, full_name, &self.display_name, &self.description),
            service_type: service.service_type,
            service: service.to_reference(),
            database: ancestors.database()?.to_reference(),
            database_schema: ancestors.schema()?.to_reference(),
            stored_procedure_code: self.stored_procedure_code.clone(),
            stored_procedure_type: self.stored_procedure_type,
        })
    }
}

#[async_trait::async_trait]
impl CreatePayload for CreateWorkflow {
    type Entity = Workflow;

    /// A workflow's FQN is its name; dots carry no hierarchy here.
    fn fully_qualified_name(&self) -> CatalogResult<String> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::InvalidPayload(
                "name must not be blank".to_string(),
            ));
        }
        Ok(self.name.clone())
    }

    async fn build<S: Store>(&self, _store: &S, id: Id) -> CatalogResult<Workflow> {
        Ok(Workflow {
            header: header(
                id,
                &self.name,
                self.fully_qualified_name()?,
                &self.display_name,
                &self.description,
            ),
            workflow_type: self.workflow_type,
            status: WorkflowStatus::Pending,
            request: self.request.clone(),
            response: self.response.clone(),
        })
    }
}

pub struct Catalog;

impl Catalog {
    /// The payload's FQN, with its segment count checked for hierarchical
    /// kinds before anything is read from the store.
    fn checked_name<P: CreatePayload>(payload: &P) -> CatalogResult<String> {
        let full_name = payload.fully_qualified_name()?;
        let entity_type = <P::Entity as EntityKind>::ENTITY_TYPE;
        if entity_type.depth().is_some() {
            Resolver::check_path(&full_name, entity_type)?;
        }
        Ok(full_name)
    }

    /// Create a new entity. Fails with `AlreadyExists` if the FQN is taken.
    pub async fn create<S, P>(store: &S, payload: &P, user: &UserContext) -> CatalogResult<P::Entity>
    where
        S: Store + EntityStore<P::Entity>,
        P: CreatePayload,
    {
        let full_name = Self::checked_name(payload)?;
        if EntityStore::<P::Entity>::get_by_fqn(store, &full_name)
            .await?
            .is_some()
        {
            return Err(CatalogError::AlreadyExists {
                entity: <P::Entity as EntityKind>::ENTITY_TYPE,
                fqn: full_name,
            });
        }

        let mut entity = payload.build(store, crate::model::generate_id()).await?;
        entity.normalize()?;
        touch(&mut entity, user.audit_name());

        let row = EntityRow::from_entity(entity);
        EntityStore::<P::Entity>::insert(store, &row).await?;
        log::info!(
            "Created {} '{}'",
            <P::Entity as EntityKind>::ENTITY_TYPE,
            row.fully_qualified_name()
        );
        Ok(row.into_entity())
    }

    /// Create, or replace the document of the entity with the same FQN while
    /// keeping its id. Returns the entity and whether it was newly created.
    pub async fn create_or_update<S, P>(
        store: &S,
        payload: &P,
        user: &UserContext,
    ) -> CatalogResult<(P::Entity, bool)>
    where
        S: Store + EntityStore<P::Entity>,
        P: CreatePayload,
    {
        let full_name = Self::checked_name(payload)?;
        let Some(existing) = EntityStore::<P::Entity>::get_by_fqn(store, &full_name).await? else {
            return Self::create(store, payload, user).await.map(|e| (e, true));
        };

        let mut entity = payload.build(store, existing.id.clone()).await?;
        entity.normalize()?;
        touch(&mut entity, user.audit_name());

        let row = EntityRow::from_entity(entity);
        if !EntityStore::<P::Entity>::update(store, &row).await? {
            return Err(CatalogError::not_found(
                <P::Entity as EntityKind>::ENTITY_TYPE,
                existing.id,
            ));
        }
        log::info!(
            "Updated {} '{}'",
            <P::Entity as EntityKind>::ENTITY_TYPE,
            row.fully_qualified_name()
        );
        Ok((row.into_entity(), false))
    }

    pub async fn get_row<S, E>(store: &S, id: &str) -> CatalogResult<EntityRow<E>>
    where
        S: EntityStore<E>,
        E: EntityKind,
    {
        EntityStore::<E>::get_by_id(store, id)
            .await?
            .ok_or_else(|| CatalogError::not_found(E::ENTITY_TYPE, id))
    }

    pub async fn get<S, E>(store: &S, id: &str) -> CatalogResult<E>
    where
        S: EntityStore<E>,
        E: EntityKind,
    {
        Ok(Self::get_row::<S, E>(store, id).await?.into_entity())
    }

    pub async fn get_by_name<S, E>(store: &S, full_name: &str) -> CatalogResult<E>
    where
        S: EntityStore<E>,
        E: EntityKind,
    {
        EntityStore::<E>::get_by_fqn(store, full_name)
            .await?
            .map(EntityRow::into_entity)
            .ok_or_else(|| CatalogError::not_found(E::ENTITY_TYPE, full_name))
    }

    /// One page of entities, optionally restricted to descendants of
    /// `parent_fqn`, with the total matching count.
    pub async fn list<S, E>(
        store: &S,
        parent_fqn: Option<&str>,
        paging: Paging,
    ) -> CatalogResult<ResultList<E>>
    where
        S: EntityStore<E>,
        E: EntityKind,
    {
        let total = EntityStore::<E>::count(store, parent_fqn).await?;
        let rows = EntityStore::<E>::list(store, parent_fqn, paging).await?;

        Ok(ResultList {
            data: rows.into_iter().map(EntityRow::into_entity).collect(),
            paging: PagingInfo {
                total,
                limit: paging.limit,
                offset: paging.offset,
            },
        })
    }

    /// Apply a JSON Patch to the entity with `id`. Nothing is written unless
    /// every operation and the re-validation succeed.
    pub async fn patch<S, E>(
        store: &S,
        id: &str,
        ops: &[PatchOperation],
        user: &UserContext,
    ) -> CatalogResult<E>
    where
        S: EntityStore<E>,
        E: EntityKind,
    {
        let mut row = Self::get_row::<S, E>(store, id).await?;
        let mut patched = patch_entity(&row.json, ops)?;
        touch(&mut patched, user.audit_name());

        row.json = patched;
        row.refresh();
        Self::save(store, &row).await?;
        log::info!("Patched {} '{}'", E::ENTITY_TYPE, row.fully_qualified_name());
        Ok(row.into_entity())
    }

    /// Write back an already-validated row.
    pub async fn save<S, E>(store: &S, row: &EntityRow<E>) -> CatalogResult<()>
    where
        S: EntityStore<E>,
        E: EntityKind,
    {
        if EntityStore::<E>::update(store, row).await? {
            Ok(())
        } else {
            Err(CatalogError::not_found(E::ENTITY_TYPE, &row.id))
        }
    }

    pub async fn delete<S, E>(store: &S, id: &str) -> CatalogResult<()>
    where
        S: EntityStore<E>,
        E: EntityKind,
    {
        if EntityStore::<E>::delete_by_id(store, id).await? {
            log::info!("Deleted {} '{}'", E::ENTITY_TYPE, id);
            Ok(())
        } else {
            Err(CatalogError::not_found(E::ENTITY_TYPE, id))
        }
    }

    pub async fn delete_by_name<S, E>(store: &S, full_name: &str) -> CatalogResult<()>
    where
        S: EntityStore<E>,
        E: EntityKind,
    {
        if EntityStore::<E>::delete_by_fqn(store, full_name).await? {
            log::info!("Deleted {} '{}'", E::ENTITY_TYPE, full_name);
            Ok(())
        } else {
            Err(CatalogError::not_found(E::ENTITY_TYPE, full_name))
        }
    }
}
