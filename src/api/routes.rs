use axum::{
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;

use crate::api::handlers::{self, AppState};
use crate::logic::CreatePayload;
use crate::model::{
    CreateDatabase, CreateDatabaseSchema, CreateDatabaseService, CreateStoredProcedure,
    CreateTable, CreateWorkflow, TestConnectionDefinition,
};
use crate::store::{EntityStore, Store};

pub const API_PREFIX: &str = "/api/v1";

pub fn create_router<S: Store>() -> Router<AppState<S>> {
    let api = Router::new()
        // System
        .route("/system/health", get(handlers::health_check))
        .route("/system/version", get(handlers::get_version::<S>))
        // Entity hierarchy
        .nest(
            "/services/databaseServices",
            entity_routes::<S, CreateDatabaseService>(),
        )
        .nest("/databases", entity_routes::<S, CreateDatabase>())
        .nest("/databaseSchemas", entity_routes::<S, CreateDatabaseSchema>())
        .nest("/tables", entity_routes::<S, CreateTable>())
        .nest("/storedProcedures", entity_routes::<S, CreateStoredProcedure>())
        // Automations
        .nest(
            "/automations/workflows",
            entity_routes::<S, CreateWorkflow>()
                .route("/trigger/:id", post(handlers::trigger_workflow::<S>)),
        )
        // Test connection definitions are seeded at startup and read-only
        .nest(
            "/services/testConnectionDefinitions",
            Router::new()
                .route(
                    "/",
                    get(handlers::list_entities::<S, TestConnectionDefinition>),
                )
                .route(
                    "/:id",
                    get(handlers::get_entity::<S, TestConnectionDefinition>),
                )
                .route(
                    "/name/:fqn",
                    get(handlers::get_entity_by_name::<S, TestConnectionDefinition>),
                ),
        );

    Router::new().nest(API_PREFIX, api)
}

/// List, read, create, upsert, patch and delete routes for the entity built
/// from payload `P`.
fn entity_routes<S, P>() -> Router<AppState<S>>
where
    S: Store + EntityStore<P::Entity>,
    P: CreatePayload + DeserializeOwned + 'static,
{
    Router::new()
        .route(
            "/",
            get(handlers::list_entities::<S, P::Entity>)
                .post(handlers::create_entity::<S, P>)
                .put(handlers::upsert_entity::<S, P>),
        )
        .route(
            "/:id",
            get(handlers::get_entity::<S, P::Entity>)
                .patch(handlers::patch_entity::<S, P::Entity>)
                .delete(handlers::delete_entity::<S, P::Entity>),
        )
        .route(
            "/name/:fqn",
            get(handlers::get_entity_by_name::<S, P::Entity>)
                .delete(handlers::delete_entity_by_name::<S, P::Entity>),
        )
}
