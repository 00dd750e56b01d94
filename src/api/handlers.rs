use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::CatalogError;
use crate::logic::{Catalog, ConnectionProber, CreatePayload, WorkflowRunner};
use crate::model::{
    CatalogVersion, EntityKind, EntityType, HealthStatus, Id, Paging, PatchOperation, ResultList,
    UserContext, Workflow,
};
use crate::store::{EntityStore, Store};

/// Everything a request handler needs: the store, the prober used by
/// workflow triggers and the version reported by `/system/version`.
pub struct CatalogState<S> {
    pub store: S,
    pub prober: Arc<dyn ConnectionProber>,
    pub version: CatalogVersion,
}

impl<S: Store> CatalogState<S> {
    pub fn new(store: S, prober: Arc<dyn ConnectionProber>, version: CatalogVersion) -> Self {
        Self {
            store,
            prober,
            version,
        }
    }
}

pub type AppState<S> = Arc<CatalogState<S>>;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

pub fn status_for(error: &CatalogError) -> StatusCode {
    match error {
        CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
        CatalogError::AlreadyExists { .. } => StatusCode::CONFLICT,
        CatalogError::InvalidPath { .. }
        | CatalogError::UnsupportedServiceType(_)
        | CatalogError::InvalidConfig(_)
        | CatalogError::InvalidPayload(_)
        | CatalogError::PatchFailed(_) => StatusCode::BAD_REQUEST,
        CatalogError::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render a catalog error as `{"error": message}` with its status code.
pub fn api_error(error: CatalogError) -> ApiError {
    let status = status_for(&error);
    if status.is_server_error() {
        log::error!("{}", error);
    } else {
        log::debug!("Request rejected ({}): {}", status, error);
    }
    (status, Json(ErrorResponse::new(&error.to_string())))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub service: Option<String>,
    pub database: Option<String>,
    pub database_schema: Option<String>,
}

impl ListQuery {
    pub fn paging(&self) -> Paging {
        Paging::new(self.limit, self.offset)
    }

    /// The parent filter that applies to `entity_type`. Filters meant for
    /// other kinds are ignored.
    pub fn parent_for(&self, entity_type: EntityType) -> Option<&str> {
        let parent = match entity_type {
            EntityType::Database => &self.service,
            EntityType::DatabaseSchema => &self.database,
            EntityType::Table | EntityType::StoredProcedure => &self.database_schema,
            _ => return None,
        };
        parent.as_deref()
    }
}

pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus::healthy())
}

pub async fn get_version<S: Store>(State(state): State<AppState<S>>) -> Json<CatalogVersion> {
    Json(state.version.clone())
}

pub async fn list_entities<S, E>(
    State(state): State<AppState<S>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ResultList<E>>, ApiError>
where
    S: Store + EntityStore<E>,
    E: EntityKind,
{
    let parent = query.parent_for(E::ENTITY_TYPE);
    Catalog::list::<S, E>(&state.store, parent, query.paging())
        .await
        .map(Json)
        .map_err(api_error)
}

pub async fn get_entity<S, E>(
    State(state): State<AppState<S>>,
    Path(id): Path<Id>,
) -> Result<Json<E>, ApiError>
where
    S: Store + EntityStore<E>,
    E: EntityKind,
{
    Catalog::get::<S, E>(&state.store, &id)
        .await
        .map(Json)
        .map_err(api_error)
}

pub async fn get_entity_by_name<S, E>(
    State(state): State<AppState<S>>,
    Path(fqn): Path<String>,
) -> Result<Json<E>, ApiError>
where
    S: Store + EntityStore<E>,
    E: EntityKind,
{
    Catalog::get_by_name::<S, E>(&state.store, &fqn)
        .await
        .map(Json)
        .map_err(api_error)
}

pub async fn create_entity<S, P>(
    State(state): State<AppState<S>>,
    user: UserContext,
    RequestJson(payload): RequestJson<P>,
) -> Result<(StatusCode, Json<P::Entity>), ApiError>
where
    S: Store + EntityStore<P::Entity>,
    P: CreatePayload + DeserializeOwned,
{
    let entity = Catalog::create(&state.store, &payload, &user)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(entity)))
}

/// `PUT`: 201 when the FQN was new, 200 when an existing entity was replaced.
pub async fn upsert_entity<S, P>(
    State(state): State<AppState<S>>,
    user: UserContext,
    RequestJson(payload): RequestJson<P>,
) -> Result<(StatusCode, Json<P::Entity>), ApiError>
where
    S: Store + EntityStore<P::Entity>,
    P: CreatePayload + DeserializeOwned,
{
    let (entity, created) = Catalog::create_or_update(&state.store, &payload, &user)
        .await
        .map_err(api_error)?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(entity)))
}

pub async fn patch_entity<S, E>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
    RequestJson(ops): RequestJson<Vec<PatchOperation>>,
) -> Result<Json<E>, ApiError>
where
    S: Store + EntityStore<E>,
    E: EntityKind,
{
    Catalog::patch::<S, E>(&state.store, &id, &ops, &user)
        .await
        .map(Json)
        .map_err(api_error)
}

pub async fn delete_entity<S, E>(
    State(state): State<AppState<S>>,
    Path(id): Path<Id>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: Store + EntityStore<E>,
    E: EntityKind,
{
    Catalog::delete::<S, E>(&state.store, &id)
        .await
        .map_err(api_error)?;
    Ok(Json(serde_json::json!({
        "message": format!("{} '{}' deleted", E::ENTITY_TYPE, id)
    })))
}

pub async fn delete_entity_by_name<S, E>(
    State(state): State<AppState<S>>,
    Path(fqn): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: Store + EntityStore<E>,
    E: EntityKind,
{
    Catalog::delete_by_name::<S, E>(&state.store, &fqn)
        .await
        .map_err(api_error)?;
    Ok(Json(serde_json::json!({
        "message": format!("{} '{}' deleted", E::ENTITY_TYPE, fqn)
    })))
}

/// Run the test connection of a workflow. A failed probe still answers 200
/// with the workflow in status `Failed`.
pub async fn trigger_workflow<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
) -> Result<Json<Workflow>, ApiError> {
    WorkflowRunner::trigger(&state.store, state.prober.as_ref(), &id, &user)
        .await
        .map(Json)
        .map_err(api_error)
}
