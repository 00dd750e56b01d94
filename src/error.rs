use thiserror::Error;

use crate::model::EntityType;

/// Errors surfaced by catalog operations.
///
/// Everything except `StoreFailure` is a caller error. Probe failures never
/// show up here: a failed probe is recorded as a `Failed` workflow result.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: EntityType, key: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("unsupported service type '{0}'")]
    UnsupportedServiceType(String),

    #[error("invalid connection config: {0}")]
    InvalidConfig(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("{entity} '{fqn}' already exists")]
    AlreadyExists { entity: EntityType, fqn: String },

    #[error("patch failed: {0}")]
    PatchFailed(String),

    #[error("store failure: {0:#}")]
    StoreFailure(#[from] anyhow::Error),
}

impl CatalogError {
    pub fn not_found(entity: EntityType, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
