use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogVersion {
    pub version: String,
    pub revision: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// List response envelope: `{data, paging: {total, limit, offset}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultList<T> {
    pub data: Vec<T>,
    pub paging: PagingInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
