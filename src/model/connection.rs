//! Typed connection records, one per supported service type.
//!
//! These are the decoded shapes of `DatabaseConnection::config`. Capability
//! flags are plain `bool`s: the validator fills absent flags from its default
//! table before decoding, so a decoded record is always fully populated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PostgresType {
    #[default]
    Postgres,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PostgresScheme {
    #[default]
    #[serde(rename = "postgresql+psycopg2")]
    PostgresqlPsycopg2,
    #[serde(rename = "pgspider+psycopg2")]
    PgspiderPsycopg2,
}

/// SSL mode used to reach the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    #[default]
    Disable,
    Allow,
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MysqlType {
    #[default]
    Mysql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MysqlScheme {
    #[default]
    #[serde(rename = "mysql+pymysql")]
    MysqlPymysql,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostgresConnection {
    #[serde(rename = "type", default)]
    pub connection_type: PostgresType,
    #[serde(default)]
    pub scheme: PostgresScheme,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<Map<String, Value>>,
    pub host_port: String,
    pub database: String,
    pub ingest_all_databases: bool,
    #[serde(default)]
    pub ssl_mode: SslMode,
    pub supports_metadata_extraction: bool,
    pub supports_usage_extraction: bool,
    pub supports_lineage_extraction: bool,
    #[serde(rename = "supportsDBTExtraction")]
    pub supports_dbt_extraction: bool,
    pub supports_profiler: bool,
    pub supports_database: bool,
    pub supports_query_comment: bool,
    pub supports_data_diff: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MysqlConnection {
    #[serde(rename = "type", default)]
    pub connection_type: MysqlType,
    #[serde(default)]
    pub scheme: MysqlScheme,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<Map<String, Value>>,
    pub host_port: String,
    pub database_name: String,
    pub database_schema: String,
    pub supports_metadata_extraction: bool,
    #[serde(rename = "supportsDBTExtraction")]
    pub supports_dbt_extraction: bool,
    pub supports_profiler: bool,
    pub supports_query_comment: bool,
    pub supports_data_diff: bool,
    pub supports_usage_extraction: bool,
    pub supports_lineage_extraction: bool,
}

/// A validated connection config, tagged by service type.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionConfig {
    Postgres(PostgresConnection),
    Mysql(MysqlConnection),
}

impl ConnectionConfig {
    pub fn host_port(&self) -> &str {
        match self {
            ConnectionConfig::Postgres(c) => &c.host_port,
            ConnectionConfig::Mysql(c) => &c.host_port,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            ConnectionConfig::Postgres(c) => &c.username,
            ConnectionConfig::Mysql(c) => &c.username,
        }
    }

    /// Password carried in `authType.password`, if any.
    pub fn password(&self) -> Option<&str> {
        let auth_type = match self {
            ConnectionConfig::Postgres(c) => c.auth_type.as_ref(),
            ConnectionConfig::Mysql(c) => c.auth_type.as_ref(),
        };
        auth_type
            .and_then(|auth| auth.get("password"))
            .and_then(Value::as_str)
    }

    pub fn database(&self) -> &str {
        match self {
            ConnectionConfig::Postgres(c) => &c.database,
            ConnectionConfig::Mysql(c) => &c.database_name,
        }
    }
}
