//! Connection config validation and normalization.
//!
//! A service's `connection.config` arrives as an open JSON map. Each service
//! type registers a typed record with a table of default flags; validation
//! fills the defaults, decodes into the record, checks required fields and
//! writes the canonical form back over the caller's map.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CatalogError, CatalogResult};
use crate::model::{ConnectionConfig, MysqlConnection, PostgresConnection, ServiceType};

/// A typed connection record with its default table.
trait ConnectionSpec: Serialize + DeserializeOwned + Into<ConnectionConfig> {
    /// Boolean fields filled in when absent.
    const DEFAULTS: &'static [(&'static str, bool)];

    /// Required string fields, by wire name.
    fn required(&self) -> Vec<(&'static str, &str)>;
}

impl ConnectionSpec for PostgresConnection {
    const DEFAULTS: &'static [(&'static str, bool)] = &[
        ("ingestAllDatabases", false),
        ("supportsMetadataExtraction", true),
        ("supportsUsageExtraction", true),
        ("supportsLineageExtraction", true),
        ("supportsDBTExtraction", true),
        ("supportsProfiler", true),
        ("supportsDatabase", true),
        ("supportsQueryComment", true),
        ("supportsDataDiff", true),
    ];

    fn required(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("username", self.username.as_str()),
            ("hostPort", self.host_port.as_str()),
            ("database", self.database.as_str()),
        ]
    }
}

impl ConnectionSpec for MysqlConnection {
    const DEFAULTS: &'static [(&'static str, bool)] = &[
        ("supportsMetadataExtraction", true),
        ("supportsDBTExtraction", true),
        ("supportsProfiler", true),
        ("supportsQueryComment", true),
        ("supportsDataDiff", true),
        ("supportsUsageExtraction", true),
        ("supportsLineageExtraction", true),
    ];

    fn required(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("username", self.username.as_str()),
            ("hostPort", self.host_port.as_str()),
            ("databaseName", self.database_name.as_str()),
            ("databaseSchema", self.database_schema.as_str()),
        ]
    }
}

impl From<PostgresConnection> for ConnectionConfig {
    fn from(config: PostgresConnection) -> Self {
        ConnectionConfig::Postgres(config)
    }
}

impl From<MysqlConnection> for ConnectionConfig {
    fn from(config: MysqlConnection) -> Self {
        ConnectionConfig::Mysql(config)
    }
}

type Decoder = fn(&Map<String, Value>) -> CatalogResult<ConnectionConfig>;

/// Validator registered for a service type.
fn validator(service_type: ServiceType) -> Decoder {
    match service_type {
        ServiceType::Postgres => decode::<PostgresConnection>,
        ServiceType::MySql => decode::<MysqlConnection>,
    }
}

fn decode<T: ConnectionSpec>(config: &Map<String, Value>) -> CatalogResult<ConnectionConfig> {
    let mut map: Map<String, Value> = config
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    for (key, default) in T::DEFAULTS {
        map.entry(key.to_string()).or_insert(Value::Bool(*default));
    }

    let record: T = serde_json::from_value(Value::Object(map))
        .map_err(|e| CatalogError::InvalidConfig(e.to_string()))?;

    if let Some((field, _)) = record
        .required()
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
    {
        return Err(CatalogError::InvalidConfig(format!(
            "'{}' must not be blank",
            field
        )));
    }

    Ok(record.into())
}

/// Validate `config` against the record registered for `service_type`.
pub fn decode_connection(
    service_type: ServiceType,
    config: &Map<String, Value>,
) -> CatalogResult<ConnectionConfig> {
    validator(service_type)(config)
}

/// Same as [`decode_connection`] for a service type that is still a raw tag,
/// e.g. the `connectionType` of a test-connection request.
pub fn decode_tagged_connection(
    tag: &str,
    config: &Map<String, Value>,
) -> CatalogResult<ConnectionConfig> {
    decode_connection(tag.parse()?, config)
}

/// Validate and replace `config` in place with its canonical form.
pub fn normalize_connection(
    service_type: ServiceType,
    config: &mut Map<String, Value>,
) -> CatalogResult<()> {
    let decoded = decode_connection(service_type, config)?;
    *config = to_map(&decoded)?;
    Ok(())
}

fn to_map(config: &ConnectionConfig) -> CatalogResult<Map<String, Value>> {
    let value = match config {
        ConnectionConfig::Postgres(c) => serde_json::to_value(c),
        ConnectionConfig::Mysql(c) => serde_json::to_value(c),
    }
    .map_err(|e| CatalogError::InvalidConfig(e.to_string()))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(CatalogError::InvalidConfig(format!(
            "connection config serialized to {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SslMode;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn postgres_config() -> Map<String, Value> {
        object(json!({
            "username": "postgres",
            "authType": {"password": "secret"},
            "hostPort": "localhost:5432",
            "database": "sales"
        }))
    }

    #[test]
    fn test_postgres_defaults_applied() {
        let mut config = postgres_config();
        normalize_connection(ServiceType::Postgres, &mut config).unwrap();

        assert_eq!(config["type"], "Postgres");
        assert_eq!(config["scheme"], "postgresql+psycopg2");
        assert_eq!(config["sslMode"], "disable");
        assert_eq!(config["ingestAllDatabases"], false);
        for flag in [
            "supportsMetadataExtraction",
            "supportsUsageExtraction",
            "supportsLineageExtraction",
            "supportsDBTExtraction",
            "supportsProfiler",
            "supportsDatabase",
            "supportsQueryComment",
            "supportsDataDiff",
        ] {
            assert_eq!(config[flag], true, "{} should default to true", flag);
        }
        assert_eq!(config["authType"]["password"], "secret");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let mut config = postgres_config();
        config.insert("supportsProfiler".to_string(), json!(false));
        config.insert("sslMode".to_string(), json!("verify-full"));

        normalize_connection(ServiceType::Postgres, &mut config).unwrap();
        let once = config.clone();
        normalize_connection(ServiceType::Postgres, &mut config).unwrap();

        assert_eq!(config, once);
        assert_eq!(config["supportsProfiler"], false);
        assert_eq!(config["sslMode"], "verify-full");
    }

    #[test]
    fn test_missing_or_blank_required_fields() {
        let mut config = postgres_config();
        config.remove("hostPort");
        assert!(matches!(
            normalize_connection(ServiceType::Postgres, &mut config),
            Err(CatalogError::InvalidConfig(_))
        ));
        // Failed validation leaves the map untouched
        assert!(config.get("sslMode").is_none());

        let mut config = postgres_config();
        config.insert("username".to_string(), json!("   "));
        let err = normalize_connection(ServiceType::Postgres, &mut config).unwrap_err();
        assert!(err.to_string().contains("username"));
    }

    #[test]
    fn test_nulls_are_treated_as_absent() {
        let mut config = postgres_config();
        config.insert("sslMode".to_string(), Value::Null);
        config.insert("supportsDataDiff".to_string(), Value::Null);

        normalize_connection(ServiceType::Postgres, &mut config).unwrap();
        assert_eq!(config["sslMode"], "disable");
        assert_eq!(config["supportsDataDiff"], true);
    }

    #[test]
    fn test_enumerations_are_closed() {
        let mut config = postgres_config();
        config.insert("sslMode".to_string(), json!("sometimes"));
        assert!(matches!(
            normalize_connection(ServiceType::Postgres, &mut config),
            Err(CatalogError::InvalidConfig(_))
        ));

        let mut config = postgres_config();
        config.insert("scheme".to_string(), json!("mysql+pymysql"));
        assert!(normalize_connection(ServiceType::Postgres, &mut config).is_err());
    }

    #[test]
    fn test_type_mismatch_and_unknown_fields() {
        let mut config = postgres_config();
        config.insert("supportsProfiler".to_string(), json!("yes"));
        assert!(matches!(
            normalize_connection(ServiceType::Postgres, &mut config),
            Err(CatalogError::InvalidConfig(_))
        ));

        let mut config = postgres_config();
        config.insert("warehouse".to_string(), json!("compute_wh"));
        normalize_connection(ServiceType::Postgres, &mut config).unwrap();
        assert!(config.get("warehouse").is_none());
    }

    #[test]
    fn test_mysql_connection() {
        let mut config = object(json!({
            "username": "root",
            "hostPort": "localhost:3306",
            "databaseName": "shop",
            "databaseSchema": "shop"
        }));
        normalize_connection(ServiceType::MySql, &mut config).unwrap();
        assert_eq!(config["type"], "Mysql");
        assert_eq!(config["scheme"], "mysql+pymysql");
        assert_eq!(config["supportsLineageExtraction"], true);
        assert!(config.get("sslMode").is_none());

        config.remove("databaseSchema");
        assert!(normalize_connection(ServiceType::MySql, &mut config).is_err());
    }

    #[test]
    fn test_tagged_dispatch() {
        let config = postgres_config();
        match decode_tagged_connection("Postgres", &config).unwrap() {
            ConnectionConfig::Postgres(pg) => {
                assert_eq!(pg.ssl_mode, SslMode::Disable);
                assert_eq!(pg.host_port, "localhost:5432");
            }
            other => panic!("unexpected variant {:?}", other),
        }

        assert!(matches!(
            decode_tagged_connection("Oracle", &config),
            Err(CatalogError::UnsupportedServiceType(ref tag)) if tag == "Oracle"
        ));
    }
}
