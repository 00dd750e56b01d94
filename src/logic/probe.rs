//! Live reachability probes for connection configs.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::Connection;
use std::time::Duration;

use crate::error::{CatalogError, CatalogResult};
use crate::logic::connection::decode_tagged_connection;
use crate::model::{ConnectionConfig, MysqlConnection, PostgresConnection, SslMode};

/// Result of one probe. A probe never errors: every failure is an outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub passed: bool,
    pub message: String,
    pub error_log: Option<String>,
}

impl ProbeOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            error_log: None,
        }
    }

    pub fn failure(message: impl Into<String>, error_log: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            error_log: Some(error_log.into()),
        }
    }
}

#[async_trait::async_trait]
pub trait ConnectionProber: Send + Sync {
    /// Check whether the connection described by `connection_type` and
    /// `config` can be opened.
    async fn probe(&self, connection_type: &str, config: &Map<String, Value>) -> ProbeOutcome;
}

/// Opens a real connection with sqlx, pings it and closes it again.
#[derive(Debug, Clone)]
pub struct SqlxProber {
    timeout: Duration,
}

impl SqlxProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn connect_and_ping(config: &ConnectionConfig) -> Result<()> {
        match config {
            ConnectionConfig::Postgres(pg) => {
                let options = postgres_options(pg, config.password())?;
                let mut connection = PgConnection::connect_with(&options)
                    .await
                    .context("Failed to connect to Postgres")?;
                connection.ping().await.context("Postgres ping failed")?;
                connection.close().await.context("Failed to close Postgres connection")?;
            }
            ConnectionConfig::Mysql(mysql) => {
                let options = mysql_options(mysql, config.password())?;
                let mut connection = MySqlConnection::connect_with(&options)
                    .await
                    .context("Failed to connect to MySQL")?;
                connection.ping().await.context("MySQL ping failed")?;
                connection.close().await.context("Failed to close MySQL connection")?;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ConnectionProber for SqlxProber {
    async fn probe(&self, connection_type: &str, config: &Map<String, Value>) -> ProbeOutcome {
        let decoded = match decode_tagged_connection(connection_type, config) {
            Ok(decoded) => decoded,
            Err(e) => return ProbeOutcome::failure("Invalid connection configuration", e.to_string()),
        };

        log::info!(
            "Probing {} connection at {}",
            connection_type,
            decoded.host_port()
        );
        match tokio::time::timeout(self.timeout, Self::connect_and_ping(&decoded)).await {
            Ok(Ok(())) => ProbeOutcome::success("Connection succeeded"),
            Ok(Err(e)) => {
                log::warn!("Probe of {} failed: {:#}", decoded.host_port(), e);
                ProbeOutcome::failure("Connection failed", format!("{:#}", e))
            }
            Err(_) => ProbeOutcome::failure(
                "Connection timed out",
                format!("no response from {} within {:?}", decoded.host_port(), self.timeout),
            ),
        }
    }
}

/// Split `host:port`. The port is required; IPv6 hosts may be bracketed.
pub fn parse_host_port(host_port: &str) -> CatalogResult<(String, u16)> {
    let invalid = |reason: &str| {
        CatalogError::InvalidConfig(format!("hostPort '{}': {}", host_port, reason))
    };

    let (host, port) = host_port
        .rsplit_once(':')
        .ok_or_else(|| invalid("missing port"))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(invalid("missing host"));
    }
    let port = port.parse::<u16>().map_err(|_| invalid("port is not a number"))?;
    Ok((host.to_string(), port))
}

fn pg_ssl_mode(mode: SslMode) -> PgSslMode {
    match mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Allow => PgSslMode::Allow,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
        SslMode::VerifyCa => PgSslMode::VerifyCa,
        SslMode::VerifyFull => PgSslMode::VerifyFull,
    }
}

fn postgres_options(pg: &PostgresConnection, password: Option<&str>) -> Result<PgConnectOptions> {
    let (host, port) = parse_host_port(&pg.host_port)?;
    let mut options = PgConnectOptions::new()
        .host(&host)
        .port(port)
        .username(&pg.username)
        .database(&pg.database)
        .ssl_mode(pg_ssl_mode(pg.ssl_mode));
    if let Some(password) = password {
        options = options.password(password);
    }
    Ok(options)
}

fn mysql_options(mysql: &MysqlConnection, password: Option<&str>) -> Result<MySqlConnectOptions> {
    let (host, port) = parse_host_port(&mysql.host_port)?;
    let mut options = MySqlConnectOptions::new()
        .host(&host)
        .port(port)
        .username(&mysql.username)
        .database(&mysql.database_name);
    if let Some(password) = password {
        options = options.password(password);
    }
    Ok(options)
}
