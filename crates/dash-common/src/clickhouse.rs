//! ClickHouse client wrapper for the trading dashboard.
//!
//! Provides a type-safe interface for bar inserts and schema management.

use clickhouse::Client;
use thiserror::Error;

use crate::BarRow;

/// Errors that can occur during ClickHouse operations.
#[derive(Debug, Error)]
pub enum ClickHouseError {
    #[error("ClickHouse client error: {0}")]
    Client(#[from] clickhouse::error::Error),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Schema creation failed: {0}")]
    Schema(String),
}

/// Configuration for the ClickHouse client.
#[derive(Debug, Clone)]
pub struct ClickHouseConfig {
    /// ClickHouse HTTP URL (e.g., "http://localhost:8123").
    pub url: String,
    /// Database name.
    pub database: String,
    /// Username (optional).
    pub user: Option<String>,
    /// Password (optional).
    pub password: Option<String>,
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".to_string(),
            database: "dashboard".to_string(),
            user: None,
            password: None,
        }
    }
}

/// ClickHouse client wrapper.
#[derive(Clone)]
pub struct ClickHouseClient {
    client: Client,
}

impl ClickHouseClient {
    /// Creates a new ClickHouse client with the given configuration.
    pub fn new(config: ClickHouseConfig) -> Self {
        let mut client = Client::default()
            .with_url(&config.url)
            .with_database(&config.database);

        if let Some(ref user) = config.user {
            client = client.with_user(user);
        }
        if let Some(ref password) = config.password {
            client = client.with_password(password);
        }

        Self { client }
    }

    /// Creates a client with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ClickHouseConfig::default())
    }

    /// Returns a reference to the underlying clickhouse client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Tests the connection by running a simple query.
    pub async fn ping(&self) -> Result<(), ClickHouseError> {
        self.client
            .query("SELECT 1")
            .fetch_one::<u8>()
            .await
            .map_err(|e| ClickHouseError::Connection(e.to_string()))?;
        Ok(())
    }

    /// Creates all required tables using the embedded schema.
    pub async fn create_tables(&self) -> Result<(), ClickHouseError> {
        for statement in schema_statements(include_str!("schema.sql")) {
            self.client
                .query(&statement)
                .execute()
                .await
                .map_err(|e| ClickHouseError::Schema(format!("{}: {}", e, statement)))?;
        }

        Ok(())
    }

    /// Inserts a batch of bars in a single request.
    pub async fn insert_bars(&self, bars: &[BarRow]) -> Result<(), ClickHouseError> {
        if bars.is_empty() {
            return Ok(());
        }

        let mut insert = self.client.insert("bars")?;
        for bar in bars {
            insert.write(bar).await?;
        }
        insert.end().await?;
        Ok(())
    }
}

/// Splits a schema file into executable statements, dropping comment-only
/// blocks and comment lines.
fn schema_statements(schema: &str) -> Vec<String> {
    schema
        .split(';')
        .map(|statement| {
            statement
                .lines()
                .filter(|line| !line.trim().starts_with("--") && !line.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .filter(|statement| !statement.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ClickHouseConfig::default();
        assert_eq!(config.url, "http://localhost:8123");
        assert_eq!(config.database, "dashboard");
        assert!(config.user.is_none());
    }

    #[test]
    fn test_schema_statements_skip_comments() {
        let statements = schema_statements("-- header\n\nCREATE TABLE a (x Int8);\n-- trailing\n");
        assert_eq!(statements, vec!["CREATE TABLE a (x Int8)".to_string()]);
    }

    #[test]
    fn test_embedded_schema_has_bars_table() {
        let statements = schema_statements(include_str!("schema.sql"));
        assert_eq!(statements.len(), 1);
        assert!(statements[0].contains("CREATE TABLE IF NOT EXISTS bars"));
    }

    #[tokio::test]
    async fn test_insert_empty_batch_is_noop() {
        let client = ClickHouseClient::with_defaults();
        assert!(client.insert_bars(&[]).await.is_ok());
    }
}
