use serde::Deserialize;

use crate::error::RepositoryError;

/// Repository configuration: parsed from TOML.
///
/// ```toml
/// table = "customers"
/// partition_key = "emea"
///
/// [store]
/// backend = "memory"
/// page_size = 500
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    /// Table the records live in.
    pub table: String,

    /// Partition key shared by every row this repository writes or reads.
    pub partition_key: String,

    #[serde(default)]
    pub store: StoreConfig,
}

/// Store backend selection plus its options.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Remaining keys, handed to the backend's factory.
    #[serde(flatten)]
    pub options: toml::Table,
}

fn default_backend() -> String {
    "memory".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            options: toml::Table::new(),
        }
    }
}

impl StoreConfig {
    /// Backend options as a JSON object (`"{}"` when there are none).
    pub fn options_json(&self) -> Result<String, RepositoryError> {
        serde_json::to_string(&self.options)
            .map_err(|e| RepositoryError::Config(format!("store options: {e}")))
    }
}

impl RepositoryConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, RepositoryError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RepositoryError::Config(format!("{path}: {e}")))?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, RepositoryError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| RepositoryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RepositoryError> {
        if self.table.trim().is_empty() {
            return Err(RepositoryError::Config("table must not be empty".into()));
        }
        if self.partition_key.is_empty() {
            return Err(RepositoryError::Config("partition_key must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_defaults_to_memory() {
        let config = RepositoryConfig::parse(
            r#"
            table = "customers"
            partition_key = "emea"
            "#,
        )
        .unwrap();
        assert_eq!(config.table, "customers");
        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.store.options_json().unwrap(), "{}");
    }

    #[test]
    fn store_options_are_passed_through() {
        let config = RepositoryConfig::parse(
            r#"
            table = "customers"
            partition_key = "emea"

            [store]
            backend = "memory"
            page_size = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.store.options_json().unwrap(), r#"{"page_size":25}"#);
    }

    #[test]
    fn empty_keys_are_rejected() {
        let err = RepositoryConfig::parse("table = \"t\"\npartition_key = \"\"").unwrap_err();
        assert!(matches!(err, RepositoryError::Config(msg) if msg.contains("partition_key")));
        assert!(RepositoryConfig::parse("table = \" \"\npartition_key = \"p\"").is_err());
    }

    #[test]
    fn missing_table_is_a_config_error() {
        assert!(matches!(
            RepositoryConfig::parse("partition_key = \"p\""),
            Err(RepositoryError::Config(_))
        ));
    }
}
