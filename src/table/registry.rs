//! Table registry: resolves table identifiers to loaded definitions

use super::TableDefinition;
use crate::config::TablesConfig;
use crate::core::error::{ConfigError, ProcessResult, TableError};
use crate::core::request::ProcessRequest;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry for all loaded tables
///
/// Filled once at startup, then shared behind an `Arc` and only read.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: HashMap<String, Arc<TableDefinition>>,
}

impl TableRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Build a registry from configuration
    pub fn from_config(config: &TablesConfig) -> ProcessResult<Self> {
        let mut registry = Self::new();
        for table in &config.tables {
            registry.register(TableDefinition::from_config(table.clone()))?;
        }
        Ok(registry)
    }

    /// Register a table definition
    ///
    /// Table identifiers are unique; a second table with the same id is rejected.
    pub fn register(&mut self, table: TableDefinition) -> ProcessResult<()> {
        if self.tables.contains_key(&table.id) {
            return Err(ConfigError::Duplicate {
                kind: "table".to_string(),
                name: table.id,
            }
            .into());
        }
        self.tables.insert(table.id.clone(), Arc::new(table));
        Ok(())
    }

    /// Look up a table by id
    pub fn get(&self, id: &str) -> ProcessResult<Arc<TableDefinition>> {
        self.tables.get(id).cloned().ok_or_else(|| {
            TableError::NotFound {
                table: id.to_string(),
            }
            .into()
        })
    }

    /// Resolve the table named by argument 0 of `request`
    pub fn resolve(
        &self,
        process: &str,
        request: &ProcessRequest,
    ) -> ProcessResult<Arc<TableDefinition>> {
        self.get(request.table_id(process)?)
    }

    /// Get all registered table ids
    pub fn table_ids(&self) -> Vec<&str> {
        self.tables.keys().map(|s| s.as_str()).collect()
    }
}
