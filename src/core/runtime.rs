//! Process runtime traits
//!
//! Actions, cloud properties and downloads all end in a named process run by
//! an external engine. The crate only needs to resolve a name to something it
//! can execute; [`ProcessRuntime`] is that seam. [`ProcessTable`] is a plain
//! in-memory implementation.

use crate::core::request::ProcessRequest;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// An executable process
///
/// Closures `Fn(ProcessRequest) -> anyhow::Result<Value>` implement this
/// trait directly.
#[async_trait]
pub trait Process: Send + Sync {
    async fn exec(&self, request: ProcessRequest) -> Result<Value>;
}

#[async_trait]
impl<F> Process for F
where
    F: Fn(ProcessRequest) -> Result<Value> + Send + Sync,
{
    async fn exec(&self, request: ProcessRequest) -> Result<Value> {
        self(request)
    }
}

/// Resolves process names
pub trait ProcessRuntime: Send + Sync {
    /// Look up a process. Fails when the name does not refer to a process.
    fn process_of(&self, name: &str) -> Result<Arc<dyn Process>>;
}

/// In-memory process table
#[derive(Clone, Default)]
pub struct ProcessTable {
    processes: HashMap<String, Arc<dyn Process>>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a process, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, process: impl Process + 'static) {
        self.processes.insert(name.into(), Arc::new(process));
    }

    /// Register a closure as a process
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(ProcessRequest) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(name, f);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, name: impl Into<String>, process: impl Process + 'static) -> Self {
        self.register(name, process);
        self
    }

    /// Builder-style [`register_fn`](Self::register_fn)
    pub fn with_fn<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(ProcessRequest) -> Result<Value> + Send + Sync + 'static,
    {
        self.register_fn(name, f);
        self
    }

    /// Registered process names
    pub fn names(&self) -> Vec<&str> {
        self.processes.keys().map(|s| s.as_str()).collect()
    }
}

impl ProcessRuntime for ProcessTable {
    fn process_of(&self, name: &str) -> Result<Arc<dyn Process>> {
        self.processes
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Process '{}' is not registered", name))
    }
}
