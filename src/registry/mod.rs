//! In-memory table of registered tools (C4).
//!
//! Backed by a single `RwLock`-guarded map. Mutations (register / unregister)
//! take the write half for the whole check-then-insert sequence, which is
//! what closes the concurrent-duplicate-add race: two callers racing to add
//! the same name cannot both observe "absent" before either one inserts.

use crate::errors::{AppError, AppResult};
use crate::mcp::schema::JsonSchema;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A registered tool's descriptor, independent of where its source came
/// from or how it will be invoked.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub description: String,
    pub input_schema: JsonSchema,
    /// Parameter name -> annotation description, recovered from the
    /// decorator's `annotations.parameters` mapping. Never evaluated, only
    /// merged on top of the sandbox-derived schema at `list_tools` time.
    pub parameter_annotations: HashMap<String, String>,
}

/// One entry in the registry: everything needed to execute a call without
/// touching the catalog again.
#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    pub source: String,
    pub descriptor: ToolDescriptor,
    pub dependencies: Vec<String>,
    pub entry_symbol: String,
}

#[derive(Default)]
struct Inner {
    tools: HashMap<String, Tool>,
}

/// Thread-safe table of registered tools.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `tool`, rejecting if `tool.name` is already present.
    ///
    /// The existence check and the insert happen under the same write
    /// guard, so two concurrent `register` calls for the same name cannot
    /// both succeed.
    pub async fn register(&self, tool: Tool) -> AppResult<()> {
        let mut guard = self.inner.write().await;
        if guard.tools.contains_key(&tool.name) {
            return Err(AppError::duplicate_tool(&tool.name));
        }
        tracing::info!(tool = %tool.name, "registered tool");
        guard.tools.insert(tool.name.clone(), tool);
        Ok(())
    }

    /// Removes `name`, rejecting if it was never registered.
    pub async fn unregister(&self, name: &str) -> AppResult<()> {
        let mut guard = self.inner.write().await;
        if guard.tools.remove(name).is_none() {
            return Err(AppError::unknown_tool(name));
        }
        tracing::info!(tool = name, "unregistered tool");
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Option<Tool> {
        self.inner.read().await.tools.get(name).cloned()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.inner.read().await.tools.contains_key(name)
    }

    pub async fn list(&self) -> Vec<Tool> {
        self.inner.read().await.tools.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tool(name: &str) -> Tool {
        Tool {
            name: name.to_string(),
            source: "def f(): pass".to_string(),
            descriptor: ToolDescriptor {
                description: "test tool".to_string(),
                input_schema: JsonSchema::object(HashMap::new(), vec![]),
                parameter_annotations: HashMap::new(),
            },
            dependencies: vec![],
            entry_symbol: name.to_string(),
        }
    }

    #[tokio::test]
    async fn register_rejects_duplicate_name() {
        let registry = ToolRegistry::new();
        registry.register(sample_tool("a")).await.unwrap();
        let err = registry.register(sample_tool("a")).await.unwrap_err();
        assert!(matches!(err.code, crate::errors::ErrorCode::DuplicateTool));
    }

    #[tokio::test]
    async fn unregister_rejects_unknown_name() {
        let registry = ToolRegistry::new();
        let err = registry.unregister("missing").await.unwrap_err();
        assert!(matches!(err.code, crate::errors::ErrorCode::UnknownTool));
    }

    #[tokio::test]
    async fn register_then_list_round_trips() {
        let registry = ToolRegistry::new();
        registry.register(sample_tool("a")).await.unwrap();
        registry.register(sample_tool("b")).await.unwrap();
        let names: Vec<_> = registry.list().await.into_iter().map(|t| t.name).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"a".to_string()));
        assert!(names.contains(&"b".to_string()));
    }

    #[tokio::test]
    async fn concurrent_duplicate_add_only_one_wins() {
        let registry = ToolRegistry::new();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move { registry.register(sample_tool("race")).await }));
        }
        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }
}
