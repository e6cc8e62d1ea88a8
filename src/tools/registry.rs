//! Tool registry for the chat layer.

use std::collections::BTreeMap;

use crate::error::ToolError;
use crate::llm::ToolDefinition;
use crate::tools::tool::{Tool, ToolContext, ToolKind};

/// Registry of available tools, keyed by kind.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolKind, Tool>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any earlier instance of the same kind.
    pub fn register(&mut self, tool: impl Into<Tool>) {
        let tool = tool.into();
        let kind = tool.kind();
        if self.tools.insert(kind, tool).is_some() {
            tracing::warn!(tool = %kind, "Replaced registered tool");
        } else {
            tracing::debug!("Registered tool: {}", kind);
        }
    }

    pub fn get(&self, kind: ToolKind) -> Option<&Tool> {
        self.tools.get(&kind)
    }

    pub fn has(&self, kind: ToolKind) -> bool {
        self.tools.contains_key(&kind)
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Function-calling schemas for the given kinds, or for every tool when `None`.
    /// Kinds that are not registered are skipped.
    pub fn definitions(&self, kinds: Option<&[ToolKind]>) -> Vec<ToolDefinition> {
        match kinds {
            None => self.tools.values().map(Tool::definition).collect(),
            Some(kinds) => kinds
                .iter()
                .filter_map(|kind| self.tools.get(kind))
                .map(Tool::definition)
                .collect(),
        }
    }

    /// Execute a tool by the name the model used.
    pub async fn execute(
        &self,
        name: &str,
        params: &serde_json::Value,
        ctx: &ToolContext<'_>,
    ) -> Result<String, ToolError> {
        let tool = ToolKind::from_name(name)
            .and_then(|kind| self.tools.get(&kind))
            .ok_or_else(|| ToolError::NotFound {
                name: name.to_string(),
            })?;

        tracing::info!(tool = name, rule = %ctx.red_flag.rule, "Executing tool");
        tool.execute(params, ctx).await
    }
}
