use std::path::PathBuf;

use crate::models::tool::Tool;
use crate::tools::{get_file_content, get_files_info, run_python_file, write_file, Sandbox};

/// Builds a tool bound to a sandbox root
pub type ToolFactory = fn(Sandbox) -> Tool;

/// Every built-in tool, in registration order
pub const BUILTIN_TOOLS: &[(&str, ToolFactory)] = &[
    (get_file_content::NAME, get_file_content::build_tool),
    (get_files_info::NAME, get_files_info::build_tool),
    (run_python_file::NAME, run_python_file::build_tool),
    (write_file::NAME, write_file::build_tool),
];

/// An ordered, read-only set of tools with unique names.
///
/// When two tools share a name the first one registered is kept.
#[derive(Debug, Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every built-in tool to `root`
    pub fn with_builtins<P: Into<PathBuf>>(root: P) -> Self {
        Self::from_factories(Sandbox::new(root), BUILTIN_TOOLS)
    }

    pub fn from_factories(sandbox: Sandbox, factories: &[(&str, ToolFactory)]) -> Self {
        let mut registry = Self::new();
        for (_, factory) in factories {
            registry.register(factory(sandbox.clone()));
        }
        registry
    }

    /// Add a tool, returning false if its name was already taken
    pub fn register(&mut self, tool: Tool) -> bool {
        if self.get(&tool.name).is_some() {
            tracing::warn!(tool = %tool.name, "dropping duplicate tool registration");
            return false;
        }
        self.tools.push(tool);
        true
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl FromIterator<Tool> for ToolRegistry {
    fn from_iter<I: IntoIterator<Item = Tool>>(iter: I) -> Self {
        let mut registry = Self::new();
        for tool in iter {
            registry.register(tool);
        }
        registry
    }
}
