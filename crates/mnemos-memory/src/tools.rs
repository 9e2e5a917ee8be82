//! Memory tools for an agent's tool-calling loop
//!
//! [`MemoryTools`] binds a [`LongTermMemory`] to one conversation's
//! [`MemoryScope`] and exposes `store_memory` and `retrieve_memories` as
//! plain-text tools. Tool results are always strings the model can read;
//! failures are reported in the text, never raised.

use crate::filter::KindFilter;
use crate::record::{MemoryKind, NewMemory};
use crate::retriever::MemoryQuery;
use crate::store::{LongTermMemory, StoreOutcome};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Name of the store tool
pub const STORE_MEMORY_TOOL: &str = "store_memory";

/// Name of the retrieve tool
pub const RETRIEVE_MEMORIES_TOOL: &str = "retrieve_memories";

/// Who the tools act for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryScope {
    /// User whose memories are read and written
    pub user_id: String,

    /// Conversation the tools are called from
    pub thread_id: Option<String>,
}

impl MemoryScope {
    /// Scope for a user outside any thread
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            thread_id: None,
        }
    }

    /// Attach the calling thread
    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }
}

/// Agent-facing memory tools bound to a scope
#[derive(Clone)]
pub struct MemoryTools {
    memory: Arc<LongTermMemory>,
    scope: MemoryScope,
}

impl MemoryTools {
    /// Bind tools to a memory and scope
    pub fn new(memory: Arc<LongTermMemory>, scope: MemoryScope) -> Self {
        Self { memory, scope }
    }

    /// The bound scope
    pub fn scope(&self) -> &MemoryScope {
        &self.scope
    }

    /// Store a memory for the scope's user
    ///
    /// The thread is not attached, so the memory outlives the conversation.
    pub async fn store_memory(
        &self,
        content: &str,
        kind: MemoryKind,
        metadata: Option<Value>,
    ) -> String {
        let mut memory = NewMemory::new(content, kind).with_owner(&self.scope.user_id);
        if let Some(metadata) = metadata {
            memory = memory.with_metadata(metadata);
        }

        match self.memory.store(memory).await {
            Ok(StoreOutcome::Stored(_)) => {
                format!("Successfully stored {} memory: {}", kind, content)
            }
            Ok(StoreOutcome::Skipped) => format!("Similar memory already exists: {}", content),
            Ok(StoreOutcome::Failed { reason }) => format!("Error storing memory: {}", reason),
            Err(e) => format!("Error storing memory: {}", e),
        }
    }

    /// Retrieve the scope user's memories relevant to `query`
    pub async fn retrieve_memories(
        &self,
        query: &str,
        kinds: impl Into<KindFilter>,
        limit: Option<usize>,
    ) -> String {
        let mut request = MemoryQuery::new(query)
            .with_kinds(kinds)
            .with_owner(&self.scope.user_id);
        if let Some(limit) = limit {
            request = request.with_limit(limit);
        }

        match self.memory.retrieve(&request).await {
            Ok(records) if records.is_empty() => "No relevant memories found.".to_string(),
            Ok(records) => records
                .iter()
                .map(|r| format!("- [{}] {}", r.kind, r.content))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => format!("Error retrieving memories: {}", e),
        }
    }

    /// Dispatch a tool call by name with JSON arguments
    pub async fn invoke(&self, tool_name: &str, args: &Value) -> String {
        debug!(
            tool = %tool_name,
            user_id = %self.scope.user_id,
            thread_id = ?self.scope.thread_id,
            "Invoking memory tool"
        );
        let result = match tool_name {
            STORE_MEMORY_TOOL => match parse_store_args(args) {
                Ok((content, kind, metadata)) => {
                    Ok(self.store_memory(&content, kind, metadata).await)
                }
                Err(e) => Err(e),
            },
            RETRIEVE_MEMORIES_TOOL => match parse_retrieve_args(args) {
                Ok((query, kinds, limit)) => Ok(self.retrieve_memories(&query, kinds, limit).await),
                Err(e) => Err(e),
            },
            _ => Err("unknown tool".to_string()),
        };

        result.unwrap_or_else(|e| format!("Error executing tool '{}': {}", tool_name, e))
    }

    /// Tool descriptions for an LLM tool-binding layer
    pub fn tool_specs() -> Vec<Value> {
        let kind_enum: Vec<&str> = MemoryKind::ALL.iter().map(MemoryKind::as_tag).collect();
        vec![
            json!({
                "name": STORE_MEMORY_TOOL,
                "description": "Store a long-term memory. Use episodic for personal \
                    experiences and preferences of the user, semantic for general \
                    domain knowledge and facts.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "content": {
                            "type": "string",
                            "description": "The memory to store"
                        },
                        "memory_type": {
                            "type": "string",
                            "enum": kind_enum,
                            "description": "Kind of memory"
                        },
                        "metadata": {
                            "type": "object",
                            "description": "Optional additional metadata"
                        }
                    },
                    "required": ["content", "memory_type"]
                }
            }),
            json!({
                "name": RETRIEVE_MEMORIES_TOOL,
                "description": "Retrieve long-term memories relevant to a query.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "What to look for"
                        },
                        "memory_type": {
                            "type": "array",
                            "items": { "type": "string", "enum": kind_enum },
                            "description": "Kinds of memory to search"
                        },
                        "limit": {
                            "type": "integer",
                            "minimum": 1,
                            "description": "Maximum number of memories to return"
                        }
                    },
                    "required": ["query", "memory_type"]
                }
            }),
        ]
    }
}

fn string_arg(args: &Value, name: &str) -> Result<String, String> {
    args.get(name)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| format!("missing string argument `{}`", name))
}

fn parse_store_args(args: &Value) -> Result<(String, MemoryKind, Option<Value>), String> {
    let content = string_arg(args, "content")?;
    let kind = string_arg(args, "memory_type")?
        .parse::<MemoryKind>()
        .map_err(|e| e.to_string())?;
    let metadata = match args.get("metadata") {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => {
            Some(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone())))
        }
        Some(other) => Some(other.clone()),
    };
    Ok((content, kind, metadata))
}

fn parse_retrieve_args(args: &Value) -> Result<(String, KindFilter, Option<usize>), String> {
    let query = string_arg(args, "query")?;
    let kinds = match args.get("memory_type") {
        None | Some(Value::Null) => KindFilter::Any,
        Some(Value::String(tag)) => {
            KindFilter::One(tag.parse::<MemoryKind>().map_err(|e| e.to_string())?)
        }
        Some(Value::Array(tags)) => {
            let kinds = tags
                .iter()
                .map(|t| {
                    t.as_str()
                        .ok_or_else(|| "memory_type entries must be strings".to_string())
                        .and_then(|s| s.parse::<MemoryKind>().map_err(|e| e.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            KindFilter::from(kinds)
        }
        Some(_) => return Err("memory_type must be a string or a list".to_string()),
    };
    let limit = args
        .get("limit")
        .and_then(Value::as_u64)
        .map(|l| l as usize);
    Ok((query, kinds, limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_specs_name_both_tools() {
        let specs = MemoryTools::tool_specs();
        let names: Vec<&str> = specs.iter().filter_map(|s| s["name"].as_str()).collect();
        assert_eq!(names, vec![STORE_MEMORY_TOOL, RETRIEVE_MEMORIES_TOOL]);
        assert_eq!(
            specs[0]["parameters"]["properties"]["memory_type"]["enum"],
            json!(["episodic", "semantic"])
        );
    }

    #[test]
    fn test_parse_store_args() {
        let (content, kind, metadata) = parse_store_args(&json!({
            "content": "User prefers aisle seats",
            "memory_type": "episodic",
            "metadata": "{\"source\": \"chat\"}"
        }))
        .unwrap();
        assert_eq!(content, "User prefers aisle seats");
        assert_eq!(kind, MemoryKind::Episodic);
        assert_eq!(metadata, Some(json!({"source": "chat"})));

        assert!(parse_store_args(&json!({"content": "x", "memory_type": "procedural"})).is_err());
        assert!(parse_store_args(&json!({"memory_type": "episodic"})).is_err());
    }

    #[test]
    fn test_parse_retrieve_args() {
        let (query, kinds, limit) = parse_retrieve_args(&json!({
            "query": "seats",
            "memory_type": ["episodic", "semantic"],
            "limit": 3
        }))
        .unwrap();
        assert_eq!(query, "seats");
        assert!(kinds.allows(MemoryKind::Semantic));
        assert_eq!(limit, Some(3));

        let (_, kinds, limit) =
            parse_retrieve_args(&json!({"query": "visa", "memory_type": "semantic"})).unwrap();
        assert_eq!(kinds, KindFilter::One(MemoryKind::Semantic));
        assert_eq!(limit, None);
    }
}
