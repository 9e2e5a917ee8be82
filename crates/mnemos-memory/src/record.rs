//! Long-term memory records
//!
//! A [`MemoryRecord`] is written once by the writer and never mutated. At the
//! index boundary it becomes a flat JSON document whose field names are listed
//! in [`fields`]; [`MemoryRecord::from_hit`] is the only way back.

use crate::error::{MnemosError, MnemosResult};
use crate::index::IndexHit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Field names of a stored memory document
pub mod fields {
    /// Free-text content (text field)
    pub const CONTENT: &str = "content";
    /// Memory kind tag
    pub const MEMORY_TYPE: &str = "memory_type";
    /// Serialized metadata (text field)
    pub const METADATA: &str = "metadata";
    /// RFC 3339 creation timestamp (text field)
    pub const CREATED_AT: &str = "created_at";
    /// Owner tag
    pub const USER_ID: &str = "user_id";
    /// Record id tag
    pub const MEMORY_ID: &str = "memory_id";
    /// Conversation thread tag
    pub const THREAD_ID: &str = "thread_id";
    /// Vector field
    pub const EMBEDDING: &str = "embedding";

    /// Fields requested back from a retrieval query
    pub const RETURNED: [&str; 8] = [
        CONTENT,
        MEMORY_TYPE,
        METADATA,
        CREATED_AT,
        MEMORY_ID,
        THREAD_ID,
        USER_ID,
        EMBEDDING,
    ];
}

/// The kind of a long-term memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    /// User-specific experience or preference ("User prefers aisle seats")
    Episodic,

    /// General domain fact ("Tokyo has excellent public transit")
    Semantic,
}

impl MemoryKind {
    /// Both kinds, in tag order
    pub const ALL: [MemoryKind; 2] = [MemoryKind::Episodic, MemoryKind::Semantic];

    /// Tag persisted in the index
    pub fn as_tag(&self) -> &'static str {
        match self {
            MemoryKind::Episodic => "episodic",
            MemoryKind::Semantic => "semantic",
        }
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for MemoryKind {
    type Err = MnemosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "episodic" => Ok(MemoryKind::Episodic),
            "semantic" => Ok(MemoryKind::Semantic),
            other => Err(MnemosError::parse(
                fields::MEMORY_TYPE,
                format!("unknown memory kind `{}`", other),
            )),
        }
    }
}

/// A persisted long-term memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique, creation-ordered identifier
    pub record_id: Ulid,

    /// The fact or preference being remembered
    pub content: String,

    /// Episodic or semantic
    pub kind: MemoryKind,

    /// Opaque caller metadata (defaults to `{}`)
    pub metadata: serde_json::Value,

    /// User or tenant the memory belongs to
    pub owner_id: String,

    /// Conversation the memory is scoped to, if any
    pub thread_id: Option<String>,

    /// When the record was written
    pub created_at: DateTime<Utc>,

    /// Embedding of `content` taken at write time
    pub embedding: Vec<f32>,
}

impl MemoryRecord {
    /// Index key for this record under `prefix`
    pub fn index_key(&self, prefix: &str) -> String {
        format!("{}:{}", prefix, self.record_id)
    }

    /// Flatten into the stored document format
    pub fn to_document(&self) -> serde_json::Value {
        let mut doc = serde_json::Map::new();
        doc.insert(fields::CONTENT.into(), self.content.clone().into());
        doc.insert(fields::MEMORY_TYPE.into(), self.kind.as_tag().into());
        doc.insert(fields::METADATA.into(), self.metadata.to_string().into());
        doc.insert(fields::CREATED_AT.into(), self.created_at.to_rfc3339().into());
        doc.insert(fields::USER_ID.into(), self.owner_id.clone().into());
        doc.insert(fields::MEMORY_ID.into(), self.record_id.to_string().into());
        if let Some(thread_id) = &self.thread_id {
            doc.insert(fields::THREAD_ID.into(), thread_id.clone().into());
        }
        doc.insert(fields::EMBEDDING.into(), serde_json::json!(self.embedding));
        serde_json::Value::Object(doc)
    }

    /// Rebuild a record from the raw fields returned by a vector query
    ///
    /// Every required field is checked; nothing is assumed present.
    pub fn from_hit(hit: &IndexHit) -> MnemosResult<Self> {
        let record_id = Ulid::from_string(required(hit, fields::MEMORY_ID)?)
            .map_err(|e| MnemosError::parse(fields::MEMORY_ID, e))?;
        let owner_id = required(hit, fields::USER_ID)?.to_string();
        let kind = required(hit, fields::MEMORY_TYPE)?.parse::<MemoryKind>()?;
        let content = required(hit, fields::CONTENT)?.to_string();

        let created_at = DateTime::parse_from_rfc3339(required(hit, fields::CREATED_AT)?)
            .map_err(|e| MnemosError::parse(fields::CREATED_AT, e))?
            .with_timezone(&Utc);

        let embedding: Vec<f32> = serde_json::from_str(required(hit, fields::EMBEDDING)?)
            .map_err(|e| MnemosError::parse(fields::EMBEDDING, e))?;

        let metadata = match hit.field(fields::METADATA) {
            None => serde_json::json!({}),
            Some(raw) if raw.trim().is_empty() => serde_json::json!({}),
            Some(raw) => serde_json::from_str(raw)
                .unwrap_or_else(|_| serde_json::Value::String(raw.to_string())),
        };

        let thread_id = hit
            .field(fields::THREAD_ID)
            .filter(|t| !t.is_empty())
            .map(String::from);

        Ok(Self {
            record_id,
            content,
            kind,
            metadata,
            owner_id,
            thread_id,
            created_at,
            embedding,
        })
    }
}

fn required<'a>(hit: &'a IndexHit, field: &str) -> MnemosResult<&'a str> {
    hit.field(field)
        .ok_or_else(|| MnemosError::parse(field, "missing from stored document"))
}

/// A memory waiting to be written
#[derive(Debug, Clone, PartialEq)]
pub struct NewMemory {
    /// Content to remember
    pub content: String,

    /// Episodic or semantic
    pub kind: MemoryKind,

    /// Owner; the configured default owner when `None`
    pub owner_id: Option<String>,

    /// Optional conversation scope
    pub thread_id: Option<String>,

    /// Optional metadata; `{}` when `None`
    pub metadata: Option<serde_json::Value>,
}

impl NewMemory {
    /// Create a new memory of the given kind
    pub fn new(content: impl Into<String>, kind: MemoryKind) -> Self {
        Self {
            content: content.into(),
            kind,
            owner_id: None,
            thread_id: None,
            metadata: None,
        }
    }

    /// Create a new episodic memory
    pub fn episodic(content: impl Into<String>) -> Self {
        Self::new(content, MemoryKind::Episodic)
    }

    /// Create a new semantic memory
    pub fn semantic(content: impl Into<String>) -> Self {
        Self::new(content, MemoryKind::Semantic)
    }

    /// Set the owner
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    /// Scope to a conversation thread
    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    /// Attach metadata
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_record() -> MemoryRecord {
        MemoryRecord {
            record_id: Ulid::new(),
            content: "User prefers aisle seats".to_string(),
            kind: MemoryKind::Episodic,
            metadata: serde_json::json!({"source": "chat"}),
            owner_id: "u1".to_string(),
            thread_id: Some("trip-42".to_string()),
            created_at: Utc::now(),
            embedding: vec![0.25, -0.5, 1.0],
        }
    }

    /// Mimic what a text-oriented store hands back: every field as a string
    fn hit_from_document(doc: &serde_json::Value) -> IndexHit {
        let fields = doc
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| {
                let raw = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), raw)
            })
            .collect::<HashMap<_, _>>();
        IndexHit::new("memory:test", 0.0, fields)
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(MemoryKind::Episodic.as_tag(), "episodic");
        assert_eq!("SEMANTIC".parse::<MemoryKind>().unwrap(), MemoryKind::Semantic);
        assert!("procedural".parse::<MemoryKind>().is_err());
        assert_eq!(
            serde_json::to_string(&MemoryKind::Episodic).unwrap(),
            "\"episodic\""
        );
    }

    #[test]
    fn test_record_survives_document_boundary() {
        let record = sample_record();
        let doc = record.to_document();

        assert_eq!(doc["memory_type"], "episodic");
        assert_eq!(doc["metadata"], "{\"source\":\"chat\"}");

        let parsed = MemoryRecord::from_hit(&hit_from_document(&doc)).unwrap();
        assert_eq!(parsed.record_id, record.record_id);
        assert_eq!(parsed.content, record.content);
        assert_eq!(parsed.thread_id.as_deref(), Some("trip-42"));
        assert_eq!(parsed.metadata, record.metadata);
        assert_eq!(parsed.embedding, record.embedding);
        assert_eq!(parsed.created_at, record.created_at);
    }

    #[test]
    fn test_thread_is_omitted_when_absent() {
        let mut record = sample_record();
        record.thread_id = None;
        let doc = record.to_document();
        assert!(doc.get("thread_id").is_none());

        let parsed = MemoryRecord::from_hit(&hit_from_document(&doc)).unwrap();
        assert_eq!(parsed.thread_id, None);
    }

    #[test]
    fn test_missing_field_is_a_parse_error() {
        let mut doc = sample_record().to_document();
        doc.as_object_mut().unwrap().remove("user_id");

        let err = MemoryRecord::from_hit(&hit_from_document(&doc)).unwrap_err();
        assert!(matches!(err, MnemosError::Parse { ref field, .. } if field == "user_id"));
    }

    #[test]
    fn test_bad_kind_and_bad_id_are_parse_errors() {
        let mut doc = sample_record().to_document();
        doc["memory_type"] = "procedural".into();
        assert!(MemoryRecord::from_hit(&hit_from_document(&doc)).is_err());

        let mut doc = sample_record().to_document();
        doc["memory_id"] = "not-a-ulid".into();
        assert!(MemoryRecord::from_hit(&hit_from_document(&doc)).is_err());
    }

    #[test]
    fn test_non_json_metadata_is_kept_verbatim() {
        let mut doc = sample_record().to_document();
        doc["metadata"] = "free text note".into();

        let parsed = MemoryRecord::from_hit(&hit_from_document(&doc)).unwrap();
        assert_eq!(parsed.metadata, serde_json::json!("free text note"));
    }

    #[test]
    fn test_new_memory_builder() {
        let memory = NewMemory::semantic("Tokyo requires no visa for US citizens")
            .with_owner("system")
            .with_metadata(serde_json::json!({"country": "JP"}));

        assert_eq!(memory.kind, MemoryKind::Semantic);
        assert_eq!(memory.owner_id.as_deref(), Some("system"));
        assert_eq!(memory.thread_id, None);
    }
}
