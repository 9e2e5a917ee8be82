//! # Mnemos Memory
//!
//! Long-term memory for conversational agents. Memories are short pieces of
//! text (a preference, a fact) embedded into vectors and kept in a vector
//! index. Writes are suppressed when a near-identical memory already exists
//! in the same scope; reads are filtered nearest-neighbour searches.
//!
//! ## Memory Kinds
//!
//! - **Episodic**: user-specific experiences and preferences
//! - **Semantic**: general domain facts, usually owned by `system`
//!
//! ## Scope
//!
//! Every memory belongs to an owner and optionally a conversation thread.
//! Duplicate checks and queries never cross owners.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mnemos_memory::{
//!     HashEmbeddingProvider, InMemoryVectorIndex, LongTermMemory, MemoryConfig, MemoryKind,
//!     MemoryQuery, NewMemory,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let memory = LongTermMemory::new(
//!     Arc::new(InMemoryVectorIndex::new()),
//!     Arc::new(HashEmbeddingProvider::new(256)),
//!     MemoryConfig::default().with_dimensions(256),
//! );
//! memory.ensure_index().await;
//!
//! memory
//!     .store(NewMemory::episodic("User prefers aisle seats").with_owner("u1"))
//!     .await?;
//!
//! let found = memory
//!     .retrieve(
//!         &MemoryQuery::new("aisle seats")
//!             .with_owner("u1")
//!             .with_kind(MemoryKind::Episodic)
//!             .with_threshold(0.5),
//!     )
//!     .await?;
//! assert_eq!(found.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
mod dedup;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod index;
pub mod record;
mod retriever;
pub mod settings;
mod store;
pub mod tools;
mod writer;

pub use config::{MemoryConfig, SYSTEM_USER_ID};
pub use embedding::{Embedding, EmbeddingProvider, HashEmbeddingProvider, SearchResult};
pub use error::{MnemosError, MnemosResult};
pub use filter::{KindFilter, TagFilter};
pub use index::{IndexHit, IndexSchema, InMemoryVectorIndex, RangeQuery, VectorIndex};
pub use record::{MemoryKind, MemoryRecord, NewMemory};
pub use retriever::MemoryQuery;
pub use settings::{EmbeddingSettings, MemorySettings};
pub use store::{LongTermMemory, StoreOutcome};
pub use tools::{MemoryScope, MemoryTools};

#[cfg(feature = "vertex")]
pub use embedding::{VertexEmbeddingConfig, VertexEmbeddingProvider};

#[cfg(feature = "redis-store")]
pub use index::RedisVectorIndex;
