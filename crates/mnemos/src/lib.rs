//! # Mnemos - Long-Term Memory for Rust Agents
//!
//! **Mnemos** gives conversational agents a memory that outlives the
//! conversation:
//!
//! - **Episodic memories**: what a particular user prefers or experienced
//! - **Semantic memories**: general facts the agent has learned
//! - **Deduplication**: near-identical memories are written once
//! - **Scoped recall**: similarity search filtered by owner, kind and thread
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mnemos::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let memory = Arc::new(LongTermMemory::new(
//!         Arc::new(InMemoryVectorIndex::new()),
//!         Arc::new(HashEmbeddingProvider::new(256)),
//!         MemoryConfig::default().with_dimensions(256),
//!     ));
//!     memory.ensure_index().await;
//!
//!     let tools = MemoryTools::new(memory, MemoryScope::new("demo_user"));
//!     println!("{}", tools.store_memory("User prefers aisle seats", MemoryKind::Episodic, None).await);
//!     println!("{}", tools.retrieve_memories("aisle seats", MemoryKind::Episodic, None).await);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Backends
//!
//! Enable the Redis Stack index and the Vertex AI embedding client with the
//! `full` feature:
//!
//! ```toml
//! [dependencies]
//! mnemos = { version = "0.1", features = ["full"] }
//! ```

#![doc(html_root_url = "https://docs.rs/mnemos/0.1.0")]
#![warn(missing_docs)]

#[cfg(feature = "memory")]
pub use mnemos_memory as memory;

/// Commonly used types and traits
pub mod prelude {
    #[cfg(feature = "memory")]
    pub use crate::memory::{
        EmbeddingProvider, HashEmbeddingProvider, InMemoryVectorIndex, KindFilter, LongTermMemory,
        MemoryConfig, MemoryKind, MemoryQuery, MemoryRecord, MemoryScope, MemorySettings,
        MemoryTools, MnemosError, MnemosResult, NewMemory, StoreOutcome, VectorIndex,
    };

    #[cfg(feature = "redis-store")]
    pub use crate::memory::RedisVectorIndex;

    #[cfg(feature = "vertex")]
    pub use crate::memory::{VertexEmbeddingConfig, VertexEmbeddingProvider};
}
