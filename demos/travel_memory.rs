//! # Travel Agent Memory Demo
//!
//! Walks through the long-term memory flow of a travel assistant without any
//! external services: an in-memory index and hash embeddings stand in for
//! Redis and Vertex AI.
//!
//! ## Run This Example
//!
//! ```bash
//! RUST_LOG=info cargo run -p mnemos-demos --bin travel_memory
//! ```

use mnemos::prelude::*;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DIMENSIONS: usize = 384;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("=== Travel Agent Memory Demo ===");

    let memory = Arc::new(LongTermMemory::new(
        Arc::new(InMemoryVectorIndex::new()),
        Arc::new(HashEmbeddingProvider::new(DIMENSIONS)),
        MemoryConfig::default()
            .with_dimensions(DIMENSIONS)
            .with_retrieval_threshold(0.6),
    ));
    memory.ensure_index().await;

    // Domain knowledge owned by the system user
    let facts = vec![
        NewMemory::semantic("US citizens can visit Tokyo without a visa for up to 90 days")
            .with_metadata(json!({"source": "travel-guide"})),
        NewMemory::semantic("Tokyo has excellent public transit"),
        NewMemory::semantic("Tokyo has excellent public transit"),
    ];
    for outcome in memory.store_all(facts).await {
        info!(?outcome, "Seeded fact");
    }

    // The agent's view of one user in one conversation
    let tools = MemoryTools::new(
        memory.clone(),
        MemoryScope::new("demo_user").with_thread("book_flight"),
    );

    println!(
        "{}",
        tools
            .store_memory("User prefers aisle seats", MemoryKind::Episodic, None)
            .await
    );
    println!(
        "{}",
        tools
            .invoke(
                "store_memory",
                &json!({"content": "User prefers aisle seats", "memory_type": "episodic"}),
            )
            .await
    );
    println!(
        "{}",
        tools
            .retrieve_memories("which seats does the user prefer", MemoryKind::Episodic, Some(3))
            .await
    );

    let visa = memory
        .retrieve_scored(
            &MemoryQuery::new("visa for Tokyo")
                .with_kind(MemoryKind::Semantic)
                .with_limit(2),
        )
        .await?;
    for result in visa {
        info!(
            distance = ?result.distance,
            content = %result.item.content,
            "Semantic recall"
        );
    }

    println!("{}", serde_json::to_string_pretty(&MemoryTools::tool_specs())?);
    Ok(())
}
