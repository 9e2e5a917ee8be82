//! # Redis + Vertex AI Memory Demo
//!
//! Stores and recalls memories against a Redis Stack server using Vertex AI
//! `text-embedding-004` embeddings.
//!
//! ## Run This Example
//!
//! ```bash
//! export GOOGLE_CLOUD_PROJECT=my-project
//! export GOOGLE_ACCESS_TOKEN=$(gcloud auth print-access-token)
//! export REDIS_URL=redis://localhost:6379
//! cargo run -p mnemos-demos --bin redis_memory
//! ```

#[cfg(all(feature = "redis-store", feature = "vertex"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use mnemos::prelude::*;
    use std::sync::Arc;
    use tracing::info;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = MemorySettings::from_env()?;
    let embedder = VertexEmbeddingProvider::new(VertexEmbeddingConfig::from_settings(
        &settings.embedding,
    )?);
    let index = RedisVectorIndex::connect(&settings.redis_url, &settings.index_name).await?;

    let memory = Arc::new(LongTermMemory::new(
        Arc::new(index),
        Arc::new(embedder),
        MemoryConfig::from(&settings),
    ));
    memory.ensure_index().await;

    let user_id = std::env::args().nth(1).unwrap_or_else(|| "demo_user".to_string());
    let tools = MemoryTools::new(memory.clone(), MemoryScope::new(user_id.as_str()));
    info!(user_id = %user_id, "Memory tools ready");

    println!(
        "{}",
        tools
            .store_memory("User prefers aisle seats", MemoryKind::Episodic, None)
            .await
    );
    println!(
        "{}",
        tools
            .retrieve_memories("seat preference", MemoryKind::Episodic, None)
            .await
    );

    Ok(())
}

#[cfg(not(all(feature = "redis-store", feature = "vertex")))]
fn main() {
    eprintln!("redis_memory needs the `redis-store` and `vertex` features");
}
