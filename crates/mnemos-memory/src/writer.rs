//! Memory writes with duplicate suppression

use crate::dedup::{validate_text, validate_threshold};
use crate::error::{MnemosError, MnemosResult};
use crate::record::{MemoryRecord, NewMemory};
use crate::store::{excerpt, LongTermMemory, StoreOutcome};
use chrono::Utc;
use tracing::{error, info, warn};

impl LongTermMemory {
    /// Store a memory unless a similar one already exists
    ///
    /// Invalid input and embedding or duplicate-check failures are returned
    /// as errors. A failed insert is reported as [`StoreOutcome::Failed`].
    pub async fn store(&self, memory: NewMemory) -> MnemosResult<StoreOutcome> {
        validate_text("content", &memory.content)?;
        validate_threshold(self.config.dedup_threshold)?;

        let NewMemory {
            content,
            kind,
            owner_id,
            thread_id,
            metadata,
        } = memory;
        let owner_id = self.resolve_owner(owner_id.as_deref()).to_string();
        let thread_id = Self::resolve_thread(thread_id.as_deref()).map(str::to_string);

        let embedding = self.embed_vector(&content).await?;
        if embedding.len() != self.config.dimensions {
            return Err(MnemosError::validation(
                "embedding",
                format!("must have {} dimensions", self.config.dimensions),
                embedding.len(),
            ));
        }

        let duplicate = self
            .similar_in_scope(
                embedding.clone(),
                &content,
                kind,
                &owner_id,
                thread_id.as_deref(),
                self.config.dedup_threshold,
            )
            .await?;
        if duplicate {
            info!(
                owner_id = %owner_id,
                kind = %kind,
                content = %excerpt(&content),
                "Similar memory already exists, skipping"
            );
            return Ok(StoreOutcome::Skipped);
        }

        let record = MemoryRecord {
            record_id: self.next_id(),
            content,
            kind,
            metadata: metadata.unwrap_or_else(|| serde_json::json!({})),
            owner_id,
            thread_id,
            created_at: Utc::now(),
            embedding,
        };

        let key = record.index_key(&self.config.key_prefix);
        if let Err(e) = self.index.insert(&key, record.to_document()).await {
            error!(
                key = %key,
                owner_id = %record.owner_id,
                error = %e,
                "Error storing memory"
            );
            return Ok(StoreOutcome::Failed {
                reason: e.to_string(),
            });
        }

        info!(
            key = %key,
            owner_id = %record.owner_id,
            kind = %record.kind,
            content = %excerpt(&record.content),
            "Stored memory"
        );
        Ok(StoreOutcome::Stored(record))
    }

    /// Store a batch of memories one after another
    ///
    /// Returns one outcome per input, in order. An error on one item is
    /// recorded as [`StoreOutcome::Failed`] and the rest still run.
    pub async fn store_all(&self, memories: Vec<NewMemory>) -> Vec<StoreOutcome> {
        let mut outcomes = Vec::with_capacity(memories.len());
        for memory in memories {
            let outcome = match self.store(memory).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "Memory in batch was not stored");
                    StoreOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let stored = outcomes.iter().filter(|o| o.is_stored()).count();
        info!(total = outcomes.len(), stored, "Stored memory batch");
        outcomes
    }
}
