//! Shared fixtures for the integration tests

#![allow(dead_code)]

use mnemos_memory::{
    Embedding, EmbeddingProvider, IndexHit, IndexSchema, InMemoryVectorIndex, LongTermMemory,
    MemoryConfig, MnemosError, MnemosResult, RangeQuery, TagFilter, VectorIndex,
};
use mnemos_memory::filter::TagField;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub const DIMS: usize = 4;

pub const AISLE: &str = "User prefers aisle seats";
pub const AISLE_PARAPHRASE: &str = "The user likes sitting in the aisle";
pub const SEAT_QUERY: &str = "seat preference";
pub const WINDOW: &str = "User enjoys window views";
pub const VISA_FACT: &str = "US citizens can visit Tokyo without a visa for up to 90 days";
pub const VISA_QUESTION: &str = "Do I need a visa for Tokyo?";
pub const TRANSIT_FACT: &str = "Tokyo has excellent public transit";

/// Embedder with hand-placed vectors, so distances are known exactly
pub struct FixtureEmbedder {
    vectors: HashMap<&'static str, Vec<f32>>,
    calls: AtomicUsize,
}

impl FixtureEmbedder {
    pub fn new() -> Self {
        let vectors = HashMap::from([
            (AISLE, vec![1.0, 0.0, 0.0, 0.0]),
            (AISLE_PARAPHRASE, vec![0.99, 0.05, 0.0, 0.0]),
            (SEAT_QUERY, vec![0.95, 0.2, 0.0, 0.0]),
            (WINDOW, vec![0.6, 0.8, 0.0, 0.0]),
            (VISA_FACT, vec![0.0, 0.0, 1.0, 0.0]),
            (VISA_QUESTION, vec![0.0, 0.0, 0.97, 0.1]),
            (TRANSIT_FACT, vec![0.0, 0.0, 0.6, 0.8]),
        ]);
        Self {
            vectors,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FixtureEmbedder {
    async fn embed(&self, text: &str) -> MnemosResult<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vectors
            .get(text)
            .map(|v| Embedding::new(v.clone(), "fixture"))
            .ok_or_else(|| MnemosError::embedding("embed", format!("no fixture for `{}`", text)))
    }

    fn model_name(&self) -> &str {
        "fixture"
    }

    fn dimensions(&self) -> usize {
        DIMS
    }
}

/// In-memory index whose operations can be made to fail
#[derive(Default)]
pub struct FlakyIndex {
    pub inner: InMemoryVectorIndex,
    pub fail_create: AtomicBool,
    pub fail_insert: AtomicBool,
    pub fail_query: AtomicBool,
}

impl FlakyIndex {
    fn check(flag: &AtomicBool, operation: &str) -> MnemosResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(MnemosError::store_message(operation, "connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl VectorIndex for FlakyIndex {
    async fn create(&self, schema: &IndexSchema, overwrite: bool) -> MnemosResult<()> {
        Self::check(&self.fail_create, "create_index")?;
        self.inner.create(schema, overwrite).await
    }

    async fn insert(&self, key: &str, document: serde_json::Value) -> MnemosResult<()> {
        Self::check(&self.fail_insert, "insert")?;
        self.inner.insert(key, document).await
    }

    async fn range_query(&self, query: &RangeQuery) -> MnemosResult<Vec<IndexHit>> {
        Self::check(&self.fail_query, "range_query")?;
        self.inner.range_query(query).await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Index that matches owner and thread tags case-insensitively, the way
/// RediSearch treats TAG fields declared without `CASESENSITIVE`
///
/// Hits still carry the values as stored.
#[derive(Default)]
pub struct CaseFoldingIndex {
    pub inner: InMemoryVectorIndex,
    stored: Mutex<HashMap<String, serde_json::Value>>,
}

impl CaseFoldingIndex {
    const FOLDED: [&'static str; 2] = ["user_id", "thread_id"];

    fn folds(field: TagField) -> bool {
        matches!(field, TagField::UserId | TagField::ThreadId)
    }
}

#[async_trait::async_trait]
impl VectorIndex for CaseFoldingIndex {
    async fn create(&self, schema: &IndexSchema, overwrite: bool) -> MnemosResult<()> {
        self.inner.create(schema, overwrite).await
    }

    async fn insert(&self, key: &str, document: serde_json::Value) -> MnemosResult<()> {
        let mut folded = document.clone();
        for field in Self::FOLDED {
            if let Some(value) = folded.get_mut(field) {
                if let Some(s) = value.as_str() {
                    *value = serde_json::Value::String(s.to_lowercase());
                }
            }
        }
        self.stored.lock().insert(key.to_string(), document);
        self.inner.insert(key, folded).await
    }

    async fn range_query(&self, query: &RangeQuery) -> MnemosResult<Vec<IndexHit>> {
        let filter = query
            .filter
            .predicates()
            .iter()
            .fold(TagFilter::new(), |filter, predicate| {
                let values = predicate.values.iter().map(|v| {
                    if Self::folds(predicate.field) {
                        v.to_lowercase()
                    } else {
                        v.clone()
                    }
                });
                filter.any_of(predicate.field, values)
            });
        let mut folded_query = query.clone();
        folded_query.filter = filter;

        let mut hits = self.inner.range_query(&folded_query).await?;
        let stored = self.stored.lock();
        for hit in &mut hits {
            let Some(original) = stored.get(&hit.key) else {
                continue;
            };
            for field in Self::FOLDED {
                let value = original.get(field).and_then(serde_json::Value::as_str);
                if let (Some(value), Some(slot)) = (value, hit.fields.get_mut(field)) {
                    *slot = value.to_string();
                }
            }
        }
        Ok(hits)
    }

    fn name(&self) -> &str {
        "case-folding"
    }
}

/// Route test logs through the test harness; `RUST_LOG` picks the level
pub fn init_tracing() {
    // Already installed by an earlier test in this binary
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_test_writer()
        .try_init();
}

pub struct Harness {
    pub memory: Arc<LongTermMemory>,
    pub index: Arc<FlakyIndex>,
    pub embedder: Arc<FixtureEmbedder>,
}

pub async fn harness() -> Harness {
    init_tracing();
    let index = Arc::new(FlakyIndex::default());
    let embedder = Arc::new(FixtureEmbedder::new());
    let memory = Arc::new(LongTermMemory::new(
        index.clone(),
        embedder.clone(),
        MemoryConfig::default().with_dimensions(DIMS),
    ));
    memory.ensure_index().await;

    Harness {
        memory,
        index,
        embedder,
    }
}
