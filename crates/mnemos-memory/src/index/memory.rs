//! In-process vector index

use super::{IndexHit, IndexSchema, RangeQuery, VectorIndex};
use crate::embedding::cosine_distance;
use crate::error::{MnemosError, MnemosResult};
use crate::record::fields;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Brute-force vector index held in memory
///
/// Behaves like the Redis backend at the trait boundary: documents are JSON,
/// hits come back as string fields, the filter is applied before ranking and
/// overwriting the schema keeps existing documents.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    schema: RwLock<Option<IndexSchema>>,
    documents: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl InMemoryVectorIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Whether no documents are stored
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Fetch a stored document by key
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.documents.read().get(key).cloned()
    }

    /// Current schema, if created
    pub fn schema(&self) -> Option<IndexSchema> {
        self.schema.read().clone()
    }

    fn vector_field(&self) -> &'static str {
        self.schema
            .read()
            .as_ref()
            .and_then(IndexSchema::vector_field)
            .unwrap_or(fields::EMBEDDING)
    }
}

fn read_vector(value: &serde_json::Value) -> Option<Vec<f32>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}

fn as_field_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait::async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn create(&self, schema: &IndexSchema, overwrite: bool) -> MnemosResult<()> {
        let mut current = self.schema.write();
        if current.is_some() && !overwrite {
            info!(index = %schema.name, "Index already exists, not overwriting");
            return Ok(());
        }
        *current = Some(schema.clone());
        info!(index = %schema.name, "Created in-memory vector index");
        Ok(())
    }

    async fn insert(&self, key: &str, document: serde_json::Value) -> MnemosResult<()> {
        if !document.is_object() {
            return Err(MnemosError::store_message(
                "insert",
                "document must be a JSON object",
            ));
        }

        let expected = self.schema.read().as_ref().and_then(IndexSchema::dimensions);
        if let Some(expected) = expected {
            let actual = document
                .get(self.vector_field())
                .and_then(read_vector)
                .map(|v| v.len());
            if actual != Some(expected) {
                return Err(MnemosError::validation(
                    "embedding",
                    format!("must have {} dimensions", expected),
                    actual.map(|n| n.to_string()).unwrap_or_else(|| "none".into()),
                ));
            }
        }

        self.documents.write().insert(key.to_string(), document);
        debug!(key = %key, "Inserted document");
        Ok(())
    }

    async fn range_query(&self, query: &RangeQuery) -> MnemosResult<Vec<IndexHit>> {
        let vector_field = self.vector_field();
        let documents = self.documents.read();

        let mut scored: Vec<(f32, &String, &serde_json::Value)> = Vec::new();
        for (key, document) in documents.iter() {
            if !query.filter.matches(document) {
                continue;
            }
            let Some(vector) = document.get(vector_field).and_then(read_vector) else {
                debug!(key = %key, "Skipping document without a readable vector");
                continue;
            };
            let Ok(distance) = cosine_distance(&query.vector, &vector) else {
                debug!(key = %key, "Skipping document with mismatched dimensions");
                continue;
            };
            if distance <= query.distance_threshold {
                scored.push((distance, key, document));
            }
        }

        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        scored.truncate(query.num_results);

        let hits = scored
            .into_iter()
            .map(|(distance, key, document)| {
                let fields: HashMap<String, String> = query
                    .return_fields
                    .iter()
                    .filter_map(|name| {
                        document
                            .get(*name)
                            .map(|v| (name.to_string(), as_field_string(v)))
                    })
                    .collect();
                IndexHit::new(key.clone(), distance, fields)
            })
            .collect();

        Ok(hits)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{KindFilter, TagFilter};
    use serde_json::json;

    fn doc(owner: &str, kind: &str, vector: &[f32]) -> serde_json::Value {
        json!({
            "user_id": owner,
            "memory_type": kind,
            "content": format!("{} {}", owner, kind),
            "embedding": vector,
        })
    }

    async fn seeded() -> InMemoryVectorIndex {
        let index = InMemoryVectorIndex::new();
        index
            .create(&IndexSchema::memories("test", "memory", 2), true)
            .await
            .unwrap();
        index.insert("memory:a", doc("u1", "episodic", &[1.0, 0.0])).await.unwrap();
        index.insert("memory:b", doc("u1", "semantic", &[0.9, 0.1])).await.unwrap();
        index.insert("memory:c", doc("u1", "episodic", &[0.0, 1.0])).await.unwrap();
        index.insert("memory:d", doc("u2", "episodic", &[1.0, 0.0])).await.unwrap();
        index
    }

    #[tokio::test]
    async fn test_range_query_filters_and_orders() {
        let index = seeded().await;
        let query = RangeQuery::new(
            vec![1.0, 0.0],
            TagFilter::scope("u1", &KindFilter::Any, None),
            0.5,
        );

        let hits = index.range_query(&query).await.unwrap();
        let keys: Vec<&str> = hits.iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys, vec!["memory:a", "memory:b"]);
        assert!(hits[0].distance <= hits[1].distance);
        assert_eq!(hits[0].field("user_id"), Some("u1"));
        assert_eq!(hits[0].field("embedding"), Some("[1.0,0.0]"));
    }

    #[tokio::test]
    async fn test_range_query_respects_limit_and_threshold() {
        let index = seeded().await;
        let filter = TagFilter::scope("u1", &KindFilter::Any, None);

        let hits = index
            .range_query(&RangeQuery::new(vec![1.0, 0.0], filter.clone(), 2.0).with_limit(1))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let hits = index
            .range_query(&RangeQuery::new(vec![1.0, 0.0], filter, 0.0))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "memory:a");
    }

    #[tokio::test]
    async fn test_insert_rejects_wrong_dimensions() {
        let index = seeded().await;
        let result = index
            .insert("memory:e", doc("u1", "episodic", &[1.0, 0.0, 0.0]))
            .await;
        assert!(result.is_err());
        assert_eq!(index.len(), 4);
    }

    #[tokio::test]
    async fn test_overwrite_keeps_documents() {
        let index = seeded().await;
        index
            .create(&IndexSchema::memories("test", "memory", 2), true)
            .await
            .unwrap();
        assert_eq!(index.len(), 4);
    }
}
