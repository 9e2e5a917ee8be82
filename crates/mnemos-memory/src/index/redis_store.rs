//! RediSearch-backed vector index (Redis Stack, JSON documents)

use super::{FieldKind, IndexHit, IndexSchema, RangeQuery, VectorIndex};
use crate::error::{MnemosError, MnemosResult};
use crate::filter::TagFilter;
use crate::record::fields;
use redis::aio::ConnectionManager;
use redis::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Name under which the query distance is yielded
const DISTANCE_FIELD: &str = "vector_distance";

/// Tag separator; a control character so owner and thread ids are never split
const TAG_SEPARATOR: &str = "\u{1f}";

/// Vector index stored in Redis and searched with `FT.SEARCH`
pub struct RedisVectorIndex {
    connection: ConnectionManager,
    index_name: String,
}

impl RedisVectorIndex {
    /// Connect to Redis and verify the server answers
    pub async fn connect(redis_url: &str, index_name: impl Into<String>) -> MnemosResult<Self> {
        let client =
            redis::Client::open(redis_url).map_err(|e| MnemosError::store("connect", e))?;
        let mut connection = ConnectionManager::new(client)
            .await
            .map_err(|e| MnemosError::store("connect", e))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut connection)
            .await
            .map_err(|e| MnemosError::store("ping", e))?;

        let index_name = index_name.into();
        info!(index = %index_name, "Connected to Redis vector store");

        Ok(Self {
            connection,
            index_name,
        })
    }

    /// Index queried by this backend
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    async fn index_exists(&self, name: &str) -> bool {
        let mut connection = self.connection.clone();
        redis::cmd("FT.INFO")
            .arg(name)
            .query_async::<_, Value>(&mut connection)
            .await
            .is_ok()
    }
}

/// `FT.CREATE` arguments for a schema over JSON documents
fn create_args(schema: &IndexSchema) -> Vec<String> {
    let mut args = vec![
        schema.name.clone(),
        "ON".into(),
        "JSON".into(),
        "PREFIX".into(),
        "1".into(),
        format!("{}:", schema.prefix),
        "SCHEMA".into(),
    ];

    for field in &schema.fields {
        args.push(format!("$.{}", field.name));
        args.push("AS".into());
        args.push(field.name.to_string());
        match field.kind {
            FieldKind::Text => args.push("TEXT".into()),
            FieldKind::Tag => args.extend([
                "TAG".into(),
                "SEPARATOR".into(),
                TAG_SEPARATOR.to_string(),
                "CASESENSITIVE".into(),
            ]),
            FieldKind::Vector { dimensions } => args.extend([
                "VECTOR".into(),
                "FLAT".into(),
                "6".into(),
                "TYPE".into(),
                "FLOAT32".into(),
                "DIM".into(),
                dimensions.to_string(),
                "DISTANCE_METRIC".into(),
                "COSINE".into(),
            ]),
        }
    }

    args
}

/// Query string for a filtered vector range search
fn range_query_string(filter: &TagFilter, vector_field: &str) -> String {
    let range = format!(
        "@{}:[VECTOR_RANGE $radius $vector]=>{{$YIELD_DISTANCE_AS: {}}}",
        vector_field, DISTANCE_FIELD
    );
    if filter.is_empty() {
        range
    } else {
        format!("({} {})", range, filter.to_query_string())
    }
}

/// Vector as little-endian float32 bytes
fn vector_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Data(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::Status(s) => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        Value::Okay => Some("OK".to_string()),
        Value::Nil | Value::Bulk(_) => None,
    }
}

/// Parse an `FT.SEARCH` reply: `[total, key, [field, value, ...], ...]`
fn parse_search_reply(reply: &Value) -> MnemosResult<Vec<IndexHit>> {
    let Value::Bulk(items) = reply else {
        return Err(MnemosError::store_message(
            "range_query",
            "unexpected FT.SEARCH reply shape",
        ));
    };

    let mut hits = Vec::new();
    for pair in items.get(1..).unwrap_or_default().chunks(2) {
        let [key, Value::Bulk(raw_fields)] = pair else {
            warn!("Skipping malformed FT.SEARCH entry");
            continue;
        };
        let Some(key) = value_to_string(key) else {
            continue;
        };

        let mut fields: HashMap<String, String> = raw_fields
            .chunks(2)
            .filter_map(|kv| match kv {
                [name, value] => Some((value_to_string(name)?, value_to_string(value)?)),
                _ => None,
            })
            .collect();

        let distance = fields
            .remove(DISTANCE_FIELD)
            .and_then(|d| d.parse::<f32>().ok());
        let Some(distance) = distance else {
            warn!(key = %key, "Skipping hit without a vector distance");
            continue;
        };

        hits.push(IndexHit::new(key, distance, fields));
    }

    Ok(hits)
}

#[async_trait::async_trait]
impl VectorIndex for RedisVectorIndex {
    async fn create(&self, schema: &IndexSchema, overwrite: bool) -> MnemosResult<()> {
        if schema.name != self.index_name {
            warn!(
                schema = %schema.name,
                index = %self.index_name,
                "Schema name differs from the queried index"
            );
        }

        if self.index_exists(&schema.name).await {
            if !overwrite {
                info!(index = %schema.name, "Index already exists, not overwriting");
                return Ok(());
            }
            // Documents are kept; RediSearch re-indexes them under the new definition
            let mut connection = self.connection.clone();
            redis::cmd("FT.DROPINDEX")
                .arg(&schema.name)
                .query_async::<_, ()>(&mut connection)
                .await
                .map_err(|e| MnemosError::store("drop_index", e))?;
        }

        let mut connection = self.connection.clone();
        redis::cmd("FT.CREATE")
            .arg(create_args(schema))
            .query_async::<_, ()>(&mut connection)
            .await
            .map_err(|e| MnemosError::store("create_index", e))?;

        info!(index = %schema.name, prefix = %schema.prefix, "Created Redis vector index");
        Ok(())
    }

    async fn insert(&self, key: &str, document: serde_json::Value) -> MnemosResult<()> {
        let mut connection = self.connection.clone();
        redis::cmd("JSON.SET")
            .arg(key)
            .arg("$")
            .arg(document.to_string())
            .query_async::<_, ()>(&mut connection)
            .await
            .map_err(|e| MnemosError::store("insert", e))?;

        debug!(key = %key, "Stored memory document");
        Ok(())
    }

    async fn range_query(&self, query: &RangeQuery) -> MnemosResult<Vec<IndexHit>> {
        let query_string = range_query_string(&query.filter, fields::EMBEDDING);
        debug!(index = %self.index_name, query = %query_string, "FT.SEARCH");

        let mut cmd = redis::cmd("FT.SEARCH");
        cmd.arg(&self.index_name)
            .arg(&query_string)
            .arg("PARAMS")
            .arg(4)
            .arg("radius")
            .arg(query.distance_threshold)
            .arg("vector")
            .arg(vector_bytes(&query.vector))
            .arg("SORTBY")
            .arg(DISTANCE_FIELD)
            .arg("ASC")
            .arg("RETURN")
            .arg(query.return_fields.len() + 1)
            .arg(&query.return_fields)
            .arg(DISTANCE_FIELD)
            .arg("LIMIT")
            .arg(0)
            .arg(query.num_results)
            .arg("DIALECT")
            .arg(2);

        let mut connection = self.connection.clone();
        let reply: Value = cmd
            .query_async(&mut connection)
            .await
            .map_err(|e| MnemosError::store("range_query", e))?;

        parse_search_reply(&reply)
    }

    fn name(&self) -> &str {
        "redis"
    }
}
