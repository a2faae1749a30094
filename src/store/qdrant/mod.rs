
use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::QdrantConfig;
use crate::document::{ScoredRecord, VectorRecord};
use crate::store::VectorStore;
use crate::{ChatError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Persistent vector store backed by a Qdrant server's REST API.
///
/// The collection is created lazily on the first `add`, once the vector
/// dimension is known from the first record. Records survive process
/// restarts; consistency is whatever the server provides.
#[derive(Debug, Clone)]
pub struct QdrantStore {
    base_url: Url,
    collection: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Debug, Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Debug, Serialize)]
struct UpsertRequest {
    points: Vec<Point>,
}

#[derive(Debug, Serialize)]
struct Point {
    id: String,
    vector: Vec<f32>,
    payload: Payload,
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    content: String,
    metadata: BTreeMap<String, String>,
    created_at: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    vector: Vec<f32>,
    limit: usize,
    with_payload: bool,
    with_vector: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: serde_json::Value,
    score: f32,
    payload: Option<Payload>,
    #[serde(default)]
    vector: Option<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    result: CountResult,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: u64,
}

impl QdrantStore {
    #[inline]
    pub fn new(config: &QdrantConfig) -> Result<Self> {
        let base_url =
            Url::parse(&config.url).map_err(|e| ChatError::Config(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            collection: config.collection.clone(),
            agent,
        })
    }

    /// Reachability probe used by the store selector. One request, no retry;
    /// the selector owns the retry policy.
    #[inline]
    pub fn probe(&self) -> Result<()> {
        let url = self.join("/collections")?;
        debug!("Probing Qdrant at {}", url);

        self.agent
            .get(url.as_str())
            .call()
            .map_err(|e| ChatError::Store(format!("Qdrant probe failed: {}", e)))?;

        Ok(())
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ChatError::Store(format!("Failed to build Qdrant URL: {}", e)))
    }

    fn collection_path(&self, suffix: &str) -> Result<Url> {
        self.join(&format!("/collections/{}{}", self.collection, suffix))
    }

    /// Create the collection if it does not exist yet. The dimension comes
    /// from the first record of the first ingested batch.
    fn ensure_collection(&self, dimension: usize) -> Result<()> {
        let url = self.collection_path("")?;

        match self.agent.get(url.as_str()).call() {
            Ok(_) => return Ok(()),
            Err(ureq::Error::StatusCode(404)) => {}
            Err(e) => {
                return Err(ChatError::Store(format!(
                    "Failed to check Qdrant collection: {}",
                    e
                )));
            }
        }

        debug!(
            "Creating Qdrant collection '{}' with {} dimensions",
            self.collection, dimension
        );

        let request = CreateCollectionRequest {
            vectors: VectorParams {
                size: dimension,
                distance: "Cosine",
            },
        };

        self.agent
            .put(url.as_str())
            .header("Content-Type", "application/json")
            .send(
                &serde_json::to_string(&request)
                    .map_err(|e| ChatError::Store(e.to_string()))?,
            )
            .map_err(|e| ChatError::Store(format!("Failed to create Qdrant collection: {}", e)))?;

        Ok(())
    }
}

impl VectorStore for QdrantStore {
    #[inline]
    fn add(&self, records: Vec<VectorRecord>) -> Result<()> {
        let Some(first) = records.first() else {
            return Ok(());
        };
        self.ensure_collection(first.vector.len())?;

        let points: Vec<Point> = records
            .into_iter()
            .map(|record| Point {
                id: record.id,
                vector: record.vector,
                payload: Payload {
                    content: record.content,
                    metadata: record.metadata,
                    created_at: record.created_at,
                },
            })
            .collect();

        debug!(
            "Upserting {} points into Qdrant collection '{}'",
            points.len(),
            self.collection
        );

        let url = self.collection_path("/points")?;
        let body = serde_json::to_string(&UpsertRequest { points })
            .map_err(|e| ChatError::Store(e.to_string()))?;

        self.agent
            .put(url.as_str())
            .header("Content-Type", "application/json")
            .query("wait", "true")
            .send(&body)
            .map_err(|e| ChatError::Store(format!("Qdrant upsert failed: {}", e)))?;

        Ok(())
    }

    #[inline]
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredRecord>> {
        let url = self.collection_path("/points/search")?;
        let body = serde_json::to_string(&SearchRequest {
            vector: vector.to_vec(),
            limit: k,
            with_payload: true,
            with_vector: false,
        })
        .map_err(|e| ChatError::Store(e.to_string()))?;

        let mut response = match self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&body)
        {
            Ok(response) => response,
            // Nothing ingested yet means the collection does not exist;
            // that is an empty result, not a failure
            Err(ureq::Error::StatusCode(404)) => {
                debug!("Qdrant collection '{}' missing, empty result", self.collection);
                return Ok(Vec::new());
            }
            Err(e) => return Err(ChatError::Store(format!("Qdrant search failed: {}", e))),
        };

        let response_text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ChatError::Store(format!("Failed to read Qdrant response: {}", e)))?;

        let parsed: SearchResponse = serde_json::from_str(&response_text)
            .map_err(|e| ChatError::Store(format!("Failed to parse Qdrant response: {}", e)))?;

        let results = parsed
            .result
            .into_iter()
            .filter_map(|hit| {
                let Some(payload) = hit.payload else {
                    warn!("Qdrant hit {} has no payload, skipping", hit.id);
                    return None;
                };
                Some(ScoredRecord {
                    record: VectorRecord {
                        id: match hit.id {
                            serde_json::Value::String(id) => id,
                            other => other.to_string(),
                        },
                        vector: hit.vector.unwrap_or_default(),
                        content: payload.content,
                        metadata: payload.metadata,
                        created_at: payload.created_at,
                    },
                    score: hit.score,
                })
            })
            .collect();

        Ok(results)
    }

    #[inline]
    fn count(&self) -> Result<u64> {
        let url = self.collection_path("/points/count")?;

        let mut response = match self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(r#"{"exact": true}"#)
        {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(404)) => return Ok(0),
            Err(e) => return Err(ChatError::Store(format!("Qdrant count failed: {}", e))),
        };

        let response_text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ChatError::Store(format!("Failed to read Qdrant response: {}", e)))?;

        let parsed: CountResponse = serde_json::from_str(&response_text)
            .map_err(|e| ChatError::Store(format!("Failed to parse Qdrant response: {}", e)))?;

        Ok(parsed.result.count)
    }

    #[inline]
    fn name(&self) -> &'static str {
        "qdrant"
    }
}
