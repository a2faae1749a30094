
use std::sync::RwLock;

use tracing::debug;

use crate::document::{ScoredRecord, VectorRecord};
use crate::store::VectorStore;
use crate::{ChatError, Result};

/// Ephemeral in-process vector store using cosine similarity.
///
/// Always available, zero configuration, and lost on restart. Used directly
/// when no persistent endpoint is configured, and as the fallback when the
/// persistent backend fails its startup probe.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<VectorRecord>>,
}

impl MemoryStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Cosine similarity of two vectors. Zero-magnitude vectors score 0.0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorStore for MemoryStore {
    #[inline]
    fn add(&self, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut store = self
            .records
            .write()
            .map_err(|_| ChatError::Store("Memory store lock poisoned".to_string()))?;
        debug!("Storing {} records in memory store", records.len());
        store.extend(records);
        Ok(())
    }

    #[inline]
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredRecord>> {
        let store = self
            .records
            .read()
            .map_err(|_| ChatError::Store("Memory store lock poisoned".to_string()))?;

        let mut scored: Vec<ScoredRecord> = store
            .iter()
            .map(|record| ScoredRecord {
                record: record.clone(),
                score: cosine_similarity(&record.vector, vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);

        debug!("Memory store query returned {} results", scored.len());
        Ok(scored)
    }

    #[inline]
    fn count(&self) -> Result<u64> {
        let store = self
            .records
            .read()
            .map_err(|_| ChatError::Store("Memory store lock poisoned".to_string()))?;
        Ok(store.len() as u64)
    }

    #[inline]
    fn name(&self) -> &'static str {
        "memory"
    }
}
