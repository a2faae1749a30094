pub mod memory;
pub mod qdrant;
pub mod selector;

use crate::Result;
use crate::document::{ScoredRecord, VectorRecord};

pub use memory::MemoryStore;
pub use qdrant::QdrantStore;
pub use selector::{ActiveStore, Backend, select_backend};

/// Storage and nearest-neighbor retrieval of chunk embeddings.
///
/// Both backends present the same contract: `add` appends records (ingestion
/// is append-only, duplicates are the caller's concern) and `query` returns
/// at most `k` records ranked by descending similarity. Implementations must
/// tolerate concurrent use from multiple requests.
pub trait VectorStore: Send + Sync {
    /// Append records to the store.
    fn add(&self, records: Vec<VectorRecord>) -> Result<()>;

    /// Return up to `k` records most similar to the query vector.
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredRecord>>;

    /// Total number of stored records, where the backend can report it.
    fn count(&self) -> Result<u64>;

    /// Short backend name for logging.
    fn name(&self) -> &'static str;
}
