#[cfg(test)]
mod tests;

use std::time::Duration;

use tracing::{info, warn};

use crate::Result;
use crate::config::Config;
use crate::store::{MemoryStore, QdrantStore, VectorStore};

/// Number of reachability probes before giving up on the persistent backend.
const PROBE_ATTEMPTS: u32 = 3;
/// Delay between probe attempts.
const PROBE_DELAY: Duration = Duration::from_millis(500);

/// Which backend the selector settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Ephemeral,
    Persistent,
}

impl Backend {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ephemeral => "ephemeral",
            Self::Persistent => "persistent",
        }
    }
}

/// The selected store, terminal for the process lifetime. There is no
/// re-probe or promotion back to the persistent backend while running.
pub struct ActiveStore {
    pub store: Box<dyn VectorStore>,
    pub backend: Backend,
    /// Why the selector degraded to the ephemeral backend, when it did.
    pub fallback_reason: Option<String>,
}

/// Select the vector store backend at startup.
///
/// No persistent endpoint configured means the ephemeral store is used
/// directly. With an endpoint, the server is probed a bounded number of
/// times; exhausting the attempts degrades to the ephemeral store rather
/// than failing the request. This trades durability for availability:
/// data ingested while degraded is lost on restart.
#[inline]
pub fn select_backend(config: &Config) -> Result<ActiveStore> {
    select_backend_with(config, PROBE_ATTEMPTS, PROBE_DELAY)
}

pub(crate) fn select_backend_with(
    config: &Config,
    attempts: u32,
    delay: Duration,
) -> Result<ActiveStore> {
    let Some(qdrant_config) = &config.qdrant else {
        info!("No persistent store configured, using ephemeral vector store");
        return Ok(ActiveStore {
            store: Box::new(MemoryStore::new()),
            backend: Backend::Ephemeral,
            fallback_reason: None,
        });
    };

    let store = QdrantStore::new(qdrant_config)?;

    let mut last_error = String::new();
    for attempt in 1..=attempts {
        match store.probe() {
            Ok(()) => {
                info!(
                    "Persistent vector store ready at {} (collection '{}')",
                    qdrant_config.url, qdrant_config.collection
                );
                return Ok(ActiveStore {
                    store: Box::new(store),
                    backend: Backend::Persistent,
                    fallback_reason: None,
                });
            }
            Err(e) => {
                warn!("Store probe attempt {}/{} failed: {}", attempt, attempts, e);
                last_error = e.to_string();
                if attempt < attempts {
                    std::thread::sleep(delay);
                }
            }
        }
    }

    let reason = format!(
        "Persistent store unreachable after {} attempts: {}",
        attempts, last_error
    );
    warn!("{}; falling back to ephemeral vector store", reason);

    Ok(ActiveStore {
        store: Box::new(MemoryStore::new()),
        backend: Backend::Ephemeral,
        fallback_reason: Some(reason),
    })
}
