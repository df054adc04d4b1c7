pub mod cache;
pub mod classifier;
pub mod fallback;
pub mod orchestrator;
pub mod quota;
pub mod sample;

pub use cache::{CacheEntry, CacheStore, Clock, FileStore, ManualClock, MemoryStore, PersistentStore, StorageError, SystemClock};
pub use classifier::{ResultClassifier, ShortsFilter};
pub use fallback::{FallbackChain, TierAttempt};
pub use orchestrator::FetchOrchestrator;
pub use quota::{QuotaTracker, QuotaUsage};
pub use sample::sample_items;
