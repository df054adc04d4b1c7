// 缓存模块 - 带过期时间的本地结果缓存
//
// 本模块提供拉取结果的缓存功能，包括：
// - 可注入的时钟
// - 持久化键值存储（内存 / 文件）
// - 按条目 TTL 惰性过期的缓存存储

pub mod cache_store;
pub mod clock;
pub mod error;
pub mod store;

pub use cache_store::{CacheEntry, CacheStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::StorageError;
pub use store::{FileStore, MemoryStore, PersistentStore};
