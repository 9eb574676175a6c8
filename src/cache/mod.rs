pub mod keys;
pub mod precomputed;
pub mod ttl;

pub use keys::{ImageTimelinesKey, TimelineKey};
pub use precomputed::{PopulateReport, PrecomputedStore, StoreHit};
pub use ttl::{CacheEntry, TtlCache};
