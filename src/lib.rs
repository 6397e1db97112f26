//! shardex - sharded exact inner-product search for dense retrieval
//!
//! A [`ShardManager`] spreads passage embeddings over a fixed number of
//! capacity-bounded devices; a [`QueryEngine`] searches every device and
//! merges the partial rankings into one global top-k per query.
//!
//! ```no_run
//! use shardex::{BackendType, QueryEngine, ShardManager, VectorBatch};
//!
//! # fn main() -> shardex::Result<()> {
//! let passages = VectorBatch::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]])?;
//! let mut shards = ShardManager::new(2, 2, 1, BackendType::Flat)?;
//! shards.add(&passages)?;
//!
//! let queries = VectorBatch::from_rows(&[vec![0.9, 0.1]])?;
//! let results = QueryEngine::new(&shards).batch_search(&queries, 2, 64)?;
//! assert_eq!(results.indices_row(0), &[0, 1]);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod index;
pub mod ranking;
pub mod reps;

pub use backend::{BackendType, LocalHits, LocalIndex};
pub use error::{Result, ShardError};
pub use index::{
    QueryEngine, SearchResults, ShardManager, VectorBatch, VectorView, SENTINEL_INDEX,
    SENTINEL_SCORE,
};
pub use reps::Reps;
