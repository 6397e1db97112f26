//! Index module - vector batches, shard placement, and global search

mod results;
mod searcher;
mod shards;
mod vectors;

pub use results::{SearchResults, SENTINEL_INDEX, SENTINEL_SCORE};
pub use searcher::QueryEngine;
pub use shards::ShardManager;
pub use vectors::{VectorBatch, VectorView};
