//! Core services: normalization, reconciliation and ranking.

pub mod indexer;
pub mod normalize;
pub mod ranker;

pub use indexer::{IndexConfig, IndexProgress, IndexReport, Indexer};
pub use ranker::{QueryOptions, Ranker, SearchHit};
