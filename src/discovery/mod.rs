//! Repository discovery pipeline.
//!
//! Queries fetch search pages, drop irrelevant candidates, verify that the
//! remaining ones ship an installer for the target platform and stream the
//! growing result list to the consumer.

pub mod aggregator;
pub mod cache;
pub mod developer;
pub mod installability;
pub mod merge;
pub mod query;
pub mod scoring;
pub mod service;
pub mod snapshot;
pub mod verifier;

pub use aggregator::{Aggregator, AggregatorTuning, QueryEvent, QueryFailure, QueryOutcome};
pub use cache::ReleaseCheckCache;
pub use merge::ResultAccumulator;
pub use query::{DiscoveryCategory, ProgrammingLanguage};
pub use service::{DiscoveryService, QueryHandle, SearchParams};
pub use snapshot::{HttpSnapshotSource, SnapshotLoader, SnapshotSource};
pub use verifier::Verifier;
