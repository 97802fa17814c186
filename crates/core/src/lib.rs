//! Cross-seeding engine core.
//!
//! Given torrents already seeded locally (searchees), assess candidate
//! releases from external indexers, inject byte-identical matches, track
//! cross-tracker collisions and resolve them via operator conflict rules,
//! all driven by a cooperative job scheduler.

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod conflict;
pub mod decide;
pub mod indexer;
pub mod jobs;
pub mod metrics;
pub mod model;
pub mod release;
pub mod store;
pub mod testing;

pub use auth::{create_authenticator, AuthError, AuthRequest, Authenticator, Identity};
pub use cache::{GuidInfoHashMap, TorrentCache};
pub use client::{ClientError, TorrentClient};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use conflict::ConflictResolver;
pub use decide::{
    AssessmentInput, AssessmentOverrides, Decision, DecisionEngine, MatchMode, ResultAssessment,
};
pub use indexer::{
    BulkSearchOptions, BulkSearchSummary, BulkSearcher, HttpSnatcher, SnatchError, Snatcher,
};
pub use jobs::{Job, JobError, JobExecutor, JobName, JobScheduler};
pub use model::{Candidate, FileEntry, Metafile, Searchee, SearcheeLabel};
pub use store::{
    ClientSearcheeStore, ConflictRule, ConflictRuleInput, ConflictRuleStore, Database,
    DecisionStore, IndexerStore, JobLogStore, StoreError,
};
