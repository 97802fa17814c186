//! The decision engine.
//!
//! Classifies the relationship between an indexer candidate and a local
//! searchee into the [`Decision`] taxonomy: pre-snatch filters, snatch with
//! retries, identity/collision checks, then file-tree comparison under the
//! configured [`MatchMode`].

pub mod compare;
pub mod prefilter;

mod engine;
mod types;

pub use engine::{AssessmentInput, AssessmentOverrides, DecisionEngine};
pub use types::{Decision, MatchMode, ResultAssessment};
