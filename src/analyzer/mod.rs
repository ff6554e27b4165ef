//! Analyzer module - page quality analysis engine

pub mod aggregator;
pub mod clock;
pub mod engine;
pub mod rules;
pub mod scoring;

pub use aggregator::Aggregator;
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{AggregateStats, PageTarget, QualityEngine};
pub use scoring::{capped_deduction, CategoryScorer, ScoreCalculator};
