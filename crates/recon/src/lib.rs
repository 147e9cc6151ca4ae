//! `divrec-recon` — Dividend booking reconciliation and correction engine.
//!
//! Matches NBIM and custody ledgers by business key, quantifies breaks, and
//! applies a deterministic NBIM-authoritative correction policy to produce
//! aligned output ledgers. Pure engine crate: receives in-memory records,
//! returns corrected records; file IO belongs to the CLI.

pub mod apply;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod ingest;
pub mod matcher;
pub mod model;
pub mod propose;
pub mod refine;
pub mod report;
pub mod summary;

pub use config::{RunConfig, Tolerance};
pub use engine::{resolve, ResolveOutput};
pub use error::ReconError;
pub use model::{Change, ChangeOutcome, DiscrepancyMetrics, MatchedPair, Record, Source};
pub use report::AnalysisReport;
