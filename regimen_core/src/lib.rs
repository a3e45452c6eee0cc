#![forbid(unsafe_code)]

//! Temporal medication regimen engine.
//!
//! This crate provides:
//! - The medication ledger (headers plus immutable dosage periods)
//! - Snapshot reconstruction of the regimen on any date
//! - Change timelines (started, dose changed, discontinued, reactivated)
//! - Classified comparison of two regimens
//! - Ledger persistence, CSV export, configuration and logging

pub mod types;
pub mod error;
pub mod dosage;
pub mod ledger;
pub mod snapshot;
pub mod timeline;
pub mod compare;
pub mod store;
pub mod export;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use ledger::{DoseSpec, Ledger};
pub use snapshot::regimen_as_of;
pub use timeline::{medication_timeline, timeline, timeline_between};
pub use compare::compare;
pub use store::{JsonFileStore, LedgerStore};
pub use config::Config;
