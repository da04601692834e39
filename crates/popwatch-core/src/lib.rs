//! # popwatch-core
//!
//! Mailbox polling logic for `popwatch`.
//!
//! This crate provides:
//! - Poller configuration and validation
//! - Known-UID state, persisted in `SQLite` or kept in memory
//! - The poll cycle (list, diff, retrieve, delete) with single-flight execution
//! - A fixed-interval scheduler
//! - Emission sinks for the records each cycle produces

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod poller;
pub mod record;
pub mod sink;
pub mod state;

pub use config::{PollerConfig, ValidationError, ValidationResult, validate_config};
pub use error::{Error, Result};
pub use poller::{CycleOutcome, CycleReport, Poller, PollerHandle, spawn};
pub use record::EmittedRecord;
pub use sink::{ChannelSink, EmissionSink, JsonLinesSink, PollEvent};
pub use state::{KnownUidStore, KnownUids, MemoryStateStore, SqliteStateRepository};
