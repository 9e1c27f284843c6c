//! `nottif-core`: data model and configuration shared by the dashboard crates.
//!
//! The backend owns every record; the types here only describe what the
//! client receives and keeps in memory for display.

pub mod config;
pub mod error;
pub mod types;

pub use config::NottifConfig;
pub use error::{NottifError, Result};
pub use types::{CronJob, Event, EventLog, EventSource, JobId, MAX_EVENTS};
