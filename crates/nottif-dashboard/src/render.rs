//! Pure rendering: lists in, display rows out.
//!
//! Nothing here touches a screen. A [`Surface`] receives the rows and decides
//! how to draw them, which keeps the synchronization logic testable with a
//! recording stub.

use chrono::{DateTime, FixedOffset, Local, Utc};
use nottif_core::config::ClockZone;
use nottif_core::{CronJob, Event, JobId};

use crate::controller::Command;

pub const NO_JOBS: &str = "No scheduled jobs.";
pub const NO_EVENTS: &str = "No recent notifications.";
pub const JOBS_LOAD_FAILED: &str = "Error loading jobs.";
pub const EVENTS_LOAD_FAILED: &str = "Error loading events.";

/// Shown instead of a time of day when an event has no usable timestamp.
pub const UNKNOWN_TIME: &str = "--:--:--";

/// A display surface for the two lists.
///
/// Each call replaces the whole list view.
pub trait Surface: Send {
    fn draw_jobs(&mut self, rows: &[JobRow]);
    fn draw_events(&mut self, rows: &[EventRow]);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRow {
    Job {
        id: JobId,
        message: String,
        schedule: String,
    },
    /// Stand-in row for an empty or unavailable list.
    Placeholder(&'static str),
}

impl JobRow {
    /// The delete affordance of this row.
    pub fn delete_command(&self) -> Option<Command> {
        match self {
            JobRow::Job { id, .. } => Some(Command::DeleteJob { id: id.clone() }),
            JobRow::Placeholder(_) => None,
        }
    }
}

/// Status marker for an event row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Success,
    Failure,
}

impl Glyph {
    pub fn symbol(self) -> &'static str {
        match self {
            Glyph::Success => "✔",
            Glyph::Failure => "✖",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRow {
    Event {
        glyph: Glyph,
        /// `source: message`, never truncated.
        line: String,
        time: String,
    },
    Placeholder(&'static str),
}

/// One row per job, or a single placeholder when there are none.
pub fn render_jobs(jobs: Option<&[CronJob]>) -> Vec<JobRow> {
    match jobs {
        Some(jobs) if !jobs.is_empty() => jobs
            .iter()
            .map(|job| JobRow::Job {
                id: job.id.clone(),
                message: job.message.clone(),
                schedule: job.schedule.clone(),
            })
            .collect(),
        _ => vec![JobRow::Placeholder(NO_JOBS)],
    }
}

/// One row per event in the given (newest-first) order, or a single placeholder.
pub fn render_events(events: Option<&[Event]>, clock: ClockZone) -> Vec<EventRow> {
    match events {
        Some(events) if !events.is_empty() => events
            .iter()
            .map(|event| EventRow::Event {
                glyph: if event.success {
                    Glyph::Success
                } else {
                    Glyph::Failure
                },
                line: format!("{}: {}", event.source, event.message),
                time: time_of_day(event.timestamp.as_ref(), clock),
            })
            .collect(),
        _ => vec![EventRow::Placeholder(NO_EVENTS)],
    }
}

pub fn time_of_day(timestamp: Option<&DateTime<FixedOffset>>, clock: ClockZone) -> String {
    let Some(ts) = timestamp else {
        return UNKNOWN_TIME.to_string();
    };
    match clock {
        ClockZone::Local => ts.with_timezone(&Local).format("%X").to_string(),
        ClockZone::Utc => ts.with_timezone(&Utc).format("%X").to_string(),
    }
}
