use nottif_core::config::ClockZone;
use nottif_core::{CronJob, Event, EventLog};

use crate::render::{
    render_events, render_jobs, EventRow, JobRow, Surface, EVENTS_LOAD_FAILED, JOBS_LOAD_FAILED,
};

/// Last-known job list and event log. Every write redraws the affected list.
///
/// Owned by the [`SyncController`](crate::SyncController); nothing else holds
/// a mutable reference, so writes are serialized by construction.
pub struct ListStore<S> {
    surface: S,
    clock: ClockZone,
    /// `None` until the first successful load.
    jobs: Option<Vec<CronJob>>,
    events: EventLog,
    events_loaded: bool,
}

impl<S: Surface> ListStore<S> {
    pub fn new(surface: S, max_events: usize, clock: ClockZone) -> Self {
        Self {
            surface,
            clock,
            jobs: None,
            events: EventLog::new(max_events),
            events_loaded: false,
        }
    }

    pub fn set_jobs(&mut self, jobs: Vec<CronJob>) {
        self.jobs = Some(jobs);
        let rows = render_jobs(self.jobs.as_deref());
        self.surface.draw_jobs(&rows);
    }

    /// Replace the event log with `events` (newest first), capped.
    pub fn set_events(&mut self, events: Vec<Event>) {
        self.events.replace(events);
        self.events_loaded = true;
        self.redraw_events();
    }

    /// Put one event on top of the log, capped.
    pub fn prepend_event(&mut self, event: Event) {
        self.events.prepend(event);
        self.events_loaded = true;
        self.redraw_events();
    }

    /// A job-list load failed. Shows the error row only when nothing has been
    /// loaded yet; a known list stays on screen. Returns whether it redrew.
    pub fn jobs_failed(&mut self) -> bool {
        if self.jobs.is_some() {
            return false;
        }
        self.surface
            .draw_jobs(&[JobRow::Placeholder(JOBS_LOAD_FAILED)]);
        true
    }

    /// Same as [`jobs_failed`](Self::jobs_failed) for the event log.
    pub fn events_failed(&mut self) -> bool {
        if self.events_loaded {
            return false;
        }
        self.surface
            .draw_events(&[EventRow::Placeholder(EVENTS_LOAD_FAILED)]);
        true
    }

    pub fn jobs(&self) -> &[CronJob] {
        self.jobs.as_deref().unwrap_or(&[])
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn redraw_events(&mut self) {
        let rows = render_events(Some(self.events.as_slice()), self.clock);
        self.surface.draw_events(&rows);
    }
}
