//! `nottif-dashboard`: keeps the cron-job list and the event log on screen in
//! step with the backend.
//!
//! # Update sources
//!
//! | Source                   | Effect                                              |
//! |--------------------------|-----------------------------------------------------|
//! | User command             | REST mutation, toast, job-list refetch on success   |
//! | REST refetch result      | Replace the job list or the event log               |
//! | Live stream message      | Replace (or prepend to) the event log, refetch jobs |
//! | Live stream failure      | Channel closed for good; mutations refetch events   |
//!
//! All state lives in one [`SyncController`] and is only touched from its loop.
//! Network calls run on spawned tasks and report back through the loop's queue.

pub mod controller;
pub mod notify;
pub mod render;
pub mod store;

pub use controller::{ChannelState, Command, ControllerHandle, Mutation, SyncController};
pub use notify::{Notifier, Toast, ToastLevel};
pub use render::{EventRow, Glyph, JobRow, Surface};
pub use store::ListStore;
