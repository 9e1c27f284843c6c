//! `nottif-client`: talks to the nottif backend.
//!
//! - [`ActionClient`]: request/response calls (list, add, delete, webhook).
//! - [`PushChannel`]: the one-way `text/event-stream` of event-log messages.
//!   It never reconnects; once it reports [`PushUpdate::Failed`] it is done.
//!
//! Both sit behind plain data so the dashboard can be driven without a server:
//! the [`Backend`] trait for REST and an mpsc channel of [`PushUpdate`]s for the
//! stream.

pub mod backend;
pub mod client;
pub mod error;
pub mod push;
pub mod sse;

pub use backend::Backend;
pub use client::{ActionClient, SendRequest};
pub use error::{FetchError, StreamError};
pub use push::{PushChannel, PushUpdate};
