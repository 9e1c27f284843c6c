//! The sync loop: one task owns the store, the notifier and the channel state.
//!
//! Network calls are spawned and post their outcome back through
//! `signal_rx`; live-stream updates arrive on a separate queue. Both queues
//! are drained by [`SyncController::step`], so every store write happens on the
//! loop and in arrival order.

use std::future::Future;
use std::sync::Arc;

use nottif_client::{Backend, FetchError, PushChannel, PushUpdate, SendRequest};
use nottif_core::{CronJob, Event, JobId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::notify::{Notifier, Toast};
use crate::render::Surface;
use crate::store::ListStore;

const QUEUE_DEPTH: usize = 256;

/// A user-triggered request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddJob { message: String, schedule: String },
    DeleteJob { id: JobId },
    UpdateWebhook { url: String },
    TestWebhook,
    Send(SendRequest),
    /// Refetch both lists.
    Refresh,
}

/// A backend write whose outcome is reported with a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    AddJob,
    DeleteJob,
    UpdateWebhook,
    TestWebhook,
    Send,
}

impl Mutation {
    /// Whether a successful call changes the job list.
    pub fn touches_jobs(self) -> bool {
        matches!(self, Mutation::AddJob | Mutation::DeleteJob)
    }

    pub fn toast(self, result: &Result<(), FetchError>) -> Toast {
        let err = match result {
            Ok(()) => {
                return Toast::success(match self {
                    Mutation::AddJob => "Cron job added successfully!",
                    Mutation::DeleteJob => "Cron job deleted.",
                    Mutation::UpdateWebhook => "Webhook URL updated successfully!",
                    Mutation::TestWebhook => "Test notification sent!",
                    Mutation::Send => "Notification sent!",
                })
            }
            Err(e) => e,
        };

        match self {
            Mutation::AddJob => Toast::error("Error: Could not add cron job."),
            Mutation::DeleteJob => Toast::error("Error: Could not delete cron job."),
            Mutation::UpdateWebhook => Toast::error("Error: Could not update webhook URL."),
            Mutation::TestWebhook => Toast::error(format!(
                "Error: {}",
                err.server_message().unwrap_or("Failed to send")
            )),
            Mutation::Send => match err {
                FetchError::InvalidRequest(reason) => Toast::error(format!("Error: {reason}")),
                _ => match err.server_message() {
                    Some(msg) => Toast::error(format!("Error: {msg}")),
                    None => Toast::error("Error: Could not send notification."),
                },
            },
        }
    }
}

/// Lifecycle of the live event stream. There is no way back from `Closed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    /// No stream was ever attached (streaming disabled).
    Unattached,
    Connecting,
    Open,
    Closed { reason: String },
}

impl ChannelState {
    /// Whether stream updates are still accepted.
    pub fn is_live(&self) -> bool {
        matches!(self, ChannelState::Connecting | ChannelState::Open)
    }
}

enum Signal {
    Command(Command),
    JobsLoaded {
        generation: u64,
        result: Result<Vec<CronJob>, FetchError>,
    },
    EventsLoaded {
        generation: u64,
        result: Result<Vec<Event>, FetchError>,
    },
    Mutated {
        mutation: Mutation,
        result: Result<(), FetchError>,
    },
    Shutdown,
}

/// Orders refetches of one list. Responses can land out of order, so each
/// request is numbered and anything not newer than what is already shown is
/// dropped.
#[derive(Debug, Default)]
struct Generation {
    issued: u64,
    applied: u64,
}

impl Generation {
    fn next(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn accept(&mut self, generation: u64) -> bool {
        if generation <= self.applied {
            return false;
        }
        self.applied = generation;
        true
    }

    /// Everything requested so far is older than what is about to be shown.
    fn supersede(&mut self) {
        self.applied = self.issued;
    }
}

/// Cloneable sender side of a running [`SyncController`].
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Signal>,
}

impl ControllerHandle {
    /// Queue a command. Returns `false` once the controller has stopped.
    pub async fn send(&self, command: Command) -> bool {
        self.tx.send(Signal::Command(command)).await.is_ok()
    }

    /// Ask the loop to stop. In-flight results are discarded.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Signal::Shutdown).await;
    }
}

pub struct SyncController<B, S, N> {
    backend: Arc<B>,
    store: ListStore<S>,
    notifier: N,
    channel: ChannelState,
    stream_task: Option<JoinHandle<()>>,
    signal_tx: mpsc::Sender<Signal>,
    signal_rx: mpsc::Receiver<Signal>,
    push_rx: Option<mpsc::Receiver<PushUpdate>>,
    jobs_gen: Generation,
    events_gen: Generation,
}

impl<B, S, N> SyncController<B, S, N>
where
    B: Backend + 'static,
    S: Surface,
    N: Notifier,
{
    pub fn new(backend: Arc<B>, store: ListStore<S>, notifier: N) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel(QUEUE_DEPTH);
        Self {
            backend,
            store,
            notifier,
            channel: ChannelState::Unattached,
            stream_task: None,
            signal_tx,
            signal_rx,
            push_rx: None,
            jobs_gen: Generation::default(),
            events_gen: Generation::default(),
        }
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            tx: self.signal_tx.clone(),
        }
    }

    /// Initial load: both lists are requested at once and each is drawn as
    /// soon as its own response arrives.
    pub fn start(&mut self) {
        self.refetch_jobs();
        self.refetch_events();
    }

    /// Open the single push source for this controller.
    ///
    /// Returns `None` if a source was already attached, including after it
    /// closed. The channel moves to `Connecting`.
    pub fn attach_push_source(&mut self) -> Option<mpsc::Sender<PushUpdate>> {
        if self.channel != ChannelState::Unattached {
            return None;
        }
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        self.push_rx = Some(rx);
        self.channel = ChannelState::Connecting;
        Some(tx)
    }

    /// Attach and start `channel` on its own task.
    pub fn connect(&mut self, channel: PushChannel) -> bool {
        let Some(tx) = self.attach_push_source() else {
            warn!(state = ?self.channel, "event stream already used, not reconnecting");
            return false;
        };
        self.stream_task = Some(channel.spawn(tx));
        true
    }

    /// Handle one queued signal or push update. Returns `false` on shutdown.
    pub async fn step(&mut self) -> bool {
        tokio::select! {
            Some(signal) = self.signal_rx.recv() => self.on_signal(signal),
            update = next_push(&mut self.push_rx) => {
                match update {
                    Some(update) => self.on_push(update),
                    None => self.on_push_ended(),
                }
                true
            }
        }
    }

    /// Drive the loop until shutdown, then tear the channel down.
    pub async fn run(&mut self) {
        while self.step().await {}
        if let Some(task) = self.stream_task.take() {
            task.abort();
        }
        self.push_rx = None;
        if self.channel.is_live() {
            self.channel = ChannelState::Closed {
                reason: "shutdown".to_string(),
            };
        }
        info!("sync controller stopped");
    }

    pub fn store(&self) -> &ListStore<S> {
        &self.store
    }

    pub fn channel_state(&self) -> &ChannelState {
        &self.channel
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Whether a stream task started by [`connect`](Self::connect) is still held.
    pub fn has_stream_task(&self) -> bool {
        self.stream_task.is_some()
    }

    fn on_signal(&mut self, signal: Signal) -> bool {
        match signal {
            Signal::Command(command) => self.on_command(command),
            Signal::JobsLoaded { generation, result } => {
                if !self.jobs_gen.accept(generation) {
                    debug!(generation, "dropping stale job list");
                    return true;
                }
                match result {
                    Ok(jobs) => {
                        debug!(count = jobs.len(), "job list loaded");
                        self.store.set_jobs(jobs);
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to load cron jobs");
                        self.store.jobs_failed();
                    }
                }
            }
            Signal::EventsLoaded { generation, result } => {
                if !self.events_gen.accept(generation) {
                    debug!(generation, "dropping stale event log");
                    return true;
                }
                match result {
                    Ok(events) => {
                        debug!(count = events.len(), "event log loaded");
                        self.store.set_events(events);
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to load events");
                        self.store.events_failed();
                    }
                }
            }
            Signal::Mutated { mutation, result } => self.on_mutated(mutation, result),
            Signal::Shutdown => return false,
        }
        true
    }

    fn on_command(&mut self, command: Command) {
        debug!(?command, "command received");
        match command {
            Command::AddJob { message, schedule } => {
                self.spawn_mutation(Mutation::AddJob, move |b| async move {
                    b.add_job(&message, &schedule).await
                })
            }
            Command::DeleteJob { id } => {
                self.spawn_mutation(Mutation::DeleteJob, move |b| async move {
                    b.delete_job(&id).await
                })
            }
            Command::UpdateWebhook { url } => {
                self.spawn_mutation(Mutation::UpdateWebhook, move |b| async move {
                    b.update_webhook(&url).await
                })
            }
            Command::TestWebhook => {
                self.spawn_mutation(Mutation::TestWebhook, |b| async move {
                    b.test_webhook().await
                })
            }
            Command::Send(req) => self.spawn_mutation(Mutation::Send, move |b| async move {
                b.send_notification(&req).await
            }),
            Command::Refresh => self.start(),
        }
    }

    fn on_mutated(&mut self, mutation: Mutation, result: Result<(), FetchError>) {
        if let Err(e) = &result {
            warn!(?mutation, error = %e, "backend call failed");
        }
        let toast = mutation.toast(&result);
        self.notifier.notify(toast);

        if result.is_ok() && mutation.touches_jobs() {
            self.refetch_jobs();
        }
        // Without a live stream the server's log entry for this call only
        // shows up through a refetch.
        if !self.channel.is_live() {
            self.refetch_events();
        }
    }

    fn on_push(&mut self, update: PushUpdate) {
        if !self.channel.is_live() {
            debug!(state = ?self.channel, "ignoring update from closed event stream");
            return;
        }
        match update {
            PushUpdate::Opened => {
                info!("live updates active");
                self.channel = ChannelState::Open;
            }
            PushUpdate::Snapshot(events) => {
                self.events_gen.supersede();
                self.store.set_events(events);
                self.refetch_jobs();
            }
            PushUpdate::Event(event) => {
                self.events_gen.supersede();
                self.store.prepend_event(event);
                self.refetch_jobs();
            }
            PushUpdate::Failed(e) => self.close_channel(e.to_string()),
        }
    }

    /// The push queue ran dry without a final `Failed`: the sender was dropped
    /// or the stream task died.
    fn on_push_ended(&mut self) {
        self.push_rx = None;
        if self.channel.is_live() {
            self.close_channel("event stream ended".to_string());
        }
    }

    fn close_channel(&mut self, reason: String) {
        warn!(%reason, "event stream closed, live updates stopped");
        self.channel = ChannelState::Closed { reason };
        if let Some(task) = self.stream_task.take() {
            task.abort();
        }
    }

    fn refetch_jobs(&mut self) {
        let generation = self.jobs_gen.next();
        let backend = Arc::clone(&self.backend);
        let tx = self.signal_tx.clone();
        tokio::spawn(async move {
            let result = backend.list_jobs().await;
            let _ = tx.send(Signal::JobsLoaded { generation, result }).await;
        });
    }

    fn refetch_events(&mut self) {
        let generation = self.events_gen.next();
        let backend = Arc::clone(&self.backend);
        let tx = self.signal_tx.clone();
        tokio::spawn(async move {
            let result = backend.list_events().await;
            let _ = tx.send(Signal::EventsLoaded { generation, result }).await;
        });
    }

    fn spawn_mutation<F, Fut>(&self, mutation: Mutation, call: F)
    where
        F: FnOnce(Arc<B>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), FetchError>> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let tx = self.signal_tx.clone();
        tokio::spawn(async move {
            let result = call(backend).await;
            let _ = tx.send(Signal::Mutated { mutation, result }).await;
        });
    }
}

async fn next_push(rx: &mut Option<mpsc::Receiver<PushUpdate>>) -> Option<PushUpdate> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
