//! Progress/event bus (C13, §4.13): opaque task ids, a four-state task
//! lifecycle, and step-grained progress snapshots that subscribers can watch
//! as a task runs.
//!
//! Each task gets its own `tokio::sync::watch` channel rather than a shared
//! broadcast topic, mirroring the per-topic channel-per-key layout used
//! elsewhere for in-memory pub/sub, but keyed on `watch` instead of
//! `broadcast`: a `watch::Receiver` always exposes "the current value plus
//! every subsequent send" to anyone holding it, which is exactly the
//! subscribe contract here — a subscriber that connects before the terminal
//! state rides every update up to and including it, and a subscriber that
//! connects after terminal only ever observes that last value.

mod snapshot;

pub use snapshot::{ProgressMeta, ProgressSnapshot};

use conditioner_types::{ConditionerError, Result, TaskId, TaskState};
use dashmap::DashMap;
use tokio::sync::watch;

/// In-process registry of task channels, keyed by [`TaskId`].
///
/// Tasks are never removed automatically — a finished task's terminal
/// snapshot stays reachable for as long as the bus lives, so a subscriber
/// that arrives late still gets a meaningful answer instead of "unknown
/// task".
pub struct EventBus {
    tasks: DashMap<TaskId, watch::Sender<ProgressSnapshot>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self { tasks: DashMap::new() }
    }

    /// Registers a new task in `PENDING` state and returns its id.
    #[must_use]
    pub fn create_task(&self) -> TaskId {
        let id = TaskId::new();
        let (tx, _rx) = watch::channel(ProgressSnapshot {
            state: TaskState::Pending,
            meta: ProgressMeta::default(),
        });
        self.tasks.insert(id, tx);
        id
    }

    /// Overwrites a task's state and metadata, per §4.13: `meta` replaces the
    /// prior snapshot's metadata wholesale rather than merging into it.
    ///
    /// # Errors
    /// Returns [`ConditionerError::NotFound`] if `id` was never created on
    /// this bus.
    pub fn update_state(&self, id: TaskId, state: TaskState, meta: ProgressMeta) -> Result<()> {
        let entry = self
            .tasks
            .get(&id)
            .ok_or_else(|| ConditionerError::NotFound { resource: "task".to_string(), id: id.to_string() })?;
        // `send` errors out (and skips the update!) once the last receiver
        // drops, which happens routinely here since a task may finish before
        // anyone ever subscribes. `send_replace` updates the stored value
        // unconditionally, so a late subscriber still sees it.
        entry.send_replace(ProgressSnapshot { state, meta });
        Ok(())
    }

    /// Subscribes to a task's progress. The returned receiver already holds
    /// the current snapshot and will observe every subsequent update,
    /// including the terminal one if the task has not finished yet.
    ///
    /// # Errors
    /// Returns [`ConditionerError::NotFound`] if `id` was never created on
    /// this bus.
    pub fn subscribe(&self, id: TaskId) -> Result<watch::Receiver<ProgressSnapshot>> {
        self.tasks
            .get(&id)
            .map(|entry| entry.subscribe())
            .ok_or_else(|| ConditionerError::NotFound { resource: "task".to_string(), id: id.to_string() })
    }

    /// Reads the current snapshot without subscribing.
    ///
    /// # Errors
    /// Returns [`ConditionerError::NotFound`] if `id` was never created on
    /// this bus.
    pub fn current(&self, id: TaskId) -> Result<ProgressSnapshot> {
        self.tasks
            .get(&id)
            .map(|entry| entry.borrow().clone())
            .ok_or_else(|| ConditionerError::NotFound { resource: "task".to_string(), id: id.to_string() })
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[must_use]
pub fn is_terminal(state: TaskState) -> bool {
    matches!(state, TaskState::Success | TaskState::Failure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_task_is_not_found() {
        let bus = EventBus::new();
        let err = bus.subscribe(TaskId::new()).unwrap_err();
        assert!(matches!(err, ConditionerError::NotFound { .. }));
    }

    #[test]
    fn newly_created_task_starts_pending() {
        let bus = EventBus::new();
        let id = bus.create_task();
        let snapshot = bus.current(id).unwrap();
        assert_eq!(snapshot.state, TaskState::Pending);
        assert_eq!(snapshot.meta, ProgressMeta::default());
    }

    #[test]
    fn update_state_overwrites_rather_than_merges_meta() {
        let bus = EventBus::new();
        let id = bus.create_task();

        bus.update_state(
            id,
            TaskState::Progress,
            ProgressMeta { current_step: Some("scrape".to_string()), scraped: Some(10), ..Default::default() },
        )
        .unwrap();

        bus.update_state(
            id,
            TaskState::Progress,
            ProgressMeta { current_step: Some("filter".to_string()), ..Default::default() },
        )
        .unwrap();

        let snapshot = bus.current(id).unwrap();
        assert_eq!(snapshot.meta.current_step.as_deref(), Some("filter"));
        // `scraped` was not repeated in the second call, so it does not survive.
        assert_eq!(snapshot.meta.scraped, None);
    }

    #[tokio::test]
    async fn subscriber_connected_before_terminal_observes_every_update_and_terminal() {
        let bus = EventBus::new();
        let id = bus.create_task();
        let mut rx = bus.subscribe(id).unwrap();
        assert_eq!(rx.borrow().state, TaskState::Pending);

        bus.update_state(
            id,
            TaskState::Progress,
            ProgressMeta { current_step: Some("scrape".to_string()), ..Default::default() },
        )
        .unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().state, TaskState::Progress);
        assert_eq!(rx.borrow().meta.current_step.as_deref(), Some("scrape"));

        bus.update_state(id, TaskState::Success, ProgressMeta { total: Some(42), ..Default::default() }).unwrap();
        rx.changed().await.unwrap();
        let terminal = rx.borrow().clone();
        assert_eq!(terminal.state, TaskState::Success);
        assert!(is_terminal(terminal.state));
    }

    #[tokio::test]
    async fn subscriber_connecting_after_terminal_sees_only_terminal() {
        let bus = EventBus::new();
        let id = bus.create_task();

        bus.update_state(
            id,
            TaskState::Progress,
            ProgressMeta { current_step: Some("scrape".to_string()), ..Default::default() },
        )
        .unwrap();
        bus.update_state(
            id,
            TaskState::Failure,
            ProgressMeta { error: Some("scraper failed".to_string()), ..Default::default() },
        )
        .unwrap();

        let rx = bus.subscribe(id).unwrap();
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.state, TaskState::Failure);
        assert_eq!(snapshot.meta.error.as_deref(), Some("scraper failed"));
    }

    #[tokio::test]
    async fn updating_a_terminal_task_is_still_observable_to_late_subscribers() {
        let bus = EventBus::new();
        let id = bus.create_task();
        bus.update_state(id, TaskState::Success, ProgressMeta::default()).unwrap();

        // Even a task nobody ever subscribed to while it ran still answers truthfully.
        let snapshot = bus.current(id).unwrap();
        assert_eq!(snapshot.state, TaskState::Success);
    }
}
