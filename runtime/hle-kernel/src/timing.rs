//! Timed-event queue
//!
//! Subsystems register named event types at init and schedule events a number
//! of cycles into the future. Time only moves when [`EventScheduler::advance`]
//! is called, which keeps tests deterministic.

use thiserror::Error;

/// Index of a registered event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventTypeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimingError {
    #[error("event type {0:?} is not registered")]
    UnknownEventType(EventTypeId),
}

/// An event that has come due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredEvent {
    pub event_type: EventTypeId,
    pub time: u64,
    pub userdata: u64,
}

/// Pending timed events, ordered by due time
#[derive(Debug, Default)]
pub struct EventScheduler {
    types: Vec<String>,
    // Sorted by time; events due at the same time keep scheduling order
    pending: Vec<FiredEvent>,
    now: u64,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named event type
    pub fn register_event(&mut self, name: &str) -> EventTypeId {
        self.types.push(name.to_owned());
        EventTypeId(self.types.len() - 1)
    }

    pub fn event_name(&self, id: EventTypeId) -> Option<&str> {
        self.types.get(id.0).map(String::as_str)
    }

    /// Schedule `event_type` to fire `cycles` from now
    ///
    /// # Errors
    /// `UnknownEventType` if the type was never registered or the registry
    /// has been wiped by `unregister_all`.
    pub fn schedule(
        &mut self,
        event_type: EventTypeId,
        cycles: u64,
        userdata: u64,
    ) -> Result<(), TimingError> {
        if event_type.0 >= self.types.len() {
            return Err(TimingError::UnknownEventType(event_type));
        }
        let time = self.now.saturating_add(cycles);
        let at = self.pending.partition_point(|event| event.time <= time);
        self.pending.insert(
            at,
            FiredEvent {
                event_type,
                time,
                userdata,
            },
        );
        Ok(())
    }

    /// Drop pending events of `event_type` carrying `userdata`
    ///
    /// # Returns
    /// How many events were removed
    pub fn unschedule(&mut self, event_type: EventTypeId, userdata: u64) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|event| !(event.event_type == event_type && event.userdata == userdata));
        before - self.pending.len()
    }

    /// Move time forward and return every event that came due, in order
    pub fn advance(&mut self, cycles: u64) -> Vec<FiredEvent> {
        self.now = self.now.saturating_add(cycles);
        let due = self.pending.partition_point(|event| event.time <= self.now);
        self.pending.drain(..due).collect()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn registered_count(&self) -> usize {
        self.types.len()
    }

    /// Drop every pending event
    pub fn clear_pending(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("Dropping {} pending timed events", self.pending.len());
        }
        self.pending.clear();
    }

    /// Forget every registered event type
    ///
    /// Pending events must be cleared first; ids handed out earlier become
    /// invalid.
    pub fn unregister_all(&mut self) {
        if !self.pending.is_empty() {
            log::warn!(
                "Unregistering event types with {} events still pending",
                self.pending.len()
            );
            self.pending.clear();
        }
        self.types.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_fire_in_time_order() {
        let mut events = EventScheduler::new();
        let vblank = events.register_event("vblank");
        let alarm = events.register_event("alarm");

        events.schedule(alarm, 300, 7).unwrap();
        events.schedule(vblank, 100, 0).unwrap();
        events.schedule(vblank, 300, 1).unwrap();

        let fired = events.advance(150);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].event_type, vblank);

        let fired = events.advance(150);
        // Same due time keeps scheduling order
        assert_eq!(fired.iter().map(|e| e.userdata).collect::<Vec<_>>(), vec![7, 1]);
        assert_eq!(events.pending_count(), 0);
        assert_eq!(events.now(), 300);
    }

    #[test]
    fn test_unschedule() {
        let mut events = EventScheduler::new();
        let alarm = events.register_event("alarm");
        events.schedule(alarm, 10, 1).unwrap();
        events.schedule(alarm, 20, 2).unwrap();
        assert_eq!(events.unschedule(alarm, 1), 1);
        assert_eq!(events.pending_count(), 1);
    }

    #[test]
    fn test_unknown_event_type() {
        let mut events = EventScheduler::new();
        let alarm = events.register_event("alarm");
        events.unregister_all();
        assert_eq!(
            events.schedule(alarm, 10, 0),
            Err(TimingError::UnknownEventType(alarm))
        );
        assert_eq!(events.event_name(alarm), None);
    }

    #[test]
    fn test_clear_pending_keeps_types() {
        let mut events = EventScheduler::new();
        let alarm = events.register_event("alarm");
        events.schedule(alarm, 10, 0).unwrap();
        events.clear_pending();
        assert_eq!(events.pending_count(), 0);
        assert_eq!(events.registered_count(), 1);
        assert_eq!(events.event_name(alarm), Some("alarm"));
    }
}
