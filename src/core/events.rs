//! Events emitted by the runtime

use super::state::TriggerState;

/// Something observable happened during a frame
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    /// An achievement's trigger moved to a new state
    AchievementStateChanged { id: u32, state: TriggerState },
    /// An achievement unlocked
    AchievementTriggered { id: u32 },
    /// A leaderboard attempt began
    LeaderboardStarted { id: u32, value: u32 },
    /// A leaderboard attempt was abandoned
    LeaderboardCanceled { id: u32, value: u32 },
    /// A leaderboard attempt finished with `value`
    LeaderboardSubmitted { id: u32, value: u32 },
}

impl RuntimeEvent {
    /// Achievement or leaderboard id the event refers to
    pub fn id(&self) -> u32 {
        match *self {
            RuntimeEvent::AchievementStateChanged { id, .. }
            | RuntimeEvent::AchievementTriggered { id }
            | RuntimeEvent::LeaderboardStarted { id, .. }
            | RuntimeEvent::LeaderboardCanceled { id, .. }
            | RuntimeEvent::LeaderboardSubmitted { id, .. } => id,
        }
    }
}

/// Callback type for runtime events
pub type EventCallback = Box<dyn Fn(RuntimeEvent) + Send + Sync>;

/// Event handler that can have multiple listeners
pub struct EventHandler {
    callbacks: Vec<EventCallback>,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Add a listener
    pub fn on_event(&mut self, callback: EventCallback) {
        self.callbacks.push(callback);
    }

    /// Deliver an event to every listener
    pub fn emit(&self, event: RuntimeEvent) {
        for callback in &self.callbacks {
            callback(event.clone());
        }
    }

    pub fn has_listeners(&self) -> bool {
        !self.callbacks.is_empty()
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_emit_reaches_every_listener() {
        let count = Arc::new(AtomicU32::new(0));
        let mut handler = EventHandler::new();
        assert!(!handler.has_listeners());

        for _ in 0..2 {
            let count = Arc::clone(&count);
            handler.on_event(Box::new(move |event| {
                assert_eq!(event.id(), 7);
                count.fetch_add(1, Ordering::SeqCst);
            }));
        }

        handler.emit(RuntimeEvent::AchievementTriggered { id: 7 });
        assert!(handler.has_listeners());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
