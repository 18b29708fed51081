//! Same-session change notifications.
//!
//! Any service that mutates persisted progress or quiz state publishes a
//! signal here, so other live views can re-derive unlock state without a
//! reload. The hub is owned by the application root and cloned into every
//! mutating service; there is no hidden global channel.

use campus_core::model::CourseId;
use tokio::sync::broadcast;

/// What changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    ProgressChanged,
    QuizStateChanged,
}

/// A change notification scoped to one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSignal {
    pub course_id: CourseId,
    pub kind: SignalKind,
}

/// Broadcast channel for [`StateSignal`]s.
#[derive(Debug, Clone)]
pub struct SignalHub {
    sender: broadcast::Sender<StateSignal>,
}

impl Default for SignalHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHub {
    #[must_use]
    pub fn new() -> Self {
        // Slow subscribers lag rather than block publishers.
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Publishes a signal to all current subscribers.
    ///
    /// Publishing with no subscribers is not an error; mutations must not
    /// depend on anyone listening.
    pub fn publish(&self, course_id: &CourseId, kind: SignalKind) {
        let _ = self.sender.send(StateSignal {
            course_id: course_id.clone(),
            kind,
        });
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateSignal> {
        self.sender.subscribe()
    }
}
