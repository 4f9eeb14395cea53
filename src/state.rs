use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDateTime};

/// where the scheduling axis currently is
/// `Pending` holds the instant the wake was registered for, in local time for display
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SchedulingStatus {
    #[default]
    Unscheduled,
    Pending(DateTime<Local>),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Testing,
}

/// how an operation went wrong, kept separate from the status line so tests
/// don't have to match on message strings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    /// bad input caught before any command was issued
    #[error("invalid input: {0}")]
    Validation(String),
    /// the external service rejected or failed a request, reason is opaque
    #[error("command failed: {0}")]
    Command(String),
    /// a cancel/stop failed, local state may not match the external side
    #[error("state may be out of sync: {0}")]
    Inconsistent(String),
}

/// the single source of truth the controller mutates and the gui renders
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmState {
    pub selected_time: Option<NaiveDateTime>,
    pub scheduling: SchedulingStatus,
    pub sound_path: PathBuf,
    pub sound_enabled: bool,
    pub playback: PlaybackStatus,
    pub night_mode: bool,
    /// shown in the status bar, never read back by any logic
    pub last_message: String,
    pub last_error: Option<ControlError>,
}

impl AlarmState {
    #[must_use]
    pub fn new(sound_path: PathBuf) -> Self {
        Self {
            selected_time: None,
            scheduling: SchedulingStatus::default(),
            sound_path,
            sound_enabled: true,
            playback: PlaybackStatus::default(),
            night_mode: false,
            last_message: String::new(),
            last_error: None,
        }
    }
}

impl Default for AlarmState {
    fn default() -> Self {
        Self::new(PathBuf::new())
    }
}

type Subscriber = Box<dyn FnMut(&AlarmState)>;

/// single-writer observation cell
/// the controller is the only mutator, everyone else gets read-only snapshots
/// and a notification per publish
pub struct StateCell {
    state: AlarmState,
    revision: u64,
    subscribers: Vec<Subscriber>,
}

impl StateCell {
    #[must_use]
    pub fn new(state: AlarmState) -> Self {
        Self {
            state,
            revision: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&AlarmState) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    #[must_use]
    pub fn snapshot(&self) -> &AlarmState {
        &self.state
    }

    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// apply a mutation and publish it to every subscriber
    pub(crate) fn mutate(&mut self, mutation: impl FnOnce(&mut AlarmState)) {
        mutation(&mut self.state);
        self.revision += 1;
        for subscriber in &mut self.subscribers {
            subscriber(&self.state);
        }
    }
}

impl std::fmt::Debug for StateCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCell")
            .field("state", &self.state)
            .field("revision", &self.revision)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn defaults_are_unarmed_and_silent() {
        let state = AlarmState::default();
        assert_eq!(state.scheduling, SchedulingStatus::Unscheduled);
        assert_eq!(state.playback, PlaybackStatus::Idle);
        assert!(state.sound_enabled);
        assert!(!state.night_mode);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn every_mutation_publishes_once() {
        let mut cell = StateCell::new(AlarmState::default());
        let seen = Rc::new(Cell::new(0));
        let seen_by_subscriber = Rc::clone(&seen);
        cell.subscribe(move |_| seen_by_subscriber.set(seen_by_subscriber.get() + 1));

        cell.mutate(|state| state.night_mode = true);
        cell.mutate(|state| state.night_mode = false);

        assert_eq!(seen.get(), 2);
        assert_eq!(cell.revision(), 2);
    }

    #[test]
    fn subscribers_see_the_post_mutation_state() {
        let mut cell = StateCell::new(AlarmState::default());
        let observed = Rc::new(Cell::new(false));
        let observed_by_subscriber = Rc::clone(&observed);
        cell.subscribe(move |state| observed_by_subscriber.set(state.night_mode));

        cell.mutate(|state| state.night_mode = true);
        assert!(observed.get());
    }
}
