use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone, Utc};

use crate::communication::{Ack, Axis, BridgeReply, BridgeRequest, RequestKind};
use crate::config::SoundEditPolicy;
use crate::state::{AlarmState, ControlError, PlaybackStatus, SchedulingStatus, StateCell};

/// input shapes produced by a datetime-local style text field
const INPUT_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// a user intent waiting its turn on the scheduling lane
#[derive(Debug, Clone, PartialEq)]
enum SchedIntent {
    Schedule {
        at: DateTime<Utc>,
        local: DateTime<Local>,
    },
    Cancel,
    /// validation already failed, only the local transition is left to apply
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq)]
enum PlayIntent {
    Play { path: PathBuf },
    Stop,
    Invalid(String),
}

/// what the in-flight scheduling request was asked to do, so its reply can be
/// reconciled without guessing
#[derive(Debug, Clone, PartialEq)]
enum SchedInflight {
    Schedule {
        local: DateTime<Local>,
    },
    Cancel,
    /// first half of replacing an armed alarm, the schedule follows only on
    /// confirmed cancel success
    CancelForReschedule {
        at: DateTime<Utc>,
        local: DateTime<Local>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayInflight {
    Play,
    Stop,
}

/// the alarm lifecycle state machine
///
/// owns [`AlarmState`], validates and sequences user intents, talks to the
/// bridge worker over channels and reconciles confirmed outcomes back into
/// the state. nothing here is optimistic, an axis only moves on a reply.
pub struct AlarmController {
    cell: StateCell,
    policy: SoundEditPolicy,
    requests: Sender<BridgeRequest>,
    replies: Receiver<BridgeReply>,
    sched_inflight: Option<SchedInflight>,
    sched_queue: VecDeque<SchedIntent>,
    play_inflight: Option<PlayInflight>,
    play_queue: VecDeque<PlayIntent>,
}

impl AlarmController {
    #[must_use]
    pub fn new(
        state: AlarmState,
        policy: SoundEditPolicy,
        requests: Sender<BridgeRequest>,
        replies: Receiver<BridgeReply>,
    ) -> Self {
        Self {
            cell: StateCell::new(state),
            policy,
            requests,
            replies,
            sched_inflight: None,
            sched_queue: VecDeque::new(),
            play_inflight: None,
            play_queue: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &AlarmState {
        self.cell.snapshot()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&AlarmState) + 'static) {
        self.cell.subscribe(subscriber);
    }

    /// drain resolved bridge replies and move the queues along
    /// called once per frame, never blocks
    pub fn pump(&mut self) {
        while let Ok(reply) = self.replies.try_recv() {
            match reply.kind.axis() {
                Axis::Scheduling => self.apply_sched_reply(reply),
                Axis::Playback => self.apply_play_reply(reply),
            }
        }
    }

    /// parse `raw`, resolve it to an absolute instant and ask the external
    /// service for a wake. the local to UTC conversion happens here and only
    /// here.
    pub fn request_schedule(&mut self, raw: &str) {
        let Some(naive) = parse_input(raw) else {
            self.enqueue_sched(SchedIntent::Invalid("invalid time".to_string()));
            return;
        };
        self.cell.mutate(|state| state.selected_time = Some(naive));
        let Some(local) = resolve_local(naive) else {
            self.enqueue_sched(SchedIntent::Invalid("invalid time".to_string()));
            return;
        };
        if local <= Local::now() {
            self.enqueue_sched(SchedIntent::Invalid("time is in the past".to_string()));
            return;
        }
        let state = self.cell.snapshot();
        if state.sound_enabled && state.sound_path.as_os_str().is_empty() {
            self.enqueue_sched(SchedIntent::Invalid("no alarm sound selected".to_string()));
            return;
        }
        self.enqueue_sched(SchedIntent::Schedule {
            at: local.with_timezone(&Utc),
            local,
        });
    }

    /// cancelling with nothing armed is a successful no-op, not an error
    pub fn request_cancel(&mut self) {
        self.enqueue_sched(SchedIntent::Cancel);
    }

    /// play the current sound from the beginning, also while already testing
    pub fn request_play_test(&mut self) {
        let path = self.cell.snapshot().sound_path.clone();
        if path.as_os_str().is_empty() {
            self.enqueue_play(PlayIntent::Invalid("no alarm sound selected".to_string()));
        } else {
            self.enqueue_play(PlayIntent::Play { path });
        }
    }

    /// always issuable, stopping silence is fine on both sides of the boundary
    pub fn request_stop(&mut self) {
        self.enqueue_play(PlayIntent::Stop);
    }

    /// pure local mutation. an already armed alarm keeps the sound it was
    /// scheduled with until the user re-schedules, which the status line
    /// spells out (or the edit is refused outright, depending on policy).
    pub fn set_sound_path(&mut self, path: PathBuf) {
        let pending = matches!(self.cell.snapshot().scheduling, SchedulingStatus::Pending(_));
        if pending && self.policy == SoundEditPolicy::LockWhilePending {
            self.cell.mutate(|state| {
                state.last_message = "Sound is locked while an alarm is armed".to_string();
                state.last_error = Some(ControlError::Validation(
                    "sound is locked while an alarm is armed".to_string(),
                ));
            });
            return;
        }
        self.cell.mutate(|state| {
            state.sound_path = path;
            state.last_error = None;
            state.last_message = if pending {
                "Sound updated. The armed alarm keeps its old sound until re-scheduled".to_string()
            } else {
                "Sound updated".to_string()
            };
        });
    }

    /// pure local mutation, no command issued
    pub fn set_sound_enabled(&mut self, on: bool) {
        self.cell.mutate(|state| state.sound_enabled = on);
    }

    /// display-only transition, never talks to the external service
    pub fn set_night_mode(&mut self, on: bool) {
        self.cell.mutate(|state| state.night_mode = on);
    }

    fn enqueue_sched(&mut self, intent: SchedIntent) {
        self.sched_queue.push_back(intent);
        self.drain_sched();
    }

    fn enqueue_play(&mut self, intent: PlayIntent) {
        self.play_queue.push_back(intent);
        self.drain_play();
    }

    fn drain_sched(&mut self) {
        while self.sched_inflight.is_none() {
            let Some(intent) = self.sched_queue.pop_front() else {
                return;
            };
            self.dispatch_sched(intent);
        }
    }

    fn drain_play(&mut self) {
        while self.play_inflight.is_none() {
            let Some(intent) = self.play_queue.pop_front() else {
                return;
            };
            self.dispatch_play(intent);
        }
    }

    fn dispatch_sched(&mut self, intent: SchedIntent) {
        match intent {
            SchedIntent::Invalid(reason) => {
                log::warn!("schedule refused before reaching the bridge: {reason}");
                self.cell.mutate(|state| {
                    state.scheduling = SchedulingStatus::Failed(reason.clone());
                    state.last_message = format!("Error: {reason}");
                    state.last_error = Some(ControlError::Validation(reason));
                });
            }
            SchedIntent::Cancel => {
                if matches!(self.cell.snapshot().scheduling, SchedulingStatus::Pending(_)) {
                    if self.submit(BridgeRequest::Cancel) {
                        self.sched_inflight = Some(SchedInflight::Cancel);
                    }
                } else {
                    self.cell.mutate(|state| {
                        state.last_message = "no active schedule".to_string();
                        state.last_error = None;
                    });
                }
            }
            SchedIntent::Schedule { at, local } => {
                // never trust the external service to replace atomically,
                // an armed alarm is cancelled first and the schedule only
                // goes out once the cancel is confirmed
                if matches!(self.cell.snapshot().scheduling, SchedulingStatus::Pending(_)) {
                    if self.submit(BridgeRequest::Cancel) {
                        self.sched_inflight = Some(SchedInflight::CancelForReschedule { at, local });
                    }
                } else if self.submit(BridgeRequest::Schedule { at }) {
                    self.sched_inflight = Some(SchedInflight::Schedule { local });
                }
            }
        }
    }

    fn dispatch_play(&mut self, intent: PlayIntent) {
        match intent {
            PlayIntent::Invalid(reason) => {
                log::warn!("play refused before reaching the bridge: {reason}");
                self.cell.mutate(|state| {
                    state.last_message = format!("Error: {reason}");
                    state.last_error = Some(ControlError::Validation(reason));
                });
            }
            PlayIntent::Play { path } => {
                if self.submit(BridgeRequest::Play { path }) {
                    self.play_inflight = Some(PlayInflight::Play);
                }
            }
            PlayIntent::Stop => {
                if self.submit(BridgeRequest::Stop) {
                    self.play_inflight = Some(PlayInflight::Stop);
                }
            }
        }
    }

    fn apply_sched_reply(&mut self, reply: BridgeReply) {
        let Some(inflight) = self.sched_inflight.take() else {
            log::warn!("scheduling reply with nothing in flight: {reply:?}");
            return;
        };
        match (inflight, reply.outcome) {
            (SchedInflight::Schedule { local }, Ok(Ack)) => {
                log::info!("wake registered for {local}");
                self.cell.mutate(|state| {
                    state.scheduling = SchedulingStatus::Pending(local);
                    state.last_message =
                        format!("Alarm scheduled for {}", local.format(DISPLAY_FORMAT));
                    state.last_error = None;
                });
            }
            (SchedInflight::Schedule { .. }, Err(reason)) => {
                log::warn!("schedule rejected by the external service: {reason}");
                self.cell.mutate(|state| {
                    state.scheduling = SchedulingStatus::Failed(reason.clone());
                    state.last_message = format!("Error: {reason}");
                    state.last_error = Some(ControlError::Command(reason));
                });
            }
            (SchedInflight::Cancel, Ok(Ack)) => {
                log::info!("wake cancelled");
                self.cell.mutate(|state| {
                    state.scheduling = SchedulingStatus::Unscheduled;
                    state.last_message = "Alarm cancelled".to_string();
                    state.last_error = None;
                });
            }
            (SchedInflight::Cancel, Err(reason)) => {
                // the pending state is deliberately kept, the alarm may still
                // be armed on the external side
                log::error!("cancel failed, alarm may still be armed: {reason}");
                self.cell.mutate(|state| {
                    state.last_message = format!(
                        "Cancel failed: {reason}. The alarm may still be armed, verify manually"
                    );
                    state.last_error = Some(ControlError::Inconsistent(reason));
                });
            }
            (SchedInflight::CancelForReschedule { at, local }, Ok(Ack)) => {
                self.cell
                    .mutate(|state| state.scheduling = SchedulingStatus::Unscheduled);
                if self.submit(BridgeRequest::Schedule { at }) {
                    self.sched_inflight = Some(SchedInflight::Schedule { local });
                }
            }
            (SchedInflight::CancelForReschedule { .. }, Err(reason)) => {
                log::error!("could not replace the armed alarm: {reason}");
                self.cell.mutate(|state| {
                    state.last_message = format!(
                        "Cancel failed: {reason}. The previous alarm may still be armed, verify manually"
                    );
                    state.last_error = Some(ControlError::Inconsistent(reason));
                });
            }
        }
        self.drain_sched();
    }

    fn apply_play_reply(&mut self, reply: BridgeReply) {
        let Some(inflight) = self.play_inflight.take() else {
            log::warn!("playback reply with nothing in flight: {reply:?}");
            return;
        };
        match (inflight, reply.outcome) {
            (PlayInflight::Play, Ok(Ack)) => {
                log::info!("test playback started");
                self.cell.mutate(|state| {
                    state.playback = PlaybackStatus::Testing;
                    state.last_message = "Playing alarm...".to_string();
                    state.last_error = None;
                });
            }
            (PlayInflight::Play, Err(reason)) => {
                log::warn!("play rejected by the external service: {reason}");
                self.cell.mutate(|state| {
                    state.last_message = format!("Error: {reason}");
                    state.last_error = Some(ControlError::Command(reason));
                });
            }
            (PlayInflight::Stop, Ok(Ack)) => {
                self.cell.mutate(|state| {
                    state.playback = PlaybackStatus::Idle;
                    state.last_message = "Alarm stopped".to_string();
                    state.last_error = None;
                });
            }
            (PlayInflight::Stop, Err(reason)) => {
                log::error!("stop failed, audio may still be playing: {reason}");
                self.cell.mutate(|state| {
                    state.last_message = format!(
                        "Stop failed: {reason}. Audio may still be playing, verify manually"
                    );
                    state.last_error = Some(ControlError::Inconsistent(reason));
                });
            }
        }
        self.drain_play();
    }

    fn submit(&mut self, request: BridgeRequest) -> bool {
        let kind = request.kind();
        if self.requests.send(request).is_ok() {
            return true;
        }
        log::error!("bridge worker is gone, {kind:?} was not sent");
        self.cell.mutate(|state| {
            state.last_message = "Error: command channel closed".to_string();
            state.last_error = Some(ControlError::Command("command channel closed".to_string()));
        });
        false
    }
}

fn parse_input(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// a local wall-clock reading can name zero, one or two instants around a DST
/// switch. the gap is refused, the overlap resolves to the earlier instant.
fn resolve_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(instant) => Some(instant),
        LocalResult::Ambiguous(first, _second) => Some(first),
        LocalResult::None => None,
    }
}
