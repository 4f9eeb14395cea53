use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use chrono::{DateTime, Local, Utc};

use crate::audio::AlarmPlayer;
use crate::communication::{Ack, BridgeReply, BridgeRequest};
use crate::wake;

/// the four-operation command boundary to the OS side
/// each call is a single round trip, no retries, errors are opaque reason
/// strings the controller surfaces verbatim
pub trait CommandBridge: Send {
    fn schedule(&mut self, at: DateTime<Utc>) -> Result<Ack, String>;
    fn cancel(&mut self) -> Result<Ack, String>;
    fn play(&mut self, path: &Path) -> Result<Ack, String>;
    fn stop(&mut self) -> Result<Ack, String>;
}

/// run `bridge` on its own thread and shuttle requests and replies over
/// channels. the returned ends plug straight into the controller.
pub fn spawn(
    mut bridge: impl CommandBridge + 'static,
) -> (Sender<BridgeRequest>, Receiver<BridgeReply>) {
    let (request_tx, request_rx) = mpsc::channel::<BridgeRequest>();
    let (reply_tx, reply_rx) = mpsc::channel();
    thread::spawn(move || {
        while let Ok(request) = request_rx.recv() {
            let kind = request.kind();
            let outcome = match request {
                BridgeRequest::Schedule { at } => bridge.schedule(at),
                BridgeRequest::Cancel => bridge.cancel(),
                BridgeRequest::Play { path } => bridge.play(&path),
                BridgeRequest::Stop => bridge.stop(),
            };
            if let Err(ref reason) = outcome {
                log::warn!("{kind:?} failed: {reason}");
            }
            if reply_tx.send(BridgeReply::new(kind, outcome)).is_err() {
                break;
            }
        }
    });
    (request_tx, reply_rx)
}

/// talks to the actual machine, pmset/rtcwake for wakes and rodio for sound
///
/// remembers the instant it last registered because the OS wants the wake
/// named again on cancel. that mirrors the scheduler's own registry, it is
/// not controller state.
pub struct SystemBridge {
    player: AlarmPlayer,
    registered: Option<DateTime<Local>>,
}

impl SystemBridge {
    #[must_use]
    pub fn new() -> Self {
        Self {
            player: AlarmPlayer::new(),
            registered: None,
        }
    }
}

impl Default for SystemBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBridge for SystemBridge {
    fn schedule(&mut self, at: DateTime<Utc>) -> Result<Ack, String> {
        let local = at.with_timezone(&Local);
        wake::schedule_wake(local).map_err(|err| err.to_string())?;
        self.registered = Some(local);
        Ok(Ack)
    }

    fn cancel(&mut self) -> Result<Ack, String> {
        if let Some(registered) = self.registered {
            wake::cancel_wake(registered).map_err(|err| err.to_string())?;
            self.registered = None;
        }
        Ok(Ack)
    }

    fn play(&mut self, path: &Path) -> Result<Ack, String> {
        self.player.play(path).map_err(|err| err.to_string())?;
        Ok(Ack)
    }

    fn stop(&mut self) -> Result<Ack, String> {
        self.player.stop();
        Ok(Ack)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::communication::RequestKind;

    use super::*;

    #[derive(Default)]
    struct ScriptedBridge {
        fail_cancel: bool,
    }

    impl CommandBridge for ScriptedBridge {
        fn schedule(&mut self, _at: DateTime<Utc>) -> Result<Ack, String> {
            Ok(Ack)
        }

        fn cancel(&mut self) -> Result<Ack, String> {
            if self.fail_cancel {
                Err("scripted failure".to_string())
            } else {
                Ok(Ack)
            }
        }

        fn play(&mut self, _path: &Path) -> Result<Ack, String> {
            Ok(Ack)
        }

        fn stop(&mut self) -> Result<Ack, String> {
            Ok(Ack)
        }
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn worker_resolves_requests_in_submission_order() {
        let (requests, replies) = spawn(ScriptedBridge::default());
        requests
            .send(BridgeRequest::Schedule { at: Utc::now() })
            .unwrap();
        requests.send(BridgeRequest::Stop).unwrap();

        let first = replies.recv_timeout(WAIT).unwrap();
        assert_eq!(first.kind, RequestKind::Schedule);
        assert_eq!(first.outcome, Ok(Ack));

        let second = replies.recv_timeout(WAIT).unwrap();
        assert_eq!(second.kind, RequestKind::Stop);
        assert_eq!(second.outcome, Ok(Ack));
    }

    #[test]
    fn failures_cross_the_boundary_verbatim() {
        let (requests, replies) = spawn(ScriptedBridge { fail_cancel: true });
        requests.send(BridgeRequest::Cancel).unwrap();

        let reply = replies.recv_timeout(WAIT).unwrap();
        assert_eq!(reply.kind, RequestKind::Cancel);
        assert_eq!(reply.outcome, Err("scripted failure".to_string()));
    }
}
