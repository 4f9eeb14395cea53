use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// acknowledgment from the external service, carries no payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack;

/// the two independent lanes of the state machine
/// each lane has at most one request in flight at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Scheduling,
    Playback,
}

/// a command on its way to the external service
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeRequest {
    /// register a wake at an absolute instant
    Schedule { at: DateTime<Utc> },
    Cancel,
    Play { path: PathBuf },
    Stop,
}

impl BridgeRequest {
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::Schedule { .. } => RequestKind::Schedule,
            Self::Cancel => RequestKind::Cancel,
            Self::Play { .. } => RequestKind::Play,
            Self::Stop => RequestKind::Stop,
        }
    }

    #[must_use]
    pub const fn axis(&self) -> Axis {
        self.kind().axis()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Schedule,
    Cancel,
    Play,
    Stop,
}

impl RequestKind {
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::Schedule | Self::Cancel => Axis::Scheduling,
            Self::Play | Self::Stop => Axis::Playback,
        }
    }
}

/// resolution of a previously submitted request
/// failures are opaque reason strings, surfaced to the controller verbatim
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeReply {
    pub kind: RequestKind,
    pub outcome: Result<Ack, String>,
}

impl BridgeReply {
    #[must_use]
    pub const fn new(kind: RequestKind, outcome: Result<Ack, String>) -> Self {
        Self { kind, outcome }
    }
}
