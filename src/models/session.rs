use serde::{Deserialize, Serialize};

use super::{Kind, Model, Record};

/// A mentee's request for time with a mentor.
///
/// `mentor_id` must reference a role=mentor user at creation time; the store
/// checks this before allocating an id. `mentee_id` and `mentee_email` are
/// taken from the authenticated requester, never from the request body.
///
/// The outward view renames `id` to `sessionId`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: u64,
    pub mentor_id: u64,
    pub mentee_id: u64,
    pub questions: String,
    pub mentee_email: String,
    #[serde(default)]
    pub status: SessionStatus,
}

impl Model for Session {
    const KIND: Kind = Kind::Session;

    fn id(&self) -> u64 {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }

    fn into_record(self) -> Record {
        Record::Session(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::Session(session) => Some(session),
            _ => None,
        }
    }

    fn renamed_fields() -> &'static [(&'static str, &'static str)] {
        &[("id", "sessionId")]
    }
}

/// The status of a session request.
///
/// `Pending` is the only initial state. `Accepted` and `Rejected` are
/// terminal: once a mentor has decided, the store refuses writes that would
/// move the session back to `Pending`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Input for requesting a session. The mentee's identity comes from the
/// auth token, so only the mentor and the questions are supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionInput {
    pub mentor_id: u64,
    pub questions: String,
}
