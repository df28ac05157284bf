use serde::{Deserialize, Serialize};

use super::{Kind, Model, Record};

/// A mentee's rating of a session, at most one per session.
///
/// Everything except `score` and `remark` is derived: `session_id`,
/// `mentor_id`, `mentee_id` and `mentee_full_name` come from the session and
/// the authenticated mentee. The outward view drops `id`; callers address
/// reviews through their session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: u64,
    pub session_id: u64,
    pub mentor_id: u64,
    pub mentee_id: u64,
    pub mentee_full_name: String,
    /// Scale of 1 - 5.
    pub score: u8,
    pub remark: String,
}

impl Model for Review {
    const KIND: Kind = Kind::Review;

    fn id(&self) -> u64 {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }

    fn into_record(self) -> Record {
        Record::Review(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::Review(review) => Some(review),
            _ => None,
        }
    }

    fn excluded_fields() -> &'static [&'static str] {
        &["id"]
    }
}

/// Input for reviewing a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewInput {
    pub score: u8,
    pub remark: String,
}
