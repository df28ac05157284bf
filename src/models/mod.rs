//! Domain models for MentorMesh.
//!
//! # Core Concepts
//!
//! Every persisted entity is a [`Record`] of one of three [`Kind`]s:
//!
//! - [`User`]: an account; starts as a plain user and can be promoted to
//!   mentor (or admin).
//! - [`Session`]: a mentee's request for time with a mentor, moving from
//!   `pending` to `accepted` or `rejected`.
//! - [`Review`]: a mentee's 1–5 rating of a session, at most one per session.
//!
//! Each kind has two JSON representations: the **storage view** (every
//! declared field plus `id` and a `__class__` discriminator, written to the
//! backing file) and the **outward view** (what API callers see — the User's
//! password hash and role are stripped, the Session's `id` is renamed to
//! `sessionId`, the Review's `id` is dropped entirely).

mod review;
mod session;
mod user;

pub use review::*;
pub use session::*;
pub use user::*;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// The closed set of persisted entity kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Kind {
    User,
    Session,
    Review,
}

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::User, Kind::Session, Kind::Review];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Session => "Session",
            Self::Review => "Review",
        }
    }

    /// Key of this kind's sequence counter in the storage universe.
    pub fn seq_key(&self) -> String {
        format!("{}_id_seq", self.as_str())
    }

    /// Storage key for a record of this kind.
    pub fn record_key(&self, id: u64) -> String {
        format!("{}.{}", self.as_str(), id)
    }

    /// Prefix shared by every record key of this kind.
    pub fn key_prefix(&self) -> String {
        format!("{}.", self.as_str())
    }
}

/// One persisted record.
///
/// The `__class__` tag on the wire selects the variant, which is how the
/// store reconstructs concrete types when reloading the flat document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "__class__")]
pub enum Record {
    User(User),
    Session(Session),
    Review(Review),
}

impl Record {
    pub fn kind(&self) -> Kind {
        match self {
            Self::User(_) => Kind::User,
            Self::Session(_) => Kind::Session,
            Self::Review(_) => Kind::Review,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Self::User(u) => u.id,
            Self::Session(s) => s.id,
            Self::Review(r) => r.id,
        }
    }
}

/// Behavior shared by every entity kind: a stable kind tag, an id slot
/// assigned once at creation, and the outward-view projection rules.
pub trait Model: Clone + Serialize + DeserializeOwned + Sized {
    const KIND: Kind;

    fn id(&self) -> u64;

    /// Called exactly once, by the store, with a freshly allocated sequence id.
    fn assign_id(&mut self, id: u64);

    fn into_record(self) -> Record;

    fn from_record(record: Record) -> Option<Self>;

    /// Field names stripped from the outward view.
    fn excluded_fields() -> &'static [&'static str] {
        &[]
    }

    /// Field renames applied to the outward view, as `(from, to)` pairs.
    fn renamed_fields() -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// The representation returned to API callers: the declared fields minus
    /// this kind's exclusions, with renames applied. Exclusion matches on the
    /// field name itself, never on positions. The `__class__` discriminator
    /// is a storage concern and never appears here.
    fn outward_view(&self) -> Map<String, Value> {
        let mut fields = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for name in Self::excluded_fields() {
            fields.remove(*name);
        }
        for (from, to) in Self::renamed_fields() {
            if let Some(value) = fields.remove(*from) {
                fields.insert((*to).to_string(), value);
            }
        }
        fields
    }
}
