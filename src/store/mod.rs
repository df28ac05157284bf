//! The embedded document store.
//!
//! All state lives in one flat in-memory table (the "storage universe")
//! mirrored 1:1 to a single JSON file. Keys are either `"<Kind>.<id>"` for
//! records or `"<Kind>_id_seq"` for the per-kind id counters; the whole
//! table is read on [`FileStore::reload`] and rewritten on every
//! [`FileStore::save`]. There is no per-record write path — durability of
//! any one mutation durably persists every in-memory mutation.
//!
//! The store handle is cheap to clone and shares the table behind a mutex,
//! so concurrent request handlers get read-your-writes without further
//! coordination.

mod error;

pub use error::StoreError;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::*;

/// Default backing file, relative to the working directory.
pub const DATA_FILE: &str = "data_store.json";

/// What to do when the backing file cannot be read or written.
///
/// `FailOpen` matches the availability-over-durability posture the service
/// runs with: log the fault and keep serving from memory. `FailClosed`
/// propagates the error and is what tests and stricter deployments want.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoPolicy {
    #[default]
    FailOpen,
    FailClosed,
}

/// One value in the storage universe: either a sequence counter or a
/// tagged record. Serializes to exactly the on-disk shape — a bare integer
/// or an object carrying `__class__`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Entry {
    Seq(u64),
    Record(Record),
}

type Table = BTreeMap<String, Entry>;

pub struct FileStore {
    path: PathBuf,
    policy: IoPolicy,
    table: Arc<Mutex<Table>>,
}

impl FileStore {
    /// Open a store backed by `path`, seeding the sequence counters for
    /// every kind and then loading whatever the file already holds. If the
    /// file does not exist yet, the seeded table is written out as the new
    /// file.
    pub fn open(path: impl Into<PathBuf>, policy: IoPolicy) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut table = Table::new();
        for kind in Kind::ALL {
            table.insert(kind.seq_key(), Entry::Seq(0));
        }

        let store = Self {
            path,
            policy,
            table: Arc::new(Mutex::new(table)),
        };
        store.reload()?;
        Ok(store)
    }

    /// Open the store at `./data_store.json` with the fail-open policy.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(std::env::current_dir()?.join(DATA_FILE), IoPolicy::FailOpen)
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().expect("store lock poisoned")
    }

    // ============================================================
    // Persistence boundary
    // ============================================================

    /// Re-read the backing file into the table, additively: entries from
    /// disk overwrite same-keyed entries in memory, everything else stays.
    ///
    /// Objects carrying a recognized `__class__` tag are reconstructed as
    /// typed records; bare integers are installed as sequence counters;
    /// anything else is skipped with a warning. A missing file is not an
    /// error — the current table is written out as the new file instead.
    pub fn reload(&self) -> Result<(), StoreError> {
        let mut table = self.lock();

        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return self.write_table(&table);
            }
            Err(err) => return self.absorb("reload", err.into()),
        };

        let doc: Map<String, Value> = match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(err) => return self.absorb("reload", err.into()),
        };

        for (key, value) in doc {
            match value {
                Value::Object(_) => match serde_json::from_value::<Record>(value) {
                    Ok(record) => {
                        table.insert(key, Entry::Record(record));
                    }
                    Err(err) => {
                        tracing::warn!(%key, "skipping unrecognized record on reload: {err}");
                    }
                },
                Value::Number(n) => match n.as_u64() {
                    Some(seq) => {
                        table.insert(key, Entry::Seq(seq));
                    }
                    None => {
                        tracing::warn!(%key, "skipping non-integer counter on reload");
                    }
                },
                _ => {
                    tracing::warn!(%key, "skipping unrecognized entry on reload");
                }
            }
        }

        Ok(())
    }

    /// Serialize the entire universe to the backing file. Always writes the
    /// whole table: any in-memory mutation anywhere becomes durable on any
    /// single `save`. Under `FailOpen` this never returns an error.
    pub fn save(&self) -> Result<(), StoreError> {
        let table = self.lock();
        self.write_table(&table)
    }

    /// Flush the store at orderly shutdown. Equivalent to [`Self::save`].
    pub fn close(&self) -> Result<(), StoreError> {
        self.save()
    }

    /// Write the table atomically: temp file in the same directory, then
    /// rename over the backing file, so a crash mid-write cannot leave a
    /// truncated document.
    fn write_table(&self, table: &Table) -> Result<(), StoreError> {
        match self.try_write(table) {
            Ok(()) => Ok(()),
            Err(err) => self.absorb("save", err),
        }
    }

    fn try_write(&self, table: &Table) -> Result<(), StoreError> {
        let json = serde_json::to_string(table)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn absorb(&self, op: &str, err: StoreError) -> Result<(), StoreError> {
        match self.policy {
            IoPolicy::FailOpen => {
                tracing::warn!("store {op} failed, continuing on in-memory state: {err}");
                Ok(())
            }
            IoPolicy::FailClosed => Err(err),
        }
    }

    // ============================================================
    // Base contract (generic over kind)
    // ============================================================

    /// Allocate the next sequence id, install the record, and persist the
    /// universe. The sole id-allocation path; ids start at 1 and are never
    /// reused. A missing counter means the backing document is malformed
    /// and surfaces as [`StoreError::SequenceMissing`].
    pub fn create<M: Model>(&self, model: M) -> Result<M, StoreError> {
        let mut table = self.lock();
        self.create_in(&mut table, model)
    }

    fn create_in<M: Model>(&self, table: &mut Table, mut model: M) -> Result<M, StoreError> {
        let id = next_seq(table, M::KIND)?;
        model.assign_id(id);
        table.insert(M::KIND.record_key(id), Entry::Record(model.clone().into_record()));
        self.write_table(table)?;
        Ok(model)
    }

    /// All records of the kind whose named fields all strictly equal the
    /// predicate values (conjunctive). An empty predicate matches every
    /// record of the kind. Full scan; there is no indexing at this scale.
    /// Field names follow the wire spelling (`"menteeId"`, not `mentee_id`).
    pub fn filter_by<M: Model>(&self, predicate: &Map<String, Value>) -> Vec<M> {
        let table = self.lock();
        records_of::<M>(&table)
            .filter(|model| matches_predicate(model, predicate))
            .collect()
    }

    /// First `filter_by({id})` match, or `None`. Absence is never an error.
    pub fn get_by_id<M: Model>(&self, id: u64) -> Option<M> {
        let mut predicate = Map::new();
        predicate.insert("id".to_string(), Value::from(id));
        self.filter_by::<M>(&predicate).into_iter().next()
    }

    /// Install (or overwrite) a record at its key without allocating an id
    /// and without persisting. Callers follow up with [`Self::save`].
    pub fn insert<M: Model>(&self, model: M) {
        let mut table = self.lock();
        table.insert(
            M::KIND.record_key(model.id()),
            Entry::Record(model.into_record()),
        );
    }

    /// Remove one record by key and persist. Targeted: no other in-memory
    /// state is touched or re-read. Returns whether the record existed.
    pub fn delete<M: Model>(&self, id: u64) -> Result<bool, StoreError> {
        let mut table = self.lock();
        let removed = table.remove(&M::KIND.record_key(id)).is_some();
        if removed {
            self.write_table(&table)?;
        }
        Ok(removed)
    }

    // ============================================================
    // User operations
    // ============================================================

    /// Create a user, enforcing email uniqueness. The check and the insert
    /// run under one lock, so concurrent signups cannot race past it.
    pub fn create_user(
        &self,
        input: SignupInput,
        password_hash: String,
    ) -> Result<User, StoreError> {
        let mut table = self.lock();
        let taken = records_of::<User>(&table).any(|u| u.email == input.email);
        if taken {
            return Err(StoreError::DuplicateEmail(input.email));
        }
        self.create_in(&mut table, User::from_signup(input, password_hash))
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        let mut predicate = Map::new();
        predicate.insert("email".to_string(), Value::from(email));
        self.filter_by::<User>(&predicate).into_iter().next()
    }

    /// Partial update; `None` fields keep their current value. Changing the
    /// email re-checks uniqueness against every other user.
    pub fn update_user(&self, id: u64, input: UpdateUserInput) -> Result<Option<User>, StoreError> {
        let mut table = self.lock();

        let Some(existing) = record_at::<User>(&table, id) else {
            return Ok(None);
        };

        let email = input.email.unwrap_or_else(|| existing.email.clone());
        if email != existing.email {
            let taken = records_of::<User>(&table).any(|u| u.id != id && u.email == email);
            if taken {
                return Err(StoreError::DuplicateEmail(email));
            }
        }

        let updated = User {
            id,
            first_name: input.first_name.unwrap_or(existing.first_name),
            last_name: input.last_name.unwrap_or(existing.last_name),
            email,
            password: existing.password,
            address: input.address.unwrap_or(existing.address),
            bio: input.bio.unwrap_or(existing.bio),
            occupation: input.occupation.unwrap_or(existing.occupation),
            expertise: input.expertise.unwrap_or(existing.expertise),
            role: input.role.unwrap_or(existing.role),
        };

        table.insert(
            Kind::User.record_key(id),
            Entry::Record(updated.clone().into_record()),
        );
        self.write_table(&table)?;
        Ok(Some(updated))
    }

    pub fn list_mentors(&self) -> Vec<User> {
        let mut predicate = Map::new();
        predicate.insert("role".to_string(), Value::from(Role::Mentor.as_str()));
        self.filter_by::<User>(&predicate)
    }

    pub fn get_mentor(&self, id: u64) -> Option<User> {
        self.get_by_id::<User>(id)
            .filter(|u| u.role == Role::Mentor)
    }

    // ============================================================
    // Session operations
    // ============================================================

    /// Create a session request from `mentee` to the mentor named in the
    /// input. The mentor must exist and actually hold the mentor role.
    pub fn create_session(
        &self,
        mentee: &User,
        input: CreateSessionInput,
    ) -> Result<Session, StoreError> {
        let mut table = self.lock();

        let mentor_exists = records_of::<User>(&table)
            .any(|u| u.id == input.mentor_id && u.role == Role::Mentor);
        if !mentor_exists {
            return Err(StoreError::MentorNotFound(input.mentor_id));
        }

        let session = Session {
            id: 0,
            mentor_id: input.mentor_id,
            mentee_id: mentee.id,
            questions: input.questions,
            mentee_email: mentee.email.clone(),
            status: SessionStatus::Pending,
        };
        self.create_in(&mut table, session)
    }

    /// Write a status decision. Only `pending → {accepted, rejected}` moves
    /// are allowed; a terminal status never reverts (re-writing the same
    /// terminal status is a no-op, not an error). `None` if the session
    /// does not exist.
    pub fn set_session_status(
        &self,
        id: u64,
        status: SessionStatus,
    ) -> Result<Option<Session>, StoreError> {
        let mut table = self.lock();

        let Some(mut session) = record_at::<Session>(&table, id) else {
            return Ok(None);
        };

        if session.status.is_terminal() && status != session.status {
            return Err(StoreError::InvalidTransition {
                from: session.status,
                to: status,
            });
        }

        session.status = status;
        table.insert(
            Kind::Session.record_key(id),
            Entry::Record(session.clone().into_record()),
        );
        self.write_table(&table)?;
        Ok(Some(session))
    }

    pub fn sessions_for_mentee(&self, mentee_id: u64) -> Vec<Session> {
        let mut predicate = Map::new();
        predicate.insert("menteeId".to_string(), Value::from(mentee_id));
        self.filter_by::<Session>(&predicate)
    }

    pub fn sessions_for_mentor(&self, mentor_id: u64) -> Vec<Session> {
        let mut predicate = Map::new();
        predicate.insert("mentorId".to_string(), Value::from(mentor_id));
        self.filter_by::<Session>(&predicate)
    }

    // ============================================================
    // Review operations
    // ============================================================

    /// Record the mentee's review of a session. At most one review exists
    /// per session; the caller has already verified that `mentee` is the
    /// session's mentee.
    pub fn create_review(
        &self,
        session: &Session,
        mentee: &User,
        input: ReviewInput,
    ) -> Result<Review, StoreError> {
        let mut table = self.lock();

        let reviewed = records_of::<Review>(&table).any(|r| r.session_id == session.id);
        if reviewed {
            return Err(StoreError::AlreadyReviewed(session.id));
        }

        let review = Review {
            id: 0,
            session_id: session.id,
            mentor_id: session.mentor_id,
            mentee_id: mentee.id,
            mentee_full_name: mentee.full_name(),
            score: input.score,
            remark: input.remark,
        };
        self.create_in(&mut table, review)
    }

    pub fn review_for_session(&self, session_id: u64) -> Option<Review> {
        let mut predicate = Map::new();
        predicate.insert("sessionId".to_string(), Value::from(session_id));
        self.filter_by::<Review>(&predicate).into_iter().next()
    }

    /// Remove the review attached to a session, if any.
    pub fn delete_session_review(&self, session_id: u64) -> Result<bool, StoreError> {
        let mut table = self.lock();

        let found = records_of::<Review>(&table)
            .find(|r| r.session_id == session_id)
            .map(|r| r.id);
        let Some(review_id) = found else {
            return Ok(false);
        };

        table.remove(&Kind::Review.record_key(review_id));
        self.write_table(&table)?;
        Ok(true)
    }
}

impl Clone for FileStore {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            policy: self.policy,
            table: self.table.clone(),
        }
    }
}

/// Pre-increment the kind's counter and return the new value, so the first
/// issued id is 1.
fn next_seq(table: &mut Table, kind: Kind) -> Result<u64, StoreError> {
    let key = kind.seq_key();
    match table.get_mut(&key) {
        Some(Entry::Seq(seq)) => {
            *seq += 1;
            Ok(*seq)
        }
        _ => Err(StoreError::SequenceMissing(key)),
    }
}

/// Typed records of one kind, in key order.
fn records_of<M: Model>(table: &Table) -> impl Iterator<Item = M> + '_ {
    let prefix = M::KIND.key_prefix();
    table.iter().filter_map(move |(key, entry)| {
        if !key.starts_with(&prefix) {
            return None;
        }
        match entry {
            Entry::Record(record) => M::from_record(record.clone()),
            Entry::Seq(_) => None,
        }
    })
}

fn record_at<M: Model>(table: &Table, id: u64) -> Option<M> {
    match table.get(&M::KIND.record_key(id)) {
        Some(Entry::Record(record)) => M::from_record(record.clone()),
        _ => None,
    }
}

/// Strict equality on the record's wire fields, conjunctive across every
/// predicate entry.
fn matches_predicate<M: Model>(model: &M, predicate: &Map<String, Value>) -> bool {
    let fields = match serde_json::to_value(model) {
        Ok(Value::Object(map)) => map,
        _ => return false,
    };
    predicate
        .iter()
        .all(|(key, value)| fields.get(key) == Some(value))
}
