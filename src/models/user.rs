use serde::{Deserialize, Serialize};

use super::{Kind, Model, Record};

/// An account. Everyone signs up as a plain user; mentors are users whose
/// role has been updated, and only role=mentor users can receive session
/// requests.
///
/// `email` is unique across all users, enforced at creation time by the
/// store. `password` holds the salted argon2 digest, never the clear text,
/// and is stripped from the outward view along with `role`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub bio: String,
    pub occupation: String,
    pub expertise: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// Build an unsaved user from signup input plus the already-hashed
    /// password. The id is assigned by the store at creation.
    pub fn from_signup(input: SignupInput, password_hash: String) -> Self {
        Self {
            id: 0,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            password: password_hash,
            address: input.address,
            bio: input.bio,
            occupation: input.occupation,
            expertise: input.expertise,
            role: Role::User,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Model for User {
    const KIND: Kind = Kind::User;

    fn id(&self) -> u64 {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }

    fn into_record(self) -> Record {
        Record::User(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::User(user) => Some(user),
            _ => None,
        }
    }

    fn excluded_fields() -> &'static [&'static str] {
        &["password", "role"]
    }
}

/// The role of a user account.
///
/// - `User`: a mentee; can request sessions and review them
/// - `Mentor`: can be assigned sessions and accept/reject them
/// - `Admin`: moderation privileges (e.g. removing reviews)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Mentor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Mentor => "mentor",
            Self::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "mentor" => Some(Self::Mentor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Input for creating a new account. `password` is the clear text; it is
/// hashed before the user is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub bio: String,
    pub occupation: String,
    pub expertise: String,
}

/// Credentials for signing in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigninInput {
    pub email: String,
    pub password: String,
}

/// Input for updating an existing user. All fields are optional for partial
/// updates; setting `role` to `mentor` is how accounts get promoted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub occupation: Option<String>,
    pub expertise: Option<String>,
    pub role: Option<Role>,
}
