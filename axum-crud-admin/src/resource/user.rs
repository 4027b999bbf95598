use super::{Field, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An operator account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub login: String,
    /// Argon2id PHC string; never serialized
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for User {
    const TABLE: &'static str = "user";
    const NAME: &'static str = "User";
    const PLURAL: &'static str = "Users";
    const COLLECTION: &'static str = "users";
    const FIELDS: &'static [Field] = &[
        Field::text("login", "Login").min_length(3),
        Field::password("password", "Password").min_length(3),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn label(&self) -> &str {
        &self.login
    }
}
