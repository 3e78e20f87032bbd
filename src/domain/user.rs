use super::ids::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Business,
    Rider,
}

/// Identity record. Authentication and session handling live outside the
/// engine; the core only carries the id linkage to businesses and riders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, role: Role, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::generate(),
            email,
            role,
            name,
            created_at: now,
        }
    }
}
