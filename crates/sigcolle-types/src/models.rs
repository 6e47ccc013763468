use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A petition. `statement` is already-rendered HTML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub title: String,
    pub goal: i64,
    pub statement: String,
    pub create_user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// The authenticated identity attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginPrincipal {
    pub user_id: i64,
    pub name: String,
}
