//! Database row types. These map directly to SQLite rows.
//! Distinct from sigcolle-types models to keep the DB layer independent.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use sigcolle_types::models::{Campaign, User};

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct CampaignRow {
    pub id: i64,
    pub title: String,
    pub statement: String,
    pub goal: i64,
    pub create_user_id: i64,
    pub created_at: String,
}

pub struct SignatureRow {
    pub id: i64,
    pub campaign_id: i64,
    pub name: String,
    pub signature_comment: Option<String>,
    pub created_at: String,
}

/// Insert payloads; identifiers and timestamps are assigned by SQLite.
pub struct NewCampaign<'a> {
    pub title: &'a str,
    pub statement: &'a str,
    pub goal: i64,
    pub create_user_id: i64,
}

pub struct NewSignature<'a> {
    pub campaign_id: i64,
    pub name: &'a str,
    pub signature_comment: Option<&'a str>,
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}': {}", raw, e);
            DateTime::default()
        })
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

impl From<CampaignRow> for Campaign {
    fn from(row: CampaignRow) -> Self {
        Campaign {
            id: row.id,
            title: row.title,
            goal: row.goal,
            statement: row.statement,
            create_user_id: row.create_user_id,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}
