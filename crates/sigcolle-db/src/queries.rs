//! Queries take a plain `&Connection` so they run the same way inside
//! `Database::with_conn` and `Database::transaction`.

use crate::models::{CampaignRow, NewCampaign, NewSignature, SignatureRow, UserRow};
use crate::{Database, DbError};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<i64> {
        self.transaction(|tx| insert_user(tx, name, email, password_hash))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| select_user_by_email(conn, email))
    }
}

// -- Users --

pub fn insert_user(conn: &Connection, name: &str, email: &str, password_hash: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (name, email, password) VALUES (?1, ?2, ?3)",
        (name, email, password_hash),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn select_user_by_id(conn: &Connection, id: i64) -> Result<UserRow> {
    query_user(
        conn,
        "SELECT id, name, email, password, created_at FROM users WHERE id = ?1",
        rusqlite::params![id],
    )?
    .ok_or_else(|| DbError::NotFound { entity: "user", id }.into())
}

pub fn select_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    query_user(
        conn,
        "SELECT id, name, email, password, created_at FROM users WHERE email = ?1",
        rusqlite::params![email],
    )
}

fn query_user(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(sql)?;

    let row = stmt
        .query_row(params, |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

// -- Campaigns --

pub fn insert_campaign(conn: &Connection, campaign: &NewCampaign<'_>) -> Result<i64> {
    conn.execute(
        "INSERT INTO campaigns (title, statement, goal, create_user_id) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            campaign.title,
            campaign.statement,
            campaign.goal,
            campaign.create_user_id
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn select_campaign_by_id(conn: &Connection, id: i64) -> Result<CampaignRow> {
    let mut stmt = conn.prepare(
        "SELECT id, title, statement, goal, create_user_id, created_at FROM campaigns WHERE id = ?1",
    )?;

    stmt.query_row([id], |row| {
        Ok(CampaignRow {
            id: row.get(0)?,
            title: row.get(1)?,
            statement: row.get(2)?,
            goal: row.get(3)?,
            create_user_id: row.get(4)?,
            created_at: row.get(5)?,
        })
    })
    .optional()?
    .ok_or_else(|| DbError::NotFound { entity: "campaign", id }.into())
}

// -- Signatures --

pub fn insert_signature(conn: &Connection, signature: &NewSignature<'_>) -> Result<i64> {
    conn.execute(
        "INSERT INTO signatures (campaign_id, name, signature_comment) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            signature.campaign_id,
            signature.name,
            signature.signature_comment
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn count_signatures_by_campaign_id(conn: &Connection, campaign_id: i64) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM signatures WHERE campaign_id = ?1",
        [campaign_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn select_signatures_by_campaign_id(
    conn: &Connection,
    campaign_id: i64,
) -> Result<Vec<SignatureRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, campaign_id, name, signature_comment, created_at
         FROM signatures
         WHERE campaign_id = ?1
         ORDER BY id",
    )?;

    let rows = stmt
        .query_map([campaign_id], |row| {
            Ok(SignatureRow {
                id: row.get(0)?,
                campaign_id: row.get(1)?,
                name: row.get(2)?,
                signature_comment: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
