use crate::Database;
use crate::models::NotificationRow;
use anyhow::Result;

use super::OptionalExt;

/// Outcome of a mark-read attempt, so the API layer can distinguish a
/// missing row from someone else's row.
#[derive(Debug, PartialEq, Eq)]
pub enum MarkReadOutcome {
    Updated,
    NotOwner,
    Missing,
}

impl Database {
    pub fn insert_notification(
        &self,
        id: &str,
        user_id: &str,
        kind: &str,
        title: &str,
        message: &str,
        metadata: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, user_id, kind, title, message, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, user_id, kind, title, message, metadata],
            )?;
            Ok(())
        })
    }

    pub fn list_notifications(&self, user_id: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, kind, title, message, metadata, is_read, created_at
                 FROM notifications WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        kind: row.get(2)?,
                        title: row.get(3)?,
                        message: row.get(4)?,
                        metadata: row.get(5)?,
                        is_read: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn unread_notification_count(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Idempotent: marking an already-read notification is a no-op success.
    pub fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<MarkReadOutcome> {
        self.with_conn_mut(|conn| {
            let owner: Option<String> = conn
                .query_row(
                    "SELECT user_id FROM notifications WHERE id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;

            match owner {
                None => Ok(MarkReadOutcome::Missing),
                Some(owner) if owner != user_id => Ok(MarkReadOutcome::NotOwner),
                Some(_) => {
                    conn.execute("UPDATE notifications SET is_read = 1 WHERE id = ?1", [id])?;
                    Ok(MarkReadOutcome::Updated)
                }
            }
        })
    }

    pub fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
                [user_id],
            )?;
            Ok(changed)
        })
    }
}
