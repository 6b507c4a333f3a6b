//! CRUD operations for [`Notification`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use marquee_shared::Notification;

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Insert a new notification.
    pub fn create_notification(&self, notification: &Notification) -> Result<()> {
        self.conn().execute(
            "INSERT INTO notifications (id, user_id, title, message, link, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                notification.id.to_string(),
                notification.user_id,
                notification.title,
                notification.message,
                notification.link,
                notification.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// List a user's notifications, newest first.
    pub fn list_notifications_for_user(&self, user_id: &str) -> Result<Vec<Notification>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, title, message, link, created_at
             FROM notifications
             WHERE user_id = ?1
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![user_id], row_to_notification)?;

        let mut notifications = Vec::new();
        for row in rows {
            notifications.push(row?);
        }
        Ok(notifications)
    }
}

fn row_to_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let id_str: String = row.get(0)?;
    let ts_str: String = row.get(5)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Notification {
        id,
        user_id: row.get(1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        link: row.get(4)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn list_newest_first_per_user() {
        let (_dir, db) = test_db();

        let older = Notification {
            id: Uuid::new_v4(),
            user_id: "user-a".to_string(),
            title: "New like".to_string(),
            message: "someone liked your image".to_string(),
            link: None,
            created_at: Utc::now() - Duration::minutes(5),
        };
        let newer = Notification {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            ..older.clone()
        };
        let other_user = Notification {
            id: Uuid::new_v4(),
            user_id: "user-b".to_string(),
            ..older.clone()
        };

        db.create_notification(&older).unwrap();
        db.create_notification(&newer).unwrap();
        db.create_notification(&other_user).unwrap();

        let listed = db.list_notifications_for_user("user-a").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }
}
