//! CRUD operations for [`Subject`] records, including the explicit cascade
//! delete plan (children before parents).

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use marquee_shared::{Subject, SubjectKind};

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new subject.
    pub fn create_subject(&self, subject: &Subject) -> Result<()> {
        self.conn().execute(
            "INSERT INTO subjects (id, kind, owner_id, title, like_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                subject.id.to_string(),
                subject.kind.as_str(),
                subject.owner_id,
                subject.title,
                subject.like_count,
                subject.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single subject by UUID.
    pub fn get_subject(&self, id: Uuid) -> Result<Subject> {
        self.conn()
            .query_row(
                "SELECT id, kind, owner_id, title, like_count, created_at
                 FROM subjects
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_subject,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    // ------------------------------------------------------------------
    // Delete (cascade)
    // ------------------------------------------------------------------

    /// Delete a subject together with its comments and likes.
    ///
    /// The store rejects deleting a comment that still has replies, so the
    /// plan removes comment leaves in rounds until the thread is empty,
    /// then the like relations, then the subject row itself.  If the
    /// process is interrupted partway, rerunning it resumes where it
    /// stopped.
    pub fn delete_subject(&self, id: Uuid) -> Result<()> {
        // Fail early with NotFound rather than silently deleting nothing.
        let _ = self.get_subject(id)?;

        loop {
            let affected = self.conn().execute(
                "DELETE FROM comments
                 WHERE subject_id = ?1
                   AND id NOT IN (
                       SELECT parent_id FROM comments
                       WHERE subject_id = ?1 AND parent_id IS NOT NULL
                   )",
                params![id.to_string()],
            )?;
            if affected == 0 {
                break;
            }
        }

        self.conn().execute(
            "DELETE FROM likes WHERE subject_id = ?1",
            params![id.to_string()],
        )?;

        self.conn().execute(
            "DELETE FROM subjects WHERE id = ?1",
            params![id.to_string()],
        )?;

        tracing::info!(subject = %id, "subject deleted with dependents");
        Ok(())
    }
}

fn row_to_subject(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subject> {
    let id_str: String = row.get(0)?;
    let kind_str: String = row.get(1)?;
    let owner_id: String = row.get(2)?;
    let title: Option<String> = row.get(3)?;
    let like_count: Option<i64> = row.get(4)?;
    let ts_str: String = row.get(5)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let kind = SubjectKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown subject kind: {kind_str}").into(),
        )
    })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Subject {
        id,
        kind,
        owner_id,
        title,
        like_count,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_shared::Comment;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn subject(owner: &str) -> Subject {
        Subject {
            id: Uuid::new_v4(),
            kind: SubjectKind::Image,
            owner_id: owner.to_string(),
            title: Some("sunset".to_string()),
            like_count: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_get_round_trip() {
        let (_dir, db) = test_db();
        let s = subject("user-a");

        db.create_subject(&s).unwrap();
        let fetched = db.get_subject(s.id).unwrap();

        assert_eq!(fetched, s);
        assert_eq!(fetched.likes(), 0);
    }

    #[test]
    fn get_missing_is_not_found() {
        let (_dir, db) = test_db();
        assert!(matches!(
            db.get_subject(Uuid::new_v4()),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn cascade_delete_removes_nested_comments_and_likes() {
        let (_dir, db) = test_db();
        let s = subject("user-a");
        db.create_subject(&s).unwrap();

        let root = Comment {
            id: Uuid::new_v4(),
            subject_id: s.id,
            parent_id: None,
            author_id: "user-b".to_string(),
            body: "first".to_string(),
            created_at: Utc::now(),
        };
        let reply = Comment {
            id: Uuid::new_v4(),
            parent_id: Some(root.id),
            body: "reply".to_string(),
            ..root.clone()
        };
        let nested = Comment {
            id: Uuid::new_v4(),
            parent_id: Some(reply.id),
            body: "nested".to_string(),
            ..root.clone()
        };
        db.create_comment(&root).unwrap();
        db.create_comment(&reply).unwrap();
        db.create_comment(&nested).unwrap();

        db.like(s.id, "user-b").unwrap();
        db.like(s.id, "user-c").unwrap();

        db.delete_subject(s.id).unwrap();

        assert!(matches!(db.get_subject(s.id), Err(StoreError::NotFound)));
        assert!(db.list_comments_for_subject(s.id).unwrap().is_empty());
        assert!(!db.has_liked(s.id, "user-b").unwrap());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let (_dir, db) = test_db();
        assert!(matches!(
            db.delete_subject(Uuid::new_v4()),
            Err(StoreError::NotFound)
        ));
    }
}
