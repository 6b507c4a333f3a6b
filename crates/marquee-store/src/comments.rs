//! CRUD operations for [`Comment`] records.
//!
//! Comments are created by user action and never mutated afterwards except
//! for their body (edit).  Deleting a comment that still has replies is
//! rejected; callers must delete the thread bottom-up (or use the
//! subject-level cascade).

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use marquee_shared::Comment;

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new comment.
    ///
    /// The subject must exist.  When `parent_id` is set, the parent must
    /// exist and belong to the same subject.
    pub fn create_comment(&self, comment: &Comment) -> Result<()> {
        let _ = self.get_subject(comment.subject_id)?;

        if let Some(parent_id) = comment.parent_id {
            let parent = self.get_comment(parent_id)?;
            if parent.subject_id != comment.subject_id {
                return Err(StoreError::ParentSubjectMismatch);
            }
        }

        self.conn().execute(
            "INSERT INTO comments (id, subject_id, parent_id, author_id, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                comment.id.to_string(),
                comment.subject_id.to_string(),
                comment.parent_id.map(|p| p.to_string()),
                comment.author_id,
                comment.body,
                comment.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single comment by UUID.
    pub fn get_comment(&self, id: Uuid) -> Result<Comment> {
        self.conn()
            .query_row(
                "SELECT id, subject_id, parent_id, author_id, body, created_at
                 FROM comments WHERE id = ?1",
                params![id.to_string()],
                row_to_comment,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List every comment on a subject, ascending by creation time.
    ///
    /// This flat list is what the tree builder consumes; the ordering here
    /// is what guarantees creation order in the assembled tree.
    pub fn list_comments_for_subject(&self, subject_id: Uuid) -> Result<Vec<Comment>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, subject_id, parent_id, author_id, body, created_at
             FROM comments
             WHERE subject_id = ?1
             ORDER BY created_at ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![subject_id.to_string()], row_to_comment)?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Replace a comment's body (edit).
    pub fn update_comment_body(&self, id: Uuid, body: &str) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE comments SET body = ?1 WHERE id = ?2",
            params![body, id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a comment.
    ///
    /// Fails with [`StoreError::HasReplies`] when other comments still
    /// reference this one as their parent.
    pub fn delete_comment(&self, id: Uuid) -> Result<()> {
        let children: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM comments WHERE parent_id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        if children > 0 {
            return Err(StoreError::HasReplies);
        }

        let affected = self.conn().execute(
            "DELETE FROM comments WHERE id = ?1",
            params![id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    let id_str: String = row.get(0)?;
    let subject_id_str: String = row.get(1)?;
    let parent_id_str: Option<String> = row.get(2)?;
    let author_id: String = row.get(3)?;
    let body: String = row.get(4)?;
    let ts_str: String = row.get(5)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let subject_id = Uuid::parse_str(&subject_id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let parent_id = match parent_id_str {
        Some(s) => Some(Uuid::parse_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Comment {
        id,
        subject_id,
        parent_id,
        author_id,
        body,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use marquee_shared::{build_comment_tree, Subject, SubjectKind};

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn make_subject(db: &Database) -> Subject {
        let s = Subject {
            id: Uuid::new_v4(),
            kind: SubjectKind::Post,
            owner_id: "owner".to_string(),
            title: None,
            like_count: None,
            created_at: Utc::now(),
        };
        db.create_subject(&s).unwrap();
        s
    }

    fn make_comment(subject_id: Uuid, parent_id: Option<Uuid>, n: i64) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            subject_id,
            parent_id,
            author_id: format!("user-{n}"),
            body: format!("comment {n}"),
            created_at: Utc::now() + Duration::milliseconds(n),
        }
    }

    #[test]
    fn create_and_list_in_creation_order() {
        let (_dir, db) = test_db();
        let s = make_subject(&db);

        let c1 = make_comment(s.id, None, 1);
        let c2 = make_comment(s.id, None, 2);
        let c3 = make_comment(s.id, Some(c1.id), 3);
        db.create_comment(&c1).unwrap();
        db.create_comment(&c2).unwrap();
        db.create_comment(&c3).unwrap();

        let listed = db.list_comments_for_subject(s.id).unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![c1.id, c2.id, c3.id]);

        // The flat list feeds straight into the tree builder.
        let tree = build_comment_tree(&listed);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].replies.len(), 1);
        assert_eq!(tree[0].replies[0].comment.id, c3.id);
    }

    #[test]
    fn comment_on_missing_subject_is_rejected() {
        let (_dir, db) = test_db();
        let c = make_comment(Uuid::new_v4(), None, 1);
        assert!(matches!(db.create_comment(&c), Err(StoreError::NotFound)));
    }

    #[test]
    fn reply_to_parent_on_other_subject_is_rejected() {
        let (_dir, db) = test_db();
        let s1 = make_subject(&db);
        let s2 = make_subject(&db);

        let parent = make_comment(s1.id, None, 1);
        db.create_comment(&parent).unwrap();

        let stray = make_comment(s2.id, Some(parent.id), 2);
        assert!(matches!(
            db.create_comment(&stray),
            Err(StoreError::ParentSubjectMismatch)
        ));
    }

    #[test]
    fn edit_replaces_body() {
        let (_dir, db) = test_db();
        let s = make_subject(&db);
        let c = make_comment(s.id, None, 1);
        db.create_comment(&c).unwrap();

        db.update_comment_body(c.id, "edited").unwrap();
        assert_eq!(db.get_comment(c.id).unwrap().body, "edited");
    }

    #[test]
    fn delete_with_replies_is_rejected() {
        let (_dir, db) = test_db();
        let s = make_subject(&db);
        let parent = make_comment(s.id, None, 1);
        let reply = make_comment(s.id, Some(parent.id), 2);
        db.create_comment(&parent).unwrap();
        db.create_comment(&reply).unwrap();

        assert!(matches!(
            db.delete_comment(parent.id),
            Err(StoreError::HasReplies)
        ));

        // Bottom-up works.
        db.delete_comment(reply.id).unwrap();
        db.delete_comment(parent.id).unwrap();
        assert!(db.list_comments_for_subject(s.id).unwrap().is_empty());
    }
}
