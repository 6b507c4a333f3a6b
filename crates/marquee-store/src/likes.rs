//! Like / unlike operations and counter reconciliation.
//!
//! The `likes` relation set is the authoritative record of who liked what;
//! `subjects.like_count` is a display cache.  Relation creation is
//! idempotent (`INSERT OR IGNORE` keyed by subject + user), which absorbs
//! duplicate like calls, and the counter never goes below zero.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};

/// Result of a [`Database::like`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// The like was recorded and the counter incremented.
    Liked { likes: i64 },
    /// The user had already liked this subject; nothing changed.
    AlreadyLiked { likes: i64 },
}

impl LikeOutcome {
    /// The counter value after the call.
    pub fn likes(&self) -> i64 {
        match self {
            LikeOutcome::Liked { likes } | LikeOutcome::AlreadyLiked { likes } => *likes,
        }
    }

    /// Whether the call was a no-op.
    pub fn already_liked(&self) -> bool {
        matches!(self, LikeOutcome::AlreadyLiked { .. })
    }
}

impl Database {
    /// Record that `user_id` likes `subject_id`.
    ///
    /// Idempotent: a second call for the same pair reports
    /// [`LikeOutcome::AlreadyLiked`] and leaves the counter untouched.
    pub fn like(&self, subject_id: Uuid, user_id: &str) -> Result<LikeOutcome> {
        let _ = self.get_subject(subject_id)?;

        let inserted = self.conn().execute(
            "INSERT OR IGNORE INTO likes (subject_id, user_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![
                subject_id.to_string(),
                user_id,
                Utc::now().to_rfc3339(),
            ],
        )?;

        if inserted == 0 {
            return Ok(LikeOutcome::AlreadyLiked {
                likes: self.like_count(subject_id)?,
            });
        }

        // First like on a subject initializes the counter from NULL.
        self.conn().execute(
            "UPDATE subjects SET like_count = COALESCE(like_count, 0) + 1 WHERE id = ?1",
            params![subject_id.to_string()],
        )?;

        Ok(LikeOutcome::Liked {
            likes: self.like_count(subject_id)?,
        })
    }

    /// Remove `user_id`'s like from `subject_id`.
    ///
    /// Fails with [`StoreError::NotLiked`] when there is nothing to undo.
    /// The counter decrement floors at zero so drift can never push it
    /// negative.
    pub fn unlike(&self, subject_id: Uuid, user_id: &str) -> Result<i64> {
        let _ = self.get_subject(subject_id)?;

        let removed = self.conn().execute(
            "DELETE FROM likes WHERE subject_id = ?1 AND user_id = ?2",
            params![subject_id.to_string(), user_id],
        )?;
        if removed == 0 {
            return Err(StoreError::NotLiked);
        }

        self.conn().execute(
            "UPDATE subjects SET like_count = MAX(COALESCE(like_count, 0) - 1, 0)
             WHERE id = ?1",
            params![subject_id.to_string()],
        )?;

        self.like_count(subject_id)
    }

    /// Whether the relation set records a like for this pair.
    ///
    /// This reads the authoritative relation, never the counter.
    pub fn has_liked(&self, subject_id: Uuid, user_id: &str) -> Result<bool> {
        let exists: i64 = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE subject_id = ?1 AND user_id = ?2)",
            params![subject_id.to_string(), user_id],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    /// Current value of the display counter (absent counts as zero).
    pub fn like_count(&self, subject_id: Uuid) -> Result<i64> {
        self.conn()
            .query_row(
                "SELECT COALESCE(like_count, 0) FROM subjects WHERE id = ?1",
                params![subject_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Recompute the counter from the relation set, repairing any drift.
    ///
    /// Returns the corrected value.
    pub fn recount_likes(&self, subject_id: Uuid) -> Result<i64> {
        let _ = self.get_subject(subject_id)?;

        self.conn().execute(
            "UPDATE subjects
             SET like_count = (SELECT COUNT(*) FROM likes WHERE subject_id = ?1)
             WHERE id = ?1",
            params![subject_id.to_string()],
        )?;

        let likes = self.like_count(subject_id)?;
        tracing::debug!(subject = %subject_id, likes, "like counter recomputed");
        Ok(likes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_shared::{Subject, SubjectKind};

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn make_subject(db: &Database) -> Subject {
        let s = Subject {
            id: Uuid::new_v4(),
            kind: SubjectKind::Image,
            owner_id: "owner".to_string(),
            title: None,
            like_count: None,
            created_at: Utc::now(),
        };
        db.create_subject(&s).unwrap();
        s
    }

    #[test]
    fn like_is_idempotent() {
        let (_dir, db) = test_db();
        let s = make_subject(&db);

        let first = db.like(s.id, "user-a").unwrap();
        assert_eq!(first, LikeOutcome::Liked { likes: 1 });

        let second = db.like(s.id, "user-a").unwrap();
        assert_eq!(second, LikeOutcome::AlreadyLiked { likes: 1 });
        assert!(second.already_liked());
    }

    #[test]
    fn counter_starts_absent_and_self_heals() {
        let (_dir, db) = test_db();
        let s = make_subject(&db);

        // like_count is NULL before any like.
        assert_eq!(db.get_subject(s.id).unwrap().like_count, None);
        assert_eq!(db.like_count(s.id).unwrap(), 0);

        db.like(s.id, "user-a").unwrap();
        assert_eq!(db.get_subject(s.id).unwrap().like_count, Some(1));
    }

    #[test]
    fn scenario_two_users() {
        let (_dir, db) = test_db();
        let s = make_subject(&db);

        assert_eq!(db.like(s.id, "user-a").unwrap().likes(), 1);
        let repeat = db.like(s.id, "user-a").unwrap();
        assert!(repeat.already_liked());
        assert_eq!(repeat.likes(), 1);
        assert_eq!(db.like(s.id, "user-b").unwrap().likes(), 2);
        assert_eq!(db.unlike(s.id, "user-a").unwrap(), 1);
    }

    #[test]
    fn like_unlike_round_trip_leaves_no_residue() {
        let (_dir, db) = test_db();
        let s = make_subject(&db);

        db.like(s.id, "user-a").unwrap();
        let after = db.unlike(s.id, "user-a").unwrap();

        assert_eq!(after, 0);
        assert!(!db.has_liked(s.id, "user-a").unwrap());
    }

    #[test]
    fn unlike_without_like_is_rejected() {
        let (_dir, db) = test_db();
        let s = make_subject(&db);

        assert!(matches!(
            db.unlike(s.id, "user-a"),
            Err(StoreError::NotLiked)
        ));
    }

    #[test]
    fn unlike_floors_at_zero() {
        let (_dir, db) = test_db();
        let s = make_subject(&db);
        db.like(s.id, "user-a").unwrap();

        // Corrupt the cache downwards to simulate drift.
        db.conn()
            .execute(
                "UPDATE subjects SET like_count = 0 WHERE id = ?1",
                params![s.id.to_string()],
            )
            .unwrap();

        let after = db.unlike(s.id, "user-a").unwrap();
        assert_eq!(after, 0);
    }

    #[test]
    fn like_on_missing_subject_is_not_found() {
        let (_dir, db) = test_db();
        assert!(matches!(
            db.like(Uuid::new_v4(), "user-a"),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn recount_repairs_drift() {
        let (_dir, db) = test_db();
        let s = make_subject(&db);
        db.like(s.id, "user-a").unwrap();
        db.like(s.id, "user-b").unwrap();

        // Simulate drift in both directions.
        db.conn()
            .execute(
                "UPDATE subjects SET like_count = 99 WHERE id = ?1",
                params![s.id.to_string()],
            )
            .unwrap();
        assert_eq!(db.recount_likes(s.id).unwrap(), 2);

        db.conn()
            .execute(
                "UPDATE subjects SET like_count = NULL WHERE id = ?1",
                params![s.id.to_string()],
            )
            .unwrap();
        assert_eq!(db.recount_likes(s.id).unwrap(), 2);
    }
}
