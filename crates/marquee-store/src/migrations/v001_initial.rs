//! v001 -- Initial schema creation.
//!
//! Creates the core tables: `subjects`, `comments`, `likes`, `films`,
//! `film_credits`, `people`, `person_credits`, and `notifications`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Subjects (likeable, commentable content)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS subjects (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    kind       TEXT NOT NULL,               -- image | post | article
    owner_id   TEXT NOT NULL,               -- opaque user id
    title      TEXT,
    like_count INTEGER,                     -- display cache; NULL until first like
    created_at TEXT NOT NULL                -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Comments (threaded via parent_id)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS comments (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    subject_id TEXT NOT NULL,               -- FK -> subjects(id)
    parent_id  TEXT,                        -- nullable FK -> comments(id)
    author_id  TEXT NOT NULL,
    body       TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (subject_id) REFERENCES subjects(id),
    FOREIGN KEY (parent_id)  REFERENCES comments(id)
);

CREATE INDEX IF NOT EXISTS idx_comments_subject_created
    ON comments(subject_id, created_at ASC);
CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_id);

-- ----------------------------------------------------------------
-- Likes (authoritative relation set; the counter is a cache)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS likes (
    subject_id TEXT NOT NULL,
    user_id    TEXT NOT NULL,
    created_at TEXT NOT NULL,

    PRIMARY KEY (subject_id, user_id)
);

-- ----------------------------------------------------------------
-- Films
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS films (
    id           TEXT PRIMARY KEY NOT NULL, -- UUID v4
    tmdb_id      INTEGER NOT NULL UNIQUE,   -- provider id, dedup key
    title        TEXT NOT NULL,
    slug         TEXT NOT NULL UNIQUE,
    overview     TEXT,
    release_date TEXT,
    runtime      INTEGER,
    vote_average REAL,
    imdb_id      TEXT,
    genres       TEXT NOT NULL DEFAULT '[]', -- JSON array of genre names
    trailer_key  TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Film credits (film side of the graph, ordered, replaced on import)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS film_credits (
    film_id    TEXT NOT NULL,               -- FK -> films(id)
    person_id  TEXT NOT NULL,               -- FK -> people(id)
    role       TEXT NOT NULL,               -- character or job title
    department TEXT NOT NULL,
    position   INTEGER NOT NULL,            -- display order

    FOREIGN KEY (film_id)   REFERENCES films(id) ON DELETE CASCADE,
    FOREIGN KEY (person_id) REFERENCES people(id)
);

CREATE INDEX IF NOT EXISTS idx_film_credits_film
    ON film_credits(film_id, position);

-- ----------------------------------------------------------------
-- People
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS people (
    id             TEXT PRIMARY KEY NOT NULL, -- UUID v4
    tmdb_id        INTEGER NOT NULL UNIQUE,   -- provider id, dedup key
    name           TEXT NOT NULL,
    slug           TEXT NOT NULL UNIQUE,
    biography      TEXT,
    birthday       TEXT,
    place_of_birth TEXT,
    profile_path   TEXT,
    created_at     TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Person credits (reverse side of the graph, append-if-missing)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS person_credits (
    person_id  TEXT NOT NULL,               -- FK -> people(id)
    film_id    TEXT NOT NULL,               -- FK -> films(id)
    role       TEXT NOT NULL,
    department TEXT NOT NULL,

    UNIQUE (person_id, film_id, role, department),
    FOREIGN KEY (person_id) REFERENCES people(id),
    FOREIGN KEY (film_id)   REFERENCES films(id)
);

-- ----------------------------------------------------------------
-- Notifications
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS notifications (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    user_id    TEXT NOT NULL,
    title      TEXT NOT NULL,
    message    TEXT NOT NULL,
    link       TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notifications_user
    ON notifications(user_id, created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
