//! CRUD operations for [`Film`] records and the film side of the credit
//! graph.
//!
//! The film-side credit list is ordered and replaced wholesale on each
//! import so that role changes in the provider's data take effect; the
//! person side (see [`crate::people`]) is append-if-missing.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use marquee_shared::slug;
use marquee_shared::{Film, FilmCredit};

use crate::database::Database;
use crate::error::{Result, StoreError};

/// One credit edge as written by the importer, before person names are
/// resolved back out of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredit {
    pub person_id: Uuid,
    /// Character name for cast, job title for crew.
    pub role: String,
    pub department: String,
}

impl Database {
    // ------------------------------------------------------------------
    // Create / update
    // ------------------------------------------------------------------

    /// Insert a new film.
    pub fn create_film(&self, film: &Film) -> Result<()> {
        self.conn().execute(
            "INSERT INTO films (id, tmdb_id, title, slug, overview, release_date,
                                runtime, vote_average, imdb_id, genres, trailer_key,
                                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                film.id.to_string(),
                film.tmdb_id,
                film.title,
                film.slug,
                film.overview,
                film.release_date,
                film.runtime,
                film.vote_average,
                film.imdb_id,
                serde_json::to_string(&film.genres)?,
                film.trailer_key,
                film.created_at.to_rfc3339(),
                film.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Refresh a film's descriptive fields in place.
    ///
    /// The id, tmdb id, slug and creation time are stable; everything the
    /// provider reports is overwritten.
    pub fn update_film_metadata(&self, film: &Film) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE films
             SET title = ?1, overview = ?2, release_date = ?3, runtime = ?4,
                 vote_average = ?5, imdb_id = ?6, genres = ?7, trailer_key = ?8,
                 updated_at = ?9
             WHERE id = ?10",
            params![
                film.title,
                film.overview,
                film.release_date,
                film.runtime,
                film.vote_average,
                film.imdb_id,
                serde_json::to_string(&film.genres)?,
                film.trailer_key,
                Utc::now().to_rfc3339(),
                film.id.to_string(),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Look a film up by the provider's id (the import dedup key).
    pub fn find_film_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<Film>> {
        let result = self.conn().query_row(
            "SELECT id, tmdb_id, title, slug, overview, release_date, runtime,
                    vote_average, imdb_id, genres, trailer_key, created_at, updated_at
             FROM films WHERE tmdb_id = ?1",
            params![tmdb_id],
            row_to_film,
        );
        match result {
            Ok(film) => Ok(Some(film)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    /// Fetch a film by its slug.
    pub fn get_film_by_slug(&self, slug: &str) -> Result<Film> {
        self.conn()
            .query_row(
                "SELECT id, tmdb_id, title, slug, overview, release_date, runtime,
                        vote_average, imdb_id, genres, trailer_key, created_at, updated_at
                 FROM films WHERE slug = ?1",
                params![slug],
                row_to_film,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Derive a slug for `title` that no existing film uses.
    ///
    /// Collisions are resolved deterministically by appending `-1`, `-2`,
    /// and so on to the normalized base.
    pub fn unique_film_slug(&self, title: &str) -> Result<String> {
        let base = slug::slugify(title);
        for attempt in 0.. {
            let candidate = slug::candidate(&base, attempt);
            let taken: i64 = self.conn().query_row(
                "SELECT EXISTS(SELECT 1 FROM films WHERE slug = ?1)",
                params![candidate],
                |row| row.get(0),
            )?;
            if taken == 0 {
                return Ok(candidate);
            }
        }
        unreachable!("slug candidates are unbounded");
    }

    // ------------------------------------------------------------------
    // Credits (film side)
    // ------------------------------------------------------------------

    /// Replace the film's entire credit list with `credits`, in order.
    pub fn replace_film_credits(&self, film_id: Uuid, credits: &[NewCredit]) -> Result<()> {
        self.conn().execute(
            "DELETE FROM film_credits WHERE film_id = ?1",
            params![film_id.to_string()],
        )?;

        let mut stmt = self.conn().prepare(
            "INSERT INTO film_credits (film_id, person_id, role, department, position)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (position, credit) in credits.iter().enumerate() {
            stmt.execute(params![
                film_id.to_string(),
                credit.person_id.to_string(),
                credit.role,
                credit.department,
                position as i64,
            ])?;
        }
        Ok(())
    }

    /// The film's credit list in import order, with person names resolved.
    pub fn list_film_credits(&self, film_id: Uuid) -> Result<Vec<FilmCredit>> {
        let mut stmt = self.conn().prepare(
            "SELECT fc.person_id, p.name, p.slug, fc.role, fc.department
             FROM film_credits fc
             JOIN people p ON p.id = fc.person_id
             WHERE fc.film_id = ?1
             ORDER BY fc.position ASC",
        )?;

        let rows = stmt.query_map(params![film_id.to_string()], |row| {
            let person_id_str: String = row.get(0)?;
            let person_id = Uuid::parse_str(&person_id_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Ok(FilmCredit {
                person_id,
                person_name: row.get(1)?,
                person_slug: row.get(2)?,
                role: row.get(3)?,
                department: row.get(4)?,
            })
        })?;

        let mut credits = Vec::new();
        for row in rows {
            credits.push(row?);
        }
        Ok(credits)
    }
}

fn row_to_film(row: &rusqlite::Row<'_>) -> rusqlite::Result<Film> {
    let id_str: String = row.get(0)?;
    let genres_json: String = row.get(9)?;
    let created_str: String = row.get(11)?;
    let updated_str: String = row.get(12)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let genres: Vec<String> = serde_json::from_str(&genres_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
        })?;
    let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(12, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Film {
        id,
        tmdb_id: row.get(1)?,
        title: row.get(2)?,
        slug: row.get(3)?,
        overview: row.get(4)?,
        release_date: row.get(5)?,
        runtime: row.get(6)?,
        vote_average: row.get(7)?,
        imdb_id: row.get(8)?,
        genres,
        trailer_key: row.get(10)?,
        created_at,
        updated_at,
    })
}
