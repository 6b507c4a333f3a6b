//! CRUD operations for [`Person`] records and the person side of the
//! credit graph (append-if-missing reverse links).

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use marquee_shared::slug;
use marquee_shared::{Person, PersonCredit};

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new person.
    pub fn create_person(&self, person: &Person) -> Result<()> {
        self.conn().execute(
            "INSERT INTO people (id, tmdb_id, name, slug, biography, birthday,
                                 place_of_birth, profile_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                person.id.to_string(),
                person.tmdb_id,
                person.name,
                person.slug,
                person.biography,
                person.birthday,
                person.place_of_birth,
                person.profile_path,
                person.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Look a person up by the provider's id (the import dedup key).
    pub fn find_person_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<Person>> {
        let result = self.conn().query_row(
            "SELECT id, tmdb_id, name, slug, biography, birthday, place_of_birth,
                    profile_path, created_at
             FROM people WHERE tmdb_id = ?1",
            params![tmdb_id],
            row_to_person,
        );
        match result {
            Ok(person) => Ok(Some(person)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    /// Fetch a person by their slug.
    pub fn get_person_by_slug(&self, slug: &str) -> Result<Person> {
        self.conn()
            .query_row(
                "SELECT id, tmdb_id, name, slug, biography, birthday, place_of_birth,
                        profile_path, created_at
                 FROM people WHERE slug = ?1",
                params![slug],
                row_to_person,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Derive a slug for `name` that no existing person uses.
    pub fn unique_person_slug(&self, name: &str) -> Result<String> {
        let base = slug::slugify(name);
        for attempt in 0.. {
            let candidate = slug::candidate(&base, attempt);
            let taken: i64 = self.conn().query_row(
                "SELECT EXISTS(SELECT 1 FROM people WHERE slug = ?1)",
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
    // Credits (person side)
    // ------------------------------------------------------------------

    /// Ensure the reverse credit link exists on the person.
    ///
    /// Keyed by (person, film, role, department); re-running the importer
    /// never accumulates duplicates.  Returns whether a row was added.
    pub fn add_person_credit_if_missing(
        &self,
        person_id: Uuid,
        film_id: Uuid,
        role: &str,
        department: &str,
    ) -> Result<bool> {
        let inserted = self.conn().execute(
            "INSERT OR IGNORE INTO person_credits (person_id, film_id, role, department)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                person_id.to_string(),
                film_id.to_string(),
                role,
                department,
            ],
        )?;
        Ok(inserted > 0)
    }

    /// The person's credits with film titles resolved.
    pub fn list_person_credits(&self, person_id: Uuid) -> Result<Vec<PersonCredit>> {
        let mut stmt = self.conn().prepare(
            "SELECT pc.film_id, f.title, f.slug, pc.role, pc.department
             FROM person_credits pc
             JOIN films f ON f.id = pc.film_id
             WHERE pc.person_id = ?1
             ORDER BY f.title ASC, pc.role ASC",
        )?;

        let rows = stmt.query_map(params![person_id.to_string()], |row| {
            let film_id_str: String = row.get(0)?;
            let film_id = Uuid::parse_str(&film_id_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Ok(PersonCredit {
                film_id,
                film_title: row.get(1)?,
                film_slug: row.get(2)?,
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

fn row_to_person(row: &rusqlite::Row<'_>) -> rusqlite::Result<Person> {
    let id_str: String = row.get(0)?;
    let ts_str: String = row.get(8)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Person {
        id,
        tmdb_id: row.get(1)?,
        name: row.get(2)?,
        slug: row.get(3)?,
        biography: row.get(4)?,
        birthday: row.get(5)?,
        place_of_birth: row.get(6)?,
        profile_path: row.get(7)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_shared::Film;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn make_person(db: &Database, tmdb_id: i64, name: &str) -> Person {
        let slug = db.unique_person_slug(name).unwrap();
        let person = Person {
            id: Uuid::new_v4(),
            tmdb_id,
            name: name.to_string(),
            slug,
            biography: Some("bio".to_string()),
            birthday: Some("1960-01-01".to_string()),
            place_of_birth: None,
            profile_path: None,
            created_at: Utc::now(),
        };
        db.create_person(&person).unwrap();
        person
    }

    fn make_film(db: &Database, tmdb_id: i64, title: &str) -> Film {
        let slug = db.unique_film_slug(title).unwrap();
        let film = Film {
            id: Uuid::new_v4(),
            tmdb_id,
            title: title.to_string(),
            slug,
            overview: None,
            release_date: None,
            runtime: None,
            vote_average: None,
            imdb_id: None,
            genres: Vec::new(),
            trailer_key: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        db.create_film(&film).unwrap();
        film
    }

    #[test]
    fn round_trip_by_tmdb_id_and_slug() {
        let (_dir, db) = test_db();
        let person = make_person(&db, 500, "Greta Gerwig");

        let found = db.find_person_by_tmdb_id(500).unwrap().unwrap();
        assert_eq!(found, person);

        let by_slug = db.get_person_by_slug("greta-gerwig").unwrap();
        assert_eq!(by_slug.id, person.id);

        assert!(db.find_person_by_tmdb_id(501).unwrap().is_none());
    }

    #[test]
    fn colliding_names_get_distinct_slugs() {
        let (_dir, db) = test_db();
        let first = make_person(&db, 1, "John Smith");
        let second = make_person(&db, 2, "John Smith");

        assert_eq!(first.slug, "john-smith");
        assert_eq!(second.slug, "john-smith-1");
    }

    #[test]
    fn reverse_links_never_duplicate() {
        let (_dir, db) = test_db();
        let person = make_person(&db, 10, "Al Pacino");
        let film = make_film(&db, 20, "Heat");

        assert!(db
            .add_person_credit_if_missing(person.id, film.id, "Vincent Hanna", "Acting")
            .unwrap());
        assert!(!db
            .add_person_credit_if_missing(person.id, film.id, "Vincent Hanna", "Acting")
            .unwrap());

        // A different role on the same film is a separate edge.
        assert!(db
            .add_person_credit_if_missing(person.id, film.id, "Producer", "Production")
            .unwrap());

        let credits = db.list_person_credits(person.id).unwrap();
        assert_eq!(credits.len(), 2);
        assert_eq!(credits[0].film_title, "Heat");
    }
}
