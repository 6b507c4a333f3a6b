//! Film import pipeline: given an external film id, ensure the film, its
//! people, and the bidirectional credit graph between them exist in the
//! store.
//!
//! The import is idempotent per external id: the film is upserted by
//! `tmdb_id`, the film-side credit list is replaced wholesale, and the
//! person-side reverse links are appended only when missing.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use marquee_shared::{Film, Person};
use marquee_store::films::NewCredit;
use marquee_store::Database;
use marquee_tmdb::{MetadataProvider, MovieDetails, TmdbError};

use crate::error::ServerError;
use crate::state::lock_db;

/// Result of a completed import.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub film_id: Uuid,
    pub title: String,
    /// Whether the film record was created (as opposed to refreshed).
    pub created: bool,
    /// Number of credit edges written to the film.
    pub credits_linked: usize,
    /// External person ids that could not be resolved; the caller can
    /// retry them individually.
    pub missing_people: Vec<i64>,
}

/// Import one film and its credit graph.
///
/// A provider failure at the film level aborts the whole import before
/// any record is written.  A failure resolving an individual person only
/// drops that credit: the id lands in
/// [`missing_people`](ImportOutcome::missing_people) and the rest of the
/// batch proceeds.
pub async fn import_film(
    db: &Mutex<Database>,
    provider: &dyn MetadataProvider,
    tmdb_id: i64,
) -> Result<ImportOutcome, ServerError> {
    let movie = provider.movie(tmdb_id).await?;
    let title = movie.title.clone().ok_or(TmdbError::NotFound)?;

    let (film_id, created) = upsert_film(db, tmdb_id, &title, &movie)?;

    let credits = movie.credits.unwrap_or_default();

    // Candidate edges in provider order: cast first, then crew.
    let mut raw: Vec<(i64, String, String)> = Vec::new();
    for cast in &credits.cast {
        raw.push((
            cast.id,
            cast.character.clone().unwrap_or_default(),
            "Acting".to_string(),
        ));
    }
    for crew in &credits.crew {
        raw.push((
            crew.id,
            crew.job.clone().unwrap_or_default(),
            crew.department.clone().unwrap_or_else(|| "Crew".to_string()),
        ));
    }

    // Resolve each distinct person once, sequentially.  Misses are cached
    // too, so a bad external id costs a single provider round-trip.
    let mut resolved: HashMap<i64, Option<Uuid>> = HashMap::new();
    let mut missing: Vec<i64> = Vec::new();

    for &(person_tmdb_id, _, _) in &raw {
        if resolved.contains_key(&person_tmdb_id) {
            continue;
        }

        let known = lock_db(db)?.find_person_by_tmdb_id(person_tmdb_id)?;
        if let Some(person) = known {
            resolved.insert(person_tmdb_id, Some(person.id));
            continue;
        }

        match provider.person(person_tmdb_id).await {
            Ok(profile) => {
                let name = match profile.name {
                    Some(ref n) if !n.is_empty() => n.clone(),
                    _ => {
                        warn!(person = person_tmdb_id, "provider returned nameless person");
                        missing.push(person_tmdb_id);
                        resolved.insert(person_tmdb_id, None);
                        continue;
                    }
                };

                let guard = lock_db(db)?;
                let person = Person {
                    id: Uuid::new_v4(),
                    tmdb_id: person_tmdb_id,
                    name: name.clone(),
                    slug: guard.unique_person_slug(&name)?,
                    biography: profile.biography,
                    birthday: profile.birthday,
                    place_of_birth: profile.place_of_birth,
                    profile_path: profile.profile_path,
                    created_at: Utc::now(),
                };
                guard.create_person(&person)?;
                resolved.insert(person_tmdb_id, Some(person.id));
            }
            Err(e) => {
                warn!(
                    person = person_tmdb_id,
                    error = %e,
                    "skipping unresolvable credit"
                );
                missing.push(person_tmdb_id);
                resolved.insert(person_tmdb_id, None);
            }
        }
    }

    // Deduplicate by (person, role, department), keeping first occurrence.
    let mut seen: HashSet<(Uuid, String, String)> = HashSet::new();
    let mut edges: Vec<NewCredit> = Vec::new();
    for (person_tmdb_id, role, department) in raw {
        let Some(person_id) = resolved.get(&person_tmdb_id).copied().flatten() else {
            continue;
        };
        if seen.insert((person_id, role.clone(), department.clone())) {
            edges.push(NewCredit {
                person_id,
                role,
                department,
            });
        }
    }

    {
        let guard = lock_db(db)?;
        guard.replace_film_credits(film_id, &edges)?;
        for edge in &edges {
            guard.add_person_credit_if_missing(
                edge.person_id,
                film_id,
                &edge.role,
                &edge.department,
            )?;
        }
    }

    info!(
        film = %film_id,
        title = %title,
        credits = edges.len(),
        missing = missing.len(),
        "film import complete"
    );

    Ok(ImportOutcome {
        film_id,
        title,
        created,
        credits_linked: edges.len(),
        missing_people: missing,
    })
}

/// Create the film on first sight, refresh its descriptive fields on
/// re-import.  The slug is assigned once and stays stable.
fn upsert_film(
    db: &Mutex<Database>,
    tmdb_id: i64,
    title: &str,
    movie: &MovieDetails,
) -> Result<(Uuid, bool), ServerError> {
    let guard = lock_db(db)?;

    match guard.find_film_by_tmdb_id(tmdb_id)? {
        Some(mut existing) => {
            existing.title = title.to_string();
            existing.overview = movie.overview.clone();
            existing.release_date = movie.release_date.clone();
            existing.runtime = movie.runtime;
            existing.vote_average = movie.vote_average;
            existing.imdb_id = movie.imdb_id.clone();
            existing.genres = movie.genre_names();
            existing.trailer_key = movie.trailer_key();
            guard.update_film_metadata(&existing)?;
            Ok((existing.id, false))
        }
        None => {
            let now = Utc::now();
            let film = Film {
                id: Uuid::new_v4(),
                tmdb_id,
                title: title.to_string(),
                slug: guard.unique_film_slug(title)?,
                overview: movie.overview.clone(),
                release_date: movie.release_date.clone(),
                runtime: movie.runtime,
                vote_average: movie.vote_average,
                imdb_id: movie.imdb_id.clone(),
                genres: movie.genre_names(),
                trailer_key: movie.trailer_key(),
                created_at: now,
                updated_at: now,
            };
            guard.create_film(&film)?;
            Ok((film.id, true))
        }
    }
}
