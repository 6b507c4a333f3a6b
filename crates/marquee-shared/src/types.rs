//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the HTTP layer as a JSON payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Subject
// ---------------------------------------------------------------------------

/// The kind of content a [`Subject`] represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Image,
    Post,
    Article,
}

impl SubjectKind {
    /// Stable string form used as the `kind` column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Image => "image",
            SubjectKind::Post => "post",
            SubjectKind::Article => "article",
        }
    }

    /// Parse the column value back. Returns `None` for unknown kinds.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(SubjectKind::Image),
            "post" => Some(SubjectKind::Post),
            "article" => Some(SubjectKind::Article),
            _ => None,
        }
    }
}

/// Anything that can receive comments and likes (an image, a feed post, an
/// article).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Unique subject identifier.
    pub id: Uuid,
    /// What kind of content this is.
    pub kind: SubjectKind,
    /// Opaque id of the user who owns the content.
    pub owner_id: String,
    /// Optional display title.
    pub title: Option<String>,
    /// Denormalized like counter.  `None` until the first like touches it;
    /// the authoritative source of truth is always the like relation set.
    pub like_count: Option<i64>,
    /// When the subject was created.
    pub created_at: DateTime<Utc>,
}

impl Subject {
    /// The counter as shown to callers: absent means zero.
    pub fn likes(&self) -> i64 {
        self.like_count.unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A single comment or reply.
///
/// `parent_id`, when present, references a comment on the same subject.
/// Comments only ever reference comments created strictly earlier, so the
/// parent chain is a tree by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Unique comment identifier.
    pub id: Uuid,
    /// The subject this comment belongs to.
    pub subject_id: Uuid,
    /// Parent comment for replies; `None` for top-level comments.
    pub parent_id: Option<Uuid>,
    /// Opaque id of the comment author.
    pub author_id: String,
    /// Free-form comment text.
    pub body: String,
    /// When the comment was posted.  Comments within a subject are ordered
    /// ascending by this field.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Film
// ---------------------------------------------------------------------------

/// A film imported from the external metadata provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    /// Unique film identifier.
    pub id: Uuid,
    /// The provider's numeric id; unique, used as the dedup key on import.
    pub tmdb_id: i64,
    /// Film title.
    pub title: String,
    /// URL slug, globally unique among films.
    pub slug: String,
    /// Synopsis.
    pub overview: Option<String>,
    /// Release date as reported by the provider (`YYYY-MM-DD`).
    pub release_date: Option<String>,
    /// Runtime in minutes.
    pub runtime: Option<i64>,
    /// Provider's average rating.
    pub vote_average: Option<f64>,
    /// IMDb cross-reference id.
    pub imdb_id: Option<String>,
    /// Genre names.
    pub genres: Vec<String>,
    /// YouTube key of the trailer, if the provider lists one.
    pub trailer_key: Option<String>,
    /// When the record was first created.
    pub created_at: DateTime<Utc>,
    /// When the descriptive fields were last refreshed.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Person
// ---------------------------------------------------------------------------

/// A cast or crew member imported from the external metadata provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Unique person identifier.
    pub id: Uuid,
    /// The provider's numeric id; unique, used as the dedup key on import.
    pub tmdb_id: i64,
    /// Full name.
    pub name: String,
    /// URL slug, globally unique among people.
    pub slug: String,
    /// Biography text.
    pub biography: Option<String>,
    /// Birth date (`YYYY-MM-DD`).
    pub birthday: Option<String>,
    /// Place of birth.
    pub place_of_birth: Option<String>,
    /// Provider path of the profile image.
    pub profile_path: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Credits
// ---------------------------------------------------------------------------

/// One credit as listed on the film side, with the person resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilmCredit {
    /// The credited person.
    pub person_id: Uuid,
    pub person_name: String,
    pub person_slug: String,
    /// Character name for cast, job title for crew.
    pub role: String,
    /// Department classification (`Acting` for cast).
    pub department: String,
}

/// One credit as listed on the person side, with the film resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersonCredit {
    /// The film this credit belongs to.
    pub film_id: Uuid,
    pub film_title: String,
    pub film_slug: String,
    /// Character name for cast, job title for crew.
    pub role: String,
    /// Department classification.
    pub department: String,
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// A notification delivered to a user (e.g. "someone liked your image").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// The recipient.
    pub user_id: String,
    /// Short headline.
    pub title: String,
    /// Longer message text.
    pub message: String,
    /// Optional in-app link target.
    pub link: Option<String>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}
