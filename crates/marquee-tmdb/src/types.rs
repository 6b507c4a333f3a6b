//! Response payloads from the metadata provider.
//!
//! Every field the provider might omit is an `Option`; absence of the
//! identifying field (`title` on a movie, `name` on a person) means the
//! record does not really exist and is mapped to
//! [`TmdbError::NotFound`](crate::TmdbError::NotFound) by the client.

use serde::Deserialize;

/// Canonical movie record, fetched with credits and videos embedded
/// (`append_to_response=credits,videos`).
#[derive(Debug, Clone, Deserialize)]
pub struct MovieDetails {
    pub id: i64,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    /// Runtime in minutes.
    pub runtime: Option<i64>,
    pub vote_average: Option<f64>,
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub credits: Option<Credits>,
    pub videos: Option<VideoList>,
}

impl MovieDetails {
    /// The YouTube key of the first video classified as a trailer.
    pub fn trailer_key(&self) -> Option<String> {
        self.videos.as_ref()?.results.iter().find_map(|v| {
            let is_trailer = v.site.as_deref() == Some("YouTube")
                && v.kind.as_deref() == Some("Trailer");
            if is_trailer {
                v.key.clone()
            } else {
                None
            }
        })
    }

    /// Genre names in provider order.
    pub fn genre_names(&self) -> Vec<String> {
        self.genres.iter().map(|g| g.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Cast and crew lists embedded in a movie payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastEntry>,
    #[serde(default)]
    pub crew: Vec<CrewEntry>,
}

/// One cast entry.  Cast members are always credited under the `Acting`
/// department; `character` is the role.
#[derive(Debug, Clone, Deserialize)]
pub struct CastEntry {
    /// The provider's person id.
    pub id: i64,
    pub name: Option<String>,
    pub character: Option<String>,
    /// Billing order.
    pub order: Option<i64>,
}

/// One crew entry; `job` is the role, `department` the classification.
#[derive(Debug, Clone, Deserialize)]
pub struct CrewEntry {
    /// The provider's person id.
    pub id: i64,
    pub name: Option<String>,
    pub job: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    pub key: Option<String>,
    pub site: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Canonical person record.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonProfile {
    pub id: i64,
    pub name: Option<String>,
    pub biography: Option<String>,
    pub birthday: Option<String>,
    pub place_of_birth: Option<String>,
    pub profile_path: Option<String>,
}
