//! HTTP client for the metadata provider.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Result, TmdbError};
use crate::types::{MovieDetails, PersonProfile};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// The provider operations the importer needs.
///
/// [`TmdbClient`] is the real implementation; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch a movie with credits and videos embedded.
    async fn movie(&self, tmdb_id: i64) -> Result<MovieDetails>;

    /// Fetch a person's profile.
    async fn person(&self, tmdb_id: i64) -> Result<PersonProfile>;
}

/// Client for the TMDB REST API (v3 auth: api key as query parameter).
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    /// Create a client against the public API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against an explicit base URL (tests, proxies).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: api_key.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, append: Option<&str>) -> Result<T> {
        let url = format!("{}/{path}", self.base_url);

        let mut query: Vec<(&str, &str)> = vec![("api_key", self.api_key.as_str())];
        if let Some(append) = append {
            query.push(("append_to_response", append));
        }

        debug!(%url, "provider request");

        let response = self.http.get(&url).query(&query).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TmdbError::NotFound);
        }
        if !status.is_success() {
            return Err(TmdbError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TmdbError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn movie(&self, tmdb_id: i64) -> Result<MovieDetails> {
        let movie: MovieDetails = self
            .get_json(&format!("movie/{tmdb_id}"), Some("credits,videos"))
            .await?;

        // A payload without a title is not a real record.
        if movie.title.as_deref().unwrap_or("").is_empty() {
            return Err(TmdbError::NotFound);
        }

        Ok(movie)
    }

    async fn person(&self, tmdb_id: i64) -> Result<PersonProfile> {
        let person: PersonProfile = self.get_json(&format!("person/{tmdb_id}"), None).await?;

        if person.name.as_deref().unwrap_or("").is_empty() {
            return Err(TmdbError::NotFound);
        }

        Ok(person)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = TmdbClient::with_base_url("k", "http://localhost:9999/");
        assert_eq!(client.base_url, "http://localhost:9999");
    }
}
