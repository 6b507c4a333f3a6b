//! # marquee-store
//!
//! SQLite persistence for the Marquee application.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model: subjects, comments, likes, films, people, and notifications.

pub mod comments;
pub mod database;
pub mod films;
pub mod likes;
pub mod migrations;
pub mod notifications;
pub mod people;
pub mod subjects;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use likes::LikeOutcome;
