//! REST API: subjects, threaded comments, likes, notifications, and the
//! film/person catalogue with its admin import endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method},
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use marquee_shared::{
    build_comment_tree, Comment, CommentNode, Film, FilmCredit, Notification, Person,
    PersonCredit, Subject, SubjectKind,
};
use marquee_store::LikeOutcome;

use crate::auth::{require_user, verify_admin_token};
use crate::error::ServerError;
use crate::importer;
use crate::rate_limit::rate_limit_middleware;
use crate::state::{lock_db, AppState, Db};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/subjects", post(create_subject))
        .route("/subjects/:id", get(get_subject))
        .route("/subjects/:id", delete(delete_subject))
        .route("/comments", get(list_comments))
        .route("/comments", post(create_comment))
        .route("/comments/:id", patch(edit_comment))
        .route("/comments/:id", delete(delete_comment))
        .route("/like", post(like))
        .route("/unlike", post(unlike))
        .route("/notifications", get(list_notifications))
        .route("/films/:slug", get(get_film))
        .route("/people/:slug", get(get_person))
        .route("/import-film", post(import_film))
        .route("/admin/recount-likes", post(recount_likes))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ---------------------------------------------------------------------------
// Subjects
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSubjectRequest {
    kind: SubjectKind,
    title: Option<String>,
}

/// Subject as rendered to callers: the like counter is always a number,
/// never "absent".
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubjectDto {
    id: Uuid,
    kind: SubjectKind,
    owner_id: String,
    title: Option<String>,
    likes: i64,
    created_at: String,
}

impl From<Subject> for SubjectDto {
    fn from(s: Subject) -> Self {
        Self {
            id: s.id,
            kind: s.kind,
            owner_id: s.owner_id.clone(),
            title: s.title.clone(),
            likes: s.likes(),
            created_at: s.created_at.to_rfc3339(),
        }
    }
}

async fn create_subject(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateSubjectRequest>,
) -> Result<Json<SubjectDto>, ServerError> {
    let user = require_user(&headers)?;

    let subject = Subject {
        id: Uuid::new_v4(),
        kind: req.kind,
        owner_id: user,
        title: req.title,
        like_count: None,
        created_at: Utc::now(),
    };
    lock_db(&state.db)?.create_subject(&subject)?;

    info!(subject = %subject.id, kind = subject.kind.as_str(), "subject created");
    Ok(Json(subject.into()))
}

async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubjectDto>, ServerError> {
    let subject = lock_db(&state.db)?.get_subject(id)?;
    Ok(Json(subject.into()))
}

async fn delete_subject(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let user = require_user(&headers)?;

    let db = lock_db(&state.db)?;
    let subject = db.get_subject(id)?;
    if subject.owner_id != user {
        return Err(ServerError::Forbidden(
            "Only the owner can delete this".to_string(),
        ));
    }

    db.delete_subject(id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentsQuery {
    subject_id: Uuid,
}

#[derive(Serialize)]
struct CommentsResponse {
    comments: Vec<CommentNode>,
}

async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<CommentsResponse>, ServerError> {
    let db = lock_db(&state.db)?;
    let _ = db.get_subject(query.subject_id)?;

    let flat = db.list_comments_for_subject(query.subject_id)?;
    Ok(Json(CommentsResponse {
        comments: build_comment_tree(&flat),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCommentRequest {
    subject_id: Uuid,
    body: String,
    parent_id: Option<Uuid>,
}

async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateCommentRequest>,
) -> Result<Json<Comment>, ServerError> {
    let user = require_user(&headers)?;

    if req.body.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "Comment body cannot be empty".to_string(),
        ));
    }

    let comment = Comment {
        id: Uuid::new_v4(),
        subject_id: req.subject_id,
        parent_id: req.parent_id,
        author_id: user,
        body: req.body,
        created_at: Utc::now(),
    };
    lock_db(&state.db)?.create_comment(&comment)?;

    Ok(Json(comment))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditCommentRequest {
    body: String,
}

async fn edit_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<EditCommentRequest>,
) -> Result<Json<Comment>, ServerError> {
    let user = require_user(&headers)?;

    if req.body.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "Comment body cannot be empty".to_string(),
        ));
    }

    let db = lock_db(&state.db)?;
    let mut comment = db.get_comment(id)?;
    if comment.author_id != user {
        return Err(ServerError::Forbidden(
            "Only the author can edit a comment".to_string(),
        ));
    }

    db.update_comment_body(id, &req.body)?;
    comment.body = req.body;
    Ok(Json(comment))
}

async fn delete_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let user = require_user(&headers)?;

    let db = lock_db(&state.db)?;
    let comment = db.get_comment(id)?;
    if comment.author_id != user {
        return Err(ServerError::Forbidden(
            "Only the author can delete a comment".to_string(),
        ));
    }

    db.delete_comment(id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LikeRequest {
    subject_id: Uuid,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LikeResponse {
    likes: i64,
    liked: bool,
    already_liked: bool,
}

async fn like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LikeRequest>,
) -> Result<Json<LikeResponse>, ServerError> {
    let user = require_user(&headers)?;

    let (outcome, subject) = {
        let db = lock_db(&state.db)?;
        let subject = db.get_subject(req.subject_id)?;
        (db.like(req.subject_id, &user)?, subject)
    };

    if let LikeOutcome::Liked { .. } = outcome {
        notify_owner_of_like(&state.db, &subject, &user);
    }

    Ok(Json(LikeResponse {
        likes: outcome.likes(),
        liked: true,
        already_liked: outcome.already_liked(),
    }))
}

async fn unlike(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LikeRequest>,
) -> Result<Json<LikeResponse>, ServerError> {
    let user = require_user(&headers)?;

    let likes = lock_db(&state.db)?.unlike(req.subject_id, &user)?;

    Ok(Json(LikeResponse {
        likes,
        liked: false,
        already_liked: false,
    }))
}

/// Best-effort notification to the subject's owner.  Failure is logged
/// and never fails the like itself.
fn notify_owner_of_like(db: &Db, subject: &Subject, liker: &str) {
    if subject.owner_id == liker {
        return;
    }

    let notification = Notification {
        id: Uuid::new_v4(),
        user_id: subject.owner_id.clone(),
        title: "New like".to_string(),
        message: format!("{liker} liked your {}", subject.kind.as_str()),
        link: Some(format!("/subjects/{}", subject.id)),
        created_at: Utc::now(),
    };

    let result = lock_db(db).and_then(|guard| {
        guard
            .create_notification(&notification)
            .map_err(ServerError::from)
    });
    if let Err(e) = result {
        warn!(user = %subject.owner_id, error = %e, "failed to write like notification");
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct NotificationsResponse {
    notifications: Vec<Notification>,
}

async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<NotificationsResponse>, ServerError> {
    let user = require_user(&headers)?;

    let notifications = lock_db(&state.db)?.list_notifications_for_user(&user)?;
    Ok(Json(NotificationsResponse { notifications }))
}

// ---------------------------------------------------------------------------
// Films & people
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct FilmResponse {
    #[serde(flatten)]
    film: Film,
    credits: Vec<FilmCredit>,
}

async fn get_film(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<FilmResponse>, ServerError> {
    let db = lock_db(&state.db)?;
    let film = db.get_film_by_slug(&slug)?;
    let credits = db.list_film_credits(film.id)?;
    Ok(Json(FilmResponse { film, credits }))
}

#[derive(Serialize)]
struct PersonResponse {
    #[serde(flatten)]
    person: Person,
    credits: Vec<PersonCredit>,
}

async fn get_person(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PersonResponse>, ServerError> {
    let db = lock_db(&state.db)?;
    let person = db.get_person_by_slug(&slug)?;
    let credits = db.list_person_credits(person.id)?;
    Ok(Json(PersonResponse { person, credits }))
}

// ---------------------------------------------------------------------------
// Admin: import & reconciliation
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportFilmRequest {
    tmdb_id: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportFilmResponse {
    success: bool,
    title: String,
    created: bool,
    credits_linked: usize,
    missing_celebs: Vec<i64>,
}

async fn import_film(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ImportFilmRequest>,
) -> Result<Json<ImportFilmResponse>, ServerError> {
    verify_admin_token(&headers, &state.config)?;

    let outcome = importer::import_film(&state.db, state.provider.as_ref(), req.tmdb_id).await?;

    Ok(Json(ImportFilmResponse {
        success: true,
        title: outcome.title,
        created: outcome.created,
        credits_linked: outcome.credits_linked,
        missing_celebs: outcome.missing_people,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecountRequest {
    subject_id: Uuid,
}

#[derive(Serialize)]
struct RecountResponse {
    likes: i64,
}

async fn recount_likes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RecountRequest>,
) -> Result<Json<RecountResponse>, ServerError> {
    verify_admin_token(&headers, &state.config)?;

    let likes = lock_db(&state.db)?.recount_likes(req.subject_id)?;

    info!(subject = %req.subject_id, likes, "like counter recounted by admin");
    Ok(Json(RecountResponse { likes }))
}

// ---------------------------------------------------------------------------
// Serving
// ---------------------------------------------------------------------------

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
