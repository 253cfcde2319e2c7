//! Public API routes: health, flag snapshot and the three features.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::catalog::Page;
use crate::comments::Comment;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::library::LibraryEntry;
use crate::registry::FlagSnapshot;

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/api", get(health))
        .route("/api/admin/services", get(list_services))
        .route("/api/discover", get(discover))
        .route("/api/search", get(search))
        .route("/api/game/{id}", get(game))
        .route("/api/game/{id}/comments", get(list_comments).post(add_comment))
        .route("/api/game/{id}/rating", get(rating))
        .route("/api/comments/{id}", delete(delete_comment))
        .route(
            "/api/users/{username}/games",
            get(list_games).post(add_game).delete(remove_game),
        )
        .route("/api/users/{username}/games/status", put(update_status))
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Flag map polled by every consumer: `{ name: 0|1 }`.
async fn list_services(State(state): State<AppState>) -> Result<Json<FlagSnapshot>, ApiError> {
    Ok(Json(state.registry.get_all_flags().await?))
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    page_size: u32,
}

impl From<&PageQuery> for Page {
    fn from(q: &PageQuery) -> Self {
        Page { page: q.page, page_size: q.page_size }
    }
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    page: u32,
    #[serde(default)]
    page_size: u32,
}

async fn discover(State(state): State<AppState>, Query(q): Query<PageQuery>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.catalog.discover(Page::from(&q)).await?))
}

async fn search(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> Result<Json<Value>, ApiError> {
    let query = q.q.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("missing query ?q=".into()));
    }
    Ok(Json(state.catalog.search(query, Page { page: q.page, page_size: q.page_size }).await?))
}

async fn game(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.catalog.game(&id).await?))
}

#[derive(Debug, Deserialize)]
struct NewComment {
    username: String,
    comment: String,
    #[serde(default)]
    rating: Option<u8>,
}

async fn list_comments(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let comments = state.comments.comments_for_game(&id).await?;
    Ok(Json(json!({ "comments": comments })))
}

async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<NewComment>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state
        .comments
        .add_comment(&id, &body.username, &body.comment, body.rating)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn rating(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let average = state.comments.average_rating(&id).await?;
    Ok(Json(json!({ "game_id": id, "average": average })))
}

#[derive(Debug, Deserialize)]
struct RevQuery {
    rev: String,
}

async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<RevQuery>,
) -> Result<Json<Value>, ApiError> {
    if !state.comments.delete_comment(&id, &q.rev).await? {
        return Err(ApiError::NotFound(format!("comment {id:?} not found")));
    }
    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
struct StatusFilter {
    status: Option<u8>,
}

async fn list_games(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(q): Query<StatusFilter>,
) -> Result<Json<Vec<LibraryEntry>>, ApiError> {
    let games = match q.status {
        Some(status) => state.library.games_by_status(&username, status).await?,
        None => state.library.all_games(&username).await?,
    };
    Ok(Json(games))
}

async fn add_game(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(entry): Json<LibraryEntry>,
) -> Result<(StatusCode, Json<Vec<LibraryEntry>>), ApiError> {
    let games = state.library.add_game(&username, entry).await?;
    Ok((StatusCode::CREATED, Json(games)))
}

#[derive(Debug, Deserialize)]
struct GameQuery {
    game: String,
}

async fn remove_game(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(q): Query<GameQuery>,
) -> Result<Json<Vec<LibraryEntry>>, ApiError> {
    Ok(Json(state.library.remove_game(&username, &q.game).await?))
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    #[serde(rename = "gameName")]
    game_name: String,
    status: u8,
}

async fn update_status(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Vec<LibraryEntry>>, ApiError> {
    Ok(Json(state.library.update_status(&username, &body.game_name, body.status).await?))
}
