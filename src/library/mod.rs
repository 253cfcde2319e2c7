//! Per-user list of tracked games.
//!
//! One document per user in the users database holds the whole list.
//! Every store call goes through the `UserStore` breaker; when it opens
//! the user library flag is switched off.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resilience::{CircuitBreaker, ResilienceError};
use crate::store::{from_document, settle, to_document, DocumentStore, Selector, StoreError};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("{0:?} is already in the list")]
    GameAlreadyExists(String),

    #[error("{0:?} is not in the list")]
    GameNotInList(String),

    #[error(transparent)]
    Unavailable(#[from] ResilienceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    #[serde(rename = "gameName")]
    pub game_name: String,

    #[serde(default)]
    pub image: Option<String>,

    pub slug: String,

    /// Application-defined list number (playing, completed, ...).
    #[serde(default)]
    pub status: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDoc {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    rev: Option<String>,

    username: String,

    #[serde(default)]
    list: Vec<LibraryEntry>,
}

impl UserDoc {
    fn position(&self, game_name: &str) -> Option<usize> {
        self.list.iter().position(|e| e.game_name == game_name)
    }
}

pub struct UserLibrary {
    store: Arc<dyn DocumentStore>,
    db: String,
    breaker: Arc<CircuitBreaker>,
}

impl UserLibrary {
    pub fn new(store: Arc<dyn DocumentStore>, db: impl Into<String>, breaker: Arc<CircuitBreaker>) -> Self {
        Self { store, db: db.into(), breaker }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Every tracked game; empty for users that have not added any.
    pub async fn all_games(&self, username: &str) -> Result<Vec<LibraryEntry>, LibraryError> {
        Ok(self.load(username).await?.map(|u| u.list).unwrap_or_default())
    }

    pub async fn games_by_status(&self, username: &str, status: u8) -> Result<Vec<LibraryEntry>, LibraryError> {
        let mut games = self.all_games(username).await?;
        games.retain(|e| e.status == status);
        Ok(games)
    }

    pub async fn contains(&self, username: &str, game_name: &str) -> Result<bool, LibraryError> {
        Ok(self
            .load(username)
            .await?
            .is_some_and(|u| u.position(game_name).is_some()))
    }

    /// Append `entry`, creating the user document on first add.
    pub async fn add_game(&self, username: &str, entry: LibraryEntry) -> Result<Vec<LibraryEntry>, LibraryError> {
        let mut user = self.load(username).await?.unwrap_or_else(|| UserDoc {
            id: None,
            rev: None,
            username: username.to_string(),
            list: Vec::new(),
        });
        if user.position(&entry.game_name).is_some() {
            return Err(LibraryError::GameAlreadyExists(entry.game_name));
        }
        tracing::debug!(username = %username, game = %entry.game_name, "Adding game to list");
        user.list.push(entry);
        self.save(user).await
    }

    pub async fn update_status(
        &self,
        username: &str,
        game_name: &str,
        status: u8,
    ) -> Result<Vec<LibraryEntry>, LibraryError> {
        let user = self.load(username).await?;
        let Some((mut user, idx)) = user.and_then(|u| u.position(game_name).map(|i| (u, i))) else {
            return Err(LibraryError::GameNotInList(game_name.to_string()));
        };
        user.list[idx].status = status;
        self.save(user).await
    }

    pub async fn remove_game(&self, username: &str, game_name: &str) -> Result<Vec<LibraryEntry>, LibraryError> {
        let user = self.load(username).await?;
        let Some((mut user, idx)) = user.and_then(|u| u.position(game_name).map(|i| (u, i))) else {
            return Err(LibraryError::GameNotInList(game_name.to_string()));
        };
        user.list.remove(idx);
        self.save(user).await
    }

    async fn load(&self, username: &str) -> Result<Option<UserDoc>, LibraryError> {
        let selector = Selector::eq_ignore_case("username", username);
        let (store, db, selector) = (&self.store, self.db.as_str(), &selector);
        let docs = self.breaker.execute(move || settle(store.find(db, selector, Some(1)))).await??;
        match docs.into_iter().next() {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, user: UserDoc) -> Result<Vec<LibraryEntry>, LibraryError> {
        let doc = to_document(&user)?;
        let (store, db) = (&self.store, self.db.as_str());
        self.breaker.execute(move || settle(store.put(db, doc.clone()))).await??;
        Ok(user.list)
    }
}
