//! Game comments and ratings.
//!
//! Every store call goes through the `CommentStore` breaker; when it opens
//! the feedback service flag is switched off.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resilience::{CircuitBreaker, ResilienceError};
use crate::store::{from_document, settle, to_document, DocumentStore, Selector, StoreError};

/// Highest accepted rating.
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("comment text is required")]
    EmptyComment,

    #[error("rating must be between 1 and {max}, got {0}", max = MAX_RATING)]
    InvalidRating(u8),

    #[error(transparent)]
    Unavailable(#[from] ResilienceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    pub username: String,
    pub comment: String,

    #[serde(rename = "gameid")]
    pub game_id: String,

    #[serde(default)]
    pub rating: Option<u8>,
}

pub struct CommentStore {
    store: Arc<dyn DocumentStore>,
    db: String,
    breaker: Arc<CircuitBreaker>,
}

impl CommentStore {
    pub fn new(store: Arc<dyn DocumentStore>, db: impl Into<String>, breaker: Arc<CircuitBreaker>) -> Self {
        Self { store, db: db.into(), breaker }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub async fn add_comment(
        &self,
        game_id: &str,
        username: &str,
        comment: &str,
        rating: Option<u8>,
    ) -> Result<Comment, CommentError> {
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(CommentError::EmptyComment);
        }
        if let Some(r) = rating.filter(|r| !(1..=MAX_RATING).contains(r)) {
            return Err(CommentError::InvalidRating(r));
        }

        let doc = to_document(&Comment {
            id: None,
            rev: None,
            username: username.to_string(),
            comment: comment.to_string(),
            game_id: game_id.to_string(),
            rating,
        })?;
        let (store, db) = (&self.store, self.db.as_str());
        let stored = self.breaker.execute(move || settle(store.put(db, doc.clone()))).await??;
        tracing::debug!(game_id = %game_id, username = %username, "Comment added");
        Ok(from_document(stored)?)
    }

    pub async fn comment(&self, id: &str) -> Result<Option<Comment>, CommentError> {
        let (store, db) = (&self.store, self.db.as_str());
        match self.breaker.execute(move || settle(store.get(db, id))).await?? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn comments_for_game(&self, game_id: &str) -> Result<Vec<Comment>, CommentError> {
        let selector = Selector::eq("gameid", game_id);
        let (store, db, selector) = (&self.store, self.db.as_str(), &selector);
        let docs = self.breaker.execute(move || settle(store.find(db, selector, None))).await??;
        Ok(docs.into_iter().map(from_document::<Comment>).collect::<Result<_, _>>()?)
    }

    /// Delete a comment at revision `rev`. Returns false when it does not exist.
    pub async fn delete_comment(&self, id: &str, rev: &str) -> Result<bool, CommentError> {
        let (store, db) = (&self.store, self.db.as_str());
        let deleted = self.breaker.execute(move || settle(store.delete(db, id, rev))).await??;
        Ok(deleted)
    }

    /// Mean of the ratings left on `game_id`; `None` when there are none.
    pub async fn average_rating(&self, game_id: &str) -> Result<Option<f64>, CommentError> {
        let ratings: Vec<f64> = self
            .comments_for_game(game_id)
            .await?
            .into_iter()
            .filter_map(|c| c.rating.map(f64::from))
            .collect();
        if ratings.is_empty() {
            return Ok(None);
        }
        Ok(Some(ratings.iter().sum::<f64>() / ratings.len() as f64))
    }
}
