//! Persistence of generated recipes and their conversations.
//!
//! Every by-id operation takes the caller's owner id and fails with
//! [`StoreError::NotFoundOrForbidden`] when the row is missing, deleted or
//! owned by someone else. Callers cannot tell those cases apart.

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{ChatTurn, GeneratedRecipe, GenerationMeta};

pub use memory::MemoryStore;

pub type RecipeId = i64;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Recipe not found")]
    NotFoundOrForbidden,

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecipe {
    pub id: RecipeId,
    pub owner_id: Uuid,
    pub recipe: GeneratedRecipe,
    pub meta: GenerationMeta,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn save(
        &self,
        owner: Uuid,
        recipe: &GeneratedRecipe,
        meta: &GenerationMeta,
    ) -> Result<RecipeId, StoreError>;

    async fn get(&self, owner: Uuid, id: RecipeId) -> Result<StoredRecipe, StoreError>;

    /// The owner's live recipes, newest first.
    async fn list(&self, owner: Uuid) -> Result<Vec<StoredRecipe>, StoreError>;

    /// Replace the recipe body; metadata and creation time are kept.
    async fn update(
        &self,
        owner: Uuid,
        id: RecipeId,
        recipe: &GeneratedRecipe,
    ) -> Result<StoredRecipe, StoreError>;

    /// Soft delete. The row stops being visible to every other operation.
    async fn delete(&self, owner: Uuid, id: RecipeId) -> Result<(), StoreError>;

    async fn append_message(
        &self,
        owner: Uuid,
        recipe_id: RecipeId,
        turn: &ChatTurn,
    ) -> Result<(), StoreError>;

    /// Conversation about a recipe, oldest first.
    async fn chat_history(
        &self,
        owner: Uuid,
        recipe_id: RecipeId,
    ) -> Result<Vec<ChatTurn>, StoreError>;

    /// The last `limit` turns of a conversation, oldest first.
    async fn recent_messages(
        &self,
        owner: Uuid,
        recipe_id: RecipeId,
        limit: usize,
    ) -> Result<Vec<ChatTurn>, StoreError>;
}
