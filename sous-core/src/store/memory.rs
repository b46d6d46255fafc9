//! In-process store for tests and local runs without a database.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RecipeId, RecipeStore, StoreError, StoredRecipe};
use crate::types::{ChatTurn, GeneratedRecipe, GenerationMeta};

#[derive(Debug, Default)]
struct Inner {
    next_id: RecipeId,
    recipes: BTreeMap<RecipeId, Row>,
    messages: HashMap<RecipeId, Vec<ChatTurn>>,
}

#[derive(Debug)]
struct Row {
    recipe: StoredRecipe,
    deleted: bool,
}

impl Inner {
    fn owned(&self, owner: Uuid, id: RecipeId) -> Result<&StoredRecipe, StoreError> {
        match self.recipes.get(&id) {
            Some(row) if !row.deleted && row.recipe.owner_id == owner => Ok(&row.recipe),
            _ => Err(StoreError::NotFoundOrForbidden),
        }
    }

    fn owned_mut(&mut self, owner: Uuid, id: RecipeId) -> Result<&mut Row, StoreError> {
        match self.recipes.get_mut(&id) {
            Some(row) if !row.deleted && row.recipe.owner_id == owner => Ok(row),
            _ => Err(StoreError::NotFoundOrForbidden),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn save(
        &self,
        owner: Uuid,
        recipe: &GeneratedRecipe,
        meta: &GenerationMeta,
    ) -> Result<RecipeId, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;
        let now = Utc::now();
        inner.recipes.insert(
            id,
            Row {
                recipe: StoredRecipe {
                    id,
                    owner_id: owner,
                    recipe: recipe.clone(),
                    meta: meta.clone(),
                    created_at: now,
                    updated_at: now,
                },
                deleted: false,
            },
        );
        Ok(id)
    }

    async fn get(&self, owner: Uuid, id: RecipeId) -> Result<StoredRecipe, StoreError> {
        self.inner.read().await.owned(owner, id).cloned()
    }

    async fn list(&self, owner: Uuid) -> Result<Vec<StoredRecipe>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .recipes
            .values()
            .rev()
            .filter(|row| !row.deleted && row.recipe.owner_id == owner)
            .map(|row| row.recipe.clone())
            .collect())
    }

    async fn update(
        &self,
        owner: Uuid,
        id: RecipeId,
        recipe: &GeneratedRecipe,
    ) -> Result<StoredRecipe, StoreError> {
        let mut inner = self.inner.write().await;
        let row = inner.owned_mut(owner, id)?;
        row.recipe.recipe = recipe.clone();
        row.recipe.updated_at = Utc::now();
        Ok(row.recipe.clone())
    }

    async fn delete(&self, owner: Uuid, id: RecipeId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.owned_mut(owner, id)?.deleted = true;
        Ok(())
    }

    async fn append_message(
        &self,
        owner: Uuid,
        recipe_id: RecipeId,
        turn: &ChatTurn,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.owned(owner, recipe_id)?;
        inner
            .messages
            .entry(recipe_id)
            .or_default()
            .push(turn.clone());
        Ok(())
    }

    async fn chat_history(
        &self,
        owner: Uuid,
        recipe_id: RecipeId,
    ) -> Result<Vec<ChatTurn>, StoreError> {
        let inner = self.inner.read().await;
        inner.owned(owner, recipe_id)?;
        Ok(inner.messages.get(&recipe_id).cloned().unwrap_or_default())
    }

    async fn recent_messages(
        &self,
        owner: Uuid,
        recipe_id: RecipeId,
        limit: usize,
    ) -> Result<Vec<ChatTurn>, StoreError> {
        let inner = self.inner.read().await;
        inner.owned(owner, recipe_id)?;
        let turns = inner.messages.get(&recipe_id).map(Vec::as_slice).unwrap_or_default();
        Ok(turns[turns.len().saturating_sub(limit)..].to_vec())
    }
}
