//! PostgreSQL implementation of [`RecipeStore`].
//!
//! Diesel is synchronous, so every operation checks out a pooled connection
//! on the blocking thread pool.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use sous_core::ai::Usage;
use sous_core::{
    ChatTurn, GeneratedRecipe, GenerationMeta, RecipeId, RecipeStore, StoreError, StoredRecipe,
    TurnRole,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::{ChatMessageRow, NewChatMessage, NewRecipe, RecipeRow};
use crate::schema::{chat_messages, recipes};

pub struct PgRecipeStore {
    pool: Arc<DbPool>,
}

impl PgRecipeStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| StoreError::Backend(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?
    }
}

fn backend(error: diesel::result::Error) -> StoreError {
    tracing::error!(error = %error, "Recipe store query failed");
    StoreError::Backend(error.to_string())
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn encode_recipe(recipe: &GeneratedRecipe) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(recipe).map_err(|e| StoreError::Backend(e.to_string()))
}

fn to_stored(row: RecipeRow) -> Result<StoredRecipe, StoreError> {
    let recipe: GeneratedRecipe = serde_json::from_value(row.body)
        .map_err(|e| StoreError::Backend(format!("corrupt recipe {}: {}", row.id, e)))?;
    let prompt_tokens = row.prompt_tokens.max(0) as u32;
    let completion_tokens = row.completion_tokens.max(0) as u32;

    Ok(StoredRecipe {
        id: row.id,
        owner_id: row.user_id,
        recipe,
        meta: GenerationMeta {
            model: row.model,
            usage: Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            estimated_cost_usd: row.estimated_cost_usd,
            fallback: row.fallback,
        },
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn to_turn(row: ChatMessageRow) -> Result<ChatTurn, StoreError> {
    let role = TurnRole::parse(&row.role)
        .ok_or_else(|| StoreError::Backend(format!("unknown chat role {}", row.role)))?;
    Ok(ChatTurn {
        role,
        content: row.content,
    })
}

/// Load a live recipe row owned by `owner`.
fn owned_row(conn: &mut PgConnection, owner: Uuid, id: RecipeId) -> Result<RecipeRow, StoreError> {
    recipes::table
        .filter(recipes::id.eq(id))
        .filter(recipes::user_id.eq(owner))
        .filter(recipes::deleted_at.is_null())
        .select(RecipeRow::as_select())
        .first(conn)
        .optional()
        .map_err(backend)?
        .ok_or(StoreError::NotFoundOrForbidden)
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn save(
        &self,
        owner: Uuid,
        recipe: &GeneratedRecipe,
        meta: &GenerationMeta,
    ) -> Result<RecipeId, StoreError> {
        let body = encode_recipe(recipe)?;
        let title = recipe.title.clone();
        let meta = meta.clone();

        self.with_conn(move |conn| {
            diesel::insert_into(recipes::table)
                .values(&NewRecipe {
                    user_id: owner,
                    title: &title,
                    body,
                    model: &meta.model,
                    prompt_tokens: to_i32(meta.usage.prompt_tokens),
                    completion_tokens: to_i32(meta.usage.completion_tokens),
                    estimated_cost_usd: meta.estimated_cost_usd,
                    fallback: meta.fallback,
                })
                .returning(recipes::id)
                .get_result(conn)
                .map_err(backend)
        })
        .await
    }

    async fn get(&self, owner: Uuid, id: RecipeId) -> Result<StoredRecipe, StoreError> {
        self.with_conn(move |conn| to_stored(owned_row(conn, owner, id)?))
            .await
    }

    async fn list(&self, owner: Uuid) -> Result<Vec<StoredRecipe>, StoreError> {
        self.with_conn(move |conn| {
            recipes::table
                .filter(recipes::user_id.eq(owner))
                .filter(recipes::deleted_at.is_null())
                .order(recipes::id.desc())
                .select(RecipeRow::as_select())
                .load(conn)
                .map_err(backend)?
                .into_iter()
                .map(to_stored)
                .collect()
        })
        .await
    }

    async fn update(
        &self,
        owner: Uuid,
        id: RecipeId,
        recipe: &GeneratedRecipe,
    ) -> Result<StoredRecipe, StoreError> {
        let body = encode_recipe(recipe)?;
        let title = recipe.title.clone();

        self.with_conn(move |conn| {
            let row = diesel::update(
                recipes::table
                    .filter(recipes::id.eq(id))
                    .filter(recipes::user_id.eq(owner))
                    .filter(recipes::deleted_at.is_null()),
            )
            .set((
                recipes::title.eq(&title),
                recipes::body.eq(body),
                recipes::updated_at.eq(Utc::now()),
            ))
            .returning(RecipeRow::as_returning())
            .get_result(conn)
            .optional()
            .map_err(backend)?
            .ok_or(StoreError::NotFoundOrForbidden)?;
            to_stored(row)
        })
        .await
    }

    async fn delete(&self, owner: Uuid, id: RecipeId) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let updated = diesel::update(
                recipes::table
                    .filter(recipes::id.eq(id))
                    .filter(recipes::user_id.eq(owner))
                    .filter(recipes::deleted_at.is_null()),
            )
            .set(recipes::deleted_at.eq(Some(Utc::now())))
            .execute(conn)
            .map_err(backend)?;

            match updated {
                0 => Err(StoreError::NotFoundOrForbidden),
                _ => Ok(()),
            }
        })
        .await
    }

    async fn append_message(
        &self,
        owner: Uuid,
        recipe_id: RecipeId,
        turn: &ChatTurn,
    ) -> Result<(), StoreError> {
        let turn = turn.clone();

        self.with_conn(move |conn| {
            owned_row(conn, owner, recipe_id)?;
            diesel::insert_into(chat_messages::table)
                .values(&NewChatMessage {
                    recipe_id,
                    user_id: owner,
                    role: turn.role.as_str(),
                    content: &turn.content,
                })
                .execute(conn)
                .map_err(backend)?;
            Ok(())
        })
        .await
    }

    async fn chat_history(
        &self,
        owner: Uuid,
        recipe_id: RecipeId,
    ) -> Result<Vec<ChatTurn>, StoreError> {
        self.with_conn(move |conn| {
            owned_row(conn, owner, recipe_id)?;
            chat_messages::table
                .filter(chat_messages::recipe_id.eq(recipe_id))
                .order(chat_messages::id.asc())
                .select(ChatMessageRow::as_select())
                .load(conn)
                .map_err(backend)?
                .into_iter()
                .map(to_turn)
                .collect()
        })
        .await
    }

    async fn recent_messages(
        &self,
        owner: Uuid,
        recipe_id: RecipeId,
        limit: usize,
    ) -> Result<Vec<ChatTurn>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.with_conn(move |conn| {
            owned_row(conn, owner, recipe_id)?;
            let mut rows = chat_messages::table
                .filter(chat_messages::recipe_id.eq(recipe_id))
                .order(chat_messages::id.desc())
                .limit(limit)
                .select(ChatMessageRow::as_select())
                .load(conn)
                .map_err(backend)?;
            rows.reverse();
            rows.into_iter().map(to_turn).collect()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sous_core::fallback_recipe;

    fn row(body: serde_json::Value) -> RecipeRow {
        let now = Utc::now();
        RecipeRow {
            id: 7,
            user_id: Uuid::new_v4(),
            title: "Simple Tomato Pasta".to_string(),
            body,
            model: "gpt-4o-mini".to_string(),
            prompt_tokens: 120,
            completion_tokens: 480,
            estimated_cost_usd: 0.0003,
            fallback: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_round_trips_recipe_and_meta() {
        let recipe = fallback_recipe();
        let stored = to_stored(row(encode_recipe(&recipe).unwrap())).unwrap();

        assert_eq!(stored.id, 7);
        assert_eq!(stored.recipe, recipe);
        assert_eq!(stored.meta.usage.total_tokens, 600);
        assert_eq!(stored.meta.model, "gpt-4o-mini");
    }

    #[test]
    fn test_corrupt_body_is_backend_error() {
        let err = to_stored(row(serde_json::json!({"nope": true}))).unwrap_err();
        assert!(matches!(err, StoreError::Backend(message) if message.contains("corrupt recipe 7")));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let turn = to_turn(ChatMessageRow {
            role: "system".to_string(),
            content: "hi".to_string(),
        });
        assert!(turn.is_err());

        let turn = to_turn(ChatMessageRow {
            role: "assistant".to_string(),
            content: "hi".to_string(),
        })
        .unwrap();
        assert_eq!(turn, ChatTurn::assistant("hi"));
    }

    #[test]
    fn test_token_counts_saturate() {
        assert_eq!(to_i32(u32::MAX), i32::MAX);
        assert_eq!(to_i32(42), 42);
    }
}
