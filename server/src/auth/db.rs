use crate::db::DbPool;
use crate::models::{NewSession, User};
use crate::schema::{sessions, users};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use std::sync::Arc;

use super::crypto::{generate_token, hash_token};

/// Fixed token for the test user "t" - allows persistent sessions across database resets
const DEV_TEST_TOKEN: &str = "tttttttttttttttttttttttttttttttttttttttttttttttttttttttttttttttt";

const SESSION_DAYS: i64 = 30;

/// The fixed session token for `username`, if it has one.
/// Only debug builds hand out the dev token; release builds always mint a random one.
pub fn fixed_token_for(username: &str) -> Option<&'static str> {
    (cfg!(debug_assertions) && username.eq_ignore_ascii_case("t")).then_some(DEV_TEST_TOKEN)
}

pub fn create_session_with_token(
    conn: &mut PgConnection,
    user_id: uuid::Uuid,
    fixed_token: Option<&str>,
) -> Result<String, diesel::result::Error> {
    let token = fixed_token
        .map(|t| t.to_string())
        .unwrap_or_else(generate_token);
    let token_hash = hash_token(&token);
    let expires_at = Utc::now() + Duration::days(SESSION_DAYS);

    let new_session = NewSession {
        user_id,
        token_hash: &token_hash,
        expires_at,
    };

    diesel::insert_into(sessions::table)
        .values(&new_session)
        .on_conflict(sessions::token_hash)
        .do_update()
        .set(sessions::expires_at.eq(expires_at))
        .execute(conn)?;

    Ok(token)
}

/// The live user behind an unexpired session token.
pub async fn get_user_from_token(pool: &Arc<DbPool>, token: &str) -> Option<User> {
    let pool = pool.clone();
    let token_hash = hash_token(token);

    let lookup = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get().map_err(|e| e.to_string())?;
        sessions::table
            .inner_join(users::table)
            .filter(sessions::token_hash.eq(&token_hash))
            .filter(sessions::expires_at.gt(Utc::now()))
            .filter(users::deleted_at.is_null())
            .select(User::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| e.to_string())
    })
    .await;

    match lookup {
        Ok(Ok(user)) => user,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Session lookup failed");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session lookup task failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_user_t_gets_fixed_token() {
        assert_eq!(fixed_token_for("alice"), None);
        assert_eq!(fixed_token_for("tt"), None);
        assert_eq!(fixed_token_for(""), None);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_debug_build_uses_dev_token() {
        assert_eq!(fixed_token_for("t"), Some(DEV_TEST_TOKEN));
        assert_eq!(fixed_token_for("T"), Some(DEV_TEST_TOKEN));
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn test_release_build_has_no_dev_token() {
        assert_eq!(fixed_token_for("t"), None);
    }
}
