use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::SessionTokens;
use crate::auth::guard::check_ban_target;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Role, User};

const SESSION_ISSUE_ATTEMPTS: usize = 3;

/// Registers a user on behalf of the identity collaborator.
pub fn create_user(store: &dyn Store, name: &str, email: &str, role: Role) -> Result<User> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() {
        return Err(Error::validation("Name is required"));
    }
    if !email.contains('@') {
        return Err(Error::validation("Email must be a valid address"));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role,
        banned: false,
        created_at: now,
        updated_at: now,
    };
    store.create_user(&user)?;
    tracing::info!(user_id = %user.id, role = %user.role, "User created");
    Ok(user)
}

/// Opens a session for `user_id` and returns the raw bearer token.
/// A lookup prefix collision is retried with a fresh token.
pub fn open_session(store: &dyn Store, user_id: &str, ttl: Option<Duration>) -> Result<String> {
    let tokens = SessionTokens::new();
    for _ in 0..SESSION_ISSUE_ATTEMPTS {
        let (raw_token, session) = tokens.issue(user_id, ttl)?;
        match store.create_session(&session) {
            Ok(()) => return Ok(raw_token),
            Err(Error::SessionLookupCollision) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(Error::Internal(
        "could not allocate a unique session token".to_string(),
    ))
}

/// Sets the banned flag on `target_id` on behalf of `actor`.
///
/// Rejected without any write when the actor is not an admin, targets
/// themselves, or targets another admin.
pub fn set_banned(store: &dyn Store, actor: &User, target_id: &str, banned: bool) -> Result<User> {
    let target = store.get_user(target_id)?.ok_or(Error::NotFound)?;
    check_ban_target(actor, &target)?;

    let updated = store.set_user_banned(target_id, banned)?;
    tracing::info!(
        target = %updated.id,
        by = %actor.id,
        banned,
        "User ban status changed"
    );
    Ok(updated)
}
