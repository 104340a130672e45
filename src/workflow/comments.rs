use chrono::Utc;

use super::validation::validate_comment_content;
use crate::auth::guard::{can_delete, can_mutate};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Comment, User};

pub fn add_comment(store: &dyn Store, author: &User, project_id: i64, content: &str) -> Result<Comment> {
    let content = validate_comment_content(content)?;
    if store.get_published_project(project_id)?.is_none() {
        return Err(Error::NotFound);
    }
    let comment = store.create_comment(project_id, &author.id, content)?;
    tracing::info!(comment_id = comment.id, project_id, "Comment added");
    Ok(comment)
}

/// Replaces the body of a comment. Only its author may do this.
pub fn edit_comment(store: &dyn Store, user: &User, comment_id: i64, content: &str) -> Result<Comment> {
    let content = validate_comment_content(content)?;
    let comment = store.get_comment(comment_id)?.ok_or(Error::NotFound)?;
    if !can_mutate(user, &comment) {
        return Err(Error::Forbidden(
            "You can only edit your own comments".to_string(),
        ));
    }

    // Keep updated_at strictly after the previous value even within one clock tick.
    let now = Utc::now();
    let updated_at = if now > comment.updated_at {
        now
    } else {
        comment.updated_at + chrono::Duration::milliseconds(1)
    };

    store.update_comment_content(comment_id, content, updated_at)
}

pub fn remove_comment(store: &dyn Store, user: &User, comment_id: i64) -> Result<()> {
    let comment = store.get_comment(comment_id)?.ok_or(Error::NotFound)?;
    if !can_delete(user, &comment) {
        return Err(Error::Forbidden(
            "You can only delete your own comments".to_string(),
        ));
    }
    if !store.delete_comment(comment_id)? {
        return Err(Error::NotFound);
    }
    tracing::info!(comment_id, by = %user.id, "Comment deleted");
    Ok(())
}
