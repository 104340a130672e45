//! Role and ownership rules applied after a caller is identified.

use crate::error::{Error, Result};
use crate::types::{Comment, User};

pub fn require_admin(user: &User) -> Result<()> {
    if !user.is_admin() {
        return Err(Error::Forbidden("Admin access required".to_string()));
    }
    Ok(())
}

/// An admin may ban or unban anyone except themselves and other admins.
pub fn check_ban_target(actor: &User, target: &User) -> Result<()> {
    require_admin(actor)?;
    if actor.id == target.id {
        return Err(Error::Forbidden("Cannot ban yourself".to_string()));
    }
    if target.is_admin() {
        return Err(Error::Forbidden("Cannot ban another admin".to_string()));
    }
    Ok(())
}

/// True iff `user` wrote `comment`. Editing is limited to this case.
#[must_use]
pub fn can_mutate(user: &User, comment: &Comment) -> bool {
    user.id == comment.author_id
}

/// Authors may delete their comments; admins may delete any comment.
#[must_use]
pub fn can_delete(user: &User, comment: &Comment) -> bool {
    can_mutate(user, comment) || user.is_admin()
}
