//! Domain operations shared by the HTTP handlers and the import command.

pub mod catalog;
mod comments;
mod intake;
pub mod moderation;
mod users;
pub mod validation;

pub use catalog::{ProjectFilter, SortOrder};
pub use comments::{add_comment, edit_comment, remove_comment};
pub use intake::{Submission, submit_project};
pub use moderation::{BatchFailure, BatchReport, approve, approve_all, reject, reject_all};
pub use users::{create_user, open_session, set_banned};
