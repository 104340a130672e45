mod admin;
mod catalog;
mod comments;
pub mod dto;
mod moderation;
pub mod response;
mod router;

pub use admin::admin_router;
pub use catalog::catalog_router;
pub use comments::comments_router;
pub use moderation::moderation_router;
pub use router::{AppState, create_router};
