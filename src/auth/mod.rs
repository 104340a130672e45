pub mod guard;
mod middleware;
mod service_key;
mod session_token;

pub use middleware::{AuthError, OptionalSession, RequireAdmin, ServiceKey, SessionUser};
pub use service_key::{API_KEY_HEADER, ServiceKeyMode};
pub use session_token::{SessionTokens, token_lookup};
