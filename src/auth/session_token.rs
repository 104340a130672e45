use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::Session;

const ARGON2_MEMORY: u32 = 19 * 1024;
const ARGON2_ITERATIONS: u32 = 2;
const ARGON2_PARALLELISM: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 32;

const TOKEN_PREFIX: &str = "adaverse";
const LOOKUP_LENGTH: usize = 8;
const SECRET_BYTES: usize = 16;
const SECRET_LENGTH: usize = SECRET_BYTES * 2;

/// Issues and verifies session bearer tokens of the form
/// `adaverse_<lookup>_<secret>`. Only the Argon2id hash is persisted.
pub struct SessionTokens {
    argon2: Argon2<'static>,
}

impl Default for SessionTokens {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTokens {
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(
            ARGON2_MEMORY,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(ARGON2_OUTPUT_LEN),
        )
        .unwrap_or_default();

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Creates a session for `user_id`. Returns the raw token, shown once,
    /// and the session record to persist.
    pub fn issue(&self, user_id: &str, ttl: Option<Duration>) -> Result<(String, Session)> {
        let lookup = generate_lookup();
        let raw_token = format!("{TOKEN_PREFIX}_{lookup}_{}", generate_secret());
        let now = Utc::now();

        let session = Session {
            id: Uuid::new_v4().to_string(),
            token_hash: self.hash(&raw_token)?,
            token_lookup: lookup,
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: ttl.map(|ttl| now + ttl),
        };
        Ok((raw_token, session))
    }

    fn hash(&self, token: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(token.as_bytes(), &salt)
            .map_err(|e| Error::Internal(format!("failed to hash session token: {e}")))?;
        Ok(hash.to_string())
    }

    /// Verifies a raw token against a stored hash
    pub fn verify(&self, token: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| Error::Internal(format!("invalid session hash format: {e}")))?;

        match self.argon2.verify_password(token.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Internal(format!("failed to verify session token: {e}"))),
        }
    }
}

fn generate_lookup() -> String {
    Uuid::new_v4().simple().to_string()[..LOOKUP_LENGTH].to_string()
}

fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Extracts the lookup part of a raw session token.
/// Returns `None` for anything not shaped like one of ours.
#[must_use]
pub fn token_lookup(token: &str) -> Option<&str> {
    let rest = token.strip_prefix(TOKEN_PREFIX)?.strip_prefix('_')?;
    let (lookup, secret) = rest.split_once('_')?;

    if lookup.len() != LOOKUP_LENGTH || secret.len() != SECRET_LENGTH {
        return None;
    }
    if hex::decode(lookup).is_err() || hex::decode(secret).is_err() {
        return None;
    }
    Some(lookup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_format() {
        let tokens = SessionTokens::new();
        let (raw, session) = tokens.issue("user-1", None).unwrap();

        assert!(raw.starts_with("adaverse_"));
        let secret = raw.rsplit('_').next().unwrap();
        assert_eq!(hex::decode(secret).unwrap().len(), SECRET_BYTES);
        assert_eq!(token_lookup(&raw), Some(session.token_lookup.as_str()));
        assert_eq!(session.user_id, "user-1");
        assert!(session.expires_at.is_none());
        assert!(session.token_hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_issue_with_ttl_sets_expiry() {
        let tokens = SessionTokens::new();
        let (_, session) = tokens.issue("user-1", Some(Duration::hours(1))).unwrap();
        assert!(session.expires_at.unwrap() > session.created_at);
    }

    #[test]
    fn test_verify_correct_and_wrong() {
        let tokens = SessionTokens::new();
        let (raw, session) = tokens.issue("user-1", None).unwrap();

        assert!(tokens.verify(&raw, &session.token_hash).unwrap());

        let mut wrong = raw.clone();
        wrong.pop();
        wrong.push(if raw.ends_with('0') { '1' } else { '0' });
        assert!(!tokens.verify(&wrong, &session.token_hash).unwrap());
    }

    #[test]
    fn test_token_lookup_rejects_malformed() {
        assert_eq!(token_lookup("other_12345678_abc"), None);
        assert_eq!(token_lookup("adaverse_12345678"), None);
        assert_eq!(token_lookup("adaverse_1234567g_00000000000000000000000000000000"), None);
        assert_eq!(
            token_lookup("adaverse_1234abcd_00000000000000000000000000000000"),
            Some("1234abcd")
        );
    }
}
