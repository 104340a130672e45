use crate::error::{Error, Result};

/// Header carrying the pre-shared service key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// How the service-key check behaves for this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceKeyMode {
    /// Every gated request must present this key.
    Required(String),
    /// No key configured; the check is skipped and each skip is logged.
    /// Only reachable through an explicit insecure configuration.
    Disabled,
}

impl ServiceKeyMode {
    /// Checks the key presented by a request.
    ///
    /// Missing key is `Unauthenticated`, a wrong key is `Forbidden`.
    pub fn check(&self, presented: Option<&str>) -> Result<()> {
        match self {
            ServiceKeyMode::Disabled => {
                tracing::warn!("Service key check skipped: no API key configured, API is unprotected");
                Ok(())
            }
            ServiceKeyMode::Required(expected) => match presented {
                None => Err(Error::Unauthenticated),
                Some(key) if constant_time_eq(key.as_bytes(), expected.as_bytes()) => Ok(()),
                Some(_) => Err(Error::Forbidden("Invalid API key".to_string())),
            },
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_key_accepts_match() {
        let mode = ServiceKeyMode::Required("s3cret".to_string());
        assert!(mode.check(Some("s3cret")).is_ok());
    }

    #[test]
    fn test_required_key_missing_is_unauthenticated() {
        let mode = ServiceKeyMode::Required("s3cret".to_string());
        assert!(matches!(mode.check(None), Err(Error::Unauthenticated)));
    }

    #[test]
    fn test_required_key_wrong_is_forbidden() {
        let mode = ServiceKeyMode::Required("s3cret".to_string());
        assert!(matches!(mode.check(Some("nope")), Err(Error::Forbidden(_))));
        assert!(matches!(mode.check(Some("s3cret ")), Err(Error::Forbidden(_))));
    }

    #[test]
    fn test_disabled_skips_check() {
        assert!(ServiceKeyMode::Disabled.check(None).is_ok());
        assert!(ServiceKeyMode::Disabled.check(Some("anything")).is_ok());
    }
}
