use crate::error::{Error, Result};

const MAX_TITLE_LEN: usize = 200;
const MAX_COMMENT_LEN: usize = 5000;
const REPOSITORY_HOSTS: [&str; 2] = ["github.com", "www.github.com"];

fn is_valid_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

/// Accepts `http(s)://github.com/<owner>/<repo>` and nothing more:
/// no trailing path, slash, query or fragment.
pub fn validate_repository_url(url: &str) -> Result<()> {
    let invalid = || {
        Error::validation("Repository URL must look like https://github.com/<owner>/<repo>")
    };

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(invalid)?;

    let mut segments = rest.split('/');
    let host = segments.next().ok_or_else(invalid)?;
    if !REPOSITORY_HOSTS.contains(&host.to_ascii_lowercase().as_str()) {
        return Err(invalid());
    }

    let (Some(owner), Some(repo), None) = (segments.next(), segments.next(), segments.next())
    else {
        return Err(invalid());
    };

    let valid_segment = |s: &str| {
        !s.is_empty() && s != "." && s != ".." && s.chars().all(is_valid_segment_char)
    };
    if !valid_segment(owner) || !valid_segment(repo) {
        return Err(invalid());
    }

    Ok(())
}

/// Demo links only need to be absolute http(s) URLs.
pub fn validate_demo_url(url: &str) -> Result<()> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or("");
    if rest.is_empty() || rest.starts_with('/') || rest.chars().any(char::is_whitespace) {
        return Err(Error::validation("Demo URL must be an absolute http(s) URL"));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<()> {
    if title.is_empty() {
        return Err(Error::validation("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::validation(format!(
            "Title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Returns the trimmed comment body.
pub fn validate_comment_content(content: &str) -> Result<&str> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Content cannot be empty"));
    }
    if trimmed.chars().count() > MAX_COMMENT_LEN {
        return Err(Error::validation(format!(
            "Content cannot exceed {MAX_COMMENT_LEN} characters"
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_url_accepts_owner_repo() {
        assert!(validate_repository_url("https://github.com/ada/quiz").is_ok());
        assert!(validate_repository_url("http://www.github.com/Ada-Tech/my_repo.js").is_ok());
    }

    #[test]
    fn test_repository_url_rejects_extra_parts() {
        for url in [
            "https://github.com/ada/quiz/",
            "https://github.com/ada/quiz/tree/main",
            "https://github.com/ada",
            "https://github.com//quiz",
            "https://gitlab.com/ada/quiz",
            "github.com/ada/quiz",
            "https://github.com/ada/quiz?tab=readme",
            "https://github.com/ada/quiz#readme",
            "https://github.com/../quiz",
        ] {
            assert!(
                matches!(validate_repository_url(url), Err(Error::Validation(_))),
                "accepted {url}"
            );
        }
    }

    #[test]
    fn test_demo_url() {
        assert!(validate_demo_url("https://ada.github.io/quiz").is_ok());
        assert!(validate_demo_url("ada.github.io").is_err());
        assert!(validate_demo_url("https://").is_err());
    }

    #[test]
    fn test_title_limits() {
        assert!(validate_title("Ada Quiz").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title(&"a".repeat(201)).is_err());
    }

    #[test]
    fn test_comment_content_trimmed() {
        assert_eq!(validate_comment_content("  hello ").unwrap(), "hello");
        assert!(validate_comment_content("   ").is_err());
    }
}
