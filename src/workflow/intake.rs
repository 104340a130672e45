use chrono::{DateTime, Utc};

use super::validation::{validate_demo_url, validate_repository_url, validate_title};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::text::{generate_slug, unique_slug};
use crate::types::{PendingProject, ProjectDetails, format_student_ids};

/// A project as proposed by a submitter, before a slug is assigned.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub title: String,
    pub repository_url: String,
    pub student_ids: Vec<i64>,
    pub image: Option<String>,
    pub curriculum_project_id: Option<i64>,
    pub demo_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates a submission and queues it for review.
///
/// Nothing is written unless every check passes. The repository URL and slug
/// checks read a snapshot; the storage constraints reject a submission that
/// raced past them with the same `Duplicate` error.
pub fn submit_project(
    store: &dyn Store,
    submission: Submission,
    submitted_by: Option<&str>,
) -> Result<PendingProject> {
    let title = submission.title.trim().to_string();
    validate_title(&title)?;

    let repository_url = submission.repository_url.trim().to_string();
    if repository_url.is_empty() {
        return Err(Error::validation("Repository URL is required"));
    }
    validate_repository_url(&repository_url)?;

    let demo_url = non_blank(submission.demo_url);
    if let Some(url) = &demo_url {
        validate_demo_url(url)?;
    }

    // Stored as given; repeats collapse when the row is materialized.
    let student_ids = submission.student_ids;
    if student_ids.is_empty() {
        return Err(Error::validation("At least one student is required"));
    }
    for id in &student_ids {
        if store.get_student(*id)?.is_none() {
            return Err(Error::validation(format!("Unknown student id {id}")));
        }
    }

    if let Some(id) = submission.curriculum_project_id {
        if store.get_curriculum_project(id)?.is_none() {
            return Err(Error::validation(format!("Unknown curriculum project id {id}")));
        }
    }

    if store.repository_url_exists(&repository_url)? {
        return Err(Error::duplicate("Repository URL exists"));
    }

    let base = generate_slug(&title);
    if base.is_empty() {
        return Err(Error::validation(
            "Title must contain at least one letter or digit",
        ));
    }
    let taken = store.list_project_slugs(&base)?;
    let slug = unique_slug(&base, &taken);

    let details = ProjectDetails {
        title,
        image: non_blank(submission.image),
        slug,
        curriculum_project_id: submission.curriculum_project_id,
        repository_url,
        demo_url,
        published_at: submission.published_at,
    };

    let pending =
        store.create_pending_project(&details, &format_student_ids(&student_ids), submitted_by)?;

    tracing::info!(
        pending_id = pending.id,
        slug = %pending.details.slug,
        "Project submitted for review"
    );

    Ok(pending)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::store::SqliteStore;

    fn seeded_store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let cohort = store.create_cohort("Promo 1", start).unwrap();
        store.create_student("Ada", "ada", cohort.id).unwrap();
        store.create_student("Grace", "grace", cohort.id).unwrap();
        store.create_curriculum_project("AdaCheck").unwrap();
        store
    }

    fn submission(title: &str, url: &str) -> Submission {
        Submission {
            title: title.to_string(),
            repository_url: url.to_string(),
            student_ids: vec![1, 2, 1],
            ..Default::default()
        }
    }

    #[test]
    fn test_submit_creates_pending_with_slug() {
        let store = seeded_store();
        let pending = submit_project(
            &store,
            submission("Théâtre Quiz", "https://github.com/ada/quiz"),
            None,
        )
        .unwrap();

        assert_eq!(pending.details.slug, "theatre-quiz");
        assert_eq!(pending.student_ids, "1,2,1");
        assert_eq!(pending.materialize().unwrap().student_ids, vec![1, 2]);
        assert_eq!(store.list_pending_projects().unwrap().len(), 1);
    }

    #[test]
    fn test_same_title_gets_suffix() {
        let store = seeded_store();
        submit_project(&store, submission("Quiz", "https://github.com/ada/one"), None).unwrap();
        let second =
            submit_project(&store, submission("Quiz", "https://github.com/ada/two"), None)
                .unwrap();
        let third =
            submit_project(&store, submission("Quiz", "https://github.com/ada/three"), None)
                .unwrap();

        assert_eq!(second.details.slug, "quiz-1");
        assert_eq!(third.details.slug, "quiz-2");
    }

    #[test]
    fn test_duplicate_repository_url_is_rejected() {
        let store = seeded_store();
        let url = "https://github.com/ada/quiz";
        submit_project(&store, submission("Quiz", url), None).unwrap();

        let err = submit_project(&store, submission("Other", url), None).unwrap_err();
        assert!(matches!(err, Error::Duplicate(msg) if msg == "Repository URL exists"));
        assert_eq!(store.list_pending_projects().unwrap().len(), 1);
    }

    #[test]
    fn test_published_repository_url_is_rejected() {
        let store = seeded_store();
        let url = "https://github.com/ada/quiz";
        let first = submit_project(&store, submission("Quiz", url), None).unwrap();
        crate::workflow::approve(&store, first.id).unwrap();

        let err = submit_project(&store, submission("Quiz Again", url), None).unwrap_err();
        assert!(matches!(err, Error::Duplicate(msg) if msg == "Repository URL exists"));
        assert!(store.list_pending_projects().unwrap().is_empty());
        assert_eq!(store.list_published_projects().unwrap().len(), 1);
    }

    #[test]
    fn test_validation_failures_write_nothing() {
        let store = seeded_store();

        let cases = [
            submission("", "https://github.com/ada/a"),
            submission("Quiz", ""),
            submission("Quiz", "https://github.com/ada/a/tree/main"),
            submission("!!!", "https://github.com/ada/b"),
            Submission {
                student_ids: vec![],
                ..submission("Quiz", "https://github.com/ada/c")
            },
            Submission {
                student_ids: vec![99],
                ..submission("Quiz", "https://github.com/ada/d")
            },
            Submission {
                curriculum_project_id: Some(42),
                ..submission("Quiz", "https://github.com/ada/e")
            },
        ];

        for case in cases {
            let err = submit_project(&store, case, None).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "unexpected {err:?}");
        }
        assert!(store.list_pending_projects().unwrap().is_empty());
    }

    #[test]
    fn test_blank_optionals_are_dropped() {
        let store = seeded_store();
        let pending = submit_project(
            &store,
            Submission {
                image: Some("  ".to_string()),
                demo_url: Some(String::new()),
                curriculum_project_id: Some(1),
                ..submission("Quiz", "https://github.com/ada/quiz")
            },
            None,
        )
        .unwrap();

        assert_eq!(pending.details.image, None);
        assert_eq!(pending.details.demo_url, None);
        assert_eq!(pending.details.curriculum_project_id, Some(1));
    }
}
