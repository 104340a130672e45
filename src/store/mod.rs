mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Cohort operations
    fn create_cohort(&self, name: &str, start_date: NaiveDate) -> Result<Cohort>;
    fn get_cohort(&self, id: i64) -> Result<Option<Cohort>>;
    fn list_cohorts(&self) -> Result<Vec<Cohort>>;

    // Curriculum project operations
    fn create_curriculum_project(&self, name: &str) -> Result<CurriculumProject>;
    fn get_curriculum_project(&self, id: i64) -> Result<Option<CurriculumProject>>;
    fn list_curriculum_projects(&self) -> Result<Vec<CurriculumProject>>;

    // Student operations
    fn create_student(&self, name: &str, github_username: &str, cohort_id: i64) -> Result<Student>;
    fn get_student(&self, id: i64) -> Result<Option<Student>>;
    fn list_students(&self) -> Result<Vec<Student>>;

    // Published project operations (many-to-many with students)
    fn list_published_projects(&self) -> Result<Vec<ProjectWithStudents>>;
    fn get_published_project(&self, id: i64) -> Result<Option<ProjectWithStudents>>;
    fn get_published_project_by_slug(&self, slug: &str) -> Result<Option<ProjectWithStudents>>;

    // Pending project operations
    fn create_pending_project(
        &self,
        details: &ProjectDetails,
        student_ids: &str,
        submitted_by: Option<&str>,
    ) -> Result<PendingProject>;
    fn get_pending_project(&self, id: i64) -> Result<Option<PendingProject>>;
    fn list_pending_projects(&self) -> Result<Vec<PendingProject>>;
    fn delete_pending_project(&self, id: i64) -> Result<bool>;

    /// Removes the pending row, inserts the published row and its student
    /// associations as one transaction. Fails with `NotFound` and changes
    /// nothing if the pending row is already gone.
    fn publish_pending_project(&self, project: &Materialized) -> Result<PublishedProject>;

    // Uniqueness lookups across pending and published projects
    fn repository_url_exists(&self, url: &str) -> Result<bool>;
    /// Slugs equal to `base` or of the form `base-*`.
    fn list_project_slugs(&self, base: &str) -> Result<HashSet<String>>;

    // Comment operations
    fn create_comment(&self, project_id: i64, author_id: &str, content: &str) -> Result<Comment>;
    fn get_comment(&self, id: i64) -> Result<Option<Comment>>;
    fn list_project_comments(&self, project_id: i64) -> Result<Vec<CommentWithAuthor>>;
    fn update_comment_content(
        &self,
        id: i64,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Comment>;
    fn delete_comment(&self, id: i64) -> Result<bool>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;
    fn set_user_banned(&self, id: &str, banned: bool) -> Result<User>;
    fn has_admin_user(&self) -> Result<bool>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>>;
}
