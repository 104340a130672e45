use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, ffi, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::text::normalize_text;
use crate::types::*;

const PENDING_COLUMNS: &str = "id, title, image, slug, curriculum_project_id, repository_url, \
     demo_url, student_ids, submitted_by, created_at, published_at";

const PUBLISHED_COLUMNS: &str = "id, title, image, slug, curriculum_project_id, repository_url, \
     demo_url, submitted_by, created_at, published_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database. Handy for tests and dry runs.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn get_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn get_role(row: &Row<'_>, idx: usize) -> rusqlite::Result<Role> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
    })
}

fn student_key(name: &str, github_username: &str) -> String {
    format!("{}\u{0}{}", normalize_text(name), normalize_text(github_username))
}

/// Maps uniqueness violations to `Duplicate` and broken references to
/// `Validation`; everything else stays a database error.
fn map_constraint(e: rusqlite::Error, duplicate: &str) -> Error {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            match err.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE
                | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                | ffi::SQLITE_CONSTRAINT_TRIGGER => Error::duplicate(duplicate),
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    Error::validation("referenced record does not exist")
                }
                _ => Error::from(e),
            }
        }
        _ => Error::from(e),
    }
}

/// Publishing references rows that intake already checked, so a missing
/// one is a server-side failure rather than bad input.
fn map_publish_error(e: rusqlite::Error, duplicate: &str) -> Error {
    match map_constraint(e, duplicate) {
        Error::Validation(message) => Error::Internal(format!("publish failed: {message}")),
        other => other,
    }
}

fn cohort_from_row(row: &Row<'_>) -> rusqlite::Result<Cohort> {
    Ok(Cohort {
        id: row.get(0)?,
        name: row.get(1)?,
        start_date: get_date(row, 2)?,
    })
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        github_username: row.get(2)?,
        cohort_id: row.get(3)?,
    })
}

fn pending_from_row(row: &Row<'_>) -> rusqlite::Result<PendingProject> {
    Ok(PendingProject {
        id: row.get(0)?,
        details: ProjectDetails {
            title: row.get(1)?,
            image: row.get(2)?,
            slug: row.get(3)?,
            curriculum_project_id: row.get(4)?,
            repository_url: row.get(5)?,
            demo_url: row.get(6)?,
            published_at: row.get::<_, Option<String>>(10)?.map(|s| parse_datetime(&s)),
        },
        student_ids: row.get(7)?,
        submitted_by: row.get(8)?,
        created_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

fn published_from_row(row: &Row<'_>) -> rusqlite::Result<PublishedProject> {
    Ok(PublishedProject {
        id: row.get(0)?,
        details: ProjectDetails {
            title: row.get(1)?,
            image: row.get(2)?,
            slug: row.get(3)?,
            curriculum_project_id: row.get(4)?,
            repository_url: row.get(5)?,
            demo_url: row.get(6)?,
            published_at: row.get::<_, Option<String>>(9)?.map(|s| parse_datetime(&s)),
        },
        submitted_by: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        content: row.get(1)?,
        project_id: row.get(2)?,
        author_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: get_role(row, 3)?,
        banned: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

/// Student summaries keyed by project id, in association order.
fn load_project_students(
    conn: &Connection,
    project_id: Option<i64>,
) -> Result<HashMap<i64, Vec<StudentSummary>>> {
    let mut stmt = conn.prepare(
        "SELECT ps.project_id, s.id, s.name, s.github_username, s.cohort_id
         FROM project_students ps JOIN students s ON s.id = ps.student_id
         WHERE ?1 IS NULL OR ps.project_id = ?1
         ORDER BY ps.rowid",
    )?;

    let rows = stmt.query_map(params![project_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            StudentSummary {
                id: row.get(1)?,
                name: row.get(2)?,
                github_username: row.get(3)?,
                cohort_id: row.get(4)?,
            },
        ))
    })?;

    let mut by_project: HashMap<i64, Vec<StudentSummary>> = HashMap::new();
    for row in rows {
        let (project_id, student) = row?;
        by_project.entry(project_id).or_default().push(student);
    }
    Ok(by_project)
}

fn get_published_where(
    conn: &Connection,
    clause: &str,
    param: &dyn rusqlite::ToSql,
) -> Result<Option<ProjectWithStudents>> {
    let project = conn
        .query_row(
            &format!("SELECT {PUBLISHED_COLUMNS} FROM published_projects WHERE {clause}"),
            [param],
            published_from_row,
        )
        .optional()?;

    let Some(project) = project else {
        return Ok(None);
    };

    let students = load_project_students(conn, Some(project.id))?
        .remove(&project.id)
        .unwrap_or_default();
    Ok(Some(ProjectWithStudents { project, students }))
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Cohort operations

    fn create_cohort(&self, name: &str, start_date: NaiveDate) -> Result<Cohort> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO cohorts (name, normalized_name, start_date) VALUES (?1, ?2, ?3)",
            params![
                name,
                normalize_text(name),
                start_date.format("%Y-%m-%d").to_string()
            ],
        )
        .map_err(|e| map_constraint(e, "cohort name or start date already exists"))?;

        Ok(Cohort {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            start_date,
        })
    }

    fn get_cohort(&self, id: i64) -> Result<Option<Cohort>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, start_date FROM cohorts WHERE id = ?1",
            params![id],
            cohort_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_cohorts(&self) -> Result<Vec<Cohort>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, name, start_date FROM cohorts ORDER BY start_date, id")?;

        let rows = stmt.query_map([], cohort_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Curriculum project operations

    fn create_curriculum_project(&self, name: &str) -> Result<CurriculumProject> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO curriculum_projects (name, normalized_name) VALUES (?1, ?2)",
            params![name, normalize_text(name)],
        )
        .map_err(|e| map_constraint(e, "curriculum project already exists"))?;

        Ok(CurriculumProject {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    fn get_curriculum_project(&self, id: i64) -> Result<Option<CurriculumProject>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name FROM curriculum_projects WHERE id = ?1",
            params![id],
            |row| {
                Ok(CurriculumProject {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_curriculum_projects(&self) -> Result<Vec<CurriculumProject>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name FROM curriculum_projects ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(CurriculumProject {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Student operations

    fn create_student(&self, name: &str, github_username: &str, cohort_id: i64) -> Result<Student> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO students (name, github_username, normalized_key, cohort_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, github_username, student_key(name, github_username), cohort_id],
        )
        .map_err(|e| map_constraint(e, "student already exists"))?;

        Ok(Student {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            github_username: github_username.to_string(),
            cohort_id,
        })
    }

    fn get_student(&self, id: i64) -> Result<Option<Student>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, github_username, cohort_id FROM students WHERE id = ?1",
            params![id],
            student_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_students(&self) -> Result<Vec<Student>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, name, github_username, cohort_id FROM students ORDER BY id")?;

        let rows = stmt.query_map([], student_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Published project operations

    fn list_published_projects(&self) -> Result<Vec<ProjectWithStudents>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PUBLISHED_COLUMNS} FROM published_projects ORDER BY id"
        ))?;

        let projects = stmt
            .query_map([], published_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut students = load_project_students(&conn, None)?;

        Ok(projects
            .into_iter()
            .map(|project| {
                let students = students.remove(&project.id).unwrap_or_default();
                ProjectWithStudents { project, students }
            })
            .collect())
    }

    fn get_published_project(&self, id: i64) -> Result<Option<ProjectWithStudents>> {
        get_published_where(&self.conn(), "id = ?1", &id)
    }

    fn get_published_project_by_slug(&self, slug: &str) -> Result<Option<ProjectWithStudents>> {
        get_published_where(&self.conn(), "slug = ?1", &slug)
    }

    // Pending project operations

    fn create_pending_project(
        &self,
        details: &ProjectDetails,
        student_ids: &str,
        submitted_by: Option<&str>,
    ) -> Result<PendingProject> {
        let created_at = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO pending_projects (title, image, slug, curriculum_project_id, repository_url,
                                           demo_url, student_ids, submitted_by, created_at, published_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                details.title,
                details.image,
                details.slug,
                details.curriculum_project_id,
                details.repository_url,
                details.demo_url,
                student_ids,
                submitted_by,
                format_datetime(&created_at),
                details.published_at.as_ref().map(format_datetime),
            ],
        )
        .map_err(|e| map_constraint(e, "project slug or repository URL already exists"))?;

        Ok(PendingProject {
            id: conn.last_insert_rowid(),
            details: details.clone(),
            student_ids: student_ids.to_string(),
            submitted_by: submitted_by.map(str::to_string),
            created_at,
        })
    }

    fn get_pending_project(&self, id: i64) -> Result<Option<PendingProject>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PENDING_COLUMNS} FROM pending_projects WHERE id = ?1"),
            params![id],
            pending_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_pending_projects(&self) -> Result<Vec<PendingProject>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PENDING_COLUMNS} FROM pending_projects ORDER BY id"
        ))?;

        let rows = stmt.query_map([], pending_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_pending_project(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM pending_projects WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn publish_pending_project(&self, project: &Materialized) -> Result<PublishedProject> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        // The pending row goes first so the cross-table uniqueness trigger
        // does not see the project's own slug and URL.
        let removed = tx.execute(
            "DELETE FROM pending_projects WHERE id = ?1",
            params![project.pending_id],
        )?;
        if removed == 0 {
            return Err(Error::NotFound);
        }

        let created_at = Utc::now();
        let details = &project.details;
        tx.execute(
            "INSERT INTO published_projects (title, image, slug, curriculum_project_id, repository_url,
                                             demo_url, submitted_by, created_at, published_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                details.title,
                details.image,
                details.slug,
                details.curriculum_project_id,
                details.repository_url,
                details.demo_url,
                project.submitted_by,
                format_datetime(&created_at),
                details.published_at.as_ref().map(format_datetime),
            ],
        )
        .map_err(|e| map_publish_error(e, "project slug or repository URL already published"))?;
        let id = tx.last_insert_rowid();

        for student_id in &project.student_ids {
            tx.execute(
                "INSERT INTO project_students (student_id, project_id) VALUES (?1, ?2)",
                params![student_id, id],
            )
            .map_err(|e| map_publish_error(e, "student already linked to project"))?;
        }

        tx.commit()?;

        Ok(PublishedProject {
            id,
            details: details.clone(),
            submitted_by: project.submitted_by.clone(),
            created_at,
        })
    }

    fn repository_url_exists(&self, url: &str) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM published_projects WHERE repository_url = ?1)
                 OR EXISTS (SELECT 1 FROM pending_projects WHERE repository_url = ?1)",
            params![url],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn list_project_slugs(&self, base: &str) -> Result<HashSet<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT slug FROM published_projects WHERE slug = ?1 OR slug LIKE ?2
             UNION
             SELECT slug FROM pending_projects WHERE slug = ?1 OR slug LIKE ?2",
        )?;

        let rows = stmt.query_map(params![base, format!("{base}-%")], |row| row.get(0))?;

        rows.collect::<std::result::Result<HashSet<_>, _>>()
            .map_err(Error::from)
    }

    // Comment operations

    fn create_comment(&self, project_id: i64, author_id: &str, content: &str) -> Result<Comment> {
        let now = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO comments (content, project_id, user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![content, project_id, author_id, format_datetime(&now)],
        )
        .map_err(|e| map_constraint(e, "comment already exists"))?;

        Ok(Comment {
            id: conn.last_insert_rowid(),
            content: content.to_string(),
            project_id,
            author_id: author_id.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, content, project_id, user_id, created_at, updated_at
             FROM comments WHERE id = ?1",
            params![id],
            comment_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_project_comments(&self, project_id: i64) -> Result<Vec<CommentWithAuthor>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT c.id, c.content, c.project_id, c.created_at, c.updated_at, u.id, u.name
             FROM comments c JOIN users u ON u.id = c.user_id
             WHERE c.project_id = ?1
             ORDER BY c.created_at, c.id",
        )?;

        let rows = stmt.query_map(params![project_id], |row| {
            Ok(CommentWithAuthor {
                id: row.get(0)?,
                content: row.get(1)?,
                project_id: row.get(2)?,
                created_at: parse_datetime(&row.get::<_, String>(3)?),
                updated_at: parse_datetime(&row.get::<_, String>(4)?),
                author: AuthorSummary {
                    id: row.get(5)?,
                    name: row.get(6)?,
                },
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_comment_content(
        &self,
        id: i64,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Comment> {
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE comments SET content = ?1, updated_at = ?2 WHERE id = ?3",
            params![content, format_datetime(&updated_at), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }

        conn.query_row(
            "SELECT id, content, project_id, user_id, created_at, updated_at
             FROM comments WHERE id = ?1",
            params![id],
            comment_from_row,
        )
        .map_err(Error::from)
    }

    fn delete_comment(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO users (id, name, email, role, banned, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user.id,
                    user.name,
                    user.email,
                    user.role.as_str(),
                    user.banned,
                    format_datetime(&user.created_at),
                    format_datetime(&user.updated_at),
                ],
            )
            .map_err(|e| map_constraint(e, "email already registered"))?;
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, email, role, banned, created_at, updated_at FROM users WHERE id = ?1",
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, email, role, banned, created_at, updated_at
             FROM users ORDER BY created_at, id",
        )?;

        let rows = stmt.query_map([], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn set_user_banned(&self, id: &str, banned: bool) -> Result<User> {
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE users SET banned = ?1, updated_at = ?2 WHERE id = ?3",
            params![banned, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }

        conn.query_row(
            "SELECT id, name, email, role, banned, created_at, updated_at FROM users WHERE id = ?1",
            params![id],
            user_from_row,
        )
        .map_err(Error::from)
    }

    fn has_admin_user(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'admin'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO sessions (id, token_hash, token_lookup, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.id,
                session.token_hash,
                session.token_lookup,
                session.user_id,
                format_datetime(&session.created_at),
                session.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(Error::SessionLookupCollision)
            }
            Err(e) => Err(map_constraint(e, "session already exists")),
        }
    }

    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, token_hash, token_lookup, user_id, created_at, expires_at
             FROM sessions WHERE token_lookup = ?1",
            params![lookup],
            |row| {
                Ok(Session {
                    id: row.get(0)?,
                    token_hash: row.get(1)?,
                    token_lookup: row.get(2)?,
                    user_id: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    expires_at: row.get::<_, Option<String>>(5)?.map(|s| parse_datetime(&s)),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }
}
