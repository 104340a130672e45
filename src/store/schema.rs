pub const SCHEMA: &str = r#"
-- Cohorts (promotions) group students starting together
CREATE TABLE IF NOT EXISTS cohorts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    normalized_name TEXT NOT NULL UNIQUE,
    start_date TEXT NOT NULL UNIQUE      -- YYYY-MM-DD
);

-- Curriculum projects classify submissions (e.g. "AdaCheck")
CREATE TABLE IF NOT EXISTS curriculum_projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    normalized_name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    github_username TEXT NOT NULL,
    normalized_key TEXT NOT NULL UNIQUE,  -- normalized "name\0username"
    cohort_id INTEGER NOT NULL REFERENCES cohorts(id)
);

-- Users and sessions belong to the identity service; the core reads them
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL DEFAULT 'user',
    banned INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,          -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL,        -- first 8 chars of ID for fast lookup
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT                    -- NULL = never
);

CREATE TABLE IF NOT EXISTS published_projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    image TEXT,
    slug TEXT NOT NULL UNIQUE,
    curriculum_project_id INTEGER REFERENCES curriculum_projects(id),
    repository_url TEXT NOT NULL UNIQUE,
    demo_url TEXT,
    submitted_by TEXT REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT DEFAULT (datetime('now')),
    published_at TEXT
);

-- Submissions awaiting review; never updated in place
CREATE TABLE IF NOT EXISTS pending_projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    image TEXT,
    slug TEXT NOT NULL UNIQUE,
    curriculum_project_id INTEGER REFERENCES curriculum_projects(id),
    repository_url TEXT NOT NULL UNIQUE,
    demo_url TEXT,
    student_ids TEXT NOT NULL,         -- comma-separated, e.g. "1,2,3"
    submitted_by TEXT REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT DEFAULT (datetime('now')),
    published_at TEXT
);

-- Many-to-many between students and published projects
CREATE TABLE IF NOT EXISTS project_students (
    student_id INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
    project_id INTEGER NOT NULL REFERENCES published_projects(id) ON DELETE CASCADE,
    PRIMARY KEY (student_id, project_id)
);

CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL,
    project_id INTEGER NOT NULL REFERENCES published_projects(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Slug and repository URL are unique across pending and published projects
CREATE TRIGGER IF NOT EXISTS pending_projects_unique_keys
BEFORE INSERT ON pending_projects
WHEN EXISTS (
    SELECT 1 FROM published_projects
    WHERE slug = NEW.slug OR repository_url = NEW.repository_url
)
BEGIN
    SELECT RAISE(ABORT, 'project slug or repository url already published');
END;

CREATE TRIGGER IF NOT EXISTS published_projects_unique_keys
BEFORE INSERT ON published_projects
WHEN EXISTS (
    SELECT 1 FROM pending_projects
    WHERE slug = NEW.slug OR repository_url = NEW.repository_url
)
BEGIN
    SELECT RAISE(ABORT, 'project slug or repository url already pending');
END;

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_students_cohort ON students(cohort_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_lookup ON sessions(token_lookup);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_project_students_project ON project_students(project_id);
CREATE INDEX IF NOT EXISTS idx_comments_project ON comments(project_id);
CREATE INDEX IF NOT EXISTS idx_comments_user ON comments(user_id);
"#;
