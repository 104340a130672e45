//! CLI integration tests for adaverse admin and import commands.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use adaverse::auth::token_lookup;
use adaverse::store::{SqliteStore, Store};
use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use chrono::NaiveDate;
use predicates::prelude::*;

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("adaverse").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("ADAVERSE_API_KEY");
        cmd
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd()
            .args(["admin", "init", "--data-dir", &self.data_dir_str()])
            .assert()
    }

    fn add_user(&self, name: &str, email: &str, admin: bool) -> assert_cmd::assert::Assert {
        let mut cmd = self.cmd();
        cmd.args([
            "admin",
            "user",
            "add",
            "--name",
            name,
            "--email",
            email,
            "--data-dir",
            &self.data_dir_str(),
        ]);
        if admin {
            cmd.arg("--admin");
        }
        cmd.assert()
    }

    fn store(&self) -> SqliteStore {
        SqliteStore::new(self.data_dir().join("adaverse.db")).expect("open database")
    }
}

#[test]
fn test_init_creates_database() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Database initialized"))
        .stdout(predicate::str::contains("No admin yet"));

    assert!(ctx.data_dir().join("adaverse.db").exists());
}

#[test]
fn test_user_add_prints_working_token() {
    let ctx = TestContext::new();
    ctx.init().success();

    let output = ctx
        .add_user("Ada", "ada@example.com", true)
        .success()
        .stdout(predicate::str::contains("Created admin 'Ada'"))
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).expect("utf8 output");
    let token = stdout
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("adaverse_"))
        .expect("token line");

    let store = ctx.store();
    let session = store
        .get_session_by_lookup(token_lookup(token).expect("well-formed token"))
        .unwrap()
        .expect("session stored");
    let user = store.get_user(&session.user_id).unwrap().expect("user stored");
    assert!(user.is_admin());

    ctx.add_user("Ada Again", "ada@example.com", false)
        .failure()
        .stderr(predicate::str::contains("email already registered"));
}

#[test]
fn test_user_add_requires_init() {
    let ctx = TestContext::new();

    ctx.add_user("Ada", "ada@example.com", false)
        .failure()
        .stderr(predicate::str::contains("adaverse admin init"));
}

#[test]
fn test_serve_refuses_to_start_without_key() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.cmd()
        .args(["serve", "--data-dir", &ctx.data_dir_str(), "--port", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no API key configured"));
}

#[test]
fn test_import_queues_rows() {
    let ctx = TestContext::new();
    ctx.init().success();

    {
        let store = ctx.store();
        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let cohort = store.create_cohort("Frida", start).unwrap();
        store.create_student("Ada Lovelace", "ada", cohort.id).unwrap();
        store.create_student("Grace Hopper", "grace", cohort.id).unwrap();
        store.create_curriculum_project("AdaQuiz").unwrap();
    }

    let csv = ctx.temp_dir.child("projects.csv");
    csv.write_str(
        "Promotion,Participants,Category,Title,GithubUrl,DemoUrl,HasThumbnail\n\
         Frida,\"Ada Lovelace, Grace Hopper\",Quizz,Quiz,https://github.com/ada/quiz,,FALSE\n\
         Frida,Nobody,Quizz,Lonely,https://github.com/nobody/lonely,,FALSE\n",
    )
    .unwrap();

    ctx.cmd()
        .args(["import"])
        .arg(csv.path())
        .args(["--data-dir", &ctx.data_dir_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 project(s) to import"))
        .stdout(predicate::str::contains("Imported: 1"))
        .stdout(predicate::str::contains("1 without students"));

    let pending = ctx.store().list_pending_projects().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].details.slug, "quiz");
    assert_eq!(pending[0].student_ids, "1,2");

    ctx.cmd()
        .args(["import"])
        .arg(csv.path())
        .args(["--data-dir", &ctx.data_dir_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported: 0"))
        .stdout(predicate::str::contains("1 duplicate"));
}
