//! Bulk import of project submissions from a spreadsheet export.
//!
//! Every row goes through [`submit_project`], so imported projects land in
//! the pending queue exactly like API submissions.

use std::path::Path;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::text::normalize_text;
use crate::types::{CurriculumProject, Student};
use crate::workflow::{Submission, submit_project};

const HEADER_START: [&str; 2] = ["Promotion", "Participants"];

/// Common spellings of curriculum project names in exported sheets.
const CATEGORY_ALIASES: [(&str, &str); 10] = [
    ("checkevents", "adacheck"),
    ("checkevent", "adacheck"),
    ("adacheckevent", "adacheck"),
    ("quizz", "adaquiz"),
    ("quiz", "adaquiz"),
    ("projets libres", "projet libre"),
    ("projet libres", "projet libre"),
    ("projets libre", "projet libre"),
    ("dataviz", "adatech dataviz"),
    ("data viz", "adatech dataviz"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub promotion: String,
    pub participants: String,
    pub category: String,
    pub title: String,
    pub github_url: String,
    pub demo_url: String,
    pub has_thumbnail: String,
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped_duplicate: usize,
    pub skipped_no_students: usize,
    /// Rows rejected by intake for any other reason, with the reason.
    pub failed: Vec<(String, String)>,
}

impl ImportSummary {
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped_duplicate + self.skipped_no_students + self.failed.len()
    }
}

pub fn read_rows(path: &Path) -> Result<Vec<ImportRow>> {
    let content = std::fs::read_to_string(path)?;
    parse_rows(&content)
}

/// Parses rows following the `Promotion,Participants,...` header line.
/// Lines before the header are ignored, as are rows missing a title,
/// repository URL, participants or category.
pub fn parse_rows(content: &str) -> Result<Vec<ImportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    let mut header_found = false;

    for result in reader.records() {
        let record = result.map_err(|e| Error::validation(format!("invalid CSV: {e}")))?;

        if !header_found {
            header_found = record.get(0) == Some(HEADER_START[0])
                && record.get(1) == Some(HEADER_START[1]);
            continue;
        }

        if record.len() < 7 {
            continue;
        }
        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        let row = ImportRow {
            promotion: field(0),
            participants: field(1),
            category: field(2),
            title: field(3),
            github_url: field(4),
            demo_url: field(5),
            has_thumbnail: field(6),
        };

        if row.title.is_empty()
            || row.github_url.is_empty()
            || row.participants.is_empty()
            || row.category.is_empty()
        {
            continue;
        }
        rows.push(row);
    }

    if !header_found {
        return Err(Error::validation("header row not found in CSV"));
    }

    Ok(rows)
}

fn overlaps(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

/// Resolves a category label: exact normalized match, then known aliases,
/// then substring match in either direction.
fn match_category(projects: &[CurriculumProject], category: &str) -> Option<i64> {
    let wanted = normalize_text(category);

    if let Some(p) = projects.iter().find(|p| normalize_text(&p.name) == wanted) {
        return Some(p.id);
    }

    let alias = CATEGORY_ALIASES
        .iter()
        .find(|(from, _)| *from == wanted)
        .map(|(_, to)| *to);
    if let Some(alias) = alias {
        if let Some(p) = projects.iter().find(|p| overlaps(&normalize_text(&p.name), alias)) {
            return Some(p.id);
        }
    }

    projects
        .iter()
        .find(|p| overlaps(&normalize_text(&p.name), &wanted))
        .map(|p| p.id)
}

fn match_students(students: &[Student], participants: &str) -> Vec<i64> {
    let mut ids = Vec::new();
    for name in participants.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let wanted = normalize_text(name);
        let found = students
            .iter()
            .find(|s| normalize_text(&s.name) == wanted)
            .or_else(|| {
                students
                    .iter()
                    .find(|s| overlaps(&normalize_text(&s.name), &wanted))
            });

        match found {
            Some(student) if !ids.contains(&student.id) => ids.push(student.id),
            Some(_) => {}
            None => tracing::warn!("Student '{name}' not found, skipping participant"),
        }
    }
    ids
}

pub fn import_rows(store: &dyn Store, rows: Vec<ImportRow>) -> Result<ImportSummary> {
    let students = store.list_students()?;
    let projects = store.list_curriculum_projects()?;
    let mut summary = ImportSummary::default();

    for row in rows {
        let student_ids = match_students(&students, &row.participants);
        if student_ids.is_empty() {
            tracing::warn!(title = %row.title, "No matching students, skipping row");
            summary.skipped_no_students += 1;
            continue;
        }

        let curriculum_project_id = match_category(&projects, &row.category);
        if curriculum_project_id.is_none() {
            tracing::warn!(category = %row.category, "Category not found, importing without one");
        }

        let submission = Submission {
            title: row.title.clone(),
            repository_url: row.github_url.trim_end_matches('/').to_string(),
            student_ids,
            curriculum_project_id,
            demo_url: Some(row.demo_url),
            ..Default::default()
        };

        match submit_project(store, submission, None) {
            Ok(_) => summary.imported += 1,
            Err(Error::Duplicate(_)) => {
                tracing::warn!(url = %row.github_url, "Repository already submitted, skipping row");
                summary.skipped_duplicate += 1;
            }
            Err(e @ Error::Validation(_)) => {
                tracing::warn!(title = %row.title, "Row rejected: {e}");
                summary.failed.push((row.title, e.public_message()));
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        imported = summary.imported,
        skipped = summary.skipped(),
        "CSV import finished"
    );

    Ok(summary)
}
