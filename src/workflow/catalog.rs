use serde::Deserialize;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::text::{normalize_date, normalize_text, parse_date};
use crate::types::{Cohort, CurriculumProject, ProjectWithStudents, Student};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

/// Narrowing applied to the published project listing.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Case and accent insensitive substring of the title.
    pub search: Option<String>,
    /// Cohort of the first listed student.
    pub cohort: Option<i64>,
    pub curriculum_project: Option<i64>,
    pub sort: SortOrder,
}

impl ProjectFilter {
    fn matches(&self, project: &ProjectWithStudents, needle: Option<&str>) -> bool {
        if let Some(needle) = needle {
            if !normalize_text(&project.project.details.title).contains(needle) {
                return false;
            }
        }
        if let Some(cohort) = self.cohort {
            if project.students.first().map(|s| s.cohort_id) != Some(cohort) {
                return false;
            }
        }
        if let Some(curriculum_project) = self.curriculum_project {
            if project.project.details.curriculum_project_id != Some(curriculum_project) {
                return false;
            }
        }
        true
    }
}

pub fn list_projects(store: &dyn Store, filter: &ProjectFilter) -> Result<Vec<ProjectWithStudents>> {
    let needle = filter
        .search
        .as_deref()
        .map(normalize_text)
        .filter(|s| !s.is_empty());

    let mut projects: Vec<_> = store
        .list_published_projects()?
        .into_iter()
        .filter(|p| filter.matches(p, needle.as_deref()))
        .collect();

    match filter.sort {
        SortOrder::Newest => projects.sort_by(|a, b| {
            b.display_date()
                .cmp(&a.display_date())
                .then(b.project.id.cmp(&a.project.id))
        }),
        SortOrder::Oldest => projects.sort_by(|a, b| {
            a.display_date()
                .cmp(&b.display_date())
                .then(a.project.id.cmp(&b.project.id))
        }),
    }

    Ok(projects)
}

fn required(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub fn create_cohort(store: &dyn Store, name: &str, start_date: &str) -> Result<Cohort> {
    let name = required(name, "Name")?;
    let start_date = parse_date(start_date.trim())?;

    let key = normalize_text(&name);
    let day = normalize_date(start_date);
    for existing in store.list_cohorts()? {
        if normalize_text(&existing.name) == key {
            return Err(Error::duplicate("A cohort with this name already exists"));
        }
        if normalize_date(existing.start_date) == day {
            return Err(Error::duplicate("A cohort already starts on this date"));
        }
    }

    let cohort = store.create_cohort(&name, start_date)?;
    tracing::info!(cohort_id = cohort.id, name = %cohort.name, "Cohort created");
    Ok(cohort)
}

pub fn create_curriculum_project(store: &dyn Store, name: &str) -> Result<CurriculumProject> {
    let name = required(name, "Name")?;

    let key = normalize_text(&name);
    if store
        .list_curriculum_projects()?
        .iter()
        .any(|p| normalize_text(&p.name) == key)
    {
        return Err(Error::duplicate("This curriculum project already exists"));
    }

    let project = store.create_curriculum_project(&name)?;
    tracing::info!(curriculum_project_id = project.id, name = %project.name, "Curriculum project created");
    Ok(project)
}

pub fn create_student(
    store: &dyn Store,
    name: &str,
    github_username: &str,
    cohort_id: i64,
) -> Result<Student> {
    let name = required(name, "Name")?;
    let github_username = required(github_username, "GitHub username")?;

    if store.get_cohort(cohort_id)?.is_none() {
        return Err(Error::validation(format!("Unknown cohort id {cohort_id}")));
    }

    let (name_key, username_key) = (normalize_text(&name), normalize_text(&github_username));
    if store.list_students()?.iter().any(|s| {
        normalize_text(&s.name) == name_key && normalize_text(&s.github_username) == username_key
    }) {
        return Err(Error::duplicate("This student already exists"));
    }

    let student = store.create_student(&name, &github_username, cohort_id)?;
    tracing::info!(student_id = student.id, cohort_id, "Student created");
    Ok(student)
}
