use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::PublishedProject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn apply(self, store: &dyn Store, pending_id: i64) -> Result<()> {
        match self {
            Decision::Approve => approve(store, pending_id).map(|_| ()),
            Decision::Reject => reject(store, pending_id),
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Decision::Approve => "approved",
            Decision::Reject => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub id: i64,
    pub error: String,
}

/// Per-item outcome of a bulk moderation call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<i64>,
    pub failed: Vec<BatchFailure>,
}

/// Publishes a pending submission.
///
/// The published row, its student links and the removal of the pending row
/// are committed together or not at all.
pub fn approve(store: &dyn Store, pending_id: i64) -> Result<PublishedProject> {
    let pending = store.get_pending_project(pending_id)?.ok_or(Error::NotFound)?;
    let materialized = pending.materialize()?;
    let student_count = materialized.student_ids.len();

    let published = store.publish_pending_project(&materialized)?;

    tracing::info!(
        pending_id,
        project_id = published.id,
        slug = %published.details.slug,
        students = student_count,
        "Project approved"
    );

    Ok(published)
}

pub fn reject(store: &dyn Store, pending_id: i64) -> Result<()> {
    if !store.delete_pending_project(pending_id)? {
        return Err(Error::NotFound);
    }
    tracing::info!(pending_id, "Project rejected");
    Ok(())
}

/// Applies `decision` to every pending submission visible at call time.
/// Failures are collected; earlier successes are kept.
pub fn decide_all(store: &dyn Store, decision: Decision) -> Result<BatchReport> {
    let pending = store.list_pending_projects()?;
    let mut report = BatchReport::default();

    for project in pending {
        match decision.apply(store, project.id) {
            Ok(()) => report.succeeded.push(project.id),
            Err(e) => {
                tracing::warn!(pending_id = project.id, "Bulk moderation item failed: {e}");
                report.failed.push(BatchFailure {
                    id: project.id,
                    error: e.public_message(),
                });
            }
        }
    }

    tracing::info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "Bulk moderation finished: {}",
        decision.past_tense()
    );

    Ok(report)
}

pub fn approve_all(store: &dyn Store) -> Result<BatchReport> {
    decide_all(store, Decision::Approve)
}

pub fn reject_all(store: &dyn Store) -> Result<BatchReport> {
    decide_all(store, Decision::Reject)
}
