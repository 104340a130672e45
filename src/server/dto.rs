use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::text::parse_timestamp;
use crate::types::User;
use crate::workflow::{ProjectFilter, SortOrder, Submission};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub cohort: Option<i64>,
    #[serde(default)]
    pub curriculum_project: Option<i64>,
    #[serde(default)]
    pub sort: Option<SortOrder>,
}

impl From<ProjectListParams> for ProjectFilter {
    fn from(params: ProjectListParams) -> Self {
        ProjectFilter {
            search: params.search,
            cohort: params.cohort,
            curriculum_project: params.curriculum_project,
            sort: params.sort.unwrap_or_default(),
        }
    }
}

/// Missing text fields deserialize as empty so intake reports them as
/// validation errors.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProjectRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub repository_url: String,
    #[serde(default)]
    pub student_ids: Vec<i64>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub curriculum_project_id: Option<i64>,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub publish_date: Option<String>,
}

impl SubmitProjectRequest {
    pub fn into_submission(self) -> Result<Submission> {
        let published_at = match self.publish_date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_timestamp(raw)?),
            _ => None,
        };
        Ok(Submission {
            title: self.title,
            repository_url: self.repository_url,
            student_ids: self.student_ids,
            image: self.image,
            curriculum_project_id: self.curriculum_project_id,
            demo_url: self.demo_url,
            published_at,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub project_id: i64,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    #[serde(default)]
    pub content: String,
}

/// `banned` is kept loose so a non-boolean value is a 400 with a clear message.
#[derive(Debug, Deserialize)]
pub struct BanRequest {
    #[serde(default)]
    pub banned: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct BannedUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub banned: bool,
}

#[derive(Debug, Serialize)]
pub struct BanResponse {
    pub user: BannedUser,
    pub message: String,
}

impl From<User> for BanResponse {
    fn from(user: User) -> Self {
        let message = if user.banned {
            format!("User {} has been banned", user.name)
        } else {
            format!("User {} has been unbanned", user.name)
        };
        BanResponse {
            user: BannedUser {
                id: user.id,
                name: user.name,
                email: user.email,
                banned: user.banned,
            },
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCohortRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_date: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCurriculumProjectRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub github_username: String,
    pub cohort_id: i64,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: i64,
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_request_reads_camel_case() {
        let req: SubmitProjectRequest = serde_json::from_value(serde_json::json!({
            "title": "Quiz",
            "repositoryUrl": "https://github.com/ada/quiz",
            "studentIds": [1, 2],
            "curriculumProjectId": 3,
            "publishDate": "15/01/2024"
        }))
        .unwrap();

        let submission = req.into_submission().unwrap();
        assert_eq!(submission.student_ids, vec![1, 2]);
        assert_eq!(submission.curriculum_project_id, Some(3));
        assert_eq!(
            submission.published_at.unwrap().to_rfc3339(),
            "2024-01-15T00:00:00+00:00"
        );
    }

    #[test]
    fn test_submit_request_rejects_bad_publish_date() {
        let req = SubmitProjectRequest {
            publish_date: Some("32/13/2024".to_string()),
            ..Default::default()
        };
        assert!(req.into_submission().is_err());
    }

    #[test]
    fn test_list_params_default_sort() {
        let filter: ProjectFilter = ProjectListParams::default().into();
        assert_eq!(filter.sort, SortOrder::Newest);
    }
}
