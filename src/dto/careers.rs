use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Job, JobApplication, Office};

#[derive(Debug, Serialize, ToSchema)]
pub struct JobList {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OfficeList {
    pub locations: Vec<Office>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApplicationList {
    pub applications: Vec<JobApplication>,
}

/// Parsed multipart body of a job application.
#[derive(Debug, Default)]
pub struct ApplicationForm {
    pub job_id: Option<String>,
    pub applicant_name: Option<String>,
    pub primary_email: Option<String>,
    pub experience: Option<String>,
    pub work_type: Option<String>,
    pub qualification: Option<String>,
    pub skills: Option<String>,
    pub cover_letter: Option<String>,
    pub resume: Option<Vec<u8>>,
}

/// Multipart schema for the API docs.
#[allow(dead_code)]
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct ApplicationUpload {
    pub job_id: String,
    pub applicant_name: String,
    pub primary_email: String,
    pub experience: String,
    pub work_type: String,
    pub qualification: String,
    pub skills: String,
    pub cover_letter: String,
    #[schema(format = Binary)]
    pub resume: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationResponse {
    pub application_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawApplicationRequest {
    pub application_id: Option<String>,
}
