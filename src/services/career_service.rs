use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::{
    audit::audit_best_effort,
    dto::careers::{
        ApplicationForm, ApplicationList, JobList, OfficeList, SubmitApplicationResponse,
        WithdrawApplicationRequest,
    },
    entity::{
        job_applications::{
            ActiveModel as ApplicationActive, Column as AppCol, Entity as JobApplications,
            Model as ApplicationModel,
        },
        jobs::{Column as JobCol, Entity as Jobs, Model as JobModel},
        offices::{Column as OfficeCol, Entity as Offices},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Job, JobApplication, Office},
    response::{ApiResponse, Meta},
    services::{
        email::OutboxMessage,
        id_service::{DbReservations, IdAllocator, IdCategory, reserve},
        outbox_service,
        storage::resume_key,
    },
    state::AppState,
};

pub const RECEIVED: &str = "Received";

/// Application fields after the presence checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedApplication {
    pub job_id: String,
    pub applicant_name: String,
    pub primary_email: String,
    pub experience: String,
    pub work_type: String,
    pub qualification: String,
    pub skills: String,
    pub cover_letter: String,
    pub resume: Vec<u8>,
}

/// Fields are checked in form order; the first missing one is reported.
pub fn validate_application(form: ApplicationForm) -> AppResult<ValidatedApplication> {
    fn take(field: &'static str, value: Option<String>) -> AppResult<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::field(field, format!("Missing required field: {field}")))
    }

    let job_id = take("jobId", form.job_id)?;
    let applicant_name = take("applicantName", form.applicant_name)?;
    let primary_email = take("primaryEmail", form.primary_email)?;
    let experience = take("experience", form.experience)?;
    let work_type = take("workType", form.work_type)?;
    let qualification = take("qualification", form.qualification)?;
    let skills = take("skills", form.skills)?;
    let cover_letter = take("coverLetter", form.cover_letter)?;
    let resume = form
        .resume
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::field("resume", "Resume file is required."))?;

    Ok(ValidatedApplication {
        job_id,
        applicant_name,
        primary_email,
        experience,
        work_type,
        qualification,
        skills,
        cover_letter,
        resume,
    })
}

/// Jobs are referenced either by key (`job03`) or by their public number (`3`).
pub fn job_matches(job: &JobModel, reference: &str) -> bool {
    job.id == reference || job.number.to_string() == reference
}

pub async fn list_jobs(state: &AppState) -> AppResult<ApiResponse<JobList>> {
    let jobs = Jobs::find()
        .order_by_asc(JobCol::Number)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(job_from_entity)
        .collect();

    Ok(ApiResponse::success("Ok", JobList { jobs }, Some(Meta::empty())))
}

pub async fn list_locations(state: &AppState) -> AppResult<ApiResponse<OfficeList>> {
    let locations = Offices::find()
        .order_by_asc(OfficeCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|o| Office {
            id: o.id,
            city: o.city,
            office_type: o.office_type,
            address: o.address,
        })
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        OfficeList { locations },
        Some(Meta::empty()),
    ))
}

#[tracing::instrument(skip(state, user, form), fields(user = %user.user_key))]
pub async fn submit_application(
    state: &AppState,
    user: &AuthUser,
    form: ApplicationForm,
) -> AppResult<ApiResponse<SubmitApplicationResponse>> {
    let application = validate_application(form)?;

    let application_id = IdAllocator::default()
        .generate(&DbReservations(&state.orm), IdCategory::JobApplications)
        .await?;

    let key = resume_key(&application_id);
    let resume_url = state
        .storage
        .put(&key, application.resume.clone(), "application/pdf")
        .await?;

    let job = Jobs::find()
        .all(&state.orm)
        .await?
        .into_iter()
        .find(|job| job_matches(job, &application.job_id));

    let saved = save_application(state, user, &application, &application_id, resume_url, job).await;
    if let Err(err) = saved {
        if let Err(cleanup) = state.storage.delete(&key).await {
            tracing::warn!(error = %cleanup, %key, "failed to remove orphaned resume");
        }
        return Err(err);
    }

    tracing::info!(%application_id, job_id = %application.job_id, "job application received");
    Ok(ApiResponse::success(
        "Application submitted",
        SubmitApplicationResponse { application_id },
        Some(Meta::empty()),
    ))
}

async fn save_application(
    state: &AppState,
    user: &AuthUser,
    application: &ValidatedApplication,
    application_id: &str,
    resume_url: String,
    job: Option<JobModel>,
) -> AppResult<()> {
    let txn = state.orm.begin().await?;

    ApplicationActive {
        application_id: Set(application_id.to_string()),
        user_key: Set(user.user_key.clone()),
        job_id: Set(application.job_id.clone()),
        applicant_name: Set(application.applicant_name.clone()),
        primary_email: Set(application.primary_email.clone()),
        secondary_email: Set(user.email.clone()),
        experience: Set(application.experience.clone()),
        work_type: Set(application.work_type.clone()),
        qualification: Set(application.qualification.clone()),
        skills: Set(application.skills.clone()),
        cover_letter: Set(application.cover_letter.clone()),
        resume_url: Set(resume_url),
        status: Set(RECEIVED.to_string()),
        submitted_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    reserve(&txn, IdCategory::JobApplications, application_id).await?;

    match job {
        Some(job) => {
            outbox_service::enqueue(
                &txn,
                &OutboxMessage::ApplicationReceived {
                    email: application.primary_email.clone(),
                    name: application.applicant_name.clone(),
                    application_id: application_id.to_string(),
                    job_title: job.title,
                    job_location: job.location,
                },
                Some(format!("application_received:{application_id}")),
            )
            .await?;
        }
        None => tracing::warn!(
            job_id = %application.job_id,
            "job not found; skipping application confirmation"
        ),
    }

    txn.commit().await?;
    Ok(())
}

pub async fn my_applications(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ApplicationList>> {
    let applications = JobApplications::find()
        .filter(AppCol::UserKey.eq(user.user_key.as_str()))
        .order_by_desc(AppCol::SubmittedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(application_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        ApplicationList { applications },
        Some(Meta::empty()),
    ))
}

/// Remove one of the caller's applications and its resume. The application
/// id stays reserved.
#[tracing::instrument(skip(state, user, payload), fields(user = %user.user_key))]
pub async fn withdraw_application(
    state: &AppState,
    user: &AuthUser,
    payload: WithdrawApplicationRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let application_id = payload
        .application_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::field("applicationId", "Application ID is required."))?;

    let application = JobApplications::find_by_id(application_id.clone())
        .filter(AppCol::UserKey.eq(user.user_key.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(
                "Application not found or you do not have permission to modify it.".into(),
            )
        })?;

    if let Err(err) = state.storage.delete(&resume_key(&application_id)).await {
        tracing::warn!(error = %err, %application_id, "could not delete resume");
    }

    JobApplications::delete_by_id(application.application_id)
        .exec(&state.orm)
        .await?;

    audit_best_effort(
        &state.pool,
        Some(&user.user_key),
        "application_withdrawn",
        Some("job_applications"),
        Some(serde_json::json!({ "application_id": application_id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Application withdrawn successfully.",
        serde_json::json!({ "applicationId": application_id }),
        Some(Meta::empty()),
    ))
}

fn job_from_entity(model: JobModel) -> Job {
    Job {
        id: model.id,
        number: model.number,
        title: model.title,
        location: model.location,
        category: model.category,
        employment_type: model.employment_type,
        description: model.description,
    }
}

fn application_from_entity(model: ApplicationModel) -> JobApplication {
    JobApplication {
        application_id: model.application_id,
        job_id: model.job_id,
        applicant_name: model.applicant_name,
        primary_email: model.primary_email,
        secondary_email: model.secondary_email,
        experience: model.experience,
        work_type: model.work_type,
        qualification: model.qualification,
        skills: model.skills,
        cover_letter: model.cover_letter,
        resume_url: model.resume_url,
        status: model.status,
        submitted_at: model.submitted_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ApplicationForm {
        ApplicationForm {
            job_id: Some("3".into()),
            applicant_name: Some("Alice".into()),
            primary_email: Some("alice@example.com".into()),
            experience: Some("4 years".into()),
            work_type: Some("Full-time".into()),
            qualification: Some("B.Des".into()),
            skills: Some("Textile design".into()),
            cover_letter: Some("I would love to join.".into()),
            resume: Some(b"%PDF-1.4".to_vec()),
        }
    }

    #[test]
    fn first_missing_field_is_reported() {
        let mut raw = form();
        raw.experience = Some("  ".into());
        raw.skills = None;
        let err = validate_application(raw).unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: experience");
    }

    #[test]
    fn resume_is_required() {
        let mut raw = form();
        raw.resume = None;
        let err = validate_application(raw).unwrap_err();
        assert_eq!(err.to_string(), "Resume file is required.");
    }

    #[test]
    fn complete_form_validates() {
        let application = validate_application(form()).unwrap();
        assert_eq!(application.job_id, "3");
        assert_eq!(application.resume, b"%PDF-1.4");
    }

    #[test]
    fn jobs_match_by_key_or_number() {
        let job = JobModel {
            id: "job03".into(),
            number: 3,
            title: "Textile Designer".into(),
            location: "Coimbatore".into(),
            category: "Design".into(),
            employment_type: "Full-time".into(),
            description: String::new(),
        };
        assert!(job_matches(&job, "3"));
        assert!(job_matches(&job, "job03"));
        assert!(!job_matches(&job, "30"));
    }
}
