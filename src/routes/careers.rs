use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
};

use crate::{
    dto::careers::{
        ApplicationForm, ApplicationList, ApplicationUpload, JobList, OfficeList,
        SubmitApplicationResponse, WithdrawApplicationRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::career_service,
    state::AppState,
};

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/careers/jobs", get(list_jobs))
        .route("/careers/locations", get(list_locations))
        .route(
            "/submit_application",
            post(submit_application).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/my_applications", get(my_applications))
        .route("/withdraw_application", post(withdraw_application))
}

#[utoipa::path(
    get,
    path = "/careers/jobs",
    responses((status = 200, description = "Open positions", body = ApiResponse<JobList>)),
    tag = "Careers"
)]
pub async fn list_jobs(State(state): State<AppState>) -> AppResult<Json<ApiResponse<JobList>>> {
    let resp = career_service::list_jobs(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/careers/locations",
    responses((status = 200, description = "Office locations", body = ApiResponse<OfficeList>)),
    tag = "Careers"
)]
pub async fn list_locations(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<OfficeList>>> {
    let resp = career_service::list_locations(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/submit_application",
    request_body(content = ApplicationUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Application received", body = ApiResponse<SubmitApplicationResponse>),
        (status = 400, description = "Missing required field or resume")
    ),
    security(("bearer_auth" = [])),
    tag = "Careers"
)]
pub async fn submit_application(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<SubmitApplicationResponse>>> {
    let malformed = |err: axum::extract::multipart::MultipartError| {
        tracing::debug!(error = %err, "unreadable application form");
        AppError::BadRequest("Malformed request data.".into())
    };

    let mut form = ApplicationForm::default();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "resume" {
            form.resume = Some(field.bytes().await.map_err(malformed)?.to_vec());
            continue;
        }
        let slot = match name.as_str() {
            "jobId" => &mut form.job_id,
            "applicantName" => &mut form.applicant_name,
            "primaryEmail" => &mut form.primary_email,
            "experience" => &mut form.experience,
            "workType" => &mut form.work_type,
            "qualification" => &mut form.qualification,
            "skills" => &mut form.skills,
            "coverLetter" => &mut form.cover_letter,
            _ => continue,
        };
        *slot = Some(field.text().await.map_err(malformed)?);
    }

    let resp = career_service::submit_application(&state, &user, form).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/my_applications",
    responses((status = 200, description = "Caller's applications, newest first", body = ApiResponse<ApplicationList>)),
    security(("bearer_auth" = [])),
    tag = "Careers"
)]
pub async fn my_applications(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ApplicationList>>> {
    let resp = career_service::my_applications(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/withdraw_application",
    request_body = WithdrawApplicationRequest,
    responses(
        (status = 200, description = "Application withdrawn", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Application not found or not owned by the caller")
    ),
    security(("bearer_auth" = [])),
    tag = "Careers"
)]
pub async fn withdraw_application(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<WithdrawApplicationRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = career_service::withdraw_application(&state, &user, payload).await?;
    Ok(Json(resp))
}
