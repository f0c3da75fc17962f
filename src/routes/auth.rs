use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::auth::{
        ChallengeResponse, CompleteSignupRequest, ContactRequest, LoginResponse, VerifyOtpRequest,
    },
    error::AppResult,
    models::UserProfile,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup/request_otp", post(request_signup_otp))
        .route("/signup/verify_otp", post(verify_signup_otp))
        .route("/signup/complete", post(complete_signup))
        .route("/login", post(request_login_otp))
        .route("/login/verify", post(verify_login_otp))
}

#[utoipa::path(
    post,
    path = "/auth/signup/request_otp",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "OTP emailed", body = ApiResponse<ChallengeResponse>),
        (status = 400, description = "Invalid email or phone, or user already exists")
    ),
    tag = "Auth"
)]
pub async fn request_signup_otp(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> AppResult<Json<ApiResponse<ChallengeResponse>>> {
    let resp = auth_service::request_signup_otp(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/auth/signup/verify_otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "OTP verified", body = ApiResponse<ChallengeResponse>),
        (status = 400, description = "Incorrect OTP or session expired")
    ),
    tag = "Auth"
)]
pub async fn verify_signup_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> AppResult<Json<ApiResponse<ChallengeResponse>>> {
    let resp = auth_service::verify_signup_otp(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/auth/signup/complete",
    request_body = CompleteSignupRequest,
    responses(
        (status = 200, description = "Account created", body = ApiResponse<UserProfile>),
        (status = 400, description = "Missing field or session expired")
    ),
    tag = "Auth"
)]
pub async fn complete_signup(
    State(state): State<AppState>,
    Json(payload): Json<CompleteSignupRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::complete_signup(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "OTP emailed", body = ApiResponse<ChallengeResponse>),
        (status = 401, description = "Phone number does not match"),
        (status = 404, description = "Account doesn't exist")
    ),
    tag = "Auth"
)]
pub async fn request_login_otp(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> AppResult<Json<ApiResponse<ChallengeResponse>>> {
    let resp = auth_service::request_login_otp(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/auth/login/verify",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Incorrect OTP or session expired")
    ),
    tag = "Auth"
)]
pub async fn verify_login_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::verify_login_otp(&state, payload).await?;
    Ok(Json(resp))
}
