//! OTP signup and login. The handshake state lives in `verification_challenges`
//! rows keyed by a token the client carries between steps.

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit::audit_best_effort,
    config::AppConfig,
    dto::auth::{
        ChallengeResponse, Claims, CompleteSignupRequest, ContactRequest, LoginResponse,
        VerifyOtpRequest,
    },
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
        verification_challenges::{
            ActiveModel as ChallengeActive, Column as ChallengeCol, Entity as Challenges,
            Model as ChallengeModel,
        },
    },
    error::{AppError, AppResult},
    models::UserProfile,
    response::{ApiResponse, Meta},
    services::{
        email::{OutboxMessage, generate_otp, render_otp},
        outbox_service,
    },
    state::AppState,
    validation::{is_valid_email, is_valid_name, is_valid_phone, phone_matches, required, user_key},
};

pub const MAX_OTP_ATTEMPTS: i32 = 5;
const OTP_REJECTED: &str = "Incorrect OTP or session expired.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengePurpose {
    Signup,
    Login,
}

impl ChallengePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengePurpose::Signup => "signup",
            ChallengePurpose::Login => "login",
        }
    }
}

fn hash_otp(otp: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(otp.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn otp_matches(hash: &str, otp: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(otp.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn normalized_contact(payload: &ContactRequest) -> AppResult<(String, String)> {
    let email = payload.email.trim();
    let phone = payload.phone.trim();
    if !is_valid_email(email) {
        return Err(AppError::field("email", "Invalid email"));
    }
    if !is_valid_phone(phone) {
        return Err(AppError::field("phone", "Invalid phone"));
    }
    Ok((email.to_string(), phone.to_string()))
}

/// Store a fresh challenge and email its OTP. Delivery is synchronous: if the
/// email cannot be sent the challenge is discarded and the request fails.
async fn issue_challenge(
    state: &AppState,
    purpose: ChallengePurpose,
    email: &str,
    phone: &str,
) -> AppResult<Uuid> {
    let otp = generate_otp();
    let token = Uuid::new_v4();
    let now = Utc::now();

    ChallengeActive {
        token: Set(token),
        purpose: Set(purpose.as_str().to_string()),
        email: Set(email.to_string()),
        phone: Set(phone.to_string()),
        otp_hash: Set(hash_otp(&otp)?),
        attempts: Set(0),
        verified: Set(false),
        expires_at: Set((now + Duration::minutes(state.config.otp_ttl_minutes)).into()),
        created_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    let message = render_otp(email, &otp, state.config.otp_ttl_minutes)?;
    if let Err(err) = state.mailer.send(&message).await {
        if let Err(cleanup) = Challenges::delete_by_id(token).exec(&state.orm).await {
            tracing::warn!(error = %cleanup, "failed to discard unsent challenge");
        }
        return Err(err.into());
    }

    tracing::info!(purpose = purpose.as_str(), "otp challenge issued");
    Ok(token)
}

/// Check `otp` against a live challenge. Every check spends one attempt,
/// claimed atomically so concurrent guesses cannot exceed the budget.
async fn check_challenge(
    state: &AppState,
    token: Uuid,
    purpose: ChallengePurpose,
    otp: &str,
) -> AppResult<ChallengeModel> {
    let rejected = || AppError::field("otp", OTP_REJECTED);

    let claimed = Challenges::update_many()
        .col_expr(
            ChallengeCol::Attempts,
            Expr::col(ChallengeCol::Attempts).add(1),
        )
        .filter(ChallengeCol::Token.eq(token))
        .filter(ChallengeCol::Purpose.eq(purpose.as_str()))
        .filter(ChallengeCol::Attempts.lt(MAX_OTP_ATTEMPTS))
        .exec(&state.orm)
        .await?;
    if claimed.rows_affected != 1 {
        return Err(rejected());
    }

    let challenge = Challenges::find_by_id(token)
        .one(&state.orm)
        .await?
        .ok_or_else(rejected)?;

    if challenge.expires_at.with_timezone(&Utc) < Utc::now()
        || !otp_matches(&challenge.otp_hash, otp.trim())
    {
        return Err(rejected());
    }

    Ok(challenge)
}

pub async fn request_signup_otp(
    state: &AppState,
    payload: ContactRequest,
) -> AppResult<ApiResponse<ChallengeResponse>> {
    let (email, phone) = normalized_contact(&payload)?;

    if Users::find_by_id(user_key(&email)).one(&state.orm).await?.is_some() {
        return Err(AppError::BadRequest("User already exists".into()));
    }

    let challenge_token = issue_challenge(state, ChallengePurpose::Signup, &email, &phone).await?;
    Ok(ApiResponse::success(
        "OTP sent to email",
        ChallengeResponse { challenge_token },
        Some(Meta::empty()),
    ))
}

pub async fn verify_signup_otp(
    state: &AppState,
    payload: VerifyOtpRequest,
) -> AppResult<ApiResponse<ChallengeResponse>> {
    let challenge = check_challenge(
        state,
        payload.challenge_token,
        ChallengePurpose::Signup,
        &payload.otp,
    )
    .await?;

    let token = challenge.token;
    let mut active: ChallengeActive = challenge.into();
    active.verified = Set(true);
    active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "OTP verified!",
        ChallengeResponse {
            challenge_token: token,
        },
        Some(Meta::empty()),
    ))
}

pub async fn complete_signup(
    state: &AppState,
    payload: CompleteSignupRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let session_expired = || AppError::BadRequest("Session expired. Please start over.".into());

    let challenge = Challenges::find_by_id(payload.challenge_token)
        .one(&state.orm)
        .await?
        .filter(|c| {
            c.purpose == ChallengePurpose::Signup.as_str()
                && c.verified
                && c.expires_at.with_timezone(&Utc) >= Utc::now()
        })
        .ok_or_else(session_expired)?;

    let name = required("name", payload.name.as_deref())?;
    let organization = required("organization", payload.organization.as_deref())?;
    let country = required("country", payload.country.as_deref())?;
    let region = required("state", payload.state.as_deref())?;
    let district = required("district", payload.district.as_deref())?;
    let address = required("address", payload.address.as_deref())?;
    let pincode = required("pincode", payload.pincode.as_deref())?;
    if !is_valid_name(name) {
        return Err(AppError::field("name", "Invalid name"));
    }

    let key = user_key(&challenge.email);
    let txn = state.orm.begin().await?;

    if Users::find_by_id(key.clone()).one(&txn).await?.is_some() {
        return Err(AppError::BadRequest("User already exists.".into()));
    }

    let user = UserActive {
        user_key: Set(key.clone()),
        email: Set(challenge.email.clone()),
        name: Set(name.to_string()),
        phone: Set(challenge.phone.clone()),
        organization: Set(organization.to_string()),
        country: Set(country.to_string()),
        state: Set(region.to_string()),
        district: Set(district.to_string()),
        address: Set(address.to_string()),
        pincode: Set(pincode.to_string()),
        order_count: Set(0),
        role: Set("customer".to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    Challenges::delete_by_id(challenge.token).exec(&txn).await?;

    outbox_service::enqueue(
        &txn,
        &OutboxMessage::AccountCreated {
            email: user.email.clone(),
            name: user.name.clone(),
        },
        Some(format!("account_created:{key}")),
    )
    .await?;

    txn.commit().await?;

    audit_best_effort(&state.pool, Some(&key), "user_signup", Some("users"), None).await;

    Ok(ApiResponse::success(
        "Profile completed successfully",
        user_from_entity(user),
        Some(Meta::empty()),
    ))
}

pub async fn request_login_otp(
    state: &AppState,
    payload: ContactRequest,
) -> AppResult<ApiResponse<ChallengeResponse>> {
    let (email, phone) = normalized_contact(&payload)?;

    let user = Users::find_by_id(user_key(&email))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Account doesn't exist".into()))?;

    if !phone_matches(&user.phone, &phone) {
        return Err(AppError::Unauthorized(
            "Phone number doesn't match with the records".into(),
        ));
    }

    let challenge_token =
        issue_challenge(state, ChallengePurpose::Login, &user.email, &user.phone).await?;
    Ok(ApiResponse::success(
        "OTP sent to email for login verification",
        ChallengeResponse { challenge_token },
        Some(Meta::empty()),
    ))
}

pub async fn verify_login_otp(
    state: &AppState,
    payload: VerifyOtpRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let challenge = check_challenge(
        state,
        payload.challenge_token,
        ChallengePurpose::Login,
        &payload.otp,
    )
    .await?;

    let key = user_key(&challenge.email);
    let user = Users::find_by_id(key.clone())
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Account doesn't exist".into()))?;

    let user = sync_order_count(state, user).await?;
    Challenges::delete_by_id(challenge.token)
        .exec(&state.orm)
        .await?;

    let token = issue_token(&state.config, &user)?;

    audit_best_effort(&state.pool, Some(&key), "user_login", Some("users"), None).await;

    Ok(ApiResponse::success(
        "Login successful!",
        LoginResponse {
            token,
            user: user_from_entity(user),
        },
        Some(Meta::empty()),
    ))
}

/// Bring the stored order counter in line with the order history.
async fn sync_order_count(state: &AppState, user: UserModel) -> AppResult<UserModel> {
    let actual = Orders::find()
        .filter(OrderCol::UserKey.eq(user.user_key.as_str()))
        .count(&state.orm)
        .await? as i32;

    if actual == user.order_count {
        return Ok(user);
    }

    tracing::info!(
        user = %user.user_key,
        stored = user.order_count,
        actual,
        "order count synchronized"
    );
    let mut active: UserActive = user.into();
    active.order_count = Set(actual);
    Ok(active.update(&state.orm).await?)
}

pub fn issue_token(config: &AppConfig, user: &UserModel) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.jwt_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.user_key.clone(),
        email: user.email.clone(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn user_from_entity(model: UserModel) -> UserProfile {
    UserProfile {
        key: model.user_key,
        email: model.email,
        name: model.name,
        phone: model.phone,
        organization: model.organization,
        country: model.country,
        state: model.state,
        district: model.district,
        address: model.address,
        pincode: model.pincode,
        order_count: model.order_count,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
